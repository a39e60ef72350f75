use std::sync::Arc;
use std::sync::Once;
use std::time::Duration;

use notify_engine::adapters::memory::InMemorySnapshotService;
use notify_engine::adapters::memory::LocalEventChannel;
use notify_engine::Advisory;
use notify_engine::Alert;
use notify_engine::EngineBuilder;
use notify_engine::EngineConfig;
use notify_engine::EngineHandle;
use notify_engine::EngineParts;
use notify_engine::Notification;
use notify_engine::NotificationType;
use notify_engine::ProjectionConfig;
use notify_engine::Result;
use notify_engine::Severity;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;

pub const WAIT_TIMEOUT: Duration = Duration::from_secs(2);

static LOGGER_INIT: Once = Once::new();

pub fn enable_logger() {
    LOGGER_INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub struct Harness {
    pub service: InMemorySnapshotService,
    pub channel: LocalEventChannel,
    pub handle: EngineHandle,
    pub alerts: mpsc::UnboundedReceiver<Alert>,
    pub advisories: mpsc::UnboundedReceiver<Advisory>,
    pub engine_task: JoinHandle<Result<()>>,
}

/// Config with single-attempt confirmations so failure paths resolve fast
pub fn fast_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.read_state.confirm.max_retries = 1;
    config.read_state.confirm.base_delay_ms = 1;
    config.read_state.confirm.max_delay_ms = 1;
    config
}

pub fn threat(
    id: u64,
    severity: Severity,
    is_read: bool,
) -> Notification {
    let notification = Notification::new(id, NotificationType::NewThreat, severity, format!("Threat {id}"));
    if is_read {
        notification.read()
    } else {
        notification
    }
}

pub fn start(service: InMemorySnapshotService) -> Harness {
    start_with(service, |builder| builder)
}

pub fn start_with_projection(
    service: InMemorySnapshotService,
    projection: ProjectionConfig,
) -> Harness {
    start_with(service, move |builder| builder.projection(projection))
}

pub fn start_live_only() -> Harness {
    start_with(InMemorySnapshotService::default(), EngineBuilder::live_only)
}

fn start_with(
    service: InMemorySnapshotService,
    customize: impl FnOnce(EngineBuilder) -> EngineBuilder,
) -> Harness {
    enable_logger();
    let channel = LocalEventChannel::new();
    let builder = EngineBuilder::new(fast_config(), Arc::new(service.clone()), Arc::new(channel.clone()));
    let EngineParts {
        engine,
        handle,
        alerts,
        advisories,
    } = customize(builder).build().expect("valid engine config");

    Harness {
        service,
        channel,
        handle,
        alerts,
        advisories,
        engine_task: tokio::spawn(engine.run()),
    }
}

/// Polls `condition` until it holds or [`WAIT_TIMEOUT`] expires
pub async fn eventually<F>(mut condition: F)
where
    F: FnMut() -> bool,
{
    timeout(WAIT_TIMEOUT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not met in time");
}

pub fn ids(view: &[Notification]) -> Vec<String> {
    view.iter().map(|n| n.id.to_string()).collect()
}
