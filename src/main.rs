use std::sync::Arc;
use std::time::Duration;

use notify_engine::adapters::memory::InMemorySnapshotService;
use notify_engine::adapters::memory::LocalEventChannel;
use notify_engine::EngineBuilder;
use notify_engine::EngineConfig;
use notify_engine::EngineParts;
use notify_engine::Notification;
use notify_engine::NotificationType;
use notify_engine::Result;
use notify_engine::Severity;
use notify_engine::BELL_DROPDOWN;
use tracing::error;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<()> {
    init_observability();

    let config = EngineConfig::new()?.validate()?;

    let service = InMemorySnapshotService::new(vec![
        Notification::new(2u64, NotificationType::ThreatAnalyzed, Severity::High, "Credential stuffing on /login")
            .with_user("analyst"),
        Notification::new(1u64, NotificationType::SystemAlert, Severity::Low, "Nightly scan finished")
            .with_user("system")
            .read(),
    ]);
    let channel = LocalEventChannel::new();

    let EngineParts {
        engine,
        handle,
        mut alerts,
        mut advisories,
    } = EngineBuilder::new(config, Arc::new(service.clone()), Arc::new(channel.clone())).build()?;

    let engine_task = tokio::spawn(engine.run());

    tokio::spawn(async move {
        while let Some(alert) = alerts.recv().await {
            info!(urgency = ?alert.urgency, dwell = ?alert.dwell, "ALERT {}", alert.text);
        }
    });
    tokio::spawn(async move {
        while let Some(advisory) = advisories.recv().await {
            info!("advisory: {}", advisory.reason());
        }
    });

    let mut bell = match handle.projection(BELL_DROPDOWN) {
        Some(view) => view,
        None => {
            error!("bell projection missing from configuration");
            handle.deactivate();
            return Ok(());
        }
    };

    // Wait for the snapshot to land before simulating traffic
    bell.wait_for(|view| view.len() >= 2).await?;

    channel.connect();
    tokio::time::sleep(Duration::from_millis(50)).await;
    channel.publish(Notification::new(
        3u64,
        NotificationType::NewThreat,
        Severity::Medium,
        "Unusual outbound traffic from 10.0.4.17",
    ));
    channel.publish(Notification::new(
        4u64,
        NotificationType::NewThreat,
        Severity::High,
        "Ransomware signature detected on FS-02",
    ));

    let view = bell.wait_for(|view| view.len() >= 4).await?;
    for n in &view {
        info!(id = %n.id, severity = %n.severity, read = n.is_read, "{}", n.title);
    }
    info!(badge = ?handle.stats().unread_badge(), "stats after live traffic");

    if let Err(e) = handle.mark_read(4u64).await {
        error!("mark_read failed: {}", e);
    }
    let report = handle.mark_all_read(BELL_DROPDOWN).await?;
    info!(?report, stats = ?handle.stats(), "all read");

    handle.deactivate();
    if let Err(e) = engine_task.await {
        error!("engine task failed: {:?}", e);
    }
    info!(confirmed = service.confirmed().len(), "demo finished");
    Ok(())
}

fn init_observability() {
    let fmt_layer = tracing_subscriber::fmt::layer().with_filter(EnvFilter::from_default_env());
    tracing_subscriber::registry().with(fmt_layer).init();
}
