use serial_test::serial;
use temp_env::with_vars;

use super::*;
use crate::ProjectionFilter;
use crate::Severity;

fn cleanup_all_notify_env_vars() {
    for (key, _) in std::env::vars() {
        if key.starts_with("NOTIFY__") || key == "CONFIG_PATH" {
            std::env::remove_var(&key);
        }
    }
}

#[test]
#[serial]
fn default_config_should_initialize_with_hardcoded_values() {
    let config = EngineConfig::default();

    assert_eq!(config.feed.capacity, 50);
    assert_eq!(config.alerts.high_dwell_ms, 8000);
    assert_eq!(config.alerts.medium_dwell_ms, 5000);
    assert_eq!(config.read_state.confirm_concurrency, 4);
    assert_eq!(config.projection(BELL_DROPDOWN).map(|p| p.capacity), Some(20));
    assert_eq!(config.projection(NOTIFICATION_LIST).map(|p| p.capacity), Some(50));
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn new_should_merge_environment_overrides() {
    cleanup_all_notify_env_vars();
    with_vars(
        vec![
            ("NOTIFY__FEED__CAPACITY", Some("75")),
            ("NOTIFY__READ_STATE__CONFIRM_CONCURRENCY", Some("8")),
        ],
        || {
            let config = EngineConfig::new().unwrap();

            assert_eq!(config.feed.capacity, 75);
            assert_eq!(config.read_state.confirm_concurrency, 8);
            // untouched sections keep their defaults
            assert_eq!(config.alerts.high_dwell_ms, 8000);
        },
    );
}

#[test]
#[serial]
fn with_override_config_should_merge_file_settings() {
    cleanup_all_notify_env_vars();
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("dynamic_config.toml");

    std::fs::write(
        &config_path,
        r#"
        [alerts]
        high_dwell_ms = 10000

        [read_state.confirm]
        timeout_ms = 750
        "#,
    )
    .unwrap();

    let empty_vars: Vec<(&str, Option<&str>)> = vec![];
    with_vars(empty_vars, || {
        let base_config = EngineConfig::new().expect("success");
        let config = base_config
            .with_override_config(config_path.to_str().unwrap())
            .expect("override should apply");

        assert_eq!(config.alerts.high_dwell_ms, 10000);
        assert_eq!(config.alerts.medium_dwell_ms, 5000);
        assert_eq!(config.read_state.confirm.timeout_ms, 750);
    });
}

#[test]
#[serial]
fn environment_variables_should_have_highest_priority() {
    cleanup_all_notify_env_vars();
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("test_config.toml");
    std::fs::write(
        &config_path,
        r#"
        [feed]
        capacity = 30
        "#,
    )
    .unwrap();

    with_vars(
        vec![
            ("CONFIG_PATH", Some(config_path.to_str().unwrap())),
            ("NOTIFY__FEED__CAPACITY", Some("40")),
        ],
        || {
            let config = EngineConfig::new().unwrap();
            assert_eq!(config.feed.capacity, 40);
        },
    );
}

#[test]
#[serial]
fn config_file_should_define_projection_filters() {
    cleanup_all_notify_env_vars();
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("surfaces.toml");
    std::fs::write(
        &config_path,
        r#"
        [[projections]]
        name = "triage"
        capacity = 10
        filter = "high"
        include_unconfirmed = false
        "#,
    )
    .unwrap();

    with_vars(vec![("CONFIG_PATH", Some(config_path.to_str().unwrap()))], || {
        let config = EngineConfig::new().unwrap();
        let triage = config.projection("triage").expect("triage projection should load");

        assert_eq!(triage.capacity, 10);
        assert_eq!(triage.filter, ProjectionFilter::Severity(Severity::High));
        assert!(!triage.include_unconfirmed);
    });
}

#[test]
fn validation_should_reject_zero_capacities() {
    let mut config = EngineConfig::default();
    config.feed.capacity = 0;
    assert!(config.validate().is_err());

    let mut config = EngineConfig::default();
    config.projections[0].capacity = 0;
    assert!(config.validate().is_err());
}

#[test]
fn validation_should_reject_duplicate_projection_names() {
    let mut config = EngineConfig::default();
    config.projections.push(ProjectionConfig::bell_dropdown());

    assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
}

#[test]
fn validation_should_reject_inverted_dwell_times() {
    let mut config = EngineConfig::default();
    config.alerts.medium_dwell_ms = 9000;

    assert!(config.validate().is_err());
}

#[test]
fn validation_should_reject_zero_concurrency() {
    let mut config = EngineConfig::default();
    config.read_state.confirm_concurrency = 0;

    assert!(config.validate().is_err());
}

#[test]
fn validation_should_reject_inverted_backoff() {
    let policy = BackoffPolicy {
        max_retries: 3,
        timeout_ms: 100,
        base_delay_ms: 500,
        max_delay_ms: 100,
    };

    assert!(policy.validate().is_err());
}
