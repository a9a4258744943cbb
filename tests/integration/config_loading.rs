//! Loading container declarations from files and starting a registry.

use super::test_utils::*;
use overlayq::clock::SystemClock;
use overlayq::config::ConfigLoader;
use overlayq::observer::NoopObserver;
use overlayq::{InputShaping, Policy, Registry};
use std::sync::Arc;
use tempfile::TempDir;

const CONFIG: &str = r#"
[containers.toasts]
policy = { kind = "multiple", capacity = 2 }
delay_ms = 100

[containers.banner]
policy = { kind = "one_by_one" }
input_shaping = { mode = "latest", window_ms = 200 }
"#;

#[test]
fn test_load_and_validate_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("overlayq.toml");
    std::fs::write(&path, CONFIG).unwrap();

    let config = ConfigLoader::load(Some(&path)).unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.containers["toasts"].policy, Policy::Multiple { capacity: 2 });
    assert_eq!(
        config.containers["banner"].input_shaping,
        InputShaping::Latest { window_ms: 200 }
    );
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("absent.toml");
    let err = ConfigLoader::load(Some(&path)).unwrap_err();
    assert!(err.to_string().contains("not found"));
}

#[test]
fn test_invalid_container_reported() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("overlayq.toml");
    std::fs::write(
        &path,
        r#"
[containers.toasts]
policy = { kind = "multiple", capacity = 0 }
"#,
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(&path).unwrap();
    let errors = config.validate().unwrap_err();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].to_string().contains("toasts"));
}

#[tokio::test(start_paused = true)]
async fn test_registry_from_config_registers_containers() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("overlayq.toml");
    std::fs::write(&path, CONFIG).unwrap();
    let config = ConfigLoader::load_from_file(&path).unwrap();

    let registry = Registry::from_config(&config, Arc::new(SystemClock), Arc::new(NoopObserver));
    assert_eq!(registry.names(), vec!["banner".to_string(), "toasts".to_string()]);

    let toasts = registry.channel("toasts").unwrap();
    let a = show(&registry, "toasts", "a");
    let b = show(&registry, "toasts", "b");
    let c = show(&registry, "toasts", "c");
    settle().await;
    assert_eq!(main_ids(&toasts), vec![a, b]);
    assert_eq!(temp_ids(&toasts), vec![c]);

    registry.dismiss(a, "toasts", true);
    advance_ms(101).await;
    assert_eq!(main_ids(&toasts), vec![b, c]);
    registry.shutdown().await;
}
