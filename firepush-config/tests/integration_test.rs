//! Integration tests for firepush-config

use firepush_config::*;
use std::env;
use std::fs;
use std::path::PathBuf;

fn scratch_file(name: &str, content: &str) -> PathBuf {
    let dir = env::temp_dir().join(format!("firepush-config-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_from_file_detects_toml() {
    let path = scratch_file(
        "host.toml",
        r#"
        [fcm]
        firebase_project_id = "host-project"
        token_cache_time = 1200
        "#,
    );

    let manager = ConfigManager::from_file(&path).unwrap();
    let section = manager.section("fcm").unwrap();

    assert_eq!(section["firebase_project_id"], "host-project");
    assert_eq!(section["token_cache_time"], 1200);
}

#[test]
fn test_from_file_detects_json() {
    let path = scratch_file("host.json", r#"{"fcm": {"dry_run": true}}"#);

    let manager = ConfigManager::from_file(&path).unwrap();
    assert!(manager.section("fcm").unwrap()["dry_run"].as_bool().unwrap());
}

#[test]
fn test_from_file_missing() {
    let result = ConfigManager::from_file("/nonexistent/firepush.toml");
    assert!(matches!(result, Err(ConfigError::LoadError(_))));
}

#[test]
fn test_load_dotenv_with_prefix() {
    let path = scratch_file(
        "push.env",
        "FIREPUSH_DOTENV_TEST_CERTIFICATE=/keys/from-dotenv.json\n",
    );

    let manager = ConfigManager::with_prefix("FIREPUSH_DOTENV_TEST");
    manager.load_dotenv(path.to_str()).unwrap();

    assert_eq!(
        manager.get_string("certificate").unwrap(),
        "/keys/from-dotenv.json"
    );

    unsafe {
        env::remove_var("FIREPUSH_DOTENV_TEST_CERTIFICATE");
    }
}

#[test]
fn test_env_loader_with_prefix() {
    let loader = EnvLoader::new(Some("FIREPUSH_ITEST".to_string()));

    unsafe {
        env::set_var("FIREPUSH_ITEST_PROJECT", "demo");
    }

    assert_eq!(loader.load_var("PROJECT").unwrap(), "demo");
    assert_eq!(loader.load().unwrap()["project"], "demo");

    unsafe {
        env::remove_var("FIREPUSH_ITEST_PROJECT");
    }
}

#[test]
fn test_config_error_display() {
    let err = ConfigError::KeyNotFound("fcm".to_string());
    assert_eq!(err.to_string(), "Configuration key not found: fcm");
}
