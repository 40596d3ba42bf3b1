//! Environment variable layer of Settings::load.
//!
//! Kept in its own test binary: it mutates process environment. Tests in
//! this file hold ENV_LOCK while BOMVIZ_* variables are set.

use std::env;
use std::fs;
use std::sync::Mutex;

use tempfile::TempDir;

use bomviz::application::ApplicationError;
use bomviz::config::{local_config_path, Profile, Settings};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Load settings from `dir` with `vars` set, removing them afterwards.
fn load_with_env(dir: &TempDir, vars: &[(&str, &str)]) -> Result<Settings, ApplicationError> {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    for (key, value) in vars {
        env::set_var(key, value);
    }
    let result = Settings::load(Some(dir.path()));
    for (key, _) in vars {
        env::remove_var(key);
    }
    result
}

#[test]
fn given_env_vars_when_load_then_override_local_config() {
    let dir = TempDir::new().unwrap();
    fs::write(
        local_config_path(dir.path()),
        "base_url = \"http://from-file:8000\"\n[canvas]\nwidth = 1800\nheight = 900\n",
    )
    .unwrap();

    let settings = load_with_env(
        &dir,
        &[
            ("BOMVIZ_BASE_URL", "http://from-env:9000"),
            ("BOMVIZ_CANVAS__WIDTH", "1000"),
            ("BOMVIZ_REQUEST_TIMEOUT_SECS", "0"),
        ],
    )
    .expect("load settings");

    assert_eq!(settings.profile, Profile::Development);
    assert_eq!(settings.base_url().unwrap(), "http://from-env:9000");
    assert_eq!(settings.canvas.width, 1000.0);
    assert_eq!(settings.canvas.height, 900.0);
    assert_eq!(settings.request_timeout(), None);
}

#[test]
fn given_non_numeric_canvas_width_when_load_then_config_error() {
    let dir = TempDir::new().unwrap();

    let err = load_with_env(&dir, &[("BOMVIZ_CANVAS__WIDTH", "wide")]).unwrap_err();

    match err {
        ApplicationError::Config { message } => assert!(message.contains("canvas.width"), "{message}"),
        other => panic!("expected config error, got {other:?}"),
    }
}

#[test]
fn given_non_numeric_timeout_when_load_then_config_error() {
    let dir = TempDir::new().unwrap();

    let err = load_with_env(&dir, &[("BOMVIZ_REQUEST_TIMEOUT_SECS", "soon")]).unwrap_err();

    assert!(matches!(err, ApplicationError::Config { .. }));
}
