use super::*;

use std::{
    env,
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};

fn temp_settings_file(label: &str, contents: &str) -> PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let dir = env::temp_dir().join(format!("controller_config_{label}_{suffix}"));
    fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join(SETTINGS_FILE);
    fs::write(&path, contents).expect("write settings");
    path
}

fn no_env(_: &str) -> Option<String> {
    None
}

#[test]
fn missing_file_keeps_defaults() {
    let settings = load_settings_from(Path::new("/nonexistent/controller.toml"), no_env);
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.bind_addr, "127.0.0.1:5000");
}

#[test]
fn file_overrides_default_bind_addr() {
    let path = temp_settings_file("file", "bind_addr = \"0.0.0.0:8080\"\n");
    let settings = load_settings_from(&path, no_env);
    assert_eq!(settings.bind_addr, "0.0.0.0:8080");
    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}

#[test]
fn malformed_file_is_ignored() {
    let path = temp_settings_file("malformed", "bind_addr = [1, 2");
    let settings = load_settings_from(&path, no_env);
    assert_eq!(settings, Settings::default());
    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}

#[test]
fn app_prefixed_env_wins_over_legacy_name_and_file() {
    let path = temp_settings_file("env", "bind_addr = \"0.0.0.0:8080\"\n");
    let settings = load_settings_from(&path, |key| match key {
        "CONTROLLER_BIND" => Some("127.0.0.1:6000".to_string()),
        "APP__BIND_ADDR" => Some("127.0.0.1:7000".to_string()),
        _ => None,
    });
    assert_eq!(settings.bind_addr, "127.0.0.1:7000");

    let settings = load_settings_from(&path, |key| {
        (key == "CONTROLLER_BIND").then(|| "127.0.0.1:6000".to_string())
    });
    assert_eq!(settings.bind_addr, "127.0.0.1:6000");
    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}
