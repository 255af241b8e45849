use std::{fs, path::Path, str::FromStr, time::Duration};

use client_core::{
    default_motor_options, FailurePolicy, ResponseOrdering, SessionOptions, SyncOptions,
    DEFAULT_SERVER_URL,
};
use serde::Deserialize;
use tracing::warn;

pub const SETTINGS_FILE: &str = "panel.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_url: String,
    pub request_timeout_secs: Option<u64>,
    pub device_failure_policy: FailurePolicy,
    pub motor_failure_policy: FailurePolicy,
    pub ordering: ResponseOrdering,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.into(),
            request_timeout_secs: None,
            device_failure_policy: SyncOptions::default().failure_policy,
            motor_failure_policy: default_motor_options().failure_policy,
            ordering: ResponseOrdering::default(),
        }
    }
}

impl Settings {
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            server_url: self.server_url.clone(),
            request_timeout: self.request_timeout_secs.map(Duration::from_secs),
            devices: SyncOptions {
                failure_policy: self.device_failure_policy,
                ordering: self.ordering,
            },
            motor: SyncOptions {
                failure_policy: self.motor_failure_policy,
                ordering: self.ordering,
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    server_url: Option<String>,
    request_timeout_secs: Option<u64>,
    device_failure_policy: Option<String>,
    motor_failure_policy: Option<String>,
    ordering: Option<String>,
}

pub fn load_settings(path: &Path) -> Settings {
    load_settings_from(path, |key| std::env::var(key).ok())
}

/// Defaults, then the TOML file at `path` if present, then the environment.
/// Unparseable values are logged and skipped.
pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.server_url {
                    settings.server_url = v;
                }
                if let Some(v) = file_cfg.request_timeout_secs {
                    settings.request_timeout_secs = Some(v);
                }
                overlay(
                    &mut settings.device_failure_policy,
                    "device_failure_policy",
                    file_cfg.device_failure_policy,
                );
                overlay(
                    &mut settings.motor_failure_policy,
                    "motor_failure_policy",
                    file_cfg.motor_failure_policy,
                );
                overlay(&mut settings.ordering, "ordering", file_cfg.ordering);
            }
            Err(error) => {
                warn!(path = %path.display(), %error, "ignoring unreadable settings file")
            }
        }
    }

    if let Some(v) = env("PANEL_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = env("APP__SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        match v.parse::<u64>() {
            Ok(secs) => settings.request_timeout_secs = Some(secs),
            Err(error) => warn!(value = %v, %error, "ignoring APP__REQUEST_TIMEOUT_SECS"),
        }
    }
    overlay(
        &mut settings.device_failure_policy,
        "APP__DEVICE_FAILURE_POLICY",
        env("APP__DEVICE_FAILURE_POLICY"),
    );
    overlay(
        &mut settings.motor_failure_policy,
        "APP__MOTOR_FAILURE_POLICY",
        env("APP__MOTOR_FAILURE_POLICY"),
    );
    overlay(&mut settings.ordering, "APP__ORDERING", env("APP__ORDERING"));

    settings
}

fn overlay<T>(target: &mut T, key: &str, raw: Option<String>)
where
    T: FromStr<Err = String>,
{
    let Some(raw) = raw else {
        return;
    };
    match raw.parse() {
        Ok(value) => *target = value,
        Err(error) => warn!(key, %error, "ignoring setting"),
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
