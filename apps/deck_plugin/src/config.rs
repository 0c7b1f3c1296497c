use std::{fs, path::Path};

use serde::Deserialize;

const CONFIG_FILE: &str = "deck_plugin.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub log_filter: String,
    pub host: String,
    pub log_raw_messages: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_filter: "info".into(),
            host: "127.0.0.1".into(),
            log_raw_messages: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    log_filter: Option<String>,
    host: Option<String>,
    log_raw_messages: Option<bool>,
}

pub fn load_settings() -> Settings {
    let settings = load_settings_file(Path::new(CONFIG_FILE));
    apply_env_overrides(settings, |key| std::env::var(key).ok())
}

fn load_settings_file(path: &Path) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        if let Ok(file_cfg) = toml::from_str::<FileSettings>(&raw) {
            if let Some(v) = file_cfg.log_filter {
                settings.log_filter = v;
            }
            if let Some(v) = file_cfg.host {
                settings.host = v;
            }
            if let Some(v) = file_cfg.log_raw_messages {
                settings.log_raw_messages = v;
            }
        }
    }

    settings
}

fn apply_env_overrides(mut settings: Settings, env: impl Fn(&str) -> Option<String>) -> Settings {
    if let Some(v) = env("DECK_PLUGIN_LOG") {
        settings.log_filter = v;
    }
    if let Some(v) = env("APP__LOG_FILTER") {
        settings.log_filter = v;
    }

    if let Some(v) = env("APP__HOST") {
        settings.host = v;
    }

    if let Some(v) = env("APP__LOG_RAW_MESSAGES") {
        if let Some(parsed) = parse_flag(&v) {
            settings.log_raw_messages = parsed;
        }
    }

    settings
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
