use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context};
use client_core::{
    TmdbConfig, DEFAULT_API_BASE_URL, DEFAULT_IMAGE_BASE_URL, DEFAULT_REQUEST_TIMEOUT,
    DEFAULT_SEARCH_DEBOUNCE,
};
use shared::domain::TimeWindow;
use tracing::warn;

pub const SETTINGS_FILE: &str = "movies.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub image_base_url: String,
    pub time_window: TimeWindow,
    pub search_debounce: Duration,
    pub request_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_API_BASE_URL.into(),
            image_base_url: DEFAULT_IMAGE_BASE_URL.into(),
            time_window: TimeWindow::Day,
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl Settings {
    pub fn tmdb_config(&self) -> anyhow::Result<TmdbConfig> {
        let Some(api_key) = self.api_key.clone().filter(|key| !key.trim().is_empty()) else {
            bail!(
                "no API key configured; set TMDB_API_KEY, add api_key to {SETTINGS_FILE}, or pass --api-key"
            );
        };
        Ok(TmdbConfig {
            base_url: self.base_url.clone(),
            api_key,
            request_timeout: self.request_timeout,
        })
    }
}

/// Defaults, then `movies.toml` in the working directory, then environment.
pub fn load_settings() -> anyhow::Result<Settings> {
    load_settings_from(Path::new(SETTINGS_FILE), |name| std::env::var(name).ok())
}

pub fn load_settings_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match fs::read_to_string(path) {
        Ok(raw) => apply_file(&mut settings, &raw)
            .with_context(|| format!("invalid settings file '{}'", path.display()))?,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read settings file '{}'", path.display()))
        }
    }

    apply_env(&mut settings, env)?;
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let table: toml::Table = toml::from_str(raw)?;

    for (key, value) in &table {
        match key.as_str() {
            "api_key" => settings.api_key = Some(string_value(key, value)?),
            "base_url" => settings.base_url = string_value(key, value)?,
            "image_base_url" => settings.image_base_url = string_value(key, value)?,
            "time_window" => settings.time_window = string_value(key, value)?.parse()?,
            "search_debounce_ms" => {
                settings.search_debounce = Duration::from_millis(integer_value(key, value)?)
            }
            "request_timeout_secs" => {
                settings.request_timeout = timeout_secs(key, integer_value(key, value)?)?
            }
            other => warn!(key = other, "ignoring unknown settings key"),
        }
    }

    Ok(())
}

fn string_value(key: &str, value: &toml::Value) -> anyhow::Result<String> {
    match value {
        toml::Value::String(s) => Ok(s.clone()),
        other => bail!("'{key}' must be a string, got {}", other.type_str()),
    }
}

fn integer_value(key: &str, value: &toml::Value) -> anyhow::Result<u64> {
    match value {
        toml::Value::Integer(n) if *n >= 0 => Ok(*n as u64),
        toml::Value::String(s) => s
            .trim()
            .parse()
            .with_context(|| format!("'{key}' must be a non-negative integer")),
        _ => bail!("'{key}' must be a non-negative integer"),
    }
}

fn timeout_secs(key: &str, secs: u64) -> anyhow::Result<Duration> {
    if secs == 0 {
        bail!("'{key}' must be at least 1 second");
    }
    Ok(Duration::from_secs(secs))
}

fn apply_env(settings: &mut Settings, env: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
    if let Some(v) = env("TMDB_API_KEY") {
        settings.api_key = Some(v);
    }
    if let Some(v) = env("APP__API_KEY") {
        settings.api_key = Some(v);
    }

    if let Some(v) = env("TMDB_BASE_URL") {
        settings.base_url = v;
    }
    if let Some(v) = env("APP__BASE_URL") {
        settings.base_url = v;
    }

    if let Some(v) = env("APP__IMAGE_BASE_URL") {
        settings.image_base_url = v;
    }

    if let Some(v) = env("APP__TIME_WINDOW") {
        settings.time_window = v
            .parse()
            .context("invalid APP__TIME_WINDOW")?;
    }

    if let Some(v) = env("APP__SEARCH_DEBOUNCE_MS") {
        let millis = v
            .trim()
            .parse::<u64>()
            .context("invalid APP__SEARCH_DEBOUNCE_MS")?;
        settings.search_debounce = Duration::from_millis(millis);
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        let secs = v
            .trim()
            .parse::<u64>()
            .context("invalid APP__REQUEST_TIMEOUT_SECS")?;
        settings.request_timeout = timeout_secs("APP__REQUEST_TIMEOUT_SECS", secs)?;
    }

    Ok(())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
