//! Load settings: defaults, then an optional JSON override file, then environment variables.

use crate::config::types::AppConfig;
use crate::error::ConfigError;
use serde_json::Value;
use std::path::Path;

pub const CONFIG_PATH_ENV: &str = "CONFIG_PATH";

/// Load from the process environment (`CONFIG_PATH`, `DATABASE_URL`, `SESSION_SECRET`, `BIND_ADDR`).
/// A `.env` file in the working directory is read first when present.
pub fn load() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    let path = std::env::var(CONFIG_PATH_ENV).ok();
    load_with(path.as_deref().map(Path::new), |key| std::env::var(key).ok())
}

/// Load with an explicit override file and environment lookup.
pub fn load_with<F>(path: Option<&Path>, env: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
            let overrides: Value = serde_json::from_str(&raw)?;
            tracing::info!(path = %path.display(), "loaded config overrides");
            from_overrides(&overrides)?
        }
        None => AppConfig::default(),
    };
    apply_env(&mut config, env);
    Ok(config)
}

/// Defaults with `overrides` merged on top.
pub fn from_overrides(overrides: &Value) -> Result<AppConfig, ConfigError> {
    let mut merged = serde_json::to_value(AppConfig::default())?;
    merge(&mut merged, overrides);
    Ok(serde_json::from_value(merged)?)
}

/// Recursive merge: nested objects merge key by key, other values replace.
/// Keys absent from `defaults` are ignored.
pub fn merge(defaults: &mut Value, overrides: &Value) {
    let (Value::Object(base), Value::Object(over)) = (defaults, overrides) else {
        return;
    };
    for (key, value) in base.iter_mut() {
        let Some(replacement) = over.get(key) else { continue };
        if value.is_object() && replacement.is_object() {
            merge(value, replacement);
        } else {
            *value = replacement.clone();
        }
    }
}

fn apply_env<F>(config: &mut AppConfig, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = env("DATABASE_URL").filter(|v| !v.is_empty()) {
        config.db.url = Some(url);
    }
    if let Some(secret) = env("SESSION_SECRET").filter(|v| !v.is_empty()) {
        config.session.secret = secret;
    }
    if let Some(bind) = env("BIND_ADDR").filter(|v| !v.is_empty()) {
        config.server.bind = bind;
    }
}
