use std::path::{Path, PathBuf};

use crate::error::ConfigurationError;

use super::types::AppConfig;

/// Get the default dbagent data directory: ~/.dbagent
pub fn get_dbagent_data_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .ok()
        .map(|home| PathBuf::from(home).join(".dbagent"))
}

pub fn load_from_path(path: &Path) -> Result<AppConfig, ConfigurationError> {
    let s = std::fs::read_to_string(path)
        .map_err(|e| ConfigurationError::Load(format!("{}: {e}", path.display())))?;
    let cfg = toml::from_str::<AppConfig>(&s)
        .map_err(|e| ConfigurationError::Load(format!("{}: {e}", path.display())))?;
    cfg.runner.validate()?;
    Ok(cfg)
}

pub fn load_default() -> Result<AppConfig, ConfigurationError> {
    // Priority 1: $DBAGENT_CONFIG (must exist when set)
    // Priority 2: ~/.dbagent/config.toml
    // Priority 3: ./config.toml
    let explicit = std::env::var("DBAGENT_CONFIG")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from);

    let mut cfg = match explicit {
        Some(path) => load_from_path(&path)?,
        None => {
            let home_config = get_dbagent_data_dir().map(|d| d.join("config.toml"));
            let local_config = Path::new("config.toml");
            match home_config {
                Some(p) if p.exists() => load_from_path(&p)?,
                _ if local_config.exists() => load_from_path(local_config)?,
                _ => AppConfig::default(),
            }
        }
    };

    apply_env_overrides(&mut cfg, |key| std::env::var(key).ok())?;
    Ok(cfg)
}

/// Environment variable overrides (highest priority). Blank values are ignored.
pub(crate) fn apply_env_overrides<F>(cfg: &mut AppConfig, lookup: F) -> Result<(), ConfigurationError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("DBAGENT_MOTHERSHIP") {
        cfg.mothership.set_address(&v)?;
    }
    if let Some(v) = get("DBAGENT_DATASTORE_KIND") {
        cfg.datastore.kind = v;
    }
    if let Some(v) = get("AWS_REGION") {
        cfg.datastore.region_name = v;
    }
    if let Some(v) = get("AWS_ACCESS_KEY_ID") {
        cfg.datastore.aws_access_key_id = v;
    }
    if let Some(v) = get("AWS_SECRET_ACCESS_KEY") {
        cfg.datastore.aws_secret_access_key = v;
    }
    Ok(())
}
