use super::{default_global_config_path, ConfigError, Settings};
use std::path::Path;

/// Loads the global settings file, falling back to defaults when it does not exist.
pub fn load_global_settings() -> Result<Settings, ConfigError> {
    let path = default_global_config_path()?;
    if !path.exists() {
        let mut settings = Settings::default();
        settings.apply_env_overrides();
        settings.validate()?;
        return Ok(settings);
    }
    load_settings(&path)
}

pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    let mut settings = Settings::from_path(path)?;
    settings.apply_env_overrides();
    settings.validate()?;
    Ok(settings)
}
