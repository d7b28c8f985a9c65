use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::core::config::Config;

/// Get the user data directory for the side panel host
/// - macOS: ~/.sidepanel/
/// - Windows: %APPDATA%\sidepanel\
/// - Linux: ~/.config/sidepanel/
pub fn get_user_data_dir() -> Result<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        let home = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Failed to get home directory"))?;
        Ok(home.join(".sidepanel"))
    }

    #[cfg(not(target_os = "macos"))]
    {
        let config = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Failed to get config directory"))?;
        Ok(config.join("sidepanel"))
    }
}

/// Get the config file path in the user data directory
pub fn get_user_config_path() -> Result<PathBuf> {
    Ok(get_user_data_dir()?.join("config.json"))
}

/// Config path used when the user data directory is unusable
pub fn get_user_config_path_or_temp() -> PathBuf {
    get_user_config_path().unwrap_or_else(|_| std::env::temp_dir().join("sidepanel-config.json"))
}

/// Write the embedded default config to `path` unless a file already exists there
pub fn ensure_default_config_at(path: &Path) -> Result<()> {
    if path.exists() {
        log::info!("Using existing config file: {:?}", path);
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            log::info!("Creating config directory: {:?}", parent);
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }
    }

    log::info!("Config file not found, creating from embedded default: {:?}", path);
    let default_config = crate::assets::get_default_config()
        .ok_or_else(|| anyhow::anyhow!("Failed to get embedded default config"))?;
    std::fs::write(path, default_config)
        .with_context(|| format!("Failed to write config file: {:?}", path))?;

    Ok(())
}

/// Initialize user config directory and config file
/// If config file doesn't exist, create it from the embedded default config
pub fn initialize_user_config() -> Result<PathBuf> {
    let config_path = get_user_config_path()?;
    ensure_default_config_at(&config_path)?;
    Ok(config_path)
}

/// Load and validate a config file
pub fn load_config_from(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;
    config
        .validate()
        .with_context(|| format!("Invalid config file: {:?}", path))?;

    Ok(config)
}

/// Load config from user data directory
pub fn load_user_config() -> Result<Config> {
    let config_path = initialize_user_config()?;
    load_config_from(&config_path)
}

/// Parse the embedded default config
pub fn load_default_config() -> Result<Config> {
    let raw = crate::assets::get_default_config()
        .ok_or_else(|| anyhow::anyhow!("embedded default config missing"))?;
    let config: Config = serde_json::from_str(&raw).context("invalid embedded default config")?;
    config.validate().context("invalid embedded default config")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_default_config_is_valid() {
        let config = load_default_config().unwrap();
        assert_eq!(config.panels.len(), 2);
        assert_eq!(config.panels[0].spec.id.as_str(), "geointel");
    }

    #[test]
    fn test_ensure_default_config_creates_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.json");

        ensure_default_config_at(&path).unwrap();

        assert!(path.exists());
        let config = load_config_from(&path).unwrap();
        assert_eq!(config.panels[1].spec.id.as_str(), "kenya-news");
    }

    #[test]
    fn test_ensure_default_config_keeps_existing_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, r#"{ "profile": "work", "panels": [] }"#).unwrap();

        ensure_default_config_at(&path).unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.profile, "work");
        assert!(config.panels.is_empty());
    }

    #[test]
    fn test_load_config_reports_parse_errors() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = load_config_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_load_config_reports_invalid_panels() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "panels": [ { "id": "x", "title": "", "icon": { "name": "i" }, "resource_name": "x" } ] }"#,
        )
        .unwrap();

        let err = load_config_from(&path).unwrap_err();
        assert!(err.to_string().contains("Invalid config file"));
    }
}
