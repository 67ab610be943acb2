//! Configuration loading and data folder resolution
//!
//! Each Solace microservice keeps its SQLite database inside a shared data
//! folder. The folder is resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Database file name inside the data folder
pub const DATABASE_FILE: &str = "solace.db";

/// Optional TOML configuration file contents
///
/// All fields are optional; missing keys fall through to the next
/// resolution tier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Data folder holding solace.db
    pub data_folder: Option<String>,
    /// API key for the external tracking provider
    pub tracking_api_key: Option<String>,
    /// Shared secret for inbound tracking webhooks
    pub tracking_webhook_secret: Option<String>,
}

/// Resolve the data folder following the documented priority order
pub fn resolve_data_folder(cli_arg: Option<&str>, env_var_name: &str) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Ok(config) = load_toml_config() {
        if let Some(folder) = config.data_folder {
            return PathBuf::from(folder);
        }
    }

    // Priority 4: OS-dependent compiled default
    default_data_folder()
}

/// Load the platform config file (~/.config/solace/config.toml or
/// /etc/solace/config.toml on Linux)
pub fn load_toml_config() -> Result<TomlConfig> {
    let path = config_file_path()?;
    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
    toml::from_str(&content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
}

/// Write the TOML config file (best-effort persistence of settings)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}

/// Get configuration file path for the platform
pub fn config_file_path() -> Result<PathBuf> {
    if cfg!(target_os = "linux") {
        // Try ~/.config/solace/config.toml first, then /etc/solace/config.toml
        if let Some(path) = dirs::config_dir().map(|d| d.join("solace").join("config.toml")) {
            if path.exists() {
                return Ok(path);
            }
        }
        let system_config = PathBuf::from("/etc/solace/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
        Err(Error::Config("No config file found".to_string()))
    } else {
        let path = dirs::config_dir()
            .map(|d| d.join("solace").join("config.toml"))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;
        if path.exists() {
            Ok(path)
        } else {
            Err(Error::Config(format!("Config file not found: {:?}", path)))
        }
    }
}

/// OS-dependent default data folder
pub fn default_data_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        dirs::data_local_dir()
            .map(|d| d.join("solace"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/solace"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("solace"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/solace"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("solace"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\solace"))
    } else {
        PathBuf::from("./solace_data")
    }
}

/// Ensure the data folder exists and return the database path inside it
pub fn prepare_data_folder(folder: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(folder)?;
    Ok(folder.join(DATABASE_FILE))
}
