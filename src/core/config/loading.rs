//! Locates and parses the optional TOML configuration file.

use std::path::Path;

use tracing::{debug, info};

use crate::core::config::file::ConfigFile;
use crate::core::error::{AppError, Result};

/// Default config file name probed in the working directory when no
/// explicit path is given.
const DEFAULT_CONFIG_FILE: &str = "claw-login.toml";

/// Loads the configuration file, if one is available.
///
/// With an explicit path the file must exist and parse; a missing or
/// malformed file is a hard error. Without one, the default name is
/// probed in the current directory and silently skipped when absent.
///
/// Returns the parsed file together with the path it was read from.
pub fn load_config_file(explicit: Option<&Path>) -> Result<Option<(ConfigFile, String)>> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => {
            let candidate = Path::new(DEFAULT_CONFIG_FILE);
            if !candidate.exists() {
                debug!("No {} in working directory, using defaults", DEFAULT_CONFIG_FILE);
                return Ok(None);
            }
            candidate.to_path_buf()
        }
    };

    let display_path = path.display().to_string();
    let contents = std::fs::read_to_string(&path).map_err(|e| {
        AppError::Config(format!("Failed to read config file '{}': {}", display_path, e))
    })?;

    let parsed: ConfigFile = toml::from_str(&contents).map_err(|e| {
        AppError::Config(format!("Failed to parse config file '{}': {}", display_path, e))
    })?;

    info!("Loaded configuration from {}", display_path);
    Ok(Some((parsed, display_path)))
}
