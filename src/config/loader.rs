//! Configuration File Loading
//!
//! Handles loading and saving configuration files from various locations
//! with support for TOML and JSON and a fallback to built-in defaults.

use super::{Config, LOG_LEVELS};
use crate::error::{Error, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV_VAR: &str = "ENGINE_CONSOLE_CONFIG";

const APP_DIR: &str = "engine-console";

/// Configuration file loader
pub struct ConfigLoader {
    /// Candidate configuration files, in priority order
    search_paths: Vec<PathBuf>,
    /// Path of the configuration that was loaded (if any)
    current_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigFormat {
    /// TOML format
    Toml,
    /// JSON format
    Json,
}

impl ConfigFormat {
    /// Format implied by a file extension; anything unknown is TOML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => ConfigFormat::Json,
            _ => ConfigFormat::Toml,
        }
    }

    fn name(self) -> &'static str {
        match self {
            ConfigFormat::Toml => "TOML",
            ConfigFormat::Json => "JSON",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Whether to fall back to the default config if none exists
    pub create_default: bool,
    /// Whether to validate configuration after loading
    pub validate: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            create_default: true,
            validate: true,
        }
    }
}

impl ConfigLoader {
    /// Create a loader over the default search paths
    pub fn new() -> Self {
        Self {
            search_paths: Self::get_search_paths(),
            current_path: None,
        }
    }

    /// Create a loader that only considers `path`
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            search_paths: vec![path.into()],
            current_path: None,
        }
    }

    /// Load configuration with default options
    pub fn load() -> Result<Config> {
        Self::new().load_with_options(LoadOptions::default())
    }

    /// Load an explicit configuration file; it must exist
    pub fn load_from_path(path: &Path) -> Result<Config> {
        let mut loader = Self::with_path(path);
        loader.load_with_options(LoadOptions {
            create_default: false,
            validate: true,
        })
    }

    /// Load configuration with custom options
    pub fn load_with_options(&mut self, options: LoadOptions) -> Result<Config> {
        if let Some((path, config)) = self.find_and_load_config()? {
            info!(path = %path.display(), "Loaded configuration");
            self.current_path = Some(path);
            if options.validate {
                validate_config(&config)?;
            }
            return Ok(config);
        }

        if options.create_default {
            debug!("No configuration file found, using defaults");
            Ok(Config::default())
        } else {
            let path = self.search_paths.first().cloned().unwrap_or_default();
            Err(Error::ConfigLoadFailed {
                path,
                reason: "configuration file not found".to_string(),
            })
        }
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, config: &Config, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let format = ConfigFormat::from_path(path);
        let content = match format {
            ConfigFormat::Json => serde_json::to_string_pretty(config).map_err(|e| {
                Error::ConfigSerializationFailed {
                    format: format.name().to_string(),
                    reason: e.to_string(),
                }
            })?,
            ConfigFormat::Toml => {
                toml::to_string_pretty(config).map_err(|e| Error::ConfigSerializationFailed {
                    format: format.name().to_string(),
                    reason: e.to_string(),
                })?
            }
        };

        fs::write(path, content)?;
        Ok(())
    }

    /// Find and load the first readable configuration
    ///
    /// A file that exists but fails to parse is an error: silently falling
    /// through to defaults would hide the user's mistake.
    fn find_and_load_config(&self) -> Result<Option<(PathBuf, Config)>> {
        for path in &self.search_paths {
            if path.is_file() {
                let config = load_config_file(path)?;
                return Ok(Some((path.clone(), config)));
            }
        }
        Ok(None)
    }

    /// Get default search paths for configuration files
    fn get_search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Ok(explicit) = env::var(CONFIG_ENV_VAR) {
            if !explicit.trim().is_empty() {
                paths.push(PathBuf::from(explicit));
            }
        }

        if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
            paths.push(PathBuf::from(xdg_config).join(APP_DIR).join("config.toml"));
        }

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join(APP_DIR).join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(format!(".{APP_DIR}")).join("config.toml"));
        }

        if let Ok(cwd) = env::current_dir() {
            paths.push(cwd.join(format!("{APP_DIR}.toml")));
        }

        paths
    }

    /// Get the default configuration path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.toml")
    }

    /// Get the path of the loaded configuration file
    pub fn current_path(&self) -> Option<&Path> {
        self.current_path.as_deref()
    }

    /// List all search paths
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Load a specific configuration file, choosing the format by extension
pub fn load_config_file(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path).map_err(|e| Error::ConfigLoadFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let format = ConfigFormat::from_path(path);
    match format {
        ConfigFormat::Toml => toml::from_str(&content).map_err(|e| Error::ConfigParseFailed {
            format: format.name().to_string(),
            reason: e.to_string(),
        }),
        ConfigFormat::Json => serde_json::from_str(&content).map_err(|e| Error::ConfigParseFailed {
            format: format.name().to_string(),
            reason: e.to_string(),
        }),
    }
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    let locator = &config.locator;

    if locator.file_names.is_empty() {
        return Err(Error::ConfigValidationFailed {
            field: "locator.file_names".to_string(),
            reason: "At least one engine file name is required".to_string(),
        });
    }

    if locator.file_names.iter().any(|name| name.trim().is_empty()) {
        return Err(Error::ConfigValidationFailed {
            field: "locator.file_names".to_string(),
            reason: "Engine file names cannot be empty".to_string(),
        });
    }

    if locator.max_parent_levels == 0 {
        return Err(Error::ConfigValidationFailed {
            field: "locator.max_parent_levels".to_string(),
            reason: "Must search at least one directory level".to_string(),
        });
    }

    let level = config.logging.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        return Err(Error::ConfigValidationFailed {
            field: "logging.level".to_string(),
            reason: format!("Unknown log level '{}'", config.logging.level),
        });
    }

    Ok(())
}
