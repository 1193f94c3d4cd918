//! Configuration management for checkin.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};
use crate::signature::{Rgba, MAX_DIMENSION};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "checkin";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "checkin.db";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `CHECKIN_`, nested keys split on `__`)
/// 2. TOML config file at `~/.config/checkin/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Shareable link configuration.
    pub share: ShareConfig,
    /// View routing configuration.
    pub router: RouterConfig,
    /// Signature surface configuration.
    pub signature: SignatureConfig,
    /// Report configuration.
    pub report: ReportConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/checkin/checkin.db`
    pub database_path: Option<PathBuf>,
}

/// Shareable link configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShareConfig {
    /// Base address attendees open; the link token is appended as a query parameter.
    pub base_url: String,
    /// Name of the query parameter carrying the link token.
    pub query_param: String,
}

/// View routing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// URL fragment (without `#`) that selects the admin view.
    pub admin_fragment: String,
}

/// Signature surface configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignatureConfig {
    /// Surface width in pixels.
    pub width: u32,
    /// Surface height in pixels.
    pub height: u32,
    /// Stroke colour as `#rrggbb`.
    pub stroke_color: String,
    /// Stroke width in pixels.
    pub line_width: f64,
    /// Date stamp colour as `#rrggbb`.
    pub stamp_color: String,
}

/// Report configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Title printed above the registration table.
    pub title: String,
    /// Default file name for exported reports.
    pub file_name: String,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/".to_string(),
            query_param: "links".to_string(),
        }
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            admin_fragment: "admin".to_string(),
        }
    }
}

impl Default for SignatureConfig {
    fn default() -> Self {
        Self {
            width: 600,
            height: 300,
            stroke_color: "#f1f5f9".to_string(),
            line_width: 2.0,
            stamp_color: "#94a3b8".to_string(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: "Registros de Capacitación".to_string(),
            file_name: "registros_capacitacion.pdf".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("CHECKIN_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.signature.width == 0 || self.signature.height == 0 {
            return Err(Error::ConfigValidation {
                message: format!(
                    "signature surface must be non-empty (got {}x{})",
                    self.signature.width, self.signature.height
                ),
            });
        }

        if self.signature.width > MAX_DIMENSION || self.signature.height > MAX_DIMENSION {
            return Err(Error::ConfigValidation {
                message: format!(
                    "signature surface {}x{} exceeds {MAX_DIMENSION}x{MAX_DIMENSION}",
                    self.signature.width, self.signature.height
                ),
            });
        }

        if !(self.signature.line_width > 0.0) {
            return Err(Error::ConfigValidation {
                message: "signature line_width must be greater than 0".to_string(),
            });
        }

        for (name, value) in [
            ("stroke_color", &self.signature.stroke_color),
            ("stamp_color", &self.signature.stamp_color),
        ] {
            if Rgba::from_hex(value).is_none() {
                return Err(Error::ConfigValidation {
                    message: format!("invalid {name}: {value} (expected #rrggbb)"),
                });
            }
        }

        if let Err(e) = Url::parse(&self.share.base_url) {
            return Err(Error::ConfigValidation {
                message: format!("invalid share base_url {}: {e}", self.share.base_url),
            });
        }

        if self.share.query_param.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "share query_param cannot be empty".to_string(),
            });
        }

        if self.router.admin_fragment.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "router admin_fragment cannot be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the parsed share base address.
    ///
    /// # Errors
    ///
    /// Returns an error if `share.base_url` is not a valid absolute URL.
    pub fn base_url(&self) -> Result<Url> {
        Url::parse(&self.share.base_url).map_err(|e| Error::ConfigValidation {
            message: format!("invalid share base_url {}: {e}", self.share.base_url),
        })
    }

    /// Get the stroke colour, falling back to the default on a malformed value.
    #[must_use]
    pub fn stroke_color(&self) -> Rgba {
        Rgba::from_hex(&self.signature.stroke_color).unwrap_or(Rgba::SLATE_100)
    }

    /// Get the stamp colour, falling back to the default on a malformed value.
    #[must_use]
    pub fn stamp_color(&self) -> Rgba {
        Rgba::from_hex(&self.signature.stamp_color).unwrap_or(Rgba::SLATE_400)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.storage.database_path.is_none());
        assert_eq!(config.share.query_param, "links");
        assert_eq!(config.router.admin_fragment, "admin");
        assert_eq!(config.signature.width, 600);
        assert_eq!(config.signature.height, 300);
        assert_eq!(config.report.file_name, "registros_capacitacion.pdf");
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_surface() {
        let mut config = Config::default();
        config.signature.height = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("signature surface"));
    }

    #[test]
    fn test_validate_surface_upper_bound() {
        let mut config = Config::default();
        config.signature.width = u32::MAX;
        config.signature.height = u32::MAX;
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("exceeds 4096x4096"));

        config.signature.width = MAX_DIMENSION;
        config.signature.height = MAX_DIMENSION + 1;
        assert!(config.validate().is_err());

        config.signature.height = MAX_DIMENSION;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_line_width() {
        let mut config = Config::default();
        config.signature.line_width = 0.0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("line_width"));
    }

    #[test]
    fn test_validate_bad_colour() {
        let mut config = Config::default();
        config.signature.stroke_color = "slate".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("stroke_color"));
    }

    #[test]
    fn test_validate_bad_base_url() {
        let mut config = Config::default();
        config.share.base_url = "not a url".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("base_url"));
    }

    #[test]
    fn test_validate_empty_admin_fragment() {
        let mut config = Config::default();
        config.router.admin_fragment = "  ".to_string();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_database_path_default() {
        let config = Config::default();
        assert!(config.database_path().to_string_lossy().contains("checkin.db"));
    }

    #[test]
    fn test_database_path_custom() {
        let mut config = Config::default();
        config.storage.database_path = Some(PathBuf::from("/custom/path/db.sqlite"));

        assert_eq!(
            config.database_path(),
            PathBuf::from("/custom/path/db.sqlite")
        );
    }

    #[test]
    fn test_colours_parse() {
        let config = Config::default();
        assert_eq!(config.stroke_color(), Rgba::SLATE_100);
        assert_eq!(config.stamp_color(), Rgba::SLATE_400);
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("checkin"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        let config = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml"))).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[share]\nbase_url = \"https://eventos.example.com/registro\"\n\n[signature]\nwidth = 400\n",
        )
        .unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert_eq!(config.share.base_url, "https://eventos.example.com/registro");
        assert_eq!(config.signature.width, 400);
        assert_eq!(config.signature.height, 300);
    }

    #[test]
    fn test_report_config_deserialize() {
        let json = r#"{"title": "Asistencia"}"#;
        let report: ReportConfig = serde_json::from_str(json).unwrap();
        assert_eq!(report.title, "Asistencia");
        assert_eq!(report.file_name, "registros_capacitacion.pdf");
    }
}
