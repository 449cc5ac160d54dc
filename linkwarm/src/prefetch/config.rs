//! Configuration for link prefetching.
//!
//! Settings can be built in code or read from the `[prefetch]` section of
//! an INI file:
//!
//! ```ini
//! [prefetch]
//! enabled = true
//! root_margin = 50px
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ini::Ini;
use thiserror::Error;

/// Default margin around the viewport, in CSS pixels.
///
/// Elements within this distance of the viewport count as visible, so
/// warming starts slightly before the link scrolls into view.
pub const DEFAULT_ROOT_MARGIN_PX: i32 = 50;

/// INI section holding prefetch settings.
pub const CONFIG_SECTION: &str = "prefetch";

/// Errors raised while loading prefetch configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid INI syntax: {0}")]
    Parse(#[from] ini::ParseError),

    #[error("Invalid boolean for '{key}': {value}")]
    InvalidBool { key: String, value: String },

    #[error("Invalid root margin: {0}")]
    InvalidRootMargin(String),
}

/// Margin applied around the viewport when testing intersection.
///
/// Mirrors the CSS `margin` shorthand; positive values grow the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RootMargin {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

impl RootMargin {
    /// Same margin on every side.
    pub const fn uniform(px: i32) -> Self {
        Self {
            top: px,
            right: px,
            bottom: px,
            left: px,
        }
    }
}

impl Default for RootMargin {
    fn default() -> Self {
        Self::uniform(DEFAULT_ROOT_MARGIN_PX)
    }
}

impl fmt::Display for RootMargin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}px {}px {}px {}px",
            self.top, self.right, self.bottom, self.left
        )
    }
}

impl FromStr for RootMargin {
    type Err = ConfigError;

    /// Parse CSS shorthand with one to four pixel values.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split_whitespace()
            .map(parse_px)
            .collect::<Option<Vec<i32>>>()
            .ok_or_else(|| ConfigError::InvalidRootMargin(s.to_string()))?;

        match values.as_slice() {
            [all] => Ok(Self::uniform(*all)),
            [vertical, horizontal] => Ok(Self {
                top: *vertical,
                right: *horizontal,
                bottom: *vertical,
                left: *horizontal,
            }),
            [top, horizontal, bottom] => Ok(Self {
                top: *top,
                right: *horizontal,
                bottom: *bottom,
                left: *horizontal,
            }),
            [top, right, bottom, left] => Ok(Self {
                top: *top,
                right: *right,
                bottom: *bottom,
                left: *left,
            }),
            _ => Err(ConfigError::InvalidRootMargin(s.to_string())),
        }
    }
}

fn parse_px(token: &str) -> Option<i32> {
    token.strip_suffix("px").unwrap_or(token).parse().ok()
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Prefetch controller configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefetchConfig {
    /// Whether hover and visibility may trigger warm-ups at all.
    ///
    /// When false no visibility subscription is created. Default: true.
    pub enabled: bool,

    /// Viewport margin for the visibility trigger. Default: 50px.
    pub root_margin: RootMargin,
}

impl Default for PrefetchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            root_margin: RootMargin::default(),
        }
    }
}

impl PrefetchConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether prefetching is enabled.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the viewport margin.
    pub fn with_root_margin(mut self, root_margin: RootMargin) -> Self {
        self.root_margin = root_margin;
        self
    }

    /// Parse configuration from INI text.
    ///
    /// A missing `[prefetch]` section or missing keys fall back to defaults.
    pub fn from_ini_str(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text)?;
        let mut config = Self::default();

        let Some(section) = ini.section(Some(CONFIG_SECTION)) else {
            return Ok(config);
        };

        if let Some(value) = section.get("enabled") {
            config.enabled = parse_bool("enabled", value)?;
        }
        if let Some(value) = section.get("root_margin") {
            config.root_margin = value.parse()?;
        }

        Ok(config)
    }

    /// Load configuration from an INI file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ini_str(&text)
    }
}

/// Default location of the configuration file (`~/.linkwarm/config.ini`).
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".linkwarm").join("config.ini"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_prefetch_config_default() {
        let config = PrefetchConfig::default();
        assert!(config.enabled);
        assert_eq!(config.root_margin, RootMargin::uniform(50));
    }

    #[test]
    fn test_root_margin_shorthand() {
        assert_eq!("50px".parse::<RootMargin>().unwrap(), RootMargin::uniform(50));
        assert_eq!(
            "10px 20px".parse::<RootMargin>().unwrap(),
            RootMargin {
                top: 10,
                right: 20,
                bottom: 10,
                left: 20
            }
        );
        assert_eq!(
            "1px 2px 3px".parse::<RootMargin>().unwrap(),
            RootMargin {
                top: 1,
                right: 2,
                bottom: 3,
                left: 2
            }
        );
        assert_eq!(
            "1 2px -3px 4".parse::<RootMargin>().unwrap(),
            RootMargin {
                top: 1,
                right: 2,
                bottom: -3,
                left: 4
            }
        );
    }

    #[test]
    fn test_root_margin_rejects_garbage() {
        assert!("".parse::<RootMargin>().is_err());
        assert!("5em".parse::<RootMargin>().is_err());
        assert!("1px 2px 3px 4px 5px".parse::<RootMargin>().is_err());
    }

    #[test]
    fn test_root_margin_display() {
        assert_eq!(RootMargin::uniform(50).to_string(), "50px 50px 50px 50px");
    }

    #[test]
    fn test_from_ini_str() {
        let config =
            PrefetchConfig::from_ini_str("[prefetch]\nenabled = off\nroot_margin = 0px 100px\n")
                .unwrap();
        assert!(!config.enabled);
        assert_eq!(config.root_margin.right, 100);
        assert_eq!(config.root_margin.top, 0);
    }

    #[test]
    fn test_from_ini_str_missing_section_uses_defaults() {
        let config = PrefetchConfig::from_ini_str("[other]\nkey = value\n").unwrap();
        assert_eq!(config, PrefetchConfig::default());
    }

    #[test]
    fn test_from_ini_str_invalid_bool() {
        let err = PrefetchConfig::from_ini_str("[prefetch]\nenabled = maybe\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBool { .. }));
        assert!(err.to_string().contains("maybe"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[prefetch]\nroot_margin = 75px").unwrap();

        let config = PrefetchConfig::load(file.path()).unwrap();
        assert!(config.enabled);
        assert_eq!(config.root_margin, RootMargin::uniform(75));
    }

    #[test]
    fn test_load_missing_file() {
        let err = PrefetchConfig::load(Path::new("/nonexistent/linkwarm.ini")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_builders() {
        let config = PrefetchConfig::new()
            .with_enabled(false)
            .with_root_margin(RootMargin::uniform(0));
        assert!(!config.enabled);
        assert_eq!(config.root_margin, RootMargin::uniform(0));
    }
}
