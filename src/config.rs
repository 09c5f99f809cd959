//! # Configuration Management
//!
//! Construction-time configuration for binary protocol instances.
//!
//! A [`ProtocolConfig`] is handed to a protocol by value and is read-only for
//! the lifetime of that instance. There is no setter surface; build a new
//! config (or a factory) when different settings are needed.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()` / `from_toml()`
//! - Environment variables via `from_env()`
//! - Direct instantiation with defaults
//!
//! ## Security Considerations
//! - Length limits are off by default for wire compatibility; services that
//!   read from untrusted peers should set both of them
//! - `recursion_limit` bounds the stack used by nested struct/container decoding

use crate::error::{ProtocolError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::Level;

/// Version constant carried in the high 16 bits of a versioned header (0x80010000)
pub const VERSION_1: i32 = 0x8001_0000_u32 as i32;

/// Mask selecting the version half of a version word
pub const VERSION_MASK: i32 = 0xffff_0000_u32 as i32;

/// Mask selecting the message kind from a version word
pub const TYPE_MASK: i32 = 0x0000_00ff;

/// Legacy probe value that announces a one-byte secondary length
pub const LEGACY_SENTINEL: i32 = 0x0100_0000;

/// Default nesting depth accepted when decoding values
pub const DEFAULT_RECURSION_LIMIT: usize = 64;

/// Upper bound for any length the wire can carry
pub const MAX_WIRE_LENGTH: usize = i32::MAX as usize;

/// Layout of the kind and sequence id that follow a legacy (unversioned) name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegacyHeaderLayout {
    /// One-byte kind then 32-bit sequence id, as the non-strict writer emits
    #[default]
    Canonical,
    /// 16-bit kind then 16-bit sequence id, as some historical readers consumed
    Narrow,
}

/// Settings fixed at protocol construction
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProtocolConfig {
    /// Reject message headers that lack a version word
    #[serde(default)]
    pub strict_read: bool,

    /// Emit versioned message headers
    #[serde(default = "default_strict_write")]
    pub strict_write: bool,

    /// Ceiling for decoded string/binary lengths
    #[serde(default)]
    pub string_length_limit: Option<usize>,

    /// Ceiling for decoded map/list/set element counts
    #[serde(default)]
    pub container_length_limit: Option<usize>,

    /// How kind and sequence id are read after a legacy header name
    #[serde(default)]
    pub legacy_header_layout: LegacyHeaderLayout,

    /// Maximum nesting depth for generic value decoding and skipping
    #[serde(default = "default_recursion_limit")]
    pub recursion_limit: usize,
}

fn default_strict_write() -> bool {
    true
}

fn default_recursion_limit() -> usize {
    DEFAULT_RECURSION_LIMIT
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            strict_read: false,
            strict_write: true,
            string_length_limit: None,
            container_length_limit: None,
            legacy_header_layout: LegacyHeaderLayout::Canonical,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }
}

impl ProtocolConfig {
    /// Strict on both sides; only versioned headers are produced or accepted
    pub fn strict() -> Self {
        Self {
            strict_read: true,
            strict_write: true,
            ..Self::default()
        }
    }

    /// Legacy peers: unversioned headers written, anything accepted
    pub fn legacy() -> Self {
        Self {
            strict_read: false,
            strict_write: false,
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(value) = std::env::var("BINARY_PROTOCOL_STRICT_READ") {
            config.strict_read = parse_env_bool("BINARY_PROTOCOL_STRICT_READ", &value)?;
        }

        if let Ok(value) = std::env::var("BINARY_PROTOCOL_STRICT_WRITE") {
            config.strict_write = parse_env_bool("BINARY_PROTOCOL_STRICT_WRITE", &value)?;
        }

        if let Ok(value) = std::env::var("BINARY_PROTOCOL_STRING_LIMIT") {
            config.string_length_limit =
                Some(parse_env_usize("BINARY_PROTOCOL_STRING_LIMIT", &value)?);
        }

        if let Ok(value) = std::env::var("BINARY_PROTOCOL_CONTAINER_LIMIT") {
            config.container_length_limit =
                Some(parse_env_usize("BINARY_PROTOCOL_CONTAINER_LIMIT", &value)?);
        }

        Ok(config)
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if let Some(limit) = self.string_length_limit {
            if limit > MAX_WIRE_LENGTH {
                errors.push(format!(
                    "String length limit too large: {limit} (maximum: {MAX_WIRE_LENGTH})"
                ));
            }
        }

        if let Some(limit) = self.container_length_limit {
            if limit > MAX_WIRE_LENGTH {
                errors.push(format!(
                    "Container length limit too large: {limit} (maximum: {MAX_WIRE_LENGTH})"
                ));
            }
        }

        if self.recursion_limit == 0 {
            errors.push("Recursion limit must be greater than 0".to_string());
        }

        if self.strict_read && !self.strict_write {
            errors.push(
                "WARNING: strict_read with non-strict writes - peers configured the same way cannot read our messages"
                    .to_string(),
            );
        }

        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ProtocolError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

fn parse_env_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ProtocolError::ConfigError(format!(
            "Invalid boolean for {name}: '{other}'"
        ))),
    }
}

fn parse_env_usize(name: &str, value: &str) -> Result<usize> {
    value
        .trim()
        .parse::<usize>()
        .map_err(|e| ProtocolError::ConfigError(format!("Invalid length for {name}: {e}")))
}

/// Settings for accelerated protocols
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AcceleratedConfig {
    /// Codec settings shared with the generic path
    #[serde(default)]
    pub protocol: ProtocolConfig,

    /// Run on the generic codec when no fast-path codec can be bound
    #[serde(default = "default_fallback")]
    pub fallback: bool,
}

fn default_fallback() -> bool {
    true
}

impl Default for AcceleratedConfig {
    fn default() -> Self {
        Self {
            protocol: ProtocolConfig::default(),
            fallback: true,
        }
    }
}

impl AcceleratedConfig {
    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Validate the nested protocol configuration
    pub fn validate(&self) -> Vec<String> {
        self.protocol.validate()
    }
}

/// Longest accepted `app_name`, which is attached to every log line
const MAX_APP_NAME_LEN: usize = 64;

/// Subscriber settings used by `utils::logging::init_logging`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Name recorded on the startup event
    pub app_name: String,

    /// Default filter level when `RUST_LOG` is unset
    #[serde(with = "level_name")]
    pub log_level: Level,

    /// Emit JSON lines instead of the human-readable format
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("binary-protocol"),
            log_level: Level::INFO,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Vec<String> {
        let name = self.app_name.trim();
        let mut errors = Vec::new();

        if name.is_empty() {
            errors.push("app_name must not be blank".to_string());
        }
        if name.len() > MAX_APP_NAME_LEN {
            errors.push(format!(
                "app_name is {} bytes, limit is {MAX_APP_NAME_LEN}",
                name.len()
            ));
        }
        if name.chars().any(char::is_control) {
            errors.push("app_name contains control characters".to_string());
        }

        errors
    }
}

/// `tracing::Level` as its lowercase name ("info", "debug", ...)
mod level_name {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};
    use tracing::Level;

    pub fn serialize<S: Serializer>(level: &Level, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&level.to_string().to_ascii_lowercase())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Level, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse::<Level>()
            .map_err(|e| D::Error::custom(format!("log_level '{name}': {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_constants() {
        assert_eq!(VERSION_1 as u32, 0x8001_0000);
        assert_eq!(VERSION_MASK as u32, 0xffff_0000);
        assert!(VERSION_1 < 0);
        assert_eq!(VERSION_1 & VERSION_MASK, VERSION_1);
    }

    #[test]
    fn test_defaults_match_wire_conventions() {
        let config = ProtocolConfig::default();
        assert!(!config.strict_read);
        assert!(config.strict_write);
        assert_eq!(config.string_length_limit, None);
        assert_eq!(config.container_length_limit, None);
        assert_eq!(config.legacy_header_layout, LegacyHeaderLayout::Canonical);
    }

    #[test]
    fn test_log_level_names_roundtrip() {
        let config = LoggingConfig {
            log_level: Level::WARN,
            ..LoggingConfig::default()
        };
        let text = toml::to_string(&config).unwrap_or_default();
        assert!(text.contains("log_level = \"warn\""));

        let parsed: std::result::Result<LoggingConfig, _> =
            toml::from_str("app_name = \"x\"\nlog_level = \"TRACE\"\njson_format = true");
        assert!(parsed.is_ok_and(|c| c.log_level == Level::TRACE && c.json_format));

        let bad: std::result::Result<LoggingConfig, _> =
            toml::from_str("app_name = \"x\"\nlog_level = \"loud\"\njson_format = false");
        assert!(bad.is_err());
    }

    #[test]
    fn test_env_bool_parsing() {
        assert!(parse_env_bool("X", "TRUE").is_ok_and(|v| v));
        assert!(parse_env_bool("X", "off").is_ok_and(|v| !v));
        assert!(parse_env_bool("X", "maybe").is_err());
    }
}
