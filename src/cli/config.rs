//! Operator configuration file handling
//!
//! The config file is TOML and carries the governance parameters a vault is
//! created with, plus logging settings for the binary. Once a vault exists,
//! its parameters change only through `ParameterUpdate` proposals; the file
//! seeds new vaults and nothing else.

use quorum_vault::proposals::{parse_duration_secs, GovernanceParams};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default log level
const DEFAULT_LOG_LEVEL: &str = "info";

/// Operator configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Governance parameters for newly created vaults
    #[serde(default)]
    pub governance: GovernanceConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Governance settings as written by operators
///
/// Durations are humantime strings ("24h", "7d") or bare seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernanceConfig {
    #[serde(default = "default_required_quorum")]
    pub required_quorum: usize,

    #[serde(default = "default_timelock")]
    pub timelock: String,

    #[serde(default = "default_expiry_window")]
    pub expiry_window: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    pub file: Option<PathBuf>,
}

fn default_required_quorum() -> usize {
    GovernanceParams::default().required_quorum
}

fn default_timelock() -> String {
    humantime::format_duration(GovernanceParams::default().timelock).to_string()
}

fn default_expiry_window() -> String {
    humantime::format_duration(GovernanceParams::default().expiry_window).to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            required_quorum: default_required_quorum(),
            timelock: default_timelock(),
            expiry_window: default_expiry_window(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            file: None,
        }
    }
}

impl GovernanceConfig {
    /// Parse and validate into vault parameters.
    pub fn to_params(&self) -> Result<GovernanceParams, Box<dyn std::error::Error>> {
        let timelock = parse_duration_secs(&self.timelock)
            .map_err(|e| format!("Invalid timelock '{}': {}", self.timelock, e))?;
        let expiry_window = parse_duration_secs(&self.expiry_window)
            .map_err(|e| format!("Invalid expiry_window '{}': {}", self.expiry_window, e))?;

        let params = GovernanceParams {
            required_quorum: self.required_quorum,
            timelock: Duration::from_secs(timelock),
            expiry_window: Duration::from_secs(expiry_window),
        };
        params.validate()?;
        Ok(params)
    }
}

impl VaultConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;

        let config: VaultConfig = toml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))?;

        Ok(config)
    }

    /// Load from `path` if given and present, else from the default path if
    /// present, else fall back to built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, Box<dyn std::error::Error>> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let path = default_config_path();
                if path.exists() {
                    Self::load(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Save configuration to a TOML file
    #[cfg(test)]
    pub fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        fs::write(path, contents)
            .map_err(|e| format!("Failed to write config file '{}': {}", path.display(), e))?;

        Ok(())
    }

    /// Generate default configuration content as a string with comments
    pub fn generate_default_toml() -> String {
        let governance = GovernanceConfig::default();
        format!(
            r#"# Quorum Vault Configuration
#
# Governance parameters seed NEW vaults only. A running vault changes them
# through ParameterUpdate proposals that pass quorum and timelock.

[governance]
# Distinct QuorumMember approvals required to execute a proposal
required_quorum = {quorum}

# Delay after creation before an approved proposal may execute
timelock = "{timelock}"

# Proposals can no longer be approved or executed after this long
# Must be at least as long as the timelock
expiry_window = "{expiry}"

[logging]
# Log level: trace, debug, info, warn, error (RUST_LOG overrides)
level = "info"

# Log file path (optional, logs to stderr if not specified)
# file = "/var/log/quorum-vault/vault.log"
"#,
            quorum = governance.required_quorum,
            timelock = governance.timelock,
            expiry = governance.expiry_window,
        )
    }

    /// Create and save a default configuration file
    pub fn create_default(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let contents = Self::generate_default_toml();

        // Create parent directory if needed
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        fs::write(config_path, contents).map_err(|e| {
            format!(
                "Failed to write config file '{}': {}",
                config_path.display(),
                e
            )
        })?;

        Ok(())
    }
}

/// Get the default config file path
///
/// - Linux: ~/.config/quorum-vault/config.toml
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("quorum-vault")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = VaultConfig::default();
        assert_eq!(config.governance.required_quorum, 2);
        assert_eq!(config.governance.timelock, "1day");
        assert_eq!(config.governance.expiry_window, "7days");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_default_config_matches_default_params() {
        let params = VaultConfig::default().governance.to_params().unwrap();
        assert_eq!(params, GovernanceParams::default());
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut config = VaultConfig::default();
        config.governance.required_quorum = 3;
        config.governance.timelock = "2h".to_string();
        config.save(&config_path).unwrap();

        let loaded = VaultConfig::load(&config_path).unwrap();
        assert_eq!(loaded.governance.required_quorum, 3);
        let params = loaded.governance.to_params().unwrap();
        assert_eq!(params.timelock_secs(), 7200);
    }

    #[test]
    fn test_create_default_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        VaultConfig::create_default(&config_path).unwrap();
        assert!(config_path.exists());

        // Verify it can be loaded
        let config = VaultConfig::load(&config_path).unwrap();
        let params = config.governance.to_params().unwrap();
        assert_eq!(params.timelock_secs(), 86_400);
        assert_eq!(params.expiry_window_secs(), 604_800);
    }

    #[test]
    fn test_generate_default_toml() {
        let toml = VaultConfig::generate_default_toml();
        assert!(toml.contains("[governance]"));
        assert!(toml.contains("required_quorum = 2"));
        assert!(toml.contains("timelock = \"1day\""));
        assert!(toml.contains("level = \"info\""));
    }

    #[test]
    fn test_load_config_with_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        // Only one field set
        fs::write(&config_path, "[governance]\nrequired_quorum = 4\n").unwrap();

        let config = VaultConfig::load(&config_path).unwrap();
        assert_eq!(config.governance.required_quorum, 4);
        assert_eq!(config.governance.timelock, "1day");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_bare_seconds_accepted() {
        let governance = GovernanceConfig {
            required_quorum: 1,
            timelock: "60".to_string(),
            expiry_window: "3600".to_string(),
        };
        let params = governance.to_params().unwrap();
        assert_eq!(params.timelock_secs(), 60);
        assert_eq!(params.expiry_window_secs(), 3600);
    }

    #[test]
    fn test_invalid_governance_rejected() {
        let bad_duration = GovernanceConfig {
            timelock: "soon".to_string(),
            ..Default::default()
        };
        assert!(bad_duration.to_params().is_err());

        let timelock_past_expiry = GovernanceConfig {
            timelock: "8d".to_string(),
            ..Default::default()
        };
        assert!(timelock_past_expiry.to_params().is_err());

        let zero_quorum = GovernanceConfig {
            required_quorum: 0,
            ..Default::default()
        };
        assert!(zero_quorum.to_params().is_err());
    }

    #[test]
    fn test_load_missing_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let result = VaultConfig::load(&temp_dir.path().join("absent.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_default_config_path() {
        let path = default_config_path();
        assert!(path.ends_with("quorum-vault/config.toml"));
    }
}
