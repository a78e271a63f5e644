//! Governance parameters: quorum size, timelock and expiry window.

use crate::error::{VaultError, VaultResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_REQUIRED_QUORUM: usize = 2;

/// 24 hours.
pub const DEFAULT_TIMELOCK_SECS: u64 = 24 * 60 * 60;

/// 7 days.
pub const DEFAULT_EXPIRY_WINDOW_SECS: u64 = 7 * 24 * 60 * 60;

/// Parameter addressed by a `ParameterUpdate` proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GovernanceParameter {
    RequiredQuorum,
    TimelockSecs,
    ExpiryWindowSecs,
}

/// Rules every proposal is checked against at call time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceParams {
    /// Distinct approvals needed before execution.
    pub required_quorum: usize,
    /// Minimum delay between creation and execution.
    pub timelock: Duration,
    /// Time after creation during which approval and execution stay valid.
    pub expiry_window: Duration,
}

impl Default for GovernanceParams {
    fn default() -> Self {
        Self {
            required_quorum: DEFAULT_REQUIRED_QUORUM,
            timelock: Duration::from_secs(DEFAULT_TIMELOCK_SECS),
            expiry_window: Duration::from_secs(DEFAULT_EXPIRY_WINDOW_SECS),
        }
    }
}

impl GovernanceParams {
    /// Reject parameter sets under which no proposal could ever execute.
    pub fn validate(&self) -> VaultResult<()> {
        if self.required_quorum == 0 {
            return Err(VaultError::InvalidParameter(
                "required_quorum must be at least 1".to_string(),
            ));
        }
        if self.timelock > self.expiry_window {
            return Err(VaultError::InvalidParameter(format!(
                "timelock ({}s) exceeds expiry window ({}s)",
                self.timelock.as_secs(),
                self.expiry_window.as_secs()
            )));
        }
        Ok(())
    }

    /// Copy with `parameter` replaced, validated.
    pub fn with_update(&self, parameter: GovernanceParameter, value: u64) -> VaultResult<Self> {
        let mut updated = *self;
        match parameter {
            GovernanceParameter::RequiredQuorum => {
                updated.required_quorum = usize::try_from(value).map_err(|_| {
                    VaultError::InvalidParameter(format!("required_quorum {} too large", value))
                })?;
            }
            GovernanceParameter::TimelockSecs => updated.timelock = Duration::from_secs(value),
            GovernanceParameter::ExpiryWindowSecs => {
                updated.expiry_window = Duration::from_secs(value)
            }
        }
        updated.validate()?;
        Ok(updated)
    }

    pub fn timelock_secs(&self) -> u64 {
        self.timelock.as_secs()
    }

    pub fn expiry_window_secs(&self) -> u64 {
        self.expiry_window.as_secs()
    }
}

/// Parse human-readable duration to seconds.
///
/// Accepts anything `humantime` does ("24h", "7 days", "90m") plus a bare
/// integer, read as seconds.
///
/// # Examples
/// ```
/// use quorum_vault::proposals::params::parse_duration_secs;
///
/// assert_eq!(parse_duration_secs("24h").unwrap(), 86400);
/// assert_eq!(parse_duration_secs("7 days").unwrap(), 604800);
/// assert_eq!(parse_duration_secs("90").unwrap(), 90);
/// ```
pub fn parse_duration_secs(input: &str) -> Result<u64, String> {
    let input = input.trim();
    if let Ok(secs) = input.parse::<u64>() {
        return Ok(secs);
    }

    humantime::parse_duration(input)
        .map(|d| d.as_secs())
        .map_err(|e| format!("Invalid duration '{}': {}", input, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = GovernanceParams::default();
        assert_eq!(params.required_quorum, 2);
        assert_eq!(params.timelock_secs(), 86_400);
        assert_eq!(params.expiry_window_secs(), 604_800);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_zero_quorum_invalid() {
        let params = GovernanceParams {
            required_quorum: 0,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(VaultError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_timelock_longer_than_expiry_invalid() {
        let result = GovernanceParams::default()
            .with_update(GovernanceParameter::TimelockSecs, DEFAULT_EXPIRY_WINDOW_SECS + 1);
        assert!(matches!(result, Err(VaultError::InvalidParameter(_))));
    }

    #[test]
    fn test_with_update() {
        let params = GovernanceParams::default()
            .with_update(GovernanceParameter::RequiredQuorum, 3)
            .unwrap();
        assert_eq!(params.required_quorum, 3);

        let params = params
            .with_update(GovernanceParameter::ExpiryWindowSecs, 86_400 * 14)
            .unwrap();
        assert_eq!(params.expiry_window_secs(), 86_400 * 14);
        assert_eq!(params.timelock_secs(), DEFAULT_TIMELOCK_SECS);
    }

    #[test]
    fn test_parse_duration_secs() {
        assert_eq!(parse_duration_secs("1h").unwrap(), 3600);
        assert_eq!(parse_duration_secs("24 hours").unwrap(), 86400);
        assert_eq!(parse_duration_secs("7d").unwrap(), 604800);
        assert_eq!(parse_duration_secs("0").unwrap(), 0);
        assert_eq!(parse_duration_secs(" 30 ").unwrap(), 30);
    }

    #[test]
    fn test_parse_duration_invalid() {
        assert!(parse_duration_secs("soon").is_err());
        assert!(parse_duration_secs("").is_err());
        assert!(parse_duration_secs("-5h").is_err());
    }
}
