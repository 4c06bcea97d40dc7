//! Error types for the configuration surface.
//!
//! The simulation itself never fails: invalid actions are ignored and
//! logged. Only loading and validating [`crate::MatchSettings`] can go wrong.

use std::fmt;

/// Why a settings file could not be turned into usable `MatchSettings`.
#[derive(Debug)]
pub enum SettingsError {
    /// Reading or writing the settings file failed.
    Io(std::io::Error),

    /// The file was not valid settings JSON.
    Parse(serde_json::Error),

    /// A value parsed but is outside its usable range.
    Invalid {
        /// Name of the offending field.
        field: &'static str,
        /// Human-readable description of the constraint.
        reason: String,
    },
}

impl SettingsError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        SettingsError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Io(err) => write!(f, "settings i/o failed: {}", err),
            SettingsError::Parse(err) => write!(f, "settings are not valid JSON: {}", err),
            SettingsError::Invalid { field, reason } => {
                write!(f, "invalid setting '{}': {}", field, reason)
            }
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SettingsError::Io(err) => Some(err),
            SettingsError::Parse(err) => Some(err),
            SettingsError::Invalid { .. } => None,
        }
    }
}

impl From<std::io::Error> for SettingsError {
    fn from(err: std::io::Error) -> Self {
        SettingsError::Io(err)
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(err: serde_json::Error) -> Self {
        SettingsError::Parse(err)
    }
}
