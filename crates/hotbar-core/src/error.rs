//! Error types for the session layer
//!
//! Every failure is reported to the caller; none of them abort the process.
//! Persistence failures never show up here since they are absorbed by
//! [`hotbar_history::PersistenceSync`].

use hotbar_history::HistoryError;
use hotbar_model::ModelError;
use hotbar_render::RenderError;
use std::path::PathBuf;

/// Main session error type
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Slot editing rejected
    #[error("invalid edit: {0}")]
    Model(#[from] ModelError),

    /// Randomization failed
    #[error("randomize failed: {0}")]
    Randomize(#[from] RandomizeError),

    /// Renderer call failed; no result was recorded
    #[error("render failed: {0}")]
    Render(#[from] RenderError),

    /// History navigation failed
    #[error("history error: {0}")]
    History(#[from] HistoryError),

    /// Generate with no filled, positively weighted slot
    #[error("nothing to generate: no slot has both a color and a positive weight")]
    NoChoices,

    /// Manual weight edit while weights are derived
    #[error("weights are automatic in {mode} mode; switch to manual first")]
    WeightsAreAutomatic { mode: &'static str },
}

impl SessionError {
    /// Check if the session is untouched and the user may simply try again
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Randomize(RandomizeError::NoVariedAssignment { .. })
                | Self::Render(RenderError::Transport(_) | RenderError::Encode(_))
        )
    }

    /// Check if error stems from bad input rather than a collaborator
    #[inline]
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        match self {
            Self::Model(_)
            | Self::History(_)
            | Self::NoChoices
            | Self::WeightsAreAutomatic { .. } => true,
            Self::Randomize(e) => !matches!(e, RandomizeError::NoVariedAssignment { .. }),
            Self::Render(e) => e.is_bad_request(),
        }
    }
}

/// Randomizer errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RandomizeError {
    /// More locked colors than slots
    #[error("{locks} locked colors do not fit in {slots} slots")]
    TooManyLocks { locks: usize, slots: usize },

    /// Neither pool nor locks hold a color
    #[error("select at least one color to randomize from")]
    EmptySelection,

    /// Every attempt produced a single-color hotbar
    #[error("could not produce a varied hotbar after {attempts} attempts; try again")]
    NoVariedAssignment { attempts: u32 },

    /// Candidate did not fit the hotbar
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Configuration errors, raised before a session exists
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Value out of range
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    /// Create out-of-range error
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hotbar_model::ColorId;

    #[test]
    fn no_varied_is_recoverable() {
        let err = SessionError::from(RandomizeError::NoVariedAssignment { attempts: 30 });
        assert!(err.is_recoverable());
        assert!(!err.is_user_error());
    }

    #[test]
    fn bad_input_is_user_error() {
        let err = SessionError::from(RandomizeError::TooManyLocks { locks: 10, slots: 9 });
        assert!(err.is_user_error());
        assert!(!err.is_recoverable());

        let err = SessionError::from(RenderError::UnknownColor(ColorId::new("teal")));
        assert!(err.is_user_error());
    }

    #[test]
    fn transport_failure_is_recoverable() {
        let err = SessionError::from(RenderError::Transport("timeout".into()));
        assert!(err.is_recoverable());
        assert!(!err.is_user_error());
        assert_eq!(err.to_string(), "render failed: transport failure: timeout");
    }
}
