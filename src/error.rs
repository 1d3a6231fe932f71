//! Error types for mix-audio.
//!
//! Errors are split into two categories:
//! - **Operation errors** ([`GraphError`]): Returned from graph operations
//! - **Runtime notifications**: Non-fatal conditions surfaced via
//!   [`EventCallback`](crate::EventCallback)

/// Errors returned from mixing-graph operations.
///
/// Load and source errors are recoverable - the caller retries with another
/// locator or re-acquires the input. [`GraphError::Closed`] indicates the
/// operation was attempted after [`MixerGraph::shutdown()`] and is a usage
/// error, fatal to the call but not to the process.
///
/// [`MixerGraph::shutdown()`]: crate::MixerGraph::shutdown
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// Audio content could not be fetched or decoded.
    ///
    /// The graph performs no retries; try another locator or surface the
    /// failure to the user. The music slot is left absent.
    #[error("failed to load '{locator}': {reason}")]
    LoadFailed {
        /// Locator that failed to load.
        locator: String,
        /// Why the load failed.
        reason: String,
    },

    /// A newer attach superseded this load while it was in flight.
    ///
    /// The loaded content was discarded without binding; the newer attach
    /// owns the music slot.
    #[error("load of '{locator}' was superseded by a newer attach")]
    LoadSuperseded {
        /// Locator whose load result was discarded.
        locator: String,
    },

    /// A supplied live input handle is unusable.
    #[error("invalid source: {reason}")]
    InvalidSource {
        /// Why the source was rejected.
        reason: String,
    },

    /// The graph was shut down; no further operations are accepted.
    #[error("graph is shut down")]
    Closed,

    /// The builder configuration is unusable.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Why the configuration was rejected.
        reason: String,
    },
}

impl GraphError {
    /// Creates a load failure for the given locator.
    pub fn load_failed(locator: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::LoadFailed {
            locator: locator.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid-source error with the given reason.
    pub fn invalid_source(reason: impl Into<String>) -> Self {
        Self::InvalidSource {
            reason: reason.into(),
        }
    }

    /// Creates an invalid-configuration error with the given reason.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_failed_display() {
        let err = GraphError::load_failed("bgm.wav", "file not found");
        assert_eq!(err.to_string(), "failed to load 'bgm.wav': file not found");
    }

    #[test]
    fn test_load_superseded_display() {
        let err = GraphError::LoadSuperseded {
            locator: "old.wav".to_string(),
        };
        assert!(err.to_string().contains("old.wav"));
        assert!(err.to_string().contains("superseded"));
    }

    #[test]
    fn test_invalid_source_display() {
        let err = GraphError::invalid_source("zero sample rate");
        assert_eq!(err.to_string(), "invalid source: zero sample rate");
    }

    #[test]
    fn test_closed_display() {
        assert_eq!(GraphError::Closed.to_string(), "graph is shut down");
    }
}
