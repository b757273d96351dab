//! Error types for the grid engine.
//!
//! Only caller contract violations surface as errors. Data- and
//! timing-dependent conditions (a stray click on a collapsed row, an edit
//! request on a read-only column, a drop onto the placeholder row) are
//! reported as `false` or as an outcome enum so input handling can fall
//! through to default behavior.

/// Result type alias for grid operations.
pub type Result<T> = std::result::Result<T, GridError>;

/// Errors that indicate misuse of the grid API.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    /// `end_update` was called without a matching `begin_update`.
    #[error("end_update called without a matching begin_update")]
    UnbalancedUpdate,

    /// A session operation was invoked while no edit session exists.
    #[error("no edit session is active")]
    NoEditSession,

    /// A key gesture string could not be parsed.
    #[error("invalid key gesture '{gesture}': {message}")]
    InvalidKeyGesture { gesture: String, message: String },

    /// Grid options could not be parsed.
    #[error("invalid grid options: {0}")]
    Options(String),
}

impl GridError {
    /// Create a key gesture parse error.
    pub fn invalid_gesture(gesture: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidKeyGesture {
            gesture: gesture.into(),
            message: message.into(),
        }
    }
}

impl From<toml::de::Error> for GridError {
    fn from(err: toml::de::Error) -> Self {
        Self::Options(err.to_string())
    }
}

impl From<serde_json::Error> for GridError {
    fn from(err: serde_json::Error) -> Self {
        Self::Options(err.to_string())
    }
}
