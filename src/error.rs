use thiserror::Error;

/// Main error type for the note-reel library
#[derive(Error, Debug)]
pub enum ReelError {
    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Write error: {0}")]
    Write(#[from] WriteError),

    #[error("Composition error: {0}")]
    Composition(#[from] CompositionError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generic error: {0}")]
    Generic(String),
}

/// Batch-level input errors. These abort a run before any folder is touched.
#[derive(Error, Debug)]
pub enum InputError {
    #[error("Missing required input: {what}")]
    MissingInput { what: String },

    #[error("Input not found: {what} at {path}")]
    NotFound { what: String, path: String },
}

/// Failures reading or probing media
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Failed to decode {path}: {reason}")]
    Unreadable { path: String, reason: String },

    #[error("No video stream in {path}")]
    NoVideoStream { path: String },

    #[error("Degenerate dimensions {width}x{height} for {source_name}")]
    DegenerateDimensions {
        source_name: String,
        width: u32,
        height: u32,
    },

    #[error("Invalid duration {duration} for {path}")]
    InvalidDuration { path: String, duration: f64 },

    #[error("{tool} is not available: {reason}")]
    ToolUnavailable { tool: String, reason: String },
}

/// Failures producing an output file
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("Could not start encoder: {reason}")]
    EncoderUnavailable { reason: String },

    #[error("Encoding {path} failed: {reason}")]
    EncodingFailed { path: String, reason: String },

    #[error("Could not write output {path}: {reason}")]
    OutputFailed { path: String, reason: String },
}

/// Clip composition errors
#[derive(Error, Debug)]
pub enum CompositionError {
    #[error("Cannot assemble an empty clip sequence")]
    EmptySequence,

    #[error("Invalid composition parameters: {details}")]
    InvalidParameters { details: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using ReelError
pub type Result<T> = std::result::Result<T, ReelError>;

impl ReelError {
    /// Create a generic error with a custom message
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic(message.into())
    }

    /// Whether this error only concerns a single folder's job.
    ///
    /// Input and configuration errors describe the whole run.
    pub fn is_job_scoped(&self) -> bool {
        !matches!(self, Self::Input(_) | Self::Config(_))
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Input(InputError::MissingInput { what }) => {
                format!("No {} given. Nothing was processed.", what)
            }
            Self::Input(InputError::NotFound { what, path }) => {
                format!("The {} '{}' does not exist. Nothing was processed.", what, path)
            }
            Self::Decode(DecodeError::ToolUnavailable { tool, .. }) => {
                format!("'{}' could not be run. Please install FFmpeg and make sure it is on PATH.", tool)
            }
            Self::Write(WriteError::EncoderUnavailable { .. }) => {
                "FFmpeg could not be started. Please install FFmpeg and make sure it is on PATH.".to_string()
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_classification() {
        let missing: ReelError = InputError::MissingInput { what: "intro video".into() }.into();
        assert!(!missing.is_job_scoped());

        let decode: ReelError = DecodeError::Unreadable {
            path: "a.mp4".into(),
            reason: "moov atom not found".into(),
        }
        .into();
        assert!(decode.is_job_scoped());

        let write: ReelError = WriteError::EncodingFailed {
            path: "a.mp4".into(),
            reason: "broken pipe".into(),
        }
        .into();
        assert!(write.is_job_scoped());
    }

    #[test]
    fn test_missing_input_message_names_the_input() {
        let err: ReelError = InputError::MissingInput { what: "background image".into() }.into();
        assert!(err.user_message().contains("background image"));
    }
}
