use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Centralized error type for clusterseed operations
#[derive(Error, Debug)]
pub enum SeedError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Filesystem error at {path}: {source}")]
    Filesystem {
        path: PathBuf,
        source: io::Error,
    },

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Cannot reach {target}: {message}")]
    Connection { target: String, message: String },

    /// A command the server rejected, with the server's own code and name
    #[error("Command failed on {target}: {code_name} ({code}): {message}")]
    Command {
        target: String,
        code: i32,
        code_name: String,
        message: String,
    },

    /// The server's error is kept as the source, not repeated in the message
    #[error("Step '{step}' failed")]
    StepFailed {
        step: String,
        source: Box<SeedError>,
    },

    #[error("User interaction error: {0}")]
    Interaction(String),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl From<dialoguer::Error> for SeedError {
    fn from(err: dialoguer::Error) -> Self {
        SeedError::Interaction(err.to_string())
    }
}

impl SeedError {
    /// Server error code, looking through step wrappers
    pub fn command_code(&self) -> Option<i32> {
        match self {
            SeedError::Command { code, .. } => Some(*code),
            SeedError::StepFailed { source, .. } => source.command_code(),
            _ => None,
        }
    }
}

/// Centralized Result type for clusterseed operations
pub type SeedResult<T> = std::result::Result<T, SeedError>;

/// Extension trait for Result to add context to errors
pub trait ResultExt<T, E> {
    /// Add context to an error
    fn with_context<C, F>(self, context: F) -> SeedResult<T>
    where
        F: FnOnce() -> C + Send + Sync,
        C: fmt::Display + Send + Sync + 'static;
}

impl<T, E> ResultExt<T, E> for std::result::Result<T, E>
where
    E: StdError + Send + Sync + 'static,
{
    fn with_context<C, F>(self, context: F) -> SeedResult<T>
    where
        F: FnOnce() -> C + Send + Sync,
        C: fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|err| SeedError::Anyhow(anyhow::Error::new(err).context(context())))
    }
}
