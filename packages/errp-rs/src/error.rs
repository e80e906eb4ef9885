use thiserror::Error;

#[derive(Error, Debug)]
pub enum ErrpError {
    #[error("Download of {url} failed: {reason}")]
    Network { url: String, reason: String },

    #[error("Download of {url} failed with HTTP status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("Malformed recording {path}: {reason}")]
    Format { path: String, reason: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Input file not found: {0}")]
    FileNotFound(String),

    #[error("Incompatible epoch sets: {0}")]
    Incompatible(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl ErrpError {
    pub(crate) fn format(path: impl Into<String>, reason: impl Into<String>) -> Self {
        ErrpError::Format {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// True for failures reaching the remote archive.
    pub fn is_network(&self) -> bool {
        matches!(self, ErrpError::Network { .. } | ErrpError::HttpStatus { .. })
    }

    /// True for errors caused by caller-supplied parameters.
    pub fn is_config(&self) -> bool {
        matches!(self, ErrpError::Config(_))
    }
}

pub type Result<T> = std::result::Result<T, ErrpError>;
