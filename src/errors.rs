use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Browser launch failed: {0}")]
    LaunchFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("JavaScript execution failed: {0}")]
    JavaScriptFailed(String),

    #[error("Cookie rejected: {0}")]
    CookieRejected(String),

    #[error("Cookie store error: {0}")]
    CookieStore(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Anyhow error: {0}")]
    AnyhowError(String),
}

pub type Result<T> = std::result::Result<T, SessionError>;

// Convert anyhow::Error to SessionError
impl From<anyhow::Error> for SessionError {
    fn from(err: anyhow::Error) -> Self {
        SessionError::AnyhowError(err.to_string())
    }
}

impl SessionError {
    /// Shorten a driver error for per-item log lines.
    pub fn truncated(&self, max: usize) -> String {
        truncate_message(&self.to_string(), max)
    }
}

pub fn truncate_message(msg: &str, max: usize) -> String {
    if msg.len() <= max {
        return msg.to_string();
    }
    let mut end = max;
    while !msg.is_char_boundary(end) {
        end -= 1;
    }
    msg[..end].to_string()
}
