use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReloadrError {
    #[error("Browser not found. Please install Chrome, Chromium, Brave, or Edge.")]
    BrowserNotFound,

    #[error("Browser launch failed: {0}")]
    BrowserLaunchFailed(String),

    #[error("CDP connection failed: {0}")]
    CdpConnectionFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Refresh failed: {0}")]
    RefreshFailed(String),

    #[error("Browser session lost: {0}")]
    SessionLost(String),

    #[error("Invalid reload plan: {0}")]
    InvalidPlan(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ReloadrError>;
