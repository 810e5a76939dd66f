// src/error.rs
use thiserror::Error;

/// Result type used throughout the cloudmetrics library
pub type Result<T> = std::result::Result<T, MetricsError>;

/// Custom Error type for the cloudmetrics library
#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Registry error: {0}")]
    Registry(String),

    #[error("Sink error: {0}")]
    Sink(String),

    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("Region error: {0}")]
    Region(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl MetricsError {
    /// Wrap a lock poisoning failure
    pub(crate) fn poisoned(what: &str) -> Self {
        MetricsError::Other(format!("{} lock poisoned", what))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            MetricsError::poisoned("registry").to_string(),
            "Other error: registry lock poisoned"
        );
        assert_eq!(
            MetricsError::Timeout("slow".to_string()).to_string(),
            "Timeout error: slow"
        );
    }
}
