use thiserror::Error;

/// Top-level error type for the AlloyPro copilot.
///
/// Each variant names the subsystem that failed. Subsystem crates either use
/// these variants directly or define their own error type with a
/// `From<AlloyError>` conversion so `?` works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AlloyError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Order error: {0}")]
    Orders(String),

    #[error("Dictation error: {0}")]
    Dictation(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Workflow error: {0}")]
    Workflow(String),

    #[error("Procurement error: {0}")]
    Procurement(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for AlloyError {
    fn from(err: toml::de::Error) -> Self {
        AlloyError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for AlloyError {
    fn from(err: toml::ser::Error) -> Self {
        AlloyError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for AlloyError {
    fn from(err: serde_json::Error) -> Self {
        AlloyError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for AlloyPro operations.
pub type Result<T> = std::result::Result<T, AlloyError>;
