use rpo_core::models::ConfigurationError;
use thiserror::Error;

/// The errors that abort a pipeline step.
///
/// Row-level problems never surface here: they exclude the row and are
/// reported alongside the results.
#[derive(Debug, Error)]
pub enum BatchError<E: std::error::Error + 'static> {
    /// The warehouse failed to read or write
    #[error("repository error: {0}")]
    Repository(#[source] E),
    /// The engine configuration is unusable
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
}
