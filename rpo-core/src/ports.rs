mod elasticity;
mod history;
mod optimization;

pub use elasticity::ElasticityRepository;
pub use history::PriceHistoryRepository;
pub use optimization::OptimizationRepository;

/// Base trait for every warehouse port.
///
/// A warehouse is read in bulk at the start of a step and written as a
/// full-table replace at its end. Implementations report their own error
/// type; the engine treats any repository error as fatal for the step.
pub trait Repository: Send + Sync {
    /// The error type for the underlying storage
    type Error: std::error::Error + Send + Sync + 'static;
}

/// A warehouse that supports every pipeline step
pub trait Warehouse:
    OptimizationRepository + ElasticityRepository + PriceHistoryRepository
{
}

impl<T> Warehouse for T where
    T: OptimizationRepository + ElasticityRepository + PriceHistoryRepository
{
}
