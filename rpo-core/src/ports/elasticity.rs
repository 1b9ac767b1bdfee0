use crate::models::{ElasticityObservation, SmoothedElasticity};

/// Repository interface for the elasticity smoothing step.
pub trait ElasticityRepository: super::Repository {
    /// Read the weekly elasticity history
    fn elasticity_observations(
        &self,
    ) -> impl Future<Output = Result<Vec<ElasticityObservation>, Self::Error>> + Send;

    /// Atomically replace the smoothed elasticity table
    fn replace_smoothed_elasticities(
        &self,
        rows: &[SmoothedElasticity],
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}
