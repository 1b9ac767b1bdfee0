use crate::models::{CovariateObservation, PriceObservation, UnifiedCovariate, UnifiedPrice};

/// Repository interface for the unification step.
pub trait PriceHistoryRepository: super::Repository {
    /// Read the raw weekly price history
    fn raw_price_history(
        &self,
    ) -> impl Future<Output = Result<Vec<PriceObservation>, Self::Error>> + Send;

    /// Atomically replace the unified price table
    fn replace_unified_prices(
        &self,
        rows: &[UnifiedPrice],
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Read the raw external covariate series
    fn raw_covariate_history(
        &self,
    ) -> impl Future<Output = Result<Vec<CovariateObservation>, Self::Error>> + Send;

    /// Atomically replace the unified covariate table
    fn replace_unified_covariates(
        &self,
        rows: &[UnifiedCovariate],
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}
