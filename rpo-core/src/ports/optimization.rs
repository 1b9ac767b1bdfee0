use crate::models::{ElasticitySummary, OptimizationResult, PriceObservation, RawPricingRow};

/// Repository interface for the optimization step.
///
/// The optimization step reads the pricing rows together with the inputs of
/// the model selector, and replaces the output table with the selected
/// results.
pub trait OptimizationRepository: super::Repository {
    /// Read every pricing row, in storage order.
    ///
    /// Rows are returned in their nullable form; validation is the engine's
    /// responsibility.
    fn pricing_rows(&self) -> impl Future<Output = Result<Vec<RawPricingRow>, Self::Error>> + Send;

    /// Read the per-group elasticity summaries used by the model selector.
    fn elasticity_summaries(
        &self,
    ) -> impl Future<Output = Result<Vec<ElasticitySummary>, Self::Error>> + Send;

    /// Read the weekly price history used by the volatility signal.
    ///
    /// This is the unified series when one has been written, so that moves
    /// the unification step flattened do not count as volatility.
    fn price_history(
        &self,
    ) -> impl Future<Output = Result<Vec<PriceObservation>, Self::Error>> + Send;

    /// Replace the contents of the output table with `results`.
    ///
    /// The replace is atomic: on error the previous contents are kept.
    fn replace_optimization_results(
        &self,
        results: &[OptimizationResult],
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}
