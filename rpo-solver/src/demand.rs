use rpo_core::models::{ModelKind, PricingRow, Steepening};

mod isoelastic;
mod linear;

pub use isoelastic::Isoelastic;
pub use linear::Linear;

/// A demand-response formulation.
///
/// Implementations map a candidate price to the units a row is expected to
/// sell at that price, given the row's historical elasticity and external
/// covariates. The optimizer only ever interacts with a model through this
/// trait.
pub trait DemandModel: Send + Sync {
    /// Which formulation this is
    fn kind(&self) -> ModelKind;

    /// Predicted units sold at `price`
    fn demand(&self, row: &PricingRow, price: f64) -> f64;

    /// Predicted profit at `price`
    fn profit(&self, row: &PricingRow, price: f64) -> f64 {
        self.demand(row, price) * (price - row.unit_cost)
    }
}

/// The elasticity in effect at `price`.
///
/// Demand becomes more responsive the further the price moves from the
/// observed average: `e * (1 + k * |p - avg| / avg)`, with `k` chosen from
/// the historical elasticity.
pub fn effective_elasticity(steepening: &Steepening, row: &PricingRow, price: f64) -> f64 {
    let e = row.historical_elasticity;
    let avg = row.avg_unit_price;
    let k = steepening.coefficient(e);
    e * (1.0 + k * (price - avg).abs() / avg)
}

/// Build both formulations from a shared calibration
pub fn models(steepening: &Steepening, neutral: f64) -> (Linear, Isoelastic) {
    (
        Linear::new(steepening.clone(), neutral),
        Isoelastic::new(steepening.clone(), neutral),
    )
}
