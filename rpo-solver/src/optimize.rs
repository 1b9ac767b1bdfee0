use crate::demand::DemandModel;
use crate::sqp::Sqp;
use rpo_core::models::{
    ConfigurationError, DataError, OptimizationResult, PriceRange, PricingRow, SolverConfig,
};
use thiserror::Error;
use tracing::{Level, event};

/// Why a row produced no result
#[derive(Clone, Debug, Error, PartialEq)]
pub enum RowError {
    /// The row is incomplete or malformed
    #[error(transparent)]
    Data(#[from] DataError),
    /// The row's category has no price range
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// No admissible price clears the cost floor
    #[error("cost {unit_cost} plus margin exceeds the maximum price {price_max}")]
    Infeasible {
        /// The row's unit cost
        unit_cost: f64,
        /// The top of the price range
        price_max: f64,
    },
}

/// Relative distance between the solver's answer and its projection above
/// which the answer is not reported as converged
const PROJECTION_TOL: f64 = 1e-6;

/// Finds the profit-maximizing price of one row under one demand model.
#[derive(Clone, Debug)]
pub struct RowOptimizer {
    solver: Sqp,
    min_margin: f64,
}

impl RowOptimizer {
    /// Create an optimizer. Suggested prices will exceed the unit cost by at least `min_margin`.
    pub fn new(config: SolverConfig, min_margin: f64) -> Self {
        Self {
            solver: Sqp::new(config),
            min_margin,
        }
    }

    /// The price interval that satisfies both the range and the cost floor
    pub fn feasible_range(
        &self,
        row: &PricingRow,
        range: PriceRange,
    ) -> Result<PriceRange, RowError> {
        range
            .with_floor(row.unit_cost + self.min_margin)
            .ok_or(RowError::Infeasible {
                unit_cost: row.unit_cost,
                price_max: range.price_max,
            })
    }

    /// Maximize `model.profit` over `range`, subject to `price - min_margin ≥ unit_cost`,
    /// starting from the row's average unit price.
    ///
    /// Solver failures do not abort the row: the best price found is projected
    /// onto the feasible interval and the result is flagged as not converged.
    pub fn optimize(
        &self,
        row: &PricingRow,
        model: &dyn DemandModel,
        range: PriceRange,
    ) -> Result<OptimizationResult, RowError> {
        let feasible = self.feasible_range(row, range)?;

        let avg = row.avg_unit_price;
        let cost = row.unit_cost;

        let baseline_profit = model.profit(row, avg);
        let baseline_demand = implied_demand(baseline_profit, avg, cost);

        let floor = |price: f64| price - self.min_margin - cost;
        let solution = self.solver.minimize(
            |price| -model.profit(row, price),
            avg,
            (range.price_min, range.price_max),
            &[&floor],
        );

        let suggested_price = feasible.clamp(solution.x);
        let projected = (suggested_price - solution.x).abs()
            > PROJECTION_TOL * suggested_price.abs().max(1.0);
        let converged = solution.status.is_converged() && !projected;

        if !converged {
            event!(
                Level::WARN,
                item = %row.key.item_id,
                zone = %row.key.zone_id,
                channel = %row.key.channel_id,
                model = %model.kind(),
                status = ?solution.status,
                iterations = solution.iterations,
                projected,
                "optimization did not converge",
            );
        }

        let predicted_profit = model.profit(row, suggested_price);
        let predicted_demand = implied_demand(predicted_profit, suggested_price, cost);

        Ok(OptimizationResult {
            key: row.key.clone(),
            week: row.week,
            current_price: avg,
            unit_cost: cost,
            baseline_demand,
            baseline_profit,
            suggested_price,
            predicted_demand,
            predicted_profit,
            model: model.kind(),
            pct_price_change: 100.0 * (suggested_price - avg) / avg,
            pct_profit_change: pct_change(baseline_profit, predicted_profit),
            converged,
            iterations: solution.iterations,
        })
    }
}

/// Demand recovered from profit and unit margin; zero when the margin is zero
fn implied_demand(profit: f64, price: f64, cost: f64) -> f64 {
    if price == cost {
        0.0
    } else {
        profit / (price - cost)
    }
}

/// Percent change from `baseline`; zero when there is no baseline to compare against
fn pct_change(baseline: f64, value: f64) -> f64 {
    if baseline == 0.0 {
        0.0
    } else {
        100.0 * (value - baseline) / baseline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demand::tests::plain_row;
    use crate::demand::{Isoelastic, Linear};
    use approx::assert_relative_eq;
    use rpo_core::models::{ModelKind, Steepening};
    use rstest::*;

    #[fixture]
    fn optimizer() -> RowOptimizer {
        RowOptimizer::new(SolverConfig::default(), 0.01)
    }

    fn linear() -> Linear {
        Linear::new(Steepening::default(), 0.2)
    }

    fn isoelastic() -> Isoelastic {
        Isoelastic::new(Steepening::default(), 0.2)
    }

    #[rstest]
    #[case(-0.3)]
    #[case(-1.1)]
    #[case(-1.6)]
    #[case(-3.5)]
    #[case(0.4)]
    fn suggested_price_is_admissible(optimizer: RowOptimizer, #[case] elasticity: f64) {
        let row = plain_row(50.0, 30.0, 100.0, elasticity);
        let range = PriceRange::around(50.0, 0.06);
        for model in [&linear() as &dyn DemandModel, &isoelastic()] {
            let result = optimizer.optimize(&row, model, range).unwrap();
            assert!(range.contains(result.suggested_price));
            assert!(result.suggested_price >= 30.0 + 0.01);
            assert_eq!(result.model, model.kind());
        }
    }

    #[rstest]
    fn zero_margin_gives_zero_baseline_demand(optimizer: RowOptimizer) {
        let row = plain_row(40.0, 40.0, 80.0, -0.8);
        let range = PriceRange::around(40.0, 0.05);
        let result = optimizer.optimize(&row, &linear(), range).unwrap();
        assert_eq!(result.baseline_demand, 0.0);
        assert_eq!(result.baseline_profit, 0.0);
        assert_eq!(result.pct_profit_change, 0.0);
        assert!(result.suggested_price >= 40.01);
    }

    #[rstest]
    fn inelastic_demand_prices_at_the_top(optimizer: RowOptimizer) {
        // With positive elasticity every price increase raises both demand and margin
        let row = plain_row(20.0, 12.0, 150.0, 0.4);
        let range = PriceRange::around(20.0, 0.04);
        let result = optimizer.optimize(&row, &isoelastic(), range).unwrap();
        assert_relative_eq!(result.suggested_price, 20.8, epsilon = 1e-6);
        assert!(result.pct_profit_change > 0.0);
        assert!(result.converged);
    }

    #[rstest]
    fn profit_is_not_worse_than_baseline(optimizer: RowOptimizer) {
        let row = plain_row(100.0, 70.0, 500.0, -1.3);
        let range = PriceRange::around(100.0, 0.05);
        for model in [&linear() as &dyn DemandModel, &isoelastic()] {
            let result = optimizer.optimize(&row, model, range).unwrap();
            assert!(result.predicted_profit >= result.baseline_profit - 1e-6);
            assert_relative_eq!(
                result.predicted_demand,
                model.demand(&row, result.suggested_price),
                max_relative = 1e-9
            );
        }
    }

    #[rstest]
    fn cost_above_range_is_infeasible(optimizer: RowOptimizer) {
        let row = plain_row(10.0, 10.5, 10.0, -1.0);
        let range = PriceRange::around(10.0, 0.04);
        assert_eq!(
            optimizer.optimize(&row, &linear(), range),
            Err(RowError::Infeasible {
                unit_cost: 10.5,
                price_max: range.price_max
            })
        );
    }

    #[rstest]
    fn cost_floor_lifts_price(optimizer: RowOptimizer) {
        // cost sits inside the range, so the floor binds from below
        let row = plain_row(10.0, 10.2, 10.0, -3.0);
        let range = PriceRange::around(10.0, 0.05);
        let result = optimizer.optimize(&row, &linear(), range).unwrap();
        assert!(result.suggested_price >= 10.21 - 1e-12);
        assert_eq!(result.model, ModelKind::Approximate);
    }
}
