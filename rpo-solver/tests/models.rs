use approx::assert_relative_eq;
use rpo_core::models::{
    Covariate, Covariates, GroupKey, Levels, PriceRange, PricingRow, SolverConfig,
};
use rpo_solver::demand::DemandModel;
use rpo_solver::optimize::RowOptimizer;
use rstest::*;
use rstest_reuse::{self, *};
use time::macros::date;

use all_models::all_models;

fn row(elasticity: f64, covariates: Covariates) -> PricingRow {
    PricingRow {
        key: GroupKey::new("4410", "Z07", "PU"),
        week: date!(2024 - 02 - 12),
        category: "FRUTAS Y VERDURAS".into(),
        avg_unit_price: 32.0,
        unit_cost: 21.0,
        unit_sales: 410.0,
        historical_elasticity: elasticity,
        covariates,
    }
}

/// Every coefficient at or below the neutral threshold
fn quiet() -> Covariates {
    let covariate = |elasticity| Covariate {
        elasticity,
        pct_change: 3.0,
        levels: Some(Levels {
            current: 110.0,
            baseline: 100.0,
        }),
    };
    Covariates {
        occupation: covariate(0.2),
        fx: covariate(-0.2),
        cpi: covariate(0.05),
        gdp: covariate(0.0),
    }
}

#[apply(all_models)]
#[rstest]
fn demand_at_average_is_observed_sales(
    model: impl DemandModel,
    #[values(-2.4, -1.2, -0.6, 0.1)] e: f64,
) {
    let row = row(e, quiet());
    assert_relative_eq!(model.demand(&row, 32.0), 410.0, max_relative = 1e-12);
}

#[apply(all_models)]
#[rstest]
fn demand_falls_with_price_for_negative_elasticity(model: impl DemandModel) {
    let row = row(-1.4, quiet());
    let mut last = f64::INFINITY;
    for cents in (3000..=3400).step_by(25) {
        let demand = model.demand(&row, cents as f64 / 100.0);
        assert!(demand < last);
        last = demand;
    }
}

#[apply(all_models)]
#[rstest]
fn optimum_is_admissible(model: impl DemandModel, #[values(-3.1, -1.6, -1.0, -0.3, 0.25)] e: f64) {
    let row = row(e, quiet());
    let range = PriceRange::around(32.0, 0.05);
    let optimizer = RowOptimizer::new(SolverConfig::default(), 0.01);

    let result = optimizer.optimize(&row, &model, range).unwrap();
    assert!(range.contains(result.suggested_price));
    assert!(result.suggested_price >= 21.01);
    assert!(result.iterations >= 1);
    // the seed is admissible, so the optimum can only improve on it
    assert!(result.predicted_profit >= result.baseline_profit - 1e-6);
}
