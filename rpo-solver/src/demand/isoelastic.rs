use super::{DemandModel, effective_elasticity};
use rpo_core::models::{ModelKind, PricingRow, Steepening};

/// The exact formulation: a constant-elasticity power law.
///
/// `demand = sales * (p / avg)^e_eff * Π (current / baseline)^coef`, where
/// covariates with a neutral coefficient contribute a factor of one.
#[derive(Clone, Debug)]
pub struct Isoelastic {
    steepening: Steepening,
    neutral: f64,
}

impl Isoelastic {
    /// Create the model
    pub fn new(steepening: Steepening, neutral: f64) -> Self {
        Self {
            steepening,
            neutral,
        }
    }

    /// The multiplicative covariate factor
    pub fn external_factor(&self, row: &PricingRow) -> f64 {
        row.covariates
            .iter()
            .filter(|(_, covariate)| !covariate.is_neutral(self.neutral))
            .map(|(_, covariate)| {
                // validated rows always carry levels for active covariates
                covariate
                    .levels
                    .map_or(1.0, |levels| levels.ratio().powf(covariate.elasticity))
            })
            .product()
    }
}

impl DemandModel for Isoelastic {
    fn kind(&self) -> ModelKind {
        ModelKind::Exact
    }

    fn demand(&self, row: &PricingRow, price: f64) -> f64 {
        let elasticity = effective_elasticity(&self.steepening, row, price);
        row.unit_sales * (price / row.avg_unit_price).powf(elasticity) * self.external_factor(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demand::tests::{plain_row, row_with_occupation};
    use approx::assert_relative_eq;

    #[test]
    fn neutral_covariates_are_ignored() {
        let model = Isoelastic::new(Steepening::default(), 0.2);
        let row = row_with_occupation(-0.2, 10.0, (60.0, 50.0));
        assert_eq!(model.external_factor(&row), 1.0);
        assert_relative_eq!(model.demand(&row, 20.0), 150.0);
    }

    #[test]
    fn active_covariate_scales_demand() {
        let model = Isoelastic::new(Steepening::default(), 0.2);
        let row = row_with_occupation(0.5, 0.0, (64.0, 16.0));
        assert_relative_eq!(model.external_factor(&row), 2.0);
        assert_relative_eq!(model.demand(&row, 20.0), 300.0);
    }

    #[test]
    fn follows_power_law() {
        let model = Isoelastic::new(Steepening::default(), 0.2);
        let row = plain_row(100.0, 60.0, 200.0, -0.5);
        // k = 3, 10% up: e_eff = -0.5 * 1.3
        assert_relative_eq!(
            model.demand(&row, 110.0),
            200.0 * 1.1f64.powf(-0.65),
            max_relative = 1e-12
        );
    }
}
