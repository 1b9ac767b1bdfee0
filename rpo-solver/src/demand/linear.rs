use super::{DemandModel, effective_elasticity};
use rpo_core::models::{ModelKind, PricingRow, Steepening};

/// The approximate formulation: a linear percent-change adjustment.
///
/// `demand = sales * (1 + (e_eff * 100 * (p - avg) / avg + Σ coef * pct_change) / 100)`,
/// where covariates with a neutral coefficient contribute nothing.
#[derive(Clone, Debug)]
pub struct Linear {
    steepening: Steepening,
    neutral: f64,
}

impl Linear {
    /// Create the model
    pub fn new(steepening: Steepening, neutral: f64) -> Self {
        Self {
            steepening,
            neutral,
        }
    }

    /// The covariate contribution, in percent
    pub fn external_adjustment(&self, row: &PricingRow) -> f64 {
        row.covariates
            .iter()
            .filter(|(_, covariate)| !covariate.is_neutral(self.neutral))
            .map(|(_, covariate)| covariate.elasticity * covariate.pct_change)
            .sum()
    }
}

impl DemandModel for Linear {
    fn kind(&self) -> ModelKind {
        ModelKind::Approximate
    }

    fn demand(&self, row: &PricingRow, price: f64) -> f64 {
        let avg = row.avg_unit_price;
        let price_pct = 100.0 * (price - avg) / avg;
        let elasticity = effective_elasticity(&self.steepening, row, price);
        let pct = (elasticity * price_pct + self.external_adjustment(row)) / 100.0;
        row.unit_sales * (1.0 + pct)
    }
}
