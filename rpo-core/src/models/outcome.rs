use super::GroupKey;
use time::Date;

/// The demand-response formulation a result was computed under
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum ModelKind {
    /// Linear percent-change adjustment around the current price
    Approximate,
    /// Isoelastic (constant-elasticity) power law
    Exact,
}

impl ModelKind {
    /// The label stored in the warehouse
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approximate => "approximate",
            Self::Exact => "exact",
        }
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ModelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approximate" => Ok(Self::Approximate),
            "exact" => Ok(Self::Exact),
            other => Err(format!("unknown model kind `{other}`")),
        }
    }
}

/// The proposed price for one row under one demand model.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OptimizationResult {
    /// The (item, zone, channel) identity
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub key: GroupKey,
    /// The week of the source row
    pub week: Date,
    /// The observed average unit price
    pub current_price: f64,
    /// The unit cost
    pub unit_cost: f64,
    /// Demand implied by the model at the current price
    pub baseline_demand: f64,
    /// Profit implied by the model at the current price
    pub baseline_profit: f64,
    /// The optimal price found
    pub suggested_price: f64,
    /// Demand implied by the model at the suggested price
    pub predicted_demand: f64,
    /// Profit implied by the model at the suggested price
    pub predicted_profit: f64,
    /// The model used
    pub model: ModelKind,
    /// 100 * (suggested - current) / current
    pub pct_price_change: f64,
    /// 100 * (predicted_profit - baseline_profit) / baseline_profit
    pub pct_profit_change: f64,
    /// Whether the solver reported convergence
    pub converged: bool,
    /// Solver iterations used
    pub iterations: u32,
}
