use super::{Map, RawPricingRow};
use thiserror::Error;
use time::Date;

/// The ways in which the engine configuration can be unusable
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigurationError {
    /// The category has no entry in the price-range table
    #[error("unknown category `{0}`")]
    UnknownCategory(String),
    /// A range fraction is outside of [0, 1)
    #[error("invalid range fraction {value} for category `{category}`, channel {channel}")]
    InvalidFraction {
        /// The category
        category: String,
        /// The channel column
        channel: &'static str,
        /// The offending value
        value: f64,
    },
    /// A scalar parameter is out of its domain
    #[error("invalid value {value} for `{parameter}`")]
    InvalidParameter {
        /// The parameter name
        parameter: &'static str,
        /// The offending value
        value: f64,
    },
}

/// The channels with a dedicated column in the price-range table
const CHANNELS: [&str; 4] = ["PU", "MM", "MA", "DI"];

/// The maximum fractional price move for a category, by sales channel.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "UPPERCASE")
)]
pub struct ChannelFractions {
    /// Public channel; also the fallback for unrecognized channels
    pub pu: f64,
    /// Half-wholesale channel
    pub mm: f64,
    /// Wholesale channel
    pub ma: f64,
    /// Distributor channel
    pub di: f64,
}

impl ChannelFractions {
    const fn new(pu: f64, mm: f64, ma: f64, di: f64) -> Self {
        Self { pu, mm, ma, di }
    }

    /// The fraction for `channel`. Channels without a column use the public
    /// (`PU`) column.
    pub fn get(&self, channel: &str) -> f64 {
        match channel {
            "MM" => self.mm,
            "MA" => self.ma,
            "DI" => self.di,
            _ => self.pu,
        }
    }

    fn columns(&self) -> [f64; 4] {
        [self.pu, self.mm, self.ma, self.di]
    }
}

/// The category × channel table of admissible price moves.
///
/// Construction validates that every fraction lies in `[0, 1)`, so that
/// every derived price range is strictly positive.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(
        try_from = "Map<String, ChannelFractions>",
        into = "Map<String, ChannelFractions>"
    )
)]
pub struct RangeTable(Map<String, ChannelFractions>);

impl RangeTable {
    /// Validate and wrap a table
    pub fn new(table: Map<String, ChannelFractions>) -> Result<Self, ConfigurationError> {
        for (category, fractions) in table.iter() {
            for (channel, value) in CHANNELS.into_iter().zip(fractions.columns()) {
                if !(0.0..1.0).contains(&value) {
                    return Err(ConfigurationError::InvalidFraction {
                        category: category.clone(),
                        channel,
                        value,
                    });
                }
            }
        }
        Ok(Self(table))
    }

    /// Look up the fraction for a category and channel.
    ///
    /// An unknown category is an error; an unknown channel falls back to the
    /// public column.
    pub fn fraction(&self, category: &str, channel: &str) -> Result<f64, ConfigurationError> {
        self.0
            .get(category)
            .map(|fractions| fractions.get(channel))
            .ok_or_else(|| ConfigurationError::UnknownCategory(category.to_owned()))
    }

    /// The categories present in the table
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl TryFrom<Map<String, ChannelFractions>> for RangeTable {
    type Error = ConfigurationError;

    fn try_from(value: Map<String, ChannelFractions>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RangeTable> for Map<String, ChannelFractions> {
    fn from(value: RangeTable) -> Self {
        value.0
    }
}

impl Default for RangeTable {
    fn default() -> Self {
        let wide = ChannelFractions::new(0.06, 0.05, 0.04, 0.03);
        let standard = ChannelFractions::new(0.05, 0.04, 0.03, 0.02);
        let narrow = ChannelFractions::new(0.04, 0.03, 0.02, 0.01);
        let offal = ChannelFractions::new(0.08, 0.06, 0.05, 0.04);

        Self(
            [
                ("ABARROTES COMESTIBLES", standard),
                ("LÁCTEOS", narrow),
                ("ABARROTES INSTITUCIONAL", wide),
                ("COMIDAS PREPARADAS", standard),
                ("CONGELADOS", standard),
                ("RES", wide),
                ("BEBIDAS NO ALCOHÓLICAS", narrow),
                ("ABARROTES NO COMESTIBLES", wide),
                ("VÍSCERAS Y OTROS", offal),
                ("CERDO", wide),
                ("FRUTAS Y VERDURAS", standard),
                ("CARNES FRÍAS", standard),
                ("MADURADOS", wide),
                ("CREMAS Y YOGHURTS", narrow),
                ("PESCADOS Y MARISCOS", wide),
                ("AVES", standard),
            ]
            .into_iter()
            .map(|(category, fractions)| (category.to_owned(), fractions))
            .collect(),
        )
    }
}

/// The piecewise-constant steepening coefficient `k` used to make demand
/// more price-sensitive the further the price moves from its current level.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct Steepening {
    /// `(upper bound on the elasticity, k)` pairs, checked in order
    pub thresholds: Vec<(f64, f64)>,
    /// `k` for elasticities above every threshold
    pub fallback: f64,
}

impl Default for Steepening {
    fn default() -> Self {
        Self {
            thresholds: vec![(-1.5, 8.0), (-1.0, 5.0), (-0.2, 3.0)],
            fallback: 3.0,
        }
    }
}

impl Steepening {
    /// The coefficient for a historical elasticity
    pub fn coefficient(&self, elasticity: f64) -> f64 {
        self.thresholds
            .iter()
            .find(|(bound, _)| elasticity <= *bound)
            .map_or(self.fallback, |(_, k)| *k)
    }
}

/// Parameters of the elasticity smoother
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct SmoothingConfig {
    /// Upper edge of the anomaly band `(0, threshold_hi]`
    pub threshold_hi: f64,
    /// Lower edge of the acceptable range `[lim_neg, 0]`
    pub lim_neg: f64,
    /// Moving-average window length
    pub window: usize,
    /// Exponential smoothing factor
    pub alpha: f64,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            threshold_hi: 0.5,
            lim_neg: -3.0,
            window: 3,
            alpha: 0.3,
        }
    }
}

/// Thresholds of the model selector
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct SelectionConfig {
    /// Sample count at or above which the exact model is preferred
    pub min_samples: u32,
    /// Elasticity magnitude above which the exact model is preferred
    pub elasticity_magnitude: f64,
    /// Maximum week-over-week relative price move above which the exact model is preferred
    pub volatility: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            min_samples: 12,
            elasticity_magnitude: 2.0,
            volatility: 0.05,
        }
    }
}

/// Parameters of series unification
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct UnifyConfig {
    /// Relative moves strictly below this value are flattened onto the anchor
    pub tolerance: f64,
}

impl Default for UnifyConfig {
    fn default() -> Self {
        Self { tolerance: 0.01 }
    }
}

/// Which warehouse rows enter an optimization run
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct InputFilter {
    /// Only rows from this week onward
    pub since: Option<Date>,
    /// Channels that are never optimized
    pub excluded_channels: Vec<String>,
}

impl Default for InputFilter {
    fn default() -> Self {
        Self {
            since: None,
            excluded_channels: vec!["CO".to_owned()],
        }
    }
}

impl InputFilter {
    /// Whether a row enters the run. Rows without a week are admitted so that
    /// validation can report them.
    pub fn admits(&self, row: &RawPricingRow) -> bool {
        if self
            .excluded_channels
            .iter()
            .any(|channel| *channel == row.key.channel_id)
        {
            return false;
        }
        match (self.since, row.week) {
            (Some(since), Some(week)) => week >= since,
            _ => true,
        }
    }
}

/// Parameters of the scalar SQP solver
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct SolverConfig {
    /// Iteration cap
    pub max_iterations: u32,
    /// Convergence tolerance on the objective change
    pub ftol: f64,
    /// Relative step used for finite-difference derivatives
    pub fd_step: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            ftol: 1e-6,
            fd_step: 1.4901161193847656e-8,
        }
    }
}

/// Every tunable constant of the engine.
///
/// The defaults reproduce the production calibration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct EngineConfig {
    /// Covariate coefficients at or below this magnitude are ignored
    pub neutral_elasticity: f64,
    /// Effective-elasticity steepening
    pub steepening: Steepening,
    /// Required gap between price and cost
    pub min_margin: f64,
    /// Elasticity smoothing
    pub smoothing: SmoothingConfig,
    /// Model selection
    pub selection: SelectionConfig,
    /// Series unification
    pub unify: UnifyConfig,
    /// Input filtering
    pub filter: InputFilter,
    /// Price-range table
    pub ranges: RangeTable,
    /// Solver parameters
    pub solver: SolverConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            neutral_elasticity: super::NEUTRAL_ELASTICITY,
            steepening: Steepening::default(),
            min_margin: 0.01,
            smoothing: SmoothingConfig::default(),
            selection: SelectionConfig::default(),
            unify: UnifyConfig::default(),
            filter: InputFilter::default(),
            ranges: RangeTable::default(),
            solver: SolverConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Check the scalar parameters. The range table is validated on construction.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let checks = [
            ("neutral_elasticity", self.neutral_elasticity, self.neutral_elasticity >= 0.0),
            ("min_margin", self.min_margin, self.min_margin >= 0.0),
            (
                "smoothing.threshold_hi",
                self.smoothing.threshold_hi,
                self.smoothing.threshold_hi > 0.0,
            ),
            ("smoothing.lim_neg", self.smoothing.lim_neg, self.smoothing.lim_neg < 0.0),
            ("smoothing.window", self.smoothing.window as f64, self.smoothing.window > 0),
            (
                "smoothing.alpha",
                self.smoothing.alpha,
                self.smoothing.alpha > 0.0 && self.smoothing.alpha <= 1.0,
            ),
            ("selection.volatility", self.selection.volatility, self.selection.volatility >= 0.0),
            ("unify.tolerance", self.unify.tolerance, self.unify.tolerance >= 0.0),
            ("solver.ftol", self.solver.ftol, self.solver.ftol > 0.0),
            ("solver.fd_step", self.solver.fd_step, self.solver.fd_step > 0.0),
        ];

        for (parameter, value, ok) in checks {
            if !ok || !value.is_finite() {
                return Err(ConfigurationError::InvalidParameter { parameter, value });
            }
        }
        Ok(())
    }
}
