use super::GroupKey;
use thiserror::Error;
use time::Date;

/// Covariate coefficients at or below this magnitude are treated as
/// statistically indistinguishable from zero.
pub const NEUTRAL_ELASTICITY: f64 = 0.2;

/// The external macroeconomic signals that shift demand independently of price
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum CovariateKind {
    /// Regional occupation (employment) rate
    Occupation,
    /// Exchange rate
    ExchangeRate,
    /// National consumer price index
    PriceIndex,
    /// Gross domestic product
    Gdp,
}

impl CovariateKind {
    /// Every covariate, in the order the models accumulate them
    pub const ALL: [Self; 4] = [
        Self::Occupation,
        Self::ExchangeRate,
        Self::PriceIndex,
        Self::Gdp,
    ];

    /// The label stored in the warehouse
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Occupation => "occupation",
            Self::ExchangeRate => "exchange_rate",
            Self::PriceIndex => "price_index",
            Self::Gdp => "gdp",
        }
    }

    /// The field names used when reporting a data error on this covariate:
    /// (elasticity, pct_change, current_level, baseline_level)
    fn fields(self) -> [&'static str; 4] {
        match self {
            Self::Occupation => [
                "occupation.elasticity",
                "occupation.pct_change",
                "occupation.current_level",
                "occupation.baseline_level",
            ],
            Self::ExchangeRate => [
                "fx.elasticity",
                "fx.pct_change",
                "fx.current_level",
                "fx.baseline_level",
            ],
            Self::PriceIndex => [
                "cpi.elasticity",
                "cpi.pct_change",
                "cpi.current_level",
                "cpi.baseline_level",
            ],
            Self::Gdp => [
                "gdp.elasticity",
                "gdp.pct_change",
                "gdp.current_level",
                "gdp.baseline_level",
            ],
        }
    }
}

impl std::fmt::Display for CovariateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CovariateKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown covariate `{s}`"))
    }
}

/// The ways in which a warehouse row can be unusable
#[derive(Clone, Debug, Error, PartialEq)]
pub enum DataError {
    /// A required value is null
    #[error("missing value for `{0}`")]
    Missing(&'static str),
    /// A required value is NaN or infinite
    #[error("non-finite value for `{0}`")]
    NonFinite(&'static str),
    /// A value that must be strictly positive is not
    #[error("`{field}` must be positive, got {value}")]
    NonPositive {
        /// The offending field
        field: &'static str,
        /// The value found
        value: f64,
    },
    /// A value that must be non-negative is not
    #[error("`{field}` must not be negative, got {value}")]
    Negative {
        /// The offending field
        field: &'static str,
        /// The value found
        value: f64,
    },
}

/// A nullable covariate as it is stored in the warehouse.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct RawCovariate {
    /// Demand elasticity with respect to the covariate
    pub elasticity: Option<f64>,
    /// Percent change of the covariate over the evaluation window (linear model)
    pub pct_change: Option<f64>,
    /// The covariate level for the evaluation window (isoelastic model)
    pub current_level: Option<f64>,
    /// The reference covariate level (isoelastic model)
    pub baseline_level: Option<f64>,
}

/// A pair of covariate levels used by the multiplicative demand model
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Levels {
    /// The covariate level for the evaluation window
    pub current: f64,
    /// The reference covariate level
    pub baseline: f64,
}

impl Levels {
    /// current / baseline
    pub fn ratio(&self) -> f64 {
        self.current / self.baseline
    }
}

/// A validated covariate.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Covariate {
    /// Demand elasticity with respect to the covariate
    pub elasticity: f64,
    /// Percent change of the covariate; `0.0` (and unused) when the covariate is neutral
    pub pct_change: f64,
    /// Raw levels; absent only when the covariate is neutral
    pub levels: Option<Levels>,
}

impl Covariate {
    /// Whether the coefficient is small enough to be excluded from the demand models
    pub fn is_neutral(&self, threshold: f64) -> bool {
        self.elasticity.abs() <= threshold
    }
}

impl RawCovariate {
    fn validate(&self, kind: CovariateKind, neutral: f64) -> Result<Covariate, DataError> {
        let [f_elasticity, f_pct, f_current, f_baseline] = kind.fields();

        let elasticity = finite(self.elasticity, f_elasticity)?;

        // A neutral covariate contributes nothing to either model, so its
        // remaining fields are not required.
        if elasticity.abs() <= neutral {
            let levels = match (self.current_level, self.baseline_level) {
                (Some(current), Some(baseline))
                    if current.is_finite() && baseline.is_finite() && baseline > 0.0 =>
                {
                    Some(Levels { current, baseline })
                }
                _ => None,
            };
            return Ok(Covariate {
                elasticity,
                pct_change: self.pct_change.filter(|x| x.is_finite()).unwrap_or(0.0),
                levels,
            });
        }

        let pct_change = finite(self.pct_change, f_pct)?;
        let current = positive(finite(self.current_level, f_current)?, f_current)?;
        let baseline = positive(finite(self.baseline_level, f_baseline)?, f_baseline)?;

        Ok(Covariate {
            elasticity,
            pct_change,
            levels: Some(Levels { current, baseline }),
        })
    }
}

/// The four covariates attached to each pricing row
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Covariates {
    /// Occupation rate
    pub occupation: Covariate,
    /// Exchange rate
    pub fx: Covariate,
    /// Consumer price index
    pub cpi: Covariate,
    /// Gross domestic product
    pub gdp: Covariate,
}

impl Covariates {
    /// Look up a covariate by kind
    pub fn get(&self, kind: CovariateKind) -> &Covariate {
        match kind {
            CovariateKind::Occupation => &self.occupation,
            CovariateKind::ExchangeRate => &self.fx,
            CovariateKind::PriceIndex => &self.cpi,
            CovariateKind::Gdp => &self.gdp,
        }
    }

    /// Iterate the covariates in accumulation order
    pub fn iter(&self) -> impl Iterator<Item = (CovariateKind, &Covariate)> {
        CovariateKind::ALL.into_iter().map(|kind| (kind, self.get(kind)))
    }
}

/// A pricing row as read from the warehouse, where any value may be null.
///
/// The only way to obtain a [`PricingRow`] is through [`RawPricingRow::validate`],
/// so that incomplete rows are excluded with a reason instead of being
/// silently zero-filled.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct RawPricingRow {
    /// The (item, zone, channel) identity
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub key: GroupKey,
    /// The week the aggregate belongs to
    pub week: Option<Date>,
    /// The article category, used for the price-range lookup
    pub category: Option<String>,
    /// Average unit price over the window
    pub avg_unit_price: Option<f64>,
    /// Unit cost
    pub unit_cost: Option<f64>,
    /// Units sold at `avg_unit_price`
    pub unit_sales: Option<f64>,
    /// Own-price elasticity of demand (typically negative)
    pub historical_elasticity: Option<f64>,
    /// Occupation rate covariate
    pub occupation: RawCovariate,
    /// Exchange rate covariate
    pub fx: RawCovariate,
    /// Consumer price index covariate
    pub cpi: RawCovariate,
    /// GDP covariate
    pub gdp: RawCovariate,
}

/// One observed (item, zone, channel) aggregate, with every field the
/// demand models need.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PricingRow {
    /// The (item, zone, channel) identity
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub key: GroupKey,
    /// The week the aggregate belongs to
    pub week: Date,
    /// The article category
    pub category: String,
    /// Average unit price (> 0)
    pub avg_unit_price: f64,
    /// Unit cost (> 0)
    pub unit_cost: f64,
    /// Units sold at the average price (≥ 0)
    pub unit_sales: f64,
    /// Own-price elasticity of demand
    pub historical_elasticity: f64,
    /// External covariates
    pub covariates: Covariates,
}

impl RawPricingRow {
    /// Check that every value required by the demand models is present and
    /// finite. Covariates whose coefficient magnitude is at most `neutral`
    /// are excluded from the models and are therefore not required.
    pub fn validate(&self, neutral: f64) -> Result<PricingRow, DataError> {
        let week = self.week.ok_or(DataError::Missing("week"))?;
        let category = self
            .category
            .clone()
            .ok_or(DataError::Missing("category"))?;

        let avg_unit_price = positive(
            finite(self.avg_unit_price, "avg_unit_price")?,
            "avg_unit_price",
        )?;
        let unit_cost = positive(finite(self.unit_cost, "unit_cost")?, "unit_cost")?;
        let unit_sales = finite(self.unit_sales, "unit_sales")?;
        if unit_sales < 0.0 {
            return Err(DataError::Negative {
                field: "unit_sales",
                value: unit_sales,
            });
        }
        let historical_elasticity =
            finite(self.historical_elasticity, "historical_elasticity")?;

        let covariates = Covariates {
            occupation: self
                .occupation
                .validate(CovariateKind::Occupation, neutral)?,
            fx: self.fx.validate(CovariateKind::ExchangeRate, neutral)?,
            cpi: self.cpi.validate(CovariateKind::PriceIndex, neutral)?,
            gdp: self.gdp.validate(CovariateKind::Gdp, neutral)?,
        };

        Ok(PricingRow {
            key: self.key.clone(),
            week,
            category,
            avg_unit_price,
            unit_cost,
            unit_sales,
            historical_elasticity,
            covariates,
        })
    }
}

fn finite(value: Option<f64>, field: &'static str) -> Result<f64, DataError> {
    match value {
        None => Err(DataError::Missing(field)),
        Some(x) if !x.is_finite() => Err(DataError::NonFinite(field)),
        Some(x) => Ok(x),
    }
}

fn positive(value: f64, field: &'static str) -> Result<f64, DataError> {
    if value > 0.0 {
        Ok(value)
    } else {
        Err(DataError::NonPositive { field, value })
    }
}
