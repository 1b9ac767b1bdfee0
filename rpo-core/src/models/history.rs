use super::{CovariateKind, GroupKey};
use time::Date;

/// One week of the observed price series for a group
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PriceObservation {
    /// The (item, zone, channel) identity
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub key: GroupKey,
    /// The week
    pub week: Date,
    /// Average unit price in that week
    pub avg_unit_price: f64,
}

/// A price observation after unification.
///
/// Small week-over-week fluctuations are flattened onto the price of the
/// most recent significant move, the anchor.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnifiedPrice {
    /// The (item, zone, channel) identity
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub key: GroupKey,
    /// The week
    pub week: Date,
    /// The price as observed
    pub raw_price: f64,
    /// The propagated anchor price
    pub avg_unit_price: f64,
    /// The week the anchor price was observed
    pub anchor_week: Date,
}

/// One observation of an external covariate series.
///
/// A series is identified by its covariate and a free-form label, such as
/// the state an occupation rate was measured in or `national`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CovariateObservation {
    /// Which covariate
    pub kind: CovariateKind,
    /// The series within that covariate
    pub series: String,
    /// The observation date
    pub date: Date,
    /// The observed level
    pub value: f64,
}

/// A covariate observation after unification
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnifiedCovariate {
    /// Which covariate
    pub kind: CovariateKind,
    /// The series within that covariate
    pub series: String,
    /// The observation date
    pub date: Date,
    /// The level as observed
    pub raw_value: f64,
    /// The propagated anchor level
    pub value: f64,
    /// The date the anchor level was observed
    pub anchor_date: Date,
}
