use super::GroupKey;
use time::Date;

/// One weekly elasticity estimate for a group.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElasticityObservation {
    /// The (item, zone, channel) identity
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub key: GroupKey,
    /// The week of the estimate
    pub week: Date,
    /// The elasticity estimated from that week alone
    pub weekly_elasticity: Option<f64>,
    /// The elasticity estimated over the full history
    pub historical_elasticity: Option<f64>,
    /// The number of weekly samples behind `historical_elasticity`
    pub sample_count: Option<u32>,
}

impl ElasticityObservation {
    /// The model-selection input carried by this observation, if it has a
    /// usable historical elasticity.
    pub fn summary(&self) -> Option<ElasticitySummary> {
        let historical_elasticity = self.historical_elasticity.filter(|e| e.is_finite())?;
        Some(ElasticitySummary {
            key: self.key.clone(),
            week: self.week,
            sample_count: self.sample_count,
            historical_elasticity,
        })
    }
}

/// How (if at all) an anomalous elasticity was repaired
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum SmoothingMethod {
    /// No replacement was made
    #[default]
    None,
    /// Mean of the trailing moving average
    MovingAverage,
    /// Mean of the exponentially weighted series
    Exponential,
}

impl SmoothingMethod {
    /// The label stored in the warehouse
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::MovingAverage => "moving_average",
            Self::Exponential => "exponential",
        }
    }
}

impl std::str::FromStr for SmoothingMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "moving_average" => Ok(Self::MovingAverage),
            "exponential" => Ok(Self::Exponential),
            other => Err(format!("unknown smoothing method `{other}`")),
        }
    }
}

/// The smoothing decision for one group.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElasticityRecord {
    /// The (item, zone, channel) identity
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub key: GroupKey,
    /// Mean of the weekly elasticities
    pub raw_mean: f64,
    /// Mean of the trailing moving average, if any window was full
    pub moving_average_mean: Option<f64>,
    /// Mean of the exponentially weighted series, if it was computed
    pub exponential_mean: Option<f64>,
    /// The method selected
    pub method: SmoothingMethod,
    /// The replacement value; `None` unless `applied`
    pub adjusted: Option<f64>,
    /// Whether the group's historical elasticity is replaced
    pub applied: bool,
}

/// An elasticity observation after smoothing, as written back to the warehouse.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SmoothedElasticity {
    /// The observation, with `historical_elasticity` replaced when smoothing applied
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub observation: ElasticityObservation,
    /// The historical elasticity as it was read
    pub historical_elasticity_presmoothing: Option<f64>,
    /// Whether the group's value was replaced
    pub smoothing_applied: bool,
    /// The method used for the replacement
    pub smoothing_method: SmoothingMethod,
}

/// The per-group input to the elasticity signal of the model selector
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElasticitySummary {
    /// The (item, zone, channel) identity
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub key: GroupKey,
    /// The week the summary was computed for
    pub week: Date,
    /// Number of weekly samples behind the estimate
    pub sample_count: Option<u32>,
    /// The historical elasticity
    pub historical_elasticity: f64,
}
