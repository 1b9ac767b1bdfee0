mod config;
mod elasticity;
mod history;
mod key;
mod map;
mod outcome;
mod range;
mod row;

pub use config::{
    ChannelFractions, ConfigurationError, EngineConfig, InputFilter, RangeTable, SelectionConfig,
    SmoothingConfig, SolverConfig, Steepening, UnifyConfig,
};
pub use elasticity::{
    ElasticityObservation, ElasticityRecord, ElasticitySummary, SmoothedElasticity,
    SmoothingMethod,
};
pub use history::{CovariateObservation, PriceObservation, UnifiedCovariate, UnifiedPrice};
pub use key::GroupKey;
pub use map::Map;
pub use outcome::{ModelKind, OptimizationResult};
pub use range::PriceRange;
pub use row::{
    Covariate, CovariateKind, Covariates, DataError, Levels, NEUTRAL_ELASTICITY, PricingRow,
    RawCovariate, RawPricingRow,
};
