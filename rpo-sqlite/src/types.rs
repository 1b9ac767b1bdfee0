//! Row types mirroring the warehouse tables.
//!
//! Each struct decodes one table row with [`sqlx::FromRow`] and converts
//! into the corresponding model of `rpo_core`.

use rpo_core::models::{
    CovariateKind, CovariateObservation, ElasticityObservation, ElasticitySummary, GroupKey,
    ModelKind, OptimizationResult, PriceObservation, RawCovariate, RawPricingRow,
    SmoothedElasticity, SmoothingMethod, UnifiedCovariate, UnifiedPrice,
};
use time::Date;

/// A `pricing_input` row
#[derive(Debug, sqlx::FromRow)]
#[allow(missing_docs)]
pub struct PricingInputRow {
    pub item_id: String,
    pub zone_id: String,
    pub channel_id: String,
    pub week: Option<Date>,
    pub category: Option<String>,
    pub avg_unit_price: Option<f64>,
    pub unit_cost: Option<f64>,
    pub unit_sales: Option<f64>,
    pub historical_elasticity: Option<f64>,
    pub occupation_elasticity: Option<f64>,
    pub occupation_pct_change: Option<f64>,
    pub occupation_current: Option<f64>,
    pub occupation_baseline: Option<f64>,
    pub fx_elasticity: Option<f64>,
    pub fx_pct_change: Option<f64>,
    pub fx_current: Option<f64>,
    pub fx_baseline: Option<f64>,
    pub cpi_elasticity: Option<f64>,
    pub cpi_pct_change: Option<f64>,
    pub cpi_current: Option<f64>,
    pub cpi_baseline: Option<f64>,
    pub gdp_elasticity: Option<f64>,
    pub gdp_pct_change: Option<f64>,
    pub gdp_current: Option<f64>,
    pub gdp_baseline: Option<f64>,
}

impl From<PricingInputRow> for RawPricingRow {
    fn from(row: PricingInputRow) -> Self {
        let covariate = |elasticity, pct_change, current_level, baseline_level| RawCovariate {
            elasticity,
            pct_change,
            current_level,
            baseline_level,
        };
        Self {
            key: GroupKey::new(row.item_id, row.zone_id, row.channel_id),
            week: row.week,
            category: row.category,
            avg_unit_price: row.avg_unit_price,
            unit_cost: row.unit_cost,
            unit_sales: row.unit_sales,
            historical_elasticity: row.historical_elasticity,
            occupation: covariate(
                row.occupation_elasticity,
                row.occupation_pct_change,
                row.occupation_current,
                row.occupation_baseline,
            ),
            fx: covariate(
                row.fx_elasticity,
                row.fx_pct_change,
                row.fx_current,
                row.fx_baseline,
            ),
            cpi: covariate(
                row.cpi_elasticity,
                row.cpi_pct_change,
                row.cpi_current,
                row.cpi_baseline,
            ),
            gdp: covariate(
                row.gdp_elasticity,
                row.gdp_pct_change,
                row.gdp_current,
                row.gdp_baseline,
            ),
        }
    }
}

/// An `elasticity_history` row
#[derive(Debug, sqlx::FromRow)]
#[allow(missing_docs)]
pub struct ElasticityHistoryRow {
    pub item_id: String,
    pub zone_id: String,
    pub channel_id: String,
    pub week: Date,
    pub weekly_elasticity: Option<f64>,
    pub historical_elasticity: Option<f64>,
    pub sample_count: Option<i64>,
}

impl TryFrom<ElasticityHistoryRow> for ElasticityObservation {
    type Error = sqlx::Error;

    fn try_from(row: ElasticityHistoryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            sample_count: sample_count(row.sample_count)?,
            key: GroupKey::new(row.item_id, row.zone_id, row.channel_id),
            week: row.week,
            weekly_elasticity: row.weekly_elasticity,
            historical_elasticity: row.historical_elasticity,
        })
    }
}

/// The elasticity columns read by the model selector
#[derive(Debug, sqlx::FromRow)]
#[allow(missing_docs)]
pub struct SummaryRow {
    pub item_id: String,
    pub zone_id: String,
    pub channel_id: String,
    pub week: Date,
    pub historical_elasticity: f64,
    pub sample_count: Option<i64>,
}

impl TryFrom<SummaryRow> for ElasticitySummary {
    type Error = sqlx::Error;

    fn try_from(row: SummaryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            sample_count: sample_count(row.sample_count)?,
            key: GroupKey::new(row.item_id, row.zone_id, row.channel_id),
            week: row.week,
            historical_elasticity: row.historical_elasticity,
        })
    }
}

/// A `price_history` row
#[derive(Debug, sqlx::FromRow)]
#[allow(missing_docs)]
pub struct PriceHistoryRow {
    pub item_id: String,
    pub zone_id: String,
    pub channel_id: String,
    pub week: Date,
    pub avg_unit_price: f64,
}

impl From<PriceHistoryRow> for PriceObservation {
    fn from(row: PriceHistoryRow) -> Self {
        Self {
            key: GroupKey::new(row.item_id, row.zone_id, row.channel_id),
            week: row.week,
            avg_unit_price: row.avg_unit_price,
        }
    }
}

/// A `price_history_unified` row
#[derive(Debug, sqlx::FromRow)]
#[allow(missing_docs)]
pub struct UnifiedPriceRow {
    pub item_id: String,
    pub zone_id: String,
    pub channel_id: String,
    pub week: Date,
    pub raw_price: f64,
    pub avg_unit_price: f64,
    pub anchor_week: Date,
}

impl From<UnifiedPriceRow> for UnifiedPrice {
    fn from(row: UnifiedPriceRow) -> Self {
        Self {
            key: GroupKey::new(row.item_id, row.zone_id, row.channel_id),
            week: row.week,
            raw_price: row.raw_price,
            avg_unit_price: row.avg_unit_price,
            anchor_week: row.anchor_week,
        }
    }
}

/// A `covariate_history` row
#[derive(Debug, sqlx::FromRow)]
#[allow(missing_docs)]
pub struct CovariateRow {
    pub kind: String,
    pub series: String,
    pub date: Date,
    pub value: f64,
}

impl TryFrom<CovariateRow> for CovariateObservation {
    type Error = sqlx::Error;

    fn try_from(row: CovariateRow) -> Result<Self, Self::Error> {
        let kind: CovariateKind = row.kind.parse().map_err(decode_error)?;
        Ok(Self {
            kind,
            series: row.series,
            date: row.date,
            value: row.value,
        })
    }
}

/// A `covariate_history_unified` row
#[derive(Debug, sqlx::FromRow)]
#[allow(missing_docs)]
pub struct UnifiedCovariateRow {
    pub kind: String,
    pub series: String,
    pub date: Date,
    pub raw_value: f64,
    pub value: f64,
    pub anchor_date: Date,
}

impl TryFrom<UnifiedCovariateRow> for UnifiedCovariate {
    type Error = sqlx::Error;

    fn try_from(row: UnifiedCovariateRow) -> Result<Self, Self::Error> {
        let kind: CovariateKind = row.kind.parse().map_err(decode_error)?;
        Ok(Self {
            kind,
            series: row.series,
            date: row.date,
            raw_value: row.raw_value,
            value: row.value,
            anchor_date: row.anchor_date,
        })
    }
}

/// An `optimization_output` row
#[derive(Debug, sqlx::FromRow)]
#[allow(missing_docs)]
pub struct OutputRow {
    pub item_id: String,
    pub zone_id: String,
    pub channel_id: String,
    pub week: Date,
    pub current_price: f64,
    pub unit_cost: f64,
    pub baseline_demand: f64,
    pub baseline_profit: f64,
    pub suggested_price: f64,
    pub predicted_demand: f64,
    pub predicted_profit: f64,
    pub model: String,
    pub pct_price_change: f64,
    pub pct_profit_change: f64,
    pub converged: bool,
    pub iterations: i64,
}

impl TryFrom<OutputRow> for OptimizationResult {
    type Error = sqlx::Error;

    fn try_from(row: OutputRow) -> Result<Self, Self::Error> {
        let model: ModelKind = row.model.parse().map_err(decode_error)?;
        let iterations = u32::try_from(row.iterations).map_err(decode_error)?;
        Ok(Self {
            key: GroupKey::new(row.item_id, row.zone_id, row.channel_id),
            week: row.week,
            current_price: row.current_price,
            unit_cost: row.unit_cost,
            baseline_demand: row.baseline_demand,
            baseline_profit: row.baseline_profit,
            suggested_price: row.suggested_price,
            predicted_demand: row.predicted_demand,
            predicted_profit: row.predicted_profit,
            model,
            pct_price_change: row.pct_price_change,
            pct_profit_change: row.pct_profit_change,
            converged: row.converged,
            iterations,
        })
    }
}

/// An `elasticity_smoothed` row
#[derive(Debug, sqlx::FromRow)]
#[allow(missing_docs)]
pub struct SmoothedRow {
    #[sqlx(flatten)]
    pub observation: ElasticityHistoryRow,
    pub historical_elasticity_presmoothing: Option<f64>,
    pub smoothing_applied: bool,
    pub smoothing_method: String,
}

impl TryFrom<SmoothedRow> for SmoothedElasticity {
    type Error = sqlx::Error;

    fn try_from(row: SmoothedRow) -> Result<Self, Self::Error> {
        let smoothing_method: SmoothingMethod =
            row.smoothing_method.parse().map_err(decode_error)?;
        Ok(Self {
            observation: row.observation.try_into()?,
            historical_elasticity_presmoothing: row.historical_elasticity_presmoothing,
            smoothing_applied: row.smoothing_applied,
            smoothing_method,
        })
    }
}

/// A null count is a missing count; a negative one is corrupt.
fn sample_count(count: Option<i64>) -> Result<Option<u32>, sqlx::Error> {
    count
        .map(|n| {
            u32::try_from(n).map_err(|_| decode_error(format!("negative sample count {n}")))
        })
        .transpose()
}

fn decode_error(error: impl ToString) -> sqlx::Error {
    sqlx::Error::Decode(error.to_string().into())
}
