use crate::BatchError;
use rpo_core::models::{
    CovariateObservation, Map, PriceObservation, UnifiedCovariate, UnifiedPrice, UnifyConfig,
};
use rpo_core::ports::PriceHistoryRepository;
use tracing::{Level, event, instrument};

/// Flatten sub-threshold moves onto the most recent significant value.
///
/// The first value is the initial anchor. Each later value whose relative
/// change against the anchor is strictly below `tolerance` is replaced by
/// the anchor; any other value becomes the new anchor. Returns, for each
/// input, the propagated value and the index of its anchor.
pub fn propagate(series: &[f64], tolerance: f64) -> Vec<(f64, usize)> {
    let mut output = Vec::with_capacity(series.len());
    let mut anchor: Option<(f64, usize)> = None;
    for (index, &value) in series.iter().enumerate() {
        let next = match anchor {
            Some((anchored, at)) if ((value - anchored) / anchored).abs() < tolerance => {
                (anchored, at)
            }
            _ => (value, index),
        };
        output.push(next);
        anchor = Some(next);
    }
    output
}

/// Removes price noise from weekly series so that elasticity estimation
/// only sees meaningful moves.
#[derive(Clone, Debug, Default)]
pub struct Unifier {
    config: UnifyConfig,
}

impl Unifier {
    /// Create a unifier
    pub fn new(config: UnifyConfig) -> Self {
        Self { config }
    }

    /// Unify every group's weekly series.
    ///
    /// Groups appear in order of first appearance, each sorted by week.
    pub fn unify_prices(&self, observations: &[PriceObservation]) -> Vec<UnifiedPrice> {
        let groups =
            Map::grouped(observations.iter().map(|observation| (&observation.key, observation)));

        let mut unified = Vec::with_capacity(observations.len());
        for (_, mut weeks) in groups {
            weeks.sort_by_key(|observation| observation.week);
            let prices: Vec<f64> = weeks.iter().map(|o| o.avg_unit_price).collect();
            for (observation, (price, anchor)) in weeks
                .iter()
                .zip(propagate(&prices, self.config.tolerance))
            {
                unified.push(UnifiedPrice {
                    key: observation.key.clone(),
                    week: observation.week,
                    raw_price: observation.avg_unit_price,
                    avg_unit_price: price,
                    anchor_week: weeks[anchor].week,
                });
            }
        }
        unified
    }

    /// Unify every external covariate series.
    ///
    /// A series is a `(kind, series)` pair; series appear in order of first
    /// appearance, each sorted by date.
    pub fn unify_covariates(
        &self,
        observations: &[CovariateObservation],
    ) -> Vec<UnifiedCovariate> {
        let series = Map::grouped(observations.iter().map(|observation| {
            let id = (observation.kind, observation.series.as_str());
            (id, observation)
        }));

        let mut unified = Vec::with_capacity(observations.len());
        for (_, mut dates) in series {
            dates.sort_by_key(|observation| observation.date);
            let values: Vec<f64> = dates.iter().map(|o| o.value).collect();
            for (observation, (value, anchor)) in dates
                .iter()
                .zip(propagate(&values, self.config.tolerance))
            {
                unified.push(UnifiedCovariate {
                    kind: observation.kind,
                    series: observation.series.clone(),
                    date: observation.date,
                    raw_value: observation.value,
                    value,
                    anchor_date: dates[anchor].date,
                });
            }
        }
        unified
    }
}

/// Summary of a unification step
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnifyReport {
    /// Observations written
    pub observations: usize,
    /// Observations whose price was replaced by an earlier anchor
    pub flattened: usize,
    /// Covariate observations written
    pub covariates: usize,
    /// Covariate observations whose level was replaced by an earlier anchor
    pub covariates_flattened: usize,
}

/// Read the raw price and covariate series, unify them, and replace both
/// unified tables.
#[instrument(level = "info", skip_all)]
pub async fn run_unification<R: PriceHistoryRepository>(
    repo: &R,
    unifier: &Unifier,
) -> Result<UnifyReport, BatchError<R::Error>> {
    let prices = repo
        .raw_price_history()
        .await
        .map_err(BatchError::Repository)?;
    let covariates = repo
        .raw_covariate_history()
        .await
        .map_err(BatchError::Repository)?;

    let unified_prices = unifier.unify_prices(&prices);
    let unified_covariates = unifier.unify_covariates(&covariates);

    repo.replace_unified_prices(&unified_prices)
        .await
        .map_err(BatchError::Repository)?;
    repo.replace_unified_covariates(&unified_covariates)
        .await
        .map_err(BatchError::Repository)?;

    let report = UnifyReport {
        observations: unified_prices.len(),
        flattened: unified_prices
            .iter()
            .filter(|row| row.anchor_week != row.week)
            .count(),
        covariates: unified_covariates.len(),
        covariates_flattened: unified_covariates
            .iter()
            .filter(|row| row.anchor_date != row.date)
            .count(),
    };
    event!(
        Level::INFO,
        observations = report.observations,
        flattened = report.flattened,
        covariates = report.covariates,
        covariates_flattened = report.covariates_flattened,
        "series unified"
    );
    Ok(report)
}
