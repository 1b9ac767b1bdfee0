use crate::BatchError;
use crate::demand::{self, DemandModel, Isoelastic, Linear};
use crate::optimize::{RowError, RowOptimizer};
use crate::policy::price_range;
use crate::select::{ModelSelector, Selection};
use rpo_core::models::{
    ConfigurationError, ElasticitySummary, EngineConfig, GroupKey, OptimizationResult,
    PriceObservation, PriceRange, PricingRow, RawPricingRow,
};
use rpo_core::ports::OptimizationRepository;
use time::Date;
use tracing::{Level, event, instrument, span};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// A row that produced no result, and why
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Exclusion {
    /// The row's identity
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub key: GroupKey,
    /// The row's week, if it had one
    pub week: Option<Date>,
    /// A human-readable reason
    pub reason: String,
}

impl Exclusion {
    fn new(key: &GroupKey, week: Option<Date>, error: &RowError) -> Self {
        event!(
            Level::WARN,
            item = %key.item_id,
            zone = %key.zone_id,
            channel = %key.channel_id,
            reason = %error,
            "row excluded"
        );
        Self {
            key: key.clone(),
            week,
            reason: error.to_string(),
        }
    }
}

/// Everything a batch run produced
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BatchReport {
    /// Results under both models, approximate results first
    pub results: Vec<OptimizationResult>,
    /// The results matching each group's selected model
    pub selected: Vec<OptimizationResult>,
    /// The model selection per group
    pub selections: Vec<Selection>,
    /// Rows that were validated or optimized unsuccessfully
    pub excluded: Vec<Exclusion>,
    /// Rows removed by the input filter
    pub filtered_out: usize,
    /// Results whose solve did not converge
    pub non_converged: usize,
}

/// Runs the whole optimization over a snapshot of the warehouse.
#[derive(Clone, Debug)]
pub struct BatchDriver {
    config: EngineConfig,
    optimizer: RowOptimizer,
    selector: ModelSelector,
    linear: Linear,
    isoelastic: Isoelastic,
}

impl BatchDriver {
    /// Create a driver, validating the configuration
    pub fn new(config: EngineConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        let optimizer = RowOptimizer::new(config.solver.clone(), config.min_margin);
        let selector = ModelSelector::new(config.selection.clone());
        let (linear, isoelastic) = demand::models(&config.steepening, config.neutral_elasticity);
        Ok(Self {
            config,
            optimizer,
            selector,
            linear,
            isoelastic,
        })
    }

    /// The engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Filter, validate and attach a price range to every raw row.
    ///
    /// Returns the usable rows, the excluded rows and the number of rows
    /// removed by the input filter.
    pub fn prepare(
        &self,
        rows: &[RawPricingRow],
    ) -> (Vec<(PricingRow, PriceRange)>, Vec<Exclusion>, usize) {
        let mut prepared = Vec::with_capacity(rows.len());
        let mut excluded = Vec::new();
        let mut filtered_out = 0;

        for raw in rows {
            if !self.config.filter.admits(raw) {
                filtered_out += 1;
                continue;
            }
            let outcome = raw
                .validate(self.config.neutral_elasticity)
                .map_err(RowError::from)
                .and_then(|row| {
                    let range = price_range(
                        &self.config.ranges,
                        &row.category,
                        &row.key.channel_id,
                        row.avg_unit_price,
                    )?;
                    Ok((row, range))
                });
            match outcome {
                Ok(pair) => prepared.push(pair),
                Err(error) => excluded.push(Exclusion::new(&raw.key, raw.week, &error)),
            }
        }

        (prepared, excluded, filtered_out)
    }

    fn optimize_row(
        &self,
        row: &PricingRow,
        range: PriceRange,
    ) -> Result<(OptimizationResult, OptimizationResult), RowError> {
        let approximate = self
            .optimizer
            .optimize(row, &self.linear as &dyn DemandModel, range)?;
        let exact = self.optimizer.optimize(row, &self.isoelastic, range)?;
        Ok((approximate, exact))
    }

    /// Optimize every row under both models. Rows are independent and are
    /// solved in parallel when the `parallel` feature is enabled.
    pub fn optimize(
        &self,
        prepared: &[(PricingRow, PriceRange)],
    ) -> (Vec<OptimizationResult>, Vec<Exclusion>) {
        #[cfg(feature = "parallel")]
        let outcomes: Vec<_> = prepared
            .par_iter()
            .map(|(row, range)| self.optimize_row(row, *range))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let outcomes: Vec<_> = prepared
            .iter()
            .map(|(row, range)| self.optimize_row(row, *range))
            .collect();

        let mut approximate = Vec::with_capacity(outcomes.len());
        let mut exact = Vec::with_capacity(outcomes.len());
        let mut excluded = Vec::new();
        for ((row, _), outcome) in prepared.iter().zip(outcomes) {
            match outcome {
                Ok((a, e)) => {
                    approximate.push(a);
                    exact.push(e);
                }
                Err(error) => excluded.push(Exclusion::new(&row.key, Some(row.week), &error)),
            }
        }

        approximate.append(&mut exact);
        (approximate, excluded)
    }

    /// Run every stage over in-memory inputs
    pub fn run(
        &self,
        rows: &[RawPricingRow],
        summaries: &[ElasticitySummary],
        history: &[PriceObservation],
    ) -> BatchReport {
        let (prepared, mut excluded, filtered_out) = {
            let _span = span!(Level::INFO, "prepare", rows = rows.len()).entered();
            self.prepare(rows)
        };

        let (results, mut failed) = {
            let _span = span!(Level::INFO, "optimize", rows = prepared.len()).entered();
            self.optimize(&prepared)
        };
        excluded.append(&mut failed);

        let selections = self.selector.select(summaries, history);
        let selected = ModelSelector::filter(results.clone(), &selections);
        let non_converged = results.iter().filter(|result| !result.converged).count();

        event!(
            Level::INFO,
            rows = rows.len(),
            filtered_out,
            excluded = excluded.len(),
            results = results.len(),
            selected = selected.len(),
            non_converged,
            "batch complete"
        );

        BatchReport {
            results,
            selected,
            selections: selections.into_iter().map(|(_, selection)| selection).collect(),
            excluded,
            filtered_out,
            non_converged,
        }
    }
}

/// Read a warehouse snapshot, optimize it, and replace the output table with
/// the selected results.
///
/// Repository failures abort the run; row-level failures only exclude rows.
#[instrument(level = "info", skip_all)]
pub async fn run_batch<R: OptimizationRepository>(
    repo: &R,
    driver: &BatchDriver,
) -> Result<BatchReport, BatchError<R::Error>> {
    let rows = repo.pricing_rows().await.map_err(BatchError::Repository)?;
    let summaries = repo
        .elasticity_summaries()
        .await
        .map_err(BatchError::Repository)?;
    let history = repo.price_history().await.map_err(BatchError::Repository)?;

    let report = driver.run(&rows, &summaries, &history);

    repo.replace_optimization_results(&report.selected)
        .await
        .map_err(BatchError::Repository)?;

    Ok(report)
}
