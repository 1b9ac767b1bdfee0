//! The sequential step runner.

use clap::ValueEnum;
use rpo_core::models::EngineConfig;
use rpo_core::ports::Warehouse;
use rpo_solver::{
    batch::{BatchDriver, BatchReport, run_batch},
    smooth::{ElasticitySmoother, SmoothingReport, run_smoothing},
    unify::{UnifyReport, Unifier, run_unification},
};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{Instrument as _, Level, event, span};

/// One pipeline step
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Price series unification
    Unify,
    /// Elasticity smoothing
    Smooth,
    /// Row optimization and model selection
    Optimize,
}

impl Step {
    /// The order a full run executes the steps in
    pub const DEFAULT: [Step; 3] = [Step::Unify, Step::Smooth, Step::Optimize];
}

/// The counts reported by an optimization step
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizeSummary {
    /// Results computed, under both models
    pub results: usize,
    /// Results written to the output table
    pub selected: usize,
    /// Rows excluded by validation or the solver
    pub excluded: usize,
    /// Rows removed by the input filter
    pub filtered_out: usize,
    /// Results whose solve did not converge
    pub non_converged: usize,
}

impl From<&BatchReport> for OptimizeSummary {
    fn from(report: &BatchReport) -> Self {
        Self {
            results: report.results.len(),
            selected: report.selected.len(),
            excluded: report.excluded.len(),
            filtered_out: report.filtered_out,
            non_converged: report.non_converged,
        }
    }
}

/// What a successful step reports
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum StepSummary {
    #[allow(missing_docs)]
    Unify(UnifyReport),
    #[allow(missing_docs)]
    Smooth(SmoothingReport),
    #[allow(missing_docs)]
    Optimize(OptimizeSummary),
}

/// Run a single step against the warehouse
pub async fn run_step<W: Warehouse>(
    warehouse: &W,
    engine: &EngineConfig,
    step: Step,
) -> anyhow::Result<StepSummary> {
    Ok(match step {
        Step::Unify => {
            let unifier = Unifier::new(engine.unify.clone());
            StepSummary::Unify(run_unification(warehouse, &unifier).await?)
        }
        Step::Smooth => {
            let smoother = ElasticitySmoother::new(engine.smoothing.clone());
            StepSummary::Smooth(run_smoothing(warehouse, &smoother).await?)
        }
        Step::Optimize => {
            let driver = BatchDriver::new(engine.clone())?;
            let report = run_batch(warehouse, &driver).await?;
            StepSummary::Optimize(OptimizeSummary::from(&report))
        }
    })
}

/// The outcome of one step within a run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    /// The step
    pub step: Step,
    /// Wall-clock duration
    #[serde(with = "humantime_serde")]
    pub elapsed: Duration,
    /// The step's summary on success
    pub summary: Option<StepSummary>,
    /// The error message on failure
    pub error: Option<String>,
}

impl StepReport {
    /// Whether the step succeeded
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// The overall outcome of a run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowStatus {
    /// Every step succeeded
    Success,
    /// Some, but not all, steps failed
    PartialSuccess,
    /// Every step failed
    Error,
}

impl FlowStatus {
    /// Classify a run from its step outcomes. A run with no steps succeeds.
    pub fn classify(steps: &[StepReport]) -> Self {
        let failed = steps.iter().filter(|step| !step.succeeded()).count();
        if failed == 0 {
            Self::Success
        } else if failed == steps.len() {
            Self::Error
        } else {
            Self::PartialSuccess
        }
    }
}

/// Everything a run produced
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlowReport {
    /// The overall outcome
    pub status: FlowStatus,
    /// Total wall-clock duration
    #[serde(with = "humantime_serde")]
    pub elapsed: Duration,
    /// One entry per requested step, in execution order
    pub steps: Vec<StepReport>,
}

/// Run `steps` in order. A failed step is recorded and the run continues
/// with the next one.
pub async fn run_flow<W: Warehouse>(
    warehouse: &W,
    engine: &EngineConfig,
    steps: &[Step],
) -> FlowReport {
    let started = Instant::now();
    let mut reports = Vec::with_capacity(steps.len());

    for &step in steps {
        let span = span!(Level::INFO, "step", ?step);
        let step_started = Instant::now();
        let outcome = run_step(warehouse, engine, step).instrument(span).await;
        let elapsed = step_started.elapsed();

        let report = match outcome {
            Ok(summary) => {
                event!(Level::INFO, ?step, ?elapsed, "step succeeded");
                StepReport {
                    step,
                    elapsed,
                    summary: Some(summary),
                    error: None,
                }
            }
            Err(error) => {
                let message = format!("{error:#}");
                event!(Level::ERROR, ?step, ?elapsed, error = %message, "step failed");
                StepReport {
                    step,
                    elapsed,
                    summary: None,
                    error: Some(message),
                }
            }
        };
        reports.push(report);
    }

    let status = FlowStatus::classify(&reports);
    event!(Level::INFO, ?status, steps = reports.len(), "run complete");
    FlowReport {
        status,
        elapsed: started.elapsed(),
        steps: reports,
    }
}
