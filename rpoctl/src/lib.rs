#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

use rpo_core::models::{
    CovariateObservation, ElasticityObservation, ElasticitySummary, PriceObservation,
    RawPricingRow,
};
use rpo_solver::batch::BatchDriver;
use rpo_sqlite::Db;
use serde::{Deserialize, Serialize};
use std::io::{Write as _, stdout};
use std::path::PathBuf;

mod cli;
pub use cli::{Cli, Commands};

mod config;
pub use config::AppConfig;

mod io;
pub use io::{IOArgs, PathOrStd};

mod schedule;
pub use schedule::{Scheduler, next_anchor};

pub mod steps;
use steps::{FlowStatus, Step, run_flow, run_step};

/// Errors reported by the command-line driver itself
#[derive(thiserror::Error, Debug)]
pub enum CliError {
    /// The configuration file named on the command line is missing
    #[error("config file {} does not exist", .0.display())]
    MissingConfig(PathBuf),
    /// The schedule interval is zero
    #[error("schedule.every must be longer than zero")]
    ZeroInterval,
    /// Every step of a run failed
    #[error("every step of the run failed")]
    RunFailed,
}

/// The input of the offline `solve` command
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Snapshot {
    /// The pricing rows to optimize
    pub rows: Vec<RawPricingRow>,
    /// Elasticity summaries for the model selector
    pub summaries: Vec<ElasticitySummary>,
    /// Weekly prices for the volatility signal
    pub history: Vec<PriceObservation>,
}

/// The input of the `import` command. Absent tables are left untouched.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Dataset {
    /// Replaces `pricing_input`
    pub pricing_input: Option<Vec<RawPricingRow>>,
    /// Replaces `elasticity_history`
    pub elasticity_history: Option<Vec<ElasticityObservation>>,
    /// Replaces `price_history`
    pub price_history: Option<Vec<PriceObservation>>,
    /// Replaces `covariate_history`
    pub covariate_history: Option<Vec<CovariateObservation>>,
}

impl Dataset {
    /// Load every present table into the warehouse
    pub async fn load(&self, db: &Db) -> anyhow::Result<()> {
        if let Some(rows) = &self.pricing_input {
            db.load_pricing_rows(rows).await?;
            tracing::info!(rows = rows.len(), "pricing input loaded");
        }
        if let Some(rows) = &self.elasticity_history {
            db.load_elasticity_history(rows).await?;
            tracing::info!(rows = rows.len(), "elasticity history loaded");
        }
        if let Some(rows) = &self.price_history {
            db.load_price_history(rows).await?;
            tracing::info!(rows = rows.len(), "price history loaded");
        }
        if let Some(rows) = &self.covariate_history {
            db.load_covariate_history(rows).await?;
            tracing::info!(rows = rows.len(), "covariate history loaded");
        }
        Ok(())
    }
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let mut out = stdout().lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

impl Cli {
    /// Execute the parsed command
    pub async fn evaluate(self) -> anyhow::Result<()> {
        let AppConfig {
            database,
            engine,
            schedule,
        } = AppConfig::load(self.config.as_deref())?;

        let step = match self.command {
            Commands::Solve { io } => {
                let snapshot: Snapshot = serde_json::from_reader(io.read()?)?;
                let driver = BatchDriver::new(engine)?;
                let report = driver.run(&snapshot.rows, &snapshot.summaries, &snapshot.history);
                let mut output = io.write()?;
                serde_json::to_writer_pretty(&mut output, &report)?;
                writeln!(output)?;
                return Ok(());
            }
            Commands::Import { input } => {
                let dataset: Dataset = serde_json::from_reader(input.read()?)?;
                let db = Db::open(&database).await?;
                dataset.load(&db).await?;
                return Ok(());
            }
            Commands::Run { steps } => {
                let steps = if steps.is_empty() {
                    Step::DEFAULT.to_vec()
                } else {
                    steps
                };
                let db = Db::open(&database).await?;

                if schedule.every.is_some() {
                    return schedule
                        .schedule(async |_| {
                            let report = run_flow(&db, &engine, &steps).await;
                            print_json(&report)
                        })
                        .await;
                }

                let report = run_flow(&db, &engine, &steps).await;
                print_json(&report)?;
                if report.status == FlowStatus::Error {
                    return Err(CliError::RunFailed.into());
                }
                return Ok(());
            }
            Commands::Optimize => Step::Optimize,
            Commands::Smooth => Step::Smooth,
            Commands::Unify => Step::Unify,
        };

        let db = Db::open(&database).await?;
        let summary = run_step(&db, &engine, step).await?;
        print_json(&summary)
    }
}
