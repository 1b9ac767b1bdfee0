use rpo_core::models::{
    ElasticityObservation, EngineConfig, GroupKey, ModelKind, PriceObservation, RawCovariate,
    RawPricingRow,
};
use rpo_sqlite::{Db, config::SqliteConfig};
use rpoctl::steps::{FlowStatus, Step, StepSummary, run_flow};
use rstest::*;
use time::{Duration, macros::date};

fn key() -> GroupKey {
    GroupKey::new("5001", "Z02", "MM")
}

fn covariate(elasticity: f64) -> RawCovariate {
    RawCovariate {
        elasticity: Some(elasticity),
        ..Default::default()
    }
}

#[fixture]
async fn warehouse() -> Db {
    let db = Db::open(&SqliteConfig::default()).await.unwrap();
    db.load_pricing_rows(&[RawPricingRow {
        key: key(),
        week: Some(date!(2024 - 06 - 03)),
        category: Some("CARNES FRÍAS".into()),
        avg_unit_price: Some(64.0),
        unit_cost: Some(41.0),
        unit_sales: Some(310.0),
        historical_elasticity: Some(-1.4),
        occupation: covariate(0.1),
        fx: covariate(-0.05),
        cpi: covariate(0.0),
        gdp: covariate(0.15),
    }])
    .await
    .unwrap();
    db.load_elasticity_history(
        &(0..4)
            .map(|week| ElasticityObservation {
                key: key(),
                week: date!(2024 - 05 - 06) + Duration::weeks(week),
                weekly_elasticity: Some(-1.4),
                historical_elasticity: Some(-1.4),
                sample_count: Some(14),
            })
            .collect::<Vec<_>>(),
    )
    .await
    .unwrap();
    db.load_price_history(
        &[64.0, 64.2, 63.9, 64.0]
            .iter()
            .enumerate()
            .map(|(week, &price)| PriceObservation {
                key: key(),
                week: date!(2024 - 05 - 06) + Duration::weeks(week as i64),
                avg_unit_price: price,
            })
            .collect::<Vec<_>>(),
    )
    .await
    .unwrap();
    db
}

#[rstest]
#[tokio::test]
async fn default_run_succeeds(#[future] warehouse: Db) {
    let db = warehouse.await;
    let report = run_flow(&db, &EngineConfig::default(), &Step::DEFAULT).await;

    assert_eq!(report.status, FlowStatus::Success);
    let steps: Vec<_> = report.steps.iter().map(|step| step.step).collect();
    assert_eq!(steps, Step::DEFAULT);
    match &report.steps[2].summary {
        Some(StepSummary::Optimize(summary)) => {
            assert_eq!(summary.results, 2);
            assert_eq!(summary.selected, 1);
        }
        other => panic!("unexpected summary {other:?}"),
    }
    assert_eq!(db.optimization_results().await.unwrap().len(), 1);
}

#[rstest]
#[tokio::test]
async fn failed_step_does_not_stop_the_run(#[future] warehouse: Db) {
    let db = warehouse.await;
    let mut engine = EngineConfig::default();
    engine.smoothing.window = 0;

    let report = run_flow(&db, &engine, &[Step::Optimize, Step::Unify]).await;

    assert_eq!(report.status, FlowStatus::PartialSuccess);
    assert!(!report.steps[0].succeeded());
    assert!(report.steps[1].succeeded());
    assert_eq!(db.unified_prices().await.unwrap().len(), 4);
    assert!(db.optimization_results().await.unwrap().is_empty());
}

#[rstest]
#[tokio::test]
async fn run_fails_when_every_step_fails(#[future] warehouse: Db) {
    let db = warehouse.await;
    let mut engine = EngineConfig::default();
    engine.smoothing.window = 0;

    let report = run_flow(&db, &engine, &[Step::Optimize]).await;

    assert_eq!(report.status, FlowStatus::Error);
    assert!(report.steps[0].error.is_some());
}

#[rstest]
#[tokio::test]
async fn selection_reads_the_unified_prices() {
    let key = GroupKey::new("5002", "Z02", "PU");
    let db = Db::open(&SqliteConfig::default()).await.unwrap();
    db.load_pricing_rows(&[RawPricingRow {
        key: key.clone(),
        week: Some(date!(2024 - 06 - 03)),
        category: Some("FRUTAS Y VERDURAS".into()),
        avg_unit_price: Some(10.55),
        unit_cost: Some(7.2),
        unit_sales: Some(540.0),
        historical_elasticity: Some(-0.5),
        occupation: covariate(0.0),
        fx: covariate(0.0),
        cpi: covariate(0.0),
        gdp: covariate(0.0),
    }])
    .await
    .unwrap();
    db.load_elasticity_history(
        &(0..3)
            .map(|week| ElasticityObservation {
                key: key.clone(),
                week: date!(2024 - 05 - 13) + Duration::weeks(week),
                weekly_elasticity: Some(-0.5),
                historical_elasticity: Some(-0.5),
                sample_count: Some(3),
            })
            .collect::<Vec<_>>(),
    )
    .await
    .unwrap();
    // the raw series moves 4.6% at most; unified, the last move is 5.5%
    db.load_price_history(
        &[10.0, 10.09, 10.55]
            .iter()
            .enumerate()
            .map(|(week, &price)| PriceObservation {
                key: key.clone(),
                week: date!(2024 - 05 - 13) + Duration::weeks(week as i64),
                avg_unit_price: price,
            })
            .collect::<Vec<_>>(),
    )
    .await
    .unwrap();

    let report = run_flow(&db, &EngineConfig::default(), &Step::DEFAULT).await;
    assert_eq!(report.status, FlowStatus::Success);

    let unified: Vec<f64> = db
        .unified_prices()
        .await
        .unwrap()
        .iter()
        .map(|row| row.avg_unit_price)
        .collect();
    assert_eq!(unified, vec![10.0, 10.0, 10.55]);

    let written = db.optimization_results().await.unwrap();
    assert_eq!(written.len(), 1);
    assert_eq!(written[0].model, ModelKind::Exact);
}
