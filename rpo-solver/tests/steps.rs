use rpo_core::models::{
    CovariateKind, CovariateObservation, ElasticityObservation, GroupKey, PriceObservation,
    SmoothingMethod,
};
use rpo_solver::BatchError;
use rpo_solver::smooth::{ElasticitySmoother, run_smoothing};
use rpo_solver::unify::{Unifier, run_unification};
use time::{Duration, macros::date};

mod warehouse;
use warehouse::MemoryWarehouse;

fn elasticities(item: &str, weekly: &[f64], historical: f64) -> Vec<ElasticityObservation> {
    weekly
        .iter()
        .enumerate()
        .map(|(i, &value)| ElasticityObservation {
            key: GroupKey::new(item, "Z02", "PU"),
            week: date!(2024 - 01 - 01) + Duration::weeks(i as i64),
            weekly_elasticity: Some(value),
            historical_elasticity: Some(historical),
            sample_count: Some(weekly.len() as u32),
        })
        .collect()
}

#[tokio::test]
async fn smoothing_replaces_the_smoothed_table() {
    let mut observations = elasticities("1", &[2.0, -1.0, -1.0, -1.0, 2.5], 0.3);
    observations.extend(elasticities("2", &[0.6, 0.7, 0.8], 0.7));
    let warehouse = MemoryWarehouse {
        observations,
        ..Default::default()
    };

    let report = run_smoothing(&warehouse, &ElasticitySmoother::default())
        .await
        .unwrap();
    assert_eq!(report.observations, 8);
    assert_eq!(report.groups, 2);
    assert_eq!(report.applied, 1);

    let smoothed = warehouse.smoothed.lock().unwrap();
    assert_eq!(smoothed.len(), 8);
    for row in smoothed.iter() {
        if row.observation.key.item_id == "1" {
            assert!(row.smoothing_applied);
            assert_eq!(row.smoothing_method, SmoothingMethod::MovingAverage);
            assert_eq!(row.historical_elasticity_presmoothing, Some(0.3));
            assert_ne!(row.observation.historical_elasticity, Some(0.3));
        } else {
            assert!(!row.smoothing_applied);
            assert_eq!(row.observation.historical_elasticity, Some(0.7));
        }
    }
}

#[tokio::test]
async fn unification_replaces_the_unified_table() {
    let history = [41.0, 41.2, 41.3, 44.0, 44.1]
        .iter()
        .enumerate()
        .map(|(i, &price)| PriceObservation {
            key: GroupKey::new("9", "Z02", "MA"),
            week: date!(2024 - 01 - 01) + Duration::weeks(i as i64),
            avg_unit_price: price,
        })
        .collect();
    let covariates = [118.3, 118.9, 120.1]
        .iter()
        .enumerate()
        .map(|(i, &value)| CovariateObservation {
            kind: CovariateKind::PriceIndex,
            series: "national".into(),
            date: date!(2024 - 01 - 01) + Duration::weeks(4 * i as i64),
            value,
        })
        .collect();
    let warehouse = MemoryWarehouse {
        history,
        covariates,
        ..Default::default()
    };

    let report = run_unification(&warehouse, &Unifier::default()).await.unwrap();
    assert_eq!(report.observations, 5);
    assert_eq!(report.flattened, 3);
    assert_eq!(report.covariates, 3);
    assert_eq!(report.covariates_flattened, 1);

    let unified = warehouse.unified.lock().unwrap();
    let prices: Vec<f64> = unified.iter().map(|row| row.avg_unit_price).collect();
    assert_eq!(prices, vec![41.0, 41.0, 41.0, 44.0, 44.0]);

    let unified = warehouse.unified_covariates.lock().unwrap();
    let levels: Vec<f64> = unified.iter().map(|row| row.value).collect();
    assert_eq!(levels, vec![118.3, 118.3, 120.1]);
}

#[tokio::test]
async fn step_failures_surface_as_repository_errors() {
    let warehouse = MemoryWarehouse {
        offline: true,
        ..Default::default()
    };
    assert!(matches!(
        run_smoothing(&warehouse, &ElasticitySmoother::default()).await,
        Err(BatchError::Repository(_))
    ));
    assert!(matches!(
        run_unification(&warehouse, &Unifier::default()).await,
        Err(BatchError::Repository(_))
    ));
}
