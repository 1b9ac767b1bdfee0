#![allow(dead_code)]
use rpo_core::models::{
    ElasticityObservation, GroupKey, PriceObservation, RawCovariate, RawPricingRow,
};
use rpo_sqlite::{Db, config::SqliteConfig};
use time::{Date, Duration, macros::date};

pub const FIRST_WEEK: Date = date!(2024 - 04 - 01);

pub async fn open() -> anyhow::Result<Db> {
    Ok(Db::open(&SqliteConfig::default()).await?)
}

pub fn key(item: &str) -> GroupKey {
    GroupKey::new(item, "Z01", "PU")
}

pub fn pricing_row(item: &str, avg: f64, cost: f64, elasticity: f64) -> RawPricingRow {
    RawPricingRow {
        key: key(item),
        week: Some(FIRST_WEEK + Duration::weeks(5)),
        category: Some("ABARROTES COMESTIBLES".into()),
        avg_unit_price: Some(avg),
        unit_cost: Some(cost),
        unit_sales: Some(120.0),
        historical_elasticity: Some(elasticity),
        occupation: RawCovariate {
            elasticity: Some(0.35),
            pct_change: Some(2.0),
            current_level: Some(61.0),
            baseline_level: Some(59.8),
        },
        fx: RawCovariate {
            elasticity: Some(0.05),
            ..Default::default()
        },
        cpi: RawCovariate {
            elasticity: Some(0.0),
            ..Default::default()
        },
        gdp: RawCovariate {
            elasticity: Some(-0.1),
            ..Default::default()
        },
    }
}

pub fn weekly_elasticities(
    item: &str,
    weekly: &[f64],
    historical: f64,
) -> Vec<ElasticityObservation> {
    weekly
        .iter()
        .enumerate()
        .map(|(i, &value)| ElasticityObservation {
            key: key(item),
            week: FIRST_WEEK + Duration::weeks(i as i64),
            weekly_elasticity: Some(value),
            historical_elasticity: Some(historical),
            sample_count: Some(weekly.len() as u32),
        })
        .collect()
}

pub fn weekly_prices(item: &str, prices: &[f64]) -> Vec<PriceObservation> {
    prices
        .iter()
        .enumerate()
        .map(|(i, &price)| PriceObservation {
            key: key(item),
            week: FIRST_WEEK + Duration::weeks(i as i64),
            avg_unit_price: price,
        })
        .collect()
}
