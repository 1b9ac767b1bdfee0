#![allow(dead_code)]
use rpo_core::models::{
    CovariateObservation, ElasticityObservation, ElasticitySummary, OptimizationResult,
    PriceObservation, RawPricingRow, SmoothedElasticity, UnifiedCovariate, UnifiedPrice,
};
use rpo_core::ports::{
    ElasticityRepository, OptimizationRepository, PriceHistoryRepository, Repository,
};
use std::sync::Mutex;

/// An in-memory warehouse for exercising the pipeline steps
#[derive(Default)]
pub struct MemoryWarehouse {
    pub rows: Vec<RawPricingRow>,
    pub summaries: Vec<ElasticitySummary>,
    pub history: Vec<PriceObservation>,
    pub observations: Vec<ElasticityObservation>,
    pub covariates: Vec<CovariateObservation>,
    pub results: Mutex<Vec<OptimizationResult>>,
    pub smoothed: Mutex<Vec<SmoothedElasticity>>,
    pub unified: Mutex<Vec<UnifiedPrice>>,
    pub unified_covariates: Mutex<Vec<UnifiedCovariate>>,
    pub offline: bool,
}

#[derive(Debug, thiserror::Error)]
#[error("warehouse offline")]
pub struct Offline;

impl MemoryWarehouse {
    fn online(&self) -> Result<(), Offline> {
        if self.offline { Err(Offline) } else { Ok(()) }
    }
}

impl Repository for MemoryWarehouse {
    type Error = Offline;
}

impl OptimizationRepository for MemoryWarehouse {
    async fn pricing_rows(&self) -> Result<Vec<RawPricingRow>, Self::Error> {
        self.online()?;
        Ok(self.rows.clone())
    }

    async fn elasticity_summaries(&self) -> Result<Vec<ElasticitySummary>, Self::Error> {
        self.online()?;
        Ok(self.summaries.clone())
    }

    async fn price_history(&self) -> Result<Vec<PriceObservation>, Self::Error> {
        self.online()?;
        Ok(self.history.clone())
    }

    async fn replace_optimization_results(
        &self,
        results: &[OptimizationResult],
    ) -> Result<(), Self::Error> {
        self.online()?;
        *self.results.lock().unwrap() = results.to_vec();
        Ok(())
    }
}

impl ElasticityRepository for MemoryWarehouse {
    async fn elasticity_observations(&self) -> Result<Vec<ElasticityObservation>, Self::Error> {
        self.online()?;
        Ok(self.observations.clone())
    }

    async fn replace_smoothed_elasticities(
        &self,
        rows: &[SmoothedElasticity],
    ) -> Result<(), Self::Error> {
        self.online()?;
        *self.smoothed.lock().unwrap() = rows.to_vec();
        Ok(())
    }
}

impl PriceHistoryRepository for MemoryWarehouse {
    async fn raw_price_history(&self) -> Result<Vec<PriceObservation>, Self::Error> {
        self.online()?;
        Ok(self.history.clone())
    }

    async fn replace_unified_prices(&self, rows: &[UnifiedPrice]) -> Result<(), Self::Error> {
        self.online()?;
        *self.unified.lock().unwrap() = rows.to_vec();
        Ok(())
    }

    async fn raw_covariate_history(&self) -> Result<Vec<CovariateObservation>, Self::Error> {
        self.online()?;
        Ok(self.covariates.clone())
    }

    async fn replace_unified_covariates(
        &self,
        rows: &[UnifiedCovariate],
    ) -> Result<(), Self::Error> {
        self.online()?;
        *self.unified_covariates.lock().unwrap() = rows.to_vec();
        Ok(())
    }
}
