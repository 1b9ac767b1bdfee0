use super::replace_table;
use crate::{
    Db,
    types::{OutputRow, PriceHistoryRow, PricingInputRow, SummaryRow},
};
use rpo_core::{
    models::{ElasticitySummary, OptimizationResult, PriceObservation, RawPricingRow},
    ports::OptimizationRepository,
};

const PRICING_COLUMNS: &str = "item_id, zone_id, channel_id, week, category, avg_unit_price, \
    unit_cost, unit_sales, historical_elasticity, \
    occupation_elasticity, occupation_pct_change, occupation_current, occupation_baseline, \
    fx_elasticity, fx_pct_change, fx_current, fx_baseline, \
    cpi_elasticity, cpi_pct_change, cpi_current, cpi_baseline, \
    gdp_elasticity, gdp_pct_change, gdp_current, gdp_baseline";

const OUTPUT_COLUMNS: &str = "item_id, zone_id, channel_id, week, current_price, unit_cost, \
    baseline_demand, baseline_profit, suggested_price, predicted_demand, predicted_profit, \
    model, pct_price_change, pct_profit_change, converged, iterations";

impl OptimizationRepository for Db {
    async fn pricing_rows(&self) -> Result<Vec<RawPricingRow>, Self::Error> {
        let rows = sqlx::query_as::<_, PricingInputRow>(&format!(
            "select {PRICING_COLUMNS} from pricing_input order by rowid"
        ))
        .fetch_all(&self.reader)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn elasticity_summaries(&self) -> Result<Vec<ElasticitySummary>, Self::Error> {
        // Before the first smoothing run, fall back to the raw history
        let rows = sqlx::query_as::<_, SummaryRow>(
            r#"
            select item_id, zone_id, channel_id, week, historical_elasticity, sample_count
            from elasticity_smoothed
            where historical_elasticity is not null
            union all
            select item_id, zone_id, channel_id, week, historical_elasticity, sample_count
            from elasticity_history
            where historical_elasticity is not null
                and not exists (select 1 from elasticity_smoothed)
            "#,
        )
        .fetch_all(&self.reader)
        .await?;
        rows.into_iter().map(ElasticitySummary::try_from).collect()
    }

    async fn price_history(&self) -> Result<Vec<PriceObservation>, Self::Error> {
        // Before the first unification run, fall back to the raw history
        let rows = sqlx::query_as::<_, PriceHistoryRow>(
            r#"
            select item_id, zone_id, channel_id, week, avg_unit_price
            from (
                select item_id, zone_id, channel_id, week, avg_unit_price, rowid as position
                from price_history_unified
                union all
                select item_id, zone_id, channel_id, week, avg_unit_price, rowid as position
                from price_history
                where not exists (select 1 from price_history_unified)
            )
            order by position
            "#,
        )
        .fetch_all(&self.reader)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn replace_optimization_results(
        &self,
        results: &[OptimizationResult],
    ) -> Result<(), Self::Error> {
        replace_table(
            &self.writer,
            "optimization_output",
            OUTPUT_COLUMNS,
            results,
            |mut b, result| {
                b.push_bind(result.key.item_id.as_str())
                    .push_bind(result.key.zone_id.as_str())
                    .push_bind(result.key.channel_id.as_str())
                    .push_bind(result.week)
                    .push_bind(result.current_price)
                    .push_bind(result.unit_cost)
                    .push_bind(result.baseline_demand)
                    .push_bind(result.baseline_profit)
                    .push_bind(result.suggested_price)
                    .push_bind(result.predicted_demand)
                    .push_bind(result.predicted_profit)
                    .push_bind(result.model.as_str())
                    .push_bind(result.pct_price_change)
                    .push_bind(result.pct_profit_change)
                    .push_bind(result.converged)
                    .push_bind(i64::from(result.iterations));
            },
        )
        .await
    }
}

impl Db {
    /// Replace the pricing input table
    pub async fn load_pricing_rows(&self, rows: &[RawPricingRow]) -> Result<(), sqlx::Error> {
        replace_table(
            &self.writer,
            "pricing_input",
            PRICING_COLUMNS,
            rows,
            |mut b, row| {
                b.push_bind(row.key.item_id.as_str())
                    .push_bind(row.key.zone_id.as_str())
                    .push_bind(row.key.channel_id.as_str())
                    .push_bind(row.week)
                    .push_bind(row.category.as_deref())
                    .push_bind(row.avg_unit_price)
                    .push_bind(row.unit_cost)
                    .push_bind(row.unit_sales)
                    .push_bind(row.historical_elasticity);
                for covariate in [&row.occupation, &row.fx, &row.cpi, &row.gdp] {
                    b.push_bind(covariate.elasticity)
                        .push_bind(covariate.pct_change)
                        .push_bind(covariate.current_level)
                        .push_bind(covariate.baseline_level);
                }
            },
        )
        .await
    }

    /// Read the optimization output table, in insertion order
    pub async fn optimization_results(&self) -> Result<Vec<OptimizationResult>, sqlx::Error> {
        sqlx::query_as::<_, OutputRow>(&format!(
            "select {OUTPUT_COLUMNS} from optimization_output order by rowid"
        ))
        .fetch_all(&self.reader)
        .await?
        .into_iter()
        .map(OptimizationResult::try_from)
        .collect()
    }
}
