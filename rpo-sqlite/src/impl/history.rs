use super::replace_table;
use crate::{
    Db,
    types::{CovariateRow, PriceHistoryRow, UnifiedCovariateRow, UnifiedPriceRow},
};
use rpo_core::{
    models::{CovariateObservation, PriceObservation, UnifiedCovariate, UnifiedPrice},
    ports::PriceHistoryRepository,
};

const COVARIATE_COLUMNS: &str = "kind, series, date, value";

impl PriceHistoryRepository for Db {
    async fn raw_price_history(&self) -> Result<Vec<PriceObservation>, Self::Error> {
        let rows = sqlx::query_as::<_, PriceHistoryRow>(
            r#"
            select item_id, zone_id, channel_id, week, avg_unit_price
            from price_history
            order by rowid
            "#,
        )
        .fetch_all(&self.reader)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn replace_unified_prices(&self, rows: &[UnifiedPrice]) -> Result<(), Self::Error> {
        replace_table(
            &self.writer,
            "price_history_unified",
            "item_id, zone_id, channel_id, week, raw_price, avg_unit_price, anchor_week",
            rows,
            |mut b, row| {
                b.push_bind(row.key.item_id.as_str())
                    .push_bind(row.key.zone_id.as_str())
                    .push_bind(row.key.channel_id.as_str())
                    .push_bind(row.week)
                    .push_bind(row.raw_price)
                    .push_bind(row.avg_unit_price)
                    .push_bind(row.anchor_week);
            },
        )
        .await
    }

    async fn raw_covariate_history(&self) -> Result<Vec<CovariateObservation>, Self::Error> {
        sqlx::query_as::<_, CovariateRow>(&format!(
            "select {COVARIATE_COLUMNS} from covariate_history order by rowid"
        ))
        .fetch_all(&self.reader)
        .await?
        .into_iter()
        .map(CovariateObservation::try_from)
        .collect()
    }

    async fn replace_unified_covariates(
        &self,
        rows: &[UnifiedCovariate],
    ) -> Result<(), Self::Error> {
        replace_table(
            &self.writer,
            "covariate_history_unified",
            "kind, series, date, raw_value, value, anchor_date",
            rows,
            |mut b, row| {
                b.push_bind(row.kind.as_str())
                    .push_bind(row.series.as_str())
                    .push_bind(row.date)
                    .push_bind(row.raw_value)
                    .push_bind(row.value)
                    .push_bind(row.anchor_date);
            },
        )
        .await
    }
}

impl Db {
    /// Replace the raw weekly price history
    pub async fn load_price_history(&self, rows: &[PriceObservation]) -> Result<(), sqlx::Error> {
        replace_table(
            &self.writer,
            "price_history",
            "item_id, zone_id, channel_id, week, avg_unit_price",
            rows,
            |mut b, row| {
                b.push_bind(row.key.item_id.as_str())
                    .push_bind(row.key.zone_id.as_str())
                    .push_bind(row.key.channel_id.as_str())
                    .push_bind(row.week)
                    .push_bind(row.avg_unit_price);
            },
        )
        .await
    }

    /// Replace the raw external covariate series
    pub async fn load_covariate_history(
        &self,
        rows: &[CovariateObservation],
    ) -> Result<(), sqlx::Error> {
        replace_table(
            &self.writer,
            "covariate_history",
            COVARIATE_COLUMNS,
            rows,
            |mut b, row| {
                b.push_bind(row.kind.as_str())
                    .push_bind(row.series.as_str())
                    .push_bind(row.date)
                    .push_bind(row.value);
            },
        )
        .await
    }

    /// Read the unified price table, in insertion order
    pub async fn unified_prices(&self) -> Result<Vec<UnifiedPrice>, sqlx::Error> {
        let rows = sqlx::query_as::<_, UnifiedPriceRow>(
            r#"
            select item_id, zone_id, channel_id, week, raw_price, avg_unit_price, anchor_week
            from price_history_unified
            order by rowid
            "#,
        )
        .fetch_all(&self.reader)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Read the unified covariate table, in insertion order
    pub async fn unified_covariates(&self) -> Result<Vec<UnifiedCovariate>, sqlx::Error> {
        sqlx::query_as::<_, UnifiedCovariateRow>(
            r#"
            select kind, series, date, raw_value, value, anchor_date
            from covariate_history_unified
            order by rowid
            "#,
        )
        .fetch_all(&self.reader)
        .await?
        .into_iter()
        .map(UnifiedCovariate::try_from)
        .collect()
    }
}
