use super::replace_table;
use crate::{
    Db,
    types::{ElasticityHistoryRow, SmoothedRow},
};
use rpo_core::{
    models::{ElasticityObservation, SmoothedElasticity},
    ports::ElasticityRepository,
};

const HISTORY_COLUMNS: &str =
    "item_id, zone_id, channel_id, week, weekly_elasticity, historical_elasticity, sample_count";

impl ElasticityRepository for Db {
    async fn elasticity_observations(&self) -> Result<Vec<ElasticityObservation>, Self::Error> {
        let rows = sqlx::query_as::<_, ElasticityHistoryRow>(&format!(
            "select {HISTORY_COLUMNS} from elasticity_history order by rowid"
        ))
        .fetch_all(&self.reader)
        .await?;
        rows.into_iter().map(ElasticityObservation::try_from).collect()
    }

    async fn replace_smoothed_elasticities(
        &self,
        rows: &[SmoothedElasticity],
    ) -> Result<(), Self::Error> {
        replace_table(
            &self.writer,
            "elasticity_smoothed",
            "item_id, zone_id, channel_id, week, weekly_elasticity, historical_elasticity, \
             sample_count, historical_elasticity_presmoothing, smoothing_applied, smoothing_method",
            rows,
            |mut b, row| {
                let observation = &row.observation;
                b.push_bind(observation.key.item_id.as_str())
                    .push_bind(observation.key.zone_id.as_str())
                    .push_bind(observation.key.channel_id.as_str())
                    .push_bind(observation.week)
                    .push_bind(observation.weekly_elasticity)
                    .push_bind(observation.historical_elasticity)
                    .push_bind(observation.sample_count.map(i64::from))
                    .push_bind(row.historical_elasticity_presmoothing)
                    .push_bind(row.smoothing_applied)
                    .push_bind(row.smoothing_method.as_str());
            },
        )
        .await
    }
}

impl Db {
    /// Replace the weekly elasticity history
    pub async fn load_elasticity_history(
        &self,
        rows: &[ElasticityObservation],
    ) -> Result<(), sqlx::Error> {
        replace_table(
            &self.writer,
            "elasticity_history",
            HISTORY_COLUMNS,
            rows,
            |mut b, row| {
                b.push_bind(row.key.item_id.as_str())
                    .push_bind(row.key.zone_id.as_str())
                    .push_bind(row.key.channel_id.as_str())
                    .push_bind(row.week)
                    .push_bind(row.weekly_elasticity)
                    .push_bind(row.historical_elasticity)
                    .push_bind(row.sample_count.map(i64::from));
            },
        )
        .await
    }

    /// Read the smoothed elasticity table, in insertion order
    pub async fn smoothed_elasticities(&self) -> Result<Vec<SmoothedElasticity>, sqlx::Error> {
        sqlx::query_as::<_, SmoothedRow>(
            r#"
            select
                item_id, zone_id, channel_id, week, weekly_elasticity, historical_elasticity,
                sample_count, historical_elasticity_presmoothing, smoothing_applied,
                smoothing_method
            from elasticity_smoothed
            order by rowid
            "#,
        )
        .fetch_all(&self.reader)
        .await?
        .into_iter()
        .map(SmoothedElasticity::try_from)
        .collect()
    }
}
