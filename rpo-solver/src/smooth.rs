use crate::BatchError;
use rpo_core::models::{
    ElasticityObservation, ElasticityRecord, GroupKey, Map, SmoothedElasticity, SmoothingConfig,
    SmoothingMethod,
};
use rpo_core::ports::ElasticityRepository;
use tracing::{Level, event, instrument};

/// Trailing moving average over full windows only.
///
/// The output has `series.len() - window + 1` entries (none if the series
/// is shorter than the window).
pub fn moving_average(series: &[f64], window: usize) -> Vec<f64> {
    if window == 0 {
        return Vec::new();
    }
    series
        .windows(window)
        .map(|values| values.iter().sum::<f64>() / window as f64)
        .collect()
}

/// Exponentially weighted series with the non-adjusted recursion
/// `s_0 = x_0`, `s_t = α x_t + (1 - α) s_{t-1}`.
pub fn exponential(series: &[f64], alpha: f64) -> Vec<f64> {
    let mut smoothed = Vec::with_capacity(series.len());
    let mut state = None;
    for &x in series {
        let next = match state {
            None => x,
            Some(previous) => alpha * x + (1.0 - alpha) * previous,
        };
        smoothed.push(next);
        state = Some(next);
    }
    smoothed
}

/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

/// Repairs groups whose mean weekly elasticity is small and positive.
///
/// Such estimates are economically implausible for most articles. The
/// smoother replaces them with the mean of a moving average of the weekly
/// series, or failing that the mean of an exponentially weighted series,
/// provided the replacement is a plausible (non-positive, bounded) value.
#[derive(Clone, Debug, Default)]
pub struct ElasticitySmoother {
    config: SmoothingConfig,
}

impl ElasticitySmoother {
    /// Create a smoother
    pub fn new(config: SmoothingConfig) -> Self {
        Self { config }
    }

    fn acceptable(&self, value: f64) -> bool {
        self.config.lim_neg <= value && value <= 0.0
    }

    fn anomalous(&self, value: f64) -> bool {
        value > 0.0 && value <= self.config.threshold_hi && !self.acceptable(value)
    }

    /// Decide the smoothing of one group from its weekly series (in week order).
    ///
    /// Returns `None` when the series has no finite value.
    pub fn smooth_group(&self, key: GroupKey, weekly: &[f64]) -> Option<ElasticityRecord> {
        let series: Vec<f64> = weekly.iter().copied().filter(|x| x.is_finite()).collect();
        let raw_mean = mean(&series)?;

        let mut record = ElasticityRecord {
            key,
            raw_mean,
            moving_average_mean: None,
            exponential_mean: None,
            method: SmoothingMethod::None,
            adjusted: None,
            applied: false,
        };

        if !self.anomalous(raw_mean) {
            return Some(record);
        }

        record.moving_average_mean = mean(&moving_average(&series, self.config.window));
        if let Some(candidate) = record.moving_average_mean.filter(|&m| self.acceptable(m)) {
            record.method = SmoothingMethod::MovingAverage;
            record.adjusted = Some(candidate);
            record.applied = true;
            return Some(record);
        }

        record.exponential_mean = mean(&exponential(&series, self.config.alpha));
        if let Some(candidate) = record.exponential_mean.filter(|&m| self.acceptable(m)) {
            record.method = SmoothingMethod::Exponential;
            record.adjusted = Some(candidate);
            record.applied = true;
        }

        Some(record)
    }

    /// One record per group with at least one usable weekly value
    pub fn records(
        &self,
        observations: &[ElasticityObservation],
    ) -> Map<GroupKey, ElasticityRecord> {
        Map::grouped(observations.iter().map(|observation| (&observation.key, observation)))
            .into_iter()
            .filter_map(|(key, mut rows)| {
                rows.sort_by_key(|row| row.week);
                let weekly: Vec<f64> =
                    rows.iter().filter_map(|row| row.weekly_elasticity).collect();
                let record = self.smooth_group(key.clone(), &weekly);
                if record.is_none() {
                    event!(Level::DEBUG, group = %key, "no usable weekly elasticities");
                }
                record.map(|record| (key.clone(), record))
            })
            .collect()
    }

    /// Merge the group decisions back onto every observation, preserving input order.
    pub fn apply(&self, observations: &[ElasticityObservation]) -> Vec<SmoothedElasticity> {
        merge(observations, &self.records(observations))
    }
}

/// Merge precomputed group records onto the observations they were computed from
pub fn merge(
    observations: &[ElasticityObservation],
    records: &Map<GroupKey, ElasticityRecord>,
) -> Vec<SmoothedElasticity> {
    observations
        .iter()
        .map(|observation| {
            let record = records.get(&observation.key).filter(|record| record.applied);
            let mut smoothed = observation.clone();
            if let Some(adjusted) = record.and_then(|record| record.adjusted) {
                smoothed.historical_elasticity = Some(adjusted);
            }
            SmoothedElasticity {
                observation: smoothed,
                historical_elasticity_presmoothing: observation.historical_elasticity,
                smoothing_applied: record.is_some(),
                smoothing_method: record.map_or(SmoothingMethod::None, |record| record.method),
            }
        })
        .collect()
}

/// Summary of a smoothing step
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SmoothingReport {
    /// Observations written
    pub observations: usize,
    /// Groups with a smoothing record
    pub groups: usize,
    /// Groups whose elasticity was replaced
    pub applied: usize,
}

/// Read the elasticity history, smooth it, and replace the smoothed table.
#[instrument(level = "info", skip_all)]
pub async fn run_smoothing<R: ElasticityRepository>(
    repo: &R,
    smoother: &ElasticitySmoother,
) -> Result<SmoothingReport, BatchError<R::Error>> {
    let observations = repo
        .elasticity_observations()
        .await
        .map_err(BatchError::Repository)?;

    let records = smoother.records(&observations);
    let smoothed = merge(&observations, &records);

    repo.replace_smoothed_elasticities(&smoothed)
        .await
        .map_err(BatchError::Repository)?;

    let report = SmoothingReport {
        observations: smoothed.len(),
        groups: records.len(),
        applied: records.values().filter(|record| record.applied).count(),
    };
    event!(
        Level::INFO,
        observations = report.observations,
        groups = report.groups,
        applied = report.applied,
        "elasticities smoothed"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use time::{Duration, macros::date};

    fn key() -> GroupKey {
        GroupKey::new("2210", "Z03", "MM")
    }

    fn observations(weekly: &[f64], historical: f64) -> Vec<ElasticityObservation> {
        weekly
            .iter()
            .enumerate()
            .map(|(i, &value)| ElasticityObservation {
                key: key(),
                week: date!(2024 - 01 - 01) + Duration::weeks(i as i64),
                weekly_elasticity: Some(value),
                historical_elasticity: Some(historical),
                sample_count: Some(weekly.len() as u32),
            })
            .collect()
    }

    #[test]
    fn moving_average_uses_full_windows() {
        assert_eq!(moving_average(&[1.0, 2.0, 3.0, 4.0], 3), vec![2.0, 3.0]);
        assert!(moving_average(&[1.0, 2.0], 3).is_empty());
    }

    #[test]
    fn exponential_is_not_adjusted() {
        let smoothed = exponential(&[1.0, 0.0, 0.0], 0.3);
        assert_relative_eq!(smoothed[0], 1.0);
        assert_relative_eq!(smoothed[1], 0.7);
        assert_relative_eq!(smoothed[2], 0.49);
    }

    #[test]
    fn moving_average_is_preferred() {
        // mean 0.3; the moving averages (0, -1, 1/6) have an acceptable mean
        let weekly = [2.0, -1.0, -1.0, -1.0, 2.5];
        let record = ElasticitySmoother::default()
            .smooth_group(key(), &weekly)
            .unwrap();
        assert_relative_eq!(record.raw_mean, 0.3, max_relative = 1e-12);
        assert_eq!(record.method, SmoothingMethod::MovingAverage);
        assert!(record.applied);
        assert_relative_eq!(record.adjusted.unwrap(), -5.0 / 18.0, max_relative = 1e-9);
        assert_eq!(record.exponential_mean, None);
    }

    #[test]
    fn exponential_is_the_fallback() {
        // too short for a full moving-average window
        let weekly = [-0.5, 1.2];
        let record = ElasticitySmoother::default()
            .smooth_group(key(), &weekly)
            .unwrap();
        assert_relative_eq!(record.raw_mean, 0.35, max_relative = 1e-12);
        assert_eq!(record.moving_average_mean, None);
        // ewm: -0.5, 0.3 * 1.2 + 0.7 * -0.5 = 0.01 → mean -0.245
        assert_relative_eq!(record.exponential_mean.unwrap(), -0.245, max_relative = 1e-12);
        assert_eq!(record.method, SmoothingMethod::Exponential);
        assert!(record.applied);
    }

    #[test]
    fn raw_value_kept_when_nothing_qualifies() {
        let weekly = [0.3, 0.3, 0.3];
        let record = ElasticitySmoother::default()
            .smooth_group(key(), &weekly)
            .unwrap();
        assert_eq!(record.method, SmoothingMethod::None);
        assert!(!record.applied);
        assert_eq!(record.adjusted, None);
    }

    #[test]
    fn out_of_band_groups_are_bypassed() {
        let smoother = ElasticitySmoother::default();
        for weekly in [[0.6, 0.6, 0.6], [-1.0, -1.2, -0.8], [0.0, 0.0, 0.0]] {
            let record = smoother.smooth_group(key(), &weekly).unwrap();
            assert!(!record.applied);
            assert_eq!(record.moving_average_mean, None);
        }
    }

    #[test]
    fn applied_value_replaces_every_row() {
        let smoother = ElasticitySmoother::default();
        let rows = observations(&[2.0, -1.0, -1.0, -1.0, 2.5], 0.42);
        let smoothed = smoother.apply(&rows);
        assert_eq!(smoothed.len(), rows.len());
        let first = smoothed[0].observation.historical_elasticity.unwrap();
        for row in &smoothed {
            assert!(row.smoothing_applied);
            assert_eq!(row.smoothing_method, SmoothingMethod::MovingAverage);
            assert_eq!(row.historical_elasticity_presmoothing, Some(0.42));
            assert_eq!(row.observation.historical_elasticity, Some(first));
        }
    }

    #[test]
    fn groups_without_values_pass_through() {
        let smoother = ElasticitySmoother::default();
        let mut rows = observations(&[0.1, 0.2], -1.0);
        for row in rows.iter_mut() {
            row.weekly_elasticity = None;
        }
        assert!(smoother.records(&rows).is_empty());
        let smoothed = smoother.apply(&rows);
        for row in smoothed {
            assert!(!row.smoothing_applied);
            assert_eq!(row.observation.historical_elasticity, Some(-1.0));
        }
    }
}
