use rpo_core::models::{
    ElasticitySummary, GroupKey, Map, ModelKind, OptimizationResult, PriceObservation,
    SelectionConfig,
};

/// The model chosen for a group, together with the signals behind the choice
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Selection {
    /// The group
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub key: GroupKey,
    /// Preferred model according to the elasticity estimate
    pub elasticity: ModelKind,
    /// Preferred model according to price volatility, if the group has a usable history
    pub volatility: Option<ModelKind>,
    /// The model kept
    pub model: ModelKind,
}

/// The sample count used when the warehouse has none: an estimate with an
/// unknown number of samples never qualifies as well-supported.
pub fn effective_sample_count(count: Option<u32>) -> u32 {
    count.unwrap_or(0)
}

/// Truncate (not round) to two decimals, matching how the previous week's
/// price is stored upstream.
fn truncate_cents(price: f64) -> f64 {
    (price * 100.0).trunc() / 100.0
}

/// Chooses, per group, which of the two demand formulations to trust.
///
/// Well-supported or extreme elasticities, and volatile price histories,
/// both point to the exact (isoelastic) model. When the two signals
/// disagree the exact model wins.
#[derive(Clone, Debug, Default)]
pub struct ModelSelector {
    config: SelectionConfig,
}

impl ModelSelector {
    /// Create a selector
    pub fn new(config: SelectionConfig) -> Self {
        Self { config }
    }

    /// The elasticity signal for one summary
    pub fn elasticity_signal(&self, summary: &ElasticitySummary) -> ModelKind {
        let samples = effective_sample_count(summary.sample_count);
        if samples >= self.config.min_samples
            || summary.historical_elasticity.abs() > self.config.elasticity_magnitude
        {
            ModelKind::Exact
        } else {
            ModelKind::Approximate
        }
    }

    /// The largest week-over-week relative price move of each group.
    ///
    /// The previous price is truncated to cents. Moves that cannot be
    /// computed (no previous week, zero previous price) are ignored, and a
    /// group with no computable move is absent from the output.
    pub fn volatility(&self, history: &[PriceObservation]) -> Map<GroupKey, f64> {
        let series =
            Map::grouped(history.iter().map(|observation| (&observation.key, observation)));

        let mut volatility = Map::default();
        for (key, mut weeks) in series {
            weeks.sort_by_key(|observation| observation.week);
            let largest = weeks
                .windows(2)
                .map(|pair| {
                    let previous = truncate_cents(pair[0].avg_unit_price);
                    (pair[1].avg_unit_price - previous).abs() / previous
                })
                .filter(|ratio| ratio.is_finite())
                .reduce(f64::max);
            if let Some(largest) = largest {
                volatility.insert(key.clone(), largest);
            }
        }
        volatility
    }

    /// The volatility signal of each group with a usable history
    pub fn volatility_signals(&self, history: &[PriceObservation]) -> Map<GroupKey, ModelKind> {
        self.volatility(history)
            .into_iter()
            .map(|(key, largest)| {
                let kind = if largest > self.config.volatility {
                    ModelKind::Exact
                } else {
                    ModelKind::Approximate
                };
                (key, kind)
            })
            .collect()
    }

    /// Combine the two signals: agreement keeps the shared label, anything
    /// else (disagreement or a missing volatility signal) selects the exact model.
    pub fn combine(elasticity: ModelKind, volatility: Option<ModelKind>) -> ModelKind {
        match volatility {
            Some(volatility) if volatility == elasticity => elasticity,
            _ => ModelKind::Exact,
        }
    }

    /// Select a model for every group with an elasticity summary.
    ///
    /// When a group has several summaries the one with the latest week is used.
    pub fn select(
        &self,
        summaries: &[ElasticitySummary],
        history: &[PriceObservation],
    ) -> Map<GroupKey, Selection> {
        let mut latest: Map<&GroupKey, &ElasticitySummary> = Map::default();
        for summary in summaries {
            latest
                .entry(&summary.key)
                .and_modify(|current| {
                    if summary.week > current.week {
                        *current = summary;
                    }
                })
                .or_insert(summary);
        }

        let volatility = self.volatility_signals(history);

        latest
            .into_iter()
            .map(|(key, summary)| {
                let elasticity = self.elasticity_signal(summary);
                let volatility = volatility.get(key).copied();
                let selection = Selection {
                    key: key.clone(),
                    elasticity,
                    volatility,
                    model: Self::combine(elasticity, volatility),
                };
                (key.clone(), selection)
            })
            .collect()
    }

    /// Keep only the results computed under their group's selected model.
    /// Results for groups without a selection are dropped.
    pub fn filter(
        results: Vec<OptimizationResult>,
        selections: &Map<GroupKey, Selection>,
    ) -> Vec<OptimizationResult> {
        results
            .into_iter()
            .filter(|result| {
                selections
                    .get(&result.key)
                    .is_some_and(|selection| selection.model == result.model)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;
    use time::{Date, Duration, macros::date};

    fn key() -> GroupKey {
        GroupKey::new("6033", "Z01", "PU")
    }

    fn summary(week: Date, count: Option<u32>, elasticity: f64) -> ElasticitySummary {
        ElasticitySummary {
            key: key(),
            week,
            sample_count: count,
            historical_elasticity: elasticity,
        }
    }

    fn history(prices: &[f64]) -> Vec<PriceObservation> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &price)| PriceObservation {
                key: key(),
                week: date!(2024 - 01 - 01) + Duration::weeks(i as i64),
                avg_unit_price: price,
            })
            .collect()
    }

    #[rstest]
    #[case(Some(15), -0.5, ModelKind::Exact)]
    #[case(Some(12), -0.5, ModelKind::Exact)]
    #[case(Some(11), -0.5, ModelKind::Approximate)]
    #[case(Some(3), -2.5, ModelKind::Exact)]
    #[case(Some(3), 2.0, ModelKind::Approximate)]
    #[case(None, -1.0, ModelKind::Approximate)]
    fn elasticity_signal(
        #[case] count: Option<u32>,
        #[case] elasticity: f64,
        #[case] expected: ModelKind,
    ) {
        let selector = ModelSelector::default();
        assert_eq!(
            selector.elasticity_signal(&summary(date!(2024 - 01 - 01), count, elasticity)),
            expected
        );
    }

    #[rstest]
    #[case(ModelKind::Exact, Some(ModelKind::Exact), ModelKind::Exact)]
    #[case(ModelKind::Approximate, Some(ModelKind::Approximate), ModelKind::Approximate)]
    #[case(ModelKind::Exact, Some(ModelKind::Approximate), ModelKind::Exact)]
    #[case(ModelKind::Approximate, Some(ModelKind::Exact), ModelKind::Exact)]
    #[case(ModelKind::Approximate, None, ModelKind::Exact)]
    fn combine(
        #[case] elasticity: ModelKind,
        #[case] volatility: Option<ModelKind>,
        #[case] expected: ModelKind,
    ) {
        assert_eq!(ModelSelector::combine(elasticity, volatility), expected);
    }

    #[test]
    fn volatility_truncates_previous_price() {
        let selector = ModelSelector::default();
        // 10.009 is truncated to 10.00, so the move to 10.5 is exactly 5%
        let volatility = selector.volatility(&history(&[10.009, 10.5, 10.4]));
        approx::assert_relative_eq!(volatility[&key()], 0.05, max_relative = 1e-12);
    }

    #[test]
    fn volatility_is_computed_in_week_order() {
        let selector = ModelSelector::default();
        let mut shuffled = history(&[10.0, 10.0, 12.0]);
        shuffled.swap(0, 2);
        let volatility = selector.volatility(&shuffled);
        approx::assert_relative_eq!(volatility[&key()], 0.2, max_relative = 1e-12);
    }

    #[test]
    fn single_week_has_no_volatility() {
        let selector = ModelSelector::default();
        assert!(selector.volatility(&history(&[10.0])).is_empty());
        assert!(selector.volatility(&history(&[0.0, 5.0])).is_empty());
    }

    #[test]
    fn stable_prices_with_many_samples_select_exact() {
        let selector = ModelSelector::default();
        let selections = selector.select(
            &[summary(date!(2024 - 03 - 04), Some(15), -0.8)],
            &history(&[10.0, 10.2, 10.1]),
        );
        let selection = &selections[&key()];
        assert_eq!(selection.elasticity, ModelKind::Exact);
        assert_eq!(selection.volatility, Some(ModelKind::Approximate));
        assert_eq!(selection.model, ModelKind::Exact);
    }

    #[test]
    fn volatile_prices_with_few_samples_select_exact() {
        let selector = ModelSelector::default();
        let selections = selector.select(
            &[summary(date!(2024 - 03 - 04), Some(5), -0.3)],
            &history(&[10.0, 10.8, 10.8]),
        );
        let selection = &selections[&key()];
        assert_eq!(selection.elasticity, ModelKind::Approximate);
        assert_eq!(selection.volatility, Some(ModelKind::Exact));
        assert_eq!(selection.model, ModelKind::Exact);
    }

    #[test]
    fn latest_summary_wins() {
        let selector = ModelSelector::default();
        let selections = selector.select(
            &[
                summary(date!(2024 - 03 - 11), Some(4), -0.5),
                summary(date!(2024 - 03 - 04), Some(20), -0.5),
            ],
            &history(&[10.0, 10.01]),
        );
        assert_eq!(selections[&key()].model, ModelKind::Approximate);
    }
}
