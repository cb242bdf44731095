//! Property tests for the scoring engine
//!
//! Bounds, constant max points, monotonicity and the level/relevance
//! lookups, over arbitrary observations and targets.

use marketscore::compat::{relevance_level_to_score, score_to_relevance_level, RelevanceLevel};
use marketscore::config::IdealTargets;
use marketscore::models::{
    BrandRisk, MarketObservation, MarketStructureChecklist, StructureCheck, TrafficSource,
};
use marketscore::scoring::{
    market_score_level, score_with_targets, Factor, MarketScoreLevel, TOTAL_MAX_POINTS,
};
use proptest::prelude::*;

fn brand_risk() -> impl Strategy<Value = BrandRisk> {
    prop_oneof![
        Just(BrandRisk::Low),
        Just(BrandRisk::Medium),
        Just(BrandRisk::High)
    ]
}

fn traffic_source() -> impl Strategy<Value = TrafficSource> {
    prop_oneof![
        Just(TrafficSource::Amazon),
        Just(TrafficSource::Mixed),
        Just(TrafficSource::External),
        Just(TrafficSource::Unknown)
    ]
}

fn amount() -> impl Strategy<Value = f64> {
    prop_oneof![
        4 => 0.0f64..100.0,
        1 => Just(0.0),
        1 => Just(-5.0),
        1 => Just(f64::NAN),
        1 => Just(f64::INFINITY),
    ]
}

fn observation() -> impl Strategy<Value = MarketObservation> {
    (
        0u64..1_000_000,
        0u64..1_000_000,
        amount(),
        amount(),
        brand_risk(),
        traffic_source(),
    )
        .prop_map(
            |(search_volume, competitors, price, royalties, brand_risk, traffic_source)| {
                MarketObservation {
                    search_volume,
                    competitors,
                    price,
                    royalties,
                    brand_risk,
                    traffic_source,
                }
            },
        )
}

fn targets() -> impl Strategy<Value = IdealTargets> {
    (0.0f64..5000.0, 0.0f64..50_000.0, 0.0f64..50.0, 0.0f64..20.0)
        .prop_map(|(v, c, p, r)| IdealTargets::new(v, c, p, r))
}

fn checklist() -> impl Strategy<Value = Option<MarketStructureChecklist>> {
    proptest::option::of(proptest::collection::vec(any::<bool>(), 6).prop_map(|flags| {
        StructureCheck::ALL
            .into_iter()
            .zip(flags)
            .filter(|(_, on)| *on)
            .map(|(check, _)| check)
            .collect()
    }))
}

proptest! {
    #[test]
    fn total_is_bounded(obs in observation(), t in targets(), s in checklist()) {
        let breakdown = score_with_targets(&obs, "us", &t, s.as_ref());
        prop_assert!(breakdown.total <= 100);
    }

    #[test]
    fn components_stay_within_their_max(obs in observation(), t in targets(), s in checklist()) {
        let breakdown = score_with_targets(&obs, "us", &t, s.as_ref());
        for c in &breakdown.components {
            prop_assert!(c.points >= 0.0 && c.points <= c.max_points,
                "{}: {} not in [0, {}]", c.label, c.points, c.max_points);
        }
    }

    #[test]
    fn display_rows_add_up_to_total(obs in observation(), t in targets(), s in checklist()) {
        let breakdown = score_with_targets(&obs, "us", &t, s.as_ref());
        let sum: f64 = breakdown.lines().iter().map(|l| l.points).sum();
        prop_assert_eq!(sum.round() as u32, breakdown.total);
    }

    #[test]
    fn max_points_sum_is_constant(obs in observation(), t in targets(), s in checklist()) {
        let breakdown = score_with_targets(&obs, "us", &t, s.as_ref());
        prop_assert_eq!(breakdown.max_points(), TOTAL_MAX_POINTS);
    }

    #[test]
    fn more_volume_never_lowers_volume_points(
        obs in observation(),
        t in targets(),
        extra in 0u64..100_000,
    ) {
        let more = MarketObservation { search_volume: obs.search_volume + extra, ..obs.clone() };
        let points = |o: &MarketObservation| {
            score_with_targets(o, "us", &t, None)
                .component(Factor::Volume)
                .map(|c| c.points)
                .unwrap_or(0.0)
        };
        prop_assert!(points(&more) >= points(&obs));
    }

    #[test]
    fn more_competitors_never_raise_competitor_points(
        obs in observation(),
        t in targets(),
        extra in 0u64..100_000,
    ) {
        let more = MarketObservation { competitors: obs.competitors + extra, ..obs.clone() };
        let points = |o: &MarketObservation| {
            score_with_targets(o, "us", &t, None)
                .component(Factor::Competitors)
                .map(|c| c.points)
                .unwrap_or(0.0)
        };
        prop_assert!(points(&more) <= points(&obs));
    }

    #[test]
    fn structure_never_lowers_total(obs in observation(), t in targets(), s in checklist()) {
        let without = score_with_targets(&obs, "us", &t, None);
        let with = score_with_targets(&obs, "us", &t, s.as_ref());
        prop_assert!(with.total >= without.total);
    }

    #[test]
    fn level_matches_thresholds(score in 0.0f64..=100.0) {
        let expected = if score >= 70.0 {
            MarketScoreLevel::Excellent
        } else if score >= 40.0 {
            MarketScoreLevel::Regular
        } else {
            MarketScoreLevel::Low
        };
        prop_assert_eq!(market_score_level(score), expected);
    }
}

#[test]
fn relevance_buckets_survive_round_trip() {
    for level in [
        RelevanceLevel::VeryHigh,
        RelevanceLevel::High,
        RelevanceLevel::Low,
        RelevanceLevel::None,
    ] {
        assert_eq!(
            score_to_relevance_level(f64::from(relevance_level_to_score(level))),
            level
        );
    }
}
