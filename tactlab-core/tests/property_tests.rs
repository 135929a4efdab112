//! Property tests for the decision rules.
//!
//! Uses proptest to verify:
//! 1. CAPE weight equals max(lower, min(upper, 1 - c)) and stays within bounds
//! 2. The 13612W score is the fixed linear combination of its readings
//! 3. Ranking is descending and stable
//! 4. The latch fires at most once between consecutive arms

use proptest::prelude::*;
use tactlab_core::cape::{cape_target_weight, CapeRecord, WeightBounds, CAPE_FIELD_INDEX};
use tactlab_core::latch::RebalanceLatch;
use tactlab_core::score::{rank_descending, MomentumScore, RankedInstrument};
use tactlab_core::strategy::{decide_rotation, Regime};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_cape() -> impl Strategy<Value = f64> {
    prop_oneof![-10.0..10.0_f64, 0.0..60.0_f64]
}

fn arb_reading() -> impl Strategy<Value = f64> {
    (-80.0..200.0_f64).prop_map(|r| (r * 100.0).round() / 100.0)
}

/// A sequence of callback events: `true` = schedule trigger, `false` = data event.
fn arb_events() -> impl Strategy<Value = Vec<bool>> {
    prop::collection::vec(prop::bool::weighted(0.2), 0..200)
}

// ── 1. CAPE weight ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn cape_weight_matches_clamp_formula(c in arb_cape()) {
        let w = cape_target_weight(c);
        prop_assert_eq!(w, (1.0 - c).min(1.5).max(0.5));
        prop_assert!((0.5..=1.5).contains(&w));
    }

    #[test]
    fn custom_bounds_are_respected(
        c in arb_cape(),
        lower in -1.0..1.0_f64,
        width in 0.0..2.0_f64,
    ) {
        let bounds = WeightBounds::new(lower, lower + width);
        let w = bounds.weight_for(c);
        prop_assert!(w >= bounds.lower && w <= bounds.upper);
    }

    #[test]
    fn parsed_value_round_trips_through_field_sixteen(c in 0.0..100.0_f64) {
        let mut fields = vec!["2001-09-01".to_string()];
        fields.extend(std::iter::repeat("x".to_string()).take(CAPE_FIELD_INDEX - 1));
        fields.push(c.to_string());
        let record = CapeRecord::parse_line(&fields.join(",")).unwrap();
        prop_assert_eq!(record.value, c);
    }
}

// ── 2. Score ─────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn score_is_weighted_sum(
        m1 in arb_reading(),
        m3 in arb_reading(),
        m6 in arb_reading(),
        m12 in arb_reading(),
    ) {
        let score = MomentumScore::new(m1, m3, m6, m12).objective();
        let expected = 12.0 * m1 + 4.0 * m3 + 2.0 * m6 + m12;
        prop_assert!((score - expected).abs() < 1e-9);
    }
}

// ── 3. Ranking ───────────────────────────────────────────────────────

proptest! {
    #[test]
    fn ranking_is_descending_and_stable(scores in prop::collection::vec(-5i32..5, 1..12)) {
        let input: Vec<RankedInstrument> = scores
            .iter()
            .enumerate()
            .map(|(i, s)| RankedInstrument::new(format!("S{i}"), *s as f64))
            .collect();
        let ranked = rank_descending(input);

        for pair in ranked.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
            if pair[0].score == pair[1].score {
                let a: usize = pair[0].symbol[1..].parse().unwrap();
                let b: usize = pair[1].symbol[1..].parse().unwrap();
                prop_assert!(a < b, "ties must keep input order");
            }
        }
    }

    #[test]
    fn regime_follows_negative_growth_count(
        growth in prop::collection::vec(-10i32..10, 1..6),
        defensive in prop::collection::vec(-10i32..10, 1..4),
    ) {
        let g: Vec<RankedInstrument> = growth
            .iter()
            .enumerate()
            .map(|(i, s)| RankedInstrument::new(format!("G{i}"), *s as f64))
            .collect();
        let d: Vec<RankedInstrument> = defensive
            .iter()
            .enumerate()
            .map(|(i, s)| RankedInstrument::new(format!("D{i}"), *s as f64))
            .collect();

        let decision = decide_rotation(g, d).unwrap();
        let negatives = growth.iter().filter(|s| **s < 0).count();
        prop_assert_eq!(decision.negative_growth, negatives);
        if negatives > 0 {
            prop_assert_eq!(decision.regime, Regime::Defensive);
            prop_assert_eq!(&decision.selected, &decision.defensive_ranking[0].symbol);
        } else {
            prop_assert_eq!(decision.regime, Regime::Growth);
            prop_assert_eq!(&decision.selected, &decision.growth_ranking[0].symbol);
        }
    }
}

// ── 4. Latch ─────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn latch_fires_at_most_once_between_arms(events in arb_events()) {
        let mut latch = RebalanceLatch::consumed();
        let mut fired_since_arm = 0;
        for is_trigger in events {
            if is_trigger {
                latch.arm();
                fired_since_arm = 0;
            } else if latch.consume() {
                fired_since_arm += 1;
            }
            prop_assert!(fired_since_arm <= 1);
        }
    }
}
