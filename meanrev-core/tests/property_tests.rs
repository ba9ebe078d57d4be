//! Property tests for decision-core invariants.
//!
//! Uses proptest to verify:
//! 1. At most one position — an open is only ever emitted while flat with
//!    nothing in flight
//! 2. No direct flip — Long never becomes Short (or vice versa) without an
//!    intervening Flat
//! 3. Closes always carry the full open size
//! 4. Rejected samples never mutate state
//! 5. Z-score is unavailable for exactly the first N-1 samples

use chrono::{Duration, NaiveDate, NaiveDateTime};
use proptest::prelude::*;
use meanrev_core::{
    CoreConfig, DecisionEngine, FillReport, FixedEquity, InstrumentSpec, IntentAction, PriceSample,
    Side,
};

// ── Strategies (proptest) ────────────────────────────────────────────

/// A price path as a sequence of bounded log returns.
fn arb_path() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-0.02..0.02_f64, 20..300).prop_map(|rets| {
        let mut p = 100.0;
        rets.into_iter()
            .map(|r| {
                p *= 1.0 + r;
                p
            })
            .collect()
    })
}

/// How the simulated broker answers each order: true = fill, false = reject.
fn arb_broker() -> impl Strategy<Value = Vec<bool>> {
    prop::collection::vec(prop::bool::weighted(0.8), 300)
}

fn t0() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 4)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn engine(window: usize) -> DecisionEngine {
    let mut c = CoreConfig::default();
    c.signal.window_size = window;
    c.signal.z_enter = 1.0;
    c.signal.z_exit = 0.2;
    c.risk.cooldown_secs = 0;
    c.risk.max_daily_loss = 1e9;
    c.risk.max_consecutive_losses = 1_000;
    DecisionEngine::new(c, InstrumentSpec::default()).unwrap()
}

fn sample(i: usize, price: f64) -> PriceSample {
    PriceSample::new(t0() + Duration::seconds(i as i64 * 30), price, 0.01, 1.0, 0.01)
}

// ── 1-3. Position invariants ─────────────────────────────────────────

proptest! {
    #[test]
    fn single_position_and_no_flip(
        path in arb_path(),
        broker in arb_broker(),
        window in 3usize..20,
    ) {
        let mut e = engine(window);
        let acct = FixedEquity(50_000.0);
        let mut last_directional: Option<Side> = None;
        let mut orders = 0usize;

        for (i, &price) in path.iter().enumerate() {
            let side_before = e.position().side;
            let pending_before = e.pending().is_some();
            let intent = e.decide(&sample(i, price), &acct).unwrap();

            match intent.action {
                IntentAction::OpenLong | IntentAction::OpenShort => {
                    prop_assert_eq!(side_before, Side::Flat);
                    prop_assert!(!pending_before);
                    prop_assert!(intent.size > 0.0);
                }
                IntentAction::Close => {
                    prop_assert_ne!(side_before, Side::Flat);
                    prop_assert!((intent.size - e.position().size).abs() < 1e-12);
                }
                IntentAction::None => {}
            }

            if intent.action != IntentAction::None {
                let fills = broker[orders % broker.len()];
                orders += 1;
                if fills {
                    let report = match intent.action {
                        IntentAction::OpenLong => FillReport::entry(Side::Long, price),
                        IntentAction::OpenShort => FillReport::entry(Side::Short, price),
                        _ => {
                            let pnl = e.position().unrealized_pnl(price, 100.0);
                            FillReport::exit(price, pnl)
                        }
                    };
                    e.report_fill(report).unwrap();
                } else {
                    e.report_order_failed().unwrap();
                }
            }

            let side_after = e.position().side;
            if let Some(prev) = last_directional {
                if side_before == prev && !side_after.is_flat() {
                    prop_assert_eq!(side_after, prev, "flipped without passing through flat");
                }
            }
            last_directional = if side_after.is_flat() { None } else { Some(side_after) };
        }
    }
}

// ── 4. Rejections are side-effect free ───────────────────────────────

proptest! {
    #[test]
    fn rejected_samples_do_not_mutate(
        path in arb_path(),
        bad_every in 2usize..7,
    ) {
        let mut e = engine(10);
        let acct = FixedEquity(50_000.0);
        let mut accepted = 0usize;

        for (i, &price) in path.iter().enumerate() {
            if i % bad_every == 0 && i > 0 {
                let stats = e.rolling_stats();
                let last = e.last_timestamp();
                let bad = PriceSample::new(sample(i, price).timestamp, -price, 0.01, 1.0, 0.01);
                prop_assert!(e.decide(&bad, &acct).is_err());
                // replay of an already accepted timestamp
                let stale = sample(i - 1, price);
                prop_assert!(e.decide(&stale, &acct).is_err());
                prop_assert_eq!(e.rolling_stats(), stats);
                prop_assert_eq!(e.last_timestamp(), last);
            }
            e.decide(&sample(i, price), &acct).unwrap();
            accepted += 1;
            // never fill; just cancel so the engine keeps deciding
            if e.pending().is_some() {
                e.report_order_failed().unwrap();
            }
        }
        prop_assert_eq!(e.rolling_stats().sample_count, accepted.min(10));
    }
}

// ── 5. Warm-up length ────────────────────────────────────────────────

proptest! {
    #[test]
    fn zscore_available_exactly_after_window(
        path in arb_path(),
        window in 2usize..20,
    ) {
        let mut e = engine(window);
        let acct = FixedEquity(50_000.0);
        for (i, &price) in path.iter().enumerate() {
            let intent = e.decide(&sample(i, price), &acct).unwrap();
            prop_assert_eq!(intent.zscore.is_some(), i + 1 >= window);
            if e.pending().is_some() {
                e.report_order_failed().unwrap();
            }
        }
    }
}
