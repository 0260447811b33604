//! Property-based tests for certificate normalization.
//!
//! The interval must always bracket the estimate and stay inside [0, 1],
//! whatever margin is used.

use proptest::prelude::*;
use serde_json::{Map, Value};

use qkdv_cert::{DEFAULT_MARGIN, Interval, normalize};

fn bundle_with(delta_ph: f64) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("delta_ph".into(), Value::from(delta_ph));
    map
}

/// Margins spanning zero, tiny, realistic and absurdly large widths.
fn arb_margin() -> impl Strategy<Value = f64> {
    prop_oneof![
        Just(0.0),
        0.0..1e-3,
        0.0..2.0,
        Just(1e300),
        Just(f64::INFINITY),
    ]
}

proptest! {
    #[test]
    fn interval_brackets_value(v in 0.0..=1.0_f64, margin in arb_margin()) {
        let cert = normalize(&bundle_with(v), margin).unwrap();
        let Interval { lower, upper } = cert.delta_ph_interval;
        prop_assert!(lower >= 0.0);
        prop_assert!(upper <= 1.0);
        prop_assert!(lower <= v, "lower {} > value {}", lower, v);
        prop_assert!(v <= upper, "value {} > upper {}", v, upper);
    }

    #[test]
    fn zero_margin_collapses_interval(v in 1e-9..1.0_f64) {
        let cert = normalize(&bundle_with(v), 0.0).unwrap();
        prop_assert_eq!(cert.delta_ph_interval.lower, v);
        prop_assert_eq!(cert.delta_ph_interval.upper, v);
    }

    #[test]
    fn renormalization_reproduces_interval(v in 0.0..=1.0_f64, margin in 0.0..0.5_f64) {
        let first = normalize(&bundle_with(v), margin).unwrap();
        let second = normalize(&first.to_bundle().unwrap(), margin).unwrap();
        prop_assert_eq!(first.delta_ph_interval, second.delta_ph_interval);
    }

    #[test]
    fn out_of_range_values_are_rejected(v in prop_oneof![-10.0..-1e-9_f64, 1.0001..10.0_f64]) {
        prop_assert!(normalize(&bundle_with(v), DEFAULT_MARGIN).is_err());
    }
}
