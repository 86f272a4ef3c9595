#![allow(dead_code)]

use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub const EPS: f64 = 1e-9;

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// A coordinate in the labeling tool's 0..=100 percentage space.
pub fn arb_percent() -> impl Strategy<Value = f64> {
    (0u32..=10_000).prop_map(|v| f64::from(v) / 100.0)
}

/// `(x, y, width, height)` of a rectangle part that stays inside the image,
/// on a grid of hundredths so the values survive a JSON round trip exactly.
pub fn arb_rectangle() -> impl Strategy<Value = (f64, f64, f64, f64)> {
    (0u32..=10_000, 0u32..=10_000)
        .prop_flat_map(|(x, y)| (Just(x), Just(y), 0..=10_000 - x, 0..=10_000 - y))
        .prop_map(|(x, y, w, h)| {
            let percent = |v: u32| f64::from(v) / 100.0;
            (percent(x), percent(y), percent(w), percent(h))
        })
}

/// A box `(xmin, ymin, xmax, ymax)` with ordered corners in percent space.
pub fn arb_xyxy() -> impl Strategy<Value = (f64, f64, f64, f64)> {
    arb_rectangle().prop_map(|(x, y, w, h)| (x, y, x + w, y + h))
}

pub fn arb_angle() -> impl Strategy<Value = f64> {
    -360.0f64..360.0
}

pub fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
    (a - b).abs() <= eps * a.abs().max(b.abs()).max(1.0)
}
