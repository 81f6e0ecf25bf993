//! Baseline versus variant comparison.

use crate::record::{ Configuration, ConfigurationResults, MetricRecord };
use compact_str::CompactString;
use serde::{ Serialize, Deserialize };
use std::fmt;

/// Presentation tier of a victim cache hit rate.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
pub enum HitRateTier {
    /// Below 5%.
    Low,
    /// From 5% up to 30%.
    Moderate,
    /// 30% and above.
    High,
}

impl HitRateTier {
    #[inline]
    pub fn of(rate: f64) -> HitRateTier {
        if rate < 5. { HitRateTier::Low }
        else if rate < 30. { HitRateTier::Moderate }
        else { HitRateTier::High }
    }

    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            HitRateTier::Low => "low",
            HitRateTier::Moderate => "moderate",
            HitRateTier::High => "high",
        }
    }
}

impl fmt::Display for HitRateTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signed cycle reduction of `variant` relative to `baseline`,
/// in percent. Positive means the variant is faster.
#[inline]
pub fn speedup_percent(baseline: u64, variant: u64) -> Option<f64> {
    if baseline == 0 || variant == 0 {
        return None
    }
    Some((baseline as f64 - variant as f64) / baseline as f64 * 100.)
}

/// One test compared across the two configurations.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    pub test: CompactString,
    pub baseline_cycles: u64,
    pub variant_cycles: u64,
    /// Absent unless both cycle counts are positive.
    pub speedup_percent: Option<f64>,
    pub baseline_miss_percent: f64,
    pub variant_miss_percent: f64,
    /// Only present when the variant has a victim cache.
    pub vc_hit_rate: Option<f64>,
}

impl ComparisonRow {
    fn new(
        test: &str, baseline: &MetricRecord, variant: &MetricRecord,
        victim_cache: bool
    ) -> ComparisonRow {
        ComparisonRow {
            test: test.into(),
            baseline_cycles: baseline.cycles,
            variant_cycles: variant.cycles,
            speedup_percent: speedup_percent(
                baseline.cycles, variant.cycles),
            baseline_miss_percent: baseline.l1d_miss_percent(),
            variant_miss_percent: variant.l1d_miss_percent(),
            vc_hit_rate: victim_cache.then(|| variant.vc_hit_rate()),
        }
    }

    #[inline]
    pub fn vc_tier(&self) -> Option<HitRateTier> {
        self.vc_hit_rate.map(HitRateTier::of)
    }
}

/// Compare `variant` against `baseline` for every test, in
/// the given order.
///
/// Tests without a record compare as empty records.
pub fn compare<S: AsRef<str>>(
    results: &ConfigurationResults,
    baseline: &Configuration, variant: &Configuration,
    tests: &[S]
) -> Vec<ComparisonRow> {
    let empty = MetricRecord::default();
    tests.iter().map(|t| {
        let t = t.as_ref();
        let b = results.get(&baseline.name, t).unwrap_or(&empty);
        let v = results.get(&variant.name, t).unwrap_or(&empty);
        ComparisonRow::new(t, b, v, variant.victim_cache)
    }).collect()
}
