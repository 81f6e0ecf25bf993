//! Per-unit metric records and the values derived from them.

use compact_str::CompactString;
use indexmap::IndexMap;
use serde::{ Serialize, Deserialize };

/// A benchmarked hardware design variant.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    /// The configuration name, used as the results key and in
    /// log file names.
    pub name: CompactString,
    /// Whether victim cache event markers are counted for
    /// this configuration.
    pub victim_cache: bool,
}

impl Configuration {
    /// A configuration without a victim cache.
    #[inline]
    pub fn baseline(name: impl Into<CompactString>) -> Configuration {
        Configuration { name: name.into(), victim_cache: false }
    }

    /// A configuration whose logs carry victim cache markers.
    #[inline]
    pub fn with_victim_cache(
        name: impl Into<CompactString>
    ) -> Configuration {
        Configuration { name: name.into(), victim_cache: true }
    }
}

/// One typed change to a [`MetricRecord`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MetricUpdate {
    Cycles(u64),
    Instructions(u64),
    L1dMisses(u64),
    L1iMisses(u64),
    L1dAccesses(u64),
    L1dHits(u64),
    VcHit,
    VcMiss,
    VcAlloc,
}

/// The metrics scraped from one simulator log.
///
/// Counter fields keep the most recent observed value.
/// The `vc_*` fields count marker lines and only grow.
#[derive(Serialize, Deserialize, Debug, Default, Copy, Clone,
         PartialEq, Eq)]
pub struct MetricRecord {
    pub cycles: u64,
    pub instructions: u64,
    pub l1d_hits: u64,
    pub l1d_misses: u64,
    pub l1i_misses: u64,
    pub l1d_accesses: u64,
    pub vc_hits: u64,
    pub vc_misses: u64,
    pub vc_allocs: u64,
}

/// Guarded percentage, 0 when the denominator is 0.
#[inline]
pub fn percent(num: u64, den: u64) -> f64 {
    if den == 0 { 0. }
    else { num as f64 / den as f64 * 100. }
}

impl MetricRecord {
    /// Apply one update in place.
    #[inline]
    pub fn apply(&mut self, update: MetricUpdate) {
        use MetricUpdate::*;
        match update {
            Cycles(v) => self.cycles = v,
            Instructions(v) => self.instructions = v,
            L1dMisses(v) => self.l1d_misses = v,
            L1iMisses(v) => self.l1i_misses = v,
            L1dAccesses(v) => self.l1d_accesses = v,
            L1dHits(v) => self.l1d_hits = v,
            VcHit => self.vc_hits += 1,
            VcMiss => self.vc_misses += 1,
            VcAlloc => self.vc_allocs += 1,
        }
    }

    /// The cycle/instruction ratio in the form the benchmark
    /// summary reports it (`cycles / instructions`).
    ///
    /// `None` when no instructions were observed.
    #[inline]
    pub fn ipc(&self) -> Option<f64> {
        if self.instructions == 0 { None }
        else { Some(self.cycles as f64 / self.instructions as f64) }
    }

    /// Whether any L1D access count was observed.
    #[inline]
    pub fn has_l1d_data(&self) -> bool {
        self.l1d_accesses != 0
    }

    /// L1D misses as a percentage of L1D accesses.
    #[inline]
    pub fn l1d_miss_percent(&self) -> f64 {
        percent(self.l1d_misses, self.l1d_accesses)
    }

    /// Victim cache lookups, i.e. hits plus misses.
    #[inline]
    pub fn vc_accesses(&self) -> u64 {
        self.vc_hits + self.vc_misses
    }

    /// Victim cache hits as a percentage of lookups.
    #[inline]
    pub fn vc_hit_rate(&self) -> f64 {
        percent(self.vc_hits, self.vc_accesses())
    }
}

/// Test name to record, in caller order.
pub type TestResults = IndexMap<CompactString, MetricRecord>;

/// All records, keyed by configuration name then test name.
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
pub struct ConfigurationResults {
    pub configs: IndexMap<CompactString, TestResults>,
}

impl ConfigurationResults {
    /// Create the results table with an empty record for every
    /// (configuration, test) pair.
    pub fn new<S: AsRef<str>>(
        configs: &[Configuration], tests: &[S]
    ) -> ConfigurationResults {
        let configs = configs.iter().map(|c| {
            let records: TestResults = tests.iter()
                .map(|t| (CompactString::from(t.as_ref()),
                          MetricRecord::default()))
                .collect();
            (c.name.clone(), records)
        }).collect();
        ConfigurationResults { configs }
    }

    /// The records of one configuration.
    #[inline]
    pub fn config(&self, config: &str) -> Option<&TestResults> {
        self.configs.get(config)
    }

    #[inline]
    pub fn get(
        &self, config: &str, test: &str
    ) -> Option<&MetricRecord> {
        self.configs.get(config)?.get(test)
    }

    /// The record of a pair, inserted empty if missing.
    pub fn record_mut(
        &mut self, config: &str, test: &str
    ) -> &mut MetricRecord {
        self.configs.entry(config.into()).or_default()
            .entry(test.into()).or_default()
    }
}
