//! Plain text rendering of records, comparisons and area
//! reports.

use crate::attribution::{ AreaReport, AttributionOptions };
use crate::compare::ComparisonRow;
use crate::record::{ Configuration, MetricRecord, TestResults };
use itertools::Itertools;
use std::fmt::Write;

/// Format with `decimals` places and comma thousands
/// separators, e.g. `1,234,567.89`.
pub fn group_thousands(value: f64, decimals: usize) -> String {
    let s = format!("{:.*}", decimals, value.abs());
    let (int, frac) = match s.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (s.as_str(), None),
    };
    let bytes = int.as_bytes();
    let mut out = String::with_capacity(s.len() + s.len() / 3 + 1);
    if value.is_sign_negative() && value != 0. {
        out.push('-');
    }
    for (i, &b) in bytes.iter().enumerate() {
        if i > 0 && (bytes.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(b as char);
    }
    if let Some(frac) = frac {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// The console summary printed after a unit's log is parsed.
pub fn unit_summary(config: &Configuration, r: &MetricRecord) -> String {
    let mut s = String::new();
    let ipc = match r.ipc() {
        Some(v) => format!("{:.2}", v),
        None => "n/a".into(),
    };
    writeln!(s, " -> Cycles: {} | Instr: {}", r.cycles, r.instructions).ok();
    writeln!(s, " -> IPC: {}", ipc).ok();
    writeln!(s, " -> L1D Stats: {} Hits / {} Misses / {} Accesses",
             r.l1d_hits, r.l1d_misses, r.l1d_accesses).ok();
    if config.victim_cache {
        writeln!(s, " -> VC Stats: {} Hits / {} Accesses ({:.2}%)",
                 r.vc_hits, r.vc_accesses(), r.vc_hit_rate()).ok();
    }
    s
}

/// Execution time, L1D miss rate and victim cache efficiency
/// per test.
pub fn comparison_table(
    rows: &[ComparisonRow], baseline: &str, variant: &str
) -> String {
    let mut s = String::new();
    let header = [
        "Test".to_string(),
        format!("{} cyc", baseline), format!("{} cyc", variant),
        "Speedup".into(),
        format!("{} L1D miss", baseline), format!("{} L1D miss", variant),
        "VC hit rate".into(),
    ];
    writeln!(s, "{}", header.iter()
             .map(|h| format!("{:>16}", h)).format(" | ")).ok();
    writeln!(s, "{}", "-".repeat(header.len() * 19 - 3)).ok();
    for row in rows {
        let speedup = row.speedup_percent
            .map(|p| format!("{:+.1}%", p))
            .unwrap_or_else(|| "-".into());
        let vc = match (row.vc_hit_rate, row.vc_tier()) {
            (Some(rate), Some(tier)) => format!("{:.1}% ({})", rate, tier),
            _ => "-".into(),
        };
        writeln!(s, "{:>16} | {:>16} | {:>16} | {:>16} | {:>15.2}% | \
                     {:>15.2}% | {:>16}",
                 row.test, row.baseline_cycles, row.variant_cycles,
                 speedup, row.baseline_miss_percent,
                 row.variant_miss_percent, vc).ok();
    }
    s
}

/// Victim cache hits, misses and allocations per test.
pub fn vc_detail_table(records: &TestResults) -> String {
    let mut s = String::new();
    writeln!(s, "{:>16} | {:>10} | {:>10} | {:>10}",
             "Test", "Hits", "Misses", "Allocs").ok();
    writeln!(s, "{}", "-".repeat(55)).ok();
    for (test, r) in records {
        writeln!(s, "{:>16} | {:>10} | {:>10} | {:>10}",
                 test, r.vc_hits, r.vc_misses, r.vc_allocs).ok();
    }
    s
}

/// The ranked area table of one synthesis log.
///
/// The top module is marked `** `, featured modules `-> `.
pub fn area_table(
    title: &str, report: &AreaReport, opts: &AttributionOptions
) -> String {
    let mut s = String::new();
    if report.is_empty() {
        writeln!(s, "\n--- {}: No Data Found ---", title).ok();
        return s
    }
    let rule = "=".repeat(114);
    writeln!(s, "\n{}\n {}\n{}", rule, title, rule).ok();
    writeln!(s, "{:<67} | {:>15} | {:>12} | {:>8}",
             "Module Name", "Area (um²)", "Area (mm²)", "% Total").ok();
    writeln!(s, "{}", "-".repeat(114)).ok();
    for m in &report.modules {
        let prefix = if m.is_top { "** " }
        else if m.is_featured { "-> " }
        else { "   " };
        writeln!(s, "{}{:<65} | {:>15} | {:>12.4} | {:>8.4}%",
                 prefix, m.name, group_thousands(m.area, 2),
                 m.area_larger_unit, m.percent_of_total).ok();
    }
    writeln!(s, "{}", "-".repeat(114)).ok();
    writeln!(s, "Total Logic Area: {:.4} mm²",
             report.total_larger_unit(opts)).ok();
    s
}
