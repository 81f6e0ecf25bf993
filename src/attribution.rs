//! Area attribution and ranking.
//!
//! The top module is the configured one when the log has it,
//! else the one the log declares with `top module`. Its area is
//! the total unless it is missing or zero. Then the total falls
//! back to the largest module area, which only approximates the
//! design total: a flat stat log carries no hierarchy to sum
//! over.

use crate::area::AreaLog;
use compact_str::CompactString;
use serde::{ Serialize, Deserialize };

/// Which modules get pinned or highlighted.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AttributionOptions {
    /// Name of the whole-chip module.
    pub top_module: CompactString,
    /// A module is featured if its name contains one of these.
    pub featured_markers: Vec<CompactString>,
    /// A module is featured if its name equals one of these.
    pub featured_names: Vec<CompactString>,
    /// Design units per larger display unit (um^2 per mm^2).
    pub unit_divisor: f64,
}

impl Default for AttributionOptions {
    fn default() -> AttributionOptions {
        AttributionOptions {
            top_module: "ChipTop".into(),
            featured_markers: vec!["VictimCache".into()],
            featured_names: vec!["Rocket".into()],
            unit_divisor: 1_000_000.,
        }
    }
}

impl AttributionOptions {
    #[inline]
    pub fn is_featured(&self, name: &str) -> bool {
        self.featured_markers.iter().any(|m| name.contains(m.as_str()))
            || self.featured_names.iter().any(|n| n.as_str() == name)
    }
}

/// One module with its share of the total.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RankedModule {
    pub name: CompactString,
    pub area: f64,
    /// `area` in the larger display unit.
    pub area_larger_unit: f64,
    pub percent_of_total: f64,
    pub is_top: bool,
    pub is_featured: bool,
}

/// Modules of one log, ranked, with the total they share.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct AreaReport {
    pub total_area: f64,
    pub modules: Vec<RankedModule>,
}

/// The module pinned first in the ranking, if any.
pub fn top_module<'a>(
    log: &'a AreaLog, opts: &'a AttributionOptions
) -> Option<&'a str> {
    if log.get(&opts.top_module).is_some() {
        Some(opts.top_module.as_str())
    }
    else {
        log.declared_top()
    }
}

/// The area every module is a share of.
pub fn total_area(log: &AreaLog, opts: &AttributionOptions) -> f64 {
    top_module(log, opts)
        .and_then(|top| log.get(top))
        .filter(|&area| area != 0.)
        .unwrap_or_else(|| log.max_area())
}

impl AreaReport {
    /// Attribute and rank the modules of `log`.
    ///
    /// The top module comes first whatever its area. The rest
    /// follow by area, largest first, ties in log order.
    pub fn build(log: &AreaLog, opts: &AttributionOptions) -> AreaReport {
        let top = top_module(log, opts);
        let total = total_area(log, opts);
        let denom = if total == 0. { 1. } else { total };
        let mut modules: Vec<_> = log.entries().map(|e| {
            let is_top = top == Some(e.name.as_str());
            let is_featured = opts.is_featured(&e.name);
            RankedModule {
                area_larger_unit: e.area / opts.unit_divisor,
                percent_of_total: e.area / denom * 100.,
                name: e.name,
                area: e.area,
                is_top, is_featured,
            }
        }).collect();
        modules.sort_by(|a, b| {
            b.is_top.cmp(&a.is_top)
                .then(b.area.total_cmp(&a.area))
        });
        AreaReport { total_area: total, modules }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Total area in the larger display unit.
    #[inline]
    pub fn total_larger_unit(&self, opts: &AttributionOptions) -> f64 {
        self.total_area / opts.unit_divisor
    }
}
