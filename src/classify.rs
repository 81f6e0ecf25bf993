//! Simulator log line classification.
//!
//! Every line is checked against each counter matcher on its
//! own, so one line may yield several updates.

use crate::record::{ Configuration, MetricRecord, MetricUpdate };
use once_cell::sync::Lazy;
use regex::Regex;

/// How the captured counter text is encoded.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Radix {
    Dec,
    /// Hexadecimal, with or without a `0x` prefix.
    Hex,
}

impl Radix {
    #[inline]
    fn parse(self, text: &str) -> Option<u64> {
        match self {
            Radix::Dec => text.parse().ok(),
            Radix::Hex => {
                let digits = text.strip_prefix("0x")
                    .or_else(|| text.strip_prefix("0X"))
                    .unwrap_or(text);
                u64::from_str_radix(digits, 16).ok()
            }
        }
    }
}

/// A single counter pattern and the field it feeds.
struct CounterMatcher {
    pattern: Regex,
    radix: Radix,
    update: fn(u64) -> MetricUpdate,
}

impl CounterMatcher {
    fn new(
        pattern: &str, radix: Radix, update: fn(u64) -> MetricUpdate
    ) -> CounterMatcher {
        CounterMatcher {
            pattern: Regex::new(pattern)
                .expect("invalid counter pattern"),
            radix, update
        }
    }

    /// The update from the first occurrence on the line, if any.
    #[inline]
    fn extract(&self, line: &str) -> Option<MetricUpdate> {
        let caps = self.pattern.captures(line)?;
        self.radix.parse(&caps[1]).map(self.update)
    }
}

static COUNTER_MATCHERS: Lazy<Vec<CounterMatcher>> = Lazy::new(|| {
    const HEX: &str = r"([0-9a-fA-Fx]+)";
    vec![
        CounterMatcher::new(
            r"Cycles:\s+(\d+)", Radix::Dec, MetricUpdate::Cycles),
        CounterMatcher::new(
            r"Instructions:\s+(\d+)", Radix::Dec,
            MetricUpdate::Instructions),
        CounterMatcher::new(
            &format!(r"L1D misses\s+\(mhpmcounter3\)\s+=\s+{}", HEX),
            Radix::Hex, MetricUpdate::L1dMisses),
        CounterMatcher::new(
            &format!(r"L1I misses\s+\(mhpmcounter4\)\s+=\s+{}", HEX),
            Radix::Hex, MetricUpdate::L1iMisses),
        CounterMatcher::new(
            &format!(r"L1D accesses\s+\(mhpmcounter5\)\s+=\s+{}", HEX),
            Radix::Hex, MetricUpdate::L1dAccesses),
        CounterMatcher::new(
            &format!(r"L1D hits\s+=\s+{}", HEX),
            Radix::Hex, MetricUpdate::L1dHits),
    ]
});

/// Victim cache tags in precedence order. At most one event
/// is counted per line.
const VC_TAGS: [(&str, MetricUpdate); 3] = [
    ("[VC-HIT]", MetricUpdate::VcHit),
    ("[VC-MISS]", MetricUpdate::VcMiss),
    ("[VC-ALLOC]", MetricUpdate::VcAlloc),
];

/// Turns simulator log lines into metric updates.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LineClassifier {
    victim_cache: bool,
}

impl LineClassifier {
    /// A classifier that honors victim cache tags only if
    /// `victim_cache` is set.
    #[inline]
    pub fn new(victim_cache: bool) -> LineClassifier {
        LineClassifier { victim_cache }
    }

    #[inline]
    pub fn for_config(config: &Configuration) -> LineClassifier {
        LineClassifier::new(config.victim_cache)
    }

    /// The victim cache event on this line, if honored.
    #[inline]
    fn vc_event(&self, line: &str) -> Option<MetricUpdate> {
        if !self.victim_cache {
            return None
        }
        VC_TAGS.iter()
            .find(|(tag, _)| line.contains(tag))
            .map(|&(_, u)| u)
    }

    /// All updates carried by one line, counters first.
    pub fn updates<'a>(
        &self, line: &'a str
    ) -> impl Iterator<Item = MetricUpdate> + 'a {
        let vc = self.vc_event(line);
        COUNTER_MATCHERS.iter()
            .filter_map(move |m| m.extract(line))
            .chain(vc)
    }

    /// Apply one line to `record`, returning the number of
    /// updates applied.
    pub fn classify(&self, line: &str, record: &mut MetricRecord) -> usize {
        let mut n = 0;
        for u in self.updates(line) {
            record.apply(u);
            n += 1;
        }
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(classifier: LineClassifier, lines: &[&str]) -> MetricRecord {
        let mut r = MetricRecord::default();
        for l in lines {
            classifier.classify(l, &mut r);
        }
        r
    }

    #[test]
    fn decimal_and_hex_counters() {
        let r = run(LineClassifier::new(false), &[
            "Cycles: 1000",
            "Instructions: 500",
            "L1D misses  (mhpmcounter3) = 0x1f",
            "L1I misses  (mhpmcounter4) = 0x0000000000000002",
            "L1D accesses  (mhpmcounter5) = 100",
            "L1D hits = 0xff",
        ]);
        assert_eq!(r.cycles, 1000);
        assert_eq!(r.instructions, 500);
        assert_eq!(r.l1d_misses, 0x1f);
        assert_eq!(r.l1i_misses, 2);
        assert_eq!(r.l1d_accesses, 0x100);
        assert_eq!(r.l1d_hits, 0xff);
    }

    #[test]
    fn last_match_wins() {
        let r = run(LineClassifier::new(false), &[
            "Cycles: 10", "noise", "Cycles: 20",
            "L1D hits = 0x5", "L1D hits = 0x3",
        ]);
        assert_eq!(r.cycles, 20);
        assert_eq!(r.l1d_hits, 3);
    }

    #[test]
    fn one_line_many_counters() {
        let c = LineClassifier::new(false);
        let line = "Cycles: 7 Instructions: 3 L1D hits = 0xa";
        let got: Vec<_> = c.updates(line).collect();
        assert_eq!(got, [MetricUpdate::Cycles(7),
                         MetricUpdate::Instructions(3),
                         MetricUpdate::L1dHits(10)]);
    }

    #[test]
    fn malformed_values_are_ignored() {
        let r = run(LineClassifier::new(false), &[
            "L1D hits = 0x1x2",
            "Cycles: 99999999999999999999999",
            "cycles: 5",
        ]);
        assert_eq!(r, MetricRecord::default());
    }

    #[test]
    fn vc_tags_counted_only_for_vc_configs() {
        let lines = ["[VC-HIT] set 3", "[VC-HIT]", "[VC-HIT] way 1",
                     "[VC-MISS] addr 0x40", "[VC-ALLOC]"];
        let r = run(LineClassifier::new(false), &lines);
        assert_eq!((r.vc_hits, r.vc_misses, r.vc_allocs), (0, 0, 0));
        let r = run(LineClassifier::new(true), &lines);
        assert_eq!((r.vc_hits, r.vc_misses, r.vc_allocs), (3, 1, 1));
    }

    #[test]
    fn one_vc_event_per_line() {
        let c = LineClassifier::new(true);
        let got: Vec<_> = c.updates("[VC-MISS] then [VC-ALLOC]")
            .collect();
        assert_eq!(got, [MetricUpdate::VcMiss]);
    }
}
