//! Synthesis area log parsing.
//!
//! Only `Chip area for [top ]module '<name>': <area>` lines
//! are read. Everything else in the log is ignored.

use compact_str::CompactString;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{ Serialize, Deserialize };
use std::fs::File;
use std::io::{ self, BufRead, BufReader };
use std::path::Path;

static AREA_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^\s*Chip area for (top )?module ['"](.+)['"]:\s+([0-9.]+)"#
    ).expect("invalid area pattern")
});

/// One synthesis-reported module.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ModuleAreaEntry {
    /// Hierarchical name with escape markers removed.
    pub name: CompactString,
    /// Area in design units (um^2).
    pub area: f64,
    /// Declared with `Chip area for top module`.
    pub declared_top: bool,
}

/// Strip the hierarchy escape markers synthesis puts in front
/// of names, e.g. `\ChipTop`.
#[inline]
pub fn normalize_module_name(raw: &str) -> CompactString {
    raw.chars().filter(|&c| c != '\\').collect()
}

/// Parse one line into a module entry, if it declares an area.
pub fn parse_area_line(line: &str) -> Option<ModuleAreaEntry> {
    let caps = AREA_LINE.captures(line)?;
    let area = caps[3].parse().ok()?;
    Some(ModuleAreaEntry {
        name: normalize_module_name(&caps[2]), area,
        declared_top: caps.get(1).is_some(),
    })
}

/// The module areas of one synthesis log, in first-seen order.
///
/// A module declared again keeps its position and takes the
/// newer area.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct AreaLog {
    modules: IndexMap<CompactString, f64>,
    /// The last module declared as top, if any.
    declared_top: Option<CompactString>,
}

impl AreaLog {
    #[inline]
    pub fn new() -> AreaLog {
        AreaLog::default()
    }

    #[inline]
    pub fn insert(&mut self, entry: ModuleAreaEntry) {
        if entry.declared_top {
            self.declared_top = Some(entry.name.clone());
        }
        self.modules.insert(entry.name, entry.area);
    }

    /// Parse log text.
    pub fn parse(text: &str) -> AreaLog {
        let mut log = AreaLog::new();
        for entry in text.lines().filter_map(parse_area_line) {
            log.insert(entry);
        }
        log
    }

    /// Parse from a reader, replacing invalid UTF-8.
    pub fn from_reader<R: BufRead>(mut reader: R) -> io::Result<AreaLog> {
        let mut log = AreaLog::new();
        let mut buf = Vec::new();
        while reader.read_until(b'\n', &mut buf)? != 0 {
            if let Some(entry) = parse_area_line(
                &String::from_utf8_lossy(&buf)
            ) {
                log.insert(entry);
            }
            buf.clear();
        }
        Ok(log)
    }

    /// Parse a log file.
    ///
    /// A missing or unreadable file is logged and yields an
    /// empty log, which callers treat as "no data".
    pub fn from_file(path: &Path) -> AreaLog {
        let parsed = File::open(path)
            .and_then(|f| AreaLog::from_reader(BufReader::new(f)));
        match parsed {
            Ok(log) => {
                if log.is_empty() {
                    clilog::warn!(VCB_AREA_EMPTY,
                                  "no area lines in {}", path.display());
                }
                log
            }
            Err(e) => {
                clilog::error!(VCB_AREA_READ, "cannot read {}: {}",
                               path.display(), e);
                AreaLog::new()
            }
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.modules.get(name).copied()
    }

    /// The module the log itself declares as top.
    #[inline]
    pub fn declared_top(&self) -> Option<&str> {
        self.declared_top.as_deref()
    }

    /// Largest area of any module, 0 for an empty log.
    pub fn max_area(&self) -> f64 {
        self.modules.values().copied().fold(0., f64::max)
    }

    /// Entries in first-seen order.
    pub fn entries(&self) -> impl Iterator<Item = ModuleAreaEntry> + '_ {
        self.modules.iter().map(move |(name, &area)| ModuleAreaEntry {
            declared_top: self.declared_top() == Some(name.as_str()),
            name: name.clone(), area,
        })
    }
}
