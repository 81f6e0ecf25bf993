//! Synthesis area statistics.
//!
//! This program reads one or more synthesis stat logs and
//! prints, for each, the module areas ranked with their share
//! of the chip. The top module is always listed first.

use vcbench::{ AreaLog, AreaReport, AttributionOptions, report };
use ciborium::into_writer;
use compact_str::CompactString;
use indexmap::IndexMap;
use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(clap::Parser, Debug)]
struct AreaStatArgs {
    /// The stat logs, as LABEL=PATH or PATH
    #[clap(required = true)]
    logs: Vec<String>,
    /// The top module name
    #[clap(long, default_value = "ChipTop")]
    top: String,
    /// Highlight modules whose name contains this
    #[clap(long = "featured-marker", default_value = "VictimCache")]
    featured_markers: Vec<String>,
    /// Highlight modules with exactly this name
    #[clap(long = "featured-name", default_value = "Rocket")]
    featured_names: Vec<String>,
    /// The optional area database output path.
    #[clap(long)]
    db_output: Option<PathBuf>,
}

/// Split `LABEL=PATH`, labeling bare paths by file stem.
fn labeled(arg: &str) -> (CompactString, PathBuf) {
    if let Some((label, path)) = arg.split_once('=') {
        return (label.into(), path.into())
    }
    let path = PathBuf::from(arg);
    let label = path.file_stem()
        .map(|s| CompactString::new(s.to_string_lossy()))
        .unwrap_or_else(|| arg.into());
    (label, path)
}

fn main() -> ExitCode {
    clilog::init_stderr_color_debug();
    let args = <AreaStatArgs as clap::Parser>::parse();
    clilog::debug!("args: {:#?}", args);
    let opts = AttributionOptions {
        top_module: args.top.as_str().into(),
        featured_markers: args.featured_markers.iter()
            .map(|m| m.as_str().into()).collect(),
        featured_names: args.featured_names.iter()
            .map(|m| m.as_str().into()).collect(),
        ..Default::default()
    };

    let mut reports = IndexMap::<CompactString, AreaReport>::new();
    for arg in &args.logs {
        let (label, path) = labeled(arg);
        clilog::info!("parsing {}", path.display());
        let log = AreaLog::from_file(&path);
        let report = AreaReport::build(&log, &opts);
        println!("{}", report::area_table(
            &format!("{} Area", label), &report, &opts));
        if !report.is_empty() {
            reports.insert(label, report);
        }
    }

    if let Some(path) = &args.db_output {
        if reports.is_empty() {
            clilog::warn!("no area data, not writing {}", path.display());
            return ExitCode::SUCCESS
        }
        let written = File::create(path)
            .map_err(|e| e.to_string())
            .and_then(|f| into_writer(&reports, f)
                      .map_err(|e| e.to_string()));
        if let Err(e) = written {
            clilog::error!("cannot write {}: {}", path.display(), e);
            return ExitCode::FAILURE
        }
        clilog::info!("area reports written to {}", path.display());
    }
    ExitCode::SUCCESS
}
