//! Run record accumulation.
//!
//! A unit is one (configuration, test) pair. Its simulator log
//! is produced at most once: an existing log file is reused
//! as-is without any freshness check, so a stale log yields
//! stale metrics.

use crate::classify::LineClassifier;
use crate::error::UnitError;
use crate::exec::{ self, EnvMap, RunExit };
use crate::record::{ Configuration, ConfigurationResults, MetricRecord };
use compact_str::CompactString;
use serde::{ Serialize, Deserialize };
use std::ffi::OsStr;
use std::fs::File;
use std::io::{ self, BufRead, BufReader };
use std::path::{ Path, PathBuf };
use std::str::FromStr;
use std::time::Duration;

/// Fold every line of `reader` into `record`, in order.
///
/// Invalid UTF-8 is replaced rather than rejected. Returns the
/// number of lines read.
pub fn accumulate_reader<R: BufRead>(
    mut reader: R, classifier: &LineClassifier,
    record: &mut MetricRecord
) -> io::Result<usize> {
    let mut buf = Vec::new();
    let mut lines = 0;
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(lines)
        }
        lines += 1;
        classifier.classify(&String::from_utf8_lossy(&buf), record);
    }
}

/// Fold the log file at `path` into `record`.
pub fn accumulate_log(
    path: &Path, classifier: &LineClassifier,
    record: &mut MetricRecord
) -> io::Result<usize> {
    let f = BufReader::with_capacity(65536, File::open(path)?);
    accumulate_reader(f, classifier, record)
}

/// A named test workload.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub name: CompactString,
    pub binary: PathBuf,
}

impl FromStr for TestCase {
    type Err = String;

    /// Parses `NAME=BINARY`, or a bare binary path named by
    /// its file stem.
    fn from_str(s: &str) -> Result<TestCase, String> {
        if let Some((name, binary)) = s.split_once('=') {
            if name.is_empty() || binary.is_empty() {
                return Err(format!("malformed test `{}`", s))
            }
            return Ok(TestCase {
                name: name.into(), binary: binary.into()
            })
        }
        let binary = PathBuf::from(s);
        let name = binary.file_stem()
            .and_then(|n| n.to_str())
            .ok_or_else(|| format!("cannot name test `{}`", s))?
            .into();
        Ok(TestCase { name, binary })
    }
}

/// A configuration paired with the simulator that models it.
#[derive(Debug, Clone)]
pub struct ConfigRun {
    pub config: Configuration,
    pub simulator: PathBuf,
}

/// Settings shared by all units of a batch.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Where `temp_<config>_<test>.log` files live.
    pub log_dir: PathBuf,
    /// Wall clock limit of one simulator run.
    pub timeout: Duration,
    /// Arguments passed after the test binary.
    pub sim_args: Vec<String>,
    /// Child environment. `None` inherits ours.
    pub env: Option<EnvMap>,
}

impl Default for RunOptions {
    fn default() -> RunOptions {
        RunOptions {
            log_dir: PathBuf::from("."),
            timeout: Duration::from_secs(1800),
            sim_args: vec!["+verbose".into()],
            env: None,
        }
    }
}

impl RunOptions {
    /// The log file of one unit.
    pub fn log_path(&self, config: &str, test: &str) -> PathBuf {
        self.log_dir.join(format!("temp_{}_{}.log", config, test))
    }
}

/// How a unit ended.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
pub enum UnitStatus {
    /// The simulator ran and its log was parsed.
    Complete,
    /// A previous log was found and parsed instead of running.
    Reused,
    /// The run hit the deadline. The record holds what the
    /// partial log contained.
    TimedOut,
    /// The unit could not run. The record stays empty.
    Failed,
}

/// Produce (or reuse) the log of one unit and fold it into
/// `record`.
///
/// On [`UnitError::Timeout`] the partial log has already been
/// folded into `record`.
pub fn run_unit(
    run: &ConfigRun, test: &TestCase, opts: &RunOptions,
    record: &mut MetricRecord
) -> Result<UnitStatus, UnitError> {
    if !run.simulator.exists() {
        return Err(UnitError::MissingSimulator(run.simulator.clone()))
    }
    if !test.binary.exists() {
        return Err(UnitError::MissingBinary(test.binary.clone()))
    }
    let log = opts.log_path(&run.config.name, &test.name);
    let mut status = UnitStatus::Complete;
    if log.exists() {
        clilog::warn!(VCB_SKIP,
                      "results for {} already exist, skipping run",
                      test.name);
        status = UnitStatus::Reused;
    }
    else {
        clilog::info!("running {} on {} -> {}",
                      test.name, run.config.name, log.display());
        let args = std::iter::once(test.binary.as_os_str())
            .chain(opts.sim_args.iter().map(OsStr::new));
        let exit = exec::run_to_file(
            &run.simulator, args, opts.env.as_ref(),
            &log, opts.timeout
        ).map_err(|source| UnitError::Spawn {
            program: run.simulator.clone(), source
        })?;
        match exit {
            RunExit::TimedOut => status = UnitStatus::TimedOut,
            RunExit::Exited(s) if !s.success() => {
                clilog::warn!(VCB_EXIT, "{} on {} exited with {}",
                              test.name, run.config.name, s);
            }
            RunExit::Exited(_) => {}
        }
    }
    let classifier = LineClassifier::for_config(&run.config);
    accumulate_log(&log, &classifier, record).map_err(|source| {
        UnitError::Log { path: log.clone(), source }
    })?;
    if status == UnitStatus::TimedOut {
        return Err(UnitError::Timeout(opts.timeout))
    }
    Ok(status)
}

/// The outcome of one unit within a batch.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UnitReport {
    pub config: CompactString,
    pub test: CompactString,
    pub status: UnitStatus,
}

/// Everything a batch produced.
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
pub struct BatchOutcome {
    pub results: ConfigurationResults,
    pub units: Vec<UnitReport>,
}

/// Run every test on every configuration, sequentially.
///
/// Each unit accumulates into its own record, which is only
/// committed to the results when the log was parsed. A failing
/// unit leaves the empty record in place and the batch goes on.
pub fn run_batch(
    runs: &[ConfigRun], tests: &[TestCase], opts: &RunOptions
) -> BatchOutcome {
    let configs: Vec<_> = runs.iter().map(|r| r.config.clone()).collect();
    let names: Vec<_> = tests.iter().map(|t| t.name.clone()).collect();
    let mut outcome = BatchOutcome {
        results: ConfigurationResults::new(&configs, &names),
        units: Vec::new(),
    };
    for run in runs {
        clilog::info!("=== running {} ===", run.config.name);
        for test in tests {
            clilog::info!("processing {} [{}]", test.name, run.config.name);
            let mut record = MetricRecord::default();
            let status = match run_unit(run, test, opts, &mut record) {
                Ok(status) => status,
                Err(e @ UnitError::Timeout(_)) => {
                    clilog::error!(VCB_TIMEOUT, "{} on {}: {}",
                                   test.name, run.config.name, e);
                    UnitStatus::TimedOut
                }
                Err(e) => {
                    clilog::error!(VCB_UNIT, "{} on {}: {}",
                                   test.name, run.config.name, e);
                    UnitStatus::Failed
                }
            };
            if status != UnitStatus::Failed {
                *outcome.results.record_mut(&run.config.name, &test.name)
                    = record;
                clilog::info!("{}", crate::report::unit_summary(
                    &run.config, &record).trim_end());
            }
            outcome.units.push(UnitReport {
                config: run.config.name.clone(),
                test: test.name.clone(),
                status,
            });
        }
    }
    outcome
}
