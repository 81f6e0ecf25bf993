//! Simulation benchmarking.
//!
//! This program runs every test on a baseline and a victim
//! cache configuration, scrapes the simulator logs, and prints
//! the comparison of the two.
//!
//! Existing logs are reused instead of rerunning the simulator,
//! so delete `temp_*.log` in the log directory to get fresh
//! numbers.

use vcbench::{
    Configuration, ConfigRun, RunOptions, TestCase,
    compare, run_batch, report, exec
};
use ciborium::into_writer;
use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(clap::Parser, Debug)]
struct SimBenchArgs {
    /// The baseline configuration simulator
    #[clap(long)]
    baseline_sim: PathBuf,
    /// The victim cache configuration simulator
    #[clap(long)]
    vc_sim: PathBuf,
    /// The tests, as NAME=BINARY, in report order
    #[clap(required = true)]
    tests: Vec<TestCase>,
    /// The baseline configuration name
    #[clap(long, default_value = "Default_Config")]
    baseline_name: String,
    /// The victim cache configuration name
    #[clap(long, default_value = "VC_Config")]
    vc_name: String,
    /// Where simulator logs are written and reused from
    #[clap(long, default_value = ".")]
    log_dir: PathBuf,
    /// The per-run timeout in seconds
    #[clap(long, default_value_t = 1800)]
    timeout: u64,
    /// Extra simulator arguments after the test binary
    #[clap(long = "sim-arg", default_value = "+verbose",
           allow_hyphen_values = true)]
    sim_args: Vec<String>,
    /// A bash script sourced to obtain the run environment
    #[clap(long)]
    env_script: Option<PathBuf>,
    /// Build commands run before any test.
    ///
    /// A failing build aborts the whole run.
    #[clap(long = "build")]
    build: Vec<String>,
    /// The optional results database output path.
    #[clap(long)]
    db_output: Option<PathBuf>,
}

fn main() -> ExitCode {
    clilog::init_stderr_color_debug();
    let args = <SimBenchArgs as clap::Parser>::parse();
    clilog::debug!("args: {:#?}", args);

    let env = args.env_script.as_deref().map(exec::env_from_script);
    for cmd in &args.build {
        if let Err(e) = exec::run_checked(cmd, env.as_ref()) {
            clilog::error!("build failed: {}", e);
            return ExitCode::FAILURE
        }
    }

    let baseline = Configuration::baseline(args.baseline_name.as_str());
    let vc = Configuration::with_victim_cache(args.vc_name.as_str());
    let runs = [
        ConfigRun { config: baseline.clone(), simulator: args.baseline_sim },
        ConfigRun { config: vc.clone(), simulator: args.vc_sim },
    ];
    let opts = RunOptions {
        log_dir: args.log_dir,
        timeout: Duration::from_secs(args.timeout),
        sim_args: args.sim_args,
        env,
    };

    let timer = clilog::stimer!("batch");
    let outcome = run_batch(&runs, &args.tests, &opts);
    clilog::finish!(timer);

    let names: Vec<_> = args.tests.iter().map(|t| t.name.clone()).collect();
    let rows = compare(&outcome.results, &baseline, &vc, &names);
    println!("{}", report::comparison_table(
        &rows, &baseline.name, &vc.name));
    if let Some(records) = outcome.results.config(&vc.name) {
        println!("{}", report::vc_detail_table(records));
    }

    if let Some(path) = &args.db_output {
        let written = File::create(path)
            .map_err(|e| e.to_string())
            .and_then(|f| into_writer(&outcome, f)
                      .map_err(|e| e.to_string()));
        if let Err(e) = written {
            clilog::error!("cannot write {}: {}", path.display(), e);
            return ExitCode::FAILURE
        }
        clilog::info!("results written to {}", path.display());
    }
    ExitCode::SUCCESS
}
