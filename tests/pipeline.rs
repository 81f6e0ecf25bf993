//! End-to-end batch runs with `/bin/sh` standing in for the
//! simulator: it is handed a script as the "test binary".
#![cfg(unix)]

use indoc::indoc;
use std::fs;
use std::path::Path;
use std::time::Duration;
use vcbench::{
    compare, run_batch, BatchOutcome, ConfigRun, Configuration,
    HitRateTier, RunOptions, TestCase, UnitStatus
};

fn write_test(dir: &Path, name: &str, body: &str) -> TestCase {
    let binary = dir.join(format!("{}.sh", name));
    fs::write(&binary, body).unwrap();
    TestCase { name: name.into(), binary }
}

fn configs() -> (Configuration, Configuration) {
    (Configuration::baseline("Default_Config"),
     Configuration::with_victim_cache("VC_Config"))
}

#[test]
fn batch_runs_reuses_and_isolates_failures() {
    let dir = tempfile::tempdir().unwrap();
    let opts = RunOptions {
        log_dir: dir.path().into(),
        timeout: Duration::from_secs(60),
        ..Default::default()
    };
    let linear = write_test(dir.path(), "Linear", indoc! {r#"
        echo "Starting Test 1: Linear Scan"
        echo "[VC-HIT] ignored on the baseline"
        echo "Cycles: 2000"
        echo "Instructions: 1000"
        echo "L1D misses  (mhpmcounter3) = 0x10"
        echo "L1I misses  (mhpmcounter4) = 0x2"
        echo "L1D accesses  (mhpmcounter5) = 0x40"
        echo "L1D hits = 0x30"
    "#});
    let thrashing = write_test(dir.path(), "Thrashing", indoc! {r#"
        echo "Cycles: 5000"
        echo "Instructions: 1000"
    "#});
    let missing = TestCase {
        name: "Missing".into(),
        binary: dir.path().join("missing.riscv"),
    };
    let (base, vc) = configs();

    // victim cache logs exist already and must be reused
    fs::write(opts.log_path("VC_Config", "Linear"), indoc! {"
        [VC-HIT] a
        [VC-HIT] b
        [VC-HIT] c
        [VC-MISS] d
        [VC-ALLOC] e
        Cycles: 1500
        Instructions: 1000
    "}).unwrap();
    fs::write(opts.log_path("VC_Config", "Thrashing"),
              "Cycles: 5200\n[VC-MISS]\n[VC-MISS]\n[VC-HIT]\n").unwrap();

    let runs = [
        ConfigRun { config: base.clone(), simulator: "/bin/sh".into() },
        ConfigRun { config: vc.clone(), simulator: "/bin/sh".into() },
    ];
    let tests = [linear, thrashing, missing];
    let outcome = run_batch(&runs, &tests, &opts);

    let status: Vec<_> = outcome.units.iter()
        .map(|u| (u.config.as_str(), u.test.as_str(), u.status))
        .collect();
    assert_eq!(status, [
        ("Default_Config", "Linear", UnitStatus::Complete),
        ("Default_Config", "Thrashing", UnitStatus::Complete),
        ("Default_Config", "Missing", UnitStatus::Failed),
        ("VC_Config", "Linear", UnitStatus::Reused),
        ("VC_Config", "Thrashing", UnitStatus::Reused),
        ("VC_Config", "Missing", UnitStatus::Failed),
    ]);

    let b = outcome.results.get("Default_Config", "Linear").unwrap();
    assert_eq!((b.cycles, b.instructions), (2000, 1000));
    assert_eq!((b.l1d_misses, b.l1i_misses, b.l1d_accesses, b.l1d_hits),
               (16, 2, 64, 48));
    assert_eq!(b.l1d_miss_percent(), 25.);
    assert_eq!((b.vc_hits, b.vc_misses, b.vc_allocs), (0, 0, 0));
    assert_eq!(outcome.results.get("VC_Config", "Missing").unwrap(),
               &Default::default());

    let names: Vec<_> = tests.iter().map(|t| t.name.clone()).collect();
    let rows = compare(&outcome.results, &base, &vc, &names);
    assert_eq!(rows[0].speedup_percent, Some(25.));
    assert_eq!(rows[0].vc_hit_rate, Some(75.));
    assert_eq!(rows[0].vc_tier(), Some(HitRateTier::High));
    assert_eq!(rows[1].speedup_percent, Some(-4.));
    assert_eq!(rows[1].vc_tier(), Some(HitRateTier::High));
    assert_eq!(rows[2].speedup_percent, None);
    assert_eq!(rows[2].vc_tier(), Some(HitRateTier::Low));

    let mut db = Vec::new();
    ciborium::into_writer(&outcome, &mut db).unwrap();
    let back: BatchOutcome = ciborium::from_reader(&db[..]).unwrap();
    assert_eq!(back.units, outcome.units);
    assert_eq!(back.results.get("VC_Config", "Linear"),
               outcome.results.get("VC_Config", "Linear"));
}

#[test]
fn timeout_keeps_partial_metrics() {
    let dir = tempfile::tempdir().unwrap();
    let opts = RunOptions {
        log_dir: dir.path().into(),
        timeout: Duration::from_millis(500),
        ..Default::default()
    };
    let slow = write_test(dir.path(), "Slow", indoc! {r#"
        echo "Cycles: 10"
        echo "[VC-ALLOC]"
        exec sleep 30
    "#});
    let (_, vc) = configs();
    let runs = [ConfigRun { config: vc, simulator: "/bin/sh".into() }];
    let tests = [slow];

    let outcome = run_batch(&runs, &tests, &opts);
    assert_eq!(outcome.units[0].status, UnitStatus::TimedOut);
    let r = outcome.results.get("VC_Config", "Slow").unwrap();
    assert_eq!((r.cycles, r.vc_allocs), (10, 1));

    // the partial log is reused on the next batch
    let again = run_batch(&runs, &tests, &opts);
    assert_eq!(again.units[0].status, UnitStatus::Reused);
    assert_eq!(again.results.get("VC_Config", "Slow"), Some(r));
}

#[test]
fn failed_launch_leaves_no_log_behind() {
    let dir = tempfile::tempdir().unwrap();
    let opts = RunOptions {
        log_dir: dir.path().into(),
        timeout: Duration::from_secs(30),
        ..Default::default()
    };
    // exists, but has no exec bit
    let simulator = dir.path().join("simulator-debug");
    fs::write(&simulator, "echo Cycles: 1\n").unwrap();
    let test = write_test(dir.path(), "Linear", "echo Cycles: 2\n");
    let (base, _) = configs();
    let runs = [ConfigRun { config: base, simulator }];
    let tests = [test];

    for _ in 0..2 {
        let outcome = run_batch(&runs, &tests, &opts);
        assert_eq!(outcome.units[0].status, UnitStatus::Failed);
        assert!(!opts.log_path("Default_Config", "Linear").exists());
    }
}
