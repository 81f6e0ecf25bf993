//! External command execution.
//!
//! Simulator runs are blocking with a wall clock limit. Output
//! goes straight to a log file which is parsed afterwards.

use crate::error::CommandError;
use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs::{ self, File };
use std::io;
use std::path::Path;
use std::process::{ Child, Command, ExitStatus, Stdio };
use std::thread;
use std::time::{ Duration, Instant };

/// Environment handed to child processes.
pub type EnvMap = HashMap<String, String>;

/// How a time-limited run ended.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RunExit {
    Exited(ExitStatus),
    /// The process was killed at the deadline.
    TimedOut,
}

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Run `program` with stdout and stderr redirected into
/// `output`, killing it once `timeout` has elapsed.
///
/// Whatever the process wrote before the deadline stays in
/// the output file. If the process cannot be launched, the
/// output file is removed again.
pub fn run_to_file<I, S>(
    program: &Path, args: I, env: Option<&EnvMap>,
    output: &Path, timeout: Duration
) -> io::Result<RunExit>
where I: IntoIterator<Item = S>, S: AsRef<OsStr>
{
    let stdout = File::create(output)?;
    let stderr = stdout.try_clone()?;
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout))
        .stderr(Stdio::from(stderr));
    if let Some(env) = env {
        cmd.env_clear().envs(env);
    }
    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            // drop the empty log so it is never mistaken for a
            // finished run
            let _ = fs::remove_file(output);
            return Err(e)
        }
    };
    wait_with_deadline(&mut child, timeout).map_err(|e| {
        let _ = child.kill();
        let _ = child.wait();
        e
    })
}

/// Poll `child` until it exits or `timeout` elapses.
fn wait_with_deadline(
    child: &mut Child, timeout: Duration
) -> io::Result<RunExit> {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(RunExit::Exited(status))
        }
        let elapsed = start.elapsed();
        if elapsed >= timeout {
            child.kill()?;
            child.wait()?;
            return Ok(RunExit::TimedOut)
        }
        thread::sleep(POLL_INTERVAL.min(timeout - elapsed));
    }
}

/// Run a shell command through bash and fail on a non-zero
/// exit.
pub fn run_checked(
    command: &str, env: Option<&EnvMap>
) -> Result<(), CommandError> {
    clilog::info!("[EXEC] {}", command);
    let mut cmd = Command::new("bash");
    cmd.arg("-c").arg(command);
    if let Some(env) = env {
        cmd.env_clear().envs(env);
    }
    let status = cmd.status().map_err(|source| CommandError::Spawn {
        command: command.into(), source
    })?;
    if !status.success() {
        return Err(CommandError::Failed {
            command: command.into(), status
        })
    }
    Ok(())
}

/// Parse `KEY=VALUE` lines as printed by `env`.
///
/// Lines without `=` are skipped. Values keep everything
/// after the first `=`.
pub fn parse_env_listing(listing: &str) -> EnvMap {
    listing.lines()
        .filter_map(|l| l.split_once('='))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// The environment obtained by sourcing `script` in bash.
///
/// Falls back to the current environment if the script is
/// missing or sourcing it fails.
pub fn env_from_script(script: &Path) -> EnvMap {
    if !script.exists() {
        return std::env::vars().collect()
    }
    let output = Command::new("bash")
        .arg("-c")
        .arg(format!("source '{}' && env", script.display()))
        .stdin(Stdio::null())
        .output();
    match output {
        Ok(out) if out.status.success() => {
            parse_env_listing(&String::from_utf8_lossy(&out.stdout))
        }
        Ok(out) => {
            clilog::warn!(VCB_ENV,
                          "sourcing {} failed ({}), using current env",
                          script.display(), out.status);
            std::env::vars().collect()
        }
        Err(e) => {
            clilog::warn!(VCB_ENV,
                          "cannot run bash for {} ({}), using current env",
                          script.display(), e);
            std::env::vars().collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_listing_splits_on_first_equals() {
        let env = parse_env_listing(
            "PATH=/usr/bin:/bin\nOPTS=a=b\nnot a pair\nEMPTY=\n");
        assert_eq!(env.len(), 3);
        assert_eq!(env["PATH"], "/usr/bin:/bin");
        assert_eq!(env["OPTS"], "a=b");
        assert_eq!(env["EMPTY"], "");
    }

    #[test]
    fn missing_script_gives_current_env() {
        let env = env_from_script(Path::new("/nonexistent/env.sh"));
        assert_eq!(env.len(), std::env::vars().count());
    }

    #[cfg(unix)]
    #[test]
    fn run_to_file_captures_both_streams() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.log");
        let exit = run_to_file(
            Path::new("/bin/sh"),
            ["-c", "echo Cycles: 5; echo oops >&2"],
            None, &out, Duration::from_secs(30)
        ).unwrap();
        assert!(matches!(exit, RunExit::Exited(s) if s.success()));
        let text = std::fs::read_to_string(&out).unwrap();
        assert!(text.contains("Cycles: 5"));
        assert!(text.contains("oops"));
    }

    #[cfg(unix)]
    #[test]
    fn run_to_file_kills_at_deadline() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.log");
        let start = Instant::now();
        let exit = run_to_file(
            Path::new("/bin/sh"),
            ["-c", "echo started; exec sleep 30"],
            None, &out, Duration::from_millis(300)
        ).unwrap();
        assert_eq!(exit, RunExit::TimedOut);
        assert!(start.elapsed() < Duration::from_secs(10));
        let text = std::fs::read_to_string(&out).unwrap();
        assert!(text.contains("started"));
    }

    #[test]
    fn launch_failure_removes_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.log");
        // a directory exists but cannot be executed
        let res = run_to_file(
            dir.path(), ["x"], None, &out, Duration::from_secs(5));
        assert!(res.is_err());
        assert!(!out.exists());
    }

    #[cfg(unix)]
    #[test]
    fn run_checked_reports_failure() {
        assert!(run_checked("true", None).is_ok());
        assert!(matches!(run_checked("exit 3", None),
                         Err(CommandError::Failed { .. })));
    }
}
