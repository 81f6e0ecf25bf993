//! Error types.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

/// Failure of one (configuration, test) unit.
///
/// These never abort a batch. The driver logs them and moves
/// on to the next unit.
#[derive(Debug, Error)]
pub enum UnitError {
    #[error("simulator not found at {}", .0.display())]
    MissingSimulator(PathBuf),
    #[error("test binary not found at {}", .0.display())]
    MissingBinary(PathBuf),
    #[error("timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("cannot launch {}: {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot access log {}: {source}", path.display())]
    Log {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Failure of a checked shell command, such as a build step.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("cannot launch `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("`{command}` failed with {status}")]
    Failed {
        command: String,
        status: ExitStatus,
    },
}
