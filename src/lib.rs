//! ## `vcbench`: victim cache benchmarking
//!
//! This contains the core functionalities and data structures
//! for scraping cycle-accurate simulator logs and synthesis
//! area logs into comparable metrics.
//!
//! See the binaries for example usage.

pub mod record;
pub mod classify;
pub mod error;
pub mod exec;
pub mod accumulate;
pub mod compare;
pub mod area;
pub mod attribution;
pub mod report;

pub use record::{ Configuration, ConfigurationResults, MetricRecord,
                  MetricUpdate, TestResults };
pub use classify::LineClassifier;
pub use error::{ CommandError, UnitError };
pub use accumulate::{ BatchOutcome, ConfigRun, RunOptions, TestCase,
                      UnitReport, UnitStatus, run_batch, run_unit };
pub use compare::{ ComparisonRow, HitRateTier, compare };
pub use area::{ AreaLog, ModuleAreaEntry };
pub use attribution::{ AreaReport, AttributionOptions, RankedModule };
