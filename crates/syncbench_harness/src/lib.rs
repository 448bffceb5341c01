//! Workloads driving the syncbench primitives
//!
//! - [`ContentionBenchmark`] times a fixed, contended append workload through each primitive.
//! - [`DiningTable`] runs the dining philosophers, acquiring two resources per worker in a globally agreed order.

#[macro_use]
extern crate scopeguard;

use syncbench_logging::LogCategory;

mod sequence;
mod settings;

pub mod benchmark;
pub mod dining;

pub use benchmark::{ContendedPrimitive, ContentionBenchmark, PrimitiveKind, RunReport, SymbolSource};
pub use dining::{DiningReport, DiningTable, PhilosopherState, ResourceRing};
pub use sequence::SharedSequence;
pub use settings::{BenchmarkSettings, DiningSettings, LogSettings, Settings};

pub const LOG_CAT : LogCategory = LogCategory::new("Harness");
