//! Contention benchmark
//!
//! Every worker runs the same loop a fixed number of times:
//!
//! 1. generate a symbol, using its own generator, outside of the measured contention
//! 2. enter the primitive under test
//! 3. append the symbol to the [`SharedSequence`]
//! 4. leave the primitive
//!
//! The time between spawning the first worker and joining the last one is reported per primitive.

use core::{
    fmt,
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};
use std::{sync::Arc, time::Instant};
use syncbench_common::{collections::WorkerRegistry, Error, Result};
use syncbench_logging::{log_verbose, log_warning};
use crate::{BenchmarkSettings, SharedSequence, LOG_CAT};

mod primitive;
mod producer;

pub use primitive::{ContendedPrimitive, PrimitiveKind};
pub use producer::SymbolSource;

/// Result of a single benchmark run
#[derive(Clone, PartialEq, Debug)]
pub struct RunReport {
    /// Kind of primitive that was run
    pub kind            : PrimitiveKind,
    /// Time from spawning the first worker until the last one was joined
    pub elapsed         : Duration,
    /// Length of the shared sequence after all workers were joined
    pub sequence_len    : usize,
    /// Length the sequence should have, `workers * iterations`
    pub expected_len    : usize,
    /// Sum of the symbols in the sequence matches the sum of all produced symbols
    pub checksum_ok     : bool,
    /// Max number of workers seen inside the critical section at the same time, `None` if not tracked
    pub peak_occupancy  : Option<usize>,
}

impl RunReport {
    /// Check that every produced symbol ended up in the sequence exactly once.
    pub fn is_complete(&self) -> bool {
        self.sequence_len == self.expected_len && self.checksum_ok
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("{} time: {} seconds", self.kind.name(), self.elapsed.as_secs_f64()))
    }
}

// Number of workers inside the critical section, and the highest number seen
#[derive(Default)]
struct Occupancy {
    inside : AtomicUsize,
    peak   : AtomicUsize,
}

impl Occupancy {
    fn enter(&self) {
        let inside = self.inside.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(inside, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.inside.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Harness running a fixed contended workload through primitives
pub struct ContentionBenchmark {
    settings : BenchmarkSettings,
    sequence : Arc<SharedSequence>,
}

impl ContentionBenchmark {
    /// Create a new benchmark.
    ///
    /// # Error
    ///
    /// Returns an error if there are no workers or iterations, or the total number of appends does not fit in memory.
    pub fn new(settings: BenchmarkSettings) -> Result<Self> {
        if settings.workers == 0 {
            return Err(Error::InvalidCount("benchmark workers", settings.workers));
        }
        if settings.iterations == 0 {
            return Err(Error::InvalidCount("benchmark iterations", settings.iterations));
        }
        let capacity = settings.workers.checked_mul(settings.iterations)
            .ok_or(Error::InvalidParameter("workers * iterations overflows"))?;

        Ok(Self { settings, sequence: Arc::new(SharedSequence::with_capacity(capacity)) })
    }

    pub fn settings(&self) -> &BenchmarkSettings {
        &self.settings
    }

    /// Get the sequence of the last run.
    pub fn sequence(&self) -> &SharedSequence {
        &self.sequence
    }

    /// Run all kinds from the settings, in order, each with a fresh primitive.
    pub fn run_all(&mut self) -> Result<Vec<RunReport>> {
        let kinds = self.settings.kinds.clone();
        kinds.into_iter().map(|kind| self.run_kind(kind)).collect()
    }

    /// Run the benchmark using a fresh primitive of the given kind.
    pub fn run_kind(&mut self, kind: PrimitiveKind) -> Result<RunReport> {
        let primitive = kind.create(&self.settings)?;
        self.run(primitive)
    }

    /// Run the benchmark on the given primitive.
    ///
    /// The primitive should be in its initial state, and must let all workers through eventually (e.g. a barrier needs one party per worker).
    pub fn run(&mut self, primitive: Arc<dyn ContendedPrimitive>) -> Result<RunReport> {
        let kind = primitive.kind();
        let workers = self.settings.workers;
        let iterations = self.settings.iterations;
        let occupancy = self.settings.track_occupancy.then(|| Arc::new(Occupancy::default()));

        self.reset_sequence();
        log_verbose!(LOG_CAT, "Running {kind} with {workers} workers x {iterations} iterations");

        let mut registry = WorkerRegistry::new();
        let start = Instant::now();
        for idx in 0..workers {
            let primitive = primitive.clone();
            let sequence = self.sequence.clone();
            let occupancy = occupancy.clone();
            let mut source = SymbolSource::for_worker(self.settings.seed, idx);

            registry.spawn(format!("{kind}-{idx}"), move || -> Result<u64> {
                let mut produced = 0u64;
                for _ in 0..iterations {
                    let symbol = source.next_symbol();
                    produced += symbol as u64;

                    append_contended(&*primitive, &sequence, occupancy.as_deref(), symbol)?;
                }
                Ok(produced)
            })?;
        }
        let results = registry.join_all()?;
        let elapsed = start.elapsed();

        let produced = results.into_iter().sum::<Result<u64>>()?;
        let report = RunReport {
            kind,
            elapsed,
            sequence_len: self.sequence.len(),
            expected_len: workers * iterations,
            checksum_ok: produced == self.sequence.checksum(),
            peak_occupancy: occupancy.map(|occupancy| occupancy.peak.load(Ordering::SeqCst)),
        };
        log_verbose!(LOG_CAT, "{kind} finished in {:?}", report.elapsed);
        Ok(report)
    }

    // Workers only hold on to the sequence while running, so after a join we are the only owner
    fn reset_sequence(&mut self) {
        match Arc::get_mut(&mut self.sequence) {
            Some(sequence) => sequence.clear(),
            None => {
                log_warning!(LOG_CAT, "Shared sequence is still referenced, replacing it with a new one");
                self.sequence = Arc::new(SharedSequence::with_capacity(self.sequence.capacity()));
            },
        }
    }
}

// Critical section of a worker, the primitive and occupancy are left on every path out
fn append_contended(primitive: &dyn ContendedPrimitive, sequence: &SharedSequence, occupancy: Option<&Occupancy>, symbol: char) -> Result<()> {
    primitive.enter();
    // SAFETY: paired with the `enter` above
    defer!(unsafe { primitive.leave() });

    if let Some(occupancy) = occupancy {
        occupancy.enter();
    }
    defer!(if let Some(occupancy) = occupancy {
        occupancy.leave();
    });

    sequence.push(symbol)?;
    Ok(())
}
