//! Dining philosophers
//!
//! Each philosopher is a worker sitting between two resources of a [`ResourceRing`].
//! Every round it thinks, acquires both of its resources as a pair, starting with the lower index, eats, and releases them again.

use core::{
    fmt,
    sync::atomic::{AtomicU8, AtomicUsize, Ordering},
    time::Duration,
};
use std::{
    io::{self, Write},
    sync::Arc,
    thread,
    time::Instant,
};
use parking_lot::Mutex;
use syncbench_common::{collections::WorkerRegistry, Result};
use syncbench_logging::{log_debug, log_verbose, LogCategory};
use crate::DiningSettings;

mod ring;

pub use ring::{ResourceGuard, ResourceRing};

const LOG_CAT : LogCategory = LogCategory::new_with_sub("Harness", "Dining");

/// State of a philosopher
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PhilosopherState {
    Thinking,
    /// Waiting for one of the resources, holding none
    WaitingFirst,
    HoldingFirst,
    /// Holding one resource, trying to get the other one
    WaitingSecond,
    /// Holding both resources
    Active,
    Releasing,
}

impl PhilosopherState {
    fn from_u8(val: u8) -> Self {
        match val {
            0 => PhilosopherState::Thinking,
            1 => PhilosopherState::WaitingFirst,
            2 => PhilosopherState::HoldingFirst,
            3 => PhilosopherState::WaitingSecond,
            4 => PhilosopherState::Active,
            _ => PhilosopherState::Releasing,
        }
    }
}

/// Result of a dining run
#[derive(Clone, PartialEq, Debug)]
pub struct DiningReport {
    /// Number of times each philosopher ate
    pub meals   : Vec<usize>,
    pub elapsed : Duration,
}

impl DiningReport {
    /// Check that every philosopher ate `rounds` times.
    pub fn all_ate(&self, rounds: usize) -> bool {
        self.meals.iter().all(|&meals| meals == rounds)
    }
}

impl fmt::Display for DiningReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("{} philosophers ate {} meals in {} seconds", self.meals.len(), self.meals.iter().sum::<usize>(), self.elapsed.as_secs_f64()))
    }
}

/// Table the philosophers share: their resources, states and the output they report to
pub struct DiningTable {
    ring     : ResourceRing,
    states   : Box<[AtomicU8]>,
    meals    : Box<[AtomicUsize]>,
    output   : Mutex<Box<dyn Write + Send>>,
    settings : DiningSettings,
}

impl DiningTable {
    /// Create a table reporting to stdout.
    pub fn new(settings: DiningSettings) -> Result<Self> {
        Self::with_output(settings, Box::new(io::stdout()))
    }

    /// Create a table reporting to `output`.
    ///
    /// # Error
    ///
    /// Returns an error if there are fewer than 2 philosophers.
    pub fn with_output(settings: DiningSettings, output: Box<dyn Write + Send>) -> Result<Self> {
        let ring = ResourceRing::new(settings.philosophers)?;
        let count = settings.philosophers;
        Ok(Self {
            ring,
            states: (0..count).map(|_| AtomicU8::new(PhilosopherState::Thinking as u8)).collect(),
            meals: (0..count).map(|_| AtomicUsize::new(0)).collect(),
            output: Mutex::new(output),
            settings,
        })
    }

    pub fn settings(&self) -> &DiningSettings {
        &self.settings
    }

    pub fn ring(&self) -> &ResourceRing {
        &self.ring
    }

    /// Get the current state of a philosopher.
    pub fn state(&self, philosopher: usize) -> Option<PhilosopherState> {
        self.states.get(philosopher).map(|state| PhilosopherState::from_u8(state.load(Ordering::Acquire)))
    }

    /// Get the number of times a philosopher has eaten.
    pub fn meals(&self, philosopher: usize) -> Option<usize> {
        self.meals.get(philosopher).map(|meals| meals.load(Ordering::Acquire))
    }

    /// Seat a worker per philosopher and run all rounds, returning once every philosopher is done.
    pub fn run(self: &Arc<Self>) -> Result<DiningReport> {
        let count = self.settings.philosophers;
        log_verbose!(LOG_CAT, "Seating {count} philosophers for {} rounds", self.settings.rounds);

        let mut registry = WorkerRegistry::new();
        let start = Instant::now();
        for idx in 0..count {
            let table = self.clone();
            registry.spawn(format!("philosopher-{idx}"), move || table.dine(idx))?;
        }
        registry.join_all()?.into_iter().collect::<Result<()>>()?;
        let elapsed = start.elapsed();

        self.output.lock().flush()?;
        let meals = self.meals.iter().map(|meals| meals.load(Ordering::Acquire)).collect();
        Ok(DiningReport { meals, elapsed })
    }

    fn dine(&self, philosopher: usize) -> Result<()> {
        for _ in 0..self.settings.rounds {
            self.set_state(philosopher, PhilosopherState::Thinking);
            self.say(philosopher, "is thinking")?;
            pause(self.settings.think_time);

            let guards = self.ring.lock_pair(philosopher, |state| self.set_state(philosopher, state))?;

            self.set_state(philosopher, PhilosopherState::Active);
            self.say(philosopher, "is eating")?;
            pause(self.settings.eat_time);
            self.meals[philosopher].fetch_add(1, Ordering::AcqRel);

            self.set_state(philosopher, PhilosopherState::Releasing);
            drop(guards);
            self.say(philosopher, "is done")?;
        }
        self.set_state(philosopher, PhilosopherState::Thinking);
        Ok(())
    }

    fn set_state(&self, philosopher: usize, state: PhilosopherState) {
        log_debug!(LOG_CAT, Self::set_state, "Philosopher {} -> {state:?}", philosopher + 1);
        self.states[philosopher].store(state as u8, Ordering::Release);
    }

    fn say(&self, philosopher: usize, what: &str) -> Result<()> {
        let mut output = self.output.lock();
        writeln!(output, "Philosopher {} {what}", philosopher + 1)?;
        Ok(())
    }
}

fn pause(duration: Duration) {
    if !duration.is_zero() {
        thread::sleep(duration);
    }
}

impl fmt::Debug for DiningTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiningTable")
            .field("philosophers", &self.settings.philosophers)
            .field("rounds", &self.settings.rounds)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(60);

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Capture {
        fn lines(&self) -> Vec<String> {
            String::from_utf8_lossy(&self.0.lock()).lines().map(str::to_string).collect()
        }
    }

    fn run_with_timeout(settings: DiningSettings, capture: Capture) -> (Arc<DiningTable>, DiningReport) {
        let table = Arc::new(DiningTable::with_output(settings, Box::new(capture)).unwrap());
        let (sender, receiver) = mpsc::channel();
        let runner = table.clone();
        thread::spawn(move || {
            let report = runner.run().unwrap();
            _ = sender.send(report);
        });
        let report = receiver.recv_timeout(TIMEOUT).expect("philosophers did not finish in time");
        (table, report)
    }

    fn fast_settings(philosophers: usize, rounds: usize) -> DiningSettings {
        DiningSettings::default()
            .with_philosophers(philosophers)
            .with_rounds(rounds)
            .with_timing(Duration::from_millis(1), Duration::from_millis(1))
    }

    #[test]
    fn too_few_philosophers() {
        assert!(DiningTable::new(DiningSettings::default().with_philosophers(1)).is_err());
    }

    #[test]
    fn everyone_eats() {
        let capture = Capture::default();
        let (table, report) = run_with_timeout(fast_settings(5, 3), capture.clone());

        assert!(report.all_ate(3));
        for idx in 0..5 {
            assert_eq!(table.meals(idx), Some(3));
            assert_eq!(table.state(idx), Some(PhilosopherState::Thinking));
            assert_eq!(table.ring().holder(idx).unwrap(), None);
        }
        assert_eq!(capture.lines().len(), 5 * 3 * 3);
    }

    #[test]
    fn lines_follow_lifecycle() {
        let capture = Capture::default();
        run_with_timeout(fast_settings(5, 2), capture.clone());

        let lines = capture.lines();
        for idx in 1..=5 {
            let prefix = format!("Philosopher {idx} ");
            let own: Vec<_> = lines.iter()
                .filter_map(|line| line.strip_prefix(&prefix))
                .collect();
            assert_eq!(own, ["is thinking", "is eating", "is done", "is thinking", "is eating", "is done"]);
        }
    }

    #[test]
    fn no_deadlock_under_stress() {
        let settings = DiningSettings::default()
            .with_philosophers(5)
            .with_rounds(200)
            .with_timing(Duration::ZERO, Duration::ZERO);
        let (_, report) = run_with_timeout(settings, Capture::default());
        assert!(report.all_ate(200));
    }

    #[test]
    fn two_philosophers_share_both_resources() {
        let settings = DiningSettings::default()
            .with_philosophers(2)
            .with_rounds(50)
            .with_timing(Duration::ZERO, Duration::ZERO);
        let (table, report) = run_with_timeout(settings, Capture::default());
        assert_eq!(report.meals, [50, 50]);
        assert_eq!(table.ring().pair_for(0).unwrap(), table.ring().pair_for(1).unwrap());
    }
}
