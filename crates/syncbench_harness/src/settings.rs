use core::time::Duration;
use std::path::{Path, PathBuf};
use syncbench_common::{Error, Result};
use syncbench_logging::{log_info, LogLevel};
use syncbench_toml::{Item, Table, Toml};
use crate::{LOG_CAT, PrimitiveKind};

/// Contention benchmark settings
#[derive(Clone, PartialEq, Debug)]
pub struct BenchmarkSettings {
    /// Number of workers contending on the primitive
    pub workers           : usize,
    /// Number of appends each worker performs
    pub iterations        : usize,
    /// Primitives to run, in order
    pub kinds             : Vec<PrimitiveKind>,
    /// Initial count of the semaphore
    pub semaphore_initial : usize,
    /// Max count of the semaphore
    pub semaphore_max     : usize,
    /// Track how many workers are inside the critical section at the same time.
    ///
    /// This adds a few atomic operations to every critical section, so it slightly skews the timing.
    pub track_occupancy   : bool,
    /// Seed for the per-worker symbol generators, random if not set
    pub seed              : Option<u64>,
}

impl BenchmarkSettings {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_kinds(mut self, kinds: &[PrimitiveKind]) -> Self {
        self.kinds = kinds.to_vec();
        self
    }

    pub fn with_semaphore(mut self, initial: usize, max: usize) -> Self {
        self.semaphore_initial = initial;
        self.semaphore_max = max;
        self
    }

    pub fn with_occupancy_tracking(mut self, track: bool) -> Self {
        self.track_occupancy = track;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl Default for BenchmarkSettings {
    fn default() -> Self {
        Self {
            workers: 4,
            iterations: 10_000,
            kinds: PrimitiveKind::ALL.to_vec(),
            semaphore_initial: 4,
            semaphore_max: 4,
            track_occupancy: false,
            seed: None,
        }
    }
}

/// Dining philosophers settings
#[derive(Clone, PartialEq, Debug)]
pub struct DiningSettings {
    /// Number of philosophers, and therefore resources on the table
    pub philosophers : usize,
    /// Number of think-eat cycles each philosopher goes through
    pub rounds       : usize,
    pub think_time   : Duration,
    pub eat_time     : Duration,
}

impl DiningSettings {
    pub fn with_philosophers(mut self, philosophers: usize) -> Self {
        self.philosophers = philosophers;
        self
    }

    pub fn with_rounds(mut self, rounds: usize) -> Self {
        self.rounds = rounds;
        self
    }

    pub fn with_timing(mut self, think_time: Duration, eat_time: Duration) -> Self {
        self.think_time = think_time;
        self.eat_time = eat_time;
        self
    }
}

impl Default for DiningSettings {
    fn default() -> Self {
        Self {
            philosophers: 5,
            rounds: 1,
            think_time: Duration::from_secs(5),
            eat_time: Duration::from_secs(5),
        }
    }
}

/// Logging settings
#[derive(Clone, PartialEq, Debug)]
pub struct LogSettings {
    /// Max level that gets logged
    pub level   : LogLevel,
    /// Log to the console
    pub console : bool,
    /// File the log is additionally written to
    pub file    : Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self { level: LogLevel::default(), console: true, file: None }
    }
}

/// syncbench settings
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Settings {
    pub benchmark : BenchmarkSettings,
    pub dining    : DiningSettings,
    pub log       : LogSettings,
}

impl Settings {
    /// Load the settings from a toml string.
    ///
    /// Missing sections and keys keep their default value, unknown ones are ignored.
    pub fn load(toml: &str) -> Result<Settings> {
        let toml = Toml::parse(toml).map_err(|err| Error::Settings(err.to_string()))?;
        let mut settings = Settings::default();

        if let Some(bench) = toml.get_table("benchmark") {
            let settings = &mut settings.benchmark;
            read_usize(bench, "benchmark", "workers", &mut settings.workers)?;
            read_usize(bench, "benchmark", "iterations", &mut settings.iterations)?;
            read_bool(bench, "benchmark", "track-occupancy", &mut settings.track_occupancy)?;

            if let Some(item) = bench.get_item("seed") {
                let mut seed = 0;
                read_usize_item(item, "benchmark", "seed", &mut seed)?;
                settings.seed = Some(seed as u64);
            }

            if let Some(item) = bench.get_item("kinds") {
                let Item::Array(kinds) = item else {
                    return Err(type_error("benchmark", "kinds", "an array of strings", item));
                };

                settings.kinds.clear();
                for kind in kinds {
                    let Item::String(name) = kind else {
                        return Err(type_error("benchmark", "kinds", "an array of strings", kind));
                    };
                    match name.parse::<PrimitiveKind>() {
                        Ok(kind) => settings.kinds.push(kind),
                        Err(_) => return Err(Error::Settings(format!("Unknown primitive kind '{name}' in 'benchmark.kinds'"))),
                    }
                }
            }
        }

        if let Some(semaphore) = toml.get_table("semaphore") {
            read_usize(semaphore, "semaphore", "initial", &mut settings.benchmark.semaphore_initial)?;
            read_usize(semaphore, "semaphore", "max", &mut settings.benchmark.semaphore_max)?;
        }

        if let Some(dining) = toml.get_table("dining") {
            let settings = &mut settings.dining;
            read_usize(dining, "dining", "philosophers", &mut settings.philosophers)?;
            read_usize(dining, "dining", "rounds", &mut settings.rounds)?;
            read_millis(dining, "dining", "think-ms", &mut settings.think_time)?;
            read_millis(dining, "dining", "eat-ms", &mut settings.eat_time)?;
        }

        if let Some(log) = toml.get_table("log") {
            if let Some(item) = log.get_item("level") {
                settings.log.level = match item {
                    Item::String(level) => level.parse().map_err(|_| Error::Settings(format!("Unknown log level '{level}' in 'log.level'")))?,
                    _ => return Err(type_error("log", "level", "a string", item)),
                };
            }
            read_bool(log, "log", "console", &mut settings.log.console)?;
            if let Some(item) = log.get_item("file") {
                settings.log.file = match item {
                    Item::String(path) => Some(PathBuf::from(path)),
                    _ => return Err(type_error("log", "file", "a string", item)),
                };
            }
        }

        Ok(settings)
    }

    /// Load the settings from a file, or use the default settings if the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Settings> {
        if !path.exists() {
            log_info!(LOG_CAT, "No settings file found at '{}', using default settings", path.display());
            return Ok(Settings::default());
        }

        let source = std::fs::read_to_string(path)?;
        let settings = Settings::load(&source)?;
        log_info!(LOG_CAT, "Loaded settings from '{}'", path.display());
        Ok(settings)
    }
}

fn type_error(section: &str, key: &str, expected: &str, found: &Item) -> Error {
    Error::Settings(format!("'{section}.{key}' should be {expected}, found {}", found.type_name()))
}

fn read_usize_item(item: &Item, section: &str, key: &str, value: &mut usize) -> Result<()> {
    match item {
        Item::Integer(val) => match usize::try_from(*val) {
            Ok(val) => {
                *value = val;
                Ok(())
            },
            Err(_) => Err(Error::Settings(format!("'{section}.{key}' should not be negative, found {val}"))),
        },
        _ => Err(type_error(section, key, "an integer", item)),
    }
}

fn read_usize(table: &Table, section: &str, key: &str, value: &mut usize) -> Result<()> {
    match table.get_item(key) {
        Some(item) => read_usize_item(item, section, key, value),
        None => Ok(()),
    }
}

fn read_bool(table: &Table, section: &str, key: &str, value: &mut bool) -> Result<()> {
    match table.get_item(key) {
        Some(Item::Boolean(val)) => {
            *value = *val;
            Ok(())
        },
        Some(item) => Err(type_error(section, key, "a boolean", item)),
        None => Ok(()),
    }
}

fn read_millis(table: &Table, section: &str, key: &str, value: &mut Duration) -> Result<()> {
    let mut millis = value.as_millis() as usize;
    read_usize(table, section, key, &mut millis)?;
    *value = Duration::from_millis(millis as u64);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_run() {
        let settings = Settings::load("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.benchmark.workers, 4);
        assert_eq!(settings.benchmark.iterations, 10_000);
        assert_eq!(settings.benchmark.kinds, PrimitiveKind::ALL);
        assert_eq!(settings.dining.philosophers, 5);
        assert_eq!(settings.log.level, LogLevel::Info);
        assert!(settings.log.console);
        assert_eq!(settings.log.file, None);
    }

    #[test]
    fn load_all_sections() {
        let settings = Settings::load(r#"
[benchmark]
workers = 8
iterations = 250
kinds = ["spinwait", "monitor"]
track-occupancy = true
seed = 7

[semaphore]
initial = 1
max = 2

[dining]
philosophers = 3
rounds = 4
think-ms = 10
eat-ms = 0

[log]
level = "debug"
console = false
file = "syncbench.log"
"#).unwrap();

        let expected_bench = BenchmarkSettings::default()
            .with_workers(8)
            .with_iterations(250)
            .with_kinds(&[PrimitiveKind::SpinWait, PrimitiveKind::Monitor])
            .with_occupancy_tracking(true)
            .with_seed(7)
            .with_semaphore(1, 2);
        assert_eq!(settings.benchmark, expected_bench);

        let expected_dining = DiningSettings::default()
            .with_philosophers(3)
            .with_rounds(4)
            .with_timing(Duration::from_millis(10), Duration::ZERO);
        assert_eq!(settings.dining, expected_dining);
        assert_eq!(settings.log, LogSettings { level: LogLevel::Debug, console: false, file: Some(PathBuf::from("syncbench.log")) });
    }

    #[test]
    fn invalid_values() {
        assert!(matches!(Settings::load("[benchmark]\nworkers = -1"), Err(Error::Settings(_))));
        assert!(matches!(Settings::load("[benchmark]\nworkers = \"four\""), Err(Error::Settings(_))));
        assert!(matches!(Settings::load("[benchmark]\nkinds = [\"futex\"]"), Err(Error::Settings(_))));
        assert!(matches!(Settings::load("[benchmark]\ntrack-occupancy = 1"), Err(Error::Settings(_))));
        assert!(matches!(Settings::load("[log]\nlevel = \"loud\""), Err(Error::Settings(_))));
        assert!(matches!(Settings::load("[log]\nfile = 3"), Err(Error::Settings(_))));
        assert!(matches!(Settings::load("[benchmark"), Err(Error::Settings(_))));
    }

    #[test]
    fn missing_file_uses_defaults() {
        let settings = Settings::load_or_default(Path::new("this/file/does/not/exist.toml")).unwrap();
        assert_eq!(settings, Settings::default());
    }
}
