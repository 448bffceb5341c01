use std::{fs::File, path::Path, process::ExitCode, sync::Arc};

use syncbench_common::{Error, Result};
use syncbench_harness::{ContentionBenchmark, DiningTable, LogSettings, Settings};
use syncbench_logging::{get_logger, log_error, log_info, log_severe, log_warning, set_logger, LogCategory, Logger};

pub const LOG_CAT : LogCategory = LogCategory::new("Main");

const DEFAULT_SETTINGS_PATH : &str = "syncbench.toml";

#[derive(Clone, Copy, PartialEq, Debug)]
enum Mode {
    Bench,
    Dining,
    All,
}

impl Mode {
    fn parse(arg: Option<&str>) -> Result<Mode> {
        match arg {
            None | Some("all") => Ok(Mode::All),
            Some("bench")      => Ok(Mode::Bench),
            Some("dining")     => Ok(Mode::Dining),
            Some(_)            => Err(Error::InvalidParameter("expected a mode of 'bench', 'dining' or 'all'")),
        }
    }
}

fn run_benchmark(settings: &Settings) -> Result<bool> {
    let mut bench = ContentionBenchmark::new(settings.benchmark.clone())?;
    let mut complete = true;

    for kind in settings.benchmark.kinds.iter().copied() {
        let report = bench.run_kind(kind)?;
        println!("{report}");

        match report.peak_occupancy {
            Some(peak) => log_info!(LOG_CAT, "{kind}: {} symbols appended, peak occupancy {peak}", report.sequence_len),
            None       => log_info!(LOG_CAT, "{kind}: {} symbols appended", report.sequence_len),
        }
        if !report.is_complete() {
            log_error!(LOG_CAT, run_benchmark, "{kind}: expected {} symbols, found {} (checksum ok: {})", report.expected_len, report.sequence_len, report.checksum_ok);
            complete = false;
        }
    }
    Ok(complete)
}

fn run_dining(settings: &Settings) -> Result<bool> {
    let table = Arc::new(DiningTable::new(settings.dining.clone())?);
    let report = table.run()?;
    log_info!(LOG_CAT, "{report}");

    let all_ate = report.all_ate(settings.dining.rounds);
    if !all_ate {
        log_error!(LOG_CAT, run_dining, "Not every philosopher ate {} times: {:?}", settings.dining.rounds, report.meals);
    }
    Ok(all_ate)
}

fn run(mode: Mode, settings: &Settings) -> Result<bool> {
    let mut success = true;
    if mode != Mode::Dining {
        success &= run_benchmark(settings)?;
    }
    if mode != Mode::Bench {
        success &= run_dining(settings)?;
    }
    Ok(success)
}

fn setup_logger(settings: &LogSettings) -> Result<()> {
    let logger = get_logger();
    logger.set_max_level(settings.level);
    logger.set_log_to_console(settings.console);

    if let Some(path) = &settings.file {
        let file = File::create(path)?;
        if logger.add_writer(Box::new(file)).is_err() {
            log_warning!(LOG_CAT, "No writer slot left for log file '{}'", path.display());
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let logger = Logger::new();
    logger.set_always_flush(true);
    if set_logger(logger).is_err() {
        eprintln!("Logger was already set");
    }

    let args: Vec<String> = std::env::args().collect();
    let result = Mode::parse(args.get(1).map(String::as_str)).and_then(|mode| {
        let path = args.get(2).map_or(DEFAULT_SETTINGS_PATH, String::as_str);
        let settings = Settings::load_or_default(Path::new(path))?;
        setup_logger(&settings.log)?;
        run(mode, &settings)
    });

    let code = match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err @ Error::WorkerPanicked(_)) => {
            log_severe!(LOG_CAT, main, "{err}");
            ExitCode::FAILURE
        },
        Err(err) => {
            log_error!(LOG_CAT, main, "{err}");
            ExitCode::FAILURE
        },
    };
    get_logger().flush();
    code
}
