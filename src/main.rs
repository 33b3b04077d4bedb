use anyhow::{bail, Context, Result};
use clap::Parser;
use drainlog::logging::{ErrorReporter, JsonStderrReporter, StderrReporter};
use drainlog::{log_info, ConfigFile, Logger, LoggerConfig, Severity};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser, Debug, PartialEq)]
enum Command {
    /// Hammer the logger from many threads while rotating destination files
    Stress {
        /// Number of producer threads
        #[arg(long, default_value_t = 50)]
        workers: usize,
        /// Messages logged by each producer
        #[arg(long, default_value_t = 5000)]
        messages: usize,
        /// Stop / switch file / start cycles while producers are running
        #[arg(long, default_value_t = 9)]
        rotations: usize,
        /// Directory receiving log_file<N>.txt
        #[arg(long, default_value = ".")]
        dir: PathBuf,
        /// Drain interval in milliseconds
        #[arg(long, default_value_t = 10)]
        interval_ms: u64,
        /// Minimum severity kept by the logger
        #[arg(long, default_value = "trace")]
        min_severity: Severity,
        /// Report logger errors as JSON lines on stderr
        #[arg(long)]
        json_errors: bool,
    },
    /// Validate a JSON5 configuration file
    CheckConfig {
        /// Path to the configuration file
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Command::Stress {
            workers,
            messages,
            rotations,
            dir,
            interval_ms,
            min_severity,
            json_errors,
        } => {
            let config = LoggerConfig::new(min_severity, Duration::from_millis(interval_ms));
            let reporter: Arc<dyn ErrorReporter> = if json_errors {
                Arc::new(JsonStderrReporter)
            } else {
                Arc::new(StderrReporter)
            };
            run_stress(config, reporter, workers, messages, rotations, &dir)?;
        }
        Command::CheckConfig { path } => {
            let file = ConfigFile::load_from_file(&path)
                .with_context(|| format!("loading {}", path.display()))?;
            let config = file.validate().context("validating configuration")?;
            println!(
                "ok: min_severity={} drain_interval={:?} destination={:?}",
                config.min_severity(),
                config.drain_interval(),
                file.target()
            );
        }
    }

    Ok(())
}

fn log_file(dir: &Path, index: usize) -> PathBuf {
    dir.join(format!("log_file{}.txt", index))
}

fn run_stress(
    config: LoggerConfig,
    reporter: Arc<dyn ErrorReporter>,
    workers: usize,
    messages: usize,
    rotations: usize,
    dir: &Path,
) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    for index in 0..=rotations {
        let path = log_file(dir, index);
        if path.exists() {
            std::fs::remove_file(&path).with_context(|| format!("removing {}", path.display()))?;
        }
    }

    let logger = Arc::new(Logger::with_reporter(config, reporter));
    logger
        .set_destination(log_file(dir, 0))
        .context("opening first log file")?;
    logger.start()?;
    logger.debug("Start Logging");

    let started = Instant::now();
    let handles: Vec<_> = (0..workers)
        .map(|id| {
            let logger = Arc::clone(&logger);
            thread::Builder::new()
                .name(format!("stress-worker-{}", id))
                .spawn(move || {
                    thread::sleep(Duration::from_millis((id % 2) as u64 * 100));
                    for i in 0..messages {
                        log_info!(logger, "worker #{} is writing to the log: iteration {}", id, i);
                    }
                    log_info!(logger, "worker #{} is exiting", id);
                })
        })
        .collect::<std::io::Result<_>>()
        .context("spawning stress workers")?;

    for index in 1..=rotations {
        logger.stop();
        logger
            .set_destination(log_file(dir, index))
            .with_context(|| format!("opening log file {}", index))?;
        logger.start()?;
    }

    for handle in handles {
        if handle.join().is_err() {
            bail!("stress worker panicked");
        }
    }
    logger.stop();
    let elapsed = started.elapsed();

    let mut written = 0usize;
    for index in 0..=rotations {
        let path = log_file(dir, index);
        let contents =
            std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
        written += contents.lines().count();
    }

    let kept_by_filter = |severity: Severity| config.min_severity() <= severity;
    let expected = usize::from(kept_by_filter(Severity::Debug))
        + if kept_by_filter(Severity::Info) {
            workers * (messages + 1)
        } else {
            0
        };

    println!(
        "{}",
        serde_json::json!({
            "workers": workers,
            "messages_per_worker": messages,
            "rotations": rotations,
            "lines_written": written,
            "lines_expected": expected,
            "elapsed_ms": elapsed.as_millis() as u64,
            "stats": logger.stats(),
        })
    );

    if written != expected {
        bail!("expected {} lines, found {}", expected, written);
    }
    Ok(())
}
