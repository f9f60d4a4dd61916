//! wmi-exchange-exporter - Exchange and process counters in the Prometheus
//! text format.
//!
//! Runs the selected collectors once (or once per interval) and writes the
//! result to stdout or to a textfile for a node exporter's textfile reader.

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

mod output;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

use wmi_exchange_core::{
    CounterSource, Exporter, ExporterBuilder, MockSource, ScrapeContext, SelectionConfig,
    SelectionError,
};

/// Exchange / process WMI exporter.
#[derive(Parser, Debug)]
#[command(
    name = "wmi-exchange-exporter",
    about = "Exports Exchange and process WMI counters in the Prometheus text format",
    version
)]
struct Args {
    /// Comma-separated list of collectors to use. Defaults to all of them.
    #[arg(long = "collectors.exchange.enable", value_name = "LIST")]
    enable: Option<String>,

    /// Comma-separated list of collectors NOT to use.
    #[arg(long = "collectors.exchange.disable", value_name = "LIST")]
    disable: Option<String>,

    /// List all available collectors and their description, then exit.
    #[arg(long = "collectors.exchange.list")]
    list: bool,

    /// Also export per-collector duration and success gauges.
    #[arg(long = "collectors.exchange.scrape-metrics")]
    scrape_metrics: bool,

    /// Abandon the remaining collectors after this many seconds.
    #[arg(long = "scrape.timeout", value_name = "SECS")]
    scrape_timeout: Option<f64>,

    /// Scrape repeatedly with this many seconds between scrapes.
    /// Without it a single scrape is made.
    #[arg(short, long, value_name = "SECS")]
    interval: Option<u64>,

    /// Write to this textfile (atomically replaced) instead of stdout.
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,

    /// Export built-in sample data instead of querying WMI. For demos only.
    #[arg(long)]
    fixture: bool,
}

impl Args {
    fn selection(&self) -> SelectionConfig {
        SelectionConfig::from_flags(self.enable.as_deref(), self.disable.as_deref(), self.list)
    }
}

/// Initializes the tracing subscriber with the appropriate log level.
/// Logs go to stderr so stdout carries only metrics.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut filter = EnvFilter::from_default_env();
    for target in ["wmi_exchange_exporter", "wmi_exchange_core"] {
        match format!("{}={}", target, level).parse() {
            Ok(directive) => filter = filter.add_directive(directive),
            Err(e) => eprintln!("invalid log directive for {}: {}", target, e),
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// The catalog listing, once every requested id is known.
fn list_collectors(selection: &SelectionConfig) -> Result<String, SelectionError> {
    selection.resolve()?;
    Ok(selection.listing().to_string())
}

fn scrape_and_write(
    exporter: &Exporter,
    ctx: &ScrapeContext,
    args: &Args,
) -> Result<(), output::OutputError> {
    let (text, summary) = output::render(exporter, ctx)?;

    match &args.output {
        Some(path) => output::write_textfile(path, &text)?,
        None => output::write_stdout(&text)?,
    }

    info!(
        samples = summary.samples(),
        failed = summary.failed().count(),
        cancelled = summary.cancelled,
        elapsed_ms = summary.total.as_millis() as u64,
        "scrape complete"
    );
    Ok(())
}

/// Sleeps for `interval`, waking early when `shutdown` is cancelled.
fn sleep_until_next(interval: Duration, shutdown: &ScrapeContext) {
    let step = Duration::from_millis(100);
    let mut remaining = interval;
    while remaining > Duration::ZERO && !shutdown.is_cancelled() {
        let sleep_time = remaining.min(step);
        std::thread::sleep(sleep_time);
        remaining = remaining.saturating_sub(sleep_time);
    }
}

#[cfg(windows)]
fn run_live(args: &Args) -> ExitCode {
    run(wmi_exchange_core::source::WmiSource::new(), args)
}

#[cfg(not(windows))]
fn run_live(_args: &Args) -> ExitCode {
    error!("WMI is only available on Windows, pass --fixture to export sample data");
    ExitCode::FAILURE
}

fn run<S>(source: S, args: &Args) -> ExitCode
where
    S: CounterSource + Clone + 'static,
{
    let mut builder = ExporterBuilder::new(source)
        .selection(args.selection())
        .with_scrape_metrics(args.scrape_metrics);
    if let Some(secs) = args.scrape_timeout {
        match Duration::try_from_secs_f64(secs) {
            Ok(timeout) => builder = builder.scrape_timeout(timeout),
            Err(e) => {
                error!(value = secs, error = %e, "invalid --scrape.timeout");
                return ExitCode::FAILURE;
            }
        }
    }

    let exporter = match builder.build() {
        Ok(exporter) => exporter,
        Err(e) => {
            error!(error = %e, "failed to build exporter");
            return ExitCode::FAILURE;
        }
    };

    info!("wmi-exchange-exporter {} starting", env!("CARGO_PKG_VERSION"));

    // Cancels the running scrape and stops the interval loop.
    let shutdown = ScrapeContext::background();
    let handle = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        handle.cancel();
    }) {
        warn!(error = %e, "failed to set Ctrl-C handler");
    }

    let Some(interval) = args.interval.map(Duration::from_secs) else {
        let ctx = exporter.scrape_context_from(&shutdown);
        return match scrape_and_write(&exporter, &ctx, args) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                error!(error = %e, "scrape failed");
                ExitCode::FAILURE
            }
        };
    };

    info!(interval_secs = interval.as_secs(), "starting scrape loop");
    while !shutdown.is_cancelled() {
        let ctx = exporter.scrape_context_from(&shutdown);
        if let Err(e) = scrape_and_write(&exporter, &ctx, args) {
            error!(error = %e, "scrape failed");
        }
        sleep_until_next(interval, &shutdown);
    }

    info!("Shutdown complete");
    ExitCode::SUCCESS
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    let selection = args.selection();
    if selection.list_only {
        return match list_collectors(&selection) {
            Ok(listing) => {
                print!("{}", listing);
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!(error = %e, "invalid collector selection");
                ExitCode::FAILURE
            }
        };
    }

    if args.fixture {
        warn!("--fixture set, exporting built-in sample data");
        return run(MockSource::typical_exchange_server(), &args);
    }
    run_live(&args)
}
