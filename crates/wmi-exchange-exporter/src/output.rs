//! Rendering a scrape and writing it out.

use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use wmi_exchange_core::metrics::encode_text;
use wmi_exchange_core::{CollectError, Exporter, FamilySink, ScrapeContext, ScrapeSummary};

/// Error from one scrape-and-write cycle.
#[derive(Debug)]
pub enum OutputError {
    Scrape(CollectError),
    Encode(prometheus::Error),
    Write(io::Error),
}

impl std::fmt::Display for OutputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputError::Scrape(e) => write!(f, "scrape aborted: {}", e),
            OutputError::Encode(e) => write!(f, "failed to encode metrics: {}", e),
            OutputError::Write(e) => write!(f, "failed to write metrics: {}", e),
        }
    }
}

impl std::error::Error for OutputError {}

impl From<CollectError> for OutputError {
    fn from(e: CollectError) -> Self {
        OutputError::Scrape(e)
    }
}

impl From<prometheus::Error> for OutputError {
    fn from(e: prometheus::Error) -> Self {
        OutputError::Encode(e)
    }
}

impl From<io::Error> for OutputError {
    fn from(e: io::Error) -> Self {
        OutputError::Write(e)
    }
}

/// Runs one scrape and renders it in the Prometheus text format.
pub fn render(
    exporter: &Exporter,
    ctx: &ScrapeContext,
) -> Result<(String, ScrapeSummary), OutputError> {
    let mut sink = FamilySink::new();
    let summary = exporter.collect_with(ctx, &mut sink)?;
    let text = encode_text(sink.families())?;
    Ok((text, summary))
}

/// Replaces `path` with `contents` atomically.
///
/// The data is written to a temporary file in the same directory and then
/// renamed over the target, so readers never observe a partial file.
pub fn write_textfile(path: &Path, contents: &str) -> io::Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;

    debug!(path = %path.display(), bytes = contents.len(), "textfile written");
    Ok(())
}

/// Writes `contents` to stdout.
pub fn write_stdout(contents: &str) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(contents.as_bytes())?;
    stdout.flush()
}
