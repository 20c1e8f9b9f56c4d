use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "nursestudy.log";

/// Directory holding the log file: `<data_dir>/nursestudy`
pub fn log_dir() -> Option<PathBuf> {
  dirs::data_dir().map(|d| d.join("nursestudy"))
}

/// Install a file-backed tracing subscriber.
///
/// The terminal belongs to the UI, so nothing is written to stdout/stderr.
/// Keep the returned guard alive for the lifetime of the app; dropping it
/// flushes pending lines.
pub fn init(level: &str) -> Result<Option<WorkerGuard>> {
  init_in(log_dir(), level)
}

/// Like `init`, logging into `dir`.
///
/// An invalid level is an error. A missing or unwritable directory only
/// disables logging.
fn init_in(dir: Option<PathBuf>, level: &str) -> Result<Option<WorkerGuard>> {
  let filter =
    EnvFilter::try_new(level).map_err(|e| eyre!("Invalid log level {}: {}", level, e))?;

  let dir = match dir {
    Some(dir) => dir,
    None => return Ok(None),
  };
  if let Err(e) = std::fs::create_dir_all(&dir) {
    eprintln!("Logging disabled, cannot create {}: {}", dir.display(), e);
    return Ok(None);
  }

  let appender = tracing_appender::rolling::never(&dir, LOG_FILE);
  let (writer, guard) = tracing_appender::non_blocking(appender);

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(writer)
    .with_ansi(false)
    .try_init()
    .map_err(|e| eyre!("Failed to install logger: {}", e))?;

  Ok(Some(guard))
}
