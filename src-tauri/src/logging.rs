use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing_subscriber::EnvFilter;

pub const DEBUG_LOG_FILE: &str = "csv-reader.log";
pub const CRASH_LOG_FILE: &str = "csv-reader-crash.log";
pub const LOG_ENV_VAR: &str = "CSV_READER_LOG";
const LOG_MAX_BYTES: u64 = 10 * 1024 * 1024;

fn now_timestamp() -> String {
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let secs = duration.as_secs();
    let ms = duration.subsec_millis();
    format!("{secs}.{ms:03}")
}

fn maybe_truncate_log(path: &Path) {
    let Ok(meta) = std::fs::metadata(path) else {
        return;
    };
    if meta.len() <= LOG_MAX_BYTES {
        return;
    }
    let _ = std::fs::write(path, b"");
}

fn append_log_line(path: &Path, line: &str) -> std::io::Result<()> {
    maybe_truncate_log(path);
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{line}")
}

/// `CSV_READER_LOG` wins over the configured level; an unparsable level
/// falls back to `info`.
fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR)
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Sends `tracing` output to `csv-reader.log` inside `log_dir`.
///
/// Returns the log file path. Installing twice is harmless: the second
/// subscriber is dropped.
pub fn init_logging(log_dir: &Path, level: &str) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(log_dir)?;
    let path = log_dir.join(DEBUG_LOG_FILE);
    maybe_truncate_log(&path);
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_ansi(false)
        .with_target(true)
        .with_writer(Mutex::new(file))
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
    Ok(path)
}

/// Records panics in the crash log next to the debug log.
pub fn install_panic_hook(log_dir: PathBuf) {
    std::panic::set_hook(Box::new(move |info| {
        let backtrace = std::backtrace::Backtrace::capture();
        let message = format!("[{}] PANIC: {info}\n{backtrace}", now_timestamp());
        tracing::error!(%info, "panic");
        let _ = append_log_line(&log_dir.join(CRASH_LOG_FILE), &message);
    }));
}
