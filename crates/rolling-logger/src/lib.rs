//! Rolling Logger
//!
//! Installs a `tracing` subscriber that writes formatted lines to stderr and to a
//! size-capped log file, keeping the most recent lines in memory so they can be
//! surfaced in diagnostics without reading the file back.
//!
//! `log` records emitted by library code are bridged into the same subscriber.

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use thiserror::Error;
use tracing_subscriber::fmt::writer::{MakeWriter, MakeWriterExt};
use tracing_subscriber::EnvFilter;

/// Rotate the log file once it grows past this many bytes
pub const DEFAULT_MAX_BYTES: u64 = 5 * 1024 * 1024;

/// Number of recent lines kept in memory
pub const DEFAULT_BUFFER_LINES: usize = 500;

static LOGGER: OnceLock<RollingWriter> = OnceLock::new();

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid log filter '{filter}': {message}")]
    Filter { filter: String, message: String },

    #[error("Logger already initialized: {0}")]
    AlreadyInitialized(String),

    #[error("Logger not initialized")]
    NotInitialized,
}

/// Tuning knobs for [`init_logger_with`]
#[derive(Debug, Clone)]
pub struct LoggerOptions {
    /// Filter directive, e.g. `info` or `shelf_categories=debug`
    pub level: String,
    pub max_bytes: u64,
    pub buffer_lines: usize,
    /// Mirror every line to stderr
    pub stderr: bool,
}

impl Default for LoggerOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            max_bytes: DEFAULT_MAX_BYTES,
            buffer_lines: DEFAULT_BUFFER_LINES,
            stderr: true,
        }
    }
}

/// Initialize logging into `<log_dir>/<app_name>.log` with default options
pub fn init_logger(log_dir: impl AsRef<Path>, app_name: &str) -> Result<(), LoggerError> {
    init_logger_with(Some(log_dir.as_ref()), app_name, LoggerOptions::default())
}

/// Initialize logging. Without a directory only the in-memory ring and stderr are written.
pub fn init_logger_with(
    log_dir: Option<&Path>,
    app_name: &str,
    options: LoggerOptions,
) -> Result<(), LoggerError> {
    let filter = EnvFilter::try_new(&options.level).map_err(|e| LoggerError::Filter {
        filter: options.level.clone(),
        message: e.to_string(),
    })?;

    let writer = RollingWriter::open(log_dir, app_name, options.max_bytes, options.buffer_lines)?;
    if LOGGER.set(writer.clone()).is_err() {
        return Err(LoggerError::AlreadyInitialized(app_name.to_string()));
    }

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(true);

    // `try_init` also installs the `log` bridge
    let result = if options.stderr {
        builder.with_writer(writer.and(io::stderr)).try_init()
    } else {
        builder.with_writer(writer).try_init()
    };
    result.map_err(|e| LoggerError::AlreadyInitialized(e.to_string()))
}

/// Most recent lines, oldest first. Empty when the logger was never initialized.
pub fn recent_lines() -> Vec<String> {
    LOGGER.get().map(RollingWriter::recent_lines).unwrap_or_default()
}

pub fn info(message: &str) -> Result<(), LoggerError> {
    LOGGER.get().ok_or(LoggerError::NotInitialized)?;
    tracing::info!("{}", message);
    Ok(())
}

pub fn error(message: &str) -> Result<(), LoggerError> {
    LOGGER.get().ok_or(LoggerError::NotInitialized)?;
    tracing::error!("{}", message);
    Ok(())
}

struct Inner {
    path: Option<PathBuf>,
    file: Option<File>,
    written: u64,
    max_bytes: u64,
    ring: VecDeque<String>,
    capacity: usize,
    partial: String,
}

impl Inner {
    fn append(&mut self, buf: &[u8]) -> io::Result<()> {
        if let Some(file) = self.file.as_mut() {
            file.write_all(buf)?;
            self.written += buf.len() as u64;
        }

        self.partial.push_str(&String::from_utf8_lossy(buf));
        while let Some(end) = self.partial.find('\n') {
            let line: String = self.partial.drain(..=end).collect();
            self.push_line(line.trim_end().to_string());
        }

        if self.written >= self.max_bytes {
            self.rotate()?;
        }
        Ok(())
    }

    fn push_line(&mut self, line: String) {
        if self.capacity == 0 {
            return;
        }
        if self.ring.len() == self.capacity {
            self.ring.pop_front();
        }
        self.ring.push_back(line);
    }

    /// Move the current file aside as `<name>.<timestamp>.log` and start a fresh one
    fn rotate(&mut self) -> io::Result<()> {
        let Some(path) = self.path.clone() else {
            return Ok(());
        };
        if let Some(mut file) = self.file.take() {
            file.flush()?;
        }

        let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S%.3f");
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "log".to_string());
        let rotated = path.with_file_name(format!("{}.{}.log", stem, stamp));
        fs::rename(&path, rotated)?;

        self.file = Some(open_append(&path)?);
        self.written = 0;
        Ok(())
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Shared writer handed to the subscriber; every clone appends to the same file and ring
#[derive(Clone)]
pub struct RollingWriter {
    inner: Arc<Mutex<Inner>>,
}

impl RollingWriter {
    pub fn open(
        log_dir: Option<&Path>,
        app_name: &str,
        max_bytes: u64,
        buffer_lines: usize,
    ) -> Result<Self, LoggerError> {
        let (path, file, written) = match log_dir {
            Some(dir) => {
                fs::create_dir_all(dir)?;
                let path = dir.join(format!("{}.log", app_name));
                let file = open_append(&path)?;
                let written = file.metadata()?.len();
                (Some(path), Some(file), written)
            }
            None => (None, None, 0),
        };

        Ok(Self {
            inner: Arc::new(Mutex::new(Inner {
                path,
                file,
                written,
                max_bytes,
                ring: VecDeque::with_capacity(buffer_lines),
                capacity: buffer_lines,
                partial: String::new(),
            })),
        })
    }

    pub fn recent_lines(&self) -> Vec<String> {
        match self.inner.lock() {
            Ok(inner) => inner.ring.iter().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().ring.iter().cloned().collect(),
        }
    }

    pub fn log_path(&self) -> Option<PathBuf> {
        self.inner.lock().ok().and_then(|inner| inner.path.clone())
    }
}

impl Write for RollingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log writer poisoned"))?;
        inner.append(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log writer poisoned"))?;
        match inner.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for RollingWriter {
    type Writer = RollingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_keeps_most_recent_lines() {
        let mut writer = RollingWriter::open(None, "test", DEFAULT_MAX_BYTES, 2).unwrap();
        writer.write_all(b"first\nsecond\n").unwrap();
        writer.write_all(b"thi").unwrap();
        writer.write_all(b"rd\n").unwrap();

        assert_eq!(writer.recent_lines(), vec!["second".to_string(), "third".to_string()]);
    }

    #[test]
    fn test_writes_to_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = RollingWriter::open(Some(dir.path()), "shelf", DEFAULT_MAX_BYTES, 10).unwrap();
        writer.write_all(b"category created\n").unwrap();
        writer.flush().unwrap();

        let content = fs::read_to_string(dir.path().join("shelf.log")).unwrap();
        assert_eq!(content, "category created\n");
        assert_eq!(writer.log_path(), Some(dir.path().join("shelf.log")));
    }

    #[test]
    fn test_rotates_when_size_exceeded() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = RollingWriter::open(Some(dir.path()), "shelf", 16, 10).unwrap();
        writer.write_all(b"0123456789abcdef\n").unwrap();
        writer.write_all(b"after\n").unwrap();
        writer.flush().unwrap();

        let files: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 2);
        let current = fs::read_to_string(dir.path().join("shelf.log")).unwrap();
        assert_eq!(current, "after\n");
    }

    #[test]
    fn test_helpers_require_init() {
        // Nothing in this test binary initializes the global logger
        assert!(matches!(info("hello"), Err(LoggerError::NotInitialized)));
        assert!(recent_lines().is_empty());
    }
}
