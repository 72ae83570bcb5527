//! Rolling Logger
//!
//! File logger installed as the global `tracing` subscriber.
//! Lines go to `<dir>/<app>.log`. When the file would grow past the size
//! limit it becomes `<app>.log.1`, older files shift up by one and the oldest
//! is dropped. The most recent lines are also kept in a ring buffer so the
//! shell can replay them after a failure.

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use tracing::Level;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::MakeWriter;

/// Tunables for the rolling sink
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Size at which the active file is rotated
    pub max_file_bytes: u64,
    /// Number of rotated files kept next to the active one
    pub max_files: usize,
    /// Lines retained in memory
    pub buffer_lines: usize,
    /// Most verbose level written
    pub level: Level,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: 1024 * 1024,
            max_files: 5,
            buffer_lines: 500,
            level: Level::INFO,
        }
    }
}

// ========================
// File rotation
// ========================

struct RollingFile {
    dir: PathBuf,
    base: String,
    file: File,
    written: u64,
    max_file_bytes: u64,
    max_files: usize,
}

impl RollingFile {
    fn open(dir: &Path, app_name: &str, config: &LoggerConfig) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.log", app_name));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            dir: dir.to_path_buf(),
            base: app_name.to_string(),
            file,
            written,
            max_file_bytes: config.max_file_bytes,
            max_files: config.max_files,
        })
    }

    fn active_path(&self) -> PathBuf {
        self.dir.join(format!("{}.log", self.base))
    }

    fn rotated_path(&self, n: usize) -> PathBuf {
        self.dir.join(format!("{}.log.{}", self.base, n))
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        if self.written > 0 && self.written + bytes.len() as u64 > self.max_file_bytes {
            self.rotate()?;
        }
        self.file.write_all(bytes)?;
        self.written += bytes.len() as u64;
        Ok(())
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        let active = self.active_path();

        if self.max_files == 0 {
            self.file = File::create(&active)?;
            self.written = 0;
            return Ok(());
        }

        let oldest = self.rotated_path(self.max_files);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for n in (1..self.max_files).rev() {
            let from = self.rotated_path(n);
            if from.exists() {
                fs::rename(&from, self.rotated_path(n + 1))?;
            }
        }
        fs::rename(&active, self.rotated_path(1))?;

        self.file = OpenOptions::new().create(true).append(true).open(&active)?;
        self.written = 0;
        Ok(())
    }
}

// ========================
// Ring buffer
// ========================

struct RingBuffer {
    lines: VecDeque<String>,
    capacity: usize,
    partial: String,
}

impl RingBuffer {
    fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
            partial: String::new(),
        }
    }

    fn push_bytes(&mut self, bytes: &[u8]) {
        self.partial.push_str(&String::from_utf8_lossy(bytes));
        while let Some(pos) = self.partial.find('\n') {
            let line: String = self.partial.drain(..=pos).collect();
            self.push_line(line.trim_end_matches(['\n', '\r']).to_string());
        }
    }

    fn push_line(&mut self, line: String) {
        if self.capacity == 0 {
            return;
        }
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }
}

// ========================
// Sink
// ========================

struct LoggerState {
    file: RollingFile,
    recent: RingBuffer,
}

/// Shared writer handed to the fmt subscriber
#[derive(Clone)]
pub struct LogSink {
    state: Arc<Mutex<LoggerState>>,
}

impl LogSink {
    pub fn open(dir: &Path, app_name: &str, config: &LoggerConfig) -> io::Result<Self> {
        let file = RollingFile::open(dir, app_name, config)?;
        Ok(Self {
            state: Arc::new(Mutex::new(LoggerState {
                file,
                recent: RingBuffer::new(config.buffer_lines),
            })),
        })
    }

    /// Most recent complete lines, oldest first
    pub fn recent_lines(&self) -> Vec<String> {
        match self.state.lock() {
            Ok(state) => state.recent.lines.iter().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }
}

impl Write for LogSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log sink poisoned"))?;
        state.file.write_all(buf)?;
        state.recent.push_bytes(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log sink poisoned"))?;
        state.file.file.flush()
    }
}

impl<'a> MakeWriter<'a> for LogSink {
    type Writer = LogSink;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

// ========================
// Global logger
// ========================

static SINK: OnceLock<LogSink> = OnceLock::new();

/// Install the rolling logger with default limits
pub fn init_logger(log_dir: PathBuf, app_name: &str) -> Result<(), String> {
    init_logger_with(log_dir, app_name, LoggerConfig::default())
}

/// Install the rolling logger as the global subscriber.
///
/// `log` records are bridged into the same subscriber.
pub fn init_logger_with(log_dir: PathBuf, app_name: &str, config: LoggerConfig) -> Result<(), String> {
    if SINK.get().is_some() {
        return Err("Logger already initialized".to_string());
    }

    let sink = LogSink::open(&log_dir, app_name, &config)
        .map_err(|e| format!("Failed to open log file in {}: {}", log_dir.display(), e))?;

    tracing_subscriber::fmt()
        .with_writer(sink.clone())
        .with_ansi(false)
        .with_timer(LocalTimer)
        .with_max_level(config.level)
        .try_init()
        .map_err(|e| format!("Failed to install subscriber: {}", e))?;

    SINK.set(sink)
        .map_err(|_| "Logger already initialized".to_string())
}

fn ensure_init() -> Result<(), String> {
    if SINK.get().is_none() {
        return Err("Logger not initialized".to_string());
    }
    Ok(())
}

pub fn info(message: &str) -> Result<(), String> {
    ensure_init()?;
    tracing::info!("{}", message);
    Ok(())
}

pub fn warn(message: &str) -> Result<(), String> {
    ensure_init()?;
    tracing::warn!("{}", message);
    Ok(())
}

pub fn error(message: &str) -> Result<(), String> {
    ensure_init()?;
    tracing::error!("{}", message);
    Ok(())
}

/// Recent lines from the global sink (empty before init)
pub fn recent_lines() -> Vec<String> {
    SINK.get().map(|sink| sink.recent_lines()).unwrap_or_default()
}
