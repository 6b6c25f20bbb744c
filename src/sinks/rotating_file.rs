//! Rotating file sink with size-based rotation
//!
//! Files are named `<program>_<YYYY-MM-DD_HH-MM-SS>.log` with the time the
//! file was created. Rotation never renames old files: it closes the current
//! one and starts a fresh file stamped with the current time. Old files are
//! kept indefinitely.

use crate::core::error::{LoggerError, Result};
use crate::core::sink::{format_line, Sink};
use crate::core::timestamp::TimestampFormat;
use crate::core::Record;
use chrono::Local;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Upper bound on `_<n>` disambiguators tried within one second
const MAX_NAME_ATTEMPTS: u32 = 10_000;

/// File sink that starts a new timestamped file once the current one is full
///
/// # Examples
///
/// ```no_run
/// use xyz_log::sinks::RotatingFileSink;
///
/// // /var/log/myapp/myapp_2025-01-08_10-30-45.log, rotating every 50 MiB
/// let sink = RotatingFileSink::new("/var/log/myapp", "myapp", 50 * 1024 * 1024).unwrap();
/// println!("writing to {}", sink.path().display());
/// ```
pub struct RotatingFileSink {
    dir: PathBuf,
    program: String,
    max_bytes: u64,
    path: PathBuf,
    active_path: Arc<Mutex<PathBuf>>,
    writer: Option<BufWriter<File>>,
    current_size: u64,
    rotation_count: u64,
    line_buf: String,
}

impl RotatingFileSink {
    /// Create `dir` if needed and open the first log file in it.
    ///
    /// # Errors
    ///
    /// Returns error if the directory or file cannot be created
    pub fn new(dir: impl Into<PathBuf>, program: impl Into<String>, max_bytes: u64) -> Result<Self> {
        let dir = dir.into();
        let program = program.into();

        fs::create_dir_all(&dir).map_err(|e| {
            LoggerError::io_operation(
                "create log directory",
                format!("Failed to create directory '{}'", dir.display()),
                e,
            )
        })?;

        let (path, file) = open_fresh(&dir, &program)?;

        Ok(Self {
            dir,
            program,
            max_bytes,
            active_path: Arc::new(Mutex::new(path.clone())),
            path,
            writer: Some(BufWriter::new(file)),
            current_size: 0,
            rotation_count: 0,
            line_buf: String::with_capacity(256),
        })
    }

    /// Path of the file currently written
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Handle that follows [`path`](Self::path) across rotations, readable
    /// from other threads while the sink is owned by the writer
    pub fn active_path(&self) -> Arc<Mutex<PathBuf>> {
        Arc::clone(&self.active_path)
    }

    /// Bytes written to the current file
    #[must_use]
    pub fn current_size(&self) -> u64 {
        self.current_size
    }

    #[must_use]
    pub fn rotation_count(&self) -> u64 {
        self.rotation_count
    }

    #[must_use]
    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    fn rotate(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(|e| {
                LoggerError::file_rotation(
                    self.path.display().to_string(),
                    format!("Failed to flush before rotation: {}", e),
                )
            })?;
        }

        let (path, file) = open_fresh(&self.dir, &self.program)?;
        self.path = path;
        *self.active_path.lock() = self.path.clone();
        self.writer = Some(BufWriter::new(file));
        self.current_size = 0;
        self.rotation_count += 1;
        Ok(())
    }

    /// Reopen the current file for appending after a failed rotation
    fn reopen_current(&mut self) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                LoggerError::file_sink(
                    self.path.display().to_string(),
                    format!("Failed to reopen after rotation failure: {}", e),
                )
            })?;
        self.writer = Some(BufWriter::new(file));
        Ok(())
    }
}

/// Open `<dir>/<program>_<now>.log`, adding `_<n>` when that name is taken
fn open_fresh(dir: &Path, program: &str) -> Result<(PathBuf, File)> {
    let stamp = TimestampFormat::FileName.format(&Local::now());

    for attempt in 0..MAX_NAME_ATTEMPTS {
        let name = if attempt == 0 {
            format!("{}_{}.log", program, stamp)
        } else {
            format!("{}_{}_{}.log", program, stamp, attempt)
        };
        let path = dir.join(name);

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => {
                return Err(LoggerError::file_sink(
                    path.display().to_string(),
                    format!("Failed to open: {}", e),
                ))
            }
        }
    }

    Err(LoggerError::file_sink(
        dir.display().to_string(),
        format!("No free log file name for stamp {}", stamp),
    ))
}

impl Sink for RotatingFileSink {
    fn write(&mut self, record: &Record) -> Result<()> {
        self.line_buf.clear();
        format_line(record, &record.level, &mut self.line_buf);
        self.line_buf.push('\n');
        let len = self.line_buf.len() as u64;

        // Start a new file rather than grow a non-empty one past the limit
        if self.current_size > 0 && self.current_size + len > self.max_bytes {
            if let Err(e) = self.rotate() {
                eprintln!(
                    "[LOGGER WARNING] Log rotation failed: {}. Continuing with current file.",
                    e
                );
                if self.writer.is_none() {
                    self.reopen_current()?;
                }
                // Avoid retrying the rotation on every record
                self.current_size = 0;
            }
        }

        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| LoggerError::file_sink(self.path.display().to_string(), "Writer not initialized"))?;
        writer.write_all(self.line_buf.as_bytes()).map_err(|e| {
            LoggerError::file_sink(
                self.path.display().to_string(),
                format!("Failed to write log record: {}", e),
            )
        })?;
        self.current_size += len;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush().map_err(|e| {
                LoggerError::file_sink(
                    self.path.display().to_string(),
                    format!("Failed to flush: {}", e),
                )
            })?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "rotating_file"
    }
}

impl Drop for RotatingFileSink {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LogLevel;
    use tempfile::tempdir;

    fn log_files(dir: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "log"))
            .collect();
        files.sort();
        files
    }

    #[test]
    fn test_creation_names_file_after_program_and_time() {
        let dir = tempdir().unwrap();
        let sink = RotatingFileSink::new(dir.path().join("demo"), "demo", 1024).unwrap();

        let name = sink.path().file_name().unwrap().to_str().unwrap().to_string();
        assert!(name.starts_with("demo_"));
        assert!(name.ends_with(".log"));
        // demo_YYYY-MM-DD_HH-MM-SS.log
        assert_eq!(name.len(), "demo_".len() + 19 + ".log".len());
        assert_eq!(sink.current_size(), 0);
        assert!(sink.path().exists());
    }

    #[test]
    fn test_existing_directory_is_accepted() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("demo")).unwrap();
        assert!(RotatingFileSink::new(dir.path().join("demo"), "demo", 1024).is_ok());
    }

    #[test]
    fn test_name_collision_gets_suffix() {
        let dir = tempdir().unwrap();
        let first = RotatingFileSink::new(dir.path(), "demo", 1024).unwrap();
        let second = RotatingFileSink::new(dir.path(), "demo", 1024).unwrap();
        assert_ne!(first.path(), second.path());
    }

    #[test]
    fn test_rotation_by_size() {
        let dir = tempdir().unwrap();
        let max = 200;
        let mut sink = RotatingFileSink::new(dir.path(), "rot", max).unwrap();

        for i in 0..50 {
            let record = Record::new(LogLevel::Info, format!("[t.rs:1] message number {}", i));
            sink.write(&record).unwrap();
        }
        sink.flush().unwrap();

        let files = log_files(dir.path());
        assert!(files.len() > 1, "expected rotation, got {:?}", files);
        assert_eq!(files.len() as u64, sink.rotation_count() + 1);

        let mut total_lines = 0;
        for file in &files {
            let content = fs::read_to_string(file).unwrap();
            assert!(content.len() as u64 <= max, "{} is {} bytes", file.display(), content.len());
            total_lines += content.lines().count();
        }
        assert_eq!(total_lines, 50);
    }

    #[test]
    fn test_active_path_follows_rotation() {
        let dir = tempdir().unwrap();
        let mut sink = RotatingFileSink::new(dir.path(), "follow", 64).unwrap();
        let active = sink.active_path();
        let first = sink.path().to_path_buf();
        assert_eq!(*active.lock(), first);

        for i in 0..4 {
            sink.write(&Record::new(LogLevel::Info, format!("line {}", i))).unwrap();
        }

        assert!(sink.rotation_count() > 0);
        assert_ne!(*active.lock(), first);
        assert_eq!(*active.lock(), sink.path());
    }

    #[test]
    fn test_oversized_record_still_written() {
        let dir = tempdir().unwrap();
        let mut sink = RotatingFileSink::new(dir.path(), "big", 10).unwrap();

        let record = Record::new(LogLevel::Error, "x".repeat(100));
        sink.write(&record).unwrap();
        sink.flush().unwrap();

        assert_eq!(sink.rotation_count(), 0);
        let content = fs::read_to_string(sink.path()).unwrap();
        assert!(content.contains(&"x".repeat(100)));
    }

    #[test]
    fn test_line_format_in_file() {
        let dir = tempdir().unwrap();
        let mut sink = RotatingFileSink::new(dir.path(), "fmt", 4096).unwrap();

        let record = Record::new(LogLevel::Warning, "[main.rs:42] Warn value: 3.14".to_string());
        sink.write(&record).unwrap();
        sink.flush().unwrap();

        let content = fs::read_to_string(sink.path()).unwrap();
        let line = content.lines().next().unwrap();
        // [YYYY-MM-DD HH:MM:SS.mmm] [WARNING] [tid] [main.rs:42] Warn value: 3.14
        assert_eq!(&line[0..1], "[");
        assert_eq!(&line[24..26], "] ");
        assert!(line.contains(&format!("[WARNING] [{}] [main.rs:42] Warn value: 3.14", record.thread_id)));
    }
}
