//! Size-rotated JSON-lines file appender
//!
//! The file is opened on the first write, so building the appender never
//! touches the filesystem. When the next line would push the file past
//! `max_size`, the current file becomes `<name>.1`, older backups shift up
//! by one, and anything beyond `max_backups` or older than `max_age` is
//! removed. Backups may be gzip-compressed to `<name>.N.gz`.

use super::json::encode_line;
use crate::core::{Appender, LogEntry, LoggerError, Result};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

const DEFAULT_MAX_SIZE: u64 = 10 * 1024 * 1024;
const DEFAULT_MAX_BACKUPS: usize = 5;
const DEFAULT_MAX_AGE: Duration = Duration::from_secs(28 * 24 * 60 * 60);

/// When to rotate and what to keep
///
/// # Examples
///
/// ```
/// use logger_facade::appenders::RotationPolicy;
/// use std::time::Duration;
///
/// let policy = RotationPolicy::new()
///     .with_max_size(50 * 1024 * 1024)
///     .with_max_backups(7)
///     .with_max_age(Some(Duration::from_secs(7 * 24 * 3600)))
///     .with_compression(true);
/// assert_eq!(policy.max_backups, 7);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationPolicy {
    /// Size cap in bytes; zero disables rotation
    pub max_size: u64,
    /// Rotated files to keep; zero keeps none
    pub max_backups: usize,
    /// Backups older than this are removed; `None` keeps them regardless of age
    pub max_age: Option<Duration>,
    /// Gzip rotated files
    pub compress: bool,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            max_backups: DEFAULT_MAX_BACKUPS,
            max_age: Some(DEFAULT_MAX_AGE),
            compress: false,
        }
    }
}

impl RotationPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_size(mut self, size: u64) -> Self {
        self.max_size = size;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_backups(mut self, count: usize) -> Self {
        self.max_backups = count;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_age(mut self, age: Option<Duration>) -> Self {
        self.max_age = age;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }
}

/// Rotating file appender
///
/// ```no_run
/// use logger_facade::appenders::{RotatingFileAppender, RotationPolicy};
///
/// let appender = RotatingFileAppender::with_policy(
///     "/var/log/app.log",
///     RotationPolicy::new().with_compression(true),
/// );
/// ```
pub struct RotatingFileAppender {
    base_path: PathBuf,
    policy: RotationPolicy,
    file: Option<File>,
    current_size: u64,
}

impl RotatingFileAppender {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self::with_policy(path, RotationPolicy::default())
    }

    pub fn with_policy<P: AsRef<Path>>(path: P, policy: RotationPolicy) -> Self {
        Self {
            base_path: path.as_ref().to_path_buf(),
            policy,
            file: None,
            current_size: 0,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.base_path
    }

    #[must_use]
    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }

    /// Bytes in the current file, zero until it is opened
    #[must_use]
    pub fn current_size(&self) -> u64 {
        self.current_size
    }

    fn open(&mut self) -> Result<()> {
        if let Some(parent) = self.base_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    LoggerError::io_operation(
                        "create log directory",
                        format!("Failed to create directory '{}'", parent.display()),
                        e,
                    )
                })?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.base_path)
            .map_err(|e| {
                LoggerError::file_appender(
                    self.base_path.display().to_string(),
                    format!("Failed to open: {}", e),
                )
            })?;

        self.current_size = file.metadata().map(|m| m.len()).unwrap_or(0);
        self.file = Some(file);
        Ok(())
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = self.base_path.as_os_str().to_owned();
        name.push(format!(".{}", index));
        PathBuf::from(name)
    }

    fn gz_path(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_owned();
        name.push(".gz");
        PathBuf::from(name)
    }

    fn rotate(&mut self) -> Result<()> {
        if let Some(mut file) = self.file.take() {
            file.flush()?;
        }
        self.current_size = 0;

        if self.policy.max_backups == 0 {
            if self.base_path.exists() {
                fs::remove_file(&self.base_path).map_err(|e| {
                    LoggerError::file_rotation(
                        self.base_path.display().to_string(),
                        format!("Failed to remove current log file: {}", e),
                    )
                })?;
            }
            return Ok(());
        }

        // drop whatever would be shifted past the last slot
        let oldest = self.backup_path(self.policy.max_backups);
        remove_if_exists(&oldest);
        remove_if_exists(&Self::gz_path(&oldest));

        for i in (1..self.policy.max_backups).rev() {
            let from = self.backup_path(i);
            let to = self.backup_path(i + 1);
            rename_if_exists(&Self::gz_path(&from), &Self::gz_path(&to))?;
            rename_if_exists(&from, &to)?;
        }

        let first = self.backup_path(1);
        if self.base_path.exists() {
            fs::rename(&self.base_path, &first).map_err(|e| {
                LoggerError::file_rotation(
                    self.base_path.display().to_string(),
                    format!("Failed to rotate current log file: {}", e),
                )
            })?;
            if self.policy.compress {
                compress_file(&first, &Self::gz_path(&first))?;
            }
        }

        self.prune_expired();
        Ok(())
    }

    fn prune_expired(&self) {
        let Some(max_age) = self.policy.max_age else {
            return;
        };
        let now = SystemTime::now();
        for i in 1..=self.policy.max_backups {
            let plain = self.backup_path(i);
            for path in [Self::gz_path(&plain), plain] {
                let expired = fs::metadata(&path)
                    .and_then(|m| m.modified())
                    .map(|modified| now.duration_since(modified).unwrap_or(Duration::ZERO) >= max_age)
                    .unwrap_or(false);
                if expired {
                    remove_if_exists(&path);
                }
            }
        }
    }
}

impl Appender for RotatingFileAppender {
    fn name(&self) -> &str {
        "rotating-file"
    }

    fn append(&mut self, entry: &LogEntry) -> Result<()> {
        let mut line = encode_line(entry)?;
        line.push('\n');
        let len = line.len() as u64;

        if self.file.is_none() {
            self.open()?;
        }

        if self.policy.max_size > 0
            && self.current_size > 0
            && self.current_size + len > self.policy.max_size
        {
            if let Err(e) = self.rotate() {
                eprintln!(
                    "[LOGGER WARNING] Log rotation failed: {}. Continuing with current file.",
                    e
                );
            }
            if self.file.is_none() {
                self.open()?;
            }
        }

        if let Some(file) = self.file.as_mut() {
            file.write_all(line.as_bytes())?;
            self.current_size += len;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(file) = self.file.as_mut() {
            file.flush()?;
        }
        Ok(())
    }
}

fn remove_if_exists(path: &Path) {
    if path.exists() {
        if let Err(e) = fs::remove_file(path) {
            eprintln!(
                "[LOGGER WARNING] Failed to remove old backup {}: {}",
                path.display(),
                e
            );
        }
    }
}

fn rename_if_exists(from: &Path, to: &Path) -> Result<()> {
    if !from.exists() {
        return Ok(());
    }
    fs::rename(from, to).map_err(|e| {
        LoggerError::file_rotation(
            from.display().to_string(),
            format!("Failed to rotate backup files: {}", e),
        )
    })
}

/// Gzip `path` into `gz_path`, removing the original only once the
/// compressed file is complete.
fn compress_file(path: &Path, gz_path: &Path) -> Result<()> {
    use std::io::{BufReader, BufWriter};

    let mut tmp_name = gz_path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    let result = (|| -> Result<()> {
        let mut reader = BufReader::with_capacity(64 * 1024, File::open(path)?);
        let output = BufWriter::with_capacity(64 * 1024, File::create(&tmp_path)?);
        let mut encoder = flate2::write::GzEncoder::new(output, flate2::Compression::default());
        std::io::copy(&mut reader, &mut encoder)?;
        encoder.finish()?.flush()?;
        fs::rename(&tmp_path, gz_path)?;
        Ok(())
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&tmp_path);
        return Err(LoggerError::file_rotation(
            path.display().to_string(),
            format!("Failed to compress rotated file: {}", e),
        ));
    }

    if let Err(e) = fs::remove_file(path) {
        eprintln!(
            "[LOGGER WARNING] Compression succeeded but failed to remove original file {}: {}",
            path.display(),
            e
        );
    }
    Ok(())
}
