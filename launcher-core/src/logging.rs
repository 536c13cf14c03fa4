use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    sync::{Mutex, OnceLock},
};

use chrono::Local;

pub const DESKTOP_LOG_FILE: &str = "desktop.log";
pub const DESKTOP_LOG_MAX_BYTES: u64 = 5 * 1024 * 1024;
pub const LOG_BACKUP_COUNT: usize = 5;

static DESKTOP_LOG_WRITE_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesktopLogCategory {
    Startup,
    Runtime,
    Restart,
    Shutdown,
}

impl DesktopLogCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::Runtime => "runtime",
            Self::Restart => "restart",
            Self::Shutdown => "shutdown",
        }
    }
}

/// Append-only desktop log with size-based rotation.
///
/// Logging is best-effort: a failing write is reported on stderr and
/// otherwise ignored.
#[derive(Debug, Clone)]
pub struct DesktopLog {
    path: Option<PathBuf>,
    max_bytes: u64,
    backup_count: usize,
}

impl DesktopLog {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path: Some(path),
            max_bytes: DESKTOP_LOG_MAX_BYTES,
            backup_count: LOG_BACKUP_COUNT,
        }
    }

    /// A log that only echoes to stderr in debug builds.
    pub fn disabled() -> Self {
        Self {
            path: None,
            max_bytes: DESKTOP_LOG_MAX_BYTES,
            backup_count: LOG_BACKUP_COUNT,
        }
    }

    pub fn with_rotation(mut self, max_bytes: u64, backup_count: usize) -> Self {
        self.max_bytes = max_bytes.max(1);
        self.backup_count = backup_count;
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn startup(&self, message: &str) {
        self.append(DesktopLogCategory::Startup, message);
    }

    pub fn runtime(&self, message: &str) {
        self.append(DesktopLogCategory::Runtime, message);
    }

    pub fn restart(&self, message: &str) {
        self.append(DesktopLogCategory::Restart, message);
    }

    pub fn shutdown(&self, message: &str) {
        self.append(DesktopLogCategory::Shutdown, message);
    }

    pub fn append(&self, category: DesktopLogCategory, message: &str) {
        let line = format_log_line(category, message);
        if cfg!(debug_assertions) {
            eprint!("{line}");
        }

        let Some(path) = self.path.as_deref() else {
            return;
        };

        let lock = DESKTOP_LOG_WRITE_LOCK.get_or_init(|| Mutex::new(()));
        let _guard = match lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Err(error) = self.write_line(path, &line) {
            eprintln!("failed to write desktop log {}: {error}", path.display());
        }
    }

    fn write_line(&self, path: &Path, line: &str) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        rotate_if_needed(path, self.max_bytes, self.backup_count)?;

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(line.as_bytes())
    }
}

/// Resolves `<root>/logs/<file>`.
pub fn resolve_desktop_log_path(root_dir: &Path, file_name: &str) -> PathBuf {
    root_dir.join("logs").join(file_name)
}

fn format_log_line(category: DesktopLogCategory, message: &str) -> String {
    format!(
        "[{}] [{}] {}\n",
        Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
        category.as_str(),
        message
    )
}

fn backup_path(path: &Path, index: usize) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(format!(".{index}"));
    PathBuf::from(name)
}

fn rotate_if_needed(path: &Path, max_bytes: u64, backup_count: usize) -> std::io::Result<()> {
    let size = match fs::metadata(path) {
        Ok(metadata) => metadata.len(),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(error) => return Err(error),
    };
    if size < max_bytes {
        return Ok(());
    }

    if backup_count == 0 {
        return fs::remove_file(path);
    }

    let oldest = backup_path(path, backup_count);
    if oldest.exists() {
        fs::remove_file(&oldest)?;
    }
    for index in (1..backup_count).rev() {
        let from = backup_path(path, index);
        if from.exists() {
            fs::rename(&from, backup_path(path, index + 1))?;
        }
    }
    fs::rename(path, backup_path(path, 1))
}
