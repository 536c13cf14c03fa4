//! One-file-per-setting persistence.
//!
//! Each setting lives in `<data dir>/<name>` as raw UTF-8 text. A missing,
//! unreadable or blank file means "use the default". Writes are synchronous
//! and only update the in-memory cache after the file was written, so a
//! failed save never looks like it took effect.

use std::{cell::OnceCell, fs, path::PathBuf};

use serde::Serialize;

use crate::{
    command::{BinaryMode, Port, DEFAULT_PORT},
    logging::DesktopLog,
    LauncherError, Result,
};

pub const PORT_SETTING: &str = "port";
pub const BINARY_MODE_SETTING: &str = "whistle";

#[derive(Debug, Clone)]
pub struct SettingsStore {
    dir: PathBuf,
}

impl SettingsStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub fn setting(&self, name: &str, default_value: &str) -> PersistentSetting {
        PersistentSetting {
            name: name.to_string(),
            default_value: default_value.to_string(),
            path: self.path_for(name),
            cache: OnceCell::new(),
        }
    }
}

/// A named string value backed by its own file.
#[derive(Debug)]
pub struct PersistentSetting {
    name: String,
    default_value: String,
    path: PathBuf,
    cache: OnceCell<String>,
}

impl PersistentSetting {
    /// Cached value; the file is read on first access only.
    pub fn get(&self, log: &DesktopLog) -> &str {
        self.cache.get_or_init(|| match self.read() {
            Ok(Some(value)) => value,
            Ok(None) => {
                log.startup(&format!(
                    "setting `{}` not stored yet, using default {:?}",
                    self.name, self.default_value
                ));
                self.default_value.clone()
            }
            Err(error) => {
                log.startup(&format!(
                    "{error}; using default {:?}",
                    self.default_value
                ));
                self.default_value.clone()
            }
        })
    }

    /// Persists `value`, then updates the cache. On failure the cache keeps
    /// whatever value was in effect before.
    pub fn set(&mut self, value: &str, log: &DesktopLog) -> Result<()> {
        let value = value.trim();
        log.runtime(&format!("saving setting `{}` = {:?}", self.name, value));

        if let Err(error) = self.write(value) {
            log.runtime(&format!("{error}"));
            return Err(error);
        }

        self.cache = OnceCell::from(value.to_string());
        Ok(())
    }

    fn read(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(trimmed.to_string()))
                }
            }
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(LauncherError::SettingsRead {
                name: self.name.clone(),
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn write(&self, value: &str) -> Result<()> {
        let to_error = |source| LauncherError::SettingsWrite {
            name: self.name.clone(),
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(to_error)?;
        }
        fs::write(&self.path, value).map_err(to_error)
    }
}

/// The two persisted launcher settings.
#[derive(Debug)]
pub struct RuntimeConfig {
    port: PersistentSetting,
    binary_mode: PersistentSetting,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsSnapshot {
    pub port: String,
    pub binary_mode: BinaryMode,
}

impl RuntimeConfig {
    pub fn load(store: &SettingsStore) -> Self {
        Self {
            port: store.setting(PORT_SETTING, &DEFAULT_PORT.to_string()),
            binary_mode: store.setting(BINARY_MODE_SETTING, BinaryMode::default().as_str()),
        }
    }

    /// Stored port text, validated. A stored value that is not a plain port
    /// number is an error rather than something passed along to `w2`.
    pub fn port(&self, log: &DesktopLog) -> Result<Port> {
        self.port.get(log).parse()
    }

    pub fn raw_port<'a>(&'a self, log: &DesktopLog) -> &'a str {
        self.port.get(log)
    }

    pub fn set_port(&mut self, port: Port, log: &DesktopLog) -> Result<()> {
        self.port.set(&port.to_string(), log)
    }

    pub fn binary_mode(&self, log: &DesktopLog) -> BinaryMode {
        let raw = self.binary_mode.get(log);
        raw.parse().unwrap_or_else(|error| {
            log.startup(&format!("{error}; falling back to {}", BinaryMode::default()));
            BinaryMode::default()
        })
    }

    pub fn set_binary_mode(&mut self, mode: BinaryMode, log: &DesktopLog) -> Result<()> {
        self.binary_mode.set(mode.as_str(), log)
    }

    pub fn snapshot(&self, log: &DesktopLog) -> SettingsSnapshot {
        SettingsSnapshot {
            port: self.raw_port(log).to_string(),
            binary_mode: self.binary_mode(log),
        }
    }
}
