use std::{env, path::PathBuf, time::Duration};

pub const DATA_DIR_ENV: &str = "WHISTLE_DESKTOP_DATA_DIR";
pub const BINARY_PATH_ENV: &str = "WHISTLE_BINARY_PATH";
pub const COMMAND_TIMEOUT_ENV: &str = "WHISTLE_COMMAND_TIMEOUT_MS";
pub const SKIP_PATH_FIX_ENV: &str = "WHISTLE_SKIP_PATH_FIX";

pub const DEFAULT_COMMAND_TIMEOUT_MS: u64 = 60_000;
pub const FALLBACK_DATA_DIR_NAME: &str = ".whistle-desktop";

#[cfg(target_os = "windows")]
pub const GLOBAL_BINARY_NAME: &str = "w2.cmd";
#[cfg(not(target_os = "windows"))]
pub const GLOBAL_BINARY_NAME: &str = "w2";

#[cfg(target_os = "windows")]
pub const BUNDLED_BINARY_RELATIVE_PATH: &str = "bin/w2.cmd";
#[cfg(not(target_os = "windows"))]
pub const BUNDLED_BINARY_RELATIVE_PATH: &str = "bin/w2";

/// Startup configuration, resolved once before the coordinator is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LauncherConfig {
    /// Per-installation directory holding one file per setting plus logs.
    pub data_dir: PathBuf,
    pub bundled_binary: PathBuf,
    pub global_binary: String,
    /// `None` waits for the launcher command indefinitely.
    pub command_timeout: Option<Duration>,
    pub normalize_path: bool,
}

impl LauncherConfig {
    pub fn new(data_dir: PathBuf, bundled_binary: PathBuf) -> Self {
        Self {
            data_dir,
            bundled_binary,
            global_binary: GLOBAL_BINARY_NAME.to_string(),
            command_timeout: Some(Duration::from_millis(DEFAULT_COMMAND_TIMEOUT_MS)),
            normalize_path: true,
        }
    }

    /// Applies the `WHISTLE_*` environment overrides on top of the paths the
    /// shell resolved.
    pub fn from_env(app_data_dir: Option<PathBuf>, bundled_binary: PathBuf) -> Self {
        let data_dir = env_path_override(DATA_DIR_ENV)
            .or(app_data_dir)
            .unwrap_or_else(fallback_data_dir);
        let bundled_binary = env_path_override(BINARY_PATH_ENV).unwrap_or(bundled_binary);

        Self {
            command_timeout: resolve_command_timeout(env::var(COMMAND_TIMEOUT_ENV).ok().as_deref()),
            normalize_path: !is_truthy(env::var(SKIP_PATH_FIX_ENV).ok().as_deref()),
            ..Self::new(data_dir, bundled_binary)
        }
    }
}

fn env_path_override(key: &str) -> Option<PathBuf> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

fn fallback_data_dir() -> PathBuf {
    home::home_dir()
        .map(|home| home.join(FALLBACK_DATA_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(FALLBACK_DATA_DIR_NAME))
}

pub(crate) fn resolve_command_timeout(raw: Option<&str>) -> Option<Duration> {
    let timeout_ms = raw
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_COMMAND_TIMEOUT_MS);
    if timeout_ms == 0 {
        return None;
    }
    Some(Duration::from_millis(timeout_ms))
}

fn is_truthy(raw: Option<&str>) -> bool {
    matches!(
        raw.map(|value| value.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes")
    )
}
