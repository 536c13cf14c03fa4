use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LauncherError>;

/// Failures the launcher core can report.
///
/// Settings read failures never leave the settings module: they are logged
/// and replaced by the default value. Everything else is handed back to the
/// caller, which decides whether the failure ends the current action.
#[derive(Debug, Error)]
pub enum LauncherError {
    #[error("failed to read setting `{name}` from {}: {source}", path.display())]
    SettingsRead {
        name: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write setting `{name}` to {}: {source}", path.display())]
    SettingsWrite {
        name: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid port {value:?}: expected a number between 1 and 65535")]
    InvalidPort { value: String },

    #[error("invalid binary mode {value:?}: expected `local` or `global`")]
    InvalidBinaryMode { value: String },

    #[error("failed to spawn `{command}`: {source}")]
    CommandSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {}: {stderr}", exit_code_label(*code))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("`{command}` did not finish within {timeout_ms}ms")]
    CommandTimedOut { command: String, timeout_ms: u128 },

    #[error("window error: {0}")]
    Presentation(String),

    #[error("launcher is {state}; {action} refused")]
    NotRunning {
        state: &'static str,
        action: &'static str,
    },
}

impl LauncherError {
    /// Whether offering the user a retry makes sense.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::NotRunning { .. })
    }
}

fn exit_code_label(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}
