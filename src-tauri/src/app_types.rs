use std::sync::Mutex;

use launcher_core::{LaunchCoordinator, SystemCommandRunner};
use tauri::menu::CheckMenuItem;

use crate::{main_window::TauriPresenter, DEFAULT_ZOOM};

pub(crate) type Coordinator = LaunchCoordinator<SystemCommandRunner, TauriPresenter>;

#[derive(Clone)]
pub(crate) struct AppMenuState {
    pub(crate) global_binary_item: CheckMenuItem<tauri::Wry>,
}

/// Page zoom shared by every launcher window, including replacements.
pub(crate) struct ZoomState {
    level: Mutex<f64>,
}

impl Default for ZoomState {
    fn default() -> Self {
        Self {
            level: Mutex::new(DEFAULT_ZOOM),
        }
    }
}

impl ZoomState {
    pub(crate) fn level(&self) -> f64 {
        self.level.lock().map(|level| *level).unwrap_or(DEFAULT_ZOOM)
    }

    pub(crate) fn update<F>(&self, step: F) -> Result<f64, String>
    where
        F: FnOnce(f64) -> f64,
    {
        let mut guard = self
            .level
            .lock()
            .map_err(|_| "Zoom state lock poisoned.".to_string())?;
        *guard = step(*guard);
        Ok(*guard)
    }
}

/// Managed Tauri state. Only ever locked from the main thread, and never
/// held across a blocking command.
pub(crate) struct LauncherState {
    coordinator: Mutex<Coordinator>,
}

impl LauncherState {
    pub(crate) fn new(coordinator: Coordinator) -> Self {
        Self {
            coordinator: Mutex::new(coordinator),
        }
    }

    pub(crate) fn with_coordinator<T, F>(&self, action: F) -> Result<T, String>
    where
        F: FnOnce(&mut Coordinator) -> T,
    {
        let mut guard = self
            .coordinator
            .lock()
            .map_err(|_| "Launcher state lock poisoned.".to_string())?;
        Ok(action(&mut guard))
    }
}

#[derive(Debug, serde::Serialize)]
pub(crate) struct LauncherBridgeResult {
    pub(crate) ok: bool,
    pub(crate) reason: Option<String>,
}

impl LauncherBridgeResult {
    pub(crate) fn ok() -> Self {
        Self {
            ok: true,
            reason: None,
        }
    }

    pub(crate) fn failed(reason: impl Into<String>) -> Self {
        Self {
            ok: false,
            reason: Some(reason.into()),
        }
    }
}

impl<E: std::fmt::Display> From<Result<(), E>> for LauncherBridgeResult {
    fn from(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Self::ok(),
            Err(error) => Self::failed(error.to_string()),
        }
    }
}
