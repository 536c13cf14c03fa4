use std::{path::Path, sync::OnceLock};

use launcher_core::{logging, DesktopLog};

static DESKTOP_LOG: OnceLock<DesktopLog> = OnceLock::new();

/// Points the desktop log at `<data dir>/logs/desktop.log`. Only the first
/// call has an effect.
pub(crate) fn init_desktop_log(data_dir: &Path) {
    let path = logging::resolve_desktop_log_path(data_dir, logging::DESKTOP_LOG_FILE);
    let _ = DESKTOP_LOG.set(DesktopLog::new(path));
}

pub(crate) fn desktop_log() -> DesktopLog {
    DESKTOP_LOG
        .get()
        .cloned()
        .unwrap_or_else(DesktopLog::disabled)
}

pub(crate) fn append_desktop_log(message: &str) {
    desktop_log().runtime(message);
}

pub(crate) fn append_startup_log(message: &str) {
    desktop_log().startup(message);
}

pub(crate) fn append_restart_log(message: &str) {
    desktop_log().restart(message);
}

pub(crate) fn append_shutdown_log(message: &str) {
    desktop_log().shutdown(message);
}
