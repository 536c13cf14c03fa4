use std::path::PathBuf;

use launcher_core::{config::BUNDLED_BINARY_RELATIVE_PATH, LauncherConfig};
use tauri::{path::BaseDirectory, AppHandle, Manager};

pub(crate) fn resolve_launcher_config(app_handle: &AppHandle) -> LauncherConfig {
    let app_data_dir = app_handle.path().app_data_dir().ok();
    let bundled_binary = resolve_resource_path(app_handle, BUNDLED_BINARY_RELATIVE_PATH)
        .unwrap_or_else(|| PathBuf::from(BUNDLED_BINARY_RELATIVE_PATH));
    LauncherConfig::from_env(app_data_dir, bundled_binary)
}

fn resolve_resource_path(app_handle: &AppHandle, relative_path: &str) -> Option<PathBuf> {
    app_handle
        .path()
        .resolve(relative_path, BaseDirectory::Resource)
        .ok()
}
