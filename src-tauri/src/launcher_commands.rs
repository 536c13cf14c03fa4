use std::process::{Command, Stdio};

use launcher_core::SettingsSnapshot;
use tauri::{AppHandle, Manager};
use url::Url;

use crate::{append_desktop_log, launch_flow, LauncherBridgeResult, LauncherState};

fn parse_openable_url(raw_url: &str) -> Result<Url, String> {
    let trimmed = raw_url.trim();
    if trimmed.is_empty() {
        return Err("Missing external URL.".to_string());
    }

    let parsed = Url::parse(trimmed).map_err(|error| format!("Invalid URL: {error}"))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(format!(
            "Unsupported URL scheme '{scheme}', only http/https are allowed."
        )),
    }
}

#[cfg(target_os = "macos")]
fn open_url_with_system_browser(url: &str) -> Result<(), String> {
    Command::new("open")
        .arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|_| ())
        .map_err(|error| format!("Failed to run 'open': {error}"))
}

#[cfg(target_os = "windows")]
fn open_url_with_system_browser(url: &str) -> Result<(), String> {
    Command::new("rundll32")
        .args(["url.dll,FileProtocolHandler", url])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|_| ())
        .map_err(|error| format!("Failed to run 'rundll32': {error}"))
}

#[cfg(all(unix, not(target_os = "macos")))]
fn open_url_with_system_browser(url: &str) -> Result<(), String> {
    Command::new("xdg-open")
        .arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|_| ())
        .map_err(|error| format!("Failed to run 'xdg-open': {error}"))
}

#[cfg(not(any(target_os = "macos", target_os = "windows", unix)))]
fn open_url_with_system_browser(_url: &str) -> Result<(), String> {
    Err("Opening external URLs is not supported on this platform.".to_string())
}

/// Opens the address the launcher window points at in the default browser.
pub(crate) fn open_current_address_in_browser(app_handle: &AppHandle) -> Result<(), String> {
    let state = app_handle.state::<LauncherState>();
    let url = state
        .with_coordinator(|coordinator| coordinator.open_in_browser_url())?
        .map_err(|error| error.to_string())?;
    let url = parse_openable_url(url.as_str())?;
    append_desktop_log(&format!("opening {url} in system browser"));
    open_url_with_system_browser(url.as_str())
}

#[tauri::command]
pub(crate) fn launcher_get_settings(app_handle: AppHandle) -> Result<SettingsSnapshot, String> {
    let state = app_handle.state::<LauncherState>();
    state.with_coordinator(|coordinator| coordinator.settings_snapshot())
}

/// Saves the port from the prompt and restarts w2 on it. Nothing is saved
/// or restarted when the value is not a port.
#[tauri::command]
pub(crate) fn launcher_set_port(app_handle: AppHandle, port: String) -> LauncherBridgeResult {
    let state = app_handle.state::<LauncherState>();
    let prepared = state.with_coordinator(|coordinator| {
        coordinator
            .set_port(&port)
            .map(|ticket| (ticket, coordinator.runner().clone()))
    });

    match prepared {
        Ok(Ok((ticket, runner))) => {
            launch_flow::run_cycle(&app_handle, ticket, runner);
            LauncherBridgeResult::ok()
        }
        Ok(Err(error)) => {
            append_desktop_log(&format!("port change rejected: {error}"));
            LauncherBridgeResult::failed(error.to_string())
        }
        Err(error) => LauncherBridgeResult::failed(error),
    }
}

#[tauri::command]
pub(crate) fn launcher_open_in_browser(app_handle: AppHandle) -> LauncherBridgeResult {
    open_current_address_in_browser(&app_handle).into()
}
