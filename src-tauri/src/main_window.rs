use launcher_core::{
    presentation::{window_title, LOCAL_HOST},
    LauncherError, Presenter, WindowId, WindowSpec,
};
use tauri::{AppHandle, Manager, WebviewUrl, WebviewWindowBuilder};
use url::Url;

use crate::{
    append_desktop_log, menu_actions::ZoomStep, ZoomState, DEFAULT_ZOOM,
    MAIN_WINDOW_LABEL_PREFIX, MAX_ZOOM, MIN_ZOOM, ZOOM_STEP,
};

pub(crate) fn window_label(id: WindowId) -> String {
    format!("{MAIN_WINDOW_LABEL_PREFIX}{}", id.0)
}

pub(crate) fn window_id_from_label(label: &str) -> Option<WindowId> {
    label
        .strip_prefix(MAIN_WINDOW_LABEL_PREFIX)?
        .parse::<u64>()
        .ok()
        .map(WindowId)
}

/// Webview windows for the launcher. Each window gets a fresh label because
/// Tauri cannot reuse a label while the old window is being torn down.
pub(crate) struct TauriPresenter {
    app_handle: AppHandle,
    next_id: u64,
}

impl TauriPresenter {
    pub(crate) fn new(app_handle: AppHandle) -> Self {
        Self {
            app_handle,
            next_id: 0,
        }
    }
}

impl Presenter for TauriPresenter {
    fn open_window(&mut self, spec: &WindowSpec) -> launcher_core::Result<WindowId> {
        self.next_id += 1;
        let id = WindowId(self.next_id);

        let window = WebviewWindowBuilder::new(
            &self.app_handle,
            window_label(id),
            WebviewUrl::External(spec.url.clone()),
        )
        .title(&spec.title)
        .inner_size(spec.width, spec.height)
        .build()
        .map_err(|error| LauncherError::Presentation(format!("failed to create window: {error}")))?;

        let zoom = current_zoom(&self.app_handle);
        if zoom != DEFAULT_ZOOM {
            if let Err(error) = window.set_zoom(zoom) {
                append_desktop_log(&format!("failed to zoom {}: {error}", window.label()));
            }
        }
        if let Err(error) = window.set_focus() {
            append_desktop_log(&format!("failed to focus {}: {error}", window.label()));
        }
        Ok(id)
    }

    fn close_window(&mut self, id: WindowId) {
        let label = window_label(id);
        let Some(window) = self.app_handle.get_webview_window(&label) else {
            return;
        };
        if let Err(error) = window.destroy() {
            append_desktop_log(&format!("failed to close {label}: {error}"));
        }
    }

    fn is_window_open(&self, id: WindowId) -> bool {
        self.app_handle
            .get_webview_window(&window_label(id))
            .is_some()
    }
}

/// Pages may set `document.title`; the launcher window keeps showing the
/// local address it was opened for. Pages served from elsewhere are left
/// alone.
pub(crate) fn lock_window_title(webview: &tauri::Webview<tauri::Wry>, url: &Url) {
    if window_id_from_label(webview.window().label()).is_none() {
        return;
    }
    let Some(port) = url.port_or_known_default() else {
        return;
    };
    if url.host_str() != Some(LOCAL_HOST) {
        return;
    }
    if let Err(error) = webview.window().set_title(&window_title(LOCAL_HOST, port)) {
        append_desktop_log(&format!("failed to restore window title: {error}"));
    }
}

pub(crate) fn reload_main_windows<F>(app_handle: &AppHandle, log: F)
where
    F: Fn(&str),
{
    for (label, window) in app_handle.webview_windows() {
        if window_id_from_label(&label).is_none() {
            continue;
        }
        if let Err(error) = window.eval("window.location.reload();") {
            log(&format!("failed to reload {label}: {error}"));
        }
    }
}

/// Rounded to one decimal so repeated steps land back on exact levels.
pub(crate) fn next_zoom(current: f64, step: ZoomStep) -> f64 {
    let target = match step {
        ZoomStep::Reset => return DEFAULT_ZOOM,
        ZoomStep::In => current + ZOOM_STEP,
        ZoomStep::Out => current - ZOOM_STEP,
    };
    ((target * 10.0).round() / 10.0).clamp(MIN_ZOOM, MAX_ZOOM)
}

fn current_zoom(app_handle: &AppHandle) -> f64 {
    app_handle
        .try_state::<ZoomState>()
        .map(|zoom| zoom.level())
        .unwrap_or(DEFAULT_ZOOM)
}

pub(crate) fn zoom_main_windows<F>(app_handle: &AppHandle, step: ZoomStep, log: F)
where
    F: Fn(&str),
{
    let Some(zoom_state) = app_handle.try_state::<ZoomState>() else {
        return;
    };
    let level = match zoom_state.update(|current| next_zoom(current, step)) {
        Ok(level) => level,
        Err(error) => {
            log(&error);
            return;
        }
    };
    for (label, window) in app_handle.webview_windows() {
        if window_id_from_label(&label).is_none() {
            continue;
        }
        if let Err(error) = window.set_zoom(level) {
            log(&format!("failed to zoom {label}: {error}"));
        }
    }
}

/// Acts on the focused launcher window, or the first one when none has focus.
pub(crate) fn toggle_devtools<F>(app_handle: &AppHandle, log: F)
where
    F: Fn(&str),
{
    let windows: Vec<_> = app_handle
        .webview_windows()
        .into_iter()
        .filter(|(label, _)| window_id_from_label(label).is_some())
        .map(|(_, window)| window)
        .collect();
    let target = windows
        .iter()
        .find(|window| window.is_focused().unwrap_or(false))
        .or_else(|| windows.first());
    let Some(window) = target else {
        log("no launcher window to toggle developer tools on");
        return;
    };
    if window.is_devtools_open() {
        window.close_devtools();
    } else {
        window.open_devtools();
    }
}

pub(crate) fn focus_main_window<F>(app_handle: &AppHandle, log: F)
where
    F: Fn(&str),
{
    for (label, window) in app_handle.webview_windows() {
        if window_id_from_label(&label).is_none() {
            continue;
        }
        if let Err(error) = window.unminimize().and_then(|_| window.set_focus()) {
            log(&format!("failed to focus {label}: {error}"));
        }
    }
}
