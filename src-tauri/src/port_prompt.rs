use tauri::{AppHandle, Manager, WebviewUrl, WebviewWindowBuilder};

use crate::{
    shell_locale, PORT_PROMPT_HEIGHT, PORT_PROMPT_PAGE, PORT_PROMPT_WIDTH,
    PORT_PROMPT_WINDOW_LABEL,
};

/// Shows the port prompt, reusing it if already open. The page calls
/// `launcher_set_port` itself.
pub(crate) fn open_port_prompt<F>(app_handle: &AppHandle, log: F)
where
    F: Fn(&str),
{
    if let Some(window) = app_handle.get_webview_window(PORT_PROMPT_WINDOW_LABEL) {
        if let Err(error) = window.set_focus() {
            log(&format!("failed to focus port prompt: {error}"));
        }
        return;
    }

    let texts = shell_locale::current_shell_texts();
    if let Err(error) = WebviewWindowBuilder::new(
        app_handle,
        PORT_PROMPT_WINDOW_LABEL,
        WebviewUrl::App(PORT_PROMPT_PAGE.into()),
    )
    .title(texts.set_port)
    .inner_size(PORT_PROMPT_WIDTH, PORT_PROMPT_HEIGHT)
    .resizable(false)
    .build()
    {
        log(&format!("failed to open port prompt: {error}"));
    }
}
