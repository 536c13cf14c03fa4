use launcher_core::{BinaryMode, LauncherError, ModeChange};
use tauri::{AppHandle, Manager};
use tauri_plugin_dialog::{DialogExt, MessageDialogButtons, MessageDialogKind};

use crate::{
    append_desktop_log, append_shutdown_log, launcher_commands, main_window, menu_actions,
    port_prompt, shell_locale, ui_dispatch, AppMenuState, LauncherState,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModeToggleDecision {
    Relaunch,
    KeepCheck,
    RevertCheck,
}

fn requested_binary_mode(checked: bool) -> BinaryMode {
    if checked {
        BinaryMode::Global
    } else {
        BinaryMode::Local
    }
}

/// `save` only runs once the user confirmed the switch.
fn decide_mode_toggle<F>(confirmed: bool, save: F) -> ModeToggleDecision
where
    F: FnOnce() -> Result<ModeChange, LauncherError>,
{
    if !confirmed {
        return ModeToggleDecision::RevertCheck;
    }
    match save() {
        Ok(ModeChange::RelaunchRequired(_)) => ModeToggleDecision::Relaunch,
        Ok(ModeChange::Unchanged) => ModeToggleDecision::KeepCheck,
        Err(error) => {
            append_desktop_log(&format!("failed to save binary mode: {error}"));
            ModeToggleDecision::RevertCheck
        }
    }
}

fn set_global_binary_checked(app_handle: &AppHandle, checked: bool) {
    let Some(menu_state) = app_handle.try_state::<AppMenuState>() else {
        return;
    };
    if let Err(error) = menu_state.global_binary_item.set_checked(checked) {
        append_desktop_log(&format!("failed to update global binary menu item: {error}"));
    }
}

fn apply_mode_toggle(app_handle: &AppHandle, requested: BinaryMode, confirmed: bool) {
    let state = app_handle.state::<LauncherState>();
    let decision = state
        .with_coordinator(|coordinator| {
            decide_mode_toggle(confirmed, || coordinator.set_binary_mode(requested))
        })
        .unwrap_or_else(|error| {
            append_desktop_log(&error);
            ModeToggleDecision::RevertCheck
        });

    match decision {
        ModeToggleDecision::Relaunch => {
            append_shutdown_log(&format!("relaunching to use {requested} w2"));
            app_handle.request_restart();
        }
        ModeToggleDecision::KeepCheck => {}
        ModeToggleDecision::RevertCheck => {
            set_global_binary_checked(app_handle, requested.toggled() == BinaryMode::Global);
        }
    }
}

fn confirm_mode_toggle(app_handle: &AppHandle) {
    let checked = match app_handle.try_state::<AppMenuState>() {
        Some(menu_state) => match menu_state.global_binary_item.is_checked() {
            Ok(checked) => checked,
            Err(error) => {
                append_desktop_log(&format!("failed to read global binary menu item: {error}"));
                return;
            }
        },
        None => return,
    };
    let requested = requested_binary_mode(checked);
    let texts = shell_locale::current_shell_texts();
    let message = match requested {
        BinaryMode::Global => texts.mode_switch_to_global,
        BinaryMode::Local => texts.mode_switch_to_local,
    };

    let dialog_handle = app_handle.clone();
    app_handle
        .dialog()
        .message(message)
        .title(texts.mode_switch_title)
        .kind(MessageDialogKind::Info)
        .buttons(MessageDialogButtons::YesNo)
        .show(move |confirmed| {
            if let Err(error) = ui_dispatch::run_on_main_thread_dispatch(
                &dialog_handle,
                "apply binary mode toggle",
                move |main_app| apply_mode_toggle(main_app, requested, confirmed),
            ) {
                append_desktop_log(&error);
            }
        });
}

pub fn handle_menu_event(app_handle: &AppHandle, menu_id: &str) {
    match menu_actions::action_from_menu_id(menu_id) {
        Some(menu_actions::MenuAction::SetPort) => {
            port_prompt::open_port_prompt(app_handle, append_desktop_log)
        }
        Some(menu_actions::MenuAction::ToggleGlobalBinary) => confirm_mode_toggle(app_handle),
        Some(menu_actions::MenuAction::OpenInBrowser) => {
            if let Err(error) = launcher_commands::open_current_address_in_browser(app_handle) {
                append_desktop_log(&format!("failed to open in browser: {error}"));
            }
        }
        Some(menu_actions::MenuAction::ReloadWindow) => {
            main_window::reload_main_windows(app_handle, append_desktop_log)
        }
        Some(menu_actions::MenuAction::ToggleDevtools) => {
            main_window::toggle_devtools(app_handle, append_desktop_log)
        }
        Some(menu_actions::MenuAction::Zoom(step)) => {
            main_window::zoom_main_windows(app_handle, step, append_desktop_log)
        }
        None => {}
    }
}
