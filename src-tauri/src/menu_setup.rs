use launcher_core::BinaryMode;
use tauri::{
    menu::{CheckMenuItem, Menu, MenuItem, PredefinedMenuItem, Submenu},
    AppHandle, Manager,
};

use crate::{append_desktop_log, menu_actions, shell_locale, AppMenuState, LauncherState};

fn persisted_binary_mode(app_handle: &AppHandle) -> BinaryMode {
    app_handle
        .try_state::<LauncherState>()
        .and_then(|state| {
            state
                .with_coordinator(|coordinator| coordinator.settings_snapshot().binary_mode)
                .ok()
        })
        .unwrap_or_default()
}

/// Installs the application menu. The global-binary check item mirrors the
/// saved mode, which may differ from the one running until the app relaunches.
pub fn setup_app_menu(app_handle: &AppHandle) -> Result<(), String> {
    let shell_texts = shell_locale::current_shell_texts();

    let set_port_item = MenuItem::with_id(
        app_handle,
        menu_actions::MENU_SET_PORT,
        shell_texts.set_port,
        true,
        None::<&str>,
    )
    .map_err(|error| format!("Failed to create set port menu item: {error}"))?;
    let global_binary_item = CheckMenuItem::with_id(
        app_handle,
        menu_actions::MENU_TOGGLE_GLOBAL_BINARY,
        shell_texts.use_global_binary,
        true,
        persisted_binary_mode(app_handle) == BinaryMode::Global,
        None::<&str>,
    )
    .map_err(|error| format!("Failed to create global binary menu item: {error}"))?;
    let open_in_browser_item = MenuItem::with_id(
        app_handle,
        menu_actions::MENU_OPEN_IN_BROWSER,
        shell_texts.open_in_browser,
        true,
        None::<&str>,
    )
    .map_err(|error| format!("Failed to create open in browser menu item: {error}"))?;
    let reload_item = MenuItem::with_id(
        app_handle,
        menu_actions::MENU_RELOAD_WINDOW,
        shell_texts.reload,
        true,
        Some("CmdOrCtrl+R"),
    )
    .map_err(|error| format!("Failed to create reload menu item: {error}"))?;
    let devtools_item = MenuItem::with_id(
        app_handle,
        menu_actions::MENU_TOGGLE_DEVTOOLS,
        shell_texts.toggle_devtools,
        true,
        Some("CmdOrCtrl+Alt+I"),
    )
    .map_err(|error| format!("Failed to create devtools menu item: {error}"))?;
    let actual_size_item = MenuItem::with_id(
        app_handle,
        menu_actions::MENU_ZOOM_RESET,
        shell_texts.actual_size,
        true,
        Some("CmdOrCtrl+0"),
    )
    .map_err(|error| format!("Failed to create actual size menu item: {error}"))?;
    let zoom_in_item = MenuItem::with_id(
        app_handle,
        menu_actions::MENU_ZOOM_IN,
        shell_texts.zoom_in,
        true,
        Some("CmdOrCtrl+="),
    )
    .map_err(|error| format!("Failed to create zoom in menu item: {error}"))?;
    let zoom_out_item = MenuItem::with_id(
        app_handle,
        menu_actions::MENU_ZOOM_OUT,
        shell_texts.zoom_out,
        true,
        Some("CmdOrCtrl+-"),
    )
    .map_err(|error| format!("Failed to create zoom out menu item: {error}"))?;

    let settings_menu = Submenu::with_items(
        app_handle,
        shell_texts.settings_menu,
        true,
        &[&set_port_item, &global_binary_item, &open_in_browser_item],
    )
    .map_err(|error| format!("Failed to build settings menu: {error}"))?;

    let edit_menu = Submenu::with_items(
        app_handle,
        shell_texts.edit_menu,
        true,
        &[
            &PredefinedMenuItem::undo(app_handle, None)
                .map_err(|error| format!("Failed to create undo menu item: {error}"))?,
            &PredefinedMenuItem::redo(app_handle, None)
                .map_err(|error| format!("Failed to create redo menu item: {error}"))?,
            &PredefinedMenuItem::separator(app_handle)
                .map_err(|error| format!("Failed to create separator menu item: {error}"))?,
            &PredefinedMenuItem::cut(app_handle, None)
                .map_err(|error| format!("Failed to create cut menu item: {error}"))?,
            &PredefinedMenuItem::copy(app_handle, None)
                .map_err(|error| format!("Failed to create copy menu item: {error}"))?,
            &PredefinedMenuItem::paste(app_handle, None)
                .map_err(|error| format!("Failed to create paste menu item: {error}"))?,
            &PredefinedMenuItem::select_all(app_handle, None)
                .map_err(|error| format!("Failed to create select all menu item: {error}"))?,
        ],
    )
    .map_err(|error| format!("Failed to build edit menu: {error}"))?;

    let view_menu = Submenu::with_items(
        app_handle,
        shell_texts.view_menu,
        true,
        &[
            &reload_item,
            &devtools_item,
            &PredefinedMenuItem::separator(app_handle)
                .map_err(|error| format!("Failed to create separator menu item: {error}"))?,
            &actual_size_item,
            &zoom_in_item,
            &zoom_out_item,
            &PredefinedMenuItem::separator(app_handle)
                .map_err(|error| format!("Failed to create separator menu item: {error}"))?,
            &PredefinedMenuItem::fullscreen(app_handle, None)
                .map_err(|error| format!("Failed to create fullscreen menu item: {error}"))?,
        ],
    )
    .map_err(|error| format!("Failed to build view menu: {error}"))?;

    let menu = Menu::with_items(app_handle, &[&settings_menu, &edit_menu, &view_menu])
        .map_err(|error| format!("Failed to build app menu: {error}"))?;

    #[cfg(target_os = "macos")]
    {
        let app_menu = Submenu::with_items(
            app_handle,
            app_handle.package_info().name.clone(),
            true,
            &[
                &PredefinedMenuItem::about(app_handle, None, None)
                    .map_err(|error| format!("Failed to create about menu item: {error}"))?,
                &PredefinedMenuItem::separator(app_handle)
                    .map_err(|error| format!("Failed to create separator menu item: {error}"))?,
                &PredefinedMenuItem::quit(app_handle, None)
                    .map_err(|error| format!("Failed to create quit menu item: {error}"))?,
            ],
        )
        .map_err(|error| format!("Failed to build application menu: {error}"))?;
        menu.insert(&app_menu, 0)
            .map_err(|error| format!("Failed to insert application menu: {error}"))?;
    }

    app_handle
        .set_menu(menu)
        .map_err(|error| format!("Failed to install app menu: {error}"))?;

    if !app_handle.manage(AppMenuState {
        global_binary_item: global_binary_item.clone(),
    }) {
        append_desktop_log("app menu state already exists, skipping manage");
    }
    Ok(())
}
