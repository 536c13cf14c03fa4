use launcher_core::{LaunchCoordinator, SystemCommandRunner};
use tauri::{webview::PageLoadEvent, Manager, RunEvent, WindowEvent};

use crate::{
    append_desktop_log, append_startup_log, desktop_log, exit_events, init_desktop_log,
    launch_flow, main_window, menu_handler, menu_setup, runtime_paths, ui_dispatch,
    LauncherState, ZoomState,
};

fn forget_destroyed_window(app_handle: &tauri::AppHandle, label: &str) {
    let Some(id) = main_window::window_id_from_label(label) else {
        return;
    };
    // Destroyed fires inside window teardown; update state afterwards.
    if let Err(error) = ui_dispatch::run_on_main_thread_dispatch(
        app_handle,
        "forget destroyed window",
        move |main_app| {
            let state = main_app.state::<LauncherState>();
            if let Err(error) =
                state.with_coordinator(|coordinator| coordinator.on_window_closed(id))
            {
                append_desktop_log(&error);
            }
        },
    ) {
        append_desktop_log(&error);
    }
}

pub(crate) fn run() {
    tauri::Builder::default()
        .plugin(tauri_plugin_single_instance::init(|app, _argv, _cwd| {
            append_desktop_log("second instance launched, reopening window");
            if let Err(error) = ui_dispatch::run_on_main_thread_dispatch(
                app,
                "reopen window for second instance",
                launch_flow::reopen_window,
            ) {
                append_desktop_log(&error);
            }
        }))
        .plugin(tauri_plugin_dialog::init())
        .invoke_handler(tauri::generate_handler![
            crate::launcher_commands::launcher_get_settings,
            crate::launcher_commands::launcher_set_port,
            crate::launcher_commands::launcher_open_in_browser,
        ])
        .on_menu_event(|app, event| menu_handler::handle_menu_event(app, event.id().as_ref()))
        .on_window_event(|window, event| {
            if let WindowEvent::Destroyed = event {
                forget_destroyed_window(window.app_handle(), window.label());
            }
        })
        .on_page_load(|webview, payload| {
            if let PageLoadEvent::Finished = payload.event() {
                main_window::lock_window_title(webview, payload.url());
            }
        })
        .setup(|app| {
            let app_handle = app.handle().clone();
            let config = runtime_paths::resolve_launcher_config(&app_handle);
            init_desktop_log(&config.data_dir);

            append_startup_log("desktop process starting");
            if let Some(path) = desktop_log().path() {
                append_startup_log(&format!("desktop log path: {}", path.display()));
            }

            let runner = SystemCommandRunner::new(config.command_timeout);
            let presenter = main_window::TauriPresenter::new(app_handle.clone());
            let coordinator = LaunchCoordinator::new(config, runner, presenter, desktop_log());
            app.manage(LauncherState::new(coordinator));
            app.manage(ZoomState::default());

            if let Err(error) = menu_setup::setup_app_menu(&app_handle) {
                append_startup_log(&format!("failed to initialize app menu: {error}"));
            }

            launch_flow::start_on_ready(&app_handle);
            Ok(())
        })
        .build(tauri::generate_context!())
        .expect("error while building tauri application")
        .run(|app_handle, event| match event {
            RunEvent::ExitRequested { code, api, .. } => {
                exit_events::handle_exit_requested(app_handle, code, &api);
            }
            RunEvent::Exit => {
                exit_events::handle_exit_event(app_handle);
            }
            #[cfg(target_os = "macos")]
            RunEvent::Reopen { .. } => {
                launch_flow::reopen_window(app_handle);
            }
            _ => {}
        });
}
