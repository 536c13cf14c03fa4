#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app_constants;
mod app_helpers;
mod app_runtime;
mod app_types;
mod exit_events;
mod launch_flow;
mod launcher_commands;
mod main_window;
mod menu_actions;
mod menu_handler;
mod menu_setup;
mod port_prompt;
mod runtime_paths;
mod shell_locale;
mod ui_dispatch;

pub(crate) use app_constants::*;
pub(crate) use app_helpers::{
    append_desktop_log, append_restart_log, append_shutdown_log, append_startup_log,
    desktop_log, init_desktop_log,
};
pub(crate) use app_types::{AppMenuState, LauncherBridgeResult, LauncherState, ZoomState};

fn main() {
    app_runtime::run();
}
