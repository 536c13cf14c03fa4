use launcher_core::{CommandOutput, CommandRunner, LaunchTicket, LauncherError, SystemCommandRunner};
use tauri::{AppHandle, Manager};
use tauri_plugin_dialog::{DialogExt, MessageDialogButtons, MessageDialogKind};

use crate::{
    append_desktop_log, append_restart_log, append_startup_log, main_window, port_prompt,
    shell_locale, ui_dispatch, LauncherState,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailureFollowUp {
    /// Lifecycle refused the action (quit in progress); nothing to offer.
    LogOnly,
    /// The stored port is unusable; retrying would fail the same way.
    PromptForPort,
    OfferRetry,
}

fn decide_failure_follow_up(error: &LauncherError) -> FailureFollowUp {
    if !error.is_recoverable() {
        return FailureFollowUp::LogOnly;
    }
    if matches!(error, LauncherError::InvalidPort { .. }) {
        return FailureFollowUp::PromptForPort;
    }
    FailureFollowUp::OfferRetry
}

/// First start cycle, run from `setup`.
pub(crate) fn start_on_ready(app_handle: &AppHandle) {
    let state = app_handle.state::<LauncherState>();
    let prepared = state.with_coordinator(|coordinator| {
        coordinator
            .on_ready()
            .map(|ticket| (ticket, coordinator.runner().clone()))
    });
    dispatch_prepared(app_handle, prepared);
}

/// Starts another cycle with whatever is currently saved.
pub(crate) fn restart_with_current_settings(app_handle: &AppHandle) {
    let state = app_handle.state::<LauncherState>();
    let prepared = state.with_coordinator(|coordinator| {
        coordinator
            .begin_start()
            .map(|ticket| (ticket, coordinator.runner().clone()))
    });
    dispatch_prepared(app_handle, prepared);
}

/// Runs an already opened cycle, e.g. the one returned by `set_port`.
pub(crate) fn run_cycle(app_handle: &AppHandle, ticket: LaunchTicket, runner: SystemCommandRunner) {
    let app_handle = app_handle.clone();
    tauri::async_runtime::spawn_blocking(move || {
        let outcome = runner.run(&ticket.command);
        if let Err(error) = ui_dispatch::run_on_main_thread_dispatch(
            &app_handle,
            "complete launch cycle",
            move |main_app| complete_cycle(main_app, &ticket, outcome),
        ) {
            append_restart_log(&error);
        }
    });
}

fn dispatch_prepared(
    app_handle: &AppHandle,
    prepared: Result<Result<(LaunchTicket, SystemCommandRunner), LauncherError>, String>,
) {
    match prepared {
        Ok(Ok((ticket, runner))) => run_cycle(app_handle, ticket, runner),
        Ok(Err(error)) => report_start_failure(app_handle, &error),
        Err(error) => append_startup_log(&error),
    }
}

fn complete_cycle(
    app_handle: &AppHandle,
    ticket: &LaunchTicket,
    outcome: Result<CommandOutput, LauncherError>,
) {
    let state = app_handle.state::<LauncherState>();
    match state.with_coordinator(|coordinator| coordinator.complete_start(ticket, outcome)) {
        Ok(Ok(Some(_))) => {
            append_restart_log(&format!(
                "launch cycle {} finished; window opened on port {}",
                ticket.cycle, ticket.port
            ));
        }
        Ok(Ok(None)) => {}
        Ok(Err(error)) => report_start_failure(app_handle, &error),
        Err(error) => append_restart_log(&error),
    }
}

/// Start failures are shown to the user instead of taking the app down.
pub(crate) fn report_start_failure(app_handle: &AppHandle, error: &LauncherError) {
    append_restart_log(&format!("whistle start failed: {error}"));

    match decide_failure_follow_up(error) {
        FailureFollowUp::LogOnly => {}
        FailureFollowUp::PromptForPort => {
            port_prompt::open_port_prompt(app_handle, append_desktop_log);
        }
        FailureFollowUp::OfferRetry => {
            let texts = shell_locale::current_shell_texts();
            let retry_handle = app_handle.clone();
            app_handle
                .dialog()
                .message(format!("{}\n{error}", texts.start_failed_message))
                .title(texts.start_failed_title)
                .kind(MessageDialogKind::Error)
                .buttons(MessageDialogButtons::OkCancelCustom(
                    texts.retry.to_string(),
                    texts.quit.to_string(),
                ))
                .show(move |retry| {
                    if retry {
                        append_restart_log("user chose to retry whistle start");
                        if let Err(error) = ui_dispatch::run_on_main_thread_dispatch(
                            &retry_handle,
                            "retry whistle start",
                            restart_with_current_settings,
                        ) {
                            append_restart_log(&error);
                        }
                    } else {
                        append_restart_log("user chose to quit after start failure");
                        retry_handle.exit(1);
                    }
                });
        }
    }
}

/// Dock click or second launch: bring a window back at the configured port.
pub(crate) fn reopen_window(app_handle: &AppHandle) {
    let state = app_handle.state::<LauncherState>();
    match state.with_coordinator(|coordinator| coordinator.on_activate()) {
        Ok(Ok(Some(_))) => {}
        Ok(Ok(None)) => main_window::focus_main_window(app_handle, append_desktop_log),
        Ok(Err(error)) => append_desktop_log(&format!("failed to reopen window: {error}")),
        Err(error) => append_desktop_log(&error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_port_asks_for_a_new_port() {
        let error = LauncherError::InvalidPort {
            value: "abc".to_string(),
        };
        assert_eq!(
            decide_failure_follow_up(&error),
            FailureFollowUp::PromptForPort
        );
    }

    #[test]
    fn command_failure_offers_retry() {
        let error = LauncherError::CommandFailed {
            command: "w2 restart -p 8899".to_string(),
            code: Some(1),
            stderr: String::new(),
        };
        assert_eq!(decide_failure_follow_up(&error), FailureFollowUp::OfferRetry);
    }

    #[test]
    fn lifecycle_refusal_is_only_logged() {
        let error = LauncherError::NotRunning {
            state: "stopped",
            action: "restart",
        };
        assert_eq!(decide_failure_follow_up(&error), FailureFollowUp::LogOnly);
    }
}
