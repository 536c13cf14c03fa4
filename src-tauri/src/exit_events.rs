use launcher_core::{ResidencyPolicy, SupervisorState};
use tauri::{AppHandle, ExitRequestApi, Manager, RESTART_EXIT_CODE};

use crate::{append_shutdown_log, LauncherState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExitRequestDecision {
    AllowExit,
    /// `request_restart`: the next instance reissues `w2 restart`.
    AllowRelaunch,
    StayResident,
    /// `w2 restart` is still running or its window is being replaced.
    KeepForPendingStart,
}

/// `code` is `None` when the request comes from the last window closing
/// rather than an explicit `exit`/restart.
fn decide_exit_request(
    code: Option<i32>,
    policy: ResidencyPolicy,
    supervisor: SupervisorState,
    has_live_window: bool,
) -> ExitRequestDecision {
    match code {
        Some(RESTART_EXIT_CODE) => return ExitRequestDecision::AllowRelaunch,
        Some(_) => return ExitRequestDecision::AllowExit,
        None => {}
    }
    let command_in_flight = matches!(
        supervisor,
        SupervisorState::Starting | SupervisorState::Restarting
    );
    if command_in_flight || has_live_window {
        return ExitRequestDecision::KeepForPendingStart;
    }
    match policy {
        ResidencyPolicy::StayResident => ExitRequestDecision::StayResident,
        ResidencyPolicy::ExitApplication => ExitRequestDecision::AllowExit,
    }
}

pub(crate) fn handle_exit_requested(
    app_handle: &AppHandle,
    code: Option<i32>,
    api: &ExitRequestApi,
) {
    let Some(state) = app_handle.try_state::<LauncherState>() else {
        return;
    };
    let decision = match state.with_coordinator(|coordinator| {
        let policy = if code.is_none() {
            coordinator.on_all_windows_closed()
        } else {
            ResidencyPolicy::ExitApplication
        };
        let decision = decide_exit_request(
            code,
            policy,
            coordinator.supervisor_state(),
            coordinator.presentation().live_window().is_some(),
        );
        if decision == ExitRequestDecision::AllowRelaunch {
            // Marks w2 as released so the `Exit` teardown skips `w2 stop`.
            coordinator.on_relaunch();
        }
        decision
    }) {
        Ok(decision) => decision,
        Err(error) => {
            append_shutdown_log(&format!("exit requested while state unavailable: {error}"));
            ExitRequestDecision::AllowExit
        }
    };

    match decision {
        ExitRequestDecision::AllowExit => {
            append_shutdown_log(&format!("exit requested (code={code:?}), allowing"));
        }
        ExitRequestDecision::AllowRelaunch => {
            append_shutdown_log("relaunch requested, allowing");
        }
        ExitRequestDecision::StayResident => {
            api.prevent_exit();
            append_shutdown_log("last window closed, staying resident");
        }
        ExitRequestDecision::KeepForPendingStart => {
            api.prevent_exit();
            append_shutdown_log("exit request ignored while a launch cycle is pending");
        }
    }
}

/// Process teardown. `w2 stop` is fired and not awaited, and skipped when
/// the exit is a relaunch.
pub(crate) fn handle_exit_event(app_handle: &AppHandle) {
    let Some(state) = app_handle.try_state::<LauncherState>() else {
        append_shutdown_log("exit event received before launcher state was ready");
        return;
    };
    if let Err(error) = state.with_coordinator(|coordinator| coordinator.on_quit()) {
        append_shutdown_log(&format!("failed to stop w2 on exit: {error}"));
    }
}
