use url::Url;

use crate::{
    command::{BinaryMode, CommandTemplate, Port},
    config::LauncherConfig,
    env_path,
    lifecycle::{
        residency_policy, LifecycleMachine, LifecycleSignal, LifecycleState, ResidencyPolicy,
        Transition,
    },
    logging::DesktopLog,
    presentation::{local_url, PresentationController, Presenter, WindowId},
    settings::{RuntimeConfig, SettingsSnapshot, SettingsStore},
    supervisor::{
        CommandOutput, CommandRunner, LaunchTicket, ProcessSupervisor, SupervisorState,
    },
    LauncherError, Result,
};

/// Result of a binary-mode change. The command template is fixed for the
/// life of the process, so a saved change only applies after relaunch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeChange {
    Unchanged,
    RelaunchRequired(BinaryMode),
}

/// Ties settings, the supervised `w2` process and the window together.
///
/// Start cycles are split in two so the shell can run the blocking command
/// off its UI thread: [`begin_start`](Self::begin_start) hands out a ticket,
/// [`complete_start`](Self::complete_start) takes the outcome back and
/// raises the window. [`start_sequence`](Self::start_sequence) does both
/// inline.
pub struct LaunchCoordinator<R, P> {
    settings: RuntimeConfig,
    supervisor: ProcessSupervisor<R>,
    presentation: PresentationController<P>,
    lifecycle: LifecycleMachine,
    config: LauncherConfig,
    log: DesktopLog,
    path_normalized: bool,
}

impl<R: CommandRunner, P: Presenter> LaunchCoordinator<R, P> {
    pub fn new(config: LauncherConfig, runner: R, presenter: P, log: DesktopLog) -> Self {
        let settings = RuntimeConfig::load(&SettingsStore::new(config.data_dir.clone()));
        let template = CommandTemplate::new(
            settings.binary_mode(&log),
            config.bundled_binary.clone(),
            &config.global_binary,
        );

        Self {
            settings,
            supervisor: ProcessSupervisor::new(runner, template),
            presentation: PresentationController::new(presenter),
            lifecycle: LifecycleMachine::default(),
            config,
            log,
            path_normalized: false,
        }
    }

    pub fn lifecycle_state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    pub fn supervisor_state(&self) -> SupervisorState {
        self.supervisor.state()
    }

    pub fn runner(&self) -> &R {
        self.supervisor.runner()
    }

    pub fn presentation(&self) -> &PresentationController<P> {
        &self.presentation
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        self.presentation.presenter_mut()
    }

    /// Binary mode in effect for this process.
    pub fn active_binary_mode(&self) -> BinaryMode {
        self.supervisor.template().mode()
    }

    pub fn settings_snapshot(&self) -> SettingsSnapshot {
        self.settings.snapshot(&self.log)
    }

    pub fn port(&self) -> Result<Port> {
        self.settings.port(&self.log)
    }

    /// Application ready: log settings, fix PATH once, open the first cycle.
    pub fn on_ready(&mut self) -> Result<LaunchTicket> {
        if let Transition::Ignored(state) = self.lifecycle.apply(LifecycleSignal::Ready) {
            return Err(LauncherError::NotRunning {
                state: state.as_str(),
                action: "ready",
            });
        }

        let snapshot = self.settings.snapshot(&self.log);
        self.log.startup(&format!(
            "effective settings: port={} binary_mode={} data_dir={}",
            snapshot.port,
            snapshot.binary_mode,
            self.config.data_dir.display()
        ));
        self.log.startup(&format!(
            "w2 binary: {}",
            self.supervisor.template().program().display()
        ));

        if self.config.normalize_path && !self.path_normalized {
            env_path::normalize_inherited_path(&self.log);
            self.path_normalized = true;
        }

        self.begin_cycle()
    }

    /// Opens a start cycle for the configured port.
    pub fn begin_start(&mut self) -> Result<LaunchTicket> {
        if let Transition::Ignored(state) = self.lifecycle.apply(LifecycleSignal::Restart) {
            return Err(LauncherError::NotRunning {
                state: state.as_str(),
                action: "restart",
            });
        }
        self.begin_cycle()
    }

    fn begin_cycle(&mut self) -> Result<LaunchTicket> {
        let port = match self.settings.port(&self.log) {
            Ok(port) => port,
            Err(error) => {
                self.log.restart(&format!("refusing to start w2: {error}"));
                self.lifecycle.apply(LifecycleSignal::StartFailed);
                return Err(error);
            }
        };
        let ticket = self.supervisor.begin_start(port)?;
        self.log.restart(&format!(
            "launch cycle {}: running command: {}",
            ticket.cycle,
            ticket.command.display()
        ));
        Ok(ticket)
    }

    /// Takes back the outcome of a cycle. The window is only (re)created when
    /// the command succeeded and no newer cycle was opened meanwhile. Stale
    /// completions, failed or not, return `Ok(None)`; the supervisor has
    /// already logged them.
    pub fn complete_start(
        &mut self,
        ticket: &LaunchTicket,
        outcome: Result<CommandOutput>,
    ) -> Result<Option<WindowId>> {
        let current = self.supervisor.finish_start(ticket, &outcome, &self.log);
        if !current {
            return Ok(None);
        }

        if let Err(error) = outcome {
            self.lifecycle.apply(LifecycleSignal::StartFailed);
            return Err(error);
        }

        match self.presentation.show(ticket.port, &self.log) {
            Ok(id) => {
                self.lifecycle.apply(LifecycleSignal::StartSucceeded);
                Ok(Some(id))
            }
            Err(error) => {
                self.log.runtime(&format!("failed to open window: {error}"));
                self.lifecycle.apply(LifecycleSignal::StartFailed);
                Err(error)
            }
        }
    }

    /// Runs a whole start cycle on the calling thread.
    pub fn start_sequence(&mut self) -> Result<Option<WindowId>> {
        let ticket = self.begin_start()?;
        let outcome = self.supervisor.runner().run(&ticket.command);
        self.complete_start(&ticket, outcome)
    }

    /// Saves a new port and, only if that worked, opens a restart cycle.
    pub fn set_port(&mut self, raw: &str) -> Result<LaunchTicket> {
        let port: Port = raw.parse()?;
        self.log.runtime(&format!("port change requested: {port}"));
        self.settings.set_port(port, &self.log)?;
        self.begin_start()
    }

    /// Saves the binary mode. The running template is left alone, so a
    /// relaunch is only required when `mode` differs from the active one.
    pub fn set_binary_mode(&mut self, mode: BinaryMode) -> Result<ModeChange> {
        if self.settings.binary_mode(&self.log) != mode {
            self.settings.set_binary_mode(mode, &self.log)?;
        }

        let active = self.active_binary_mode();
        if mode == active {
            self.log.runtime(&format!("binary mode saved as {mode}; already active"));
            return Ok(ModeChange::Unchanged);
        }
        self.log.runtime(&format!(
            "binary mode saved as {mode}; relaunch required (active: {active})"
        ));
        Ok(ModeChange::RelaunchRequired(mode))
    }

    /// Application re-activated (dock click): make sure a window exists, but
    /// only once w2 has been started successfully.
    pub fn on_activate(&mut self) -> Result<Option<WindowId>> {
        if self.lifecycle.state() != LifecycleState::Running {
            return Ok(None);
        }
        let port = self.settings.port(&self.log)?;
        self.presentation.ensure_visible(port, &self.log)
    }

    pub fn on_window_closed(&mut self, id: WindowId) {
        self.presentation.window_closed(id);
    }

    pub fn on_all_windows_closed(&self) -> ResidencyPolicy {
        let policy = residency_policy();
        self.log.runtime(&format!("all windows closed: {policy:?}"));
        policy
    }

    /// Quit: fire `w2 stop` without waiting for it. Safe to call repeatedly.
    pub fn on_quit(&mut self) {
        if let Transition::Moved { .. } = self.lifecycle.apply(LifecycleSignal::Quit) {
            self.log.shutdown("will-quit");
        }
        self.supervisor.stop(&self.log);
        self.lifecycle.apply(LifecycleSignal::Exited);
    }

    /// The app is relaunching itself. `w2` is left running because the next
    /// instance issues `restart` on startup; a `stop` from this process could
    /// land after that and kill the new proxy.
    pub fn on_relaunch(&mut self) {
        if let Transition::Moved { .. } = self.lifecycle.apply(LifecycleSignal::Quit) {
            self.log.shutdown("relaunching; leaving w2 running for the next instance");
        }
        self.supervisor.release(&self.log);
        self.lifecycle.apply(LifecycleSignal::Exited);
    }

    /// Address for the "open in browser" action.
    pub fn open_in_browser_url(&self) -> Result<Url> {
        match self.presentation.current_url() {
            Some(url) => Ok(url.clone()),
            None => local_url(self.settings.port(&self.log)?),
        }
    }
}
