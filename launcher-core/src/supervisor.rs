//! Drives the external `w2` binary through its own `restart`/`stop` verbs.
//!
//! The supervisor never holds a handle to the proxy itself. `w2 restart`
//! is idempotent and keeps at most one proxy alive, so issuing it again is
//! how a new port takes effect.

use std::{
    io::Read,
    process::{Child, Command, Stdio},
    sync::{
        mpsc::{self, Receiver},
        Arc, Mutex,
    },
    thread,
    time::{Duration, Instant},
};

use crate::{
    command::{CommandTemplate, LaunchCommand, Port},
    logging::DesktopLog,
    LauncherError, Result,
};

const COMMAND_POLL_INTERVAL: Duration = Duration::from_millis(50);
/// How long output may keep arriving after the command exited. A daemon
/// started by `w2 restart` inherits the pipes and can hold them open for as
/// long as it runs.
const OUTPUT_GRACE_PERIOD: Duration = Duration::from_millis(500);
const MAX_CAPTURED_OUTPUT_BYTES: usize = 64 * 1024;
const MAX_CAPTURED_OUTPUT_CHARS: usize = 2_000;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Executes launcher commands. Implemented for real processes by
/// [`SystemCommandRunner`]; tests substitute recorders.
pub trait CommandRunner {
    /// Runs `command` until the command itself exits. Processes it leaves
    /// behind are not waited for. Non-zero exit is an error.
    fn run(&self, command: &LaunchCommand) -> Result<CommandOutput>;

    /// Starts `command` without waiting for it.
    fn spawn_detached(&self, command: &LaunchCommand) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct SystemCommandRunner {
    timeout: Option<Duration>,
    own_process_group: bool,
}

impl Default for SystemCommandRunner {
    fn default() -> Self {
        Self::new(None)
    }
}

impl SystemCommandRunner {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            timeout,
            own_process_group: true,
        }
    }

    /// Keeps children in the caller's process group. Needed for interactive
    /// shells, which stop themselves when started in a background group of
    /// a terminal.
    pub fn in_caller_process_group(mut self) -> Self {
        self.own_process_group = false;
        self
    }

    fn build(&self, command: &LaunchCommand) -> Command {
        let mut process = Command::new(&command.program);
        process.args(&command.args).stdin(Stdio::null());

        #[cfg(unix)]
        if self.own_process_group {
            use std::os::unix::process::CommandExt;
            process.process_group(0);
        }

        #[cfg(target_os = "windows")]
        {
            use std::os::windows::process::CommandExt;
            const CREATE_NO_WINDOW: u32 = 0x0800_0000;
            process.creation_flags(CREATE_NO_WINDOW);
        }

        process
    }

    /// Polls for exit until the deadline and returns the raw exit code.
    fn wait_with_deadline(
        &self,
        child: &mut Child,
        command: &LaunchCommand,
    ) -> Result<Option<i32>> {
        let started = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status.code()),
                Ok(None) => {}
                Err(source) => {
                    return Err(LauncherError::CommandSpawn {
                        command: command.display(),
                        source,
                    });
                }
            }

            if let Some(limit) = self.timeout {
                if started.elapsed() >= limit {
                    self.kill_process_tree(child);
                    return Err(LauncherError::CommandTimedOut {
                        command: command.display(),
                        timeout_ms: limit.as_millis(),
                    });
                }
            }

            thread::sleep(COMMAND_POLL_INTERVAL);
        }
    }

    fn kill_process_tree(&self, child: &mut Child) {
        #[cfg(unix)]
        if self.own_process_group {
            if let Ok(pgid) = i32::try_from(child.id()) {
                // SAFETY: plain syscall; the child leads its own group, so
                // `-pgid` never names this process.
                unsafe {
                    libc::kill(-pgid, libc::SIGKILL);
                }
            }
        }

        #[cfg(target_os = "windows")]
        {
            let _ = Command::new("taskkill")
                .args(["/pid", &child.id().to_string(), "/t", "/f"])
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status();
        }

        let _ = child.kill();
        let _ = child.wait();
    }
}

impl CommandRunner for SystemCommandRunner {
    fn run(&self, command: &LaunchCommand) -> Result<CommandOutput> {
        let mut child = self
            .build(command)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| LauncherError::CommandSpawn {
                command: command.display(),
                source,
            })?;

        // Drain both pipes while polling so a chatty binary cannot block on
        // a full pipe.
        let stdout = PipeCapture::start(child.stdout.take());
        let stderr = PipeCapture::start(child.stderr.take());

        let status = self.wait_with_deadline(&mut child, command);
        let grace_deadline = Instant::now() + OUTPUT_GRACE_PERIOD;
        let stdout = stdout.collect(grace_deadline);
        let stderr = stderr.collect(grace_deadline);

        match status? {
            Some(0) => Ok(CommandOutput { stdout, stderr }),
            code => Err(LauncherError::CommandFailed {
                command: command.display(),
                code,
                stderr,
            }),
        }
    }

    fn spawn_detached(&self, command: &LaunchCommand) -> Result<()> {
        self.build(command)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_| ())
            .map_err(|source| LauncherError::CommandSpawn {
                command: command.display(),
                source,
            })
    }
}

/// Output read from one pipe by a background thread. The thread outlives
/// the capture when another process keeps the pipe open.
struct PipeCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
    finished: Receiver<()>,
}

impl PipeCapture {
    fn start<R: Read + Send + 'static>(pipe: Option<R>) -> Self {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let (done, finished) = mpsc::channel();

        if let Some(mut pipe) = pipe {
            let sink = Arc::clone(&buffer);
            thread::spawn(move || {
                let mut chunk = [0_u8; 4096];
                loop {
                    match pipe.read(&mut chunk) {
                        Ok(0) | Err(_) => break,
                        Ok(read) => {
                            if let Ok(mut sink) = sink.lock() {
                                let room = MAX_CAPTURED_OUTPUT_BYTES.saturating_sub(sink.len());
                                sink.extend_from_slice(&chunk[..read.min(room)]);
                            }
                        }
                    }
                }
                let _ = done.send(());
            });
        }

        Self { buffer, finished }
    }

    /// Waits for end of output until `deadline`, then returns whatever was
    /// read so far.
    fn collect(self, deadline: Instant) -> String {
        let _ = self
            .finished
            .recv_timeout(deadline.saturating_duration_since(Instant::now()));
        let bytes = self
            .buffer
            .lock()
            .map(|buffer| buffer.clone())
            .unwrap_or_default();
        trim_output(&bytes)
    }
}

fn trim_output(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let trimmed = text.trim();
    if trimmed.chars().count() > MAX_CAPTURED_OUTPUT_CHARS {
        trimmed.chars().take(MAX_CAPTURED_OUTPUT_CHARS).collect()
    } else {
        trimmed.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Idle,
    Starting,
    Restarting,
    Running,
    StartFailed,
    Stopping,
    Stopped,
}

impl SupervisorState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Restarting => "restarting",
            Self::Running => "running",
            Self::StartFailed => "start-failed",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        }
    }

    fn is_shutting_down(self) -> bool {
        matches!(self, Self::Stopping | Self::Stopped)
    }
}

/// One issued `restart`. Completions are matched back by `cycle`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchTicket {
    pub cycle: u64,
    pub port: Port,
    pub command: LaunchCommand,
}

#[derive(Debug)]
pub struct ProcessSupervisor<R> {
    runner: R,
    template: CommandTemplate,
    state: SupervisorState,
    cycle: u64,
    stop_issued: bool,
}

impl<R: CommandRunner> ProcessSupervisor<R> {
    pub fn new(runner: R, template: CommandTemplate) -> Self {
        Self {
            runner,
            template,
            state: SupervisorState::Idle,
            cycle: 0,
            stop_issued: false,
        }
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    pub fn template(&self) -> &CommandTemplate {
        &self.template
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Opens a new launch cycle and returns the command to run for it.
    pub fn begin_start(&mut self, port: Port) -> Result<LaunchTicket> {
        if self.state.is_shutting_down() {
            return Err(LauncherError::NotRunning {
                state: self.state.as_str(),
                action: "restart",
            });
        }

        self.state = match self.state {
            SupervisorState::Running | SupervisorState::Restarting => SupervisorState::Restarting,
            _ => SupervisorState::Starting,
        };
        self.cycle += 1;

        Ok(LaunchTicket {
            cycle: self.cycle,
            port,
            command: self.template.restart(port),
        })
    }

    /// Records the outcome of `ticket`. Returns `false` when a newer cycle
    /// has started since, in which case the state is left to that cycle.
    pub fn finish_start(
        &mut self,
        ticket: &LaunchTicket,
        outcome: &Result<CommandOutput>,
        log: &DesktopLog,
    ) -> bool {
        let command = ticket.command.display();
        match outcome {
            Ok(output) => {
                log.restart(&format!("command succeeded: {command}"));
                if !output.stdout.is_empty() {
                    log.restart(&output.stdout);
                }
            }
            Err(error) => log.restart(&format!("command failed: {error}")),
        }

        if ticket.cycle != self.cycle || self.state.is_shutting_down() {
            log.restart(&format!(
                "ignoring completion of launch cycle {} (current cycle {}, state {})",
                ticket.cycle,
                self.cycle,
                self.state.as_str()
            ));
            return false;
        }

        self.state = if outcome.is_ok() {
            SupervisorState::Running
        } else {
            SupervisorState::StartFailed
        };
        true
    }

    /// Runs one full start cycle on the calling thread.
    pub fn start_or_restart(&mut self, port: Port, log: &DesktopLog) -> Result<LaunchTicket> {
        let ticket = self.begin_start(port)?;
        log.restart(&format!("running command: {}", ticket.command.display()));
        let outcome = self.runner.run(&ticket.command);
        self.finish_start(&ticket, &outcome, log);
        outcome.map(|_| ticket)
    }

    /// Ends supervision without issuing `stop`. Later `stop` calls are
    /// no-ops.
    pub fn release(&mut self, log: &DesktopLog) {
        if self.stop_issued {
            return;
        }
        self.stop_issued = true;
        self.state = SupervisorState::Stopped;
        log.shutdown("leaving w2 running");
    }

    /// Best-effort `w2 stop`. Never waits for the command and always ends in
    /// `Stopped`; only the first call issues the command.
    pub fn stop(&mut self, log: &DesktopLog) {
        if self.stop_issued {
            return;
        }
        self.stop_issued = true;
        self.state = SupervisorState::Stopping;

        let command = self.template.stop();
        log.shutdown(&format!("running command: {}", command.display()));
        if let Err(error) = self.runner.spawn_detached(&command) {
            log.shutdown(&format!("stop command failed: {error}"));
        }
        self.state = SupervisorState::Stopped;
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, path::PathBuf};

    use super::*;
    use crate::command::BinaryMode;

    #[derive(Default)]
    struct ScriptedRunner {
        fail_run: bool,
        fail_spawn: bool,
        ran: RefCell<Vec<LaunchCommand>>,
        spawned: RefCell<Vec<LaunchCommand>>,
    }

    impl CommandRunner for ScriptedRunner {
        fn run(&self, command: &LaunchCommand) -> Result<CommandOutput> {
            self.ran.borrow_mut().push(command.clone());
            if self.fail_run {
                return Err(LauncherError::CommandFailed {
                    command: command.display(),
                    code: Some(1),
                    stderr: "boom".to_string(),
                });
            }
            Ok(CommandOutput::default())
        }

        fn spawn_detached(&self, command: &LaunchCommand) -> Result<()> {
            self.spawned.borrow_mut().push(command.clone());
            if self.fail_spawn {
                return Err(LauncherError::CommandSpawn {
                    command: command.display(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
                });
            }
            Ok(())
        }
    }

    fn supervisor(runner: ScriptedRunner) -> ProcessSupervisor<ScriptedRunner> {
        let template = CommandTemplate::new(BinaryMode::Local, PathBuf::from("/bundle/w2"), "w2");
        ProcessSupervisor::new(runner, template)
    }

    fn port(raw: &str) -> Port {
        raw.parse().expect("port")
    }

    #[test]
    fn start_then_restart_walks_state_machine() {
        let log = DesktopLog::disabled();
        let mut supervisor = supervisor(ScriptedRunner::default());
        assert_eq!(supervisor.state(), SupervisorState::Idle);

        let ticket = supervisor.begin_start(port("8899")).expect("begin");
        assert_eq!(supervisor.state(), SupervisorState::Starting);
        assert_eq!(ticket.command.args, vec!["restart", "-p", "8899"]);
        assert!(supervisor.finish_start(&ticket, &Ok(CommandOutput::default()), &log));
        assert_eq!(supervisor.state(), SupervisorState::Running);

        let ticket = supervisor.begin_start(port("9001")).expect("begin");
        assert_eq!(supervisor.state(), SupervisorState::Restarting);
        assert_eq!(ticket.cycle, 2);
        assert!(supervisor.finish_start(&ticket, &Ok(CommandOutput::default()), &log));
        assert_eq!(supervisor.state(), SupervisorState::Running);
    }

    #[test]
    fn failed_start_is_reported_not_retried() {
        let log = DesktopLog::disabled();
        let mut supervisor = supervisor(ScriptedRunner {
            fail_run: true,
            ..ScriptedRunner::default()
        });

        let error = supervisor
            .start_or_restart(port("8899"), &log)
            .expect_err("start should fail");

        assert!(matches!(error, LauncherError::CommandFailed { .. }));
        assert_eq!(supervisor.state(), SupervisorState::StartFailed);
        assert_eq!(supervisor.runner().ran.borrow().len(), 1);
    }

    #[test]
    fn stale_completion_does_not_override_newer_cycle() {
        let log = DesktopLog::disabled();
        let mut supervisor = supervisor(ScriptedRunner::default());
        let first = supervisor.begin_start(port("8899")).expect("first");
        let second = supervisor.begin_start(port("9001")).expect("second");

        assert!(!supervisor.finish_start(&first, &Ok(CommandOutput::default()), &log));
        assert_eq!(supervisor.state(), SupervisorState::Starting);
        assert!(supervisor.finish_start(&second, &Ok(CommandOutput::default()), &log));
        assert_eq!(supervisor.state(), SupervisorState::Running);
    }

    #[test]
    fn stop_is_issued_once_and_survives_spawn_failure() {
        let log = DesktopLog::disabled();
        let mut supervisor = supervisor(ScriptedRunner {
            fail_spawn: true,
            ..ScriptedRunner::default()
        });

        supervisor.stop(&log);
        supervisor.stop(&log);

        assert_eq!(supervisor.state(), SupervisorState::Stopped);
        let spawned = supervisor.runner().spawned.borrow();
        assert_eq!(spawned.len(), 1);
        assert_eq!(spawned[0].args, vec!["stop"]);
    }

    #[test]
    fn release_skips_stop_command() {
        let log = DesktopLog::disabled();
        let mut supervisor = supervisor(ScriptedRunner::default());

        supervisor.release(&log);
        supervisor.stop(&log);

        assert_eq!(supervisor.state(), SupervisorState::Stopped);
        assert!(supervisor.runner().spawned.borrow().is_empty());
    }

    #[test]
    fn start_after_stop_is_refused() {
        let log = DesktopLog::disabled();
        let mut supervisor = supervisor(ScriptedRunner::default());
        supervisor.stop(&log);

        let error = supervisor.begin_start(port("8899")).expect_err("refused");
        assert!(matches!(error, LauncherError::NotRunning { .. }));
    }

    #[cfg(unix)]
    mod system {
        use std::{fs, os::unix::fs::PermissionsExt, path::Path};

        use super::*;

        fn script(dir: &Path, body: &str) -> PathBuf {
            let path = dir.join("w2");
            fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write script");
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod");
            path
        }

        fn command(program: PathBuf, args: &[&str]) -> LaunchCommand {
            LaunchCommand {
                program,
                args: args.iter().map(|arg| arg.to_string()).collect(),
            }
        }

        #[test]
        fn run_captures_stdout_and_passes_arguments_verbatim() {
            let dir = tempfile::tempdir().expect("tempdir");
            let program = script(dir.path(), "printf '%s|' \"$@\"");
            let runner = SystemCommandRunner::new(Some(Duration::from_secs(10)));

            let output = runner
                .run(&command(program, &["restart", "-p", "$(id)"]))
                .expect("run");

            assert_eq!(output.stdout, "restart|-p|$(id)|");
        }

        #[test]
        fn run_reports_exit_code_and_stderr() {
            let dir = tempfile::tempdir().expect("tempdir");
            let program = script(dir.path(), "echo 'address in use' >&2\nexit 3");
            let runner = SystemCommandRunner::new(Some(Duration::from_secs(10)));

            let error = runner.run(&command(program, &["restart"])).expect_err("fail");

            match error {
                LauncherError::CommandFailed { code, stderr, .. } => {
                    assert_eq!(code, Some(3));
                    assert_eq!(stderr, "address in use");
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[test]
        fn run_times_out_hung_binary() {
            let dir = tempfile::tempdir().expect("tempdir");
            let program = script(dir.path(), "exec sleep 30");
            let runner = SystemCommandRunner::new(Some(Duration::from_millis(200)));

            let error = runner.run(&command(program, &["restart"])).expect_err("timeout");

            assert!(matches!(error, LauncherError::CommandTimedOut { .. }));
        }

        #[test]
        fn run_times_out_when_shell_waits_on_child() {
            let dir = tempfile::tempdir().expect("tempdir");
            let program = script(dir.path(), "sleep 5\necho done");
            let runner = SystemCommandRunner::new(Some(Duration::from_millis(200)));

            let started = Instant::now();
            let error = runner.run(&command(program, &["restart"])).expect_err("timeout");

            assert!(matches!(error, LauncherError::CommandTimedOut { .. }));
            assert!(started.elapsed() < Duration::from_secs(3));
        }

        #[test]
        fn run_returns_when_command_exits_leaving_background_child() {
            let dir = tempfile::tempdir().expect("tempdir");
            let program = script(dir.path(), "sleep 5 &\necho started\nexit 0");
            let runner = SystemCommandRunner::new(Some(Duration::from_secs(60)));

            let started = Instant::now();
            let output = runner.run(&command(program, &["restart"])).expect("run");

            assert_eq!(output.stdout, "started");
            assert!(started.elapsed() < Duration::from_secs(3));
        }

        #[test]
        fn run_reports_missing_binary_as_spawn_error() {
            let dir = tempfile::tempdir().expect("tempdir");
            let runner = SystemCommandRunner::default();

            let error = runner
                .run(&command(dir.path().join("missing-w2"), &["stop"]))
                .expect_err("spawn");

            assert!(matches!(error, LauncherError::CommandSpawn { .. }));
        }
    }
}
