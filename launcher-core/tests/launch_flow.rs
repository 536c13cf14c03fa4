use std::{collections::BTreeMap, fs, path::Path, path::PathBuf};

use launcher_core::{
    BinaryMode, CommandOutput, CommandRunner, DesktopLog, LaunchCommand, LaunchCoordinator,
    LauncherConfig, LauncherError, LifecycleState, ModeChange, Presenter, Result, WindowId,
    WindowSpec,
};

#[derive(Default)]
struct WindowRecorder {
    next_id: u64,
    open: BTreeMap<u64, WindowSpec>,
}

impl Presenter for WindowRecorder {
    fn open_window(&mut self, spec: &WindowSpec) -> Result<WindowId> {
        self.next_id += 1;
        self.open.insert(self.next_id, spec.clone());
        Ok(WindowId(self.next_id))
    }

    fn close_window(&mut self, id: WindowId) {
        self.open.remove(&id.0);
    }

    fn is_window_open(&self, id: WindowId) -> bool {
        self.open.contains_key(&id.0)
    }
}

/// Records commands instead of running them.
#[derive(Default)]
struct CommandLog {
    ran: std::cell::RefCell<Vec<LaunchCommand>>,
}

impl CommandRunner for CommandLog {
    fn run(&self, command: &LaunchCommand) -> Result<CommandOutput> {
        self.ran.borrow_mut().push(command.clone());
        Ok(CommandOutput::default())
    }

    fn spawn_detached(&self, command: &LaunchCommand) -> Result<()> {
        self.ran.borrow_mut().push(command.clone());
        Ok(())
    }
}

fn config(data_dir: &Path) -> LauncherConfig {
    let mut config = LauncherConfig::new(data_dir.to_path_buf(), PathBuf::from("/bundle/bin/w2"));
    config.normalize_path = false;
    config
}

fn launch(data_dir: &Path) -> LaunchCoordinator<CommandLog, WindowRecorder> {
    LaunchCoordinator::new(
        config(data_dir),
        CommandLog::default(),
        WindowRecorder::default(),
        DesktopLog::disabled(),
    )
}

fn run_ready(coordinator: &mut LaunchCoordinator<CommandLog, WindowRecorder>) {
    let ticket = coordinator.on_ready().expect("ready");
    let outcome = coordinator.runner().run(&ticket.command);
    coordinator
        .complete_start(&ticket, outcome)
        .expect("start succeeds");
}

fn only_window(coordinator: &LaunchCoordinator<CommandLog, WindowRecorder>) -> WindowSpec {
    let open = &coordinator.presentation().presenter().open;
    assert_eq!(open.len(), 1, "exactly one window should be open");
    open.values().next().cloned().expect("window")
}

#[test]
fn default_install_restarts_bundled_binary_on_default_port() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut coordinator = launch(dir.path());

    assert_eq!(coordinator.port().expect("port").get(), 8899);
    run_ready(&mut coordinator);

    let ran = coordinator.runner().ran.borrow();
    assert_eq!(ran[0].display(), "/bundle/bin/w2 restart -p 8899");
    drop(ran);
    assert_eq!(only_window(&coordinator).url.as_str(), "http://127.0.0.1:8899/");
}

#[test]
fn port_change_survives_relaunch() {
    let dir = tempfile::tempdir().expect("tempdir");
    {
        let mut coordinator = launch(dir.path());
        run_ready(&mut coordinator);
        let ticket = coordinator.set_port("9001").expect("set port");
        assert_eq!(ticket.command.args, vec!["restart", "-p", "9001"]);
        let outcome = coordinator.runner().run(&ticket.command);
        coordinator.complete_start(&ticket, outcome).expect("restart");
        assert_eq!(only_window(&coordinator).url.port(), Some(9001));
        coordinator.on_quit();
    }

    assert_eq!(fs::read_to_string(dir.path().join("port")).expect("port"), "9001");

    let mut relaunched = launch(dir.path());
    run_ready(&mut relaunched);
    assert_eq!(
        relaunched.runner().ran.borrow()[0].args,
        vec!["restart", "-p", "9001"]
    );
    assert_eq!(
        only_window(&relaunched).url.as_str(),
        "http://127.0.0.1:9001/"
    );
}

#[test]
fn global_mode_takes_effect_after_relaunch() {
    let dir = tempfile::tempdir().expect("tempdir");
    {
        let mut coordinator = launch(dir.path());
        run_ready(&mut coordinator);
        assert_eq!(
            coordinator.set_binary_mode(BinaryMode::Global).expect("mode"),
            ModeChange::RelaunchRequired(BinaryMode::Global)
        );
        let still_local = coordinator.start_sequence().expect("restart");
        assert!(still_local.is_some());
        assert_eq!(
            coordinator.runner().ran.borrow()[1].program,
            PathBuf::from("/bundle/bin/w2")
        );
    }

    assert_eq!(
        fs::read_to_string(dir.path().join("whistle")).expect("mode file"),
        "global"
    );

    let mut relaunched = launch(dir.path());
    run_ready(&mut relaunched);
    let ran = relaunched.runner().ran.borrow();
    assert_eq!(ran[0].program, PathBuf::from(launcher_core::config::GLOBAL_BINARY_NAME));
    assert_eq!(ran[0].args, vec!["restart", "-p", "8899"]);
}

#[test]
fn repeated_restart_keeps_one_window() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut coordinator = launch(dir.path());
    run_ready(&mut coordinator);

    coordinator.start_sequence().expect("second");
    coordinator.start_sequence().expect("third");

    assert_eq!(only_window(&coordinator).url.port(), Some(8899));
    assert_eq!(coordinator.lifecycle_state(), LifecycleState::Running);
}

#[test]
fn unreadable_settings_fall_back_to_default_port() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::create_dir(dir.path().join("port")).expect("make port unreadable");

    let coordinator = launch(dir.path());

    assert_eq!(coordinator.port().expect("port").get(), 8899);
}

#[test]
fn stored_port_with_shell_syntax_never_reaches_runner() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("port"), "8899; touch /tmp/pwned").expect("port");
    let mut coordinator = launch(dir.path());

    let error = coordinator.on_ready().expect_err("rejected");

    assert!(matches!(error, LauncherError::InvalidPort { .. }));
    assert!(coordinator.runner().ran.borrow().is_empty());
    assert!(coordinator.presentation().presenter().open.is_empty());
}

#[cfg(unix)]
mod real_process {
    use std::{os::unix::fs::PermissionsExt, time::Duration};

    use launcher_core::SystemCommandRunner;

    use super::*;

    /// A stand-in `w2` that appends its arguments to `calls.log`.
    fn fake_w2(dir: &Path) -> PathBuf {
        let path = dir.join("w2");
        let calls = dir.join("calls.log");
        fs::write(
            &path,
            format!(
                "#!/bin/sh\necho \"$@\" >> '{}'\necho \"[i] whistle@2 started\"\n",
                calls.display()
            ),
        )
        .expect("write fake w2");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod");
        path
    }

    #[test]
    fn start_sequence_drives_real_binary() {
        let bin_dir = tempfile::tempdir().expect("bin dir");
        let data_dir = tempfile::tempdir().expect("data dir");
        let mut config =
            LauncherConfig::new(data_dir.path().to_path_buf(), fake_w2(bin_dir.path()));
        config.normalize_path = false;
        config.command_timeout = Some(Duration::from_secs(10));
        let runner = SystemCommandRunner::new(config.command_timeout);
        let mut coordinator = LaunchCoordinator::new(
            config,
            runner,
            WindowRecorder::default(),
            DesktopLog::disabled(),
        );

        let ticket = coordinator.on_ready().expect("ready");
        let outcome = coordinator.runner().run(&ticket.command);
        let window = coordinator.complete_start(&ticket, outcome).expect("start");

        assert!(window.is_some());
        let calls = fs::read_to_string(bin_dir.path().join("calls.log")).expect("calls");
        assert_eq!(calls.trim(), "restart -p 8899");
    }
}
