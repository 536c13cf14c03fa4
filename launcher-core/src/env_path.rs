//! PATH repair for GUI launches.
//!
//! A launcher started from Finder or a desktop menu does not inherit the
//! PATH that the user's shell profile builds, so a globally installed `w2`
//! (npm, nvm, Homebrew) would not be found. Ask a login shell for its PATH
//! and put those entries in front of the inherited ones.

use std::{
    collections::HashSet,
    env,
    ffi::{OsStr, OsString},
    path::PathBuf,
};

use crate::logging::DesktopLog;

#[cfg(unix)]
const LOGIN_SHELL_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

#[cfg(target_os = "macos")]
const DEFAULT_SHELL: &str = "/bin/zsh";
#[cfg(all(unix, not(target_os = "macos")))]
const DEFAULT_SHELL: &str = "/bin/bash";

/// Login-shell entries first, then inherited entries not already present.
pub fn merge_path_entries(login: &OsStr, inherited: &OsStr) -> Option<OsString> {
    let mut seen = HashSet::new();
    let merged: Vec<PathBuf> = env::split_paths(login)
        .chain(env::split_paths(inherited))
        .filter(|entry| !entry.as_os_str().is_empty())
        .filter(|entry| seen.insert(entry.clone()))
        .collect();
    env::join_paths(merged).ok()
}

#[cfg(unix)]
pub fn normalize_inherited_path(log: &DesktopLog) {
    use crate::{
        command::LaunchCommand,
        supervisor::{CommandRunner, SystemCommandRunner},
    };

    let shell = env::var("SHELL")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_SHELL.to_string());
    let command = LaunchCommand {
        program: PathBuf::from(shell),
        args: vec![
            "-l".to_string(),
            "-i".to_string(),
            "-c".to_string(),
            "/usr/bin/printenv PATH".to_string(),
        ],
    };

    let runner = SystemCommandRunner::new(Some(LOGIN_SHELL_TIMEOUT)).in_caller_process_group();
    let output = match runner.run(&command) {
        Ok(output) => output,
        Err(error) => {
            log.startup(&format!("failed to read login shell PATH: {error}"));
            return;
        }
    };

    // Interactive shells may print banners; the PATH is the last line.
    let Some(login_path) = output
        .stdout
        .lines()
        .map(str::trim)
        .rfind(|line| !line.is_empty())
    else {
        log.startup("login shell reported an empty PATH; keeping inherited PATH");
        return;
    };

    let inherited = env::var_os("PATH").unwrap_or_default();
    match merge_path_entries(OsStr::new(login_path), &inherited) {
        Some(merged) => {
            log.startup(&format!("normalized PATH: {}", merged.to_string_lossy()));
            env::set_var("PATH", merged);
        }
        None => log.startup("login shell PATH could not be joined; keeping inherited PATH"),
    }
}

#[cfg(not(unix))]
pub fn normalize_inherited_path(log: &DesktopLog) {
    log.startup("PATH normalization not needed on this platform");
}
