use std::{fmt, path::PathBuf, str::FromStr};

use serde::Serialize;

use crate::{LauncherError, Result};

pub const DEFAULT_PORT: u16 = 8899;

/// A validated TCP port. Only plain decimal digits in `1..=65535` parse, so
/// the value can never carry shell syntax into a command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Port(u16);

impl Port {
    pub fn get(self) -> u16 {
        self.0
    }
}

impl Default for Port {
    fn default() -> Self {
        Self(DEFAULT_PORT)
    }
}

impl FromStr for Port {
    type Err = LauncherError;

    fn from_str(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let invalid = || LauncherError::InvalidPort {
            value: raw.to_string(),
        };

        if trimmed.is_empty() || !trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(invalid());
        }
        match trimmed.parse::<u16>() {
            Ok(0) | Err(_) => Err(invalid()),
            Ok(port) => Ok(Self(port)),
        }
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which `w2` the launcher invokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BinaryMode {
    /// The copy shipped inside the application bundle.
    #[default]
    Local,
    /// Whatever `w2` resolves to on `PATH`.
    Global,
}

impl BinaryMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Global => "global",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Local => Self::Global,
            Self::Global => Self::Local,
        }
    }
}

impl FromStr for BinaryMode {
    type Err = LauncherError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim() {
            "local" => Ok(Self::Local),
            "global" => Ok(Self::Global),
            _ => Err(LauncherError::InvalidBinaryMode {
                value: raw.to_string(),
            }),
        }
    }
}

impl fmt::Display for BinaryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A program plus its argument vector. Never joined into a shell string for
/// execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl LaunchCommand {
    /// Shell-quoted rendering for logs and error messages.
    pub fn display(&self) -> String {
        let mut parts = vec![self.program.to_string_lossy().to_string()];
        parts.extend(self.args.iter().cloned());
        shlex::try_join(parts.iter().map(String::as_str)).unwrap_or_else(|_| parts.join(" "))
    }
}

impl fmt::Display for LaunchCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// The binary to invoke, fixed for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    program: PathBuf,
    mode: BinaryMode,
}

impl CommandTemplate {
    pub fn new(mode: BinaryMode, bundled_binary: PathBuf, global_binary: &str) -> Self {
        let program = match mode {
            BinaryMode::Local => bundled_binary,
            BinaryMode::Global => PathBuf::from(global_binary),
        };
        Self { program, mode }
    }

    pub fn mode(&self) -> BinaryMode {
        self.mode
    }

    pub fn program(&self) -> &PathBuf {
        &self.program
    }

    pub fn restart(&self, port: Port) -> LaunchCommand {
        LaunchCommand {
            program: self.program.clone(),
            args: vec!["restart".to_string(), "-p".to_string(), port.to_string()],
        }
    }

    pub fn stop(&self) -> LaunchCommand {
        LaunchCommand {
            program: self.program.clone(),
            args: vec!["stop".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_accepts_plain_decimal_in_range() {
        assert_eq!("8899".parse::<Port>().expect("port").get(), 8899);
        assert_eq!(" 9001\n".parse::<Port>().expect("port").get(), 9001);
        assert_eq!("65535".parse::<Port>().expect("port").get(), 65535);
    }

    #[test]
    fn port_rejects_shell_metacharacters_and_out_of_range() {
        for raw in [
            "", "0", "65536", "-1", "+80", "80 80", "8899; rm -rf ~", "$(id)", "`id`", "80&",
            "0x50", "８０",
        ] {
            assert!(
                matches!(raw.parse::<Port>(), Err(LauncherError::InvalidPort { .. })),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn binary_mode_round_trips_through_text() {
        assert_eq!("local".parse::<BinaryMode>().expect("mode"), BinaryMode::Local);
        assert_eq!(" global ".parse::<BinaryMode>().expect("mode"), BinaryMode::Global);
        assert!("Global".parse::<BinaryMode>().is_err());
        assert_eq!(BinaryMode::Local.toggled(), BinaryMode::Global);
    }

    #[test]
    fn restart_command_uses_argument_vector() {
        let template = CommandTemplate::new(
            BinaryMode::Local,
            PathBuf::from("/Applications/whistle.app/bin/w2"),
            "w2",
        );
        let command = template.restart(Port::default());
        assert_eq!(command.program, PathBuf::from("/Applications/whistle.app/bin/w2"));
        assert_eq!(command.args, vec!["restart", "-p", "8899"]);
        assert_eq!(
            command.display(),
            "/Applications/whistle.app/bin/w2 restart -p 8899"
        );
    }

    #[test]
    fn global_template_uses_bare_binary_name() {
        let template = CommandTemplate::new(BinaryMode::Global, PathBuf::from("/bundle/w2"), "w2");
        assert_eq!(template.stop().program, PathBuf::from("w2"));
        assert_eq!(template.stop().args, vec!["stop"]);
    }

    #[test]
    fn display_quotes_paths_with_spaces() {
        let template = CommandTemplate::new(
            BinaryMode::Local,
            PathBuf::from("/Users/me/My Apps/w2"),
            "w2",
        );
        let rendered = template.stop().display();
        assert_eq!(
            shlex::split(&rendered),
            Some(vec!["/Users/me/My Apps/w2".to_string(), "stop".to_string()])
        );
    }
}
