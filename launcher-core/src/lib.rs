//! Process supervision and settings persistence for the whistle desktop
//! launcher.
//!
//! The Tauri shell owns windows and menus; everything that has state or can
//! fail lives here and is driven through [`LaunchCoordinator`].

pub mod command;
pub mod config;
pub mod coordinator;
pub mod env_path;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod presentation;
pub mod settings;
pub mod supervisor;

pub use command::{BinaryMode, LaunchCommand, Port, DEFAULT_PORT};
pub use config::LauncherConfig;
pub use coordinator::{LaunchCoordinator, ModeChange};
pub use error::{LauncherError, Result};
pub use lifecycle::{LifecycleState, ResidencyPolicy};
pub use logging::{DesktopLog, DesktopLogCategory};
pub use presentation::{Presenter, WindowId, WindowSpec};
pub use settings::SettingsSnapshot;
pub use supervisor::{
    CommandOutput, CommandRunner, LaunchTicket, SupervisorState, SystemCommandRunner,
};
