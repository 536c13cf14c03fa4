#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    #[default]
    NotStarted,
    Starting,
    Running,
    Stopping,
    Stopped,
}

impl LifecycleState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not-started",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleSignal {
    Ready,
    StartSucceeded,
    StartFailed,
    Restart,
    Quit,
    Exited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Moved {
        from: LifecycleState,
        to: LifecycleState,
    },
    Ignored(LifecycleState),
}

#[derive(Debug, Default)]
pub struct LifecycleMachine {
    state: LifecycleState,
}

impl LifecycleMachine {
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn apply(&mut self, signal: LifecycleSignal) -> Transition {
        let from = self.state;
        match next_state(from, signal) {
            Some(to) => {
                self.state = to;
                Transition::Moved { from, to }
            }
            None => Transition::Ignored(from),
        }
    }
}

/// A failed start keeps the app in `Starting` so the user can retry; there
/// is no separate failed state at the application level.
fn next_state(state: LifecycleState, signal: LifecycleSignal) -> Option<LifecycleState> {
    use LifecycleSignal as S;
    use LifecycleState as L;

    match (state, signal) {
        (L::NotStarted, S::Ready) => Some(L::Starting),
        (L::Starting, S::StartSucceeded) => Some(L::Running),
        (L::Starting, S::StartFailed) => Some(L::Starting),
        (L::Starting | L::Running, S::Restart) => Some(L::Starting),
        (L::Running, S::StartFailed) => Some(L::Starting),
        (L::NotStarted | L::Starting | L::Running, S::Quit) => Some(L::Stopping),
        (L::Stopping, S::Exited) | (L::Stopped, S::Exited) => Some(L::Stopped),
        (L::NotStarted | L::Starting | L::Running, S::Exited) => Some(L::Stopped),
        _ => None,
    }
}

/// What to do once the last window closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResidencyPolicy {
    /// macOS convention: keep running in the dock until quit.
    StayResident,
    ExitApplication,
}

pub fn residency_policy() -> ResidencyPolicy {
    if cfg!(target_os = "macos") {
        ResidencyPolicy::StayResident
    } else {
        ResidencyPolicy::ExitApplication
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_reaches_stopped() {
        let mut machine = LifecycleMachine::default();
        for signal in [
            LifecycleSignal::Ready,
            LifecycleSignal::StartSucceeded,
            LifecycleSignal::Restart,
            LifecycleSignal::StartSucceeded,
            LifecycleSignal::Quit,
            LifecycleSignal::Exited,
        ] {
            assert!(matches!(machine.apply(signal), Transition::Moved { .. }));
        }
        assert_eq!(machine.state(), LifecycleState::Stopped);
    }

    #[test]
    fn restart_after_quit_is_ignored() {
        let mut machine = LifecycleMachine::default();
        machine.apply(LifecycleSignal::Ready);
        machine.apply(LifecycleSignal::Quit);

        assert_eq!(
            machine.apply(LifecycleSignal::Restart),
            Transition::Ignored(LifecycleState::Stopping)
        );
        assert_eq!(
            machine.apply(LifecycleSignal::StartSucceeded),
            Transition::Ignored(LifecycleState::Stopping)
        );
    }

    #[test]
    fn ready_is_only_accepted_once() {
        let mut machine = LifecycleMachine::default();
        machine.apply(LifecycleSignal::Ready);
        assert_eq!(
            machine.apply(LifecycleSignal::Ready),
            Transition::Ignored(LifecycleState::Starting)
        );
    }

    #[test]
    fn failed_start_stays_retryable() {
        let mut machine = LifecycleMachine::default();
        machine.apply(LifecycleSignal::Ready);
        machine.apply(LifecycleSignal::StartFailed);
        assert_eq!(machine.state(), LifecycleState::Starting);
        assert!(matches!(
            machine.apply(LifecycleSignal::Restart),
            Transition::Moved { .. }
        ));
    }

    #[test]
    fn residency_policy_matches_platform() {
        let expected = if cfg!(target_os = "macos") {
            ResidencyPolicy::StayResident
        } else {
            ResidencyPolicy::ExitApplication
        };
        assert_eq!(residency_policy(), expected);
    }
}
