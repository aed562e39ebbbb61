use crate::FaultCode;

/// Host-observable execution state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum EngineState {
    /// Program loaded (or nothing loaded yet), PC at zero.
    #[default]
    Ready,
    /// Mid-program; the next `step` fetches at PC.
    Running,
    /// Parked on a keyboard read with no pending input.
    AwaitingInput,
    /// Instruction stream exhausted.
    Halted,
    /// Unrecoverable fault; further steps are no-ops until restart or reload.
    Failed(FaultCode),
}

impl EngineState {
    /// Returns `true` when `step` can make progress from this state.
    #[must_use]
    pub const fn can_step(self) -> bool {
        matches!(self, Self::Ready | Self::Running)
    }
}

impl std::fmt::Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready => write!(f, "ready"),
            Self::Running => write!(f, "running"),
            Self::AwaitingInput => write!(f, "awaiting input"),
            Self::Halted => write!(f, "halted"),
            Self::Failed(cause) => write!(f, "failed: {cause}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::EngineState;
    use crate::FaultCode;

    #[test]
    fn engine_state_default_is_ready() {
        assert_eq!(EngineState::default(), EngineState::Ready);
    }

    #[test]
    fn only_ready_and_running_can_step() {
        assert!(EngineState::Ready.can_step());
        assert!(EngineState::Running.can_step());
        assert!(!EngineState::AwaitingInput.can_step());
        assert!(!EngineState::Halted.can_step());
        assert!(!EngineState::Failed(FaultCode::UnknownLabel).can_step());
    }

    #[test]
    fn display_names_each_state() {
        assert_eq!(EngineState::AwaitingInput.to_string(), "awaiting input");
        assert_eq!(
            EngineState::Failed(FaultCode::DivisionByZero).to_string(),
            "failed: division by zero"
        );
    }
}
