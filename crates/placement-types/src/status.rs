use thiserror::Error;

use crate::models::ApplicationStatus;

/// Outcome of a permitted status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The stored status must be updated to this value.
    Changed(ApplicationStatus),
    /// The application already holds the requested terminal status.
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Invalid status")]
    NotADecision,
    #[error("Application has already been {0}")]
    AlreadyDecided(ApplicationStatus),
}

impl ApplicationStatus {
    /// pending -> accepted | rejected. Re-sending the current terminal status
    /// is a no-op; crossing from one terminal status to the other is refused.
    pub fn transition_to(self, requested: ApplicationStatus) -> Result<Transition, TransitionError> {
        if !requested.is_terminal() {
            return Err(TransitionError::NotADecision);
        }

        match self {
            ApplicationStatus::Pending => Ok(Transition::Changed(requested)),
            current if current == requested => Ok(Transition::Unchanged),
            current => Err(TransitionError::AlreadyDecided(current)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ApplicationStatus::*;

    #[test]
    fn pending_moves_to_either_decision() {
        assert_eq!(Pending.transition_to(Accepted), Ok(Transition::Changed(Accepted)));
        assert_eq!(Pending.transition_to(Rejected), Ok(Transition::Changed(Rejected)));
    }

    #[test]
    fn pending_is_never_a_target() {
        for from in [Pending, Accepted, Rejected] {
            assert_eq!(from.transition_to(Pending), Err(TransitionError::NotADecision));
        }
    }

    #[test]
    fn same_decision_is_idempotent() {
        assert_eq!(Accepted.transition_to(Accepted), Ok(Transition::Unchanged));
        assert_eq!(Rejected.transition_to(Rejected), Ok(Transition::Unchanged));
    }

    #[test]
    fn decisions_are_terminal() {
        assert_eq!(
            Accepted.transition_to(Rejected),
            Err(TransitionError::AlreadyDecided(Accepted))
        );
        assert_eq!(
            Rejected.transition_to(Accepted),
            Err(TransitionError::AlreadyDecided(Rejected))
        );
        assert_eq!(
            TransitionError::AlreadyDecided(Accepted).to_string(),
            "Application has already been accepted"
        );
    }
}
