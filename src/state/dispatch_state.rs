/// Per-URL dispatch states for one crawl session
///
/// A URL moves `Pending -> Dispatched -> (Succeeded | Failed)` and never
/// returns to `Pending`.
use std::fmt;

/// Represents where a URL is in the crawl process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchState {
    /// Enqueued in the frontier, waiting for a batch
    Pending,

    /// Drawn into a batch and handed to a worker
    Dispatched,

    /// Fetched and recorded as a page
    Succeeded,

    /// Every fetch path failed
    Failed,
}

impl DispatchState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Returns true if this represents a successful completion
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    /// Returns true if `next` is a legal successor of this state
    pub fn can_transition_to(&self, next: DispatchState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Dispatched)
                | (Self::Dispatched, Self::Succeeded)
                | (Self::Dispatched, Self::Failed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Dispatched => "dispatched",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for DispatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [DispatchState; 4] = [
        DispatchState::Pending,
        DispatchState::Dispatched,
        DispatchState::Succeeded,
        DispatchState::Failed,
    ];

    #[test]
    fn test_is_terminal() {
        assert!(!DispatchState::Pending.is_terminal());
        assert!(!DispatchState::Dispatched.is_terminal());
        assert!(DispatchState::Succeeded.is_terminal());
        assert!(DispatchState::Failed.is_terminal());
    }

    #[test]
    fn test_is_success() {
        assert!(DispatchState::Succeeded.is_success());
        assert!(!DispatchState::Failed.is_success());
        assert!(!DispatchState::Dispatched.is_success());
    }

    #[test]
    fn test_transitions_only_move_forward() {
        assert!(DispatchState::Pending.can_transition_to(DispatchState::Dispatched));
        assert!(DispatchState::Dispatched.can_transition_to(DispatchState::Succeeded));
        assert!(DispatchState::Dispatched.can_transition_to(DispatchState::Failed));

        for state in ALL {
            assert!(
                !state.can_transition_to(DispatchState::Pending),
                "{} must never return to pending",
                state
            );
        }
        for terminal in [DispatchState::Succeeded, DispatchState::Failed] {
            for next in ALL {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", DispatchState::Pending), "pending");
        assert_eq!(format!("{}", DispatchState::Dispatched), "dispatched");
        assert_eq!(format!("{}", DispatchState::Succeeded), "succeeded");
    }
}
