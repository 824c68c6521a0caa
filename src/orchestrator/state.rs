use std::fmt;

/// Where a `stepsite build` run currently is.
///
/// ```text
/// Idle → Discovering → GuardEntered → Building(0..n) → GuardExited → Assembling → Done
///             │              │              │             ▲    │            │
///             └──────────────┴──────────────┴─→ Aborted ──┘    └────────────┴─→ Aborted
/// ```
///
/// A run that aborts after entering the guard still passes through
/// `GuardExited`; one that aborts after leaving it stops at `Aborted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Discovering,
    GuardEntered,
    /// Index into the ordered revision list
    Building(usize),
    GuardExited,
    Assembling,
    Done,
    Aborted,
}

impl RunState {
    pub fn can_advance_to(self, next: RunState) -> bool {
        use RunState::*;
        matches!(
            (self, next),
            (Idle, Discovering)
                | (Discovering, GuardEntered)
                | (Discovering, Aborted)
                | (GuardEntered, Building(0))
                | (GuardEntered, GuardExited)
                | (GuardEntered, Aborted)
                | (Building(_), GuardExited)
                | (Building(_), Aborted)
                | (Aborted, GuardExited)
                | (GuardExited, Assembling)
                | (GuardExited, Aborted)
                | (Assembling, Done)
                | (Assembling, Aborted)
        ) || matches!((self, next), (Building(i), Building(j)) if j == i + 1)
    }

    /// Move to `next`, logging the transition. Illegal transitions are
    /// logged as warnings and still applied.
    pub fn advance(&mut self, next: RunState) {
        if self.can_advance_to(next) {
            tracing::debug!(from = %self, to = %next, "run state");
        } else {
            tracing::warn!(from = %self, to = %next, "unexpected run state transition");
        }
        *self = next;
    }

}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Idle => write!(f, "idle"),
            RunState::Discovering => write!(f, "discovering"),
            RunState::GuardEntered => write!(f, "guard-entered"),
            RunState::Building(i) => write!(f, "building({})", i),
            RunState::GuardExited => write!(f, "guard-exited"),
            RunState::Assembling => write!(f, "assembling"),
            RunState::Done => write!(f, "done"),
            RunState::Aborted => write!(f, "aborted"),
        }
    }
}
