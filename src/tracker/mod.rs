pub mod git;
pub mod guard;

pub use git::{GitTracker, HeadRef};
pub use guard::{RestoreReport, WorkspaceGuard, WorkspaceSnapshot, WorktreeLease};
