//! Workspace guard: set the caller's work tree aside for the duration of a
//! build and put it back afterwards, whatever happens in between.
//!
//! The guard is the only issuer of [`WorktreeLease`], the token every
//! revision build needs. A lease mutably borrows its guard, so at most one
//! writer touches the work tree at a time and the guard cannot exit while a
//! lease is alive.

use super::git::{GitTracker, HeadRef};
use crate::errors::WorkspaceError;
use git2::Oid;
use std::path::Path;

/// What the work tree looked like before the orchestrator started.
#[derive(Debug, Clone)]
pub struct WorkspaceSnapshot {
    pub head: HeadRef,
    pub was_dirty: bool,
    /// Stash created at enter, popped at exit
    pub stash: Option<Oid>,
}

/// Outcome of putting the work tree back.
#[derive(Debug, Default)]
pub struct RestoreReport {
    pub head_restored: bool,
    pub changes_reapplied: bool,
    /// Restore failures; reported to the operator, never fatal
    pub warnings: Vec<WorkspaceError>,
}

impl RestoreReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

pub struct WorkspaceGuard {
    tracker: GitTracker,
    snapshot: Option<WorkspaceSnapshot>,
}

impl WorkspaceGuard {
    /// Record HEAD and stash local modifications and untracked files if
    /// there are any.
    ///
    /// Any failure here is fatal: nothing has been checked out yet and the
    /// caller's tree is untouched.
    pub fn enter(mut tracker: GitTracker) -> Result<Self, WorkspaceError> {
        let head = tracker.head_ref()?;
        let was_dirty = tracker.is_dirty()?;
        let stash = if was_dirty {
            tracing::info!("Uncommitted changes found, stashing them for the build");
            Some(tracker.stash()?)
        } else {
            None
        };

        tracing::debug!(%head, was_dirty, "workspace guard entered");
        Ok(Self {
            tracker,
            snapshot: Some(WorkspaceSnapshot {
                head,
                was_dirty,
                stash,
            }),
        })
    }

    pub fn snapshot(&self) -> Option<&WorkspaceSnapshot> {
        self.snapshot.as_ref()
    }

    /// Hand out exclusive access to the work tree.
    pub fn lease(&mut self) -> WorktreeLease<'_> {
        WorktreeLease {
            tracker: &self.tracker,
        }
    }

    /// Restore the original HEAD, then re-apply stashed changes.
    pub fn exit(mut self) -> RestoreReport {
        self.restore()
    }

    fn restore(&mut self) -> RestoreReport {
        let mut report = RestoreReport::default();
        let Some(snapshot) = self.snapshot.take() else {
            return report;
        };

        tracing::info!("Restoring original HEAD: {}", snapshot.head);
        match self.tracker.restore_head(&snapshot.head) {
            Ok(()) => report.head_restored = true,
            Err(source) => {
                report.warnings.push(WorkspaceError::Restore {
                    head: snapshot.head.to_string(),
                    source,
                });
                // Popping onto the wrong commit would scatter the changes;
                // leave them in the stash list instead.
                if snapshot.stash.is_some() {
                    report.warnings.push(WorkspaceError::Unstash(git2::Error::from_str(
                        "skipped because HEAD could not be restored",
                    )));
                }
                return report;
            }
        }

        if let Some(stash_id) = snapshot.stash {
            tracing::info!("Re-applying stashed changes");
            match self.tracker.unstash(stash_id) {
                Ok(()) => report.changes_reapplied = true,
                Err(err) => report.warnings.push(err),
            }
        }

        report
    }
}

impl Drop for WorkspaceGuard {
    fn drop(&mut self) {
        if self.snapshot.is_some() {
            let report = self.restore();
            for warning in &report.warnings {
                tracing::warn!("{}", warning);
            }
        }
    }
}

/// Exclusive handle on the shared work tree, issued by [`WorkspaceGuard::lease`].
pub struct WorktreeLease<'g> {
    tracker: &'g GitTracker,
}

impl WorktreeLease<'_> {
    pub fn workdir(&self) -> &Path {
        self.tracker.workdir()
    }

    pub fn checkout(&mut self, tag: &str) -> Result<(), git2::Error> {
        self.tracker.checkout_tag(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::{Repository, Signature};
    use std::fs;
    use tempfile::tempdir;

    fn repo_with_step(dir: &Path) {
        let repo = Repository::init(dir).unwrap();
        let mut config = repo.config().unwrap();
        config.set_str("user.name", "test").unwrap();
        config.set_str("user.email", "test@test.com").unwrap();

        let sig = Signature::now("test", "test@test.com").unwrap();
        let commit = |file: &str, content: &str| {
            fs::write(dir.join(file), content).unwrap();
            let mut index = repo.index().unwrap();
            index
                .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
                .unwrap();
            index.write().unwrap();
            let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
            let parents: Vec<_> = repo
                .head()
                .ok()
                .and_then(|h| h.peel_to_commit().ok())
                .into_iter()
                .collect();
            let parent_refs: Vec<_> = parents.iter().collect();
            repo.commit(Some("HEAD"), &sig, &sig, file, &tree, &parent_refs)
                .unwrap()
        };

        let first = commit("app.txt", "v1");
        repo.tag_lightweight("step-1", &repo.find_object(first, None).unwrap(), false)
            .unwrap();
        commit("app.txt", "v2");
    }

    #[test]
    fn test_clean_tree_is_not_stashed() {
        let dir = tempdir().unwrap();
        repo_with_step(dir.path());
        let guard = WorkspaceGuard::enter(GitTracker::new(dir.path()).unwrap()).unwrap();
        let snapshot = guard.snapshot().unwrap();
        assert!(!snapshot.was_dirty);
        assert!(snapshot.stash.is_none());

        let report = guard.exit();
        assert!(report.head_restored);
        assert!(!report.changes_reapplied);
        assert!(report.is_clean());
    }

    #[test]
    fn test_dirty_tree_restored_after_checkout() {
        let dir = tempdir().unwrap();
        repo_with_step(dir.path());
        fs::write(dir.path().join("app.txt"), "work in progress").unwrap();

        let mut guard = WorkspaceGuard::enter(GitTracker::new(dir.path()).unwrap()).unwrap();
        assert!(guard.snapshot().unwrap().was_dirty);
        assert_eq!(fs::read_to_string(dir.path().join("app.txt")).unwrap(), "v2");

        guard.lease().checkout("step-1").unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("app.txt")).unwrap(), "v1");

        let report = guard.exit();
        assert!(report.is_clean(), "{:?}", report.warnings);
        assert!(report.changes_reapplied);
        assert_eq!(
            fs::read_to_string(dir.path().join("app.txt")).unwrap(),
            "work in progress"
        );
        let repo = Repository::open(dir.path()).unwrap();
        assert!(repo.head().unwrap().is_branch());
    }

    #[test]
    fn test_drop_restores_when_exit_is_skipped() {
        let dir = tempdir().unwrap();
        repo_with_step(dir.path());
        {
            let mut guard = WorkspaceGuard::enter(GitTracker::new(dir.path()).unwrap()).unwrap();
            guard.lease().checkout("step-1").unwrap();
        }
        let repo = Repository::open(dir.path()).unwrap();
        assert!(repo.head().unwrap().is_branch());
        assert_eq!(fs::read_to_string(dir.path().join("app.txt")).unwrap(), "v2");
    }

    #[test]
    fn test_missing_stash_is_a_warning() {
        let dir = tempdir().unwrap();
        repo_with_step(dir.path());
        fs::write(dir.path().join("app.txt"), "local edit").unwrap();

        let guard = WorkspaceGuard::enter(GitTracker::new(dir.path()).unwrap()).unwrap();
        // Someone drops the stash while the build runs
        Repository::open(dir.path()).unwrap().stash_drop(0).unwrap();

        let report = guard.exit();
        assert!(report.head_restored);
        assert!(!report.changes_reapplied);
        assert_eq!(report.warnings.len(), 1);
        assert!(matches!(report.warnings[0], WorkspaceError::Unstash(_)));
    }

    #[test]
    fn test_untracked_file_is_set_aside_and_brought_back() {
        let dir = tempdir().unwrap();
        repo_with_step(dir.path());
        fs::write(dir.path().join("scratch.md"), "mine").unwrap();

        let mut guard = WorkspaceGuard::enter(GitTracker::new(dir.path()).unwrap()).unwrap();
        assert!(guard.snapshot().unwrap().was_dirty);
        assert!(!dir.path().join("scratch.md").exists());
        guard.lease().checkout("step-1").unwrap();

        let report = guard.exit();
        assert!(report.is_clean(), "{:?}", report.warnings);
        assert_eq!(fs::read_to_string(dir.path().join("scratch.md")).unwrap(), "mine");
    }
}
