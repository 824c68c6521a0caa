use crate::errors::{DiscoveryError, WorkspaceError};
use crate::revision::{Revision, subject_line};
use git2::build::CheckoutBuilder;
use git2::{Oid, Repository, Signature, StashFlags, Status, StatusOptions};
use std::path::{Path, PathBuf};

/// Message recorded on the stash created for a dirty work tree.
pub const STASH_MESSAGE: &str = "stepsite temporary stash";

/// Where HEAD pointed before the orchestrator touched anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadRef {
    /// Full reference name, e.g. `refs/heads/main`
    Branch(String),
    Detached(Oid),
}

impl std::fmt::Display for HeadRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HeadRef::Branch(name) => {
                write!(f, "{}", name.strip_prefix("refs/heads/").unwrap_or(name))
            }
            HeadRef::Detached(oid) => write!(f, "{}", oid),
        }
    }
}

/// Thin wrapper over the git repository the site is built from.
pub struct GitTracker {
    repo: Repository,
    workdir: PathBuf,
}

impl GitTracker {
    pub fn new(project_dir: &Path) -> Result<Self, WorkspaceError> {
        let repo = Repository::open(project_dir).map_err(|source| WorkspaceError::Open {
            path: project_dir.to_path_buf(),
            source,
        })?;
        let workdir = repo
            .workdir()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| project_dir.to_path_buf());
        Ok(Self { repo, workdir })
    }

    /// Root of the single work tree every revision is checked out into.
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// List every tag matching `pattern` (a git glob such as `step-*`),
    /// ordered by the ordinal embedded after `prefix`.
    pub fn discover(&self, pattern: &str, prefix: &str) -> Result<Vec<Revision>, DiscoveryError> {
        let names = self.repo.tag_names(Some(pattern))?;

        let mut revisions: Vec<Revision> = names
            .iter()
            .flatten()
            .filter(|tag| {
                // The tag names its output slot, which must stay one level deep
                let flat = !tag.contains('/');
                if !flat {
                    tracing::warn!("Skipping tag {}: names containing '/' are not supported", tag);
                }
                flat
            })
            .map(|tag| Revision::from_tag(tag, prefix, self.annotation(tag)))
            .collect();

        if revisions.is_empty() {
            return Err(DiscoveryError::NoRevisionsFound {
                pattern: pattern.to_string(),
            });
        }

        revisions.sort();
        Ok(revisions)
    }

    /// Subject of an annotated tag's message, or of the tagged commit for
    /// lightweight tags. Empty when neither resolves.
    fn annotation(&self, tag: &str) -> String {
        let Ok(object) = self.repo.revparse_single(&format!("refs/tags/{}", tag)) else {
            return String::new();
        };

        if let Some(annotated) = object.as_tag() {
            return annotated.message().map(subject_line).unwrap_or_default();
        }

        object
            .peel_to_commit()
            .ok()
            .and_then(|commit| commit.message().map(subject_line))
            .unwrap_or_default()
    }

    pub fn head_ref(&self) -> Result<HeadRef, WorkspaceError> {
        let head = self.repo.head().map_err(WorkspaceError::Status)?;
        if head.is_branch()
            && let Some(name) = head.name()
        {
            return Ok(HeadRef::Branch(name.to_string()));
        }
        let oid = head
            .target()
            .ok_or_else(|| WorkspaceError::Status(git2::Error::from_str("HEAD has no target")))?;
        Ok(HeadRef::Detached(oid))
    }

    /// Whether the work tree holds anything a checkout could disturb:
    /// staged or unstaged modifications, or untracked files git does not
    /// ignore.
    pub fn is_dirty(&self) -> Result<bool, WorkspaceError> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(true).include_ignored(false);
        let statuses = self
            .repo
            .statuses(Some(&mut opts))
            .map_err(WorkspaceError::Status)?;

        Ok(statuses
            .iter()
            .any(|entry| !entry.status().intersects(Status::IGNORED)))
    }

    /// Whether git ignores `path`, which may be absolute.
    pub fn is_ignored(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.workdir).unwrap_or(path);
        self.repo.is_path_ignored(relative).unwrap_or(false)
    }

    /// Set local modifications and untracked files aside. Returns the stash
    /// commit id.
    pub fn stash(&mut self) -> Result<Oid, WorkspaceError> {
        let sig = self
            .repo
            .signature()
            .or_else(|_| Signature::now("stepsite", "stepsite@localhost"))
            .map_err(WorkspaceError::Stash)?;
        self.repo
            .stash_save(&sig, STASH_MESSAGE, Some(StashFlags::INCLUDE_UNTRACKED))
            .map_err(WorkspaceError::Stash)
    }

    /// Re-apply and drop the stash created by [`Self::stash`].
    pub fn unstash(&mut self, stash_id: Oid) -> Result<(), WorkspaceError> {
        let mut position = None;
        self.repo
            .stash_foreach(|index, _message, oid| {
                if *oid == stash_id {
                    position = Some(index);
                    false
                } else {
                    true
                }
            })
            .map_err(WorkspaceError::Unstash)?;

        let index = position.ok_or_else(|| {
            WorkspaceError::Unstash(git2::Error::from_str(&format!(
                "stash {} no longer exists",
                stash_id
            )))
        })?;
        self.repo
            .stash_pop(index, None)
            .map_err(WorkspaceError::Unstash)
    }

    /// Move the work tree to the commit a tag points at and detach HEAD there.
    pub fn checkout_tag(&self, tag: &str) -> Result<(), git2::Error> {
        let commit = self
            .repo
            .revparse_single(&format!("refs/tags/{}", tag))?
            .peel_to_commit()?;
        self.checkout_commit(&commit)?;
        self.repo.set_head_detached(commit.id())
    }

    /// Put HEAD and the work tree back where `head` says.
    pub fn restore_head(&self, head: &HeadRef) -> Result<(), git2::Error> {
        match head {
            HeadRef::Branch(name) => {
                let commit = self.repo.find_reference(name)?.peel_to_commit()?;
                self.checkout_commit(&commit)?;
                self.repo.set_head(name)
            }
            HeadRef::Detached(oid) => {
                let commit = self.repo.find_commit(*oid)?;
                self.checkout_commit(&commit)?;
                self.repo.set_head_detached(*oid)
            }
        }
    }

    // Edits the install and build commands made to tracked files are
    // discarded first. The move itself is a safe checkout: an untracked or
    // ignored file in the way fails it instead of being overwritten.
    // Checkout happens before HEAD moves so that files tracked only by the
    // outgoing commit are removed from the work tree.
    fn checkout_commit(&self, commit: &git2::Commit<'_>) -> Result<(), git2::Error> {
        let mut reset = CheckoutBuilder::new();
        reset.force();
        self.repo.checkout_head(Some(&mut reset))?;

        let mut opts = CheckoutBuilder::new();
        opts.safe().overwrite_ignored(false);
        self.repo.checkout_tree(commit.as_object(), Some(&mut opts))
    }
}
