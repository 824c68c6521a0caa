//! Typed error hierarchy for the stepsite orchestrator.
//!
//! One enum per subsystem:
//! - `DiscoveryError`: tag enumeration, raised before any workspace mutation
//! - `WorkspaceError`: stash / restore of the caller's working tree
//! - `BuildError`: per-revision build failures, each naming the tag and step
//! - `UnsafeOutputDir`: a directory the run would wipe along with the project
//! - `OrchestratorError`: everything a `stepsite build` run can abort with

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from revision discovery.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("No {pattern} tags found")]
    NoRevisionsFound { pattern: String },

    #[error("Failed to enumerate tags: {0}")]
    Git(#[from] git2::Error),
}

/// Errors from capturing or restoring the caller's working tree.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("Failed to open git repository at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: git2::Error,
    },

    #[error("Failed to read working tree status: {0}")]
    Status(#[source] git2::Error),

    #[error("Failed to stash local changes: {0}")]
    Stash(#[source] git2::Error),

    #[error("Failed to restore original HEAD {head}: {source}")]
    Restore {
        head: String,
        #[source]
        source: git2::Error,
    },

    #[error("Failed to re-apply stashed changes (they remain in `git stash list`): {0}")]
    Unstash(#[source] git2::Error),
}

/// The step of a revision build that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStep {
    Checkout,
    InstallDependencies,
    Build,
    Relocate,
    RewriteEntry,
    RenderDocs,
}

impl fmt::Display for BuildStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildStep::Checkout => write!(f, "checkout"),
            BuildStep::InstallDependencies => write!(f, "dependency install"),
            BuildStep::Build => write!(f, "build"),
            BuildStep::Relocate => write!(f, "artifact relocation"),
            BuildStep::RewriteEntry => write!(f, "entry-point rewrite"),
            BuildStep::RenderDocs => write!(f, "documentation rendering"),
        }
    }
}

/// Errors from building a single revision. All of them abort the run.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Failed to check out {tag}: {source}")]
    CheckoutFailed {
        tag: String,
        #[source]
        source: git2::Error,
    },

    #[error("Dependency install for {tag} failed: `{command}` {status}")]
    DependencyInstallFailed {
        tag: String,
        command: String,
        status: String,
    },

    #[error("Build for {tag} failed: `{command}` {status}")]
    BuildInvocationFailed {
        tag: String,
        command: String,
        status: String,
    },

    #[error("Build for {tag} produced no {path}")]
    ArtifactMissing {
        tag: String,
        step: BuildStep,
        path: PathBuf,
    },

    #[error("I/O error while building {tag} ({step}) at {path}: {source}")]
    Io {
        tag: String,
        step: BuildStep,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Interrupted while building {tag} ({step})")]
    Interrupted { tag: String, step: BuildStep },
}

impl BuildError {
    /// The revision tag the failure belongs to.
    pub fn tag(&self) -> &str {
        match self {
            BuildError::CheckoutFailed { tag, .. }
            | BuildError::DependencyInstallFailed { tag, .. }
            | BuildError::BuildInvocationFailed { tag, .. }
            | BuildError::ArtifactMissing { tag, .. }
            | BuildError::Io { tag, .. }
            | BuildError::Interrupted { tag, .. } => tag,
        }
    }

    /// The build step that was running when the failure happened.
    pub fn step(&self) -> BuildStep {
        match self {
            BuildError::CheckoutFailed { .. } => BuildStep::Checkout,
            BuildError::DependencyInstallFailed { .. } => BuildStep::InstallDependencies,
            BuildError::BuildInvocationFailed { .. } => BuildStep::Build,
            BuildError::ArtifactMissing { step, .. }
            | BuildError::Io { step, .. }
            | BuildError::Interrupted { step, .. } => *step,
        }
    }
}

/// A documentation source file that does not exist for a revision.
///
/// Never surfaces to callers: the renderer substitutes placeholder content.
#[derive(Debug, Error)]
#[error("Documentation not found at {path}")]
pub struct DocumentationMissing {
    pub path: PathBuf,
}

/// An output or raw build directory that would take the project with it
/// when cleaned.
#[derive(Debug, Error)]
#[error("Refusing to use {} as {role}: it {reason}", path.display())]
pub struct UnsafeOutputDir {
    pub path: PathBuf,
    /// Which setting the directory came from
    pub role: &'static str,
    pub reason: &'static str,
}

/// Errors that abort a whole `stepsite build` run.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    #[error("{tag} failed at {step}: {err}", tag = .0.tag(), step = .0.step(), err = .0)]
    Build(#[from] BuildError),

    #[error("Failed to read template {path}: {source}")]
    Template {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write output {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize steps manifest: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error(transparent)]
    UnsafeOutput(#[from] UnsafeOutputDir),

    /// Ctrl-C outside a revision build, e.g. during the reinstall
    #[error("Interrupted while {phase}")]
    Interrupted { phase: &'static str },
}
