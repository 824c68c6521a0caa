//! Revision builder: turns one checked-out revision into its slot in the
//! output tree.
//!
//! Steps, each a fatal failure point:
//! 1. checkout the tag
//! 2. install dependencies
//! 3. build with the base-path override applied
//! 4. move the raw output into `<output>/<tag>/`
//! 5. rename the entry document to `app.html` and write the shell wrapper
//! 6. render notes and prompt

pub mod artifact;
pub mod config_override;

pub use artifact::{APP_DOCUMENT, BuildArtifact, ENTRY_DOCUMENT, shell_wrapper};
pub use config_override::ConfigOverride;

use crate::config::Config;
use crate::errors::{BuildError, BuildStep};
use crate::render::{DocKind, DocSource, MetadataRenderer};
use crate::revision::Revision;
use crate::tracker::WorktreeLease;
use crate::ui::BuildUI;
use crate::util::{move_dir, remove_dir_if_exists};
use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Lines of stderr kept when a subprocess fails.
const STDERR_TAIL_LINES: usize = 20;

pub struct RevisionBuilder<'a> {
    config: &'a Config,
    renderer: MetadataRenderer,
    ui: &'a BuildUI,
    /// Step the current or last build reached
    step: Cell<BuildStep>,
}

impl<'a> RevisionBuilder<'a> {
    pub fn new(config: &'a Config, ui: &'a BuildUI) -> Self {
        Self {
            config,
            renderer: MetadataRenderer::new(&config.notes_dir, &config.prompts_dir),
            ui,
            step: Cell::new(BuildStep::Checkout),
        }
    }

    /// The step the running build is in, or the one the last build stopped at.
    pub fn current_step(&self) -> BuildStep {
        self.step.get()
    }

    fn enter(&self, step: BuildStep) {
        tracing::trace!(%step, "build step");
        self.step.set(step);
    }

    /// Build one revision. Requires the work tree lease so that only one
    /// build can mutate the checkout at a time.
    pub async fn build(
        &self,
        lease: &mut WorktreeLease<'_>,
        revision: &Revision,
    ) -> Result<BuildArtifact, BuildError> {
        let tag = revision.tag.as_str();

        self.enter(BuildStep::Checkout);
        self.ui.log_step(&format!("checking out {}", tag));
        lease
            .checkout(tag)
            .map_err(|source| BuildError::CheckoutFailed {
                tag: tag.to_string(),
                source,
            })?;

        self.enter(BuildStep::InstallDependencies);
        self.ui.log_step("installing dependencies");
        self.run_shell(&self.config.install_cmd, lease.workdir())
            .await
            .map_err(|status| BuildError::DependencyInstallFailed {
                tag: tag.to_string(),
                command: self.config.install_cmd.clone(),
                status,
            })?;

        self.enter(BuildStep::Build);
        self.invoke_build(lease.workdir(), tag).await?;

        self.enter(BuildStep::Relocate);
        let root = self.relocate(tag)?;
        self.enter(BuildStep::RewriteEntry);
        self.rewrite_entry(&root, tag)?;

        self.enter(BuildStep::RenderDocs);
        self.ui.log_step("rendering notes and prompt");
        let notes = self.write_document(&root, revision, DocKind::Notes)?;
        let prompt = self.write_document(&root, revision, DocKind::Prompt)?;

        Ok(BuildArtifact {
            revision: revision.clone(),
            root,
            notes,
            prompt,
        })
    }

    /// Re-run the install command in `workdir`, outside any revision build.
    pub async fn install(&self, workdir: &Path) -> Result<(), String> {
        self.run_shell(&self.config.install_cmd, workdir).await
    }

    async fn invoke_build(&self, workdir: &Path, tag: &str) -> Result<(), BuildError> {
        let raw = &self.config.raw_output_dir;
        remove_dir_if_exists(raw).map_err(|source| io_error(tag, BuildStep::Build, raw, source))?;

        let _override = match &self.config.config_file {
            Some(path) => {
                ConfigOverride::apply(path, &self.config.config_anchor, &self.config.base_path)
                    .map_err(|source| io_error(tag, BuildStep::Build, path, source))?
            }
            None => None,
        };

        self.ui
            .log_step(&format!("building with base path {}", self.config.base_path));
        self.run_shell(&self.config.build_cmd, workdir)
            .await
            .map_err(|status| BuildError::BuildInvocationFailed {
                tag: tag.to_string(),
                command: self.config.build_cmd.clone(),
                status,
            })
    }

    fn relocate(&self, tag: &str) -> Result<PathBuf, BuildError> {
        let raw = &self.config.raw_output_dir;
        if !raw.is_dir() {
            return Err(BuildError::ArtifactMissing {
                tag: tag.to_string(),
                step: BuildStep::Relocate,
                path: raw.clone(),
            });
        }

        let root = self.config.output_dir.join(tag);
        self.ui
            .log_step(&format!("moving build output to {}", root.display()));
        remove_dir_if_exists(&root)
            .and_then(|()| move_dir(raw, &root))
            .map_err(|source| io_error(tag, BuildStep::Relocate, &root, source))?;
        Ok(root)
    }

    fn rewrite_entry(&self, root: &Path, tag: &str) -> Result<(), BuildError> {
        let entry = root.join(ENTRY_DOCUMENT);
        if !entry.is_file() {
            return Err(BuildError::ArtifactMissing {
                tag: tag.to_string(),
                step: BuildStep::RewriteEntry,
                path: entry,
            });
        }

        let app = root.join(APP_DOCUMENT);
        std::fs::rename(&entry, &app)
            .map_err(|source| io_error(tag, BuildStep::RewriteEntry, &app, source))?;
        std::fs::write(&entry, shell_wrapper(tag, &self.config.site_title))
            .map_err(|source| io_error(tag, BuildStep::RewriteEntry, &entry, source))?;
        tracing::debug!(tag, "moved entry document to {}", APP_DOCUMENT);
        Ok(())
    }

    fn write_document(
        &self,
        root: &Path,
        revision: &Revision,
        kind: DocKind,
    ) -> Result<DocSource, BuildError> {
        let doc = self.renderer.render(revision, kind);
        if doc.is_placeholder() {
            let msg = match doc.kind {
                DocKind::Notes => format!("Agent notes not found for {}", revision.tag),
                DocKind::Prompt => format!("Prompt not found for {} (this is okay)", revision.tag),
            };
            tracing::info!("{}", msg);
        }

        let path = root.join(doc.kind.output_file());
        std::fs::write(&path, &doc.html)
            .map_err(|source| io_error(&revision.tag, BuildStep::RenderDocs, &path, source))?;
        Ok(doc.source)
    }

    /// Run `command` through `sh -c` in `workdir` and wait for it.
    ///
    /// The error is a short description of how the command failed.
    async fn run_shell(&self, command: &str, workdir: &Path) -> Result<(), String> {
        tracing::debug!(command, dir = %workdir.display(), "running");
        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| format!("could not be spawned: {}", e))?;

        self.ui.show_output(&String::from_utf8_lossy(&output.stdout));

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let lines: Vec<&str> = stderr.lines().collect();
        let tail = &lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..];
        for line in tail {
            self.ui.print_line(format!("      {}", line));
        }

        Err(match output.status.code() {
            Some(code) => format!("exited with code {}", code),
            None => "was terminated by a signal".to_string(),
        })
    }
}

fn io_error(tag: &str, step: BuildStep, path: &Path, source: std::io::Error) -> BuildError {
    BuildError::Io {
        tag: tag.to_string(),
        step,
        path: path.to_path_buf(),
        source,
    }
}
