use crate::builder::RevisionBuilder;
use crate::config::Config;
use crate::errors::{BuildError, BuildStep, OrchestratorError};
use crate::manifest::{MANIFEST_FILE, Manifest, ManifestEntry, SiteTemplates, assemble};
use crate::orchestrator::interrupt::Interrupt;
use crate::orchestrator::state::RunState;
use crate::revision::Revision;
use crate::tracker::{GitTracker, WorkspaceGuard};
use crate::ui::BuildUI;
use crate::util::remove_dir_if_exists;
use std::fs;
use std::path::PathBuf;
use tokio::sync::watch;

/// Outcome of a successful run.
#[derive(Debug)]
pub struct RunReport {
    pub entries: Vec<ManifestEntry>,
    pub output_dir: PathBuf,
    /// Restore and reinstall problems that did not fail the run
    pub warnings: Vec<String>,
}

impl RunReport {
    pub fn built(&self) -> usize {
        self.entries.len()
    }
}

/// Drives one full rebuild of every discovered revision.
pub struct Orchestrator {
    config: Config,
    ui: BuildUI,
    /// Replaces Ctrl-C as the interrupt source when set
    interrupt: Option<watch::Receiver<bool>>,
}

impl Orchestrator {
    pub fn new(config: Config) -> Self {
        let ui = BuildUI::new(0, config.verbose);
        Self::with_ui(config, ui)
    }

    pub fn with_ui(config: Config, ui: BuildUI) -> Self {
        Self {
            config,
            ui,
            interrupt: None,
        }
    }

    /// Interrupt the run when `raised` turns true instead of on Ctrl-C.
    pub fn with_interrupt(mut self, raised: watch::Receiver<bool>) -> Self {
        self.interrupt = Some(raised);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn ui(&self) -> &BuildUI {
        &self.ui
    }

    pub async fn run(&self) -> Result<RunReport, OrchestratorError> {
        let interrupt = match &self.interrupt {
            Some(raised) => Interrupt::from_receiver(raised.clone()),
            None => Interrupt::ctrl_c(),
        };
        // Give the signal listener a chance to register before any work starts
        tokio::task::yield_now().await;

        let mut state = RunState::Idle;

        state.advance(RunState::Discovering);
        let prepared = self.prepare().and_then(|prepared| {
            check_interrupt(&interrupt, "discovering revisions")?;
            Ok(prepared)
        });
        let (tracker, revisions, templates) = match prepared {
            Ok(prepared) => prepared,
            Err(e) => {
                state.advance(RunState::Aborted);
                return Err(e);
            }
        };

        let mut guard = match WorkspaceGuard::enter(tracker) {
            Ok(guard) => guard,
            Err(e) => {
                state.advance(RunState::Aborted);
                return Err(e.into());
            }
        };
        state.advance(RunState::GuardEntered);

        let outcome = self
            .try_build_all(&mut guard, &revisions, &interrupt, &mut state)
            .await;
        if outcome.is_err() {
            state.advance(RunState::Aborted);
        }

        let mut warnings = self.finalize(guard);
        state.advance(RunState::GuardExited);
        let manifest = outcome?;

        if let Err(e) = self.reinstall(&interrupt, &mut warnings).await {
            state.advance(RunState::Aborted);
            return Err(e);
        }

        state.advance(RunState::Assembling);
        let assembled = assemble(&self.config.output_dir, &manifest, &templates)
            .and_then(|()| check_interrupt(&interrupt, "assembling the site"));
        if let Err(e) = assembled {
            state.advance(RunState::Aborted);
            return Err(e);
        }
        state.advance(RunState::Done);

        Ok(RunReport {
            entries: manifest.entries().to_vec(),
            output_dir: self.config.output_dir.clone(),
            warnings,
        })
    }

    /// Everything that happens before the work tree is touched: discovery,
    /// template capture and output directory cleanup.
    fn prepare(&self) -> Result<(GitTracker, Vec<Revision>, SiteTemplates), OrchestratorError> {
        let tracker = GitTracker::new(&self.config.project_dir)?;
        let revisions = tracker.discover(&self.config.tag_pattern(), &self.config.tag_prefix)?;
        let tags: Vec<&str> = revisions.iter().map(|r| r.tag.as_str()).collect();
        tracing::info!("Found {} steps: {}", revisions.len(), tags.join(", "));
        self.ui.set_total(revisions.len() as u64);

        let templates = SiteTemplates::capture(&self.config.pages_dir)?;

        self.config.check_output_paths()?;
        let output_dir = &self.config.output_dir;
        if !self.config.keep_output {
            tracing::info!("Cleaning {}", output_dir.display());
            remove_dir_if_exists(output_dir).map_err(|source| OrchestratorError::Output {
                path: output_dir.clone(),
                source,
            })?;
        }
        fs::create_dir_all(output_dir).map_err(|source| OrchestratorError::Output {
            path: output_dir.clone(),
            source,
        })?;

        if output_dir.starts_with(tracker.workdir())
            && !tracker.is_ignored(&output_dir.join(MANIFEST_FILE))
        {
            self.ui.warn(&format!(
                "{} is inside the work tree but not ignored by git; add it to .gitignore",
                output_dir.display()
            ));
        }

        Ok((tracker, revisions, templates))
    }

    /// Build revisions in order, stopping at the first failure or interrupt.
    async fn try_build_all(
        &self,
        guard: &mut WorkspaceGuard,
        revisions: &[Revision],
        interrupt: &Interrupt,
        state: &mut RunState,
    ) -> Result<Manifest, OrchestratorError> {
        let builder = RevisionBuilder::new(&self.config, &self.ui);
        let mut manifest = Manifest::new();

        for (i, revision) in revisions.iter().enumerate() {
            state.advance(RunState::Building(i));
            self.ui
                .start_revision(&revision.tag, &revision.description());

            let result = if interrupt.is_raised() {
                Err(BuildError::Interrupted {
                    tag: revision.tag.clone(),
                    step: BuildStep::Checkout,
                })
            } else {
                let mut lease = guard.lease();
                tokio::select! {
                    result = builder.build(&mut lease, revision) => result,
                    () = interrupt.raised() => Err(BuildError::Interrupted {
                        tag: revision.tag.clone(),
                        step: builder.current_step(),
                    }),
                }
            };

            match result {
                Ok(artifact) => {
                    self.ui.revision_complete(&revision.tag);
                    manifest.push(&artifact);
                }
                Err(e) => {
                    self.ui.revision_failed(&revision.tag, &e.to_string());
                    return Err(e.into());
                }
            }
        }

        Ok(manifest)
    }

    /// Leave the guard and surface restore problems as warnings.
    fn finalize(&self, guard: WorkspaceGuard) -> Vec<String> {
        let report = guard.exit();
        let mut warnings: Vec<String> = report
            .warnings
            .iter()
            .map(|warning| {
                let msg = warning.to_string();
                self.ui.warn(&msg);
                msg
            })
            .collect();

        if !report.head_restored {
            let msg = "HEAD was left on a step tag; check out your branch, then \
                       `git stash pop` if `git stash list` shows a stepsite entry"
                .to_string();
            self.ui.warn(&msg);
            warnings.push(msg);
        }
        warnings
    }

    /// Re-run the install command on the restored branch when configured.
    /// A failure is a warning; an interrupt, including one that arrived
    /// while the work tree was being restored, aborts the run.
    async fn reinstall(
        &self,
        interrupt: &Interrupt,
        warnings: &mut Vec<String>,
    ) -> Result<(), OrchestratorError> {
        check_interrupt(interrupt, "restoring the work tree")?;
        if !self.config.reinstall_after_restore {
            return Ok(());
        }

        self.ui.log_step("reinstalling dependencies for the current branch");
        let builder = RevisionBuilder::new(&self.config, &self.ui);
        let result = tokio::select! {
            result = builder.install(&self.config.project_dir) => result,
            () = interrupt.raised() => {
                return Err(OrchestratorError::Interrupted {
                    phase: "reinstalling dependencies",
                });
            }
        };

        if let Err(status) = result {
            let msg = format!(
                "Dependency reinstall `{}` {}",
                self.config.install_cmd, status
            );
            self.ui.warn(&msg);
            warnings.push(msg);
        }
        Ok(())
    }
}

fn check_interrupt(interrupt: &Interrupt, phase: &'static str) -> Result<(), OrchestratorError> {
    if interrupt.is_raised() {
        return Err(OrchestratorError::Interrupted { phase });
    }
    Ok(())
}
