use anyhow::{Context, Result};
use std::path::{Component, Path, PathBuf};

use crate::errors::UnsafeOutputDir;
use crate::site_config::SiteToml;

/// Runtime configuration for a stepsite run.
///
/// Bridges `stepsite.toml` (plus environment overrides) with the absolute
/// paths the orchestrator works on.
#[derive(Debug, Clone)]
pub struct Config {
    pub project_dir: PathBuf,
    pub output_dir: PathBuf,
    pub pages_dir: PathBuf,
    /// Where the toolchain leaves its raw output inside the work tree
    pub raw_output_dir: PathBuf,
    pub notes_dir: PathBuf,
    pub prompts_dir: PathBuf,
    /// Build configuration file receiving the base-path override, if any
    pub config_file: Option<PathBuf>,
    pub config_anchor: String,
    pub base_path: String,
    pub install_cmd: String,
    pub build_cmd: String,
    pub tag_prefix: String,
    pub site_title: String,
    pub reinstall_after_restore: bool,
    /// Skip wiping the output directory before building
    pub keep_output: bool,
    pub verbose: bool,
}

impl Config {
    /// Load `stepsite.toml` from `project_dir` and resolve every path.
    pub fn new(
        project_dir: PathBuf,
        output_dir: Option<PathBuf>,
        verbose: bool,
        keep_output: bool,
    ) -> Result<Self> {
        let project_dir = project_dir
            .canonicalize()
            .context("Failed to resolve project directory")?;
        let toml = SiteToml::load_or_default(&project_dir)?;
        let mut config = Self::from_site_toml(project_dir, &toml);
        if let Some(dir) = output_dir {
            config.output_dir = config.resolve(&dir);
        }
        config.verbose = verbose;
        config.keep_output = keep_output;
        config.check_output_paths()?;
        Ok(config)
    }

    /// Build a runtime config from already-loaded settings.
    ///
    /// `project_dir` must already be absolute.
    pub fn from_site_toml(project_dir: PathBuf, toml: &SiteToml) -> Self {
        let join = |p: &str| project_dir.join(p);
        let config_file = if toml.build.config_file.is_empty() {
            None
        } else {
            Some(join(&toml.build.config_file))
        };

        Self {
            output_dir: join(&toml.output_dir()),
            pages_dir: join(&toml.output.pages_dir),
            raw_output_dir: join(&toml.build.raw_output_dir),
            notes_dir: join(&toml.docs.notes_dir),
            prompts_dir: join(&toml.docs.prompts_dir),
            config_file,
            config_anchor: toml.build.config_anchor.clone(),
            base_path: toml.build.base_path.clone(),
            install_cmd: toml.install_cmd(),
            build_cmd: toml.build_cmd(),
            tag_prefix: toml.tags.prefix.clone(),
            site_title: toml.project.title.clone(),
            reinstall_after_restore: toml.build.reinstall_after_restore,
            keep_output: false,
            verbose: false,
            project_dir,
        }
    }

    /// Glob passed to git when listing revision tags.
    pub fn tag_pattern(&self) -> String {
        format!("{}*", self.tag_prefix)
    }

    /// Both the output directory and the raw build directory get wiped
    /// during a run. Reject either one when removing it would also remove
    /// the project, its repository, the page templates or the documentation
    /// sources, or when one of them would remove the other.
    pub fn check_output_paths(&self) -> Result<(), UnsafeOutputDir> {
        let project = normalize(&self.project_dir);
        let protected = [
            (normalize(&self.pages_dir), "contains the page templates"),
            (normalize(&self.notes_dir), "contains the notes directory"),
            (normalize(&self.prompts_dir), "contains the prompts directory"),
        ];
        let output = normalize(&self.output_dir);
        let raw = normalize(&self.raw_output_dir);

        for (dir, role) in [(&output, "output directory"), (&raw, "raw build directory")] {
            let unsafe_dir = |reason| UnsafeOutputDir {
                path: dir.clone(),
                role,
                reason,
            };

            if project.starts_with(dir) {
                return Err(unsafe_dir("contains the project directory"));
            }
            if dir.starts_with(project.join(".git")) || dir.join(".git").exists() {
                return Err(unsafe_dir("belongs to a git repository's metadata"));
            }
            if let Some((_, reason)) = protected.iter().find(|(p, _)| p.starts_with(dir)) {
                return Err(unsafe_dir(*reason));
            }
        }

        if output.starts_with(&raw) || raw.starts_with(&output) {
            return Err(UnsafeOutputDir {
                path: output,
                role: "output directory",
                reason: "overlaps the raw build directory",
            });
        }
        Ok(())
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_dir.join(path)
        }
    }
}

/// Resolve symlinks where the path exists, otherwise fold `.` and `..`
/// lexically.
fn normalize(path: &Path) -> PathBuf {
    if let Ok(real) = path.canonicalize() {
        return real;
    }
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}
