//! `stepsite.toml` configuration file.
//!
//! Every field has a default matching a Vite + npm project, so a repository
//! without a config file builds out of the box. Values are layered as
//! file → environment → CLI.
//!
//! # Configuration File Format
//!
//! ```toml
//! [project]
//! title = "GenAI Incremental Localization Experiment (Copilot)"
//!
//! [tags]
//! prefix = "step-"
//!
//! [build]
//! install_cmd = "npm install"
//! build_cmd = "npm run build"
//! config_file = "vite.config.js"
//! config_anchor = "export default defineConfig({"
//! base_path = "./"
//! raw_output_dir = "dist"
//! reinstall_after_restore = true
//!
//! [docs]
//! notes_dir = "docs/agent-notes"
//! prompts_dir = "docs/prompts"
//!
//! [output]
//! dir = "dist-pages"
//! pages_dir = "pages"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name looked up at the project root.
pub const CONFIG_FILE_NAME: &str = "stepsite.toml";

/// Project-level settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSection {
    /// Title appended to every shell wrapper page
    #[serde(default = "default_title")]
    pub title: String,
}

fn default_title() -> String {
    "GenAI Incremental Localization Experiment (Copilot)".to_string()
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            title: default_title(),
        }
    }
}

/// Which tags count as buildable revisions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagsSection {
    /// Tag prefix; the digits following it are the revision ordinal
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

fn default_prefix() -> String {
    "step-".to_string()
}

impl Default for TagsSection {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
        }
    }
}

/// How a single revision is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildSection {
    /// Shell command that materializes dependencies
    #[serde(default = "default_install_cmd")]
    pub install_cmd: String,
    /// Shell command that runs the revision's toolchain
    #[serde(default = "default_build_cmd")]
    pub build_cmd: String,
    /// Build configuration file that receives the base-path override.
    /// An empty string disables the override.
    #[serde(default = "default_config_file")]
    pub config_file: String,
    /// Text after which the override line is inserted
    #[serde(default = "default_config_anchor")]
    pub config_anchor: String,
    /// Relative base every artifact is built with
    #[serde(default = "default_base_path")]
    pub base_path: String,
    /// Directory the toolchain writes its output to
    #[serde(default = "default_raw_output_dir")]
    pub raw_output_dir: String,
    /// Re-run the install command once the original branch is restored
    #[serde(default = "default_reinstall_after_restore")]
    pub reinstall_after_restore: bool,
}

fn default_install_cmd() -> String {
    "npm install".to_string()
}

fn default_build_cmd() -> String {
    "npm run build".to_string()
}

fn default_config_file() -> String {
    "vite.config.js".to_string()
}

fn default_config_anchor() -> String {
    "export default defineConfig({".to_string()
}

fn default_base_path() -> String {
    "./".to_string()
}

fn default_raw_output_dir() -> String {
    "dist".to_string()
}

fn default_reinstall_after_restore() -> bool {
    true
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            install_cmd: default_install_cmd(),
            build_cmd: default_build_cmd(),
            config_file: default_config_file(),
            config_anchor: default_config_anchor(),
            base_path: default_base_path(),
            raw_output_dir: default_raw_output_dir(),
            reinstall_after_restore: default_reinstall_after_restore(),
        }
    }
}

/// Where per-revision documentation lives, relative to the work tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocsSection {
    #[serde(default = "default_notes_dir")]
    pub notes_dir: String,
    #[serde(default = "default_prompts_dir")]
    pub prompts_dir: String,
}

fn default_notes_dir() -> String {
    "docs/agent-notes".to_string()
}

fn default_prompts_dir() -> String {
    "docs/prompts".to_string()
}

impl Default for DocsSection {
    fn default() -> Self {
        Self {
            notes_dir: default_notes_dir(),
            prompts_dir: default_prompts_dir(),
        }
    }
}

/// Output tree location and the templates it is seeded from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSection {
    #[serde(default = "default_output_dir")]
    pub dir: String,
    /// Directory holding `index.html`, `about.html` and `shell/`
    #[serde(default = "default_pages_dir")]
    pub pages_dir: String,
}

fn default_output_dir() -> String {
    "dist-pages".to_string()
}

fn default_pages_dir() -> String {
    "pages".to_string()
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            pages_dir: default_pages_dir(),
        }
    }
}

/// The complete stepsite.toml structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteToml {
    #[serde(default)]
    pub project: ProjectSection,
    #[serde(default)]
    pub tags: TagsSection,
    #[serde(default)]
    pub build: BuildSection,
    #[serde(default)]
    pub docs: DocsSection,
    #[serde(default)]
    pub output: OutputSection,
}

impl SiteToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid stepsite.toml")
    }

    /// Load `stepsite.toml` from the project root, or defaults if it is absent.
    pub fn load_or_default(project_dir: &Path) -> Result<Self> {
        let path = Self::path_in(project_dir);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Location of the config file for a project.
    pub fn path_in(project_dir: &Path) -> PathBuf {
        project_dir.join(CONFIG_FILE_NAME)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize stepsite.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Install command, with `STEPSITE_INSTALL_CMD` taking precedence.
    pub fn install_cmd(&self) -> String {
        std::env::var("STEPSITE_INSTALL_CMD").unwrap_or_else(|_| self.build.install_cmd.clone())
    }

    /// Build command, with `STEPSITE_BUILD_CMD` taking precedence.
    pub fn build_cmd(&self) -> String {
        std::env::var("STEPSITE_BUILD_CMD").unwrap_or_else(|_| self.build.build_cmd.clone())
    }

    /// Output directory, with `STEPSITE_OUTPUT_DIR` taking precedence.
    pub fn output_dir(&self) -> String {
        std::env::var("STEPSITE_OUTPUT_DIR").unwrap_or_else(|_| self.output.dir.clone())
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.tags.prefix.is_empty() {
            warnings.push("Empty tag prefix: every tag would be treated as a revision".to_string());
        }
        if self.build.build_cmd.trim().is_empty() {
            warnings.push("Empty build_cmd: revisions would never produce output".to_string());
        }
        if !self.build.config_file.is_empty() && self.build.config_anchor.is_empty() {
            warnings.push(format!(
                "config_file '{}' is set but config_anchor is empty",
                self.build.config_file
            ));
        }
        if !is_relative_base(&self.build.base_path) {
            warnings.push(format!(
                "base_path '{}' is not relative: artifacts will not be portable",
                self.build.base_path
            ));
        }
        for (name, value) in [
            ("raw_output_dir", &self.build.raw_output_dir),
            ("output.dir", &self.output.dir),
            ("output.pages_dir", &self.output.pages_dir),
        ] {
            if value.is_empty() {
                warnings.push(format!("{} must not be empty", name));
            } else if Path::new(value).is_absolute() {
                warnings.push(format!(
                    "{} '{}' is absolute; it should be relative to the project root",
                    name, value
                ));
            }
        }

        warnings
    }
}

fn is_relative_base(base: &str) -> bool {
    base.starts_with("./") || base == "."
}
