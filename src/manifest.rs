//! Manifest assembler: `steps.json` plus the shared top-level pages.
//!
//! Templates are captured into memory before the first checkout, because
//! checking out historical revisions rewrites `pages/` on disk while the
//! build loop runs.

use crate::builder::{APP_DOCUMENT, BuildArtifact};
use crate::errors::OrchestratorError;
use crate::render::DocKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const MANIFEST_FILE: &str = "steps.json";

/// One revision as the navigation shell sees it. All paths are relative to
/// the output root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub tag: String,
    pub step_number: u64,
    pub description: String,
    pub path: String,
    pub app_path: String,
    pub notes_path: String,
    pub prompt_path: String,
}

impl ManifestEntry {
    pub fn from_artifact(artifact: &BuildArtifact) -> Self {
        let tag = &artifact.revision.tag;
        Self {
            tag: tag.clone(),
            step_number: artifact.revision.ordinal,
            description: artifact.revision.description(),
            path: format!("{}/", tag),
            app_path: format!("{}/{}", tag, APP_DOCUMENT),
            notes_path: format!("{}/{}", tag, DocKind::Notes.output_file()),
            prompt_path: format!("{}/{}", tag, DocKind::Prompt.output_file()),
        }
    }

    /// The four paths this entry promises exist in the output tree.
    pub fn referenced_paths(&self) -> [&str; 4] {
        [
            &self.path,
            &self.app_path,
            &self.notes_path,
            &self.prompt_path,
        ]
    }
}

/// Append-only, ordered list of built revisions.
#[derive(Debug, Default)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, artifact: &BuildArtifact) {
        self.entries.push(ManifestEntry::from_artifact(artifact));
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pretty JSON with two-space indentation and a trailing newline.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let mut json = serde_json::to_string_pretty(&self.entries)?;
        json.push('\n');
        Ok(json)
    }
}

/// Landing page, about page and shell assets as they were in the invoking
/// branch's work tree.
#[derive(Debug, Clone)]
pub struct SiteTemplates {
    pub index: String,
    pub about: String,
    /// Files under `pages/shell/`, keyed by path relative to that directory
    pub shell_assets: Vec<(PathBuf, Vec<u8>)>,
}

impl SiteTemplates {
    /// Read `index.html`, `about.html` and `shell/` from `pages_dir`.
    ///
    /// A missing `shell/` directory yields no assets.
    pub fn capture(pages_dir: &Path) -> Result<Self, OrchestratorError> {
        let read = |name: &str| {
            let path = pages_dir.join(name);
            fs::read_to_string(&path).map_err(|source| OrchestratorError::Template { path, source })
        };
        let index = read("index.html")?;
        let about = read("about.html")?;

        let shell_dir = pages_dir.join("shell");
        let mut shell_assets = Vec::new();
        if shell_dir.is_dir() {
            for entry in WalkDir::new(&shell_dir).min_depth(1).sort_by_file_name() {
                let entry = entry.map_err(|e| OrchestratorError::Template {
                    path: shell_dir.clone(),
                    source: std::io::Error::other(e),
                })?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let content =
                    fs::read(entry.path()).map_err(|source| OrchestratorError::Template {
                        path: entry.path().to_path_buf(),
                        source,
                    })?;
                let relative = entry
                    .path()
                    .strip_prefix(&shell_dir)
                    .unwrap_or(entry.path())
                    .to_path_buf();
                shell_assets.push((relative, content));
            }
        }

        Ok(Self {
            index,
            about,
            shell_assets,
        })
    }
}

/// Write the manifest, landing page, about page, shell assets and the
/// `.nojekyll` marker into `output_dir`.
pub fn assemble(
    output_dir: &Path,
    manifest: &Manifest,
    templates: &SiteTemplates,
) -> Result<(), OrchestratorError> {
    let write = |relative: &str, content: &[u8]| write_file(&output_dir.join(relative), content);

    tracing::info!("Generating {}", MANIFEST_FILE);
    write(MANIFEST_FILE, manifest.to_json()?.as_bytes())?;

    tracing::info!("Generating landing and about pages");
    write("index.html", templates.index.as_bytes())?;
    write("about/index.html", templates.about.as_bytes())?;

    let shell = output_dir.join("shell");
    for (relative, content) in &templates.shell_assets {
        write_file(&shell.join(relative), content.as_slice())?;
    }
    // Wrapper pages link into shell/ even when it has no assets
    write_dir(&shell)?;

    write(".nojekyll", &[])?;
    Ok(())
}

fn write_file(path: &Path, content: &[u8]) -> Result<(), OrchestratorError> {
    if let Some(parent) = path.parent() {
        write_dir(parent)?;
    }
    fs::write(path, content).map_err(|source| OrchestratorError::Output {
        path: path.to_path_buf(),
        source,
    })
}

fn write_dir(path: &Path) -> Result<(), OrchestratorError> {
    fs::create_dir_all(path).map_err(|source| OrchestratorError::Output {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::DocSource;
    use crate::revision::Revision;
    use tempfile::tempdir;

    fn artifact(tag: &str, annotation: &str) -> BuildArtifact {
        BuildArtifact {
            revision: Revision::from_tag(tag, "step-", annotation),
            root: PathBuf::from(format!("/out/{}", tag)),
            notes: DocSource::Placeholder,
            prompt: DocSource::Placeholder,
        }
    }

    fn templates(root: &Path) -> SiteTemplates {
        let pages = root.join("pages");
        fs::create_dir_all(pages.join("shell/icons")).unwrap();
        fs::write(pages.join("index.html"), "<h1>Landing</h1>").unwrap();
        fs::write(pages.join("about.html"), "<h1>About</h1>").unwrap();
        fs::write(pages.join("shell/shell.js"), "init()").unwrap();
        fs::write(pages.join("shell/shell.css"), "body{}").unwrap();
        fs::write(pages.join("shell/icons/menu.svg"), "<svg/>").unwrap();
        SiteTemplates::capture(&pages).unwrap()
    }

    #[test]
    fn test_entry_fields_for_annotated_step() {
        let entry = ManifestEntry::from_artifact(&artifact("step-1", "Initial feed"));
        assert_eq!(entry.tag, "step-1");
        assert_eq!(entry.step_number, 1);
        assert_eq!(entry.description, "Step 01: Initial feed");
        assert_eq!(entry.path, "step-1/");
        assert_eq!(entry.app_path, "step-1/app.html");
        assert_eq!(entry.notes_path, "step-1/notes.html");
        assert_eq!(entry.prompt_path, "step-1/prompt.html");
    }

    #[test]
    fn test_entry_description_without_annotation() {
        let entry = ManifestEntry::from_artifact(&artifact("step-3", ""));
        assert_eq!(entry.description, "Step 03");
    }

    #[test]
    fn test_manifest_json_uses_camel_case_keys() {
        let mut manifest = Manifest::new();
        manifest.push(&artifact("step-1", "Initial feed"));
        let json = manifest.to_json().unwrap();
        assert!(json.contains("\"stepNumber\": 1"));
        assert!(json.contains("\"appPath\": \"step-1/app.html\""));
        assert!(json.contains("\"notesPath\""));
        assert!(json.contains("\"promptPath\""));
        assert!(json.ends_with("]\n"));

        let parsed: Vec<ManifestEntry> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, manifest.entries());
    }

    #[test]
    fn test_manifest_keeps_push_order() {
        let mut manifest = Manifest::new();
        manifest.push(&artifact("step-1", ""));
        manifest.push(&artifact("step-2", ""));
        let tags: Vec<_> = manifest.entries().iter().map(|e| e.tag.as_str()).collect();
        assert_eq!(tags, ["step-1", "step-2"]);
        assert_eq!(manifest.len(), 2);
    }

    #[test]
    fn test_capture_requires_index_and_about() {
        let dir = tempdir().unwrap();
        let err = SiteTemplates::capture(dir.path()).unwrap_err();
        assert!(matches!(err, OrchestratorError::Template { .. }));
    }

    #[test]
    fn test_capture_reads_nested_shell_assets() {
        let dir = tempdir().unwrap();
        let captured = templates(dir.path());
        let names: Vec<_> = captured
            .shell_assets
            .iter()
            .map(|(p, _)| p.to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 3);
        assert!(names.contains(&"shell.js".to_string()));
        assert!(names.iter().any(|n| n.ends_with("menu.svg")));
    }

    #[test]
    fn test_assemble_writes_static_tree() {
        let dir = tempdir().unwrap();
        let captured = templates(dir.path());
        let out = dir.path().join("dist-pages");
        let mut manifest = Manifest::new();
        manifest.push(&artifact("step-1", "Initial feed"));

        assemble(&out, &manifest, &captured).unwrap();

        assert_eq!(fs::read_to_string(out.join("index.html")).unwrap(), "<h1>Landing</h1>");
        assert_eq!(
            fs::read_to_string(out.join("about/index.html")).unwrap(),
            "<h1>About</h1>"
        );
        assert_eq!(fs::read_to_string(out.join("shell/shell.js")).unwrap(), "init()");
        assert!(out.join("shell/icons/menu.svg").exists());
        assert_eq!(fs::read(out.join(".nojekyll")).unwrap(), b"");
        let json = fs::read_to_string(out.join(MANIFEST_FILE)).unwrap();
        assert_eq!(json, manifest.to_json().unwrap());
    }

    #[test]
    fn test_assemble_without_shell_assets_creates_shell_dir() {
        let dir = tempdir().unwrap();
        let pages = dir.path().join("pages");
        fs::create_dir_all(&pages).unwrap();
        fs::write(pages.join("index.html"), "i").unwrap();
        fs::write(pages.join("about.html"), "a").unwrap();
        let captured = SiteTemplates::capture(&pages).unwrap();
        assert!(captured.shell_assets.is_empty());

        let out = dir.path().join("out");
        assemble(&out, &Manifest::new(), &captured).unwrap();
        assert!(out.join("shell").is_dir());
        assert_eq!(fs::read_to_string(out.join(MANIFEST_FILE)).unwrap(), "[]\n");
    }
}
