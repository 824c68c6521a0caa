//! Metadata renderer: per-revision notes and prompts as standalone HTML.
//!
//! Source files are looked up by the revision's padded display id
//! (`docs/agent-notes/03.md`, `docs/prompts/03.md`). A missing file is normal
//! and renders a placeholder page instead; rendering never fails.
//!
//! Pages carry their stylesheet inline so the shell can load them into a
//! frame without a second request.

use crate::errors::DocumentationMissing;
use crate::revision::Revision;
use crate::util::escape_html;
use pulldown_cmark::{Options, Parser, html};
use std::path::{Path, PathBuf};

/// Which documentation category to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocKind {
    Notes,
    Prompt,
}

impl DocKind {
    /// File name inside the revision's output directory.
    pub fn output_file(self) -> &'static str {
        match self {
            DocKind::Notes => "notes.html",
            DocKind::Prompt => "prompt.html",
        }
    }

    fn title_prefix(self) -> &'static str {
        match self {
            DocKind::Notes => "Agent Notes",
            DocKind::Prompt => "Prompt",
        }
    }

    fn placeholder_markdown(self) -> &'static str {
        match self {
            DocKind::Notes => "# Agent Notes\n\nNo agent notes available for this step.",
            DocKind::Prompt => "# Prompt\n\nNo prompt file available for this step.",
        }
    }
}

/// Where a rendered document's content came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocSource {
    File(PathBuf),
    Placeholder,
}

/// A rendered, self-contained HTML page.
#[derive(Debug, Clone)]
pub struct Document {
    pub kind: DocKind,
    pub source: DocSource,
    pub html: String,
}

impl Document {
    pub fn is_placeholder(&self) -> bool {
        self.source == DocSource::Placeholder
    }
}

pub struct MetadataRenderer {
    notes_dir: PathBuf,
    prompts_dir: PathBuf,
}

impl MetadataRenderer {
    pub fn new(notes_dir: impl Into<PathBuf>, prompts_dir: impl Into<PathBuf>) -> Self {
        Self {
            notes_dir: notes_dir.into(),
            prompts_dir: prompts_dir.into(),
        }
    }

    /// Render one documentation page for `revision`.
    pub fn render(&self, revision: &Revision, kind: DocKind) -> Document {
        let title = format!("{} - {}", kind.title_prefix(), revision.tag);
        let path = self.source_path(revision, kind);

        match load_source(&path) {
            Ok(markdown) => Document {
                kind,
                html: render_markdown(&markdown, &title),
                source: DocSource::File(path),
            },
            Err(missing) => {
                tracing::debug!(tag = %revision.tag, "{}", missing);
                Document {
                    kind,
                    html: render_markdown(kind.placeholder_markdown(), &title),
                    source: DocSource::Placeholder,
                }
            }
        }
    }

    fn source_path(&self, revision: &Revision, kind: DocKind) -> PathBuf {
        let dir = match kind {
            DocKind::Notes => &self.notes_dir,
            DocKind::Prompt => &self.prompts_dir,
        };
        dir.join(format!("{}.md", revision.display_id))
    }
}

fn load_source(path: &Path) -> Result<String, DocumentationMissing> {
    std::fs::read_to_string(path).map_err(|_| DocumentationMissing {
        path: path.to_path_buf(),
    })
}

/// Convert markdown into a complete HTML page with inline styling.
pub fn render_markdown(markdown: &str, title: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut body = String::new();
    html::push_html(&mut body, Parser::new_ext(markdown, options));

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>{title}</title>
  <style>{style}</style>
</head>
<body>
{body}</body>
</html>
"#,
        title = escape_html(title),
        style = DOCUMENT_STYLE,
        body = body,
    )
}

const DOCUMENT_STYLE: &str = r#"
    body {
      font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, 'Helvetica Neue', Arial, sans-serif;
      line-height: 1.6;
      max-width: 800px;
      margin: 0 auto;
      padding: 2rem;
      color: #0f172a;
      background: #ffffff;
    }
    h1, h2, h3, h4, h5, h6 { margin-top: 2rem; margin-bottom: 1rem; line-height: 1.3; }
    h1 { font-size: 2rem; }
    h2 { font-size: 1.5rem; }
    h3 { font-size: 1.25rem; }
    code { background: #eef2ff; padding: 0.2em 0.4em; border-radius: 3px; font-size: 0.9em; }
    pre { background: #eef2ff; padding: 1rem; border-radius: 5px; overflow-x: auto; }
    pre code { background: none; padding: 0; }
    a { color: #1d4ed8; text-decoration: none; }
    a:hover { text-decoration: underline; }
    ul, ol { margin: 1rem 0; padding-left: 2rem; }
    table { border-collapse: collapse; margin: 1rem 0; }
    th, td { border: 1px solid #cbd5e1; padding: 0.4rem 0.8rem; }
  "#;

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn renderer(root: &Path) -> MetadataRenderer {
        MetadataRenderer::new(root.join("docs/agent-notes"), root.join("docs/prompts"))
    }

    #[test]
    fn test_render_found_notes() {
        let dir = tempdir().unwrap();
        let notes = dir.path().join("docs/agent-notes");
        fs::create_dir_all(&notes).unwrap();
        fs::write(notes.join("02.md"), "# Comments\n\nAdded a `Comment` model.").unwrap();

        let rev = Revision::from_tag("step-2", "step-", "Add comments");
        let doc = renderer(dir.path()).render(&rev, DocKind::Notes);
        assert_eq!(doc.source, DocSource::File(notes.join("02.md")));
        assert!(doc.html.contains("<h1>Comments</h1>"));
        assert!(doc.html.contains("<code>Comment</code>"));
        assert!(doc.html.contains("<title>Agent Notes - step-2</title>"));
    }

    #[test]
    fn test_render_missing_prompt_falls_back() {
        let dir = tempdir().unwrap();
        let rev = Revision::from_tag("step-3", "step-", "");
        let doc = renderer(dir.path()).render(&rev, DocKind::Prompt);
        assert!(doc.is_placeholder());
        assert!(doc.html.contains("No prompt file available for this step."));
        assert!(doc.html.contains("<title>Prompt - step-3</title>"));
    }

    #[test]
    fn test_render_missing_notes_falls_back() {
        let dir = tempdir().unwrap();
        let rev = Revision::from_tag("step-3", "step-", "");
        let doc = renderer(dir.path()).render(&rev, DocKind::Notes);
        assert!(doc.is_placeholder());
        assert!(doc.html.contains("No agent notes available for this step."));
    }

    #[test]
    fn test_rendered_page_is_self_contained() {
        let html = render_markdown("| a | b |\n|---|---|\n| 1 | 2 |", "Table");
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<style>"));
        assert!(!html.contains("<link"));
        assert!(html.contains("<table>"));
    }

    #[test]
    fn test_title_is_escaped() {
        let html = render_markdown("text", "Notes <script>");
        assert!(html.contains("<title>Notes &lt;script&gt;</title>"));
    }

    #[test]
    fn test_output_file_names() {
        assert_eq!(DocKind::Notes.output_file(), "notes.html");
        assert_eq!(DocKind::Prompt.output_file(), "prompt.html");
    }
}
