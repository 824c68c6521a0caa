use crate::render::DocSource;
use crate::revision::Revision;
use crate::util::escape_html;
use std::path::PathBuf;

/// Name the toolchain's own entry document is moved to.
pub const APP_DOCUMENT: &str = "app.html";
pub const ENTRY_DOCUMENT: &str = "index.html";

/// One revision's slot in the output tree, with every document in place.
#[derive(Debug, Clone)]
pub struct BuildArtifact {
    pub revision: Revision,
    /// `<output>/<tag>/`
    pub root: PathBuf,
    pub notes: DocSource,
    pub prompt: DocSource,
}

/// Entry page that loads the shared navigation shell; the shell then frames
/// `app.html` next to the notes and prompt.
pub fn shell_wrapper(tag: &str, site_title: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>{} - {}</title>
  <link rel="stylesheet" href="../shell/shell.css">
</head>
<body>
  <script src="../shell/shell.js"></script>
</body>
</html>
"#,
        escape_html(tag),
        escape_html(site_title)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_wrapper_links_shared_assets() {
        let html = shell_wrapper("step-2", "Feed Demo");
        assert!(html.contains("<title>step-2 - Feed Demo</title>"));
        assert!(html.contains(r#"href="../shell/shell.css""#));
        assert!(html.contains(r#"src="../shell/shell.js""#));
    }

    #[test]
    fn test_shell_wrapper_escapes_title() {
        let html = shell_wrapper("step-1", "Tom & Jerry <3");
        assert!(html.contains("Tom &amp; Jerry &lt;3"));
    }
}
