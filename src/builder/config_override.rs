use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Temporary base-path override of a build configuration file.
///
/// The original bytes are written back when the value is dropped, on the
/// success path, on error returns and when an interrupted build future is
/// discarded.
#[derive(Debug)]
pub struct ConfigOverride {
    path: PathBuf,
    original: String,
}

impl ConfigOverride {
    /// Insert `base: '<base_path>',` right after the first `anchor` in `path`.
    ///
    /// Returns `Ok(None)` and leaves the file untouched when it does not exist
    /// or does not contain the anchor.
    pub fn apply(path: &Path, anchor: &str, base_path: &str) -> io::Result<Option<Self>> {
        let original = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!("{} not found, building without base override", path.display());
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        if anchor.is_empty() || !original.contains(anchor) {
            tracing::warn!(
                "{} has no `{}`, building without base override",
                path.display(),
                anchor
            );
            return Ok(None);
        }

        let modified = original.replacen(
            anchor,
            &format!("{}\n  base: '{}',", anchor, base_path),
            1,
        );
        fs::write(path, modified)?;
        tracing::debug!(path = %path.display(), base_path, "applied base override");

        Ok(Some(Self {
            path: path.to_path_buf(),
            original,
        }))
    }
}

impl Drop for ConfigOverride {
    fn drop(&mut self) {
        if let Err(e) = fs::write(&self.path, &self.original) {
            tracing::error!("Failed to restore {}: {}", self.path.display(), e);
        }
    }
}
