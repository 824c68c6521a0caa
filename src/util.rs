//! Shared filesystem helpers.

use std::fs;
use std::io;
use std::path::Path;
use walkdir::WalkDir;

/// Recursively copy the contents of `src` into `dst`, creating `dst` if needed.
/// Existing files in `dst` are overwritten.
pub fn copy_dir_all(src: &Path, dst: &Path) -> io::Result<()> {
    fs::create_dir_all(dst)?;
    for entry in WalkDir::new(src).min_depth(1) {
        let entry = entry.map_err(io::Error::other)?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(io::Error::other)?;
        let target = dst.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Move the contents of `src` into `dst` and remove `src`.
///
/// Tries a rename first and falls back to copy + delete when the two paths
/// live on different filesystems or `dst` already exists.
pub fn move_dir(src: &Path, dst: &Path) -> io::Result<()> {
    if !dst.exists() {
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)?;
        }
        if fs::rename(src, dst).is_ok() {
            return Ok(());
        }
    }
    copy_dir_all(src, dst)?;
    fs::remove_dir_all(src)
}

/// Remove a directory tree if it exists.
pub fn remove_dir_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Escape text for inclusion in HTML element content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn populate(dir: &Path) {
        fs::create_dir_all(dir.join("assets/img")).unwrap();
        fs::write(dir.join("index.html"), "<html></html>").unwrap();
        fs::write(dir.join("assets/app.js"), "console.log(1)").unwrap();
        fs::write(dir.join("assets/img/logo.svg"), "<svg/>").unwrap();
    }

    #[test]
    fn test_copy_dir_all_preserves_tree() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        populate(&src);

        copy_dir_all(&src, &dst).unwrap();
        assert!(dst.join("index.html").exists());
        assert!(dst.join("assets/img/logo.svg").exists());
        assert!(src.join("index.html").exists());
    }

    #[test]
    fn test_move_dir_removes_source() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("dist");
        let dst = dir.path().join("out/step-1");
        populate(&src);

        move_dir(&src, &dst).unwrap();
        assert!(!src.exists());
        assert_eq!(
            fs::read_to_string(dst.join("assets/app.js")).unwrap(),
            "console.log(1)"
        );
    }

    #[test]
    fn test_move_dir_merges_into_existing_destination() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("dist");
        let dst = dir.path().join("out");
        populate(&src);
        fs::create_dir_all(&dst).unwrap();
        fs::write(dst.join("keep.txt"), "kept").unwrap();

        move_dir(&src, &dst).unwrap();
        assert!(!src.exists());
        assert!(dst.join("keep.txt").exists());
        assert!(dst.join("index.html").exists());
    }

    #[test]
    fn test_remove_dir_if_exists_tolerates_missing() {
        let dir = tempdir().unwrap();
        remove_dir_if_exists(&dir.path().join("missing")).unwrap();
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }
}
