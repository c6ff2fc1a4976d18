//! Sandboxed filesystem access.
//!
//! Every path the model supplies is resolved against a fixed workspace
//! root; anything that resolves outside it is rejected before any IO
//! happens. Containment is checked against real paths, so `..` segments
//! and symlinks cannot step out of the root.

use std::path::{Component, Path, PathBuf};

use anyhow::Context;
use tokio::fs;

use super::{truncate_chars, ToolError, MAX_RESULT_CHARS};

/// Filesystem accessor bounded to a fixed root directory.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Create a workspace rooted at `root`. The root must exist; it is
    /// canonicalized up front so containment compares real paths.
    pub fn new(root: impl AsRef<Path>) -> anyhow::Result<Self> {
        let root = root.as_ref();
        let root = root
            .canonicalize()
            .with_context(|| format!("failed to resolve workspace root {}", root.display()))?;
        anyhow::ensure!(root.is_dir(), "workspace root must be a directory");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a model-supplied path to a real absolute path inside the
    /// root. `..` segments are normalized and symlinks are resolved
    /// through the deepest existing ancestor, so the target itself may
    /// not exist yet (writes need that).
    pub fn resolve(&self, path: &str) -> Result<PathBuf, ToolError> {
        let normalized = normalize(&self.root.join(path));
        let real = resolve_through_existing(&normalized).map_err(|source| ToolError::Read {
            path: path.to_string(),
            source,
        })?;

        if real == self.root || real.starts_with(&self.root) {
            Ok(real)
        } else {
            Err(ToolError::PathEscape(path.to_string()))
        }
    }

    /// Read a file as text. With `limit`, at most that many lines come
    /// back plus one marker line stating how many were omitted. The
    /// result is always capped at [`MAX_RESULT_CHARS`] characters.
    pub async fn read(&self, path: &str, limit: Option<usize>) -> Result<String, ToolError> {
        let resolved = self.resolve(path)?;
        let text = fs::read_to_string(&resolved)
            .await
            .map_err(|source| ToolError::Read {
                path: path.to_string(),
                source,
            })?;

        let total_lines = text.lines().count();
        let text = match limit {
            Some(limit) if limit < total_lines => {
                let mut kept = text.lines().take(limit).collect::<Vec<_>>().join("\n");
                kept.push_str(&format!("\n... ({} more lines)", total_lines - limit));
                kept
            }
            _ => text,
        };

        Ok(truncate_chars(text, MAX_RESULT_CHARS))
    }

    /// Write a file verbatim, creating missing parent directories and
    /// overwriting any existing content. Reports the bytes written.
    pub async fn write(&self, path: &str, content: &str) -> Result<String, ToolError> {
        let resolved = self.resolve(path)?;
        if let Some(parent) = resolved.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| ToolError::Write {
                    path: path.to_string(),
                    source,
                })?;
        }
        fs::write(&resolved, content)
            .await
            .map_err(|source| ToolError::Write {
                path: path.to_string(),
                source,
            })?;

        Ok(format!("Wrote {} bytes to {}", content.len(), path))
    }

    /// Replace the first literal occurrence of `old_text` with
    /// `new_text`. Fails when `old_text` does not occur at all. No
    /// regex, no multi-occurrence replace: the narrow contract keeps
    /// edits unambiguous for the model.
    pub async fn edit(
        &self,
        path: &str,
        old_text: &str,
        new_text: &str,
    ) -> Result<String, ToolError> {
        let resolved = self.resolve(path)?;
        let content = fs::read_to_string(&resolved)
            .await
            .map_err(|source| ToolError::Read {
                path: path.to_string(),
                source,
            })?;

        if !content.contains(old_text) {
            return Err(ToolError::NotFound(path.to_string()));
        }

        let updated = content.replacen(old_text, new_text, 1);
        fs::write(&resolved, updated)
            .await
            .map_err(|source| ToolError::Write {
                path: path.to_string(),
                source,
            })?;

        Ok(format!("Edited {path}"))
    }
}

/// Lexically normalize a path: drop `.`, fold `..` into its parent.
/// Escapes are not detected here; the containment check in `resolve`
/// compares against the canonical root afterwards.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Canonicalize through the deepest existing ancestor, then re-append
/// the not-yet-existing remainder unchanged.
fn resolve_through_existing(path: &Path) -> std::io::Result<PathBuf> {
    if path.exists() {
        return path.canonicalize();
    }

    for ancestor in path.ancestors().skip(1) {
        if ancestor.exists() {
            let canonical = ancestor.canonicalize()?;
            let remainder = path.strip_prefix(ancestor).expect("ancestor is a prefix");
            return Ok(canonical.join(remainder));
        }
    }

    // Unreachable in practice: "/" always exists.
    path.canonicalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn workspace() -> (TempDir, Workspace) {
        let dir = TempDir::new().unwrap();
        let workspace = Workspace::new(dir.path()).unwrap();
        (dir, workspace)
    }

    #[test]
    fn parent_traversal_fails_with_path_escape() {
        let (_dir, workspace) = workspace();
        let err = workspace.resolve("../outside.txt").unwrap_err();
        assert!(matches!(err, ToolError::PathEscape(_)), "got: {err:?}");
    }

    #[test]
    fn dotdot_inside_the_root_normalizes() {
        let (_dir, workspace) = workspace();
        std::fs::create_dir_all(workspace.root().join("a/b")).unwrap();
        std::fs::write(workspace.root().join("a/c.txt"), "x").unwrap();

        let resolved = workspace.resolve("a/b/../c.txt").unwrap();
        assert_eq!(resolved, workspace.root().join("a/c.txt"));
    }

    #[test]
    fn symlink_out_of_the_root_fails_with_path_escape() {
        let (_dir, workspace) = workspace();
        let outside = TempDir::new().unwrap();
        std::fs::write(outside.path().join("secret.txt"), "x").unwrap();
        std::os::unix::fs::symlink(outside.path(), workspace.root().join("link")).unwrap();

        let err = workspace.resolve("link/secret.txt").unwrap_err();
        assert!(matches!(err, ToolError::PathEscape(_)), "got: {err:?}");
    }

    #[tokio::test]
    async fn read_missing_file_is_a_read_error() {
        let (_dir, workspace) = workspace();
        let err = workspace.read("nope.txt", None).await.unwrap_err();
        assert!(matches!(err, ToolError::Read { .. }), "got: {err:?}");
    }

    #[tokio::test]
    async fn read_with_limit_appends_omission_marker() {
        let (_dir, workspace) = workspace();
        workspace.write("f.txt", "1\n2\n3\n4\n5\n").await.unwrap();

        let text = workspace.read("f.txt", Some(2)).await.unwrap();
        assert_eq!(text, "1\n2\n... (3 more lines)");
    }

    #[tokio::test]
    async fn read_with_generous_limit_returns_everything() {
        let (_dir, workspace) = workspace();
        workspace.write("f.txt", "1\n2\n").await.unwrap();

        let text = workspace.read("f.txt", Some(10)).await.unwrap();
        assert_eq!(text, "1\n2\n");
    }

    #[tokio::test]
    async fn write_creates_parents_and_reports_bytes() {
        let (_dir, workspace) = workspace();
        let message = workspace.write("sub/dir/f.txt", "hello").await.unwrap();
        assert_eq!(message, "Wrote 5 bytes to sub/dir/f.txt");

        let on_disk = std::fs::read_to_string(workspace.root().join("sub/dir/f.txt")).unwrap();
        assert_eq!(on_disk, "hello");
    }

    #[tokio::test]
    async fn write_overwrites_without_appending() {
        let (_dir, workspace) = workspace();
        workspace.write("f.txt", "first").await.unwrap();
        workspace.write("f.txt", "second").await.unwrap();

        let on_disk = std::fs::read_to_string(workspace.root().join("f.txt")).unwrap();
        assert_eq!(on_disk, "second");
    }

    #[tokio::test]
    async fn write_outside_the_root_fails_with_path_escape() {
        let (_dir, workspace) = workspace();
        let err = workspace.write("../escape.txt", "x").await.unwrap_err();
        assert!(matches!(err, ToolError::PathEscape(_)), "got: {err:?}");
    }

    #[tokio::test]
    async fn edit_replaces_only_the_first_occurrence() {
        let (_dir, workspace) = workspace();
        workspace.write("f.txt", "foo bar foo baz").await.unwrap();

        workspace.edit("f.txt", "foo", "qux").await.unwrap();

        let on_disk = std::fs::read_to_string(workspace.root().join("f.txt")).unwrap();
        assert_eq!(on_disk, "qux bar foo baz");
    }

    #[tokio::test]
    async fn edit_without_a_match_fails_with_not_found() {
        let (_dir, workspace) = workspace();
        workspace.write("f.txt", "abc").await.unwrap();

        let err = workspace.edit("f.txt", "zzz", "y").await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)), "got: {err:?}");
    }
}
