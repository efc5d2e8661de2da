use relative_path::{RelativePath, RelativePathBuf};
use std::path::{Path, PathBuf};

/* 📖 # Why use RelativePathBuf for FilePath?

Every path the archive handles is relative to the snapshot root: corpus documents
(`content/articles/...`), static mounts (`assets/...`) and zip entry names.
Wrapping RelativePathBuf keeps absolute system paths out of that vocabulary and
gives forward-slash separators on every platform, which is also what zip entries
and public URLs use.
*/

/// Type-safe wrapper for file paths relative to the snapshot root.
///
/// # Examples
///
/// ```
/// use coolshell_base::FilePath;
///
/// let root = FilePath::from("content/articles");
/// let doc = root.join("2020/kernel.html");
/// assert_eq!(doc.as_str(), "content/articles/2020/kernel.html");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilePath(RelativePathBuf);

impl FilePath {
    /// Returns the underlying RelativePath.
    pub fn as_relative(&self) -> &RelativePath {
        &self.0
    }

    /// The path as a forward-slash separated string.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Converts to a regular Path for use with std::fs operations.
    /// This returns the relative path portion without a base directory.
    pub fn as_path(&self) -> &Path {
        Path::new(self.as_str())
    }

    /// Consumes the FilePath and returns a PathBuf.
    pub fn into_path_buf(self) -> PathBuf {
        PathBuf::from(self.0.as_str())
    }

    /// Append a relative path, normalizing `.` and `..` components.
    pub fn join(&self, path: impl AsRef<str>) -> FilePath {
        Self(self.0.join_normalized(path.as_ref()))
    }

    /// Returns the part of this path below `root`, or `None` if it is not inside it.
    ///
    /// An empty or `.` root contains every path.
    pub fn strip_root(&self, root: &FilePath) -> Option<&RelativePath> {
        let root = root.0.normalize();
        if root.as_str().is_empty() {
            return Some(&self.0);
        }
        self.0.strip_prefix(&root).ok()
    }

    /// True if the path contains a `..` component.
    pub fn escapes_root(&self) -> bool {
        self.0.as_str().split('/').any(|segment| segment == "..")
    }
}

impl From<&str> for FilePath {
    fn from(s: &str) -> Self {
        Self(RelativePathBuf::from(s))
    }
}

impl From<String> for FilePath {
    fn from(s: String) -> Self {
        Self(RelativePathBuf::from(s))
    }
}

impl From<RelativePathBuf> for FilePath {
    fn from(p: RelativePathBuf) -> Self {
        Self(p)
    }
}

impl From<&RelativePath> for FilePath {
    fn from(p: &RelativePath) -> Self {
        Self(p.to_relative_path_buf())
    }
}

impl From<&Path> for FilePath {
    fn from(p: &Path) -> Self {
        let normalized = p.to_string_lossy().replace('\\', "/");
        Self(RelativePathBuf::from(normalized))
    }
}

impl std::fmt::Display for FilePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<RelativePath> for FilePath {
    fn as_ref(&self) -> &RelativePath {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_path_from_str() {
        let path = FilePath::from("content/list/1.html");
        assert_eq!(path.as_path(), Path::new("content/list/1.html"));
    }

    #[test]
    fn test_file_path_from_pathbuf() {
        let pb = PathBuf::from("uploads/logo.png");
        let path = FilePath::from(pb.as_path());
        assert_eq!(path.as_str(), "uploads/logo.png");
    }

    #[test]
    fn test_file_path_join_normalizes() {
        let root = FilePath::from("content/articles");
        assert_eq!(root.join("a/./b.html").as_str(), "content/articles/a/b.html");
        assert_eq!(FilePath::from("").join("assets/app.css").as_str(), "assets/app.css");
    }

    #[test]
    fn test_strip_root() {
        let path = FilePath::from("content/articles/2020/kernel.html");
        let root = FilePath::from("content/articles");
        assert_eq!(
            path.strip_root(&root).map(|p| p.as_str()),
            Some("2020/kernel.html")
        );
        assert!(path.strip_root(&FilePath::from("content/list")).is_none());
        assert_eq!(
            path.strip_root(&FilePath::from(".")).map(|p| p.as_str()),
            Some("content/articles/2020/kernel.html")
        );
    }

    #[test]
    fn test_strip_root_is_component_wise() {
        let path = FilePath::from("content/articles-old/a.html");
        assert!(path.strip_root(&FilePath::from("content/articles")).is_none());
    }

    #[test]
    fn test_escapes_root() {
        assert!(FilePath::from("assets/../../etc/passwd").escapes_root());
        assert!(!FilePath::from("assets/app..css").escapes_root());
    }

    #[test]
    fn test_file_path_display() {
        let path = FilePath::from("content/haoel/index.html");
        assert_eq!(path.to_string(), "content/haoel/index.html");
    }
}
