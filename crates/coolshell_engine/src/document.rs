/* 📖 # Why is a Document just a path and a blob?

Articles are stored as the HTML pages they were originally published as. Search
treats them as opaque text and never parses the markup; everything shown in a
result is derived from the raw text on demand by the extractor.
*/

use coolshell_base::FilePath;

/// An archived article: its path inside the snapshot and its raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    path: FilePath,
    content: String,
}

impl Document {
    pub fn new(path: impl Into<FilePath>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// Build a document from raw bytes. Invalid UTF-8 sequences are replaced
    /// rather than rejected, so a stray byte never hides an article from search.
    pub fn from_bytes(path: impl Into<FilePath>, bytes: &[u8]) -> Self {
        Self::new(path, String::from_utf8_lossy(bytes).into_owned())
    }

    pub fn path(&self) -> &FilePath {
        &self.path
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Case-sensitive literal substring test.
    pub fn contains(&self, query: &str) -> bool {
        self.content.contains(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_is_case_sensitive() {
        let doc = Document::new("content/articles/a.html", "<p>Linux Kernel</p>");
        assert!(doc.contains("Kernel"));
        assert!(!doc.contains("kernel"));
        assert!(doc.contains("x K"));
    }

    #[test]
    fn test_from_bytes_replaces_invalid_utf8() {
        let doc = Document::from_bytes("content/articles/a.html", b"abc\xFFkernel");
        assert_eq!(doc.content(), "abc\u{FFFD}kernel");
        assert!(doc.contains("kernel"));
        assert_eq!(doc.path().as_str(), "content/articles/a.html");
    }
}
