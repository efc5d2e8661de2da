use coolshell_base::CoolshellResult;

use crate::document::Document;
use crate::store::traits::ContentStore;

/// A content store holding documents in memory, listed in insertion order.
///
/// # Example
///
/// ```
/// use coolshell_engine::{Document, InMemoryStore};
/// use coolshell_engine::store::ContentStore;
///
/// let mut store = InMemoryStore::new();
/// store.insert(Document::new("content/articles/1.html", "<p>kernel</p>"));
///
/// let listed: Vec<_> = store.list_documents().unwrap().collect();
/// assert_eq!(listed.len(), 1);
/// ```
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    documents: Vec<Document>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            documents: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            documents: Vec::with_capacity(capacity),
        }
    }

    /// Append a document. Paths are expected to be unique.
    pub fn insert(&mut self, document: Document) {
        self.documents.push(document);
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl FromIterator<Document> for InMemoryStore {
    fn from_iter<I: IntoIterator<Item = Document>>(iter: I) -> Self {
        Self {
            documents: iter.into_iter().collect(),
        }
    }
}

impl ContentStore for InMemoryStore {
    fn list_documents(
        &self,
    ) -> CoolshellResult<Box<dyn Iterator<Item = CoolshellResult<Document>> + '_>> {
        Ok(Box::new(self.documents.iter().cloned().map(Ok)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_new() {
        let store = InMemoryStore::new();
        assert!(store.is_empty());
        assert_eq!(store.list_documents().unwrap().count(), 0);
    }

    #[test]
    fn test_list_keeps_insertion_order() {
        let mut store = InMemoryStore::with_capacity(2);
        store.insert(Document::new("content/articles/z.html", "z"));
        store.insert(Document::new("content/articles/a.html", "a"));
        assert_eq!(store.len(), 2);

        let paths: Vec<String> = store
            .list_documents()
            .unwrap()
            .map(|doc| doc.unwrap().path().to_string())
            .collect();
        assert_eq!(paths, vec!["content/articles/z.html", "content/articles/a.html"]);
    }

    #[test]
    fn test_collect_into_store() {
        let store: InMemoryStore = ["a", "b", "c"]
            .iter()
            .map(|name| Document::new(format!("content/articles/{}.html", name), *name))
            .collect();
        assert_eq!(store.len(), 3);
    }
}
