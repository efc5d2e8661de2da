/* 📖 # Why a ContentStore trait?

Search only needs one thing from storage: every article, in a stable order, with
failures reported rather than swallowed. Putting that behind a trait lets tests
hand the search an in-memory corpus while the server walks the real snapshot.

The store is read-only. It is built once at startup and shared between request
threads through `StoreHandle` without any locking.
*/

use std::sync::Arc;

use coolshell_base::CoolshellResult;

use crate::document::Document;

/// Read-only source of archived articles.
pub trait ContentStore: std::fmt::Debug + Send + Sync + 'static {
    /// Yield every document in traversal order.
    ///
    /// The order is stable between calls. An `Err` item means the walk or a
    /// read failed; callers must treat the listing as incomplete.
    fn list_documents(
        &self,
    ) -> CoolshellResult<Box<dyn Iterator<Item = CoolshellResult<Document>> + '_>>;
}

/// Shared handle to a content store.
///
/// Cloning is cheap; every clone sees the same immutable corpus.
#[derive(Debug, Clone)]
pub struct StoreHandle(Arc<dyn ContentStore>);

impl StoreHandle {
    pub fn new(store: impl ContentStore) -> Self {
        Self(Arc::new(store))
    }
}

impl std::ops::Deref for StoreHandle {
    type Target = dyn ContentStore;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}
