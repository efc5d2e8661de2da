/* 📖 # Why a SiteSnapshot trait?

The archive is a frozen copy of the old site: pagination pages, article pages,
uploads and theme assets. It is either unpacked on disk or shipped as a zip,
possibly appended to the server binary itself. Static file serving and the article
corpus both read through this trait, so the HTTP service and search never know
which of the two they are looking at.

A snapshot is built once at startup and never changes afterwards.
*/

use std::sync::Arc;

use coolshell_base::{CoolshellResult, FilePath};

/// Read-only, path-addressable view of the archived site.
pub trait SiteSnapshot: std::fmt::Debug + Send + Sync + 'static {
    /// Read a whole file.
    ///
    /// Returns `Ok(None)` if no regular file exists at `path`; directories count
    /// as missing. An `Err` means the file exists but could not be read.
    fn read(&self, path: &FilePath) -> CoolshellResult<Option<Vec<u8>>>;

    /// List every regular file below `root`, recursively, in a stable order.
    fn walk_files(
        &self,
        root: &FilePath,
    ) -> CoolshellResult<Box<dyn Iterator<Item = CoolshellResult<FilePath>> + '_>>;
}

/// Shared handle to a snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotHandle(Arc<dyn SiteSnapshot>);

impl SnapshotHandle {
    pub fn new(snapshot: impl SiteSnapshot) -> Self {
        Self(Arc::new(snapshot))
    }
}

impl std::ops::Deref for SnapshotHandle {
    type Target = dyn SiteSnapshot;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}
