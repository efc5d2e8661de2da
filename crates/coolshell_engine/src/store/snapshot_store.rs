use std::io;

use coolshell_base::tracing::{debug, instrument};
use coolshell_base::{CoolshellError, CoolshellResult, FilePath};

use crate::document::Document;
use crate::snapshot::SnapshotHandle;
use crate::store::traits::ContentStore;

/// The article corpus: every file below `root` in a site snapshot.
///
/// Files and directories whose names start with `.` or `_` are not part of the
/// corpus. Documents are read lazily while the listing is consumed, so a read failure
/// surfaces at the point of the walk where it happened.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    snapshot: SnapshotHandle,
    root: FilePath,
}

impl SnapshotStore {
    pub fn new(snapshot: SnapshotHandle, root: impl Into<FilePath>) -> Self {
        Self {
            snapshot,
            root: root.into(),
        }
    }

    pub fn root(&self) -> &FilePath {
        &self.root
    }

    fn is_excluded(&self, path: &FilePath) -> bool {
        path.strip_root(&self.root).is_some_and(|relative| {
            relative
                .as_str()
                .split('/')
                .any(|name| name.starts_with(['.', '_']))
        })
    }

    fn load(&self, path: FilePath) -> CoolshellResult<Document> {
        match self.snapshot.read(&path)? {
            Some(bytes) => Ok(Document::from_bytes(path, &bytes)),
            // listed by the walk but gone by the time we read it
            None => Err(Box::new(CoolshellError::file(
                path.as_path(),
                io::Error::new(io::ErrorKind::NotFound, "listed document is missing"),
            ))),
        }
    }
}

impl ContentStore for SnapshotStore {
    #[instrument(skip(self), fields(root = %self.root), level = "debug")]
    fn list_documents(
        &self,
    ) -> CoolshellResult<Box<dyn Iterator<Item = CoolshellResult<Document>> + '_>> {
        debug!("listing corpus");
        let paths = self.snapshot.walk_files(&self.root)?;
        Ok(Box::new(
            paths
                .filter(move |path| !matches!(path, Ok(path) if self.is_excluded(path)))
                .map(move |path| path.and_then(|path| self.load(path))),
        ))
    }
}
