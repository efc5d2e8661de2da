use coolshell_base::tracing::{debug, instrument};
use coolshell_base::{CoolshellResult, FilePath, PalHandle, ResultExt};

use super::traits::SiteSnapshot;

/// A site tree on disk (or in a `MockPal`), accessed through the PAL.
///
/// Walks yield files in the PAL's order, which for `RealPal` is by file name
/// within each directory.
#[derive(Debug, Clone)]
pub struct DirectorySnapshot {
    pal: PalHandle,
}

impl DirectorySnapshot {
    pub fn new(pal: PalHandle) -> Self {
        Self { pal }
    }
}

impl SiteSnapshot for DirectorySnapshot {
    #[instrument(skip_all, fields(path = %path), level = "debug")]
    fn read(&self, path: &FilePath) -> CoolshellResult<Option<Vec<u8>>> {
        if !self.pal.file_exists(path)? {
            debug!("no such file in snapshot");
            return Ok(None);
        }
        let content = self
            .pal
            .read_file_to_end(path)
            .with_context(|| format!("Failed to read {}", path))?;
        Ok(Some(content))
    }

    fn walk_files(
        &self,
        root: &FilePath,
    ) -> CoolshellResult<Box<dyn Iterator<Item = CoolshellResult<FilePath>> + '_>> {
        self.pal
            .walk_directory(root, &["**/*".to_string()])
            .with_context(|| format!("Failed to walk {}", root))
    }
}
