/* 📖 # Why serve the archive straight from a zip?

A zip of the site tree can be appended to the server binary, which makes the
whole archive a single self-contained executable. The zip format tolerates
leading bytes, because readers locate the central directory from the end of the
file, so the same reader handles a standalone `site.zip` and a binary with the
archive glued on.

The central directory is parsed once, when the snapshot is created. Reads work
on a clone of the parsed archive, which shares that directory, so listing and
reading every article stays linear in the number of entries. Entries are
decompressed on every read and nothing else is cached, which keeps memory flat
at the size of the compressed archive.
*/

use std::io::{Cursor, Read};
use std::sync::Arc;

use coolshell_base::tracing::{debug, info, instrument};
use coolshell_base::{CoolshellError, CoolshellResult, FilePath, PalHandle, ResultExt};
use zip::ZipArchive;
use zip::result::ZipError;

use super::traits::SiteSnapshot;

type SharedArchive = ZipArchive<Cursor<Arc<[u8]>>>;

/// A site snapshot backed by an in-memory zip archive.
#[derive(Clone)]
pub struct ZipSnapshot {
    archive: SharedArchive,
    size: usize,
}

impl ZipSnapshot {
    /// Wrap the raw bytes of a zip archive, possibly with leading non-zip data.
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> CoolshellResult<Self> {
        let bytes = bytes.into();
        let size = bytes.len();
        let archive = parse_archive(bytes)?;
        info!(entry_count = archive.len(), size, "opened zip snapshot");
        Ok(Self { archive, size })
    }

    /// Load a standalone zip file through the PAL.
    pub fn from_file(pal: &PalHandle, path: &FilePath) -> CoolshellResult<Self> {
        let bytes = pal
            .read_file_to_end(path)
            .with_context(|| format!("Failed to load zip snapshot {}", path))?;
        Self::from_bytes(bytes)
    }

    /// Load the archive appended to the running executable.
    pub fn from_executable(pal: &PalHandle) -> CoolshellResult<Self> {
        let mut reader = pal.read_executable_file()?;
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| Box::new(CoolshellError::file("<current_exe>", e)))?;
        Self::from_bytes(bytes).context("The executable carries no embedded site archive")
    }

    /// Number of entries in the archive, directories included.
    pub fn entry_count(&self) -> usize {
        self.archive.len()
    }
}

fn parse_archive(bytes: Arc<[u8]>) -> CoolshellResult<SharedArchive> {
    #[cfg(test)]
    tests::PARSE_COUNT.with(|count| count.set(count.get() + 1));
    ZipArchive::new(Cursor::new(bytes)).map_err(|e| archive_error("Failed to open zip archive", e))
}

fn archive_error(what: &str, error: ZipError) -> Box<CoolshellError> {
    Box::new(CoolshellError::archive(format!("{}: {}", what, error)))
}

impl std::fmt::Debug for ZipSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZipSnapshot")
            .field("size", &self.size)
            .field("entry_count", &self.archive.len())
            .finish()
    }
}

impl SiteSnapshot for ZipSnapshot {
    #[instrument(skip_all, fields(path = %path), level = "debug")]
    fn read(&self, path: &FilePath) -> CoolshellResult<Option<Vec<u8>>> {
        let mut archive = self.archive.clone();
        let mut entry = match archive.by_name(path.as_str()) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => {
                debug!("no such entry in zip snapshot");
                return Ok(None);
            }
            Err(e) => return Err(archive_error(&format!("Failed to open {}", path), e)),
        };
        if entry.is_dir() {
            return Ok(None);
        }

        // the declared size comes from the archive and is not trusted
        let mut content = Vec::new();
        entry.read_to_end(&mut content).map_err(|e| {
            Box::new(CoolshellError::archive(format!(
                "Failed to decompress {}: {}",
                path, e
            )))
        })?;
        Ok(Some(content))
    }

    fn walk_files(
        &self,
        root: &FilePath,
    ) -> CoolshellResult<Box<dyn Iterator<Item = CoolshellResult<FilePath>> + '_>> {
        let mut archive = self.archive.clone();
        let mut root_seen = false;
        let mut files = Vec::new();
        for index in 0..archive.len() {
            let entry = archive
                .by_index(index)
                .map_err(|e| archive_error(&format!("Failed to read entry #{}", index), e))?;
            let name = FilePath::from(entry.name().trim_end_matches('/'));
            let Some(relative) = name.strip_root(root) else {
                continue;
            };
            root_seen = true;
            if !entry.is_dir() && !relative.as_str().is_empty() {
                files.push(name);
            }
        }

        if !root_seen {
            return Err(Box::new(CoolshellError::archive(format!(
                "No entries below {} in zip snapshot",
                root
            ))));
        }
        debug!(root = %root, count = files.len(), "listed zip entries");
        Ok(Box::new(files.into_iter().map(Ok)))
    }
}
