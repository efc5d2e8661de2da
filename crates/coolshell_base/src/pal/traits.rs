use std::io::{Read, Seek};
use std::sync::Arc;

use crate::{CoolshellError, CoolshellResult};

use super::file_path::FilePath;
use super::http::{HttpServerConfig, HttpServerHandle, HttpService};

/// Trait combining Read + Seek for file operations.
///
/// Zip snapshots need a seekable reader, so both real files and in-memory
/// buffers are returned behind this trait.
pub trait ReadSeek: Read + Seek {}
impl<T: Read + Seek> ReadSeek for T {}

/* 📖 # Why is Pal a trait instead of a struct?

The server touches the outside world in exactly two ways: it reads the site
snapshot and it listens for HTTP requests. Putting both behind one trait lets the
whole request path (routing, static files, search) run against `MockPal` in unit
tests, with no disk and no sockets.
*/

/// Platform Abstraction Layer (PAL) trait providing filesystem and HTTP operations.
///
/// Two implementations are provided:
/// - `RealPal`: the real filesystem below a base directory, served with tiny_http
/// - `MockPal`: in-memory files and simulated requests for testing
pub trait Pal: std::fmt::Debug + Send + Sync + 'static {
    /// Check if a regular file exists at the given path.
    fn file_exists(&self, path: &FilePath) -> CoolshellResult<bool>;

    /// Read the executable file (current program binary).
    fn read_executable_file(&self) -> CoolshellResult<Box<dyn ReadSeek + 'static>>;

    /// Open a file for reading.
    fn read_file(&self, path: &FilePath) -> CoolshellResult<Box<dyn ReadSeek + 'static>>;

    /// Read entire file contents into memory.
    fn read_file_to_end(&self, path: &FilePath) -> CoolshellResult<Vec<u8>> {
        let mut reader = self.read_file(path)?;
        let mut contents = Vec::new();
        reader
            .read_to_end(&mut contents)
            .map_err(|e| Box::new(CoolshellError::file(path.as_path(), e)))?;
        Ok(contents)
    }

    /// Read entire file contents as a UTF-8 string.
    fn read_file_to_string(&self, path: &FilePath) -> CoolshellResult<String> {
        let contents = self.read_file_to_end(path)?;
        String::from_utf8(contents).map_err(|_e| crate::err!("File is not valid UTF-8: {}", path))
    }

    /// Walk a directory tree, yielding regular files matching the given glob patterns.
    ///
    /// Globs are matched against the path relative to `path`. Directories are
    /// never yielded. Implementations yield files in a stable order.
    fn walk_directory(
        &self,
        path: &FilePath,
        globs: &[String],
    ) -> CoolshellResult<Box<dyn Iterator<Item = CoolshellResult<FilePath>> + '_>>;

    /// Start an HTTP server with the given service.
    ///
    /// Returns once the server is listening. Dropping every clone of the returned
    /// handle (or calling `shutdown()`) stops it.
    fn start_http_server(
        &self,
        service: Box<dyn HttpService>,
        config: HttpServerConfig,
    ) -> CoolshellResult<HttpServerHandle>;
}

/// Handle to a PAL implementation, enabling shared ownership.
///
/// # Examples
///
/// ```no_run
/// use coolshell_base::{RealPal, PalHandle};
///
/// let pal = PalHandle::new(RealPal::new("site".into()));
/// let pal_clone = pal.clone(); // Cheap clone, shares the same implementation
/// ```
#[derive(Debug, Clone)]
pub struct PalHandle(Arc<dyn Pal>);

impl PalHandle {
    /// Create a new PalHandle from a Pal implementation.
    pub fn new(pal: impl Pal + 'static) -> Self {
        Self(Arc::new(pal))
    }
}

impl std::ops::Deref for PalHandle {
    type Target = dyn Pal;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pal::mock::MockPal;

    #[test]
    fn test_pal_handle_clone_shares_files() {
        let mock = MockPal::new();
        let pal = PalHandle::new(mock.clone());
        let pal_clone = pal.clone();

        mock.add_file(FilePath::from("content/list/1.html"), b"page".to_vec());
        assert!(pal_clone.file_exists(&FilePath::from("content/list/1.html")).unwrap());
    }

    #[test]
    fn test_read_file_to_end_default_impl() {
        let mock = MockPal::new();
        mock.add_file(FilePath::from("uploads/a.bin"), vec![0, 1, 2, 0xFF]);

        let bytes = mock.read_file_to_end(&FilePath::from("uploads/a.bin")).unwrap();
        assert_eq!(bytes, vec![0, 1, 2, 0xFF]);
    }
}
