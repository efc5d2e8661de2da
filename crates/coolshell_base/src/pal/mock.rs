use std::collections::{BTreeMap, HashMap};
use std::io::Cursor;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Arc, Mutex};

use crate::{CoolshellError, CoolshellResult};

use super::FilePath;
use super::glob::build_glob_set;
use super::http::{HttpRequest, HttpResponse, HttpServerConfig, HttpServerHandle, HttpService};
use super::traits::{Pal, ReadSeek};

/* 📖 # Why an ordered map for MockPal storage?

Search results tie-break on traversal order, so tests need the mock filesystem to
walk in a predictable order. A BTreeMap keyed by the path string keeps storage
stable, and walks sort the paths component by component so a file and a sibling
directory of the same stem come out the way RealPal lists them. Files can also
be registered as unreadable, which is how tests reproduce a document failing
mid-walk.
*/

#[derive(Debug, Clone)]
enum MockEntry {
    Content(Vec<u8>),
    Unreadable(String),
}

/// In-memory PAL implementation for testing.
///
/// # Examples
///
/// ```
/// use coolshell_base::{MockPal, Pal, FilePath};
///
/// let mock = MockPal::new();
/// mock.add_file(FilePath::from("content/list/1.html"), b"page one".to_vec());
/// let content = mock.read_file_to_string(&FilePath::from("content/list/1.html")).unwrap();
/// assert_eq!(content, "page one");
/// ```
#[derive(Debug, Clone)]
pub struct MockPal {
    files: Arc<Mutex<BTreeMap<String, MockEntry>>>,
    executable: Arc<Mutex<Option<Vec<u8>>>>,
    http_servers: Arc<Mutex<HashMap<u16, Box<dyn HttpService>>>>,
    next_port: Arc<AtomicU16>,
}

impl MockPal {
    /// Create a new empty MockPal.
    pub fn new() -> Self {
        Self {
            files: Arc::new(Mutex::new(BTreeMap::new())),
            executable: Arc::new(Mutex::new(None)),
            http_servers: Arc::new(Mutex::new(HashMap::new())),
            next_port: Arc::new(AtomicU16::new(10000)),
        }
    }

    /// Add a file to the mock storage.
    pub fn add_file(&self, path: FilePath, content: Vec<u8>) {
        self.files
            .lock()
            .unwrap()
            .insert(path.as_str().to_string(), MockEntry::Content(content));
    }

    /// Register a file that is listed by walks but fails every read with `reason`.
    pub fn add_unreadable_file(&self, path: FilePath, reason: impl Into<String>) {
        self.files
            .lock()
            .unwrap()
            .insert(path.as_str().to_string(), MockEntry::Unreadable(reason.into()));
    }

    /// Set the executable file content.
    pub fn set_executable(&self, content: Vec<u8>) {
        *self.executable.lock().unwrap() = Some(content);
    }

    /// Simulate an HTTP request to a running server.
    ///
    /// Looks up the service registered on `port` and invokes it directly.
    pub fn simulate_request(
        &self,
        port: u16,
        request: HttpRequest,
    ) -> CoolshellResult<HttpResponse> {
        let servers = self.http_servers.lock().unwrap();
        let service = servers
            .get(&port)
            .ok_or_else(|| crate::err!("No HTTP server registered on port {}", port))?;

        service.handle_request(request)
    }

    /// Get the number of registered HTTP servers.
    pub fn http_server_count(&self) -> usize {
        self.http_servers.lock().unwrap().len()
    }
}

impl Default for MockPal {
    fn default() -> Self {
        Self::new()
    }
}

impl Pal for MockPal {
    fn file_exists(&self, path: &FilePath) -> CoolshellResult<bool> {
        let files = self.files.lock().unwrap();
        Ok(files.contains_key(path.as_str()))
    }

    fn read_executable_file(&self) -> CoolshellResult<Box<dyn ReadSeek + 'static>> {
        let executable = self.executable.lock().unwrap();
        let content = executable
            .as_ref()
            .ok_or_else(|| crate::err!("No executable set in MockPal"))?
            .clone();
        Ok(Box::new(Cursor::new(content)))
    }

    fn read_file(&self, path: &FilePath) -> CoolshellResult<Box<dyn ReadSeek + 'static>> {
        let files = self.files.lock().unwrap();
        match files.get(path.as_str()) {
            Some(MockEntry::Content(content)) => Ok(Box::new(Cursor::new(content.clone()))),
            Some(MockEntry::Unreadable(reason)) => Err(Box::new(CoolshellError::file(
                path.as_path(),
                std::io::Error::other(reason.clone()),
            ))),
            None => Err(Box::new(CoolshellError::file(
                path.as_path(),
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ),
            ))),
        }
    }

    fn walk_directory(
        &self,
        path: &FilePath,
        globs: &[String],
    ) -> CoolshellResult<Box<dyn Iterator<Item = CoolshellResult<FilePath>> + '_>> {
        let glob_set = build_glob_set(globs)?;
        let files = self.files.lock().unwrap();
        let mut matching: Vec<FilePath> = files
            .keys()
            .map(|key| FilePath::from(key.as_str()))
            .filter(|file| {
                file.strip_root(path)
                    .is_some_and(|relative| glob_set.is_match(relative.as_str()))
            })
            .collect();
        // Same order as a walk sorted by file name within each directory
        matching.sort_by(|a, b| a.as_str().split('/').cmp(b.as_str().split('/')));

        if matching.is_empty() && !files.keys().any(|key| key.starts_with(path.as_str())) {
            return Err(Box::new(CoolshellError::file(
                path.as_path(),
                std::io::Error::new(std::io::ErrorKind::NotFound, "directory not found"),
            )));
        }

        Ok(Box::new(matching.into_iter().map(Ok)))
    }

    fn start_http_server(
        &self,
        service: Box<dyn HttpService>,
        config: HttpServerConfig,
    ) -> CoolshellResult<HttpServerHandle> {
        let port = match config.port {
            Some(p) => p,
            None => self.next_port.fetch_add(1, Ordering::SeqCst),
        };

        self.http_servers.lock().unwrap().insert(port, service);

        Ok(HttpServerHandle::new(port))
    }
}
