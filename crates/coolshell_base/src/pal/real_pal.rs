use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, error, info, instrument, warn};
use walkdir::WalkDir;

use crate::{CoolshellError, CoolshellResult};

use super::FilePath;
use super::glob::build_glob_set;
use super::http::{
    HttpMethod, HttpRequest, HttpResponse, HttpServerConfig, HttpServerHandle, HttpService,
    HttpStatusCode,
};
use super::traits::{Pal, ReadSeek};

/// How long a worker blocks waiting for a request before re-checking shutdown.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Concrete PAL implementation using the real filesystem and tiny_http.
///
/// All file paths are resolved relative to a configured base directory (the
/// site root).
#[derive(Debug)]
pub struct RealPal {
    base_dir: PathBuf,
}

impl RealPal {
    /// Create a new RealPal with the given base directory.
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// The directory every FilePath is resolved against.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Resolve a FilePath to a filesystem path.
    fn resolve_path(&self, path: &FilePath) -> PathBuf {
        self.base_dir.join(path.as_path())
    }
}

impl Pal for RealPal {
    #[instrument(skip(self), fields(path = %path))]
    fn file_exists(&self, path: &FilePath) -> CoolshellResult<bool> {
        let resolved = self.resolve_path(path);
        let exists = resolved.is_file();
        debug!(exists, resolved = %resolved.display(), "checked file existence");
        Ok(exists)
    }

    #[instrument(skip(self))]
    fn read_executable_file(&self) -> CoolshellResult<Box<dyn ReadSeek + 'static>> {
        let exe_path = std::env::current_exe()
            .map_err(|e| Box::new(CoolshellError::file("<current_exe>", e)))?;

        debug!(path = %exe_path.display(), "opening executable file");
        let file = fs::File::open(&exe_path).map_err(|e| {
            debug!("failed to open executable: {}", e);
            Box::new(CoolshellError::file(exe_path, e))
        })?;
        Ok(Box::new(file))
    }

    #[instrument(skip(self), fields(path = %path))]
    fn read_file(&self, path: &FilePath) -> CoolshellResult<Box<dyn ReadSeek + 'static>> {
        let resolved = self.resolve_path(path);
        debug!(resolved = %resolved.display(), "opening file for reading");
        let file = fs::File::open(&resolved).map_err(|e| {
            debug!(error = %e, "failed to open file");
            Box::new(CoolshellError::file(resolved, e))
        })?;
        Ok(Box::new(file))
    }

    #[instrument(skip(self), fields(path = %path, globs = ?globs))]
    fn walk_directory(
        &self,
        path: &FilePath,
        globs: &[String],
    ) -> CoolshellResult<Box<dyn Iterator<Item = CoolshellResult<FilePath>> + '_>> {
        let resolved = self.resolve_path(path);
        debug!(resolved = %resolved.display(), "starting directory walk");

        if !resolved.is_dir() {
            debug!("directory not found");
            return Err(Box::new(CoolshellError::file(
                resolved,
                std::io::Error::new(std::io::ErrorKind::NotFound, "directory not found"),
            )));
        }

        let glob_set = build_glob_set(globs)?;

        // Lexical order per directory keeps the walk stable between runs.
        let base_path = path.clone();
        let iter = WalkDir::new(&resolved)
            .sort_by_file_name()
            .into_iter()
            .filter_map(move |entry| match entry {
                Ok(e) => {
                    if !e.file_type().is_file() {
                        return None;
                    }
                    let relative = e.path().strip_prefix(&resolved).ok()?;
                    let relative = FilePath::from(relative);
                    if glob_set.is_match(relative.as_str()) {
                        Some(Ok(base_path.join(relative.as_str())))
                    } else {
                        None
                    }
                }
                Err(e) => {
                    debug!(error = %e, "error walking directory");
                    let failed_path = e
                        .path()
                        .map(|p| p.to_path_buf())
                        .unwrap_or_else(|| resolved.clone());
                    Some(Err(Box::new(CoolshellError::file(
                        failed_path,
                        std::io::Error::other(e.to_string()),
                    ))))
                }
            });

        Ok(Box::new(iter))
    }

    #[instrument(skip(self, service), fields(address = %config.address()))]
    fn start_http_server(
        &self,
        service: Box<dyn HttpService>,
        config: HttpServerConfig,
    ) -> CoolshellResult<HttpServerHandle> {
        let address = config.address();
        let server = tiny_http::Server::http(address.as_str())
            .map_err(|e| crate::err!("Failed to bind HTTP server to {}: {}", address, e))?;
        let port = server
            .server_addr()
            .to_ip()
            .map(|addr| addr.port())
            .ok_or_else(|| crate::err!("HTTP server at {} is not bound to an IP socket", address))?;

        let server = Arc::new(server);
        let service: Arc<dyn HttpService> = Arc::from(service);
        let handle = HttpServerHandle::new(port);

        for worker_id in 0..config.workers.max(1) {
            let server = Arc::clone(&server);
            let service = Arc::clone(&service);
            let shutdown = handle.shutdown_flag();
            let server_name = config.server_name.clone();
            let worker = std::thread::Builder::new()
                .name(format!("http-worker-{}", worker_id))
                .spawn(move || serve_requests(&server, service.as_ref(), &shutdown, &server_name))
                .map_err(|e| crate::err!("Failed to spawn HTTP worker thread: {}", e))?;
            handle.attach_worker(worker);
        }

        info!(port, workers = config.workers, "HTTP server listening");
        Ok(handle)
    }
}

fn serve_requests(
    server: &tiny_http::Server,
    service: &dyn HttpService,
    shutdown: &AtomicBool,
    server_name: &str,
) {
    while !shutdown.load(Ordering::SeqCst) {
        match server.recv_timeout(POLL_INTERVAL) {
            Ok(Some(request)) => respond(request, service, server_name),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "failed to receive HTTP request"),
        }
    }
    debug!("HTTP worker stopping");
}

#[instrument(skip_all, fields(method = %request.method(), url = %request.url()))]
fn respond(mut request: tiny_http::Request, service: &dyn HttpService, server_name: &str) {
    let mut http_request = HttpRequest::new(
        HttpMethod::parse(&request.method().to_string()),
        request.url(),
    );
    for header in request.headers() {
        http_request = http_request.with_header(header.field.to_string(), header.value.to_string());
    }
    let mut body = Vec::new();
    if let Err(e) = request.as_reader().read_to_end(&mut body) {
        warn!(error = %e, "failed to read request body");
    }
    let http_request = http_request.with_body(body);

    let response = match service.handle_request(http_request) {
        Ok(response) => response,
        Err(e) => {
            error!("request handler failed: {:?}", e);
            HttpResponse::text(e.to_string()).with_status(HttpStatusCode::NetworkConnectTimeoutError)
        }
    };
    debug!(status = response.status().as_u16(), "sending response");

    let status = response.status().as_u16();
    let mut headers = Vec::new();
    for (name, value) in response.headers().iter() {
        match tiny_http::Header::from_bytes(name.as_bytes(), value.as_bytes()) {
            Ok(header) => headers.push(header),
            Err(()) => warn!(header = name, "dropping invalid response header"),
        }
    }
    if let Ok(header) = tiny_http::Header::from_bytes(&b"Server"[..], server_name.as_bytes()) {
        headers.push(header);
    }

    let tiny_response = headers.into_iter().fold(
        tiny_http::Response::from_data(response.into_body().into_bytes()).with_status_code(status),
        |resp, header| resp.with_header(header),
    );
    if let Err(e) = request.respond(tiny_response) {
        warn!(error = %e, "failed to send HTTP response");
    }
}
