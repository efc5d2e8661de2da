/* 📖 # Why a dedicated HTTP module in the PAL?

The archive is served over HTTP, but routing, static files and the search page are
all plain functions from request to response. Keeping the request/response types
here, independent of tiny_http, lets `MockPal` drive the exact same service code
that `RealPal` serves.
*/

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

use percent_encoding::percent_decode_str;

/// HTTP methods understood by the archive server.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Options,
    /// Any other method token, kept verbatim.
    Other(String),
}

impl HttpMethod {
    /// Parse an HTTP method from a string. Unknown tokens become `Other`.
    pub fn parse(method: &str) -> Self {
        match method.to_uppercase().as_str() {
            "GET" => Self::Get,
            "HEAD" => Self::Head,
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "DELETE" => Self::Delete,
            "OPTIONS" => Self::Options,
            _ => Self::Other(method.to_string()),
        }
    }

    /// Convert the method to its string representation.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
            Self::Other(token) => token,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// HTTP headers collection. Names are matched case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpHeaders {
    inner: HashMap<String, String>,
}

impl HttpHeaders {
    /// Create empty headers.
    pub fn new() -> Self {
        Self {
            inner: HashMap::new(),
        }
    }

    /// Insert a header, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.insert(key.into().to_ascii_lowercase(), value.into());
    }

    /// Get a header value.
    pub fn get(&self, key: &str) -> Option<&String> {
        self.inner.get(&key.to_ascii_lowercase())
    }

    /// Check if a header exists.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains_key(&key.to_ascii_lowercase())
    }

    /// Iterate over `(name, value)` pairs; names are lowercase.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// HTTP message body. Archive responses are always fully buffered.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct HttpBody(Vec<u8>);

impl HttpBody {
    /// Create an empty body.
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Get content as bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Get content as a string if valid UTF-8.
    pub fn as_string(&self) -> Option<String> {
        String::from_utf8(self.0.clone()).ok()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Take ownership of the content.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl std::fmt::Debug for HttpBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("HttpBody").field(&self.0.len()).finish()
    }
}

impl From<Vec<u8>> for HttpBody {
    fn from(v: Vec<u8>) -> Self {
        Self(v)
    }
}

impl From<String> for HttpBody {
    fn from(s: String) -> Self {
        Self(s.into_bytes())
    }
}

impl From<&str> for HttpBody {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

/// HTTP request structure. `target` is the raw request target, query included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    method: HttpMethod,
    target: String,
    headers: HttpHeaders,
    body: HttpBody,
}

impl HttpRequest {
    /// Create a new HTTP request.
    pub fn new(method: HttpMethod, target: impl Into<String>) -> Self {
        Self {
            method,
            target: target.into(),
            headers: HttpHeaders::new(),
            body: HttpBody::empty(),
        }
    }

    /// Get the HTTP method.
    pub fn method(&self) -> &HttpMethod {
        &self.method
    }

    /// The raw request target, e.g. `/search?q=kernel`.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// The path part of the target, percent-decoded.
    pub fn path(&self) -> String {
        let raw = self.target.split(['?', '#']).next().unwrap_or_default();
        percent_decode_str(raw).decode_utf8_lossy().into_owned()
    }

    /// The raw query string, if any.
    pub fn query_string(&self) -> Option<&str> {
        let (_, rest) = self.target.split_once('?')?;
        Some(rest.split('#').next().unwrap_or_default())
    }

    /// The first value of a query parameter, decoded as a form field
    /// (`+` is a space, then percent-decoding).
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.query_string()?.split('&').find_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            if decode_form_component(key) == name {
                Some(decode_form_component(value))
            } else {
                None
            }
        })
    }

    /// Get the request headers.
    pub fn headers(&self) -> &HttpHeaders {
        &self.headers
    }

    /// Get the request body.
    pub fn body(&self) -> &HttpBody {
        &self.body
    }

    /// Set the request body.
    pub fn with_body(mut self, body: impl Into<HttpBody>) -> Self {
        self.body = body.into();
        self
    }

    /// Set a header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key, value);
        self
    }
}

fn decode_form_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

/// HTTP status codes produced by the archive server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpStatusCode {
    Ok = 200,
    MovedPermanently = 301,
    BadRequest = 400,
    NotFound = 404,
    MethodNotAllowed = 405,
    InternalServerError = 500,
    /// Returned by the PAL when a service fails without producing a response.
    NetworkConnectTimeoutError = 599,
}

impl HttpStatusCode {
    /// Get the numeric status code.
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// Get the standard reason phrase.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::MovedPermanently => "Moved Permanently",
            Self::BadRequest => "Bad Request",
            Self::NotFound => "Not Found",
            Self::MethodNotAllowed => "Method Not Allowed",
            Self::InternalServerError => "Internal Server Error",
            Self::NetworkConnectTimeoutError => "Network Connect Timeout Error",
        }
    }
}

/// HTTP response structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    status: HttpStatusCode,
    headers: HttpHeaders,
    body: HttpBody,
}

impl HttpResponse {
    /// Create a new response with the given status.
    pub fn new(status: HttpStatusCode) -> Self {
        Self {
            status,
            headers: HttpHeaders::new(),
            body: HttpBody::empty(),
        }
    }

    /// Create a 200 OK response.
    pub fn ok() -> Self {
        Self::new(HttpStatusCode::Ok)
    }

    /// Create a 301 redirect to `location`.
    pub fn moved_permanently(location: impl Into<String>) -> Self {
        Self::new(HttpStatusCode::MovedPermanently).with_header("Location", location)
    }

    /// Get the status code.
    pub fn status(&self) -> HttpStatusCode {
        self.status
    }

    /// Get the headers.
    pub fn headers(&self) -> &HttpHeaders {
        &self.headers
    }

    /// Get the body.
    pub fn body(&self) -> &HttpBody {
        &self.body
    }

    /// Take ownership of the body.
    pub fn into_body(self) -> HttpBody {
        self.body
    }

    /// Set the response body.
    pub fn with_body(mut self, body: impl Into<HttpBody>) -> Self {
        self.body = body.into();
        self
    }

    /// Set a header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key, value);
        self
    }

    /// Set the Content-Type header.
    pub fn with_content_type(self, content_type: impl Into<String>) -> Self {
        self.with_header("Content-Type", content_type)
    }

    /// Set the status code.
    pub fn with_status(mut self, status: HttpStatusCode) -> Self {
        self.status = status;
        self
    }

    /// Create an HTML response.
    pub fn html(body: impl Into<String>) -> Self {
        Self::ok()
            .with_content_type("text/html; charset=utf-8")
            .with_body(body.into())
    }

    /// Create a JSON response.
    pub fn json(body: impl Into<String>) -> Self {
        Self::ok()
            .with_content_type("application/json")
            .with_body(body.into())
    }

    /// Create a plain text response.
    pub fn text(body: impl Into<String>) -> Self {
        Self::ok()
            .with_content_type("text/plain; charset=utf-8")
            .with_body(body.into())
    }
}

/// Configuration for the HTTP server.
#[derive(Debug, Clone)]
pub struct HttpServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on. If None, the OS will assign an available port.
    pub port: Option<u16>,
    /// Server name used in responses.
    pub server_name: String,
    /// Number of threads accepting and handling requests.
    pub workers: usize,
}

impl HttpServerConfig {
    /// Create a new configuration with the given host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// Set the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the server name.
    pub fn with_server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = name.into();
        self
    }

    /// Set the worker thread count (at least one).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Get the address string (host:port, port 0 for OS-assigned).
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port.unwrap_or(0))
    }
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: None,
            server_name: "forever-coolshell".to_string(),
            workers: 4,
        }
    }
}

/// Trait for handling HTTP requests.
///
/// Handlers are synchronous and may be called from several worker threads at
/// once. An `Err` is turned into an HTTP 599 response by the PAL, so services
/// that want a specific status must return it as an `Ok` response.
pub trait HttpService: std::fmt::Debug + Send + Sync + 'static {
    fn handle_request(&self, request: HttpRequest) -> crate::CoolshellResult<HttpResponse>;
}

#[derive(Debug)]
struct ServerState {
    port: u16,
    shutdown: Arc<AtomicBool>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl Drop for ServerState {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

/// Handle to a running HTTP server.
///
/// Clones share the server. When the last clone is dropped the shutdown flag is
/// raised and the workers stop after their current poll interval.
#[derive(Debug, Clone)]
pub struct HttpServerHandle {
    state: Arc<ServerState>,
}

impl HttpServerHandle {
    /// Create a new handle for the given port.
    pub fn new(port: u16) -> Self {
        Self {
            state: Arc::new(ServerState {
                port,
                shutdown: Arc::new(AtomicBool::new(false)),
                workers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.state.port
    }

    /// Get the full address (host:port) the server is listening on.
    pub fn address(&self, host: &str) -> String {
        format!("{}:{}", host, self.state.port)
    }

    /// Signal the server to shut down.
    pub fn shutdown(&self) {
        self.state.shutdown.store(true, Ordering::SeqCst);
    }

    /// Check if the server has been signaled to shut down.
    pub fn is_shutdown(&self) -> bool {
        self.state.shutdown.load(Ordering::SeqCst)
    }

    /// The shared shutdown flag, polled by worker threads.
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.state.shutdown)
    }

    /// Register a worker thread so that [`wait`](Self::wait) can join it.
    pub fn attach_worker(&self, worker: JoinHandle<()>) {
        self.state
            .workers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(worker);
    }

    /// Block until every worker thread has exited.
    pub fn wait(&self) {
        let workers: Vec<_> = self
            .state
            .workers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for worker in workers {
            if worker.join().is_err() {
                tracing::error!("HTTP worker thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_method_parse() {
        assert_eq!(HttpMethod::parse("GET"), HttpMethod::Get);
        assert_eq!(HttpMethod::parse("head"), HttpMethod::Head);
        assert_eq!(
            HttpMethod::parse("PROPFIND"),
            HttpMethod::Other("PROPFIND".to_string())
        );
        assert_eq!(HttpMethod::parse("PROPFIND").as_str(), "PROPFIND");
    }

    #[test]
    fn test_http_headers_case_insensitive() {
        let mut headers = HttpHeaders::new();
        headers.insert("Content-Type", "text/html");

        assert_eq!(headers.get("content-type"), Some(&"text/html".to_string()));
        assert!(headers.contains("CONTENT-TYPE"));
        assert!(!headers.contains("Location"));
    }

    #[test]
    fn test_request_path_strips_query_and_decodes() {
        let request = HttpRequest::new(HttpMethod::Get, "/articles/%E9%85%B7%E5%A3%B3.html?x=1");
        assert_eq!(request.path(), "/articles/酷壳.html");
        assert_eq!(request.query_string(), Some("x=1"));
    }

    #[test]
    fn test_query_param_decoding() {
        let request = HttpRequest::new(
            HttpMethod::Get,
            "/search?page=2&q=linux+kernel%21&q=ignored",
        );
        assert_eq!(request.query_param("q"), Some("linux kernel!".to_string()));
        assert_eq!(request.query_param("page"), Some("2".to_string()));
        assert_eq!(request.query_param("missing"), None);
    }

    #[test]
    fn test_query_param_without_value() {
        let request = HttpRequest::new(HttpMethod::Get, "/search?q");
        assert_eq!(request.query_param("q"), Some(String::new()));
        let request = HttpRequest::new(HttpMethod::Get, "/search");
        assert_eq!(request.query_param("q"), None);
    }

    #[test]
    fn test_query_param_utf8() {
        let request = HttpRequest::new(HttpMethod::Get, "/search?q=%E7%AE%97%E6%B3%95");
        assert_eq!(request.query_param("q"), Some("算法".to_string()));
    }

    #[test]
    fn test_http_response_helpers() {
        let html = HttpResponse::html("<p>hi</p>");
        assert_eq!(html.status(), HttpStatusCode::Ok);
        assert_eq!(
            html.headers().get("Content-Type"),
            Some(&"text/html; charset=utf-8".to_string())
        );

        let redirect = HttpResponse::moved_permanently("/page/1.html");
        assert_eq!(redirect.status().as_u16(), 301);
        assert_eq!(
            redirect.headers().get("location"),
            Some(&"/page/1.html".to_string())
        );
    }

    #[test]
    fn test_http_server_config() {
        let config = HttpServerConfig::new("0.0.0.0")
            .with_port(8080)
            .with_workers(0)
            .with_server_name("test-server");

        assert_eq!(config.address(), "0.0.0.0:8080");
        assert_eq!(config.workers, 1);
        assert_eq!(config.server_name, "test-server");
        assert_eq!(HttpServerConfig::default().address(), "127.0.0.1:0");
    }

    #[test]
    fn test_http_server_handle_shutdown_on_last_drop() {
        let handle = HttpServerHandle::new(8080);
        let flag = handle.shutdown_flag();
        let clone = handle.clone();

        drop(clone);
        assert!(!flag.load(Ordering::SeqCst));
        assert!(!handle.is_shutdown());

        drop(handle);
        assert!(flag.load(Ordering::SeqCst));
    }

    #[test]
    fn test_http_server_handle_wait_joins_workers() {
        let handle = HttpServerHandle::new(0);
        let flag = handle.shutdown_flag();
        handle.attach_worker(std::thread::spawn(move || {
            while !flag.load(Ordering::SeqCst) {
                std::thread::yield_now();
            }
        }));

        handle.shutdown();
        handle.wait();
        assert!(handle.is_shutdown());
    }
}
