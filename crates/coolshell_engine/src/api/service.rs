/* 📖 # Why a single ArchiveService?

The whole site is one `HttpService`: the `/` redirect, the two search endpoints
and the static mounts are routed by plain string matching inside
`handle_request`. There is one thing to register with the PAL and one thing to
drive from tests through `MockPal::simulate_request`.

Every expected failure (bad method, missing query, unknown file, storage error)
becomes a proper HTTP response here. An `Err` from `handle_request` is reserved
for bugs, which the PAL turns into a 599.
*/

use std::fmt;
use std::sync::Arc;

use coolshell_base::pal::http::{
    HttpBody, HttpMethod, HttpRequest, HttpResponse, HttpService, HttpStatusCode,
};
use coolshell_base::tracing::{debug, error, instrument, warn};
use coolshell_base::{CoolshellError, CoolshellResult, FilePath};
use serde::Serialize;

use crate::api::render::{render_error_page, render_search_page};
use crate::config::{Config, MountConfig};
use crate::search::{ArticleSearch, SearchResult};
use crate::snapshot::SnapshotHandle;
use crate::store::StoreHandle;

const MISSING_QUERY: &str = "Query parameter 'q' is required";

/// JSON body of `/api/search`.
#[derive(Serialize)]
struct SearchResponse<'a> {
    query: &'a str,
    results: &'a [SearchResult],
}

/// JSON body of `/api/search` failures.
#[derive(Serialize)]
struct ErrorResponse<'a> {
    error: &'a str,
}

/// Site-wide settings the service needs from [`Config`].
#[derive(Debug, Clone)]
struct SiteSettings {
    title: String,
    index_redirect: String,
    /// Longest prefix first.
    mounts: Vec<MountConfig>,
}

/// HTTP service for the archived site.
///
/// Routes (GET and HEAD only):
/// - `/` redirects to the first pagination page
/// - `/search?q=...` renders the result page
/// - `/api/search?q=...` returns results as JSON
/// - configured mounts serve files from the snapshot
#[derive(Debug, Clone)]
pub struct ArchiveService {
    snapshot: SnapshotHandle,
    store: StoreHandle,
    search: ArticleSearch,
    settings: Arc<SiteSettings>,
}

enum SearchOutcome {
    Found(Vec<SearchResult>),
    MissingQuery,
    Failed,
}

impl ArchiveService {
    pub fn new(snapshot: SnapshotHandle, store: StoreHandle, config: &Config) -> Self {
        Self {
            snapshot,
            store,
            search: ArticleSearch::new(config.link_strip_segment.clone()),
            settings: Arc::new(SiteSettings {
                title: config.title.clone(),
                index_redirect: config.index_redirect.clone(),
                mounts: config.mounts_by_specificity(),
            }),
        }
    }

    fn html_response(page: Result<String, fmt::Error>) -> CoolshellResult<HttpResponse> {
        page.map(HttpResponse::html)
            .map_err(|e| coolshell_base::err!("HTML rendering error: {}", e))
    }

    fn error_page(&self, status: HttpStatusCode, message: &str) -> CoolshellResult<HttpResponse> {
        let heading = format!("{} {}", status.as_u16(), status.reason_phrase());
        Ok(
            Self::html_response(render_error_page(&self.settings.title, &heading, message))?
                .with_status(status),
        )
    }

    fn json_response<T: Serialize>(data: &T) -> CoolshellResult<HttpResponse> {
        serde_json::to_string(data)
            .map(HttpResponse::json)
            .map_err(|e| coolshell_base::err!("JSON serialization error: {}", e))
    }

    fn run_search(&self, query: Option<String>) -> (String, SearchOutcome) {
        let query = query.unwrap_or_default();
        if query.is_empty() {
            return (query, SearchOutcome::MissingQuery);
        }
        match self.search.search(&*self.store, &query) {
            Ok(results) => (query, SearchOutcome::Found(results)),
            Err(e) => {
                error!(query = %query, "search failed: {:?}", e);
                (query, SearchOutcome::Failed)
            }
        }
    }

    fn handle_search_page(&self, request: &HttpRequest) -> CoolshellResult<HttpResponse> {
        match self.run_search(request.query_param("q")) {
            (query, SearchOutcome::Found(results)) => Self::html_response(render_search_page(
                &self.settings.title,
                &query,
                &results,
            )),
            (_, SearchOutcome::MissingQuery) => {
                self.error_page(HttpStatusCode::BadRequest, MISSING_QUERY)
            }
            (_, SearchOutcome::Failed) => self.error_page(
                HttpStatusCode::InternalServerError,
                "The article archive could not be searched",
            ),
        }
    }

    fn handle_search_api(&self, request: &HttpRequest) -> CoolshellResult<HttpResponse> {
        match self.run_search(request.query_param("q")) {
            (query, SearchOutcome::Found(results)) => Self::json_response(&SearchResponse {
                query: &query,
                results: &results,
            }),
            (_, SearchOutcome::MissingQuery) => {
                Ok(Self::json_response(&ErrorResponse {
                    error: MISSING_QUERY,
                })?
                .with_status(HttpStatusCode::BadRequest))
            }
            (_, SearchOutcome::Failed) => Ok(Self::json_response(&ErrorResponse {
                error: "The article archive could not be searched",
            })?
            .with_status(HttpStatusCode::InternalServerError)),
        }
    }

    /// Find the mount serving `path` and the remainder of the path below it.
    fn find_mount<'a>(&self, path: &'a str) -> Option<(&MountConfig, &'a str)> {
        self.settings.mounts.iter().find_map(|mount| {
            let rest = path.strip_prefix(mount.url_prefix.as_str())?;
            (rest.is_empty() || rest.starts_with('/')).then_some((mount, rest))
        })
    }

    fn read_failed(&self, file: &FilePath, e: Box<CoolshellError>) -> CoolshellResult<HttpResponse> {
        error!(path = %file, "failed to read from snapshot: {:?}", e);
        self.error_page(
            HttpStatusCode::InternalServerError,
            "The requested file could not be read",
        )
    }

    /// `path` is the decoded request path; redirects reuse the raw one.
    fn handle_static(&self, path: &str, raw_path: &str) -> CoolshellResult<HttpResponse> {
        let Some((mount, rest)) = self.find_mount(path) else {
            return self.not_found(path);
        };
        if rest.is_empty() {
            return Ok(HttpResponse::moved_permanently(format!("{}/", raw_path)));
        }
        if rest.split('/').any(|segment| segment == "..") {
            warn!(path, "rejected path escaping its mount");
            return self.not_found(path);
        }

        let relative = rest.trim_start_matches('/');
        let directory = FilePath::from(mount.directory.as_str());
        let wants_index = rest.ends_with('/');
        let file = if wants_index {
            directory.join(format!("{}index.html", relative))
        } else {
            directory.join(relative)
        };

        match self.snapshot.read(&file) {
            Ok(Some(content)) => {
                debug!(path, file = %file, size = content.len(), "serving static file");
                Ok(HttpResponse::ok()
                    .with_content_type(guess_content_type(file.as_str()))
                    .with_body(content))
            }
            Ok(None) if !wants_index => {
                // a directory requested without its trailing slash
                let index = file.join("index.html");
                match self.snapshot.read(&index) {
                    Ok(Some(_)) => Ok(HttpResponse::moved_permanently(format!("{}/", raw_path))),
                    Ok(None) => self.not_found(path),
                    Err(e) => self.read_failed(&index, e),
                }
            }
            Ok(None) => self.not_found(path),
            Err(e) => self.read_failed(&file, e),
        }
    }

    fn not_found(&self, path: &str) -> CoolshellResult<HttpResponse> {
        debug!(path, "not found");
        self.error_page(
            HttpStatusCode::NotFound,
            &format!("No archived page at {}", path),
        )
    }
}

impl HttpService for ArchiveService {
    #[instrument(skip_all, fields(method = %request.method(), target = request.target()))]
    fn handle_request(&self, request: HttpRequest) -> CoolshellResult<HttpResponse> {
        let is_head = match request.method() {
            HttpMethod::Get => false,
            HttpMethod::Head => true,
            other => {
                debug!(method = %other, "method not allowed");
                return Ok(self
                    .error_page(
                        HttpStatusCode::MethodNotAllowed,
                        "Only GET and HEAD requests are supported",
                    )?
                    .with_header("Allow", "GET, HEAD"));
            }
        };

        let path = request.path();
        let response = match path.as_str() {
            "/" => HttpResponse::moved_permanently(self.settings.index_redirect.clone()),
            "/search" => self.handle_search_page(&request)?,
            "/api/search" => self.handle_search_api(&request)?,
            _ => {
                let raw_path = request.target().split(['?', '#']).next().unwrap_or_default();
                self.handle_static(&path, raw_path)?
            }
        };

        if is_head {
            return Ok(response.with_body(HttpBody::empty()));
        }
        Ok(response)
    }
}

/// MIME type for a snapshot file, by extension.
pub(crate) fn guess_content_type(path: &str) -> &'static str {
    let extension = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "application/javascript",
        "json" => "application/json",
        "xml" => "application/xml",
        "txt" => "text/plain; charset=utf-8",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "mp4" => "video/mp4",
        _ => "application/octet-stream",
    }
}
