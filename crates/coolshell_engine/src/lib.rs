/* 📖 # What lives in coolshell_engine?

Everything specific to the archive: reading the site snapshot, the article
corpus built on top of it, field extraction, search and the HTTP service that
serves pages and search results. Platform access (files, sockets) comes from
coolshell_base.
*/

pub mod api;
pub mod config;
pub mod document;
pub mod extractor;
pub mod search;
pub mod snapshot;
pub mod store;

pub use api::ArchiveService;
pub use config::{CONFIG_FILE_NAME, Config, MountConfig, PortSource, load_config};
pub use document::Document;
pub use extractor::{PublishDate, extract_date, extract_snippet};
pub use search::{ArticleSearch, SearchResult, derive_link};
pub use snapshot::{DirectorySnapshot, SiteSnapshot, SnapshotHandle, ZipSnapshot};
pub use store::{ContentStore, InMemoryStore, SnapshotStore, StoreHandle};
