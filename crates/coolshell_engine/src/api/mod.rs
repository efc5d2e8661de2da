/* 📖 # What does the api module serve?

Everything a browser sees: the archived pages and assets from the snapshot, the
search result page and the JSON search endpoint. It is all one `HttpService`
(`ArchiveService`), so `RealPal` and `MockPal` run exactly the same code.
*/

pub mod render;
mod service;

pub use service::ArchiveService;
