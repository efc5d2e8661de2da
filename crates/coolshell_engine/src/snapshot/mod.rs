pub mod archive;
pub mod directory;
pub mod traits;

pub use archive::ZipSnapshot;
pub use directory::DirectorySnapshot;
pub use traits::{SiteSnapshot, SnapshotHandle};
