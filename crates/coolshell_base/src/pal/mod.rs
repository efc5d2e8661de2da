/* 📖 # What is the Platform Abstraction Layer?

The PAL is the archive's only door to the outside world: reading the site
snapshot from disk (or from the executable) and listening for HTTP requests.
Engine code depends on the `Pal` trait; `RealPal` backs it with the filesystem and
tiny_http, `MockPal` with in-memory maps for tests.
*/

mod file_path;
mod glob;
pub mod http;
pub mod mock;
pub mod real_pal;
mod traits;

pub use file_path::FilePath;
pub use mock::MockPal;
pub use real_pal::RealPal;
pub use traits::{Pal, PalHandle, ReadSeek};
