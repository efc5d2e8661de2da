/* 📖 # Why have coolshell_base as a separate crate?
coolshell_base holds the error type, tracing setup and the platform abstraction
layer (filesystem and HTTP serving). The engine and the CLI both build on it, and
keeping it free of archive semantics lets the mock platform be reused in any test.
*/

pub mod error;
pub mod pal;
mod pal_tests;
pub mod tracing;

pub use error::{CoolshellError, CoolshellResult, ErrorKind, ResultExt};
pub use pal::{FilePath, MockPal, Pal, PalHandle, ReadSeek, RealPal};
