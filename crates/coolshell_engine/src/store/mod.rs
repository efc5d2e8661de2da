pub mod memory;
pub mod snapshot_store;
pub mod traits;

pub use memory::InMemoryStore;
pub use snapshot_store::SnapshotStore;
pub use traits::{ContentStore, StoreHandle};
