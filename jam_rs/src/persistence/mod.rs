mod snapshot;
mod storage;

pub use snapshot::{SessionPersistence, Snapshot};
pub use storage::{FileStorage, IStorage, MemoryStorage};
