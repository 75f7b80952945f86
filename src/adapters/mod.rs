// Adapters layer: concrete implementations for external systems (storage, log sink, terminal input)

pub mod activity_log;
pub mod input;
pub mod record;
pub mod storage;

pub use activity_log::{FileActivityLog, MemoryActivityLog};
pub use input::ClientReader;
pub use storage::FsGoodStore;
