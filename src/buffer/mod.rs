mod buffer_pool_manager;
mod clock_replacer;
mod frame_header;
mod lru_replacer;
mod page_guard;
mod replacer;

pub use buffer_pool_manager::BufferPoolManager;
pub use clock_replacer::ClockReplacer;
pub use frame_header::FrameHeader;
pub use lru_replacer::LruReplacer;
pub use page_guard::{ReadPageGuard, WritePageGuard};
pub use replacer::{Replacer, ReplacerPolicy};
