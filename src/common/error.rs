use thiserror::Error;

use super::types::PageId;

/// Storage engine error types
#[derive(Error, Debug)]
pub enum TarnError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid page ID: {0}")]
    InvalidPageId(PageId),

    #[error("Buffer pool is full, no evictable frames available")]
    BufferPoolFull,

    #[error("Page {0} is still pinned")]
    PageStillPinned(PageId),

    #[error("Channel error: {0}")]
    Channel(String),

    #[error("Operation on an empty tree")]
    TreeEmpty,

    #[error("Index iterator dereferenced past the end")]
    IteratorOutOfRange,

    #[error("Index name too long: {0}")]
    IndexNameTooLong(String),

    #[error("Header page is full")]
    HeaderPageFull,

    #[error("Index corrupted: {0}")]
    Corrupted(String),
}

pub type Result<T> = std::result::Result<T, TarnError>;
