//! Tarn - the storage core of a disk-oriented database engine
//!
//! This crate provides the two hard pieces under a relational engine: a
//! fixed-size buffer pool that mediates between a paged on-disk store and
//! in-memory frames, and a concurrent B+Tree index built on top of it.
//!
//! # Architecture
//!
//! - **Storage layer** (`storage`): page-granular disk I/O
//!   - `DiskManager`: reads, writes, allocates and deallocates pages
//!   - `DiskScheduler`: background worker thread for disk requests
//!   - `HeaderPage`: the well-known page 0, mapping index names to root
//!     page ids
//!
//! - **Buffer pool** (`buffer`): memory management for database pages
//!   - `BufferPoolManager`: caches pages in frames, evicting through a
//!     pluggable `Replacer` (`LruReplacer` or `ClockReplacer`)
//!   - `ReadPageGuard`/`WritePageGuard`: RAII guards combining the pin and
//!     the per-frame latch
//!
//! - **Index** (`index`): ordered access
//!   - `BPlusTree`: point lookups, inserts with node splits, deletes with
//!     redistribution and merges, all under latch crabbing
//!   - `IndexIterator`: forward range cursor over the leaf chain
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tarn::buffer::{BufferPoolManager, ReplacerPolicy};
//! use tarn::index::{BPlusTree, NumericComparator};
//! use tarn::storage::disk::DiskManager;
//! use tarn::{PageId, RecordId, SlotId};
//!
//! let disk_manager = Arc::new(DiskManager::new("test.db").unwrap());
//! let bpm = Arc::new(BufferPoolManager::new(64, ReplacerPolicy::Lru, disk_manager));
//!
//! let tree = BPlusTree::new("my_index", bpm, Arc::new(NumericComparator), 32, 32).unwrap();
//! tree.insert(42, RecordId::new(PageId::new(1), SlotId::new(0))).unwrap();
//! assert!(tree.get_value(42).unwrap().is_some());
//! ```

pub mod buffer;
pub mod common;
pub mod index;
pub mod storage;

// Re-export commonly used types at the crate root
pub use common::{FrameId, PageId, RecordId, Result, SlotId, TarnError};
