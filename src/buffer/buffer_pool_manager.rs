use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use log::debug;
use parking_lot::Mutex;

use crate::common::{FrameId, PageId, Result, TarnError, INVALID_PAGE_ID};
use crate::storage::disk::{DiskManager, DiskScheduler};

use super::{
    ClockReplacer, FrameHeader, LruReplacer, ReadPageGuard, Replacer, ReplacerPolicy,
    WritePageGuard,
};

/// Bookkeeping guarded by the pool's mutex. The page table is a bijection
/// between resident page ids and occupied frames; the free list holds frames
/// with no resident page. Free list and replacer are disjoint.
struct Bookkeeping {
    page_table: HashMap<PageId, FrameId>,
    free_list: VecDeque<FrameId>,
}

/// State shared with guard release callbacks.
struct PoolState {
    frames: Vec<Arc<FrameHeader>>,
    bookkeeping: Mutex<Bookkeeping>,
    replacer: Box<dyn Replacer>,
}

/// BufferPoolManager mediates between the disk and a fixed array of page
/// frames. Pages are fetched through RAII guards: acquiring a guard pins the
/// page and takes its frame latch, dropping it releases both (OR-ing the
/// dirty flag in). When no free frame exists the replacer picks an unpinned
/// victim, which is written back first if dirty.
pub struct BufferPoolManager {
    pool_size: usize,
    state: Arc<PoolState>,
    disk_scheduler: DiskScheduler,
}

impl BufferPoolManager {
    pub fn new(pool_size: usize, policy: ReplacerPolicy, disk_manager: Arc<DiskManager>) -> Self {
        let mut frames = Vec::with_capacity(pool_size);
        let mut free_list = VecDeque::with_capacity(pool_size);

        for i in 0..pool_size {
            let frame_id = FrameId::new(i as u32);
            frames.push(Arc::new(FrameHeader::new(frame_id)));
            free_list.push_back(frame_id);
        }

        let replacer: Box<dyn Replacer> = match policy {
            ReplacerPolicy::Lru => Box::new(LruReplacer::new(pool_size)),
            ReplacerPolicy::Clock => Box::new(ClockReplacer::new(pool_size)),
        };

        Self {
            pool_size,
            state: Arc::new(PoolState {
                frames,
                bookkeeping: Mutex::new(Bookkeeping {
                    page_table: HashMap::new(),
                    free_list,
                }),
                replacer,
            }),
            disk_scheduler: DiskScheduler::new(disk_manager),
        }
    }

    /// Fetches a page for shared access. Fails with `BufferPoolFull` when the
    /// page is not resident and every frame is pinned.
    pub fn fetch_page_read(&self, page_id: PageId) -> Result<ReadPageGuard> {
        let frame_id = self.fetch_frame(page_id)?;
        let frame = Arc::clone(&self.state.frames[frame_id.as_usize()]);
        Ok(unsafe { ReadPageGuard::new(page_id, frame, self.release_callback()) })
    }

    /// Fetches a page for exclusive access.
    pub fn fetch_page_write(&self, page_id: PageId) -> Result<WritePageGuard> {
        let frame_id = self.fetch_frame(page_id)?;
        let frame = Arc::clone(&self.state.frames[frame_id.as_usize()]);
        Ok(unsafe { WritePageGuard::new(page_id, frame, self.release_callback()) })
    }

    /// Allocates a fresh page and returns it write-latched and pinned, its
    /// bytes zeroed.
    pub fn new_page(&self) -> Result<WritePageGuard> {
        let mut bk = self.state.bookkeeping.lock();

        let frame_id = self.acquire_frame(&mut bk)?;
        let frame = &self.state.frames[frame_id.as_usize()];

        let page_id = match self.disk_scheduler.disk_manager().allocate_page() {
            Ok(page_id) => page_id,
            Err(e) => {
                bk.free_list.push_back(frame_id);
                return Err(e);
            }
        };

        frame.set_page_id(page_id);
        frame.pin();
        bk.page_table.insert(page_id, frame_id);
        drop(bk);

        debug!("allocated {} in {}", page_id, frame_id);

        let frame = Arc::clone(&self.state.frames[frame_id.as_usize()]);
        Ok(unsafe { WritePageGuard::new(page_id, frame, self.release_callback()) })
    }

    /// Deletes a page. The disk page is deallocated regardless of residency;
    /// a resident pinned page fails with `PageStillPinned`.
    pub fn delete_page(&self, page_id: PageId) -> Result<bool> {
        let mut bk = self.state.bookkeeping.lock();

        self.disk_scheduler.disk_manager().deallocate_page(page_id);

        let Some(&frame_id) = bk.page_table.get(&page_id) else {
            return Ok(true);
        };

        let frame = &self.state.frames[frame_id.as_usize()];
        if frame.pin_count() > 0 {
            return Err(TarnError::PageStillPinned(page_id));
        }

        // Drop the frame from the candidate set; it belongs to the free list now.
        self.state.replacer.pin(frame_id);
        bk.page_table.remove(&page_id);
        frame.reset();
        bk.free_list.push_back(frame_id);

        Ok(true)
    }

    /// Writes a resident page back to disk and clears its dirty flag.
    /// Returns false if the page is not resident.
    pub fn flush_page(&self, page_id: PageId) -> Result<bool> {
        let bk = self.state.bookkeeping.lock();

        let Some(&frame_id) = bk.page_table.get(&page_id) else {
            return Ok(false);
        };

        let frame = &self.state.frames[frame_id.as_usize()];
        self.disk_scheduler
            .write_page_sync(page_id, frame.copy_data())?;
        frame.set_dirty(false);
        Ok(true)
    }

    /// Writes every resident page back to disk.
    pub fn flush_all_pages(&self) -> Result<()> {
        let bk = self.state.bookkeeping.lock();

        for (&page_id, &frame_id) in bk.page_table.iter() {
            let frame = &self.state.frames[frame_id.as_usize()];
            self.disk_scheduler
                .write_page_sync(page_id, frame.copy_data())?;
            frame.set_dirty(false);
        }
        Ok(())
    }

    /// Pin count of a resident page, None if not resident.
    pub fn pin_count(&self, page_id: PageId) -> Option<u32> {
        let bk = self.state.bookkeeping.lock();
        bk.page_table
            .get(&page_id)
            .map(|&frame_id| self.state.frames[frame_id.as_usize()].pin_count())
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn free_frame_count(&self) -> usize {
        self.state.bookkeeping.lock().free_list.len()
    }

    pub fn disk_manager(&self) -> &Arc<DiskManager> {
        self.disk_scheduler.disk_manager()
    }

    /// Brings the page into a frame (if not already resident) and pins it.
    fn fetch_frame(&self, page_id: PageId) -> Result<FrameId> {
        if page_id == INVALID_PAGE_ID {
            return Err(TarnError::InvalidPageId(page_id));
        }

        let mut bk = self.state.bookkeeping.lock();

        if let Some(&frame_id) = bk.page_table.get(&page_id) {
            self.state.frames[frame_id.as_usize()].pin();
            self.state.replacer.pin(frame_id);
            return Ok(frame_id);
        }

        let frame_id = self.acquire_frame(&mut bk)?;

        let data = match self.disk_scheduler.read_page_sync(page_id) {
            Ok(data) => data,
            Err(e) => {
                bk.free_list.push_back(frame_id);
                return Err(e);
            }
        };

        let frame = &self.state.frames[frame_id.as_usize()];
        frame.set_page_id(page_id);
        frame.copy_from(&data[..]);
        frame.set_dirty(false);
        frame.pin();
        bk.page_table.insert(page_id, frame_id);

        Ok(frame_id)
    }

    /// Produces an empty frame: free list first, otherwise evict a victim,
    /// writing it back if dirty. The bookkeeping mutex stays held across the
    /// eviction write-back.
    fn acquire_frame(&self, bk: &mut Bookkeeping) -> Result<FrameId> {
        if let Some(frame_id) = bk.free_list.pop_front() {
            return Ok(frame_id);
        }

        let Some(frame_id) = self.state.replacer.victim() else {
            return Err(TarnError::BufferPoolFull);
        };

        let frame = &self.state.frames[frame_id.as_usize()];
        let old_page_id = frame.page_id();

        if frame.is_dirty() {
            debug!("evicting dirty {} from {}", old_page_id, frame_id);
            if let Err(e) = self
                .disk_scheduler
                .write_page_sync(old_page_id, frame.copy_data())
            {
                self.state.replacer.unpin(frame_id);
                return Err(e);
            }
        } else {
            debug!("evicting {} from {}", old_page_id, frame_id);
        }

        bk.page_table.remove(&old_page_id);
        frame.reset();
        Ok(frame_id)
    }

    fn release_callback(&self) -> super::page_guard::ReleaseCallback {
        let state = Arc::clone(&self.state);
        Box::new(move |page_id, was_written| {
            let bk = state.bookkeeping.lock();
            if let Some(&frame_id) = bk.page_table.get(&page_id) {
                let frame = &state.frames[frame_id.as_usize()];
                if was_written {
                    frame.set_dirty(true);
                }
                if frame.unpin() == Some(0) {
                    state.replacer.unpin(frame_id);
                }
            }
        })
    }
}
