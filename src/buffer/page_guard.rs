use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use parking_lot::{RwLockReadGuard, RwLockWriteGuard};

use crate::common::{PageId, PAGE_SIZE};

use super::FrameHeader;

/// Callback invoked when a guard is dropped: (page_id, was_written).
/// The buffer pool uses it to OR in the dirty flag and release the pin.
pub(crate) type ReleaseCallback = Box<dyn FnOnce(PageId, bool) + Send + Sync>;

struct GuardState {
    page_id: PageId,
    /// Keeps the frame alive for as long as the latch guard below exists
    _frame: Arc<FrameHeader>,
    release: Option<ReleaseCallback>,
    was_written: bool,
}

impl GuardState {
    fn release(&mut self) {
        if let Some(release) = self.release.take() {
            release(self.page_id, self.was_written);
        }
    }
}

/// RAII guard for shared access to a page. Holds the frame's read latch and
/// the pin; dropping the guard releases both.
pub struct ReadPageGuard {
    state: GuardState,
    /// Read latch on the page bytes. Dropped before the release callback runs.
    latch: Option<RwLockReadGuard<'static, Box<[u8; PAGE_SIZE]>>>,
}

impl ReadPageGuard {
    /// # Safety
    /// The latch guard is transmuted to the 'static lifetime; the Arc stored
    /// alongside it keeps the frame alive for at least as long.
    pub(crate) unsafe fn new(
        page_id: PageId,
        frame: Arc<FrameHeader>,
        release: ReleaseCallback,
    ) -> Self {
        let latch = frame.data.read();
        let latch: RwLockReadGuard<'static, Box<[u8; PAGE_SIZE]>> = std::mem::transmute(latch);

        Self {
            state: GuardState {
                page_id,
                _frame: frame,
                release: Some(release),
                was_written: false,
            },
            latch: Some(latch),
        }
    }

    pub fn page_id(&self) -> PageId {
        self.state.page_id
    }

    pub fn data(&self) -> &[u8] {
        &self.latch.as_ref().unwrap()[..]
    }
}

impl Deref for ReadPageGuard {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.data()
    }
}

impl Drop for ReadPageGuard {
    fn drop(&mut self) {
        self.latch.take();
        self.state.release();
    }
}

/// RAII guard for exclusive access to a page. Holds the frame's write latch
/// and the pin; dropping the guard releases both, marking the page dirty if
/// `data_mut` was called.
pub struct WritePageGuard {
    state: GuardState,
    latch: Option<RwLockWriteGuard<'static, Box<[u8; PAGE_SIZE]>>>,
}

impl WritePageGuard {
    /// # Safety
    /// Same contract as [`ReadPageGuard::new`].
    pub(crate) unsafe fn new(
        page_id: PageId,
        frame: Arc<FrameHeader>,
        release: ReleaseCallback,
    ) -> Self {
        let latch = frame.data.write();
        let latch: RwLockWriteGuard<'static, Box<[u8; PAGE_SIZE]>> = std::mem::transmute(latch);

        Self {
            state: GuardState {
                page_id,
                _frame: frame,
                release: Some(release),
                was_written: false,
            },
            latch: Some(latch),
        }
    }

    pub fn page_id(&self) -> PageId {
        self.state.page_id
    }

    pub fn data(&self) -> &[u8] {
        &self.latch.as_ref().unwrap()[..]
    }

    /// Marks the page dirty and returns the writable page bytes.
    pub fn data_mut(&mut self) -> &mut [u8] {
        self.state.was_written = true;
        &mut self.latch.as_mut().unwrap()[..]
    }
}

impl Deref for WritePageGuard {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.data()
    }
}

impl DerefMut for WritePageGuard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.data_mut()
    }
}

impl Drop for WritePageGuard {
    fn drop(&mut self) {
        // Release the latch before the pin so no thread can observe the page
        // unpinned while still write-latched.
        self.latch.take();
        self.state.release();
    }
}
