use parking_lot::Mutex;

use crate::common::FrameId;

use super::Replacer;

struct ClockEntry {
    frame_id: FrameId,
    referenced: bool,
}

struct ClockInner {
    ring: Vec<ClockEntry>,
    hand: usize,
}

impl ClockInner {
    fn position(&self, frame_id: FrameId) -> Option<usize> {
        self.ring.iter().position(|e| e.frame_id == frame_id)
    }

    fn remove(&mut self, pos: usize) -> FrameId {
        let entry = self.ring.remove(pos);
        if pos < self.hand {
            self.hand -= 1;
        }
        if self.hand >= self.ring.len() {
            self.hand = 0;
        }
        entry.frame_id
    }

    /// Second-chance sweep: a set reference bit buys the frame one pass;
    /// the first frame found with a clear bit is the victim. A full sweep
    /// clears every bit, so the sweep after it always selects.
    fn sweep(&mut self) -> Option<FrameId> {
        if self.ring.is_empty() {
            return None;
        }
        loop {
            if self.hand >= self.ring.len() {
                self.hand = 0;
            }
            if self.ring[self.hand].referenced {
                self.ring[self.hand].referenced = false;
                self.hand += 1;
            } else {
                return Some(self.remove(self.hand));
            }
        }
    }
}

/// Clock (second-chance) eviction: candidates sit on a circular buffer with
/// a per-frame reference bit, approximating LRU without reordering on use.
pub struct ClockReplacer {
    inner: Mutex<ClockInner>,
    capacity: usize,
}

impl ClockReplacer {
    pub fn new(num_frames: usize) -> Self {
        Self {
            inner: Mutex::new(ClockInner {
                ring: Vec::with_capacity(num_frames),
                hand: 0,
            }),
            capacity: num_frames,
        }
    }
}

impl Replacer for ClockReplacer {
    fn victim(&self) -> Option<FrameId> {
        self.inner.lock().sweep()
    }

    fn pin(&self, frame_id: FrameId) {
        let mut inner = self.inner.lock();
        if let Some(pos) = inner.position(frame_id) {
            inner.remove(pos);
        }
    }

    fn unpin(&self, frame_id: FrameId) {
        let mut inner = self.inner.lock();
        if inner.position(frame_id).is_some() {
            return;
        }
        if inner.ring.len() == self.capacity {
            inner.sweep();
        }
        inner.ring.push(ClockEntry {
            frame_id,
            referenced: true,
        });
    }

    fn size(&self) -> usize {
        self.inner.lock().ring.len()
    }
}
