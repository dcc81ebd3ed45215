use hashlink::LinkedHashSet;
use parking_lot::Mutex;

use crate::common::FrameId;

use super::Replacer;

/// Strict least-recently-used eviction. Candidates live in a linked hash set
/// ordered front (least recent) to back (most recent), giving O(1) insert,
/// remove and victim selection.
pub struct LruReplacer {
    queue: Mutex<LinkedHashSet<FrameId>>,
    capacity: usize,
}

impl LruReplacer {
    pub fn new(num_frames: usize) -> Self {
        Self {
            queue: Mutex::new(LinkedHashSet::new()),
            capacity: num_frames,
        }
    }
}

impl Replacer for LruReplacer {
    fn victim(&self) -> Option<FrameId> {
        self.queue.lock().pop_front()
    }

    fn pin(&self, frame_id: FrameId) {
        self.queue.lock().remove(&frame_id);
    }

    fn unpin(&self, frame_id: FrameId) {
        let mut queue = self.queue.lock();
        if queue.contains(&frame_id) {
            return;
        }
        if queue.len() == self.capacity {
            queue.pop_front();
        }
        queue.insert(frame_id);
    }

    fn size(&self) -> usize {
        self.queue.lock().len()
    }
}
