use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::common::FrameId;

/// Least-recently-used eviction policy.
///
/// Frames are kept in access order, most recent at the front. A victim is
/// the least recently used frame the caller deems evictable (pin count 0);
/// pinned frames are skipped, not removed, so they regain their place in
/// the order once unpinned.
pub struct LruReplacer {
    order: Mutex<VecDeque<FrameId>>,
}

impl LruReplacer {
    pub fn new(capacity: usize) -> Self {
        Self {
            order: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Moves the frame to the most-recently-used position, inserting it if
    /// it was not tracked yet.
    pub fn record_access(&self, frame_id: FrameId) {
        let mut order = self.order.lock();
        if let Some(pos) = order.iter().position(|&f| f == frame_id) {
            order.remove(pos);
        }
        order.push_front(frame_id);
    }

    /// Stops tracking the frame entirely.
    pub fn remove(&self, frame_id: FrameId) {
        let mut order = self.order.lock();
        if let Some(pos) = order.iter().position(|&f| f == frame_id) {
            order.remove(pos);
        }
    }

    /// Scans from the least recently used end and returns the first frame
    /// for which `evictable` holds, removing it from the order.
    pub fn find_victim<F>(&self, evictable: F) -> Option<FrameId>
    where
        F: Fn(FrameId) -> bool,
    {
        let mut order = self.order.lock();
        let pos = order.iter().rposition(|&f| evictable(f))?;
        order.remove(pos)
    }
}
