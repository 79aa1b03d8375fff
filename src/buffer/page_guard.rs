use std::cell::Cell;
use std::sync::Arc;

use parking_lot::{RwLockReadGuard, RwLockWriteGuard};

use crate::common::{PageId, PAGE_SIZE};

use super::buffer_pool_manager::BufferPoolManager;
use super::frame::Frame;

/// RAII handle over a pinned page. Dropping the guard unpins the page and
/// reports whether it was written through this handle, so callers cannot
/// leak a pin on an early return.
pub struct PageGuard<'a> {
    bpm: &'a BufferPoolManager,
    page_id: PageId,
    frame: Arc<Frame>,
    dirty: Cell<bool>,
}

impl<'a> PageGuard<'a> {
    pub(super) fn new(bpm: &'a BufferPoolManager, page_id: PageId, frame: Arc<Frame>) -> Self {
        Self {
            bpm,
            page_id,
            frame,
            dirty: Cell::new(false),
        }
    }

    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Read access to the page bytes.
    pub fn data(&self) -> RwLockReadGuard<'_, Box<[u8; PAGE_SIZE]>> {
        self.frame.read_data()
    }

    /// Write access to the page bytes. Taking it marks the page dirty.
    pub fn data_mut(&self) -> RwLockWriteGuard<'_, Box<[u8; PAGE_SIZE]>> {
        self.dirty.set(true);
        self.frame.write_data()
    }

    pub fn mark_dirty(&self) {
        self.dirty.set(true);
    }
}

impl Drop for PageGuard<'_> {
    fn drop(&mut self) {
        self.bpm.unpin(self.page_id, self.dirty.get());
    }
}
