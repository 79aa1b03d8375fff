use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::common::{FrameId, MinirelError, PageId, Result, PAGE_SIZE};
use crate::storage::DiskManager;

use super::frame::Frame;
use super::lru_replacer::LruReplacer;
use super::page_guard::PageGuard;

/// BufferPoolManager keeps a fixed number of page-sized frames in memory,
/// fetching pages from disk on demand and evicting the least recently used
/// unpinned page when all frames are taken. A dirty victim is flushed
/// before its frame is reused.
pub struct BufferPoolManager {
    /// Number of frames in the buffer pool
    pool_size: usize,
    /// The buffer pool frames
    frames: Vec<Arc<Frame>>,
    /// Page table: maps resident page IDs to frame IDs
    page_table: Mutex<HashMap<PageId, FrameId>>,
    /// Frames not currently holding any page
    free_list: Mutex<VecDeque<FrameId>>,
    /// LRU replacer for eviction decisions
    replacer: LruReplacer,
    disk: Arc<DiskManager>,
}

impl BufferPoolManager {
    pub fn new(pool_size: usize, disk: Arc<DiskManager>) -> Self {
        let mut frames = Vec::with_capacity(pool_size);
        let mut free_list = VecDeque::with_capacity(pool_size);

        for i in 0..pool_size {
            let frame_id = FrameId::new(i as u32);
            frames.push(Arc::new(Frame::new(frame_id)));
            free_list.push_back(frame_id);
        }

        Self {
            pool_size,
            frames,
            page_table: Mutex::new(HashMap::new()),
            free_list: Mutex::new(free_list),
            replacer: LruReplacer::new(pool_size),
            disk,
        }
    }

    pub fn disk(&self) -> &Arc<DiskManager> {
        &self.disk
    }

    /// Fetches a page, reading it from disk if it is not resident. The
    /// returned guard holds a pin on the frame until dropped.
    pub fn fetch_page(&self, page_id: PageId) -> Result<PageGuard<'_>> {
        // Already resident?
        {
            let page_table = self.page_table.lock();
            if let Some(&frame_id) = page_table.get(&page_id) {
                let frame = &self.frames[frame_id.as_usize()];
                frame.pin();
                self.replacer.record_access(frame_id);
                return Ok(PageGuard::new(self, page_id, Arc::clone(frame)));
            }
        }

        let frame_id = self.get_free_frame()?;
        let frame = &self.frames[frame_id.as_usize()];

        let mut data = [0u8; PAGE_SIZE];
        if let Err(e) = self.disk.read_page(page_id, &mut data) {
            // Hand the frame back so the pool does not shrink.
            self.free_list.lock().push_back(frame_id);
            return Err(e);
        }

        frame.set_page_id(page_id);
        frame.copy_from(&data);
        frame.set_dirty(false);
        frame.pin();

        self.page_table.lock().insert(page_id, frame_id);
        self.replacer.record_access(frame_id);

        Ok(PageGuard::new(self, page_id, Arc::clone(frame)))
    }

    /// Allocates a fresh page id and places a zero-filled frame for it in
    /// the pool. Nothing reaches disk until the page is flushed or evicted
    /// dirty, so the caller must initialize it through the guard.
    pub fn new_page(&self) -> Result<(PageId, PageGuard<'_>)> {
        let frame_id = self.get_free_frame()?;
        let frame = &self.frames[frame_id.as_usize()];

        let page_id = self.disk.allocate_page();

        frame.set_page_id(page_id);
        frame.pin();

        self.page_table.lock().insert(page_id, frame_id);
        self.replacer.record_access(frame_id);

        Ok((page_id, PageGuard::new(self, page_id, Arc::clone(frame))))
    }

    /// Releases one pin on the page. A dirty release marks the frame so the
    /// next flush or eviction writes it out. Unpinning a page that is not
    /// resident or not pinned is a no-op.
    pub fn unpin(&self, page_id: PageId, dirty: bool) {
        let page_table = self.page_table.lock();
        if let Some(&frame_id) = page_table.get(&page_id) {
            let frame = &self.frames[frame_id.as_usize()];
            if dirty {
                frame.set_dirty(true);
            }
            frame.unpin();
        }
    }

    /// Writes the page to disk if it is resident, clearing its dirty flag.
    /// Returns whether the page was resident.
    pub fn flush_page(&self, page_id: PageId) -> Result<bool> {
        let page_table = self.page_table.lock();

        if let Some(&frame_id) = page_table.get(&page_id) {
            let frame = &self.frames[frame_id.as_usize()];

            let mut data = [0u8; PAGE_SIZE];
            frame.copy_to(&mut data);
            self.disk.write_page(page_id, &data)?;
            frame.set_dirty(false);

            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Writes every dirty resident page to disk.
    pub fn flush_all(&self) -> Result<()> {
        let page_table = self.page_table.lock();

        for (&page_id, &frame_id) in page_table.iter() {
            let frame = &self.frames[frame_id.as_usize()];
            if frame.is_dirty() {
                let mut data = [0u8; PAGE_SIZE];
                frame.copy_to(&mut data);
                self.disk.write_page(page_id, &data)?;
                frame.set_dirty(false);
            }
        }

        Ok(())
    }

    /// Returns the pin count for a resident page.
    pub fn pin_count(&self, page_id: PageId) -> Option<u32> {
        let page_table = self.page_table.lock();
        page_table
            .get(&page_id)
            .map(|&frame_id| self.frames[frame_id.as_usize()].pin_count())
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn free_frame_count(&self) -> usize {
        self.free_list.lock().len()
    }

    /// Gets a free frame, either from the free list or by evicting the
    /// least recently used unpinned page.
    fn get_free_frame(&self) -> Result<FrameId> {
        {
            let mut free_list = self.free_list.lock();
            if let Some(frame_id) = free_list.pop_front() {
                return Ok(frame_id);
            }
        }

        let victim = self
            .replacer
            .find_victim(|frame_id| self.frames[frame_id.as_usize()].pin_count() == 0)
            .ok_or(MinirelError::NoVictimFrame)?;

        let frame = &self.frames[victim.as_usize()];
        let old_page_id = frame.page_id();

        if frame.is_dirty() {
            let mut data = [0u8; PAGE_SIZE];
            frame.copy_to(&mut data);
            self.disk.write_page(old_page_id, &data)?;
        }

        self.page_table.lock().remove(&old_page_id);
        frame.reset();

        Ok(victim)
    }
}
