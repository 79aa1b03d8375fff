use std::sync::Arc;

use crate::buffer::BufferPoolManager;
use crate::common::{PageId, Result, FSM_CAPACITY, FSM_PAGE_ID, LAST_PAGE_ID};

use super::page::HeapPage;

/// Tracks the free space of every heap page so inserts can reuse partially
/// filled pages instead of always appending.
///
/// The map is one reserved page holding a flat array of big-endian u16
/// values indexed by page id - no page header, so the page id space it can
/// describe is PAGE_SIZE / 2. Pages beyond that range simply read as full
/// and never get reused, which degrades placement but not correctness.
pub struct FreeSpaceMap {
    bpm: Arc<BufferPoolManager>,
}

impl FreeSpaceMap {
    pub fn new(bpm: Arc<BufferPoolManager>) -> Self {
        Self { bpm }
    }

    /// Returns the recorded free space for a page, or 0 when the page id
    /// falls outside the map.
    pub fn get(&self, page_id: PageId) -> Result<usize> {
        if page_id.as_usize() >= FSM_CAPACITY {
            return Ok(0);
        }

        let guard = self.bpm.fetch_page(FSM_PAGE_ID)?;
        let data = guard.data();
        let offset = page_id.as_usize() * 2;
        Ok(u16::from_be_bytes([data[offset], data[offset + 1]]) as usize)
    }

    /// Records the free space of a page. Out-of-range page ids are ignored.
    pub fn update(&self, page_id: PageId, free_space: usize) -> Result<()> {
        if page_id.as_usize() >= FSM_CAPACITY {
            return Ok(());
        }

        let guard = self.bpm.fetch_page(FSM_PAGE_ID)?;
        let value = free_space.min(u16::MAX as usize) as u16;
        let offset = page_id.as_usize() * 2;
        guard.data_mut()[offset..offset + 2].copy_from_slice(&value.to_be_bytes());
        Ok(())
    }

    /// Finds a page with at least `required` bytes free.
    ///
    /// With a starting page the search walks that page's chain, so one
    /// table never claims space inside another table's pages. Without one
    /// it is a first-fit scan over the whole map.
    pub fn find_page(&self, required: usize, start: Option<PageId>) -> Result<Option<PageId>> {
        match start {
            Some(first) => {
                let mut current = first;
                while current != LAST_PAGE_ID {
                    if self.get(current)? >= required {
                        return Ok(Some(current));
                    }
                    let guard = self.bpm.fetch_page(current)?;
                    let next = HeapPage::read_next_page_id(&**guard.data());
                    current = next;
                }
                Ok(None)
            }
            None => {
                let guard = self.bpm.fetch_page(FSM_PAGE_ID)?;
                let data = guard.data();
                for i in 0..FSM_CAPACITY {
                    let value = u16::from_be_bytes([data[i * 2], data[i * 2 + 1]]) as usize;
                    if value >= required {
                        return Ok(Some(PageId::new(i as u32)));
                    }
                }
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{DiskManager, IdentityCodec, MemoryDevice};

    fn create_fsm() -> FreeSpaceMap {
        let dm = DiskManager::new(Box::new(MemoryDevice::new()), Box::new(IdentityCodec)).unwrap();
        FreeSpaceMap::new(Arc::new(BufferPoolManager::new(10, Arc::new(dm))))
    }

    #[test]
    fn test_fsm_get_defaults_to_zero() {
        let fsm = create_fsm();
        assert_eq!(fsm.get(PageId::new(3)).unwrap(), 0);
    }

    #[test]
    fn test_fsm_update_and_get() {
        let fsm = create_fsm();
        fsm.update(PageId::new(3), 1500).unwrap();
        assert_eq!(fsm.get(PageId::new(3)).unwrap(), 1500);
    }

    #[test]
    fn test_fsm_out_of_range_ids() {
        let fsm = create_fsm();
        let far = PageId::new(FSM_CAPACITY as u32);
        fsm.update(far, 1000).unwrap();
        assert_eq!(fsm.get(far).unwrap(), 0);
    }

    #[test]
    fn test_fsm_whole_map_scan_is_first_fit() {
        let fsm = create_fsm();
        fsm.update(PageId::new(4), 100).unwrap();
        fsm.update(PageId::new(6), 2000).unwrap();
        fsm.update(PageId::new(8), 2000).unwrap();

        assert_eq!(
            fsm.find_page(500, None).unwrap(),
            Some(PageId::new(6))
        );
        assert_eq!(fsm.find_page(3000, None).unwrap(), None);
    }
}
