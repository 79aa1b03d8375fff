use std::collections::VecDeque;
use std::sync::Arc;

use crate::buffer::BufferPoolManager;
use crate::common::{PageId, Result, LAST_PAGE_ID, SLOT_SIZE};
use crate::storage::{FreeSpaceMap, HeapPage};

/// A row as found by a scan: its bytes plus where it lives, so follow-up
/// deletes do not have to search again. The row index is only valid until
/// the page is next mutated.
#[derive(Debug, Clone)]
pub struct RowLocation {
    pub bytes: Vec<u8>,
    pub page_id: PageId,
    pub row_index: usize,
}

/// Heap of raw rows spread over a chain of slotted pages.
///
/// The table knows nothing about schemas; it stores and returns opaque
/// byte strings. Placement goes through the free space map, scoped to this
/// table's own page chain.
pub struct Table {
    bpm: Arc<BufferPoolManager>,
    fsm: Arc<FreeSpaceMap>,
    first_page_id: PageId,
}

impl Table {
    pub fn new(bpm: Arc<BufferPoolManager>, fsm: Arc<FreeSpaceMap>, first_page_id: PageId) -> Self {
        Self {
            bpm,
            fsm,
            first_page_id,
        }
    }

    pub fn first_page_id(&self) -> PageId {
        self.first_page_id
    }

    /// Inserts a row. Prefers the first chain page with enough recorded
    /// free space, defragmenting it if its gap is fragmented; otherwise a
    /// fresh page is linked to the end of the chain.
    pub fn insert(&self, row: &[u8]) -> Result<()> {
        let required = row.len() + SLOT_SIZE;

        if let Some(page_id) = self.fsm.find_page(required, Some(self.first_page_id))? {
            if self.try_insert_into(page_id, row)? {
                return Ok(());
            }
            // Stale map entry; fall through and append.
        }

        let tail_id = self.tail_page_id()?;
        if self.try_insert_into(tail_id, row)? {
            return Ok(());
        }

        let (new_id, new_guard) = self.bpm.new_page()?;
        {
            let mut data = new_guard.data_mut();
            let mut page = HeapPage::initialize(&mut **data, new_id);
            let index = page.insert_row(row)?;
            debug_assert!(index.is_some());
            self.fsm.update(new_id, page.total_free_space())?;
        }
        drop(new_guard);

        let tail_guard = self.bpm.fetch_page(tail_id)?;
        {
            let mut data = tail_guard.data_mut();
            HeapPage::new(&mut **data, tail_id).set_next_page_id(new_id);
        }

        Ok(())
    }

    fn try_insert_into(&self, page_id: PageId, row: &[u8]) -> Result<bool> {
        let guard = self.bpm.fetch_page(page_id)?;
        let mut data = guard.data_mut();
        let mut page = HeapPage::new(&mut **data, page_id);

        if page.insert_row(row)?.is_none() {
            // Enough total space but a fragmented gap.
            page.defragment();
            if page.insert_row(row)?.is_none() {
                return Ok(false);
            }
        }

        self.fsm.update(page_id, page.total_free_space())?;
        Ok(true)
    }

    fn tail_page_id(&self) -> Result<PageId> {
        let mut current = self.first_page_id;
        loop {
            let guard = self.bpm.fetch_page(current)?;
            let next = HeapPage::read_next_page_id(&**guard.data());
            if next == LAST_PAGE_ID {
                return Ok(current);
            }
            current = next;
        }
    }

    /// Returns a cursor over every row in the table, in chain-then-slot
    /// order. One page's rows are buffered at a time; the page pin is
    /// released between pages.
    pub fn scan(&self) -> TableScan<'_> {
        TableScan {
            table: self,
            next_page: Some(self.first_page_id),
            buffered: VecDeque::new(),
        }
    }

    /// Deletes the first row whose bytes match exactly.
    /// Returns whether a row was deleted.
    pub fn delete(&self, row: &[u8]) -> Result<bool> {
        for location in self.scan() {
            let location = location?;
            if location.bytes == row {
                self.delete_batch(location.page_id, &[location.row_index])?;
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Deletes several rows from one page by index. Indices are applied
    /// from highest to lowest so earlier deletions do not shift later
    /// targets; the free space map is updated once at the end.
    pub fn delete_batch(&self, page_id: PageId, row_indices: &[usize]) -> Result<()> {
        let mut indices = row_indices.to_vec();
        indices.sort_unstable_by(|a, b| b.cmp(a));

        let guard = self.bpm.fetch_page(page_id)?;
        let mut data = guard.data_mut();
        let mut page = HeapPage::new(&mut **data, page_id);

        for index in indices {
            page.delete_row(index)?;
        }

        self.fsm.update(page_id, page.total_free_space())?;
        Ok(())
    }

    /// Defragments every page in the chain, reclaiming dead row bytes.
    pub fn vacuum(&self) -> Result<()> {
        let mut current = self.first_page_id;
        while current != LAST_PAGE_ID {
            let guard = self.bpm.fetch_page(current)?;
            let mut data = guard.data_mut();
            let mut page = HeapPage::new(&mut **data, current);
            page.defragment();
            self.fsm.update(current, page.total_free_space())?;
            current = page.next_page_id();
        }
        Ok(())
    }
}

/// Cursor over a table's rows.
pub struct TableScan<'a> {
    table: &'a Table,
    next_page: Option<PageId>,
    buffered: VecDeque<RowLocation>,
}

impl TableScan<'_> {
    fn fill_buffer(&mut self) -> Result<()> {
        while self.buffered.is_empty() {
            let page_id = match self.next_page {
                Some(id) if id != LAST_PAGE_ID => id,
                _ => {
                    self.next_page = None;
                    return Ok(());
                }
            };

            let guard = self.table.bpm.fetch_page(page_id)?;
            let data = guard.data();
            let mut scratch = **data;
            let page = HeapPage::new(&mut scratch, page_id);

            for index in 0..page.row_count() {
                if let Some(bytes) = page.get_row(index)? {
                    self.buffered.push_back(RowLocation {
                        bytes: bytes.to_vec(),
                        page_id,
                        row_index: index,
                    });
                }
            }

            self.next_page = Some(page.next_page_id());
        }
        Ok(())
    }
}

impl Iterator for TableScan<'_> {
    type Item = Result<RowLocation>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffered.is_empty() {
            if let Err(e) = self.fill_buffer() {
                return Some(Err(e));
            }
        }
        self.buffered.pop_front().map(Ok)
    }
}
