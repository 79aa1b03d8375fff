use crate::common::{
    MinirelError, PageId, Result, LAST_PAGE_ID, PAGE_HEADER_SIZE, PAGE_SIZE, SLOT_SIZE,
};

/// Slotted heap page layout:
///
/// +------------------+
/// | Page Header      |  (PAGE_HEADER_SIZE bytes)
/// +------------------+
/// | Slot Directory   |  (grows downward)
/// | [slot 0]         |
/// | [slot 1]         |
/// | ...              |
/// +------------------+
/// |                  |
/// | Free Space       |
/// |                  |
/// +------------------+
/// | Row Bytes        |  (grows upward from the bottom)
/// | [row n]          |
/// | [row n-1]        |
/// | ...              |
/// +------------------+
///
/// Header fields (big-endian u32):
///   - row count
///   - free-space pointer (offset of the lowest row byte, starts at PAGE_SIZE)
///   - next page id (singly linked chain per table, LAST_PAGE_ID terminates)
///   - total free space (cached; counts fragmented bytes reclaimable by
///     defragment, unlike the contiguous gap that governs inserts)
///
/// Each slot entry holds {row offset u32, row length u32}. A length of 0 is
/// a tombstone. Deleting a slot closes the gap in the directory, so a row
/// index is only valid within a single page state.
const ROW_COUNT_OFFSET: usize = 0;
const FREE_POINTER_OFFSET: usize = 4;
const NEXT_PAGE_ID_OFFSET: usize = 8;
const TOTAL_FREE_OFFSET: usize = 12;

/// Largest row that can ever fit in an empty page.
pub const MAX_ROW_SIZE: usize = PAGE_SIZE - PAGE_HEADER_SIZE - SLOT_SIZE;

/// HeapPage is a transient view over one page-sized buffer. It owns no
/// state beyond the borrowed buffer and is recreated per access.
pub struct HeapPage<'a> {
    data: &'a mut [u8],
    id: PageId,
}

impl<'a> HeapPage<'a> {
    /// Creates a view over an already-initialized page buffer.
    /// The buffer must be exactly PAGE_SIZE bytes.
    pub fn new(data: &'a mut [u8], id: PageId) -> Self {
        assert_eq!(data.len(), PAGE_SIZE);
        Self { data, id }
    }

    /// Initializes a fresh page: no rows, free pointer at the end of the
    /// block, no next page.
    pub fn initialize(data: &'a mut [u8], id: PageId) -> Self {
        let mut page = Self::new(data, id);
        page.data.fill(0);
        page.set_row_count(0);
        page.set_free_pointer(PAGE_SIZE as u32);
        page.set_next_page_id(LAST_PAGE_ID);
        page.set_total_free_space((PAGE_SIZE - PAGE_HEADER_SIZE) as u32);
        page
    }

    pub fn id(&self) -> PageId {
        self.id
    }

    fn read_u32(&self, offset: usize) -> u32 {
        u32::from_be_bytes(self.data[offset..offset + 4].try_into().unwrap())
    }

    fn write_u32(&mut self, offset: usize, value: u32) {
        self.data[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
    }

    /// Returns the number of slots (including tombstones).
    pub fn row_count(&self) -> usize {
        self.read_u32(ROW_COUNT_OFFSET) as usize
    }

    fn set_row_count(&mut self, count: usize) {
        self.write_u32(ROW_COUNT_OFFSET, count as u32);
    }

    /// Returns the free-space pointer: the offset of the lowest row byte.
    pub fn free_pointer(&self) -> usize {
        self.read_u32(FREE_POINTER_OFFSET) as usize
    }

    fn set_free_pointer(&mut self, value: u32) {
        self.write_u32(FREE_POINTER_OFFSET, value);
    }

    /// Returns the next page id in the chain (LAST_PAGE_ID if none).
    pub fn next_page_id(&self) -> PageId {
        PageId::new(self.read_u32(NEXT_PAGE_ID_OFFSET))
    }

    /// Reads the next page id straight out of a page buffer, for callers
    /// that only need to follow the chain.
    pub fn read_next_page_id(data: &[u8]) -> PageId {
        PageId::new(u32::from_be_bytes(
            data[NEXT_PAGE_ID_OFFSET..NEXT_PAGE_ID_OFFSET + 4]
                .try_into()
                .unwrap(),
        ))
    }

    pub fn set_next_page_id(&mut self, page_id: PageId) {
        self.write_u32(NEXT_PAGE_ID_OFFSET, page_id.as_u32());
    }

    /// Returns the cached total free space: the contiguous gap plus bytes
    /// reclaimable by defragmentation. This is the value published to the
    /// free space map.
    pub fn total_free_space(&self) -> usize {
        self.read_u32(TOTAL_FREE_OFFSET) as usize
    }

    fn set_total_free_space(&mut self, value: u32) {
        self.write_u32(TOTAL_FREE_OFFSET, value);
    }

    /// Returns the contiguous gap between the end of the slot directory and
    /// the free-space pointer. An insert fits only in this gap.
    pub fn contiguous_free_space(&self) -> usize {
        let directory_end = PAGE_HEADER_SIZE + self.row_count() * SLOT_SIZE;
        self.free_pointer().saturating_sub(directory_end)
    }

    fn slot_offset(index: usize) -> usize {
        PAGE_HEADER_SIZE + index * SLOT_SIZE
    }

    fn slot(&self, index: usize) -> (usize, usize) {
        let base = Self::slot_offset(index);
        let offset = self.read_u32(base) as usize;
        let length = self.read_u32(base + 4) as usize;
        (offset, length)
    }

    fn set_slot(&mut self, index: usize, offset: usize, length: usize) {
        let base = Self::slot_offset(index);
        self.write_u32(base, offset as u32);
        self.write_u32(base + 4, length as u32);
    }

    /// Inserts a row and returns its slot index, or None when the slot
    /// directory and row bytes would overlap. A row exceeding the absolute
    /// per-page ceiling is an error, not a None.
    pub fn insert_row(&mut self, row: &[u8]) -> Result<Option<usize>> {
        let size = row.len();
        if size > MAX_ROW_SIZE {
            return Err(MinirelError::RowTooLarge {
                size,
                max: MAX_ROW_SIZE,
            });
        }

        if size + SLOT_SIZE > self.contiguous_free_space() {
            return Ok(None);
        }

        let row_offset = self.free_pointer() - size;
        self.data[row_offset..row_offset + size].copy_from_slice(row);

        let index = self.row_count();
        self.set_slot(index, row_offset, size);
        self.set_free_pointer(row_offset as u32);
        self.set_row_count(index + 1);
        self.set_total_free_space((self.total_free_space() - size - SLOT_SIZE) as u32);

        Ok(Some(index))
    }

    /// Returns the row bytes at the given slot index, or None for a
    /// tombstoned slot. An out-of-bounds index is an error.
    pub fn get_row(&self, index: usize) -> Result<Option<&[u8]>> {
        let count = self.row_count();
        if index >= count {
            return Err(MinirelError::RowIndexOutOfBounds { index, count });
        }

        let (offset, length) = self.slot(index);
        if length == 0 {
            return Ok(None);
        }
        Ok(Some(&self.data[offset..offset + length]))
    }

    /// Logically deletes the row at the given index: later slots shift down
    /// one position and the row count drops, so previously-held indices at
    /// or after `index` are invalidated. The row bytes stay in place until
    /// a defragment reclaims them.
    pub fn delete_row(&mut self, index: usize) -> Result<()> {
        let count = self.row_count();
        if index >= count {
            return Err(MinirelError::RowIndexOutOfBounds { index, count });
        }

        let (_, length) = self.slot(index);

        for i in index + 1..count {
            let (offset, len) = self.slot(i);
            self.set_slot(i - 1, offset, len);
        }
        self.set_slot(count - 1, 0, 0);
        self.set_row_count(count - 1);
        self.set_total_free_space((self.total_free_space() + length + SLOT_SIZE) as u32);

        Ok(())
    }

    /// Rebuilds the page into a scratch buffer by re-inserting all live
    /// rows in slot order, reclaiming fragmented space without changing
    /// the logical row order.
    pub fn defragment(&mut self) {
        let rows: Vec<Vec<u8>> = (0..self.row_count())
            .filter_map(|i| {
                let (offset, length) = self.slot(i);
                if length == 0 {
                    None
                } else {
                    Some(self.data[offset..offset + length].to_vec())
                }
            })
            .collect();

        let next_page_id = self.next_page_id();

        let mut scratch = [0u8; PAGE_SIZE];
        {
            let mut rebuilt = HeapPage::initialize(&mut scratch, self.id);
            rebuilt.set_next_page_id(next_page_id);
            for row in &rows {
                // Every live row fit before, so it fits in the rebuilt page.
                rebuilt
                    .insert_row(row)
                    .expect("row within ceiling")
                    .expect("row fits after defragment");
            }
        }
        self.data.copy_from_slice(&scratch);
    }
}
