use std::collections::BTreeMap;

use crate::common::{MinirelError, PageId, Result, PAGE_SIZE};

/// Location of one page's bytes on the backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLocation {
    pub offset: u32,
    pub length: u32,
}

const ENTRY_SIZE: usize = 12; // page id (4) + offset (4) + length (4)

/// Maps logical page ids to their byte location on the backing store.
///
/// The directory itself is persisted as one uncompressed page at a fixed
/// offset, so it can be read before anything else during bootstrap. Dynamic
/// pages are only discoverable through it; reserved pages have entries too,
/// which makes the directory size double as the page allocation counter.
#[derive(Debug, Default)]
pub struct PageDirectory {
    entries: BTreeMap<PageId, PageLocation>,
}

impl PageDirectory {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn get(&self, page_id: PageId) -> Option<PageLocation> {
        self.entries.get(&page_id).copied()
    }

    pub fn set(&mut self, page_id: PageId, location: PageLocation) {
        self.entries.insert(page_id, location);
    }

    /// Number of registered pages; also the next page id to allocate.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serializes the directory into a page-sized buffer:
    /// entry count u32, then {page id, offset, length} triples.
    pub fn serialize(&self) -> Result<[u8; PAGE_SIZE]> {
        let mut buffer = [0u8; PAGE_SIZE];
        let mut offset = 0;

        buffer[offset..offset + 4].copy_from_slice(&(self.entries.len() as u32).to_be_bytes());
        offset += 4;

        for (page_id, location) in &self.entries {
            if offset + ENTRY_SIZE > PAGE_SIZE {
                return Err(MinirelError::PageDirectoryOverflow);
            }
            buffer[offset..offset + 4].copy_from_slice(&page_id.as_u32().to_be_bytes());
            buffer[offset + 4..offset + 8].copy_from_slice(&location.offset.to_be_bytes());
            buffer[offset + 8..offset + 12].copy_from_slice(&location.length.to_be_bytes());
            offset += ENTRY_SIZE;
        }

        Ok(buffer)
    }

    /// Rebuilds the directory from a page-sized buffer.
    pub fn deserialize(&mut self, buffer: &[u8]) {
        assert_eq!(buffer.len(), PAGE_SIZE);
        self.entries.clear();

        let count = u32::from_be_bytes(buffer[0..4].try_into().unwrap()) as usize;
        let mut offset = 4;

        for _ in 0..count {
            let page_id = u32::from_be_bytes(buffer[offset..offset + 4].try_into().unwrap());
            let loc_offset =
                u32::from_be_bytes(buffer[offset + 4..offset + 8].try_into().unwrap());
            let loc_length =
                u32::from_be_bytes(buffer[offset + 8..offset + 12].try_into().unwrap());
            offset += ENTRY_SIZE;

            self.entries.insert(
                PageId::new(page_id),
                PageLocation {
                    offset: loc_offset,
                    length: loc_length,
                },
            );
        }
    }
}
