use super::types::PageId;

/// Size of a page in bytes (4 KB)
pub const PAGE_SIZE: usize = 4096;

/// Size of the page header in bytes:
/// row count (4) + free-space pointer (4) + next page id (4) + total free space (4)
pub const PAGE_HEADER_SIZE: usize = 16;

/// Size of one slot directory entry in bytes: row offset (4) + row length (4)
pub const SLOT_SIZE: usize = 8;

/// Reserved page holding the page directory, stored uncompressed at offset 0
pub const PAGE_DIRECTORY_PAGE_ID: PageId = PageId(0);

/// Reserved page holding the catalog's first page
pub const CATALOG_PAGE_ID: PageId = PageId(1);

/// Reserved page holding the free space map
pub const FSM_PAGE_ID: PageId = PageId(2);

/// Sentinel page id meaning "no next page" in a page chain
pub const LAST_PAGE_ID: PageId = PageId(u32::MAX);

/// Number of u16 entries the free space map page can hold
pub const FSM_CAPACITY: usize = PAGE_SIZE / 2;

/// Default buffer pool size (number of frames)
pub const DEFAULT_BUFFER_POOL_SIZE: usize = 10;
