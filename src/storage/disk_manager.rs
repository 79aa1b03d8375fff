use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::Mutex;

use crate::common::{
    MinirelError, PageId, Result, CATALOG_PAGE_ID, FSM_PAGE_ID, PAGE_DIRECTORY_PAGE_ID, PAGE_SIZE,
};

use super::codec::PageCodec;
use super::device::BlockDevice;
use super::page_directory::{PageDirectory, PageLocation};

/// Durable page storage behind a logical page id.
///
/// Two storage modes coexist. Reserved pages (page directory, catalog, free
/// space map) live at fixed `id * PAGE_SIZE` offsets and are always written
/// and read uncompressed at full page size, so bootstrap never depends on
/// the directory itself. Every other page is run through the codec,
/// appended to the end of the backing store, and registered in the page
/// directory with its stored length.
pub struct DiskManager {
    device: Box<dyn BlockDevice>,
    codec: Box<dyn PageCodec>,
    directory: Mutex<PageDirectory>,
    /// Next page id to hand out. Seeded from the directory size on open;
    /// allocated pages only enter the directory on their first write.
    next_page_id: AtomicU32,
    /// Number of read I/O operations performed
    num_reads: AtomicU32,
    /// Number of write I/O operations performed
    num_writes: AtomicU32,
}

fn is_reserved(page_id: PageId) -> bool {
    page_id == PAGE_DIRECTORY_PAGE_ID || page_id == CATALOG_PAGE_ID || page_id == FSM_PAGE_ID
}

impl DiskManager {
    /// Creates a disk manager over the given device, loading the page
    /// directory from its fixed offset (an empty store yields an empty
    /// directory).
    pub fn new(device: Box<dyn BlockDevice>, codec: Box<dyn PageCodec>) -> Result<Self> {
        let manager = Self {
            device,
            codec,
            directory: Mutex::new(PageDirectory::new()),
            next_page_id: AtomicU32::new(0),
            num_reads: AtomicU32::new(0),
            num_writes: AtomicU32::new(0),
        };

        let mut buffer = [0u8; PAGE_SIZE];
        manager.read_reserved(PAGE_DIRECTORY_PAGE_ID, &mut buffer)?;
        let count = {
            let mut directory = manager.directory.lock();
            directory.deserialize(&buffer);
            directory.len()
        };
        manager.next_page_id.store(count as u32, Ordering::Relaxed);

        Ok(manager)
    }

    /// Returns the size of the backing store in bytes.
    pub fn size(&self) -> Result<u64> {
        self.device.size()
    }

    /// Writes a page. The buffer must be exactly PAGE_SIZE bytes.
    pub fn write_page(&self, page_id: PageId, data: &[u8]) -> Result<()> {
        assert_eq!(data.len(), PAGE_SIZE, "Buffer must be PAGE_SIZE bytes");

        let location = if is_reserved(page_id) {
            let offset = page_id.as_u32() as u64 * PAGE_SIZE as u64;
            self.device.write_at(offset, data)?;
            PageLocation {
                offset: offset as u32,
                length: PAGE_SIZE as u32,
            }
        } else {
            let compressed = self.codec.compress(data);
            let offset = self.device.size()?;
            self.device.write_at(offset, &compressed)?;
            PageLocation {
                offset: offset as u32,
                length: compressed.len() as u32,
            }
        };

        // Register the page and persist the directory at its fixed offset.
        let directory_buffer = {
            let mut directory = self.directory.lock();
            directory.set(page_id, location);
            directory.serialize()?
        };
        self.device.write_at(
            PAGE_DIRECTORY_PAGE_ID.as_u32() as u64 * PAGE_SIZE as u64,
            &directory_buffer,
        )?;

        self.num_writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Reads a page into the provided buffer. The buffer must be exactly
    /// PAGE_SIZE bytes. A non-reserved id absent from the directory is a
    /// fatal error; a reserved page beyond the end of the store reads as
    /// zeros.
    pub fn read_page(&self, page_id: PageId, data: &mut [u8]) -> Result<()> {
        assert_eq!(data.len(), PAGE_SIZE, "Buffer must be PAGE_SIZE bytes");

        if is_reserved(page_id) {
            self.read_reserved(page_id, data)?;
        } else {
            let location = self
                .directory
                .lock()
                .get(page_id)
                .ok_or(MinirelError::PageNotFound(page_id))?;

            let mut compressed = vec![0u8; location.length as usize];
            self.device.read_at(location.offset as u64, &mut compressed)?;

            let decompressed = self.codec.decompress(&compressed)?;
            if decompressed.len() != PAGE_SIZE {
                return Err(MinirelError::Codec(format!(
                    "page {} decompressed to {} bytes",
                    page_id,
                    decompressed.len()
                )));
            }
            data.copy_from_slice(&decompressed);
        }

        self.num_reads.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Hands out the next unused page id. No storage is reserved until the
    /// page is first written.
    pub fn allocate_page(&self) -> PageId {
        PageId::new(self.next_page_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the number of read I/O operations performed.
    pub fn read_count(&self) -> u32 {
        self.num_reads.load(Ordering::Relaxed)
    }

    /// Returns the number of write I/O operations performed.
    pub fn write_count(&self) -> u32 {
        self.num_writes.load(Ordering::Relaxed)
    }

    /// Flushes the device to durable storage.
    pub fn sync(&self) -> Result<()> {
        self.device.sync()
    }

    fn read_reserved(&self, page_id: PageId, data: &mut [u8]) -> Result<()> {
        let offset = page_id.as_u32() as u64 * PAGE_SIZE as u64;
        let n = self.device.read_at(offset, data)?;
        if n < PAGE_SIZE {
            data[n..].fill(0);
        }
        Ok(())
    }
}
