//! Integration tests for the disk manager

use minirel::common::{CATALOG_PAGE_ID, PAGE_SIZE};
use minirel::storage::{
    BlockDevice, DiskManager, FileDevice, IdentityCodec, MemoryDevice, PageCodec,
};
use minirel::PageId;

use tempfile::NamedTempFile;

fn memory_dm() -> DiskManager {
    DiskManager::new(Box::new(MemoryDevice::new()), Box::new(IdentityCodec)).unwrap()
}

#[test]
fn test_disk_manager_random_access() {
    let dm = memory_dm();

    let page_ids: Vec<PageId> = (0..10).map(|_| dm.allocate_page()).collect();

    // Write pages out of order.
    let write_order = [5, 2, 8, 0, 7, 3, 9, 1, 6, 4];
    for &i in &write_order {
        let mut data = [0u8; PAGE_SIZE];
        data[0] = i as u8;
        data[PAGE_SIZE - 1] = i as u8;
        dm.write_page(page_ids[i], &data).unwrap();
    }

    for (i, &page_id) in page_ids.iter().enumerate() {
        let mut data = [0u8; PAGE_SIZE];
        dm.read_page(page_id, &mut data).unwrap();
        assert_eq!(data[0], i as u8);
        assert_eq!(data[PAGE_SIZE - 1], i as u8);
    }
}

#[test]
fn test_disk_manager_overwrite_dynamic_page() {
    let dm = memory_dm();

    let page_id = dm.allocate_page();
    let mut data = [1u8; PAGE_SIZE];
    dm.write_page(page_id, &data).unwrap();

    data.fill(2);
    dm.write_page(page_id, &data).unwrap();

    let mut read = [0u8; PAGE_SIZE];
    dm.read_page(page_id, &mut read).unwrap();
    assert!(read.iter().all(|&b| b == 2));
}

#[test]
fn test_disk_manager_counters() {
    let dm = memory_dm();

    let page_id = dm.allocate_page();
    let data = [0u8; PAGE_SIZE];
    dm.write_page(page_id, &data).unwrap();

    let reads = dm.read_count();
    let mut buf = [0u8; PAGE_SIZE];
    dm.read_page(page_id, &mut buf).unwrap();
    dm.read_page(page_id, &mut buf).unwrap();
    assert_eq!(dm.read_count(), reads + 2);
    assert!(dm.write_count() >= 1);
}

/// XORs every byte; same length in both directions, so a page stored
/// through it is garbled on disk but intact after reading back.
struct XorCodec;

impl PageCodec for XorCodec {
    fn compress(&self, data: &[u8]) -> Vec<u8> {
        data.iter().map(|b| b ^ 0x5a).collect()
    }

    fn decompress(&self, data: &[u8]) -> minirel::Result<Vec<u8>> {
        Ok(data.iter().map(|b| b ^ 0x5a).collect())
    }
}

#[test]
fn test_disk_manager_codec_roundtrip() {
    let temp = NamedTempFile::new().unwrap();
    let dm = DiskManager::new(
        Box::new(FileDevice::open(temp.path()).unwrap()),
        Box::new(XorCodec),
    )
    .unwrap();

    let page_id = PageId::new(7);
    let mut data = [0u8; PAGE_SIZE];
    for (i, byte) in data.iter_mut().enumerate() {
        *byte = (i % 251) as u8;
    }
    dm.write_page(page_id, &data).unwrap();

    let mut read = [0u8; PAGE_SIZE];
    dm.read_page(page_id, &mut read).unwrap();
    assert_eq!(read, data);
}

#[test]
fn test_disk_manager_reserved_pages_bypass_codec() {
    let temp = NamedTempFile::new().unwrap();
    let dm = DiskManager::new(
        Box::new(FileDevice::open(temp.path()).unwrap()),
        Box::new(XorCodec),
    )
    .unwrap();

    let mut data = [0u8; PAGE_SIZE];
    data[0] = 0x11;
    data[100] = 0x22;
    dm.write_page(CATALOG_PAGE_ID, &data).unwrap();
    dm.sync().unwrap();

    // A second handle on the same file sees the catalog page verbatim at
    // its fixed offset: no transform was applied.
    let raw = FileDevice::open(temp.path()).unwrap();
    let mut on_disk = [0u8; PAGE_SIZE];
    let offset = CATALOG_PAGE_ID.as_u32() as u64 * PAGE_SIZE as u64;
    assert_eq!(raw.read_at(offset, &mut on_disk).unwrap(), PAGE_SIZE);
    assert_eq!(on_disk, data);
}

#[test]
fn test_disk_manager_reopen_with_codec() {
    let temp = NamedTempFile::new().unwrap();
    let page_id;

    {
        let dm = DiskManager::new(
            Box::new(FileDevice::open(temp.path()).unwrap()),
            Box::new(XorCodec),
        )
        .unwrap();
        page_id = dm.allocate_page();
        let mut data = [0u8; PAGE_SIZE];
        data[42] = 42;
        dm.write_page(page_id, &data).unwrap();
        dm.sync().unwrap();
    }

    let dm = DiskManager::new(
        Box::new(FileDevice::open(temp.path()).unwrap()),
        Box::new(XorCodec),
    )
    .unwrap();
    let mut data = [0u8; PAGE_SIZE];
    dm.read_page(page_id, &mut data).unwrap();
    assert_eq!(data[42], 42);
}
