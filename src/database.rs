use std::path::Path;
use std::sync::Arc;

use crate::buffer::BufferPoolManager;
use crate::catalog::Catalog;
use crate::common::{
    MinirelError, Result, CATALOG_PAGE_ID, DEFAULT_BUFFER_POOL_SIZE, FSM_PAGE_ID,
    PAGE_DIRECTORY_PAGE_ID,
};
use crate::query::{parse, QueryOutput, QueryRunner};
use crate::storage::{
    BlockDevice, DiskManager, FileDevice, FreeSpaceMap, HeapPage, IdentityCodec, PageCodec,
};
use crate::table::Table;

/// An open database: one backing store, one buffer pool, one catalog.
///
/// On an empty store the three reserved pages are laid down first: the
/// page directory, the catalog heap page, and the free space map. Any
/// other store is assumed to have been bootstrapped before.
pub struct Database {
    disk: Arc<DiskManager>,
    bpm: Arc<BufferPoolManager>,
    fsm: Arc<FreeSpaceMap>,
    catalog: Arc<Catalog>,
}

impl Database {
    /// Opens (or creates) a file-backed database with the default pool
    /// size and no page compression.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_parts(
            Box::new(FileDevice::open(path)?),
            Box::new(IdentityCodec),
            DEFAULT_BUFFER_POOL_SIZE,
        )
    }

    /// Opens a database over an arbitrary device and codec.
    pub fn with_parts(
        device: Box<dyn BlockDevice>,
        codec: Box<dyn PageCodec>,
        pool_size: usize,
    ) -> Result<Self> {
        let fresh = device.size()? == 0;

        let disk = Arc::new(DiskManager::new(device, codec)?);
        let bpm = Arc::new(BufferPoolManager::new(pool_size, Arc::clone(&disk)));
        let fsm = Arc::new(FreeSpaceMap::new(Arc::clone(&bpm)));
        let catalog = Arc::new(Catalog::new(Arc::clone(&bpm), Arc::clone(&fsm)));

        let db = Self {
            disk,
            bpm,
            fsm,
            catalog,
        };
        if fresh {
            db.bootstrap()?;
        }
        Ok(db)
    }

    fn bootstrap(&self) -> Result<()> {
        for expected in [PAGE_DIRECTORY_PAGE_ID, CATALOG_PAGE_ID, FSM_PAGE_ID] {
            let (page_id, guard) = self.bpm.new_page()?;
            if page_id != expected {
                return Err(MinirelError::InitializationFailed(format!(
                    "reserved page allocated as {page_id}, expected {expected}"
                )));
            }
            if page_id == CATALOG_PAGE_ID {
                let mut data = guard.data_mut();
                HeapPage::initialize(&mut **data, page_id);
            }
            drop(guard);
            self.bpm.flush_page(page_id)?;
        }

        let free = {
            let guard = self.bpm.fetch_page(CATALOG_PAGE_ID)?;
            let mut data = guard.data_mut();
            HeapPage::new(&mut **data, CATALOG_PAGE_ID).total_free_space()
        };
        self.fsm.update(CATALOG_PAGE_ID, free)?;
        self.bpm.flush_page(FSM_PAGE_ID)?;

        Ok(())
    }

    /// Parses and executes one SQL statement.
    pub fn execute(&self, sql: &str) -> Result<QueryOutput> {
        let command = parse(sql)?;
        QueryRunner::new(
            Arc::clone(&self.bpm),
            Arc::clone(&self.fsm),
            Arc::clone(&self.catalog),
        )
        .run(command)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Opens a heap handle on an existing table.
    pub fn table(&self, name: &str) -> Result<Table> {
        let info = self.catalog.require_table(name)?;
        Ok(Table::new(
            Arc::clone(&self.bpm),
            Arc::clone(&self.fsm),
            info.first_page_id,
        ))
    }

    /// Defragments every page of the named table.
    pub fn vacuum(&self, name: &str) -> Result<()> {
        self.table(name)?.vacuum()
    }

    /// Number of page reads performed since open.
    pub fn read_count(&self) -> u32 {
        self.disk.read_count()
    }

    /// Number of page writes performed since open.
    pub fn write_count(&self) -> u32 {
        self.disk.write_count()
    }

    /// Flushes every dirty page and syncs the device.
    pub fn close(&self) -> Result<()> {
        self.bpm.flush_all()?;
        self.disk.sync()
    }
}
