use std::sync::Arc;

use crate::buffer::BufferPoolManager;
use crate::common::{MinirelError, PageId, Result, CATALOG_PAGE_ID};
use crate::row::{Column, Schema};
use crate::storage::{FreeSpaceMap, HeapPage};
use crate::table::Table;

/// Everything the engine knows about one table.
#[derive(Debug, Clone)]
pub struct TableInfo {
    pub name: String,
    pub first_page_id: PageId,
    pub schema: Schema,
}

/// The system catalog: table definitions stored as ordinary rows in a
/// reserved page chain, read through the same heap machinery as user data.
///
/// Catalog row encoding: name length u32, name bytes, first page id u32,
/// column count u32, then each column's encoding.
pub struct Catalog {
    bpm: Arc<BufferPoolManager>,
    fsm: Arc<FreeSpaceMap>,
}

impl Catalog {
    pub fn new(bpm: Arc<BufferPoolManager>, fsm: Arc<FreeSpaceMap>) -> Self {
        Self { bpm, fsm }
    }

    fn catalog_table(&self) -> Table {
        Table::new(
            Arc::clone(&self.bpm),
            Arc::clone(&self.fsm),
            CATALOG_PAGE_ID,
        )
    }

    /// Creates a table: allocates its first heap page, registers it in the
    /// free space map, and appends its definition to the catalog.
    pub fn create_table(&self, name: &str, columns: Vec<Column>) -> Result<TableInfo> {
        if self.get_table(name)?.is_some() {
            return Err(MinirelError::TableAlreadyExists(name.to_string()));
        }

        let (first_page_id, guard) = self.bpm.new_page()?;
        {
            let mut data = guard.data_mut();
            let page = HeapPage::initialize(&mut **data, first_page_id);
            self.fsm.update(first_page_id, page.total_free_space())?;
        }
        drop(guard);
        self.bpm.flush_page(first_page_id)?;

        let info = TableInfo {
            name: name.to_string(),
            first_page_id,
            schema: Schema::new(columns),
        };
        self.catalog_table().insert(&encode_entry(&info))?;

        Ok(info)
    }

    /// Looks a table up by name.
    pub fn get_table(&self, name: &str) -> Result<Option<TableInfo>> {
        for location in self.catalog_table().scan() {
            let info = decode_entry(&location?.bytes)?;
            if info.name == name {
                return Ok(Some(info));
            }
        }
        Ok(None)
    }

    /// Looks a table up by name, failing if it does not exist.
    pub fn require_table(&self, name: &str) -> Result<TableInfo> {
        self.get_table(name)?
            .ok_or_else(|| MinirelError::TableNotFound(name.to_string()))
    }

    /// Returns the schema for a table.
    pub fn get_schema(&self, name: &str) -> Result<Option<Schema>> {
        Ok(self.get_table(name)?.map(|info| info.schema))
    }

    /// Names of all tables, in creation order.
    pub fn table_names(&self) -> Result<Vec<String>> {
        self.catalog_table()
            .scan()
            .map(|location| Ok(decode_entry(&location?.bytes)?.name))
            .collect()
    }
}

fn encode_entry(info: &TableInfo) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(info.name.len() as u32).to_be_bytes());
    out.extend_from_slice(info.name.as_bytes());
    out.extend_from_slice(&info.first_page_id.as_u32().to_be_bytes());
    out.extend_from_slice(&(info.schema.len() as u32).to_be_bytes());
    for column in info.schema.columns() {
        column.encode(&mut out);
    }
    out
}

fn decode_entry(data: &[u8]) -> Result<TableInfo> {
    let read_u32 = |pos: usize| -> Result<u32> {
        let bytes = data.get(pos..pos + 4).ok_or(MinirelError::CorruptRow)?;
        Ok(u32::from_be_bytes(bytes.try_into().unwrap()))
    };

    let name_len = read_u32(0)? as usize;
    let mut pos = 4;
    let name_bytes = data.get(pos..pos + name_len).ok_or(MinirelError::CorruptRow)?;
    let name = String::from_utf8(name_bytes.to_vec()).map_err(|_| MinirelError::CorruptRow)?;
    pos += name_len;

    let first_page_id = PageId::new(read_u32(pos)?);
    let column_count = read_u32(pos + 4)? as usize;
    pos += 8;

    let mut columns = Vec::with_capacity(column_count);
    for _ in 0..column_count {
        let (column, next) = Column::decode(data, pos)?;
        columns.push(column);
        pos = next;
    }

    Ok(TableInfo {
        name,
        first_page_id,
        schema: Schema::new(columns),
    })
}
