use crate::common::{MinirelError, Result};

use super::value::DataType;

// Column flag bits as stored in the catalog.
const FLAG_NULLABLE: u8 = 1 << 0;
const FLAG_PRIMARY_KEY: u8 = 1 << 1;
const FLAG_AUTO_INCREMENT: u8 = 1 << 2;
const FLAG_UNIQUE: u8 = 1 << 3;

/// One column definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
    pub primary_key: bool,
    pub auto_increment: bool,
    pub unique: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
            primary_key: false,
            auto_increment: false,
            unique: false,
        }
    }

    /// Whether inserts must check this column for duplicates.
    pub fn requires_unique(&self) -> bool {
        self.unique || self.primary_key
    }

    /// Appends the column's catalog encoding:
    /// name length u32, name bytes, type byte, flags byte.
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&(self.name.len() as u32).to_be_bytes());
        out.extend_from_slice(self.name.as_bytes());
        out.push(self.data_type.to_byte());

        let mut flags = 0u8;
        if self.nullable {
            flags |= FLAG_NULLABLE;
        }
        if self.primary_key {
            flags |= FLAG_PRIMARY_KEY;
        }
        if self.auto_increment {
            flags |= FLAG_AUTO_INCREMENT;
        }
        if self.unique {
            flags |= FLAG_UNIQUE;
        }
        out.push(flags);
    }

    /// Decodes one column starting at `offset`, returning the column and
    /// the offset just past it.
    pub fn decode(data: &[u8], offset: usize) -> Result<(Self, usize)> {
        let mut pos = offset;

        let name_len = read_u32(data, pos)? as usize;
        pos += 4;
        let name_bytes = data.get(pos..pos + name_len).ok_or(MinirelError::CorruptRow)?;
        let name = String::from_utf8(name_bytes.to_vec()).map_err(|_| MinirelError::CorruptRow)?;
        pos += name_len;

        let type_byte = *data.get(pos).ok_or(MinirelError::CorruptRow)?;
        let flags = *data.get(pos + 1).ok_or(MinirelError::CorruptRow)?;
        pos += 2;

        Ok((
            Self {
                name,
                data_type: DataType::from_byte(type_byte)?,
                nullable: flags & FLAG_NULLABLE != 0,
                primary_key: flags & FLAG_PRIMARY_KEY != 0,
                auto_increment: flags & FLAG_AUTO_INCREMENT != 0,
                unique: flags & FLAG_UNIQUE != 0,
            },
            pos,
        ))
    }
}

pub(crate) fn read_u32(data: &[u8], offset: usize) -> Result<u32> {
    let bytes = data.get(offset..offset + 4).ok_or(MinirelError::CorruptRow)?;
    Ok(u32::from_be_bytes(bytes.try_into().unwrap()))
}

/// Ordered set of columns for one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    pub fn column_by_name(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }
}
