use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use parking_lot::Mutex;

use crate::common::Result;

/// Raw block device abstraction the disk manager is built on.
///
/// The engine never touches the filesystem directly; it sees a flat byte
/// store addressed by offset. Reads past the end of the store return fewer
/// bytes than requested and the caller zero-fills the remainder.
pub trait BlockDevice: Send + Sync {
    /// Returns the current size of the backing store in bytes.
    fn size(&self) -> Result<u64>;

    /// Reads up to `buf.len()` bytes starting at `offset`.
    /// Returns the number of bytes actually read.
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Writes all of `data` starting at `offset`, extending the store
    /// if needed.
    fn write_at(&self, offset: u64, data: &[u8]) -> Result<()>;

    /// Flushes buffered writes to durable storage.
    fn sync(&self) -> Result<()>;
}

/// File-backed block device - one file per database.
pub struct FileDevice {
    file: Mutex<File>,
}

impl FileDevice {
    /// Opens (or creates) the database file at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl BlockDevice for FileDevice {
    fn size(&self) -> Result<u64> {
        let file = self.file.lock();
        Ok(file.metadata()?.len())
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let mut file = self.file.lock();
        let len = file.metadata()?.len();
        if offset >= len {
            return Ok(0);
        }
        file.seek(SeekFrom::Start(offset))?;
        let mut total = 0;
        while total < buf.len() {
            let n = file.read(&mut buf[total..])?;
            if n == 0 {
                break;
            }
            total += n;
        }
        Ok(total)
    }

    fn write_at(&self, offset: u64, data: &[u8]) -> Result<()> {
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(data)?;
        file.flush()?;
        Ok(())
    }

    fn sync(&self) -> Result<()> {
        let file = self.file.lock();
        file.sync_all()?;
        Ok(())
    }
}

/// In-memory block device for tests.
pub struct MemoryDevice {
    data: Mutex<Vec<u8>>,
}

impl MemoryDevice {
    pub fn new() -> Self {
        Self {
            data: Mutex::new(Vec::new()),
        }
    }
}

impl Default for MemoryDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockDevice for MemoryDevice {
    fn size(&self) -> Result<u64> {
        Ok(self.data.lock().len() as u64)
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let data = self.data.lock();
        let offset = offset as usize;
        if offset >= data.len() {
            return Ok(0);
        }
        let available = data.len() - offset;
        let n = buf.len().min(available);
        buf[..n].copy_from_slice(&data[offset..offset + n]);
        Ok(n)
    }

    fn write_at(&self, offset: u64, bytes: &[u8]) -> Result<()> {
        let mut data = self.data.lock();
        let offset = offset as usize;
        let end = offset + bytes.len();
        if end > data.len() {
            data.resize(end, 0);
        }
        data[offset..end].copy_from_slice(bytes);
        Ok(())
    }

    fn sync(&self) -> Result<()> {
        Ok(())
    }
}
