mod codec;
mod device;
mod disk_manager;
mod free_space_map;
mod page;
mod page_directory;

pub use codec::{IdentityCodec, PageCodec};
pub use device::{BlockDevice, FileDevice, MemoryDevice};
pub use disk_manager::DiskManager;
pub use free_space_map::FreeSpaceMap;
pub use page::{HeapPage, MAX_ROW_SIZE};
pub use page_directory::{PageDirectory, PageLocation};
