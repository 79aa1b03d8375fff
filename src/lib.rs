//! Minirel - an embedded, single-file relational storage and query engine.
//!
//! Everything lives in one backing store: data rows, the system catalog,
//! the page directory, and the free space map. SQL statements go through a
//! tokenizer, a recursive-descent parser, and an executor that scans heap
//! pages through a buffer pool.
//!
//! # Architecture
//!
//! - **Storage Layer** (`storage`): the backing device, the page codec,
//!   the page directory, the disk manager, the slotted heap page, and the
//!   free space map
//! - **Buffer Pool** (`buffer`): fixed set of in-memory frames with LRU
//!   eviction; pages are accessed through RAII pin guards
//! - **Rows** (`row`): column schemas, cell values, and the row codec
//! - **Tables** (`table`): heaps of rows over chained slotted pages
//! - **Catalog** (`catalog`): table definitions, stored as ordinary rows
//!   in a reserved page chain
//! - **Query** (`query`): SQL tokenizer, parser, and executor
//! - **Database** (`database`): ties the layers together behind
//!   [`Database::execute`]
//!
//! # Example
//!
//! ```rust,no_run
//! use minirel::Database;
//!
//! let db = Database::open("test.db").unwrap();
//! db.execute("CREATE TABLE users (id INT PRIMARY KEY AUTOINCREMENT, name VARCHAR NOT NULL)").unwrap();
//! db.execute("INSERT INTO users (name) VALUES ('ada')").unwrap();
//! let result = db.execute("SELECT * FROM users").unwrap();
//! println!("{result:?}");
//! db.close().unwrap();
//! ```

pub mod buffer;
pub mod catalog;
pub mod common;
pub mod database;
pub mod query;
pub mod row;
pub mod storage;
pub mod table;

// Re-export commonly used types at the crate root
pub use common::{MinirelError, PageId, Result};
pub use database::Database;
pub use query::QueryOutput;
pub use row::{Column, DataType, Schema, Value};
