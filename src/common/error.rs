use thiserror::Error;

use super::types::PageId;

/// Database error types, grouped by the stage that raises them:
/// syntax errors from the tokenizer/parser, semantic errors from command
/// resolution, constraint violations from the executor, and internal
/// errors signalling a broken engine invariant.
#[derive(Error, Debug)]
pub enum MinirelError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // --- Syntax ---
    #[error("Unexpected end of query")]
    UnexpectedEndOfQuery,

    #[error("Unexpected token: found {found}, expected {expected}")]
    UnexpectedToken { found: String, expected: String },

    #[error("Unexpected character '{ch}' at position {position}")]
    UnexpectedCharacter { ch: char, position: usize },

    #[error("Unterminated string literal starting at position {position}")]
    UnterminatedString { position: usize },

    #[error("Unknown column type: {0}")]
    UnknownColumnType(String),

    #[error("Expected NUMBER, STRING or NULL, found {0}")]
    ExpectedValue(String),

    #[error("AUTOINCREMENT can only be used on an INT PRIMARY KEY column")]
    InvalidAutoIncrement,

    #[error("Column with PRIMARY KEY constraint cannot be marked NULL")]
    PrimaryKeyNullable,

    #[error("Unexpected end of expression")]
    UnexpectedEndOfExpression,

    #[error("Invalid WHERE clause structure")]
    InvalidWhereClause,

    #[error("Invalid query")]
    InvalidQuery,

    // --- Semantic ---
    #[error("Table '{0}' not found")]
    TableNotFound(String),

    #[error("Table '{0}' already exists")]
    TableAlreadyExists(String),

    #[error("Column '{0}' not found")]
    ColumnNotFound(String),

    #[error("Column '{column}' expects {expected}")]
    TypeMismatch { column: String, expected: String },

    #[error("Expected {expected} values, found {found}")]
    ColumnCountMismatch { expected: usize, found: usize },

    #[error("Operator {0} only supports NULL")]
    OperatorRequiresNull(String),

    #[error("Operator {0} cannot be used with NULL")]
    OperatorRejectsNull(String),

    // --- Constraint violations ---
    #[error("Column '{0}' cannot be null")]
    NotNullViolation(String),

    #[error("UNIQUE constraint failed on column '{column}': {value}")]
    UniqueViolation { column: String, value: String },

    #[error("Duplicate value for column '{column}' in the same insert: {value}")]
    DuplicateInBatch { column: String, value: String },

    // --- Internal ---
    #[error("Page {0} not found in the page directory")]
    PageNotFound(PageId),

    #[error("Invalid page ID: {0}")]
    InvalidPageId(PageId),

    #[error("No victim frame found, all frames are pinned")]
    NoVictimFrame,

    #[error("Row of size {size} exceeds the maximum of {max} bytes")]
    RowTooLarge { size: usize, max: usize },

    #[error("Row index {index} out of bounds (page has {count} rows)")]
    RowIndexOutOfBounds { index: usize, count: usize },

    #[error("Page directory overflow")]
    PageDirectoryOverflow,

    #[error("Corrupt row data")]
    CorruptRow,

    #[error("Page decompression failed: {0}")]
    Codec(String),

    #[error("Database initialization failed: {0}")]
    InitializationFailed(String),
}

pub type Result<T> = std::result::Result<T, MinirelError>;
