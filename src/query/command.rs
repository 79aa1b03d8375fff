use crate::row::{Column, Value};

/// Comparison operators usable in a WHERE condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Like,
    IsNull,
    IsNotNull,
}

impl CompareOp {
    /// The surface spelling, used in error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::NotEq => "<>",
            CompareOp::Lt => "<",
            CompareOp::Gt => ">",
            CompareOp::LtEq => "<=",
            CompareOp::GtEq => ">=",
            CompareOp::Like => "LIKE",
            CompareOp::IsNull => "IS",
            CompareOp::IsNotNull => "IS NOT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

/// A parsed WHERE clause.
#[derive(Debug, Clone, PartialEq)]
pub enum WhereExpr {
    Condition {
        field: String,
        operator: CompareOp,
        value: Value,
    },
    Logical {
        op: LogicalOp,
        left: Box<WhereExpr>,
        right: Box<WhereExpr>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    All,
    Columns(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub descending: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    pub limit: usize,
    pub offset: usize,
}

/// A fully parsed statement, ready for execution.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateTable {
        table: String,
        columns: Vec<Column>,
    },
    Insert {
        table: String,
        /// Explicit column list; empty means positional values.
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
    },
    Select {
        table: String,
        projection: Projection,
        filter: Option<WhereExpr>,
        order_by: Option<OrderBy>,
        limit: Option<Limit>,
    },
    Update {
        table: String,
        assignments: Vec<(String, Value)>,
        filter: Option<WhereExpr>,
    },
    Delete {
        table: String,
        filter: Option<WhereExpr>,
    },
}
