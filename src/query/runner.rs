use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use crate::buffer::BufferPoolManager;
use crate::catalog::{Catalog, TableInfo};
use crate::common::{MinirelError, PageId, Result};
use crate::row::{decode_row, encode_row, Schema, Value};
use crate::storage::FreeSpaceMap;
use crate::table::{RowLocation, Table};

use super::command::{Command, CompareOp, Limit, LogicalOp, OrderBy, Projection, WhereExpr};

/// Result of executing one statement: either an affected-row count or a
/// result set. Result rows follow the projection's column order; a
/// projected column the table does not have yields NULL.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput {
    Count(usize),
    Rows {
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
    },
}

/// Executes parsed commands against the catalog and table heaps.
pub struct QueryRunner {
    bpm: Arc<BufferPoolManager>,
    fsm: Arc<FreeSpaceMap>,
    catalog: Arc<Catalog>,
}

impl QueryRunner {
    pub fn new(
        bpm: Arc<BufferPoolManager>,
        fsm: Arc<FreeSpaceMap>,
        catalog: Arc<Catalog>,
    ) -> Self {
        Self { bpm, fsm, catalog }
    }

    pub fn run(&self, command: Command) -> Result<QueryOutput> {
        match command {
            Command::CreateTable { table, columns } => {
                self.catalog.create_table(&table, columns)?;
                Ok(QueryOutput::Count(1))
            }
            Command::Insert {
                table,
                columns,
                rows,
            } => self.run_insert(&table, &columns, rows),
            Command::Select {
                table,
                projection,
                filter,
                order_by,
                limit,
            } => self.run_select(&table, projection, filter, order_by, limit),
            Command::Update {
                table,
                assignments,
                filter,
            } => self.run_update(&table, &assignments, filter),
            Command::Delete { table, filter } => self.run_delete(&table, filter),
        }
    }

    fn table_for(&self, info: &TableInfo) -> Table {
        Table::new(
            Arc::clone(&self.bpm),
            Arc::clone(&self.fsm),
            info.first_page_id,
        )
    }

    /// Loads and decodes every row along with its location.
    fn load_rows(&self, info: &TableInfo) -> Result<Vec<(RowLocation, Vec<Value>)>> {
        self.table_for(info)
            .scan()
            .map(|location| {
                let location = location?;
                let values = decode_row(&info.schema, &location.bytes)?;
                Ok((location, values))
            })
            .collect()
    }

    // --- INSERT ---

    fn run_insert(
        &self,
        table: &str,
        columns: &[String],
        rows: Vec<Vec<Value>>,
    ) -> Result<QueryOutput> {
        let info = self.catalog.require_table(table)?;
        let schema = &info.schema;

        let mut batch = Vec::with_capacity(rows.len());
        for row in rows {
            batch.push(position_values(schema, columns, row)?);
        }

        let stored = self.load_rows(&info)?;

        // Fill auto-increment columns before any constraint checks, so the
        // generated values participate in them.
        for (index, column) in schema.columns().iter().enumerate() {
            if !column.auto_increment {
                continue;
            }
            let mut max = stored
                .iter()
                .filter_map(|(_, values)| match values.get(index) {
                    Some(Value::Number(n)) => Some(*n),
                    _ => None,
                })
                .max()
                .unwrap_or(0);

            for row in batch.iter_mut() {
                match &row[index] {
                    Value::Null => {
                        max += 1;
                        row[index] = Value::Number(max);
                    }
                    Value::Number(n) => max = max.max(*n),
                    _ => {}
                }
            }
        }

        // The whole batch is validated before the first write, so a failing
        // statement leaves the table untouched.
        for row in &batch {
            check_types_and_nullability(schema, row)?;
        }
        check_unique(schema, &stored, &batch)?;

        let heap = self.table_for(&info);
        for row in &batch {
            heap.insert(&encode_row(schema, row))?;
        }

        Ok(QueryOutput::Count(batch.len()))
    }

    // --- SELECT ---

    fn run_select(
        &self,
        table: &str,
        projection: Projection,
        filter: Option<WhereExpr>,
        order_by: Option<OrderBy>,
        limit: Option<Limit>,
    ) -> Result<QueryOutput> {
        let info = self.catalog.require_table(table)?;
        let schema = &info.schema;

        let mut rows = Vec::new();
        for (_, values) in self.load_rows(&info)? {
            if matches_filter(&filter, schema, &values)? {
                rows.push(values);
            }
        }

        if let Some(order) = &order_by {
            let index = schema
                .index_of(&order.field)
                .ok_or_else(|| MinirelError::ColumnNotFound(order.field.clone()))?;
            rows.sort_by(|a, b| order_values(&a[index], &b[index]));
            if order.descending {
                rows.reverse();
            }
        }

        if let Some(Limit { limit, offset }) = limit {
            rows = rows.into_iter().skip(offset).take(limit).collect();
        }

        let columns: Vec<String> = match &projection {
            Projection::All => schema.columns().iter().map(|c| c.name.clone()).collect(),
            Projection::Columns(names) => names.clone(),
        };

        let rows = rows
            .into_iter()
            .map(|values| {
                columns
                    .iter()
                    .map(|name| {
                        schema
                            .index_of(name)
                            .map(|i| values[i].clone())
                            .unwrap_or(Value::Null)
                    })
                    .collect()
            })
            .collect();

        Ok(QueryOutput::Rows { columns, rows })
    }

    // --- UPDATE ---

    fn run_update(
        &self,
        table: &str,
        assignments: &[(String, Value)],
        filter: Option<WhereExpr>,
    ) -> Result<QueryOutput> {
        let info = self.catalog.require_table(table)?;
        let schema = &info.schema;

        // Resolve assignment targets up front.
        let mut targets = Vec::with_capacity(assignments.len());
        for (field, value) in assignments {
            let index = schema
                .index_of(field)
                .ok_or_else(|| MinirelError::ColumnNotFound(field.clone()))?;
            targets.push((index, value.clone()));
        }

        let mut updates = Vec::new();
        for (location, values) in self.load_rows(&info)? {
            if !matches_filter(&filter, schema, &values)? {
                continue;
            }
            let mut merged = values;
            for (index, value) in &targets {
                merged[*index] = value.clone();
            }
            updates.push((location, merged));
        }

        // Validate every merged row before the first write.
        for (_, merged) in &updates {
            check_types_and_nullability(schema, merged)?;
        }

        let heap = self.table_for(&info);
        let count = updates.len();
        for (location, merged) in updates {
            // Row indices shift as pages mutate, so the old row is removed
            // by value rather than by its recorded position.
            heap.delete(&location.bytes)?;
            heap.insert(&encode_row(schema, &merged))?;
        }

        Ok(QueryOutput::Count(count))
    }

    // --- DELETE ---

    fn run_delete(&self, table: &str, filter: Option<WhereExpr>) -> Result<QueryOutput> {
        let info = self.catalog.require_table(table)?;
        let schema = &info.schema;

        let mut by_page: HashMap<PageId, Vec<usize>> = HashMap::new();
        let mut count = 0;
        for (location, values) in self.load_rows(&info)? {
            if matches_filter(&filter, schema, &values)? {
                by_page.entry(location.page_id).or_default().push(location.row_index);
                count += 1;
            }
        }

        let heap = self.table_for(&info);
        for (page_id, indices) in by_page {
            heap.delete_batch(page_id, &indices)?;
        }

        Ok(QueryOutput::Count(count))
    }
}

/// Maps an insert row onto schema positions. With an explicit column list
/// the values are reordered; without one they are positional. Unmentioned
/// columns become NULL.
fn position_values(schema: &Schema, columns: &[String], row: Vec<Value>) -> Result<Vec<Value>> {
    if columns.is_empty() {
        if row.len() > schema.len() {
            return Err(MinirelError::ColumnCountMismatch {
                expected: schema.len(),
                found: row.len(),
            });
        }
        let mut values = row;
        values.resize(schema.len(), Value::Null);
        return Ok(values);
    }

    if columns.len() != row.len() {
        return Err(MinirelError::ColumnCountMismatch {
            expected: columns.len(),
            found: row.len(),
        });
    }

    let mut values = vec![Value::Null; schema.len()];
    for (name, value) in columns.iter().zip(row) {
        let index = schema
            .index_of(name)
            .ok_or_else(|| MinirelError::ColumnNotFound(name.clone()))?;
        values[index] = value;
    }
    Ok(values)
}

fn check_types_and_nullability(schema: &Schema, values: &[Value]) -> Result<()> {
    for (column, value) in schema.columns().iter().zip(values) {
        if !value.matches_type(column.data_type) {
            return Err(MinirelError::TypeMismatch {
                column: column.name.clone(),
                expected: column.data_type.to_string(),
            });
        }
        if value.is_null() && !column.nullable {
            return Err(MinirelError::NotNullViolation(column.name.clone()));
        }
    }
    Ok(())
}

/// Checks UNIQUE (and PRIMARY KEY) columns against both the stored rows
/// and the rest of the batch. NULLs never collide.
fn check_unique(
    schema: &Schema,
    stored: &[(RowLocation, Vec<Value>)],
    batch: &[Vec<Value>],
) -> Result<()> {
    for (index, column) in schema.columns().iter().enumerate() {
        if !column.requires_unique() {
            continue;
        }

        let existing: Vec<&Value> = stored
            .iter()
            .filter_map(|(_, values)| values.get(index))
            .filter(|v| !v.is_null())
            .collect();

        let mut seen: Vec<&Value> = Vec::new();
        for row in batch {
            let value = &row[index];
            if value.is_null() {
                continue;
            }
            if existing.contains(&value) {
                return Err(MinirelError::UniqueViolation {
                    column: column.name.clone(),
                    value: value.to_string(),
                });
            }
            if seen.contains(&value) {
                return Err(MinirelError::DuplicateInBatch {
                    column: column.name.clone(),
                    value: value.to_string(),
                });
            }
            seen.push(value);
        }
    }
    Ok(())
}

fn matches_filter(filter: &Option<WhereExpr>, schema: &Schema, values: &[Value]) -> Result<bool> {
    match filter {
        None => Ok(true),
        Some(expr) => evaluate(expr, schema, values),
    }
}

fn evaluate(expr: &WhereExpr, schema: &Schema, values: &[Value]) -> Result<bool> {
    match expr {
        WhereExpr::Logical { op, left, right } => {
            let l = evaluate(left, schema, values)?;
            match op {
                // Short-circuiting matters only for error behavior; both
                // sides were validated at parse time, so evaluate eagerly.
                LogicalOp::And => Ok(l && evaluate(right, schema, values)?),
                LogicalOp::Or => Ok(l || evaluate(right, schema, values)?),
            }
        }
        WhereExpr::Condition {
            field,
            operator,
            value,
        } => {
            let index = schema
                .index_of(field)
                .ok_or_else(|| MinirelError::ColumnNotFound(field.clone()))?;
            let cell = &values[index];

            match operator {
                CompareOp::IsNull => Ok(cell.is_null()),
                CompareOp::IsNotNull => Ok(!cell.is_null()),
                CompareOp::Like => Ok(match (cell, value) {
                    (Value::Text(text), Value::Text(pattern)) => like_match(pattern, text),
                    _ => false,
                }),
                _ => {
                    // NULL compares false with everything.
                    if cell.is_null() {
                        return Ok(false);
                    }
                    let Some(ordering) = compare_values(cell, value) else {
                        return Ok(false);
                    };
                    Ok(match operator {
                        CompareOp::Eq => ordering == Ordering::Equal,
                        CompareOp::NotEq => ordering != Ordering::Equal,
                        CompareOp::Lt => ordering == Ordering::Less,
                        CompareOp::Gt => ordering == Ordering::Greater,
                        CompareOp::LtEq => ordering != Ordering::Greater,
                        CompareOp::GtEq => ordering != Ordering::Less,
                        _ => unreachable!(),
                    })
                }
            }
        }
    }
}

/// Compares two non-null values of the same type; None when the types
/// differ.
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => Some(x.cmp(y)),
        (Value::Text(x), Value::Text(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Total order for ORDER BY: NULL sorts before everything, numbers before
/// text when a column somehow holds both.
fn order_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Number(_) => 1,
            Value::Text(_) => 2,
        }
    }

    rank(a)
        .cmp(&rank(b))
        .then_with(|| compare_values(a, b).unwrap_or(Ordering::Equal))
}

/// SQL LIKE matching: '%' matches any run of characters, '_' exactly one.
/// Matching is case-insensitive.
fn like_match(pattern: &str, text: &str) -> bool {
    fn matches(pattern: &[char], text: &[char]) -> bool {
        match pattern.split_first() {
            None => text.is_empty(),
            Some(('%', rest)) => {
                (0..=text.len()).any(|skip| matches(rest, &text[skip..]))
            }
            Some(('_', rest)) => !text.is_empty() && matches(rest, &text[1..]),
            Some((&ch, rest)) => match text.split_first() {
                Some((&tc, text_rest)) => ch == tc && matches(rest, text_rest),
                None => false,
            },
        }
    }

    let pattern: Vec<char> = pattern.to_lowercase().chars().collect();
    let text: Vec<char> = text.to_lowercase().chars().collect();
    matches(&pattern, &text)
}
