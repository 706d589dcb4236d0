//! Statement composition.
//!
//! The `build_*` functions assemble complete SQL statements from a table
//! name plus option types, combining the clause builders so that `$n`
//! placeholders stay contiguous in the order search, filters, pagination.
//! Building never touches the database. The same inputs always produce the
//! same [`Statement`].

use crate::clause::{filter_clause, order_clause, page_clause, search_clause};
use crate::error::{DbError, DbResult};
use crate::options::{Filter, QueryOptions, Record};
use crate::value::Value;

/// A complete SQL statement with its bind parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

fn trace_built(kind: &str, statement: &Statement) {
    #[cfg(feature = "tracing")]
    tracing::debug!(
        kind,
        sql = %statement.sql,
        params = statement.params.len(),
        "statement built"
    );
    #[cfg(not(feature = "tracing"))]
    let _ = (kind, statement);
}

/// Append the WHERE clause for `options` (search first, then filters),
/// continuing placeholder numbering from `params`.
fn push_where(sql: &mut String, params: &mut Vec<Value>, options: &QueryOptions) {
    let mut clauses = Vec::new();

    if let Some(search) = &options.search {
        let frag = search_clause(search, params.len());
        if !frag.is_empty() {
            clauses.push(frag.sql);
            params.extend(frag.params);
        }
    }

    let frag = filter_clause(&options.filters, params.len());
    if !frag.is_empty() {
        clauses.push(frag.sql);
        params.extend(frag.params);
    }

    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
}

/// Build a SELECT over `table` from the given options.
///
/// Clause order is fixed: projection, WHERE (search then filters),
/// ORDER BY, LIMIT/OFFSET.
pub fn build_select(table: &str, options: &QueryOptions) -> Statement {
    let projection = if options.fields.is_empty() {
        "*".to_string()
    } else {
        options.fields.join(", ")
    };

    let mut sql = format!("SELECT {projection} FROM {table}");
    let mut params = Vec::new();

    push_where(&mut sql, &mut params, options);

    let order = order_clause(&options.order);
    if !order.is_empty() {
        sql.push(' ');
        sql.push_str(&order);
    }

    if let Some(page) = &options.page {
        let frag = page_clause(page, params.len());
        sql.push(' ');
        sql.push_str(&frag.sql);
        params.extend(frag.params);
    }

    let statement = Statement { sql, params };
    trace_built("select", &statement);
    statement
}

/// Build the COUNT companion of [`build_select`].
///
/// Shares the WHERE clause (same placeholder numbering), ignores ordering,
/// projection and pagination, which do not change a count.
pub fn build_count(table: &str, options: &QueryOptions) -> Statement {
    let mut sql = format!("SELECT COUNT(*) FROM {table}");
    let mut params = Vec::new();

    push_where(&mut sql, &mut params, options);

    let statement = Statement { sql, params };
    trace_built("count", &statement);
    statement
}

/// Build an INSERT of one record, returning the inserted row.
///
/// Fails with a validation error when the record has no columns.
pub fn build_insert(table: &str, record: &Record) -> DbResult<Statement> {
    if record.is_empty() {
        return Err(DbError::validation("INSERT requires at least one column"));
    }

    let mut columns = Vec::with_capacity(record.len());
    let mut placeholders = Vec::with_capacity(record.len());
    let mut params = Vec::with_capacity(record.len());
    for (index, (column, value)) in record.iter().enumerate() {
        columns.push(column.to_string());
        placeholders.push(format!("${}", index + 1));
        params.push(value.clone());
    }

    let statement = Statement {
        sql: format!(
            "INSERT INTO {table} ({}) VALUES ({}) RETURNING *",
            columns.join(", "),
            placeholders.join(", ")
        ),
        params,
    };
    trace_built("insert", &statement);
    Ok(statement)
}

/// Build an UPDATE of the columns in `record` for rows matching `filters`,
/// returning the updated rows.
///
/// SET placeholders come first, filter placeholders continue after them.
/// Fails with a validation error when the record has no columns.
pub fn build_update(table: &str, record: &Record, filters: &[Filter]) -> DbResult<Statement> {
    if record.is_empty() {
        return Err(DbError::validation("UPDATE requires at least one column"));
    }

    let mut assignments = Vec::with_capacity(record.len());
    let mut params = Vec::with_capacity(record.len());
    for (index, (column, value)) in record.iter().enumerate() {
        assignments.push(format!("{column} = ${}", index + 1));
        params.push(value.clone());
    }

    let mut sql = format!("UPDATE {table} SET {}", assignments.join(", "));

    let frag = filter_clause(filters, params.len());
    if !frag.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&frag.sql);
        params.extend(frag.params);
    }
    sql.push_str(" RETURNING *");

    let statement = Statement { sql, params };
    trace_built("update", &statement);
    Ok(statement)
}

/// Build a DELETE for rows matching `filters`.
///
/// With no filters (or only dropped ones) the statement deletes every row;
/// callers decide whether that is intended.
pub fn build_delete(table: &str, filters: &[Filter]) -> Statement {
    let mut sql = format!("DELETE FROM {table}");
    let frag = filter_clause(filters, 0);
    if !frag.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&frag.sql);
    }

    let statement = Statement {
        sql,
        params: frag.params,
    };
    trace_built("delete", &statement);
    statement
}
