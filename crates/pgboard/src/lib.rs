//! # pgboard
//!
//! The data-access core of a PostgreSQL forum backend: dynamic SQL statement
//! construction plus transaction and savepoint coordination.
//!
//! ## Features
//!
//! - **Statements, not strings**: filters, search, ordering, projection and
//!   pagination compose into one statement with positional `$n` placeholders
//!   and a parameter list whose order is kept aligned by construction
//! - **Values never touch SQL text**: everything untrusted binds through a
//!   parameter; only static identifiers are interpolated
//! - **Typed failures**: driver errors are classified once into a small
//!   taxonomy (`DbError`) the rest of the application matches on
//! - **Retry with judgement**: transient failures back off and retry,
//!   permanent ones fail on first occurrence (`retry_execute`)
//! - **Explicit transaction bookkeeping**: a constructor-created
//!   `TransactionRegistry` tracks logical transactions and savepoints,
//!   injectable per test
//!
//! ## Building statements
//!
//! ```ignore
//! use pgboard::{QueryOptions, build_select};
//!
//! let options = QueryOptions::new()
//!     .eq("status", "open")
//!     .search("rust", &["title", "body"])
//!     .order_by_desc("created_at")
//!     .paginate(2, 20);
//!
//! let stmt = build_select("topics", &options);
//! // stmt.sql:
//! //   SELECT * FROM topics
//! //   WHERE (title LIKE $1 OR body LIKE $1) AND status = $2
//! //   ORDER BY created_at DESC LIMIT $3 OFFSET $4
//! // stmt.params: ["%rust%", "open", 20, 20]
//! ```
//!
//! ## Running statements
//!
//! Execution goes through the single-method [`Executor`] capability,
//! implemented for `tokio_postgres` clients and transactions (and for pooled
//! clients with the `pool` feature):
//!
//! ```ignore
//! let page = pgboard::fetch_page(&client, "topics", &options).await?;
//! println!("{} of {} topics", page.data.len(), page.pagination.total);
//! ```

pub mod clause;
pub mod client;
pub mod error;
pub mod options;
pub mod page;
pub mod query;
pub mod retry;
pub mod transaction;
pub mod value;

pub use clause::{Fragment, filter_clause, order_clause, page_clause, search_clause};
pub use client::{DEFAULT_PER_PAGE, Executor, fetch_page};
pub use error::{DbError, DbResult};
pub use options::{Filter, FilterOp, PageRequest, QueryOptions, Record, Search, Sort, SortDir};
pub use page::{PageMeta, Paginated};
pub use query::{Statement, build_count, build_delete, build_insert, build_select, build_update};
pub use retry::{RetryPolicy, retry_execute, safe_execute};
pub use transaction::{
    BatchOperation, Savepoint, SavepointMode, TransactionHandle, TransactionRegistry, batch_op,
};
pub use value::Value;

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "pool")]
pub use pool::{create_pool, create_pool_with_config};

#[cfg(test)]
mod tests;
