//! Executor trait for unified statement execution.
//!
//! [`Executor`] is the seam between statement building and the driver: a
//! direct client, a pooled client and a transaction all implement it, so the
//! same data-access code runs in any of them. Only row-returning execution
//! is required; everything else is derived from it.

use crate::error::{DbError, DbResult};
use crate::options::{PageRequest, QueryOptions};
use crate::page::Paginated;
use crate::query::{Statement, build_count, build_select};
use crate::value::Value;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// Rows per page when options carry no pagination request.
pub const DEFAULT_PER_PAGE: i64 = 20;

fn bind_params(params: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    params.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

/// A source of query execution.
///
/// Implemented for `tokio_postgres::Client`, transactions and pooled
/// clients. Driver errors come back already classified as [`DbError`].
pub trait Executor: Send + Sync {
    /// Run a statement and return all rows.
    fn query(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = DbResult<Vec<Row>>> + Send;

    /// Run a statement and return the **first** row.
    ///
    /// Returns [`DbError::NotFound`] when no rows come back; extra rows are
    /// ignored, not an error.
    fn query_one(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = DbResult<Row>> + Send {
        async move {
            let rows = self.query(sql, params).await?;
            rows.into_iter()
                .next()
                .ok_or_else(|| DbError::not_found("Expected one row, got none"))
        }
    }

    /// Run a statement and return the first row, if any.
    fn query_opt(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = DbResult<Option<Row>>> + Send {
        async move {
            let rows = self.query(sql, params).await?;
            Ok(rows.into_iter().next())
        }
    }

    /// Run a built [`Statement`].
    fn run(
        &self,
        statement: &Statement,
    ) -> impl std::future::Future<Output = DbResult<Vec<Row>>> + Send {
        self.query(&statement.sql, &statement.params)
    }
}

impl Executor for tokio_postgres::Client {
    async fn query(&self, sql: &str, params: &[Value]) -> DbResult<Vec<Row>> {
        let bound = bind_params(params);
        tokio_postgres::Client::query(self, sql, &bound)
            .await
            .map_err(|e| DbError::from_db_error(e).with_statement(sql))
    }
}

impl Executor for tokio_postgres::Transaction<'_> {
    async fn query(&self, sql: &str, params: &[Value]) -> DbResult<Vec<Row>> {
        let bound = bind_params(params);
        tokio_postgres::Transaction::query(self, sql, &bound)
            .await
            .map_err(|e| DbError::from_db_error(e).with_statement(sql))
    }
}

impl<E: Executor> Executor for &E {
    async fn query(&self, sql: &str, params: &[Value]) -> DbResult<Vec<Row>> {
        (*self).query(sql, params).await
    }
}

// ===== deadpool-postgres support =====

#[cfg(feature = "pool")]
impl Executor for deadpool_postgres::Client {
    async fn query(&self, sql: &str, params: &[Value]) -> DbResult<Vec<Row>> {
        // Delegate to the deref target (ClientWrapper).
        Executor::query(&**self, sql, params).await
    }
}

#[cfg(feature = "pool")]
impl Executor for deadpool_postgres::ClientWrapper {
    async fn query(&self, sql: &str, params: &[Value]) -> DbResult<Vec<Row>> {
        Executor::query(&**self, sql, params).await
    }
}

#[cfg(feature = "pool")]
impl Executor for deadpool_postgres::Transaction<'_> {
    async fn query(&self, sql: &str, params: &[Value]) -> DbResult<Vec<Row>> {
        Executor::query(&**self, sql, params).await
    }
}

/// Fetch one page of rows plus the matching total, assembled into a
/// [`Paginated`] envelope.
///
/// Runs the SELECT built from `options`, then its COUNT companion over the
/// same WHERE clause. Options without a pagination request get the first
/// page of [`DEFAULT_PER_PAGE`] rows.
pub async fn fetch_page<E>(
    exec: &E,
    table: &str,
    options: &QueryOptions,
) -> DbResult<Paginated<Row>>
where
    E: Executor,
{
    let mut options = options.clone();
    let request = match options.page.clone() {
        Some(request) => request,
        None => {
            let request = PageRequest::new(1, DEFAULT_PER_PAGE);
            options.page = Some(request.clone());
            request
        }
    };

    let select = build_select(table, &options);
    let count = build_count(table, &options);

    let rows = exec.run(&select).await?;
    let total_row = exec.query_one(&count.sql, &count.params).await?;
    let total: i64 = total_row.try_get(0).map_err(DbError::from_db_error)?;

    Ok(Paginated::assemble(rows, total, &request))
}
