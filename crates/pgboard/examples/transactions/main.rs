//! Example demonstrating transaction bookkeeping, savepoints and retries.
//!
//! Uses an executor that prints every statement instead of running it, so
//! the example works without a database. Swap in a real client and the same
//! code drives PostgreSQL.
//!
//! Run with:
//!   cargo run --example transactions -p pgboard

use pgboard::{
    BatchOperation, DbError, DbResult, Executor, Filter, Record, RetryPolicy, SavepointMode,
    TransactionRegistry, Value, batch_op, build_insert, build_update, retry_execute,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio_postgres::Row;

/// Prints statements instead of executing them.
struct PrintingExec;

impl Executor for PrintingExec {
    async fn query(&self, sql: &str, params: &[Value]) -> DbResult<Vec<Row>> {
        println!("  sql> {sql}   {params:?}");
        Ok(Vec::new())
    }
}

#[tokio::main]
async fn main() -> DbResult<()> {
    let registry = TransactionRegistry::with_savepoint_mode(SavepointMode::Execute);
    let exec = PrintingExec;

    // ── A commit path ───────────────────────────────────────────────────────
    println!("=== A: commit on success ===\n");

    let post_record = Record::new()
        .set("topic_id", 7_i64)
        .set("author_id", 42_i64)
        .set("body", "first!");

    registry
        .with_transaction(|handle| {
            let exec = &exec;
            async move {
                println!("  transaction {} started", handle.id());
                let insert = build_insert("posts", &post_record)?;
                exec.run(&insert).await?;
                Ok::<_, DbError>(())
            }
        })
        .await?;
    println!("  committed; {} transactions still open\n", registry.active_count());

    // ── A rollback path ─────────────────────────────────────────────────────
    println!("=== B: rollback on failure ===\n");

    let result: DbResult<()> = registry
        .with_transaction(|handle| async move {
            println!("  transaction {} started", handle.id());
            Err(DbError::validation("post body is empty"))
        })
        .await;
    println!("  rolled back: {}", result.unwrap_err());
    println!("  {} transactions still open\n", registry.active_count());

    // ── Savepoints ──────────────────────────────────────────────────────────
    println!("=== C: savepoint guards a risky step ===\n");

    registry
        .with_transaction(|handle| {
            let exec = &exec;
            let registry = &registry;
            async move {
                let touch = build_update(
                    "topics",
                    &Record::new().set("reply_count", 8_i64),
                    &[Filter::eq("id", 7_i64)],
                )?;
                exec.run(&touch).await?;

                // The risky part fails, the savepoint rolls back, the outer
                // transaction carries on and commits the reply count.
                let risky: DbResult<()> = registry
                    .with_savepoint(exec, &handle, "award_badge", || async {
                        Err(DbError::validation("badge already awarded"))
                    })
                    .await;
                println!("  savepoint result: {}", risky.unwrap_err());

                Ok::<_, DbError>(())
            }
        })
        .await?;
    println!();

    // ── Batches ─────────────────────────────────────────────────────────────
    println!("=== D: batch inside one transaction ===\n");

    let exec = Arc::new(PrintingExec);
    let ops: Vec<BatchOperation<()>> = vec![
        {
            let exec = Arc::clone(&exec);
            batch_op(move |_| async move {
                let stmt = build_insert("topics", &Record::new().set("title", "Announcements"))?;
                exec.run(&stmt).await.map(|_| ())
            })
        },
        {
            let exec = Arc::clone(&exec);
            batch_op(move |_| async move {
                let stmt = build_insert("topics", &Record::new().set("title", "Introductions"))?;
                exec.run(&stmt).await.map(|_| ())
            })
        },
    ];
    let results = registry.transaction_batch(ops).await?;
    println!("  {} operations committed together\n", results.len());

    // ── Retries ─────────────────────────────────────────────────────────────
    println!("=== E: retry around a flaky operation ===\n");

    let attempts = AtomicU32::new(0);
    let policy = RetryPolicy::default();
    let value = retry_execute(&policy, || {
        let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
        async move {
            if attempt < 3 {
                println!("  attempt {attempt}: connection refused, backing off");
                Err(DbError::Connection("connection refused".to_string()))
            } else {
                println!("  attempt {attempt}: succeeded");
                Ok(attempt)
            }
        }
    })
    .await?;
    println!("  recovered after {value} attempts");

    // Permanent failures are returned immediately, with no retry.
    let once = AtomicU32::new(0);
    let rejected: DbResult<()> = retry_execute(&policy, || {
        once.fetch_add(1, Ordering::SeqCst);
        async { Err(DbError::validation("title too long")) }
    })
    .await;
    println!(
        "  permanent error after {} attempt(s): {}",
        once.load(Ordering::SeqCst),
        rejected.unwrap_err()
    );

    Ok(())
}
