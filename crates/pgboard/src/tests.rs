//! Cross-module tests: statements composed end to end, and transaction
//! coordination running built statements through an executor.

use crate::client::Executor;
use crate::error::{DbError, DbResult};
use crate::options::{Filter, PageRequest, QueryOptions, Record};
use crate::page::Paginated;
use crate::query::{build_count, build_insert, build_select, build_update};
use crate::retry::{RetryPolicy, retry_execute};
use crate::transaction::{BatchOperation, SavepointMode, TransactionRegistry, batch_op};
use crate::value::Value;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tokio_postgres::Row;

/// Distinct placeholder numbers in `sql`, in first-appearance order.
fn placeholder_numbers(sql: &str) -> Vec<usize> {
    let mut seen = Vec::new();
    let bytes = sql.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'$' {
            let start = i + 1;
            let mut end = start;
            while end < bytes.len() && bytes[end].is_ascii_digit() {
                end += 1;
            }
            if end > start {
                let n: usize = sql[start..end].parse().unwrap();
                if !seen.contains(&n) {
                    seen.push(n);
                }
            }
            i = end;
        } else {
            i += 1;
        }
    }
    seen
}

#[derive(Default)]
struct SpyExec {
    statements: Mutex<Vec<String>>,
}

impl Executor for SpyExec {
    async fn query(&self, sql: &str, _params: &[Value]) -> DbResult<Vec<Row>> {
        self.statements.lock().unwrap().push(sql.to_string());
        Ok(Vec::new())
    }
}

#[test]
fn test_topic_listing_page() {
    // The canonical forum listing: topics in one category, searched, with
    // hidden ones excluded, pinned-then-newest, second page.
    let options = QueryOptions::new()
        .search("lifetime", &["title", "body"])
        .eq("category_id", 4_i64)
        .ne("status", "hidden")
        .order_by_desc("pinned")
        .order_by_desc("created_at")
        .paginate(2, 25);

    let select = build_select("topics", &options);
    assert_eq!(
        select.sql,
        "SELECT * FROM topics WHERE (title LIKE $1 OR body LIKE $1) AND category_id = $2 \
         AND status != $3 ORDER BY pinned DESC, created_at DESC LIMIT $4 OFFSET $5"
    );
    assert_eq!(
        select.params,
        vec![
            Value::Text("%lifetime%".to_string()),
            Value::Int(4),
            Value::Text("hidden".to_string()),
            Value::Int(25),
            Value::Int(25),
        ]
    );

    let count = build_count("topics", &options);
    assert_eq!(
        count.sql,
        "SELECT COUNT(*) FROM topics WHERE (title LIKE $1 OR body LIKE $1) AND category_id = $2 \
         AND status != $3"
    );
    assert_eq!(count.params, select.params[..3].to_vec());
}

#[test]
fn test_placeholders_stay_contiguous_across_clause_mixes() {
    let mixes = vec![
        QueryOptions::new().eq("status", "open"),
        QueryOptions::new().search("abc", &["title", "body"]),
        QueryOptions::new().paginate(2, 10),
        QueryOptions::new()
            .search("abc", &["title"])
            .eq("status", "open")
            .in_list("forum_id", [1_i64, 2, 3])
            .paginate(4, 25),
        QueryOptions::new()
            .in_list("tag", ["rust", "async"])
            .not_in("status", ["deleted"])
            .order_by_asc("id")
            .paginate(1, 5),
    ];

    for options in mixes {
        let stmt = build_select("topics", &options);
        let expected: Vec<usize> = (1..=stmt.params.len()).collect();
        assert_eq!(placeholder_numbers(&stmt.sql), expected, "sql: {}", stmt.sql);
    }
}

#[test]
fn test_search_adds_one_param_no_matter_how_many_fields() {
    for fields in [
        &["title"][..],
        &["title", "body"],
        &["title", "body", "excerpt", "slug"],
    ] {
        let options = QueryOptions::new().search("needle", fields);
        let stmt = build_select("posts", &options);
        assert_eq!(stmt.params, vec![Value::Text("%needle%".to_string())]);
        // every searched field compares against the same placeholder
        assert_eq!(stmt.sql.matches("$1").count(), fields.len());
    }
}

#[test]
fn test_update_set_range_then_filter_range() {
    let record = Record::new().set("status", "closed").set("locked", true);
    let filters = vec![
        Filter::eq("category_id", 9_i64),
        Filter::in_list("id", [3_i64, 5, 8]),
    ];

    let stmt = build_update("topics", &record, &filters).unwrap();
    assert_eq!(
        stmt.sql,
        "UPDATE topics SET status = $1, locked = $2 \
         WHERE category_id = $3 AND id IN ($4, $5, $6) RETURNING *"
    );
    assert_eq!(stmt.params.len(), 6);
    assert_eq!(placeholder_numbers(&stmt.sql), vec![1, 2, 3, 4, 5, 6]);
}

#[test]
fn test_listing_envelope_matches_the_request() {
    let request = PageRequest::new(2, 25);
    let page = Paginated::assemble(vec!["t26", "t27"], 60, &request);
    assert_eq!(page.pagination.total_pages, 3);
    assert!(page.pagination.has_next);
    assert!(page.pagination.has_prev);
    assert_eq!(page.pagination.per_page, 25);
}

#[tokio::test(start_paused = true)]
async fn test_transient_retry_inside_a_transaction_commits() {
    let registry = TransactionRegistry::new();
    let attempts = AtomicU32::new(0);

    let out = registry
        .with_transaction(|_handle| async {
            retry_execute(&RetryPolicy::default(), || {
                let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if attempt < 3 {
                        Err(DbError::Connection("flaky".to_string()))
                    } else {
                        Ok(attempt)
                    }
                }
            })
            .await
        })
        .await
        .unwrap();

    assert_eq!(out, 3);
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    assert_eq!(registry.active_count(), 0);
}

#[tokio::test]
async fn test_batch_runs_built_statements_in_order() {
    let registry = TransactionRegistry::new();
    let exec = Arc::new(SpyExec::default());

    let topic = Record::new().set("title", "welcome").set("author_id", 1_i64);
    let post = Record::new().set("topic_id", 1_i64).set("body", "first post");
    let insert_topic = build_insert("topics", &topic).unwrap();
    let insert_post = build_insert("posts", &post).unwrap();

    let ops: Vec<BatchOperation<usize>> = vec![
        {
            let exec = Arc::clone(&exec);
            batch_op(move |_| async move { exec.run(&insert_topic).await.map(|rows| rows.len()) })
        },
        {
            let exec = Arc::clone(&exec);
            batch_op(move |_| async move { exec.run(&insert_post).await.map(|rows| rows.len()) })
        },
    ];

    let results = registry.transaction_batch(ops).await.unwrap();
    assert_eq!(results, vec![0, 0]);

    let seen = exec.statements.lock().unwrap();
    assert!(seen[0].starts_with("INSERT INTO topics"));
    assert!(seen[1].starts_with("INSERT INTO posts"));
    assert_eq!(registry.active_count(), 0);
}

#[tokio::test]
async fn test_batch_stops_issuing_statements_after_a_failure() {
    let registry = TransactionRegistry::new();
    let exec = Arc::new(SpyExec::default());

    let ops: Vec<BatchOperation<()>> = vec![
        {
            let exec = Arc::clone(&exec);
            batch_op(move |_| async move {
                exec.query("UPDATE topics SET reply_count = reply_count + 1", &[])
                    .await?;
                Ok(())
            })
        },
        batch_op(|_| async { Err(DbError::validation("bad post body")) }),
        {
            let exec = Arc::clone(&exec);
            batch_op(move |_| async move {
                exec.query("UPDATE users SET post_count = post_count + 1", &[])
                    .await?;
                Ok(())
            })
        },
    ];

    let err = registry.transaction_batch(ops).await.unwrap_err();
    assert!(matches!(err, DbError::Validation { .. }));
    assert_eq!(exec.statements.lock().unwrap().len(), 1);
    assert_eq!(registry.active_count(), 0);
}

#[tokio::test]
async fn test_savepoint_guard_brackets_the_statements_it_protects() {
    let registry = TransactionRegistry::with_savepoint_mode(SavepointMode::Execute);
    let exec = SpyExec::default();

    registry
        .with_transaction(|handle| {
            let exec = &exec;
            let registry = &registry;
            async move {
                let record = Record::new().set("body", "draft");
                let stmt = build_insert("posts", &record)?;
                registry
                    .with_savepoint(exec, &handle, "draft_post", || async {
                        exec.run(&stmt).await.map(|_| ())
                    })
                    .await
            }
        })
        .await
        .unwrap();

    let seen = exec.statements.lock().unwrap();
    assert_eq!(seen[0], "SAVEPOINT \"draft_post\"");
    assert!(seen[1].starts_with("INSERT INTO posts"));
    assert_eq!(seen[2], "RELEASE SAVEPOINT \"draft_post\"");
}
