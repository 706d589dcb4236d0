//! Example demonstrating pgboard's statement builders.
//!
//! Builds the statements a forum data layer issues — topic listings, post
//! CRUD — and prints the SQL plus parameter lists. Nothing here touches a
//! database.
//!
//! Run with:
//!   cargo run --example build_queries -p pgboard

use pgboard::{
    DbResult, Filter, PageRequest, Paginated, QueryOptions, Record, Statement, build_count,
    build_delete, build_insert, build_select, build_update,
};

fn show(label: &str, stmt: &Statement) {
    println!("{label}:");
    println!("  sql    = {}", stmt.sql);
    println!("  params = {:?}\n", stmt.params);
}

fn main() -> DbResult<()> {
    println!("=== Topic listing ===\n");

    // Visible topics in one category, searched, pinned-then-newest, page 2.
    let listing = QueryOptions::new()
        .search("borrow checker", &["title", "body"])
        .eq("category_id", 3_i64)
        .ne("status", "hidden")
        .order_by_desc("pinned")
        .order_by_desc("created_at")
        .paginate(2, 25);

    show("SELECT", &build_select("topics", &listing));
    show("COUNT ", &build_count("topics", &listing));

    println!("=== Projection and IN lists ===\n");

    let moderation_queue = QueryOptions::new()
        .fields(&["id", "title", "author_id"])
        .in_list("status", ["flagged", "reported"])
        .order_by_asc("created_at");
    show("SELECT", &build_select("posts", &moderation_queue));

    // An empty IN list drops that condition instead of failing.
    let nothing_excluded = QueryOptions::new()
        .eq("topic_id", 7_i64)
        .not_in("author_id", Vec::<i64>::new());
    show("SELECT", &build_select("posts", &nothing_excluded));

    println!("=== Post CRUD ===\n");

    let new_post = Record::new()
        .set("topic_id", 7_i64)
        .set("author_id", 42_i64)
        .set("body", "Great question — the answer is lifetimes.");
    show("INSERT", &build_insert("posts", &new_post)?);

    let edit = Record::new()
        .set("body", "Great question (edited for clarity).")
        .set("edited", true);
    show(
        "UPDATE",
        &build_update("posts", &edit, &[Filter::eq("id", 901_i64)])?,
    );

    show(
        "DELETE",
        &build_delete(
            "posts",
            &[
                Filter::eq("topic_id", 7_i64),
                Filter::eq("status", "spam"),
            ],
        ),
    );

    println!("=== Pagination envelope ===\n");

    // Pretend the listing returned 25 rows of a 60-row result set.
    let request = PageRequest::new(2, 25);
    let page = Paginated::assemble((26..=50).collect::<Vec<i64>>(), 60, &request);
    println!("page       = {}/{}", page.pagination.page, page.pagination.total_pages);
    println!("rows       = {}", page.data.len());
    println!("total rows = {}", page.pagination.total);
    println!("has_next   = {}", page.pagination.has_next);
    println!("has_prev   = {}", page.pagination.has_prev);

    Ok(())
}
