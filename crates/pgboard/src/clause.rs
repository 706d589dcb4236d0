//! Clause builders.
//!
//! Each builder is a pure function from option types to a [`Fragment`]:
//! a piece of SQL text plus the parameters it binds, with placeholders
//! numbered from a caller-supplied offset. The statement composer in
//! [`crate::query`] threads that offset so placeholders stay contiguous
//! across clauses.

use crate::options::{Filter, FilterOp, PageRequest, Search, Sort};
use crate::value::Value;

/// A piece of SQL text and the parameters it binds.
///
/// Placeholders inside `sql` are numbered `$offset+1 ..= $offset+params.len()`
/// for whatever offset the fragment was built with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Fragment {
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }
}

/// Build the conjunction of filter conditions.
///
/// Emits `field op $n` terms joined with ` AND `, without the `WHERE`
/// keyword; the composer owns that. `In`/`NotIn` expand to one placeholder
/// per element. A filter whose list is empty is dropped and consumes no
/// placeholder numbers.
pub fn filter_clause(filters: &[Filter], offset: usize) -> Fragment {
    let mut conditions = Vec::with_capacity(filters.len());
    let mut params = Vec::new();
    let mut next = offset;

    for filter in filters {
        match &filter.op {
            FilterOp::Eq(value)
            | FilterOp::Ne(value)
            | FilterOp::Gt(value)
            | FilterOp::Gte(value)
            | FilterOp::Lt(value)
            | FilterOp::Lte(value)
            | FilterOp::Like(value) => {
                next += 1;
                conditions.push(format!(
                    "{} {} ${next}",
                    filter.field,
                    filter.op.comparison()
                ));
                params.push(value.clone());
            }
            FilterOp::In(values) | FilterOp::NotIn(values) => {
                if values.is_empty() {
                    continue;
                }
                let mut placeholders = Vec::with_capacity(values.len());
                for value in values {
                    next += 1;
                    placeholders.push(format!("${next}"));
                    params.push(value.clone());
                }
                conditions.push(format!(
                    "{} {} ({})",
                    filter.field,
                    filter.op.comparison(),
                    placeholders.join(", ")
                ));
            }
        }
    }

    Fragment {
        sql: conditions.join(" AND "),
        params,
    }
}

/// Build a multi-column LIKE search sharing a single parameter.
///
/// Emits `(f1 LIKE $k OR f2 LIKE $k ...)` where every column compares
/// against the same placeholder, bound once to `%term%`.
pub fn search_clause(search: &Search, offset: usize) -> Fragment {
    if search.fields.is_empty() {
        return Fragment::default();
    }
    let slot = offset + 1;
    let terms: Vec<String> = search
        .fields
        .iter()
        .map(|field| format!("{field} LIKE ${slot}"))
        .collect();
    Fragment {
        sql: format!("({})", terms.join(" OR ")),
        params: vec![Value::Text(search.pattern())],
    }
}

/// Build an ORDER BY clause. Sort fields and directions are interpolated
/// directly, so no parameters are ever produced.
pub fn order_clause(order: &[Sort]) -> String {
    if order.is_empty() {
        return String::new();
    }
    let terms: Vec<String> = order
        .iter()
        .map(|sort| format!("{} {}", sort.field, sort.dir.as_sql()))
        .collect();
    format!("ORDER BY {}", terms.join(", "))
}

/// Build a LIMIT/OFFSET clause with both bounds as bind parameters.
pub fn page_clause(page: &PageRequest, offset: usize) -> Fragment {
    Fragment {
        sql: format!("LIMIT ${} OFFSET ${}", offset + 1, offset + 2),
        params: vec![Value::Int(page.limit()), Value::Int(page.offset())],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::SortDir;

    #[test]
    fn filter_numbers_placeholders_from_offset() {
        let filters = vec![
            Filter::eq("status", "active"),
            Filter::gte("age", 18_i64),
        ];
        let frag = filter_clause(&filters, 0);
        assert_eq!(frag.sql, "status = $1 AND age >= $2");
        assert_eq!(
            frag.params,
            vec![Value::Text("active".to_string()), Value::Int(18)]
        );

        let shifted = filter_clause(&filters, 2);
        assert_eq!(shifted.sql, "status = $3 AND age >= $4");
        assert_eq!(shifted.params.len(), 2);
    }

    #[test]
    fn every_operator_emits_its_token() {
        let filters = vec![
            Filter::ne("a", 1_i64),
            Filter::gt("b", 2_i64),
            Filter::lt("c", 3_i64),
            Filter::lte("d", 4_i64),
            Filter::like("e", "%x%"),
        ];
        let frag = filter_clause(&filters, 0);
        assert_eq!(
            frag.sql,
            "a != $1 AND b > $2 AND c < $3 AND d <= $4 AND e LIKE $5"
        );
        assert_eq!(frag.params.len(), 5);
    }

    #[test]
    fn in_expands_one_placeholder_per_element() {
        let filters = vec![Filter::in_list("id", [1_i64, 2, 3])];
        let frag = filter_clause(&filters, 0);
        assert_eq!(frag.sql, "id IN ($1, $2, $3)");
        assert_eq!(
            frag.params,
            vec![Value::Int(1), Value::Int(2), Value::Int(3)]
        );
    }

    #[test]
    fn not_in_mirrors_in() {
        let filters = vec![Filter::not_in("status", ["locked", "hidden"])];
        let frag = filter_clause(&filters, 0);
        assert_eq!(frag.sql, "status NOT IN ($1, $2)");
        assert_eq!(frag.params.len(), 2);
    }

    #[test]
    fn empty_in_list_is_dropped_without_consuming_slots() {
        let filters = vec![
            Filter::in_list("id", Vec::<i64>::new()),
            Filter::eq("status", "active"),
        ];
        let frag = filter_clause(&filters, 0);
        assert_eq!(frag.sql, "status = $1");
        assert_eq!(frag.params, vec![Value::Text("active".to_string())]);
    }

    #[test]
    fn no_filters_builds_an_empty_fragment() {
        let frag = filter_clause(&[], 0);
        assert!(frag.is_empty());
        assert!(frag.params.is_empty());
    }

    #[test]
    fn search_shares_one_placeholder_across_fields() {
        let search = Search::new("rust", &["title", "body", "tags"]);
        let frag = search_clause(&search, 0);
        assert_eq!(
            frag.sql,
            "(title LIKE $1 OR body LIKE $1 OR tags LIKE $1)"
        );
        assert_eq!(frag.params, vec![Value::Text("%rust%".to_string())]);
    }

    #[test]
    fn search_respects_the_offset() {
        let search = Search::new("abc", &["title"]);
        let frag = search_clause(&search, 4);
        assert_eq!(frag.sql, "(title LIKE $5)");
        assert_eq!(frag.params.len(), 1);
    }

    #[test]
    fn search_without_fields_is_empty() {
        let search = Search::new("abc", &[]);
        assert!(search_clause(&search, 0).is_empty());
    }

    #[test]
    fn order_joins_terms_in_order() {
        let order = vec![Sort::desc("created_at"), Sort::asc("id")];
        assert_eq!(order_clause(&order), "ORDER BY created_at DESC, id ASC");
        assert_eq!(order_clause(&[]), "");
    }

    #[test]
    fn order_uppercases_direction() {
        let order = vec![Sort {
            field: "name".to_string(),
            dir: SortDir::Asc,
        }];
        assert_eq!(order_clause(&order), "ORDER BY name ASC");
    }

    #[test]
    fn page_binds_limit_and_offset() {
        let page = PageRequest::new(2, 20);
        let frag = page_clause(&page, 0);
        assert_eq!(frag.sql, "LIMIT $1 OFFSET $2");
        assert_eq!(frag.params, vec![Value::Int(20), Value::Int(20)]);
    }

    #[test]
    fn page_continues_numbering_after_offset() {
        let page = PageRequest::new(1, 10);
        let frag = page_clause(&page, 3);
        assert_eq!(frag.sql, "LIMIT $4 OFFSET $5");
        assert_eq!(frag.params, vec![Value::Int(10), Value::Int(0)]);
    }

    #[test]
    fn builders_are_idempotent() {
        let filters = vec![Filter::eq("status", "active")];
        assert_eq!(filter_clause(&filters, 0), filter_clause(&filters, 0));

        let search = Search::new("x", &["a", "b"]);
        assert_eq!(search_clause(&search, 1), search_clause(&search, 1));
    }
}
