//! Query option types: filters, search, ordering, pagination and records.
//!
//! These are plain data carriers. The clause builders in [`crate::clause`]
//! turn them into SQL text and parameter lists.

use crate::value::Value;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    Desc,
}

impl SortDir {
    pub(crate) fn as_sql(self) -> &'static str {
        match self {
            SortDir::Asc => "ASC",
            SortDir::Desc => "DESC",
        }
    }
}

/// A single ORDER BY term.
#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    pub field: String,
    pub dir: SortDir,
}

impl Sort {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            dir: SortDir::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            dir: SortDir::Desc,
        }
    }
}

/// A comparison operator together with its operand.
///
/// Scalar operators carry one value; `In`/`NotIn` carry a list that expands
/// to one placeholder per element.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOp {
    Eq(Value),
    Ne(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    Like(Value),
    In(Vec<Value>),
    NotIn(Vec<Value>),
}

impl FilterOp {
    /// SQL token for this operator.
    pub(crate) fn comparison(&self) -> &'static str {
        match self {
            FilterOp::Eq(_) => "=",
            FilterOp::Ne(_) => "!=",
            FilterOp::Gt(_) => ">",
            FilterOp::Gte(_) => ">=",
            FilterOp::Lt(_) => "<",
            FilterOp::Lte(_) => "<=",
            FilterOp::Like(_) => "LIKE",
            FilterOp::In(_) => "IN",
            FilterOp::NotIn(_) => "NOT IN",
        }
    }
}

/// A single WHERE condition on one column.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
}

impl Filter {
    pub fn new(field: impl Into<String>, op: FilterOp) -> Self {
        Self {
            field: field.into(),
            op,
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::Eq(value.into()))
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::Ne(value.into()))
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::Gt(value.into()))
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::Gte(value.into()))
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::Lt(value.into()))
    }

    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::Lte(value.into()))
    }

    pub fn like(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::Like(value.into()))
    }

    pub fn in_list<V>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self
    where
        V: Into<Value>,
    {
        Self::new(
            field,
            FilterOp::In(values.into_iter().map(Into::into).collect()),
        )
    }

    pub fn not_in<V>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self
    where
        V: Into<Value>,
    {
        Self::new(
            field,
            FilterOp::NotIn(values.into_iter().map(Into::into).collect()),
        )
    }
}

/// A LIKE search for one term across several columns.
///
/// All columns compare against the same bind parameter, so a search adds
/// exactly one parameter no matter how many fields it spans.
#[derive(Debug, Clone, PartialEq)]
pub struct Search {
    pub term: String,
    pub fields: Vec<String>,
}

impl Search {
    pub fn new(term: impl Into<String>, fields: &[&str]) -> Self {
        Self {
            term: term.into(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }

    /// The bind pattern: the term wrapped in `%` wildcards.
    pub(crate) fn pattern(&self) -> String {
        format!("%{}%", self.term)
    }
}

/// A validated pagination request.
///
/// Page and per-page are clamped to at least 1 at construction, so a
/// `PageRequest` never produces a negative offset or a zero limit.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    page: i64,
    per_page: i64,
}

impl PageRequest {
    pub fn new(page: i64, per_page: i64) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn per_page(&self) -> i64 {
        self.per_page
    }

    /// Row limit for this page.
    pub fn limit(&self) -> i64 {
        self.per_page
    }

    /// Rows skipped before this page.
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }
}

/// Composable options for a SELECT.
///
/// All methods consume and return `self`, so options chain:
///
/// ```ignore
/// use pgboard::QueryOptions;
///
/// let options = QueryOptions::new()
///     .eq("status", "active")
///     .search("rust", &["title", "body"])
///     .order_by_desc("created_at")
///     .paginate(2, 20);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    pub(crate) filters: Vec<Filter>,
    pub(crate) search: Option<Search>,
    pub(crate) order: Vec<Sort>,
    pub(crate) fields: Vec<String>,
    pub(crate) page: Option<PageRequest>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one filter condition.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(Filter::eq(field, value))
    }

    pub fn ne(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(Filter::ne(field, value))
    }

    pub fn gt(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(Filter::gt(field, value))
    }

    pub fn gte(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(Filter::gte(field, value))
    }

    pub fn lt(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(Filter::lt(field, value))
    }

    pub fn lte(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(Filter::lte(field, value))
    }

    pub fn like(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(Filter::like(field, value))
    }

    pub fn in_list<V>(self, field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self
    where
        V: Into<Value>,
    {
        self.filter(Filter::in_list(field, values))
    }

    pub fn not_in<V>(self, field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self
    where
        V: Into<Value>,
    {
        self.filter(Filter::not_in(field, values))
    }

    /// Search one term across the given columns.
    pub fn search(mut self, term: impl Into<String>, fields: &[&str]) -> Self {
        self.search = Some(Search::new(term, fields));
        self
    }

    /// Append an ORDER BY term.
    pub fn order_by(mut self, sort: Sort) -> Self {
        self.order.push(sort);
        self
    }

    pub fn order_by_asc(self, field: impl Into<String>) -> Self {
        self.order_by(Sort::asc(field))
    }

    pub fn order_by_desc(self, field: impl Into<String>) -> Self {
        self.order_by(Sort::desc(field))
    }

    /// Project only the given columns instead of `*`.
    pub fn fields(mut self, fields: &[&str]) -> Self {
        self.fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    /// Request one page of results.
    pub fn paginate(mut self, page: i64, per_page: i64) -> Self {
        self.page = Some(PageRequest::new(page, per_page));
        self
    }
}

/// Column/value pairs for INSERT and UPDATE, in insertion order.
///
/// Setting a column that is already present replaces its value in place,
/// keeping the original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    columns: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column value.
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        let column = column.into();
        let value = value.into();
        match self.columns.iter_mut().find(|(name, _)| *name == column) {
            Some(entry) => entry.1 = value,
            None => self.columns.push((column, value)),
        }
        self
    }

    /// Set a column only when the value is present.
    pub fn set_opt<V>(self, column: impl Into<String>, value: Option<V>) -> Self
    where
        V: Into<Value>,
    {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(name, value)| (name.as_str(), value))
    }
}
