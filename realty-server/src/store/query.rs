//! Backend-neutral description of a table query
//!
//! A [`Query`] is built with chained calls, mirroring the fluent client
//! style of hosted Postgres services:
//!
//! ```
//! use realty_server::store::{Direction, Query};
//!
//! let query = Query::table("properties")
//!     .eq("purpose", "rent")
//!     .gte("price", 10_000.0)
//!     .order("created_at", Direction::Descending)
//!     .limit(6);
//! assert_eq!(query.filters().len(), 2);
//! ```
//!
//! Values are carried as data, never spliced into filter text. Each backend
//! encodes or binds them itself.

use serde_json::Value;

/// Sort direction for [`Query::order`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Ordering clause
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: String,
    pub direction: Direction,
}

/// A single predicate on a row
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `column = value`
    Eq { column: String, value: Value },

    /// `column >= value`
    Gte { column: String, value: Value },

    /// `column <= value`
    Lte { column: String, value: Value },

    /// Case-insensitive substring match. `needle` is literal text, not a
    /// LIKE pattern.
    Ilike { column: String, needle: String },

    /// Case-insensitive substring match against any of several columns
    AnyIlike { columns: Vec<String>, needle: String },
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn ilike(column: impl Into<String>, needle: impl Into<String>) -> Self {
        Self::Ilike {
            column: column.into(),
            needle: needle.into(),
        }
    }
}

/// A select against one table
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    table: String,
    columns: Vec<String>,
    filters: Vec<Filter>,
    order: Option<Order>,
    limit: Option<usize>,
}

impl Query {
    /// Start a query selecting every column of `table`.
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    /// Restrict the returned columns. An empty list (or `*`) selects all.
    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns
            .into_iter()
            .map(Into::into)
            .filter(|c| c != "*")
            .collect();
        self
    }

    pub fn eq(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(Filter::eq(column, value))
    }

    pub fn gte(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(Filter::Gte {
            column: column.into(),
            value: value.into(),
        })
    }

    pub fn lte(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(Filter::Lte {
            column: column.into(),
            value: value.into(),
        })
    }

    pub fn ilike(self, column: impl Into<String>, needle: impl Into<String>) -> Self {
        self.filter(Filter::ilike(column, needle))
    }

    /// Match rows where `needle` occurs in any of `columns` (logical OR).
    pub fn any_ilike<I, S>(self, columns: I, needle: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter(Filter::AnyIlike {
            columns: columns.into_iter().map(Into::into).collect(),
            needle: needle.into(),
        })
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order = Some(Order {
            column: column.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Selected columns; empty means all
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn ordering(&self) -> Option<&Order> {
        self.order.as_ref()
    }

    pub fn row_limit(&self) -> Option<usize> {
        self.limit
    }
}

/// Build a `%needle%` LIKE pattern with the needle's own metacharacters
/// escaped, so it matches as a plain substring.
pub fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builder_collects_in_order() {
        let query = Query::table("properties")
            .select(["*"])
            .eq("featured", true)
            .any_ilike(["title", "locality"], "metro")
            .order("created_at", Direction::Descending)
            .limit(6);

        assert_eq!(query.table_name(), "properties");
        assert!(query.columns().is_empty());
        assert_eq!(query.filters()[0], Filter::eq("featured", true));
        assert_eq!(
            query.filters()[1],
            Filter::AnyIlike {
                columns: vec!["title".into(), "locality".into()],
                needle: "metro".into(),
            }
        );
        assert_eq!(query.ordering().unwrap().direction, Direction::Descending);
        assert_eq!(query.row_limit(), Some(6));
    }

    #[test]
    fn gte_keeps_value_as_data() {
        let query = Query::table("properties").gte("price", 1500.5);
        assert_eq!(
            query.filters(),
            &[Filter::Gte {
                column: "price".into(),
                value: json!(1500.5)
            }]
        );
    }

    #[test]
    fn contains_pattern_escapes_metacharacters() {
        assert_eq!(contains_pattern("metro"), "%metro%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(contains_pattern(r"a\b"), r"%a\\b%");
        assert_eq!(contains_pattern("a,b.(c)"), "%a,b.(c)%");
    }
}
