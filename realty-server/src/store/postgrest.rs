//! Hosted PostgREST / Supabase REST client
//!
//! Every call is a single HTTP request against `{url}/rest/v1/{table}`.
//! Filters are encoded as `column=op.value` query pairs. Search terms in an
//! `or=(...)` group are double-quoted and escaped, so commas, dots and
//! parentheses in user text cannot change the filter expression.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde_json::Value;

use super::{
    check_identifier, contains_pattern, Direction, Filter, ListingStore, Query, Row, StoreError,
};

/// Longest error body carried into a [`StoreError::Rejected`] message
const MAX_ERROR_BODY: usize = 500;

/// PostgREST client
#[derive(Clone)]
pub struct PostgrestStore {
    client: Client,
    rest_url: String,
    api_key: String,
}

impl PostgrestStore {
    /// Create a client for the project at `url` (e.g. `https://xyz.supabase.co`).
    pub fn new(url: &str, api_key: impl Into<String>) -> Self {
        Self::with_client(Client::new(), url, api_key)
    }

    pub fn with_client(client: Client, url: &str, api_key: impl Into<String>) -> Self {
        Self {
            client,
            rest_url: format!("{}/rest/v1", url.trim_end_matches('/')),
            api_key: api_key.into(),
        }
    }

    fn request(&self, method: Method, table: &str) -> Result<RequestBuilder, StoreError> {
        let url = format!("{}/{}", self.rest_url, check_identifier(table)?);
        Ok(self
            .client
            .request(method, url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Accept", "application/json"))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Vec<Row>, StoreError> {
        let response = request.send().await?;
        read_rows(response).await
    }
}

#[async_trait]
impl ListingStore for PostgrestStore {
    async fn select(&self, query: &Query) -> Result<Vec<Row>, StoreError> {
        let params = select_params(query)?;
        tracing::debug!(table = query.table_name(), ?params, "postgrest select");
        let request = self
            .request(Method::GET, query.table_name())?
            .query(&params);
        self.send(request).await
    }

    async fn insert(&self, table: &str, row: Row) -> Result<Vec<Row>, StoreError> {
        let request = self
            .request(Method::POST, table)?
            .header("Prefer", "return=representation")
            .json(&row);
        self.send(request).await
    }

    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: Row,
    ) -> Result<Vec<Row>, StoreError> {
        let params = filter_params(filters)?;
        let request = self
            .request(Method::PATCH, table)?
            .header("Prefer", "return=representation")
            .query(&params)
            .json(&patch);
        self.send(request).await
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<Vec<Row>, StoreError> {
        let params = filter_params(filters)?;
        let request = self
            .request(Method::DELETE, table)?
            .header("Prefer", "return=representation")
            .query(&params);
        self.send(request).await
    }
}

async fn read_rows(response: Response) -> Result<Vec<Row>, StoreError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(StoreError::Rejected {
            status: status.as_u16(),
            message: error_message(&body),
        });
    }

    let body = response.text().await?;
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(&body)?)
}

/// Prefer PostgREST's `message` field, fall back to the (truncated) body.
fn error_message(body: &str) -> String {
    if let Ok(Value::Object(err)) = serde_json::from_str::<Value>(body) {
        if let Some(Value::String(message)) = err.get("message") {
            return message.clone();
        }
    }
    if body.len() > MAX_ERROR_BODY {
        let mut end = MAX_ERROR_BODY;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_owned()
    }
}

/// Query pairs for a select: `select`, filters, `order`, `limit`.
pub(crate) fn select_params(query: &Query) -> Result<Vec<(String, String)>, StoreError> {
    let columns = if query.columns().is_empty() {
        "*".to_owned()
    } else {
        query
            .columns()
            .iter()
            .map(|c| check_identifier(c))
            .collect::<Result<Vec<_>, _>>()?
            .join(",")
    };

    let mut params = vec![("select".to_owned(), columns)];
    params.extend(filter_params(query.filters())?);

    if let Some(order) = query.ordering() {
        let direction = match order.direction {
            Direction::Ascending => "asc",
            Direction::Descending => "desc",
        };
        params.push((
            "order".to_owned(),
            format!("{}.{}", check_identifier(&order.column)?, direction),
        ));
    }
    if let Some(limit) = query.row_limit() {
        params.push(("limit".to_owned(), limit.to_string()));
    }
    Ok(params)
}

/// Horizontal filters as `column=op.value` pairs.
pub(crate) fn filter_params(filters: &[Filter]) -> Result<Vec<(String, String)>, StoreError> {
    filters
        .iter()
        .map(|filter| -> Result<(String, String), StoreError> {
            Ok(match filter {
                Filter::Eq { column, value } => (
                    check_identifier(column)?.to_owned(),
                    match value {
                        Value::Null => "is.null".to_owned(),
                        other => format!("eq.{}", scalar(other)?),
                    },
                ),
                Filter::Gte { column, value } => (
                    check_identifier(column)?.to_owned(),
                    format!("gte.{}", scalar(value)?),
                ),
                Filter::Lte { column, value } => (
                    check_identifier(column)?.to_owned(),
                    format!("lte.{}", scalar(value)?),
                ),
                // PostgREST rewrites `*` to `%` inside like patterns and has no
                // escape for it, so a `*` in the needle stays a wildcard here.
                // `%`, `_` and `\` are escaped by `contains_pattern`.
                Filter::Ilike { column, needle } => (
                    check_identifier(column)?.to_owned(),
                    format!("ilike.{}", contains_pattern(needle)),
                ),
                // Same `*` caveat as `Ilike`: quoting protects the `or=(...)`
                // grammar, not the like pattern.
                Filter::AnyIlike { columns, needle } => {
                    let quoted = quote(&contains_pattern(needle));
                    let terms = columns
                        .iter()
                        .map(|c| -> Result<String, StoreError> {
                            Ok(format!("{}.ilike.{}", check_identifier(c)?, quoted))
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    ("or".to_owned(), format!("({})", terms.join(",")))
                }
            })
        })
        .collect()
}

fn scalar(value: &Value) -> Result<String, StoreError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(StoreError::InvalidQuery(format!(
            "cannot compare against {}",
            other
        ))),
    }
}

/// Double-quote a value for PostgREST's logical-operator grammar.
fn quote(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    out.push('"');
    for ch in raw.chars() {
        if matches!(ch, '"' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
    out
}
