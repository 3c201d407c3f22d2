//! # Row filters
//!
//! [`Query`] describes which rows of a table a gateway call applies to: equality,
//! inequality and membership filters, an optional column projection, an ordering
//! and a limit. The same value is understood by both gateways:
//!
//! - [`crate::MemoryGateway`] evaluates it directly against stored JSON rows
//!   ([`Query::matches`], [`Query::apply`]).
//! - The REST gateway renders it into PostgREST query parameters
//!   ([`Query::to_params`]): `col=eq.v`, `col=neq.v`, `col=in.(a,b)`, `select=a,b`,
//!   `order=col.desc`, `limit=n`.

use std::cmp::Ordering;

use chrono::{DateTime, FixedOffset};
use serde_json::Value;

/// Sort direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    Neq(String, Value),
    In(String, Vec<Value>),
}

impl Filter {
    fn matches(&self, row: &Value) -> bool {
        match self {
            Filter::Eq(column, value) => field(row, column) == value,
            Filter::Neq(column, value) => field(row, column) != value,
            Filter::In(column, values) => values.contains(field(row, column)),
        }
    }
}

/// Filter, projection, order and limit for one gateway call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    columns: Option<Vec<String>>,
    filters: Vec<Filter>,
    order: Option<(String, Order)>,
    limit: Option<usize>,
}

impl Query {
    /// A query matching every row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict returned columns (PostgREST `select=`).
    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = Some(columns.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq(column.to_string(), value.into()));
        self
    }

    pub fn neq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Neq(column.to_string(), value.into()));
        self
    }

    pub fn in_<V: Into<Value>>(mut self, column: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.filters.push(Filter::In(
            column.to_string(),
            values.into_iter().map(Into::into).collect(),
        ));
        self
    }

    pub fn order(mut self, column: &str, order: Order) -> Self {
        self.order = Some((column.to_string(), order));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Whether `row` passes every filter.
    pub fn matches(&self, row: &Value) -> bool {
        self.filters.iter().all(|f| f.matches(row))
    }

    /// Filter, sort, limit and project a set of rows. Sorting is stable, so rows
    /// with equal keys keep their insertion order.
    pub fn apply<'a>(&self, rows: impl IntoIterator<Item = &'a Value>) -> Vec<Value> {
        let mut selected: Vec<&Value> = rows.into_iter().filter(|r| self.matches(r)).collect();

        if let Some((column, order)) = &self.order {
            selected.sort_by(|a, b| {
                let ord = compare_values(field(a, column), field(b, column));
                match order {
                    Order::Asc => ord,
                    Order::Desc => ord.reverse(),
                }
            });
        }

        if let Some(limit) = self.limit {
            selected.truncate(limit);
        }

        selected.into_iter().map(|row| self.project(row)).collect()
    }

    fn project(&self, row: &Value) -> Value {
        match (&self.columns, row) {
            (Some(columns), Value::Object(map)) => Value::Object(
                map.iter()
                    .filter(|(key, _)| columns.iter().any(|c| c == *key))
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect(),
            ),
            _ => row.clone(),
        }
    }

    /// PostgREST query parameters for this query.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();

        let select = match &self.columns {
            Some(columns) => columns.join(","),
            None => "*".to_string(),
        };
        params.push(("select".to_string(), select));

        for filter in &self.filters {
            let param = match filter {
                Filter::Eq(column, Value::Null) => (column.clone(), "is.null".to_string()),
                Filter::Neq(column, Value::Null) => (column.clone(), "not.is.null".to_string()),
                Filter::Eq(column, value) => (column.clone(), format!("eq.{}", render(value))),
                Filter::Neq(column, value) => (column.clone(), format!("neq.{}", render(value))),
                Filter::In(column, values) => {
                    let list: Vec<String> = values.iter().map(render_list_item).collect();
                    (column.clone(), format!("in.({})", list.join(",")))
                }
            };
            params.push(param);
        }

        if let Some((column, order)) = &self.order {
            let dir = match order {
                Order::Asc => "asc",
                Order::Desc => "desc",
            };
            params.push(("order".to_string(), format!("{column}.{dir}")));
        }

        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }

        params
    }
}

static NULL: Value = Value::Null;

fn field<'a>(row: &'a Value, column: &str) -> &'a Value {
    row.get(column).unwrap_or(&NULL)
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// List members containing PostgREST delimiters are double-quoted.
fn render_list_item(value: &Value) -> String {
    let raw = render(value);
    if raw.contains([',', '(', ')', '"', ' ']) {
        format!("\"{}\"", raw.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        raw
    }
}

/// Orders two column values: numbers numerically, RFC 3339 timestamps
/// chronologically, other strings lexically. `NULL` sorts last.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => match (parse_timestamp(x), parse_timestamp(y)) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => x.cmp(y),
        },
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(s).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows() -> Vec<Value> {
        vec![
            json!({"id": "a", "user_id": "u1", "created_at": "2024-03-01T09:00:00.5Z"}),
            json!({"id": "b", "user_id": "u2", "created_at": "2024-03-01T09:00:00.25Z"}),
            json!({"id": "c", "user_id": "u1", "created_at": "2024-03-02T08:00:00Z"}),
        ]
    }

    #[test]
    fn test_filters_and_desc_order() {
        let query = Query::new()
            .eq("user_id", "u1")
            .order("created_at", Order::Desc);
        let ids: Vec<_> = query
            .apply(&rows())
            .into_iter()
            .map(|r| r["id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["c", "a"]);
    }

    #[test]
    fn test_timestamps_compare_chronologically() {
        // ".5" sorts before ".25" lexically but is later in time
        let query = Query::new().order("created_at", Order::Asc).limit(2);
        let ids: Vec<_> = query
            .apply(&rows())
            .into_iter()
            .map(|r| r["id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_in_and_neq() {
        let query = Query::new().in_("id", ["a", "b"]).neq("user_id", "u2");
        let matched = query.apply(&rows());
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0]["id"], "a");

        let none = Query::new().in_("id", Vec::<String>::new());
        assert!(none.apply(&rows()).is_empty());
    }

    #[test]
    fn test_projection() {
        let query = Query::new().columns(&["id"]).eq("id", "c");
        assert_eq!(query.apply(&rows()), vec![json!({"id": "c"})]);
    }

    #[test]
    fn test_postgrest_params() {
        let query = Query::new()
            .columns(&["id", "username"])
            .eq("follower_id", "u1")
            .neq("id", "u1")
            .in_("user_id", ["u2", "with,comma"])
            .eq("book_id", Value::Null)
            .order("created_at", Order::Desc)
            .limit(5);
        let params = query.to_params();
        assert_eq!(
            params,
            vec![
                ("select".to_string(), "id,username".to_string()),
                ("follower_id".to_string(), "eq.u1".to_string()),
                ("id".to_string(), "neq.u1".to_string()),
                ("user_id".to_string(), "in.(u2,\"with,comma\")".to_string()),
                ("book_id".to_string(), "is.null".to_string()),
                ("order".to_string(), "created_at.desc".to_string()),
                ("limit".to_string(), "5".to_string()),
            ]
        );
    }

    #[test]
    fn test_default_select_is_star() {
        assert_eq!(
            Query::new().to_params(),
            vec![("select".to_string(), "*".to_string())]
        );
    }
}
