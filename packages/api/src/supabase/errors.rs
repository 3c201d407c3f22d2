//! Mapping of platform error bodies onto [`GatewayError`].

use serde::Deserialize;
use serde_json::Value;
use store::{GatewayError, Table};

/// Union of the error shapes returned by the REST, auth and storage services.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<Value>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

impl ErrorBody {
    fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }

    fn code(&self) -> Option<String> {
        match &self.code {
            Some(Value::String(code)) => Some(code.clone()),
            Some(Value::Number(code)) => Some(code.to_string()),
            _ => None,
        }
    }

    fn text(&self, status: u16) -> String {
        self.message
            .as_ref()
            .or(self.msg.as_ref())
            .or(self.error_description.as_ref())
            .or(self.error.as_ref())
            .cloned()
            .unwrap_or_else(|| format!("HTTP {status}"))
    }
}

/// Error from a `/rest/v1` call on `table`.
pub fn rest_error(table: Table, status: u16, body: &str) -> GatewayError {
    let parsed = ErrorBody::parse(body);
    let code = parsed.code();
    let message = parsed.text(status);
    match code.as_deref() {
        Some("23505") => GatewayError::Conflict { table, message },
        Some("PGRST116") => match parsed.details.as_deref().and_then(row_count) {
            Some(0) | None => GatewayError::NotFound { table },
            Some(count) => GatewayError::MultipleRows { table, count },
        },
        _ if status == 401 => GatewayError::Auth(message),
        _ => GatewayError::Rejected { code, message },
    }
}

/// Error from an `/auth/v1` call.
pub fn auth_error(status: u16, body: &str) -> GatewayError {
    GatewayError::Auth(ErrorBody::parse(body).text(status))
}

/// Error from a `/storage/v1` call.
pub fn storage_error(status: u16, body: &str) -> GatewayError {
    GatewayError::Storage(ErrorBody::parse(body).text(status))
}

/// "The result contains 3 rows" → 3.
fn row_count(details: &str) -> Option<usize> {
    details
        .split_whitespace()
        .find_map(|word| word.parse::<usize>().ok())
}

/// Total from a `Content-Range` header such as `0-24/3573` or `*/0`.
pub fn parse_content_range(value: &str) -> Option<usize> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_violation_is_conflict() {
        let body = r#"{"code":"23505","details":"Key (google_id)=(abc) already exists.","hint":null,
                       "message":"duplicate key value violates unique constraint \"books_google_id_key\""}"#;
        let err = rest_error(Table::Books, 409, body);
        assert!(err.is_duplicate_key());
        assert!(err.to_string().contains("books_google_id_key"));
    }

    #[test]
    fn test_single_row_errors() {
        let none = r#"{"code":"PGRST116","details":"The result contains 0 rows","message":"JSON object requested, multiple (or no) rows returned"}"#;
        assert_eq!(
            rest_error(Table::Profiles, 406, none),
            GatewayError::NotFound {
                table: Table::Profiles
            }
        );

        let many = r#"{"code":"PGRST116","details":"The result contains 2 rows","message":"JSON object requested, multiple (or no) rows returned"}"#;
        assert_eq!(
            rest_error(Table::Profiles, 406, many),
            GatewayError::MultipleRows {
                table: Table::Profiles,
                count: 2
            }
        );
    }

    #[test]
    fn test_other_rest_errors_keep_code_and_message() {
        let body = r#"{"code":"42501","message":"new row violates row-level security policy for table \"posts\""}"#;
        let err = rest_error(Table::Posts, 400, body);
        assert_eq!(
            err,
            GatewayError::Rejected {
                code: Some("42501".to_string()),
                message: "new row violates row-level security policy for table \"posts\"".to_string(),
            }
        );
    }

    #[test]
    fn test_auth_error_shapes() {
        let current = r#"{"code":400,"error_code":"invalid_credentials","msg":"Invalid login credentials"}"#;
        assert_eq!(
            auth_error(400, current),
            GatewayError::Auth("Invalid login credentials".to_string())
        );

        let legacy = r#"{"error":"invalid_grant","error_description":"Email not confirmed"}"#;
        assert_eq!(
            auth_error(400, legacy),
            GatewayError::Auth("Email not confirmed".to_string())
        );

        assert_eq!(
            auth_error(502, "<html>bad gateway</html>"),
            GatewayError::Auth("HTTP 502".to_string())
        );
    }

    #[test]
    fn test_storage_error() {
        let body = r#"{"statusCode":"409","error":"Duplicate","message":"The resource already exists"}"#;
        assert_eq!(
            storage_error(400, body),
            GatewayError::Storage("The resource already exists".to_string())
        );
    }

    #[test]
    fn test_content_range() {
        assert_eq!(parse_content_range("0-24/3573"), Some(3573));
        assert_eq!(parse_content_range("*/0"), Some(0));
        assert_eq!(parse_content_range("0-9/*"), None);
        assert_eq!(parse_content_range("garbage"), None);
    }
}
