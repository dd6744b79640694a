//! Error types reported by the GitHub transport.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static HTTP_STATUS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"HTTP\s+(\d{3})\b").unwrap());

/// HTTP method for REST calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed `gh api` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// Status code parsed from the `HTTP nnn` marker gh prints on failure
    pub status_code: Option<u16>,
    pub message: String,
    pub stderr: String,
    /// Response body gh wrote to stdout, if any
    pub body: String,
}

impl ApiError {
    pub fn new(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code: Some(status_code),
            message: message.into(),
            stderr: String::new(),
            body: String::new(),
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Build an error from the captured output of a failed gh process.
    pub fn from_output(stdout: &[u8], stderr: &str, fallback: impl Into<String>) -> Self {
        let body = String::from_utf8_lossy(stdout).trim().to_string();
        let mut message = stderr.trim().to_string();
        if message.is_empty() {
            message = if body.is_empty() { fallback.into() } else { body.clone() };
        }
        let status_code = HTTP_STATUS
            .captures(stderr)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u16>().ok());

        Self {
            status_code,
            message,
            stderr: stderr.to_string(),
            body,
        }
    }

    /// Case-insensitive search across message, body and stderr.
    pub fn contains_lower(&self, needle: &str) -> bool {
        if needle.is_empty() {
            return false;
        }
        let needle = needle.to_lowercase();
        [&self.message, &self.body, &self.stderr]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }

    /// A 422 caused by the caller already holding a pending review.
    pub fn is_pending_review_conflict(&self) -> bool {
        self.status_code == Some(422) && self.contains_lower("pending review")
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "gh api error (status {}): {}", code, self.message),
            None => write!(f, "gh api error: {}", self.message),
        }
    }
}

impl std::error::Error for ApiError {}

/// One entry of a GraphQL `errors` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQlErrorEntry {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<serde_json::Value>>,
}

impl GraphQlErrorEntry {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: None,
        }
    }
}

/// GraphQL-level errors returned alongside (or instead of) `data`.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphQlError {
    pub errors: Vec<GraphQlErrorEntry>,
}

impl fmt::Display for GraphQlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.as_slice() {
            [] => write!(f, "graphql returned errors"),
            [single] => write!(f, "graphql error: {}", single.message),
            many => {
                let joined: Vec<&str> = many.iter().map(|e| e.message.as_str()).collect();
                write!(f, "graphql errors: {}", joined.join("; "))
            }
        }
    }
}

impl std::error::Error for GraphQlError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_output_parses_status_code() {
        let err = ApiError::from_output(
            br#"{"message":"Validation Failed"}"#,
            "gh: Validation Failed (HTTP 422)\n",
            "exit status 1",
        );
        assert_eq!(err.status_code, Some(422));
        assert_eq!(err.message, "gh: Validation Failed (HTTP 422)");
        assert_eq!(err.body, r#"{"message":"Validation Failed"}"#);
        assert_eq!(
            err.to_string(),
            "gh api error (status 422): gh: Validation Failed (HTTP 422)"
        );
    }

    #[test]
    fn test_from_output_falls_back_to_body_then_fallback() {
        let err = ApiError::from_output(b"boom", "", "exit status 1");
        assert_eq!(err.status_code, None);
        assert_eq!(err.message, "boom");

        let err = ApiError::from_output(b"", "  ", "exit status 1");
        assert_eq!(err.message, "exit status 1");
        assert_eq!(err.to_string(), "gh api error: exit status 1");
    }

    #[test]
    fn test_pending_review_conflict_checks_body_case_insensitively() {
        let err = ApiError::new(422, "gh: Validation Failed (HTTP 422)").with_body(
            r#"{"errors":[{"message":"user_id can only have one Pending Review per pull request"}]}"#,
        );
        assert!(err.is_pending_review_conflict());
    }

    #[test]
    fn test_pending_review_conflict_requires_422() {
        let err = ApiError::new(404, "pending review not found");
        assert!(!err.is_pending_review_conflict());

        let err = ApiError::new(422, "Validation Failed").with_body("body too long");
        assert!(!err.is_pending_review_conflict());
        assert!(!err.contains_lower(""));
    }

    #[test]
    fn test_graphql_error_display() {
        let none = GraphQlError { errors: vec![] };
        assert_eq!(none.to_string(), "graphql returned errors");

        let one = GraphQlError {
            errors: vec![GraphQlErrorEntry::new("boom")],
        };
        assert_eq!(one.to_string(), "graphql error: boom");

        let two = GraphQlError {
            errors: vec![GraphQlErrorEntry::new("a"), GraphQlErrorEntry::new("b")],
        };
        assert_eq!(two.to_string(), "graphql errors: a; b");
    }

    #[test]
    fn test_graphql_entry_omits_missing_path() {
        let json = serde_json::to_value(GraphQlErrorEntry::new("boom")).unwrap();
        assert_eq!(json, serde_json::json!({"message": "boom"}));
    }
}
