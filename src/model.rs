//! Normalized review thread and comment records.
//!
//! GraphQL payloads are decoded into the private `Raw*` shapes and converted
//! into the public records, rejecting structurally invalid nodes instead of
//! dropping them.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ReviewError};

/// GraphQL selection for a review thread and its comments.
pub(crate) const THREAD_FIELDS: &str = "id path line startLine isResolved isOutdated
      comments(first: 100) {
        nodes {
          id databaseId body authorAssociation createdAt updatedAt url path line
          author { login }
        }
      }";

/// Author of a comment or review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentAuthor {
    pub login: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

/// A comment inside a review thread.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreadComment {
    /// GraphQL node id
    pub id: String,
    /// REST id, usable with `comments reply --comment-id`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_id: Option<i64>,
    pub body: String,
    pub author: CommentAuthor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_association: Option<String>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

/// An inline review thread.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewThread {
    pub id: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_line: Option<u32>,
    pub is_resolved: bool,
    pub is_outdated: bool,
    pub comments: Vec<ThreadComment>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawLogin {
    #[serde(default)]
    pub login: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawComment {
    pub id: String,
    #[serde(default)]
    pub database_id: Option<i64>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub author: Option<RawLogin>,
    #[serde(default)]
    pub author_association: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub line: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawCommentConnection {
    #[serde(default)]
    pub nodes: Vec<RawComment>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawThread {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub line: Option<u32>,
    #[serde(default)]
    pub start_line: Option<u32>,
    #[serde(default)]
    pub is_resolved: bool,
    #[serde(default)]
    pub is_outdated: bool,
    #[serde(default)]
    pub comments: RawCommentConnection,
}

/// Trimmed value, or `None` when blank.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl TryFrom<RawComment> for ThreadComment {
    type Error = ReviewError;

    fn try_from(raw: RawComment) -> Result<Self> {
        let login = non_blank(raw.author.and_then(|a| a.login)).ok_or_else(|| {
            ReviewError::MalformedResponse(format!("comment {} has no author login", raw.id))
        })?;

        Ok(ThreadComment {
            id: raw.id,
            database_id: raw.database_id,
            body: raw.body,
            author: CommentAuthor { login, id: None },
            author_association: non_blank(raw.author_association),
            created_at: raw.created_at,
            updated_at: non_blank(raw.updated_at),
            html_url: non_blank(raw.url),
            path: non_blank(raw.path),
            line: raw.line,
        })
    }
}

impl TryFrom<RawThread> for ReviewThread {
    type Error = ReviewError;

    fn try_from(raw: RawThread) -> Result<Self> {
        let id = raw.id.trim().to_string();
        let path = raw.path.trim().to_string();
        if id.is_empty() || path.is_empty() {
            return Err(ReviewError::IncompleteResponse(
                "review thread is missing its id or path".to_string(),
            ));
        }

        let comments = raw
            .comments
            .nodes
            .into_iter()
            .map(ThreadComment::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok(ReviewThread {
            id,
            path,
            line: raw.line,
            start_line: raw.start_line,
            is_resolved: raw.is_resolved,
            is_outdated: raw.is_outdated,
            comments,
        })
    }
}
