use serde::{Deserialize, Serialize};
use tracing::debug;

use super::CommentService;
use crate::error::{Result, ReviewError};
use crate::gh::{clamp_per_page, decode, Method};
use crate::model::{non_blank, CommentAuthor};
use crate::resolver::Identity;
use crate::review::{LatestOptions, ReviewService};

/// Options for [`CommentService::ids`]. Exactly one of `review_id` and `latest` is set.
#[derive(Debug, Clone, Default)]
pub struct IdsOptions {
    pub review_id: Option<u64>,
    pub latest: bool,
    /// Reviewer used with `latest`; defaults to the authenticated user.
    pub reviewer: Option<String>,
    /// Maximum entries to return; 0 means no limit.
    pub limit: i64,
    pub per_page: Option<u32>,
    pub page: Option<u32>,
}

/// Identifier and metadata of one comment in a review.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentReference {
    pub id: i64,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<CommentAuthor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_association: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RestCommentUser {
    #[serde(default)]
    login: Option<String>,
    #[serde(default)]
    id: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RestComment {
    id: i64,
    #[serde(default)]
    body: String,
    #[serde(default)]
    author_association: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
    #[serde(default)]
    html_url: Option<String>,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    line: Option<u32>,
    #[serde(default)]
    user: Option<RestCommentUser>,
}

impl From<RestComment> for CommentReference {
    fn from(raw: RestComment) -> Self {
        let user = raw.user.and_then(|u| {
            let login = non_blank(u.login);
            let id = u.id.filter(|id| *id != 0);
            if login.is_none() && id.is_none() {
                return None;
            }
            Some(CommentAuthor {
                login: login.unwrap_or_default(),
                id,
            })
        });

        CommentReference {
            id: raw.id,
            body: raw.body,
            user,
            author_association: non_blank(raw.author_association),
            created_at: non_blank(raw.created_at),
            updated_at: non_blank(raw.updated_at),
            html_url: non_blank(raw.html_url),
            path: non_blank(raw.path),
            line: raw.line,
        }
    }
}

impl CommentService<'_> {
    /// Comment ids for a review, given directly or the reviewer's latest submitted one.
    pub fn ids(&self, pr: &Identity, opts: IdsOptions) -> Result<Vec<CommentReference>> {
        if opts.limit < 0 {
            return Err(ReviewError::InvalidArgument(
                "limit must be non-negative".into(),
            ));
        }
        let review_id = self.resolve_review_id(pr, &opts)?;

        let per_page = clamp_per_page(opts.per_page);
        let limit = opts.limit as usize;
        let path = format!("{}/reviews/{}/comments", pr.rest_path(), review_id);
        let mut page = opts.page.filter(|p| *p > 0).unwrap_or(1);
        let mut results = Vec::new();

        loop {
            let params = [("per_page", per_page.to_string()), ("page", page.to_string())];
            let data = self.api.rest(Method::Get, &path, &params, None)?;
            let chunk: Vec<RestComment> = if data.is_null() {
                Vec::new()
            } else {
                decode(data, "review comments")?
            };
            if chunk.is_empty() {
                break;
            }

            let count = chunk.len();
            for comment in chunk {
                results.push(CommentReference::from(comment));
                if limit > 0 && results.len() >= limit {
                    debug!(review_id, collected = results.len(), "comment ids limit reached");
                    return Ok(results);
                }
            }

            if count < per_page as usize {
                break;
            }
            page += 1;
        }

        debug!(review_id, collected = results.len(), "comment ids");
        Ok(results)
    }

    fn resolve_review_id(&self, pr: &Identity, opts: &IdsOptions) -> Result<i64> {
        match (opts.review_id, opts.latest) {
            (Some(_), true) => Err(ReviewError::InvalidArgument(
                "specify either a review id or --latest, not both".into(),
            )),
            (None, false) => Err(ReviewError::InvalidArgument(
                "a review id or --latest is required".into(),
            )),
            (Some(0), false) => Err(ReviewError::InvalidArgument(
                "review id must be positive".into(),
            )),
            (Some(id), false) => i64::try_from(id).map_err(|_| {
                ReviewError::InvalidArgument(format!("review id {} is out of range", id))
            }),
            (None, true) => {
                let summary = ReviewService::new(self.api).latest_submitted(
                    pr,
                    LatestOptions {
                        reviewer: opts.reviewer.clone(),
                        ..Default::default()
                    },
                )?;
                Ok(summary.id)
            }
        }
    }
}
