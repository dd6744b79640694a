use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashSet;
use tracing::debug;

use super::ReviewService;
use crate::error::{Result, ReviewError};
use crate::gh::{clamp_per_page, decode, Method};
use crate::model::{non_blank, CommentAuthor};
use crate::resolver::Identity;

const PENDING_REVIEWS_QUERY: &str = "query PendingReviews($owner: String!, $name: String!, $number: Int!, $pageSize: Int!, $cursor: String) {
  repository(owner: $owner, name: $name) {
    pullRequest(number: $number) {
      reviews(first: $pageSize, after: $cursor, states: PENDING) {
        nodes {
          id databaseId state authorAssociation url updatedAt createdAt
          author { login ... on User { databaseId } }
        }
        pageInfo { hasNextPage endCursor }
      }
    }
  }
}";

/// Options for [`ReviewService::latest_submitted`].
#[derive(Debug, Clone, Default)]
pub struct LatestOptions {
    /// Defaults to the authenticated user.
    pub reviewer: Option<String>,
    pub per_page: Option<u32>,
    /// First page to scan (default 1); later pages follow until a short page.
    pub page: Option<u32>,
}

/// Options for [`ReviewService::latest_pending`].
#[derive(Debug, Clone, Default)]
pub struct PendingOptions {
    /// Defaults to the GraphQL viewer.
    pub reviewer: Option<String>,
    pub per_page: Option<u32>,
}

/// The most recent submitted review by a reviewer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestSummary {
    pub id: i64,
    pub state: String,
    pub submitted_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_association: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
    pub user: CommentAuthor,
}

/// A pending review owned by a reviewer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingSummary {
    /// GraphQL node id (`PRR_...`)
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_id: Option<i64>,
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_association: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
    pub user: CommentAuthor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RestUser {
    #[serde(default)]
    login: Option<String>,
    #[serde(default)]
    id: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RestReview {
    id: i64,
    #[serde(default)]
    state: String,
    #[serde(default)]
    submitted_at: Option<String>,
    #[serde(default)]
    author_association: Option<String>,
    #[serde(default)]
    html_url: Option<String>,
    #[serde(default)]
    user: Option<RestUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PendingAuthor {
    #[serde(default)]
    login: Option<String>,
    #[serde(default)]
    database_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PendingNode {
    #[serde(default)]
    id: String,
    #[serde(default)]
    database_id: Option<i64>,
    #[serde(default)]
    state: String,
    #[serde(default)]
    author_association: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    author: Option<PendingAuthor>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    #[serde(default)]
    has_next_page: bool,
    #[serde(default)]
    end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PendingConnection {
    #[serde(default)]
    nodes: Vec<PendingNode>,
    #[serde(default)]
    page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
struct PendingPullRequest {
    reviews: Option<PendingConnection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PendingRepository {
    pull_request: Option<PendingPullRequest>,
}

#[derive(Debug, Deserialize)]
struct PendingResponse {
    repository: Option<PendingRepository>,
}

fn parse_timestamp(value: Option<&str>) -> Option<DateTime<FixedOffset>> {
    value.and_then(|v| DateTime::parse_from_rfc3339(v.trim()).ok())
}

fn same_login(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

impl ReviewService<'_> {
    /// Latest submitted review by `reviewer` (default: authenticated user).
    ///
    /// Ties on `submitted_at` keep the review encountered first.
    pub fn latest_submitted(&self, pr: &Identity, opts: LatestOptions) -> Result<LatestSummary> {
        let reviewer = match non_blank(opts.reviewer) {
            Some(login) => login,
            None => self.current_login()?,
        };
        let per_page = clamp_per_page(opts.per_page);
        let path = format!("{}/reviews", pr.rest_path());

        let mut page = opts.page.filter(|p| *p > 0).unwrap_or(1);
        let mut best: Option<(Option<DateTime<FixedOffset>>, LatestSummary)> = None;
        let mut scanned = 0usize;

        loop {
            let params = [("per_page", per_page.to_string()), ("page", page.to_string())];
            let data = self.api.rest(Method::Get, &path, &params, None)?;
            let reviews: Vec<RestReview> = if data.is_null() {
                Vec::new()
            } else {
                decode(data, "pull request reviews")?
            };
            let count = reviews.len();
            scanned += count;

            for review in reviews {
                let Some(user) = review.user else { continue };
                let Some(login) = non_blank(user.login) else {
                    continue;
                };
                if !same_login(&login, &reviewer) || review.state.trim() == "PENDING" {
                    continue;
                }
                let Some(submitted_at) = non_blank(review.submitted_at) else {
                    continue;
                };

                let when = parse_timestamp(Some(&submitted_at));
                let newer = match &best {
                    None => true,
                    Some((current, _)) => when > *current,
                };
                if newer {
                    best = Some((
                        when,
                        LatestSummary {
                            id: review.id,
                            state: review.state.trim().to_string(),
                            submitted_at,
                            author_association: non_blank(review.author_association),
                            html_url: non_blank(review.html_url),
                            user: CommentAuthor { login, id: user.id },
                        },
                    ));
                }
            }

            if count == 0 || count < per_page as usize {
                break;
            }
            page += 1;
        }

        debug!(reviewer = %reviewer, scanned, found = best.is_some(), "latest submitted review");
        best.map(|(_, summary)| summary)
            .ok_or(ReviewError::NoSubmittedReviewFound {
                reviewer,
                pr_number: pr.number,
            })
    }

    /// All pending reviews on the pull request authored by `reviewer`.
    pub fn pending_summaries(
        &self,
        pr: &Identity,
        reviewer: &str,
        per_page: Option<u32>,
    ) -> Result<Vec<PendingSummary>> {
        let page_size = clamp_per_page(per_page);
        let mut cursor: Option<String> = None;
        let mut seen_cursors = HashSet::new();
        let mut summaries = Vec::new();

        loop {
            let mut variables = json!({
                "owner": pr.owner,
                "name": pr.repo,
                "number": pr.number,
                "pageSize": page_size,
            });
            if let Some(c) = &cursor {
                variables["cursor"] = Value::String(c.clone());
            }

            let data = self.api.graphql(PENDING_REVIEWS_QUERY, variables)?;
            let response: PendingResponse = decode(data, "pending reviews")?;
            let connection = response
                .repository
                .and_then(|r| r.pull_request)
                .and_then(|p| p.reviews)
                .ok_or_else(|| {
                    ReviewError::MalformedResponse(
                        "pending reviews response is missing the reviews connection".into(),
                    )
                })?;

            for node in connection.nodes {
                if node.state.trim() != "PENDING" {
                    continue;
                }
                let author = node.author.unwrap_or(PendingAuthor {
                    login: None,
                    database_id: None,
                });
                let Some(login) = non_blank(author.login) else {
                    continue;
                };
                if !same_login(&login, reviewer) {
                    continue;
                }
                summaries.push(PendingSummary {
                    id: node.id.trim().to_string(),
                    database_id: node.database_id,
                    state: node.state.trim().to_string(),
                    author_association: non_blank(node.author_association),
                    html_url: non_blank(node.url),
                    user: CommentAuthor {
                        login,
                        id: author.database_id,
                    },
                    created_at: non_blank(node.created_at),
                    updated_at: non_blank(node.updated_at),
                });
            }

            if !connection.page_info.has_next_page {
                break;
            }
            match non_blank(connection.page_info.end_cursor) {
                Some(next) => {
                    if !seen_cursors.insert(next.clone()) {
                        return Err(ReviewError::MalformedResponse(format!(
                            "pending reviews returned end cursor {:?} twice",
                            next
                        )));
                    }
                    cursor = Some(next);
                }
                None => {
                    return Err(ReviewError::MalformedResponse(
                        "pending reviews reported another page without an end cursor".into(),
                    ))
                }
            }
        }

        debug!(reviewer = %reviewer, found = summaries.len(), "pending reviews");
        Ok(summaries)
    }

    /// Most recently updated pending review by `reviewer` (default: viewer).
    pub fn latest_pending(&self, pr: &Identity, opts: PendingOptions) -> Result<PendingSummary> {
        let reviewer = match non_blank(opts.reviewer) {
            Some(login) => login,
            None => self.viewer_login()?,
        };

        let summaries = self.pending_summaries(pr, &reviewer, opts.per_page)?;
        let mut best: Option<(Option<DateTime<FixedOffset>>, Option<DateTime<FixedOffset>>, PendingSummary)> =
            None;
        for summary in summaries {
            let updated = parse_timestamp(summary.updated_at.as_deref());
            let created = parse_timestamp(summary.created_at.as_deref());
            let newer = match &best {
                None => true,
                Some((best_updated, best_created, _)) => {
                    (updated, created) > (*best_updated, *best_created)
                }
            };
            if newer {
                best = Some((updated, created, summary));
            }
        }

        best.map(|(_, _, summary)| summary)
            .ok_or(ReviewError::NoPendingReviewFound {
                login: reviewer,
                pr_number: pr.number,
            })
    }
}
