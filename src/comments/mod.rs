//! Review comment operations.
//!
//! # Modules
//!
//! - [`ids`] - Paging comment identifiers for a submitted review

mod ids;

pub use ids::{CommentReference, IdsOptions};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::error::{Result, ReviewError};
use crate::gh::{decode, GhApi, Method};
use crate::model::{CommentAuthor, RawThread, ReviewThread, THREAD_FIELDS};
use crate::resolver::Identity;
use crate::review::ReviewService;
use crate::types::{ReviewEvent, Side};

/// Body attached to reviews submitted to unblock a reply.
pub const AUTO_SUBMIT_SUMMARY: &str =
    "Auto-submitting pending review to unblock threaded reply via gh-pr-review.";

/// Input for [`CommentService::create`].
#[derive(Debug, Clone, Default)]
pub struct CreateInput {
    pub path: String,
    pub line: u32,
    pub side: String,
    pub start_line: Option<u32>,
    pub start_side: Option<String>,
    pub body: String,
}

/// A newly created thread flattened with its first comment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateResult {
    pub thread_id: String,
    pub comment_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_id: Option<i64>,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_line: Option<u32>,
    pub side: Side,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_side: Option<Side>,
    pub author: CommentAuthor,
    pub body: String,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
    pub is_resolved: bool,
    pub is_outdated: bool,
}

/// Input for [`CommentService::reply`].
#[derive(Debug, Clone)]
pub struct ReplyInput {
    pub comment_id: u64,
    pub body: String,
}

fn list_threads_query() -> String {
    format!(
        "query ReviewThreads($owner: String!, $name: String!, $number: Int!) {{
  repository(owner: $owner, name: $name) {{
    pullRequest(number: $number) {{
      reviewThreads(first: 100) {{
        nodes {{ {} }}
      }}
    }}
  }}
}}",
        THREAD_FIELDS
    )
}

fn create_thread_mutation() -> String {
    format!(
        "mutation CreateReviewThread($input: AddPullRequestReviewThreadInput!) {{
  addPullRequestReviewThread(input: $input) {{
    thread {{ {} }}
  }}
}}",
        THREAD_FIELDS
    )
}

pub struct CommentService<'a> {
    api: &'a dyn GhApi,
    auto_submit_pending: bool,
}

impl<'a> CommentService<'a> {
    pub fn new(api: &'a dyn GhApi) -> Self {
        Self {
            api,
            auto_submit_pending: true,
        }
    }

    /// Whether a reply blocked by a pending review submits that review and retries.
    pub fn with_auto_submit(mut self, enabled: bool) -> Self {
        self.auto_submit_pending = enabled;
        self
    }

    /// Review threads on the pull request.
    ///
    /// Reads a single page: at most 100 threads with at most 100 comments each.
    pub fn list(&self, pr: &Identity) -> Result<Vec<ReviewThread>> {
        #[derive(Deserialize)]
        struct Connection {
            #[serde(default)]
            nodes: Vec<RawThread>,
        }
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct PullRequest {
            review_threads: Option<Connection>,
        }
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Repository {
            pull_request: Option<PullRequest>,
        }
        #[derive(Deserialize)]
        struct Response {
            repository: Option<Repository>,
        }

        let data = self.api.graphql(
            &list_threads_query(),
            json!({ "owner": pr.owner, "name": pr.repo, "number": pr.number }),
        )?;
        let response: Response = decode(data, "review threads")?;
        let connection = response
            .repository
            .and_then(|r| r.pull_request)
            .and_then(|p| p.review_threads)
            .ok_or_else(|| {
                ReviewError::MalformedResponse(format!(
                    "pull request {}/{}#{} not found",
                    pr.owner, pr.repo, pr.number
                ))
            })?;

        connection
            .nodes
            .into_iter()
            .map(ReviewThread::try_from)
            .collect()
    }

    /// Start a new inline comment thread.
    pub fn create(&self, pr: &Identity, input: CreateInput) -> Result<CreateResult> {
        let path = input.path.trim();
        if path.is_empty() {
            return Err(ReviewError::InvalidArgument("path is required".into()));
        }
        if input.line == 0 {
            return Err(ReviewError::InvalidArgument("line must be positive".into()));
        }
        let body = input.body.trim();
        if body.is_empty() {
            return Err(ReviewError::InvalidArgument("body is required".into()));
        }
        let side = Side::normalize(&input.side)?;
        if input.start_line == Some(0) {
            return Err(ReviewError::InvalidArgument(
                "start line must be positive".into(),
            ));
        }
        let start_side = input
            .start_side
            .as_deref()
            .map(Side::normalize)
            .transpose()?;

        let (node_id, _) = ReviewService::new(self.api).pull_request_ids(pr)?;

        let mut graphql_input = json!({
            "pullRequestId": node_id,
            "path": path,
            "line": input.line,
            "side": side.as_str(),
            "body": body,
        });
        if let Some(start_line) = input.start_line {
            graphql_input["startLine"] = json!(start_line);
        }
        if let Some(start_side) = start_side {
            graphql_input["startSide"] = json!(start_side.as_str());
        }

        #[derive(Deserialize)]
        struct Payload {
            thread: Option<RawThread>,
        }
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Response {
            add_pull_request_review_thread: Option<Payload>,
        }

        let data = self
            .api
            .graphql(&create_thread_mutation(), json!({ "input": graphql_input }))?;
        let response: Response = decode(data, "addPullRequestReviewThread")?;
        let raw = response
            .add_pull_request_review_thread
            .and_then(|p| p.thread)
            .ok_or_else(|| {
                ReviewError::MalformedResponse("addPullRequestReviewThread returned no thread".into())
            })?;
        let thread = ReviewThread::try_from(raw)?;

        let ReviewThread {
            id: thread_id,
            path,
            line,
            start_line,
            is_resolved,
            is_outdated,
            comments,
        } = thread;
        let first = comments.into_iter().next().ok_or_else(|| {
            ReviewError::MalformedResponse(format!("thread {} has no comments", thread_id))
        })?;

        Ok(CreateResult {
            thread_id,
            comment_id: first.id,
            database_id: first.database_id,
            path,
            line,
            start_line,
            side,
            start_side,
            author: first.author,
            body: first.body,
            created_at: first.created_at,
            updated_at: first.updated_at,
            html_url: first.html_url,
            is_resolved,
            is_outdated,
        })
    }

    /// Reply to a review comment, returning the raw API payload.
    ///
    /// When GitHub refuses the reply because the caller holds a pending
    /// review, each of the caller's pending reviews is submitted with a
    /// `COMMENT` event and the reply is retried once. Submission stops at the
    /// first failure; reviews already submitted stay submitted.
    pub fn reply(&self, pr: &Identity, input: ReplyInput) -> Result<Value> {
        if input.comment_id == 0 {
            return Err(ReviewError::InvalidArgument("invalid comment id".into()));
        }
        if input.body.trim().is_empty() {
            return Err(ReviewError::InvalidArgument(
                "reply body is required".into(),
            ));
        }

        let path = format!("{}/comments/{}/replies", pr.rest_path(), input.comment_id);
        let payload = json!({ "body": input.body });

        let err = match self.api.rest(Method::Post, &path, &[], Some(&payload)) {
            Ok(reply) => return Ok(reply),
            Err(err) => err,
        };

        let conflict = err
            .as_api_error()
            .is_some_and(|api| api.is_pending_review_conflict());
        if !conflict {
            return Err(err);
        }

        warn!(comment_id = input.comment_id, "reply blocked by a pending review");
        if !self.auto_submit_pending {
            return Err(ReviewError::ConflictRecoverable {
                comment_id: input.comment_id,
            });
        }

        self.submit_pending_reviews(pr)?;
        self.api.rest(Method::Post, &path, &[], Some(&payload))
    }

    fn submit_pending_reviews(&self, pr: &Identity) -> Result<()> {
        let reviews = ReviewService::new(self.api);
        let wrap = |source: ReviewError| ReviewError::PendingSubmitFailed {
            source: Box::new(source),
        };

        let login = reviews.current_login().map_err(wrap)?;
        let pending = reviews
            .pending_summaries(pr, &login, None)
            .map_err(wrap)?;
        if pending.is_empty() {
            return Err(ReviewError::NoPendingReviewFound {
                login,
                pr_number: pr.number,
            });
        }

        for summary in pending {
            let database_id = summary.database_id.ok_or_else(|| {
                wrap(ReviewError::IncompleteResponse(format!(
                    "pending review {} has no database id",
                    summary.id
                )))
            })?;
            reviews
                .submit_rest(pr, database_id, ReviewEvent::Comment, AUTO_SUBMIT_SUMMARY)
                .map_err(wrap)?;
            info!(review = %summary.id, database_id, "auto-submitted pending review");
        }
        Ok(())
    }
}
