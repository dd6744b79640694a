//! Pending review lifecycle.
//!
//! A review moves `PENDING` (via [`ReviewService::start`]) to `COMMENTED`,
//! `APPROVED` or `CHANGES_REQUESTED` (via [`ReviewService::submit`]).
//! The service never checks the current state itself; the server rejects
//! out-of-order calls and that rejection is surfaced as-is.
//!
//! # Modules
//!
//! - [`latest`] - Picking the latest submitted or pending review for a reviewer

mod latest;

pub use latest::{LatestOptions, LatestSummary, PendingOptions, PendingSummary};

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, ReviewError};
use crate::gh::{decode, GhApi, GraphQlErrorEntry, Method};
use crate::model::{non_blank, RawThread, ReviewThread, THREAD_FIELDS};
use crate::resolver::Identity;
use crate::types::{ReviewEvent, ReviewNodeId, Side};

/// Server-side state of a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewStatus {
    Pending,
    Commented,
    Approved,
    ChangesRequested,
    Dismissed,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "PENDING",
            ReviewStatus::Commented => "COMMENTED",
            ReviewStatus::Approved => "APPROVED",
            ReviewStatus::ChangesRequested => "CHANGES_REQUESTED",
            ReviewStatus::Dismissed => "DISMISSED",
        }
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewStatus {
    type Err = ReviewError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "PENDING" => Ok(ReviewStatus::Pending),
            "COMMENTED" => Ok(ReviewStatus::Commented),
            "APPROVED" => Ok(ReviewStatus::Approved),
            "CHANGES_REQUESTED" => Ok(ReviewStatus::ChangesRequested),
            "DISMISSED" => Ok(ReviewStatus::Dismissed),
            other => Err(ReviewError::MalformedResponse(format!(
                "unknown review state {:?}",
                other
            ))),
        }
    }
}

/// A review as returned by start.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewState {
    pub id: String,
    pub state: ReviewStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
}

/// Inline comment to add to a pending review.
#[derive(Debug, Clone, Default)]
pub struct ThreadInput {
    /// GraphQL review node id (`PRR_...`)
    pub review_id: String,
    pub path: String,
    pub line: u32,
    pub side: String,
    pub start_line: Option<u32>,
    pub start_side: Option<String>,
    pub body: String,
}

/// Payload for submitting a pending review.
#[derive(Debug, Clone)]
pub struct SubmitInput {
    pub review_id: String,
    pub event: ReviewEvent,
    pub body: Option<String>,
}

/// Outcome of a submission. GraphQL rejections land here rather than in `Err`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmitStatus {
    pub success: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphQlErrorEntry>,
}

const PULL_REQUEST_IDS_QUERY: &str = "query PullRequestIds($owner: String!, $name: String!, $number: Int!) {
  repository(owner: $owner, name: $name) {
    pullRequest(number: $number) { id headRefOid }
  }
}";

const ADD_REVIEW_MUTATION: &str = "mutation AddReview($input: AddPullRequestReviewInput!) {
  addPullRequestReview(input: $input) {
    pullRequestReview { id state submittedAt databaseId url }
  }
}";

const SUBMIT_REVIEW_MUTATION: &str = "mutation SubmitPullRequestReview($input: SubmitPullRequestReviewInput!) {
  submitPullRequestReview(input: $input) {
    pullRequestReview { id state submittedAt databaseId url }
  }
}";

const VIEWER_QUERY: &str = "query ViewerLogin { viewer { login } }";

fn add_thread_mutation() -> String {
    format!(
        "mutation AddReviewThread($input: AddPullRequestReviewThreadInput!) {{
  addPullRequestReviewThread(input: $input) {{
    thread {{ {} }}
  }}
}}",
        THREAD_FIELDS
    )
}

/// Review operations for one GitHub transport.
pub struct ReviewService<'a> {
    api: &'a dyn GhApi,
}

impl<'a> ReviewService<'a> {
    pub fn new(api: &'a dyn GhApi) -> Self {
        Self { api }
    }

    /// Look up the pull request node id and head commit sha.
    pub fn pull_request_ids(&self, pr: &Identity) -> Result<(String, String)> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct PullRequest {
            #[serde(default)]
            id: String,
            #[serde(default)]
            head_ref_oid: String,
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
            PULL_REQUEST_IDS_QUERY,
            json!({ "owner": pr.owner, "name": pr.repo, "number": pr.number }),
        )?;
        let response: Response = decode(data, "pull request identifiers")?;

        let pull = response
            .repository
            .and_then(|r| r.pull_request)
            .ok_or_else(|| {
                ReviewError::MalformedResponse(format!(
                    "pull request {}/{}#{} not found",
                    pr.owner, pr.repo, pr.number
                ))
            })?;

        let node_id = pull.id.trim().to_string();
        let head_sha = pull.head_ref_oid.trim().to_string();
        if node_id.is_empty() || head_sha.is_empty() {
            return Err(ReviewError::IncompleteResponse(
                "pull request metadata incomplete".to_string(),
            ));
        }
        Ok((node_id, head_sha))
    }

    /// Open a pending review, defaulting the commit to the pull request head.
    pub fn start(&self, pr: &Identity, commit_oid: Option<&str>) -> Result<ReviewState> {
        let (node_id, head_sha) = self.pull_request_ids(pr)?;
        let commit = commit_oid
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .unwrap_or(head_sha);

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Review {
            #[serde(default)]
            id: String,
            #[serde(default)]
            state: String,
            #[serde(default)]
            submitted_at: Option<String>,
            #[serde(default)]
            database_id: Option<i64>,
            #[serde(default)]
            url: String,
        }
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Payload {
            pull_request_review: Option<Review>,
        }
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Response {
            add_pull_request_review: Option<Payload>,
        }

        let data = self.api.graphql(
            ADD_REVIEW_MUTATION,
            json!({ "input": { "pullRequestId": node_id, "commitOID": commit } }),
        )?;
        let response: Response = decode(data, "addPullRequestReview")?;
        let review = response
            .add_pull_request_review
            .and_then(|p| p.pull_request_review)
            .ok_or_else(|| {
                ReviewError::IncompleteResponse("addPullRequestReview returned no review".into())
            })?;

        let id = review.id.trim();
        if id.is_empty() {
            return Err(ReviewError::IncompleteResponse(
                "addPullRequestReview returned empty id".into(),
            ));
        }
        let state = review.state.trim();
        if state.is_empty() {
            return Err(ReviewError::IncompleteResponse(
                "addPullRequestReview returned empty state".into(),
            ));
        }
        let url = review.url.trim();
        if url.is_empty() {
            return Err(ReviewError::IncompleteResponse(
                "addPullRequestReview returned empty url".into(),
            ));
        }

        Ok(ReviewState {
            id: id.to_string(),
            state: state.parse()?,
            submitted_at: non_blank(review.submitted_at),
            database_id: review.database_id,
            html_url: Some(url.to_string()),
        })
    }

    /// Add an inline comment thread to a pending review.
    pub fn add_thread(&self, _pr: &Identity, input: ThreadInput) -> Result<ReviewThread> {
        let review_id = ReviewNodeId::parse(&input.review_id)?;
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

        let mut graphql_input = json!({
            "pullRequestReviewId": review_id.as_str(),
            "path": path,
            "line": input.line,
            "side": side.as_str(),
            "body": body,
        });
        if let Some(start_line) = input.start_line {
            if start_line == 0 {
                return Err(ReviewError::InvalidArgument(
                    "start line must be positive".into(),
                ));
            }
            graphql_input["startLine"] = json!(start_line);
        }
        if let Some(start_side) = input.start_side.as_deref() {
            graphql_input["startSide"] = json!(Side::normalize(start_side)?.as_str());
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
            .graphql(&add_thread_mutation(), json!({ "input": graphql_input }))?;
        let response: Response = decode(data, "addPullRequestReviewThread")?;
        let thread = response
            .add_pull_request_review_thread
            .and_then(|p| p.thread)
            .ok_or_else(|| {
                ReviewError::IncompleteResponse(
                    "addPullRequestReviewThread returned incomplete thread data".into(),
                )
            })?;

        if thread.id.trim().is_empty() || thread.path.trim().is_empty() {
            return Err(ReviewError::IncompleteResponse(
                "addPullRequestReviewThread returned incomplete thread data".into(),
            ));
        }
        ReviewThread::try_from(thread)
    }

    /// Submit a pending review.
    ///
    /// A GraphQL rejection is an expected outcome and is returned as an
    /// unsuccessful [`SubmitStatus`]; transport failures are errors.
    pub fn submit(&self, _pr: &Identity, input: SubmitInput) -> Result<SubmitStatus> {
        let review_id = ReviewNodeId::parse(&input.review_id)?;

        let mut graphql_input = json!({
            "pullRequestReviewId": review_id.as_str(),
            "event": input.event.as_str(),
        });
        if let Some(body) = non_blank(input.body) {
            graphql_input["body"] = json!(body);
        }

        match self
            .api
            .graphql(SUBMIT_REVIEW_MUTATION, json!({ "input": graphql_input }))
        {
            Ok(_) => Ok(SubmitStatus {
                success: true,
                errors: Vec::new(),
            }),
            Err(ReviewError::GraphQl(gql)) => Ok(SubmitStatus {
                success: false,
                errors: gql.errors,
            }),
            Err(e) => Err(e),
        }
    }

    /// Submit a pending review through REST using its database id.
    pub fn submit_rest(&self, pr: &Identity, database_id: i64, event: ReviewEvent, body: &str) -> Result<()> {
        let path = format!("{}/reviews/{}/events", pr.rest_path(), database_id);
        let payload = json!({ "event": event.as_str(), "body": body });
        self.api.rest(Method::Post, &path, &[], Some(&payload))?;
        Ok(())
    }

    /// Login of the authenticated user, via GraphQL.
    pub fn viewer_login(&self) -> Result<String> {
        #[derive(Deserialize)]
        struct Viewer {
            #[serde(default)]
            login: Option<String>,
        }
        #[derive(Deserialize)]
        struct Response {
            viewer: Option<Viewer>,
        }

        let data = self.api.graphql(VIEWER_QUERY, json!({}))?;
        let response: Response = decode(data, "viewer")?;
        non_blank(response.viewer.and_then(|v| v.login)).ok_or(ReviewError::ViewerLoginUnavailable)
    }

    /// Login of the authenticated user, via REST.
    pub fn current_login(&self) -> Result<String> {
        #[derive(Deserialize)]
        struct User {
            #[serde(default)]
            login: Option<String>,
        }

        let data = self.api.rest(Method::Get, "user", &[], None)?;
        let user: User = decode(data, "user")?;
        non_blank(user.login).ok_or_else(|| {
            ReviewError::IncompleteResponse("unable to determine authenticated user".into())
        })
    }
}
