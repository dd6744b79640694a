use crate::gh::{ApiError, GraphQlError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("invalid side {0:?}: must be LEFT or RIGHT")]
    InvalidSide(String),

    #[error("invalid event {0:?}: must be APPROVE, COMMENT, or REQUEST_CHANGES")]
    InvalidEvent(String),

    #[error("{0}")]
    InvalidReviewId(String),

    #[error("pull request argument {selector:?} does not match --pr={pr}")]
    SelectorConflict { selector: String, pr: u64 },

    #[error("invalid pull request selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("{context}: {source}")]
    ResolutionFailed {
        context: String,
        #[source]
        source: Box<ReviewError>,
    },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("{0}")]
    IncompleteResponse(String),

    #[error("reply to comment {comment_id} is blocked by a pending review; submit it first or set auto_submit_pending = true")]
    ConflictRecoverable { comment_id: u64 },

    #[error("no pending reviews owned by {login} found on pull request #{pr_number}")]
    NoPendingReviewFound { login: String, pr_number: u64 },

    #[error("no submitted reviews by {reviewer} found on pull request #{pr_number}")]
    NoSubmittedReviewFound { reviewer: String, pr_number: u64 },

    #[error("viewer login unavailable")]
    ViewerLoginUnavailable,

    #[error("failed to submit pending review: {source}")]
    PendingSubmitFailed {
        #[source]
        source: Box<ReviewError>,
    },

    #[error("review submission failed")]
    SubmissionRejected,

    #[error(transparent)]
    GraphQl(#[from] GraphQlError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Config file {path:?} could not be parsed: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReviewError {
    /// Wrap a lookup failure with the step that produced it.
    pub fn resolution(context: impl Into<String>, source: ReviewError) -> Self {
        ReviewError::ResolutionFailed {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// The transport error behind this error, if any.
    pub fn as_api_error(&self) -> Option<&ApiError> {
        match self {
            ReviewError::Api(err) => Some(err),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ReviewError>;
