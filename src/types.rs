//! Validated input types shared by the comment and review services.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ReviewError;

/// Prefix GitHub uses for pull request review node ids.
pub const REVIEW_NODE_PREFIX: &str = "PRR_";

/// A GraphQL pull request review node id (`PRR_...`).
///
/// REST review ids are plain integers and are rejected rather than converted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ReviewNodeId(String);

impl ReviewNodeId {
    pub fn parse(raw: &str) -> Result<Self, ReviewError> {
        let id = raw.trim();
        if id.is_empty() {
            return Err(ReviewError::InvalidArgument(
                "review id is required".to_string(),
            ));
        }
        if id.starts_with(REVIEW_NODE_PREFIX) {
            return Ok(Self(id.to_string()));
        }
        if id.chars().all(|c| c.is_ascii_digit()) {
            return Err(ReviewError::InvalidReviewId(format!(
                "review id {:?} is a REST review id; provide the GraphQL review node id ({}...)",
                id, REVIEW_NODE_PREFIX
            )));
        }
        Err(ReviewError::InvalidReviewId(format!(
            "review id {:?} is not a GraphQL review node id (expected prefix {})",
            id, REVIEW_NODE_PREFIX
        )))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReviewNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ReviewNodeId {
    type Err = ReviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Diff side of an inline comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Accepts any casing and surrounding whitespace.
    pub fn normalize(raw: &str) -> Result<Self, ReviewError> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "LEFT" => Ok(Side::Left),
            "RIGHT" => Ok(Side::Right),
            _ => Err(ReviewError::InvalidSide(raw.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Left => "LEFT",
            Side::Right => "RIGHT",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = ReviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::normalize(s)
    }
}

/// Event used when submitting a pending review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewEvent {
    Approve,
    Comment,
    RequestChanges,
}

impl ReviewEvent {
    pub fn normalize(raw: &str) -> Result<Self, ReviewError> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "APPROVE" => Ok(ReviewEvent::Approve),
            "COMMENT" => Ok(ReviewEvent::Comment),
            "REQUEST_CHANGES" => Ok(ReviewEvent::RequestChanges),
            _ => Err(ReviewError::InvalidEvent(raw.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewEvent::Approve => "APPROVE",
            ReviewEvent::Comment => "COMMENT",
            ReviewEvent::RequestChanges => "REQUEST_CHANGES",
        }
    }
}

impl fmt::Display for ReviewEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewEvent {
    type Err = ReviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::normalize(s)
    }
}
