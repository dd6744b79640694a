//! GitHub transport.
//!
//! Services talk to GitHub only through the [`GhApi`] trait. The production
//! implementation is [`GhCli`], which shells out to `gh api` so the user's
//! existing authentication and host configuration are reused.
//!
//! # Modules
//!
//! - [`types`] - Transport error types and the REST method enum
//! - [`cli`] - The `gh` process adapter

mod cli;
mod types;

pub use cli::GhCli;
pub use types::{ApiError, GraphQlError, GraphQlErrorEntry, Method};

use crate::error::{Result, ReviewError};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::rc::Rc;

/// The GitHub operations the services depend on.
pub trait GhApi {
    /// Issue a REST call. Returns `Value::Null` for empty responses.
    fn rest(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value>;

    /// Run a GraphQL operation and return its `data` object.
    ///
    /// GraphQL-level errors surface as [`ReviewError::GraphQl`].
    fn graphql(&self, query: &str, variables: Value) -> Result<Value>;

    /// Look up the URL of the pull request `gh pr view` would show for the
    /// selector (or the current branch when `None`).
    fn pr_view_url(&self, selector: Option<&str>, repo: Option<&str>) -> Result<String>;
}

impl<T: GhApi + ?Sized> GhApi for Rc<T> {
    fn rest(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value> {
        (**self).rest(method, path, params, body)
    }

    fn graphql(&self, query: &str, variables: Value) -> Result<Value> {
        (**self).graphql(query, variables)
    }

    fn pr_view_url(&self, selector: Option<&str>, repo: Option<&str>) -> Result<String> {
        (**self).pr_view_url(selector, repo)
    }
}

/// Largest page size GitHub accepts for REST and GraphQL listings.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Page size to request: unset or zero means the maximum.
pub fn clamp_per_page(value: Option<u32>) -> u32 {
    match value {
        None | Some(0) => MAX_PAGE_SIZE,
        Some(n) => n.min(MAX_PAGE_SIZE),
    }
}

/// Deserialize a response payload, reporting schema mismatches as malformed responses.
pub(crate) fn decode<T: DeserializeOwned>(value: Value, what: &str) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| ReviewError::MalformedResponse(format!("{}: {}", what, e)))
}
