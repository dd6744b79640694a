//! Test utilities shared across modules.
//!
//! [`FakeGh`] is a scripted [`GhApi`] that records every call, so service
//! tests can assert both on results and on the exact requests issued.

use std::cell::RefCell;

use serde_json::Value;

use crate::error::{Result, ReviewError};
use crate::gh::{GhApi, Method};
use crate::resolver::Identity;

/// A recorded REST call.
#[derive(Debug, Clone)]
pub struct RestCall {
    pub method: Method,
    pub path: String,
    pub params: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl RestCall {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// A recorded GraphQL call.
#[derive(Debug, Clone)]
pub struct GraphQlCall {
    pub query: String,
    pub variables: Value,
}

#[derive(Debug, Clone)]
pub enum Call {
    Rest(RestCall),
    GraphQl(GraphQlCall),
    PrView {
        selector: Option<String>,
        repo: Option<String>,
    },
}

type RestHandler = Box<dyn Fn(&RestCall) -> Result<Value>>;
type GraphQlHandler = Box<dyn Fn(&GraphQlCall) -> Result<Value>>;
type PrViewHandler = Box<dyn Fn(Option<&str>, Option<&str>) -> Result<String>>;

/// Scripted GitHub transport. Unscripted calls fail.
#[derive(Default)]
pub struct FakeGh {
    rest: Option<RestHandler>,
    graphql: Option<GraphQlHandler>,
    pr_view: Option<PrViewHandler>,
    calls: RefCell<Vec<Call>>,
}

impl FakeGh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_rest(mut self, handler: impl Fn(&RestCall) -> Result<Value> + 'static) -> Self {
        self.rest = Some(Box::new(handler));
        self
    }

    pub fn on_graphql(
        mut self,
        handler: impl Fn(&GraphQlCall) -> Result<Value> + 'static,
    ) -> Self {
        self.graphql = Some(Box::new(handler));
        self
    }

    pub fn on_pr_view(
        mut self,
        handler: impl Fn(Option<&str>, Option<&str>) -> Result<String> + 'static,
    ) -> Self {
        self.pr_view = Some(Box::new(handler));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn rest_calls(&self) -> Vec<RestCall> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Rest(rest) => Some(rest),
                _ => None,
            })
            .collect()
    }

    pub fn graphql_calls(&self) -> Vec<GraphQlCall> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::GraphQl(gql) => Some(gql),
                _ => None,
            })
            .collect()
    }
}

impl GhApi for FakeGh {
    fn rest(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value> {
        let call = RestCall {
            method,
            path: path.to_string(),
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            body: body.cloned(),
        };
        self.calls.borrow_mut().push(Call::Rest(call.clone()));
        match &self.rest {
            Some(handler) => handler(&call),
            None => Err(ReviewError::InvalidArgument(format!(
                "unexpected REST call: {} {}",
                method, path
            ))),
        }
    }

    fn graphql(&self, query: &str, variables: Value) -> Result<Value> {
        let call = GraphQlCall {
            query: query.to_string(),
            variables,
        };
        self.calls.borrow_mut().push(Call::GraphQl(call.clone()));
        match &self.graphql {
            Some(handler) => handler(&call),
            None => Err(ReviewError::InvalidArgument(
                "unexpected GraphQL call".to_string(),
            )),
        }
    }

    fn pr_view_url(&self, selector: Option<&str>, repo: Option<&str>) -> Result<String> {
        self.calls.borrow_mut().push(Call::PrView {
            selector: selector.map(str::to_string),
            repo: repo.map(str::to_string),
        });
        match &self.pr_view {
            Some(handler) => handler(selector, repo),
            None => Err(ReviewError::InvalidArgument(
                "unexpected pr view lookup".to_string(),
            )),
        }
    }
}

/// The pull request most tests operate on: octo/demo#7.
pub fn demo_identity() -> Identity {
    Identity {
        owner: "octo".to_string(),
        repo: "demo".to_string(),
        host: "github.com".to_string(),
        number: 7,
        url: "https://github.com/octo/demo/pull/7".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fake_records_calls_and_rejects_unscripted() {
        let fake = FakeGh::new().on_rest(|_| Ok(serde_json::json!({"login": "casey"})));

        let user = fake
            .rest(Method::Get, "user", &[("page", "2".to_string())], None)
            .unwrap();
        assert_eq!(user["login"], "casey");
        assert!(fake.graphql("query { viewer { login } }", Value::Null).is_err());

        let rest = fake.rest_calls();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].param("page"), Some("2"));
        assert_eq!(fake.graphql_calls().len(), 1);
        assert_eq!(fake.calls().len(), 2);
    }
}
