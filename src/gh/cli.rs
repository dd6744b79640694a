//! `gh` process adapter.

use std::io::Write;
use std::process::{Command, Stdio};

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, ReviewError};

use super::types::{ApiError, GraphQlError, GraphQlErrorEntry, Method};
use super::GhApi;

const API_VERSION_HEADER: &str = "X-GitHub-Api-Version: 2022-11-28";

/// Runs GitHub API requests through the `gh` CLI.
#[derive(Debug, Clone)]
pub struct GhCli {
    host: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GraphQlEnvelope {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<Value>,
}

impl GhCli {
    /// Create a client. A blank host falls back to gh's own default.
    pub fn new(host: Option<&str>) -> Self {
        let host = host
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(str::to_string);
        Self { host }
    }

    /// `gh api <endpoint> [--hostname H] <rest...>`
    fn api_args(&self, endpoint: &str, rest: Vec<String>) -> Vec<String> {
        let mut args = vec!["api".to_string(), endpoint.to_string()];
        if let Some(host) = &self.host {
            args.push("--hostname".to_string());
            args.push(host.clone());
        }
        args.extend(rest);
        args
    }

    /// Run gh and return stdout, or the captured failure.
    fn run(&self, args: &[String], stdin: Option<&[u8]>, set_host_env: bool) -> Result<Vec<u8>> {
        debug!(args = ?args, "running gh");

        let mut cmd = Command::new("gh");
        cmd.args(args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if set_host_env {
            if let Some(host) = &self.host {
                cmd.env("GH_HOST", host);
            }
        }

        let mut child = cmd.spawn()?;
        if let Some(data) = stdin {
            if let Some(mut pipe) = child.stdin.take() {
                pipe.write_all(data)?;
            }
        }
        let output = child.wait_with_output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(ApiError::from_output(
                &output.stdout,
                &stderr,
                format!("gh exited with {}", output.status),
            )
            .into());
        }

        Ok(output.stdout)
    }

    fn parse_graphql(stdout: &[u8]) -> Result<Value> {
        let envelope: GraphQlEnvelope = serde_json::from_slice(stdout)?;

        if !envelope.errors.is_empty() {
            let errors = envelope
                .errors
                .into_iter()
                .map(|raw| {
                    serde_json::from_value::<GraphQlErrorEntry>(raw.clone())
                        .unwrap_or_else(|_| GraphQlErrorEntry::new(raw.to_string()))
                })
                .collect();
            return Err(GraphQlError { errors }.into());
        }

        envelope
            .data
            .ok_or_else(|| ReviewError::MalformedResponse("graphql response has no data".into()))
    }

    /// gh exits non-zero when the response carries GraphQL errors; those win
    /// over the process failure.
    fn graphql_failure(api_err: ApiError) -> ReviewError {
        match Self::parse_graphql(api_err.body.as_bytes()) {
            Err(gql @ ReviewError::GraphQl(_)) => gql,
            _ => ReviewError::Api(api_err),
        }
    }
}

impl GhApi for GhCli {
    fn rest(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value> {
        let mut rest: Vec<String> = vec![
            "--header".to_string(),
            API_VERSION_HEADER.to_string(),
            "-X".to_string(),
            method.as_str().to_string(),
        ];
        for (key, value) in params {
            rest.push("-f".to_string());
            rest.push(format!("{}={}", key, value));
        }

        let payload = match body {
            Some(body) => {
                rest.push("--input".to_string());
                rest.push("-".to_string());
                Some(serde_json::to_vec(body)?)
            }
            None => None,
        };

        let args = self.api_args(path, rest);
        let stdout = self.run(&args, payload.as_deref(), false)?;

        if stdout.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&stdout)?)
    }

    fn graphql(&self, query: &str, variables: Value) -> Result<Value> {
        let mut payload = serde_json::json!({ "query": query });
        if variables.as_object().is_some_and(|vars| !vars.is_empty()) {
            payload["variables"] = variables;
        }
        let data = serde_json::to_vec(&payload)?;
        let args = self.api_args("graphql", vec!["--input".to_string(), "-".to_string()]);

        match self.run(&args, Some(&data), false) {
            Ok(stdout) => Self::parse_graphql(&stdout),
            Err(ReviewError::Api(api_err)) => Err(Self::graphql_failure(api_err)),
            Err(e) => Err(e),
        }
    }

    fn pr_view_url(&self, selector: Option<&str>, repo: Option<&str>) -> Result<String> {
        let mut args = vec!["pr".to_string(), "view".to_string()];
        if let Some(selector) = selector {
            args.push(selector.to_string());
        }
        if let Some(repo) = repo {
            args.push("--repo".to_string());
            args.push(repo.to_string());
        }
        args.push("--json".to_string());
        args.push("url".to_string());

        let stdout = self.run(&args, None, true)?;

        #[derive(Deserialize)]
        struct View {
            #[serde(default)]
            url: String,
        }
        let view: View = serde_json::from_slice(&stdout)?;
        let url = view.url.trim();
        if url.is_empty() {
            return Err(ReviewError::MalformedResponse(
                "gh pr view did not return a pull request URL".to_string(),
            ));
        }
        Ok(url.to_string())
    }
}
