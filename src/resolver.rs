//! Pull request identity resolution.
//!
//! Turns a user-supplied selector plus `--pr`/`--repo` flags and a host into
//! a canonical [`Identity`]. Precedence is: explicit selector, then `--pr`,
//! then whatever `gh pr view` reports for the current branch.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use crate::error::{Result, ReviewError};
use crate::gh::GhApi;

/// Host assumed when nothing names one.
pub const DEFAULT_HOST: &str = "github.com";

static URL_PARTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?i:https?)://(?:[^@/?#]*@)?([^/:?#]+)(?::\d+)?([^?#]*)").unwrap());
static PULL_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/([^/]+)/([^/]+)/pull/([0-9]+)(?:/.*)?$").unwrap());
static SHORTHAND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z0-9_.-]+)/([A-Za-z0-9_.-]+)#([0-9]+)$").unwrap());

/// A fully-resolved pull request reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub owner: String,
    pub repo: String,
    pub host: String,
    pub number: u64,
    pub url: String,
}

impl Identity {
    /// Build an identity, synthesizing the canonical web URL.
    pub fn new(owner: &str, repo: &str, host: &str, number: u64) -> Self {
        let host = host.to_ascii_lowercase();
        Self {
            url: format!("https://{}/{}/{}/pull/{}", host, owner, repo, number),
            owner: owner.to_string(),
            repo: repo.to_string(),
            host,
            number,
        }
    }

    /// `repos/{owner}/{repo}/pulls/{number}` REST prefix.
    pub fn rest_path(&self) -> String {
        format!("repos/{}/{}/pulls/{}", self.owner, self.repo, self.number)
    }
}

fn invalid_selector(selector: &str, reason: &str) -> ReviewError {
    ReviewError::InvalidSelector {
        selector: selector.to_string(),
        reason: reason.to_string(),
    }
}

fn positive_number(selector: &str, digits: &str) -> Result<u64> {
    match digits.parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(invalid_selector(
            selector,
            "pull request number must be a positive integer",
        )),
    }
}

/// Parse `https://host/owner/repo/pull/N[/...]`.
pub fn parse_pull_url(raw: &str) -> Result<Identity> {
    let trimmed = raw.trim();
    let caps = URL_PARTS
        .captures(trimmed)
        .ok_or_else(|| invalid_selector(trimmed, "not an http(s) URL"))?;
    let host = caps[1].to_ascii_lowercase();
    let path = caps.get(2).map(|m| m.as_str()).unwrap_or("");

    let parts = PULL_PATH
        .captures(path)
        .ok_or_else(|| invalid_selector(trimmed, "not a pull request URL"))?;
    let number = positive_number(trimmed, &parts[3])?;

    Ok(Identity {
        owner: parts[1].to_string(),
        repo: parts[2].to_string(),
        host,
        number,
        url: trimmed.to_string(),
    })
}

/// The pull request number a selector names, when it can be read locally.
fn selector_number(selector: &str) -> Option<u64> {
    if let Ok(n) = selector.parse::<u64>() {
        return Some(n);
    }
    if let Some(caps) = SHORTHAND.captures(selector) {
        return caps[3].parse().ok();
    }
    parse_pull_url(selector).ok().map(|id| id.number)
}

/// Merge the positional selector with `--pr`.
///
/// Fails when both are given and name different pull requests.
pub fn normalize_selector(selector: Option<&str>, pr_flag: Option<u64>) -> Result<Option<String>> {
    let selector = selector.map(str::trim).filter(|s| !s.is_empty());

    let Some(pr) = pr_flag else {
        return Ok(selector.map(str::to_string));
    };
    if pr == 0 {
        return Err(ReviewError::InvalidArgument(
            "--pr must be a positive integer".to_string(),
        ));
    }

    match selector {
        None => Ok(Some(pr.to_string())),
        Some(sel) => match selector_number(sel) {
            Some(n) if n != pr => Err(ReviewError::SelectorConflict {
                selector: sel.to_string(),
                pr,
            }),
            _ => Ok(Some(sel.to_string())),
        },
    }
}

/// Split `owner/repo` or `host/owner/repo`.
fn parse_repo_flag(repo: &str) -> Result<(Option<&str>, &str, &str)> {
    let parts: Vec<&str> = repo.split('/').collect();
    match parts.as_slice() {
        [owner, name] if !owner.is_empty() && !name.is_empty() => Ok((None, owner, name)),
        [host, owner, name] if !host.is_empty() && !owner.is_empty() && !name.is_empty() => {
            Ok((Some(host), owner, name))
        }
        _ => Err(ReviewError::InvalidArgument(format!(
            "invalid --repo {:?}: expected 'owner/repo' or 'host/owner/repo'",
            repo
        ))),
    }
}

/// Resolve a pull request identity.
///
/// URLs, `owner/repo#N`, and bare numbers combined with `--repo` are resolved
/// locally. Anything else (including no selector at all) is delegated to
/// `gh pr view`.
pub fn resolve(
    api: &dyn GhApi,
    selector: Option<&str>,
    pr_flag: Option<u64>,
    repo_flag: Option<&str>,
    host: Option<&str>,
) -> Result<Identity> {
    let selector = normalize_selector(selector, pr_flag)?;
    let repo = repo_flag.map(str::trim).filter(|r| !r.is_empty());
    let host = host.map(str::trim).filter(|h| !h.is_empty());

    if let Some(sel) = selector.as_deref() {
        if sel.contains("://") {
            return parse_pull_url(sel);
        }
        if let Some(caps) = SHORTHAND.captures(sel) {
            let number = positive_number(sel, &caps[3])?;
            return Ok(Identity::new(
                &caps[1],
                &caps[2],
                host.unwrap_or(DEFAULT_HOST),
                number,
            ));
        }
        if sel.chars().all(|c| c.is_ascii_digit()) {
            let number = positive_number(sel, sel)?;
            if let Some(repo) = repo {
                let (repo_host, owner, name) = parse_repo_flag(repo)?;
                let host = repo_host.or(host).unwrap_or(DEFAULT_HOST);
                return Ok(Identity::new(owner, name, host, number));
            }
        }
    }

    let url = api
        .pr_view_url(selector.as_deref(), repo)
        .map_err(|e| ReviewError::resolution("resolve pull request via gh pr view", e))?;
    parse_pull_url(&url)
        .map_err(|e| ReviewError::resolution("parse pull request URL from gh pr view", e))
}
