//! CLI command handlers for gh-pr-review.
//!
//! Each handler resolves the target pull request, calls one service
//! operation, and writes a single JSON document to `out`.
//!
//! # Commands
//!
//! - [`list`] - List review threads
//! - [`create`] - Start a new inline comment thread
//! - [`comments`] - Reply to comments and page comment ids
//! - [`review`] - Pending review lifecycle and review lookups

mod comments;
mod create;
mod list;
mod review;

pub use comments::{ids_command, reply_command};
pub use create::create_command;
pub use list::list_command;
pub use review::{
    latest_id_command, pending_id_command, review_command, ReviewAction, ReviewOptions,
};

use crate::config::Config;
use crate::error::Result;
use crate::gh::GhApi;
use crate::resolver::{self, Identity};

/// Builds a transport bound to a host (`None` means gh's default).
pub type ApiFactory = dyn Fn(Option<&str>) -> Box<dyn GhApi>;

/// How a command names its pull request.
#[derive(Debug, Clone, Default)]
pub struct PrTarget {
    /// Number, URL, or `owner/repo#N`
    pub selector: Option<String>,
    /// `owner/repo` or `host/owner/repo`
    pub repo: Option<String>,
    pub pr: Option<u64>,
}

/// Shared state for every command invocation.
pub struct Context<'a> {
    pub config: &'a Config,
    /// Host from `GH_HOST` or the config file
    pub host: Option<String>,
    pub factory: &'a ApiFactory,
}

impl<'a> Context<'a> {
    pub fn new(config: &'a Config, env_host: Option<&str>, factory: &'a ApiFactory) -> Self {
        Self {
            config,
            host: config.effective_host(env_host),
            factory,
        }
    }

    /// Resolve the target and return a transport bound to its host.
    pub fn resolve(&self, target: &PrTarget) -> Result<(Identity, Box<dyn GhApi>)> {
        let lookup = (self.factory)(self.host.as_deref());
        let identity = resolver::resolve(
            lookup.as_ref(),
            target.selector.as_deref(),
            target.pr,
            target.repo.as_deref(),
            self.host.as_deref(),
        )?;
        let api = (self.factory)(Some(&identity.host));
        Ok((identity, api))
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::test_utils::FakeGh;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_context_binds_api_to_identity_host() {
        let fake = Rc::new(FakeGh::new());
        let hosts = Rc::new(RefCell::new(Vec::new()));
        let factory = fake_factory(Rc::clone(&fake), Rc::clone(&hosts));
        let config = Config::default();
        let ctx = Context::new(&config, Some("ghe.example.com"), factory.as_ref());

        let target = PrTarget {
            selector: Some("https://GitHub.com/octo/demo/pull/7".to_string()),
            ..Default::default()
        };
        let (identity, _api) = ctx.resolve(&target).unwrap();

        assert_eq!(identity.number, 7);
        assert_eq!(
            *hosts.borrow(),
            vec![
                Some("ghe.example.com".to_string()),
                Some("github.com".to_string())
            ]
        );
        assert!(fake.calls().is_empty());
    }

    #[test]
    fn test_context_uses_pr_view_for_current_branch() {
        let fake = Rc::new(
            FakeGh::new().on_pr_view(|_, _| Ok("https://github.com/octo/demo/pull/12".to_string())),
        );
        let hosts = Rc::new(RefCell::new(Vec::new()));
        let factory = fake_factory(Rc::clone(&fake), hosts);
        let config = Config::default();
        let ctx = Context::new(&config, None, factory.as_ref());

        let (identity, _) = ctx.resolve(&PrTarget::default()).unwrap();
        assert_eq!(identity.number, 12);
        assert_eq!(fake.calls().len(), 1);
    }
}
