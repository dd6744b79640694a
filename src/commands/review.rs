//! `review` subcommand handlers.

use serde_json::json;
use std::io::Write;

use super::{Context, PrTarget};
use crate::error::{Result, ReviewError};
use crate::output::write_json;
use crate::review::{LatestOptions, PendingOptions, ReviewService, SubmitInput, ThreadInput};
use crate::types::ReviewEvent;

/// The single action a `review` invocation performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewAction {
    Start,
    AddComment,
    Submit,
}

/// Flags of the `review` command.
#[derive(Debug, Clone)]
pub struct ReviewOptions {
    pub start: bool,
    pub add_comment: bool,
    pub submit: bool,
    pub commit: Option<String>,
    pub review_id: Option<String>,
    pub path: Option<String>,
    pub line: Option<u32>,
    pub side: String,
    pub start_line: Option<u32>,
    pub start_side: Option<String>,
    pub body: Option<String>,
    pub event: String,
}

impl Default for ReviewOptions {
    fn default() -> Self {
        Self {
            start: false,
            add_comment: false,
            submit: false,
            commit: None,
            review_id: None,
            path: None,
            line: None,
            side: "RIGHT".to_string(),
            start_line: None,
            start_side: None,
            body: None,
            event: "COMMENT".to_string(),
        }
    }
}

impl ReviewOptions {
    /// The selected action; exactly one action flag must be set.
    pub fn action(&self) -> Result<ReviewAction> {
        match (self.start, self.add_comment, self.submit) {
            (true, false, false) => Ok(ReviewAction::Start),
            (false, true, false) => Ok(ReviewAction::AddComment),
            (false, false, true) => Ok(ReviewAction::Submit),
            _ => Err(ReviewError::InvalidArgument(
                "specify exactly one of --start, --add-comment, or --submit".into(),
            )),
        }
    }
}

/// Run one pending review action.
///
/// A rejected submission still prints its status document before failing.
pub fn review_command(
    ctx: &Context,
    target: &PrTarget,
    opts: ReviewOptions,
    out: &mut dyn Write,
) -> Result<()> {
    let action = opts.action()?;
    let event = match action {
        ReviewAction::Submit => Some(ReviewEvent::normalize(&opts.event)?),
        _ => None,
    };

    let (identity, api) = ctx.resolve(target)?;
    let service = ReviewService::new(api.as_ref());

    match (action, event) {
        (ReviewAction::Start, _) => {
            let state = service.start(&identity, opts.commit.as_deref())?;
            write_json(out, &state)
        }
        (ReviewAction::AddComment, _) => {
            let thread = service.add_thread(
                &identity,
                ThreadInput {
                    review_id: opts.review_id.unwrap_or_default(),
                    path: opts.path.unwrap_or_default(),
                    line: opts.line.unwrap_or(0),
                    side: opts.side,
                    start_line: opts.start_line,
                    start_side: opts.start_side,
                    body: opts.body.unwrap_or_default(),
                },
            )?;
            write_json(out, &thread)
        }
        (ReviewAction::Submit, event) => {
            let status = service.submit(
                &identity,
                SubmitInput {
                    review_id: opts.review_id.unwrap_or_default(),
                    event: event.unwrap_or(ReviewEvent::Comment),
                    body: opts.body,
                },
            )?;
            if status.success {
                return write_json(out, &json!({"status": "Review submitted successfully"}));
            }
            let mut failure = json!({"status": "Review submission failed"});
            if !status.errors.is_empty() {
                failure["errors"] = serde_json::to_value(&status.errors)?;
            }
            write_json(out, &failure)?;
            Err(ReviewError::SubmissionRejected)
        }
    }
}

/// Print the reviewer's latest submitted review.
pub fn latest_id_command(
    ctx: &Context,
    target: &PrTarget,
    mut opts: LatestOptions,
    out: &mut dyn Write,
) -> Result<()> {
    opts.per_page = Some(ctx.config.per_page_or(opts.per_page));
    let (identity, api) = ctx.resolve(target)?;
    let summary = ReviewService::new(api.as_ref()).latest_submitted(&identity, opts)?;
    write_json(out, &summary)
}

/// Print the reviewer's most recently updated pending review.
pub fn pending_id_command(
    ctx: &Context,
    target: &PrTarget,
    mut opts: PendingOptions,
    out: &mut dyn Write,
) -> Result<()> {
    opts.per_page = Some(ctx.config.per_page_or(opts.per_page));
    let explicit_reviewer = opts
        .reviewer
        .as_deref()
        .is_some_and(|r| !r.trim().is_empty());
    let (identity, api) = ctx.resolve(target)?;

    match ReviewService::new(api.as_ref()).latest_pending(&identity, opts) {
        Ok(summary) => write_json(out, &summary),
        Err(ReviewError::ViewerLoginUnavailable) if !explicit_reviewer => {
            Err(ReviewError::InvalidArgument(
                "unable to resolve reviewer automatically; pass --reviewer or ensure gh auth login is active"
                    .into(),
            ))
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::config::Config;
    use crate::gh::{GraphQlError, GraphQlErrorEntry};
    use crate::test_utils::FakeGh;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn run(fake: FakeGh, opts: ReviewOptions) -> (Result<()>, Vec<u8>, Rc<FakeGh>) {
        let fake = Rc::new(fake);
        let factory = fake_factory(Rc::clone(&fake), Rc::new(RefCell::new(Vec::new())));
        let config = Config::default();
        let ctx = Context::new(&config, None, factory.as_ref());
        let mut buf = Vec::new();
        let result = review_command(&ctx, &demo_target(), opts, &mut buf);
        (result, buf, fake)
    }

    #[test]
    fn test_review_requires_exactly_one_action() {
        let (result, _, fake) = run(FakeGh::new(), ReviewOptions::default());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("exactly one of --start, --add-comment, or --submit"));
        assert!(fake.calls().is_empty());

        let opts = ReviewOptions {
            start: true,
            submit: true,
            ..Default::default()
        };
        let (result, _, _) = run(FakeGh::new(), opts);
        assert!(matches!(result, Err(ReviewError::InvalidArgument(_))));
    }

    #[test]
    fn test_submit_success_prints_status() {
        let fake = FakeGh::new()
            .on_graphql(|_| Ok(json!({"submitPullRequestReview": {"pullRequestReview": null}})));
        let opts = ReviewOptions {
            submit: true,
            review_id: Some("PRR_kwM123".into()),
            event: "approve".into(),
            ..Default::default()
        };
        let (result, buf, fake) = run(fake, opts);
        result.unwrap();
        assert_eq!(output(buf), json!({"status": "Review submitted successfully"}));
        assert_eq!(
            fake.graphql_calls()[0].variables["input"]["event"],
            "APPROVE"
        );
    }

    #[test]
    fn test_submit_failure_prints_errors_then_fails() {
        let fake = FakeGh::new().on_graphql(|_| {
            Err(GraphQlError {
                errors: vec![GraphQlErrorEntry::new("Review has no comments")],
            }
            .into())
        });
        let opts = ReviewOptions {
            submit: true,
            review_id: Some("PRR_kwM123".into()),
            ..Default::default()
        };
        let (result, buf, _) = run(fake, opts);
        assert!(matches!(result, Err(ReviewError::SubmissionRejected)));
        let value = output(buf);
        assert_eq!(value["status"], "Review submission failed");
        assert_eq!(value["errors"][0]["message"], "Review has no comments");
    }

    #[test]
    fn test_submit_rejects_unknown_event_before_calling() {
        let opts = ReviewOptions {
            submit: true,
            review_id: Some("PRR_kwM123".into()),
            event: "MERGE".into(),
            ..Default::default()
        };
        let (result, _, fake) = run(FakeGh::new(), opts);
        assert!(matches!(result, Err(ReviewError::InvalidEvent(_))));
        assert!(fake.calls().is_empty());
    }

    #[test]
    fn test_add_comment_rejects_rest_review_id() {
        let opts = ReviewOptions {
            add_comment: true,
            review_id: Some("123".into()),
            path: Some("a.rs".into()),
            line: Some(1),
            body: Some("x".into()),
            ..Default::default()
        };
        let (result, _, fake) = run(FakeGh::new(), opts);
        assert!(result.unwrap_err().to_string().contains("REST review id"));
        assert!(fake.calls().is_empty());
    }

    #[test]
    fn test_start_prints_review_state() {
        let fake = FakeGh::new().on_graphql(|call| {
            if call.query.contains("PullRequestIds") {
                return Ok(json!({"repository": {"pullRequest": {"id": "PR_1", "headRefOid": "abc"}}}));
            }
            Ok(json!({"addPullRequestReview": {"pullRequestReview": {
                "id": "PRR_new", "state": "PENDING", "url": "https://example.com/r"
            }}}))
        });
        let opts = ReviewOptions {
            start: true,
            ..Default::default()
        };
        let (result, buf, _) = run(fake, opts);
        result.unwrap();
        let value = output(buf);
        assert_eq!(value["id"], "PRR_new");
        assert_eq!(value["state"], "PENDING");
    }

    #[test]
    fn test_pending_id_suggests_reviewer_flag_when_viewer_unknown() {
        let fake = Rc::new(FakeGh::new().on_graphql(|_| Ok(json!({"viewer": {"login": ""}}))));
        let factory = fake_factory(fake, Rc::new(RefCell::new(Vec::new())));
        let config = Config::default();
        let ctx = Context::new(&config, None, factory.as_ref());
        let mut buf = Vec::new();

        let err = pending_id_command(&ctx, &demo_target(), PendingOptions::default(), &mut buf)
            .unwrap_err();
        assert!(err.to_string().contains("pass --reviewer"));
    }

    #[test]
    fn test_latest_id_prints_summary() {
        let fake = Rc::new(FakeGh::new().on_rest(|call| {
            assert_eq!(call.param("per_page"), Some("100"));
            Ok(json!([{
                "id": 42,
                "state": "APPROVED",
                "submitted_at": "2024-06-01T00:00:00Z",
                "user": {"login": "casey", "id": 1}
            }]))
        }));
        let factory = fake_factory(fake, Rc::new(RefCell::new(Vec::new())));
        let config = Config::default();
        let ctx = Context::new(&config, None, factory.as_ref());
        let mut buf = Vec::new();

        latest_id_command(
            &ctx,
            &demo_target(),
            LatestOptions {
                reviewer: Some("casey".into()),
                ..Default::default()
            },
            &mut buf,
        )
        .unwrap();
        let value = output(buf);
        assert_eq!(value["id"], 42);
        assert_eq!(value["user"]["login"], "casey");
    }
}
