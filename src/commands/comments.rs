//! `comments` subcommand handlers.

use serde::Deserialize;
use serde_json::json;
use std::io::Write;

use super::{Context, PrTarget};
use crate::comments::{CommentService, IdsOptions, ReplyInput};
use crate::error::{Result, ReviewError};
use crate::output::write_json;

/// Reply to a review comment.
///
/// Prints the API payload, or only `{"id": N}` when `concise` is set.
pub fn reply_command(
    ctx: &Context,
    target: &PrTarget,
    input: ReplyInput,
    concise: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let (identity, api) = ctx.resolve(target)?;
    let reply = CommentService::new(api.as_ref())
        .with_auto_submit(ctx.config.auto_submit_pending)
        .reply(&identity, input)?;

    if !concise {
        return write_json(out, &reply);
    }

    #[derive(Deserialize)]
    struct Minimal {
        id: Option<i64>,
    }
    let minimal: Minimal = serde_json::from_value(reply)
        .map_err(|e| ReviewError::MalformedResponse(format!("parse reply payload: {}", e)))?;
    let id = minimal
        .id
        .ok_or_else(|| ReviewError::MalformedResponse("reply response missing id".into()))?;
    write_json(out, &json!({ "id": id }))
}

/// Print comment references for a review.
pub fn ids_command(
    ctx: &Context,
    target: &PrTarget,
    mut opts: IdsOptions,
    out: &mut dyn Write,
) -> Result<()> {
    opts.per_page = Some(ctx.config.per_page_or(opts.per_page));
    let (identity, api) = ctx.resolve(target)?;
    let ids = CommentService::new(api.as_ref()).ids(&identity, opts)?;
    write_json(out, &ids)
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::config::Config;
    use crate::gh::ApiError;
    use crate::test_utils::FakeGh;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn run_reply(fake: FakeGh, config: &Config, concise: bool) -> (Result<()>, Vec<u8>) {
        let factory = fake_factory(Rc::new(fake), Rc::new(RefCell::new(Vec::new())));
        let ctx = Context::new(config, None, factory.as_ref());
        let mut buf = Vec::new();
        let result = reply_command(
            &ctx,
            &demo_target(),
            ReplyInput {
                comment_id: 5,
                body: "ack".into(),
            },
            concise,
            &mut buf,
        );
        (result, buf)
    }

    #[test]
    fn test_reply_command_concise_prints_only_id() {
        let fake = FakeGh::new().on_rest(|_| Ok(json!({"id": 77, "body": "ack", "user": {}})));
        let (result, buf) = run_reply(fake, &Config::default(), true);
        result.unwrap();
        assert_eq!(output(buf), json!({"id": 77}));
    }

    #[test]
    fn test_reply_command_concise_requires_id() {
        let fake = FakeGh::new().on_rest(|_| Ok(json!({"body": "ack"})));
        let (result, buf) = run_reply(fake, &Config::default(), true);
        assert!(matches!(result, Err(ReviewError::MalformedResponse(_))));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_reply_command_full_payload() {
        let fake = FakeGh::new().on_rest(|_| Ok(json!({"id": 77, "body": "ack"})));
        let (result, buf) = run_reply(fake, &Config::default(), false);
        result.unwrap();
        assert_eq!(output(buf)["body"], "ack");
    }

    #[test]
    fn test_reply_command_honors_auto_submit_config() {
        let fake = FakeGh::new().on_rest(|_| {
            Err(ApiError::new(422, "one pending review per pull request").into())
        });
        let config = Config {
            auto_submit_pending: false,
            ..Config::default()
        };
        let (result, _) = run_reply(fake, &config, false);
        assert!(matches!(
            result,
            Err(ReviewError::ConflictRecoverable { comment_id: 5 })
        ));
    }

    #[test]
    fn test_ids_command_uses_config_page_size() {
        let fake = Rc::new(FakeGh::new().on_rest(|call| {
            assert_eq!(call.param("per_page"), Some("20"));
            Ok(json!([{"id": 1, "body": "x"}]))
        }));
        let factory = fake_factory(Rc::clone(&fake), Rc::new(RefCell::new(Vec::new())));
        let config = Config {
            per_page: 20,
            ..Config::default()
        };
        let ctx = Context::new(&config, None, factory.as_ref());

        let mut buf = Vec::new();
        ids_command(
            &ctx,
            &demo_target(),
            IdsOptions {
                review_id: Some(3),
                ..Default::default()
            },
            &mut buf,
        )
        .unwrap();
        assert_eq!(output(buf), json!([{"id": 1, "body": "x"}]));
        assert_eq!(fake.rest_calls().len(), 1);
    }
}
