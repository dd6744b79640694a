//! Create command handler.

use serde_json::json;
use std::io::Write;

use super::{Context, PrTarget};
use crate::comments::{CommentService, CreateInput};
use crate::error::Result;
use crate::output::write_json;

/// Start an inline comment thread and print `{"pull_request": ..., "comment": ...}`.
pub fn create_command(
    ctx: &Context,
    target: &PrTarget,
    input: CreateInput,
    out: &mut dyn Write,
) -> Result<()> {
    let (identity, api) = ctx.resolve(target)?;
    let comment = CommentService::new(api.as_ref()).create(&identity, input)?;
    write_json(
        out,
        &json!({
            "pull_request": identity,
            "comment": comment,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::config::Config;
    use crate::test_utils::FakeGh;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_create_command_prints_flattened_comment() {
        let fake = Rc::new(FakeGh::new().on_graphql(|call| {
            if call.query.contains("PullRequestIds") {
                return Ok(json!({"repository": {"pullRequest": {"id": "PR_1", "headRefOid": "abc"}}}));
            }
            Ok(json!({"addPullRequestReviewThread": {"thread": {
                "id": "PRRT_9",
                "path": "a.rs",
                "line": 2,
                "comments": {"nodes": [{
                    "id": "PRRC_9",
                    "databaseId": 99,
                    "body": "hi",
                    "author": {"login": "casey"},
                    "createdAt": "2024-06-01T00:00:00Z"
                }]}
            }}}))
        }));
        let factory = fake_factory(fake, Rc::new(RefCell::new(Vec::new())));
        let config = Config::default();
        let ctx = Context::new(&config, None, factory.as_ref());

        let mut buf = Vec::new();
        create_command(
            &ctx,
            &demo_target(),
            CreateInput {
                path: "a.rs".into(),
                line: 2,
                side: "right".into(),
                body: "hi".into(),
                ..Default::default()
            },
            &mut buf,
        )
        .unwrap();

        let value = output(buf);
        assert_eq!(value["comment"]["thread_id"], "PRRT_9");
        assert_eq!(value["comment"]["database_id"], 99);
        assert_eq!(value["comment"]["side"], "RIGHT");
        assert_eq!(value["pull_request"]["repo"], "demo");
    }
}
