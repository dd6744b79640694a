//! List command handler.
//!
//! Prints the review threads of a pull request.

use serde_json::json;
use std::io::Write;

use super::{Context, PrTarget};
use crate::comments::CommentService;
use crate::error::Result;
use crate::output::write_json;

/// Print `{"pull_request": ..., "threads": [...]}`.
///
/// At most 100 threads with 100 comments each are returned.
pub fn list_command(ctx: &Context, target: &PrTarget, out: &mut dyn Write) -> Result<()> {
    let (identity, api) = ctx.resolve(target)?;
    let threads = CommentService::new(api.as_ref()).list(&identity)?;
    write_json(
        out,
        &json!({
            "pull_request": identity,
            "threads": threads,
        }),
    )
}
