//! gh-pr-review CLI entry point.
//!
//! Parses command-line arguments and dispatches to the appropriate command handler.

use gh_pr_review::comments::{CreateInput, IdsOptions, ReplyInput};
use gh_pr_review::commands::{
    create_command, ids_command, latest_id_command, list_command, pending_id_command,
    reply_command, review_command, Context, PrTarget, ReviewOptions,
};
use gh_pr_review::completion::{generate_completion_script, ShellType};
use gh_pr_review::config::load_config;
use gh_pr_review::error::Result;
use gh_pr_review::gh::{GhApi, GhCli};
use gh_pr_review::output::print_error;
use gh_pr_review::review::{LatestOptions, PendingOptions};
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::io::{self, Write};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter when `--verbose` is not given.
const LOG_ENV: &str = "GH_PR_REVIEW_LOG";

#[derive(Parser)]
#[command(name = "gh-pr-review")]
#[command(
    version,
    about = "Inline pull request review comments and pending reviews for gh",
    after_help = "EXAMPLES:
    # List review threads on the current branch's pull request
    gh pr-review list

    # Reply to a review comment
    gh pr-review comments reply 42 -R octo/demo --comment-id 1234 --body 'Fixed'

    # Open a pending review, add a comment, then submit it
    gh pr-review review --start octo/demo#42
    gh pr-review review --add-comment octo/demo#42 --review-id PRR_... --path src/lib.rs --line 10 --body 'nit'
    gh pr-review review --submit octo/demo#42 --review-id PRR_... --event APPROVE

CONFIG FILE:
    ~/.config/gh-pr-review/config.toml (host, per_page, auto_submit_pending)"
)]
struct Cli {
    /// Log every gh invocation to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Pull request selection shared by every command.
#[derive(Args, Debug, Clone, Default)]
struct TargetArgs {
    /// Pull request number, URL, or owner/repo#number (defaults to the current branch)
    selector: Option<String>,

    /// Repository in 'owner/repo' or 'host/owner/repo' format
    #[arg(short = 'R', long)]
    repo: Option<String>,

    /// Pull request number
    #[arg(long)]
    pr: Option<u64>,
}

impl From<TargetArgs> for PrTarget {
    fn from(args: TargetArgs) -> Self {
        PrTarget {
            selector: args.selector,
            repo: args.repo,
            pr: args.pr,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List review threads on a pull request
    List {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Start a new inline comment thread
    Create {
        #[command(flatten)]
        target: TargetArgs,

        /// File path for the inline comment
        #[arg(long)]
        path: String,

        /// Line number for the inline comment
        #[arg(long)]
        line: u32,

        /// Diff side (LEFT or RIGHT)
        #[arg(long, default_value = "RIGHT")]
        side: String,

        /// Start line for multi-line comments
        #[arg(long)]
        start_line: Option<u32>,

        /// Start side for multi-line comments (LEFT or RIGHT)
        #[arg(long)]
        start_side: Option<String>,

        /// Comment body
        #[arg(long)]
        body: String,
    },

    /// Reply to review comments and look up comment ids
    Comments {
        #[command(subcommand)]
        command: CommentsCommand,
    },

    /// Manage pending reviews
    #[command(args_conflicts_with_subcommands = true)]
    Review {
        #[command(flatten)]
        args: ReviewArgs,

        #[command(subcommand)]
        command: Option<ReviewCommand>,
    },

    /// Print a shell completion script
    #[command(hide = true)]
    Completions {
        /// Shell to generate for (bash, zsh, fish)
        shell: String,
    },
}

#[derive(Subcommand)]
enum CommentsCommand {
    /// Reply to a review comment, submitting your pending review if it blocks the reply
    Reply {
        #[command(flatten)]
        target: TargetArgs,

        /// Review comment identifier to reply to
        #[arg(long)]
        comment_id: u64,

        /// Reply text
        #[arg(long)]
        body: String,

        /// Print only the new comment id
        #[arg(long)]
        concise: bool,
    },

    /// List comment ids for a review
    Ids {
        #[command(flatten)]
        target: TargetArgs,

        /// REST review id
        #[arg(long)]
        review_id: Option<u64>,

        /// Use the latest submitted review by --reviewer
        #[arg(long)]
        latest: bool,

        /// Reviewer login (defaults to the authenticated user)
        #[arg(long)]
        reviewer: Option<String>,

        /// Maximum number of comments to return (0 for all)
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        limit: i64,

        /// Comments per page (max 100)
        #[arg(long, alias = "per_page")]
        per_page: Option<u32>,

        /// First page to fetch
        #[arg(long)]
        page: Option<u32>,
    },
}

#[derive(Args, Debug, Clone, Default)]
struct ReviewArgs {
    #[command(flatten)]
    target: TargetArgs,

    /// Open a pending review
    #[arg(long)]
    start: bool,

    /// Add an inline comment to a pending review
    #[arg(long)]
    add_comment: bool,

    /// Submit a pending review
    #[arg(long)]
    submit: bool,

    /// Commit SHA for --start (defaults to the pull request head)
    #[arg(long)]
    commit: Option<String>,

    /// GraphQL review node id (PRR_...)
    #[arg(long)]
    review_id: Option<String>,

    /// File path for the inline comment
    #[arg(long)]
    path: Option<String>,

    /// Line number for the inline comment
    #[arg(long)]
    line: Option<u32>,

    /// Diff side for the inline comment (LEFT or RIGHT)
    #[arg(long, default_value = "RIGHT")]
    side: String,

    /// Start line for multi-line comments
    #[arg(long)]
    start_line: Option<u32>,

    /// Start side for multi-line comments
    #[arg(long)]
    start_side: Option<String>,

    /// Comment or review body
    #[arg(long)]
    body: Option<String>,

    /// Submission event (APPROVE, COMMENT, REQUEST_CHANGES)
    #[arg(long, default_value = "COMMENT")]
    event: String,
}

impl From<ReviewArgs> for ReviewOptions {
    fn from(args: ReviewArgs) -> Self {
        ReviewOptions {
            start: args.start,
            add_comment: args.add_comment,
            submit: args.submit,
            commit: args.commit,
            review_id: args.review_id,
            path: args.path,
            line: args.line,
            side: args.side,
            start_line: args.start_line,
            start_side: args.start_side,
            body: args.body,
            event: args.event,
        }
    }
}

#[derive(Subcommand)]
enum ReviewCommand {
    /// Show the latest submitted review for a reviewer
    LatestId {
        #[command(flatten)]
        target: TargetArgs,

        /// Reviewer login (defaults to the authenticated user)
        #[arg(long)]
        reviewer: Option<String>,

        /// Reviews per page (max 100)
        #[arg(long, alias = "per_page")]
        per_page: Option<u32>,

        /// First page to scan; later pages follow until a short page
        #[arg(long)]
        page: Option<u32>,
    },

    /// Show the latest pending review for a reviewer
    PendingId {
        #[command(flatten)]
        target: TargetArgs,

        /// Reviewer login (defaults to the authenticated user)
        #[arg(long)]
        reviewer: Option<String>,

        /// Reviews per GraphQL page (max 100)
        #[arg(long, alias = "per_page")]
        per_page: Option<u32>,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn dispatch(ctx: &Context, command: Commands, out: &mut dyn Write) -> Result<()> {
    match command {
        Commands::List { target } => list_command(ctx, &target.into(), out),

        Commands::Create {
            target,
            path,
            line,
            side,
            start_line,
            start_side,
            body,
        } => create_command(
            ctx,
            &target.into(),
            CreateInput {
                path,
                line,
                side,
                start_line,
                start_side,
                body,
            },
            out,
        ),

        Commands::Comments {
            command:
                CommentsCommand::Reply {
                    target,
                    comment_id,
                    body,
                    concise,
                },
        } => reply_command(
            ctx,
            &target.into(),
            ReplyInput { comment_id, body },
            concise,
            out,
        ),

        Commands::Comments {
            command:
                CommentsCommand::Ids {
                    target,
                    review_id,
                    latest,
                    reviewer,
                    limit,
                    per_page,
                    page,
                },
        } => ids_command(
            ctx,
            &target.into(),
            IdsOptions {
                review_id,
                latest,
                reviewer,
                limit,
                per_page,
                page,
            },
            out,
        ),

        Commands::Review {
            command:
                Some(ReviewCommand::LatestId {
                    target,
                    reviewer,
                    per_page,
                    page,
                }),
            ..
        } => latest_id_command(
            ctx,
            &target.into(),
            LatestOptions {
                reviewer,
                per_page,
                page,
            },
            out,
        ),

        Commands::Review {
            command:
                Some(ReviewCommand::PendingId {
                    target,
                    reviewer,
                    per_page,
                }),
            ..
        } => pending_id_command(
            ctx,
            &target.into(),
            PendingOptions { reviewer, per_page },
            out,
        ),

        Commands::Review {
            args,
            command: None,
        } => {
            let target: PrTarget = args.target.clone().into();
            review_command(ctx, &target, args.into(), out)
        }

        // Handled before the config is loaded
        Commands::Completions { .. } => Ok(()),
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Commands::Completions { shell } = &cli.command {
        let shell = ShellType::from_name(shell)?;
        print!("{}", generate_completion_script(shell, &mut Cli::command()));
        return Ok(());
    }

    let config = load_config()?;
    let env_host = std::env::var("GH_HOST").ok();
    let factory = |host: Option<&str>| -> Box<dyn GhApi> { Box::new(GhCli::new(host)) };
    let ctx = Context::new(&config, env_host.as_deref(), &factory);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    dispatch(&ctx, cli.command, &mut out)
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        print_error(&e.to_string());
        std::process::exit(1);
    }
}
