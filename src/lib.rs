//! Pull request review comments and pending reviews through the `gh` CLI.
//!
//! The services ([`comments::CommentService`], [`review::ReviewService`]) talk
//! to GitHub only through [`gh::GhApi`], and [`resolver`] turns user input into
//! a pull request [`resolver::Identity`].

pub mod commands;
pub mod comments;
pub mod completion;
pub mod config;
pub mod error;
pub mod gh;
pub mod model;
pub mod output;
pub mod resolver;
pub mod review;
pub mod types;

#[cfg(test)]
mod test_utils;

pub use comments::CommentService;
pub use config::Config;
pub use error::{Result, ReviewError};
pub use resolver::Identity;
pub use review::ReviewService;
