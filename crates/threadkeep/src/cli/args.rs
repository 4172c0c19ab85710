//! CLI argument structs for all commands.
//!
//! Each command has its own argument struct with clap derive attributes
//! for parsing and validation.

use clap::{Args, Parser, Subcommand};

use super::types::BackendArg;
use super::validators::{
    validate_author, validate_comment_id, validate_content, validate_post_id, validate_title,
};
use crate::domain::{CommentId, PostId, DEFAULT_PAGE_SIZE};

/// Arguments for the `init` command
#[derive(Parser, Debug, Clone)]
pub struct InitArgs {
    /// Storage backend to configure
    #[arg(short, long, value_enum, default_value_t = BackendArg::Sqlite)]
    pub backend: BackendArg,

    /// Suppress output messages
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments for the `post` command
#[derive(Parser, Debug, Clone)]
pub struct PostArgs {
    /// Post subcommand
    #[command(subcommand)]
    pub action: PostAction,
}

/// Post actions
#[derive(Subcommand, Debug, Clone)]
pub enum PostAction {
    /// Create a new post
    Create(PostCreateArgs),

    /// List posts in the order they were created
    List(PostListArgs),

    /// Show a post with its comment thread
    Show {
        /// Post ID
        #[arg(value_parser = validate_post_id)]
        post_id: PostId,
    },

    /// Stop accepting new comments on a post
    Close {
        /// Post ID
        #[arg(value_parser = validate_post_id)]
        post_id: PostId,
    },

    /// Accept new comments on a post again
    Open {
        /// Post ID
        #[arg(value_parser = validate_post_id)]
        post_id: PostId,
    },
}

/// Arguments for `post create`
#[derive(Parser, Debug, Clone)]
pub struct PostCreateArgs {
    /// Post title (single line, at most 200 characters)
    #[arg(long, value_parser = validate_title)]
    pub title: String,

    /// Author name
    #[arg(short, long, value_parser = validate_author)]
    pub author: String,

    /// Post body
    #[arg(short, long, value_parser = validate_content)]
    pub content: String,

    /// Create the post closed for comments
    #[arg(long)]
    pub closed: bool,
}

/// Arguments for `post list`
#[derive(Parser, Debug, Clone)]
pub struct PostListArgs {
    /// Number of posts to skip
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub offset: i64,

    /// Maximum number of posts to display
    #[arg(short = 'n', long, default_value_t = DEFAULT_PAGE_SIZE, allow_negative_numbers = true)]
    pub limit: i64,

    /// Include each post's comment thread
    #[arg(short = 'w', long)]
    pub with_comments: bool,
}

/// Arguments for the `comment` command
#[derive(Parser, Debug, Clone)]
pub struct CommentArgs {
    /// Comment subcommand
    #[command(subcommand)]
    pub action: CommentAction,
}

/// Comment actions
#[derive(Subcommand, Debug, Clone)]
pub enum CommentAction {
    /// Add a comment to a post or reply to a comment
    Add(CommentAddArgs),
}

/// Arguments for `comment add`
#[derive(Parser, Debug, Clone)]
pub struct CommentAddArgs {
    /// Where the comment goes
    #[command(flatten)]
    pub target: CommentTargetArgs,

    /// Author name
    #[arg(short, long, value_parser = validate_author)]
    pub author: String,

    /// Comment body
    #[arg(short, long, value_parser = validate_content)]
    pub content: String,
}

/// Exactly one of `--post` or `--reply-to`
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct CommentTargetArgs {
    /// Comment directly on this post
    #[arg(short, long, value_parser = validate_post_id)]
    pub post: Option<PostId>,

    /// Reply to this comment
    #[arg(short, long, value_parser = validate_comment_id)]
    pub reply_to: Option<CommentId>,
}
