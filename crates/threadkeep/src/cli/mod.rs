//! CLI argument parsing and command dispatch.
//!
//! This module provides the command-line interface for threadkeep using
//! clap's derive API.
//!
//! # Commands
//!
//! - `init`: Initialize a threadkeep root
//! - `post create|list|show|close|open`: Manage posts
//! - `comment add`: Comment on a post or reply to a comment
//!
//! # Global Flags
//!
//! - `--json`: Output in JSON format (applies to all commands)
//! - `--timeout <SECS>`: Deadline for the command's storage operations
//!
//! # Example
//!
//! ```bash
//! threadkeep init
//! threadkeep post create --title "Hello" --author ann --content "First post"
//! threadkeep comment add --post <POST_ID> --author bob --content "Welcome!"
//! threadkeep post show <POST_ID>
//! ```

mod args;
mod execute;
mod types;
mod validators;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::time::Duration;

// Re-export argument structs
pub use args::{
    CommentAction, CommentAddArgs, CommentArgs, CommentTargetArgs, InitArgs, PostAction,
    PostArgs, PostCreateArgs, PostListArgs,
};

// Re-export types
pub use types::BackendArg;

// Re-export validators for external use
pub use validators::{
    validate_author, validate_comment_id, validate_content, validate_post_id, validate_title,
};

/// Threadkeep - threaded comments for blog posts
///
/// Stores posts and their nested comment threads in a SQLite database under
/// `.threadkeep/`.
#[derive(Parser, Debug)]
#[command(name = "threadkeep")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output in JSON format for programmatic use
    #[arg(long, global = true)]
    pub json: bool,

    /// Give up on storage operations after this many seconds
    #[arg(long, global = true, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Initialize a threadkeep root
    ///
    /// Creates the `.threadkeep/` directory with configuration and, for the
    /// SQLite backend, an empty database.
    Init(InitArgs),

    /// Create, list, show, open, or close posts
    Post(PostArgs),

    /// Add comments and replies
    Comment(CommentArgs),
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse CLI arguments from an iterator (for testing)
    pub fn try_parse_from<I, T>(iter: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    /// Execute the CLI command
    pub async fn execute(&self) -> Result<()> {
        use crate::app::App;
        use crate::output::OutputMode;

        let output_mode = if self.json {
            OutputMode::Json
        } else {
            OutputMode::Text
        };
        let timeout = self.timeout.map(Duration::from_secs);

        match &self.command {
            Some(Commands::Init(args)) => execute::execute_init(args, output_mode).await,
            Some(Commands::Post(args)) => {
                let app = App::from_directory(&std::env::current_dir()?).await?;
                let ctx = app.context(timeout);
                execute::execute_post(&app, &ctx, args, output_mode).await
            }
            Some(Commands::Comment(args)) => {
                let app = App::from_directory(&std::env::current_dir()?).await?;
                let ctx = app.context(timeout);
                execute::execute_comment(&app, &ctx, args, output_mode).await
            }
            None => {
                println!("Threadkeep threaded comment storage");
                println!("Use --help for more information");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CommentId, PostId};

    // ========== CLI Parsing Tests ==========

    #[test]
    fn test_parse_no_command() {
        let cli = Cli::try_parse_from(["threadkeep"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.json);
        assert!(cli.timeout.is_none());
    }

    #[test]
    fn test_parse_init_default_backend() {
        let cli = Cli::try_parse_from(["threadkeep", "init"]).unwrap();
        match cli.command {
            Some(Commands::Init(args)) => {
                assert_eq!(args.backend, BackendArg::Sqlite);
                assert!(!args.quiet);
            }
            _ => panic!("Expected Init command"),
        }
    }

    #[test]
    fn test_parse_init_memory_backend() {
        let cli = Cli::try_parse_from(["threadkeep", "init", "--backend", "memory", "-q"]).unwrap();
        match cli.command {
            Some(Commands::Init(args)) => {
                assert_eq!(args.backend, BackendArg::Memory);
                assert!(args.quiet);
            }
            _ => panic!("Expected Init command"),
        }
    }

    #[test]
    fn test_parse_post_create() {
        let cli = Cli::try_parse_from([
            "threadkeep",
            "post",
            "create",
            "--title",
            " Hello ",
            "--author",
            "ann",
            "--content",
            "Body",
            "--closed",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Post(PostArgs {
                action: PostAction::Create(args),
            })) => {
                assert_eq!(args.title, "Hello");
                assert!(args.closed);
            }
            _ => panic!("Expected post create"),
        }
    }

    #[test]
    fn test_parse_post_list_defaults() {
        let cli = Cli::try_parse_from(["threadkeep", "--json", "post", "list"]).unwrap();
        assert!(cli.json);
        match cli.command {
            Some(Commands::Post(PostArgs {
                action: PostAction::List(args),
            })) => {
                assert_eq!(args.offset, 0);
                assert_eq!(args.limit, crate::domain::DEFAULT_PAGE_SIZE);
                assert!(!args.with_comments);
            }
            _ => panic!("Expected post list"),
        }
    }

    #[test]
    fn test_parse_post_list_accepts_negative_numbers() {
        let cli =
            Cli::try_parse_from(["threadkeep", "post", "list", "--offset", "-1", "-n", "0"]).unwrap();
        match cli.command {
            Some(Commands::Post(PostArgs {
                action: PostAction::List(args),
            })) => {
                assert_eq!(args.offset, -1);
                assert_eq!(args.limit, 0);
            }
            _ => panic!("Expected post list"),
        }
    }

    #[test]
    fn test_parse_post_show_validates_id() {
        let id = PostId::generate();
        let cli = Cli::try_parse_from(["threadkeep", "post", "show", &id.to_string()]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Post(PostArgs { action: PostAction::Show { post_id } })) if post_id == id
        ));

        assert!(Cli::try_parse_from(["threadkeep", "post", "show", "not-a-uuid"]).is_err());
    }

    #[test]
    fn test_parse_comment_requires_exactly_one_target() {
        let post = PostId::generate().to_string();
        let parent = CommentId::generate().to_string();

        let none = Cli::try_parse_from(["threadkeep", "comment", "add", "-a", "ann", "-c", "hi"]);
        assert!(none.is_err());

        let both = Cli::try_parse_from([
            "threadkeep", "comment", "add", "--post", &post, "--reply-to", &parent, "-a", "ann",
            "-c", "hi",
        ]);
        assert!(both.is_err());

        let reply = Cli::try_parse_from([
            "threadkeep", "comment", "add", "--reply-to", &parent, "-a", "ann", "-c", "hi",
        ])
        .unwrap();
        match reply.command {
            Some(Commands::Comment(CommentArgs {
                action: CommentAction::Add(args),
            })) => {
                assert!(args.target.post.is_none());
                assert_eq!(args.target.reply_to.map(|id| id.to_string()), Some(parent));
            }
            _ => panic!("Expected comment add"),
        }
    }

    #[test]
    fn test_parse_timeout_must_be_positive() {
        let cli = Cli::try_parse_from(["threadkeep", "--timeout", "5", "post", "list"]).unwrap();
        assert_eq!(cli.timeout, Some(5));
        assert!(Cli::try_parse_from(["threadkeep", "--timeout", "0", "post", "list"]).is_err());
    }
}
