//! Command execution logic.
//!
//! This module contains the implementation of all CLI commands.

use anyhow::Result;

use super::args::{
    CommentAction, CommentAddArgs, CommentArgs, InitArgs, PostAction, PostArgs, PostCreateArgs,
    PostListArgs,
};
use crate::app::App;
use crate::context::OpContext;
use crate::domain::{NewComment, NewPost, PageRequest, PostId, ThreadMode};
use crate::output::{self, OutputMode};

/// Execute the init command
pub async fn execute_init(args: &InitArgs, output_mode: OutputMode) -> Result<()> {
    use crate::commands::init;

    let current_dir = std::env::current_dir()?;
    let result = init::init(&current_dir, args.backend.into()).await?;

    match output_mode {
        OutputMode::Json => {
            output::print_json(&serde_json::json!({
                "threadkeep_dir": result.threadkeep_dir.display().to_string(),
                "config_file": result.config_file.display().to_string(),
                "database_file": result.database_file.as_ref().map(|p| p.display().to_string()),
                "backend": result.backend.to_string(),
            }))?;
        }
        OutputMode::Text if !args.quiet => {
            println!(
                "Initialized threadkeep in {}",
                result.threadkeep_dir.display()
            );
            println!("  Config:   {}", result.config_file.display());
            if let Some(database) = &result.database_file {
                println!("  Database: {}", database.display());
            }
            println!("  Backend:  {}", result.backend);
        }
        OutputMode::Text => {}
    }

    Ok(())
}

/// Execute a `post` subcommand
pub async fn execute_post(
    app: &App,
    ctx: &OpContext,
    args: &PostArgs,
    output_mode: OutputMode,
) -> Result<()> {
    match &args.action {
        PostAction::Create(create) => execute_post_create(app, ctx, create, output_mode).await,
        PostAction::List(list) => execute_post_list(app, ctx, list, output_mode).await,
        PostAction::Show { post_id } => {
            let post = app.service().get_post(ctx, *post_id).await?;
            output::print_post(&post, output_mode)?;
            Ok(())
        }
        PostAction::Close { post_id } => {
            set_commentable(app, ctx, *post_id, false, output_mode).await
        }
        PostAction::Open { post_id } => {
            set_commentable(app, ctx, *post_id, true, output_mode).await
        }
    }
}

async fn execute_post_create(
    app: &App,
    ctx: &OpContext,
    args: &PostCreateArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let new_post = NewPost {
        title: args.title.clone(),
        author: args.author.clone(),
        content: args.content.clone(),
        commentable: !args.closed,
    };

    let post = app.service().create_post(ctx, new_post).await?;
    output::print_post_created(&post, output_mode)?;
    Ok(())
}

async fn execute_post_list(
    app: &App,
    ctx: &OpContext,
    args: &PostListArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let page_request = PageRequest::new(args.offset, args.limit);
    let mode = if args.with_comments {
        ThreadMode::Full
    } else {
        ThreadMode::MetadataOnly
    };

    let page = app.service().list_posts(ctx, &page_request, mode).await?;
    output::print_posts(&page, args.offset, output_mode)?;
    Ok(())
}

async fn set_commentable(
    app: &App,
    ctx: &OpContext,
    post_id: PostId,
    enabled: bool,
    output_mode: OutputMode,
) -> Result<()> {
    app.service().set_commentable(ctx, post_id, enabled).await?;
    output::print_commentable_changed(post_id, enabled, output_mode)?;
    Ok(())
}

/// Execute a `comment` subcommand
pub async fn execute_comment(
    app: &App,
    ctx: &OpContext,
    args: &CommentArgs,
    output_mode: OutputMode,
) -> Result<()> {
    match &args.action {
        CommentAction::Add(add) => execute_comment_add(app, ctx, add, output_mode).await,
    }
}

async fn execute_comment_add(
    app: &App,
    ctx: &OpContext,
    args: &CommentAddArgs,
    output_mode: OutputMode,
) -> Result<()> {
    // clap's argument group guarantees exactly one target; the store re-checks.
    let new_comment = NewComment {
        author: args.author.clone(),
        content: args.content.clone(),
        post_id: args.target.post,
        parent_id: args.target.reply_to,
    };

    let comment = app.service().create_comment(ctx, new_comment).await?;
    output::print_comment_created(&comment, output_mode)?;
    Ok(())
}
