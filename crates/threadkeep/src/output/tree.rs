//! Comment thread rendering for `threadkeep post show`.

use std::io::{self, Write};

use crate::domain::{Comment, Post};

use super::color::{bold, colorize_author, colorize_id, commentable_badge, dimmed, info};
use super::{wrap_text, OutputConfig};

/// Render a post header and its thread with ASCII/Unicode connectors.
///
/// Renders a tree like:
/// ```text
/// ◆ Hello world [open]
/// ├── ann 6f1c…
/// │   Welcome!
/// │   └── bob 9a02…
/// │       Thanks
/// └── carol 1d7e…
///     Nice post
/// ```
pub(crate) fn write_thread<W: Write>(
    w: &mut W,
    post: &Post,
    width: usize,
    config: &OutputConfig,
) -> io::Result<()> {
    let root_icon = if config.use_ascii { "*" } else { "◆" };
    writeln!(
        w,
        "{} {} [{}]",
        bold(&info(root_icon, config), config),
        bold(&post.title, config),
        commentable_badge(post.commentable, config)
    )?;

    write_comments(w, &post.comments, width, config)
}

/// Render a comment forest.
///
/// Walks the forest with an explicit stack, so thread depth is bounded by
/// memory rather than the call stack.
fn write_comments<W: Write>(
    w: &mut W,
    roots: &[Comment],
    width: usize,
    config: &OutputConfig,
) -> io::Result<()> {
    let (branch, corner, pipe, space) = if config.use_ascii {
        ("|-- ", "`-- ", "|   ", "    ")
    } else {
        ("├── ", "└── ", "│   ", "    ")
    };

    // (comment, prefix inherited from ancestors, is last sibling)
    let mut stack: Vec<(&Comment, String, bool)> = roots
        .iter()
        .enumerate()
        .rev()
        .map(|(i, c)| (c, String::new(), i + 1 == roots.len()))
        .collect();

    while let Some((comment, prefix, is_last)) = stack.pop() {
        let connector = if is_last { corner } else { branch };
        writeln!(
            w,
            "{}{} {}",
            dimmed(&format!("{prefix}{connector}"), config),
            colorize_author(&comment.author, config),
            colorize_id(&comment.id.to_string(), config)
        )?;

        let child_prefix = format!("{prefix}{}", if is_last { space } else { pipe });
        let body_width = width.saturating_sub(child_prefix.chars().count()).max(20);
        for line in wrap_text(&comment.content, body_width) {
            writeln!(w, "{}{}", dimmed(&child_prefix, config), line)?;
        }

        let count = comment.children.len();
        for (i, child) in comment.children.iter().enumerate().rev() {
            stack.push((child, child_prefix.clone(), i + 1 == count));
        }
    }

    Ok(())
}
