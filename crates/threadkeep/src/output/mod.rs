//! Output formatting for CLI commands.
//!
//! This module provides utilities for formatting command output in both
//! human-readable text format and JSON format for programmatic use.
//!
//! Submodules:
//! - [`color`]: Color and styling helpers (semantic colors, icons)
//! - [`tree`]: Comment thread rendering with ASCII/Unicode connectors

pub mod color;
mod tree;

use crate::domain::{Comment, Page, Post, PostId};
use serde::Serialize;
use std::env;
use std::io::{self, Write};

pub use color::{error, info, success};

use color::{bold, colorize_author, colorize_id, commentable_badge, dimmed, thread_icon};

// ============================================================================
// Output Configuration
// ============================================================================

const DEFAULT_TERMINAL_WIDTH: u16 = 80;
const DEFAULT_MAX_CONTENT_WIDTH: usize = 100;

/// Configuration for output formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    /// Maximum content width for text wrapping.
    pub max_width: usize,
    /// Whether to use ASCII-only icons instead of Unicode.
    pub use_ascii: bool,
    /// Whether to use colors in output.
    pub use_colors: bool,
}

impl OutputConfig {
    /// Create a new OutputConfig with explicit values.
    pub fn new(max_width: usize, use_ascii: bool, use_colors: bool) -> Self {
        Self {
            max_width,
            use_ascii,
            use_colors,
        }
    }

    /// Create an OutputConfig by reading from environment variables.
    ///
    /// Reads:
    /// - `THREADKEEP_MAX_WIDTH`: Maximum content width (default: 100)
    /// - `THREADKEEP_ASCII`: Set to "1" or "true" for ASCII-only icons
    /// - `NO_COLOR`: Standard env var to disable colors (any value disables colors)
    /// - `THREADKEEP_COLOR`: Set to "0" or "false" to disable colors
    pub fn from_env() -> Self {
        let max_width = match env::var("THREADKEEP_MAX_WIDTH") {
            Ok(s) if !s.is_empty() => match s.parse() {
                Ok(width) => width,
                Err(_) => {
                    tracing::warn!(
                        env_var = "THREADKEEP_MAX_WIDTH",
                        value = %s,
                        default = DEFAULT_MAX_CONTENT_WIDTH,
                        "Invalid value, using default"
                    );
                    DEFAULT_MAX_CONTENT_WIDTH
                }
            },
            _ => DEFAULT_MAX_CONTENT_WIDTH,
        };

        let use_ascii = env::var("THREADKEEP_ASCII")
            .is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));

        // Respect NO_COLOR standard (https://no-color.org/)
        let use_colors = env::var("NO_COLOR").is_err()
            && env::var("THREADKEEP_COLOR")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true);

        Self {
            max_width,
            use_ascii,
            use_colors,
        }
    }

    /// Effective wrapping width for the current terminal.
    fn width(&self) -> usize {
        get_terminal_width().min(self.max_width)
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_CONTENT_WIDTH,
            use_ascii: false,
            use_colors: true,
        }
    }
}

/// Get the current terminal width, falling back to default if detection fails.
fn get_terminal_width() -> usize {
    terminal_size::terminal_size()
        .map_or(usize::from(DEFAULT_TERMINAL_WIDTH), |(w, _)| usize::from(w.0))
}

/// Wrap text to `max_width`, keeping blank lines.
pub(crate) fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    text.lines()
        .flat_map(|line| {
            if line.trim().is_empty() {
                vec![String::new()]
            } else {
                textwrap::wrap(line, max_width)
                    .into_iter()
                    .map(std::borrow::Cow::into_owned)
                    .collect()
            }
        })
        .collect()
}

/// Output format mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text format
    Text,
    /// JSON format for programmatic use
    Json,
}

// ============================================================================
// Public Dispatch Functions
// ============================================================================

/// Print any serializable value as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    write_json(&mut handle, value)
}

fn write_json<W: Write, T: Serialize>(w: &mut W, value: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(w, "{json}")
}

/// Print a post with its full thread (for `post show`).
pub fn print_post(post: &Post, mode: OutputMode) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let config = OutputConfig::from_env();

    match mode {
        OutputMode::Text => write_post_details(&mut handle, post, &config),
        OutputMode::Json => write_json(&mut handle, post),
    }
}

/// Print one page of posts (for `post list`).
pub fn print_posts(page: &Page<Post>, offset: i64, mode: OutputMode) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let config = OutputConfig::from_env();

    match mode {
        OutputMode::Text => write_posts(&mut handle, page, offset, &config),
        OutputMode::Json => write_json(&mut handle, page),
    }
}

/// Print a newly created post.
pub fn print_post_created(post: &Post, mode: OutputMode) -> io::Result<()> {
    match mode {
        OutputMode::Json => print_json(post),
        OutputMode::Text => {
            let config = OutputConfig::from_env();
            println!(
                "{} {}",
                success("Created post:", &config),
                colorize_id(&post.id.to_string(), &config)
            );
            Ok(())
        }
    }
}

/// Print a newly created comment.
pub fn print_comment_created(comment: &Comment, mode: OutputMode) -> io::Result<()> {
    match mode {
        OutputMode::Json => print_json(comment),
        OutputMode::Text => {
            let config = OutputConfig::from_env();
            let what = if comment.parent_id.is_some() {
                "Added reply:"
            } else {
                "Added comment:"
            };
            println!(
                "{} {} {} {}",
                success(what, &config),
                colorize_id(&comment.id.to_string(), &config),
                dimmed("on post", &config),
                colorize_id(&comment.post_id.to_string(), &config)
            );
            Ok(())
        }
    }
}

/// Print the outcome of opening or closing a post.
pub fn print_commentable_changed(id: PostId, commentable: bool, mode: OutputMode) -> io::Result<()> {
    match mode {
        OutputMode::Json => print_json(&serde_json::json!({
            "id": id,
            "commentable": commentable,
        })),
        OutputMode::Text => {
            let config = OutputConfig::from_env();
            println!(
                "Post {} is now {} for comments",
                colorize_id(&id.to_string(), &config),
                commentable_badge(commentable, &config)
            );
            Ok(())
        }
    }
}

// ============================================================================
// Text Formatting
// ============================================================================

fn write_post_summary<W: Write>(w: &mut W, post: &Post, config: &OutputConfig) -> io::Result<()> {
    writeln!(
        w,
        "{} {} {}",
        thread_icon(post.commentable, config),
        colorize_id(&post.id.to_string(), config),
        bold(&post.title, config)
    )?;
    writeln!(
        w,
        "  {} {}",
        dimmed("Author:", config),
        colorize_author(&post.author, config)
    )
}

fn write_post_details<W: Write>(w: &mut W, post: &Post, config: &OutputConfig) -> io::Result<()> {
    let width = config.width();

    write_post_summary(w, post, config)?;
    writeln!(
        w,
        "  {} {}",
        dimmed("Comments:", config),
        commentable_badge(post.commentable, config)
    )?;
    writeln!(w)?;
    for line in wrap_text(&post.content, width.saturating_sub(2)) {
        writeln!(w, "  {line}")?;
    }
    writeln!(w)?;

    let count = post.comment_count();
    writeln!(
        w,
        "{}",
        bold(&format!("Thread ({count} comment{})", if count == 1 { "" } else { "s" }), config)
    )?;
    tree::write_thread(w, post, width, config)
}

fn write_posts<W: Write>(
    w: &mut W,
    page: &Page<Post>,
    offset: i64,
    config: &OutputConfig,
) -> io::Result<()> {
    if page.items.is_empty() {
        writeln!(w, "No posts found.")?;
        return Ok(());
    }

    let width = config.width();
    for post in &page.items {
        write_post_summary(w, post, config)?;
        if !post.comments.is_empty() {
            tree::write_thread(w, post, width, config)?;
        }
    }

    if page.has_more {
        let shown = i64::try_from(page.items.len()).unwrap_or(i64::MAX);
        writeln!(w)?;
        writeln!(
            w,
            "{}",
            dimmed(
                &format!("More posts available; use --offset {}", offset.saturating_add(shown)),
                config
            )
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() -> OutputConfig {
        OutputConfig::new(80, false, false)
    }

    fn post(title: &str) -> Post {
        Post {
            id: PostId::generate(),
            title: title.to_string(),
            author: "ann".to_string(),
            content: "Some words about things".to_string(),
            commentable: true,
            comments: Vec::new(),
        }
    }

    #[test]
    fn test_wrap_text_keeps_blank_lines() {
        let lines = wrap_text("one two three\n\nfour", 8);
        assert_eq!(lines, vec!["one two", "three", "", "four"]);
    }

    #[test]
    fn test_write_posts_empty() {
        let mut out = Vec::new();
        write_posts(&mut out, &Page::empty(), 0, &plain()).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "No posts found.\n");
    }

    #[test]
    fn test_write_posts_hints_next_offset() {
        let page = Page {
            items: vec![post("first"), post("second")],
            has_more: true,
        };
        let mut out = Vec::new();
        write_posts(&mut out, &page, 4, &plain()).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("first"));
        assert!(text.contains("Author: ann"));
        assert!(text.contains("--offset 6"));
    }

    #[test]
    fn test_write_post_details_counts_comments() {
        let mut out = Vec::new();
        write_post_details(&mut out, &post("solo"), &plain()).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Comments: open"));
        assert!(text.contains("Thread (0 comments)"));
    }

    #[test]
    fn test_write_json_is_pretty() {
        let mut out = Vec::new();
        write_json(&mut out, &serde_json::json!({"a": 1})).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "{\n  \"a\": 1\n}\n");
    }
}
