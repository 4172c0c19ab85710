//! Color and styling helpers for CLI output.
//!
//! Semantic Color Theme:
//!   - Success/Open:   green   (open threads, completed actions)
//!   - Error/Closed:   red     (closed threads, failures)
//!   - Info/Reference: cyan    (ids, thread root)
//!   - Accent:         magenta (authors)
//!   - Muted:          dimmed  (field labels, connectors)
//!   - Emphasis:       bold    (titles, section headers)

use colored::Colorize;

use super::OutputConfig;

/// Apply semantic "success" color (green) to text.
pub fn success(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.green().to_string()
}

/// Apply semantic "error" color (red) to text.
pub fn error(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.red().to_string()
}

/// Apply semantic "info" color (cyan) to text.
pub fn info(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.cyan().to_string()
}

/// Colorize a post or comment id (cyan).
pub(crate) fn colorize_id(id: &str, config: &OutputConfig) -> String {
    info(id, config)
}

/// Colorize an author name (magenta).
pub(crate) fn colorize_author(author: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return author.to_string();
    }
    author.magenta().to_string()
}

/// `open` in green or `closed` in red.
pub(crate) fn commentable_badge(commentable: bool, config: &OutputConfig) -> String {
    if commentable {
        success("open", config)
    } else {
        error("closed", config)
    }
}

/// Icon for a post's thread state, with ASCII fallback support.
pub(crate) fn thread_icon(commentable: bool, config: &OutputConfig) -> String {
    let icon = match (config.use_ascii, commentable) {
        (true, true) => "o",
        (true, false) => "x",
        (false, true) => "○",
        (false, false) => "✗",
    };
    if commentable {
        success(icon, config)
    } else {
        error(icon, config)
    }
}

/// Apply dimmed style to text (for labels/field names).
pub(crate) fn dimmed(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.dimmed().to_string()
}

/// Apply bold style to text (for section headers).
pub(crate) fn bold(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.bold().to_string()
}
