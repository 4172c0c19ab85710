//! CLI input validation functions.
//!
//! These validators are used by clap's `value_parser` attribute to validate
//! user input at parse time, providing immediate feedback for invalid values.

use crate::domain::{CommentId, PostId};

/// Maximum length of a post title
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum length of an author name
pub const MAX_AUTHOR_LENGTH: usize = 100;

/// Validate a post id.
pub fn validate_post_id(s: &str) -> Result<PostId, String> {
    PostId::parse(s.trim()).map_err(|e| e.to_string())
}

/// Validate a comment id.
pub fn validate_comment_id(s: &str) -> Result<CommentId, String> {
    CommentId::parse(s.trim()).map_err(|e| e.to_string())
}

/// Reject control characters other than tab and, when `multiline`, newlines.
fn reject_control_chars(s: &str, field_name: &str, multiline: bool) -> Result<(), String> {
    if let Some(pos) = s.chars().position(|c| {
        let code = c as u32;
        let allowed = code == 0x09 || (multiline && (code == 0x0A || code == 0x0D));
        !allowed && ((code < 0x20) || (0x7F..=0x9F).contains(&code))
    }) {
        return Err(format!(
            "{field_name} contains invalid control character at position {pos}"
        ));
    }
    Ok(())
}

/// Validate a single-line, bounded, non-empty field.
fn validate_line(s: &str, field_name: &str, max_len: usize) -> Result<String, String> {
    let s = s.trim();

    if s.is_empty() {
        return Err(format!("{field_name} cannot be empty"));
    }

    let len = s.chars().count();
    if len > max_len {
        return Err(format!(
            "{field_name} cannot exceed {max_len} characters, got {len} characters"
        ));
    }

    reject_control_chars(s, field_name, false)?;
    Ok(s.to_string())
}

/// Validate a post title.
pub fn validate_title(s: &str) -> Result<String, String> {
    validate_line(s, "Title", MAX_TITLE_LENGTH)
}

/// Validate an author name.
pub fn validate_author(s: &str) -> Result<String, String> {
    validate_line(s, "Author", MAX_AUTHOR_LENGTH)
}

/// Validate post or comment body text.
///
/// Multi-line text is allowed.
pub fn validate_content(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        return Err("Content cannot be empty".to_string());
    }
    reject_control_chars(s, "Content", true)?;
    Ok(s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_validate_post_id() {
        let id = PostId::generate();
        assert_eq!(validate_post_id(&format!("  {id} ")), Ok(id));
        assert!(validate_post_id("proj-abc").is_err());
    }

    #[test]
    fn test_validate_comment_id() {
        let id = CommentId::generate();
        assert_eq!(validate_comment_id(&id.to_string()), Ok(id));
        assert!(validate_comment_id("").is_err());
    }

    #[rstest]
    #[case::plain("Hello world")]
    #[case::tab("Hello\tworld")]
    #[case::unicode("Grüße")]
    fn test_validate_title_valid(#[case] title: &str) {
        assert!(validate_title(title).is_ok());
    }

    #[rstest]
    #[case::empty("", "cannot be empty")]
    #[case::blank("   ", "cannot be empty")]
    #[case::too_long("a".repeat(201), "cannot exceed 200")]
    #[case::newline("line\nbreak", "control character")]
    #[case::escape("bell\u{7}", "control character")]
    fn test_validate_title_invalid(#[case] title: impl AsRef<str>, #[case] expected: &str) {
        let err = validate_title(title.as_ref()).unwrap_err();
        assert!(err.contains(expected), "got: {err}");
    }

    #[test]
    fn test_validate_author_trims() {
        assert_eq!(validate_author("  ann "), Ok("ann".to_string()));
    }

    #[test]
    fn test_validate_content_allows_newlines() {
        assert!(validate_content("first\nsecond\r\nthird").is_ok());
        assert!(validate_content("\n").is_err());
        assert!(validate_content("nul\0").is_err());
    }
}
