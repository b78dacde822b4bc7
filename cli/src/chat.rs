//! `sender: text` lines, the format the browser chat client puts on the air

use crate::error::{CliError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLine<'a> {
    pub sender: &'a str,
    pub text: &'a str,
}

fn valid_sender(sender: &str) -> bool {
    !sender.is_empty()
        && sender
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
}

pub fn format_line(sender: &str, text: &str) -> Result<String> {
    if !valid_sender(sender) {
        return Err(CliError::InvalidInput(format!(
            "sender {:?} may only contain ASCII letters, digits and '-'",
            sender
        )));
    }
    Ok(format!("{}: {}", sender, text))
}

/// Split a received line into sender and text. The text runs up to the first
/// line break and must not be empty.
pub fn parse_line(line: &str) -> Option<ChatLine<'_>> {
    let (sender, rest) = line.split_once(": ")?;
    if !valid_sender(sender) {
        return None;
    }

    let text = rest
        .split(['\n', '\r', '\u{2028}', '\u{2029}'])
        .next()
        .unwrap_or_default();
    if text.is_empty() {
        return None;
    }

    Some(ChatLine { sender, text })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_line() {
        assert_eq!(format_line("Test", "hello").unwrap(), "Test: hello");
        assert_eq!(format_line("k-9", "").unwrap(), "k-9: ");
        assert!(format_line("two words", "hi").is_err());
        assert!(format_line("", "hi").is_err());
    }

    #[test]
    fn test_parse_line() {
        assert_eq!(
            parse_line("Test: hello there"),
            Some(ChatLine {
                sender: "Test",
                text: "hello there"
            })
        );
        assert_eq!(
            parse_line("a-1: first\nsecond").map(|line| line.text),
            Some("first")
        );
    }

    #[test]
    fn test_parse_rejects_other_text() {
        assert_eq!(parse_line("no separator"), None);
        assert_eq!(parse_line("bad sender!: text"), None);
        assert_eq!(parse_line("Test: "), None);
        assert_eq!(parse_line("Test: \nmore"), None);
        assert_eq!(parse_line(": text"), None);
        assert_eq!(parse_line("a:b: c"), None);
    }
}
