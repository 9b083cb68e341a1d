//! Ordering list parser.
//!
//! An ordering list is a comma-separated sequence of field tokens, each
//! optionally prefixed with `-` for descending order:
//!
//! ```text
//! order → key ("," key)*
//! key   → ["-"] FIELD | (blank)
//! ```
//!
//! Blank keys are skipped, so `""`, `" , "` and `"a,,b"` are all valid.

use crate::{
    ast::{Direction, OrderKey},
    error::ParseError,
};

/// Parses an ordering list into order keys.
///
/// Field tokens are lowercased; whether they name a known field is checked
/// at compile time.
pub fn parse_order(input: &str) -> Result<Vec<OrderKey>, ParseError> {
    let mut keys = Vec::new();
    let mut segment_start = 0;

    for segment in input.split(',') {
        let offset = segment_start;
        segment_start += segment.len() + 1;

        let leading = segment.len() - segment.trim_start().len();
        let mut token = segment.trim();
        let mut token_offset = offset + leading;
        let mut direction = Direction::Ascending;

        if let Some(rest) = token.strip_prefix('-') {
            direction = Direction::Descending;
            let skipped = rest.len() - rest.trim_start().len();
            token = rest.trim_start();
            token_offset += 1 + skipped;
        }

        if token.is_empty() {
            continue;
        }

        if let Some((idx, ch)) = token
            .char_indices()
            .find(|&(_, ch)| !(ch.is_ascii_alphanumeric() || ch == '_'))
        {
            return Err(ParseError::at(
                format!("unexpected character '{ch}' in order field '{token}'"),
                input,
                token_offset + idx,
            ));
        }

        keys.push(OrderKey {
            field: token.to_ascii_lowercase(),
            direction,
        });
    }

    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(field: &str, direction: Direction) -> OrderKey {
        OrderKey {
            field: field.into(),
            direction,
        }
    }

    #[test]
    fn blank_input() {
        assert_eq!(parse_order("").unwrap(), vec![]);
        assert_eq!(parse_order("  ").unwrap(), vec![]);
        assert_eq!(parse_order(" , ,").unwrap(), vec![]);
    }

    #[test]
    fn single_ascending() {
        assert_eq!(
            parse_order("artist").unwrap(),
            vec![key("artist", Direction::Ascending)]
        );
    }

    #[test]
    fn descending_prefix() {
        assert_eq!(
            parse_order("-lastplayed").unwrap(),
            vec![key("lastplayed", Direction::Descending)]
        );
        assert_eq!(
            parse_order("- lastplayed").unwrap(),
            vec![key("lastplayed", Direction::Descending)]
        );
    }

    #[test]
    fn list_with_whitespace_and_blanks() {
        assert_eq!(
            parse_order(" -Ranking ,, album ,track_number").unwrap(),
            vec![
                key("ranking", Direction::Descending),
                key("album", Direction::Ascending),
                key("track_number", Direction::Ascending),
            ]
        );
    }

    #[test]
    fn lone_dash_is_skipped() {
        assert_eq!(
            parse_order("-, year").unwrap(),
            vec![key("year", Direction::Ascending)]
        );
    }

    #[test]
    fn whitespace_inside_token_is_an_error() {
        let err = parse_order("artist, play count").unwrap_err();
        assert_eq!(err.column, 12);
        assert!(err.message.contains("play count"));
    }

    #[test]
    fn double_dash_is_an_error() {
        let err = parse_order("--year").unwrap_err();
        assert_eq!(err.column, 1);
    }
}
