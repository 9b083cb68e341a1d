//! Error type for query and order parsing.
//!
//! Both grammars fail fast: the first syntax error aborts parsing and is
//! reported with its line and column in the original input.

use std::{error::Error, fmt};

/// Syntax error with position information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Error message.
    pub message: String,
    /// 1-based line of the error.
    pub line: usize,
    /// 0-based character column within `line`.
    pub column: usize,
    /// Byte offset of the error in `input`.
    pub offset: usize,
    /// The original input string.
    pub input: String,
}

impl ParseError {
    /// Creates an error located at a byte offset of `input`.
    ///
    /// Offsets past the end of the input are clamped to the end.
    pub fn at(message: impl Into<String>, input: &str, offset: usize) -> Self {
        let offset = offset.min(input.len());
        let before = &input[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |idx| idx + 1);
        let column = before[line_start..].chars().count();
        Self {
            message: message.into(),
            line,
            column,
            offset,
            input: input.to_string(),
        }
    }

    /// Creates an error located at the end of `input`.
    pub fn at_end(message: impl Into<String>, input: &str) -> Self {
        Self::at(message, input, input.len())
    }

    /// Formats the error with the offending line and a position indicator.
    pub fn format_with_context(&self) -> String {
        let source_line = self.input.lines().nth(self.line - 1).unwrap_or_default();
        let mut result = String::new();
        result.push_str(&format!("query syntax error: {}\n", self.message));
        result.push_str(&format!("  {source_line}\n"));
        result.push_str(&format!("  {}^", " ".repeat(self.column)));
        if let Some(hint) = self.suggestion() {
            result.push_str(&format!("\nhint: {hint}"));
        }
        result
    }

    /// Returns a suggestion for common errors.
    pub fn suggestion(&self) -> Option<&'static str> {
        let message = self.message.as_str();
        if message.contains("unclosed quote") {
            Some("Add a closing quote (\") to complete the value")
        } else if message.contains("closing parenthesis") {
            Some("Add a closing parenthesis ) to match the opening one")
        } else if message.contains("expected operator") {
            Some("Predicates look like field:value, field=value, field~regexp or field>=value")
        } else if message.contains("nested too deeply") {
            Some("Remove redundant parentheses or repeated NOTs")
        } else if message.contains("range") {
            Some("Ranges look like year:[1990 TO 1999]")
        } else if message.contains("OR") || message.contains("AND") {
            Some("AND and OR require expressions on both sides, e.g. 'genre:rock OR genre:pop'")
        } else {
            None
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}:{} {}", self.line, self.column, self.message)
    }
}

impl Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_on_first_line() {
        let err = ParseError::at("boom", "artist:x )", 9);
        assert_eq!(err.line, 1);
        assert_eq!(err.column, 9);
        assert_eq!(err.to_string(), "line 1:9 boom");
    }

    #[test]
    fn position_on_later_line() {
        let err = ParseError::at("boom", "artist:x\n  )", 11);
        assert_eq!(err.line, 2);
        assert_eq!(err.column, 2);
    }

    #[test]
    fn column_counts_characters_not_bytes() {
        let input = "artist:椎名 )";
        let offset = input.find(')').unwrap();
        let err = ParseError::at("boom", input, offset);
        assert_eq!(err.column, 10);
    }

    #[test]
    fn offset_is_clamped() {
        let err = ParseError::at("boom", "abc", 99);
        assert_eq!(err.offset, 3);
        assert_eq!(err.column, 3);
    }

    #[test]
    fn context_display() {
        let err = ParseError::at("unclosed quote", "album:\"abbey", 6);
        let display = err.format_with_context();
        assert!(display.contains("unclosed quote"));
        assert!(display.contains("album:\"abbey"));
        assert!(display.contains("      ^"));
        assert!(display.contains("hint:"));
    }

    #[test]
    fn or_suggestion() {
        let err = ParseError::at_end("unexpected OR (needs expression before it)", "OR a:b");
        assert!(err.suggestion().unwrap().contains("both sides"));
    }

    #[test]
    fn nesting_suggestion() {
        let err = ParseError::at("query nested too deeply", "((a:1))", 1);
        assert!(err.suggestion().unwrap().contains("parentheses"));
    }

    #[test]
    fn no_suggestion_for_unknown_messages() {
        let err = ParseError::at_end("something else", "");
        assert!(err.suggestion().is_none());
    }
}
