//! Query lexer (tokenizer).
//!
//! Converts a query string into a stream of positioned tokens for the parser.
//! The lexer is mode-sensitive: right after a field operator it reads a raw
//! value, and inside `[...]` it reads range bounds.

use std::{iter::Peekable, str::CharIndices};

use crate::{ast::Operator, error::ParseError};

/// A token in the query language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A field name immediately followed by an operator (e.g. `artist` in `artist:x`).
    Field(String),

    /// A comparison operator.
    Op(Operator),

    /// A value, with surrounding quotes preserved if it was quoted.
    Value(String),

    /// Left parenthesis.
    LParen,

    /// Right parenthesis.
    RParen,

    /// Opening bracket of a range.
    LBracket,

    /// Closing bracket of a range.
    RBracket,

    /// The TO keyword inside a range.
    To,

    /// The AND keyword.
    And,

    /// The OR keyword.
    Or,

    /// The NOT keyword.
    Not,
}

/// A token together with the byte offset where it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexeme {
    /// The token.
    pub token: Token,
    /// Byte offset of the token in the input.
    pub offset: usize,
}

/// What the lexer expects to read next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Keywords, parentheses and field names.
    Expression,
    /// A value directly after an operator.
    Value,
    /// Range bounds and `TO` until the closing bracket.
    Range,
}

/// Tokenizes a query string.
struct Lexer<'a> {
    /// The original input string.
    input: &'a str,
    /// Character iterator with one-character lookahead.
    chars: Peekable<CharIndices<'a>>,
    /// Current lexing mode.
    mode: Mode,
    /// Offset of the opening bracket of the range being read.
    range_start: usize,
    /// Tokens produced so far.
    tokens: Vec<Lexeme>,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input.
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
            mode: Mode::Expression,
            range_start: 0,
            tokens: Vec::new(),
        }
    }

    /// Creates an error at a specific position.
    fn error_at(&self, message: impl Into<String>, position: usize) -> ParseError {
        ParseError::at(message, self.input, position)
    }

    /// Current byte position in the input.
    fn position(&mut self) -> usize {
        self.chars.peek().map_or(self.input.len(), |&(idx, _)| idx)
    }

    /// Records a token starting at `offset`.
    fn push(&mut self, token: Token, offset: usize) {
        self.tokens.push(Lexeme { token, offset });
    }

    /// Tokenizes the entire input, returning all tokens or an error.
    fn tokenize(mut self) -> Result<Vec<Lexeme>, ParseError> {
        loop {
            match self.mode {
                Mode::Value => self.read_operand()?,
                Mode::Range => {
                    self.skip_whitespace();
                    if self.chars.peek().is_none() {
                        return Err(self.error_at("unclosed range, expected ']'", self.range_start));
                    }
                    self.read_range_part()?;
                }
                Mode::Expression => {
                    self.skip_whitespace();
                    let Some(&(offset, ch)) = self.chars.peek() else {
                        break;
                    };
                    match ch {
                        '(' => {
                            self.advance();
                            self.push(Token::LParen, offset);
                        }
                        ')' => {
                            self.advance();
                            self.push(Token::RParen, offset);
                        }
                        _ => self.read_word()?,
                    }
                }
            }
        }

        Ok(self.tokens)
    }

    /// Reads a keyword, or a field name together with its operator.
    fn read_word(&mut self) -> Result<(), ParseError> {
        let start = self.position();
        let mut word = String::new();

        while let Some(&(_, ch)) = self.chars.peek() {
            if !is_field_char(ch) {
                break;
            }
            word.push(ch);
            self.advance();
        }

        if let Some(op_offset) = self.operator_ahead() {
            if word.is_empty() {
                return Err(self.error_at("expected field name before operator", op_offset));
            }
            self.push(Token::Field(word), start);
            let op = self.read_operator();
            self.push(Token::Op(op), op_offset);
            self.mode = Mode::Value;
            return Ok(());
        }

        // Not a field: the whole run must be a keyword.
        let run_end = self.skip_run();
        let input = self.input;
        let run = &input[start..run_end];
        let token = if run.eq_ignore_ascii_case("AND") {
            Token::And
        } else if run.eq_ignore_ascii_case("OR") {
            Token::Or
        } else if run.eq_ignore_ascii_case("NOT") {
            Token::Not
        } else if word.is_empty() {
            let ch = run.chars().next().unwrap_or(' ');
            return Err(self.error_at(format!("unexpected character '{ch}'"), start));
        } else {
            return Err(self.error_at(format!("expected operator after '{run}'"), run_end));
        };
        self.push(token, start);
        Ok(())
    }

    /// Returns the offset of an operator character at the current position.
    fn operator_ahead(&mut self) -> Option<usize> {
        match self.chars.peek() {
            Some(&(idx, ':' | '=' | '~' | '<' | '>')) => Some(idx),
            _ => None,
        }
    }

    /// Consumes an operator. Must only be called after `operator_ahead`.
    fn read_operator(&mut self) -> Operator {
        let Some((_, ch)) = self.chars.next() else {
            return Operator::FuzzyEq;
        };
        let or_equal = matches!(self.chars.peek(), Some(&(_, '=')));
        match ch {
            '=' => Operator::Eq,
            '~' => Operator::Regexp,
            '<' if or_equal => {
                self.advance();
                Operator::Lte
            }
            '<' => Operator::Lt,
            '>' if or_equal => {
                self.advance();
                Operator::Gte
            }
            '>' => Operator::Gt,
            _ => Operator::FuzzyEq,
        }
    }

    /// Reads the value (or range opening) right after an operator.
    fn read_operand(&mut self) -> Result<(), ParseError> {
        let offset = self.position();
        match self.chars.peek() {
            Some(&(_, '[')) => {
                self.advance();
                self.push(Token::LBracket, offset);
                self.range_start = offset;
                self.mode = Mode::Range;
                Ok(())
            }
            Some(&(_, '"')) => {
                let value = self.read_quoted()?;
                self.push(Token::Value(value), offset);
                self.mode = Mode::Expression;
                Ok(())
            }
            Some(&(_, ch)) if !ch.is_whitespace() && ch != '(' && ch != ')' => {
                let value = self.read_bare(|c| c.is_whitespace() || c == '(' || c == ')');
                self.push(Token::Value(value), offset);
                self.mode = Mode::Expression;
                Ok(())
            }
            _ => Err(self.error_at("expected value after operator", offset)),
        }
    }

    /// Reads one element inside a range: a bound, `TO`, or the closing bracket.
    fn read_range_part(&mut self) -> Result<(), ParseError> {
        let offset = self.position();
        match self.chars.peek() {
            Some(&(_, ']')) => {
                self.advance();
                self.push(Token::RBracket, offset);
                self.mode = Mode::Expression;
            }
            Some(&(_, '"')) => {
                let value = self.read_quoted()?;
                self.push(Token::Value(value), offset);
            }
            _ => {
                let value = self.read_bare(|c| c.is_whitespace() || c == ']');
                if value.eq_ignore_ascii_case("TO") {
                    self.push(Token::To, offset);
                } else {
                    self.push(Token::Value(value), offset);
                }
            }
        }
        Ok(())
    }

    /// Reads a double-quoted value, keeping the quotes.
    fn read_quoted(&mut self) -> Result<String, ParseError> {
        let start = self.position();
        let mut value = String::from('"');
        self.advance(); // consume opening quote

        loop {
            match self.chars.next() {
                Some((_, '"')) => {
                    value.push('"');
                    return Ok(value);
                }
                Some((_, ch)) => value.push(ch),
                None => return Err(self.error_at("unclosed quote", start)),
            }
        }
    }

    /// Reads characters until `stop` matches or the input ends.
    fn read_bare(&mut self, stop: impl Fn(char) -> bool) -> String {
        let mut value = String::new();
        while let Some(&(_, ch)) = self.chars.peek() {
            if stop(ch) {
                break;
            }
            value.push(ch);
            self.advance();
        }
        value
    }

    /// Skips to the end of the current whitespace/paren delimited run.
    fn skip_run(&mut self) -> usize {
        while let Some(&(_, ch)) = self.chars.peek() {
            if ch.is_whitespace() || ch == '(' || ch == ')' {
                break;
            }
            self.advance();
        }
        self.position()
    }

    /// Skips whitespace characters.
    fn skip_whitespace(&mut self) {
        while let Some(&(_, ch)) = self.chars.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Advances to the next character.
    fn advance(&mut self) {
        self.chars.next();
    }
}

/// Characters allowed in field names.
fn is_field_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

/// Convenience function to tokenize a query string.
pub fn tokenize(input: &str) -> Result<Vec<Lexeme>, ParseError> {
    Lexer::new(input).tokenize()
}
