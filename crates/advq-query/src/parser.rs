//! Query parser.
//!
//! Parses a token stream into a query AST using recursive descent.
//!
//! # Grammar
//!
//! ```text
//! query      → or_expr
//! or_expr    → and_expr ("OR" and_expr)*
//! and_expr   → unary (["AND"] unary)*
//! unary      → "NOT" unary | primary
//! primary    → "(" or_expr ")" | predicate+
//! predicate  → FIELD OP VALUE | FIELD (":" | "=") "[" VALUE "TO" VALUE "]"
//! ```
//!
//! # Precedence (highest to lowest)
//!
//! 1. Grouping: `(...)`
//! 2. Juxtaposed predicates: `artist:a year>1990`
//! 3. Negation: `NOT`
//! 4. AND (explicit keyword, or juxtaposition with groups and negations)
//! 5. OR (explicit keyword)

use std::mem;

use crate::{
    ast::{Operator, Predicate, QueryExpr},
    error::ParseError,
    lexer::{Lexeme, Token, tokenize},
};

/// Deepest allowed nesting of groups and negations.
pub const MAX_DEPTH: usize = 128;

/// Recursive descent parser for query expressions.
struct Parser<'a> {
    /// The original input, for error positions.
    input: &'a str,
    /// Token stream to parse.
    tokens: Vec<Lexeme>,
    /// Current position in token stream.
    position: usize,
    /// Open groups and negations around the current token.
    depth: usize,
}

impl<'a> Parser<'a> {
    /// Creates a new parser from a token stream.
    fn new(input: &'a str, tokens: Vec<Lexeme>) -> Self {
        Self {
            input,
            tokens,
            position: 0,
            depth: 0,
        }
    }

    /// Parses the token stream into a query expression.
    fn parse(mut self) -> Result<QueryExpr, ParseError> {
        if self.tokens.is_empty() {
            return Err(ParseError::at_end("expected expression", self.input));
        }

        let expr = self.parse_or_expr()?;

        if let Some(token) = self.peek() {
            let message = match token {
                Token::RParen => "unexpected closing parenthesis".to_string(),
                other => format!("unexpected token: {other:?}"),
            };
            return Err(self.error_here(message));
        }

        Ok(expr)
    }

    /// Parses: or_expr → and_expr ("OR" and_expr)*
    fn parse_or_expr(&mut self) -> Result<QueryExpr, ParseError> {
        let mut exprs = vec![self.parse_and_expr()?];

        while self.check(&Token::Or) {
            self.advance(); // consume OR
            exprs.push(self.parse_and_expr()?);
        }

        Ok(QueryExpr::or(exprs))
    }

    /// Parses: and_expr → unary (["AND"] unary)*
    fn parse_and_expr(&mut self) -> Result<QueryExpr, ParseError> {
        let mut exprs = vec![self.parse_unary()?];

        loop {
            if self.check(&Token::And) {
                self.advance(); // consume AND
                exprs.push(self.parse_unary()?);
            } else if self.can_start_unary() {
                exprs.push(self.parse_unary()?);
            } else {
                break;
            }
        }

        Ok(QueryExpr::and(exprs))
    }

    /// Checks if the current token can start a unary expression.
    fn can_start_unary(&self) -> bool {
        matches!(
            self.peek(),
            Some(Token::Field(_)) | Some(Token::Not) | Some(Token::LParen)
        )
    }

    /// Parses: unary → "NOT" unary | primary
    fn parse_unary(&mut self) -> Result<QueryExpr, ParseError> {
        if self.check(&Token::Not) {
            self.descend()?;
            self.advance(); // consume NOT
            let expr = self.parse_unary()?;
            self.depth -= 1;
            return Ok(QueryExpr::not(expr));
        }

        self.parse_primary()
    }

    /// Parses: primary → "(" or_expr ")" | predicate+
    fn parse_primary(&mut self) -> Result<QueryExpr, ParseError> {
        match self.peek().cloned() {
            Some(Token::LParen) => self.parse_group(),
            Some(Token::Field(_)) => {
                let mut predicates = vec![self.parse_predicate()?];
                while matches!(self.peek(), Some(Token::Field(_))) {
                    predicates.push(self.parse_predicate()?);
                }
                Ok(QueryExpr::Predicates(predicates))
            }
            Some(Token::RParen) => Err(self.error_here("unexpected closing parenthesis")),
            Some(Token::Or) => Err(self.error_here("unexpected OR (needs expression before it)")),
            Some(Token::And) => {
                Err(self.error_here("unexpected AND (needs expression before it)"))
            }
            Some(other) => {
                let message = format!("unexpected token: {other:?}");
                Err(self.error_here(message))
            }
            None => Err(ParseError::at_end("unexpected end of query", self.input)),
        }
    }

    /// Parses a parenthesized group, consuming the surrounding parentheses.
    fn parse_group(&mut self) -> Result<QueryExpr, ParseError> {
        let open = self.offset_here();
        self.descend()?;
        self.advance(); // consume (

        if self.check(&Token::RParen) {
            return Err(self.error_here("expected expression inside parentheses"));
        }

        let inner = self.parse_or_expr()?;

        if !self.check(&Token::RParen) {
            let message = "expected closing parenthesis";
            return Err(match self.peek() {
                Some(_) => self.error_here(message),
                None => ParseError::at(message, self.input, open),
            });
        }
        self.advance(); // consume )
        self.depth -= 1;

        Ok(QueryExpr::bracket(inner))
    }

    /// Parses a single predicate starting at a field token.
    fn parse_predicate(&mut self) -> Result<Predicate, ParseError> {
        let Some(Token::Field(field)) = self.peek().cloned() else {
            return Err(self.error_here("expected field name"));
        };
        self.advance();

        let Some(Token::Op(op)) = self.peek().cloned() else {
            let message = format!("expected operator after '{field}'");
            return Err(self.error_here(message));
        };
        self.advance();

        match self.peek().cloned() {
            Some(Token::Value(value)) => {
                self.advance();
                Ok(Predicate::Compare { field, op, value })
            }
            Some(Token::LBracket) => {
                if !matches!(op, Operator::FuzzyEq | Operator::Eq) {
                    let message = format!("range requires ':' or '=', found '{op}'");
                    return Err(self.error_here(message));
                }
                self.advance(); // consume [
                let low = self.expect_range_value("expected lower bound in range")?;
                if !self.check(&Token::To) {
                    return Err(self.error_here("expected TO in range"));
                }
                self.advance(); // consume TO
                let high = self.expect_range_value("expected upper bound in range")?;
                if !self.check(&Token::RBracket) {
                    return Err(self.error_here("expected ']' to close range"));
                }
                self.advance(); // consume ]
                Ok(Predicate::Between { field, low, high })
            }
            _ => Err(self.error_here(format!("expected value after '{field}{op}'"))),
        }
    }

    /// Enters one more level of nesting at the current token.
    fn descend(&mut self) -> Result<(), ParseError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error_here("query nested too deeply"));
        }
        self.depth += 1;
        Ok(())
    }

    /// Consumes a value token inside a range.
    fn expect_range_value(&mut self, message: &str) -> Result<String, ParseError> {
        match self.peek().cloned() {
            Some(Token::Value(value)) => {
                self.advance();
                Ok(value)
            }
            _ => Err(self.error_here(message)),
        }
    }

    /// Creates an error at the current token, or at the end of input.
    fn error_here(&self, message: impl Into<String>) -> ParseError {
        ParseError::at(message, self.input, self.offset_here())
    }

    /// Byte offset of the current token, or the input length at the end.
    fn offset_here(&self) -> usize {
        self.tokens
            .get(self.position)
            .map_or(self.input.len(), |lexeme| lexeme.offset)
    }

    /// Returns the current token without consuming it.
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position).map(|lexeme| &lexeme.token)
    }

    /// Checks if the current token matches the given token.
    fn check(&self, token: &Token) -> bool {
        self.peek()
            .is_some_and(|t| mem::discriminant(t) == mem::discriminant(token))
    }

    /// Advances to the next token.
    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }
}

/// Parses a query string into an AST.
///
/// Blank input is an error: there is no empty query expression.
pub fn parse(input: &str) -> Result<QueryExpr, ParseError> {
    let tokens = tokenize(input)?;
    Parser::new(input, tokens).parse()
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    fn fuzzy(field: &str, value: &str) -> Predicate {
        Predicate::compare(field, Operator::FuzzyEq, value)
    }

    fn preds(list: Vec<Predicate>) -> QueryExpr {
        QueryExpr::Predicates(list)
    }

    fn one(field: &str, value: &str) -> QueryExpr {
        preds(vec![fuzzy(field, value)])
    }

    fn not(e: QueryExpr) -> QueryExpr {
        QueryExpr::not(e)
    }

    fn bracket(e: QueryExpr) -> QueryExpr {
        QueryExpr::bracket(e)
    }

    #[test]
    fn empty_query_is_an_error() {
        let err = parse("").unwrap_err();
        assert!(err.message.contains("expected expression"));
        assert!(parse("   ").is_err());
    }

    #[test]
    fn single_predicate() {
        assert_eq!(parse("artist:beatles").unwrap(), one("artist", "beatles"));
    }

    #[test]
    fn juxtaposed_predicates_form_one_list() {
        assert_eq!(
            parse("artist:queen year>1980 starred:y").unwrap(),
            preds(vec![
                fuzzy("artist", "queen"),
                Predicate::compare("year", Operator::Gt, "1980"),
                fuzzy("starred", "y"),
            ])
        );
    }

    #[test]
    fn explicit_and() {
        assert_eq!(
            parse("artist:queen AND album:jazz").unwrap(),
            QueryExpr::And(vec![one("artist", "queen"), one("album", "jazz")])
        );
    }

    #[test]
    fn simple_or() {
        assert_eq!(
            parse("genre:rock OR genre:pop").unwrap(),
            QueryExpr::Or(vec![one("genre", "rock"), one("genre", "pop")])
        );
    }

    #[test]
    fn chained_or() {
        assert_eq!(
            parse("a:1 OR b:2 OR c:3").unwrap(),
            QueryExpr::Or(vec![one("a", "1"), one("b", "2"), one("c", "3")])
        );
    }

    #[test]
    fn and_binds_tighter_than_or() {
        assert_eq!(
            parse("a:1 AND b:2 OR c:3").unwrap(),
            QueryExpr::Or(vec![
                QueryExpr::And(vec![one("a", "1"), one("b", "2")]),
                one("c", "3")
            ])
        );
    }

    #[test]
    fn not_predicate() {
        assert_eq!(parse("NOT starred:y").unwrap(), not(one("starred", "y")));
    }

    #[test]
    fn not_bracket() {
        assert_eq!(
            parse("NOT (artist:queen)").unwrap(),
            not(bracket(one("artist", "queen")))
        );
    }

    #[test]
    fn double_negation() {
        assert_eq!(parse("NOT NOT a:1").unwrap(), not(not(one("a", "1"))));
    }

    #[test]
    fn group_juxtaposed_with_predicates() {
        assert_eq!(
            parse("artist:queen (year<1980 OR starred:y)").unwrap(),
            QueryExpr::And(vec![
                one("artist", "queen"),
                bracket(QueryExpr::Or(vec![
                    preds(vec![Predicate::compare("year", Operator::Lt, "1980")]),
                    one("starred", "y"),
                ])),
            ])
        );
    }

    #[test]
    fn nested_groups() {
        assert_eq!(
            parse("((a:1))").unwrap(),
            bracket(bracket(one("a", "1")))
        );
    }

    #[test]
    fn between() {
        assert_eq!(
            parse("year:[1990 TO 1999]").unwrap(),
            preds(vec![Predicate::between("year", "1990", "1999")])
        );
    }

    #[test]
    fn between_with_exact_operator_and_other_predicates() {
        assert_eq!(
            parse("created=[2020-01-01 TO 2020-12-31] genre:jazz").unwrap(),
            preds(vec![
                Predicate::between("created", "2020-01-01", "2020-12-31"),
                fuzzy("genre", "jazz"),
            ])
        );
    }

    #[test]
    fn quoted_values() {
        assert_eq!(
            parse("album:\"abbey road\"").unwrap(),
            one("album", "\"abbey road\"")
        );
    }

    #[test]
    fn error_unclosed_paren() {
        let err = parse("(artist:queen").unwrap_err();
        assert!(err.message.contains("closing parenthesis"));
        assert_eq!(err.column, 0);
    }

    #[test]
    fn error_unexpected_rparen() {
        let err = parse("artist:queen)").unwrap_err();
        assert!(err.message.contains("unexpected closing parenthesis"));
        assert_eq!((err.line, err.column), (1, 12));
    }

    #[test]
    fn error_empty_group() {
        let err = parse("()").unwrap_err();
        assert!(err.message.contains("inside parentheses"));
    }

    #[test]
    fn error_or_at_start() {
        let err = parse("OR a:1").unwrap_err();
        assert!(err.message.contains("OR"));
        assert_eq!(err.column, 0);
    }

    #[test]
    fn error_or_at_end() {
        let err = parse("a:1 OR").unwrap_err();
        assert!(err.message.contains("end of query"));
        assert_eq!(err.column, 6);
    }

    #[test]
    fn error_and_at_end() {
        let err = parse("a:1 AND").unwrap_err();
        assert!(err.message.contains("end of query"));
    }

    #[test]
    fn error_dangling_not() {
        let err = parse("a:1 NOT").unwrap_err();
        assert!(err.message.contains("end of query"));
    }

    #[test]
    fn error_range_with_comparison_operator() {
        let err = parse("year>[1 TO 2]").unwrap_err();
        assert!(err.message.contains("range requires"));
    }

    #[test]
    fn error_range_without_to() {
        let err = parse("year:[1 2]").unwrap_err();
        assert!(err.message.contains("expected TO"));
        assert_eq!(err.column, 8);
    }

    #[test]
    fn error_range_missing_upper_bound() {
        let err = parse("year:[1 TO]").unwrap_err();
        assert!(err.message.contains("upper bound"));
    }

    #[test]
    fn error_range_extra_bound() {
        let err = parse("year:[1 TO 2 3]").unwrap_err();
        assert!(err.message.contains("']'"));
    }

    #[test]
    fn error_reports_line_and_column() {
        let err = parse("artist:queen\n  OR )").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.column, 5);
    }

    #[test]
    fn query_string_round_trip() {
        let queries = [
            "artist:queen year>1980",
            "NOT (artist:queen) OR starred:y",
            "a:1 AND (b:2 OR c~\"x y\") AND d:[1 TO 2]",
        ];
        for query in queries {
            let expr = parse(query).unwrap();
            assert_eq!(parse(&expr.to_query_string()).unwrap(), expr, "{query}");
        }
    }

    #[test]
    fn nesting_up_to_the_limit_parses() {
        let query = format!("{}artist:x{}", "(".repeat(MAX_DEPTH), ")".repeat(MAX_DEPTH));
        assert!(parse(&query).is_ok());

        let negations = format!("{}artist:x", "NOT ".repeat(MAX_DEPTH));
        assert!(parse(&negations).is_ok());
    }

    #[test]
    fn deeply_nested_groups_are_an_error() {
        let query = format!("{}artist:x{}", "(".repeat(10_000), ")".repeat(10_000));
        let err = parse(&query).unwrap_err();
        assert_eq!(err.message, "query nested too deeply");
        assert_eq!(err.offset, MAX_DEPTH);
    }

    #[test]
    fn deeply_nested_negations_are_an_error() {
        let query = format!("{}artist:x", "NOT ".repeat(10_000));
        let err = parse(&query).unwrap_err();
        assert_eq!(err.message, "query nested too deeply");
        assert_eq!(err.offset, MAX_DEPTH * 4);
    }

    #[test]
    fn mixed_nesting_counts_toward_one_limit() {
        let query = format!("{}artist:x{}", "NOT (".repeat(MAX_DEPTH), ")".repeat(MAX_DEPTH));
        assert!(parse(&query).is_err());

        let half = MAX_DEPTH / 2;
        let query = format!("{}artist:x{}", "NOT (".repeat(half), ")".repeat(half));
        assert!(parse(&query).is_ok());
    }

    #[test]
    fn sibling_groups_do_not_accumulate_depth() {
        let group = format!("{}a:1{}", "(".repeat(MAX_DEPTH), ")".repeat(MAX_DEPTH));
        let query = vec![group; 4].join(" OR ");
        assert!(parse(&query).is_ok());
    }

    #[test]
    fn performance_many_queries() {
        let queries = [
            "artist:beatles",
            "artist:queen year>1980 starred:y",
            "NOT (artist:queen)",
            "genre:rock OR genre:pop OR genre:jazz",
            "(a:1 b:2) OR (c:3 d:4)",
            "year:[1990 TO 1999] albumrating>=4",
            "title:\"bohemian rhapsody\" AND NOT format:mp3",
        ];

        let start = Instant::now();
        for _ in 0..1000 {
            for query in &queries {
                let _ = parse(query).unwrap();
            }
        }
        let elapsed = start.elapsed();

        assert!(
            elapsed.as_millis() < 1000,
            "Parsing 7,000 queries took {:?}, expected < 1s",
            elapsed
        );
    }
}
