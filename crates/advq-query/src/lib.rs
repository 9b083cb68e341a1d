//! Query parsing and AST for advanced media-library search.
//!
//! This crate provides two small languages:
//!
//! - **Predicates**: `artist:beatles` - field, operator, value
//! - **Operators**: `:` fuzzy, `=` exact, `~` regexp, `<`, `>`, `<=`, `>=`
//! - **Ranges**: `year:[1990 TO 1999]` - inclusive between
//! - **Quoting**: `album:"abbey road"` - values with whitespace
//! - **Conjunction**: `artist:queen year>1980` or explicit `AND`
//! - **Disjunction**: `genre:rock OR genre:pop`
//! - **Negation**: `NOT starred:y`
//! - **Grouping**: `(a:1 OR b:2) c:3` - precedence control
//!
//! and an ordering list such as `-lastplayed, artist`.
//!
//! # Example
//!
//! ```
//! use advq_query::{parse, parse_order};
//!
//! let expr = parse("artist:queen (year<1980 OR starred:y)").unwrap();
//! assert_eq!(expr.to_query_string(), "artist:queen AND (year<1980 OR starred:y)");
//!
//! let keys = parse_order("-lastplayed, artist").unwrap();
//! assert_eq!(keys.len(), 2);
//! ```

#![warn(missing_docs)]

mod ast;
mod error;
mod lexer;
mod order;
mod parser;

pub use ast::{Direction, Operator, OrderKey, Predicate, QueryExpr};
pub use error::ParseError;
pub use lexer::{Lexeme, Token, tokenize};
pub use order::parse_order;
pub use parser::{MAX_DEPTH, parse};
