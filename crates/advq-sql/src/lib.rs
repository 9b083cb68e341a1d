//! Compiles advanced media-library search queries into SQL fragments.
//!
//! A query such as `artist:queen year<1980` and an ordering list such as
//! `-lastplayed` compile into a [`Fragment`]: extra select expressions,
//! joins, a WHERE text with `?` placeholders, its parameters, and ORDER BY
//! items. The caller splices these into its own `SELECT`.
//!
//! # Example
//!
//! ```
//! let fragment = advq_sql::compile("starred:y", "-lastplayed", "alice").unwrap();
//! assert_eq!(fragment.where_clause(), "starred_media_file.id IS NOT NULL");
//! assert_eq!(fragment.order_clause(), "media_file.last_played DESC");
//! assert_eq!(fragment.parameters(), vec!["alice"]);
//! ```

#![warn(missing_docs)]

pub mod catalog;
mod compile;
mod error;
mod fragment;
mod scope;

pub use catalog::{Field, FieldInfo, ValueType};
pub use compile::{QueryCompiler, compile, compile_order, compile_scoped};
pub use error::{CompileError, ConflictKind};
pub use fragment::{Connective, Fragment, Join, OrderItem, placeholder_count};
pub use scope::Scope;
