//! Error types for query compilation.

use std::fmt;

use advq_query::ParseError;
use thiserror::Error;

use crate::catalog::{ValueType, field_names};

/// What kind of fragment entry collided during a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    /// Two joins share an alias.
    Join,
    /// Two additional selects share an alias.
    Select,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Join => "join",
            Self::Select => "select",
        })
    }
}

/// Errors that can occur while compiling a query into a fragment.
///
/// Every error is terminal for the call: no partial fragment is produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// The query or ordering list failed to parse.
    #[error("{0}")]
    Parse(#[from] ParseError),

    /// A field token is not in the catalog.
    #[error("unknown field: {name}")]
    UnknownField {
        /// The token as written.
        name: String,
    },

    /// The operator does not apply to the field's value type.
    #[error("operator '{operator}' is not supported for {value_type} field '{field}'")]
    UnsupportedOperator {
        /// Field name.
        field: String,
        /// Operator symbol, or `between` for ranges.
        operator: String,
        /// Value type of the field.
        value_type: ValueType,
    },

    /// A literal could not be interpreted for the field.
    #[error("invalid {value_type} value for field '{field}': {literal}")]
    InvalidLiteral {
        /// Field name.
        field: String,
        /// The literal with quotes stripped.
        literal: String,
        /// Value type of the field.
        value_type: ValueType,
    },

    /// Two fragments disagree on the definition of an alias.
    #[error("conflicting {kind} for alias '{alias}': '{existing}' vs '{attempted}'")]
    FragmentConflict {
        /// Whether a join or a select collided.
        kind: ConflictKind,
        /// The shared alias.
        alias: String,
        /// Definition already present.
        existing: String,
        /// Definition that was being added.
        attempted: String,
    },
}

impl CompileError {
    /// Returns a hint for fixing the error, if one applies.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::Parse(err) => err.suggestion().map(str::to_string),
            Self::UnknownField { .. } => Some(format!(
                "Valid fields are: {}",
                field_names().join(", ")
            )),
            Self::UnsupportedOperator { value_type, .. } => Some(
                match value_type {
                    ValueType::String => "Use ':' (contains), '=' (exact) or '~' (regexp)",
                    ValueType::ExactString => "Use ':' or '=' for exact matches",
                    ValueType::Int | ValueType::Date => {
                        "Use ':', '=', '<', '>', '<=', '>=' or a [low TO high] range"
                    }
                    ValueType::Bool => "Use ':' or '=' with yes/no",
                    ValueType::Computed => "This field can only be used for ordering",
                }
                .to_string(),
            ),
            Self::InvalidLiteral { .. } => {
                Some("Boolean fields accept true/false, yes/no, y/n, 1/0 or null".to_string())
            }
            Self::FragmentConflict { .. } => None,
        }
    }
}
