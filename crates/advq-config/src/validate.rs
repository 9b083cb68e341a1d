//! Configuration validation.
//!
//! Checks merged settings against the query languages and reports
//! non-fatal warnings. Invalid values fall back to defaults at use sites.

use std::fmt;

use advq_query::parse_order;
use advq_sql::{Field, Scope};

use crate::Config;

/// A non-fatal warning about the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// `compile.scope` is not a known scope.
    UnknownScope {
        /// The configured value.
        value: String,
    },
    /// `compile.order` does not parse.
    InvalidOrder {
        /// The configured value.
        value: String,
        /// Parser message.
        message: String,
    },
    /// `compile.order` names a field outside the catalog.
    UnknownOrderField {
        /// The unknown token.
        field: String,
    },
    /// `compile.username` is blank.
    EmptyUsername,
    /// `compile.table` or `compile.columns` is blank.
    EmptyStatementPart {
        /// Name of the blank setting.
        setting: &'static str,
    },
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownScope { value } => {
                write!(f, "compile.scope '{value}' is not one of all, songs, albums, artists")
            }
            Self::InvalidOrder { value, message } => {
                write!(f, "compile.order '{value}' does not parse: {message}")
            }
            Self::UnknownOrderField { field } => {
                write!(f, "compile.order names unknown field '{field}'")
            }
            Self::EmptyUsername => write!(f, "compile.username is empty"),
            Self::EmptyStatementPart { setting } => write!(f, "compile.{setting} is empty"),
        }
    }
}

/// Validates the configuration and returns any warnings.
pub fn validate_config(config: &Config) -> Vec<ConfigWarning> {
    let mut warnings = Vec::new();
    let compile = &config.compile;

    if compile.scope.parse::<Scope>().is_err() {
        warnings.push(ConfigWarning::UnknownScope {
            value: compile.scope.clone(),
        });
    }

    match parse_order(&compile.order) {
        Ok(keys) => warnings.extend(
            keys.into_iter()
                .filter(|key| Field::lookup(&key.field).is_err())
                .map(|key| ConfigWarning::UnknownOrderField { field: key.field }),
        ),
        Err(err) => warnings.push(ConfigWarning::InvalidOrder {
            value: compile.order.clone(),
            message: err.to_string(),
        }),
    }

    if compile.username.trim().is_empty() {
        warnings.push(ConfigWarning::EmptyUsername);
    }
    if compile.table.trim().is_empty() {
        warnings.push(ConfigWarning::EmptyStatementPart { setting: "table" });
    }
    if compile.columns.trim().is_empty() {
        warnings.push(ConfigWarning::EmptyStatementPart { setting: "columns" });
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_config(&Config::default()).is_empty());
    }

    #[test]
    fn test_unknown_scope() {
        let mut config = Config::default();
        config.compile.scope = "playlists".into();
        assert_eq!(
            validate_config(&config),
            vec![ConfigWarning::UnknownScope {
                value: "playlists".into()
            }]
        );
    }

    #[test]
    fn test_order_problems() {
        let mut config = Config::default();
        config.compile.order = "-lastplayed, colour".into();
        assert_eq!(
            validate_config(&config),
            vec![ConfigWarning::UnknownOrderField {
                field: "colour".into()
            }]
        );

        config.compile.order = "play count".into();
        let warnings = validate_config(&config);
        assert!(matches!(warnings[0], ConfigWarning::InvalidOrder { .. }));
    }

    #[test]
    fn test_blank_settings() {
        let mut config = Config::default();
        config.compile.username = " ".into();
        config.compile.columns = String::new();
        let warnings = validate_config(&config);
        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[1].to_string(), "compile.columns is empty");
    }
}
