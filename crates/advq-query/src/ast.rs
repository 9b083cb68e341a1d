//! Query abstract syntax tree.
//!
//! Represents parsed query and ordering expressions before compilation to SQL.

use std::fmt;

use serde::Serialize;

/// Comparison operator of a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    /// Exact equality (`=`).
    Eq,
    /// Fuzzy equality (`:`): substring match, null test or presence test.
    FuzzyEq,
    /// Regular expression match (`~`).
    Regexp,
    /// Less than (`<`).
    Lt,
    /// Greater than (`>`).
    Gt,
    /// Less than or equal (`<=`).
    Lte,
    /// Greater than or equal (`>=`).
    Gte,
}

impl Operator {
    /// Returns the query-language spelling of the operator.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::FuzzyEq => ":",
            Self::Regexp => "~",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Lte => "<=",
            Self::Gte => ">=",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A single field test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Predicate {
    /// `field op value`. The value is kept as written, including quotes.
    Compare {
        /// Field token as written.
        field: String,
        /// Comparison operator.
        op: Operator,
        /// Value text as written.
        value: String,
    },
    /// `field:[low TO high]`, inclusive on both ends.
    Between {
        /// Field token as written.
        field: String,
        /// Lower bound as written.
        low: String,
        /// Upper bound as written.
        high: String,
    },
}

impl Predicate {
    /// Creates a comparison predicate.
    pub fn compare(field: impl Into<String>, op: Operator, value: impl Into<String>) -> Self {
        Self::Compare {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// Creates a range predicate.
    pub fn between(
        field: impl Into<String>,
        low: impl Into<String>,
        high: impl Into<String>,
    ) -> Self {
        Self::Between {
            field: field.into(),
            low: low.into(),
            high: high.into(),
        }
    }

    /// Returns the field token of this predicate.
    pub fn field(&self) -> &str {
        match self {
            Self::Compare { field, .. } | Self::Between { field, .. } => field,
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compare { field, op, value } => write!(f, "{field}{op}{value}"),
            Self::Between { field, low, high } => write!(f, "{field}:[{low} TO {high}]"),
        }
    }
}

/// A parsed query expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "children", rename_all = "snake_case")]
pub enum QueryExpr {
    /// Disjunction of two or more expressions.
    Or(Vec<Self>),

    /// Explicit conjunction of two or more expressions.
    And(Vec<Self>),

    /// Negation.
    Not(Box<Self>),

    /// A parenthesized sub-expression.
    Bracket(Box<Self>),

    /// Juxtaposed predicates, implicitly conjoined.
    Predicates(Vec<Predicate>),
}

impl QueryExpr {
    /// Creates an And expression, unwrapping a single operand.
    pub fn and(mut exprs: Vec<Self>) -> Self {
        if exprs.len() == 1 {
            exprs.remove(0)
        } else {
            Self::And(exprs)
        }
    }

    /// Creates an Or expression, unwrapping a single operand.
    pub fn or(mut exprs: Vec<Self>) -> Self {
        if exprs.len() == 1 {
            exprs.remove(0)
        } else {
            Self::Or(exprs)
        }
    }

    /// Creates a negated expression.
    pub fn not(expr: Self) -> Self {
        Self::Not(Box::new(expr))
    }

    /// Creates a bracketed expression.
    pub fn bracket(expr: Self) -> Self {
        Self::Bracket(Box::new(expr))
    }

    /// Returns every predicate in the tree, left to right.
    pub fn predicates(&self) -> Vec<&Predicate> {
        let mut out = Vec::new();
        self.collect_predicates(&mut out);
        out
    }

    /// Pushes the predicates of this subtree onto `out`.
    fn collect_predicates<'a>(&'a self, out: &mut Vec<&'a Predicate>) {
        match self {
            Self::Or(exprs) | Self::And(exprs) => {
                for expr in exprs {
                    expr.collect_predicates(out);
                }
            }
            Self::Not(inner) | Self::Bracket(inner) => inner.collect_predicates(out),
            Self::Predicates(preds) => out.extend(preds.iter()),
        }
    }

    /// Formats the expression as a tree structure with the given indentation level.
    fn fmt_tree(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let prefix = "  ".repeat(indent);
        match self {
            Self::Or(exprs) => {
                writeln!(f, "{prefix}Or")?;
                for expr in exprs {
                    expr.fmt_tree(f, indent + 1)?;
                }
                Ok(())
            }
            Self::And(exprs) => {
                writeln!(f, "{prefix}And")?;
                for expr in exprs {
                    expr.fmt_tree(f, indent + 1)?;
                }
                Ok(())
            }
            Self::Not(inner) => {
                writeln!(f, "{prefix}Not")?;
                inner.fmt_tree(f, indent + 1)
            }
            Self::Bracket(inner) => {
                writeln!(f, "{prefix}Bracket")?;
                inner.fmt_tree(f, indent + 1)
            }
            Self::Predicates(preds) => {
                writeln!(f, "{prefix}Predicates")?;
                for pred in preds {
                    writeln!(f, "{prefix}  {pred}")?;
                }
                Ok(())
            }
        }
    }

    /// Formats the expression back into query syntax.
    ///
    /// The output parses to an equal tree.
    pub fn to_query_string(&self) -> String {
        match self {
            Self::Or(exprs) => exprs
                .iter()
                .map(Self::to_query_string)
                .collect::<Vec<_>>()
                .join(" OR "),
            Self::And(exprs) => exprs
                .iter()
                .map(Self::to_query_string)
                .collect::<Vec<_>>()
                .join(" AND "),
            Self::Not(inner) => format!("NOT {}", inner.to_query_string()),
            Self::Bracket(inner) => format!("({})", inner.to_query_string()),
            Self::Predicates(preds) => preds
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

impl fmt::Display for QueryExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_tree(f, 0)
    }
}

/// Sort direction of an order key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Smallest first.
    #[default]
    Ascending,
    /// Largest first.
    Descending,
}

impl Direction {
    /// Returns the SQL keyword for this direction.
    pub fn sql(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// One entry of an ordering list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderKey {
    /// Lowercased field token.
    pub field: String,
    /// Sort direction.
    pub direction: Direction,
}

impl fmt::Display for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            Direction::Ascending => write!(f, "{}", self.field),
            Direction::Descending => write!(f, "-{}", self.field),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fuzzy(field: &str, value: &str) -> Predicate {
        Predicate::compare(field, Operator::FuzzyEq, value)
    }

    #[test]
    fn and_single_element_unwraps() {
        let single = QueryExpr::and(vec![QueryExpr::Predicates(vec![fuzzy("a", "1")])]);
        assert_eq!(single, QueryExpr::Predicates(vec![fuzzy("a", "1")]));
    }

    #[test]
    fn or_keeps_multiple() {
        let expr = QueryExpr::or(vec![
            QueryExpr::Predicates(vec![fuzzy("a", "1")]),
            QueryExpr::Predicates(vec![fuzzy("b", "2")]),
        ]);
        assert!(matches!(expr, QueryExpr::Or(ref v) if v.len() == 2));
    }

    #[test]
    fn predicates_in_order() {
        let expr = QueryExpr::or(vec![
            QueryExpr::not(QueryExpr::Predicates(vec![fuzzy("a", "1")])),
            QueryExpr::bracket(QueryExpr::Predicates(vec![
                fuzzy("b", "2"),
                Predicate::between("year", "1990", "1999"),
            ])),
        ]);
        let fields: Vec<&str> = expr.predicates().iter().map(|p| p.field()).collect();
        assert_eq!(fields, vec!["a", "b", "year"]);
    }

    #[test]
    fn query_string_form() {
        let expr = QueryExpr::and(vec![
            QueryExpr::not(QueryExpr::Predicates(vec![fuzzy("starred", "y")])),
            QueryExpr::bracket(QueryExpr::or(vec![
                QueryExpr::Predicates(vec![Predicate::compare("year", Operator::Lte, "1980")]),
                QueryExpr::Predicates(vec![fuzzy("album", "\"a b\"")]),
            ])),
        ]);
        assert_eq!(
            expr.to_query_string(),
            "NOT starred:y AND (year<=1980 OR album:\"a b\")"
        );
    }

    #[test]
    fn tree_display() {
        let expr = QueryExpr::not(QueryExpr::Predicates(vec![fuzzy("a", "1")]));
        assert_eq!(expr.to_string(), "Not\n  Predicates\n    a:1\n");
    }

    #[test]
    fn order_key_display() {
        let key = OrderKey {
            field: "lastplayed".into(),
            direction: Direction::Descending,
        };
        assert_eq!(key.to_string(), "-lastplayed");
        assert_eq!(key.direction.sql(), "DESC");
    }
}
