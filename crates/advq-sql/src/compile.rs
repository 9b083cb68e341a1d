//! Query compiler.
//!
//! Compiles a query AST and an ordering list into a [`Fragment`].

use advq_query::{Operator, OrderKey, Predicate, QueryExpr, parse, parse_order};
use tracing::{debug, trace};

use crate::{
    CompileError, Scope,
    catalog::{Field, ValueType},
    fragment::{Connective, Fragment},
};

/// Alias of the album self-join.
const MEDIA_ALBUM_ALIAS: &str = "media_album";

/// Album row owning a track: same parent path, or same album and artist.
const MEDIA_ALBUM_JOIN: &str = "left outer join media_file media_album on media_album.type = 'ALBUM' and (media_album.path = media_file.parent_path or (media_album.album = media_file.album and media_album.artist = media_file.artist))";

/// Alias of the rating join.
const USER_RATING_ALIAS: &str = "user_rating";

/// The user's rating of the album row. Binds the username.
const USER_RATING_JOIN: &str = "left outer join user_rating on user_rating.path = media_album.path and user_rating.username = ?";

/// Alias of the starred join.
const STARRED_ALIAS: &str = "starred_media_file";

/// The user's star on the track. Binds the username.
const STARRED_JOIN: &str = "left outer join starred_media_file on media_file.id = starred_media_file.media_file_id and starred_media_file.username = ?";

/// Rating assumed for albums the user has not rated.
const DEFAULT_RATING: u8 = 2;

/// Ranking score. Play counts and rating raise it; age since starring and
/// creation lower it. Age since last play currently has no weight.
const RANKING_ORDER: &str = "POWER(_RANKING_R, 2) * POWER(_RANKING_PC + 0.5 * _RANKING_APC, 1) * POWER(_RANKING_DS, -1) * POWER(_RANKING_DC, -1) * POWER(_RANKING_DL, 0)";

/// Literals meaning "present" for boolean fields.
const TRUTHY: [&str; 5] = ["true", "t", "1", "yes", "y"];

/// Literals meaning "absent" for boolean fields.
const FALSY: [&str; 5] = ["false", "f", "0", "no", "n"];

/// Compiles query and order ASTs into fragments for one user.
#[derive(Debug, Clone)]
pub struct QueryCompiler {
    /// Username bound by the per-user joins.
    username: String,
}

impl QueryCompiler {
    /// Creates a compiler binding per-user joins to `username`.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }

    /// Returns the username bound by per-user joins.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Compiles a query expression into a fragment.
    pub fn compile(&self, expr: &QueryExpr) -> Result<Fragment, CompileError> {
        match expr {
            QueryExpr::Or(exprs) => self.compile_list(exprs, Connective::Or),
            QueryExpr::And(exprs) => self.compile_list(exprs, Connective::And),
            QueryExpr::Not(inner) => Ok(self.compile(inner)?.not()),
            QueryExpr::Bracket(inner) => Ok(self.compile(inner)?.enclose()),
            QueryExpr::Predicates(predicates) => {
                let parts = predicates
                    .iter()
                    .map(|predicate| self.compile_predicate(predicate))
                    .collect::<Result<Vec<_>, _>>()?;
                Fragment::combine(parts, Connective::And)
            }
        }
    }

    /// Compiles sub-expressions and joins them under one connective.
    fn compile_list(
        &self,
        exprs: &[QueryExpr],
        connective: Connective,
    ) -> Result<Fragment, CompileError> {
        let parts = exprs
            .iter()
            .map(|expr| self.compile(expr))
            .collect::<Result<Vec<_>, _>>()?;
        Fragment::combine(parts, connective)
    }

    /// Compiles a single predicate, including its field's joins.
    pub fn compile_predicate(&self, predicate: &Predicate) -> Result<Fragment, CompileError> {
        trace!(%predicate, "compiling predicate");
        let field = Field::lookup(predicate.field())?;
        let fragment = match predicate {
            Predicate::Compare { op, value, .. } => compare(field, *op, strip_quotes(value))?,
            Predicate::Between { low, high, .. } => {
                between(field, strip_quotes(low), strip_quotes(high))?
            }
        };
        self.with_side_effects(field, fragment)
    }

    /// Compiles an ordering list into a fragment holding only order items
    /// and the joins and selects they need.
    pub fn compile_order(&self, keys: &[OrderKey]) -> Result<Fragment, CompileError> {
        let mut fragment = Fragment::new();
        for key in keys {
            let field = Field::lookup(&key.field)?;
            fragment = self.with_side_effects(field, fragment)?;
            fragment = fragment.add_order(order_expression(field)?, key.direction);
        }
        Ok(fragment)
    }

    /// Adds the joins and selects a field depends on.
    fn with_side_effects(&self, field: Field, fragment: Fragment) -> Result<Fragment, CompileError> {
        match field {
            Field::AlbumRating => self.join_album_rating(fragment),
            Field::Starred => self.join_starred(fragment),
            Field::Ranking => {
                let fragment = self.join_album_rating(fragment)?;
                let fragment = self.join_starred(fragment)?;
                add_ranking_selects(fragment)
            }
            _ => Ok(fragment),
        }
    }

    /// Joins the album row and the user's rating of it.
    fn join_album_rating(&self, fragment: Fragment) -> Result<Fragment, CompileError> {
        fragment
            .add_join(MEDIA_ALBUM_ALIAS, MEDIA_ALBUM_JOIN, None)?
            .add_join(USER_RATING_ALIAS, USER_RATING_JOIN, Some(self.username.clone()))
    }

    /// Joins the user's star on the track.
    fn join_starred(&self, fragment: Fragment) -> Result<Fragment, CompileError> {
        fragment.add_join(STARRED_ALIAS, STARRED_JOIN, Some(self.username.clone()))
    }
}

/// Adds the ranking inputs as select aliases.
fn add_ranking_selects(fragment: Fragment) -> Result<Fragment, CompileError> {
    fragment
        .add_additional_select("_RANKING_DS", days_since("starred_media_file.created"))?
        .add_additional_select("_RANKING_DC", days_since("media_file.created"))?
        .add_additional_select("_RANKING_DL", days_since("media_file.last_played"))?
        .add_additional_select("_RANKING_PC", "media_file.play_count")?
        .add_additional_select("_RANKING_APC", "media_album.play_count")?
        .add_additional_select(
            "_RANKING_R",
            format!("IFNULL(user_rating.rating, {DEFAULT_RATING})"),
        )
}

/// Whole days from `column` until now, at least 1.
fn days_since(column: &str) -> String {
    let days = format!("DATEDIFF(DAY, {column}, NOW())");
    format!("(CASE WHEN {days} <= 0 THEN 1 ELSE {days} END)")
}

/// Returns what an order key sorts by.
fn order_expression(field: Field) -> Result<String, CompileError> {
    match field.value_type() {
        ValueType::Computed => Ok(RANKING_ORDER.to_string()),
        _ => column_of(field, "order"),
    }
}

/// Returns the qualified column of a column-backed field.
fn column_of(field: Field, operator: &str) -> Result<String, CompileError> {
    field
        .sql_full_column()
        .ok_or_else(|| unsupported(field, operator))
}

/// Builds the error for an operator the field's type does not support.
fn unsupported(field: Field, operator: &str) -> CompileError {
    CompileError::UnsupportedOperator {
        field: field.name().to_string(),
        operator: operator.to_string(),
        value_type: field.value_type(),
    }
}

/// Strips one pair of surrounding double quotes.
fn strip_quotes(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(value)
}

/// Returns true for the `null` literal, in any case.
fn is_null(value: &str) -> bool {
    value.eq_ignore_ascii_case("null")
}

/// `column <op> ?` bound to `value`.
fn bind(column: &str, sql_op: &str, value: &str) -> Fragment {
    Fragment::with_params(format!("{column} {sql_op} ?"), vec![value.to_string()])
}

/// Dispatches a comparison on the field's value type.
fn compare(field: Field, op: Operator, value: &str) -> Result<Fragment, CompileError> {
    match field.value_type() {
        ValueType::String => string_predicate(field, op, value),
        ValueType::ExactString => exact_string_predicate(field, op, value),
        ValueType::Int | ValueType::Date => ordered_predicate(field, op, value),
        ValueType::Bool => bool_predicate(field, op, value),
        ValueType::Computed => Err(unsupported(field, op.symbol())),
    }
}

/// Free-text comparisons: substring, exact, regexp.
fn string_predicate(field: Field, op: Operator, value: &str) -> Result<Fragment, CompileError> {
    let column = column_of(field, op.symbol())?;
    match op {
        Operator::Eq => Ok(bind(&column, "=", value)),
        Operator::FuzzyEq if is_null(value) => Ok(Fragment::predicate(format!("{column} IS NULL"))),
        Operator::FuzzyEq => Ok(Fragment::with_params(
            format!("lower({column}) LIKE ?"),
            vec![format!("%{}%", value.to_lowercase())],
        )),
        Operator::Regexp => Ok(Fragment::with_params(
            format!("regexp_matches({column}, ?)"),
            vec![value.to_string()],
        )),
        _ => Err(unsupported(field, op.symbol())),
    }
}

/// Exact-only text comparisons.
fn exact_string_predicate(
    field: Field,
    op: Operator,
    value: &str,
) -> Result<Fragment, CompileError> {
    let column = column_of(field, op.symbol())?;
    match op {
        Operator::FuzzyEq if is_null(value) => Ok(Fragment::predicate(format!("{column} IS NULL"))),
        Operator::Eq | Operator::FuzzyEq => Ok(bind(&column, "=", value)),
        _ => Err(unsupported(field, op.symbol())),
    }
}

/// Integer and date comparisons. `<` and `<=` also match missing values.
fn ordered_predicate(field: Field, op: Operator, value: &str) -> Result<Fragment, CompileError> {
    let column = column_of(field, op.symbol())?;
    let below = |sql_op: &str| {
        Fragment::with_params(
            format!("{column} IS NULL OR {column} {sql_op} ?"),
            vec![value.to_string()],
        )
    };
    match op {
        Operator::FuzzyEq if is_null(value) => Ok(Fragment::predicate(format!("{column} IS NULL"))),
        Operator::Eq | Operator::FuzzyEq => Ok(bind(&column, "=", value)),
        Operator::Lt => Ok(below("<")),
        Operator::Lte => Ok(below("<=")),
        Operator::Gt => Ok(bind(&column, ">", value)),
        Operator::Gte => Ok(bind(&column, ">=", value)),
        Operator::Regexp => Err(unsupported(field, op.symbol())),
    }
}

/// Presence tests on a nullable joined column.
fn bool_predicate(field: Field, op: Operator, value: &str) -> Result<Fragment, CompileError> {
    if !matches!(op, Operator::Eq | Operator::FuzzyEq) {
        return Err(unsupported(field, op.symbol()));
    }
    let column = column_of(field, op.symbol())?;
    let literal = value.to_ascii_lowercase();
    if TRUTHY.contains(&literal.as_str()) {
        Ok(Fragment::predicate(format!("{column} IS NOT NULL")))
    } else if is_null(&literal) || FALSY.contains(&literal.as_str()) {
        Ok(Fragment::predicate(format!("{column} IS NULL")))
    } else {
        Err(CompileError::InvalidLiteral {
            field: field.name().to_string(),
            literal: value.to_string(),
            value_type: field.value_type(),
        })
    }
}

/// Inclusive range on an integer or date field.
fn between(field: Field, low: &str, high: &str) -> Result<Fragment, CompileError> {
    if !field.value_type().is_ordered() {
        return Err(unsupported(field, "between"));
    }
    let column = column_of(field, "between")?;
    Ok(Fragment::with_params(
        format!("{column} IS NOT NULL AND {column} >= ? AND {column} <= ?"),
        vec![low.to_string(), high.to_string()],
    ))
}

/// Compiles a query and ordering list for `username`.
///
/// A blank `query` yields an empty WHERE; a blank `order` yields no order
/// items.
pub fn compile(query: &str, order: &str, username: &str) -> Result<Fragment, CompileError> {
    compile_scoped(query, order, username, Scope::All)
}

/// Compiles like [`compile`], then restricts the result to `scope`.
pub fn compile_scoped(
    query: &str,
    order: &str,
    username: &str,
    scope: Scope,
) -> Result<Fragment, CompileError> {
    let compiler = QueryCompiler::new(username);
    debug!(query, order, %scope, username = compiler.username(), "compiling advanced search");

    let mut fragment = if query.trim().is_empty() {
        Fragment::new()
    } else {
        compiler.compile(&parse(query)?)?
    };
    if let Some(restriction) = scope.restriction() {
        fragment = fragment.and(Fragment::predicate(restriction))?;
    }

    let keys = parse_order(order)?;
    let fragment = fragment.merge_order(compiler.compile_order(&keys)?)?;

    debug!(
        joins = fragment.joins().len(),
        selects = fragment.select_extras().len(),
        params = fragment.parameters().len(),
        order = fragment.order_items().len(),
        "compiled advanced search"
    );
    Ok(fragment)
}

/// Compiles an ordering list on its own.
pub fn compile_order(order: &str, username: &str) -> Result<Fragment, CompileError> {
    QueryCompiler::new(username).compile_order(&parse_order(order)?)
}
