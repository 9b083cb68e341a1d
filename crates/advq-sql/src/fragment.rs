//! SQL fragment IR.
//!
//! A [`Fragment`] carries the pieces a compiled query contributes to a
//! `SELECT`: extra select expressions, joins, a WHERE text with positional
//! `?` placeholders and its parameters, and ORDER BY items. Fragments are
//! values: every merge consumes its operands and returns a new fragment.
//!
//! Joins and selects are keyed by alias and kept sorted, so rendering is
//! deterministic. Join parameters bind before WHERE parameters because the
//! join clause precedes the WHERE clause in the assembled statement.

use std::{
    collections::{BTreeMap, btree_map::Entry},
    fmt,
};

use advq_query::Direction;
use serde::Serialize;

use crate::{CompileError, error::ConflictKind};

/// A join contributed by a fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Join {
    /// Full join text, e.g. `left outer join ... on ...`.
    pub sql: String,
    /// Value bound to the join's single placeholder, if it has one.
    pub param: Option<String>,
}

impl Join {
    /// Describes the join for conflict messages.
    fn describe(&self) -> String {
        match &self.param {
            Some(param) => format!("{} [{param}]", self.sql),
            None => self.sql.clone(),
        }
    }
}

/// One ORDER BY item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderItem {
    /// Column or expression to sort by.
    pub expr: String,
    /// Sort direction.
    pub direction: Direction,
}

impl fmt::Display for OrderItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.expr, self.direction.sql())
    }
}

/// Boolean connective between WHERE texts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    /// Both sides must hold.
    And,
    /// Either side may hold.
    Or,
}

impl Connective {
    /// Returns the SQL text placed between operands.
    fn separator(self) -> &'static str {
        match self {
            Self::And => " AND ",
            Self::Or => " OR ",
        }
    }
}

/// The partial SQL produced by compiling a query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Fragment {
    /// Extra select expressions keyed by alias.
    selects: BTreeMap<String, String>,
    /// WHERE text; empty means no restriction.
    #[serde(rename = "where")]
    where_sql: String,
    /// Parameters for the WHERE placeholders, in order.
    where_params: Vec<String>,
    /// Joins keyed by alias.
    joins: BTreeMap<String, Join>,
    /// ORDER BY items in priority order.
    order: Vec<OrderItem>,
}

impl Fragment {
    /// Creates an empty fragment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a fragment holding a WHERE text without placeholders.
    pub fn predicate(sql: impl Into<String>) -> Self {
        Self::with_params(sql, Vec::new())
    }

    /// Creates a fragment holding a WHERE text and its parameters.
    pub fn with_params(sql: impl Into<String>, params: Vec<String>) -> Self {
        let where_sql = sql.into();
        debug_assert_eq!(placeholder_count(&where_sql), params.len());
        Self {
            where_sql,
            where_params: params,
            ..Self::default()
        }
    }

    /// Conjoins two fragments.
    pub fn and(self, other: Self) -> Result<Self, CompileError> {
        Self::combine(vec![self, other], Connective::And)
    }

    /// Disjoins two fragments.
    pub fn or(self, other: Self) -> Result<Self, CompileError> {
        Self::combine(vec![self, other], Connective::Or)
    }

    /// Combines any number of fragments under one connective.
    ///
    /// Fragments with an empty WHERE contribute only their joins, selects and
    /// order. When a single WHERE text remains it is kept verbatim; otherwise
    /// each text is parenthesized and joined by the connective.
    pub fn combine(parts: Vec<Self>, connective: Connective) -> Result<Self, CompileError> {
        let mut combined = Self::new();
        let mut clauses = Vec::new();
        for part in parts {
            let Self {
                selects,
                where_sql,
                where_params,
                joins,
                order,
            } = part;
            combined.merge_joins(joins)?;
            combined.merge_selects(selects)?;
            combined.order.extend(order);
            if !where_sql.is_empty() {
                clauses.push(where_sql);
                combined.where_params.extend(where_params);
            }
        }
        combined.where_sql = match clauses.len() {
            0 => String::new(),
            1 => clauses.remove(0),
            _ => clauses
                .iter()
                .map(|clause| format!("({clause})"))
                .collect::<Vec<_>>()
                .join(connective.separator()),
        };
        Ok(combined)
    }

    /// Negates the WHERE text. An empty WHERE stays empty.
    #[must_use]
    pub fn not(mut self) -> Self {
        if !self.where_sql.is_empty() {
            self.where_sql = format!("NOT ({})", self.where_sql);
        }
        self
    }

    /// Parenthesizes the WHERE text unless it already is one enclosing group.
    #[must_use]
    pub fn enclose(mut self) -> Self {
        if !self.where_sql.is_empty() && !is_enclosed(&self.where_sql) {
            self.where_sql = format!("({})", self.where_sql);
        }
        self
    }

    /// Adds a join under `alias`.
    ///
    /// Re-adding an identical join is a no-op. A different definition under
    /// the same alias is a [`CompileError::FragmentConflict`].
    pub fn add_join(
        mut self,
        alias: impl Into<String>,
        sql: impl Into<String>,
        param: Option<String>,
    ) -> Result<Self, CompileError> {
        let join = Join {
            sql: sql.into(),
            param,
        };
        debug_assert_eq!(placeholder_count(&join.sql), usize::from(join.param.is_some()));
        self.merge_join(alias.into(), join)?;
        Ok(self)
    }

    /// Adds an extra select expression under `alias`, with the same
    /// conflict rule as joins.
    pub fn add_additional_select(
        mut self,
        alias: impl Into<String>,
        expr: impl Into<String>,
    ) -> Result<Self, CompileError> {
        self.merge_select(alias.into(), expr.into())?;
        Ok(self)
    }

    /// Appends an ORDER BY item.
    #[must_use]
    pub fn add_order(mut self, expr: impl Into<String>, direction: Direction) -> Self {
        self.order.push(OrderItem {
            expr: expr.into(),
            direction,
        });
        self
    }

    /// Appends `other`'s order items and merges its joins and selects.
    /// `other`'s WHERE is ignored.
    pub fn merge_order(mut self, other: Self) -> Result<Self, CompileError> {
        self.merge_joins(other.joins)?;
        self.merge_selects(other.selects)?;
        self.order.extend(other.order);
        Ok(self)
    }

    /// Merges joins, checking each alias.
    fn merge_joins(&mut self, joins: BTreeMap<String, Join>) -> Result<(), CompileError> {
        for (alias, join) in joins {
            self.merge_join(alias, join)?;
        }
        Ok(())
    }

    /// Inserts one join unless an identical one exists.
    fn merge_join(&mut self, alias: String, join: Join) -> Result<(), CompileError> {
        match self.joins.entry(alias) {
            Entry::Vacant(slot) => {
                slot.insert(join);
                Ok(())
            }
            Entry::Occupied(slot) if *slot.get() == join => Ok(()),
            Entry::Occupied(slot) => Err(CompileError::FragmentConflict {
                kind: ConflictKind::Join,
                existing: slot.get().describe(),
                alias: slot.key().clone(),
                attempted: join.describe(),
            }),
        }
    }

    /// Merges selects, checking each alias.
    fn merge_selects(&mut self, selects: BTreeMap<String, String>) -> Result<(), CompileError> {
        for (alias, expr) in selects {
            self.merge_select(alias, expr)?;
        }
        Ok(())
    }

    /// Inserts one select unless an identical one exists.
    fn merge_select(&mut self, alias: String, expr: String) -> Result<(), CompileError> {
        match self.selects.entry(alias) {
            Entry::Vacant(slot) => {
                slot.insert(expr);
                Ok(())
            }
            Entry::Occupied(slot) if *slot.get() == expr => Ok(()),
            Entry::Occupied(slot) => Err(CompileError::FragmentConflict {
                kind: ConflictKind::Select,
                existing: slot.get().clone(),
                alias: slot.key().clone(),
                attempted: expr,
            }),
        }
    }

    /// Returns `(alias, expr)` pairs of the extra selects, in alias order.
    pub fn select_extras(&self) -> Vec<(&str, &str)> {
        self.selects
            .iter()
            .map(|(alias, expr)| (alias.as_str(), expr.as_str()))
            .collect()
    }

    /// Renders the extra selects as `expr AS alias, ...`.
    pub fn additional_select_clause(&self) -> String {
        self.selects
            .iter()
            .map(|(alias, expr)| format!("{expr} AS {alias}"))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Returns the joins keyed by alias.
    pub fn joins(&self) -> &BTreeMap<String, Join> {
        &self.joins
    }

    /// Renders the join texts separated by single spaces, in alias order.
    pub fn join_clause(&self) -> String {
        self.joins
            .values()
            .map(|join| join.sql.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Returns the join parameters, in alias order.
    pub fn join_parameters(&self) -> Vec<&str> {
        self.joins
            .values()
            .filter_map(|join| join.param.as_deref())
            .collect()
    }

    /// Returns the WHERE text, empty when unrestricted.
    pub fn where_clause(&self) -> &str {
        &self.where_sql
    }

    /// Returns the WHERE parameters, in placeholder order.
    pub fn where_parameters(&self) -> &[String] {
        &self.where_params
    }

    /// Returns the ORDER BY items.
    pub fn order_items(&self) -> &[OrderItem] {
        &self.order
    }

    /// Renders the ORDER BY items as `expr ASC|DESC, ...`.
    pub fn order_clause(&self) -> String {
        self.order
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Returns every parameter in binding order: join parameters, then WHERE
    /// parameters.
    pub fn parameters(&self) -> Vec<&str> {
        let mut params = self.join_parameters();
        params.extend(self.where_params.iter().map(String::as_str));
        params
    }

    /// Returns true if the fragment contributes nothing.
    pub fn is_empty(&self) -> bool {
        self.selects.is_empty()
            && self.where_sql.is_empty()
            && self.joins.is_empty()
            && self.order.is_empty()
    }

    /// Assembles a complete statement selecting `columns` from `table`.
    pub fn select_statement(&self, table: &str, columns: &str) -> String {
        let mut sql = format!("SELECT {columns}");
        if !self.selects.is_empty() {
            sql.push_str(", ");
            sql.push_str(&self.additional_select_clause());
        }
        sql.push_str(" FROM ");
        sql.push_str(table);
        if !self.joins.is_empty() {
            sql.push(' ');
            sql.push_str(&self.join_clause());
        }
        if !self.where_sql.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.where_sql);
        }
        if !self.order.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_clause());
        }
        sql
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {:?} (joins [{}] {:?}, selects [{}], order [{}])",
            self.where_sql,
            self.where_params,
            self.join_clause(),
            self.join_parameters(),
            self.additional_select_clause(),
            self.order_clause()
        )
    }
}

/// Counts `?` placeholders in generated SQL.
pub fn placeholder_count(sql: &str) -> usize {
    sql.matches('?').count()
}

/// Returns true if `text` is a single parenthesized group spanning all of it.
fn is_enclosed(text: &str) -> bool {
    if !text.starts_with('(') || !text.ends_with(')') {
        return false;
    }
    let mut depth = 0usize;
    for (idx, ch) in text.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return idx == text.len() - 1;
                }
            }
            _ => {}
        }
    }
    false
}
