//! SELECT statement assembly around a compiled predicate

use serde::{Deserialize, Serialize};

use super::bind::{PositionalQuery, expand_named};
use crate::core::constants::{DEFAULT_TAKE, MAX_TAKE};
use crate::data::error::DataError;
use crate::data::filters::{CompiledQuery, CompilerOptions};
use crate::utils::sql::{IdentQuote, quote_ident};

/// Pagination defaults applied at execution time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Pagination {
    /// Rows returned when the query gives no usable `take`
    pub default_take: i64,
    /// Upper bound for `take`
    pub max_take: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            default_take: DEFAULT_TAKE,
            max_take: MAX_TAKE,
        }
    }
}

impl Pagination {
    /// Effective `(take, skip)`; missing or non-positive take falls back to the default
    pub fn resolve(&self, skip: Option<i64>, take: Option<i64>) -> (i64, i64) {
        let take = take
            .filter(|t| *t > 0)
            .unwrap_or(self.default_take)
            .min(self.max_take);
        let skip = skip.filter(|s| *s >= 0).unwrap_or(0);
        (take, skip)
    }
}

/// Statements over one aliased table, filtered by a compiled query
#[derive(Debug, Clone)]
pub struct SelectPlan<'a> {
    table: &'a str,
    alias: &'a str,
    quote: IdentQuote,
    compiled: &'a CompiledQuery,
}

impl<'a> SelectPlan<'a> {
    /// `options` must be the ones the query was compiled with
    pub fn new(table: &'a str, options: &'a CompilerOptions, compiled: &'a CompiledQuery) -> Self {
        Self {
            table,
            alias: &options.alias,
            quote: options.quote,
            compiled,
        }
    }

    fn from_where(&self) -> String {
        let mut sql = format!(
            "FROM {} AS {}",
            quote_ident(self.table, self.quote),
            quote_ident(self.alias, self.quote)
        );
        if !self.compiled.where_clause.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.compiled.where_clause);
        }
        sql
    }

    fn order_by(&self) -> String {
        if self.compiled.order.is_empty() {
            return String::new();
        }
        let columns: Vec<String> = self
            .compiled
            .order
            .iter()
            .map(|c| format!("{} {}", c.column, if c.asc { "ASC" } else { "DESC" }))
            .collect();
        format!(" ORDER BY {}", columns.join(", "))
    }

    /// `SELECT alias.* ... ORDER BY ... LIMIT ? OFFSET ?`
    pub fn select(&self, pagination: &Pagination) -> Result<PositionalQuery, DataError> {
        let sql = format!(
            "SELECT {}.* {}{} LIMIT :__take OFFSET :__skip",
            quote_ident(self.alias, self.quote),
            self.from_where(),
            self.order_by()
        );
        let (take, skip) = pagination.resolve(self.compiled.skip, self.compiled.take);
        let mut params = self.compiled.params.clone();
        params.insert("__take", take.into());
        params.insert("__skip", skip.into());
        expand_named(&sql, &params)
    }

    /// `SELECT COUNT(*) ...`
    pub fn count(&self) -> Result<PositionalQuery, DataError> {
        let sql = format!("SELECT COUNT(*) {}", self.from_where());
        expand_named(&sql, &self.compiled.params)
    }

    /// `SELECT EXISTS(SELECT 1 ...)`
    pub fn exists(&self) -> Result<PositionalQuery, DataError> {
        let sql = format!("SELECT EXISTS(SELECT 1 {})", self.from_where());
        expand_named(&sql, &self.compiled.params)
    }
}
