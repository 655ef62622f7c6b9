//! Query compiler
//!
//! Assembles the key prefix, the compiled expression tree, the sort columns
//! and the pagination hints into one [`CompiledQuery`].

use serde::{Deserialize, Serialize};

use super::builder::{CompileContext, Conjunction, prepare_where};
use super::keys::{build_key_prefix, merge_with_filter};
use super::order::{OrderPriority, order_columns, pagination};
use super::types::{CompiledQuery, Keys, ToolkitQuery};
use crate::core::constants::DEFAULT_TARGET_ALIAS;
use crate::utils::sql::IdentQuote;

/// Compiler settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CompilerOptions {
    /// Table alias qualifying every column
    pub alias: String,
    pub quote: IdentQuote,
    pub order_priority: OrderPriority,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            alias: DEFAULT_TARGET_ALIAS.to_string(),
            quote: IdentQuote::default(),
            order_priority: OrderPriority::default(),
        }
    }
}

/// Stateless filter-to-SQL compiler
///
/// Every call builds a fresh [`CompileContext`], so one compiler can be shared
/// freely across threads.
#[derive(Debug, Clone, Default)]
pub struct QueryCompiler {
    options: CompilerOptions,
}

impl QueryCompiler {
    pub fn new(options: CompilerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Compile `keys` + `query` into a parameterized predicate
    pub fn compile(&self, keys: &Keys, query: &ToolkitQuery) -> CompiledQuery {
        let mut ctx = CompileContext::new(&self.options.alias, self.options.quote);

        let prefix = build_key_prefix(keys, &mut ctx);
        let root = prepare_where(Some(&query.expression), Conjunction::And, &mut ctx);
        let orex = root.orex;
        let where_clause = merge_with_filter(prefix, root);

        let order = order_columns(query.order.as_ref(), self.options.order_priority, &ctx);
        let (skip, take) = pagination(query);

        tracing::debug!(
            keys = keys.len(),
            nodes = ctx.nodes_visited(),
            params = ctx.params.len(),
            orex,
            order = order.len(),
            "Compiled query"
        );
        tracing::trace!(sql = %where_clause, "Compiled predicate");

        CompiledQuery {
            where_clause,
            params: ctx.into_params(),
            order,
            skip,
            take,
        }
    }
}

/// Compile with default options (alias `target`, bare identifiers, map-order sorting)
pub fn prepare_sql(keys: &Keys, query: &ToolkitQuery) -> CompiledQuery {
    QueryCompiler::default().compile(keys, query)
}
