//! Combinator resolver
//!
//! Recursively compiles one expression node: operator maps first, then the
//! `and`, `not`, `nor` and `or` combinators, each joined to what came before
//! with the conjunction the node itself was invoked under.

use super::operator::{compile_operator_map, operator_maps};
use super::types::{Expression, SqlParams};
use crate::utils::sql::{IdentQuote, qualify};

/// Boolean context a node is compiled under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conjunction {
    And,
    Or,
}

impl Conjunction {
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }

    /// Keyword padded for joining fragments
    pub fn separator(&self) -> &'static str {
        match self {
            Self::And => " AND ",
            Self::Or => " OR ",
        }
    }
}

/// Mutable state threaded through one compile call
///
/// Owns the parameter set and the node counter, so two compile calls never
/// share anything.
#[derive(Debug)]
pub struct CompileContext<'a> {
    pub params: SqlParams,
    index: usize,
    alias: &'a str,
    quote: IdentQuote,
}

impl<'a> CompileContext<'a> {
    pub fn new(alias: &'a str, quote: IdentQuote) -> Self {
        Self {
            params: SqlParams::default(),
            index: 0,
            alias,
            quote,
        }
    }

    /// Advance the node counter and return the index of the node being entered
    pub fn enter_node(&mut self) -> usize {
        self.index += 1;
        self.index
    }

    pub fn nodes_visited(&self) -> usize {
        self.index
    }

    /// Alias-qualified, quoted column reference
    pub fn column(&self, field: &str) -> String {
        qualify(self.alias, field, self.quote)
    }

    pub fn into_params(self) -> SqlParams {
        self.params
    }
}

/// Compiled SQL of one node
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    pub sql: String,
    /// Node should merge with an external prefix via OR instead of AND
    pub orex: bool,
    parts: usize,
    /// Bare terms joined at the top level of `sql`; an `and` list adds one per item term
    terms: usize,
}

impl Fragment {
    pub fn is_empty(&self) -> bool {
        self.parts == 0
    }

    /// Number of top-level contributions joined into `sql`
    pub fn parts(&self) -> usize {
        self.parts
    }

    /// Number of top-level terms in `sql`, counting each term of a spliced `and` list
    pub fn terms(&self) -> usize {
        self.terms
    }

    fn push(&mut self, part: &str, terms: usize, conjunction: Conjunction) {
        if self.parts > 0 {
            self.sql.push_str(conjunction.separator());
        }
        self.sql.push_str(part);
        self.parts += 1;
        self.terms += terms;
    }

    /// `NOT` applied to the whole fragment
    fn negated(&self) -> String {
        if self.terms > 1 {
            format!("NOT ({})", self.sql)
        } else {
            format!("NOT {}", self.sql)
        }
    }
}

/// Compile one node (and its subtree) under `conjunction`
///
/// An absent node yields an empty fragment without touching the counter.
pub fn prepare_where(
    node: Option<&Expression>,
    conjunction: Conjunction,
    ctx: &mut CompileContext<'_>,
) -> Fragment {
    let Some(node) = node else {
        return Fragment::default();
    };

    let index = ctx.enter_node();
    let mut out = Fragment::default();
    let mut position = 0;

    for (operator, operands) in operator_maps(node) {
        if let Some(part) =
            compile_operator_map(operator, operands, conjunction, index, &mut position, ctx)
        {
            out.push(&part, 1, conjunction);
        }
    }

    if let Some(items) = node.and.as_deref() {
        let seg = join_items(items, Conjunction::And, ctx);
        if !seg.is_empty() {
            out.push(&seg.sql, seg.terms, conjunction);
        }
    }

    if let Some(child) = node.not.as_deref() {
        let inner = prepare_where(Some(child), Conjunction::And, ctx);
        if !inner.is_empty() {
            out.push(&inner.negated(), 1, conjunction);
        }
    }

    if let Some(child) = node.nor.as_deref() {
        let leading = out.is_empty() && node.or.is_none();
        let inner = prepare_where(Some(child), Conjunction::Or, ctx);
        if !inner.is_empty() {
            out.orex |= leading;
            out.push(&inner.negated(), 1, conjunction);
        }
    }

    if let Some(items) = node.or.as_deref() {
        let leading = out.is_empty() && node.nor.is_none();
        let seg = join_items(items, Conjunction::Or, ctx);
        if !seg.is_empty() {
            out.orex |= leading;
            out.push(&format!("({})", seg.sql), 1, conjunction);
        }
    }

    tracing::trace!(
        node = index,
        parts = out.parts,
        orex = out.orex,
        sql = %out.sql,
        "Compiled expression node"
    );
    out
}

/// Compile list items under `conjunction`, dropping the ones that compile to nothing
fn join_items(
    items: &[Expression],
    conjunction: Conjunction,
    ctx: &mut CompileContext<'_>,
) -> Fragment {
    let mut seg = Fragment::default();
    for item in items {
        let compiled = prepare_where(Some(item), conjunction, ctx);
        if !compiled.is_empty() {
            seg.push(&compiled.sql, compiled.terms, conjunction);
        }
    }
    seg
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn compile(value: Value) -> (Fragment, SqlParams, usize) {
        let node: Expression = serde_json::from_value(value).unwrap();
        let mut ctx = CompileContext::new("target", IdentQuote::None);
        let fragment = prepare_where(Some(&node), Conjunction::And, &mut ctx);
        let visited = ctx.nodes_visited();
        (fragment, ctx.into_params(), visited)
    }

    #[test]
    fn absent_node_is_empty() {
        let mut ctx = CompileContext::new("target", IdentQuote::None);
        let fragment = prepare_where(None, Conjunction::And, &mut ctx);
        assert_eq!(fragment, Fragment::default());
        assert!(!fragment.orex);
        assert_eq!(ctx.nodes_visited(), 0);
    }

    #[test]
    fn empty_node_consumes_index_only() {
        let (fragment, params, visited) = compile(json!({}));
        assert_eq!(fragment.sql, "");
        assert!(params.is_empty());
        assert_eq!(visited, 1);
    }

    #[test]
    fn and_list_joins_with_and() {
        let (fragment, params, _) = compile(json!({"and": [{"eq": {"a": 1}}, {"eq": {"b": 2}}]}));
        assert_eq!(fragment.sql, "(target.a = :a_2_0) AND (target.b = :b_3_0)");
        assert!(!fragment.orex);
        assert_eq!(params.get("a_2_0"), Some(&json!(1)));
        assert_eq!(params.get("b_3_0"), Some(&json!(2)));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn or_list_is_one_parenthesized_group() {
        let (fragment, _, _) = compile(json!({"or": [{"eq": {"a": 1}}, {"eq": {"b": 2}}]}));
        assert_eq!(fragment.sql, "((target.a = :a_2_0) OR (target.b = :b_3_0))");
        assert!(fragment.orex);
        assert_eq!(fragment.parts(), 1);
    }

    #[test]
    fn not_prefixes_child() {
        let (fragment, params, _) = compile(json!({"not": {"eq": {"a": 1}}}));
        assert_eq!(fragment.sql, "NOT (target.a = :a_2_0)");
        assert!(!fragment.orex);
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn not_wraps_multi_part_child() {
        let (fragment, _, _) = compile(json!({"not": {"eq": {"a": 1}, "ne": {"b": 2}}}));
        assert_eq!(
            fragment.sql,
            "NOT ((target.a = :a_2_0) AND (target.b <> :b_2_1))"
        );
    }

    #[test]
    fn not_wraps_multi_item_and_child() {
        let (fragment, _, _) = compile(json!({"not": {"and": [{"eq": {"a": 1}}, {"eq": {"b": 2}}]}}));
        assert_eq!(
            fragment.sql,
            "NOT ((target.a = :a_3_0) AND (target.b = :b_4_0))"
        );
        assert!(!fragment.orex);
    }

    #[test]
    fn nor_wraps_multi_item_and_child() {
        let (fragment, _, _) = compile(json!({"nor": {"and": [{"eq": {"a": 1}}, {"eq": {"b": 2}}]}}));
        assert_eq!(
            fragment.sql,
            "NOT ((target.a = :a_3_0) AND (target.b = :b_4_0))"
        );
        assert!(fragment.orex);

        let (fragment, _, _) = compile(json!({"nor": {
            "eq": {"c": 3},
            "and": [{"eq": {"a": 1}}, {"eq": {"b": 2}}]
        }}));
        assert_eq!(
            fragment.sql,
            "NOT ((target.c = :c_2_0) OR (target.a = :a_3_0) AND (target.b = :b_4_0))"
        );
    }

    #[test]
    fn single_item_and_child_is_negated_bare() {
        let (fragment, _, _) = compile(json!({"not": {"and": [{"eq": {"a": 1}}]}}));
        assert_eq!(fragment.sql, "NOT (target.a = :a_3_0)");
    }

    #[test]
    fn and_list_counts_each_item_term() {
        let (fragment, _, _) = compile(json!({"and": [{"eq": {"a": 1}}, {"eq": {"b": 2}}]}));
        assert_eq!(fragment.parts(), 1);
        assert_eq!(fragment.terms(), 2);

        let (fragment, _, _) = compile(json!({"or": [{"eq": {"a": 1}}, {"eq": {"b": 2}}]}));
        assert_eq!(fragment.terms(), 1);
    }

    #[test]
    fn nor_compiles_child_under_or() {
        let (fragment, _, _) = compile(json!({"nor": {"eq": {"a": 1, "b": 2}}}));
        assert_eq!(fragment.sql, "NOT (target.a = :a_2_0 OR target.b = :b_2_1)");
        assert!(fragment.orex);
    }

    #[test]
    fn nor_with_sibling_or_is_not_orex() {
        let (fragment, _, _) = compile(json!({"nor": {"eq": {"a": 1}}, "or": [{"eq": {"b": 2}}]}));
        assert_eq!(
            fragment.sql,
            "NOT (target.a = :a_2_0) AND ((target.b = :b_3_0))"
        );
        assert!(!fragment.orex);
    }

    #[test]
    fn operator_map_before_or_is_not_orex() {
        let (fragment, _, _) = compile(json!({"eq": {"a": 1}, "or": [{"eq": {"b": 2}}]}));
        assert_eq!(fragment.sql, "(target.a = :a_1_0) AND ((target.b = :b_2_0))");
        assert!(!fragment.orex);
    }

    #[test]
    fn not_before_nor_is_not_orex() {
        let (fragment, _, _) = compile(json!({"not": {"eq": {"a": 1}}, "nor": {"eq": {"b": 2}}}));
        assert_eq!(
            fragment.sql,
            "NOT (target.a = :a_2_0) AND NOT (target.b = :b_3_0)"
        );
        assert!(!fragment.orex);
    }

    #[test]
    fn fixed_contribution_order() {
        let (fragment, _, _) = compile(json!({
            "or": [{"eq": {"e": 5}}],
            "nor": {"eq": {"d": 4}},
            "not": {"eq": {"c": 3}},
            "and": [{"eq": {"b": 2}}],
            "eq": {"a": 1}
        }));
        assert_eq!(
            fragment.sql,
            "(target.a = :a_1_0) AND (target.b = :b_2_0) AND NOT (target.c = :c_3_0) \
             AND NOT (target.d = :d_4_0) AND ((target.e = :e_5_0))"
        );
    }

    #[test]
    fn or_item_joins_its_own_parts_with_or() {
        let (fragment, _, _) = compile(json!({"or": [
            {"eq": {"a": 1}, "and": [{"eq": {"b": 2}}, {"eq": {"c": 3}}]},
            {"eq": {"d": 4}}
        ]}));
        assert_eq!(
            fragment.sql,
            "((target.a = :a_2_0) OR (target.b = :b_3_0) AND (target.c = :c_4_0) \
             OR (target.d = :d_5_0))"
        );
    }

    #[test]
    fn empty_children_leave_no_dangling_keywords() {
        let (fragment, _, visited) = compile(json!({"and": [{}, {"eq": {"a": 1}}, {}]}));
        assert_eq!(fragment.sql, "(target.a = :a_3_0)");
        assert_eq!(visited, 4);

        let (fragment, _, _) = compile(json!({"not": {}}));
        assert_eq!(fragment.sql, "");

        let (fragment, _, _) = compile(json!({"or": []}));
        assert_eq!(fragment.sql, "");
        assert!(!fragment.orex);
    }

    #[test]
    fn repeated_field_gets_unique_names() {
        let (_, params, _) = compile(json!({
            "eq": {"a": 1},
            "ne": {"a": 0},
            "and": [{"eq": {"a": 2}}],
            "or": [{"eq": {"a": 3}}]
        }));
        let names: Vec<&String> = params.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["a_1_0", "a_1_1", "a_2_0", "a_3_0"]);
    }

    #[test]
    fn null_test_in_tree_binds_nothing() {
        let (fragment, params, _) = compile(json!({"nil": {"a": true}, "in": {"b": [1, 2]}}));
        assert_eq!(fragment.sql, "(target.b IN (:b_1_0)) AND (target.a IS NULL)");
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn quoting_applies_to_alias_and_columns() {
        let node: Expression = serde_json::from_value(json!({"eq": {"a": 1}})).unwrap();
        let mut ctx = CompileContext::new("target", IdentQuote::Backtick);
        let fragment = prepare_where(Some(&node), Conjunction::And, &mut ctx);
        assert_eq!(fragment.sql, "(`target`.`a` = :a_1_0)");
    }
}
