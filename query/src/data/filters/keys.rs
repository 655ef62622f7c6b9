//! Key-equality prefix
//!
//! Trusted key constraints become `alias.field = :field` conditions that are
//! always combined with the compiled filter.

use super::builder::{CompileContext, Conjunction, Fragment};
use super::types::Keys;
use crate::utils::sql::placeholder;

/// Build `alias.k1 = :k1 AND alias.k2 = :k2 ...`, binding each key under its own name
pub fn build_key_prefix(keys: &Keys, ctx: &mut CompileContext<'_>) -> String {
    let mut conditions = Vec::with_capacity(keys.len());
    for (field, value) in keys.iter() {
        conditions.push(format!("{} = {}", ctx.column(field), placeholder(field)));
        ctx.params.insert(field, value.to_value());
    }
    conditions.join(Conjunction::And.separator())
}

/// Merge the key prefix with the root filter fragment
///
/// Both present: joined with OR when the root is an OR-style node, AND otherwise.
pub fn merge_with_filter(prefix: String, root: Fragment) -> String {
    if prefix.is_empty() {
        return root.sql;
    }
    if root.sql.is_empty() {
        return prefix;
    }
    let conjunction = if root.orex {
        Conjunction::Or
    } else {
        Conjunction::And
    };
    format!("{} {} {}", prefix, conjunction.keyword(), root.sql)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filters::builder::prepare_where;
    use crate::data::filters::types::{Expression, Scalar};
    use crate::utils::sql::IdentQuote;
    use serde_json::json;

    fn root(ctx: &mut CompileContext<'_>, value: serde_json::Value) -> Fragment {
        let node: Expression = serde_json::from_value(value).unwrap();
        prepare_where(Some(&node), Conjunction::And, ctx)
    }

    #[test]
    fn prefix_binds_keys_by_name() {
        let keys: Keys = [("tenant", Scalar::from("acme")), ("id", Scalar::from(5))]
            .into_iter()
            .collect();
        let mut ctx = CompileContext::new("target", IdentQuote::None);
        let prefix = build_key_prefix(&keys, &mut ctx);

        assert_eq!(prefix, "target.tenant = :tenant AND target.id = :id");
        assert_eq!(ctx.params.get("tenant"), Some(&json!("acme")));
        assert_eq!(ctx.params.get("id"), Some(&json!(5)));
    }

    #[test]
    fn empty_keys_give_empty_prefix() {
        let mut ctx = CompileContext::new("target", IdentQuote::None);
        assert_eq!(build_key_prefix(&Keys::new(), &mut ctx), "");
        assert!(ctx.params.is_empty());
    }

    #[test]
    fn merge_uses_and_by_default() {
        let mut ctx = CompileContext::new("target", IdentQuote::None);
        let fragment = root(&mut ctx, json!({"eq": {"name": "x"}}));
        assert_eq!(
            merge_with_filter("target.id = :id".to_string(), fragment),
            "target.id = :id AND (target.name = :name_1_0)"
        );
    }

    #[test]
    fn merge_uses_or_for_orex_root() {
        let mut ctx = CompileContext::new("target", IdentQuote::None);
        let fragment = root(&mut ctx, json!({"or": [{"eq": {"a": 1}}, {"eq": {"b": 2}}]}));
        assert_eq!(
            merge_with_filter("target.id = :id".to_string(), fragment),
            "target.id = :id OR ((target.a = :a_2_0) OR (target.b = :b_3_0))"
        );
    }

    #[test]
    fn merge_with_one_side_empty() {
        let mut ctx = CompileContext::new("target", IdentQuote::None);
        let empty = root(&mut ctx, json!({}));
        assert_eq!(
            merge_with_filter("target.id = :id".to_string(), empty),
            "target.id = :id"
        );

        let fragment = root(&mut ctx, json!({"nor": {"eq": {"a": 1}}}));
        assert_eq!(
            merge_with_filter(String::new(), fragment),
            "NOT (target.a = :a_3_0)"
        );
    }
}
