//! Named-to-positional parameter binding
//!
//! The compiler emits `:name` placeholders; sqlx binds positionally. Array
//! parameters (IN / NOT IN) expand into one `?` per element.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::data::error::DataError;
use crate::data::filters::SqlParams;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":([^\s(),]+)").expect("Invalid regex"));

/// SQL with `?` placeholders and the values to bind, in order
#[derive(Debug, Clone, PartialEq)]
pub struct PositionalQuery {
    pub sql: String,
    pub values: Vec<Value>,
}

/// Rewrite every `:name` in `sql` to positional placeholders
pub fn expand_named(sql: &str, params: &SqlParams) -> Result<PositionalQuery, DataError> {
    let mut out = String::with_capacity(sql.len());
    let mut values = Vec::with_capacity(params.len());
    let mut last = 0;

    for caps in PLACEHOLDER.captures_iter(sql) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let name = name.as_str();
        let value = params
            .get(name)
            .ok_or_else(|| DataError::UnknownParameter(name.to_string()))?;

        out.push_str(&sql[last..whole.start()]);
        match value {
            Value::Array(items) => {
                if items.is_empty() {
                    return Err(DataError::invalid_membership_list(name));
                }
                out.push_str(&vec!["?"; items.len()].join(", "));
                values.extend(items.iter().cloned());
            }
            other => {
                out.push('?');
                values.push(other.clone());
            }
        }
        last = whole.end();
    }
    out.push_str(&sql[last..]);

    tracing::trace!(sql = %out, values = values.len(), "Expanded named parameters");
    Ok(PositionalQuery { sql: out, values })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(entries: &[(&str, Value)]) -> SqlParams {
        let mut params = SqlParams::default();
        for (name, value) in entries {
            params.insert(*name, value.clone());
        }
        params
    }

    #[test]
    fn scalars_become_question_marks() {
        let p = params(&[("id", json!(5)), ("name_1_0", json!("x"))]);
        let q = expand_named("target.id = :id AND (target.name = :name_1_0)", &p).unwrap();
        assert_eq!(q.sql, "target.id = ? AND (target.name = ?)");
        assert_eq!(q.values, vec![json!(5), json!("x")]);
    }

    #[test]
    fn arrays_expand_in_place() {
        let p = params(&[("a_1_0", json!([1, 2, 3])), ("b_1_1", json!(true))]);
        let q = expand_named("(target.a IN (:a_1_0) AND target.b = :b_1_1)", &p).unwrap();
        assert_eq!(q.sql, "(target.a IN (?, ?, ?) AND target.b = ?)");
        assert_eq!(q.values, vec![json!(1), json!(2), json!(3), json!(true)]);
    }

    #[test]
    fn empty_array_is_invalid_membership_list() {
        let p = params(&[("a_1_0", json!([]))]);
        let err = expand_named("(target.a NOT IN (:a_1_0))", &p).unwrap_err();
        assert!(matches!(err, DataError::InvalidMembershipList { param } if param == "a_1_0"));
    }

    #[test]
    fn unknown_parameter() {
        let err = expand_named("target.id = :id", &SqlParams::default()).unwrap_err();
        assert!(matches!(err, DataError::UnknownParameter(name) if name == "id"));
    }

    #[test]
    fn sql_without_placeholders_is_unchanged() {
        let q = expand_named("(target.a IS NULL)", &SqlParams::default()).unwrap();
        assert_eq!(q.sql, "(target.a IS NULL)");
        assert!(q.values.is_empty());
    }

    #[test]
    fn repeated_placeholder_binds_twice() {
        let p = params(&[("id", json!(1))]);
        let q = expand_named(":id = :id", &p).unwrap();
        assert_eq!(q.sql, "? = ?");
        assert_eq!(q.values.len(), 2);
    }
}
