//! SQL identifier and placeholder helpers
//!
//! Every column reference and bind-parameter name the compiler emits goes
//! through these functions, so dialect specifics live in one place.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier quoting style applied to the table alias and every column
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentQuote {
    /// Bare identifiers: `target.status`
    #[default]
    None,
    /// MySQL style: `` `target`.`status` ``
    Backtick,
    /// ANSI style: `"target"."status"`
    Double,
}

impl IdentQuote {
    pub fn as_char(&self) -> Option<char> {
        match self {
            Self::None => None,
            Self::Backtick => Some('`'),
            Self::Double => Some('"'),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Backtick => "backtick",
            Self::Double => "double",
        }
    }
}

impl fmt::Display for IdentQuote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Quote a single identifier
///
/// An embedded quote character is doubled, which is the escape rule shared by
/// MySQL backticks and ANSI double quotes.
pub fn quote_ident(ident: &str, quote: IdentQuote) -> String {
    match quote.as_char() {
        None => ident.to_string(),
        Some(q) => {
            let doubled: String = [q, q].iter().collect();
            format!("{q}{}{q}", ident.replace(q, &doubled))
        }
    }
}

/// Qualify a column with the table alias: `alias.column`
pub fn qualify(alias: &str, column: &str, quote: IdentQuote) -> String {
    format!("{}.{}", quote_ident(alias, quote), quote_ident(column, quote))
}

/// Bind-parameter name for a field inside an expression node: `{field}_{node}_{position}`
pub fn param_name(field: &str, node: usize, position: usize) -> String {
    format!("{}_{}_{}", field, node, position)
}

/// Named placeholder for a parameter: `:name`
pub fn placeholder(name: &str) -> String {
    format!(":{}", name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident_none() {
        assert_eq!(quote_ident("status", IdentQuote::None), "status");
    }

    #[test]
    fn test_quote_ident_backtick() {
        assert_eq!(quote_ident("status", IdentQuote::Backtick), "`status`");
    }

    #[test]
    fn test_quote_ident_double_escapes_embedded_quote() {
        assert_eq!(quote_ident("we\"ird", IdentQuote::Double), "\"we\"\"ird\"");
    }

    #[test]
    fn test_qualify_quotes_alias_and_column() {
        assert_eq!(qualify("target", "a", IdentQuote::None), "target.a");
        assert_eq!(
            qualify("target", "createdAt", IdentQuote::Backtick),
            "`target`.`createdAt`"
        );
    }

    #[test]
    fn test_param_name() {
        assert_eq!(param_name("status", 1, 0), "status_1_0");
        assert_eq!(placeholder("status_1_0"), ":status_1_0");
    }

    #[test]
    fn test_ident_quote_serde() {
        let quote: IdentQuote = serde_json::from_str(r#""backtick""#).unwrap();
        assert_eq!(quote, IdentQuote::Backtick);
        assert_eq!(IdentQuote::default().to_string(), "none");
    }
}
