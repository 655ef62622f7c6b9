//! Query filter system
//!
//! Compiles a nested, MongoDB-flavored filter expression plus trusted key
//! constraints into a parameterized SQL predicate, bound parameters, sort
//! columns and pagination hints.
//!
//! ## Usage
//!
//! ```no_run
//! use toolkit_query::data::filters::{ParseLimits, QueryCompiler, parse_keys, parse_query};
//!
//! let keys = parse_keys(r#"{"tenant": "acme"}"#).unwrap();
//! let query = parse_query(
//!     r#"{"eq": {"status": "open"}, "order": {"createdAt": -1}, "take": 20}"#,
//!     &ParseLimits::default(),
//! )
//! .unwrap();
//! let compiled = QueryCompiler::default().compile(&keys, &query);
//! assert_eq!(
//!     compiled.where_clause,
//!     "target.tenant = :tenant AND (target.status = :status_1_0)"
//! );
//! ```

mod builder;
mod compiler;
mod keys;
mod operator;
mod order;
mod parser;
mod types;

pub use builder::{CompileContext, Conjunction, Fragment, prepare_where};
pub use compiler::{CompilerOptions, QueryCompiler, prepare_sql};
pub use keys::{build_key_prefix, merge_with_filter};
pub use operator::{Operands, Operator, compile_operator_map, operator_maps};
pub use order::{OrderPriority, order_columns, pagination};
pub use parser::{ParseLimits, parse_keys, parse_query, parse_query_checked};
pub use types::{
    CompiledQuery, Expression, FieldMap, Keys, OrderColumn, Scalar, SqlParams, ToolkitQuery,
};
