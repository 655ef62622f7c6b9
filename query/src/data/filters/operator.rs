//! Operator compiler
//!
//! Turns one `field -> operand` map of an expression node into a single
//! parenthesized SQL condition, binding every operand as a named parameter.

use serde_json::Value;

use super::builder::{CompileContext, Conjunction};
use super::types::{Expression, FieldMap, Scalar};
use crate::utils::sql::{param_name, placeholder};

/// Operator keys recognized on an expression node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    If,
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    RLike,
    NotLike,
    In,
    NotIn,
    Nil,
}

impl Operator {
    /// JSON key of the operator map
    pub fn name(&self) -> &'static str {
        match self {
            Self::If => "if",
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Like => "like",
            Self::RLike => "rlike",
            Self::NotLike => "nlike",
            Self::In => "in",
            Self::NotIn => "nin",
            Self::Nil => "nil",
        }
    }

    /// SQL token placed between column and placeholder
    ///
    /// The null test has no token of its own; see [`Operands::Nulls`].
    pub fn sql(&self) -> &'static str {
        match self {
            Self::If | Self::Eq => "=",
            Self::Ne => "<>",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Like => "LIKE",
            Self::RLike => "RLIKE",
            Self::NotLike => "NOT LIKE",
            Self::In => "IN",
            Self::NotIn => "NOT IN",
            Self::Nil => "IS",
        }
    }
}

/// Borrowed operand map of one operator
#[derive(Debug, Clone, Copy)]
pub enum Operands<'a> {
    Scalars(&'a FieldMap<Scalar>),
    Patterns(&'a FieldMap<String>),
    Members(&'a FieldMap<Vec<Scalar>>),
    Nulls(&'a FieldMap<bool>),
}

impl Operands<'_> {
    fn is_empty(&self) -> bool {
        match self {
            Self::Scalars(m) => m.is_empty(),
            Self::Patterns(m) => m.is_empty(),
            Self::Members(m) => m.is_empty(),
            Self::Nulls(m) => m.is_empty(),
        }
    }
}

/// The operator maps present on a node, in the fixed compile order
pub fn operator_maps(node: &Expression) -> Vec<(Operator, Operands<'_>)> {
    let scalars = [
        (Operator::If, &node.if_),
        (Operator::Eq, &node.eq),
        (Operator::Ne, &node.ne),
        (Operator::Gt, &node.gt),
        (Operator::Gte, &node.gte),
        (Operator::Lt, &node.lt),
        (Operator::Lte, &node.lte),
    ];
    let patterns = [
        (Operator::Like, &node.like),
        (Operator::RLike, &node.rlike),
        (Operator::NotLike, &node.nlike),
    ];
    let members = [(Operator::In, &node.in_), (Operator::NotIn, &node.nin)];

    let mut maps = Vec::new();
    for (op, map) in scalars {
        if let Some(m) = map {
            maps.push((op, Operands::Scalars(m)));
        }
    }
    for (op, map) in patterns {
        if let Some(m) = map {
            maps.push((op, Operands::Patterns(m)));
        }
    }
    for (op, map) in members {
        if let Some(m) = map {
            maps.push((op, Operands::Members(m)));
        }
    }
    if let Some(m) = &node.nil {
        maps.push((Operator::Nil, Operands::Nulls(m)));
    }
    maps
}

/// Compile one operator map into `(cond [AND|OR] cond ...)`
///
/// `position` is the node's running field counter; it advances once per field,
/// null tests included, so names stay unique across all maps of the node.
/// Returns `None` for an empty map.
pub fn compile_operator_map(
    operator: Operator,
    operands: Operands<'_>,
    conjunction: Conjunction,
    node: usize,
    position: &mut usize,
    ctx: &mut CompileContext<'_>,
) -> Option<String> {
    if operands.is_empty() {
        return None;
    }

    let mut conditions: Vec<String> = Vec::new();

    match operands {
        Operands::Scalars(map) => {
            for (field, value) in map.iter() {
                conditions.push(bind(operator, field, value.to_value(), node, position, ctx));
            }
        }
        Operands::Patterns(map) => {
            for (field, pattern) in map.iter() {
                conditions.push(bind(
                    operator,
                    field,
                    Value::String(pattern.clone()),
                    node,
                    position,
                    ctx,
                ));
            }
        }
        Operands::Members(map) => {
            for (field, items) in map.iter() {
                let array = Value::Array(items.iter().map(Scalar::to_value).collect());
                conditions.push(bind(operator, field, array, node, position, ctx));
            }
        }
        Operands::Nulls(map) => {
            for (field, is_null) in map.iter() {
                let test = if *is_null { "IS NULL" } else { "IS NOT NULL" };
                conditions.push(format!("{} {}", ctx.column(field), test));
                *position += 1;
            }
        }
    }

    Some(format!("({})", conditions.join(conjunction.separator())))
}

/// Register `value` under the next parameter name and return the condition
fn bind(
    operator: Operator,
    field: &str,
    value: Value,
    node: usize,
    position: &mut usize,
    ctx: &mut CompileContext<'_>,
) -> String {
    let name = param_name(field, node, *position);
    let column = ctx.column(field);
    let sql = match operator {
        Operator::In | Operator::NotIn => {
            format!("{} {} ({})", column, operator.sql(), placeholder(&name))
        }
        _ => format!("{} {} {}", column, operator.sql(), placeholder(&name)),
    };
    ctx.params.insert(name, value);
    *position += 1;
    sql
}
