//! Filter type definitions
//!
//! The expression tree mirrors the MongoDB-flavored JSON that clients send:
//! each node may carry any subset of operator maps and combinators.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number, Value};

use crate::data::error::DataError;

/// Scalar operand: the only values a comparison map may hold
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(Number),
    String(String),
}

impl Scalar {
    pub fn to_value(&self) -> Value {
        match self {
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) => Value::Number(n.clone()),
            Self::String(s) => Value::String(s.clone()),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Insertion-ordered `field -> value` map
///
/// Field order is observable in the generated SQL and in parameter names,
/// so the JSON object order is kept exactly. A repeated field keeps its
/// first position and takes the last value, matching JSON object semantics.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMap<T> {
    entries: Vec<(String, T)>,
}

impl<T> FieldMap<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn insert(&mut self, field: impl Into<String>, value: T) {
        let field = field.into();
        match self.entries.iter_mut().find(|(f, _)| *f == field) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((field, value)),
        }
    }

    pub fn get(&self, field: &str) -> Option<&T> {
        self.entries.iter().find(|(f, _)| f == field).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(f, v)| (f.as_str(), v))
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(f, _)| f.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for FieldMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Into<String>, T> FromIterator<(K, T)> for FieldMap<T> {
    fn from_iter<I: IntoIterator<Item = (K, T)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (field, value) in iter {
            map.insert(field, value);
        }
        map
    }
}

struct FieldMapVisitor<T>(PhantomData<T>);

impl<'de, T: Deserialize<'de>> Visitor<'de> for FieldMapVisitor<T> {
    type Value = FieldMap<T>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object mapping field names to operands")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = FieldMap::new();
        while let Some((field, value)) = access.next_entry::<String, T>()? {
            map.insert(field, value);
        }
        Ok(map)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for FieldMap<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(FieldMapVisitor(PhantomData))
    }
}

impl<T: Serialize> Serialize for FieldMap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (field, value) in &self.entries {
            map.serialize_entry(field, value)?;
        }
        map.end()
    }
}

/// Mandatory equality constraints supplied by trusted code
pub type Keys = FieldMap<Scalar>;

/// One node of the filter tree
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Expression {
    #[serde(rename = "if", skip_serializing_if = "Option::is_none")]
    pub if_: Option<FieldMap<Scalar>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eq: Option<FieldMap<Scalar>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ne: Option<FieldMap<Scalar>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gt: Option<FieldMap<Scalar>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gte: Option<FieldMap<Scalar>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lt: Option<FieldMap<Scalar>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lte: Option<FieldMap<Scalar>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub like: Option<FieldMap<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nlike: Option<FieldMap<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rlike: Option<FieldMap<String>>,
    #[serde(rename = "in", skip_serializing_if = "Option::is_none")]
    pub in_: Option<FieldMap<Vec<Scalar>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nin: Option<FieldMap<Vec<Scalar>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nil: Option<FieldMap<bool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<Expression>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nor: Option<Box<Expression>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub and: Option<Vec<Expression>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub or: Option<Vec<Expression>>,
}

impl Expression {
    /// True when no operator map or combinator is set at all
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Nesting depth; a lone node has depth 1
    pub fn depth(&self) -> usize {
        let nested = self.not.iter().chain(self.nor.iter()).map(|e| e.depth());
        let listed = self
            .and
            .iter()
            .chain(self.or.iter())
            .flatten()
            .map(Expression::depth);
        1 + nested.chain(listed).max().unwrap_or(0)
    }

    /// Every field referenced anywhere in the tree, in visit order
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        for map in [
            &self.if_, &self.eq, &self.ne, &self.gt, &self.gte, &self.lt, &self.lte,
        ]
        .into_iter()
        .flatten()
        {
            out.extend(map.fields());
        }
        for map in [&self.like, &self.nlike, &self.rlike].into_iter().flatten() {
            out.extend(map.fields());
        }
        for map in [&self.in_, &self.nin].into_iter().flatten() {
            out.extend(map.fields());
        }
        if let Some(map) = &self.nil {
            out.extend(map.fields());
        }
        for child in self.not.iter().chain(self.nor.iter()) {
            child.collect_fields(out);
        }
        for child in self.and.iter().chain(self.or.iter()).flatten() {
            child.collect_fields(out);
        }
    }
}

/// Expression plus ordering and pagination hints
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ToolkitQuery {
    #[serde(flatten)]
    pub expression: Expression,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<FieldMap<i64>>,
    /// Raw passthrough; never read by the compiler
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exists: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub take: Option<i64>,
}

impl ToolkitQuery {
    /// Validate every referenced field (filter and order) against a whitelist
    pub fn validate(&self, allowed_fields: &[&str]) -> Result<(), DataError> {
        let ordered = self.order.iter().flat_map(|o| o.fields());
        for field in self.expression.fields().into_iter().chain(ordered) {
            if !allowed_fields.contains(&field) {
                return Err(DataError::InvalidField(field.to_string()));
            }
        }
        Ok(())
    }
}

/// Bound parameters collected during compilation (maintains insertion order)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SqlParams {
    values: Map<String, Value>,
}

impl SqlParams {
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.values
    }
}

/// One sort column of the compiled query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderColumn {
    pub column: String,
    pub asc: bool,
}

/// Output of one compile call, ready for the execution layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledQuery {
    /// SQL predicate; empty means "match all rows"
    #[serde(rename = "where")]
    pub where_clause: String,
    pub params: SqlParams,
    pub order: Vec<OrderColumn>,
    pub skip: Option<i64>,
    pub take: Option<i64>,
}
