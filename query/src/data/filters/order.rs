//! Order and pagination extraction

use std::fmt;

use serde::{Deserialize, Serialize};

use super::builder::CompileContext;
use super::types::{FieldMap, OrderColumn, ToolkitQuery};

/// How entries of the `order` map are prioritized
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderPriority {
    /// Map order, as written by the client
    #[default]
    Insertion,
    /// Larger `|value|` sorts first; ties keep map order
    Magnitude,
}

impl OrderPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Insertion => "insertion",
            Self::Magnitude => "magnitude",
        }
    }
}

impl fmt::Display for OrderPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Convert the order map into qualified sort columns
///
/// Non-negative values sort ascending, negative values descending.
pub fn order_columns(
    order: Option<&FieldMap<i64>>,
    priority: OrderPriority,
    ctx: &CompileContext<'_>,
) -> Vec<OrderColumn> {
    let Some(order) = order else {
        return Vec::new();
    };

    let mut entries: Vec<(&str, i64)> = order.iter().map(|(f, v)| (f, *v)).collect();
    if priority == OrderPriority::Magnitude {
        // sort_by_key is stable
        entries.sort_by_key(|(_, v)| std::cmp::Reverse(v.unsigned_abs()));
    }

    entries
        .into_iter()
        .map(|(field, value)| OrderColumn {
            column: ctx.column(field),
            asc: value >= 0,
        })
        .collect()
}

/// `skip` and `take`, passed through untouched
pub fn pagination(query: &ToolkitQuery) -> (Option<i64>, Option<i64>) {
    (query.skip, query.take)
}
