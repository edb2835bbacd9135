//! Compilation of declarative filter conditions into store filters.
//!
//! Conditions are applied in order. Each one adds a term to the current
//! clause; a condition with `and: true` (other than the first) first opens a
//! new clause. Terms within a clause are alternatives and every clause must
//! hold, so the compiled expression is the AND of clauses, each the OR of
//! its terms:
//!
//! ```text
//! [{field: a, val: 1}, {field: a, val: 2}, {field: c, val: 3, and: true}]
//!   => (a=1 OR a=2) AND (c=3)
//! ```

use crate::error::QueryError;
use serde::{Deserialize, Serialize};
use tracing::debug;
use trailscope_store::{EventFilter, TrailStore};

/// One filter condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCondition {
    /// Field name; must exist in the store.
    pub field: String,
    /// Value to test for; "" tests for a missing value.
    pub val: String,
    /// Match events that do not have this value.
    #[serde(default)]
    pub neg: bool,
    /// AND a new clause onto the expression, starting with this term.
    /// Ignored on the first condition.
    #[serde(default)]
    pub and: bool,
}

impl FilterCondition {
    /// Condition matching `field == val`.
    pub fn new(field: impl Into<String>, val: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            val: val.into(),
            neg: false,
            and: false,
        }
    }

    /// Negates the condition.
    pub fn negated(mut self) -> Self {
        self.neg = true;
        self
    }

    /// Starts a new AND-joined clause at this condition.
    pub fn new_clause(mut self) -> Self {
        self.and = true;
        self
    }
}

/// Parses a JSON array of conditions.
pub fn parse_conditions(json: &str) -> Result<Vec<FilterCondition>, QueryError> {
    Ok(serde_json::from_str(json)?)
}

/// Compiles `conditions` against `store`.
///
/// An empty list yields an empty filter, which matches no event.
///
/// # Errors
///
/// - [`QueryError::FilterInitFailed`] if the store cannot allocate a filter
/// - [`QueryError::UnknownField`] if a condition names an unknown field
/// - [`QueryError::ClauseAppendFailed`] / [`QueryError::TermAppendFailed`]
///   if the store rejects a step
///
/// A partially built filter is dropped before the error is returned.
pub fn compile_filter<S: TrailStore>(
    store: &S,
    conditions: &[FilterCondition],
) -> Result<EventFilter, QueryError> {
    let mut filter = store.new_filter().map_err(QueryError::FilterInitFailed)?;

    for (i, condition) in conditions.iter().enumerate() {
        let field = store
            .field_index(&condition.field)
            .ok_or_else(|| QueryError::UnknownField {
                field: condition.field.clone(),
            })?;
        let item = store.item(field, &condition.val);

        if i > 0 && condition.and {
            filter
                .new_clause()
                .map_err(|source| QueryError::ClauseAppendFailed {
                    clause: filter.num_clauses(),
                    source,
                })?;
        }
        filter
            .add_term(item, condition.neg)
            .map_err(|source| QueryError::TermAppendFailed {
                field: condition.field.clone(),
                source,
            })?;
    }

    debug!(
        conditions = conditions.len(),
        clauses = filter.num_clauses(),
        expression = %filter,
        "compiled filter"
    );
    Ok(filter)
}
