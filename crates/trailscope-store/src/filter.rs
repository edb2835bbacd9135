//! Event filter expressions evaluated by cursors.
//!
//! A filter is a conjunction of clauses; each clause is a disjunction of
//! signed item terms. The first clause always exists, [`EventFilter::new_clause`]
//! opens another and [`EventFilter::add_term`] appends to the last one.

use crate::errors::StoreError;
use std::fmt;
use trailscope_codec::{field_index, value_id, FieldIndex, Item};

/// Maximum number of clauses in one filter.
pub const MAX_CLAUSES: usize = 1 << 16;

/// Maximum number of terms in one clause.
pub const MAX_TERMS_PER_CLAUSE: usize = 1 << 16;

/// One signed equality test against an event's items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Term {
    /// Item the event must (or must not) contain.
    pub item: Item,
    /// When true the term matches events that do not contain `item`.
    pub negated: bool,
}

impl Term {
    /// Returns true if `items` satisfies this term.
    pub fn matches(&self, items: &[Item]) -> bool {
        items.contains(&self.item) != self.negated
    }
}

/// Conjunction of disjunctions of [`Term`]s.
///
/// A clause without terms matches nothing, so a freshly created filter
/// rejects every event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFilter {
    clauses: Vec<Vec<Term>>,
}

impl EventFilter {
    /// Creates a filter with one open, empty clause.
    pub fn new() -> Self {
        Self {
            clauses: vec![Vec::new()],
        }
    }

    /// Appends a term to the current clause.
    pub fn add_term(&mut self, item: Item, negated: bool) -> Result<(), StoreError> {
        let clause_no = self.clauses.len();
        let clause = self
            .clauses
            .last_mut()
            .ok_or_else(|| StoreError::FilterCapacity {
                what: "filter has no open clause".to_string(),
            })?;
        if clause.len() >= MAX_TERMS_PER_CLAUSE {
            return Err(StoreError::FilterCapacity {
                what: format!(
                    "clause {} already has {} terms",
                    clause_no, MAX_TERMS_PER_CLAUSE
                ),
            });
        }
        clause.push(Term { item, negated });
        Ok(())
    }

    /// Closes the current clause and opens a new, empty one joined by AND.
    pub fn new_clause(&mut self) -> Result<(), StoreError> {
        if self.clauses.len() >= MAX_CLAUSES {
            return Err(StoreError::FilterCapacity {
                what: format!("filter already has {} clauses", MAX_CLAUSES),
            });
        }
        self.clauses.push(Vec::new());
        Ok(())
    }

    /// Number of clauses, including the initial one.
    pub fn num_clauses(&self) -> usize {
        self.clauses.len()
    }

    /// Terms of clause `index`.
    pub fn clause(&self, index: usize) -> Option<&[Term]> {
        self.clauses.get(index).map(Vec::as_slice)
    }

    /// Iterates over clauses in order.
    pub fn clauses(&self) -> impl Iterator<Item = &[Term]> {
        self.clauses.iter().map(Vec::as_slice)
    }

    /// Total number of terms across all clauses.
    pub fn num_terms(&self) -> usize {
        self.clauses.iter().map(Vec::len).sum()
    }

    /// Highest field index referenced by any term.
    pub fn max_field(&self) -> Option<FieldIndex> {
        self.clauses
            .iter()
            .flatten()
            .map(|term| field_index(term.item))
            .max()
    }

    /// Evaluates the filter against one event's items.
    pub fn matches(&self, items: &[Item]) -> bool {
        self.clauses
            .iter()
            .all(|clause| clause.iter().any(|term| term.matches(items)))
    }
}

impl Default for EventFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            f.write_str("NOT ")?;
        }
        write!(f, "{}:{}", field_index(self.item), value_id(self.item))
    }
}

/// Renders as `(1:2 OR NOT 2:1) AND (1:3)`.
impl fmt::Display for EventFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                f.write_str(" AND ")?;
            }
            f.write_str("(")?;
            for (j, term) in clause.iter().enumerate() {
                if j > 0 {
                    f.write_str(" OR ")?;
                }
                write!(f, "{}", term)?;
            }
            f.write_str(")")?;
        }
        Ok(())
    }
}
