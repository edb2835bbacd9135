//! Field name table and per-field value lexicons.

use crate::errors::StoreError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use trailscope_codec::item::MAX_FIELD;
use trailscope_codec::{FieldIndex, ValueId};

/// Name of the reserved timestamp pseudo-field at index 0.
pub const TIME_FIELD: &str = "time";

/// Bidirectional field index <-> name table.
///
/// Index 0 is always [`TIME_FIELD`]; user fields occupy `1..=N` in
/// declaration order. Built once and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldTable {
    names: Vec<String>,
    index: HashMap<String, FieldIndex>,
}

impl FieldTable {
    /// Builds a table from user field names.
    ///
    /// # Errors
    ///
    /// - [`StoreError::InvalidFieldName`] for an empty, reserved or duplicated name
    /// - [`StoreError::TooManyFields`] past what an item can address
    pub fn new<S: AsRef<str>>(user_fields: &[S]) -> Result<Self, StoreError> {
        if user_fields.len() > MAX_FIELD as usize {
            return Err(StoreError::TooManyFields {
                count: user_fields.len(),
                max: MAX_FIELD,
            });
        }

        let mut names = Vec::with_capacity(user_fields.len() + 1);
        let mut index = HashMap::with_capacity(user_fields.len() + 1);
        names.push(TIME_FIELD.to_string());
        index.insert(TIME_FIELD.to_string(), 0);

        for name in user_fields {
            let name = name.as_ref();
            let invalid = |reason| StoreError::InvalidFieldName {
                name: name.to_string(),
                reason,
            };
            if name.is_empty() {
                return Err(invalid("empty"));
            }
            if name == TIME_FIELD {
                return Err(invalid("reserved"));
            }
            if index.contains_key(name) {
                return Err(invalid("duplicate"));
            }
            index.insert(name.to_string(), names.len() as FieldIndex);
            names.push(name.to_string());
        }

        Ok(Self { names, index })
    }

    /// Number of fields including the timestamp pseudo-field.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always false: the timestamp pseudo-field is present.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Number of user fields.
    pub fn num_user_fields(&self) -> usize {
        self.names.len() - 1
    }

    /// Resolves a field name to its index.
    pub fn index_of(&self, name: &str) -> Option<FieldIndex> {
        self.index.get(name).copied()
    }

    /// Resolves a field index to its name.
    pub fn name_of(&self, field: FieldIndex) -> Option<&str> {
        self.names.get(field as usize).map(String::as_str)
    }

    /// User field names in index order (excludes `time`).
    pub fn user_fields(&self) -> &[String] {
        &self.names[1..]
    }
}

/// Distinct values of one field. Value id `i + 1` is `values[i]`; id 0 is "".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lexicon {
    values: Vec<String>,
    ids: HashMap<String, ValueId>,
}

/// On-disk form of a lexicon section.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct LexiconSection {
    pub field: String,
    pub values: Vec<String>,
}

impl Lexicon {
    /// Builds a lexicon from values in id order; duplicates are rejected.
    pub(crate) fn from_values(values: Vec<String>) -> Result<Self, StoreError> {
        let mut ids = HashMap::with_capacity(values.len());
        for (i, value) in values.iter().enumerate() {
            let invalid = |reason| StoreError::InvalidLexiconValue {
                value: value.clone(),
                reason,
            };
            if value.is_empty() {
                return Err(invalid("empty"));
            }
            if ids.insert(value.clone(), i as ValueId + 1).is_some() {
                return Err(invalid("duplicate"));
            }
        }
        Ok(Self { values, ids })
    }

    /// Returns the id of `value`, adding it if unseen. "" is always 0.
    pub(crate) fn intern(&mut self, value: &str) -> ValueId {
        if value.is_empty() {
            return 0;
        }
        if let Some(id) = self.ids.get(value) {
            return *id;
        }
        self.values.push(value.to_string());
        let id = self.values.len() as ValueId;
        self.ids.insert(value.to_string(), id);
        id
    }

    /// Looks up the id of `value` without adding it.
    pub fn id_of(&self, value: &str) -> Option<ValueId> {
        if value.is_empty() {
            return Some(0);
        }
        self.ids.get(value).copied()
    }

    /// Looks up the value of `id`.
    pub fn value_of(&self, id: ValueId) -> Option<&str> {
        if id == 0 {
            return Some("");
        }
        self.values.get(id as usize - 1).map(String::as_str)
    }

    /// Number of distinct non-empty values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the field only ever held the empty value.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn values(&self) -> &[String] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_is_field_zero() {
        let table = FieldTable::new(&["field1", "field2"]).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.index_of("time"), Some(0));
        assert_eq!(table.index_of("field2"), Some(2));
        assert_eq!(table.name_of(1), Some("field1"));
        assert_eq!(table.name_of(3), None);
        assert_eq!(table.user_fields(), &["field1".to_string(), "field2".to_string()]);
    }

    #[test]
    fn rejects_reserved_and_duplicate_names() {
        assert!(matches!(
            FieldTable::new(&["time"]),
            Err(StoreError::InvalidFieldName { reason: "reserved", .. })
        ));
        assert!(matches!(
            FieldTable::new(&["a", "a"]),
            Err(StoreError::InvalidFieldName { reason: "duplicate", .. })
        ));
        assert!(matches!(
            FieldTable::new(&[""]),
            Err(StoreError::InvalidFieldName { reason: "empty", .. })
        ));
    }

    #[test]
    fn lexicon_interns_once() {
        let mut lexicon = Lexicon::default();
        assert_eq!(lexicon.intern("a"), 1);
        assert_eq!(lexicon.intern("b"), 2);
        assert_eq!(lexicon.intern("a"), 1);
        assert_eq!(lexicon.intern(""), 0);
        assert_eq!(lexicon.value_of(2), Some("b"));
        assert_eq!(lexicon.value_of(0), Some(""));
        assert_eq!(lexicon.value_of(3), None);
        assert_eq!(lexicon.id_of("c"), None);
    }

    #[test]
    fn lexicon_rejects_duplicates() {
        assert!(matches!(
            Lexicon::from_values(vec!["x".into(), "x".into()]),
            Err(StoreError::InvalidLexiconValue { reason: "duplicate", .. })
        ));
    }
}
