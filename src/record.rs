//! LNMP record data model
//!
//! Typed key-value fields addressed by compact numeric ids. Both codecs
//! iterate fields in ascending id order, so encoding is a pure function of
//! the field set.

use std::collections::BTreeMap;

/// Largest field id the protocol admits (nine decimal digits)
pub const MAX_FIELD_ID: u32 = 999_999_999;

/// Well-known field ids consumed by the context scorer
pub mod field_ids {
    /// Nonzero integer flags the record as urgent
    pub const URGENT: u32 = 7;
    /// Priority class: integer 0-255, or low/normal/high/high_priority/critical
    pub const PRIORITY: u32 = 50;
    /// Risk level: integer 0-3, or low/medium/high/critical
    pub const RISK: u32 = 66;
    /// Explicit confidence override, integer percentage 0-100
    pub const CONFIDENCE: u32 = 67;
}

/// A single typed LNMP value
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub enum LnmpValue {
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<String>),
}

impl LnmpValue {
    /// Single-letter type code used in the annotated text form
    pub fn type_letter(&self) -> char {
        match self {
            LnmpValue::Int(_) => 'i',
            LnmpValue::Float(_) => 'f',
            LnmpValue::Str(_) => 's',
            LnmpValue::List(_) => 'l',
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            LnmpValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            LnmpValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            LnmpValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            LnmpValue::List(items) => Some(items),
            _ => None,
        }
    }
}

/// An LNMP record: typed fields keyed by ascending numeric id
///
/// Backed by an ordered map so iteration order (and therefore every encoded
/// form) is canonical regardless of insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct LnmpRecord {
    fields: BTreeMap<u32, LnmpValue>,
}

impl LnmpRecord {
    /// Create an empty record
    pub fn new() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }

    /// Set a field value. Duplicate ids are last-write-wins: the parser
    /// funnels repeated assignments through here so the final occurrence in
    /// a text record is the one that sticks.
    pub fn set(&mut self, id: u32, value: LnmpValue) {
        self.fields.insert(id, value);
    }

    pub fn get(&self, id: u32) -> Option<&LnmpValue> {
        self.fields.get(&id)
    }

    /// Integer value of a field, if present and integer-typed
    pub fn get_int(&self, id: u32) -> Option<i64> {
        self.fields.get(&id).and_then(LnmpValue::as_int)
    }

    /// String value of a field, if present and string-typed
    pub fn get_str(&self, id: u32) -> Option<&str> {
        self.fields.get(&id).and_then(LnmpValue::as_str)
    }

    pub fn remove(&mut self, id: u32) -> Option<LnmpValue> {
        self.fields.remove(&id)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.fields.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = (u32, &LnmpValue)> {
        self.fields.iter().map(|(id, value)| (*id, value))
    }

    /// Field ids in ascending order
    pub fn field_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.fields.keys().copied()
    }
}

impl FromIterator<(u32, LnmpValue)> for LnmpRecord {
    fn from_iter<T: IntoIterator<Item = (u32, LnmpValue)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
