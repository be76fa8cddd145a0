//! Annotated Record Rendering
//!
//! Debug-facing variant of the text form that exposes each field's type and,
//! when the dictionary knows the id, its semantic name:
//!
//! ```text
//! F7(urgent):i=1;F12:i=14532;F20(priority):s=high
//! ```
//!
//! The output is for humans and logs; it does not re-parse.

use std::collections::BTreeMap;

use crate::record::{field_ids, LnmpRecord, LnmpValue};

/// Names for well-known field ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticDictionary {
    names: BTreeMap<u32, String>,
}

impl SemanticDictionary {
    /// An empty dictionary: every field renders unnamed
    pub fn new() -> Self {
        Self {
            names: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, id: u32, name: impl Into<String>) {
        self.names.insert(id, name.into());
    }

    pub fn describe(&self, id: u32) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for SemanticDictionary {
    /// Seeded with the well-known registry ids the scorer consumes
    fn default() -> Self {
        let mut dict = Self::new();
        dict.insert(field_ids::URGENT, "urgent");
        dict.insert(field_ids::PRIORITY, "priority");
        dict.insert(field_ids::RISK, "risk");
        dict.insert(field_ids::CONFIDENCE, "confidence");
        dict
    }
}

/// Renders records with per-field type and name annotations
#[derive(Debug, Clone, Default)]
pub struct ExplainEncoder {
    dictionary: SemanticDictionary,
}

impl ExplainEncoder {
    pub fn new(dictionary: SemanticDictionary) -> Self {
        Self { dictionary }
    }

    /// Render `F<id>[(name)]:<t>=<value>` per field, joined by `;`
    pub fn encode_with_explanation(&self, record: &LnmpRecord) -> String {
        let mut out = String::new();
        for (i, (id, value)) in record.iter().enumerate() {
            if i > 0 {
                out.push(';');
            }
            out.push('F');
            out.push_str(&id.to_string());
            if let Some(name) = self.dictionary.describe(id) {
                out.push('(');
                out.push_str(name);
                out.push(')');
            }
            out.push(':');
            out.push(value.type_letter());
            out.push('=');
            render_plain(value, &mut out);
        }
        out
    }
}

fn render_plain(value: &LnmpValue, out: &mut String) {
    match value {
        LnmpValue::Int(v) => out.push_str(&v.to_string()),
        LnmpValue::Float(v) => out.push_str(&v.to_string()),
        LnmpValue::Str(s) => out.push_str(s),
        LnmpValue::List(items) => {
            out.push('[');
            out.push_str(&items.join(","));
            out.push(']');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotates_types_and_known_names() {
        let mut record = LnmpRecord::new();
        record.set(field_ids::URGENT, LnmpValue::Int(1));
        record.set(12, LnmpValue::Int(14532));
        record.set(field_ids::PRIORITY, LnmpValue::Str("high".to_string()));

        let encoder = ExplainEncoder::new(SemanticDictionary::default());
        assert_eq!(
            encoder.encode_with_explanation(&record),
            "F7(urgent):i=1;F12:i=14532;F50(priority):s=high"
        );
    }

    #[test]
    fn empty_dictionary_leaves_fields_unnamed() {
        let mut record = LnmpRecord::new();
        record.set(field_ids::URGENT, LnmpValue::Int(1));

        let encoder = ExplainEncoder::new(SemanticDictionary::new());
        assert_eq!(encoder.encode_with_explanation(&record), "F7:i=1");
    }

    #[test]
    fn float_and_list_type_letters() {
        let mut record = LnmpRecord::new();
        record.set(1, LnmpValue::Float(0.5));
        record.set(2, LnmpValue::List(vec!["a".to_string(), "b".to_string()]));

        let encoder = ExplainEncoder::new(SemanticDictionary::new());
        assert_eq!(
            encoder.encode_with_explanation(&record),
            "F1:f=0.5;F2:l=[a,b]"
        );
    }

    #[test]
    fn dictionary_entries_can_be_extended() {
        let mut dict = SemanticDictionary::default();
        assert_eq!(dict.describe(field_ids::RISK), Some("risk"));
        assert_eq!(dict.describe(999), None);

        dict.insert(999, "custom");
        assert_eq!(dict.describe(999), Some("custom"));
        assert_eq!(dict.len(), 5);
    }
}
