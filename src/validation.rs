//! Pre-flight Validation
//!
//! Checks records and envelopes built programmatically before they hit a
//! codec. Anything produced by [`Parser`](crate::codec::Parser) or
//! [`BinaryDecoder`](crate::codec::BinaryDecoder) is already valid; these
//! functions exist for the typed construction path.

use thiserror::Error;

use crate::envelope::LnmpEnvelope;
use crate::record::{LnmpRecord, LnmpValue, MAX_FIELD_ID};

/// Validation failures on programmatically built values
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Field id {id} exceeds maximum {max}")]
    FieldIdOutOfRange { id: u32, max: u32 },

    /// The text grammar has no escape sequences, so a `"` inside a string
    /// cannot survive text encoding, and list items are rendered unquoted,
    /// so `,` or `]` inside one would split or truncate the list on re-parse.
    #[error("Field {id} contains characters the text form cannot represent")]
    UnencodableString { id: u32 },

    #[error("Envelope source must not be empty")]
    EmptySource,
}

/// Check a record for field ids and values every codec can carry
pub fn validate_record(record: &LnmpRecord) -> Result<(), ValidationError> {
    for (id, value) in record.iter() {
        if id > MAX_FIELD_ID {
            return Err(ValidationError::FieldIdOutOfRange {
                id,
                max: MAX_FIELD_ID,
            });
        }
        match value {
            LnmpValue::Str(s) => {
                if s.contains('"') {
                    return Err(ValidationError::UnencodableString { id });
                }
            }
            LnmpValue::List(items) => {
                if items
                    .iter()
                    .any(|item| item.contains(['"', ',', ']']))
                {
                    return Err(ValidationError::UnencodableString { id });
                }
            }
            LnmpValue::Int(_) | LnmpValue::Float(_) => {}
        }
    }
    Ok(())
}

/// [`validate_record`] plus the envelope-level source requirement
pub fn validate_envelope(envelope: &LnmpEnvelope) -> Result<(), ValidationError> {
    if envelope.metadata.source.is_empty() {
        return Err(ValidationError::EmptySource);
    }
    validate_record(&envelope.record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::EnvelopeBuilder;

    #[test]
    fn clean_record_passes() {
        let mut record = LnmpRecord::new();
        record.set(7, LnmpValue::Int(1));
        record.set(20, LnmpValue::Str("sensor-a".to_string()));
        record.set(30, LnmpValue::List(vec!["x".to_string()]));
        assert_eq!(validate_record(&record), Ok(()));
    }

    #[test]
    fn oversized_id_fails() {
        let mut record = LnmpRecord::new();
        record.set(MAX_FIELD_ID + 1, LnmpValue::Int(1));
        assert_eq!(
            validate_record(&record),
            Err(ValidationError::FieldIdOutOfRange {
                id: MAX_FIELD_ID + 1,
                max: MAX_FIELD_ID
            })
        );
    }

    #[test]
    fn embedded_quote_fails_in_string_and_list() {
        let mut record = LnmpRecord::new();
        record.set(5, LnmpValue::Str("say \"hi\"".to_string()));
        assert_eq!(
            validate_record(&record),
            Err(ValidationError::UnencodableString { id: 5 })
        );

        let mut record = LnmpRecord::new();
        record.set(6, LnmpValue::List(vec!["ok".to_string(), "\"".to_string()]));
        assert_eq!(
            validate_record(&record),
            Err(ValidationError::UnencodableString { id: 6 })
        );
    }

    #[test]
    fn list_item_with_delimiter_fails() {
        // "a,b" would re-parse as two items; "a]b" would truncate the list
        for item in ["a,b", "a]b"] {
            let mut record = LnmpRecord::new();
            record.set(9, LnmpValue::List(vec![item.to_string()]));
            assert_eq!(
                validate_record(&record),
                Err(ValidationError::UnencodableString { id: 9 })
            );
        }
    }

    #[test]
    fn envelope_requires_source() {
        let envelope = EnvelopeBuilder::new(LnmpRecord::new())
            .timestamp(1)
            .build();
        assert_eq!(validate_envelope(&envelope), Err(ValidationError::EmptySource));

        let envelope = EnvelopeBuilder::new(LnmpRecord::new())
            .source("svc")
            .timestamp(1)
            .build();
        assert_eq!(validate_envelope(&envelope), Ok(()));
    }
}
