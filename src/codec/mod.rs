//! Text and Binary Codecs
//!
//! Dual wire formats over the same record model:
//! - Text: the human-readable `F<id>=<value>` grammar
//! - Binary: canonical per-field `(varint id, tag, payload)` frames,
//!   byte-stable across decode/re-encode
//!
//! Both iterate fields in ascending id order, so output depends only on the
//! field set.

pub mod binary;
pub mod text;

pub use binary::{BinaryDecoder, BinaryEncoder};
pub use text::{Encoder, Parser};

use num_enum::TryFromPrimitive;
use thiserror::Error;

use crate::record::LnmpValue;

/// Wire type tags for binary field payloads
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
pub enum WireType {
    /// Zig-zag LEB128 varint
    Int = 0x01,
    /// Varint byte length + UTF-8 bytes
    Str = 0x02,
    /// Varint element count + repeated (varint length + UTF-8 bytes)
    List = 0x03,
    /// IEEE-754 f64, little-endian
    Float = 0x04,
}

impl WireType {
    /// Tag for a value variant
    pub fn for_value(value: &LnmpValue) -> Self {
        match value {
            LnmpValue::Int(_) => WireType::Int,
            LnmpValue::Str(_) => WireType::Str,
            LnmpValue::List(_) => WireType::List,
            LnmpValue::Float(_) => WireType::Float,
        }
    }

    /// Payload size for fixed-width tags (None for varint/length-prefixed)
    pub fn fixed_payload_size(&self) -> Option<usize> {
        match self {
            WireType::Float => Some(8),
            _ => None,
        }
    }
}

/// Text grammar parsing errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Empty input")]
    EmptyInput,

    #[error("Expected field marker 'F' at offset {offset}")]
    ExpectedFieldMarker { offset: usize },

    #[error("Missing '=' separator at offset {offset}")]
    MissingSeparator { offset: usize },

    #[error("Invalid field id at offset {offset}")]
    InvalidFieldId { offset: usize },

    #[error("Field id {id} exceeds maximum {max}")]
    FieldIdOutOfRange { id: u64, max: u32 },

    #[error("Missing value at offset {offset}")]
    MissingValue { offset: usize },

    #[error("Unterminated quoted string starting at offset {offset}")]
    UnterminatedQuote { offset: usize },

    #[error("Unterminated list starting at offset {offset}")]
    UnterminatedList { offset: usize },

    #[error("Unexpected character {ch:?} at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },
}

/// Result type for text parsing
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Binary and spatial frame decoding errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Truncated input at offset {offset}: need {need} bytes, got {got}")]
    Truncated {
        offset: usize,
        need: usize,
        got: usize,
    },

    #[error("Unknown wire type tag {tag:#04x} at offset {offset}")]
    UnknownWireType { tag: u8, offset: usize },

    #[error("Varint overflow at offset {offset}")]
    VarintOverflow { offset: usize },

    #[error("Declared length {len} exceeds remaining {remaining} bytes at offset {offset}")]
    LengthExceedsInput {
        offset: usize,
        len: u64,
        remaining: usize,
    },

    #[error("Invalid UTF-8 in payload at offset {offset}")]
    InvalidUtf8 { offset: usize },

    #[error("Field id {id} exceeds maximum {max}")]
    FieldIdOutOfRange { id: u64, max: u32 },

    #[error("Spatial frame must be {expected} bytes, got {got}")]
    InvalidSpatialLength { expected: usize, got: usize },

    #[error("Unknown spatial tag: {0:#04x}")]
    UnknownSpatialTag(u8),
}

/// Result type for binary decoding
pub type DecodeResult<T> = std::result::Result<T, DecodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_type_round_trips_through_primitive() {
        for tag in [0x01u8, 0x02, 0x03, 0x04] {
            let wire = WireType::try_from(tag).unwrap();
            assert_eq!(wire as u8, tag);
        }
        assert!(WireType::try_from(0x05u8).is_err());
        assert!(WireType::try_from(0x00u8).is_err());
    }

    #[test]
    fn only_float_is_fixed_width() {
        assert_eq!(WireType::Float.fixed_payload_size(), Some(8));
        assert_eq!(WireType::Int.fixed_payload_size(), None);
        assert_eq!(WireType::Str.fixed_payload_size(), None);
        assert_eq!(WireType::List.fixed_payload_size(), None);
    }
}
