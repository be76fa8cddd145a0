//! Canonical Binary Codec
//!
//! Per-field frames: `varint(field_id) | tag: u8 | payload`, fields emitted
//! in ascending id order with no container framing; decoding consumes until
//! input exhaustion. The encoder is a pure function of the field set, which
//! makes re-encoding a decoded record byte-identical.
//!
//! Integers travel zig-zag LEB128 encoded, strings and list elements are
//! length-prefixed UTF-8, floats are fixed 8-byte little-endian.

use byteorder::{ByteOrder, LittleEndian};
use tracing::trace;

use super::{DecodeError, DecodeResult, WireType};
use crate::record::{LnmpRecord, LnmpValue, MAX_FIELD_ID};
use crate::validation::ValidationError;

/// Encodes records into the canonical binary form
#[derive(Debug, Default)]
pub struct BinaryEncoder;

impl BinaryEncoder {
    pub fn new() -> Self {
        Self
    }

    /// Encode a record. Fails only when a field id above [`MAX_FIELD_ID`]
    /// was injected through the typed API (the parsers never produce one).
    pub fn encode(&self, record: &LnmpRecord) -> Result<Vec<u8>, ValidationError> {
        let mut buf = Vec::with_capacity(record.len() * 8);
        for (id, value) in record.iter() {
            if id > MAX_FIELD_ID {
                return Err(ValidationError::FieldIdOutOfRange {
                    id,
                    max: MAX_FIELD_ID,
                });
            }
            write_varint(&mut buf, u64::from(id));
            buf.push(WireType::for_value(value) as u8);
            match value {
                LnmpValue::Int(v) => write_varint(&mut buf, zigzag_encode(*v)),
                LnmpValue::Float(v) => {
                    let mut scratch = [0u8; 8];
                    LittleEndian::write_f64(&mut scratch, *v);
                    buf.extend_from_slice(&scratch);
                }
                LnmpValue::Str(s) => write_string(&mut buf, s),
                LnmpValue::List(items) => {
                    write_varint(&mut buf, items.len() as u64);
                    for item in items {
                        write_string(&mut buf, item);
                    }
                }
            }
        }
        Ok(buf)
    }
}

/// Decodes canonical binary frames back into records
#[derive(Debug, Default)]
pub struct BinaryDecoder;

impl BinaryDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Decode a frame sequence, consuming the entire input. All-or-nothing:
    /// any malformation fails the whole decode.
    pub fn decode(&self, input: &[u8]) -> DecodeResult<LnmpRecord> {
        let mut record = LnmpRecord::new();
        let mut pos = 0usize;
        while pos < input.len() {
            let id = read_varint(input, &mut pos)?;
            if id > u64::from(MAX_FIELD_ID) {
                return Err(DecodeError::FieldIdOutOfRange {
                    id,
                    max: MAX_FIELD_ID,
                });
            }

            let tag_offset = pos;
            let tag = *input.get(pos).ok_or(DecodeError::Truncated {
                offset: tag_offset,
                need: 1,
                got: 0,
            })?;
            pos += 1;
            let wire = WireType::try_from(tag).map_err(|_| DecodeError::UnknownWireType {
                tag,
                offset: tag_offset,
            })?;

            let value = match wire {
                WireType::Int => LnmpValue::Int(zigzag_decode(read_varint(input, &mut pos)?)),
                WireType::Float => {
                    let remaining = input.len() - pos;
                    if remaining < 8 {
                        return Err(DecodeError::Truncated {
                            offset: pos,
                            need: 8,
                            got: remaining,
                        });
                    }
                    let v = LittleEndian::read_f64(&input[pos..pos + 8]);
                    pos += 8;
                    LnmpValue::Float(v)
                }
                WireType::Str => LnmpValue::Str(read_string(input, &mut pos)?),
                WireType::List => {
                    let count_offset = pos;
                    let count = read_varint(input, &mut pos)?;
                    // Every element carries at least its length byte, so a
                    // count beyond the remaining bytes is malformed. This
                    // also bounds the allocation below.
                    let remaining = input.len() - pos;
                    if count > remaining as u64 {
                        return Err(DecodeError::LengthExceedsInput {
                            offset: count_offset,
                            len: count,
                            remaining,
                        });
                    }
                    let mut items = Vec::with_capacity(count as usize);
                    for _ in 0..count {
                        items.push(read_string(input, &mut pos)?);
                    }
                    LnmpValue::List(items)
                }
            };
            record.set(id as u32, value);
        }
        trace!(fields = record.len(), bytes = input.len(), "decoded binary record");
        Ok(record)
    }
}

fn write_string(buf: &mut Vec<u8>, s: &str) {
    write_varint(buf, s.len() as u64);
    buf.extend_from_slice(s.as_bytes());
}

fn read_string(input: &[u8], pos: &mut usize) -> DecodeResult<String> {
    let len_offset = *pos;
    let len = read_varint(input, pos)?;
    let remaining = input.len() - *pos;
    if len > remaining as u64 {
        return Err(DecodeError::LengthExceedsInput {
            offset: len_offset,
            len,
            remaining,
        });
    }
    let end = *pos + len as usize;
    let s = std::str::from_utf8(&input[*pos..end])
        .map_err(|_| DecodeError::InvalidUtf8 { offset: *pos })?
        .to_string();
    *pos = end;
    Ok(s)
}

/// Unsigned LEB128
pub(crate) fn write_varint(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            buf.push(byte);
            return;
        }
        buf.push(byte | 0x80);
    }
}

pub(crate) fn read_varint(input: &[u8], pos: &mut usize) -> DecodeResult<u64> {
    let start = *pos;
    let mut value: u64 = 0;
    let mut shift = 0u32;
    loop {
        let byte = *input.get(*pos).ok_or(DecodeError::Truncated {
            offset: start,
            need: 1,
            got: 0,
        })?;
        *pos += 1;
        if shift >= 64 || (shift == 63 && (byte & 0x7f) > 1) {
            return Err(DecodeError::VarintOverflow { offset: start });
        }
        value |= u64::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
    }
}

pub(crate) fn zigzag_encode(v: i64) -> u64 {
    ((v << 1) ^ (v >> 63)) as u64
}

pub(crate) fn zigzag_decode(z: u64) -> i64 {
    ((z >> 1) as i64) ^ -((z & 1) as i64)
}
