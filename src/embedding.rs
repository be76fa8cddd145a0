//! Embedding Delta Engine
//!
//! Sparse diff/patch between two equal-length f32 vectors. A delta records
//! only the elements that changed; the wire payload is a stream of
//! `(varint index gap, f32 LE value)` pairs with no count prefix, decoded by
//! consuming the input to exhaustion. Index gaps are relative to the
//! previous changed index (the first is absolute), which keeps dense change
//! runs at one byte of index overhead per element.

use byteorder::{ByteOrder, LittleEndian};
use thiserror::Error;
use tracing::trace;

use crate::codec::binary::{read_varint, write_varint};
use crate::codec::{DecodeError, DecodeResult};

/// Two floats further apart than this count as changed. Effectively exact
/// inequality for embedding-scale values.
pub const DELTA_EPSILON: f32 = 1e-7;

/// Delta construction and application errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeltaError {
    #[error("Vector dimension mismatch: base has {base} elements, updated has {updated}")]
    DimensionMismatch { base: usize, updated: usize },

    #[error("Delta index {index} out of bounds for {len}-element vector")]
    IndexOutOfBounds { index: usize, len: usize },
}

/// One changed element
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct DeltaChange {
    pub index: u32,
    pub value: f32,
}

/// Sparse delta between two equal-length vectors
///
/// Changes are held in ascending index order; both constructors
/// ([`from_vectors`](Self::from_vectors) and [`decode`](Self::decode))
/// maintain this. [`encode`](Self::encode) sorts a working copy when a
/// hand-built delta violates the order.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct VectorDelta {
    pub changes: Vec<DeltaChange>,
}

impl VectorDelta {
    /// Diff two vectors. Requires equal lengths.
    pub fn from_vectors(base: &[f32], updated: &[f32]) -> Result<Self, DeltaError> {
        if base.len() != updated.len() {
            return Err(DeltaError::DimensionMismatch {
                base: base.len(),
                updated: updated.len(),
            });
        }
        let mut changes = Vec::new();
        for (i, (b, u)) in base.iter().zip(updated).enumerate() {
            if (b - u).abs() > DELTA_EPSILON {
                changes.push(DeltaChange {
                    index: i as u32,
                    value: *u,
                });
            }
        }
        trace!(
            total = base.len(),
            changed = changes.len(),
            "computed vector delta"
        );
        Ok(Self { changes })
    }

    /// Number of changed elements
    pub fn change_count(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Encode into the gap-varint payload
    pub fn encode(&self) -> Vec<u8> {
        let sorted_copy;
        let changes: &[DeltaChange] = if self
            .changes
            .windows(2)
            .all(|w| w[0].index <= w[1].index)
        {
            &self.changes
        } else {
            let mut copy = self.changes.clone();
            copy.sort_by_key(|c| c.index);
            sorted_copy = copy;
            &sorted_copy
        };

        let mut buf = Vec::with_capacity(changes.len() * 5);
        let mut prev: Option<u32> = None;
        for change in changes {
            let gap = match prev {
                None => u64::from(change.index),
                Some(p) => u64::from(change.index - p),
            };
            write_varint(&mut buf, gap);
            let mut scratch = [0u8; 4];
            LittleEndian::write_f32(&mut scratch, change.value);
            buf.extend_from_slice(&scratch);
            prev = Some(change.index);
        }
        buf
    }

    /// Decode a payload, consuming the entire input
    pub fn decode(data: &[u8]) -> DecodeResult<Self> {
        let mut changes = Vec::new();
        let mut pos = 0usize;
        let mut prev: Option<u32> = None;
        while pos < data.len() {
            let gap_offset = pos;
            let gap = read_varint(data, &mut pos)?;
            // Accumulated index must stay in u32 range; a hostile gap can
            // also overflow the u64 accumulator itself
            let index = match prev {
                None => Some(gap),
                Some(p) => u64::from(p).checked_add(gap),
            };
            let index = match index {
                Some(i) if i <= u64::from(u32::MAX) => i,
                _ => return Err(DecodeError::VarintOverflow { offset: gap_offset }),
            };

            let remaining = data.len() - pos;
            if remaining < 4 {
                return Err(DecodeError::Truncated {
                    offset: pos,
                    need: 4,
                    got: remaining,
                });
            }
            let value = LittleEndian::read_f32(&data[pos..pos + 4]);
            pos += 4;

            changes.push(DeltaChange {
                index: index as u32,
                value,
            });
            prev = Some(index as u32);
        }
        Ok(Self { changes })
    }

    /// Apply to a base vector, returning the patched copy
    pub fn apply(&self, base: &[f32]) -> Result<Vec<f32>, DeltaError> {
        let mut out = base.to_vec();
        for change in &self.changes {
            let index = change.index as usize;
            match out.get_mut(index) {
                Some(slot) => *slot = change.value,
                None => {
                    return Err(DeltaError::IndexOutOfBounds {
                        index,
                        len: base.len(),
                    })
                }
            }
        }
        Ok(out)
    }
}
