//! Spatial Position Codec
//!
//! Fixed 13-byte wire frame for a 3D position:
//!
//! ```text
//! ┌─────────┬──────────┬──────────┬──────────┐
//! │ tag: u8 │ x: f32LE │ y: f32LE │ z: f32LE │
//! └─────────┴──────────┴──────────┴──────────┘
//! ```
//!
//! Encoding is deterministic: identical inputs always produce identical
//! bytes. Decoding demands the exact frame length and a known tag.

use zerocopy::{AsBytes, FromBytes, FromZeroes, Ref};

use crate::codec::{DecodeError, DecodeResult};

/// Frame tag identifying the 3D position format
pub const POSITION3D_TAG: u8 = 0x02;

/// Total frame length in bytes
pub const POSITION3D_FRAME_LEN: usize = 13;

/// A 3D position in single precision
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct Position3D {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position3D {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Wire layout of the position frame (13 bytes)
///
/// Coordinates are stored as explicit little-endian byte arrays so the frame
/// is byte-identical across host endianness.
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, PartialEq, AsBytes, FromBytes, FromZeroes)]
struct SpatialFrame {
    tag: u8,
    x_le: [u8; 4],
    y_le: [u8; 4],
    z_le: [u8; 4],
}

impl SpatialFrame {
    const SIZE: usize = POSITION3D_FRAME_LEN;

    fn new(position: Position3D) -> Self {
        Self {
            tag: POSITION3D_TAG,
            x_le: position.x.to_le_bytes(),
            y_le: position.y.to_le_bytes(),
            z_le: position.z.to_le_bytes(),
        }
    }

    fn validate(&self) -> DecodeResult<()> {
        if self.tag != POSITION3D_TAG {
            return Err(DecodeError::UnknownSpatialTag(self.tag));
        }
        Ok(())
    }

    fn position(&self) -> Position3D {
        Position3D {
            x: f32::from_le_bytes(self.x_le),
            y: f32::from_le_bytes(self.y_le),
            z: f32::from_le_bytes(self.z_le),
        }
    }
}

/// Encode a position into its fixed 13-byte frame
pub fn encode_position3d(position: Position3D) -> [u8; POSITION3D_FRAME_LEN] {
    let frame = SpatialFrame::new(position);
    let mut out = [0u8; POSITION3D_FRAME_LEN];
    out.copy_from_slice(frame.as_bytes());
    out
}

/// Decode a 13-byte frame back into a position
///
/// Fails on any length other than exactly 13 bytes and on an unknown tag.
pub fn decode_position3d(data: &[u8]) -> DecodeResult<Position3D> {
    if data.len() != SpatialFrame::SIZE {
        return Err(DecodeError::InvalidSpatialLength {
            expected: SpatialFrame::SIZE,
            got: data.len(),
        });
    }
    let frame = Ref::<_, SpatialFrame>::new(data).ok_or(DecodeError::InvalidSpatialLength {
        expected: SpatialFrame::SIZE,
        got: data.len(),
    })?;
    frame.validate()?;
    Ok(frame.position())
}
