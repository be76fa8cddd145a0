//! Vector Quantization
//!
//! Lossy compression of f32 embedding vectors into fixed-point or sign-bit
//! form. Payloads are self-contained: schemes with a scale factor carry it
//! as a 4-byte f32 LE header ahead of the packed samples, so a stored
//! payload can be reconstructed without side metadata beyond the scheme and
//! element count.

use std::str::FromStr;

use byteorder::{ByteOrder, LittleEndian};
use num_enum::TryFromPrimitive;
use thiserror::Error;

/// Quantization schemes
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub enum QuantScheme {
    /// f32 scale header + one signed 8-bit sample per element
    QInt8 = 1,
    /// f32 scale header + two signed 4-bit samples per byte
    QInt4 = 2,
    /// One sign bit per element, MSB first, no header
    Binary = 3,
}

impl QuantScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuantScheme::QInt8 => "QInt8",
            QuantScheme::QInt4 => "QInt4",
            QuantScheme::Binary => "Binary",
        }
    }

    /// Payload length for a vector of `dims` elements
    pub fn encoded_len(&self, dims: usize) -> usize {
        match self {
            QuantScheme::QInt8 => 4 + dims,
            QuantScheme::QInt4 => 4 + (dims + 1) / 2,
            QuantScheme::Binary => (dims + 7) / 8,
        }
    }
}

impl FromStr for QuantScheme {
    type Err = QuantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "QInt8" => Ok(QuantScheme::QInt8),
            "QInt4" => Ok(QuantScheme::QInt4),
            "Binary" => Ok(QuantScheme::Binary),
            other => Err(QuantError::UnsupportedScheme(other.to_string())),
        }
    }
}

impl std::fmt::Display for QuantScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quantization errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QuantError {
    #[error("Unsupported quantization scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Cannot quantize an empty vector")]
    EmptyVector,

    #[error("Payload is {got} bytes, expected {expected} for {dims} elements")]
    PayloadLength {
        expected: usize,
        got: usize,
        dims: usize,
    },
}

/// A quantized vector: scheme out of band, packed payload in band
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct QuantizedVector {
    pub scheme: QuantScheme,
    pub data: Vec<u8>,
}

/// Quantize a vector under the given scheme
pub fn quantize_embedding(values: &[f32], scheme: QuantScheme) -> Result<QuantizedVector, QuantError> {
    if values.is_empty() {
        return Err(QuantError::EmptyVector);
    }
    let mut data = Vec::with_capacity(scheme.encoded_len(values.len()));
    match scheme {
        QuantScheme::QInt8 => {
            let scale = derive_scale(values, 127.0);
            write_scale(&mut data, scale);
            for &v in values {
                data.push(fixed_point_sample(v, scale, 127.0) as u8);
            }
        }
        QuantScheme::QInt4 => {
            let scale = derive_scale(values, 7.0);
            write_scale(&mut data, scale);
            for pair in values.chunks(2) {
                let hi = fixed_point_sample(pair[0], scale, 7.0);
                // Odd tail pads the low nibble with zero
                let lo = pair.get(1).map_or(0, |&v| fixed_point_sample(v, scale, 7.0));
                data.push(pack_nibbles(hi, lo));
            }
        }
        QuantScheme::Binary => {
            for chunk in values.chunks(8) {
                let mut byte = 0u8;
                for (bit, &v) in chunk.iter().enumerate() {
                    if v >= 0.0 {
                        byte |= 1 << (7 - bit);
                    }
                }
                data.push(byte);
            }
        }
    }
    Ok(QuantizedVector { scheme, data })
}

/// Reconstruct an approximate vector from a quantized payload
///
/// `dims` is the original element count; the payload length must match the
/// scheme's layout for that count. QInt8 reconstruction is within
/// `scale / 2` of the original per element; Binary recovers only signs,
/// rendered as plus or minus one.
pub fn dequantize_embedding(quantized: &QuantizedVector, dims: usize) -> Result<Vec<f32>, QuantError> {
    if dims == 0 {
        return Err(QuantError::EmptyVector);
    }
    let expected = quantized.scheme.encoded_len(dims);
    if quantized.data.len() != expected {
        return Err(QuantError::PayloadLength {
            expected,
            got: quantized.data.len(),
            dims,
        });
    }
    let mut out = Vec::with_capacity(dims);
    match quantized.scheme {
        QuantScheme::QInt8 => {
            let scale = LittleEndian::read_f32(&quantized.data[..4]);
            for &b in &quantized.data[4..4 + dims] {
                out.push(f32::from(b as i8) * scale);
            }
        }
        QuantScheme::QInt4 => {
            let scale = LittleEndian::read_f32(&quantized.data[..4]);
            for i in 0..dims {
                let byte = quantized.data[4 + i / 2];
                let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
                out.push(f32::from(unpack_nibble(nibble)) * scale);
            }
        }
        QuantScheme::Binary => {
            for i in 0..dims {
                let byte = quantized.data[i / 8];
                let bit = byte >> (7 - (i % 8)) & 1;
                out.push(if bit == 1 { 1.0 } else { -1.0 });
            }
        }
    }
    Ok(out)
}

/// `max(|v|) / range`, zero for an all-zero vector
fn derive_scale(values: &[f32], range: f32) -> f32 {
    let max_abs = values.iter().fold(0.0f32, |m, v| m.max(v.abs()));
    if max_abs == 0.0 {
        0.0
    } else {
        max_abs / range
    }
}

fn fixed_point_sample(v: f32, scale: f32, range: f32) -> i8 {
    if scale == 0.0 {
        return 0;
    }
    (v / scale).round().clamp(-range, range) as i8
}

fn write_scale(data: &mut Vec<u8>, scale: f32) {
    let mut scratch = [0u8; 4];
    LittleEndian::write_f32(&mut scratch, scale);
    data.extend_from_slice(&scratch);
}

/// Two's-complement nibbles, first sample in the high half
fn pack_nibbles(hi: i8, lo: i8) -> u8 {
    ((hi as u8) << 4) | ((lo as u8) & 0x0f)
}

fn unpack_nibble(n: u8) -> i8 {
    if n & 0x8 != 0 {
        (n | 0xf0) as i8
    } else {
        n as i8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_vector(n: usize) -> Vec<f32> {
        (0..n).map(|i| ((i as f32) * 0.37).sin() * 3.0).collect()
    }

    #[test]
    fn qint8_sizes_and_error_bound() {
        let values = sample_vector(128);
        let q = quantize_embedding(&values, QuantScheme::QInt8).unwrap();
        assert_eq!(q.data.len(), 4 + 128);
        assert!(q.data.len() < 4 * values.len());

        let scale = LittleEndian::read_f32(&q.data[..4]);
        let back = dequantize_embedding(&q, 128).unwrap();
        for (orig, rec) in values.iter().zip(&back) {
            assert!((orig - rec).abs() <= scale / 2.0 + f32::EPSILON);
        }
    }

    #[test]
    fn qint4_packs_two_samples_per_byte() {
        let values = vec![3.5, -3.5, 1.0, -1.0, 2.0];
        let q = quantize_embedding(&values, QuantScheme::QInt4).unwrap();
        assert_eq!(q.data.len(), 4 + 3); // odd count pads the final low nibble
        assert!(q.data.len() < 2 * values.len());

        let back = dequantize_embedding(&q, 5).unwrap();
        assert_eq!(back.len(), 5);
        // Signs always survive 4-bit quantization
        for (orig, rec) in values.iter().zip(&back) {
            assert_eq!(orig.signum(), rec.signum());
        }
    }

    #[test]
    fn binary_packs_signs_msb_first() {
        let values = vec![1.0, -1.0, 2.5, -0.5, 0.0];
        let q = quantize_embedding(&values, QuantScheme::Binary).unwrap();
        assert_eq!(q.data.len(), 1);
        // 1,0,1,0,1 then zero padding
        assert_eq!(q.data[0], 0b1010_1000);

        let back = dequantize_embedding(&q, 5).unwrap();
        assert_eq!(back, vec![1.0, -1.0, 1.0, -1.0, 1.0]);
    }

    #[test]
    fn size_bounds_hold_across_lengths() {
        for n in [4usize, 5, 8, 33, 128, 1000] {
            let values = sample_vector(n);
            assert!(
                quantize_embedding(&values, QuantScheme::QInt8).unwrap().data.len() < 4 * n
            );
            assert!(
                quantize_embedding(&values, QuantScheme::QInt4).unwrap().data.len() < 2 * n
            );
            assert!(quantize_embedding(&values, QuantScheme::Binary).unwrap().data.len() < n);
        }
    }

    #[test]
    fn all_zero_vector_has_zero_scale() {
        let values = vec![0.0f32; 16];
        let q = quantize_embedding(&values, QuantScheme::QInt8).unwrap();
        assert_eq!(LittleEndian::read_f32(&q.data[..4]), 0.0);
        assert!(q.data[4..].iter().all(|&b| b == 0));
        assert_eq!(dequantize_embedding(&q, 16).unwrap(), values);
    }

    #[test]
    fn empty_vector_is_rejected() {
        assert_eq!(
            quantize_embedding(&[], QuantScheme::QInt8).unwrap_err(),
            QuantError::EmptyVector
        );
    }

    #[test]
    fn scheme_names_parse_exactly() {
        assert_eq!("QInt8".parse::<QuantScheme>().unwrap(), QuantScheme::QInt8);
        assert_eq!("QInt4".parse::<QuantScheme>().unwrap(), QuantScheme::QInt4);
        assert_eq!("Binary".parse::<QuantScheme>().unwrap(), QuantScheme::Binary);
        assert!(matches!(
            "qint8".parse::<QuantScheme>(),
            Err(QuantError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn dequantize_rejects_wrong_payload_length() {
        let q = QuantizedVector {
            scheme: QuantScheme::QInt8,
            data: vec![0u8; 10],
        };
        assert!(matches!(
            dequantize_embedding(&q, 128),
            Err(QuantError::PayloadLength { expected: 132, got: 10, .. })
        ));
    }
}
