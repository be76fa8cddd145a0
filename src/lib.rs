//! LNMP - Lightweight Numeric Message Protocol
//!
//! Compact protocol for structured, typed key-value records with a
//! deterministic pipeline that decides whether a message warrants expensive
//! downstream (LLM) processing.
//!
//! ## Components
//!
//! - **Text codec** ([`codec::text`]): the human-readable `F<id>=<value>`
//!   grammar and its canonical encoder
//! - **Binary codec** ([`codec::binary`]): byte-stable `(varint id, tag,
//!   payload)` frames
//! - **Sanitizer** ([`sanitize`]): whitespace canonicalization pre-pass
//! - **Spatial codec** ([`spatial`]): fixed 13-byte 3D position frames
//! - **Quantization** ([`quant`]): QInt8 / QInt4 / Binary vector compression
//! - **Delta engine** ([`embedding`]): sparse diff/patch between embeddings
//! - **Envelope** ([`envelope`]): record plus routing metadata
//! - **Scoring** ([`score`]) and **routing** ([`routing`]): the deterministic
//!   decision pipeline
//! - **Transport** ([`transport`], feature `transport-http`): HTTP header
//!   mapping
//!
//! ## Example
//!
//! ```
//! use lnmp::{wrap, Parser, RoutingDecision};
//!
//! let record = Parser::new("F7=1;F12=14532")?.parse_record()?;
//! let envelope = wrap(record, "sensor-a");
//! let decision = lnmp::routing_decide(&envelope)?;
//! assert_ne!(decision, RoutingDecision::Drop);
//! # Ok::<(), lnmp::LnmpError>(())
//! ```
//!
//! Every operation is a synchronous pure function over immutable inputs;
//! the crate holds no state and is safe to call from any thread.

use thiserror::Error;

pub mod codec;
pub mod embedding;
pub mod envelope;
pub mod explain;
pub mod quant;
pub mod record;
pub mod routing;
pub mod sanitize;
pub mod score;
pub mod spatial;
#[cfg(feature = "transport-http")]
pub mod transport;
pub mod validation;

pub use codec::{
    BinaryDecoder, BinaryEncoder, DecodeError, DecodeResult, Encoder, ParseError, ParseResult,
    Parser, WireType,
};
pub use embedding::{DeltaChange, DeltaError, VectorDelta, DELTA_EPSILON};
pub use envelope::{
    current_timestamp_ms, wrap, Clock, EnvelopeBuilder, EnvelopeMetadata, LnmpEnvelope,
    SystemClock,
};
pub use explain::{ExplainEncoder, SemanticDictionary};
pub use quant::{dequantize_embedding, quantize_embedding, QuantError, QuantScheme, QuantizedVector};
pub use record::{field_ids, LnmpRecord, LnmpValue, MAX_FIELD_ID};
pub use routing::{
    normalize_and_route, routing_decide, should_send_to_llm, MessageKind, NetMessage,
    RouteOutcome, RoutingDecision, RoutingError, RoutingPolicy,
};
pub use sanitize::{sanitize_lnmp_text, SanitizationConfig};
pub use score::{
    context_score, ContextProfile, ContextScore, ContextScorer, RiskLevel, ScoreWeights,
    FRESHNESS_HALF_LIFE_MS, SCORE_WEIGHTS_V1,
};
pub use spatial::{
    decode_position3d, encode_position3d, Position3D, POSITION3D_FRAME_LEN, POSITION3D_TAG,
};
#[cfg(feature = "transport-http")]
pub use transport::{
    envelope_from_headers, from_http_headers, to_http_headers, TransportError, HEADER_SOURCE,
    HEADER_TIMESTAMP, HEADER_TRACEPARENT, HEADER_TRACE_ID,
};
pub use validation::{validate_envelope, validate_record, ValidationError};

/// Protocol version carried by this crate
pub const PROTOCOL_VERSION: u8 = 1;

/// Umbrella error over every failure the crate reports
///
/// Each component keeps its own error enum so callers can branch precisely;
/// this type exists for pipelines that funnel several stages through one
/// `?` chain.
#[derive(Debug, Error)]
pub enum LnmpError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Delta error: {0}")]
    Delta(#[from] DeltaError),

    #[error("Quantization error: {0}")]
    Quant(#[from] QuantError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Routing error: {0}")]
    Routing(#[from] RoutingError),

    #[cfg(feature = "transport-http")]
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Result alias over [`LnmpError`]
pub type Result<T> = std::result::Result<T, LnmpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn umbrella_error_wraps_each_kind() {
        let parse: LnmpError = ParseError::EmptyInput.into();
        assert!(matches!(parse, LnmpError::Parse(_)));

        let decode: LnmpError = DecodeError::UnknownSpatialTag(0xff).into();
        assert!(matches!(decode, LnmpError::Decode(_)));

        let delta: LnmpError = DeltaError::DimensionMismatch { base: 1, updated: 2 }.into();
        assert!(matches!(delta, LnmpError::Delta(_)));

        let quant: LnmpError = QuantError::UnsupportedScheme("x".to_string()).into();
        assert!(matches!(quant, LnmpError::Quant(_)));
    }

    #[test]
    fn full_pipeline_flows_through_one_result() {
        fn pipeline(text: &str) -> Result<RoutingDecision> {
            let record = Parser::new(text)?.parse_record()?;
            let envelope = wrap(record, "doc-test");
            Ok(routing_decide(&envelope)?)
        }

        assert!(pipeline("F7=1;F12=14532").is_ok());
        assert!(matches!(pipeline("F7 7"), Err(LnmpError::Parse(_))));
    }
}
