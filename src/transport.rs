//! Transport Mapping
//!
//! Maps envelope metadata to and from HTTP headers: `x-lnmp-source`,
//! `x-lnmp-trace-id`, `x-lnmp-timestamp`, plus a W3C-shaped `traceparent`
//! derived from the trace id and timestamp. Record bodies travel
//! separately; the inverse mapping yields an envelope with an empty record.

use http::header::HeaderMap;
use http::HeaderValue;
use thiserror::Error;
use tracing::debug;

use crate::envelope::{EnvelopeMetadata, LnmpEnvelope};
use crate::record::LnmpRecord;

pub const HEADER_SOURCE: &str = "x-lnmp-source";
pub const HEADER_TRACE_ID: &str = "x-lnmp-trace-id";
pub const HEADER_TIMESTAMP: &str = "x-lnmp-timestamp";
pub const HEADER_TRACEPARENT: &str = "traceparent";

/// Transport mapping errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Metadata field {field} is not representable as an HTTP header value")]
    InvalidHeaderValue { field: &'static str },
}

/// Render envelope metadata as HTTP headers
///
/// `x-lnmp-trace-id` and `traceparent` are omitted when the envelope
/// carries no trace id.
pub fn to_http_headers(envelope: &LnmpEnvelope) -> Result<HeaderMap, TransportError> {
    let metadata = &envelope.metadata;
    let mut headers = HeaderMap::new();

    let source = HeaderValue::from_str(&metadata.source)
        .map_err(|_| TransportError::InvalidHeaderValue { field: "source" })?;
    headers.insert(HEADER_SOURCE, source);

    headers.insert(
        HEADER_TIMESTAMP,
        HeaderValue::from_str(&metadata.timestamp_ms.to_string())
            .map_err(|_| TransportError::InvalidHeaderValue { field: "timestamp_ms" })?,
    );

    if let Some(trace_id) = &metadata.trace_id {
        headers.insert(
            HEADER_TRACE_ID,
            HeaderValue::from_str(trace_id)
                .map_err(|_| TransportError::InvalidHeaderValue { field: "trace_id" })?,
        );
        let traceparent = synthesize_traceparent(trace_id, metadata.timestamp_ms);
        headers.insert(
            HEADER_TRACEPARENT,
            HeaderValue::from_str(&traceparent)
                .map_err(|_| TransportError::InvalidHeaderValue { field: "traceparent" })?,
        );
    }

    Ok(headers)
}

/// Recover envelope metadata from HTTP headers
///
/// Lenient by policy: unknown headers are ignored, a missing source becomes
/// the empty string, an unparseable timestamp becomes zero, and the trace
/// id falls back to the trace field of a well-formed `traceparent`.
pub fn from_http_headers(headers: &HeaderMap) -> EnvelopeMetadata {
    let source = match headers.get(HEADER_SOURCE).and_then(|v| v.to_str().ok()) {
        Some(s) => s.to_string(),
        None => {
            debug!("missing {HEADER_SOURCE} header, defaulting to empty source");
            String::new()
        }
    };

    let trace_id = headers
        .get(HEADER_TRACE_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| {
            headers
                .get(HEADER_TRACEPARENT)
                .and_then(|v| v.to_str().ok())
                .and_then(traceparent_trace_field)
        });

    let timestamp_ms = headers
        .get(HEADER_TIMESTAMP)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);

    EnvelopeMetadata {
        source,
        trace_id,
        timestamp_ms,
    }
}

/// Metadata inverse producing an envelope with an empty record. Callers
/// parse and attach the body record separately.
pub fn envelope_from_headers(headers: &HeaderMap) -> LnmpEnvelope {
    LnmpEnvelope {
        record: LnmpRecord::new(),
        metadata: from_http_headers(headers),
    }
}

/// W3C shape: `00-<32 hex trace>-<16 hex span>-01`. A trace id that is
/// already 32 lowercase hex chars passes through; any other id contributes
/// its first 16 UTF-8 bytes, zero padded. The span field carries the
/// timestamp in big-endian hex.
fn synthesize_traceparent(trace_id: &str, timestamp_ms: u64) -> String {
    let trace_hex = if is_lower_hex_32(trace_id) {
        trace_id.to_string()
    } else {
        let mut bytes = [0u8; 16];
        for (slot, b) in bytes.iter_mut().zip(trace_id.bytes()) {
            *slot = b;
        }
        hex::encode(bytes)
    };
    format!("00-{trace_hex}-{timestamp_ms:016x}-01")
}

fn is_lower_hex_32(s: &str) -> bool {
    s.len() == 32 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Trace field of a well-formed traceparent
fn traceparent_trace_field(value: &str) -> Option<String> {
    let mut parts = value.split('-');
    let version = parts.next()?;
    let trace = parts.next()?;
    let span = parts.next()?;
    let _flags = parts.next()?;
    if version.len() != 2 || trace.len() != 32 || span.len() != 16 {
        return None;
    }
    if !trace.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    Some(trace.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::EnvelopeBuilder;

    fn envelope(source: &str, trace_id: Option<&str>, timestamp_ms: u64) -> LnmpEnvelope {
        let mut builder = EnvelopeBuilder::new(LnmpRecord::new())
            .source(source)
            .timestamp(timestamp_ms);
        if let Some(tid) = trace_id {
            builder = builder.trace_id(tid);
        }
        builder.build()
    }

    #[test]
    fn metadata_round_trips_through_headers() {
        let env = envelope("ingest-gw", Some("abc123"), 1_700_000_000_000);
        let headers = to_http_headers(&env).unwrap();
        let metadata = from_http_headers(&headers);
        assert_eq!(metadata, env.metadata);
    }

    #[test]
    fn trace_headers_are_omitted_without_trace_id() {
        let env = envelope("svc", None, 5);
        let headers = to_http_headers(&env).unwrap();
        assert_eq!(headers.get(HEADER_SOURCE).unwrap(), "svc");
        assert_eq!(headers.get(HEADER_TIMESTAMP).unwrap(), "5");
        assert!(headers.get(HEADER_TRACE_ID).is_none());
        assert!(headers.get(HEADER_TRACEPARENT).is_none());
    }

    #[test]
    fn hex_trace_id_passes_into_traceparent() {
        let tid = "0123456789abcdef0123456789abcdef";
        let env = envelope("svc", Some(tid), 0x1234);
        let headers = to_http_headers(&env).unwrap();
        assert_eq!(
            headers.get(HEADER_TRACEPARENT).unwrap(),
            &format!("00-{tid}-0000000000001234-01")
        );
    }

    #[test]
    fn short_trace_id_is_padded_into_traceparent() {
        let env = envelope("svc", Some("abc123"), 1);
        let headers = to_http_headers(&env).unwrap();
        let expected_trace = hex::encode({
            let mut b = [0u8; 16];
            b[..6].copy_from_slice(b"abc123");
            b
        });
        assert_eq!(
            headers.get(HEADER_TRACEPARENT).unwrap(),
            &format!("00-{expected_trace}-0000000000000001-01")
        );
    }

    #[test]
    fn traceparent_is_the_trace_id_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(
            HEADER_TRACEPARENT,
            HeaderValue::from_static("00-0123456789abcdef0123456789abcdef-00000000000004d2-01"),
        );
        let metadata = from_http_headers(&headers);
        assert_eq!(
            metadata.trace_id.as_deref(),
            Some("0123456789abcdef0123456789abcdef")
        );

        let mut malformed = HeaderMap::new();
        malformed.insert(HEADER_TRACEPARENT, HeaderValue::from_static("00-zz-1-01"));
        assert_eq!(from_http_headers(&malformed).trace_id, None);
    }

    #[test]
    fn missing_and_malformed_headers_degrade_quietly() {
        let empty = HeaderMap::new();
        let metadata = from_http_headers(&empty);
        assert_eq!(metadata.source, "");
        assert_eq!(metadata.trace_id, None);
        assert_eq!(metadata.timestamp_ms, 0);

        let mut garbage = HeaderMap::new();
        garbage.insert(HEADER_TIMESTAMP, HeaderValue::from_static("soon"));
        garbage.insert("x-unrelated", HeaderValue::from_static("ignored"));
        assert_eq!(from_http_headers(&garbage).timestamp_ms, 0);
    }

    #[test]
    fn unrepresentable_source_is_rejected() {
        let env = envelope("bad\nsource", None, 0);
        assert_eq!(
            to_http_headers(&env).unwrap_err(),
            TransportError::InvalidHeaderValue { field: "source" }
        );
    }

    #[test]
    fn envelope_from_headers_has_empty_record() {
        let env = envelope("svc", Some("t"), 9);
        let headers = to_http_headers(&env).unwrap();
        let rebuilt = envelope_from_headers(&headers);
        assert!(rebuilt.record.is_empty());
        assert_eq!(rebuilt.metadata, env.metadata);
    }
}
