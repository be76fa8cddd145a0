//! Envelope Model
//!
//! Wraps one record with routing metadata: source service, optional trace
//! id, capture timestamp. Envelopes are immutable once built and freely
//! shareable across threads.
//!
//! Construction is the only place wall-clock time enters the pipeline; the
//! scoring and routing engines take an explicit `now_ms` so they stay
//! deterministic under test.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::record::LnmpRecord;

/// Routing metadata carried alongside a record
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct EnvelopeMetadata {
    /// Originating service name. Required by the protocol; transport decode
    /// fills an empty string when the header is missing.
    pub source: String,
    pub trace_id: Option<String>,
    /// Capture time in epoch milliseconds
    pub timestamp_ms: u64,
}

/// A record plus its routing metadata
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct LnmpEnvelope {
    pub record: LnmpRecord,
    pub metadata: EnvelopeMetadata,
}

impl LnmpEnvelope {
    /// Age against a caller-supplied clock reading. Future timestamps
    /// saturate to zero.
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.metadata.timestamp_ms)
    }
}

/// Time source for envelope construction
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Wall-clock milliseconds since the Unix epoch
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        current_timestamp_ms()
    }
}

/// Get current wall-clock time in epoch milliseconds
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Builder for envelopes
#[derive(Debug, Clone)]
pub struct EnvelopeBuilder {
    record: LnmpRecord,
    source: String,
    trace_id: Option<String>,
    timestamp_ms: Option<u64>,
}

impl EnvelopeBuilder {
    pub fn new(record: LnmpRecord) -> Self {
        Self {
            record,
            source: String::new(),
            trace_id: None,
            timestamp_ms: None,
        }
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    pub fn timestamp(mut self, timestamp_ms: u64) -> Self {
        self.timestamp_ms = Some(timestamp_ms);
        self
    }

    /// Build, capturing the system clock when no timestamp was given
    pub fn build(self) -> LnmpEnvelope {
        self.build_with_clock(&SystemClock)
    }

    /// Build against an explicit clock
    pub fn build_with_clock(self, clock: &impl Clock) -> LnmpEnvelope {
        let timestamp_ms = self.timestamp_ms.unwrap_or_else(|| clock.now_ms());
        LnmpEnvelope {
            record: self.record,
            metadata: EnvelopeMetadata {
                source: self.source,
                trace_id: self.trace_id,
                timestamp_ms,
            },
        }
    }
}

/// Wrap a record with a source, capturing the current time
pub fn wrap(record: LnmpRecord, source: impl Into<String>) -> LnmpEnvelope {
    EnvelopeBuilder::new(record).source(source).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::LnmpValue;

    struct FixedClock(u64);

    impl Clock for FixedClock {
        fn now_ms(&self) -> u64 {
            self.0
        }
    }

    #[test]
    fn builder_fills_defaults_from_clock() {
        let mut record = LnmpRecord::new();
        record.set(12, LnmpValue::Int(14532));

        let envelope = EnvelopeBuilder::new(record)
            .source("sensor-a")
            .build_with_clock(&FixedClock(1_700_000_000_000));

        assert_eq!(envelope.metadata.source, "sensor-a");
        assert_eq!(envelope.metadata.trace_id, None);
        assert_eq!(envelope.metadata.timestamp_ms, 1_700_000_000_000);
        assert_eq!(envelope.record.get_int(12), Some(14532));
    }

    #[test]
    fn explicit_timestamp_wins_over_clock() {
        let envelope = EnvelopeBuilder::new(LnmpRecord::new())
            .source("s")
            .timestamp(42)
            .trace_id("abc123")
            .build_with_clock(&FixedClock(99_999));

        assert_eq!(envelope.metadata.timestamp_ms, 42);
        assert_eq!(envelope.metadata.trace_id.as_deref(), Some("abc123"));
    }

    #[test]
    fn wrap_captures_current_time() {
        let before = current_timestamp_ms();
        let envelope = wrap(LnmpRecord::new(), "svc");
        let after = current_timestamp_ms();

        assert!(envelope.metadata.timestamp_ms >= before);
        assert!(envelope.metadata.timestamp_ms <= after);
        assert_eq!(envelope.metadata.source, "svc");
    }

    #[test]
    fn age_saturates_for_future_timestamps() {
        let envelope = EnvelopeBuilder::new(LnmpRecord::new())
            .source("s")
            .timestamp(10_000)
            .build_with_clock(&FixedClock(0));

        assert_eq!(envelope.age_ms(10_500), 500);
        assert_eq!(envelope.age_ms(9_000), 0);
    }
}
