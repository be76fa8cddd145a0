//! Context Scoring Engine
//!
//! Derives a multi-dimensional relevance profile from an envelope: half-life
//! freshness decay, field-driven importance, risk classification, and a
//! completeness confidence, combined into a composite under a versioned
//! weight table. Pure given `(envelope, now_ms)`.

use num_enum::TryFromPrimitive;
use tracing::trace;

use crate::envelope::{current_timestamp_ms, LnmpEnvelope};
use crate::record::{field_ids, LnmpRecord, LnmpValue};

/// Risk classification of a record
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, TryFromPrimitive)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub enum RiskLevel {
    Low = 0,
    Medium = 1,
    High = 2,
    Critical = 3,
}

impl RiskLevel {
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    /// Normalized over the four levels to [0, 1]
    pub fn normalized(&self) -> f64 {
        f64::from(*self as u8) / 3.0
    }

    fn from_label(label: &str) -> Option<Self> {
        match label {
            "low" => Some(RiskLevel::Low),
            "medium" => Some(RiskLevel::Medium),
            "high" => Some(RiskLevel::High),
            "critical" => Some(RiskLevel::Critical),
            _ => None,
        }
    }
}

/// Composite weight table
///
/// Weights sum to 1.0 so the composite lands in [0, 1] with no clamping.
/// `safety` applies to the inverted normalized risk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub version: u8,
    pub freshness: f64,
    pub importance: f64,
    pub confidence: f64,
    pub safety: f64,
}

/// Weight table version 1
pub const SCORE_WEIGHTS_V1: ScoreWeights = ScoreWeights {
    version: 1,
    freshness: 0.30,
    importance: 0.35,
    confidence: 0.20,
    safety: 0.15,
};

/// Freshness half-life: one minute of age halves the freshness score
pub const FRESHNESS_HALF_LIFE_MS: u64 = 60_000;

/// Scored dimensions of one envelope
#[derive(Debug, Clone, PartialEq)]
pub struct ContextProfile {
    /// Half-life decay of message age, in [0, 1]
    pub freshness_score: f64,
    /// Field-derived importance on the protocol's 0-255 scale
    pub importance: u8,
    pub risk_level: RiskLevel,
    /// Completeness and trust estimate in [0, 1]
    pub confidence: f64,
    weights: ScoreWeights,
}

impl ContextProfile {
    /// Weighted composite in [0, 1]
    pub fn composite_score(&self) -> f64 {
        let w = &self.weights;
        w.freshness * self.freshness_score
            + w.importance * (f64::from(self.importance) / 255.0)
            + w.confidence * self.confidence
            + w.safety * (1.0 - self.risk_level.normalized())
    }

    /// Flatten to the five-float score form
    pub fn to_score(&self) -> ContextScore {
        ContextScore {
            composite: self.composite_score(),
            freshness: self.freshness_score,
            importance: f64::from(self.importance) / 255.0,
            risk: self.risk_level.normalized(),
            confidence: self.confidence,
        }
    }
}

/// Flattened context score: five floats, all in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct ContextScore {
    pub composite: f64,
    pub freshness: f64,
    pub importance: f64,
    pub risk: f64,
    pub confidence: f64,
}

/// Deterministic envelope scorer
#[derive(Debug, Clone, PartialEq)]
pub struct ContextScorer {
    weights: ScoreWeights,
    half_life_ms: u64,
}

impl Default for ContextScorer {
    fn default() -> Self {
        Self {
            weights: SCORE_WEIGHTS_V1,
            half_life_ms: FRESHNESS_HALF_LIFE_MS,
        }
    }
}

impl ContextScorer {
    pub fn new(weights: ScoreWeights, half_life_ms: u64) -> Self {
        Self {
            weights,
            half_life_ms,
        }
    }

    /// Score an envelope against an explicit clock reading
    pub fn score_envelope(&self, envelope: &LnmpEnvelope, now_ms: u64) -> ContextProfile {
        let freshness_score = self.freshness(envelope.age_ms(now_ms));
        let importance = importance_from_record(&envelope.record);
        let risk_level = risk_from_record(&envelope.record);
        let confidence = confidence_from_record(&envelope.record, freshness_score);
        trace!(
            source = %envelope.metadata.source,
            freshness = freshness_score,
            importance,
            risk = risk_level.as_u8(),
            confidence,
            "scored envelope"
        );
        ContextProfile {
            freshness_score,
            importance,
            risk_level,
            confidence,
            weights: self.weights,
        }
    }

    /// Flattened convenience over [`score_envelope`](Self::score_envelope)
    pub fn score(&self, envelope: &LnmpEnvelope, now_ms: u64) -> ContextScore {
        self.score_envelope(envelope, now_ms).to_score()
    }

    fn freshness(&self, age_ms: u64) -> f64 {
        0.5f64.powf(age_ms as f64 / self.half_life_ms as f64)
    }
}

/// Score with the default scorer against the system clock
pub fn context_score(envelope: &LnmpEnvelope) -> ContextScore {
    ContextScorer::default().score(envelope, current_timestamp_ms())
}

/// Priority field sets the base; a nonzero urgent flag adds a saturating
/// bump on top.
fn importance_from_record(record: &LnmpRecord) -> u8 {
    let mut importance = match record.get(field_ids::PRIORITY) {
        Some(LnmpValue::Int(v)) => (*v).clamp(0, 255) as u8,
        Some(LnmpValue::Str(label)) => priority_label(label),
        _ => 128,
    };
    if record
        .get_int(field_ids::URGENT)
        .map_or(false, |v| v != 0)
    {
        importance = importance.saturating_add(32);
    }
    importance
}

fn priority_label(label: &str) -> u8 {
    match label {
        "critical" => 255,
        "high" | "high_priority" => 224,
        "normal" => 128,
        "low" => 64,
        other => {
            trace!(label = other, "unrecognized priority label, using normal");
            128
        }
    }
}

/// Unrecognized or absent risk markers default to Low
fn risk_from_record(record: &LnmpRecord) -> RiskLevel {
    match record.get(field_ids::RISK) {
        Some(LnmpValue::Int(v)) => u8::try_from(*v)
            .ok()
            .and_then(|b| RiskLevel::try_from(b).ok())
            .unwrap_or(RiskLevel::Low),
        Some(LnmpValue::Str(label)) => RiskLevel::from_label(label).unwrap_or(RiskLevel::Low),
        _ => RiskLevel::Low,
    }
}

/// Completeness curve over field count, scaled by freshness. An explicit
/// confidence field (integer percent) replaces the curve but is still
/// freshness-scaled.
fn confidence_from_record(record: &LnmpRecord, freshness: f64) -> f64 {
    let base = match record.get_int(field_ids::CONFIDENCE) {
        Some(v) => f64::from(v.clamp(0, 100) as u32) / 100.0,
        None => 1.0 - 0.5f64.powi(record.len() as i32),
    };
    base * (0.5 + 0.5 * freshness)
}
