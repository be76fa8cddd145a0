//! Routing Decision Engine
//!
//! Stateless three-way classifier over scored envelopes: LLM dispatch for
//! high-composite low-risk messages, drop for stale noise, local processing
//! for the band between. Every call scores and classifies from scratch;
//! nothing persists across invocations.

use num_enum::TryFromPrimitive;
use thiserror::Error;
use tracing::debug;

use crate::codec::Parser;
use crate::envelope::{current_timestamp_ms, EnvelopeBuilder, LnmpEnvelope};
use crate::sanitize::{sanitize_lnmp_text, SanitizationConfig};
use crate::score::{context_score, ContextScore, ContextScorer, RiskLevel};

/// Message kinds carried over the wire
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub enum MessageKind {
    Event = 1,
    Command = 2,
    Query = 3,
    Telemetry = 4,
}

/// A kinded envelope ready for routing
#[derive(Debug, Clone)]
pub struct NetMessage {
    pub envelope: LnmpEnvelope,
    pub kind: MessageKind,
}

impl NetMessage {
    pub fn new(envelope: LnmpEnvelope, kind: MessageKind) -> Self {
        Self { envelope, kind }
    }
}

/// Terminal routing classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub enum RoutingDecision {
    SendToLLM,
    ProcessLocally,
    Drop,
}

/// Routing configuration errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RoutingError {
    #[error("Drop threshold {drop} must not exceed LLM threshold {llm}")]
    InvalidThresholds { llm: f64, drop: f64 },
}

/// Threshold bands for the routing classifier
///
/// Composite at or above `llm_threshold` dispatches to the LLM when the
/// risk level permits; at or below `drop_threshold` the message is dropped.
/// Critical risk always drops, whatever `max_llm_risk` says.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingPolicy {
    pub llm_threshold: f64,
    pub drop_threshold: f64,
    /// Highest risk level still eligible for LLM dispatch
    pub max_llm_risk: RiskLevel,
    pub scorer: ContextScorer,
}

impl Default for RoutingPolicy {
    fn default() -> Self {
        Self {
            llm_threshold: 0.70,
            drop_threshold: 0.25,
            max_llm_risk: RiskLevel::High,
            scorer: ContextScorer::default(),
        }
    }
}

impl RoutingPolicy {
    /// Classify a message against an explicit clock reading
    pub fn decide(&self, message: &NetMessage, now_ms: u64) -> Result<RoutingDecision, RoutingError> {
        self.validate()?;
        let profile = self.scorer.score_envelope(&message.envelope, now_ms);
        let composite = profile.composite_score();

        let decision = if profile.risk_level == RiskLevel::Critical {
            RoutingDecision::Drop
        } else if composite >= self.llm_threshold && profile.risk_level <= self.max_llm_risk {
            RoutingDecision::SendToLLM
        } else if composite <= self.drop_threshold {
            // Commands carry side effects; degrade them to local handling
            // instead of dropping
            if message.kind == MessageKind::Command {
                RoutingDecision::ProcessLocally
            } else {
                RoutingDecision::Drop
            }
        } else {
            RoutingDecision::ProcessLocally
        };

        debug!(
            ?decision,
            composite,
            risk = profile.risk_level.as_u8(),
            kind = ?message.kind,
            "routing decision"
        );
        Ok(decision)
    }

    fn validate(&self) -> Result<(), RoutingError> {
        if self.drop_threshold > self.llm_threshold {
            return Err(RoutingError::InvalidThresholds {
                llm: self.llm_threshold,
                drop: self.drop_threshold,
            });
        }
        Ok(())
    }
}

/// Route an event envelope with the default policy against the system clock
pub fn routing_decide(envelope: &LnmpEnvelope) -> Result<RoutingDecision, RoutingError> {
    let policy = RoutingPolicy::default();
    let message = NetMessage::new(envelope.clone(), MessageKind::Event);
    policy.decide(&message, current_timestamp_ms())
}

/// Composite-threshold convenience, independent of the policy bands.
/// Callers should not assume it always agrees with [`RoutingPolicy::decide`].
pub fn should_send_to_llm(envelope: &LnmpEnvelope, threshold: f64) -> bool {
    context_score(envelope).composite >= threshold
}

/// Everything the one-call workflow produces. The parsed record lives
/// inside `envelope`.
#[derive(Debug, Clone)]
pub struct RouteOutcome {
    pub envelope: LnmpEnvelope,
    pub score: ContextScore,
    pub decision: RoutingDecision,
    /// `score.composite >= threshold`, same rule as [`should_send_to_llm`]
    pub send_to_llm: bool,
}

/// Complete workflow over raw text: sanitize, parse, wrap, score, route.
///
/// Runs the default sanitizer, policy, and weight table against the system
/// clock; callers needing an explicit clock or custom policy compose the
/// stages themselves.
pub fn normalize_and_route(
    text: &str,
    source: &str,
    trace_id: Option<&str>,
    threshold: f64,
) -> crate::Result<RouteOutcome> {
    let clean = sanitize_lnmp_text(text, &SanitizationConfig::default());
    let record = Parser::new(&clean)?.parse_record()?;

    let mut builder = EnvelopeBuilder::new(record).source(source);
    if let Some(tid) = trace_id {
        builder = builder.trace_id(tid);
    }
    let envelope = builder.build();

    let now_ms = current_timestamp_ms();
    let score = ContextScorer::default().score(&envelope, now_ms);
    let message = NetMessage::new(envelope, MessageKind::Event);
    let decision = RoutingPolicy::default().decide(&message, now_ms)?;

    Ok(RouteOutcome {
        envelope: message.envelope,
        score,
        decision,
        send_to_llm: score.composite >= threshold,
    })
}
