//! LNMP Record Inspector
//!
//! Runs one text record through the full pipeline and prints every
//! intermediate form: sanitized text, parsed fields, annotated rendering,
//! canonical binary frame, context scores, and the routing decision.
//!
//! ```text
//! lnmp_inspect "F7=1; F12=14532; F50=high" --source sensor-a
//! ```

use anyhow::Context;
use clap::Parser as ClapParser;
use lnmp::{
    current_timestamp_ms, sanitize_lnmp_text, BinaryDecoder, BinaryEncoder, ContextScorer,
    Encoder, EnvelopeBuilder, ExplainEncoder, MessageKind, NetMessage, Parser, RoutingPolicy,
    SanitizationConfig, SemanticDictionary,
};

#[derive(ClapParser, Debug)]
#[command(name = "lnmp_inspect", about = "Inspect an LNMP record end to end")]
struct Args {
    /// Record text, e.g. "F7=1;F12=14532"
    text: String,

    /// Envelope source service name
    #[arg(long, default_value = "lnmp-inspect")]
    source: String,

    /// Optional trace id for the envelope
    #[arg(long)]
    trace_id: Option<String>,

    /// Composite threshold for the should-send check
    #[arg(long, default_value_t = 0.70)]
    threshold: f64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    println!("=== Sanitize ===");
    let clean = sanitize_lnmp_text(&args.text, &SanitizationConfig::default());
    println!("{clean}");

    println!("\n=== Parse ===");
    let record = Parser::new(&clean)
        .and_then(|mut p| p.parse_record())
        .context("record text does not parse")?;
    println!("{} field(s)", record.len());

    println!("\n=== Explain ===");
    let explain = ExplainEncoder::new(SemanticDictionary::default());
    println!("{}", explain.encode_with_explanation(&record));

    println!("\n=== Canonical text ===");
    println!("{}", Encoder::new().encode(&record));

    println!("\n=== Binary frame ===");
    let bytes = BinaryEncoder::new().encode(&record)?;
    println!("{} bytes: {}", bytes.len(), hex::encode(&bytes));
    let reparsed = BinaryDecoder::new().decode(&bytes)?;
    let second = BinaryEncoder::new().encode(&reparsed)?;
    println!(
        "re-encode byte-identical: {}",
        if second == bytes { "yes" } else { "NO" }
    );

    println!("\n=== Score & route ===");
    let mut builder = EnvelopeBuilder::new(record).source(args.source.as_str());
    if let Some(trace_id) = &args.trace_id {
        builder = builder.trace_id(trace_id.as_str());
    }
    let envelope = builder.build();

    let now_ms = current_timestamp_ms();
    let score = ContextScorer::default().score(&envelope, now_ms);
    println!(
        "composite={:.4} freshness={:.4} importance={:.4} risk={:.4} confidence={:.4}",
        score.composite, score.freshness, score.importance, score.risk, score.confidence
    );

    let policy = RoutingPolicy::default();
    let message = NetMessage::new(envelope.clone(), MessageKind::Event);
    let decision = policy.decide(&message, now_ms)?;
    println!("decision: {decision:?}");
    println!(
        "should_send_to_llm(threshold={}): {}",
        args.threshold,
        lnmp::should_send_to_llm(&envelope, args.threshold)
    );

    #[cfg(feature = "transport-http")]
    {
        println!("\n=== Transport headers ===");
        let headers = lnmp::to_http_headers(&envelope)?;
        for (name, value) in &headers {
            println!("{name}: {}", value.to_str().unwrap_or("<binary>"));
        }
    }

    Ok(())
}
