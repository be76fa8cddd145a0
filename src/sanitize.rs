//! Text Sanitization
//!
//! Canonicalizes raw LNMP text before storage or forwarding: trims the ends,
//! collapses whitespace runs outside quoted regions to a single space, and
//! strips whitespace touching the `=` and `;` separators. Quoted regions
//! pass through untouched.
//!
//! This is a plain text transform, not a validator; it runs happily over
//! text the parser would reject.

use std::borrow::Cow;

use tracing::debug;

/// Which sanitization passes apply
#[derive(Debug, Clone)]
pub struct SanitizationConfig {
    /// Collapse whitespace runs outside quotes to one space and trim ends
    pub collapse_whitespace: bool,
    /// Remove whitespace immediately adjacent to `=` and `;`
    pub strip_separator_whitespace: bool,
}

impl Default for SanitizationConfig {
    fn default() -> Self {
        Self {
            collapse_whitespace: true,
            strip_separator_whitespace: true,
        }
    }
}

/// Sanitize LNMP text. Returns the input unallocated when nothing changed.
pub fn sanitize_lnmp_text<'a>(text: &'a str, config: &SanitizationConfig) -> Cow<'a, str> {
    let mut out = String::with_capacity(text.len());
    let mut pending = String::new();
    let mut in_quotes = false;

    for c in text.chars() {
        if in_quotes {
            out.push(c);
            if c == '"' {
                in_quotes = false;
            }
            continue;
        }
        if c == '"' {
            flush_pending(&mut out, &mut pending, config);
            out.push(c);
            in_quotes = true;
            continue;
        }
        if c.is_whitespace() {
            pending.push(c);
            continue;
        }
        if (c == '=' || c == ';') && config.strip_separator_whitespace {
            pending.clear();
            out.push(c);
            continue;
        }
        flush_pending(&mut out, &mut pending, config);
        out.push(c);
    }
    // Trailing run: dropped when trimming, otherwise preserved
    if !config.collapse_whitespace {
        flush_pending(&mut out, &mut pending, config);
    }

    if out == text {
        Cow::Borrowed(text)
    } else {
        debug!(
            before = text.len(),
            after = out.len(),
            "sanitized lnmp text"
        );
        Cow::Owned(out)
    }
}

fn flush_pending(out: &mut String, pending: &mut String, config: &SanitizationConfig) {
    if pending.is_empty() {
        return;
    }
    let after_separator = matches!(out.chars().last(), Some('=') | Some(';'));
    if config.strip_separator_whitespace && after_separator {
        pending.clear();
        return;
    }
    if config.collapse_whitespace {
        if !out.is_empty() {
            out.push(' ');
        }
    } else {
        out.push_str(pending);
    }
    pending.clear();
}
