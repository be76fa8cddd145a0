//! Text Grammar Codec
//!
//! Parses and renders the human-readable form: `F<id>=<value>` fields joined
//! by `;`. Values lex as integers, decimal floats, bare strings, `"quoted
//! strings"`, or `[a,b,c]` lists.
//!
//! The parser tolerates whitespace between tokens (a lenient-read posture;
//! the sanitizer exists to canonicalize text, not to gate parsing). The
//! encoder always emits the canonical form: ascending field ids, no
//! whitespace, quoting only where the value would otherwise change meaning.

use tracing::debug;

use super::{ParseError, ParseResult};
use crate::record::{LnmpRecord, LnmpValue, MAX_FIELD_ID};

/// Streaming parser over one LNMP text record
#[derive(Debug)]
pub struct Parser<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    /// Create a parser. Fails on empty or whitespace-only input.
    pub fn new(input: &'a str) -> ParseResult<Self> {
        if input.trim().is_empty() {
            return Err(ParseError::EmptyInput);
        }
        Ok(Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
        })
    }

    /// Parse the full input into a record
    ///
    /// Duplicate field ids are last-write-wins: the final assignment in the
    /// text is the one kept.
    pub fn parse_record(&mut self) -> ParseResult<LnmpRecord> {
        let mut record = LnmpRecord::new();
        loop {
            self.skip_whitespace();
            if self.at_end() {
                break;
            }
            let (id, value) = self.parse_field()?;
            if record.contains(id) {
                debug!(field_id = id, "duplicate field id, keeping last value");
            }
            record.set(id, value);

            self.skip_whitespace();
            match self.peek() {
                Some(b';') => self.pos += 1, // trailing ';' is tolerated
                None => break,
                Some(_) => {
                    return Err(ParseError::UnexpectedChar {
                        ch: self.char_at(self.pos),
                        offset: self.pos,
                    })
                }
            }
        }
        Ok(record)
    }

    fn parse_field(&mut self) -> ParseResult<(u32, LnmpValue)> {
        match self.peek() {
            Some(b'F') => self.pos += 1,
            _ => {
                return Err(ParseError::ExpectedFieldMarker { offset: self.pos });
            }
        }
        let id = self.parse_field_id()?;
        self.skip_whitespace();
        match self.peek() {
            Some(b'=') => self.pos += 1,
            _ => {
                return Err(ParseError::MissingSeparator { offset: self.pos });
            }
        }
        self.skip_whitespace();
        let value = self.parse_value()?;
        Ok((id, value))
    }

    fn parse_field_id(&mut self) -> ParseResult<u32> {
        let start = self.pos;
        let mut id: u64 = 0;
        let mut digits = 0usize;
        while let Some(b) = self.peek() {
            if !b.is_ascii_digit() {
                break;
            }
            id = id.saturating_mul(10).saturating_add(u64::from(b - b'0'));
            digits += 1;
            self.pos += 1;
        }
        if digits == 0 {
            return Err(ParseError::InvalidFieldId { offset: start });
        }
        if id > u64::from(MAX_FIELD_ID) {
            return Err(ParseError::FieldIdOutOfRange {
                id,
                max: MAX_FIELD_ID,
            });
        }
        Ok(id as u32)
    }

    fn parse_value(&mut self) -> ParseResult<LnmpValue> {
        match self.peek() {
            Some(b'"') => self.parse_quoted(),
            Some(b'[') => self.parse_list(),
            Some(_) => self.parse_bare(),
            None => Err(ParseError::MissingValue { offset: self.pos }),
        }
    }

    /// Quoted contents are verbatim up to the closing quote. The grammar has
    /// no escape sequences, so an interior `"` cannot be represented.
    fn parse_quoted(&mut self) -> ParseResult<LnmpValue> {
        let open = self.pos;
        self.pos += 1;
        match self.bytes[self.pos..].iter().position(|&b| b == b'"') {
            Some(idx) => {
                let content = self.input[self.pos..self.pos + idx].to_string();
                self.pos += idx + 1;
                Ok(LnmpValue::Str(content))
            }
            None => Err(ParseError::UnterminatedQuote { offset: open }),
        }
    }

    fn parse_list(&mut self) -> ParseResult<LnmpValue> {
        let open = self.pos;
        self.pos += 1;
        match self.bytes[self.pos..].iter().position(|&b| b == b']') {
            Some(idx) => {
                let content = &self.input[self.pos..self.pos + idx];
                self.pos += idx + 1;
                let items = if content.is_empty() {
                    Vec::new()
                } else {
                    content.split(',').map(str::to_string).collect()
                };
                Ok(LnmpValue::List(items))
            }
            None => Err(ParseError::UnterminatedList { offset: open }),
        }
    }

    fn parse_bare(&mut self) -> ParseResult<LnmpValue> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b == b';' || b.is_ascii_whitespace() {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(ParseError::MissingValue { offset: start });
        }
        Ok(lex_bare(&self.input[start..self.pos]))
    }

    fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if !b.is_ascii_whitespace() {
                break;
            }
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn char_at(&self, offset: usize) -> char {
        self.input[offset..].chars().next().unwrap_or('\0')
    }
}

/// Canonical text encoder
///
/// Renders fields in ascending id order with no whitespace. Infallible: any
/// record produces some text, though strings holding the grammar's own
/// delimiters may not survive a re-parse (see [`crate::validation`]).
#[derive(Debug, Default)]
pub struct Encoder;

impl Encoder {
    pub fn new() -> Self {
        Self
    }

    pub fn encode(&self, record: &LnmpRecord) -> String {
        let mut out = String::new();
        for (i, (id, value)) in record.iter().enumerate() {
            if i > 0 {
                out.push(';');
            }
            out.push('F');
            out.push_str(&id.to_string());
            out.push('=');
            render_value(value, &mut out);
        }
        out
    }
}

fn render_value(value: &LnmpValue, out: &mut String) {
    match value {
        LnmpValue::Int(v) => out.push_str(&v.to_string()),
        LnmpValue::Float(v) => out.push_str(&render_float(*v)),
        LnmpValue::Str(s) => {
            if needs_quoting(s) {
                out.push('"');
                out.push_str(s);
                out.push('"');
            } else {
                out.push_str(s);
            }
        }
        LnmpValue::List(items) => {
            out.push('[');
            out.push_str(&items.join(","));
            out.push(']');
        }
    }
}

/// A string is quoted when rendering it bare would change meaning on
/// re-parse: empty, leading quote or bracket, embedded whitespace or `;`,
/// or a token that would lex as a number.
fn needs_quoting(s: &str) -> bool {
    if s.is_empty() || s.starts_with('"') || s.starts_with('[') {
        return true;
    }
    if s.bytes().any(|b| b == b';' || b.is_ascii_whitespace()) {
        return true;
    }
    !matches!(lex_bare(s), LnmpValue::Str(_))
}

/// Floats always render with a `.` or exponent so they re-parse as floats
fn render_float(v: f64) -> String {
    let s = v.to_string();
    if s.bytes().any(|b| b == b'.' || b == b'e' || b == b'E') {
        s
    } else {
        format!("{s}.0")
    }
}

/// Type a bare token: fully numeric tokens become `Int`, finite decimal
/// forms become `Float`, everything else stays `Str`. Numerics too wide for
/// i64 stay `Str` so nothing silently truncates.
fn lex_bare(token: &str) -> LnmpValue {
    if looks_like_int(token) {
        if let Ok(v) = token.parse::<i64>() {
            return LnmpValue::Int(v);
        }
        return LnmpValue::Str(token.to_string());
    }
    if looks_like_float(token) {
        if let Ok(v) = token.parse::<f64>() {
            if v.is_finite() {
                return LnmpValue::Float(v);
            }
        }
    }
    LnmpValue::Str(token.to_string())
}

fn looks_like_int(token: &str) -> bool {
    let digits = token.strip_prefix('-').unwrap_or(token);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// `[-]digits[.digits][e[+-]digits]` with at least one of dot/exponent
fn looks_like_float(token: &str) -> bool {
    let body = token.strip_prefix('-').unwrap_or(token);
    let bytes = body.as_bytes();
    let mut i = 0;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i == 0 {
        return false;
    }
    let mut marked = false;
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == frac_start {
            return false;
        }
        marked = true;
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        i += 1;
        if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
            i += 1;
        }
        let exp_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return false;
        }
        marked = true;
    }
    marked && i == bytes.len()
}
