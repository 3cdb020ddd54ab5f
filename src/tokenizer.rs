/*!
JSON lexical + node-level primitives.

A byte-by-byte scan loop generalized from raw pointer offsets over a
whole-document byte slice to incremental reads from any
[`crate::input::Input`]. All operations here assume the tokenizer position
is at the anchor documented per-operation, and return the next significant
(non-whitespace) codepoint after the consumed value so callers can branch on
structural characters without an extra peek — except where noted, that
codepoint is *not* consumed.
*/

use crate::error::{ConstraintError, ConstraintErrorKind, FormatError, FormatErrorKind, JsonProcessingError};
use crate::input::Input;
use crate::std_ext::char::try_from_utf16_surrogate_pair;
use crate::value::{Number, Value};

/// JSON whitespace: space, tab, newline, carriage return. Nothing else.
#[inline]
fn is_json_whitespace(b: u8) -> bool {
    matches!(b, 0x20 | 0x09 | 0x0A | 0x0D)
}

#[inline]
fn is_digit(b: u8) -> bool {
    b.is_ascii_digit()
}

/// The outcome of [`Tokenizer::read_node_detect`].
#[derive(Debug, Clone, PartialEq)]
pub enum NodeOutcome {
    /// A JSON value was read.
    Value(Value),
    /// `allow_close_bracket` was set and a `]` was found instead of a value
    /// (used for empty arrays).
    ClosedBracket,
}

pub struct Tokenizer<I> {
    input: I,
}

impl<I: Input> Tokenizer<I> {
    pub fn new(input: I) -> Self {
        Tokenizer { input }
    }

    pub fn byte_offset(&self) -> usize {
        self.input.byte_offset()
    }

    fn format_err(&self, kind: FormatErrorKind) -> JsonProcessingError {
        FormatError {
            kind,
            position: String::new(),
        }
        .into()
    }

    /// Consume whitespace bytes. Structural JSON whitespace is ASCII-only,
    /// so this only ever needs `read_ascii`-level lookahead.
    fn skip_whitespace(&mut self) -> Result<(), JsonProcessingError> {
        loop {
            match self.input.peek()? {
                Some(cp) if cp <= 0x7F && is_json_whitespace(cp as u8) => {
                    self.input.read_ascii()?;
                }
                _ => return Ok(()),
            }
        }
    }

    /// Skip whitespace and return the next codepoint *without* consuming it.
    /// `None` on EOF.
    pub fn peek_significant(&mut self) -> Result<Option<u32>, JsonProcessingError> {
        self.skip_whitespace()?;
        self.input.peek()
    }

    /// Skip whitespace, consume the next codepoint, and return it. If
    /// `expected` is given, fail with a `FormatError` if the consumed
    /// codepoint doesn't match.
    pub fn read_char_skip_whitespace(
        &mut self,
        expected: Option<u8>,
    ) -> Result<u32, JsonProcessingError> {
        self.skip_whitespace()?;
        let found = self.input.read_ascii()?;
        if let Some(expected) = expected {
            if found != expected {
                return Err(self.format_err(FormatErrorKind::UnexpectedCodepoint {
                    found: Some(found as u32),
                    expected: ascii_name(expected),
                }));
            }
        }
        Ok(found as u32)
    }

    fn expect_ascii_sequence(&mut self, rest: &[u8]) -> Result<(), JsonProcessingError> {
        for &expected in rest {
            let found = self.input.read_ascii()?;
            if found != expected {
                return Err(self.format_err(FormatErrorKind::UnexpectedCodepoint {
                    found: Some(found as u32),
                    expected: ascii_name(expected),
                }));
            }
        }
        Ok(())
    }

    /// Read a JSON value. Precondition: position is immediately before the
    /// value, possibly preceded by whitespace.
    ///
    /// Returns the parsed value (or `ClosedBracket` if `allow_close_bracket`
    /// and a `]` was found) along with the next significant codepoint after
    /// the value, left unconsumed.
    ///
    /// `max_length` bounds a string value read directly at this position
    /// (the member's own `max_length` constraint, if any); it never applies
    /// to strings nested inside an object/array read by this call, since
    /// those belong to no single member.
    pub fn read_node_detect(
        &mut self,
        allow_close_bracket: bool,
        max_length: Option<usize>,
    ) -> Result<(NodeOutcome, Option<u32>), JsonProcessingError> {
        self.skip_whitespace()?;
        let first = self.input.read_ascii()?;

        let value = match first {
            b'{' => Value::Map(self.read_object_inline()?),
            b'[' => Value::List(self.read_array_inline()?),
            b'"' => Value::String(self.read_string(max_length)?),
            b't' => {
                self.expect_ascii_sequence(b"rue")?;
                Value::Bool(true)
            }
            b'f' => {
                self.expect_ascii_sequence(b"alse")?;
                Value::Bool(false)
            }
            b'n' => {
                self.expect_ascii_sequence(b"ull")?;
                Value::Null
            }
            b'-' | b'0'..=b'9' => Value::Number(self.read_number(first)?),
            b']' if allow_close_bracket => {
                let next = self.peek_significant()?;
                return Ok((NodeOutcome::ClosedBracket, next));
            }
            other => {
                return Err(self.format_err(FormatErrorKind::UnexpectedCodepoint {
                    found: Some(other as u32),
                    expected: "a JSON value",
                }))
            }
        };

        let next = self.peek_significant()?;
        Ok((NodeOutcome::Value(value), next))
    }

    /// Fully parse an embedded `{ ... }` whose opening brace has already
    /// been consumed, materialising it as an insertion-ordered list of
    /// entries. Used by `read_node_detect` for nested objects that aren't
    /// streamed lazily by the engine.
    fn read_object_inline(&mut self) -> Result<Vec<(String, Value)>, JsonProcessingError> {
        let mut entries = Vec::new();
        let mut next = self.read_char_skip_whitespace(None)?;
        if next as u8 == b'}' {
            return Ok(entries);
        }
        loop {
            if next as u8 != b'"' {
                return Err(self.format_err(FormatErrorKind::UnexpectedCodepoint {
                    found: Some(next),
                    expected: "a string key",
                }));
            }
            let key = self.read_string(None)?;
            self.read_char_skip_whitespace(Some(b':'))?;
            let (outcome, after) = self.read_node_detect(false, None)?;
            let NodeOutcome::Value(value) = outcome else {
                unreachable!("allow_close_bracket was false");
            };
            entries.push((key, value));

            let sep = after.ok_or_else(|| self.format_err(FormatErrorKind::UnexpectedEof))?;
            match sep as u8 {
                b',' => {
                    self.input.read_ascii()?;
                    next = self.read_char_skip_whitespace(None)?;
                }
                b'}' => {
                    self.input.read_ascii()?;
                    break;
                }
                _ => {
                    return Err(self.format_err(FormatErrorKind::UnexpectedCodepoint {
                        found: Some(sep),
                        expected: "',' or '}'",
                    }))
                }
            }
        }
        Ok(entries)
    }

    /// Fully parse an embedded `[ ... ]` whose opening bracket has already
    /// been consumed.
    fn read_array_inline(&mut self) -> Result<Vec<Value>, JsonProcessingError> {
        let mut items = Vec::new();
        let (outcome, mut after) = self.read_node_detect(true, None)?;
        match outcome {
            NodeOutcome::ClosedBracket => return Ok(items),
            NodeOutcome::Value(v) => items.push(v),
        }
        loop {
            let sep = after.ok_or_else(|| self.format_err(FormatErrorKind::UnexpectedEof))?;
            match sep as u8 {
                b',' => {
                    self.input.read_ascii()?;
                    let (outcome, next) = self.read_node_detect(false, None)?;
                    let NodeOutcome::Value(v) = outcome else {
                        unreachable!("allow_close_bracket was false");
                    };
                    items.push(v);
                    after = next;
                }
                b']' => {
                    self.input.read_ascii()?;
                    break;
                }
                _ => {
                    return Err(self.format_err(FormatErrorKind::UnexpectedCodepoint {
                        found: Some(sep),
                        expected: "',' or ']'",
                    }))
                }
            }
        }
        Ok(items)
    }

    /// Discard a JSON value without building it, tracking string escapes
    /// and nested array/object/number syntax correctly. Returns the next
    /// significant codepoint after the value, left unconsumed.
    pub fn skip_node_detect(&mut self) -> Result<Option<u32>, JsonProcessingError> {
        self.skip_whitespace()?;
        let first = self.input.read_ascii()?;
        match first {
            b'{' => self.skip_object_inline()?,
            b'[' => self.skip_array_inline()?,
            b'"' => {
                self.read_string(None)?;
            }
            b't' => self.expect_ascii_sequence(b"rue")?,
            b'f' => self.expect_ascii_sequence(b"alse")?,
            b'n' => self.expect_ascii_sequence(b"ull")?,
            b'-' | b'0'..=b'9' => {
                self.read_number(first)?;
            }
            other => {
                return Err(self.format_err(FormatErrorKind::UnexpectedCodepoint {
                    found: Some(other as u32),
                    expected: "a JSON value",
                }))
            }
        }
        self.peek_significant()
    }

    fn skip_object_inline(&mut self) -> Result<(), JsonProcessingError> {
        let mut next = self.read_char_skip_whitespace(None)?;
        if next as u8 == b'}' {
            return Ok(());
        }
        loop {
            if next as u8 != b'"' {
                return Err(self.format_err(FormatErrorKind::UnexpectedCodepoint {
                    found: Some(next),
                    expected: "a string key",
                }));
            }
            self.read_string(None)?;
            self.read_char_skip_whitespace(Some(b':'))?;
            let after = self.skip_node_detect()?;
            let sep = after.ok_or_else(|| self.format_err(FormatErrorKind::UnexpectedEof))?;
            match sep as u8 {
                b',' => {
                    self.input.read_ascii()?;
                    next = self.read_char_skip_whitespace(None)?;
                }
                b'}' => {
                    self.input.read_ascii()?;
                    return Ok(());
                }
                _ => {
                    return Err(self.format_err(FormatErrorKind::UnexpectedCodepoint {
                        found: Some(sep),
                        expected: "',' or '}'",
                    }))
                }
            }
        }
    }

    fn skip_array_inline(&mut self) -> Result<(), JsonProcessingError> {
        let first = self.peek_significant()?;
        if first.map(|c| c as u8) == Some(b']') {
            self.input.read_ascii()?;
            return Ok(());
        }
        let mut after = self.skip_node_detect()?;
        loop {
            let sep = after.ok_or_else(|| self.format_err(FormatErrorKind::UnexpectedEof))?;
            match sep as u8 {
                b',' => {
                    self.input.read_ascii()?;
                    after = self.skip_node_detect()?;
                }
                b']' => {
                    self.input.read_ascii()?;
                    return Ok(());
                }
                _ => {
                    return Err(self.format_err(FormatErrorKind::UnexpectedCodepoint {
                        found: Some(sep),
                        expected: "',' or ']'",
                    }))
                }
            }
        }
    }

    /// Read a JSON string. Precondition: the opening `"` has already been
    /// consumed. Reads codepoints until an unescaped `"`, processing
    /// escapes as it goes. If `max_length` is given, fails with a
    /// `ConstraintError` as soon as the decoded length would exceed it,
    /// rather than buffering the whole (possibly adversarial) string first.
    pub fn read_string(&mut self, max_length: Option<usize>) -> Result<String, JsonProcessingError> {
        let mut out = String::new();
        loop {
            let cp = self
                .input
                .read_codepoint()?
                .ok_or_else(|| self.format_err(FormatErrorKind::UnexpectedEof))?;

            match cp {
                0x22 => break, // `"`
                0x5C => {
                    // `\`
                    let escape = self
                        .input
                        .read_ascii()
                        .map_err(|_| self.format_err(FormatErrorKind::InvalidEscape('\0')))?;
                    match escape {
                        b'"' => out.push('"'),
                        b'\\' => out.push('\\'),
                        b'/' => out.push('/'),
                        b'b' => out.push('\u{0008}'),
                        b'f' => out.push('\u{000C}'),
                        b'n' => out.push('\n'),
                        b'r' => out.push('\r'),
                        b't' => out.push('\t'),
                        b'u' => {
                            let first = self.read_hex4()?;
                            if (0xD800..=0xDBFF).contains(&first) {
                                // high surrogate: a low surrogate must follow immediately
                                self.read_char_skip_whitespace(Some(b'\\'))?;
                                let u = self.input.read_ascii()?;
                                if u != b'u' {
                                    return Err(
                                        self.format_err(FormatErrorKind::InvalidUnicodeEscape)
                                    );
                                }
                                let second = self.read_hex4()?;
                                let ch = try_from_utf16_surrogate_pair(first, second)
                                    .map_err(|_| self.format_err(FormatErrorKind::InvalidUnicodeEscape))?;
                                out.push(ch);
                            } else {
                                let ch = char::from_u32(first as u32)
                                    .ok_or_else(|| self.format_err(FormatErrorKind::InvalidUnicodeEscape))?;
                                out.push(ch);
                            }
                        }
                        other => {
                            return Err(
                                self.format_err(FormatErrorKind::InvalidEscape(other as char))
                            )
                        }
                    }
                }
                _ => {
                    let ch = char::from_u32(cp)
                        .ok_or_else(|| self.format_err(FormatErrorKind::InvalidUtf8))?;
                    out.push(ch);
                }
            }

            if let Some(max_length) = max_length {
                if out.chars().count() > max_length {
                    log::warn!(target: "squirrel_stream::tokenizer", "string exceeds max_length of {max_length}, raising a constraint error");
                    return Err(ConstraintError {
                        kind: ConstraintErrorKind::MaxLength {
                            member: String::new(),
                            max_length,
                        },
                        position: String::new(),
                    }
                    .into());
                }
            }
        }
        Ok(out)
    }

    /// Read four ASCII hex digits, as required after a `\u` escape.
    fn read_hex4(&mut self) -> Result<u16, JsonProcessingError> {
        let mut v: u16 = 0;
        for _ in 0..4 {
            let b = self.input.read_ascii()?;
            let digit = match b {
                b'0'..=b'9' => b - b'0',
                b'a'..=b'f' => b - b'a' + 10,
                b'A'..=b'F' => b - b'A' + 10,
                _ => return Err(self.format_err(FormatErrorKind::InvalidUnicodeEscape)),
            };
            v = v * 16 + digit as u16;
        }
        Ok(v)
    }

    /// Read a JSON number. Precondition: the first digit or leading `-` has
    /// already been consumed and is passed as `first`. Accepts an optional
    /// fraction and exponent, and parses into the narrowest lossless
    /// representation (see [`Number`]).
    pub fn read_number(&mut self, first: u8) -> Result<Number, JsonProcessingError> {
        let mut literal = String::new();
        literal.push(first as char);

        let mut is_float = false;

        if first == b'-' {
            let d = self.input.read_ascii()?;
            if !is_digit(d) {
                return Err(self.format_err(FormatErrorKind::InvalidNumber));
            }
            literal.push(d as char);
        }

        // Integer part: consume remaining digits.
        loop {
            match self.input.peek()? {
                Some(cp) if cp <= 0x7F && is_digit(cp as u8) => {
                    literal.push(self.input.read_ascii()? as char);
                }
                _ => break,
            }
        }

        // Fraction.
        if self.input.peek()?.map(|c| c as u8) == Some(b'.') {
            is_float = true;
            literal.push('.');
            self.input.read_ascii()?;
            let d = self.input.read_ascii()?;
            if !is_digit(d) {
                return Err(self.format_err(FormatErrorKind::InvalidNumber));
            }
            literal.push(d as char);
            loop {
                match self.input.peek()? {
                    Some(cp) if cp <= 0x7F && is_digit(cp as u8) => {
                        literal.push(self.input.read_ascii()? as char);
                    }
                    _ => break,
                }
            }
        }

        // Exponent.
        if matches!(self.input.peek()?.map(|c| c as u8), Some(b'e') | Some(b'E')) {
            is_float = true;
            literal.push(self.input.read_ascii()? as char);
            if matches!(self.input.peek()?.map(|c| c as u8), Some(b'+') | Some(b'-')) {
                literal.push(self.input.read_ascii()? as char);
            }
            let d = self.input.read_ascii()?;
            if !is_digit(d) {
                return Err(self.format_err(FormatErrorKind::InvalidNumber));
            }
            literal.push(d as char);
            loop {
                match self.input.peek()? {
                    Some(cp) if cp <= 0x7F && is_digit(cp as u8) => {
                        literal.push(self.input.read_ascii()? as char);
                    }
                    _ => break,
                }
            }
        }

        if is_float {
            literal
                .parse::<f64>()
                .map(Number::F64)
                .map_err(|_| self.format_err(FormatErrorKind::InvalidNumber))
        } else if let Ok(n) = literal.parse::<i32>() {
            Ok(Number::I32(n))
        } else if let Ok(n) = literal.parse::<i64>() {
            Ok(Number::I64(n))
        } else {
            literal
                .parse::<f64>()
                .map(Number::F64)
                .map_err(|_| self.format_err(FormatErrorKind::InvalidNumber))
        }
    }
}

fn ascii_name(b: u8) -> &'static str {
    match b {
        b'{' => "'{'",
        b'}' => "'}'",
        b'[' => "'['",
        b']' => "']'",
        b':' => "':'",
        b',' => "','",
        b'"' => "'\"'",
        b'r' | b'u' | b'e' | b'a' | b'l' | b's' | b'n' => "a literal continuation",
        _ => "an expected character",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::SliceInput;

    fn tok(s: &str) -> Tokenizer<SliceInput<'_>> {
        Tokenizer::new(SliceInput::from_str(s))
    }

    #[test]
    fn reads_simple_object() {
        let mut t = tok(r#"{"a":1,"b":"two"}"#);
        let (NodeOutcome::Value(Value::Map(entries)), _) = t.read_node_detect(false, None).unwrap() else {
            panic!("expected map");
        };
        assert_eq!(entries[0].0, "a");
        assert_eq!(entries[0].1, Value::Number(Number::I32(1)));
        assert_eq!(entries[1].1, Value::String("two".into()));
    }

    #[test]
    fn reads_empty_array_with_allow_close_bracket() {
        let mut t = tok("]");
        let (outcome, _) = t.read_node_detect(true, None).unwrap();
        assert_eq!(outcome, NodeOutcome::ClosedBracket);
    }

    #[test]
    fn skip_then_read_leaves_same_position() {
        let input = r#"{"x":[1,2,3],"y":true}"#;
        let mut skipper = tok(input);
        skipper.read_char_skip_whitespace(Some(b'{')).unwrap();
        skipper.read_string(None).unwrap(); // "x"
        skipper.read_char_skip_whitespace(Some(b':')).unwrap();
        skipper.skip_node_detect().unwrap();

        let mut reader = tok(input);
        reader.read_char_skip_whitespace(Some(b'{')).unwrap();
        reader.read_string(None).unwrap();
        reader.read_char_skip_whitespace(Some(b':')).unwrap();
        reader.read_node_detect(false, None).unwrap();

        assert_eq!(skipper.byte_offset(), reader.byte_offset());
    }

    #[test]
    fn literal_utf8_codepoint_round_trips() {
        let mut t = tok(r#""𝄞""#);
        t.read_char_skip_whitespace(Some(b'"')).unwrap();
        let s = t.read_string(None).unwrap();
        assert_eq!(s, "\u{1D11E}");
    }

    #[test]
    fn escaped_surrogate_pair_decodes_to_musical_g_clef() {
        let mut t = tok("\"\\uD834\\uDD1E\"");
        t.read_char_skip_whitespace(Some(b'"')).unwrap();
        let s = t.read_string(None).unwrap();
        assert_eq!(s, "\u{1D11E}");
    }

    fn read_top_level_number(s: &str) -> Number {
        let mut t = tok(s);
        let (NodeOutcome::Value(Value::Number(n)), _) = t.read_node_detect(false, None).unwrap() else {
            panic!("expected number");
        };
        n
    }

    #[test]
    fn numbers_widen_correctly() {
        assert_eq!(read_top_level_number("2147483647"), Number::I32(2147483647));
        assert_eq!(read_top_level_number("2147483648"), Number::I64(2147483648));
        assert_eq!(read_top_level_number("-2147483648"), Number::I32(-2147483648));
        assert_eq!(read_top_level_number("1.5"), Number::F64(1.5));
    }

    #[test]
    fn rejects_invalid_escape() {
        let mut t = tok(r#""\q""#);
        t.read_char_skip_whitespace(Some(b'"')).unwrap();
        assert!(t.read_string(None).is_err());
    }
}
