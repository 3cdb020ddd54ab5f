/*!
Codepoint sources.

A raw byte/codepoint source sits behind a small trait so the tokenizer never
has to know whether it's reading from memory, a buffered `std::io::Read`, or
a caller-supplied codepoint iterator.

All three operations are phrased in terms of Unicode scalar values (`u32`)
rather than the source language's bare `int`, so EOF is `None` instead of a
sentinel `-1`.
*/

use crate::error::{FormatError, FormatErrorKind, JsonProcessingError};

/// A source of Unicode codepoints, consumed strictly forward.
///
/// Implementations never rewind: once a codepoint is returned from
/// [`Input::read_codepoint`] or [`Input::read_ascii`], it is gone.
pub trait Input {
    /// The next codepoint without consuming it. `None` on EOF.
    fn peek(&mut self) -> Result<Option<u32>, JsonProcessingError>;

    /// Consume one byte. JSON structural syntax (`{}[]:,"` and whitespace)
    /// is ASCII-only, so callers use this instead of `read_codepoint` when
    /// they know they're at a structural position.
    fn read_ascii(&mut self) -> Result<u8, JsonProcessingError>;

    /// Consume a full UTF-8 sequence, yielding one Unicode scalar. `None` on
    /// EOF.
    fn read_codepoint(&mut self) -> Result<Option<u32>, JsonProcessingError>;

    /// Current byte offset, for position reporting. Adapters that can't
    /// track this cheaply may return 0.
    fn byte_offset(&self) -> usize {
        0
    }
}

fn non_ascii(byte: u8) -> JsonProcessingError {
    FormatError {
        kind: FormatErrorKind::NonAsciiByte(byte),
        position: String::new(),
    }
    .into()
}

fn invalid_utf8() -> JsonProcessingError {
    FormatError {
        kind: FormatErrorKind::InvalidUtf8,
        position: String::new(),
    }
    .into()
}

/// Decode one UTF-8 sequence from a byte-at-a-time source. `next_byte`
/// returns `Ok(None)` on EOF. Rejects overlong encodings and surrogate
/// halves, per the standard.
fn decode_utf8(
    first: u8,
    mut next_byte: impl FnMut() -> Result<Option<u8>, JsonProcessingError>,
) -> Result<u32, JsonProcessingError> {
    let continuation = |b: u8| -> Result<u32, JsonProcessingError> {
        if b & 0xC0 != 0x80 {
            return Err(invalid_utf8());
        }
        Ok((b & 0x3F) as u32)
    };

    let cp = if first & 0x80 == 0 {
        first as u32
    } else if first & 0xE0 == 0xC0 {
        let b1 = next_byte()?.ok_or_else(invalid_utf8)?;
        let cp = ((first & 0x1F) as u32) << 6 | continuation(b1)?;
        if cp < 0x80 {
            return Err(invalid_utf8());
        }
        cp
    } else if first & 0xF0 == 0xE0 {
        let b1 = next_byte()?.ok_or_else(invalid_utf8)?;
        let b2 = next_byte()?.ok_or_else(invalid_utf8)?;
        let cp = ((first & 0x0F) as u32) << 12 | continuation(b1)? << 6 | continuation(b2)?;
        if !(0x800..=0xFFFF).contains(&cp) || (0xD800..=0xDFFF).contains(&cp) {
            return Err(invalid_utf8());
        }
        cp
    } else if first & 0xF8 == 0xF0 {
        let b1 = next_byte()?.ok_or_else(invalid_utf8)?;
        let b2 = next_byte()?.ok_or_else(invalid_utf8)?;
        let b3 = next_byte()?.ok_or_else(invalid_utf8)?;
        let cp = ((first & 0x07) as u32) << 18
            | continuation(b1)? << 12
            | continuation(b2)? << 6
            | continuation(b3)?;
        if !(0x10000..=0x10FFFF).contains(&cp) {
            return Err(invalid_utf8());
        }
        cp
    } else {
        return Err(invalid_utf8());
    };

    Ok(cp)
}

/// Adapter over an in-memory byte slice (or `&str`).
pub struct SliceInput<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> SliceInput<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        let mut pos = 0;
        // Skip a leading UTF-8 BOM if present, as the spec permits.
        if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
            pos = 3;
        }
        SliceInput { bytes, pos }
    }

    pub fn from_str(s: &'a str) -> Self {
        Self::new(s.as_bytes())
    }

    fn next_byte(&mut self) -> Result<Option<u8>, JsonProcessingError> {
        match self.bytes.get(self.pos) {
            Some(&b) => {
                self.pos += 1;
                Ok(Some(b))
            }
            None => Ok(None),
        }
    }
}

impl<'a> Input for SliceInput<'a> {
    fn peek(&mut self) -> Result<Option<u32>, JsonProcessingError> {
        let Some(&first) = self.bytes.get(self.pos) else {
            return Ok(None);
        };
        let saved = self.pos;
        self.pos += 1;
        let cp = decode_utf8(first, || self.next_byte());
        self.pos = saved;
        cp.map(Some)
    }

    fn read_ascii(&mut self) -> Result<u8, JsonProcessingError> {
        match self.next_byte()? {
            Some(b) if b < 0x80 => Ok(b),
            Some(b) => Err(non_ascii(b)),
            None => Err(FormatError {
                kind: FormatErrorKind::UnexpectedEof,
                position: String::new(),
            }
            .into()),
        }
    }

    fn read_codepoint(&mut self) -> Result<Option<u32>, JsonProcessingError> {
        let Some(first) = self.next_byte()? else {
            return Ok(None);
        };
        decode_utf8(first, || self.next_byte()).map(Some)
    }

    fn byte_offset(&self) -> usize {
        self.pos
    }
}

/// Adapter over a buffered `std::io::Read` byte stream.
///
/// Uses a grow-or-reset buffering strategy: data is appended to an internal
/// buffer and a cursor advances through it; the buffer is refilled (not
/// shifted) once the cursor catches up, bounding peak memory to roughly one
/// token's worth plus the refill chunk.
pub struct ReaderInput<R> {
    reader: R,
    buf: Vec<u8>,
    pos: usize,
    eof: bool,
    total_consumed: usize,
}

const DEFAULT_CHUNK: usize = 64 * 1024;

impl<R: std::io::Read> ReaderInput<R> {
    pub fn new(reader: R) -> Self {
        ReaderInput {
            reader,
            buf: Vec::with_capacity(DEFAULT_CHUNK),
            pos: 0,
            eof: false,
            total_consumed: 0,
        }
    }

    fn fill(&mut self) -> Result<bool, JsonProcessingError> {
        if self.eof {
            return Ok(false);
        }
        // Reclaim space for already-consumed bytes before growing.
        if self.pos > 0 {
            self.buf.drain(..self.pos);
            self.total_consumed += self.pos;
            self.pos = 0;
        }
        let start = self.buf.len();
        self.buf.resize(start + DEFAULT_CHUNK, 0);
        let n = self.reader.read(&mut self.buf[start..])?;
        self.buf.truncate(start + n);
        if n == 0 {
            self.eof = true;
        }
        Ok(n > 0)
    }

    fn next_byte(&mut self) -> Result<Option<u8>, JsonProcessingError> {
        loop {
            if let Some(&b) = self.buf.get(self.pos) {
                self.pos += 1;
                return Ok(Some(b));
            }
            if !self.fill()? {
                return Ok(None);
            }
        }
    }
}

impl<R: std::io::Read> Input for ReaderInput<R> {
    fn peek(&mut self) -> Result<Option<u32>, JsonProcessingError> {
        loop {
            if let Some(&first) = self.buf.get(self.pos) {
                let saved = self.pos;
                self.pos += 1;
                let cp = decode_utf8(first, || self.next_byte());
                self.pos = saved;
                return cp.map(Some);
            }
            if !self.fill()? {
                return Ok(None);
            }
        }
    }

    fn read_ascii(&mut self) -> Result<u8, JsonProcessingError> {
        match self.next_byte()? {
            Some(b) if b < 0x80 => Ok(b),
            Some(b) => Err(non_ascii(b)),
            None => Err(FormatError {
                kind: FormatErrorKind::UnexpectedEof,
                position: String::new(),
            }
            .into()),
        }
    }

    fn read_codepoint(&mut self) -> Result<Option<u32>, JsonProcessingError> {
        let Some(first) = self.next_byte()? else {
            return Ok(None);
        };
        decode_utf8(first, || self.next_byte()).map(Some)
    }

    fn byte_offset(&self) -> usize {
        self.total_consumed + self.pos
    }
}

/// Adapter over a caller-supplied codepoint iterator (e.g. `str::chars`).
pub struct CodepointInput<I> {
    iter: I,
    peeked: Option<char>,
    consumed: usize,
}

impl<I: Iterator<Item = char>> CodepointInput<I> {
    pub fn new(iter: I) -> Self {
        CodepointInput {
            iter,
            peeked: None,
            consumed: 0,
        }
    }
}

impl<I: Iterator<Item = char>> Input for CodepointInput<I> {
    fn peek(&mut self) -> Result<Option<u32>, JsonProcessingError> {
        if self.peeked.is_none() {
            self.peeked = self.iter.next();
        }
        Ok(self.peeked.map(|c| c as u32))
    }

    fn read_ascii(&mut self) -> Result<u8, JsonProcessingError> {
        let c = self
            .peeked
            .take()
            .or_else(|| self.iter.next())
            .ok_or_else(|| {
                JsonProcessingError::from(FormatError {
                    kind: FormatErrorKind::UnexpectedEof,
                    position: String::new(),
                })
            })?;
        self.consumed += 1;
        if c as u32 > 0x7F {
            return Err(non_ascii(c as u32 as u8));
        }
        Ok(c as u8)
    }

    fn read_codepoint(&mut self) -> Result<Option<u32>, JsonProcessingError> {
        let c = self.peeked.take().or_else(|| self.iter.next());
        if c.is_some() {
            self.consumed += 1;
        }
        Ok(c.map(|c| c as u32))
    }

    fn byte_offset(&self) -> usize {
        self.consumed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_input_reads_ascii_and_codepoints() {
        let mut input = SliceInput::from_str("a\u{1D11E}b");
        assert_eq!(input.read_codepoint().unwrap(), Some('a' as u32));
        assert_eq!(input.read_codepoint().unwrap(), Some(0x1D11E));
        assert_eq!(input.read_codepoint().unwrap(), Some('b' as u32));
        assert_eq!(input.read_codepoint().unwrap(), None);
    }

    #[test]
    fn slice_input_skips_bom() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"{}");
        let mut input = SliceInput::new(&bytes);
        assert_eq!(input.read_ascii().unwrap(), b'{');
        assert_eq!(input.read_ascii().unwrap(), b'}');
    }

    #[test]
    fn reader_input_matches_slice_input() {
        let data = b"{\"a\":1}".to_vec();
        let mut from_reader = ReaderInput::new(std::io::Cursor::new(data.clone()));
        let mut from_slice = SliceInput::new(&data);

        loop {
            let a = from_reader.read_codepoint().unwrap();
            let b = from_slice.read_codepoint().unwrap();
            assert_eq!(a, b);
            if a.is_none() {
                break;
            }
        }
    }

    #[test]
    fn rejects_non_ascii_in_read_ascii() {
        let mut input = SliceInput::from_str("é");
        assert!(input.read_ascii().is_err());
    }
}
