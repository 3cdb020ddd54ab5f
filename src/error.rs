/*!
Error taxonomy for the streaming reader.

Four kinds, all derived from a common [`JsonProcessingError`]. The engine
never recovers internally: every error propagates to the user call that
triggered the advance, and carries the rendered position string produced by
[`crate::position`] from the frame stack at the time of failure.
*/

use thiserror::Error;

/// Top-level error returned by every fallible operation in this crate.
#[derive(Debug, Error)]
pub enum JsonProcessingError {
    /// Malformed JSON: unexpected codepoint, invalid escape, invalid number,
    /// premature EOF, invalid UTF-8, invalid `\u` hex.
    #[error("{0}")]
    Format(#[from] FormatError),

    /// Valid JSON, but mismatched with the declared schema: out-of-order
    /// access, re-access of a consumed continuation, a proxy called out of
    /// turn.
    #[error("{0}")]
    Schema(#[from] SchemaError),

    /// An occurrence bound (`min_occur`/`max_occur`) was violated.
    #[error("{0}")]
    Constraint(#[from] ConstraintError),

    /// A generic value could not be converted to the requested target type.
    #[error("{0}")]
    Mapping(#[from] MappingError),
}

impl JsonProcessingError {
    /// Overwrites the carried position string. Tokenizer-level errors are
    /// constructed without knowledge of the active frame stack (the
    /// tokenizer doesn't see it), so the engine stamps the real `$`-rooted
    /// path on the way out.
    pub fn with_position(self, position: impl Into<String>) -> Self {
        let position = position.into();
        match self {
            JsonProcessingError::Format(mut e) => {
                e.position = position;
                JsonProcessingError::Format(e)
            }
            JsonProcessingError::Schema(mut e) => {
                e.position = position;
                JsonProcessingError::Schema(e)
            }
            JsonProcessingError::Constraint(mut e) => {
                e.position = position;
                JsonProcessingError::Constraint(e)
            }
            JsonProcessingError::Mapping(mut e) => {
                e.position = position;
                JsonProcessingError::Mapping(e)
            }
        }
    }
}

impl From<std::io::Error> for JsonProcessingError {
    fn from(err: std::io::Error) -> Self {
        JsonProcessingError::Format(FormatError {
            kind: FormatErrorKind::Io(err.to_string()),
            position: String::new(),
        })
    }
}

/// Malformed JSON.
#[derive(Debug, Error)]
#[error("format error at {position}: {kind}")]
pub struct FormatError {
    pub kind: FormatErrorKind,
    pub position: String,
}

#[derive(Debug, Error)]
pub enum FormatErrorKind {
    #[error("unexpected codepoint {found:?} (expected {expected})")]
    UnexpectedCodepoint {
        found: Option<u32>,
        expected: &'static str,
    },
    #[error("invalid escape '\\{0}'")]
    InvalidEscape(char),
    #[error("invalid \\u escape")]
    InvalidUnicodeEscape,
    #[error("invalid number literal")]
    InvalidNumber,
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("invalid UTF-8 sequence")]
    InvalidUtf8,
    #[error("non-ASCII byte 0x{0:02x} outside a string")]
    NonAsciiByte(u8),
    #[error("I/O error: {0}")]
    Io(String),
}

/// JSON is well-formed but disagrees with the declared schema.
#[derive(Debug, Error)]
#[error("schema error at {position}: {kind}")]
pub struct SchemaError {
    pub kind: SchemaErrorKind,
    pub position: String,
}

#[derive(Debug, Error)]
pub enum SchemaErrorKind {
    /// A proxy was called while it wasn't the top of the frame stack, or a
    /// second suspending member was entered while an earlier one was still
    /// unfinished.
    #[error("parent proxy called out of order: {0}")]
    ProxyMisuse(String),

    /// The same continuation (or non-suspending member) was accessed twice.
    #[error("{0}: already accessed before")]
    AlreadyAccessed(String),

    /// A member was accessed after the tokenizer had already scanned past
    /// its position in the input.
    #[error("{member}: expected after {scanned_past:?}")]
    ExpectedAfter {
        member: String,
        scanned_past: Vec<String>,
    },
}

/// An occurrence bound was violated.
#[derive(Debug, Error)]
#[error("constraint error at {position}: {kind}")]
pub struct ConstraintError {
    pub kind: ConstraintErrorKind,
    pub position: String,
}

#[derive(Debug, Error)]
pub enum ConstraintErrorKind {
    #[error("member '{member}' requires at least {min} occurrence(s), found {actual}")]
    MinOccur {
        member: String,
        min: usize,
        actual: usize,
    },
    #[error("member '{member}' permits at most {max} occurrence(s)")]
    MaxOccur { member: String, max: usize },
    #[error("maximum nesting depth {max_depth} exceeded")]
    MaxDepth { max_depth: usize },
    #[error("member '{member}' exceeds max_length of {max_length}")]
    MaxLength { member: String, max_length: usize },
    #[error("member '{member}' exceeds max_size of {max_size}")]
    MaxSize { member: String, max_size: usize },
    #[error("member '{member}' has JSON type '{found}', expected one of {accepted:?}")]
    UnacceptedJsonType {
        member: String,
        found: &'static str,
        accepted: Vec<&'static str>,
    },
}

/// A generic value couldn't be converted to the requested target type.
#[derive(Debug, Error)]
#[error(
    "mapping error at {position}: cannot map {source_value} to target type `{target_type}`"
)]
pub struct MappingError {
    pub position: String,
    pub source_value: String,
    pub target_type: &'static str,
}
