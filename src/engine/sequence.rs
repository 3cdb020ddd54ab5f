/*!
Lazy sequences: the suspending side of a member.

A [`MappedArrayStream`] (or [`MappedObjectStream`]) hands the caller a pull
iterator over one JSON array (or object-as-map) instead of materializing it.
Each holds the engine by mutable borrow for its lifetime, so the engine
can't be driven again until the sequence is dropped or exhausted — the
borrow checker is what enforces the single-suspension-at-a-time invariant.

If a sequence is dropped before it reaches its end, its enclosing frame is
poisoned (see [`super::frame::PoisonFlag`]): the tokenizer position is left
indeterminate partway through an element, so rather than guess, further
reads anywhere at or above that frame fail.
*/

use std::marker::PhantomData;
use std::sync::Arc;

use crate::engine::frame::{FrameKind, PoisonFlag};
use crate::engine::Engine;
use crate::error::{ConstraintError, ConstraintErrorKind, FormatError, FormatErrorKind, JsonProcessingError};
use crate::input::Input;
use crate::mapper::ValueMapper;
use crate::schema::{Constraints, Readable, TypeSchema};
use crate::tokenizer::NodeOutcome;
use crate::value::Value;

#[derive(Clone, Copy)]
enum SeqState {
    NotStarted,
    /// Holds the next significant codepoint after the previous item, not
    /// yet consumed (a `,` or a closing bracket).
    Pending(Option<u32>),
    Done,
}

/// A lazy sequence of simple (non-proxied) values read from a JSON array.
pub struct MappedArrayStream<'e, I: Input, T: ValueMapper> {
    engine: &'e mut Engine<I>,
    parent_poison: PoisonFlag,
    member_name: String,
    constraints: Constraints,
    state: SeqState,
    item_no: usize,
    reported_end: bool,
    clean_end: bool,
    _marker: PhantomData<T>,
}

impl<'e, I: Input, T: ValueMapper> MappedArrayStream<'e, I, T> {
    pub(crate) fn open(
        engine: &'e mut Engine<I>,
        parent_poison: PoisonFlag,
        member_name: String,
        constraints: Constraints,
    ) -> Result<Self, JsonProcessingError> {
        let path = engine.path();
        engine
            .tokenizer_mut()
            .read_char_skip_whitespace(Some(b'['))
            .map_err(|e| e.with_position(path))?;
        Ok(MappedArrayStream {
            engine,
            parent_poison,
            member_name,
            constraints,
            state: SeqState::NotStarted,
            item_no: 0,
            reported_end: false,
            clean_end: false,
            _marker: PhantomData,
        })
    }

    fn eof_err(&self) -> JsonProcessingError {
        FormatError {
            kind: FormatErrorKind::UnexpectedEof,
            position: self.engine.path(),
        }
        .into()
    }

    fn max_occur_err(&self) -> JsonProcessingError {
        log::warn!(target: "squirrel_stream::engine", "member '{}' permits at most {} occurrence(s), raising a constraint error", self.member_name, self.constraints.max_occur);
        ConstraintError {
            kind: ConstraintErrorKind::MaxOccur {
                member: self.member_name.clone(),
                max: self.constraints.max_occur,
            },
            position: self.engine.path(),
        }
        .into()
    }

    fn min_occur_err(&self) -> JsonProcessingError {
        log::warn!(target: "squirrel_stream::engine", "member '{}' requires at least {} occurrence(s), found {}, raising a constraint error", self.member_name, self.constraints.min_occur, self.item_no);
        ConstraintError {
            kind: ConstraintErrorKind::MinOccur {
                member: self.member_name.clone(),
                min: self.constraints.min_occur,
                actual: self.item_no,
            },
            position: self.engine.path(),
        }
        .into()
    }

    fn step(&mut self) -> Result<Option<Value>, JsonProcessingError> {
        self.step_inner().map_err(|e| e.with_position(self.engine.path()))
    }

    fn max_length(&self) -> Option<usize> {
        (self.constraints.max_length != usize::MAX).then_some(self.constraints.max_length)
    }

    fn step_inner(&mut self) -> Result<Option<Value>, JsonProcessingError> {
        let max_length = self.max_length();
        let (outcome, after) = match self.state {
            SeqState::NotStarted => self.engine.tokenizer_mut().read_node_detect(true, max_length)?,
            SeqState::Pending(after) => {
                let sep = after.ok_or_else(|| self.eof_err())?;
                match sep as u8 {
                    b',' => {
                        self.engine.tokenizer_mut().read_char_skip_whitespace(Some(b','))?;
                        self.engine.tokenizer_mut().read_node_detect(false, max_length)?
                    }
                    b']' => {
                        self.engine.tokenizer_mut().read_char_skip_whitespace(Some(b']'))?;
                        (NodeOutcome::ClosedBracket, None)
                    }
                    _ => {
                        return Err(FormatError {
                            kind: FormatErrorKind::UnexpectedCodepoint {
                                found: Some(sep),
                                expected: "',' or ']'",
                            },
                            position: self.engine.path(),
                        }
                        .into())
                    }
                }
            }
            SeqState::Done => return Ok(None),
        };

        match outcome {
            NodeOutcome::ClosedBracket => {
                self.state = SeqState::Done;
                self.clean_end = true;
                Ok(None)
            }
            NodeOutcome::Value(v) => {
                self.item_no += 1;
                if self.item_no > self.constraints.max_occur {
                    self.state = SeqState::Done;
                    return Err(self.max_occur_err());
                }
                self.state = SeqState::Pending(after);
                Ok(Some(v))
            }
        }
    }
}

impl<'e, I: Input, T: ValueMapper> Iterator for MappedArrayStream<'e, I, T> {
    type Item = Result<T, JsonProcessingError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.reported_end {
            return None;
        }
        match self.step() {
            Ok(Some(v)) => Some(T::map_value(&v).map_err(JsonProcessingError::from)),
            Ok(None) => {
                self.reported_end = true;
                if self.item_no < self.constraints.min_occur {
                    Some(Err(self.min_occur_err()))
                } else {
                    None
                }
            }
            Err(e) => {
                self.reported_end = true;
                Some(Err(e))
            }
        }
    }
}

impl<'e, I: Input, T: ValueMapper> Drop for MappedArrayStream<'e, I, T> {
    fn drop(&mut self) {
        if !self.clean_end {
            self.parent_poison.poison();
        }
    }
}

/// A lazy sequence of `(key, value)` pairs read from a JSON object treated
/// as a map, per §4.5.3's object-as-map continuation.
pub struct MappedObjectStream<'e, I: Input, T: ValueMapper> {
    engine: &'e mut Engine<I>,
    parent_poison: PoisonFlag,
    member_name: String,
    constraints: Constraints,
    state: SeqState,
    item_no: usize,
    reported_end: bool,
    clean_end: bool,
    _marker: PhantomData<T>,
}

impl<'e, I: Input, T: ValueMapper> MappedObjectStream<'e, I, T> {
    pub(crate) fn open(
        engine: &'e mut Engine<I>,
        parent_poison: PoisonFlag,
        member_name: String,
        constraints: Constraints,
    ) -> Result<Self, JsonProcessingError> {
        let path = engine.path();
        engine
            .tokenizer_mut()
            .read_char_skip_whitespace(Some(b'{'))
            .map_err(|e| e.with_position(path))?;
        Ok(MappedObjectStream {
            engine,
            parent_poison,
            member_name,
            constraints,
            state: SeqState::NotStarted,
            item_no: 0,
            reported_end: false,
            clean_end: false,
            _marker: PhantomData,
        })
    }

    fn eof_err(&self) -> JsonProcessingError {
        FormatError {
            kind: FormatErrorKind::UnexpectedEof,
            position: self.engine.path(),
        }
        .into()
    }

    fn step(&mut self) -> Result<Option<(String, Value)>, JsonProcessingError> {
        self.step_inner().map_err(|e| e.with_position(self.engine.path()))
    }

    fn step_inner(&mut self) -> Result<Option<(String, Value)>, JsonProcessingError> {
        let next = match self.state {
            SeqState::NotStarted => self.engine.tokenizer_mut().read_char_skip_whitespace(None)?,
            SeqState::Pending(after) => {
                let sep = after.ok_or_else(|| self.eof_err())?;
                match sep as u8 {
                    b',' => {
                        self.engine.tokenizer_mut().read_char_skip_whitespace(Some(b','))?;
                        self.engine.tokenizer_mut().read_char_skip_whitespace(None)?
                    }
                    b'}' => {
                        self.engine.tokenizer_mut().read_char_skip_whitespace(Some(b'}'))?;
                        self.state = SeqState::Done;
                        self.clean_end = true;
                        return Ok(None);
                    }
                    _ => {
                        return Err(FormatError {
                            kind: FormatErrorKind::UnexpectedCodepoint {
                                found: Some(sep),
                                expected: "',' or '}'",
                            },
                            position: self.engine.path(),
                        }
                        .into())
                    }
                }
            }
            SeqState::Done => return Ok(None),
        };

        if next as u8 == b'}' {
            self.state = SeqState::Done;
            self.clean_end = true;
            return Ok(None);
        }
        if next as u8 != b'"' {
            return Err(FormatError {
                kind: FormatErrorKind::UnexpectedCodepoint {
                    found: Some(next),
                    expected: "a string key",
                },
                position: self.engine.path(),
            }
            .into());
        }

        let key = self.engine.tokenizer_mut().read_string(None)?;
        self.engine.tokenizer_mut().read_char_skip_whitespace(Some(b':'))?;
        let max_length = (self.constraints.max_length != usize::MAX).then_some(self.constraints.max_length);
        let (outcome, after) = self.engine.tokenizer_mut().read_node_detect(false, max_length)?;
        let NodeOutcome::Value(value) = outcome else {
            unreachable!("allow_close_bracket was false");
        };

        self.item_no += 1;
        if self.item_no > self.constraints.max_occur {
            log::warn!(target: "squirrel_stream::engine", "member '{}' permits at most {} occurrence(s), raising a constraint error", self.member_name, self.constraints.max_occur);
            return Err(ConstraintError {
                kind: ConstraintErrorKind::MaxOccur {
                    member: self.member_name.clone(),
                    max: self.constraints.max_occur,
                },
                position: self.engine.path(),
            }
            .into());
        }
        self.state = SeqState::Pending(after);
        Ok(Some((key, value)))
    }
}

impl<'e, I: Input, T: ValueMapper> Iterator for MappedObjectStream<'e, I, T> {
    type Item = Result<(String, T), JsonProcessingError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.reported_end {
            return None;
        }
        match self.step() {
            Ok(Some((k, v))) => Some(T::map_value(&v).map_err(JsonProcessingError::from).map(|v| (k, v))),
            Ok(None) => {
                self.reported_end = true;
                if self.item_no < self.constraints.min_occur {
                    log::warn!(target: "squirrel_stream::engine", "member '{}' requires at least {} occurrence(s), found {}, raising a constraint error", self.member_name, self.constraints.min_occur, self.item_no);
                    Some(Err(ConstraintError {
                        kind: ConstraintErrorKind::MinOccur {
                            member: self.member_name.clone(),
                            min: self.constraints.min_occur,
                            actual: self.item_no,
                        },
                        position: self.engine.path(),
                    }
                    .into()))
                } else {
                    None
                }
            }
            Err(e) => {
                self.reported_end = true;
                Some(Err(e))
            }
        }
    }
}

impl<'e, I: Input, T: ValueMapper> Drop for MappedObjectStream<'e, I, T> {
    fn drop(&mut self) {
        if !self.clean_end {
            self.parent_poison.poison();
        }
    }
}

/// A lazy sequence of proxied (nested-schema) objects read from a JSON
/// array (`ProxyStream`/`ProxyIterator`/`ProxyConsumer`).
///
/// Unlike [`MappedArrayStream`], each item is itself a frame the caller
/// must drive with [`Engine::next_member`]/`consume_*` and close with
/// [`ProxyArrayStream::finish_item`] before requesting the next one.
pub struct ProxyArrayStream<'e, I: Input> {
    engine: &'e mut Engine<I>,
    parent_poison: PoisonFlag,
    member_name: String,
    constraints: Constraints,
    schema: Arc<TypeSchema>,
    state: SeqState,
    item_no: usize,
    reported_end: bool,
    clean_end: bool,
    item_open: bool,
}

impl<'e, I: Input> ProxyArrayStream<'e, I> {
    pub(crate) fn open(
        engine: &'e mut Engine<I>,
        parent_poison: PoisonFlag,
        member_name: String,
        constraints: Constraints,
        schema: Arc<TypeSchema>,
    ) -> Result<Self, JsonProcessingError> {
        let path = engine.path();
        engine
            .tokenizer_mut()
            .read_char_skip_whitespace(Some(b'['))
            .map_err(|e| e.with_position(path))?;
        Ok(ProxyArrayStream {
            engine,
            parent_poison,
            member_name,
            constraints,
            schema,
            state: SeqState::NotStarted,
            item_no: 0,
            reported_end: false,
            clean_end: false,
            item_open: false,
        })
    }

    fn eof_err(&self) -> JsonProcessingError {
        FormatError {
            kind: FormatErrorKind::UnexpectedEof,
            position: self.engine.path(),
        }
        .into()
    }

    fn misuse_err(&self, message: &str) -> JsonProcessingError {
        crate::error::SchemaError {
            kind: crate::error::SchemaErrorKind::ProxyMisuse(message.to_string()),
            position: self.engine.path(),
        }
        .into()
    }

    /// `Ok(true)` if another item follows (its opening `{` has been
    /// consumed and a frame pushed), `Ok(false)` at the end of the array.
    fn advance(&mut self) -> Result<bool, JsonProcessingError> {
        self.advance_inner().map_err(|e| e.with_position(self.engine.path()))
    }

    fn advance_inner(&mut self) -> Result<bool, JsonProcessingError> {
        match self.state {
            SeqState::NotStarted => {
                let next = self.engine.tokenizer_mut().peek_significant()?;
                if next.map(|c| c as u8) == Some(b']') {
                    self.engine.tokenizer_mut().read_char_skip_whitespace(Some(b']'))?;
                    self.state = SeqState::Done;
                    self.clean_end = true;
                    Ok(false)
                } else {
                    Ok(true)
                }
            }
            SeqState::Pending(after) => {
                let sep = after.ok_or_else(|| self.eof_err())?;
                match sep as u8 {
                    b',' => {
                        self.engine.tokenizer_mut().read_char_skip_whitespace(Some(b','))?;
                        Ok(true)
                    }
                    b']' => {
                        self.engine.tokenizer_mut().read_char_skip_whitespace(Some(b']'))?;
                        self.state = SeqState::Done;
                        self.clean_end = true;
                        Ok(false)
                    }
                    _ => Err(FormatError {
                        kind: FormatErrorKind::UnexpectedCodepoint {
                            found: Some(sep),
                            expected: "',' or ']'",
                        },
                        position: self.engine.path(),
                    }
                    .into()),
                }
            }
            SeqState::Done => Ok(false),
        }
    }

    /// Advances to the next item, if any. Returns `Ok(Some(()))` once its
    /// frame is pushed and ready to be read with `next_member`; the caller
    /// must then call [`ProxyArrayStream::finish_item`] before calling
    /// `next_item` again.
    pub fn next_item(&mut self) -> Result<Option<()>, JsonProcessingError> {
        if self.item_open {
            return Err(self.misuse_err("the previous item must be finished before requesting the next one"));
        }
        if self.reported_end {
            return Ok(None);
        }

        match self.advance() {
            Ok(true) => {
                self.item_no += 1;
                if self.item_no > self.constraints.max_occur {
                    log::warn!(target: "squirrel_stream::engine", "member '{}' permits at most {} occurrence(s), raising a constraint error", self.member_name, self.constraints.max_occur);
                    self.reported_end = true;
                    return Err(ConstraintError {
                        kind: ConstraintErrorKind::MaxOccur {
                            member: self.member_name.clone(),
                            max: self.constraints.max_occur,
                        },
                        position: self.engine.path(),
                    }
                    .into());
                }
                self.engine
                    .tokenizer_mut()
                    .read_char_skip_whitespace(Some(b'{'))
                    .map_err(|e| e.with_position(self.engine.path()))?;
                let member_max_depth = (self.constraints.max_depth != crate::schema::Constraints::default().max_depth)
                    .then_some(self.constraints.max_depth);
                self.engine.push_frame(
                    FrameKind::Index(self.item_no - 1),
                    Some(self.schema.clone()),
                    member_max_depth,
                )?;
                self.item_open = true;
                Ok(Some(()))
            }
            Ok(false) => {
                self.reported_end = true;
                if self.item_no < self.constraints.min_occur {
                    log::warn!(target: "squirrel_stream::engine", "member '{}' requires at least {} occurrence(s), found {}, raising a constraint error", self.member_name, self.constraints.min_occur, self.item_no);
                    Err(ConstraintError {
                        kind: ConstraintErrorKind::MinOccur {
                            member: self.member_name.clone(),
                            min: self.constraints.min_occur,
                            actual: self.item_no,
                        },
                        position: self.engine.path(),
                    }
                    .into())
                } else {
                    Ok(None)
                }
            }
            Err(e) => {
                self.reported_end = true;
                Err(e)
            }
        }
    }

    /// Drains any unread members of the current item, checks its schema's
    /// `min_occur` constraints, and pops its frame, leaving the stream
    /// ready for the next [`ProxyArrayStream::next_item`] call.
    pub fn finish_item(&mut self) -> Result<(), JsonProcessingError> {
        if !self.item_open {
            return Err(self.misuse_err("no item is currently open"));
        }
        self.engine.finish_proxy()?;
        self.item_open = false;
        let after = self
            .engine
            .tokenizer_mut()
            .peek_significant()
            .map_err(|e| e.with_position(self.engine.path()))?;
        self.state = SeqState::Pending(after);
        Ok(())
    }

    pub fn engine_mut(&mut self) -> &mut Engine<I> {
        self.engine
    }
}

impl<'e, I: Input> Drop for ProxyArrayStream<'e, I> {
    fn drop(&mut self) {
        if !self.clean_end || self.item_open {
            self.parent_poison.poison();
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
enum RootSequenceMode {
    /// Top-level `[...]`: each element is a proxied object.
    Array,
    /// Top-level `{...}`: each member's own key becomes the item's entry
    /// key (see [`Engine::cache_entry_key`]) and its value is the proxied
    /// object.
    ObjectAsMap,
}

/// A lazy sequence of proxied objects rooted at the document itself, rather
/// than at a member of an enclosing schema. Returned by [`crate::of`] and
/// its variants, for a top-level JSON array or a top-level JSON object
/// treated as a map.
///
/// Drives the same way as [`ProxyArrayStream`] — [`RootSequence::next_item`]
/// pushes the item's frame, the caller reads its members with
/// [`RootSequence::next_member`]/`consume_*`, then
/// [`RootSequence::finish_item`] closes it before the next one. There's no
/// enclosing frame to poison if an item is abandoned mid-read, since a
/// `RootSequence` owns its `Engine` outright; a dropped item simply leaves
/// the engine (and the sequence) unusable for anything further.
pub struct RootSequence<I: Input, P: Readable> {
    engine: Engine<I>,
    schema: Arc<TypeSchema>,
    mode: RootSequenceMode,
    state: SeqState,
    item_no: usize,
    reported_end: bool,
    item_open: bool,
    _marker: PhantomData<P>,
}

impl<I: Input, P: Readable> RootSequence<I, P> {
    pub(crate) fn open(mut engine: Engine<I>) -> Result<Self, JsonProcessingError> {
        let schema = P::schema();
        let opener = engine
            .tokenizer_mut()
            .read_char_skip_whitespace(None)
            .map_err(|e| e.with_position(engine.path()))?;
        let mode = match opener as u8 {
            b'[' => RootSequenceMode::Array,
            b'{' => RootSequenceMode::ObjectAsMap,
            _ => {
                return Err(FormatError {
                    kind: FormatErrorKind::UnexpectedCodepoint {
                        found: Some(opener),
                        expected: "'[' or '{' at the document root",
                    },
                    position: engine.path(),
                }
                .into())
            }
        };
        Ok(RootSequence {
            engine,
            schema,
            mode,
            state: SeqState::NotStarted,
            item_no: 0,
            reported_end: false,
            item_open: false,
            _marker: PhantomData,
        })
    }

    fn eof_err(&self) -> JsonProcessingError {
        FormatError {
            kind: FormatErrorKind::UnexpectedEof,
            position: self.engine.path(),
        }
        .into()
    }

    fn misuse_err(&self, message: &str) -> JsonProcessingError {
        crate::error::SchemaError {
            kind: crate::error::SchemaErrorKind::ProxyMisuse(message.to_string()),
            position: self.engine.path(),
        }
        .into()
    }

    fn closer(&self) -> u8 {
        match self.mode {
            RootSequenceMode::Array => b']',
            RootSequenceMode::ObjectAsMap => b'}',
        }
    }

    fn advance(&mut self) -> Result<bool, JsonProcessingError> {
        self.advance_inner().map_err(|e| e.with_position(self.engine.path()))
    }

    fn advance_inner(&mut self) -> Result<bool, JsonProcessingError> {
        let closer = self.closer();
        match self.state {
            SeqState::NotStarted => {
                let next = self.engine.tokenizer_mut().peek_significant()?;
                if next.map(|c| c as u8) == Some(closer) {
                    self.engine.tokenizer_mut().read_char_skip_whitespace(Some(closer))?;
                    self.state = SeqState::Done;
                    Ok(false)
                } else {
                    Ok(true)
                }
            }
            SeqState::Pending(after) => {
                let sep = after.ok_or_else(|| self.eof_err())?;
                if sep as u8 == b',' {
                    self.engine.tokenizer_mut().read_char_skip_whitespace(Some(b','))?;
                    Ok(true)
                } else if sep as u8 == closer {
                    self.engine.tokenizer_mut().read_char_skip_whitespace(Some(closer))?;
                    self.state = SeqState::Done;
                    Ok(false)
                } else {
                    Err(FormatError {
                        kind: FormatErrorKind::UnexpectedCodepoint {
                            found: Some(sep),
                            expected: "',' or the closing bracket",
                        },
                        position: self.engine.path(),
                    }
                    .into())
                }
            }
            SeqState::Done => Ok(false),
        }
    }

    /// Advances to the next item, if any, pushing its frame and (for
    /// object-as-map mode) caching its entry key. The caller must then call
    /// [`RootSequence::finish_item`] before requesting the next one.
    pub fn next_item(&mut self) -> Result<Option<()>, JsonProcessingError> {
        if self.item_open {
            return Err(self.misuse_err("the previous item must be finished before requesting the next one"));
        }
        if self.reported_end {
            return Ok(None);
        }
        match self.advance() {
            Ok(true) => {
                self.item_no += 1;
                self.open_item().map_err(|e| e.with_position(self.engine.path()))?;
                self.item_open = true;
                Ok(Some(()))
            }
            Ok(false) => {
                self.reported_end = true;
                Ok(None)
            }
            Err(e) => {
                self.reported_end = true;
                Err(e)
            }
        }
    }

    fn open_item(&mut self) -> Result<(), JsonProcessingError> {
        match self.mode {
            RootSequenceMode::Array => {
                self.engine.tokenizer_mut().read_char_skip_whitespace(Some(b'{'))?;
                self.engine
                    .push_frame(FrameKind::Index(self.item_no - 1), Some(self.schema.clone()), None)?;
            }
            RootSequenceMode::ObjectAsMap => {
                let next = self.engine.tokenizer_mut().read_char_skip_whitespace(None)?;
                if next as u8 != b'"' {
                    return Err(FormatError {
                        kind: FormatErrorKind::UnexpectedCodepoint {
                            found: Some(next),
                            expected: "a string key",
                        },
                        position: self.engine.path(),
                    }
                    .into());
                }
                let key = self.engine.tokenizer_mut().read_string(None)?;
                self.engine.tokenizer_mut().read_char_skip_whitespace(Some(b':'))?;
                self.engine.tokenizer_mut().read_char_skip_whitespace(Some(b'{'))?;
                self.engine
                    .push_frame(FrameKind::Member(key.clone()), Some(self.schema.clone()), None)?;
                if let Some(key_member) = self.schema.key_member() {
                    self.engine.cache_entry_key(&key_member.json_name, Value::String(key));
                }
            }
        }
        Ok(())
    }

    /// Drains any unread members of the current item, checks its schema's
    /// `min_occur` constraints, and pops its frame.
    pub fn finish_item(&mut self) -> Result<(), JsonProcessingError> {
        if !self.item_open {
            return Err(self.misuse_err("no item is currently open"));
        }
        self.engine.finish_proxy()?;
        self.item_open = false;
        let after = self
            .engine
            .tokenizer_mut()
            .peek_significant()
            .map_err(|e| e.with_position(self.engine.path()))?;
        self.state = SeqState::Pending(after);
        Ok(())
    }

    /// Scans the current item's next member, same as
    /// [`crate::RootReader::next_member`].
    pub fn next_member(&mut self) -> Result<Option<crate::engine::PendingMember>, JsonProcessingError> {
        self.engine.next_member()
    }

    /// The current position, rendered as a `$`-rooted path.
    pub fn position(&self) -> String {
        self.engine.path()
    }

    /// Reads the pending member's value eagerly (`MappedValue`).
    pub fn consume_value<T: ValueMapper>(&mut self) -> Result<T, JsonProcessingError> {
        self.engine.consume_value()
    }

    /// Like [`RootSequence::consume_value`], honoring a constructor-supplied
    /// default for a null value.
    pub fn consume_value_or_default<T: ValueMapper>(
        &mut self,
        default: impl FnOnce() -> T,
    ) -> Result<T, JsonProcessingError> {
        self.engine.consume_value_or_default(default)
    }

    /// Reads the pending member's value as a generic [`Value`].
    pub fn consume_raw(&mut self) -> Result<Value, JsonProcessingError> {
        self.engine.consume_raw()
    }

    /// Discards the pending member's value.
    pub fn skip_value(&mut self) -> Result<(), JsonProcessingError> {
        self.engine.skip_value()
    }

    /// Reads back the current item's entry key (object-as-map mode only),
    /// same as calling [`Engine::consume_entry_key`] directly.
    pub fn consume_entry_key<T: ValueMapper>(&mut self) -> Result<T, JsonProcessingError> {
        self.engine.consume_entry_key()
    }

    /// Suspends over a lazy array of simple values nested inside the
    /// current item.
    pub fn consume_stream<T: ValueMapper>(
        &mut self,
    ) -> Result<MappedArrayStream<'_, I, T>, JsonProcessingError> {
        self.engine.consume_stream()
    }

    /// Suspends over a map stream nested inside the current item.
    pub fn consume_map_stream<T: ValueMapper>(
        &mut self,
    ) -> Result<MappedObjectStream<'_, I, T>, JsonProcessingError> {
        self.engine.consume_map_stream()
    }

    /// Enters a nested proxied object inside the current item.
    pub fn consume_proxy<Q: Readable>(&mut self) -> Result<(), JsonProcessingError> {
        self.engine.consume_proxy::<Q>()
    }

    /// Closes a nested proxied object entered with
    /// [`RootSequence::consume_proxy`].
    pub fn finish_proxy(&mut self) -> Result<(), JsonProcessingError> {
        self.engine.finish_proxy()
    }

    /// Suspends over a lazy array of proxied objects nested inside the
    /// current item.
    pub fn consume_proxy_stream<Q: Readable>(
        &mut self,
    ) -> Result<ProxyArrayStream<'_, I>, JsonProcessingError> {
        self.engine.consume_proxy_stream::<Q>()
    }
}
