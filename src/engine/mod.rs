/*!
The streaming engine: the coroutine-like driver that advances the tokenizer
one member at a time, suspending at any member whose processing type calls
for it and resuming only once the caller has consumed (or explicitly
skipped) that member's value.

There's no real coroutine here — per the design notes, this is modeled as
an explicit [`frame::FrameStack`] tracking, per open JSON object, "what
member is the schema expecting next, and has its value been read yet".
Suspension is just a Rust borrow: a [`sequence::MappedArrayStream`] (or its
siblings) holds `&mut Engine` for as long as the caller is iterating it, so
the engine literally cannot be driven again until that borrow ends.
*/

pub mod frame;
pub mod sequence;

use std::sync::Arc;

use crate::error::{
    ConstraintError, ConstraintErrorKind, FormatError, FormatErrorKind, JsonProcessingError,
    SchemaError, SchemaErrorKind,
};
use crate::input::Input;
use crate::mapper::ValueMapper;
use crate::schema::{Readable, TypeSchema};
use crate::tokenizer::{NodeOutcome, Tokenizer};
use crate::value::Value;

pub use frame::PendingMember;
use frame::{FrameKind, FrameStack};
use sequence::{MappedArrayStream, MappedObjectStream, ProxyArrayStream};

/// Tunables for one parse. See [`crate::SPEC_FULL`] for the rationale
/// behind each default.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Initial capacity reserved for the buffered reader adapter.
    pub initial_buffer_size: usize,
    /// Nesting depth ceiling applied when a member doesn't declare its own
    /// `max_depth`.
    pub max_depth_default: usize,
    /// When `true`, a member name with no match in the active schema is a
    /// `SchemaError` instead of being silently captured as a raw value.
    pub strict_unknown_members: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        ReaderConfig {
            initial_buffer_size: 64 * 1024,
            max_depth_default: 64,
            strict_unknown_members: false,
        }
    }
}

/// The result of [`Engine::request_member`].
#[derive(Debug)]
pub enum MemberRequestOutcome {
    /// The member is now the frame's pending value; consume it with the
    /// matching `consume_*` method.
    Ready,
    /// The member was already read ahead (and cached) while scanning for a
    /// different name; here's its value.
    Cached(Value),
    /// The frame closed without the member ever appearing.
    Absent,
}

/// The streaming engine proper: one tokenizer, one frame stack, one config.
///
/// Constructed once per document and driven through [`Engine::next_member`]
/// / `consume_*` pairs; see the module docs for the suspend/resume model.
pub struct Engine<I: Input> {
    tokenizer: Tokenizer<I>,
    frames: FrameStack,
    config: ReaderConfig,
}

impl<I: Input> Engine<I> {
    pub fn new(input: I, config: ReaderConfig) -> Self {
        let max_depth = config.max_depth_default;
        Engine {
            tokenizer: Tokenizer::new(input),
            frames: FrameStack::new(max_depth),
            config,
        }
    }

    /// The current position, rendered as a `$`-rooted path, for error
    /// messages and diagnostics.
    pub fn path(&self) -> String {
        self.frames.path()
    }

    pub(crate) fn tokenizer_mut(&mut self) -> &mut Tokenizer<I> {
        &mut self.tokenizer
    }

    pub(crate) fn push_frame(
        &mut self,
        kind: FrameKind,
        schema: Option<Arc<TypeSchema>>,
        member_max_depth: Option<usize>,
    ) -> Result<(), JsonProcessingError> {
        self.frames.push(kind, schema, member_max_depth)
    }

    /// A member's own `max_depth` override, if it declares one away from the
    /// schema-wide default; `None` falls back to `ReaderConfig::max_depth_default`.
    fn member_max_depth(pending: &PendingMember) -> Option<usize> {
        pending.member.as_ref().and_then(|m| {
            (m.constraints.max_depth != crate::schema::Constraints::default().max_depth)
                .then_some(m.constraints.max_depth)
        })
    }

    /// A member's own `max_length` override, if any, to bound a string read
    /// directly at that member's position.
    fn member_max_length(pending: &PendingMember) -> Option<usize> {
        pending
            .member
            .as_ref()
            .and_then(|m| (m.constraints.max_length != usize::MAX).then_some(m.constraints.max_length))
    }

    /// Checks `value` against the pending member's `max_size` and
    /// `accepted_json_types` constraints, if declared.
    fn check_member_constraints(
        &self,
        pending: &PendingMember,
        value: &Value,
    ) -> Result<(), JsonProcessingError> {
        let Some(member) = &pending.member else {
            return Ok(());
        };
        if let Some(accepted) = &member.constraints.accepted_json_types {
            let found = value.type_name();
            if !accepted.contains(&found) {
                log::warn!(target: "squirrel_stream::engine", "member '{}' has JSON type '{found}', not in the accepted set, raising a constraint error", pending.json_name);
                return Err(ConstraintError {
                    kind: ConstraintErrorKind::UnacceptedJsonType {
                        member: pending.json_name.clone(),
                        found,
                        accepted: accepted.clone(),
                    },
                    position: self.path(),
                }
                .into());
            }
        }
        if member.constraints.max_size != usize::MAX {
            if let Some(len) = value.len() {
                if len > member.constraints.max_size {
                    log::warn!(target: "squirrel_stream::engine", "member '{}' exceeds max_size of {}, raising a constraint error", pending.json_name, member.constraints.max_size);
                    return Err(ConstraintError {
                        kind: ConstraintErrorKind::MaxSize {
                            member: pending.json_name.clone(),
                            max_size: member.constraints.max_size,
                        },
                        position: self.path(),
                    }
                    .into());
                }
            }
        }
        Ok(())
    }

    fn check_not_poisoned(&self) -> Result<(), JsonProcessingError> {
        if self.frames.current().is_poisoned() {
            return Err(SchemaError {
                kind: SchemaErrorKind::ProxyMisuse(
                    "a nested sequence was dropped before it finished iterating".to_string(),
                ),
                position: self.path(),
            }
            .into());
        }
        Ok(())
    }

    /// Consumes the root object's opening `{` and binds `schema` to the
    /// root frame. Must be called exactly once, before the first
    /// [`Engine::next_member`].
    pub fn enter_root(&mut self, schema: Arc<TypeSchema>) -> Result<(), JsonProcessingError> {
        self.tokenizer
            .read_char_skip_whitespace(Some(b'{'))
            .map_err(|e| e.with_position(self.path()))?;
        self.frames.current_mut().set_schema(schema);
        log::trace!(target: "squirrel_stream::engine", "entered root object");
        Ok(())
    }

    /// Scans the next `"key":` pair of the current frame and suspends
    /// immediately before its value, or returns `None` once the frame's
    /// closing `}` has been consumed.
    ///
    /// Exactly one `consume_*` / `skip_value` call is expected before the
    /// next `next_member` call; calling it twice in a row is a
    /// [`SchemaErrorKind::ProxyMisuse`].
    pub fn next_member(&mut self) -> Result<Option<PendingMember>, JsonProcessingError> {
        self.next_member_inner().map_err(|e| e.with_position(self.path()))
    }

    /// Requests a member by name, regardless of where the tokenizer has
    /// scanned to so far — the named-member-request model of
    /// [`crate::engine`]'s module docs.
    ///
    /// - If `json_name` was already cached while scanning ahead for a
    ///   different member, returns [`MemberRequestOutcome::Cached`] with its
    ///   value.
    /// - If it's reachable by scanning forward (skipping or eagerly caching
    ///   any non-suspending members along the way), it becomes the frame's
    ///   pending member and this returns [`MemberRequestOutcome::Ready`] —
    ///   call the matching `consume_*` to read it.
    /// - If the frame closes before `json_name` is found, it's
    ///   [`MemberRequestOutcome::Absent`]: the member simply wasn't present
    ///   in this document.
    /// - Requesting a member that's already been fully consumed is a
    ///   [`SchemaErrorKind::AlreadyAccessed`] error.
    /// - Scanning forward and finding a *different* suspending member before
    ///   reaching `json_name` is a [`SchemaErrorKind::ExpectedAfter`] error:
    ///   only one suspending member can be in flight at a time, so that
    ///   other member must be consumed (or explicitly skipped) first.
    pub fn request_member(&mut self, json_name: &str) -> Result<MemberRequestOutcome, JsonProcessingError> {
        self.request_member_inner(json_name).map_err(|e| e.with_position(self.path()))
    }

    fn request_member_inner(&mut self, json_name: &str) -> Result<MemberRequestOutcome, JsonProcessingError> {
        if let Some(value) = self.frames.current_mut().take_cached(json_name) {
            return Ok(MemberRequestOutcome::Cached(value));
        }
        if self.frames.current().occurrence_count(json_name) > 0 {
            return Err(SchemaError {
                kind: SchemaErrorKind::AlreadyAccessed(json_name.to_string()),
                position: self.path(),
            }
            .into());
        }
        if let Some(pending) = self.frames.current().pending() {
            if pending.json_name == json_name {
                return Ok(MemberRequestOutcome::Ready);
            }
            return Err(SchemaError {
                kind: SchemaErrorKind::ExpectedAfter {
                    member: json_name.to_string(),
                    scanned_past: vec![pending.json_name.clone()],
                },
                position: self.path(),
            }
            .into());
        }

        loop {
            let Some(pending) = self.next_member()? else {
                return Ok(MemberRequestOutcome::Absent);
            };
            if pending.json_name == json_name {
                return Ok(MemberRequestOutcome::Ready);
            }
            let is_suspending = pending.member.as_ref().is_some_and(|m| m.processing_type.is_suspending());
            if is_suspending {
                return Err(SchemaError {
                    kind: SchemaErrorKind::ExpectedAfter {
                        member: json_name.to_string(),
                        scanned_past: vec![pending.json_name.clone()],
                    },
                    position: self.path(),
                }
                .into());
            }
            let value = self.consume_raw()?;
            self.frames.current_mut().cache_value(pending.json_name, value);
        }
    }

    fn next_member_inner(&mut self) -> Result<Option<PendingMember>, JsonProcessingError> {
        self.check_not_poisoned()?;
        if self.frames.current().is_closed() {
            return Ok(None);
        }
        if self.frames.current().pending().is_some() {
            return Err(SchemaError {
                kind: SchemaErrorKind::ProxyMisuse(
                    "the previous member must be consumed before scanning the next one".to_string(),
                ),
                position: self.path(),
            }
            .into());
        }

        let began = self.frames.current().has_begun();
        let next_char = if began {
            let sep = self
                .tokenizer
                .peek_significant()?
                .ok_or_else(|| self.eof_err())?;
            match sep as u8 {
                b',' => {
                    self.tokenizer.read_char_skip_whitespace(Some(b','))?;
                    self.tokenizer.read_char_skip_whitespace(None)?
                }
                b'}' => {
                    self.tokenizer.read_char_skip_whitespace(Some(b'}'))?;
                    self.frames.current_mut().mark_closed();
                    log::trace!(target: "squirrel_stream::engine", "object closed at {}", self.path());
                    return Ok(None);
                }
                _ => {
                    return Err(FormatError {
                        kind: FormatErrorKind::UnexpectedCodepoint {
                            found: Some(sep),
                            expected: "',' or '}'",
                        },
                        position: self.path(),
                    }
                    .into())
                }
            }
        } else {
            self.tokenizer.read_char_skip_whitespace(None)?
        };

        if next_char as u8 == b'}' {
            self.frames.current_mut().mark_closed();
            return Ok(None);
        }
        if next_char as u8 != b'"' {
            return Err(FormatError {
                kind: FormatErrorKind::UnexpectedCodepoint {
                    found: Some(next_char),
                    expected: "a string key",
                },
                position: self.path(),
            }
            .into());
        }

        let key = self.tokenizer.read_string(None)?;
        self.tokenizer.read_char_skip_whitespace(Some(b':'))?;
        self.frames.current_mut().mark_begun();

        let path = self.path();
        self.frames.current_mut().set_pending(key.clone(), move || path)?;

        if self.frames.current().pending().expect("just set").member.is_none() {
            let raw_values_member = self
                .frames
                .current()
                .schema
                .as_ref()
                .and_then(|s| s.raw_values_member())
                .cloned();
            match raw_values_member {
                Some(member) => {
                    log::debug!(target: "squirrel_stream::engine", "unknown member '{key}' dispatched to the RawValues catch-all");
                    self.frames.current_mut().bind_pending_member(member);
                }
                None if self.config.strict_unknown_members => {
                    return Err(SchemaError {
                        kind: SchemaErrorKind::ProxyMisuse(format!("unknown member '{key}'")),
                        position: self.path(),
                    }
                    .into());
                }
                None => {
                    log::debug!(target: "squirrel_stream::engine", "unknown member '{key}' captured as raw value");
                }
            }
        }
        let pending = self.frames.current().pending().cloned().expect("just set");
        Ok(Some(pending))
    }

    fn eof_err(&self) -> JsonProcessingError {
        FormatError {
            kind: FormatErrorKind::UnexpectedEof,
            position: self.path(),
        }
        .into()
    }

    fn take_pending_checked(&mut self) -> Result<PendingMember, JsonProcessingError> {
        self.frames.current_mut().take_pending().ok_or_else(|| {
            SchemaError {
                kind: SchemaErrorKind::ProxyMisuse(
                    "no member is pending; call next_member first".to_string(),
                ),
                position: self.path(),
            }
            .into()
        })
    }

    fn apply_null_policy<T: ValueMapper>(
        &self,
        pending: &PendingMember,
        value: &Value,
    ) -> Result<T, JsonProcessingError> {
        if value.is_null() {
            if let Some(member) = &pending.member {
                if !member.nulls.retain_nulls {
                    if let Some(default) = &member.nulls.default_value {
                        return T::map_value(default).map_err(JsonProcessingError::from);
                    }
                }
            }
        }
        T::map_value(value).map_err(JsonProcessingError::from)
    }

    /// Reads the pending member's value eagerly, mapping it to `T`
    /// (`MappedValue`). Applies the null policy precedence documented on
    /// [`crate::mapper`].
    pub fn consume_value<T: ValueMapper>(&mut self) -> Result<T, JsonProcessingError> {
        self.consume_value_inner().map_err(|e| e.with_position(self.path()))
    }

    fn consume_value_inner<T: ValueMapper>(&mut self) -> Result<T, JsonProcessingError> {
        let pending = self.take_pending_checked()?;
        let max_length = Self::member_max_length(&pending);
        let (outcome, _after) = self.tokenizer.read_node_detect(false, max_length)?;
        let NodeOutcome::Value(value) = outcome else {
            unreachable!("allow_close_bracket was false");
        };
        self.check_member_constraints(&pending, &value)?;
        self.apply_null_policy(&pending, &value)
    }

    /// Like [`Engine::consume_value`], but falls back to `default` instead
    /// of erroring when the member is absent from a default-parameter
    /// constructor and the value is JSON `null` — the third tier of the
    /// null policy precedence.
    pub fn consume_value_or_default<T: ValueMapper>(
        &mut self,
        default: impl FnOnce() -> T,
    ) -> Result<T, JsonProcessingError> {
        self.consume_value_or_default_inner(default)
            .map_err(|e| e.with_position(self.path()))
    }

    fn consume_value_or_default_inner<T: ValueMapper>(
        &mut self,
        default: impl FnOnce() -> T,
    ) -> Result<T, JsonProcessingError> {
        let pending = self.take_pending_checked()?;
        let max_length = Self::member_max_length(&pending);
        let (outcome, _after) = self.tokenizer.read_node_detect(false, max_length)?;
        let NodeOutcome::Value(value) = outcome else {
            unreachable!("allow_close_bracket was false");
        };
        let wants_constructor_default = value.is_null()
            && pending.member.as_ref().is_some_and(|m| {
                !m.nulls.retain_nulls && m.nulls.default_value.is_none() && m.nulls.has_default_parameter
            });
        if wants_constructor_default {
            return Ok(default());
        }
        self.check_member_constraints(&pending, &value)?;
        self.apply_null_policy(&pending, &value)
    }

    /// Reads the pending member's value as a generic [`Value`]
    /// (`RawValues`), performing no scalar mapping at all.
    pub fn consume_raw(&mut self) -> Result<Value, JsonProcessingError> {
        self.consume_raw_inner().map_err(|e| e.with_position(self.path()))
    }

    fn consume_raw_inner(&mut self) -> Result<Value, JsonProcessingError> {
        let pending = self.take_pending_checked()?;
        let max_length = Self::member_max_length(&pending);
        let (outcome, _after) = self.tokenizer.read_node_detect(false, max_length)?;
        let NodeOutcome::Value(value) = outcome else {
            unreachable!("allow_close_bracket was false");
        };
        self.check_member_constraints(&pending, &value)?;
        Ok(value)
    }

    /// Stashes `value` as the current frame's entry key (the surrounding
    /// JSON object's own key, for an object-as-map sequence item) and marks
    /// `key_member_name` as having occurred, so a schema-declared key
    /// member doesn't fail its `min_occur` check just because it never
    /// literally appears as a `"key": value` pair inside the item itself.
    pub(crate) fn cache_entry_key(&mut self, key_member_name: &str, value: Value) {
        self.frames.current_mut().cache_value("(key)".to_string(), value);
        self.frames.current_mut().mark_occurred(key_member_name);
    }

    /// Reads back the entry key cached by [`Engine::cache_entry_key`] for
    /// the current frame, mapping it to `T`. Used by an object-as-map
    /// sequence item to recover the key that indexed it, since that key
    /// lives in the surrounding document structure rather than inside the
    /// item's own members.
    pub fn consume_entry_key<T: ValueMapper>(&mut self) -> Result<T, JsonProcessingError> {
        self.consume_entry_key_inner().map_err(|e| e.with_position(self.path()))
    }

    fn consume_entry_key_inner<T: ValueMapper>(&mut self) -> Result<T, JsonProcessingError> {
        let value = self.frames.current_mut().take_cached("(key)").ok_or_else(|| SchemaError {
            kind: SchemaErrorKind::ProxyMisuse(
                "no entry key cached for this item (not an object-as-map sequence)".to_string(),
            ),
            position: self.path(),
        })?;
        T::map_value(&value).map_err(JsonProcessingError::from)
    }

    /// Discards the pending member's value without building it.
    pub fn skip_value(&mut self) -> Result<(), JsonProcessingError> {
        self.take_pending_checked()?;
        self.tokenizer
            .skip_node_detect()
            .map_err(|e| e.with_position(self.path()))?;
        Ok(())
    }

    /// Suspends the engine over a lazy array of simple values
    /// (`MappedStream`/`MappedIterator`/`MappedConsumer`).
    pub fn consume_stream<T: ValueMapper>(
        &mut self,
    ) -> Result<MappedArrayStream<'_, I, T>, JsonProcessingError> {
        let pending = self.take_pending_checked().map_err(|e| e.with_position(self.path()))?;
        let constraints = pending
            .member
            .as_ref()
            .map(|m| m.constraints.clone())
            .unwrap_or_default();
        let poison = self.frames.current().poison_flag();
        log::trace!(target: "squirrel_stream::engine", "suspending over array member '{}'", pending.json_name);
        let fallback_path = self.path();
        MappedArrayStream::open(self, poison, pending.json_name, constraints)
            .map_err(|e| e.with_position(fallback_path))
    }

    /// Suspends the engine over an object treated as a lazy map
    /// (`MappedStream`/`MappedIterator`/`MappedConsumer` over entries).
    pub fn consume_map_stream<T: ValueMapper>(
        &mut self,
    ) -> Result<MappedObjectStream<'_, I, T>, JsonProcessingError> {
        let pending = self.take_pending_checked().map_err(|e| e.with_position(self.path()))?;
        let constraints = pending
            .member
            .as_ref()
            .map(|m| m.constraints.clone())
            .unwrap_or_default();
        let poison = self.frames.current().poison_flag();
        log::trace!(target: "squirrel_stream::engine", "suspending over map member '{}'", pending.json_name);
        let fallback_path = self.path();
        MappedObjectStream::open(self, poison, pending.json_name, constraints)
            .map_err(|e| e.with_position(fallback_path))
    }

    /// Enters a nested proxied object (`ProxyObject`): pushes a frame bound
    /// to `P`'s schema and consumes its opening `{`. The caller drives
    /// `next_member`/`consume_*` as usual against the new top frame, then
    /// calls [`Engine::finish_proxy`] to return to the parent.
    pub fn consume_proxy<P: Readable>(&mut self) -> Result<(), JsonProcessingError> {
        let pending = self.take_pending_checked().map_err(|e| e.with_position(self.path()))?;
        let schema = P::schema();
        self.tokenizer
            .read_char_skip_whitespace(Some(b'{'))
            .map_err(|e| e.with_position(self.path()))?;
        let member_max_depth = Self::member_max_depth(&pending);
        self.frames
            .push(FrameKind::Member(pending.json_name), Some(schema), member_max_depth)?;
        log::trace!(target: "squirrel_stream::engine", "entered nested proxy object at {}", self.path());
        Ok(())
    }

    /// Suspends the engine over a lazy array of proxied objects
    /// (`ProxyStream`/`ProxyIterator`/`ProxyConsumer`).
    pub fn consume_proxy_stream<P: Readable>(
        &mut self,
    ) -> Result<ProxyArrayStream<'_, I>, JsonProcessingError> {
        let pending = self.take_pending_checked().map_err(|e| e.with_position(self.path()))?;
        let constraints = pending
            .member
            .as_ref()
            .map(|m| m.constraints.clone())
            .unwrap_or_default();
        let poison = self.frames.current().poison_flag();
        let schema = P::schema();
        log::trace!(target: "squirrel_stream::engine", "suspending over proxy array member '{}'", pending.json_name);
        let fallback_path = self.path();
        ProxyArrayStream::open(self, poison, pending.json_name, constraints, schema)
            .map_err(|e| e.with_position(fallback_path))
    }

    /// Drains any members the caller didn't read, verifies `min_occur` for
    /// every declared member of the current frame's schema, and pops back
    /// to the parent frame. Used to close a [`Engine::consume_proxy`]
    /// object or one item of a [`ProxyArrayStream`].
    pub fn finish_proxy(&mut self) -> Result<(), JsonProcessingError> {
        self.drain_and_check_min_occur()?;
        self.frames.pop();
        Ok(())
    }

    /// Like [`Engine::finish_proxy`], but for the document root: verifies
    /// `min_occur` without popping (the root frame is never popped).
    pub fn finish_root(&mut self) -> Result<(), JsonProcessingError> {
        self.drain_and_check_min_occur()
    }

    fn drain_and_check_min_occur(&mut self) -> Result<(), JsonProcessingError> {
        while self.next_member()?.is_some() {
            self.skip_value()?;
        }
        let frame = self.frames.current();
        if let Some(schema) = frame.schema.clone() {
            for member in schema.members() {
                let min = member.constraints.min_occur;
                let actual = frame.occurrence_count(&member.json_name);
                if actual < min {
                    log::warn!(target: "squirrel_stream::engine", "member '{}' requires at least {min} occurrence(s), found {actual}, raising a constraint error", member.json_name);
                    return Err(ConstraintError {
                        kind: ConstraintErrorKind::MinOccur {
                            member: member.json_name.clone(),
                            min,
                            actual,
                        },
                        position: self.path(),
                    }
                    .into());
                }
            }
        }
        Ok(())
    }
}
