/*!
Frame bookkeeping.

A [`Frame`] tracks everything the engine needs to know about one active JSON
object while it's being read: which member is expected next, how many times
each member's key has appeared, values read ahead while searching for a
named member, and whether a nested sequence was abandoned mid-iteration.
*/

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use crate::error::{JsonProcessingError, SchemaError, SchemaErrorKind};
use crate::schema::{Member, TypeSchema};
use crate::value::Value;

/// One path segment, used both for bookkeeping and for rendering positions
/// (see [`crate::position`]).
#[derive(Debug, Clone)]
pub enum FrameKind {
    Root,
    Member(String),
    Index(usize),
}

/// A flag a nested sequence sets on its enclosing frame if it's dropped
/// before exhaustion. Once set, further reads against that frame (or
/// anything above it) fail with [`SchemaErrorKind::ProxyMisuse`] rather than
/// silently resuming from an indeterminate tokenizer position.
#[derive(Clone, Default)]
pub struct PoisonFlag(Rc<Cell<bool>>);

impl PoisonFlag {
    pub fn new() -> Self {
        PoisonFlag(Rc::new(Cell::new(false)))
    }

    pub fn poison(&self) {
        self.0.set(true);
    }

    pub fn is_poisoned(&self) -> bool {
        self.0.get()
    }
}

/// A member whose `"key":` has been read but whose value has not yet been
/// consumed. Exactly one of these is live per frame at a time.
#[derive(Debug, Clone)]
pub struct PendingMember {
    pub json_name: String,
    /// `None` when the key isn't declared on the schema (an unknown
    /// member), in which case the caller must [`Engine::skip_value`] or
    /// [`Engine::consume_raw`] it.
    pub member: Option<Member>,
}

pub struct Frame {
    pub kind: FrameKind,
    pub schema: Option<Arc<TypeSchema>>,
    pub depth: usize,
    began: bool,
    closed: bool,
    pending: Option<PendingMember>,
    occurrences: HashMap<String, usize>,
    poison: PoisonFlag,
    /// Values read ahead and stashed while [`super::Engine::request_member`]
    /// scanned past them looking for a different named member, plus any
    /// synthetic values the engine injects directly (e.g. the `"(key)"`
    /// slot for an object-as-map entry's key).
    cached_values: HashMap<String, Value>,
}

impl Frame {
    pub fn root() -> Self {
        Frame::child(FrameKind::Root, None, 0)
    }

    pub fn child(kind: FrameKind, schema: Option<Arc<TypeSchema>>, depth: usize) -> Self {
        Frame {
            kind,
            schema,
            depth,
            began: false,
            closed: false,
            pending: None,
            occurrences: HashMap::new(),
            poison: PoisonFlag::new(),
            cached_values: HashMap::new(),
        }
    }

    pub fn set_schema(&mut self, schema: Arc<TypeSchema>) {
        self.schema = Some(schema);
    }

    pub fn poison_flag(&self) -> PoisonFlag {
        self.poison.clone()
    }

    pub fn is_poisoned(&self) -> bool {
        self.poison.is_poisoned()
    }

    pub fn has_begun(&self) -> bool {
        self.began
    }

    pub fn mark_begun(&mut self) {
        self.began = true;
    }

    /// Whether this frame's closing `}` has already been consumed. Once
    /// set, [`Engine::next_member`] must return `Ok(None)` without touching
    /// the tokenizer again — the position right after the brace belongs to
    /// whatever encloses this frame, not to it.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn mark_closed(&mut self) {
        self.closed = true;
    }

    pub fn pending(&self) -> Option<&PendingMember> {
        self.pending.as_ref()
    }

    pub fn take_pending(&mut self) -> Option<PendingMember> {
        self.pending.take()
    }

    /// Binds an unmatched member name to the schema's declared `RawValues`
    /// catch-all, if any, so it's dispatched (and constraint-checked) like
    /// any other declared member instead of staying anonymous.
    pub fn bind_pending_member(&mut self, member: Member) {
        if let Some(pending) = self.pending.as_mut() {
            pending.member = Some(member);
        }
    }

    /// Records `"key":` as having been scanned and enforces the
    /// one-open-member-at-a-time invariant before committing it as
    /// [`Frame::pending`].
    ///
    /// This only tracks *that* a key was seen (for duplicate-key and
    /// named-request bookkeeping); it does not enforce declaration order —
    /// a JSON document's member order is free to differ from the schema's
    /// declared order, and blind scanning has no "expected" order to
    /// violate. [`super::Engine::request_member`] is what enforces ordering
    /// against a specific named request.
    pub fn set_pending(
        &mut self,
        json_name: String,
        path: impl FnOnce() -> String,
    ) -> Result<(), JsonProcessingError> {
        if self.pending.is_some() {
            return Err(SchemaError {
                kind: SchemaErrorKind::ProxyMisuse(format!(
                    "'{json_name}' was scanned before the previous member was consumed"
                )),
                position: path(),
            }
            .into());
        }

        if self.occurrence_count(&json_name) > 0 {
            return Err(SchemaError {
                kind: SchemaErrorKind::AlreadyAccessed(json_name),
                position: path(),
            }
            .into());
        }

        let member = self.schema.as_ref().and_then(|s| s.by_name(&json_name)).cloned();
        self.occurrences.insert(json_name.clone(), 1);
        self.pending = Some(PendingMember { json_name, member });
        Ok(())
    }

    pub fn occurrence_count(&self, json_name: &str) -> usize {
        self.occurrences.get(json_name).copied().unwrap_or(0)
    }

    /// Marks `json_name` as scanned without making it the live pending
    /// member — used by [`super::Engine::request_member`] to record a
    /// member it read ahead and cached (or skipped) while searching for a
    /// different name.
    pub fn mark_occurred(&mut self, json_name: &str) {
        *self.occurrences.entry(json_name.to_string()).or_insert(0) += 1;
    }

    pub fn cache_value(&mut self, json_name: String, value: Value) {
        self.cached_values.insert(json_name, value);
    }

    pub fn take_cached(&mut self, json_name: &str) -> Option<Value> {
        self.cached_values.remove(json_name)
    }

    #[cfg(test)]
    pub fn for_test(kind: FrameKind) -> Self {
        Frame::child(kind, None, 0)
    }
}

/// The stack of active frames, one per currently-open JSON object, rooted
/// at the document's top-level value.
pub struct FrameStack {
    frames: Vec<Frame>,
    max_depth_default: usize,
}

impl FrameStack {
    pub fn new(max_depth_default: usize) -> Self {
        FrameStack {
            frames: vec![Frame::root()],
            max_depth_default,
        }
    }

    pub fn path(&self) -> String {
        crate::position::render_path(&self.frames)
    }

    pub fn current(&self) -> &Frame {
        self.frames.last().expect("root frame always present")
    }

    pub fn current_mut(&mut self) -> &mut Frame {
        self.frames.last_mut().expect("root frame always present")
    }

    /// Pushes a child frame, enforcing a depth ceiling. `member_max_depth`
    /// overrides the reader-wide default when the member being entered
    /// declares its own `max_depth` (see [`crate::schema::Constraints`]).
    pub fn push(
        &mut self,
        kind: FrameKind,
        schema: Option<Arc<TypeSchema>>,
        member_max_depth: Option<usize>,
    ) -> Result<(), JsonProcessingError> {
        let depth = self.current().depth + 1;
        let max_depth = member_max_depth.unwrap_or(self.max_depth_default);
        if depth > max_depth {
            log::warn!(target: "squirrel_stream::engine", "nesting depth {depth} exceeds max_depth {max_depth}, raising a constraint error");
            return Err(crate::error::ConstraintError {
                kind: crate::error::ConstraintErrorKind::MaxDepth { max_depth },
                position: self.path(),
            }
            .into());
        }
        self.frames.push(Frame::child(kind, schema, depth));
        Ok(())
    }

    pub fn pop(&mut self) -> Frame {
        assert!(self.frames.len() > 1, "cannot pop the root frame");
        self.frames.pop().unwrap()
    }

    pub fn depth(&self) -> usize {
        self.frames.len() - 1
    }
}
