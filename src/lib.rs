/*!
# `squirrel-stream`

A pull-based, streaming JSON reader that maps large documents onto
user-declared schemas in bounded memory.

Rather than building a full in-memory tree (as `serde_json::Value` does) or
requiring the whole document to implement `serde::Deserialize` up front,
this crate lets a caller read a document member by member, suspending over
arrays and nested objects instead of materializing them, and resuming only
once the caller is done with that member. This keeps peak memory bounded by
the depth of the schema rather than the size of the document.

## Layout

- [`input`] — codepoint sources (in-memory, buffered reader, or a caller's
  codepoint iterator).
- [`tokenizer`] — lexical and node-level JSON primitives.
- [`value`] — the generic JSON value model produced by the tokenizer.
- [`schema`] — the `Member`/`TypeSchema`/`Readable` introspection model.
- [`mapper`] — converts generic values into target Rust types.
- [`engine`] — the suspend/resume driver that ties the above together.
- [`position`] — human-readable path rendering for error messages.
- [`error`] — the four-kind error taxonomy.

## Example

```no_run
use squirrel_stream::{of_root, Readable, MemberBuilder, ProcessingType, Types, TypeSchema};
use squirrel_stream::engine::PendingMember;

struct Album {
    name: String,
    track_count: i32,
}

impl Readable for Album {
    fn schema() -> std::sync::Arc<TypeSchema> {
        squirrel_stream::cache::schema_for::<Album>(|| {
            TypeSchema::builder()
                .member(
                    MemberBuilder::new(1, "name", ProcessingType::MappedValue)
                        .types(Types { return_type: "String", collection_type: None, key_type: None, value_type: "String" })
                        .required()
                        .build(),
                )
                .member(
                    MemberBuilder::new(2, "trackCount", ProcessingType::MappedValue)
                        .types(Types { return_type: "i32", collection_type: None, key_type: None, value_type: "i32" })
                        .required()
                        .build(),
                )
                .build()
        })
    }
}

# fn main() -> Result<(), squirrel_stream::error::JsonProcessingError> {
let mut reader = of_root::<Album>(br#"{"name":"Ok Computer","trackCount":12}"#)?;
let mut name = None;
let mut track_count = None;
while let Some(PendingMember { json_name, .. }) = reader.next_member()? {
    match json_name.as_str() {
        "name" => name = Some(reader.consume_value::<String>()?),
        "trackCount" => track_count = Some(reader.consume_value::<i32>()?),
        _ => reader.skip_value()?,
    }
}
reader.finish()?;
# Ok(())
# }
```
*/

#![allow(clippy::question_mark)]

pub(crate) mod std_ext;

pub mod cache;
pub mod engine;
pub mod error;
pub mod input;
pub mod mapper;
pub mod position;
pub mod schema;
pub mod tokenizer;
pub mod value;

use std::sync::Arc;

use engine::{Engine, PendingMember, ReaderConfig};
use input::{Input, ReaderInput, SliceInput};

pub use error::JsonProcessingError;
pub use mapper::ValueMapper;
pub use schema::{CollectionType, Constraints, MemberBuilder, Nulls, ProcessingType, Readable, SchemaBuilder, TypeSchema, Types};
pub use value::{Number, Value};

/// A cursor into one active JSON object, driven by hand (or by a future
/// derive macro) to pull a schema's members in declaration order.
///
/// This is the external interface every reader implements: [`RootReader`]
/// for the document root, and the engine itself (via
/// [`engine::Engine::next_member`]) for nested proxy objects.
pub trait Proxy<I: Input> {
    fn next_member(&mut self) -> Result<Option<PendingMember>, JsonProcessingError>;

    /// The current position, rendered as a `$`-rooted path, for
    /// diagnostics and error messages.
    fn position(&self) -> String;
}

/// A streaming reader positioned at the document root, bound to `T`'s
/// schema. Constructed by [`of_root`] or [`of_root_reader`].
pub struct RootReader<I: Input> {
    engine: Engine<I>,
}

impl<I: Input> RootReader<I> {
    fn open<T: Readable>(input: I, config: ReaderConfig) -> Result<Self, JsonProcessingError> {
        let mut engine = Engine::new(input, config);
        engine.enter_root(T::schema())?;
        Ok(RootReader { engine })
    }

    /// Scans the next member's key, suspending before its value. `None`
    /// once the root object's closing `}` has been consumed.
    pub fn next_member(&mut self) -> Result<Option<PendingMember>, JsonProcessingError> {
        self.engine.next_member()
    }

    /// Requests a member by name regardless of scan order, per
    /// [`engine::Engine::request_member`].
    pub fn request_member(
        &mut self,
        json_name: &str,
    ) -> Result<engine::MemberRequestOutcome, JsonProcessingError> {
        self.engine.request_member(json_name)
    }

    /// The current position, rendered as a `$`-rooted path.
    pub fn position(&self) -> String {
        self.engine.path()
    }

    /// Reads the pending member's value eagerly (`MappedValue`).
    pub fn consume_value<T: ValueMapper>(&mut self) -> Result<T, JsonProcessingError> {
        self.engine.consume_value()
    }

    /// Like [`RootReader::consume_value`], honoring a constructor-supplied
    /// default for a null value (null policy tier 3).
    pub fn consume_value_or_default<T: ValueMapper>(
        &mut self,
        default: impl FnOnce() -> T,
    ) -> Result<T, JsonProcessingError> {
        self.engine.consume_value_or_default(default)
    }

    /// Reads the pending member's value as a generic [`Value`]
    /// (`RawValues`).
    pub fn consume_raw(&mut self) -> Result<Value, JsonProcessingError> {
        self.engine.consume_raw()
    }

    /// Discards the pending member's value.
    pub fn skip_value(&mut self) -> Result<(), JsonProcessingError> {
        self.engine.skip_value()
    }

    /// Suspends over a lazy array of simple values.
    pub fn consume_stream<T: ValueMapper>(
        &mut self,
    ) -> Result<engine::sequence::MappedArrayStream<'_, I, T>, JsonProcessingError> {
        self.engine.consume_stream()
    }

    /// Suspends over an object treated as a lazy map of entries.
    pub fn consume_map_stream<T: ValueMapper>(
        &mut self,
    ) -> Result<engine::sequence::MappedObjectStream<'_, I, T>, JsonProcessingError> {
        self.engine.consume_map_stream()
    }

    /// Enters a nested proxied object; drive it via [`Proxy::next_member`]
    /// on `self` (the frame stack, not the type, changes), then call
    /// [`RootReader::finish_proxy`].
    pub fn consume_proxy<P: Readable>(&mut self) -> Result<(), JsonProcessingError> {
        self.engine.consume_proxy::<P>()
    }

    /// Closes a nested proxied object entered with
    /// [`RootReader::consume_proxy`].
    pub fn finish_proxy(&mut self) -> Result<(), JsonProcessingError> {
        self.engine.finish_proxy()
    }

    /// Suspends over a lazy array of proxied objects.
    pub fn consume_proxy_stream<P: Readable>(
        &mut self,
    ) -> Result<engine::sequence::ProxyArrayStream<'_, I>, JsonProcessingError> {
        self.engine.consume_proxy_stream::<P>()
    }

    /// Drains any unread root members, verifies `min_occur`, and completes
    /// the parse. Dropping a `RootReader` without calling this is fine —
    /// it just means the rest of the document, if any, is never checked.
    pub fn finish(&mut self) -> Result<(), JsonProcessingError> {
        self.engine.finish_root()
    }
}

impl<I: Input> Proxy<I> for RootReader<I> {
    fn next_member(&mut self) -> Result<Option<PendingMember>, JsonProcessingError> {
        self.engine.next_member()
    }

    fn position(&self) -> String {
        self.engine.path()
    }
}

/// Opens `bytes` as an in-memory document bound to `T`'s schema, consuming
/// its opening `{`.
pub fn of_root<T: Readable>(bytes: &[u8]) -> Result<RootReader<SliceInput<'_>>, JsonProcessingError> {
    RootReader::open::<T>(SliceInput::new(bytes), ReaderConfig::default())
}

/// Like [`of_root`], but with an explicit [`ReaderConfig`].
pub fn of_root_with_config<T: Readable>(
    bytes: &[u8],
    config: ReaderConfig,
) -> Result<RootReader<SliceInput<'_>>, JsonProcessingError> {
    RootReader::open::<T>(SliceInput::new(bytes), config)
}

/// Opens a `std::io::Read` stream as a document bound to `T`'s schema,
/// reading incrementally rather than buffering the whole source up front.
pub fn of_root_reader<T: Readable, R: std::io::Read>(
    source: R,
    config: ReaderConfig,
) -> Result<RootReader<ReaderInput<R>>, JsonProcessingError> {
    RootReader::open::<T>(ReaderInput::new(source), config)
}

/// Opens `bytes` as a sequence of `T`-schema objects: either a top-level
/// JSON array, or a top-level JSON object treated as a map (each member's
/// own key becomes the item's entry key, bound to `T`'s schema-declared key
/// member, if any).
pub fn of<T: Readable>(
    bytes: &[u8],
) -> Result<engine::sequence::RootSequence<SliceInput<'_>, T>, JsonProcessingError> {
    engine::sequence::RootSequence::open(Engine::new(SliceInput::new(bytes), ReaderConfig::default()))
}

/// Like [`of`], but with an explicit [`ReaderConfig`].
pub fn of_with_config<T: Readable>(
    bytes: &[u8],
    config: ReaderConfig,
) -> Result<engine::sequence::RootSequence<SliceInput<'_>, T>, JsonProcessingError> {
    engine::sequence::RootSequence::open(Engine::new(SliceInput::new(bytes), config))
}

/// Like [`of`], but reading incrementally from a `std::io::Read` stream
/// rather than buffering the whole source up front.
pub fn of_reader<T: Readable, R: std::io::Read>(
    source: R,
    config: ReaderConfig,
) -> Result<engine::sequence::RootSequence<ReaderInput<R>, T>, JsonProcessingError> {
    engine::sequence::RootSequence::open(Engine::new(ReaderInput::new(source), config))
}

/// Convenience re-export of [`cache::schema_for`] for `Readable` impls that
/// otherwise only need this one item from [`cache`].
pub fn schema_for<T: std::any::Any>(build: impl FnOnce() -> TypeSchema) -> Arc<TypeSchema> {
    cache::schema_for::<T>(build)
}
