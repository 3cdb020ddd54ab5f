/*!
Schema introspection model.

A [`Member`] is the unit of schema binding, derived once per target type and
cached process-wide (see [`crate::cache`]). Record/interface declarations
and the proxy-dispatch mechanism that exposes members to user code are
treated as external collaborators (per the design notes), so rather than
deriving members reflectively from method signatures, this crate exposes an
explicit, immutable [`SchemaBuilder`] that a caller (or a future derive
macro) uses to describe a target type once.
*/

use std::sync::Arc;

use crate::value::Value;

/// One of the nine processing modes a member can have, derived from the
/// shape of the JSON it consumes and how the consumer receives it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessingType {
    /// A single value at this position: a simple type, or a list/set/map of
    /// simple types, read eagerly.
    MappedValue,
    /// A nested object, read eagerly via another schema (suspends the
    /// engine while its frame is active, but never skips ahead).
    ProxyObject,
    /// A lazy sequence of simple values (array, or object treated as
    /// entries).
    MappedStream,
    /// Same JSON shape as `MappedStream`, consumer-driven by an iterator.
    MappedIterator,
    /// Same JSON shape, consumer-driven by a callback.
    MappedConsumer,
    /// A lazy sequence of proxied objects.
    ProxyStream,
    /// Same JSON shape as `ProxyStream`, consumer-driven by an iterator.
    ProxyIterator,
    /// Same JSON shape, consumer-driven by a callback.
    ProxyConsumer,
    /// Catch-all for members not otherwise declared on the schema.
    RawValues,
}

impl ProcessingType {
    /// Does this mode drive the engine to pause parsing until the consumer
    /// iterates?
    pub fn is_suspending(self) -> bool {
        !matches!(self, ProcessingType::MappedValue | ProcessingType::RawValues)
    }

    /// Is this mode a lazy sequence (as opposed to a single nested object)?
    pub fn is_streaming(self) -> bool {
        self.is_suspending() && self != ProcessingType::ProxyObject
    }

    /// Does this mode deliver items via a callback rather than a pull
    /// iterator?
    pub fn is_consumer(self) -> bool {
        matches!(
            self,
            ProcessingType::ProxyConsumer | ProcessingType::MappedConsumer
        )
    }

    /// Does this mode wrap proxied (nested-schema) values, as opposed to
    /// simple ones?
    pub fn is_proxy(self) -> bool {
        matches!(
            self,
            ProcessingType::ProxyObject
                | ProcessingType::ProxyStream
                | ProcessingType::ProxyIterator
                | ProcessingType::ProxyConsumer
        )
    }
}

/// The collection wrapper a member's return type applies to its value(s),
/// if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionType {
    List,
    Set,
    Map,
    Stream,
}

/// Type information for a member.
#[derive(Debug, Clone)]
pub struct Types {
    pub return_type: &'static str,
    pub collection_type: Option<CollectionType>,
    pub key_type: Option<&'static str>,
    pub value_type: &'static str,
}

/// Null handling for a member, see the null policy precedence in
/// [`crate::mapper`].
#[derive(Debug, Clone, Default)]
pub struct Nulls {
    pub retain_nulls: bool,
    pub has_default_parameter: bool,
    pub default_value: Option<Value>,
}

/// Occurrence and size bounds for a member.
#[derive(Debug, Clone)]
pub struct Constraints {
    pub min_occur: usize,
    pub max_occur: usize,
    pub max_depth: usize,
    pub max_size: usize,
    pub max_length: usize,
    pub accepted_json_types: Option<Vec<&'static str>>,
}

impl Default for Constraints {
    fn default() -> Self {
        Constraints {
            min_occur: 0,
            max_occur: usize::MAX,
            max_depth: 64,
            max_size: usize::MAX,
            max_length: usize::MAX,
            accepted_json_types: None,
        }
    }
}

/// The unit of schema binding: a JSON-name to target-slot binding, derived
/// once per target type and immutable thereafter.
#[derive(Debug, Clone)]
pub struct Member {
    /// 1-based ordinal within its parent type; shared by all members
    /// binding the same JSON name. The entry-key accessor uses the
    /// sentinel index 0.
    pub index: u32,
    pub json_name: String,
    pub is_key: bool,
    pub processing_type: ProcessingType,
    pub types: Types,
    pub nulls: Nulls,
    pub constraints: Constraints,
}

impl Member {
    pub fn is_key_member(&self) -> bool {
        self.is_key && self.index == 0
    }
}

/// Builds a single [`Member`] before it's frozen into a [`TypeSchema`].
pub struct MemberBuilder {
    index: u32,
    json_name: String,
    is_key: bool,
    processing_type: ProcessingType,
    types: Types,
    nulls: Nulls,
    constraints: Constraints,
}

impl MemberBuilder {
    pub fn new(index: u32, json_name: impl Into<String>, processing_type: ProcessingType) -> Self {
        MemberBuilder {
            index,
            json_name: json_name.into(),
            is_key: false,
            processing_type,
            types: Types {
                return_type: "",
                collection_type: None,
                key_type: None,
                value_type: "",
            },
            nulls: Nulls::default(),
            constraints: Constraints::default(),
        }
    }

    pub fn key(mut self) -> Self {
        self.is_key = true;
        self.index = 0;
        self
    }

    pub fn types(mut self, types: Types) -> Self {
        self.types = types;
        self
    }

    pub fn required(mut self) -> Self {
        self.constraints.min_occur = 1;
        self
    }

    pub fn min_occur(mut self, min: usize) -> Self {
        self.constraints.min_occur = min;
        self
    }

    pub fn max_occur(mut self, max: usize) -> Self {
        self.constraints.max_occur = max;
        self
    }

    pub fn max_depth(mut self, max: usize) -> Self {
        self.constraints.max_depth = max;
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        self.constraints.max_length = max;
        self
    }

    pub fn max_size(mut self, max: usize) -> Self {
        self.constraints.max_size = max;
        self
    }

    pub fn accepted_json_types(mut self, types: Vec<&'static str>) -> Self {
        self.constraints.accepted_json_types = Some(types);
        self
    }

    pub fn retain_nulls(mut self) -> Self {
        self.nulls.retain_nulls = true;
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.nulls.default_value = Some(value);
        self
    }

    pub fn default_parameter(mut self) -> Self {
        self.nulls.has_default_parameter = true;
        self
    }

    pub fn build(self) -> Member {
        Member {
            index: self.index,
            json_name: self.json_name,
            is_key: self.is_key,
            processing_type: self.processing_type,
            types: self.types,
            nulls: self.nulls,
            constraints: self.constraints,
        }
    }
}

/// An ordered, indexed, immutable table of [`Member`]s for one target type.
///
/// Mirrors the order members were declared (which should match the expected
/// JSON member order, since the engine enforces input order against
/// declaration order for suspending members).
#[derive(Debug, Default)]
pub struct TypeSchema {
    members: Vec<Member>,
}

impl TypeSchema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn by_name(&self, json_name: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.json_name == json_name)
    }

    pub fn key_member(&self) -> Option<&Member> {
        self.members.iter().find(|m| m.is_key_member())
    }

    pub fn raw_values_member(&self) -> Option<&Member> {
        self.members
            .iter()
            .find(|m| m.processing_type == ProcessingType::RawValues)
    }

    /// The declared position of `json_name` among the suspending members,
    /// used to detect out-of-order access. `None` if it's not declared (an
    /// unknown member, or non-suspending).
    pub fn declared_order_position(&self, json_name: &str) -> Option<usize> {
        self.members
            .iter()
            .filter(|m| m.processing_type.is_suspending())
            .position(|m| m.json_name == json_name)
    }
}

/// Builds a [`TypeSchema`] from an ordered sequence of members.
#[derive(Default)]
pub struct SchemaBuilder {
    members: Vec<Member>,
}

impl SchemaBuilder {
    pub fn member(mut self, member: Member) -> Self {
        self.members.push(member);
        self
    }

    pub fn build(self) -> TypeSchema {
        TypeSchema {
            members: self.members,
        }
    }
}

/// Binds a Rust type to its [`TypeSchema`]. `schema()` is expected to be
/// cheap to call repeatedly: implementations should derive the schema once
/// via [`crate::cache::schema_for`], which memoizes it process-wide keyed by
/// [`std::any::TypeId`].
pub trait Readable: Sized + 'static {
    fn schema() -> Arc<TypeSchema>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_builder_orders_members_and_finds_by_name() {
        let schema = TypeSchema::builder()
            .member(
                MemberBuilder::new(1, "name", ProcessingType::MappedValue)
                    .types(Types {
                        return_type: "String",
                        collection_type: None,
                        key_type: None,
                        value_type: "String",
                    })
                    .build(),
            )
            .member(
                MemberBuilder::new(2, "tracks", ProcessingType::ProxyStream)
                    .types(Types {
                        return_type: "Stream<Track>",
                        collection_type: Some(CollectionType::Stream),
                        key_type: None,
                        value_type: "Track",
                    })
                    .build(),
            )
            .build();

        assert_eq!(schema.members().len(), 2);
        assert!(schema.by_name("name").unwrap().processing_type == ProcessingType::MappedValue);
        assert_eq!(schema.declared_order_position("tracks"), Some(0));
    }

    #[test]
    fn key_member_uses_sentinel_index_zero() {
        let member = MemberBuilder::new(3, "no", ProcessingType::MappedValue)
            .key()
            .build();
        assert_eq!(member.index, 0);
        assert!(member.is_key_member());
    }
}
