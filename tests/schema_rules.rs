//! End-to-end coverage for the schema-enforcement rules: declaration-order
//! checking, occurrence bounds, null defaults, and duplicate-key rejection.

use std::sync::Arc;

use squirrel_stream::engine::MemberRequestOutcome;
use squirrel_stream::{
    of_root, CollectionType, JsonProcessingError, MemberBuilder, ProcessingType, Readable, TypeSchema, Types, Value,
};

struct OrderedArrays;

impl Readable for OrderedArrays {
    fn schema() -> Arc<TypeSchema> {
        squirrel_stream::schema_for::<OrderedArrays>(|| {
            let stream_types = || Types {
                return_type: "Stream<i32>",
                collection_type: Some(CollectionType::Stream),
                key_type: None,
                value_type: "i32",
            };
            TypeSchema::builder()
                .member(
                    MemberBuilder::new(1, "a", ProcessingType::MappedStream)
                        .types(stream_types())
                        .build(),
                )
                .member(
                    MemberBuilder::new(2, "b", ProcessingType::MappedStream)
                        .types(stream_types())
                        .build(),
                )
                .build()
        })
    }
}

#[test]
fn blind_scanning_tolerates_any_document_order() {
    // Schema declares "a" before "b", but the document has "b" first — blind
    // enumeration via `next_member` doesn't care about declared order at all.
    let mut reader = of_root::<OrderedArrays>(br#"{"b":[1],"a":[2]}"#).unwrap();

    let first = reader.next_member().unwrap().unwrap();
    assert_eq!(first.json_name, "b");
    for item in reader.consume_stream::<i32>().unwrap() {
        item.unwrap();
    }

    let second = reader.next_member().unwrap().unwrap();
    assert_eq!(second.json_name, "a");
    for item in reader.consume_stream::<i32>().unwrap() {
        item.unwrap();
    }
    assert!(reader.next_member().unwrap().is_none());
    reader.finish().unwrap();
}

#[test]
fn requesting_a_member_blocked_by_a_different_live_suspending_member_is_expected_after() {
    // "b" is scanned first; a named request for "a" can't skip past it
    // without consuming it, since only one suspending member can be in
    // flight at a time.
    let mut reader = of_root::<OrderedArrays>(br#"{"b":[1],"a":[2]}"#).unwrap();
    let err = reader.request_member("a").unwrap_err();
    assert!(matches!(err, JsonProcessingError::Schema(_)));
}

struct Mixed;

impl Readable for Mixed {
    fn schema() -> Arc<TypeSchema> {
        squirrel_stream::schema_for::<Mixed>(|| {
            TypeSchema::builder()
                .member(
                    MemberBuilder::new(1, "x", ProcessingType::MappedValue)
                        .types(Types {
                            return_type: "i32",
                            collection_type: None,
                            key_type: None,
                            value_type: "i32",
                        })
                        .build(),
                )
                .member(
                    MemberBuilder::new(2, "a", ProcessingType::MappedStream)
                        .types(Types {
                            return_type: "Stream<i32>",
                            collection_type: Some(CollectionType::Stream),
                            key_type: None,
                            value_type: "i32",
                        })
                        .build(),
                )
                .build()
        })
    }
}

#[test]
fn requesting_an_absent_member_returns_absent() {
    let mut reader = of_root::<Mixed>(br#"{"x":5}"#).unwrap();
    assert!(matches!(reader.request_member("a").unwrap(), MemberRequestOutcome::Absent));
}

#[test]
fn a_non_suspending_member_scanned_ahead_while_searching_is_cached_for_a_later_request() {
    let mut reader = of_root::<Mixed>(br#"{"x":5,"a":[1]}"#).unwrap();
    assert!(matches!(reader.request_member("a").unwrap(), MemberRequestOutcome::Ready));
    for item in reader.consume_stream::<i32>().unwrap() {
        item.unwrap();
    }
    match reader.request_member("x").unwrap() {
        MemberRequestOutcome::Cached(Value::Number(n)) => assert_eq!(n.as_i64(), Some(5)),
        other => panic!("expected a cached value for 'x', got {other:?}"),
    }
}

#[test]
fn requesting_an_already_consumed_member_twice_is_already_accessed() {
    let mut reader = of_root::<Mixed>(br#"{"x":5}"#).unwrap();
    assert!(matches!(reader.request_member("x").unwrap(), MemberRequestOutcome::Ready));
    reader.consume_value::<i32>().unwrap();
    let err = reader.request_member("x").unwrap_err();
    assert!(matches!(err, JsonProcessingError::Schema(_)));
}

struct CappedList;

impl Readable for CappedList {
    fn schema() -> Arc<TypeSchema> {
        squirrel_stream::schema_for::<CappedList>(|| {
            TypeSchema::builder()
                .member(
                    MemberBuilder::new(1, "items", ProcessingType::MappedStream)
                        .types(Types {
                            return_type: "Stream<i32>",
                            collection_type: Some(CollectionType::Stream),
                            key_type: None,
                            value_type: "i32",
                        })
                        .max_occur(2)
                        .build(),
                )
                .build()
        })
    }
}

#[test]
fn breaching_max_occur_errors_on_the_offending_item_only() {
    let mut reader = of_root::<CappedList>(br#"{"items":[1,2,3]}"#).unwrap();
    reader.next_member().unwrap();
    let results: Vec<_> = reader.consume_stream::<i32>().unwrap().collect();
    assert_eq!(results.len(), 3);
    assert_eq!(*results[0].as_ref().unwrap(), 1);
    assert_eq!(*results[1].as_ref().unwrap(), 2);
    assert!(matches!(results[2], Err(JsonProcessingError::Constraint(_))));
}

struct Tagged;

impl Readable for Tagged {
    fn schema() -> Arc<TypeSchema> {
        squirrel_stream::schema_for::<Tagged>(|| {
            TypeSchema::builder()
                .member(
                    MemberBuilder::new(1, "tag", ProcessingType::MappedValue)
                        .types(Types {
                            return_type: "String",
                            collection_type: None,
                            key_type: None,
                            value_type: "String",
                        })
                        .default_value(Value::String("fallback".to_string()))
                        .build(),
                )
                .build()
        })
    }
}

#[test]
fn a_null_value_falls_back_to_the_declared_default() {
    let mut reader = of_root::<Tagged>(br#"{"tag":null}"#).unwrap();
    reader.next_member().unwrap();
    let tag = reader.consume_value::<String>().unwrap();
    assert_eq!(tag, "fallback");
    reader.finish().unwrap();
}

struct Named;

impl Readable for Named {
    fn schema() -> Arc<TypeSchema> {
        squirrel_stream::schema_for::<Named>(|| {
            TypeSchema::builder()
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
                .build()
        })
    }
}

#[test]
fn a_duplicate_member_key_is_rejected() {
    let mut reader = of_root::<Named>(br#"{"name":"a","name":"b"}"#).unwrap();
    let first = reader.next_member().unwrap().unwrap();
    assert_eq!(first.json_name, "name");
    reader.consume_value::<String>().unwrap();

    let err = reader.next_member().unwrap_err();
    assert!(matches!(err, JsonProcessingError::Schema(_)));
}

struct RequiredField;

impl Readable for RequiredField {
    fn schema() -> Arc<TypeSchema> {
        squirrel_stream::schema_for::<RequiredField>(|| {
            TypeSchema::builder()
                .member(
                    MemberBuilder::new(1, "name", ProcessingType::MappedValue)
                        .types(Types {
                            return_type: "String",
                            collection_type: None,
                            key_type: None,
                            value_type: "String",
                        })
                        .required()
                        .build(),
                )
                .build()
        })
    }
}

#[test]
fn a_missing_required_member_fails_min_occur_at_finish() {
    let mut reader = of_root::<RequiredField>(br#"{}"#).unwrap();
    assert!(reader.next_member().unwrap().is_none());
    let err = reader.finish().unwrap_err();
    assert!(matches!(err, JsonProcessingError::Constraint(_)));
}

struct WithCatchAll;

impl Readable for WithCatchAll {
    fn schema() -> Arc<TypeSchema> {
        squirrel_stream::schema_for::<WithCatchAll>(|| {
            TypeSchema::builder()
                .member(
                    MemberBuilder::new(1, "known", ProcessingType::MappedValue)
                        .types(Types {
                            return_type: "i32",
                            collection_type: None,
                            key_type: None,
                            value_type: "i32",
                        })
                        .build(),
                )
                .member(
                    MemberBuilder::new(2, "*", ProcessingType::RawValues)
                        .types(Types {
                            return_type: "Value",
                            collection_type: None,
                            key_type: None,
                            value_type: "Value",
                        })
                        .build(),
                )
                .build()
        })
    }
}

#[test]
fn an_unknown_member_is_dispatched_to_the_declared_raw_values_catch_all() {
    let mut reader = of_root::<WithCatchAll>(br#"{"known":1,"extra":"x","other":[1,2]}"#).unwrap();

    let known = reader.next_member().unwrap().unwrap();
    assert!(known.member.is_some());
    assert_eq!(reader.consume_value::<i32>().unwrap(), 1);

    let extra = reader.next_member().unwrap().unwrap();
    assert_eq!(extra.json_name, "extra");
    assert!(
        extra.member.as_ref().is_some_and(|m| m.processing_type == ProcessingType::RawValues),
        "unknown member should have been bound to the RawValues catch-all"
    );
    assert_eq!(reader.consume_raw().unwrap(), Value::String("x".to_string()));

    let other = reader.next_member().unwrap().unwrap();
    assert_eq!(other.json_name, "other");
    assert!(other.member.as_ref().is_some_and(|m| m.processing_type == ProcessingType::RawValues));
    let other_value = reader.consume_raw().unwrap();
    assert_eq!(
        other_value,
        Value::List(vec![
            Value::Number(squirrel_stream::Number::I32(1)),
            Value::Number(squirrel_stream::Number::I32(2)),
        ])
    );

    reader.finish().unwrap();
}
