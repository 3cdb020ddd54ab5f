//! End-to-end coverage for the two lazy-sequence continuations: a plain
//! array of scalars, and an object treated as an ordered map.

use std::sync::Arc;

use squirrel_stream::{of_root, CollectionType, MemberBuilder, ProcessingType, Readable, TypeSchema, Types};

struct NumberList;

impl Readable for NumberList {
    fn schema() -> Arc<TypeSchema> {
        squirrel_stream::schema_for::<NumberList>(|| {
            TypeSchema::builder()
                .member(
                    MemberBuilder::new(1, "values", ProcessingType::MappedStream)
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
fn sums_a_streamed_array_of_integers() {
    let mut reader = of_root::<NumberList>(br#"{"values":[1,2,3,4,5]}"#).unwrap();
    let mut sum = 0i64;
    while let Some(pending) = reader.next_member().unwrap() {
        match pending.json_name.as_str() {
            "values" => {
                let stream = reader.consume_stream::<i32>().unwrap();
                for item in stream {
                    sum += item.unwrap() as i64;
                }
            }
            _ => reader.skip_value().unwrap(),
        }
    }
    reader.finish().unwrap();
    assert_eq!(sum, 15);
}

struct ScoreMap;

impl Readable for ScoreMap {
    fn schema() -> Arc<TypeSchema> {
        squirrel_stream::schema_for::<ScoreMap>(|| {
            TypeSchema::builder()
                .member(
                    MemberBuilder::new(1, "scores", ProcessingType::MappedStream)
                        .types(Types {
                            return_type: "Stream<(String, i32)>",
                            collection_type: Some(CollectionType::Map),
                            key_type: Some("String"),
                            value_type: "i32",
                        })
                        .build(),
                )
                .build()
        })
    }
}

#[test]
fn consumes_an_object_as_a_map_preserving_order() {
    let mut reader = of_root::<ScoreMap>(br#"{"scores":{"alice":10,"bob":20}}"#).unwrap();
    let mut entries = Vec::new();
    while let Some(pending) = reader.next_member().unwrap() {
        match pending.json_name.as_str() {
            "scores" => {
                let stream = reader.consume_map_stream::<i32>().unwrap();
                for entry in stream {
                    entries.push(entry.unwrap());
                }
            }
            _ => reader.skip_value().unwrap(),
        }
    }
    reader.finish().unwrap();
    assert_eq!(entries, vec![("alice".to_string(), 10), ("bob".to_string(), 20)]);
}

struct TrackList;

impl Readable for TrackList {
    fn schema() -> Arc<TypeSchema> {
        squirrel_stream::schema_for::<TrackList>(|| {
            TypeSchema::builder()
                .member(
                    MemberBuilder::new(1, "tracks", ProcessingType::ProxyStream)
                        .types(Types {
                            return_type: "Stream<Track>",
                            collection_type: Some(CollectionType::Stream),
                            key_type: None,
                            value_type: "Track",
                        })
                        .build(),
                )
                .build()
        })
    }
}

struct Track;

impl Readable for Track {
    fn schema() -> Arc<TypeSchema> {
        squirrel_stream::schema_for::<Track>(|| {
            TypeSchema::builder()
                .member(
                    MemberBuilder::new(1, "title", ProcessingType::MappedValue)
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
fn streams_proxied_objects_one_item_at_a_time() {
    let mut reader =
        of_root::<TrackList>(br#"{"tracks":[{"title":"Airbag"},{"title":"Subterranean"}]}"#).unwrap();
    let mut titles = Vec::new();
    while let Some(pending) = reader.next_member().unwrap() {
        match pending.json_name.as_str() {
            "tracks" => {
                let mut stream = reader.consume_proxy_stream::<Track>().unwrap();
                while stream.next_item().unwrap().is_some() {
                    while let Some(track_member) = stream.engine_mut().next_member().unwrap() {
                        match track_member.json_name.as_str() {
                            "title" => titles.push(stream.engine_mut().consume_value::<String>().unwrap()),
                            _ => stream.engine_mut().skip_value().unwrap(),
                        }
                    }
                    stream.finish_item().unwrap();
                }
            }
            _ => reader.skip_value().unwrap(),
        }
    }
    reader.finish().unwrap();
    assert_eq!(titles, vec!["Airbag".to_string(), "Subterranean".to_string()]);
}
