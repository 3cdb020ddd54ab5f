//! Coverage for `of`, the entry point for a document that's itself a
//! top-level array or object rather than a single schema-bound object.

use std::sync::Arc;

use squirrel_stream::{of, MemberBuilder, ProcessingType, Readable, TypeSchema, Types};

struct Track {
    id: String,
    title: String,
}

impl Readable for Track {
    fn schema() -> Arc<TypeSchema> {
        squirrel_stream::schema_for::<Track>(|| {
            TypeSchema::builder()
                .member(
                    MemberBuilder::new(0, "id", ProcessingType::MappedValue)
                        .key()
                        .types(Types {
                            return_type: "String",
                            collection_type: None,
                            key_type: None,
                            value_type: "String",
                        })
                        .required()
                        .build(),
                )
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
fn reads_a_top_level_array_of_proxied_objects() {
    let mut seq =
        of::<Track>(br#"[{"id":"t1","title":"Airbag"},{"id":"t2","title":"Subterranean"}]"#).unwrap();
    let mut tracks = Vec::new();
    while seq.next_item().unwrap().is_some() {
        let mut id = None;
        let mut title = None;
        while let Some(pending) = seq.next_member().unwrap() {
            match pending.json_name.as_str() {
                "id" => id = Some(seq.consume_value::<String>().unwrap()),
                "title" => title = Some(seq.consume_value::<String>().unwrap()),
                _ => seq.skip_value().unwrap(),
            }
        }
        seq.finish_item().unwrap();
        tracks.push((id.unwrap(), title.unwrap()));
    }
    assert_eq!(
        tracks,
        vec![
            ("t1".to_string(), "Airbag".to_string()),
            ("t2".to_string(), "Subterranean".to_string()),
        ]
    );
}

#[test]
fn reads_a_top_level_object_as_a_map_binding_the_key_member() {
    let mut seq = of::<Track>(br#"{"t1":{"title":"Airbag"},"t2":{"title":"Subterranean"}}"#).unwrap();
    let mut tracks = Vec::new();
    while seq.next_item().unwrap().is_some() {
        let key: String = seq.consume_entry_key().unwrap();
        let mut title = None;
        while let Some(pending) = seq.next_member().unwrap() {
            match pending.json_name.as_str() {
                "title" => title = Some(seq.consume_value::<String>().unwrap()),
                _ => seq.skip_value().unwrap(),
            }
        }
        seq.finish_item().unwrap();
        tracks.push((key, title.unwrap()));
    }
    assert_eq!(
        tracks,
        vec![
            ("t1".to_string(), "Airbag".to_string()),
            ("t2".to_string(), "Subterranean".to_string()),
        ]
    );
}
