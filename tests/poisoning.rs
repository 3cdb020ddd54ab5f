//! Dropping a lazy sequence before it reaches a clean terminal state must
//! poison its parent frame: the tokenizer is left mid-element, so any
//! further read on or above that frame has to fail rather than guess.

use std::sync::Arc;

use squirrel_stream::{
    of_root, CollectionType, JsonProcessingError, MemberBuilder, ProcessingType, Readable, TypeSchema, Types,
};

struct Listy;

impl Readable for Listy {
    fn schema() -> Arc<TypeSchema> {
        squirrel_stream::schema_for::<Listy>(|| {
            TypeSchema::builder()
                .member(
                    MemberBuilder::new(1, "items", ProcessingType::MappedStream)
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
fn a_partially_drained_sequence_poisons_the_parent_frame() {
    let mut reader = of_root::<Listy>(br#"{"items":[1,2,3]}"#).unwrap();
    let pending = reader.next_member().unwrap().unwrap();
    assert_eq!(pending.json_name, "items");

    {
        let mut stream = reader.consume_stream::<i32>().unwrap();
        assert_eq!(stream.next().unwrap().unwrap(), 1);
        // `stream` is dropped here with two more array elements unread.
    }

    let err = reader.next_member().unwrap_err();
    assert!(matches!(err, JsonProcessingError::Schema(_)));
}

#[test]
fn fully_draining_a_sequence_leaves_the_parent_frame_usable() {
    let mut reader = of_root::<Listy>(br#"{"items":[1,2,3]}"#).unwrap();
    reader.next_member().unwrap();
    for item in reader.consume_stream::<i32>().unwrap() {
        item.unwrap();
    }

    assert!(reader.next_member().unwrap().is_none());
    reader.finish().unwrap();
}
