//! Fuzzes the tokenizer/value-mapper round trip against `serde_json` as an
//! oracle: a pseudo-randomly generated document is read once through this
//! crate's raw-value path and once through `serde_json`, and the two
//! results must agree structurally.
//!
//! Requires the `serde_json` feature (`cargo test --features serde_json`)
//! for [`squirrel_stream::Value::to_json`].

#![cfg(feature = "serde_json")]

mod support;

use std::sync::Arc;

use squirrel_stream::{of_root, Readable, TypeSchema};

/// No declared members: every key in the document is captured as a raw
/// value instead of being dispatched through a typed mapper.
struct CatchAll;

impl Readable for CatchAll {
    fn schema() -> Arc<TypeSchema> {
        squirrel_stream::schema_for::<CatchAll>(|| TypeSchema::builder().build())
    }
}

#[test]
fn random_documents_read_as_raw_values_match_serde_json() {
    for _ in 0..50 {
        let text = support::random_document(6);
        let expected: serde_json::Value =
            serde_json::from_str(&text).expect("generator must always produce valid JSON");

        let mut reader = of_root::<CatchAll>(text.as_bytes()).unwrap();
        let mut actual = serde_json::Map::new();
        while let Some(pending) = reader.next_member().unwrap() {
            let value = reader.consume_raw().unwrap();
            actual.insert(pending.json_name, value.to_json());
        }
        reader.finish().unwrap();

        assert_eq!(serde_json::Value::Object(actual), expected, "document was: {text}");
    }
}
