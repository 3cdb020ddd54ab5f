/*!
Process-wide schema cache.

Deriving a [`TypeSchema`] is meant to happen once per Rust type, not once per
parse, so it's memoized process-wide in a compute-if-absent map keyed by
[`TypeId`], built lazily behind `once_cell` rather than requiring callers to
initialize it up front.
*/

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;

use crate::schema::TypeSchema;

static CACHE: Lazy<RwLock<HashMap<TypeId, Arc<TypeSchema>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Returns the cached schema for `T`, building it with `build` on first
/// access. Concurrent first accesses from different threads may each run
/// `build` once before the winner's result is installed; this only costs
/// redundant work, since `build` is expected to be pure.
pub fn schema_for<T: Any>(build: impl FnOnce() -> TypeSchema) -> Arc<TypeSchema> {
    let type_id = TypeId::of::<T>();

    if let Some(schema) = CACHE.read().unwrap().get(&type_id) {
        return Arc::clone(schema);
    }

    let built = Arc::new(build());
    let mut cache = CACHE.write().unwrap();
    Arc::clone(cache.entry(type_id).or_insert(built))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{MemberBuilder, ProcessingType, Types};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Widget;

    static BUILD_COUNT: AtomicUsize = AtomicUsize::new(0);

    fn build_widget_schema() -> TypeSchema {
        BUILD_COUNT.fetch_add(1, Ordering::SeqCst);
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
    }

    #[test]
    fn schema_is_built_once_and_reused() {
        let before = BUILD_COUNT.load(Ordering::SeqCst);
        let a = schema_for::<Widget>(build_widget_schema);
        let b = schema_for::<Widget>(build_widget_schema);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(BUILD_COUNT.load(Ordering::SeqCst), before + 1);
    }
}
