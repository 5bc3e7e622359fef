//! JSON ingestion: each scalar becomes a constant of the appropriate
//! seed type; arrays and objects become compositions; object keys are
//! themselves compositions of codepoints, addressed like any other
//! string value.

use serde_json::Value;
use substrate_core::node::{CompositionGeometry, NodeHandle};
use substrate_core::point::Point4;
use substrate_core::seed::Seed;
use substrate_core::store::{ChildRun, NodeStore};
use substrate_core::Result;

use super::compose_rle;

/// Ingests a parsed JSON value, returning its root node.
pub fn ingest_json<S: NodeStore>(store: &S, value: &Value) -> Result<NodeHandle> {
    match value {
        Value::Null => store.get_or_insert_composition(&[], None, CompositionGeometry::Point(Point4::new(0.0, 0.0, 0.0, 1.0))),
        Value::Bool(b) => store.get_or_insert_constant(Seed::Integer64(i64::from(*b))),
        Value::Number(n) => ingest_number(store, n),
        Value::String(s) => ingest_string(store, s),
        Value::Array(items) => ingest_array(store, items),
        Value::Object(map) => ingest_object(store, map),
    }
}

fn ingest_number<S: NodeStore>(store: &S, n: &serde_json::Number) -> Result<NodeHandle> {
    if let Some(i) = n.as_i64() {
        store.get_or_insert_constant(Seed::Integer64(i))
    } else {
        let f = n.as_f64().unwrap_or(f64::NAN);
        store.get_or_insert_constant(Seed::Float64Bits(f.to_bits()))
    }
}

/// Builds a flat, RLE-compressed composition of codepoint constants.
/// Used for both string values and object keys.
pub(crate) fn ingest_string<S: NodeStore>(store: &S, s: &str) -> Result<NodeHandle> {
    if s.is_empty() {
        return store.get_or_insert_composition(&[], None, CompositionGeometry::Point(Point4::new(0.0, 0.0, 0.0, 1.0)));
    }
    let handles: Result<Vec<NodeHandle>> = s
        .chars()
        .map(|c| store.get_or_insert_constant(Seed::codepoint(c as u32)?))
        .collect();
    let handles = handles?;
    if handles.len() == 1 {
        return Ok(handles[0]);
    }
    compose_rle(store, &handles, None)
}

fn ingest_array<S: NodeStore>(store: &S, items: &[Value]) -> Result<NodeHandle> {
    if items.is_empty() {
        return store.get_or_insert_composition(&[], None, CompositionGeometry::Point(Point4::new(0.0, 0.0, 0.0, 1.0)));
    }
    let handles: Result<Vec<NodeHandle>> = items.iter().map(|v| ingest_json(store, v)).collect();
    let handles = handles?;
    if handles.len() == 1 {
        return Ok(handles[0]);
    }
    compose_rle(store, &handles, None)
}

fn ingest_object<S: NodeStore>(store: &S, map: &serde_json::Map<String, Value>) -> Result<NodeHandle> {
    if map.is_empty() {
        return store.get_or_insert_composition(&[], None, CompositionGeometry::Point(Point4::new(0.0, 0.0, 0.0, 1.0)));
    }

    let mut entries = Vec::with_capacity(map.len());
    for (key, value) in map {
        let key_handle = ingest_string(store, key)?;
        let value_handle = ingest_json(store, value)?;
        let pair_runs = [
            ChildRun {
                child: key_handle.node,
                content_hash: key_handle.content_hash,
                multiplicity: 1,
            },
            ChildRun {
                child: value_handle.node,
                content_hash: value_handle.content_hash,
                multiplicity: 1,
            },
        ];
        let entry = store.get_or_insert_composition(
            &pair_runs,
            None,
            CompositionGeometry::Trajectory(vec![key_handle.position, value_handle.position]),
        )?;
        entries.push(entry);
    }

    if entries.len() == 1 {
        return Ok(entries[0]);
    }
    compose_rle(store, &entries, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use substrate_test_support::InMemoryStore;

    #[test]
    fn identical_objects_yield_the_same_root_regardless_of_key_order() {
        let store = InMemoryStore::new();
        let a = ingest_json(&store, &json!({"a": 1, "b": 2})).unwrap();
        let b = ingest_json(&store, &json!({"a": 1, "b": 2})).unwrap();
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn array_of_scalars_ingests() {
        let store = InMemoryStore::new();
        let handle = ingest_json(&store, &json!([1, 2, 3])).unwrap();
        let children = store.composition_children(handle.id()).unwrap();
        assert_eq!(children.len(), 3);
    }

    #[test]
    fn shared_strings_across_values_dedup() {
        let store = InMemoryStore::new();
        let a = ingest_string(&store, "hello").unwrap();
        let b = ingest_string(&store, "hello").unwrap();
        assert_eq!(a.id(), b.id());
    }
}
