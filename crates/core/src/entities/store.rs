//! Flat entity store: table → id → attributes.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Attributes of one stored entity, with nested entities replaced by ids.
pub type EntityRecord = Map<String, Value>;

/// One table of the store, keyed by entity id.
pub type EntityTable = BTreeMap<String, EntityRecord>;

/// Normalized entities keyed by table, then by id.
///
/// Serializes as `{ "<table>": { "<id>": { ... } } }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityStore {
    tables: BTreeMap<String, EntityTable>,
}

impl EntityStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entity, shallow-merging into an existing one with the same id.
    ///
    /// Fields present in `record` overwrite; fields it omits are kept.
    pub fn upsert(&mut self, table: &str, id: impl Into<String>, record: EntityRecord) {
        let table = self.tables.entry(table.to_string()).or_default();
        match table.entry(id.into()) {
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
            Entry::Occupied(mut slot) => {
                let existing = slot.get_mut();
                for (field, value) in record {
                    existing.insert(field, value);
                }
            }
        }
    }

    /// Merge another store into this one; the other store's fields win.
    ///
    /// Ids present only here are untouched.
    pub fn merge(&mut self, other: EntityStore) {
        for (table, entities) in other.tables {
            for (id, record) in entities {
                self.upsert(&table, id, record);
            }
        }
    }

    /// One entity.
    pub fn get(&self, table: &str, id: &str) -> Option<&EntityRecord> {
        self.tables.get(table)?.get(id)
    }

    /// One table.
    pub fn table(&self, table: &str) -> Option<&EntityTable> {
        self.tables.get(table)
    }

    /// Table names and their entities, sorted by table name.
    pub fn tables(&self) -> impl Iterator<Item = (&str, &EntityTable)> {
        self.tables.iter().map(|(name, table)| (name.as_str(), table))
    }

    /// Whether the store holds no entities.
    pub fn is_empty(&self) -> bool {
        self.tables.values().all(BTreeMap::is_empty)
    }

    /// Number of stored entities across all tables.
    pub fn len(&self) -> usize {
        self.tables.values().map(BTreeMap::len).sum()
    }

    /// The store as a JSON value.
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.tables
                .iter()
                .map(|(name, table)| {
                    let entities = table
                        .iter()
                        .map(|(id, record)| (id.clone(), Value::Object(record.clone())))
                        .collect();
                    (name.clone(), Value::Object(entities))
                })
                .collect(),
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> EntityRecord {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn test_upsert_merges_shallowly() {
        let mut store = EntityStore::new();
        store.upsert("mtoAgents", "a1", record(json!({"id": "a1", "firstName": "Jo", "phone": "555"})));
        store.upsert("mtoAgents", "a1", record(json!({"id": "a1", "firstName": "Jane"})));

        assert_eq!(
            Value::Object(store.get("mtoAgents", "a1").unwrap().clone()),
            json!({"id": "a1", "firstName": "Jane", "phone": "555"})
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_merge_keeps_unrelated_ids() {
        let mut first = EntityStore::new();
        first.upsert("moves", "m1", record(json!({"id": "m1", "status": "DRAFT"})));
        first.upsert("moves", "m2", record(json!({"id": "m2", "status": "SUBMITTED"})));

        let mut second = EntityStore::new();
        second.upsert("moves", "m1", record(json!({"id": "m1", "status": "APPROVED"})));
        second.upsert("orders", "o1", record(json!({"id": "o1"})));

        first.merge(second);
        assert_eq!(first.get("moves", "m1").unwrap()["status"], json!("APPROVED"));
        assert_eq!(first.get("moves", "m2").unwrap()["status"], json!("SUBMITTED"));
        assert!(first.get("orders", "o1").is_some());
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn test_serializes_as_nested_maps() {
        let mut store = EntityStore::new();
        store.upsert("shipments", "abcd-1234", record(json!({"id": "abcd-1234"})));
        assert_eq!(
            serde_json::to_value(&store).unwrap(),
            json!({"shipments": {"abcd-1234": {"id": "abcd-1234"}}})
        );
        assert_eq!(store.to_json(), serde_json::to_value(&store).unwrap());
        assert!(!store.is_empty());
        assert!(EntityStore::new().is_empty());
    }
}
