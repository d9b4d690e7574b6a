//! Normalization from nested response payloads to a flat entity store.
//!
//! The walk is guided by a [`SchemaShape`]: every node declared as an entity
//! is stored under its table and id, and replaced in its parent by that id.
//! Entities are collected into a store owned by the call, so a failed walk
//! leaves nothing behind.

use serde_json::{Map, Value};

use super::graph::{Cardinality, EntityType, Relation, SchemaShape};
use super::store::EntityStore;
use crate::error::NormalizeError;

/// Output of a normalization pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    /// The root with entities replaced by ids (an id, an array of ids, or an object).
    pub result: Value,
    /// Every entity found, keyed by table and id.
    pub entities: EntityStore,
}

/// Normalize a payload against a root shape.
pub fn normalize(body: &Value, shape: SchemaShape) -> Result<Normalized, NormalizeError> {
    let mut entities = EntityStore::new();
    let root = Walk { path: "$".to_string() };
    let result = match shape {
        SchemaShape::Entity(entity) => root.entity(body, entity, &mut entities)?,
        SchemaShape::List(entity) => root.list(body, entity, &mut entities)?,
        SchemaShape::Object(relations) => root.object(body, relations, &mut entities)?,
    };
    Ok(Normalized { result, entities })
}

/// Current location in the payload, for error messages.
struct Walk {
    path: String,
}

impl Walk {
    fn field(&self, name: &str) -> Self {
        Self {
            path: format!("{}.{name}", self.path),
        }
    }

    fn index(&self, index: usize) -> Self {
        Self {
            path: format!("{}[{index}]", self.path),
        }
    }

    fn entity(
        &self,
        node: &Value,
        entity: EntityType,
        store: &mut EntityStore,
    ) -> Result<Value, NormalizeError> {
        let fields = match node {
            Value::Object(fields) => fields,
            // Already a reference (or explicitly empty).
            Value::Null | Value::String(_) | Value::Number(_) | Value::Bool(_) => {
                return Ok(node.clone());
            }
            Value::Array(_) => return Err(self.unexpected("object", node)),
        };

        let id_value = fields.get(entity.id_attribute());
        let Some(id) = id_value.and_then(id_key) else {
            return Err(NormalizeError::MissingId {
                table: entity.table(),
                id_attribute: entity.id_attribute(),
                path: self.path.clone(),
            });
        };

        let mut flat = fields.clone();
        self.replace_relations(&mut flat, entity.relations(), store)?;
        store.upsert(entity.table(), id, flat);

        Ok(id_value.cloned().unwrap_or(Value::Null))
    }

    fn list(
        &self,
        node: &Value,
        entity: EntityType,
        store: &mut EntityStore,
    ) -> Result<Value, NormalizeError> {
        match node {
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| self.index(i).entity(item, entity, store))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Value::Null => Ok(Value::Null),
            _ => Err(self.unexpected("array", node)),
        }
    }

    fn object(
        &self,
        node: &Value,
        relations: &[Relation],
        store: &mut EntityStore,
    ) -> Result<Value, NormalizeError> {
        match node {
            Value::Object(fields) => {
                let mut flat = fields.clone();
                self.replace_relations(&mut flat, relations, store)?;
                Ok(Value::Object(flat))
            }
            _ => Err(self.unexpected("object", node)),
        }
    }

    fn replace_relations(
        &self,
        fields: &mut Map<String, Value>,
        relations: &[Relation],
        store: &mut EntityStore,
    ) -> Result<(), NormalizeError> {
        for relation in relations {
            let Some(nested) = fields.get(relation.field) else {
                continue;
            };
            let walk = self.field(relation.field);
            let reference = match relation.cardinality {
                Cardinality::One => walk.entity(nested, relation.target, store)?,
                Cardinality::Many => walk.list(nested, relation.target, store)?,
            };
            fields.insert(relation.field.to_string(), reference);
        }
        Ok(())
    }

    fn unexpected(&self, expected: &'static str, found: &Value) -> NormalizeError {
        NormalizeError::UnexpectedShape {
            path: self.path.clone(),
            expected,
            found: kind(found),
        }
    }
}

/// Storage key for an identity value; strings and numbers only.
fn id_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
