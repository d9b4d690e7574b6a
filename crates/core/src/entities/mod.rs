//! Entity schema graph, normalizer and the flat store it produces.

mod graph;
mod normalize;
mod store;

pub use graph::{
    Cardinality, DEFAULT_ID_ATTRIBUTE, EntityType, Relation, SchemaShape, root_schema, schema_keys,
};
pub use normalize::{Normalized, normalize};
pub use store::{EntityRecord, EntityStore, EntityTable};
