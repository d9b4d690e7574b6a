//! Swagger documents and the lookups the request layer performs on them.
//!
//! - `spec`: serde model of a Swagger 2.0 document
//! - `route`: `"tag.operationId"` → route definition
//! - `schema_key`: route + status → entity-graph root key

mod route;
mod schema_key;
mod spec;

pub use route::{RouteDefinition, resolve_route, split_operation_id};
pub use schema_key::{SchemaKey, lowercase_first, resolve_schema_key};
pub use spec::{
    CollectionFormat, HttpMethod, Info, MediaType, Operation, Parameter, ParameterLocation,
    PathItem, Paths, Response, SchemaRef, SwaggerDocument,
};
