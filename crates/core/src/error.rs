//! Error types for every failure mode of the request layer.
//!
//! Configuration errors (unknown operation, missing route, missing schema) are
//! programmer errors and signal that the portal and the backend specs drifted.
//! Call errors carry the underlying transport failure or the full non-success
//! response untouched. Normalization errors fail a single request only.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::client::ApiResponse;
use crate::surface::Surface;

/// Failure to load or validate a surface's Swagger document.
///
/// The registry memoizes this outcome, so it is fatal to every later
/// operation on the same surface.
#[derive(Debug, Error)]
pub enum SpecLoadError {
    /// The Swagger document URL could not be built from the configured base URL.
    #[error("Invalid {surface} API spec URL {url}: {source}")]
    InvalidUrl {
        /// Surface being loaded.
        surface: Surface,
        /// URL that failed to parse.
        url: String,
        /// Parser error.
        source: url::ParseError,
    },
    /// The document request never produced a response.
    #[error("Failed to fetch {surface} API spec from {url}: {source}")]
    Fetch {
        /// Surface being loaded.
        surface: Surface,
        /// Spec URL.
        url: String,
        /// Transport error.
        source: reqwest::Error,
    },
    /// The document endpoint answered with a non-success status.
    #[error("Failed to fetch {surface} API spec from {url}: HTTP {status}")]
    Status {
        /// Surface being loaded.
        surface: Surface,
        /// Spec URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },
    /// The document is not valid YAML/JSON or not a Swagger document.
    #[error("Failed to parse {surface} API spec: {source}")]
    Parse {
        /// Surface being loaded.
        surface: Surface,
        /// Deserialization error.
        source: serde_yaml::Error,
    },
    /// Two operations share the same `tag.operationId` pair.
    #[error(
        "Duplicate operation '{operation_id}' in {surface} API spec ({first} and {second})"
    )]
    DuplicateOperation {
        /// Surface being loaded.
        surface: Surface,
        /// The ambiguous operation identifier.
        operation_id: String,
        /// Route of the first declaration, e.g. `GET /shipments/{id}`.
        first: String,
        /// Route of the conflicting declaration.
        second: String,
    },
}

/// Failure while invoking a single operation.
#[derive(Debug, Error)]
pub enum CallError {
    /// The client has no operation registered under this identifier.
    #[error("Operation '{0}' is not registered on this client")]
    UnknownOperation(String),
    /// A required parameter was not supplied; no request was sent.
    #[error("Operation '{operation_id}' is missing required parameter '{name}'")]
    MissingParameter {
        /// Operation identifier.
        operation_id: String,
        /// Parameter name.
        name: String,
    },
    /// A supplied parameter could not be encoded.
    #[error("Operation '{operation_id}' has an invalid value for '{name}': {reason}")]
    InvalidParameter {
        /// Operation identifier.
        operation_id: String,
        /// Parameter name.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },
    /// The operation URL could not be assembled.
    #[error("Invalid URL for operation '{operation_id}': {reason}")]
    InvalidUrl {
        /// Operation identifier.
        operation_id: String,
        /// Why the URL was rejected.
        reason: String,
    },
    /// Network or protocol failure reported by the HTTP client.
    #[error("Request for operation '{operation_id}' failed: {source}")]
    Http {
        /// Operation identifier.
        operation_id: String,
        /// Transport error.
        source: reqwest::Error,
    },
    /// The backend answered with a non-success status.
    #[error("Operation '{operation_id}' failed with HTTP {}", .response.status)]
    Status {
        /// Operation identifier.
        operation_id: String,
        /// The full response, unmodified.
        response: Box<ApiResponse>,
    },
}

impl CallError {
    /// HTTP status of the failed call, when the backend answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            CallError::Status { response, .. } => Some(response.status),
            CallError::Http { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// The non-success response, when the backend answered.
    pub fn response(&self) -> Option<&ApiResponse> {
        match self {
            CallError::Status { response, .. } => Some(response),
            _ => None,
        }
    }
}

/// Failure while flattening a payload into an entity store.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    /// An entity node has no usable identity value.
    #[error("{table} entity at {path} has no '{id_attribute}' value")]
    MissingId {
        /// Entity table of the node.
        table: &'static str,
        /// Identity attribute that was looked up.
        id_attribute: &'static str,
        /// Location of the node in the payload.
        path: String,
    },
    /// A node does not have the container shape the schema declares.
    #[error("Expected {expected} at {path}, found {found}")]
    UnexpectedShape {
        /// Location of the node in the payload.
        path: String,
        /// Shape the schema declares.
        expected: &'static str,
        /// Shape actually found.
        found: &'static str,
    },
    /// The response body is binary or empty.
    #[error("Response body is not JSON and cannot be normalized")]
    NotJson,
}

/// Failure of a facade request, distinguishable per failure mode.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The client has no callable for the operation identifier.
    #[error("Operation '{0}' does not exist")]
    OperationNotFound(String),
    /// The document has no route for an operation the client could call.
    #[error("No route definition found for operation '{0}'")]
    RouteNotFound(String),
    /// The response status has no schema pointer to derive a key from.
    #[error("No schema found for operation '{operation_id}' with status {status}")]
    SchemaKeyUnresolved {
        /// Operation identifier.
        operation_id: String,
        /// Response status that was looked up.
        status: u16,
    },
    /// The schema key is not a root of the entity schema graph.
    #[error("No schema found for key '{key}' (operation '{operation_id}')")]
    SchemaNotFound {
        /// Operation identifier.
        operation_id: String,
        /// Resolved or caller-supplied schema key.
        key: String,
    },
    /// The operation call failed; the underlying error is kept intact.
    #[error(transparent)]
    Call(#[from] CallError),
    /// The response could not be normalized.
    #[error("Failed to normalize response of '{operation_id}': {source}")]
    Normalize {
        /// Operation identifier.
        operation_id: String,
        /// Normalizer error.
        source: NormalizeError,
    },
    /// The surface's client could not be built.
    #[error(transparent)]
    SpecLoad(#[from] Arc<SpecLoadError>),
}

impl RequestError {
    /// Whether the error means the portal and backend specs have drifted.
    ///
    /// These are never worth retrying.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            RequestError::OperationNotFound(_)
                | RequestError::RouteNotFound(_)
                | RequestError::SchemaKeyUnresolved { .. }
                | RequestError::SchemaNotFound { .. }
        )
    }
}

/// Failure to load the portal configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        /// Configuration file path.
        path: PathBuf,
        /// I/O error.
        source: std::io::Error,
    },
    /// The configuration file is not valid TOML for [`crate::PortalConfig`].
    #[error("Failed to parse config file {}: {source}", .path.display())]
    Parse {
        /// Configuration file path.
        path: PathBuf,
        /// TOML error.
        source: toml::de::Error,
    },
    /// The base URL is not an absolute URL.
    #[error("Invalid base URL '{value}': {source}")]
    InvalidBaseUrl {
        /// Offending value.
        value: String,
        /// Parser error.
        source: url::ParseError,
    },
}
