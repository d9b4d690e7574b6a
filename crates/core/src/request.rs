//! The request facade: call an operation, then normalize its response.

use serde_json::Value;
use tracing::{debug, error};

use crate::client::{ApiResponse, OperationClient, Params, ResponseBody};
use crate::entities::{EntityStore, normalize, root_schema};
use crate::error::{NormalizeError, RequestError};
use crate::swagger::{resolve_route, resolve_schema_key};

/// Per-request behavior of [`request`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOptions {
    /// Normalize the response body into an [`EntityStore`].
    pub normalize: bool,
    /// Schema key to use instead of the one derived from the response.
    pub schema_key: Option<String>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            normalize: true,
            schema_key: None,
        }
    }
}

impl RequestOptions {
    /// Return the response body as received.
    pub fn raw() -> Self {
        Self {
            normalize: false,
            schema_key: None,
        }
    }

    /// Normalize against `key` regardless of the response definition.
    pub fn with_schema_key(mut self, key: impl Into<String>) -> Self {
        self.schema_key = Some(key.into());
        self
    }
}

/// Result of a facade request.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Normalized entities.
    Entities(EntityStore),
    /// Response body untouched.
    Raw(ResponseBody),
}

impl Payload {
    /// The entity store, for normalized payloads.
    pub fn entities(&self) -> Option<&EntityStore> {
        match self {
            Payload::Entities(store) => Some(store),
            Payload::Raw(_) => None,
        }
    }

    /// Consume into the entity store, for normalized payloads.
    pub fn into_entities(self) -> Option<EntityStore> {
        match self {
            Payload::Entities(store) => Some(store),
            Payload::Raw(_) => None,
        }
    }

    /// The untouched body, for raw payloads.
    pub fn raw(&self) -> Option<&ResponseBody> {
        match self {
            Payload::Raw(body) => Some(body),
            Payload::Entities(_) => None,
        }
    }

    /// JSON rendering: the store, the raw JSON body, or `null` for binary
    /// and empty bodies.
    pub fn to_json(&self) -> Value {
        match self {
            Payload::Entities(store) => store.to_json(),
            Payload::Raw(ResponseBody::Json(value)) => value.clone(),
            Payload::Raw(ResponseBody::Binary(_) | ResponseBody::Empty) => Value::Null,
        }
    }
}

/// Invoke an operation and normalize its response.
///
/// Fails without a network call when the client has no such operation.
/// With `options.normalize` off the body is returned as received; otherwise
/// the schema key (explicit or derived from the response status) must name a
/// root of the entity graph.
pub async fn request<C: OperationClient>(
    client: &C,
    operation_id: &str,
    params: &Params,
    options: &RequestOptions,
) -> Result<Payload, RequestError> {
    let response = call(client, operation_id, params).await?;

    let Some(route) = resolve_route(&client.document().paths, operation_id) else {
        error!(surface = %client.surface(), operation = operation_id, "No route definition for operation.");
        return Err(RequestError::RouteNotFound(operation_id.to_string()));
    };

    let schema_key = match &options.schema_key {
        Some(key) => Some(key.clone()),
        None => resolve_schema_key(&route, response.status).map(|key| key.as_str().to_string()),
    };

    if !options.normalize {
        return Ok(Payload::Raw(response.body));
    }

    let Some(key) = schema_key else {
        return Err(RequestError::SchemaKeyUnresolved {
            operation_id: operation_id.to_string(),
            status: response.status,
        });
    };
    let Some(shape) = root_schema(&key) else {
        error!(surface = %client.surface(), operation = operation_id, schema_key = %key, "No schema found for key.");
        return Err(RequestError::SchemaNotFound {
            operation_id: operation_id.to_string(),
            key,
        });
    };

    let normalize_error = |source: NormalizeError| RequestError::Normalize {
        operation_id: operation_id.to_string(),
        source,
    };
    let body = response
        .body
        .as_json()
        .ok_or_else(|| normalize_error(NormalizeError::NotJson))?;
    let normalized = normalize(body, shape).map_err(normalize_error)?;
    debug!(
        surface = %client.surface(),
        operation = operation_id,
        schema_key = %key,
        entities = normalized.entities.len(),
        "Normalized response."
    );
    Ok(Payload::Entities(normalized.entities))
}

/// Invoke an operation and return the full response, success only.
///
/// Skips route and schema resolution entirely.
pub async fn request_raw<C: OperationClient>(
    client: &C,
    operation_id: &str,
    params: &Params,
) -> Result<ApiResponse, RequestError> {
    call(client, operation_id, params).await
}

async fn call<C: OperationClient>(
    client: &C,
    operation_id: &str,
    params: &Params,
) -> Result<ApiResponse, RequestError> {
    if !client.contains(operation_id) {
        error!(surface = %client.surface(), operation = operation_id, "Operation does not exist.");
        return Err(RequestError::OperationNotFound(operation_id.to_string()));
    }

    client.call(operation_id, params).await.map_err(|err| {
        error!(
            surface = %client.surface(),
            operation = operation_id,
            status = ?err.status(),
            error = %err,
            "Operation failed."
        );
        RequestError::Call(err)
    })
}
