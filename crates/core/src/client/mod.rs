//! Operation clients generated from a Swagger document.
//!
//! A [`SwaggerClient`] indexes every operation of a document under its
//! `"tag.operationId"` identifier once, at construction, and then serves
//! calls by encoding parameters, running interceptors and sending the request
//! with a shared `reqwest` client.

pub mod interceptors;

mod encode;

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use serde_json::{Map, Value};
use tracing::{debug, warn};
use url::Url;

use crate::error::{CallError, SpecLoadError};
use crate::surface::Surface;
use crate::swagger::{HttpMethod, Parameter, SwaggerDocument};
use interceptors::{RequestInterceptor, ResponseInterceptor};

/// Named operation arguments.
pub type Params = Map<String, Value>;

/// Body of an operation response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// Parsed JSON payload.
    Json(Value),
    /// Non-JSON payload, e.g. a generated PDF.
    Binary(Bytes),
    /// No payload.
    Empty,
}

impl ResponseBody {
    /// The JSON payload, if any.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            ResponseBody::Binary(_) | ResponseBody::Empty => None,
        }
    }

    /// The raw bytes of a binary payload, if any.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            ResponseBody::Binary(bytes) => Some(bytes),
            ResponseBody::Json(_) | ResponseBody::Empty => None,
        }
    }

    fn from_bytes(bytes: Bytes, is_json: bool) -> Self {
        if bytes.is_empty() {
            return ResponseBody::Empty;
        }
        if is_json {
            match serde_json::from_slice(&bytes) {
                Ok(value) => return ResponseBody::Json(value),
                Err(err) => {
                    warn!(error = %err, "Response declared JSON but did not parse; keeping raw bytes.");
                }
            }
        }
        ResponseBody::Binary(bytes)
    }
}

/// A completed HTTP exchange.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Final request URL.
    pub url: String,
    /// Response headers.
    pub headers: HeaderMap,
    /// Decoded body.
    pub body: ResponseBody,
}

impl ApiResponse {
    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// A response header as text.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }
}

/// Something that can invoke operations by their `"tag.operationId"` identifier.
///
/// The request facade depends on this seam only, so it can be driven by a
/// fake in tests.
pub trait OperationClient: Send + Sync {
    /// Surface this client talks to.
    fn surface(&self) -> Surface;

    /// Document the operations were generated from.
    fn document(&self) -> &SwaggerDocument;

    /// Whether an operation with this identifier exists.
    fn contains(&self, operation_id: &str) -> bool;

    /// Invoke an operation.
    ///
    /// Non-success statuses are returned as [`CallError::Status`] carrying the
    /// full response.
    fn call(
        &self,
        operation_id: &str,
        params: &Params,
    ) -> impl Future<Output = Result<ApiResponse, CallError>> + Send;
}

/// One callable operation.
#[derive(Debug, Clone)]
struct OperationEntry {
    path: String,
    method: HttpMethod,
    parameters: Vec<Parameter>,
    produces: Option<String>,
}

impl OperationEntry {
    fn route(&self) -> String {
        format!("{} {}", self.method.as_str(), self.path)
    }
}

/// Operation client for one surface.
#[derive(Debug)]
pub struct SwaggerClient {
    surface: Surface,
    api_base: Url,
    document: SwaggerDocument,
    operations: HashMap<String, OperationEntry>,
    http: reqwest::Client,
    request_interceptors: Vec<Arc<dyn RequestInterceptor>>,
    response_interceptors: Vec<Arc<dyn ResponseInterceptor>>,
}

impl SwaggerClient {
    /// Index the operations of `document`; calls are sent below `api_base`.
    ///
    /// `api_base` already includes the document's `basePath`. Operations
    /// without a tag or an `operationId` are not callable. Two operations
    /// sharing an identifier make the document unusable.
    pub fn new(
        surface: Surface,
        document: SwaggerDocument,
        api_base: Url,
        http: reqwest::Client,
    ) -> Result<Self, SpecLoadError> {
        let operations = index_operations(surface, &document)?;
        debug!(%surface, operations = operations.len(), %api_base, "Indexed API operations.");
        Ok(Self {
            surface,
            api_base,
            document,
            operations,
            http,
            request_interceptors: Vec::new(),
            response_interceptors: Vec::new(),
        })
    }

    /// Add a hook run on every outgoing request, in insertion order.
    pub fn with_request_interceptor(mut self, interceptor: Arc<dyn RequestInterceptor>) -> Self {
        self.request_interceptors.push(interceptor);
        self
    }

    /// Add a hook run on every response, in insertion order.
    pub fn with_response_interceptor(mut self, interceptor: Arc<dyn ResponseInterceptor>) -> Self {
        self.response_interceptors.push(interceptor);
        self
    }

    /// Base URL operation paths are appended to.
    pub fn api_base(&self) -> &Url {
        &self.api_base
    }

    /// Callable operations as `(identifier, "METHOD /path")`, sorted by identifier.
    pub fn operations(&self) -> Vec<(&str, String)> {
        let mut listing: Vec<_> = self
            .operations
            .iter()
            .map(|(id, entry)| (id.as_str(), entry.route()))
            .collect();
        listing.sort_unstable();
        listing
    }

    fn build_request(
        &self,
        operation_id: &str,
        entry: &OperationEntry,
        params: &Params,
    ) -> Result<reqwest::Request, CallError> {
        let encoded = encode::encode(
            operation_id,
            &self.api_base,
            &entry.path,
            &entry.parameters,
            entry.produces.as_deref(),
            params,
        )?;
        let mut builder = self
            .http
            .request(entry.method.to_reqwest(), encoded.url)
            .headers(encoded.headers);
        if let Some(body) = encoded.body {
            builder = builder.body(body);
        }
        builder.build().map_err(|source| CallError::Http {
            operation_id: operation_id.to_string(),
            source,
        })
    }
}

impl OperationClient for SwaggerClient {
    fn surface(&self) -> Surface {
        self.surface
    }

    fn document(&self) -> &SwaggerDocument {
        &self.document
    }

    fn contains(&self, operation_id: &str) -> bool {
        self.operations.contains_key(operation_id)
    }

    async fn call(&self, operation_id: &str, params: &Params) -> Result<ApiResponse, CallError> {
        let entry = self
            .operations
            .get(operation_id)
            .ok_or_else(|| CallError::UnknownOperation(operation_id.to_string()))?;

        let mut request = self.build_request(operation_id, entry, params)?;
        for interceptor in &self.request_interceptors {
            interceptor.before_send(self.surface, &mut request);
        }

        let http_error = |source: reqwest::Error| CallError::Http {
            operation_id: operation_id.to_string(),
            source,
        };
        debug!(
            surface = %self.surface,
            operation = operation_id,
            method = %request.method(),
            url = %request.url(),
            "Sending API request."
        );
        let response = self.http.execute(request).await.map_err(http_error)?;

        let status = response.status().as_u16();
        let url = response.url().to_string();
        let headers = response.headers().clone();
        let is_json = headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains("json"));
        let bytes = response.bytes().await.map_err(http_error)?;
        let response = ApiResponse {
            status,
            url,
            headers,
            body: ResponseBody::from_bytes(bytes, is_json),
        };
        debug!(surface = %self.surface, operation = operation_id, status, "Received API response.");

        for interceptor in &self.response_interceptors {
            interceptor.on_response(self.surface, &response);
        }

        if response.is_success() {
            Ok(response)
        } else {
            Err(CallError::Status {
                operation_id: operation_id.to_string(),
                response: Box::new(response),
            })
        }
    }
}

/// Build the `"tag.operationId"` table, rejecting duplicates.
fn index_operations(
    surface: Surface,
    document: &SwaggerDocument,
) -> Result<HashMap<String, OperationEntry>, SpecLoadError> {
    let mut operations: HashMap<String, OperationEntry> = HashMap::new();

    for (path, item) in &document.paths {
        for (method, operation) in item.operations() {
            let (Some(tag), Some(name)) = (operation.primary_tag(), operation.operation_id.as_deref())
            else {
                debug!(%surface, method = method.as_str(), path = %path, "Skipping operation without tag or operationId.");
                continue;
            };

            let entry = OperationEntry {
                path: path.clone(),
                method,
                parameters: merge_parameters(document, &item.parameters, &operation.parameters),
                produces: operation
                    .produces
                    .first()
                    .or_else(|| document.produces.first())
                    .cloned(),
            };
            let id = format!("{tag}.{name}");
            if let Some(first) = operations.get(&id) {
                return Err(SpecLoadError::DuplicateOperation {
                    surface,
                    operation_id: id,
                    first: first.route(),
                    second: entry.route(),
                });
            }
            operations.insert(id, entry);
        }
    }

    Ok(operations)
}

/// Path-level parameters overridden by operation-level ones with the same
/// name and location; `$ref`s resolved against the document.
fn merge_parameters(
    document: &SwaggerDocument,
    path_level: &[Parameter],
    operation_level: &[Parameter],
) -> Vec<Parameter> {
    let mut merged: Vec<Parameter> = Vec::new();
    for parameter in path_level.iter().chain(operation_level) {
        let Some(resolved) = document.resolve_parameter(parameter) else {
            warn!(reference = ?parameter.ref_path, "Unresolvable parameter reference; ignoring it.");
            continue;
        };
        match merged
            .iter_mut()
            .find(|p| p.name == resolved.name && p.location == resolved.location)
        {
            Some(existing) => *existing = resolved.clone(),
            None => merged.push(resolved.clone()),
        }
    }
    merged
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::swagger::ParameterLocation;

    const DOC: &str = r##"
swagger: "2.0"
basePath: /ghc/v1
produces: [application/json]
parameters:
  ifMatch:
    name: If-Match
    in: header
    required: true
paths:
  /shipments/{shipmentID}:
    parameters:
      - name: shipmentID
        in: path
        required: true
    get:
      tags: [shipments]
      operationId: getShipment
      responses:
        200:
          schema:
            $ref: "#/definitions/Shipment"
    patch:
      tags: [shipments]
      operationId: updateShipment
      parameters:
        - $ref: "#/parameters/ifMatch"
        - name: shipmentID
          in: path
          required: true
          type: string
          format: uuid
      responses:
        200:
          schema:
            $ref: "#/definitions/Shipment"
  /untagged:
    get:
      operationId: orphan
      responses: {}
"##;

    fn client(yaml: &str) -> Result<SwaggerClient, SpecLoadError> {
        SwaggerClient::new(
            Surface::Ghc,
            SwaggerDocument::from_yaml(yaml).unwrap(),
            "http://localhost:3000/ghc/v1".parse().unwrap(),
            reqwest::Client::new(),
        )
    }

    #[test]
    fn test_operations_are_indexed_by_tag_and_id() {
        let client = client(DOC).unwrap();
        assert!(client.contains("shipments.getShipment"));
        assert!(client.contains("shipments.updateShipment"));
        assert!(!client.contains("orphan"));
        assert!(!client.contains("shipments.orphan"));
        assert_eq!(
            client.operations(),
            vec![
                ("shipments.getShipment", "GET /shipments/{shipmentID}".to_string()),
                ("shipments.updateShipment", "PATCH /shipments/{shipmentID}".to_string()),
            ]
        );
    }

    #[test]
    fn test_parameters_are_merged_and_resolved() {
        let client = client(DOC).unwrap();
        let entry = &client.operations["shipments.updateShipment"];
        let names: Vec<_> = entry
            .parameters
            .iter()
            .map(|p| (p.name.as_str(), p.location))
            .collect();
        assert_eq!(
            names,
            vec![
                ("shipmentID", Some(ParameterLocation::Path)),
                ("If-Match", Some(ParameterLocation::Header)),
            ]
        );
        assert_eq!(entry.produces.as_deref(), Some("application/json"));
    }

    #[test]
    fn test_duplicate_operation_is_rejected() {
        let yaml = r##"
paths:
  /moves/{moveID}:
    get:
      tags: [move]
      operationId: getMove
  /moves/{moveID}/details:
    get:
      tags: [move]
      operationId: getMove
"##;
        let err = client(yaml).unwrap_err();
        match err {
            SpecLoadError::DuplicateOperation {
                operation_id,
                first,
                second,
                ..
            } => {
                assert_eq!(operation_id, "move.getMove");
                assert_eq!(first, "GET /moves/{moveID}");
                assert_eq!(second, "GET /moves/{moveID}/details");
            }
            other => unreachable!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_request_is_built_from_parameters() {
        let client = client(DOC).unwrap();
        let entry = &client.operations["shipments.updateShipment"];
        let mut params = Params::new();
        params.insert("shipmentID".into(), "abcd-1234".into());
        params.insert("If-Match".into(), "etag".into());

        let request = client
            .build_request("shipments.updateShipment", entry, &params)
            .unwrap();
        assert_eq!(request.method(), &reqwest::Method::PATCH);
        assert_eq!(
            request.url().as_str(),
            "http://localhost:3000/ghc/v1/shipments/abcd-1234"
        );
        assert_eq!(request.headers().get("if-match").unwrap(), "etag");
    }

    #[test]
    fn test_response_body_decoding() {
        assert_eq!(ResponseBody::from_bytes(Bytes::new(), true), ResponseBody::Empty);
        assert_eq!(
            ResponseBody::from_bytes(Bytes::from_static(b"{\"id\":1}"), true),
            ResponseBody::Json(serde_json::json!({"id": 1}))
        );
        assert_eq!(
            ResponseBody::from_bytes(Bytes::from_static(b"%PDF-1.7"), false),
            ResponseBody::Binary(Bytes::from_static(b"%PDF-1.7"))
        );
        assert!(matches!(
            ResponseBody::from_bytes(Bytes::from_static(b"not json"), true),
            ResponseBody::Binary(_)
        ));
    }
}
