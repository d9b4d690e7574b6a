//! Swagger document structs for serde deserialization.
//!
//! Only the subset the request layer reads is modelled: base path, path items
//! with their operations and parameters, and the schema pointer of each
//! response. Paths keep document order so route lookup scans them the way
//! they were declared.

use indexmap::IndexMap;
use serde::Deserialize;

/// Path template → path item, in document order.
pub type Paths = IndexMap<String, PathItem>;

/// Root Swagger document for one API surface.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwaggerDocument {
    /// Swagger version string (`"2.0"`).
    pub swagger: Option<String>,
    /// Document metadata.
    pub info: Option<Info>,
    /// Prefix prepended to every path.
    pub base_path: Option<String>,
    /// Default request media types.
    #[serde(default)]
    pub consumes: Vec<String>,
    /// Default response media types.
    #[serde(default)]
    pub produces: Vec<String>,
    /// Reusable parameters referenced as `#/parameters/<name>`.
    #[serde(default)]
    pub parameters: IndexMap<String, Parameter>,
    /// Declared paths.
    #[serde(default)]
    pub paths: Paths,
}

/// Document metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct Info {
    /// API title.
    pub title: Option<String>,
    /// API version.
    pub version: Option<String>,
}

/// HTTP method of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// GET
    Get,
    /// PUT
    Put,
    /// POST
    Post,
    /// DELETE
    Delete,
    /// OPTIONS
    Options,
    /// HEAD
    Head,
    /// PATCH
    Patch,
}

impl HttpMethod {
    /// Uppercase method name.
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Put => "PUT",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Patch => "PATCH",
        }
    }

    /// The equivalent `reqwest` method.
    pub fn to_reqwest(self) -> reqwest::Method {
        match self {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Options => reqwest::Method::OPTIONS,
            HttpMethod::Head => reqwest::Method::HEAD,
            HttpMethod::Patch => reqwest::Method::PATCH,
        }
    }
}

/// A path item containing operations for different HTTP methods.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathItem {
    /// Path-level parameters shared by all operations.
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    /// GET operation.
    pub get: Option<Operation>,
    /// PUT operation.
    pub put: Option<Operation>,
    /// POST operation.
    pub post: Option<Operation>,
    /// DELETE operation.
    pub delete: Option<Operation>,
    /// OPTIONS operation.
    pub options: Option<Operation>,
    /// HEAD operation.
    pub head: Option<Operation>,
    /// PATCH operation.
    pub patch: Option<Operation>,
}

impl PathItem {
    /// Declared operations in a fixed method order.
    pub fn operations(&self) -> impl Iterator<Item = (HttpMethod, &Operation)> {
        [
            (HttpMethod::Get, self.get.as_ref()),
            (HttpMethod::Put, self.put.as_ref()),
            (HttpMethod::Post, self.post.as_ref()),
            (HttpMethod::Delete, self.delete.as_ref()),
            (HttpMethod::Options, self.options.as_ref()),
            (HttpMethod::Head, self.head.as_ref()),
            (HttpMethod::Patch, self.patch.as_ref()),
        ]
        .into_iter()
        .filter_map(|(method, op)| op.map(|op| (method, op)))
    }
}

/// An API operation (endpoint).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// Operation name, unique per tag.
    pub operation_id: Option<String>,
    /// Tags; the first one namespaces the operation.
    #[serde(default)]
    pub tags: Vec<String>,
    /// One-line summary.
    pub summary: Option<String>,
    /// Operation-level parameters.
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    /// Request media types, overriding the document default.
    #[serde(default)]
    pub consumes: Vec<String>,
    /// Response media types, overriding the document default.
    #[serde(default)]
    pub produces: Vec<String>,
    /// Status code → response definition.
    #[serde(default)]
    pub responses: IndexMap<String, Response>,
}

impl Operation {
    /// The tag that namespaces this operation.
    pub fn primary_tag(&self) -> Option<&str> {
        self.tags.first().map(String::as_str)
    }
}

/// Where a parameter travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterLocation {
    /// Substituted into the path template.
    Path,
    /// Appended to the query string.
    Query,
    /// Sent as a request header.
    Header,
    /// Serialized as the JSON request body.
    Body,
    /// Sent as an urlencoded form field.
    FormData,
}

/// How array values are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionFormat {
    /// Comma separated.
    #[default]
    Csv,
    /// Space separated.
    Ssv,
    /// Tab separated.
    Tsv,
    /// Pipe separated.
    Pipes,
    /// Repeated `name=value` pairs.
    Multi,
}

impl CollectionFormat {
    /// Separator used to join values, `None` for [`CollectionFormat::Multi`].
    pub fn separator(self) -> Option<&'static str> {
        match self {
            CollectionFormat::Csv => Some(","),
            CollectionFormat::Ssv => Some(" "),
            CollectionFormat::Tsv => Some("\t"),
            CollectionFormat::Pipes => Some("|"),
            CollectionFormat::Multi => None,
        }
    }
}

/// A parameter, or a `$ref` to a document-level one.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    /// Parameter name (empty for references).
    #[serde(default)]
    pub name: String,
    /// Parameter location (absent for references).
    #[serde(rename = "in")]
    pub location: Option<ParameterLocation>,
    /// Whether the caller must supply it.
    #[serde(default)]
    pub required: bool,
    /// Array join format for query, header and form parameters.
    pub collection_format: Option<CollectionFormat>,
    /// Reference to a document-level parameter.
    #[serde(rename = "$ref")]
    pub ref_path: Option<String>,
}

/// A response definition.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Response {
    /// Human description.
    pub description: Option<String>,
    /// Swagger 2 body schema.
    pub schema: Option<SchemaRef>,
    /// OpenAPI 3 style media types, used when `schema` is absent.
    pub content: Option<IndexMap<String, MediaType>>,
}

impl Response {
    /// Pointer to the definition describing the response body.
    pub fn schema_pointer(&self) -> Option<&str> {
        if let Some(pointer) = self.schema.as_ref().and_then(SchemaRef::pointer) {
            return Some(pointer);
        }
        self.content
            .as_ref()?
            .values()
            .find_map(|media| media.schema.as_ref().and_then(SchemaRef::pointer))
    }
}

/// Media type content (e.g., application/json).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaType {
    /// Body schema.
    pub schema: Option<SchemaRef>,
}

/// The part of a body schema that names its definition.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaRef {
    /// Unresolved reference, e.g. `#/definitions/Shipment`.
    #[serde(rename = "$ref")]
    pub ref_path: Option<String>,
    /// Reference left behind by resolvers that inline definitions.
    #[serde(rename = "$$ref")]
    pub resolved_ref: Option<String>,
    /// Inline schema type.
    #[serde(rename = "type")]
    pub schema_type: Option<String>,
}

impl SchemaRef {
    /// The reference pointer, preferring the unresolved one.
    pub fn pointer(&self) -> Option<&str> {
        self.ref_path
            .as_deref()
            .or(self.resolved_ref.as_deref())
            .filter(|p| !p.is_empty())
    }
}

impl SwaggerDocument {
    /// Parse a Swagger document from YAML (or JSON, a YAML subset).
    pub fn from_yaml(source: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(source)
    }

    /// Follow a `#/parameters/<name>` reference; plain parameters resolve to themselves.
    pub fn resolve_parameter<'a>(&'a self, parameter: &'a Parameter) -> Option<&'a Parameter> {
        match parameter.ref_path.as_deref() {
            None => Some(parameter),
            Some(pointer) => {
                let name = pointer.strip_prefix("#/parameters/")?;
                self.parameters.get(name)
            }
        }
    }

    /// Base path without a trailing slash (empty when undeclared).
    pub fn base_path(&self) -> &str {
        self.base_path
            .as_deref()
            .map(|p| p.trim_end_matches('/'))
            .unwrap_or("")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const SPEC_YAML: &str = r##"
swagger: '2.0'
info:
  title: GHC API
  version: 0.0.1
basePath: /ghc/v1
consumes:
  - application/json
produces:
  - application/json
parameters:
  ifMatch:
    name: If-Match
    in: header
    required: true
    type: string
paths:
  /shipments/{shipmentID}:
    parameters:
      - name: shipmentID
        in: path
        required: true
        type: string
    get:
      operationId: getShipment
      tags:
        - shipments
      responses:
        200:
          description: ok
          schema:
            $ref: '#/definitions/Shipment'
        404:
          description: not found
    patch:
      operationId: updateShipment
      tags:
        - shipments
      parameters:
        - $ref: '#/parameters/ifMatch'
        - name: body
          in: body
          required: true
      responses:
        '200':
          description: ok
          schema:
            $$ref: '#/definitions/Shipment'
"##;

    #[test]
    fn test_parse_swagger_yaml() {
        let doc = SwaggerDocument::from_yaml(SPEC_YAML).unwrap();
        assert_eq!(doc.swagger.as_deref(), Some("2.0"));
        assert_eq!(doc.base_path(), "/ghc/v1");

        let item = doc.paths.get("/shipments/{shipmentID}").unwrap();
        assert_eq!(item.parameters.len(), 1);
        assert_eq!(item.parameters[0].location, Some(ParameterLocation::Path));

        let methods: Vec<_> = item.operations().map(|(m, _)| m).collect();
        assert_eq!(methods, vec![HttpMethod::Get, HttpMethod::Patch]);

        let get = item.get.as_ref().unwrap();
        assert_eq!(get.primary_tag(), Some("shipments"));
        assert_eq!(
            get.responses.get("200").unwrap().schema_pointer(),
            Some("#/definitions/Shipment")
        );
        assert_eq!(get.responses.get("404").unwrap().schema_pointer(), None);
    }

    #[test]
    fn test_resolved_ref_is_used_when_ref_is_absent() {
        let doc = SwaggerDocument::from_yaml(SPEC_YAML).unwrap();
        let patch = doc.paths["/shipments/{shipmentID}"].patch.as_ref().unwrap();
        assert_eq!(
            patch.responses["200"].schema_pointer(),
            Some("#/definitions/Shipment")
        );
    }

    #[test]
    fn test_resolve_parameter_reference() {
        let doc = SwaggerDocument::from_yaml(SPEC_YAML).unwrap();
        let patch = doc.paths["/shipments/{shipmentID}"].patch.as_ref().unwrap();
        let resolved = doc.resolve_parameter(&patch.parameters[0]).unwrap();
        assert_eq!(resolved.name, "If-Match");
        assert_eq!(resolved.location, Some(ParameterLocation::Header));

        let dangling = Parameter {
            ref_path: Some("#/parameters/missing".to_string()),
            ..Parameter::default()
        };
        assert!(doc.resolve_parameter(&dangling).is_none());
    }

    #[test]
    fn test_openapi3_content_fallback() {
        let response: Response = serde_json::from_str(
            r##"{"content": {"application/json": {"schema": {"$ref": "#/components/schemas/Move"}}}}"##,
        )
        .unwrap();
        assert_eq!(response.schema_pointer(), Some("#/components/schemas/Move"));
    }

    #[test]
    fn test_collection_format_separators() {
        assert_eq!(CollectionFormat::default().separator(), Some(","));
        assert_eq!(CollectionFormat::Pipes.separator(), Some("|"));
        assert_eq!(CollectionFormat::Multi.separator(), None);
    }
}
