//! Route lookup: from a `"tag.operationId"` identifier to its path, method and operation.

use super::spec::{HttpMethod, Operation, Paths, Response};

/// The Swagger fragment for one matched (path, method) pair.
#[derive(Debug, Clone, Copy)]
pub struct RouteDefinition<'a> {
    /// Path template, e.g. `/shipments/{shipmentID}`.
    pub path: &'a str,
    /// Method that matched.
    pub method: HttpMethod,
    /// The operation declaration.
    pub operation: &'a Operation,
}

impl<'a> RouteDefinition<'a> {
    /// Response declared for a status code.
    pub fn response(&self, status: u16) -> Option<&'a Response> {
        self.operation.responses.get(status.to_string().as_str())
    }
}

/// Split an operation identifier on its first `.` into `(tag, operationId)`.
pub fn split_operation_id(operation_id: &str) -> Option<(&str, &str)> {
    operation_id.split_once('.')
}

/// Find the route for an operation identifier.
///
/// Scans every path in document order and every method of each path; the
/// first operation whose `operationId` and first tag both match wins.
/// Identifiers without a `.` never match.
pub fn resolve_route<'a>(paths: &'a Paths, operation_id: &str) -> Option<RouteDefinition<'a>> {
    let (tag, name) = split_operation_id(operation_id)?;

    paths.iter().find_map(|(path, item)| {
        item.operations().find_map(|(method, operation)| {
            let matches = operation.operation_id.as_deref() == Some(name)
                && operation.primary_tag() == Some(tag);
            matches.then_some(RouteDefinition {
                path,
                method,
                operation,
            })
        })
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::swagger::SwaggerDocument;

    const SPEC_YAML: &str = r##"
swagger: '2.0'
basePath: /ghc/v1
paths:
  /moves/{locator}:
    get:
      operationId: getMove
      tags: [move]
      responses:
        '200':
          schema:
            $ref: '#/definitions/Move'
  /shipments/{shipmentID}:
    get:
      operationId: getShipment
      tags: [shipments]
      responses:
        '200':
          schema:
            $ref: '#/definitions/Shipment'
    delete:
      operationId: deleteShipment
      tags: [shipments, mtoShipment]
      responses:
        '204':
          description: deleted
  /legacy/shipments/{shipmentID}:
    get:
      operationId: getShipment
      tags: [shipments]
      responses:
        '200':
          schema:
            $ref: '#/definitions/LegacyShipment'
"##;

    fn doc() -> SwaggerDocument {
        SwaggerDocument::from_yaml(SPEC_YAML).unwrap()
    }

    #[test]
    fn test_resolves_every_declared_pair() {
        let doc = doc();
        for (path, item) in &doc.paths {
            for (method, operation) in item.operations() {
                let id = format!(
                    "{}.{}",
                    operation.primary_tag().unwrap(),
                    operation.operation_id.as_deref().unwrap()
                );
                let route = resolve_route(&doc.paths, &id).unwrap();
                assert_eq!(route.operation.operation_id, operation.operation_id);
                assert_eq!(route.operation.primary_tag(), operation.primary_tag());
                if path != "/legacy/shipments/{shipmentID}" {
                    assert_eq!(route.path, path);
                    assert_eq!(route.method, method);
                }
            }
        }
    }

    #[test]
    fn test_annotates_matched_method() {
        let doc = doc();
        let route = resolve_route(&doc.paths, "shipments.deleteShipment").unwrap();
        assert_eq!(route.method, HttpMethod::Delete);
        assert_eq!(route.path, "/shipments/{shipmentID}");
    }

    #[test]
    fn test_first_match_wins() {
        let doc = doc();
        let route = resolve_route(&doc.paths, "shipments.getShipment").unwrap();
        assert_eq!(route.path, "/shipments/{shipmentID}");
        assert_eq!(
            route.response(200).unwrap().schema_pointer(),
            Some("#/definitions/Shipment")
        );
    }

    #[test]
    fn test_only_first_tag_counts() {
        let doc = doc();
        assert!(resolve_route(&doc.paths, "mtoShipment.deleteShipment").is_none());
    }

    #[test]
    fn test_absent_pairs_resolve_to_none() {
        let doc = doc();
        assert!(resolve_route(&doc.paths, "shipments.getMove").is_none());
        assert!(resolve_route(&doc.paths, "move.getShipment").is_none());
        assert!(resolve_route(&doc.paths, "unknown").is_none());
        assert!(resolve_route(&doc.paths, "").is_none());
    }

    #[test]
    fn test_split_on_first_dot() {
        assert_eq!(split_operation_id("a.b.c"), Some(("a", "b.c")));
        assert_eq!(split_operation_id("abc"), None);
    }
}
