//! Parameter encoding: caller values → URL, headers and body.

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use url::Url;
use url::form_urlencoded;

use super::Params;
use crate::error::CallError;
use crate::swagger::{CollectionFormat, Parameter, ParameterLocation};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Everything needed to send one operation call, minus the method.
#[derive(Debug)]
pub(crate) struct EncodedRequest {
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

/// Encode `params` for an operation rooted at `base` with path template `path`.
///
/// Declared parameters are looked up by name; undeclared entries in `params`
/// are ignored. Absent and `null` values count as not supplied.
pub(crate) fn encode(
    operation_id: &str,
    base: &Url,
    path: &str,
    declared: &[Parameter],
    produces: Option<&str>,
    params: &Params,
) -> Result<EncodedRequest, CallError> {
    let mut path_values = Vec::new();
    let mut query = Vec::new();
    let mut headers = HeaderMap::new();
    let mut body = None;
    let mut form = Vec::new();

    for parameter in declared {
        let Some(location) = parameter.location else {
            continue;
        };
        let value = match params.get(&parameter.name) {
            Some(Value::Null) | None => {
                if parameter.required || location == ParameterLocation::Path {
                    return Err(CallError::MissingParameter {
                        operation_id: operation_id.to_string(),
                        name: parameter.name.clone(),
                    });
                }
                continue;
            }
            Some(value) => value,
        };
        let format = parameter.collection_format.unwrap_or_default();

        match location {
            ParameterLocation::Path => {
                path_values.push((parameter.name.as_str(), join(value, CollectionFormat::Csv)));
            }
            ParameterLocation::Query => pairs(&mut query, &parameter.name, value, format),
            ParameterLocation::FormData => pairs(&mut form, &parameter.name, value, format),
            ParameterLocation::Header => {
                let invalid = |reason: String| CallError::InvalidParameter {
                    operation_id: operation_id.to_string(),
                    name: parameter.name.clone(),
                    reason,
                };
                let name = HeaderName::from_bytes(parameter.name.as_bytes())
                    .map_err(|err| invalid(err.to_string()))?;
                let value = HeaderValue::from_str(&join(value, format))
                    .map_err(|err| invalid(err.to_string()))?;
                headers.insert(name, value);
            }
            ParameterLocation::Body => {
                let bytes =
                    serde_json::to_vec(value).map_err(|err| CallError::InvalidParameter {
                        operation_id: operation_id.to_string(),
                        name: parameter.name.clone(),
                        reason: err.to_string(),
                    })?;
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                body = Some(bytes);
            }
        }
    }

    if body.is_none() && !form.is_empty() {
        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(form.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .finish();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
        body = Some(encoded.into_bytes());
    }

    if let Some(accept) = produces.and_then(|media| HeaderValue::from_str(media).ok()) {
        headers.entry(ACCEPT).or_insert(accept);
    }

    let url = build_url(operation_id, base, path, &path_values, &query)?;
    Ok(EncodedRequest { url, headers, body })
}

fn build_url(
    operation_id: &str,
    base: &Url,
    template: &str,
    path_values: &[(&str, String)],
    query: &[(String, String)],
) -> Result<Url, CallError> {
    let mut url = base.clone();
    {
        let mut segments = url.path_segments_mut().map_err(|()| CallError::InvalidUrl {
            operation_id: operation_id.to_string(),
            reason: format!("base URL {base} cannot carry a path"),
        })?;
        segments.pop_if_empty();
        for segment in template.split('/').filter(|s| !s.is_empty()) {
            segments.push(&substitute(segment, path_values));
        }
    }
    if !query.is_empty() {
        url.query_pairs_mut()
            .extend_pairs(query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }
    Ok(url)
}

/// Replace every `{name}` placeholder in one path segment.
///
/// Single pass over the template: substituted values are emitted literally
/// and never scanned for placeholders again. Unknown placeholders are kept.
fn substitute(segment: &str, values: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut rest = segment;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };
        let name = &after[..close];
        match values.iter().find(|(n, _)| *n == name) {
            Some((_, value)) => out.push_str(value),
            None => out.push_str(&rest[open..open + close + 2]),
        }
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    out
}

fn pairs(out: &mut Vec<(String, String)>, name: &str, value: &Value, format: CollectionFormat) {
    match (value, format) {
        (Value::Array(items), CollectionFormat::Multi) => {
            out.extend(items.iter().map(|item| (name.to_string(), scalar(item))));
        }
        _ => out.push((name.to_string(), join(value, format))),
    }
}

fn join(value: &Value, format: CollectionFormat) -> String {
    match value {
        Value::Array(items) => items
            .iter()
            .map(scalar)
            .collect::<Vec<_>>()
            .join(format.separator().unwrap_or(",")),
        other => scalar(other),
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(_) | Value::Number(_) | Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn param(name: &str, location: ParameterLocation, required: bool) -> Parameter {
        Parameter {
            name: name.to_string(),
            location: Some(location),
            required,
            ..Parameter::default()
        }
    }

    fn params(value: Value) -> Params {
        match value {
            Value::Object(map) => map,
            _ => Params::new(),
        }
    }

    fn base() -> Url {
        "http://localhost:3000/ghc/v1".parse().unwrap()
    }

    #[test]
    fn test_path_parameters_are_substituted_and_escaped() {
        let declared = [param("shipmentID", ParameterLocation::Path, true)];
        let encoded = encode(
            "shipments.getShipment",
            &base(),
            "/shipments/{shipmentID}",
            &declared,
            None,
            &params(json!({"shipmentID": "ab cd/1"})),
        )
        .unwrap();
        assert_eq!(
            encoded.url.as_str(),
            "http://localhost:3000/ghc/v1/shipments/ab%20cd%2F1"
        );
        assert!(encoded.body.is_none());
    }

    #[test]
    fn test_path_values_with_braces_are_not_expanded_again() {
        let declared = [
            param("a", ParameterLocation::Path, true),
            param("b", ParameterLocation::Path, true),
        ];
        let base: Url = "http://h/base".parse().unwrap();
        let encoded = encode(
            "t.op",
            &base,
            "/x/{a}.{b}",
            &declared,
            None,
            &params(json!({"a": "{b}", "b": "X"})),
        )
        .unwrap();
        assert_eq!(encoded.url.as_str(), "http://h/base/x/%7Bb%7D.X");
    }

    #[test]
    fn test_substitute_keeps_unknown_and_unclosed_placeholders() {
        let values = [("id", "7".to_string())];
        assert_eq!(substitute("{id}-{other}", &values), "7-{other}");
        assert_eq!(substitute("v{id", &values), "v{id");
        assert_eq!(substitute("plain", &values), "plain");
    }

    #[test]
    fn test_trailing_slash_on_base_is_not_doubled() {
        let base: Url = "http://localhost:3000/internal/".parse().unwrap();
        let encoded = encode("users.showLoggedInUser", &base, "/users/logged_in", &[], None, &Params::new())
            .unwrap();
        assert_eq!(encoded.url.as_str(), "http://localhost:3000/internal/users/logged_in");
    }

    #[test]
    fn test_missing_required_parameter_fails_before_sending() {
        let declared = [
            param("moveID", ParameterLocation::Path, true),
            param("body", ParameterLocation::Body, true),
        ];
        let err = encode(
            "moves.updateMove",
            &base(),
            "/moves/{moveID}",
            &declared,
            None,
            &params(json!({"moveID": "m-1", "body": null})),
        )
        .unwrap_err();
        assert!(matches!(err, CallError::MissingParameter { ref name, .. } if name == "body"));
    }

    #[test]
    fn test_query_collection_formats() {
        let mut multi = param("status", ParameterLocation::Query, false);
        multi.collection_format = Some(CollectionFormat::Multi);
        let mut pipes = param("branch", ParameterLocation::Query, false);
        pipes.collection_format = Some(CollectionFormat::Pipes);
        let declared = [multi, pipes, param("page", ParameterLocation::Query, false)];

        let encoded = encode(
            "queues.getMovesQueue",
            &base(),
            "/queues/moves",
            &declared,
            None,
            &params(json!({"status": ["NEW", "APPROVED"], "branch": ["ARMY", "NAVY"], "page": 2, "ignored": 1})),
        )
        .unwrap();
        assert_eq!(
            encoded.url.query(),
            Some("status=NEW&status=APPROVED&branch=ARMY%7CNAVY&page=2")
        );
    }

    #[test]
    fn test_json_body_and_headers() {
        let declared = [
            param("If-Match", ParameterLocation::Header, true),
            param("body", ParameterLocation::Body, true),
        ];
        let encoded = encode(
            "mtoShipment.updateMTOShipment",
            &base(),
            "/mto-shipments",
            &declared,
            Some("application/json"),
            &params(json!({"If-Match": "etag-1", "body": {"status": "APPROVED"}})),
        )
        .unwrap();
        assert_eq!(encoded.headers.get("if-match").unwrap(), "etag-1");
        assert_eq!(encoded.headers.get(CONTENT_TYPE).unwrap(), "application/json");
        assert_eq!(encoded.headers.get(ACCEPT).unwrap(), "application/json");
        let body: Value = serde_json::from_slice(&encoded.body.unwrap()).unwrap();
        assert_eq!(body, json!({"status": "APPROVED"}));
    }

    #[test]
    fn test_form_data_is_urlencoded() {
        let declared = [
            param("name", ParameterLocation::FormData, true),
            param("note", ParameterLocation::FormData, false),
        ];
        let encoded = encode(
            "uploads.createUpload",
            &base(),
            "/uploads",
            &declared,
            None,
            &params(json!({"name": "orders & amendments"})),
        )
        .unwrap();
        assert_eq!(encoded.headers.get(CONTENT_TYPE).unwrap(), FORM_CONTENT_TYPE);
        assert_eq!(
            String::from_utf8(encoded.body.unwrap()).unwrap(),
            "name=orders+%26+amendments"
        );
    }

    #[test]
    fn test_invalid_header_value_is_rejected() {
        let declared = [param("X-Note", ParameterLocation::Header, false)];
        let err = encode(
            "moves.getMove",
            &base(),
            "/moves",
            &declared,
            None,
            &params(json!({"X-Note": "line\nbreak"})),
        )
        .unwrap_err();
        assert!(matches!(err, CallError::InvalidParameter { .. }));
    }
}
