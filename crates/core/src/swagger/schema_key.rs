//! Schema key resolution: which entity-graph root a response body represents.

use std::fmt;

use tracing::{error, warn};

use super::route::RouteDefinition;

/// Suffix of definitions named with the legacy `<Type>Payload` convention.
const LEGACY_SUFFIX: &str = "Payload";

/// Camel-cased entity type name derived from a response schema pointer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaKey {
    key: String,
    legacy: bool,
}

impl SchemaKey {
    /// Derive a key from a pointer such as `#/definitions/MoveTaskOrder`.
    pub fn from_pointer(pointer: &str) -> Option<Self> {
        let name = pointer.rsplit('/').next().filter(|s| !s.is_empty())?;
        let key = lowercase_first(name);
        match key.strip_suffix(LEGACY_SUFFIX) {
            Some(stripped) if !stripped.is_empty() => Some(Self {
                key: stripped.to_string(),
                legacy: true,
            }),
            _ => Some(Self { key, legacy: false }),
        }
    }

    /// The key itself.
    pub fn as_str(&self) -> &str {
        &self.key
    }

    /// Whether the definition used the deprecated `Payload` suffix.
    pub fn is_legacy(&self) -> bool {
        self.legacy
    }
}

impl fmt::Display for SchemaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

/// Lowercase the first letter of a string.
pub fn lowercase_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_lowercase().chain(chars).collect(),
    }
}

/// Resolve the schema key of a route's response for a status code.
///
/// Returns `None` (after logging an error) when the status is undeclared or its
/// response names no definition. A legacy `Payload` key is returned stripped,
/// with one deprecation warning logged.
pub fn resolve_schema_key(route: &RouteDefinition<'_>, status: u16) -> Option<SchemaKey> {
    let operation_id = route.operation.operation_id.as_deref().unwrap_or_default();

    let Some(response) = route.response(status) else {
        error!(
            operation = operation_id,
            path = route.path,
            status,
            "No response definition for status."
        );
        return None;
    };

    let Some(pointer) = response.schema_pointer() else {
        error!(
            operation = operation_id,
            path = route.path,
            status,
            "Response definition has no schema reference."
        );
        return None;
    };

    let key = SchemaKey::from_pointer(pointer)?;
    if key.is_legacy() {
        warn!(
            operation = operation_id,
            pointer,
            schema_key = key.as_str(),
            "Deprecated schema name: the '{LEGACY_SUFFIX}' suffix was stripped; rename the definition."
        );
    }
    Some(key)
}
