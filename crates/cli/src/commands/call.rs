use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use clap::Args;
use moveportal_core::{
    ClientRegistry, CookieJar, Params, RequestError, RequestOptions, ResponseBody, Surface,
};
use serde_json::Value;
use tracing::debug;

use super::{load_config, parse_key_value, run_cli_async};

#[derive(Args, Debug, Clone)]
pub struct CallArgs {
    #[arg(value_name = "SURFACE", help = "API surface: internal, admin, ghc or prime")]
    pub surface: Surface,

    #[arg(value_name = "OPERATION", help = "Operation identifier, e.g. shipments.getShipment")]
    pub operation: String,

    /// Operation parameter; JSON objects and arrays are sent as JSON, anything else as a string
    #[arg(short = 'p', long = "param", value_name = "NAME=VALUE", value_parser = parse_key_value)]
    pub params: Vec<(String, String)>,

    /// Cookie to send with the session (repeatable)
    #[arg(long = "cookie", value_name = "NAME=VALUE", value_parser = parse_key_value)]
    pub cookies: Vec<(String, String)>,

    /// Print the full response without route or schema resolution
    #[arg(long, conflicts_with_all = ["no_normalize", "schema_key"])]
    pub raw: bool,

    /// Print the response body instead of normalized entities
    #[arg(long)]
    pub no_normalize: bool,

    /// Normalize against this schema key instead of the response definition
    #[arg(long, value_name = "KEY")]
    pub schema_key: Option<String>,
}

pub async fn run(config: Option<&Path>, args: CallArgs) -> i32 {
    run_cli_async(|| run_inner(config, args)).await
}

async fn run_inner(config: Option<&Path>, args: CallArgs) -> Result<(), String> {
    let config = load_config(config)?;
    let jar = CookieJar::new();
    for (name, value) in &args.cookies {
        jar.set(name.as_str(), value.as_str());
    }
    let registry = ClientRegistry::new(config, Arc::new(jar));
    let params = build_params(&args.params);
    debug!(surface = %args.surface, operation = %args.operation, params = params.len(), "Calling operation.");

    if args.raw {
        let response = registry
            .request_raw(args.surface, &args.operation, &params)
            .await
            .map_err(|err| describe(&err))?;
        eprintln!("HTTP {}", response.status);
        return print_body(&response.body);
    }

    let mut options = if args.no_normalize {
        RequestOptions::raw()
    } else {
        RequestOptions::default()
    };
    if let Some(key) = args.schema_key {
        options = options.with_schema_key(key);
    }

    let payload = registry
        .request(args.surface, &args.operation, &params, &options)
        .await
        .map_err(|err| describe(&err))?;
    match payload.raw() {
        Some(body) => print_body(body),
        None => print_json(&payload.to_json()),
    }
}

/// JSON objects and arrays keep their structure; every other value is sent
/// exactly as typed, so `1e3` or `007` never turn into numbers.
fn build_params(pairs: &[(String, String)]) -> Params {
    pairs
        .iter()
        .map(|(name, value)| {
            let value = match serde_json::from_str(value) {
                Ok(json @ (Value::Object(_) | Value::Array(_))) => json,
                _ => Value::String(value.clone()),
            };
            (name.clone(), value)
        })
        .collect()
}

/// Error text plus the backend's response body, when there is one.
fn describe(err: &RequestError) -> String {
    let body = match err {
        RequestError::Call(call) => call.response().and_then(|r| r.body.as_json()),
        _ => None,
    };
    match body.and_then(|body| serde_json::to_string_pretty(body).ok()) {
        Some(body) => format!("{err}\n{body}"),
        None => err.to_string(),
    }
}

fn print_body(body: &ResponseBody) -> Result<(), String> {
    match body {
        ResponseBody::Json(value) => print_json(value),
        ResponseBody::Binary(bytes) => std::io::stdout()
            .write_all(bytes)
            .map_err(|err| format!("Failed to write response body: {err}")),
        ResponseBody::Empty => Ok(()),
    }
}

fn print_json(value: &Value) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| format!("Failed to render response: {err}"))?;
    println!("{text}");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_params_keep_json_structures_only() {
        let params = build_params(&[
            ("shipmentID".to_string(), "abcd-1234".to_string()),
            ("page".to_string(), "2".to_string()),
            ("locator".to_string(), "1e3".to_string()),
            ("flag".to_string(), "true".to_string()),
            ("body".to_string(), "{\"status\":\"APPROVED\"}".to_string()),
            ("status".to_string(), "[\"NEW\",\"SUBMITTED\"]".to_string()),
        ]);
        assert_eq!(params["shipmentID"], json!("abcd-1234"));
        assert_eq!(params["page"], json!("2"));
        assert_eq!(params["locator"], json!("1e3"));
        assert_eq!(params["flag"], json!("true"));
        assert_eq!(params["body"], json!({"status": "APPROVED"}));
        assert_eq!(params["status"], json!(["NEW", "SUBMITTED"]));
    }

    #[test]
    fn test_describe_plain_errors() {
        let err = RequestError::OperationNotFound("unknown".to_string());
        assert_eq!(describe(&err), "Operation 'unknown' does not exist");
    }
}
