pub mod call;
pub mod operations;

use std::path::Path;

use moveportal_core::PortalConfig;
use tracing::debug;

pub async fn run_cli_async<F, Fut>(f: F) -> i32
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<(), String>>,
{
    match f().await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{err}");
            1
        }
    }
}

/// Config from `--config` if given, otherwise defaults plus environment.
pub fn load_config(path: Option<&Path>) -> Result<PortalConfig, String> {
    let config = match path {
        Some(path) => PortalConfig::load(path),
        None => PortalConfig::from_env(),
    }
    .map_err(|err| err.to_string())?;
    debug!(base_url = %config.base_url, "Loaded portal configuration.");
    Ok(config)
}

/// Parse a `name=value` argument.
pub fn parse_key_value(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got '{arg}'")),
    }
}
