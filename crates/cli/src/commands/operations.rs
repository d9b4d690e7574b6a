use std::path::Path;
use std::sync::Arc;

use clap::Args;
use moveportal_core::{ClientRegistry, CookieJar, Surface};

use super::{load_config, run_cli_async};

#[derive(Args, Debug, Clone)]
pub struct OperationsArgs {
    #[arg(value_name = "SURFACE", help = "API surface: internal, admin, ghc or prime")]
    pub surface: Surface,
}

pub async fn run(config: Option<&Path>, args: OperationsArgs) -> i32 {
    run_cli_async(|| run_inner(config, args)).await
}

async fn run_inner(config: Option<&Path>, args: OperationsArgs) -> Result<(), String> {
    let config = load_config(config)?;
    let registry = ClientRegistry::new(config, Arc::new(CookieJar::new()));
    let client = registry
        .client(args.surface)
        .await
        .map_err(|err| err.to_string())?;

    for (operation_id, route) in client.operations() {
        println!("{operation_id}\t{route}");
    }
    Ok(())
}
