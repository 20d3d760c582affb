//! Binary composition root. `main` is a two-line `#[tokio::main]` shim
//! around [`start`], the same split `autopilot::main` / `autopilot::start`
//! uses.

pub mod arguments;
pub mod run;

use clap::Parser;
use std::{collections::HashMap, sync::Arc};

pub async fn start(args: impl Iterator<Item = String>) -> anyhow::Result<()> {
    let args = arguments::Arguments::parse_from(args);

    observe::init_tracing(&observe::TracingConfig {
        log_filter: args.log_filter.clone(),
        use_json: args.log_json,
    });
    tracing::info!(%args, "starting auction engine");

    let orchestrator = Arc::new(run::build(&args, HashMap::new()));
    run::serve(orchestrator).await;

    tracing::info!("auction engine shut down");
    Ok(())
}
