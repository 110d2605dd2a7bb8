//! Headless match-3 server.
//!
//! ```text
//! gem-cascade serve [--host H] [--port P] [--config FILE]
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

use gem_cascade::serve::{parse_serve_args, run_serve};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(serve_args) = parse_serve_args(&args)? else {
        return Err(anyhow!(
            "usage: gem-cascade serve [--host H] [--port P] [--config FILE]"
        ));
    };

    if let Err(e) = run_serve(serve_args).await {
        tracing::error!(error = %e, "server stopped");
        return Err(e);
    }
    Ok(())
}
