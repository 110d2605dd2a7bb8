//! `serve` subcommand: run the headless engine behind the TCP adapter.

use anyhow::{anyhow, Result};
use tokio::sync::oneshot;

use crate::adapter::{serve, GameConfigFile, ServerConfig};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeArgs {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub config_path: Option<String>,
}

/// Parse `serve [--host H] [--port P] [--config FILE]`.
///
/// Returns `Ok(None)` when the first argument is not `serve`.
pub fn parse_serve_args(args: &[String]) -> Result<Option<ServeArgs>> {
    if args.first().map(String::as_str) != Some("serve") {
        return Ok(None);
    }

    let mut out = ServeArgs {
        host: None,
        port: None,
        config_path: None,
    };
    let mut it = args[1..].iter();
    while let Some(arg) = it.next() {
        let mut value = |flag: &str| {
            it.next()
                .cloned()
                .ok_or_else(|| anyhow!("serve: missing value for {}", flag))
        };
        match arg.as_str() {
            "--host" => out.host = Some(value("--host")?),
            "--port" => {
                let v = value("--port")?;
                out.port = Some(
                    v.parse::<u16>()
                        .map_err(|_| anyhow!("serve: invalid --port value: {}", v))?,
                );
            }
            "--config" => out.config_path = Some(value("--config")?),
            other => return Err(anyhow!("serve: unknown argument: {}", other)),
        }
    }

    Ok(Some(out))
}

impl ServeArgs {
    /// Command-line flags win over `MATCH3_*` environment variables.
    pub fn server_config(&self) -> ServerConfig {
        let mut config = ServerConfig::from_env();
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(path) = &self.config_path {
            config.config_path = Some(path.clone());
        }
        config
    }
}

/// Build the engine and serve until Ctrl-C.
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let config = args.server_config();
    let game = match &config.config_path {
        Some(path) => GameConfigFile::load(path)?,
        None => GameConfigFile::default(),
    };
    let engine = game.build_engine()?;
    tracing::info!(
        rows = game.rows,
        cols = game.cols,
        gem_kinds = game.gem_kinds,
        config = config.config_path.as_deref().unwrap_or("<default>"),
        "engine ready"
    );

    let (stop_tx, stop_rx) = oneshot::channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown requested");
        }
        let _ = stop_tx.send(());
    });

    serve(config, engine, None, stop_rx).await
}
