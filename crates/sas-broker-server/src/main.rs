use sas_broker::config::{BrokerConfig, StaticConfigProvider};
use sas_broker::settings::StaticSettingsProvider;
use sas_broker::{ConnectionSettings, ResourceRequestManager};
use sas_broker_server::BrokerServiceBuilder;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;

#[derive(Debug, Parser)]
#[command(version)]
struct Opt {
    /// Host name to listen on.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to listen on.
    #[arg(long, default_value = "8014")]
    port: u16,

    /// JSON file of connection settings. Environment variables override it.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Restrict issued tokens to HTTPS.
    #[arg(long)]
    https_only: bool,

    /// Seconds to backdate the start time of issued tokens.
    #[arg(long, default_value = "300")]
    clock_skew_secs: u32,
}

fn setup_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();
}

fn load_settings(opt: &Opt) -> anyhow::Result<ConnectionSettings> {
    let base = match &opt.settings {
        Some(path) => ConnectionSettings::from_json_file(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?,
        None => ConnectionSettings::new(),
    };
    Ok(base.merge(ConnectionSettings::from_env()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opt = Opt::parse();
    setup_tracing();

    let settings = load_settings(&opt)?;
    if settings.is_empty() {
        tracing::warn!("no connection settings found; every token request will fail");
    }
    tracing::info!(keys = ?settings.keys().collect::<Vec<_>>(), "settings loaded");

    let mut config = BrokerConfig::default();
    config.clock_skew_secs = opt.clock_skew_secs;
    config.https_only = opt.https_only;
    let manager = ResourceRequestManager::with_config(Arc::new(StaticConfigProvider::new(Arc::new(config))));

    let router = BrokerServiceBuilder::new(manager, StaticSettingsProvider::new(Arc::new(settings))).build();

    let addr = format!("{}:{}", opt.host, opt.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("server is running at http://{addr}");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    tracing::info!("server is stopped");
    Ok(())
}
