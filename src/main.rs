use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use solaredge::cli::{Args, Command, SiteArgs, SiteQuery};
use solaredge::config::Config;
use solaredge::logging::init_logging;
use solaredge::relay::{Relay, RelayPhase, RelaySettings};
use solaredge::site::SiteClient;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref()).context("cannot load configuration")?;
    args.apply(&mut config);
    init_logging(&config.logging).context("cannot initialize logging")?;

    match &args.command {
        Command::Site(site) => run_site(&config, site).await,
        Command::Serve(_) => run_serve(&config).await,
    }
}

async fn run_site(config: &Config, args: &SiteArgs) -> Result<()> {
    config.validate().context("invalid configuration")?;
    config.validate_site().context("invalid configuration")?;
    let site = SiteClient::from_config(&config.api)?;

    let output = match args.query {
        SiteQuery::Details => pretty(&site.details().await?)?,
        SiteQuery::Inventory => pretty(&site.inventory().await?)?,
        SiteQuery::StorageData => {
            let (start, end) = args.range(chrono::Utc::now())?;
            pretty(&site.storage_data(&start, &end).await?)?
        }
        SiteQuery::PowerDetails => {
            let (start, end) = args.range(chrono::Utc::now())?;
            pretty(&site.power_details(&start, &end).await?)?
        }
        SiteQuery::EnergyDetails { time_unit } => {
            let (start, end) = args.range(chrono::Utc::now())?;
            pretty(&site.energy_details(time_unit, &start, &end).await?)?
        }
        SiteQuery::PowerFlow => pretty(&site.power_flow().await?)?,
        SiteQuery::Overview => pretty(&site.overview().await?)?,
    };
    println!("{output}");
    Ok(())
}

async fn run_serve(config: &Config) -> Result<()> {
    // Everything configurable is checked before the first request or bind
    config.validate_relay().context("invalid configuration")?;
    let site = SiteClient::from_config(&config.api)?;
    info!(
        "Starting relay for site {} against {}",
        site.site_id(),
        config.api.base_url
    );

    let relay = Relay::new(Arc::new(site), RelaySettings::from(&config.relay))
        .await
        .context("cannot fetch site details")?;
    let relay = Arc::new(relay);

    let phase = relay.initialize().await;
    if phase != RelayPhase::Ready {
        warn!("Serving before all snapshots are available ({phase:?})");
    }
    let _refresh = relay.spawn();

    solaredge::web::serve(relay, &config.relay.listen).await
}

fn pretty<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
