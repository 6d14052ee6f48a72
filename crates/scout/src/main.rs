use anyhow::Result;

mod cli;
mod fetcher_impls;
mod fetcher_traits;
mod metrics;
mod report;

#[tokio::main]
async fn main() -> Result<()> {
    let args = match cli::parse_args(std::env::args()) {
        Ok(args) => args,
        Err(usage) => {
            eprintln!("{usage}");
            std::process::exit(2);
        }
    };

    let config = match &args.config_path {
        Some(path) => common::config::Config::load_from(path)?,
        None => common::config::Config::load()?,
    };

    let (dispatch, _otel_guard) =
        common::observability::build_dispatch("scout", &config.general.log_level);
    tracing::dispatcher::set_global_default(dispatch).map_err(anyhow::Error::msg)?;

    if let Some(port) = config.observability.prometheus_port {
        metrics::install_prometheus(port)?;
        tracing::info!(port, "prometheus exporter listening");
    }
    metrics::describe();

    let api_key = config.positions_api_key();
    if api_key.is_none() {
        tracing::warn!(
            env = %config.api.positions_api_key_env,
            "positions API key not set, requests are sent unauthenticated"
        );
    }
    let client = common::client::FeedClient::new(&config.api, api_key)?;
    let settings = report::ReportSettings::from_config(&config);

    tracing::info!(command = ?args.command, "scout starting");
    let output = cli::run_command(&client, &settings, &args).await?;
    println!("{output}");
    Ok(())
}
