mod cli;

use alarm_relay::config::RelayConfig;
use alarm_relay::logs::CloudWatchLogStore;
use alarm_relay::params::SsmParameterStore;
use alarm_relay::slack::SlackNotifier;
use alarm_relay::window::LOOKBACK_SECS;
use alarm_relay::{AlarmEvent, Pipeline, RelayResponse};
use anyhow::{Context, Result};
use aws_config::BehaviorVersion;
use clap::Parser;
use cli::{Cli, Commands};
use lambda_runtime::{service_fn, LambdaEvent};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Serve);

    init_tracing(cli.verbose, matches!(command, Commands::Serve));

    let config_path = match &cli.config {
        Some(path) => Some(path.to_str().context("Invalid config path")?.to_string()),
        None => None,
    };
    let config = RelayConfig::load(config_path.as_deref()).context("Failed to load configuration")?;

    match command {
        Commands::Serve => handle_serve(config).await?,
        Commands::Invoke { time } => handle_invoke(config, time).await?,
        Commands::Check => handle_check(&config)?,
    }

    Ok(())
}

fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // CloudWatch indexes one JSON object per line.
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn build_pipeline(config: RelayConfig) -> Result<Pipeline> {
    let sdk_config = aws_config::defaults(BehaviorVersion::latest()).load().await;

    let pipeline = Pipeline::new(
        config,
        Arc::new(SsmParameterStore::new(&sdk_config)),
        Arc::new(CloudWatchLogStore::new(&sdk_config)),
        Arc::new(SlackNotifier::new()),
    )?;
    Ok(pipeline)
}

async fn handle_serve(config: RelayConfig) -> Result<()> {
    let pipeline = Arc::new(build_pipeline(config).await?);
    tracing::info!("Cold start complete, starting Lambda runtime");

    lambda_runtime::run(service_fn(move |event: LambdaEvent<AlarmEvent>| {
        let pipeline = pipeline.clone();
        async move {
            pipeline
                .handle(&event.payload)
                .await
                .map_err(lambda_runtime::Error::from)
        }
    }))
    .await
    .map_err(|e| anyhow::anyhow!("Lambda runtime exited: {}", e))
}

async fn handle_invoke(config: RelayConfig, time: String) -> Result<()> {
    let pipeline = build_pipeline(config).await?;
    let response: RelayResponse = pipeline.handle(&AlarmEvent::at(time)).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn handle_check(config: &RelayConfig) -> Result<()> {
    let filter = config.filter.build()?;

    println!("\n🔑 Parameters:");
    println!("  Log group:   {}", config.parameters.log_group);
    println!("  Webhook URL: {}", config.parameters.webhook_url);
    println!("  Decrypt:     {}", config.parameters.decrypt);

    println!("\n🔎 Filter: {}", filter.describe());
    match filter.store_pattern() {
        Some(pattern) => println!("  Store filter pattern: {}", pattern),
        None => println!("  Store filter pattern: none (matched locally)"),
    }

    println!("\n⏱  Lookback: {}s before the alarm time, no upper bound", LOOKBACK_SECS);
    println!("\n Configuration is valid!");

    Ok(())
}
