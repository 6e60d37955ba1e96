use anyhow::{Context, Result};
use aws_config::{BehaviorVersion, Region};
use aws_sdk_cloudwatchlogs::types::InputLogEvent;
use aws_sdk_cloudwatchlogs::Client;
use chrono::Local;
use clap::Parser;
use rand::Rng;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "logseed")]
#[command(about = "Generate test logs for CloudWatch", long_about = None)]
struct Args {
    /// CloudWatch log group name
    #[arg(long)]
    log_group: String,

    /// CloudWatch log stream name (created if missing)
    #[arg(long)]
    log_stream: String,

    /// Number of logs to generate
    #[arg(short, long, default_value = "10")]
    num_logs: usize,

    /// AWS region
    #[arg(long, default_value = "us-east-1")]
    region: String,

    /// AWS profile name
    #[arg(long)]
    profile: Option<String>,

    /// Share of entries labelled ERROR (0.0 - 1.0)
    #[arg(short, long, default_value = "0.3")]
    error_rate: f64,

    /// Print the generated entries as JSON lines instead of writing them
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct SeedEvent {
    timestamp: i64,
    message: String,
}

struct LogGenerator {
    error_rate: f64,
}

impl LogGenerator {
    fn new(error_rate: f64) -> Self {
        Self {
            error_rate: error_rate.clamp(0.0, 1.0),
        }
    }

    fn generate_log(&self, index: usize, rng: &mut impl Rng) -> SeedEvent {
        let now = Local::now();
        let level = if rng.gen::<f64>() < self.error_rate {
            "ERROR"
        } else {
            "INFO"
        };

        SeedEvent {
            timestamp: now.timestamp_millis(),
            message: format!(
                "{}: Test {} message {} at {}",
                level,
                level.to_lowercase(),
                index,
                now.format("%Y-%m-%d %H:%M:%S%.6f")
            ),
        }
    }

    fn generate(&self, count: usize, rng: &mut impl Rng) -> Vec<SeedEvent> {
        (0..count).map(|i| self.generate_log(i, rng)).collect()
    }
}

async fn build_client(region: &str, profile: Option<&str>) -> Client {
    let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region.to_string()));
    if let Some(profile) = profile {
        loader = loader.profile_name(profile);
    }
    Client::new(&loader.load().await)
}

async fn ensure_log_stream(client: &Client, log_group: &str, log_stream: &str) -> Result<()> {
    match client
        .create_log_stream()
        .log_group_name(log_group)
        .log_stream_name(log_stream)
        .send()
        .await
    {
        Ok(_) => {
            tracing::info!("Created log stream {}", log_stream);
            Ok(())
        }
        Err(e)
            if e.as_service_error()
                .map(|se| se.is_resource_already_exists_exception())
                .unwrap_or(false) =>
        {
            tracing::info!("Log stream {} already exists", log_stream);
            Ok(())
        }
        Err(e) => Err(anyhow::Error::new(e)
            .context(format!("Failed to create log stream {}/{}", log_group, log_stream))),
    }
}

/// `PutLogEvents` limits: event count and payload size (message bytes plus
/// 26 bytes per event).
const MAX_BATCH_EVENTS: usize = 10_000;
const MAX_BATCH_BYTES: usize = 1_048_576;
const EVENT_OVERHEAD_BYTES: usize = 26;

fn batches(events: &[SeedEvent]) -> Vec<&[SeedEvent]> {
    let mut batches = Vec::new();
    let mut start = 0;
    let mut bytes = 0;

    for (i, event) in events.iter().enumerate() {
        let size = event.message.len() + EVENT_OVERHEAD_BYTES;
        if i > start && (i - start == MAX_BATCH_EVENTS || bytes + size > MAX_BATCH_BYTES) {
            batches.push(&events[start..i]);
            start = i;
            bytes = 0;
        }
        bytes += size;
    }
    if start < events.len() {
        batches.push(&events[start..]);
    }
    batches
}

async fn put_batch(client: &Client, log_group: &str, log_stream: &str, events: &[SeedEvent]) -> Result<()> {
    let log_events = events
        .iter()
        .map(|event| {
            InputLogEvent::builder()
                .timestamp(event.timestamp)
                .message(&event.message)
                .build()
                .context("Failed to build log event")
        })
        .collect::<Result<Vec<_>>>()?;

    let output = client
        .put_log_events()
        .log_group_name(log_group)
        .log_stream_name(log_stream)
        .set_log_events(Some(log_events))
        .send()
        .await
        .context("Failed to put log events")?;

    if let Some(rejected) = output.rejected_log_events_info() {
        tracing::warn!("Some log events were rejected: {:?}", rejected);
    }
    Ok(())
}

async fn put_events(client: &Client, log_group: &str, log_stream: &str, events: &[SeedEvent]) -> Result<()> {
    let batches = batches(events);
    let total = batches.len();
    for (i, batch) in batches.into_iter().enumerate() {
        put_batch(client, log_group, log_stream, batch)
            .await
            .with_context(|| format!("Batch {}/{} failed", i + 1, total))?;
        tracing::debug!("Wrote batch {}/{} ({} events)", i + 1, total, batch.len());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let generator = LogGenerator::new(args.error_rate);
    let events = generator.generate(args.num_logs, &mut rand::thread_rng());
    let errors = events.iter().filter(|e| e.message.starts_with("ERROR")).count();

    if args.dry_run {
        for event in &events {
            println!("{}", serde_json::to_string(event)?);
        }
        tracing::info!("Generated {} test logs ({} errors), dry run", events.len(), errors);
        return Ok(());
    }

    if events.is_empty() {
        tracing::info!("Nothing to write");
        return Ok(());
    }

    let client = build_client(&args.region, args.profile.as_deref()).await;
    ensure_log_stream(&client, &args.log_group, &args.log_stream).await?;
    put_events(&client, &args.log_group, &args.log_stream, &events).await?;

    tracing::info!(
        "Successfully generated {} test logs ({} errors) in {}/{}",
        events.len(),
        errors,
        args.log_group,
        args.log_stream
    );
    Ok(())
}
