use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use promstorm::{
    load_templates, logging, Cli, Command, IntervalTicker, Scheduler, Settings, Workload,
};
use promstorm_client::PrometheusClient;
use tracing::{info, warn};

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(Command::Version) = &cli.command {
        println!("promstorm {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let settings = Settings::load(&cli).context("loading configuration")?;
    logging::init(&settings.log_level);

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;

    rt.block_on(run(settings))
}

async fn run(settings: Settings) -> Result<()> {
    let client = PrometheusClient::builder()
        .endpoint(&settings.prom_url)
        .bearer_token(settings.auth_token.clone().unwrap_or_default())
        .query_timeout(settings.query_timeout)
        .build()
        .context("building Prometheus client")?;

    let entities = client
        .label_values(&settings.label)
        .await
        .with_context(|| format!("fetching values of label {:?}", settings.label))?;

    let templates = load_templates(&settings.query_file).context("loading query templates")?;
    if templates.is_empty() {
        warn!(
            file = %settings.query_file.display(),
            "no query templates loaded; rounds will issue no queries"
        );
    }

    info!(
        prom_url = %settings.prom_url,
        label = %settings.label,
        entities = entities.len(),
        templates = templates.len(),
        workers = settings.num_threads,
        range = %settings.range,
        step_secs = settings.step.as_secs(),
        ticker_ms = settings.ticker.as_millis() as u64,
        "starting load generator"
    );

    let workload = Workload::new(templates, entities)
        .workers(settings.num_threads)
        .entity_delay(settings.sleep);
    info!(
        queries_per_round = workload.queries_per_round(),
        "workload ready"
    );

    let scheduler = Scheduler::new(workload, Arc::new(client), settings.range, settings.step);
    scheduler.run(IntervalTicker::new(settings.ticker)).await;

    Ok(())
}
