//! Standalone compliance evaluator.
//!
//! Runs one BCB 403 compliance cycle at startup, pushes the registry to the
//! collector, then repeats every `EVAL_INTERVAL_SECONDS` until Ctrl+C.

use anyhow::{Context, Result};
use clap::Parser;
use pix_sentinel::application::compliance::{ComplianceEvaluator, ComplianceJob, PushTarget};
use pix_sentinel::application::monitoring::component_health::ComponentHealthService;
use pix_sentinel::application::system::periodic_task::spawn_periodic;
use pix_sentinel::config::Config;
use pix_sentinel::domain::metrics::MetricRegistry;
use pix_sentinel::infrastructure::logging::{LogFormat, init_tracing};
use pix_sentinel::infrastructure::observability::{FraudMetrics, PushDispatcher, PushSettings};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,

    /// Skip delivery to the push collector
    #[arg(long)]
    no_push: bool,

    /// Override PUSH_JOB_NAME
    #[arg(long)]
    job_name: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing(LogFormat::from_env());
    let args = Args::parse();

    let config = Config::from_env().context("Invalid configuration")?;
    let target = PushTarget {
        destination: config.push.gateway_url.clone(),
        job_name: args.job_name.unwrap_or_else(|| config.push.job_name.clone()),
    };
    info!(
        "Compliance job starting: collector={}, job={}, interval={}s",
        target.destination, target.job_name, config.compliance.eval_interval_seconds
    );

    let registry = Arc::new(MetricRegistry::with_limits(
        config.observability.registry_limits(),
    ));
    let metrics = FraudMetrics::register(registry).context("Failed to register metrics")?;
    let signals = Arc::new(ComponentHealthService::with_compliance_signals().await);
    let evaluator = Arc::new(ComplianceEvaluator::with_default_checks(
        signals,
        metrics.clone(),
        config.compliance.check_timeout(),
    ));

    let dispatcher = (config.push.enabled && !args.no_push).then(|| {
        Arc::new(PushDispatcher::new(
            metrics.clone(),
            PushSettings {
                timeout: config.push.timeout(),
                max_retries: config.push.max_retries,
                ..PushSettings::default()
            },
        ))
    });
    let job = Arc::new(ComplianceJob::new(evaluator, dispatcher, target));

    if args.once {
        let report = job.run_cycle().await;
        info!(
            "Single cycle finished: {} requirements, {} issues",
            report.results.len(),
            report.issues().len()
        );
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let handle = spawn_periodic(
        job,
        config.compliance.eval_interval(),
        config.compliance.shutdown_grace(),
        cancel.clone(),
    );

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Waiting for in-flight cycle...");
    handle.shutdown().await;

    Ok(())
}
