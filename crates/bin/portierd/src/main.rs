//! # portierd: portier daemon
//!
//! Composition root that loads the opening hours and keeps the entry door
//! in the state they ask for.
//!
//! ## Responsibilities
//! - Parse configuration (env vars, config file)
//! - Initialize tracing
//! - Build the rule set, the holiday calendar and the resolver
//! - Connect the configured door backend (virtual or MQTT)
//! - Run the door scheduler until SIGINT/SIGTERM
//! - Reload the opening hours on SIGHUP
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer. No domain logic belongs here.

mod config;
mod door;

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use portier_adapter_virtual::StaticHolidayCalendar;
use portier_app::resolver::OpeningHoursResolver;
use portier_app::scheduler::DoorScheduler;
use portier_domain::time;

use config::{Config, ConfigError};
use door::ConfiguredDoor;

type Scheduler = DoorScheduler<Arc<ConfiguredDoor>, StaticHolidayCalendar>;

/// How many upcoming openings to log at startup and after a reload.
const UPCOMING_PREVIEW: usize = 3;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    init_tracing(&config.logging.filter);

    let resolver = build_resolver(&config).context("failed to build opening hours")?;
    let door = Arc::new(ConfiguredDoor::connect(&config).context("failed to set up door backend")?);
    tracing::info!(
        backend = door.name(),
        timezone = %config.location.timezone,
        country = %config.location.country,
        "starting portierd"
    );

    let scheduler = DoorScheduler::new(Arc::clone(&door), resolver, config.scheduler());
    scheduler.start()?;
    log_status(&scheduler);

    wait_for_shutdown(&scheduler).await?;

    scheduler.stop().await;
    door.teardown().await;
    tracing::info!("portierd stopped");
    Ok(())
}

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|err| {
        eprintln!("invalid log filter {filter:?} ({err}), falling back to info");
        EnvFilter::new("info")
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn build_resolver(
    config: &Config,
) -> Result<OpeningHoursResolver<StaticHolidayCalendar>, ConfigError> {
    let rules = config.rule_set()?;
    if rules.is_empty() {
        tracing::warn!("no opening hours configured, the door stays locked");
    }
    Ok(OpeningHoursResolver::new(
        rules,
        config.location.timezone,
        config.location.country.clone(),
        config.holiday_calendar(),
    ))
}

fn log_status(scheduler: &Scheduler) {
    let status = scheduler.current();
    tracing::info!(
        state = %status.state,
        valid_until = ?status.valid_until,
        "door scheduler running"
    );
    for interval in scheduler
        .resolver()
        .upcoming_intervals(time::now(), UPCOMING_PREVIEW)
    {
        tracing::info!(%interval, "upcoming opening");
    }
}

/// Re-read the configuration and swap in the new opening hours. A broken
/// configuration keeps the previous ones.
async fn reload(scheduler: &Scheduler) {
    tracing::info!("reloading opening hours");
    let resolver = match Config::load().and_then(|config| build_resolver(&config)) {
        Ok(resolver) => resolver,
        Err(err) => {
            tracing::error!(error = ?err, "invalid configuration, keeping previous opening hours");
            return;
        }
    };
    match scheduler.replace_resolver(resolver).await {
        Ok(()) => log_status(scheduler),
        Err(err) => tracing::error!(%err, "failed to replace opening hours"),
    }
}

#[cfg(unix)]
async fn wait_for_shutdown(scheduler: &Scheduler) -> anyhow::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = signal(SignalKind::terminate()).context("failed to listen for SIGTERM")?;
    let mut hangup = signal(SignalKind::hangup()).context("failed to listen for SIGHUP")?;

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result.context("failed to listen for SIGINT")?;
                tracing::info!("received SIGINT, shutting down");
                return Ok(());
            }
            _ = terminate.recv() => {
                tracing::info!("received SIGTERM, shutting down");
                return Ok(());
            }
            _ = hangup.recv() => reload(scheduler).await,
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown(_scheduler: &Scheduler) -> anyhow::Result<()> {
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    tracing::info!("received Ctrl-C, shutting down");
    Ok(())
}
