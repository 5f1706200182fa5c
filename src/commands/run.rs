use anyhow::{Context, Result};
use std::sync::Arc;

use feedcast::config::Config;
use feedcast::relay::Relay;
use feedcast::scheduler::HeartbeatScheduler;

/// Start the heartbeat scheduler and poll until Ctrl-C
pub async fn run(config: Config) -> Result<()> {
    let policy = config
        .schedule
        .cadence_policy()
        .context("Invalid schedule")?;
    let relay = Relay::from_config(&config)
        .await
        .context("Failed to initialize relay")?;

    println!("Feed relay started");
    println!("==================");
    println!("  Feed: {}", config.feed.url);
    if let Some(secondary) = &config.secondary {
        println!("  Secondary feed: {}", secondary.url);
    }
    println!(
        "  Day window: {}-{} every {} min, night every {} min",
        config.schedule.day_start,
        config.schedule.night_start,
        config.schedule.day_interval_minutes,
        config.schedule.night_interval_minutes
    );
    println!("  Tenants: {}", config.storage.tenants_path.display());
    println!("  Ledger: {}", config.storage.ledger_path.display());

    let scheduler = HeartbeatScheduler::new(policy, Arc::new(relay))
        .with_check_period(config.schedule.heartbeat())
        .with_cycle_timeout(config.schedule.cycle_timeout())
        .with_poll_on_startup(config.schedule.poll_on_startup);

    scheduler.run(shutdown_signal()).await;

    println!("Feed relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C; running until killed");
        std::future::pending::<()>().await;
    }
}
