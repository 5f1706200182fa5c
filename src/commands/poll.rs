use anyhow::{Context, Result};

use feedcast::config::Config;
use feedcast::relay::Relay;

/// Run exactly one poll cycle and print its report
pub async fn poll(config: Config) -> Result<()> {
    let relay = Relay::from_config(&config)
        .await
        .context("Failed to initialize relay")?;

    let report = tokio::time::timeout(config.schedule.cycle_timeout(), relay.run_cycle())
        .await
        .with_context(|| {
            format!(
                "Poll cycle exceeded {}s",
                config.schedule.cycle_timeout_secs
            )
        })??;

    println!("Poll cycle {}", report.cycle_id);
    if report.is_noop() {
        println!("  No tenants configured; nothing to do");
        return Ok(());
    }

    println!("  Tenants: {}", report.tenants);
    println!("  New entries: {}", report.new_entries);
    println!("  Secondary posts: {}", report.secondary_posts);
    println!(
        "  Deliveries: {} ok, {} failed",
        report.deliveries, report.failures
    );

    if let Some(e) = &report.primary_error {
        println!("  Primary feed error: {e}");
    }
    if let Some(e) = &report.secondary_error {
        println!("  Secondary feed error: {e}");
    }

    if report.has_errors() {
        anyhow::bail!("Poll cycle finished with errors");
    }
    Ok(())
}
