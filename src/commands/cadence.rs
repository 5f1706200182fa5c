use anyhow::Result;

use feedcast::config::Config;
use feedcast::scheduler::{Clock, SystemClock};

/// Print the cadence in effect at the current local time
pub fn cadence(config: &Config) -> Result<()> {
    let policy = config.schedule.cadence_policy()?;
    let now = SystemClock.now();
    let cadence = policy.cadence_at(now.time());

    println!("Local time: {}", now.format("%Y-%m-%d %H:%M"));
    println!(
        "Cadence: {cadence} (every {} min)",
        policy.interval_minutes(cadence)
    );
    println!(
        "This minute is {}a poll slot",
        if policy.is_poll_slot(now) { "" } else { "not " }
    );
    Ok(())
}
