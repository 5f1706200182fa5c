use anyhow::Result;

use feedcast::config::Config;
use feedcast::registry::{self, TenantRegistry};
use feedcast::storage::TenantStore;

fn store(config: &Config) -> TenantStore {
    TenantStore::new(&config.storage.tenants_path)
}

pub async fn set_destination(config: &Config, tenant: &str, destination: &str) -> Result<()> {
    registry::set_destination(&store(config), tenant, destination).await?;
    println!("Destination for {tenant} set to {destination}");
    Ok(())
}

pub async fn set_tag(config: &Config, tenant: &str, tag: &str) -> Result<()> {
    registry::set_tag(&store(config), tenant, tag).await?;
    if tag.trim().is_empty() {
        println!("Tag for {tenant} cleared");
    } else {
        println!("Tag for {tenant} set to {}", tag.trim());
    }
    Ok(())
}

pub async fn toggle_feature(config: &Config, tenant: &str, flag: &str) -> Result<()> {
    let enabled = registry::toggle_feature(&store(config), tenant, flag).await?;
    println!(
        "Feature {flag} for {tenant} is now {}",
        if enabled { "enabled" } else { "disabled" }
    );
    Ok(())
}

pub async fn list_tenants(config: &Config) -> Result<()> {
    let registry = TenantRegistry::load(&store(config)).await?;

    if registry.is_empty() {
        println!("No tenants configured");
        return Ok(());
    }

    println!("{:<24} {:<40} {:<12} Features", "Tenant", "Destination", "Tag");
    for (id, tenant) in registry.iter() {
        let features: Vec<_> = tenant
            .features
            .iter()
            .filter(|(_, enabled)| **enabled)
            .map(|(name, _)| name.as_str())
            .collect();
        println!(
            "{:<24} {:<40} {:<12} {}",
            id,
            if tenant.has_destination() { tenant.destination_id.as_str() } else { "-" },
            tenant.tag().unwrap_or("-"),
            features.join(", ")
        );
    }
    Ok(())
}
