//! Tenant Registry
//!
//! A [`TenantRegistry`] is an immutable snapshot of tenant configuration taken
//! at the start of a poll cycle and passed to the dispatcher for that cycle.
//! Changes made through the administrative functions below land in the
//! [`TenantStore`] and take effect on the next snapshot, never mid-cycle.
//!
//! # Preconditions
//!
//! A tag or feature flag may only be set on a tenant that already has a
//! destination. [`TenantRegistry::require_destination`] exposes that check to
//! callers that only hold a snapshot; [`set_tag`] and [`toggle_feature`]
//! enforce it inside the store's read-modify-write.

use std::collections::BTreeMap;

use crate::error::Result;
use crate::models::TenantConfig;
use crate::storage::{TenantMap, TenantStore};
use crate::utils::error::RegistryError;

// ============================================================================
// Snapshot
// ============================================================================

/// Point-in-time view of every tenant, iterated in tenant-id order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TenantRegistry {
    tenants: TenantMap,
}

impl TenantRegistry {
    /// Take a fresh snapshot from the store
    pub async fn load(store: &TenantStore) -> Result<Self> {
        let tenants = store.load().await?;
        tracing::debug!(tenants = tenants.len(), "Tenant registry reloaded");
        Ok(Self { tenants })
    }

    /// Build a snapshot from an in-memory map
    pub fn from_map(tenants: TenantMap) -> Self {
        Self { tenants }
    }

    /// Number of tenants, with or without a destination
    pub fn len(&self) -> usize {
        self.tenants.len()
    }

    /// Whether no tenant is registered at all
    pub fn is_empty(&self) -> bool {
        self.tenants.is_empty()
    }

    /// Look up one tenant
    pub fn get(&self, tenant_id: &str) -> Option<&TenantConfig> {
        self.tenants.get(tenant_id)
    }

    /// Iterate over every tenant
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TenantConfig)> {
        self.tenants.iter().map(|(id, config)| (id.as_str(), config))
    }

    /// Tenants that have a destination configured
    pub fn deliverable(&self) -> Self {
        self.filtered(|config| config.has_destination())
    }

    /// Deliverable tenants with the named feature enabled
    pub fn with_feature(&self, name: &str) -> Self {
        self.filtered(|config| config.has_destination() && config.feature(name))
    }

    /// Check that a tenant may receive tag or feature changes
    pub fn require_destination(&self, tenant_id: &str) -> std::result::Result<(), RegistryError> {
        match self.tenants.get(tenant_id) {
            Some(config) if config.has_destination() => Ok(()),
            _ => Err(RegistryError::NoDestination(tenant_id.to_string())),
        }
    }

    fn filtered(&self, keep: impl Fn(&TenantConfig) -> bool) -> Self {
        let tenants: BTreeMap<_, _> = self
            .tenants
            .iter()
            .filter(|(_, config)| keep(config))
            .map(|(id, config)| (id.clone(), config.clone()))
            .collect();
        Self { tenants }
    }
}

// ============================================================================
// Administrative Mutations
// ============================================================================

/// Point a tenant at a destination, creating the tenant if needed
pub async fn set_destination(
    store: &TenantStore,
    tenant_id: &str,
    destination_id: &str,
) -> Result<()> {
    validate_tenant_id(tenant_id)?;
    let destination_id = destination_id.trim();
    if destination_id.is_empty() {
        return Err(RegistryError::EmptyDestination.into());
    }

    store
        .update(tenant_id, |config| -> Result<()> {
            config.destination_id = destination_id.to_string();
            Ok(())
        })
        .await?;

    tracing::info!(tenant = %tenant_id, destination = %destination_id, "Destination set");
    Ok(())
}

/// Set or clear (empty string) a tenant's delivery tag
pub async fn set_tag(store: &TenantStore, tenant_id: &str, tag: &str) -> Result<()> {
    validate_tenant_id(tenant_id)?;
    let tag = tag.trim();

    store
        .update(tenant_id, |config| -> Result<()> {
            ensure_destination(tenant_id, config)?;
            config.tag = tag.to_string();
            Ok(())
        })
        .await?;

    if tag.is_empty() {
        tracing::info!(tenant = %tenant_id, "Tag cleared");
    } else {
        tracing::info!(tenant = %tenant_id, tag = %tag, "Tag set");
    }
    Ok(())
}

/// Flip a feature flag, returning its new value
pub async fn toggle_feature(store: &TenantStore, tenant_id: &str, flag: &str) -> Result<bool> {
    validate_tenant_id(tenant_id)?;

    let enabled = store
        .update(tenant_id, |config| -> Result<bool> {
            ensure_destination(tenant_id, config)?;
            let enabled = !config.feature(flag);
            config.features.insert(flag.to_string(), enabled);
            Ok(enabled)
        })
        .await?;

    tracing::info!(tenant = %tenant_id, flag = %flag, enabled, "Feature toggled");
    Ok(enabled)
}

fn validate_tenant_id(tenant_id: &str) -> std::result::Result<(), RegistryError> {
    if tenant_id.trim().is_empty() {
        return Err(RegistryError::EmptyTenantId);
    }
    Ok(())
}

fn ensure_destination(
    tenant_id: &str,
    config: &TenantConfig,
) -> std::result::Result<(), RegistryError> {
    if config.has_destination() {
        Ok(())
    } else {
        Err(RegistryError::NoDestination(tenant_id.to_string()))
    }
}
