//! Tenant configuration store
//!
//! Persists `tenant id -> TenantConfig` as a JSON object. Two older layouts are
//! accepted on load and rewritten in the current layout on the next save:
//!
//! | Layout  | Value                                          |
//! |---------|------------------------------------------------|
//! | bare    | `"guild-1": "channel-9"`                       |
//! | legacy  | `"guild-1": {"channelId": "...", "xposts": true}` |
//! | current | `"guild-1": {"destination_id": "...", "tag": "", "features": {}}` |

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use super::json::{load_json, save_json};
use crate::models::{TenantConfig, SECONDARY_STREAM_FLAG};
use crate::utils::error::StorageError;

/// Tenant map keyed by tenant id, ordered for deterministic iteration
pub type TenantMap = BTreeMap<String, TenantConfig>;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredTenant {
    Destination(String),
    Object(StoredTenantObject),
}

#[derive(Debug, Deserialize)]
struct StoredTenantObject {
    #[serde(default, alias = "channelId")]
    destination_id: String,

    #[serde(default)]
    tag: String,

    #[serde(default)]
    features: BTreeMap<String, bool>,

    #[serde(default)]
    xposts: Option<bool>,
}

impl From<StoredTenant> for TenantConfig {
    fn from(stored: StoredTenant) -> Self {
        match stored {
            StoredTenant::Destination(destination_id) => TenantConfig::with_destination(destination_id),
            StoredTenant::Object(object) => {
                let mut features = object.features;
                if let Some(enabled) = object.xposts {
                    features
                        .entry(SECONDARY_STREAM_FLAG.to_string())
                        .or_insert(enabled);
                }
                TenantConfig {
                    destination_id: object.destination_id,
                    tag: object.tag,
                    features,
                }
            }
        }
    }
}

/// File-backed tenant configuration store
#[derive(Debug)]
pub struct TenantStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl TenantStore {
    /// Create a store backed by the given file
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    /// Read every tenant from disk
    pub async fn load(&self) -> Result<TenantMap, StorageError> {
        let stored: BTreeMap<String, StoredTenant> = load_json(&self.path).await?;
        Ok(stored
            .into_iter()
            .map(|(id, tenant)| (id, TenantConfig::from(tenant)))
            .collect())
    }

    /// Replace the whole tenant map on disk
    pub async fn save(&self, tenants: &TenantMap) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        save_json(&self.path, tenants).await
    }

    /// Read-modify-write a single tenant under the store lock
    ///
    /// The closure sees the current config (default when absent) and may reject
    /// the change by returning an error, in which case nothing is written.
    pub async fn update<F, T, E>(&self, tenant_id: &str, apply: F) -> Result<T, E>
    where
        F: FnOnce(&mut TenantConfig) -> Result<T, E>,
        E: From<StorageError>,
    {
        let _guard = self.write_lock.lock().await;

        let mut tenants = self.load().await?;
        let mut config = tenants.get(tenant_id).cloned().unwrap_or_default();
        let result = apply(&mut config)?;

        tenants.insert(tenant_id.to_string(), config);
        save_json(&self.path, &tenants).await?;

        tracing::debug!(tenant = %tenant_id, "Tenant configuration saved");
        Ok(result)
    }

    /// Store file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}
