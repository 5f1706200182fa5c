//! Dedup ledgers
//!
//! [`DeliveryLedger`] records which primary feed entries have been delivered,
//! keyed by entry identity. [`SeenIdLedger`] does the same for the secondary
//! stream, keyed by provider id. Both are read fully at the start of a cycle
//! and written through after every entry. Writes hold the ledger's lock for
//! the whole read-modify-write, so overlapping writers cannot lose updates.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use super::json::{load_json, save_json};
use crate::models::DeliveryRecord;
use crate::utils::error::StorageError;

/// On-disk row: the identity is the map key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct LedgerRow {
    title: String,
    link: String,
}

// ============================================================================
// Primary Ledger
// ============================================================================

/// Ledger of delivered primary feed entries
#[derive(Debug)]
pub struct DeliveryLedger {
    path: PathBuf,
    rows: Mutex<BTreeMap<String, LedgerRow>>,
}

impl DeliveryLedger {
    /// Open a ledger, loading any existing rows
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let rows = load_json(&path).await?;
        Ok(Self {
            path,
            rows: Mutex::new(rows),
        })
    }

    /// Re-read the ledger from disk
    pub async fn reload(&self) -> Result<(), StorageError> {
        let mut rows = self.rows.lock().await;
        *rows = load_json(&self.path).await?;
        Ok(())
    }

    /// Snapshot of every recorded identity
    pub async fn seen(&self) -> HashSet<String> {
        self.rows.lock().await.keys().cloned().collect()
    }

    /// Check whether an identity has been recorded
    pub async fn contains(&self, identity: &str) -> bool {
        self.rows.lock().await.contains_key(identity)
    }

    /// Look up a recorded entry
    pub async fn get(&self, identity: &str) -> Option<DeliveryRecord> {
        self.rows
            .lock()
            .await
            .get(identity)
            .map(|row| DeliveryRecord {
                identity: identity.to_string(),
                title: row.title.clone(),
                link: row.link.clone(),
            })
    }

    /// Number of recorded entries
    pub async fn len(&self) -> usize {
        self.rows.lock().await.len()
    }

    /// Whether the ledger is empty
    pub async fn is_empty(&self) -> bool {
        self.rows.lock().await.is_empty()
    }

    /// Record a delivered entry and persist immediately
    ///
    /// Rows are never overwritten: recording an identity twice keeps the first row.
    /// Returns `false` when the identity was already present.
    pub async fn record(&self, record: &DeliveryRecord) -> Result<bool, StorageError> {
        let mut rows = self.rows.lock().await;
        if rows.contains_key(&record.identity) {
            return Ok(false);
        }

        let mut updated = rows.clone();
        updated.insert(
            record.identity.clone(),
            LedgerRow {
                title: record.title.clone(),
                link: record.link.clone(),
            },
        );
        save_json(&self.path, &updated).await?;
        *rows = updated;

        Ok(true)
    }

    /// Ledger file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

// ============================================================================
// Secondary Ledger
// ============================================================================

/// Ledger of delivered secondary-stream ids, stored as a JSON array
#[derive(Debug)]
pub struct SeenIdLedger {
    path: PathBuf,
    ids: Mutex<Vec<String>>,
}

impl SeenIdLedger {
    /// Open a ledger, loading any existing ids
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let ids = load_json(&path).await?;
        Ok(Self {
            path,
            ids: Mutex::new(ids),
        })
    }

    /// Re-read the ledger from disk
    pub async fn reload(&self) -> Result<(), StorageError> {
        let mut ids = self.ids.lock().await;
        *ids = load_json(&self.path).await?;
        Ok(())
    }

    /// Snapshot of every recorded id
    pub async fn seen(&self) -> HashSet<String> {
        self.ids.lock().await.iter().cloned().collect()
    }

    /// Check whether an id has been recorded
    pub async fn contains(&self, id: &str) -> bool {
        self.ids.lock().await.iter().any(|seen| seen == id)
    }

    /// Number of recorded ids
    pub async fn len(&self) -> usize {
        self.ids.lock().await.len()
    }

    /// Whether the ledger is empty
    pub async fn is_empty(&self) -> bool {
        self.ids.lock().await.is_empty()
    }

    /// Record an id and persist immediately; returns `false` if already present
    pub async fn record(&self, id: &str) -> Result<bool, StorageError> {
        let mut ids = self.ids.lock().await;
        if ids.iter().any(|seen| seen == id) {
            return Ok(false);
        }

        let mut updated = ids.clone();
        updated.push(id.to_string());
        save_json(&self.path, &updated).await?;
        *ids = updated;

        Ok(true)
    }
}
