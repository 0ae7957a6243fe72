//! Persisted "paid" flags, keyed by the `from-to` member pair.
//!
//! Transfers are regenerated on every recompute, so the only identity a flag
//! can attach to is the pair of member ids. If balances shift and a pair's
//! amount changes, the old flag still applies to the new amount; if the
//! direction reverses, the old flag is simply no longer looked up.

use crate::error::{Result, SettleError};
use crate::model::Transfer;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Lookup key for a transfer's persisted flag.
///
/// Ids containing `-` can collide (`"a-b","c"` and `"a","b-c"`); the format
/// is kept as-is for compatibility with stored records.
pub fn pair_key(from: &str, to: &str) -> String {
    format!("{}-{}", from, to)
}

/// Overlays persisted flags onto freshly computed transfers.
///
/// Pairs without a record default to unpaid. No transfer is added or dropped.
pub fn merge_settlement_flags(
    transfers: Vec<Transfer>,
    persisted: &HashMap<String, bool>,
) -> Vec<Transfer> {
    transfers
        .into_iter()
        .map(|mut transfer| {
            transfer.is_settled = persisted
                .get(&pair_key(&transfer.from, &transfer.to))
                .copied()
                .unwrap_or(false);
            transfer
        })
        .collect()
}

/// External store of settlement flags.
#[async_trait]
pub trait SettlementFlagStore: Send + Sync {
    /// Every stored flag, keyed by [`pair_key`].
    async fn get_all(&self) -> Result<HashMap<String, bool>>;

    /// Upserts the flag for `(from, to)`.
    async fn set_flag(&self, from: &str, to: &str, value: bool) -> Result<()>;

    /// Deletes the record for `(from, to)`, if any.
    async fn remove(&self, from: &str, to: &str) -> Result<()>;
}

/// Flips the paid flag of a displayed transfer.
pub async fn toggle_settlement<S>(store: &S, from: &str, to: &str, current: bool) -> Result<()>
where
    S: SettlementFlagStore + ?Sized,
{
    store.set_flag(from, to, !current).await
}

/// A stored flag with its bookkeeping timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementRecord {
    pub from: String,
    pub to: String,
    pub is_settled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// In-process flag store.
///
/// Read-then-write without cross-call locking: concurrent toggles of one pair
/// resolve last-write-wins.
#[derive(Debug, Default)]
pub struct MemoryFlagStore {
    records: RwLock<Vec<SettlementRecord>>,
}

impl MemoryFlagStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the stored records, in insertion order.
    pub async fn records(&self) -> Vec<SettlementRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl SettlementFlagStore for MemoryFlagStore {
    async fn get_all(&self) -> Result<HashMap<String, bool>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .map(|r| (pair_key(&r.from, &r.to), r.is_settled))
            .collect())
    }

    async fn set_flag(&self, from: &str, to: &str, value: bool) -> Result<()> {
        if from.is_empty() || to.is_empty() {
            return Err(SettleError::FlagWrite {
                from: from.to_string(),
                to: to.to_string(),
                message: "empty member id".to_string(),
            });
        }

        let now = Utc::now();
        let mut records = self.records.write().await;
        match records.iter_mut().find(|r| r.from == from && r.to == to) {
            Some(record) => {
                record.is_settled = value;
                record.updated_at = now;
                debug!("Updated settlement flag {} = {}", pair_key(from, to), value);
            }
            None => {
                records.push(SettlementRecord {
                    from: from.to_string(),
                    to: to.to_string(),
                    is_settled: value,
                    created_at: now,
                    updated_at: now,
                });
                debug!("Created settlement flag {} = {}", pair_key(from, to), value);
            }
        }
        Ok(())
    }

    async fn remove(&self, from: &str, to: &str) -> Result<()> {
        self.records
            .write()
            .await
            .retain(|r| !(r.from == from && r.to == to));
        Ok(())
    }
}
