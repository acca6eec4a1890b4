//! The derived location → customers index.
//!
//! A reverse mapping from a search-normalized location key to the set of
//! customers with that location on file. Rebuilt wholesale (dataset sizes
//! are modest and the reverse mapping's correctness matters more than
//! incremental update complexity) and swapped in atomically, so readers see
//! the old snapshot or the new one, never a half-built map.
//!
//! Freshness: a snapshot serves reads until its TTL elapses or
//! [`LocationIndex::invalidate`] is called. Rebuilds are single-flight:
//! one reader rebuilds while every other expired reader is served the
//! previous snapshot, so nobody races N full roster scans and nobody stalls
//! behind an in-flight rebuild (except the very first read, which has no
//! previous snapshot to ride). A failed rebuild keeps serving the last-good snapshot
//! past its TTL (logged at warn); an index that is merely stale beats one
//! that is empty.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::normalize::{search_normalize, NormalizedKey};
use crate::provider::RecordProvider;

/// One immutable build of the index. Shared by `Arc`; readers keep whatever
/// snapshot they grabbed even while a newer one is being swapped in.
#[derive(Debug)]
pub struct IndexSnapshot {
    locations: BTreeSet<NormalizedKey>,
    customers_by_location: HashMap<NormalizedKey, BTreeSet<String>>,
    roster: Vec<String>,
    built_at: Instant,
}

impl IndexSnapshot {
    /// Customers that have this location on file.
    pub fn customers_for(&self, key: &NormalizedKey) -> BTreeSet<String> {
        self.customers_by_location
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    /// Every known location key, in key order.
    pub fn location_keys(&self) -> impl Iterator<Item = &NormalizedKey> {
        self.locations.iter()
    }

    /// The full customer roster this snapshot was built from, sorted.
    pub fn roster(&self) -> &[String] {
        &self.roster
    }

    pub fn location_count(&self) -> usize {
        self.locations.len()
    }
}

/// TTL-cached, single-flight location index.
pub struct LocationIndex {
    provider: Arc<dyn RecordProvider>,
    ttl: Duration,
    snapshot: RwLock<Option<Arc<IndexSnapshot>>>,
    rebuild_gate: Mutex<()>,
    forced_stale: AtomicBool,
}

impl LocationIndex {
    pub fn new(provider: Arc<dyn RecordProvider>, ttl: Duration) -> Self {
        Self {
            provider,
            ttl,
            snapshot: RwLock::new(None),
            rebuild_gate: Mutex::new(()),
            forced_stale: AtomicBool::new(false),
        }
    }

    /// Builds an index with the TTL taken from `config`.
    pub fn from_config(provider: Arc<dyn RecordProvider>, config: &EngineConfig) -> Self {
        Self::new(provider, config.index_ttl())
    }

    /// Customers that have the given location on file. Empty set if the
    /// location is unknown.
    pub async fn lookup_customers_for(&self, key: &NormalizedKey) -> Result<BTreeSet<String>> {
        Ok(self.current().await?.customers_for(key))
    }

    /// All location keys currently indexed.
    pub async fn all_location_keys(&self) -> Result<Vec<NormalizedKey>> {
        Ok(self.current().await?.location_keys().cloned().collect())
    }

    /// Marks the current snapshot stale so the next read rebuilds. Called by
    /// the persistence layer after any address add/update/delete.
    pub fn invalidate(&self) {
        debug!("location index invalidated");
        self.forced_stale.store(true, Ordering::SeqCst);
    }

    /// Returns a fresh-enough snapshot, rebuilding if needed.
    ///
    /// Only the very first read (no snapshot exists yet) can fail; every
    /// later rebuild failure degrades to the last-good snapshot.
    pub async fn current(&self) -> Result<Arc<IndexSnapshot>> {
        {
            let guard = self.snapshot.read().await;
            if let Some(snapshot) = guard.as_ref() {
                if self.is_fresh(snapshot) {
                    return Ok(Arc::clone(snapshot));
                }
            }
        }

        // Single-flight: whoever wins the gate rebuilds. Losers are served
        // the last-good snapshot immediately instead of queueing behind the
        // rebuild; only the very first read, with nothing to serve, waits.
        let _gate = match self.rebuild_gate.try_lock() {
            Ok(gate) => gate,
            Err(_) => {
                {
                    let guard = self.snapshot.read().await;
                    if let Some(snapshot) = guard.as_ref() {
                        debug!("rebuild in flight, serving previous snapshot");
                        return Ok(Arc::clone(snapshot));
                    }
                }
                self.rebuild_gate.lock().await
            }
        };
        {
            let guard = self.snapshot.read().await;
            if let Some(snapshot) = guard.as_ref() {
                if self.is_fresh(snapshot) {
                    return Ok(Arc::clone(snapshot));
                }
            }
        }

        match self.build().await {
            Ok(built) => {
                let built = Arc::new(built);
                info!(
                    locations = built.location_count(),
                    customers = built.roster.len(),
                    "location index rebuilt"
                );
                *self.snapshot.write().await = Some(Arc::clone(&built));
                self.forced_stale.store(false, Ordering::SeqCst);
                Ok(built)
            }
            Err(e) => {
                let guard = self.snapshot.read().await;
                if let Some(last_good) = guard.as_ref() {
                    warn!("location index rebuild failed, serving stale snapshot: {}", e);
                    Ok(Arc::clone(last_good))
                } else {
                    Err(e)
                }
            }
        }
    }

    fn is_fresh(&self, snapshot: &IndexSnapshot) -> bool {
        !self.forced_stale.load(Ordering::SeqCst) && snapshot.built_at.elapsed() < self.ttl
    }

    async fn build(&self) -> Result<IndexSnapshot> {
        let mut roster = self
            .provider
            .fetch_all_customers()
            .await
            .map_err(|e| EngineError::IndexRebuild(format!("roster fetch failed: {}", e)))?;
        roster.sort();
        roster.dedup();

        let fetches = roster
            .iter()
            .map(|customer| self.provider.fetch_customer_locations(customer));
        let results = join_all(fetches).await;

        let mut locations = BTreeSet::new();
        let mut customers_by_location: HashMap<NormalizedKey, BTreeSet<String>> = HashMap::new();

        for (customer, result) in roster.iter().zip(results) {
            let by_type = result.map_err(|e| {
                EngineError::IndexRebuild(format!("location fetch failed for {}: {}", customer, e))
            })?;
            for location_strings in by_type.values() {
                for location in location_strings {
                    let key = search_normalize(location);
                    if key.is_empty() {
                        continue;
                    }
                    locations.insert(key.clone());
                    customers_by_location
                        .entry(key)
                        .or_default()
                        .insert(customer.clone());
                }
            }
        }

        Ok(IndexSnapshot {
            locations,
            customers_by_location,
            roster,
            built_at: Instant::now(),
        })
    }
}
