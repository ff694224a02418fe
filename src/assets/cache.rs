//! Cached snapshot of the asset feed with staleness control.
//!
//! One snapshot holds the entire tradable universe. Reads within the
//! staleness window are served from memory; the first read after the window
//! expires refreshes lazily. A failed refresh degrades to the previous
//! snapshot (or an empty list when there is none) and never surfaces an
//! error to the caller.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::duration::format_duration;
use crate::models::Asset;

use super::AssetFeed;

pub const DEFAULT_STALENESS: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_SEARCH_LIMIT: usize = 20;

/// One immutable view of the feed: every asset keyed by uppercase symbol,
/// plus the order the feed listed them in.
#[derive(Debug, Default)]
struct Snapshot {
    by_symbol: HashMap<String, Asset>,
    order: Vec<String>,
    refreshed_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    fn from_assets(assets: Vec<Asset>, refreshed_at: DateTime<Utc>) -> Self {
        let mut by_symbol = HashMap::with_capacity(assets.len());
        let mut order = Vec::with_capacity(assets.len());
        for asset in assets {
            let key = asset.key();
            if by_symbol.insert(key.clone(), asset).is_none() {
                order.push(key);
            }
        }
        Self {
            by_symbol,
            order,
            refreshed_at: Some(refreshed_at),
        }
    }

    fn is_empty(&self) -> bool {
        self.by_symbol.is_empty()
    }

    fn len(&self) -> usize {
        self.by_symbol.len()
    }

    fn assets(&self) -> Vec<Asset> {
        self.order
            .iter()
            .filter_map(|key| self.by_symbol.get(key).cloned())
            .collect()
    }
}

/// In-memory cache over an [`AssetFeed`].
///
/// The snapshot lives behind an `Arc` so a refresh is a single pointer swap;
/// concurrent readers keep whichever snapshot they already grabbed and never
/// observe a partially updated mapping. The write lock is held only for the
/// swap, never across an await.
pub struct AssetPriceCache {
    feed: Arc<dyn AssetFeed>,
    snapshot: RwLock<Arc<Snapshot>>,
    staleness: Duration,
    search_limit: usize,
    clock: Arc<dyn Clock>,
}

impl AssetPriceCache {
    pub fn new(feed: Arc<dyn AssetFeed>) -> Self {
        Self {
            feed,
            snapshot: RwLock::new(Arc::new(Snapshot::default())),
            staleness: DEFAULT_STALENESS,
            search_limit: DEFAULT_SEARCH_LIMIT,
            clock: Arc::new(SystemClock),
        }
    }

    /// How old the snapshot can get before the next read refreshes it.
    pub fn with_staleness(mut self, staleness: Duration) -> Self {
        self.staleness = staleness;
        self
    }

    /// Cap on results for an empty search query.
    pub fn with_search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn current(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshot.read().expect("snapshot lock poisoned"))
    }

    fn age(&self, snapshot: &Snapshot) -> Option<Duration> {
        snapshot
            .refreshed_at
            .map(|at| (self.clock.now() - at).to_std().unwrap_or(Duration::MAX))
    }

    fn is_fresh(&self, snapshot: &Snapshot) -> bool {
        self.age(snapshot)
            .map(|age| age < self.staleness)
            .unwrap_or(false)
    }

    /// Fetch the full asset list and swap it in wholesale.
    ///
    /// A failed fetch leaves the previous snapshot untouched.
    pub async fn refresh(&self) -> anyhow::Result<()> {
        let assets = self.feed.fetch_all().await?;
        let snapshot = Arc::new(Snapshot::from_assets(assets, self.clock.now()));
        info!(assets = snapshot.len(), "asset snapshot refreshed");
        *self.snapshot.write().expect("snapshot lock poisoned") = snapshot;
        Ok(())
    }

    /// Refresh when the snapshot is stale or empty, falling back to whatever
    /// is cached when the feed is unavailable.
    async fn ensure_fresh(&self) -> Arc<Snapshot> {
        let snapshot = self.current();
        if self.is_fresh(&snapshot) && !snapshot.is_empty() {
            debug!(assets = snapshot.len(), "serving cached asset snapshot");
            return snapshot;
        }

        if let Err(err) = self.refresh().await {
            let stale = self.current();
            match self.age(&stale) {
                Some(age) if !stale.is_empty() => warn!(
                    error = %err,
                    assets = stale.len(),
                    age = %format_duration(age),
                    "asset feed unavailable, serving stale snapshot"
                ),
                _ => warn!(error = %err, "asset feed unavailable and nothing cached"),
            }
            return stale;
        }

        self.current()
    }

    /// All cached assets in feed order, refreshing first when the snapshot
    /// has gone stale. An empty result means the feed is temporarily
    /// unavailable, not that no assets exist.
    pub async fn get_all(&self) -> Vec<Asset> {
        self.ensure_fresh().await.assets()
    }

    /// Case-insensitive symbol lookup. `None` means the symbol is absent
    /// even after a successful refresh.
    pub async fn get_by_symbol(&self, symbol: &str) -> Option<Asset> {
        let snapshot = self.ensure_fresh().await;
        snapshot.by_symbol.get(&symbol.to_uppercase()).cloned()
    }

    /// Current price, if the asset is known.
    pub async fn price_of(&self, symbol: &str) -> Option<f64> {
        self.get_by_symbol(symbol).await.map(|asset| asset.price)
    }

    /// Current price with the feed's historical convention: 0.0 when the
    /// asset cannot be found. Callers that must distinguish "unknown" from
    /// "worthless" should use [`Self::price_of`].
    pub async fn current_price(&self, symbol: &str) -> f64 {
        self.price_of(symbol).await.unwrap_or(0.0)
    }

    /// Case-insensitive substring match on symbol or name. A blank query
    /// returns at most `search_limit` assets instead of the whole universe.
    pub async fn search(&self, query: &str) -> Vec<Asset> {
        let all = self.get_all().await;

        let query = query.trim();
        if query.is_empty() {
            return all.into_iter().take(self.search_limit).collect();
        }

        let needle = query.to_lowercase();
        all.into_iter()
            .filter(|asset| {
                asset.symbol.to_lowercase().contains(&needle)
                    || asset.name.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Type-filtered listing straight from the feed; the snapshot is neither
    /// consulted nor updated. Empty on feed failure.
    pub async fn get_by_type(&self, asset_type: &str) -> Vec<Asset> {
        match self.feed.fetch_by_type(asset_type).await {
            Ok(assets) => assets,
            Err(err) => {
                warn!(asset_type, error = %err, "type-filtered feed fetch failed");
                Vec::new()
            }
        }
    }

    /// Timestamp of the last successful refresh, if any.
    pub fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        self.current().refreshed_at
    }
}
