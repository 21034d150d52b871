//! Engine Module
//!
//! Answers data feed queries by combining the volatile unit cache with the
//! persisted feed indexes.
//!
//! ## Query Flow
//! 1. Volatile state (only when the query asks for it)
//! 2. Persisted index, one address at a time, strictly sequential
//!
//! Existence stops at the first hit. Value reads merge every address into
//! one running result, unless the volatile step already decided it.

use std::path::Path;
use std::time::Instant;

use tracing::{debug, warn};

use crate::config::Config;
use crate::error::Result;
use crate::query::{ExistsQuery, FeedResult, ReadQuery, TiePolicy};
use crate::scan::{feed_by_address_exists, read_feed_by_address};
use crate::storage::{OrderedStore, SSTableReader};
use crate::volatile::{
    pick_latest, volatile_candidates, volatile_feed_exists, LedgerCache, VolatileFilter,
};

/// Data feed query engine over one persisted store
pub struct FeedEngine<S> {
    /// Engine configuration
    config: Config,

    /// Persisted feed indexes
    store: S,
}

impl FeedEngine<SSTableReader> {
    const SSTABLE_FILENAME: &'static str = "feeds.sst";

    /// Open the feed index stored under `config.data_dir`
    pub fn open(config: Config) -> Result<Self> {
        let path = config.data_dir.join(Self::SSTABLE_FILENAME);
        let store = SSTableReader::open(&path)?;
        debug!(path = %path.display(), entries = store.entry_count(), "opened feed index");
        Ok(Self { config, store })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().data_dir(path).build())
    }

    /// File name of the feed index inside a data directory
    pub fn sstable_path(data_dir: &Path) -> std::path::PathBuf {
        data_dir.join(Self::SSTABLE_FILENAME)
    }
}

impl<S: OrderedStore> FeedEngine<S> {
    /// Wrap an already-open store
    pub fn with_store(store: S, config: Config) -> Self {
        Self { config, store }
    }

    /// Does any of the query's addresses publish `feed REL value` in the window?
    pub fn feed_exists<C>(&self, cache: &C, query: &ExistsQuery) -> Result<bool>
    where
        C: LedgerCache + ?Sized,
    {
        let started = Instant::now();

        if query.consult_volatile {
            let filter = VolatileFilter {
                addresses: &query.addresses,
                feed_name: &query.feed_name,
                min_mci: query.min_mci,
                max_mci: query.max_mci,
            };
            if volatile_feed_exists(cache, &filter, query.relation, &query.value)? {
                self.log_query("df", query.feed_name.as_str(), started, &true);
                return Ok(true);
            }
        }

        let mut found = false;
        for address in &query.addresses {
            if feed_by_address_exists(
                &self.store,
                address,
                &query.feed_name,
                query.relation,
                &query.value,
                query.min_mci,
                query.max_mci,
            )? {
                found = true;
                break;
            }
        }

        self.log_query("df", query.feed_name.as_str(), started, &found);
        Ok(found)
    }

    /// Resolve the value of a feed for the query's addresses
    pub fn read_feed_value<C>(&self, cache: &C, query: &ReadQuery) -> Result<FeedResult>
    where
        C: LedgerCache + ?Sized,
    {
        let started = Instant::now();
        let mut result = FeedResult::default();

        if query.consult_volatile {
            let filter = VolatileFilter {
                addresses: &query.addresses,
                feed_name: &query.feed_name,
                min_mci: query.min_mci,
                max_mci: query.max_mci,
            };
            let mut candidates = volatile_candidates(cache, &filter, query.value.as_ref())?;

            match candidates.len() {
                0 => {}
                1 => {
                    let candidate = candidates.swap_remove(0);
                    result.value = Some(candidate.value);
                    result.unit = Some(candidate.unit);
                    result.mci = Some(query.max_mci);
                    // Unstable publications are at least as fresh as persisted ones
                    if query.tie_policy == TiePolicy::Last {
                        self.log_query("dfv", query.feed_name.as_str(), started, &result.value);
                        return Ok(result);
                    }
                }
                _ if query.tie_policy == TiePolicy::Abort => {
                    result.ambiguous = true;
                    self.log_query("dfv", query.feed_name.as_str(), started, &result.value);
                    return Ok(result);
                }
                _ => {
                    if let Some(latest) = pick_latest(&mut candidates)? {
                        result.value = Some(latest.value.clone());
                        result.unit = Some(latest.unit.clone());
                        result.mci = Some(query.max_mci);
                    }
                    self.log_query("dfv", query.feed_name.as_str(), started, &result.value);
                    return Ok(result);
                }
            }
        }

        for address in &query.addresses {
            read_feed_by_address(
                &self.store,
                address,
                &query.feed_name,
                query.value.as_ref(),
                query.min_mci,
                query.max_mci,
                query.tie_policy,
                &mut result,
            )?;
        }

        self.log_query("dfv", query.feed_name.as_str(), started, &result.value);
        Ok(result)
    }

    fn log_query<T: std::fmt::Debug>(&self, kind: &str, feed_name: &str, started: Instant, outcome: &T) {
        let elapsed_ms = started.elapsed().as_millis() as u64;
        if elapsed_ms >= self.config.slow_query_ms {
            warn!(kind, feed_name, elapsed_ms, ?outcome, "slow data feed query");
        } else {
            debug!(kind, feed_name, elapsed_ms, ?outcome, "data feed query");
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
