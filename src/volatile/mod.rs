//! Volatile Module
//!
//! Read-only view of the ledger's not-yet-finalized units and the data feeds
//! they publish.
//!
//! ## Responsibilities
//! - `LedgerCache`: the interface the ledger-state cache exposes
//! - `VolatileState`: a snapshot implementation (JSON loadable)
//! - Scanning eligible units for relation hits or value candidates
//!
//! The cache is owned elsewhere; queries borrow it for their duration and
//! never mutate it.

mod scanner;
mod state;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::codec::{FeedValue, Mci};

pub use scanner::{pick_latest, volatile_candidates, volatile_feed_exists, Candidate, VolatileFilter};
pub use state::VolatileState;

/// Read-only access to the ledger-state cache
pub trait LedgerCache {
    /// Every unstable unit that carries messages, with those messages
    fn unstable_messages(&self) -> Box<dyn Iterator<Item = (&str, &[Message])> + '_>;

    /// Properties of an unstable unit
    fn unstable_unit(&self, unit: &str) -> Option<&UnstableUnit>;
}

/// Properties of a unit that has no final ordering index yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnstableUnit {
    pub unit: String,
    pub author_addresses: Vec<String>,
    /// Lower-bound approximation of the unit's ordering index
    pub latest_included_mc_index: Mci,
    /// Depth in the unit graph; breaks ties between candidates
    pub level: u64,
    /// Only units authored by autonomous agents are consulted
    #[serde(default)]
    pub is_aa: bool,
}

/// A message carried by a unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "app", rename_all = "snake_case")]
pub enum Message {
    DataFeed { payload: BTreeMap<String, FeedValue> },
    #[serde(other)]
    Other,
}

impl Message {
    /// Build a data feed message from (name, value) pairs
    pub fn data_feed<K, V>(feeds: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<FeedValue>,
    {
        Message::DataFeed {
            payload: feeds.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
