//! # feedindex
//!
//! Data feed (oracle) queries for a DAG ledger:
//! - Does any feed published by a set of addresses satisfy a relation?
//! - What value does a named feed resolve to?
//!
//! Both questions are answered over two sources: the volatile set of
//! unstable units held by the ledger-state cache, and the persisted,
//! order-indexed feed indexes.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        FeedEngine                            │
//! │             (feed_exists / read_feed_value)                  │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  Volatile   │          │    Scan     │
//!   │ (LedgerCache│          │ (per address│
//!   │  snapshot)  │          │  cursors)   │
//!   └──────┬──────┘          └──────┬──────┘
//!          │                        │
//!          ▼                        ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  Relation   │          │   Storage   │
//!   │ (evaluator) │          │  (SSTable)  │
//!   └─────────────┘          └─────────────┘
//!           \                      /
//!            └──── Codec (keys) ──┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod codec;
pub mod relation;
pub mod query;
pub mod storage;
pub mod volatile;
pub mod scan;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use codec::{FeedValue, Mci};
pub use config::Config;
pub use engine::FeedEngine;
pub use error::{FeedError, Result};
pub use query::{ExistsQuery, FeedResult, ReadQuery, TiePolicy};
pub use relation::Relation;
pub use volatile::{LedgerCache, VolatileState};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of feedindex
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
