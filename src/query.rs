//! Query definitions
//!
//! Parameters of the two feed queries and the value-read result.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::codec::{FeedValue, Mci};
use crate::error::FeedError;
use crate::relation::Relation;

/// What a value read does when several publications qualify
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TiePolicy {
    /// Take the most recent one
    #[default]
    Last,
    /// Report the result as ambiguous
    Abort,
    /// Order unstable candidates by (latest included index, level)
    Sort,
}

impl FromStr for TiePolicy {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "last" => Ok(TiePolicy::Last),
            "abort" => Ok(TiePolicy::Abort),
            "sort" => Ok(TiePolicy::Sort),
            other => Err(FeedError::UnknownTiePolicy(other.to_string())),
        }
    }
}

impl fmt::Display for TiePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TiePolicy::Last => "last",
            TiePolicy::Abort => "abort",
            TiePolicy::Sort => "sort",
        })
    }
}

/// Does any of `addresses` publish `feed_name REL value` within the window?
#[derive(Debug, Clone, PartialEq)]
pub struct ExistsQuery {
    pub addresses: Vec<String>,
    pub feed_name: String,
    pub relation: Relation,
    pub value: FeedValue,
    pub min_mci: Mci,
    pub max_mci: Mci,
    pub consult_volatile: bool,
}

impl ExistsQuery {
    /// Query over the whole ordering range, persisted data only
    pub fn new<A: Into<String>>(
        addresses: impl IntoIterator<Item = A>,
        feed_name: impl Into<String>,
        relation: Relation,
        value: impl Into<FeedValue>,
    ) -> Self {
        Self {
            addresses: addresses.into_iter().map(Into::into).collect(),
            feed_name: feed_name.into(),
            relation,
            value: value.into(),
            min_mci: 0,
            max_mci: Mci::MAX,
            consult_volatile: false,
        }
    }

    pub fn mci_range(mut self, min_mci: Mci, max_mci: Mci) -> Self {
        self.min_mci = min_mci;
        self.max_mci = max_mci;
        self
    }

    pub fn consult_volatile(mut self, consult: bool) -> Self {
        self.consult_volatile = consult;
        self
    }
}

/// What value does `feed_name` resolve to for `addresses` within the window?
#[derive(Debug, Clone, PartialEq)]
pub struct ReadQuery {
    pub addresses: Vec<String>,
    pub feed_name: String,
    /// Only publications equal to this value qualify
    pub value: Option<FeedValue>,
    pub min_mci: Mci,
    pub max_mci: Mci,
    pub consult_volatile: bool,
    pub tie_policy: TiePolicy,
}

impl ReadQuery {
    /// Latest value over the whole ordering range, persisted data only
    pub fn new<A: Into<String>>(addresses: impl IntoIterator<Item = A>, feed_name: impl Into<String>) -> Self {
        Self {
            addresses: addresses.into_iter().map(Into::into).collect(),
            feed_name: feed_name.into(),
            value: None,
            min_mci: 0,
            max_mci: Mci::MAX,
            consult_volatile: false,
            tie_policy: TiePolicy::Last,
        }
    }

    pub fn value(mut self, value: impl Into<FeedValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn mci_range(mut self, min_mci: Mci, max_mci: Mci) -> Self {
        self.min_mci = min_mci;
        self.max_mci = max_mci;
        self
    }

    pub fn consult_volatile(mut self, consult: bool) -> Self {
        self.consult_volatile = consult;
        self
    }

    pub fn tie_policy(mut self, policy: TiePolicy) -> Self {
        self.tie_policy = policy;
        self
    }
}

/// Outcome of a value read
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedResult {
    /// Resolved value; `None` when nothing qualified
    pub value: Option<FeedValue>,
    /// Unit that published the value
    pub unit: Option<String>,
    /// Ordering index of the publication (`max_mci` for unstable ones)
    pub mci: Option<Mci>,
    /// Several publications qualified under the `abort` policy
    pub ambiguous: bool,
}

impl FeedResult {
    pub fn is_found(&self) -> bool {
        self.value.is_some()
    }
}
