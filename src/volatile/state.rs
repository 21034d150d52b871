//! Volatile state snapshot
//!
//! BTreeMap-backed `LedgerCache`, so iteration order (and therefore every
//! query result) is deterministic.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::{LedgerCache, Message, UnstableUnit};

/// Snapshot of unstable units and their messages
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolatileState {
    #[serde(default)]
    pub units: BTreeMap<String, UnstableUnit>,
    #[serde(default)]
    pub messages: BTreeMap<String, Vec<Message>>,
}

impl VolatileState {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a unit together with its messages
    pub fn insert(&mut self, unit: UnstableUnit, messages: Vec<Message>) {
        self.messages.insert(unit.unit.clone(), messages);
        self.units.insert(unit.unit.clone(), unit);
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Parse a snapshot from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a snapshot from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

impl LedgerCache for VolatileState {
    fn unstable_messages(&self) -> Box<dyn Iterator<Item = (&str, &[Message])> + '_> {
        Box::new(
            self.messages
                .iter()
                .map(|(unit, messages)| (unit.as_str(), messages.as_slice())),
        )
    }

    fn unstable_unit(&self, unit: &str) -> Option<&UnstableUnit> {
        self.units.get(unit)
    }
}
