//! Shared fixtures for the integration tests

#![allow(dead_code)]

use feedindex::codec::{address_index_key, address_index_record, value_index_key};
use feedindex::storage::MemoryStore;
use feedindex::volatile::{Message, UnstableUnit};
use feedindex::{FeedValue, Mci, VolatileState};

pub const ADDR1: &str = "ADDR1";
pub const ADDR2: &str = "ADDR2";

/// Index one publication into both feed indexes
pub fn publish(
    store: &mut MemoryStore,
    address: &str,
    feed_name: &str,
    value: impl Into<FeedValue>,
    mci: Mci,
    unit: &str,
) {
    let value = value.into();
    store.put(value_index_key(address, feed_name, &value, mci), unit);
    store.put(
        address_index_key(address, feed_name, mci),
        address_index_record(&value, unit),
    );
}

/// `temp` by ADDR1: 20 at index 5, 30 at index 7
pub fn temperature_store() -> MemoryStore {
    let mut store = MemoryStore::new();
    publish(&mut store, ADDR1, "temp", 20.0, 5, "unit-20");
    publish(&mut store, ADDR1, "temp", 30.0, 7, "unit-30");
    store
}

pub fn unstable_unit(unit: &str, author: &str, mci: Mci, level: u64) -> UnstableUnit {
    UnstableUnit {
        unit: unit.to_string(),
        author_addresses: vec![author.to_string()],
        latest_included_mc_index: mci,
        level,
        is_aa: true,
    }
}

/// Add an unstable unit publishing a single feed
pub fn add_unstable_feed(
    state: &mut VolatileState,
    unit: UnstableUnit,
    feed_name: &str,
    value: impl Into<FeedValue>,
) {
    state.insert(unit, vec![Message::data_feed([(feed_name, value.into())])]);
}

/// `price` by ADDR1 (100, level 1) and ADDR2 (200, level 2), both at index ≈3
pub fn price_state() -> VolatileState {
    let mut state = VolatileState::new();
    add_unstable_feed(&mut state, unstable_unit("u-100", ADDR1, 3, 1), "price", 100.0);
    add_unstable_feed(&mut state, unstable_unit("u-200", ADDR2, 3, 2), "price", 200.0);
    state
}
