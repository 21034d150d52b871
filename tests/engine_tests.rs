//! Tests for FeedEngine
//!
//! These tests verify:
//! - Existence queries against the persisted index for every relation
//! - Ordering window handling and monotonicity
//! - Value reads with each tie policy, across several addresses
//! - Volatile state consultation, filtering and short-circuiting
//! - Fatal errors from an inconsistent cache or a malformed index key
//! - Opening an engine over an on-disk SSTable

mod common;

use common::*;
use feedindex::storage::{MemoryStore, SSTableBuilder};
use feedindex::{
    Config, ExistsQuery, FeedEngine, FeedError, FeedResult, FeedValue, ReadQuery, Relation,
    TiePolicy, VolatileState,
};
use proptest::prelude::*;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn engine(store: MemoryStore) -> FeedEngine<MemoryStore> {
    FeedEngine::with_store(store, Config::default())
}

fn exists(
    engine: &FeedEngine<MemoryStore>,
    relation: &str,
    value: impl Into<FeedValue>,
    min_mci: u32,
    max_mci: u32,
) -> bool {
    let query = ExistsQuery::new([ADDR1], "temp", relation.parse().unwrap(), value)
        .mci_range(min_mci, max_mci);
    engine.feed_exists(&VolatileState::new(), &query).unwrap()
}

// =============================================================================
// Persisted Existence Tests
// =============================================================================

#[test]
fn test_exists_greater_than() {
    let engine = engine(temperature_store());

    assert!(exists(&engine, ">", 25.0, 0, 10));
    assert!(!exists(&engine, ">", 35.0, 0, 10));
    assert!(!exists(&engine, ">", 30.0, 0, 10));
    assert!(exists(&engine, ">=", 30.0, 0, 10));
}

#[test]
fn test_exists_less_than() {
    let engine = engine(temperature_store());

    assert!(exists(&engine, "<", 25.0, 0, 10));
    assert!(!exists(&engine, "<", 20.0, 0, 10));
    assert!(exists(&engine, "<=", 20.0, 0, 10));
    assert!(!exists(&engine, "<=", 19.5, 0, 10));
}

#[test]
fn test_exists_equal() {
    let engine = engine(temperature_store());

    assert!(exists(&engine, "=", 20.0, 0, 10));
    assert!(exists(&engine, "=", "20", 0, 10));
    assert!(!exists(&engine, "=", 25.0, 0, 10));
    // 20 was published at index 5
    assert!(!exists(&engine, "=", 20.0, 6, 10));
    assert!(exists(&engine, "=", 20.0, 5, 5));
}

#[test]
fn test_exists_not_equal() {
    let engine = engine(temperature_store());

    assert!(exists(&engine, "!=", 20.0, 0, 10));
    assert!(exists(&engine, "!=", 30.0, 0, 10));
    assert!(!exists(&engine, "!=", 20.0, 5, 5));
}

#[test]
fn test_not_equal_to_text_is_unsatisfied_against_numbers() {
    let engine = engine(temperature_store());

    // Incomparable pair: numeric sub-range never meets text
    assert!(!exists(&engine, "!=", "abc", 0, 10));
    assert!(!exists(&engine, ">", "abc", 0, 10));
    assert!(!exists(&engine, "<", "abc", 0, 10));
}

#[test]
fn test_exists_on_text_values() {
    let mut store = MemoryStore::new();
    publish(&mut store, ADDR1, "temp", "mild", 3, "unit-mild");
    let engine = engine(store);

    assert!(exists(&engine, "=", "mild", 0, 10));
    assert!(exists(&engine, ">", "cold", 0, 10));
    assert!(exists(&engine, "<", "warm", 0, 10));
    assert!(exists(&engine, "!=", "hot", 0, 10));
    assert!(!exists(&engine, ">", "mild", 0, 10));
    assert!(!exists(&engine, ">", 5.0, 0, 10));
}

#[test]
fn test_exists_respects_window_on_range_scans() {
    let engine = engine(temperature_store());

    // 30 is at index 7
    assert!(!exists(&engine, ">", 25.0, 0, 6));
    assert!(!exists(&engine, ">", 25.0, 8, 10));
    assert!(exists(&engine, ">", 25.0, 7, 7));
}

#[test]
fn test_exists_does_not_cross_feeds_or_addresses() {
    let mut store = temperature_store();
    publish(&mut store, ADDR1, "tempo", 100.0, 5, "unit-tempo");
    publish(&mut store, ADDR2, "temp", 100.0, 5, "unit-other");
    let engine = engine(store);

    assert!(!exists(&engine, ">", 50.0, 0, 10));
}

#[test]
fn test_exists_stops_at_first_matching_address() {
    let mut store = MemoryStore::new();
    publish(&mut store, ADDR2, "temp", 40.0, 2, "unit-40");
    let engine = engine(store);

    let query = ExistsQuery::new([ADDR1, ADDR2], "temp", Relation::Gt, 35.0).mci_range(0, 10);
    assert!(engine.feed_exists(&VolatileState::new(), &query).unwrap());

    let query = ExistsQuery::new([ADDR1], "temp", Relation::Gt, 35.0).mci_range(0, 10);
    assert!(!engine.feed_exists(&VolatileState::new(), &query).unwrap());
}

#[test]
fn test_exists_with_empty_window() {
    let engine = engine(temperature_store());
    assert!(!exists(&engine, "=", 20.0, 10, 0));
    assert!(!exists(&engine, ">", 0.0, 10, 0));
}

proptest! {
    #[test]
    fn prop_widening_window_keeps_true(
        publications in prop::collection::vec((-20i32..20, 0u32..40), 0..12),
        relation in prop::sample::select(vec!["=", "!=", "<", "<=", ">", ">="]),
        value in -20i32..20,
        min_mci in 0u32..40,
        width in 0u32..20,
        widen in 0u32..20,
    ) {
        let mut store = MemoryStore::new();
        for (i, (v, mci)) in publications.iter().enumerate() {
            publish(&mut store, ADDR1, "temp", f64::from(*v), *mci, &format!("unit-{i}"));
        }
        let engine = engine(store);

        let narrow = exists(&engine, relation, f64::from(value), min_mci, min_mci + width);
        let wide = exists(
            &engine,
            relation,
            f64::from(value),
            min_mci.saturating_sub(widen),
            min_mci + width + widen,
        );
        prop_assert!(!narrow || wide);
    }

    #[test]
    fn prop_persisted_scan_agrees_with_evaluator(
        stored in -40i32..40,
        queried in -40i32..40,
        relation in prop::sample::select(vec![
            Relation::Eq, Relation::Ne, Relation::Lt, Relation::Le, Relation::Gt, Relation::Ge,
        ]),
    ) {
        let (stored, queried) = (f64::from(stored) / 4.0, f64::from(queried) / 4.0);
        let mut store = MemoryStore::new();
        publish(&mut store, ADDR1, "temp", stored, 3, "unit");
        let engine = engine(store);

        let query = ExistsQuery::new([ADDR1], "temp", relation, queried).mci_range(0, 10);
        let expected = relation.is_satisfied(&FeedValue::Number(stored), &FeedValue::Number(queried));
        prop_assert_eq!(engine.feed_exists(&VolatileState::new(), &query).unwrap(), expected);
    }
}

// =============================================================================
// Persisted Value Read Tests
// =============================================================================

#[test]
fn test_read_latest_value() {
    let engine = engine(temperature_store());

    let query = ReadQuery::new([ADDR1], "temp").mci_range(0, 10);
    let result = engine.read_feed_value(&VolatileState::new(), &query).unwrap();

    assert_eq!(
        result,
        FeedResult {
            value: Some(FeedValue::Number(30.0)),
            unit: Some("unit-30".to_string()),
            mci: Some(7),
            ambiguous: false,
        }
    );
}

#[test]
fn test_read_latest_inside_window() {
    let engine = engine(temperature_store());

    let query = ReadQuery::new([ADDR1], "temp").mci_range(0, 6);
    let result = engine.read_feed_value(&VolatileState::new(), &query).unwrap();

    assert_eq!(result.value, Some(FeedValue::Number(20.0)));
    assert_eq!(result.mci, Some(5));
}

#[test]
fn test_read_with_value_filter() {
    let engine = engine(temperature_store());

    let query = ReadQuery::new([ADDR1], "temp").value("20").mci_range(0, 10);
    let result = engine.read_feed_value(&VolatileState::new(), &query).unwrap();

    assert_eq!(result.value, Some(FeedValue::Number(20.0)));
    assert_eq!(result.unit.as_deref(), Some("unit-20"));
    assert_eq!(result.mci, Some(5));

    let query = ReadQuery::new([ADDR1], "temp").value(25.0).mci_range(0, 10);
    let result = engine.read_feed_value(&VolatileState::new(), &query).unwrap();
    assert!(!result.is_found());
}

#[test]
fn test_read_text_value() {
    let mut store = MemoryStore::new();
    publish(&mut store, ADDR1, "winner", "team-b", 4, "unit-b");
    let engine = engine(store);

    let query = ReadQuery::new([ADDR1], "winner");
    let result = engine.read_feed_value(&VolatileState::new(), &query).unwrap();
    assert_eq!(result.value, Some(FeedValue::from("team-b")));

    let query = ReadQuery::new([ADDR1], "winner").value("team-b");
    let result = engine.read_feed_value(&VolatileState::new(), &query).unwrap();
    assert_eq!(result.value, Some(FeedValue::from("team-b")));
    assert_eq!(result.unit.as_deref(), Some("unit-b"));
}

#[test]
fn test_read_missing_feed() {
    let engine = engine(temperature_store());

    let query = ReadQuery::new([ADDR1, ADDR2], "humidity");
    let result = engine.read_feed_value(&VolatileState::new(), &query).unwrap();
    assert_eq!(result, FeedResult::default());
}

#[test]
fn test_read_abort_marks_several_as_ambiguous() {
    let engine = engine(temperature_store());

    let query = ReadQuery::new([ADDR1], "temp").mci_range(0, 10).tie_policy(TiePolicy::Abort);
    let result = engine.read_feed_value(&VolatileState::new(), &query).unwrap();
    assert!(result.ambiguous);

    let query = ReadQuery::new([ADDR1], "temp").mci_range(0, 6).tie_policy(TiePolicy::Abort);
    let result = engine.read_feed_value(&VolatileState::new(), &query).unwrap();
    assert!(!result.ambiguous);
    assert_eq!(result.value, Some(FeedValue::Number(20.0)));
}

#[test]
fn test_read_across_addresses_by_policy() {
    let mut store = MemoryStore::new();
    publish(&mut store, ADDR1, "temp", 30.0, 7, "unit-a1");
    publish(&mut store, ADDR2, "temp", 40.0, 9, "unit-a2");
    let engine = engine(store);
    let base = ReadQuery::new([ADDR1, ADDR2], "temp").mci_range(0, 10);

    let last = engine
        .read_feed_value(&VolatileState::new(), &base.clone().tie_policy(TiePolicy::Last))
        .unwrap();
    assert_eq!(last.value, Some(FeedValue::Number(40.0)));
    assert_eq!(last.mci, Some(9));

    // Only the first address found is kept
    let sort = engine
        .read_feed_value(&VolatileState::new(), &base.clone().tie_policy(TiePolicy::Sort))
        .unwrap();
    assert_eq!(sort.value, Some(FeedValue::Number(30.0)));

    let abort = engine
        .read_feed_value(&VolatileState::new(), &base.tie_policy(TiePolicy::Abort))
        .unwrap();
    assert!(abort.ambiguous);
}

#[test]
fn test_read_is_idempotent() {
    let engine = engine(temperature_store());
    let state = price_state();
    let query = ReadQuery::new([ADDR1, ADDR2], "temp").mci_range(0, 10).consult_volatile(true);

    let first = engine.read_feed_value(&state, &query).unwrap();
    let second = engine.read_feed_value(&state, &query).unwrap();
    assert_eq!(first, second);
}

// =============================================================================
// Volatile State Tests
// =============================================================================

#[test]
fn test_volatile_tie_resolved_by_level() {
    let engine = engine(MemoryStore::new());
    let state = price_state();
    let query = ReadQuery::new([ADDR1, ADDR2], "price")
        .mci_range(0, 10)
        .consult_volatile(true)
        .tie_policy(TiePolicy::Sort);

    let result = engine.read_feed_value(&state, &query).unwrap();

    assert_eq!(result.value, Some(FeedValue::Number(200.0)));
    assert_eq!(result.unit.as_deref(), Some("u-200"));
    assert_eq!(result.mci, Some(10));
    assert!(!result.ambiguous);
}

#[test]
fn test_volatile_several_candidates_abort() {
    let engine = engine(MemoryStore::new());
    let query = ReadQuery::new([ADDR1, ADDR2], "price")
        .mci_range(0, 10)
        .consult_volatile(true)
        .tie_policy(TiePolicy::Abort);

    let result = engine.read_feed_value(&price_state(), &query).unwrap();

    assert!(result.ambiguous);
    assert_eq!(result.value, None);
}

#[test]
fn test_volatile_full_tie_is_fatal() {
    let engine = engine(MemoryStore::new());
    let mut state = VolatileState::new();
    add_unstable_feed(&mut state, unstable_unit("u-1", ADDR1, 3, 1), "price", 1.0);
    add_unstable_feed(&mut state, unstable_unit("u-2", ADDR2, 3, 1), "price", 2.0);
    let query = ReadQuery::new([ADDR1, ADDR2], "price")
        .consult_volatile(true)
        .tie_policy(TiePolicy::Sort);

    assert!(matches!(
        engine.read_feed_value(&state, &query),
        Err(FeedError::CandidateTie { .. })
    ));
}

#[test]
fn test_volatile_single_candidate_wins_under_last() {
    let mut store = MemoryStore::new();
    publish(&mut store, ADDR1, "price", 50.0, 9, "unit-stable");
    let engine = engine(store);
    let mut state = VolatileState::new();
    add_unstable_feed(&mut state, unstable_unit("u-new", ADDR1, 9, 4), "price", 55.0);

    let query = ReadQuery::new([ADDR1], "price").mci_range(0, 10).consult_volatile(true);
    let result = engine.read_feed_value(&state, &query).unwrap();
    assert_eq!(result.value, Some(FeedValue::Number(55.0)));
    assert_eq!(result.unit.as_deref(), Some("u-new"));

    // Under abort the stable publication makes it ambiguous
    let result = engine
        .read_feed_value(&state, &query.clone().tie_policy(TiePolicy::Abort))
        .unwrap();
    assert!(result.ambiguous);

    // Under sort the unstable one is adopted and not replaced
    let result = engine
        .read_feed_value(&state, &query.tie_policy(TiePolicy::Sort))
        .unwrap();
    assert_eq!(result.value, Some(FeedValue::Number(55.0)));
}

#[test]
fn test_volatile_value_filter() {
    let engine = engine(MemoryStore::new());
    let query = ReadQuery::new([ADDR1, ADDR2], "price")
        .value("100")
        .mci_range(0, 10)
        .consult_volatile(true);

    let result = engine.read_feed_value(&price_state(), &query).unwrap();
    assert_eq!(result.value, Some(FeedValue::Number(100.0)));
    assert_eq!(result.unit.as_deref(), Some("u-100"));
}

#[test]
fn test_volatile_ignored_unless_consulted() {
    let engine = engine(MemoryStore::new());

    let query = ReadQuery::new([ADDR1, ADDR2], "price");
    assert!(!engine.read_feed_value(&price_state(), &query).unwrap().is_found());

    let query = ExistsQuery::new([ADDR1, ADDR2], "price", Relation::Gt, 0.0);
    assert!(!engine.feed_exists(&price_state(), &query).unwrap());
    assert!(engine.feed_exists(&price_state(), &query.consult_volatile(true)).unwrap());
}

#[test]
fn test_volatile_exists_filters_units() {
    let engine = engine(MemoryStore::new());
    let mut state = VolatileState::new();

    let mut not_aa = unstable_unit("u-plain", ADDR1, 3, 1);
    not_aa.is_aa = false;
    add_unstable_feed(&mut state, not_aa, "price", 500.0);
    add_unstable_feed(&mut state, unstable_unit("u-late", ADDR1, 20, 2), "price", 500.0);
    add_unstable_feed(&mut state, unstable_unit("u-other", ADDR2, 3, 3), "price", 500.0);

    let query = ExistsQuery::new([ADDR1], "price", Relation::Ge, 500.0)
        .mci_range(0, 10)
        .consult_volatile(true);
    assert!(!engine.feed_exists(&state, &query).unwrap());

    add_unstable_feed(&mut state, unstable_unit("u-good", ADDR1, 10, 4), "price", 500.0);
    assert!(engine.feed_exists(&state, &query).unwrap());
}

#[test]
fn test_volatile_exists_compares_renderings_for_not_equal() {
    let engine = engine(MemoryStore::new());
    let mut state = VolatileState::new();
    add_unstable_feed(&mut state, unstable_unit("u-5", ADDR1, 3, 1), "temp", 5.0);

    let ne_text = ExistsQuery::new([ADDR1], "temp", Relation::Ne, "abc").consult_volatile(true);
    assert!(engine.feed_exists(&state, &ne_text).unwrap());

    let ne_same = ExistsQuery::new([ADDR1], "temp", Relation::Ne, "5").consult_volatile(true);
    assert!(!engine.feed_exists(&state, &ne_same).unwrap());

    let eq_text = ExistsQuery::new([ADDR1], "temp", Relation::Eq, "5").consult_volatile(true);
    assert!(engine.feed_exists(&state, &eq_text).unwrap());
}

#[test]
fn test_volatile_not_equal_on_differently_rendered_text() {
    let engine = engine(MemoryStore::new());
    let mut state = VolatileState::new();
    add_unstable_feed(&mut state, unstable_unit("u-5", ADDR1, 3, 1), "temp", "5.0");

    let query = ExistsQuery::new([ADDR1], "temp", Relation::Ne, 5.0).consult_volatile(true);
    assert!(engine.feed_exists(&state, &query).unwrap());
}

#[test]
fn test_not_equal_differs_between_volatile_and_persisted() {
    let mut store = MemoryStore::new();
    publish(&mut store, ADDR1, "temp", 5.0, 3, "unit-5");
    let engine = engine(store);
    let mut state = VolatileState::new();
    add_unstable_feed(&mut state, unstable_unit("u-5", ADDR1, 3, 1), "temp", 5.0);

    let query = ExistsQuery::new([ADDR1], "temp", Relation::Ne, "abc").mci_range(0, 10);
    assert!(!engine.feed_exists(&state, &query).unwrap());
    assert!(engine.feed_exists(&state, &query.consult_volatile(true)).unwrap());
}

#[test]
fn test_volatile_hit_short_circuits_persisted_scan() {
    let engine = engine(temperature_store());
    let mut state = VolatileState::new();
    add_unstable_feed(&mut state, unstable_unit("u-99", ADDR1, 8, 1), "temp", 99.0);

    let query = ExistsQuery::new([ADDR1], "temp", Relation::Gt, 90.0)
        .mci_range(0, 10)
        .consult_volatile(true);
    assert!(engine.feed_exists(&state, &query).unwrap());
}

#[test]
fn test_inconsistent_cache_is_fatal() {
    let engine = engine(temperature_store());
    let mut state = VolatileState::new();
    state
        .messages
        .insert("ghost".to_string(), vec![feedindex::volatile::Message::data_feed([("temp", 1.0)])]);

    let query = ExistsQuery::new([ADDR1], "temp", Relation::Gt, 0.0).consult_volatile(true);
    assert!(matches!(
        engine.feed_exists(&state, &query),
        Err(FeedError::InconsistentCache { unit }) if unit == "ghost"
    ));

    let query = ReadQuery::new([ADDR1], "temp").consult_volatile(true);
    assert!(matches!(
        engine.read_feed_value(&state, &query),
        Err(FeedError::InconsistentCache { .. })
    ));
}

#[test]
fn test_malformed_value_key_aborts_existence_query() {
    let mut store = temperature_store();
    // 60 under the numeric tag, with a corrupt ordering index
    store.put("df\nADDR1\ntemp\nn\nc04e000000000000\nzzzzzzzz", "unit-bad");
    let engine = engine(store);

    let query = ExistsQuery::new([ADDR1], "temp", Relation::Gt, 25.0).mci_range(8, 10);
    assert!(matches!(
        engine.feed_exists(&VolatileState::new(), &query),
        Err(FeedError::MalformedKey { .. })
    ));
}

#[test]
fn test_malformed_address_key_aborts_value_read() {
    let mut store = temperature_store();
    // Sorts inside the window but is not hex
    store.put("dfv\nADDR1\ntemp\n0000000g", "60\nunit-bad");
    let engine = engine(store);

    let query = ReadQuery::new([ADDR1], "temp").mci_range(0, 16);
    assert!(matches!(
        engine.read_feed_value(&VolatileState::new(), &query),
        Err(FeedError::MalformedKey { .. })
    ));
}

#[test]
fn test_parse_unknown_tie_policy() {
    assert_eq!("sort".parse::<TiePolicy>().unwrap(), TiePolicy::Sort);
    assert!(matches!(
        "newest".parse::<TiePolicy>(),
        Err(FeedError::UnknownTiePolicy(token)) if token == "newest"
    ));
}

// =============================================================================
// On-disk Engine Tests
// =============================================================================

#[test]
fn test_engine_over_sstable() {
    let temp_dir = TempDir::new().unwrap();
    let path = FeedEngine::sstable_path(temp_dir.path());
    SSTableBuilder::from_store(&path, &temperature_store()).unwrap();

    let engine = FeedEngine::open_path(temp_dir.path()).unwrap();
    let state = VolatileState::new();

    let query = ExistsQuery::new([ADDR1], "temp", Relation::Gt, 25.0).mci_range(0, 10);
    assert!(engine.feed_exists(&state, &query).unwrap());

    let query = ReadQuery::new([ADDR1], "temp").mci_range(0, 10);
    let result = engine.read_feed_value(&state, &query).unwrap();
    assert_eq!(result.value, Some(FeedValue::Number(30.0)));
    assert_eq!(result.unit.as_deref(), Some("unit-30"));
}

#[test]
fn test_open_without_index_fails() {
    let temp_dir = TempDir::new().unwrap();
    assert!(matches!(
        FeedEngine::open_path(temp_dir.path()),
        Err(FeedError::Io(_))
    ));
}
