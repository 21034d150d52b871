//! Volatile-state scanner
//!
//! Walks unstable units that may answer a feed query: autonomous-agent
//! units inside the ordering window whose authors intersect the requested
//! addresses.

use std::ops::ControlFlow;

use crate::codec::{FeedValue, Mci};
use crate::error::{FeedError, Result};
use crate::relation::Relation;

use super::{LedgerCache, Message, UnstableUnit};

/// Which unstable units and which feed a volatile scan looks at
#[derive(Debug, Clone, Copy)]
pub struct VolatileFilter<'a> {
    pub addresses: &'a [String],
    pub feed_name: &'a str,
    pub min_mci: Mci,
    pub max_mci: Mci,
}

impl VolatileFilter<'_> {
    fn admits(&self, unit: &UnstableUnit) -> bool {
        unit.is_aa
            && (self.min_mci..=self.max_mci).contains(&unit.latest_included_mc_index)
            && unit
                .author_addresses
                .iter()
                .any(|author| self.addresses.contains(author))
    }
}

/// An unstable publication that may become the value of a feed read
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub value: FeedValue,
    pub latest_included_mc_index: Mci,
    pub level: u64,
    pub unit: String,
}

/// Feed every matching (unit, value) to `visit` until it breaks
fn visit_feeds<C, F>(cache: &C, filter: &VolatileFilter<'_>, mut visit: F) -> Result<()>
where
    C: LedgerCache + ?Sized,
    F: FnMut(&UnstableUnit, &FeedValue) -> ControlFlow<()>,
{
    for (unit, messages) in cache.unstable_messages() {
        let props = cache
            .unstable_unit(unit)
            .ok_or_else(|| FeedError::InconsistentCache {
                unit: unit.to_string(),
            })?;
        if !filter.admits(props) {
            continue;
        }
        for message in messages {
            let Message::DataFeed { payload } = message else {
                continue;
            };
            if let Some(value) = payload.get(filter.feed_name) {
                if visit(props, value).is_break() {
                    return Ok(());
                }
            }
        }
    }
    Ok(())
}

/// Whether any eligible unstable unit published `feed REL value`
pub fn volatile_feed_exists<C>(
    cache: &C,
    filter: &VolatileFilter<'_>,
    relation: Relation,
    value: &FeedValue,
) -> Result<bool>
where
    C: LedgerCache + ?Sized,
{
    let mut found = false;
    visit_feeds(cache, filter, |_, feed_value| {
        if relation.is_satisfied(feed_value, value) {
            found = true;
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    })?;
    Ok(found)
}

/// Every eligible unstable publication of the feed, optionally restricted to
/// those equal to `value`
pub fn volatile_candidates<C>(
    cache: &C,
    filter: &VolatileFilter<'_>,
    value: Option<&FeedValue>,
) -> Result<Vec<Candidate>>
where
    C: LedgerCache + ?Sized,
{
    let mut candidates = Vec::new();
    visit_feeds(cache, filter, |unit, feed_value| {
        if value.map_or(true, |v| v.loosely_equals(feed_value)) {
            candidates.push(Candidate {
                value: feed_value.clone(),
                latest_included_mc_index: unit.latest_included_mc_index,
                level: unit.level,
                unit: unit.unit.clone(),
            });
        }
        ControlFlow::Continue(())
    })?;
    Ok(candidates)
}

/// The freshest candidate: greatest (latest included index, level)
///
/// Two candidates equal on both keys have no defined order and fail with
/// `CandidateTie`.
pub fn pick_latest(candidates: &mut [Candidate]) -> Result<Option<&Candidate>> {
    candidates.sort_by_key(freshness);

    if let Some(pair) = candidates
        .windows(2)
        .find(|pair| freshness(&pair[0]) == freshness(&pair[1]))
    {
        return Err(FeedError::CandidateTie {
            first: pair[0].unit.clone(),
            second: pair[1].unit.clone(),
        });
    }

    Ok(candidates.last())
}

fn freshness(candidate: &Candidate) -> (Mci, u64) {
    (candidate.latest_included_mc_index, candidate.level)
}
