//! Relation Module
//!
//! The six relations a data feed condition may use and their type-aware
//! evaluation against a stored value.
//!
//! ## Comparison Rules
//! 1. `=`: same value, or same textual rendering (`5` vs `"5"`)
//! 2. `!=`: textual renderings differ. The persisted scan answers it as
//!    `>` then `<`, so there an incomparable pair is *not* unequal
//! 3. Two numbers compare numerically
//! 4. Otherwise both sides are parsed as numbers:
//!    - both parse: numeric comparison of the parsed values
//!    - neither parses: text comparison
//!    - exactly one parses and both are text: text comparison
//! 5. A number against non-numeric text is incomparable (never satisfied)

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::codec::{parse_numeric, FeedValue};
use crate::error::FeedError;

/// Relation between a stored feed value and a query value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Relation {
    pub fn as_str(self) -> &'static str {
        match self {
            Relation::Eq => "=",
            Relation::Ne => "!=",
            Relation::Lt => "<",
            Relation::Le => "<=",
            Relation::Gt => ">",
            Relation::Ge => ">=",
        }
    }

    /// Whether `stored REL query` holds
    pub fn is_satisfied(self, stored: &FeedValue, query: &FeedValue) -> bool {
        match self {
            Relation::Eq => stored.loosely_equals(query),
            Relation::Ne => stored.to_string() != query.to_string(),
            _ => compare(stored, query).is_some_and(|ordering| self.accepts(ordering)),
        }
    }

    /// Whether an ordering of `stored` relative to `query` satisfies this relation
    fn accepts(self, ordering: Ordering) -> bool {
        match self {
            Relation::Eq => ordering == Ordering::Equal,
            Relation::Ne => ordering != Ordering::Equal,
            Relation::Lt => ordering == Ordering::Less,
            Relation::Le => ordering != Ordering::Greater,
            Relation::Gt => ordering == Ordering::Greater,
            Relation::Ge => ordering != Ordering::Less,
        }
    }
}

/// Order `stored` against `query`, or `None` when the pair is incomparable
fn compare(stored: &FeedValue, query: &FeedValue) -> Option<Ordering> {
    match (stored, query) {
        (FeedValue::Number(a), FeedValue::Number(b)) => a.partial_cmp(b),
        (FeedValue::Text(a), FeedValue::Text(b)) => match (parse_numeric(a), parse_numeric(b)) {
            (Some(x), Some(y)) => x.partial_cmp(&y),
            _ => Some(a.as_str().cmp(b.as_str())),
        },
        (FeedValue::Number(a), FeedValue::Text(b)) => parse_numeric(b).and_then(|y| a.partial_cmp(&y)),
        (FeedValue::Text(a), FeedValue::Number(b)) => parse_numeric(a).and_then(|x| x.partial_cmp(b)),
    }
}

impl FromStr for Relation {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "=" => Ok(Relation::Eq),
            "!=" => Ok(Relation::Ne),
            "<" => Ok(Relation::Lt),
            "<=" => Ok(Relation::Le),
            ">" => Ok(Relation::Gt),
            ">=" => Ok(Relation::Ge),
            other => Err(FeedError::UnknownRelation(other.to_string())),
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
