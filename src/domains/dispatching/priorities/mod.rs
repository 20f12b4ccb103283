//! Ranking of vehicles, orders and assignment candidates.
//!
//! A [`PriorityChain`] compares by its segments in order until one of them
//! decides. Every chain ends with two fixed tie-breakers, the last of which
//! compares names, so distinct objects never compare equal.

pub mod builder;
pub mod comparators;

pub use builder::*;
pub use comparators::*;

use crate::domains::dispatching::RankingContext;
use std::cmp::Ordering;

pub trait PriorityComparator<T>: Send + Sync {
    /// Configuration key selecting this comparator.
    fn key(&self) -> &'static str;

    /// `Less` means `a` is preferred over `b`.
    fn compare(&self, a: &T, b: &T, ctx: &RankingContext) -> Ordering;
}

pub struct PriorityChain<T> {
    segments: Vec<Box<dyn PriorityComparator<T>>>,
}

impl<T> PriorityChain<T> {
    pub fn new(segments: Vec<Box<dyn PriorityComparator<T>>>) -> Self {
        Self { segments }
    }

    pub fn compare(&self, a: &T, b: &T, ctx: &RankingContext) -> Ordering {
        self.segments
            .iter()
            .map(|segment| segment.compare(a, b, ctx))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }

    /// Sorts with the most preferred first.
    pub fn sort(&self, items: &mut [T], ctx: &RankingContext) {
        items.sort_by(|a, b| self.compare(a, b, ctx));
    }

    pub fn sorted(&self, mut items: Vec<T>, ctx: &RankingContext) -> Vec<T> {
        self.sort(&mut items, ctx);
        items
    }

    pub fn best<'a>(&self, items: &'a [T], ctx: &RankingContext) -> Option<&'a T> {
        items.iter().min_by(|a, b| self.compare(a, b, ctx))
    }

    /// Keys of all segments, tie-breakers included, highest precedence first.
    pub fn keys(&self) -> Vec<&'static str> {
        self.segments.iter().map(|s| s.key()).collect()
    }
}
