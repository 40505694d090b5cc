//! Advice chains
//!
//! Before-advice is kept newest-first, after-advice oldest-first. Chains
//! only grow one entry at a time and only shrink by being cleared.

use crate::interceptor::{Advice, Interceptor};
use std::collections::VecDeque;
use std::sync::Arc;

/// Label reported for advice registered without one
pub const ANONYMOUS: &str = "anonymous";

/// Ordered sequence of advice, in run order
#[derive(Debug, Clone, Default)]
pub struct AdviceChain {
    entries: VecDeque<Advice>,
}

impl AdviceChain {
    /// Create empty chain
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    /// Insert so it runs first
    #[inline]
    pub fn prepend(&mut self, advice: Advice) {
        self.entries.push_front(advice);
    }

    /// Insert so it runs last
    #[inline]
    pub fn append(&mut self, advice: Advice) {
        self.entries.push_back(advice);
    }

    /// Remove all advice
    #[inline]
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if chain is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate in run order
    pub fn iter(&self) -> impl Iterator<Item = &Advice> {
        self.entries.iter()
    }

    /// Labels in run order
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|a| a.label().unwrap_or(ANONYMOUS).to_string())
            .collect()
    }

    /// Immutable copy of the interceptors, in run order
    #[must_use]
    pub fn interceptors(&self) -> Arc<[Interceptor]> {
        self.entries.iter().map(|a| a.interceptor().clone()).collect()
    }
}
