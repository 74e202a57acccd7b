//! Crawl frontier
//!
//! Owns the queue of normalized URLs waiting to be fetched and the state of
//! every URL seen so far. A URL is recorded in a single map, so it can never
//! be queued, visited and failed at once, and it is enqueued at most once.

use crate::config::CrawlStrategy;
use crate::state::{SkipReason, UrlState};
use std::collections::{HashMap, HashSet, VecDeque};

/// Queue plus per-URL state for one analysis run
#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<String>,
    states: HashMap<String, UrlState>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues the links found on one page (or the seed list)
    ///
    /// URLs already known in any state are ignored, as are repeats within
    /// `urls`. Breadth-first appends to the tail in encounter order.
    /// Depth-first puts the batch at the head, still in encounter order, so
    /// the first link found is the next one visited.
    ///
    /// # Returns
    ///
    /// The number of URLs actually enqueued
    pub fn enqueue_all(&mut self, urls: Vec<String>, strategy: CrawlStrategy) -> usize {
        let mut batch_seen = HashSet::new();
        let fresh: Vec<String> = urls
            .into_iter()
            .filter(|u| !self.states.contains_key(u) && batch_seen.insert(u.clone()))
            .collect();

        for url in &fresh {
            self.states.insert(url.clone(), UrlState::Queued);
        }

        let added = fresh.len();
        match strategy {
            CrawlStrategy::BreadthFirst => self.queue.extend(fresh),
            CrawlStrategy::DepthFirst => {
                for url in fresh.into_iter().rev() {
                    self.queue.push_front(url);
                }
            }
        }
        added
    }

    /// Takes the next URL to process; it stays `Queued` until marked
    pub fn pop(&mut self) -> Option<String> {
        self.queue.pop_front()
    }

    pub fn mark_visited(&mut self, url: &str) {
        self.set_state(url, UrlState::Visited);
    }

    pub fn mark_failed(&mut self, url: &str) {
        self.set_state(url, UrlState::Failed);
    }

    pub fn mark_skipped(&mut self, url: &str, reason: SkipReason) {
        self.set_state(url, UrlState::Skipped(reason));
    }

    fn set_state(&mut self, url: &str, state: UrlState) {
        self.states.insert(url.to_string(), state);
    }

    pub fn state(&self, url: &str) -> Option<UrlState> {
        self.states.get(url).copied()
    }

    /// Number of URLs waiting in the queue
    pub fn queued_len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn visited_count(&self) -> usize {
        self.count(|s| s.is_success())
    }

    pub fn failed_count(&self) -> usize {
        self.count(|s| *s == UrlState::Failed)
    }

    pub fn skipped_count(&self) -> usize {
        self.count(|s| s.is_skipped())
    }

    fn count(&self, pred: impl Fn(&UrlState) -> bool) -> usize {
        self.states.values().filter(|s| pred(s)).count()
    }
}
