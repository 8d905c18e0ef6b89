//! Best meeting point shared by both search directions

use crate::search::node::Node;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

const NO_MEETING: u32 = u32::MAX;

/// Tracks the shortest source-to-target length seen so far and the node
/// where the two directions met to form it.
///
/// The length lives in an atomic so the stopping rule can read it without
/// locking; updates take the lock so length and node always change together.
#[derive(Debug)]
pub struct MeetingTracker<N> {
    best_length: AtomicU32,
    best_node: Mutex<Option<N>>,
}

impl<N: Node> Default for MeetingTracker<N> {
    fn default() -> Self {
        Self {
            best_length: AtomicU32::new(NO_MEETING),
            best_node: Mutex::new(None),
        }
    }
}

impl<N: Node> MeetingTracker<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `node` as the meeting point if `length` beats the current best.
    /// Returns true if this is a new best.
    pub fn try_update(&self, length: u32, node: &N) -> bool {
        if length >= self.best_length.load(Ordering::SeqCst) {
            return false;
        }

        let mut best_node = self.best_node.lock();
        let current = self.best_length.load(Ordering::SeqCst);
        if length >= current {
            return false;
        }
        self.best_length.store(length, Ordering::SeqCst);
        *best_node = Some(node.clone());
        true
    }

    /// Best length so far, `None` while the directions have not met.
    pub fn best_length(&self) -> Option<u32> {
        match self.best_length.load(Ordering::SeqCst) {
            NO_MEETING => None,
            length => Some(length),
        }
    }

    /// Best length together with its meeting node.
    pub fn best(&self) -> Option<(u32, N)> {
        let best_node = self.best_node.lock();
        let length = self.best_length()?;
        best_node.clone().map(|node| (length, node))
    }
}

/// True once no undiscovered path can be shorter than `best_length`.
///
/// A direction without queued or in-flight nodes (`None`) contributes an
/// infinite lower bound.
pub fn bound_reached(best_length: u32, forward: Option<u32>, backward: Option<u32>) -> bool {
    match (forward, backward) {
        (Some(f), Some(b)) => u64::from(f) + u64::from(b) >= u64::from(best_length),
        _ => true,
    }
}
