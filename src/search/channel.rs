//! Control plane shared by the coordinator, masters and slave workers.

use crate::search::expander::ExpandError;
use crate::search::node::Direction;
use crossbeam_channel::{Receiver, Sender, unbounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Message sent from masters and workers to the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    /// A master gave up on its direction after its idle trials ran out.
    Exhausted { direction: Direction },
    /// A master observed the stopping rule holding.
    BoundReached {
        direction: Direction,
        best_length: u32,
    },
    /// A worker hit an expansion failure it could not retry away.
    Failed {
        direction: Direction,
        worker_id: usize,
        node: String,
        error: ExpandError,
    },
    /// A thread unwound from a panic.
    Panicked { direction: Direction },
}

/// Cancels a running search from any thread.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    pub(crate) fn clear(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Shutdown flags checked by every search thread between operations.
#[derive(Debug)]
pub struct SearchControl {
    stop: AtomicBool,
    cancel: CancelHandle,
}

impl SearchControl {
    pub fn new(cancel: CancelHandle) -> Self {
        Self {
            stop: AtomicBool::new(false),
            cancel,
        }
    }

    /// True once the search is over, for whatever reason.
    pub fn should_stop(&self) -> bool {
        self.stop.load(Ordering::SeqCst) || self.cancel.is_cancelled()
    }

    pub fn signal_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Channel endpoints for the search threads.
pub struct ThreadChannels {
    pub reports: Sender<Report>,
    pub control: Arc<SearchControl>,
}

impl Clone for ThreadChannels {
    fn clone(&self) -> Self {
        Self {
            reports: self.reports.clone(),
            control: Arc::clone(&self.control),
        }
    }
}

/// Channel endpoints for the coordinator.
pub struct CoordinatorChannels {
    pub reports: Receiver<Report>,
    pub control: Arc<SearchControl>,
}

/// Create the report channel and shared control for one search.
pub fn create_channels(cancel: CancelHandle) -> (CoordinatorChannels, ThreadChannels) {
    let control = Arc::new(SearchControl::new(cancel));

    // Unbounded: reporting threads must never block on the coordinator
    let (tx, rx) = unbounded();

    let coordinator = CoordinatorChannels {
        reports: rx,
        control: Arc::clone(&control),
    };
    let threads = ThreadChannels {
        reports: tx,
        control,
    };
    (coordinator, threads)
}

/// Reports a panic of the owning thread when dropped during unwinding.
pub struct PanicGuard {
    direction: Direction,
    channels: ThreadChannels,
}

impl PanicGuard {
    pub fn new(direction: Direction, channels: ThreadChannels) -> Self {
        Self {
            direction,
            channels,
        }
    }
}

impl Drop for PanicGuard {
    fn drop(&mut self) {
        if std::thread::panicking() {
            let _ = self.channels.reports.send(Report::Panicked {
                direction: self.direction,
            });
            self.channels.control.signal_stop();
        }
    }
}
