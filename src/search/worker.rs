//! Slave workers: pop, expand, relax, look for a meeting

use crate::search::channel::{PanicGuard, Report, ThreadChannels};
use crate::search::expander::{ExpandError, NodeExpander};
use crate::search::frontier::{DirectionState, Expansion, Pop};
use crate::search::meeting::MeetingTracker;
use crate::search::node::Node;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// Everything one slave worker needs.
pub struct WorkerContext<N: Node> {
    pub worker_id: usize,
    pub own: Arc<DirectionState<N>>,
    pub opposite: Arc<DirectionState<N>>,
    pub tracker: Arc<MeetingTracker<N>>,
    pub expander: Arc<dyn NodeExpander<N>>,
    pub channels: ThreadChannels,
    pub slave_sleep: Duration,
    pub expansion_retries: u32,
}

/// Worker loop; returns when the search stops or this worker fails.
pub fn run_worker<N: Node>(ctx: WorkerContext<N>) {
    let direction = ctx.own.direction();
    let _guard = PanicGuard::new(direction, ctx.channels.clone());
    debug!(%direction, worker_id = ctx.worker_id, "worker started");

    while !ctx.channels.control.should_stop() {
        let expansion = match ctx.own.pop_next() {
            Pop::Ready(expansion) => expansion,
            Pop::Blocked | Pop::Empty => {
                thread::sleep(ctx.slave_sleep);
                continue;
            }
        };

        let Some(neighbors) = expand_with_retries(&ctx, &expansion) else {
            break;
        };
        // A lookup that returns after shutdown is discarded.
        if ctx.channels.control.should_stop() {
            break;
        }

        let next = expansion.distance + 1;
        for neighbor in &neighbors {
            ctx.own.relax(neighbor, next, &expansion.node);
            check_meeting(&ctx, neighbor);
        }
        check_meeting(&ctx, &expansion.node);
        ctx.own.complete(&expansion);
    }

    debug!(%direction, worker_id = ctx.worker_id, "worker stopped");
}

/// Run the expander, retrying transient failures.
///
/// Returns `None` if the search stopped meanwhile or the failure was
/// reported to the coordinator.
fn expand_with_retries<N: Node>(ctx: &WorkerContext<N>, expansion: &Expansion<N>) -> Option<Vec<N>> {
    let direction = ctx.own.direction();
    let mut attempt = 0;
    loop {
        match ctx.expander.expand(&expansion.node) {
            Ok(neighbors) => return Some(neighbors),
            Err(error) if error.is_transient() && attempt < ctx.expansion_retries => {
                attempt += 1;
                warn!(
                    %direction,
                    node = ?expansion.node,
                    attempt,
                    %error,
                    "retrying expansion"
                );
                thread::sleep(ctx.slave_sleep);
                if ctx.channels.control.should_stop() {
                    return None;
                }
            }
            Err(error) => {
                report_failure(ctx, &expansion.node, error);
                return None;
            }
        }
    }
}

fn report_failure<N: Node>(ctx: &WorkerContext<N>, node: &N, error: ExpandError) {
    let direction = ctx.own.direction();
    warn!(%direction, worker_id = ctx.worker_id, node = ?node, %error, "expansion failed");
    let _ = ctx.channels.reports.send(Report::Failed {
        direction,
        worker_id: ctx.worker_id,
        node: format!("{:?}", node),
        error,
    });
    ctx.channels.control.signal_stop();
}

/// Offer `node` to the tracker if both directions have reached it.
fn check_meeting<N: Node>(ctx: &WorkerContext<N>, node: &N) {
    let Some(own) = ctx.own.distance_of(node) else {
        return;
    };
    let Some(opposite) = ctx.opposite.distance_of(node) else {
        return;
    };
    if ctx.tracker.try_update(own + opposite, node) {
        debug!(length = own + opposite, node = ?node, "new best meeting");
    }
}
