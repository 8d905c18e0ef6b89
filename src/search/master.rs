//! Master threads: idle-trial exhaustion policy and stopping-rule watch
//!
//! An empty frontier at one instant proves nothing while workers may be
//! mid-lookup. A master therefore only counts observations where its
//! direction has neither queued nor in-flight nodes, sleeps between
//! observations, and declares the direction exhausted after
//! `maximum_idle_trials` consecutive idle observations.

use crate::search::channel::{PanicGuard, Report, ThreadChannels};
use crate::search::frontier::DirectionState;
use crate::search::meeting::{MeetingTracker, bound_reached};
use crate::search::node::Node;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::debug;

pub struct MasterContext<N: Node> {
    pub own: Arc<DirectionState<N>>,
    pub opposite: Arc<DirectionState<N>>,
    pub tracker: Arc<MeetingTracker<N>>,
    pub channels: ThreadChannels,
    pub master_sleep: Duration,
    pub maximum_idle_trials: u32,
}

/// Observe the stopping rule from this direction's point of view.
///
/// The best length is read before the lower bounds: it only shrinks and
/// the bounds only grow, so a torn read errs on the side of continuing.
pub fn stopping_rule_holds<N: Node>(
    tracker: &MeetingTracker<N>,
    forward: &DirectionState<N>,
    backward: &DirectionState<N>,
) -> Option<(u32, Option<u32>)> {
    let best_length = tracker.best_length()?;
    let forward_bound = forward.lower_bound();
    let backward_bound = backward.lower_bound();
    if bound_reached(best_length, forward_bound, backward_bound) {
        let lower_bound = forward_bound.zip(backward_bound).map(|(f, b)| f + b);
        Some((best_length, lower_bound))
    } else {
        None
    }
}

pub fn run_master<N: Node>(ctx: MasterContext<N>) {
    let direction = ctx.own.direction();
    let _guard = PanicGuard::new(direction, ctx.channels.clone());
    debug!(%direction, "master started");

    let mut idle_trials = 0;
    while !ctx.channels.control.should_stop() {
        if let Some((best_length, _)) = stopping_rule_holds(&ctx.tracker, &ctx.own, &ctx.opposite) {
            let _ = ctx.channels.reports.send(Report::BoundReached {
                direction,
                best_length,
            });
        }

        if !ctx.own.is_idle() {
            idle_trials = 0;
            thread::sleep(ctx.master_sleep);
            continue;
        }

        // An empty observation only counts if it survives one more sleep.
        thread::sleep(ctx.master_sleep);
        if ctx.channels.control.should_stop() {
            break;
        }
        if ctx.own.is_idle() {
            idle_trials += 1;
            if idle_trials >= ctx.maximum_idle_trials {
                debug!(%direction, idle_trials, "direction exhausted");
                ctx.own.mark_exhausted();
                let _ = ctx.channels.reports.send(Report::Exhausted { direction });
                return;
            }
        } else {
            idle_trials = 0;
        }
    }

    debug!(%direction, "master stopped");
}
