//! Configuration for the bidirectional search engine

use std::time::Duration;

/// Worker threads per direction when nothing else is requested.
pub const DEFAULT_THREAD_COUNT: usize = 8;
/// Fewer workers than this cannot overlap lookups with relaxation.
pub const MINIMUM_THREAD_COUNT: usize = 2;
pub const DEFAULT_MAXIMUM_IDLE_TRIALS: u32 = 10;
pub const MINIMUM_IDLE_TRIALS: u32 = 1;
pub const DEFAULT_MASTER_SLEEP: Duration = Duration::from_millis(100);
pub const DEFAULT_SLAVE_SLEEP: Duration = Duration::from_millis(10);
pub const MINIMUM_SLEEP: Duration = Duration::from_millis(1);
pub const DEFAULT_EXPANSION_RETRIES: u32 = 3;
pub const DEFAULT_JOIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Tuning knobs of one `BidirectionalPathFinder`.
///
/// Builder methods clamp to the minimums; a config assembled field by field
/// can be brought into range with [`SearchConfig::effective`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    /// Slave workers per direction
    pub thread_count: usize,
    /// Consecutive empty observations before a master gives up
    pub maximum_idle_trials: u32,
    /// Master pause between frontier observations
    pub master_sleep: Duration,
    /// Slave pause when there is nothing to pop
    pub slave_sleep: Duration,
    /// Extra attempts for a lookup failing with a transient error
    pub expansion_retries: u32,
    /// How long shutdown waits for workers stuck in a lookup
    pub join_timeout: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            thread_count: DEFAULT_THREAD_COUNT,
            maximum_idle_trials: DEFAULT_MAXIMUM_IDLE_TRIALS,
            master_sleep: DEFAULT_MASTER_SLEEP,
            slave_sleep: DEFAULT_SLAVE_SLEEP,
            expansion_retries: DEFAULT_EXPANSION_RETRIES,
            join_timeout: DEFAULT_JOIN_TIMEOUT,
        }
    }
}

impl SearchConfig {
    pub fn with_threads(mut self, thread_count: usize) -> Self {
        self.thread_count = thread_count.max(MINIMUM_THREAD_COUNT);
        self
    }

    pub fn with_idle_trials(mut self, trials: u32) -> Self {
        self.maximum_idle_trials = trials.max(MINIMUM_IDLE_TRIALS);
        self
    }

    pub fn with_master_sleep(mut self, sleep: Duration) -> Self {
        self.master_sleep = sleep.max(MINIMUM_SLEEP);
        self
    }

    pub fn with_slave_sleep(mut self, sleep: Duration) -> Self {
        self.slave_sleep = sleep.max(MINIMUM_SLEEP);
        self
    }

    pub fn with_expansion_retries(mut self, retries: u32) -> Self {
        self.expansion_retries = retries;
        self
    }

    pub fn with_join_timeout(mut self, timeout: Duration) -> Self {
        self.join_timeout = timeout;
        self
    }

    /// Copy of this config with every field raised to its minimum.
    pub fn effective(&self) -> Self {
        Self {
            thread_count: self.thread_count.max(MINIMUM_THREAD_COUNT),
            maximum_idle_trials: self.maximum_idle_trials.max(MINIMUM_IDLE_TRIALS),
            master_sleep: self.master_sleep.max(MINIMUM_SLEEP),
            slave_sleep: self.slave_sleep.max(MINIMUM_SLEEP),
            expansion_retries: self.expansion_retries,
            join_timeout: self.join_timeout,
        }
    }

    /// Upper bound on the time between the last useful discovery of a
    /// direction and that direction being declared exhausted.
    pub fn exhaustion_latency(&self) -> Duration {
        self.master_sleep * self.maximum_idle_trials
    }
}
