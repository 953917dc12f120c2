//! Tuning knobs for a [`TaskQueue`](crate::TaskQueue).

use std::time::Duration;

/// Configuration for worker polling and stale-record reaping.
///
/// The staleness thresholds are policy defaults, not fixed law: shrink them
/// in tests or for hosts with strict memory budgets, grow them for callers
/// that collect results slowly.
///
/// # Defaults
///
/// | Setting                | Default | Description                                 |
/// |------------------------|---------|---------------------------------------------|
/// | `idle_poll`            | 1 s     | Empty-queue wait before reaping piggybacks  |
/// | `abandon_after`        | 600 s   | Max age of an unstarted `Waiting` record    |
/// | `retain_completed_for` | 3600 s  | Max age of an uncollected `Completed` record |
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use convq::QueueConfig;
///
/// let config = QueueConfig::default()
///     .with_abandon_after(Duration::from_secs(120))
///     .with_retain_completed_for(Duration::from_secs(900));
/// assert_eq!(config.idle_poll, Duration::from_secs(1));
/// assert_eq!(config.abandon_after, Duration::from_secs(120));
/// ```
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// How long the worker blocks on an empty queue before running the
    /// stale reaper. Maintenance piggybacks on idle cycles; there is no
    /// dedicated reaper timer.
    pub idle_poll: Duration,

    /// Age past which a `Waiting` record is considered abandoned and purged.
    /// Protects against unbounded growth from callers that submitted and
    /// vanished.
    pub abandon_after: Duration,

    /// Age past which a `Completed` record is purged. Protects against
    /// unbounded growth from callers that never collected their result.
    pub retain_completed_for: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            idle_poll: Duration::from_secs(1),
            abandon_after: Duration::from_secs(600),
            retain_completed_for: Duration::from_secs(3600),
        }
    }
}

impl QueueConfig {
    /// Sets the empty-queue wait interval.
    pub fn with_idle_poll(mut self, interval: Duration) -> Self {
        self.idle_poll = interval;
        self
    }

    /// Sets the abandonment threshold for `Waiting` records.
    pub fn with_abandon_after(mut self, age: Duration) -> Self {
        self.abandon_after = age;
        self
    }

    /// Sets the retention threshold for uncollected `Completed` records.
    pub fn with_retain_completed_for(mut self, age: Duration) -> Self {
        self.retain_completed_for = age;
        self
    }
}
