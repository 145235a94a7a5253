// Metron - A minimal Statsd client for Rust!
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::client::{Counted, MetricBackend, StatsdClient, Timed};
use crate::types::{Counter, ErrorKind, MetricError, MetricResult, Timer};
use std::ops::{AddAssign, SubAssign};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

/// Counter bound to a single bucket, supporting fluent `+=` / `-=` syntax.
///
/// The counter holds no local state besides the bucket name; every operation
/// is an independent send through the underlying client. The operator forms
/// send quietly, routing any errors through the client's registered error
/// handler; use `inc` / `dec` when errors should be returned instead.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use metron::{BucketCounter, StatsdClient, NopMetricSink};
///
/// let client = Arc::new(StatsdClient::from_sink("", NopMetricSink));
/// let mut logins = BucketCounter::new(client, "user.logins");
///
/// logins += 1;
/// logins -= 5;
/// ```
#[derive(Debug, Clone)]
pub struct BucketCounter {
    client: Arc<StatsdClient>,
    key: String,
}

impl BucketCounter {
    pub fn new(client: Arc<StatsdClient>, key: &str) -> BucketCounter {
        BucketCounter {
            client,
            key: key.to_string(),
        }
    }

    /// Increment the counter by the given delta, returning errors to the caller.
    pub fn inc(&self, delta: i64) -> MetricResult<Counter> {
        self.client.count(&self.key, delta)
    }

    /// Decrement the counter by the given delta, returning errors to the caller.
    pub fn dec(&self, delta: i64) -> MetricResult<Counter> {
        self.client.count(&self.key, -delta)
    }
}

impl AddAssign<i64> for BucketCounter {
    fn add_assign(&mut self, delta: i64) {
        self.client.count_sampled(&self.key, delta).send();
    }
}

impl SubAssign<i64> for BucketCounter {
    fn sub_assign(&mut self, delta: i64) {
        self.client.count_sampled(&self.key, -delta).send();
    }
}

/// Timer bound to a single bucket that measures wall-clock time between
/// explicit marks.
///
/// A stopwatch is either idle or running. `start` begins a session, `split`
/// records the lap time since the previous mark, and `stop` records the total
/// elapsed time since `start` and returns the stopwatch to idle. Each
/// recorded value is sent as a timer under `<bucket>.<label>`.
///
/// Times are measured with the monotonic clock (`Instant`) and truncated to
/// whole milliseconds.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use metron::{Stopwatch, StatsdClient, NopMetricSink};
///
/// let client = Arc::new(StatsdClient::from_sink("", NopMetricSink));
/// let mut watch = Stopwatch::new(client, "page.render");
///
/// watch.start();
/// // ... render the header ...
/// watch.split("header").unwrap();
/// // ... render the body ...
/// watch.stop().unwrap();
/// ```
#[derive(Debug)]
pub struct Stopwatch {
    client: Arc<StatsdClient>,
    key: String,
    marks: Vec<(String, Instant)>,
}

impl Stopwatch {
    const START_LABEL: &'static str = "start";
    const STOP_LABEL: &'static str = "total";
    const PANIC_STOP_LABEL: &'static str = "total-except";

    pub fn new(client: Arc<StatsdClient>, key: &str) -> Stopwatch {
        Stopwatch {
            client,
            key: key.to_string(),
            marks: Vec::new(),
        }
    }

    /// Begin a timing session with the default label `"start"`.
    ///
    /// Starting is re-entrant: starting a running stopwatch discards the
    /// previous session's marks and begins a fresh one.
    pub fn start(&mut self) {
        self.start_with_label(Self::START_LABEL);
    }

    /// Begin a timing session with a custom label for the start mark.
    pub fn start_with_label(&mut self, label: &str) {
        self.marks.clear();
        self.marks.push((label.to_string(), Instant::now()));
    }

    /// Is there a session in progress?
    pub fn is_running(&self) -> bool {
        !self.marks.is_empty()
    }

    /// Record the lap time since the previous mark under
    /// `<bucket>.<label>` and add a new mark for this split.
    ///
    /// Returns an `InvalidState` error if the stopwatch is not running.
    pub fn split(&mut self, label: &str) -> MetricResult<Timer> {
        let now = Instant::now();
        let last = match self.marks.last() {
            Some(&(_, instant)) => instant,
            None => {
                return Err(MetricError::from((
                    ErrorKind::InvalidState,
                    "stopwatch has not been started",
                )))
            }
        };

        let lap = now.duration_since(last).as_millis() as u64;
        self.marks.push((label.to_string(), now));
        self.client.time(&format!("{}.{}", self.key, label), lap)
    }

    /// Record the total time since the session started under
    /// `<bucket>.total` and return the stopwatch to idle.
    ///
    /// Returns an `InvalidState` error if the stopwatch is not running.
    pub fn stop(&mut self) -> MetricResult<Timer> {
        self.stop_with_label(Self::STOP_LABEL)
    }

    /// Record the total time since the session started under a custom
    /// label and return the stopwatch to idle.
    pub fn stop_with_label(&mut self, label: &str) -> MetricResult<Timer> {
        let now = Instant::now();
        let start = match self.marks.first() {
            Some(&(_, instant)) => instant,
            None => {
                return Err(MetricError::from((
                    ErrorKind::InvalidState,
                    "stopwatch has not been started",
                )))
            }
        };

        let total = now.duration_since(start).as_millis() as u64;
        self.marks.clear();
        self.client.time(&format!("{}.{}", self.key, label), total)
    }

    /// Start a session and return a guard that stops it when dropped.
    ///
    /// On drop the total is recorded under `<bucket>.total`, or
    /// `<bucket>.total-except` when the thread is panicking. Errors during
    /// the implicit stop are routed to the client's error handler.
    pub fn scoped(&mut self) -> StopwatchGuard<'_> {
        self.start();
        StopwatchGuard { watch: self }
    }

    /// Run a closure inside a scoped session, timing its execution.
    ///
    /// The closure's return value is passed through; panics propagate after
    /// the total has been recorded under `<bucket>.total-except`.
    pub fn time<F, R>(&mut self, body: F) -> R
    where
        F: FnOnce() -> R,
    {
        let _guard = self.scoped();
        body()
    }

    /// Wrap a closure so that each invocation is timed as one session.
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use metron::{Stopwatch, StatsdClient, NopMetricSink};
    ///
    /// let client = Arc::new(StatsdClient::from_sink("", NopMetricSink));
    /// let mut render = Stopwatch::wrap(client, "page.render", || {
    ///     // ... render the page ...
    ///     42
    /// });
    ///
    /// assert_eq!(42, render());
    /// ```
    pub fn wrap<F, R>(client: Arc<StatsdClient>, key: &str, mut body: F) -> impl FnMut() -> R
    where
        F: FnMut() -> R,
    {
        let mut watch = Stopwatch::new(client, key);
        move || watch.time(&mut body)
    }
}

/// Guard that stops a running `Stopwatch` session when dropped.
#[derive(Debug)]
pub struct StopwatchGuard<'a> {
    watch: &'a mut Stopwatch,
}

impl<'a> Drop for StopwatchGuard<'a> {
    fn drop(&mut self) {
        let label = if thread::panicking() {
            Stopwatch::PANIC_STOP_LABEL
        } else {
            Stopwatch::STOP_LABEL
        };

        if let Err(err) = self.watch.stop_with_label(label) {
            self.watch.client.consume_error(err);
        }
    }
}
