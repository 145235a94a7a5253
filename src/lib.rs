// Metron - A minimal Statsd client for Rust!
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A minimal Statsd client for Rust.
//!
//! Metron sends counters, timers, and gauges to a Statsd server over UDP,
//! one datagram per metric event. There's no aggregation, buffering, or
//! retrying: UDP is fire-and-forget by design and a lost metric is cheaper
//! than a blocked request path.
//!
//! ## Features
//!
//! * Support for emitting counters, timers, and gauges to Statsd
//! * Support for sampling metrics, per client or per call
//! * A `BucketCounter` helper with fluent `+=` / `-=` syntax
//! * A `Stopwatch` helper for timing code sections, scopes, and closures
//! * A process-wide default client with free functions for one-line use
//! * Pluggable metric sinks (UDP, console, logging, no-op, test spy)
//!
//! ## Usage
//!
//! Simple usage of Metron is shown below:
//!
//! ```no_run
//! use metron::prelude::*;
//! use metron::{StatsdClient, DEFAULT_PORT};
//!
//! let client = StatsdClient::from_udp_host("my.metrics", ("localhost", DEFAULT_PORT)).unwrap();
//! client.incr("some.counter").unwrap();
//! client.time("some.methodCall", 42).unwrap();
//! client.gauge("some.thing", 7).unwrap();
//! ```
//!
//! ### Sampling
//!
//! When a metric fires too often to send every event, give it a sample
//! rate. A random draw per event decides whether a datagram is written and
//! the rate is included in the payload so the server can scale the value
//! back up:
//!
//! ```no_run
//! use metron::prelude::*;
//! use metron::StatsdClient;
//!
//! let client = StatsdClient::from_udp_host("my.metrics", ("localhost", 8125)).unwrap();
//! // roughly one event in ten actually hits the wire
//! client.count_sampled("requests.handled", 1).with_rate(0.1).send();
//! ```
//!
//! ### Helpers
//!
//! The `BucketCounter` and `Stopwatch` helpers bind a client to a single
//! bucket for repeated use:
//!
//! ```no_run
//! use std::sync::Arc;
//! use metron::{BucketCounter, Stopwatch, StatsdClient};
//!
//! let client = Arc::new(StatsdClient::from_udp_host("", ("localhost", 8125)).unwrap());
//!
//! let mut logins = BucketCounter::new(client.clone(), "user.logins");
//! logins += 1;
//!
//! let mut watch = Stopwatch::new(client, "page.render");
//! watch.start();
//! watch.split("header").unwrap();
//! watch.stop().unwrap();
//! ```
//!
//! ### Default client
//!
//! For applications that don't want to thread a client instance through
//! every call site there is a process-wide default client, configured once
//! and used via free functions:
//!
//! ```no_run
//! use metron::{initialize, increment, timing, Settings};
//!
//! initialize(Settings::default()
//!     .with_host("metrics.example.com")
//!     .with_prefix("web")).unwrap();
//!
//! increment("user.logins").unwrap();
//! timing("page.render", 42).unwrap();
//! ```
//!
//! The free functions work before `initialize` is ever called, using
//! `localhost:8125` with no prefix.
//!
//! ### Custom sinks
//!
//! All metrics flow through an implementation of the `MetricSink` trait.
//! Besides the UDP sink there are sinks that discard metrics
//! (`NopMetricSink`), print them (`ConsoleMetricSink`), emit them via the
//! `log` crate (`LoggingMetricSink`), or hand them to a channel for
//! inspection in tests (`SpyMetricSink`). Implementing the trait yourself
//! is a single method.
//!
//! ### Error handling
//!
//! Methods that return a `MetricResult` propagate failures to the caller.
//! The quiet `.send()` path on `MetricBuilder` instead routes errors
//! through a handler registered on the client, defaulting to a no-op:
//!
//! ```no_run
//! use metron::prelude::*;
//! use metron::{StatsdClient, NopMetricSink};
//!
//! let client = StatsdClient::builder("my.metrics", NopMetricSink)
//!     .with_error_handler(|e| eprintln!("metric error: {}", e))
//!     .build();
//!
//! client.count_sampled("some.counter", 1).send();
//! ```

#![forbid(unsafe_code)]

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 8125;

pub use crate::builder::{MetricBuilder, MetricValue, SampleRate};
pub use crate::client::{
    Counted, CountedExt, Gauged, MetricBackend, MetricClient, StatsdClient, StatsdClientBuilder,
    Timed, ToCounterValue, ToGaugeValue, ToTimerValue,
};
pub use crate::global::{
    count, current_settings, decrement, default_client, gauge, increment, initialize,
    set_default_client, timing, ActiveSettings, Settings,
};
pub use crate::helpers::{BucketCounter, Stopwatch, StopwatchGuard};
pub use crate::sinks::{
    ConsoleMetricSink, LoggingMetricSink, MetricSink, NopMetricSink, SinkStats, SpyMetricSink,
    UdpMetricSink,
};
pub use crate::types::{
    Counter, ErrorKind, Gauge, Metric, MetricError, MetricResult, Timer,
};

mod builder;
mod client;
mod global;
mod helpers;
pub mod prelude;
mod sinks;
mod types;

mod sealed {
    pub trait Sealed {}
}

#[cfg(test)]
pub(crate) mod test;
