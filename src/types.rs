// Metron - A minimal Statsd client for Rust!
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::error;
use std::fmt;
use std::io;

/// Trait for metrics that have been formatted for Statsd.
///
/// Implementations hold the canonical payload sent (or that would have
/// been sent, when sampled out) for a single metric event. The string
/// never includes a trailing newline.
pub trait Metric {
    fn as_metric_str(&self) -> &str;
}

/// Counter metric that knows its Statsd payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counter {
    repr: String,
}

impl Counter {
    pub fn new(prefix: &str, key: &str, count: i64) -> Counter {
        Counter {
            repr: format!("{}{}:{}|c", prefix, key, count),
        }
    }
}

impl From<String> for Counter {
    fn from(repr: String) -> Counter {
        Counter { repr }
    }
}

impl Metric for Counter {
    fn as_metric_str(&self) -> &str {
        &self.repr
    }
}

/// Timer metric (integral milliseconds) that knows its Statsd payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timer {
    repr: String,
}

impl Timer {
    pub fn new(prefix: &str, key: &str, time: u64) -> Timer {
        Timer {
            repr: format!("{}{}:{}|ms", prefix, key, time),
        }
    }
}

impl From<String> for Timer {
    fn from(repr: String) -> Timer {
        Timer { repr }
    }
}

impl Metric for Timer {
    fn as_metric_str(&self) -> &str {
        &self.repr
    }
}

/// Gauge metric that knows its Statsd payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gauge {
    repr: String,
}

impl Gauge {
    pub fn new(prefix: &str, key: &str, value: i64) -> Gauge {
        Gauge {
            repr: format!("{}{}:{}|g", prefix, key, value),
        }
    }

    pub fn new_f64(prefix: &str, key: &str, value: f64) -> Gauge {
        Gauge {
            repr: format!("{}{}:{}|g", prefix, key, value),
        }
    }
}

impl From<String> for Gauge {
    fn from(repr: String) -> Gauge {
        Gauge { repr }
    }
}

impl Metric for Gauge {
    fn as_metric_str(&self) -> &str {
        &self.repr
    }
}

/// Broad categories of things that can go wrong when sending metrics.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ErrorKind {
    /// Input such as a metric value or sample rate was out of range
    InvalidInput,
    /// An operation was attempted in a state that doesn't allow it
    InvalidState,
    /// Transport-level failure while handing a datagram to the OS
    IoError,
}

/// Error generated while constructing or sending a metric.
///
/// Transport failures wrap the underlying `io::Error`; everything else
/// carries a static description of what went wrong.
#[derive(Debug)]
pub struct MetricError {
    repr: ErrorRepr,
}

#[derive(Debug)]
enum ErrorRepr {
    WithDescription(ErrorKind, &'static str),
    IoError(io::Error),
}

impl MetricError {
    pub fn kind(&self) -> ErrorKind {
        match self.repr {
            ErrorRepr::IoError(_) => ErrorKind::IoError,
            ErrorRepr::WithDescription(kind, _) => kind,
        }
    }
}

impl fmt::Display for MetricError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.repr {
            ErrorRepr::IoError(ref err) => err.fmt(f),
            ErrorRepr::WithDescription(_, desc) => desc.fmt(f),
        }
    }
}

impl error::Error for MetricError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self.repr {
            ErrorRepr::IoError(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for MetricError {
    fn from(err: io::Error) -> MetricError {
        MetricError {
            repr: ErrorRepr::IoError(err),
        }
    }
}

impl From<(ErrorKind, &'static str)> for MetricError {
    fn from((kind, desc): (ErrorKind, &'static str)) -> MetricError {
        MetricError {
            repr: ErrorRepr::WithDescription(kind, desc),
        }
    }
}

pub type MetricResult<T> = Result<T, MetricError>;
