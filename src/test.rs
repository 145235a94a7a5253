// Metron - A minimal Statsd client for Rust!
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Shared fixtures for unit tests.

use crate::sinks::MetricSink;
use std::io;

/// `MetricSink` implementation that returns an I/O error for every write,
/// used to exercise error handling paths in tests.
pub(crate) struct ErrorMetricSink;

impl ErrorMetricSink {
    pub(crate) fn always() -> Self {
        ErrorMetricSink
    }
}

impl MetricSink for ErrorMetricSink {
    fn emit(&self, _metric: &str) -> io::Result<usize> {
        Err(io::Error::from(io::ErrorKind::Other))
    }
}
