// Metron - A minimal Statsd client for Rust!
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::types::{ErrorKind, MetricError};
use std::fmt;

/// Validated sample rate for a metric, in the range (0.0, 1.0].
///
/// Rates below 1.0 cause each metric event to be sent probabilistically,
/// with the rate appended to the payload (`|@0.5`) so the server can scale
/// the received values back up. A rate of exactly 1.0 behaves as if no
/// sampling were configured at all.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleRate {
    value: f32,
}

impl SampleRate {
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Does this rate actually cause sampling, i.e. is it below 1.0?
    pub fn is_sampled(&self) -> bool {
        self.value < 1.0
    }
}

impl TryFrom<f32> for SampleRate {
    type Error = MetricError;

    fn try_from(rate: f32) -> Result<Self, Self::Error> {
        if rate > 0.0 && rate <= 1.0 {
            Ok(SampleRate { value: rate })
        } else {
            Err(MetricError::from((
                ErrorKind::InvalidInput,
                "Sample rate must be between 0.0 and 1.0",
            )))
        }
    }
}

impl fmt::Display for SampleRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt(f)
    }
}
