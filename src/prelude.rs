// Metron - A minimal Statsd client for Rust!
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Exports of the various traits needed for sending metrics so that they
//! can be imported all at once: `use metron::prelude::*;`

pub use crate::client::{Counted, CountedExt, Gauged, MetricClient, Timed};
