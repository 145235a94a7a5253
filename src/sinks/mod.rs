// Metron - A minimal Statsd client for Rust!
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

pub use self::core::{ConsoleMetricSink, LoggingMetricSink, MetricSink, NopMetricSink, SinkStats};
pub use self::spy::SpyMetricSink;
pub use self::udp::UdpMetricSink;

mod core;
mod spy;
mod udp;
