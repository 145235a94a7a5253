// Metron - A minimal Statsd client for Rust!
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::client::{MetricBackend, StatsdClient};
use crate::types::{Metric, MetricError, MetricResult};
use std::fmt::{self, Write};
use std::marker::PhantomData;

mod sample_rate;
mod sampler;

pub use self::sample_rate::SampleRate;
pub(crate) use self::sampler::Sampler;

/// Type of metric that knows how to display itself
#[derive(Debug, Clone, Copy)]
enum MetricType {
    Counter,
    Timer,
    Gauge,
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            MetricType::Counter => "c".fmt(f),
            MetricType::Timer => "ms".fmt(f),
            MetricType::Gauge => "g".fmt(f),
        }
    }
}

/// Holder for primitive metric values that knows how to display itself
///
/// This struct is internal to how the various types that are valid for each
/// kind of metric (types for which `ToCounterValue`, `ToTimerValue`, etc. are
/// implemented) work but is exposed for documentation purposes and advanced
/// use cases.
///
/// Typical use of Metron shouldn't require interacting with this type.
#[derive(Debug, Clone, Copy)]
pub enum MetricValue {
    Signed(i64),
    Unsigned(u64),
    Float(f64),
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            MetricValue::Signed(v) => v.fmt(f),
            MetricValue::Unsigned(v) => v.fmt(f),
            MetricValue::Float(v) => v.fmt(f),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct MetricFormatter<'a> {
    prefix: &'a str,
    key: &'a str,
    val: MetricValue,
    type_: MetricType,
    rate: Option<SampleRate>,
}

impl<'a> MetricFormatter<'a> {
    pub(crate) fn counter(prefix: &'a str, key: &'a str, val: MetricValue) -> Self {
        Self::from_val(prefix, key, val, MetricType::Counter)
    }

    pub(crate) fn timer(prefix: &'a str, key: &'a str, val: MetricValue) -> Self {
        Self::from_val(prefix, key, val, MetricType::Timer)
    }

    pub(crate) fn gauge(prefix: &'a str, key: &'a str, val: MetricValue) -> Self {
        Self::from_val(prefix, key, val, MetricType::Gauge)
    }

    fn from_val(prefix: &'a str, key: &'a str, val: MetricValue, type_: MetricType) -> Self {
        MetricFormatter {
            prefix,
            key,
            val,
            type_,
            rate: None,
        }
    }

    pub(crate) fn set_rate(&mut self, rate: SampleRate) {
        self.rate = Some(rate);
    }

    pub(crate) fn rate(&self) -> Option<SampleRate> {
        self.rate
    }

    fn size_hint(&self) -> usize {
        self.prefix.len() + self.key.len() + 1 /* : */ + 10 /* value */ + 1 /* | */ + 2 /* type */
            + if self.rate.is_some() { 8 /* |@rate */ } else { 0 }
    }

    pub(crate) fn format(&self) -> String {
        let mut metric_string = String::with_capacity(self.size_hint());
        let _ = write!(
            metric_string,
            "{}{}:{}|{}",
            self.prefix, self.key, self.val, self.type_
        );

        // The rate is part of the payload whenever a sub-1.0 rate is in
        // effect; a rate of 1.0 means no sampling and no suffix.
        if let Some(rate) = self.rate {
            if rate.is_sampled() {
                let _ = write!(metric_string, "|@{}", rate);
            }
        }

        metric_string
    }
}

/// Internal state of a `MetricBuilder`
///
/// The builder can either be in the process of formatting a metric to send
/// via a client or it can be simply holding on to an error that it will be
/// dealt with when `.try_send()` or `.send()` is finally invoked.
#[derive(Debug)]
enum BuilderRepr<'m, 'c> {
    Success(MetricFormatter<'m>, &'c StatsdClient),
    Error(MetricError, &'c StatsdClient),
}

/// Builder for applying a per-call sample rate to in-progress metrics.
///
/// This builder attaches a sample rate to a metric that was previously
/// constructed by a call to a method on `StatsdClient`. The metric is sent
/// via the client when `MetricBuilder::send()` or `MetricBuilder::try_send()`
/// is invoked. Any errors encountered constructing, validating, or sending
/// the metric will be propagated and returned when those methods are finally
/// invoked.
///
/// When a sub-1.0 rate is in effect, a random draw per event decides whether
/// a datagram is actually written to the underlying sink. Events suppressed
/// by the draw still return the formatted metric from `.try_send()` so that
/// results are deterministic for callers.
///
/// NOTE: The only way to instantiate an instance of this builder is via
/// methods on the `StatsdClient` client.
///
/// # Examples
///
/// ## `.try_send()`
///
/// ```
/// use metron::prelude::*;
/// use metron::{StatsdClient, NopMetricSink, Metric};
///
/// let client = StatsdClient::from_sink("some.prefix", NopMetricSink);
/// let res = client.count_sampled("some.key", 1)
///    .with_rate(0.5)
///    .try_send();
///
/// assert_eq!("some.prefix.some.key:1|c|@0.5", res.unwrap().as_metric_str());
/// ```
///
/// ## `.send()`
///
/// An example of the "quiet" method, where errors are routed to the client's
/// registered error handler instead of being returned:
///
/// ```
/// use metron::prelude::*;
/// use metron::{StatsdClient, NopMetricSink, Metric};
///
/// let client = StatsdClient::builder("some.prefix", NopMetricSink)
///     .with_error_handler(|e| eprintln!("metric error: {}", e))
///     .build();
/// client.count_sampled("some.key", 1)
///    .with_rate(0.1)
///    .send();
/// ```
#[must_use = "Did you forget to call .send() after setting a sample rate?"]
#[derive(Debug)]
pub struct MetricBuilder<'m, 'c, T>
where
    T: Metric + From<String>,
{
    repr: BuilderRepr<'m, 'c>,
    type_: PhantomData<T>,
}

impl<'m, 'c, T> MetricBuilder<'m, 'c, T>
where
    T: Metric + From<String>,
{
    pub(crate) fn from_fmt(formatter: MetricFormatter<'m>, client: &'c StatsdClient) -> Self {
        MetricBuilder {
            repr: BuilderRepr::Success(formatter, client),
            type_: PhantomData,
        }
    }

    pub(crate) fn from_error(err: MetricError, client: &'c StatsdClient) -> Self {
        MetricBuilder {
            repr: BuilderRepr::Error(err, client),
            type_: PhantomData,
        }
    }

    /// Set the sample rate for this metric, overriding any default rate
    /// configured on the client.
    ///
    /// Rates outside of (0.0, 1.0] turn into an `InvalidInput` error that
    /// surfaces when the metric is finally sent.
    ///
    /// # Example
    ///
    /// ```
    /// use metron::prelude::*;
    /// use metron::{StatsdClient, NopMetricSink, Metric};
    ///
    /// let client = StatsdClient::from_sink("some.prefix", NopMetricSink);
    /// let res = client.count_sampled("some.key", 1)
    ///    .with_rate(0.25)
    ///    .try_send();
    ///
    /// assert_eq!(
    ///    "some.prefix.some.key:1|c|@0.25",
    ///    res.unwrap().as_metric_str()
    /// );
    /// ```
    pub fn with_rate(self, rate: f32) -> Self {
        match self.repr {
            BuilderRepr::Error(..) => self,
            BuilderRepr::Success(mut formatter, client) => match SampleRate::try_from(rate) {
                Ok(rate) => {
                    formatter.set_rate(rate);
                    Self::from_fmt(formatter, client)
                }
                Err(err) => Self::from_error(err, client),
            },
        }
    }

    /// Send a metric using the client that created this builder.
    ///
    /// When a sub-1.0 sample rate is in effect a random draw decides whether
    /// the datagram is handed to the sink at all; the formatted metric is
    /// returned either way. Transport errors are propagated to the caller.
    ///
    /// Note that the builder is consumed by this method and thus `.try_send()`
    /// can only be called a single time per builder.
    ///
    /// # Example
    ///
    /// ```
    /// use metron::prelude::*;
    /// use metron::{StatsdClient, NopMetricSink, Metric};
    ///
    /// let client = StatsdClient::from_sink("some.prefix", NopMetricSink);
    /// let res = client.gauge_sampled("some.key", 7).try_send();
    ///
    /// assert_eq!("some.prefix.some.key:7|g", res.unwrap().as_metric_str());
    /// ```
    pub fn try_send(self) -> MetricResult<T> {
        match self.repr {
            BuilderRepr::Error(err, _) => Err(err),
            BuilderRepr::Success(ref formatter, client) => {
                let metric = T::from(formatter.format());
                let send = formatter
                    .rate()
                    .map_or(true, |rate| Sampler::new_with_rate(rate).roll());

                if send {
                    client.send_metric(&metric)?;
                }

                Ok(metric)
            }
        }
    }

    /// Send a metric using the client that created this builder, discarding
    /// successful results and invoking a custom handler for error results.
    ///
    /// By default, if no handler is given, a "no-op" handler is used that
    /// simply discards all errors. If this isn't desired, a custom handler
    /// should be supplied when creating a new `StatsdClient` instance.
    ///
    /// Note that the builder is consumed by this method and thus `.send()`
    /// can only be called a single time per builder.
    ///
    /// # Example
    ///
    /// ```
    /// use metron::prelude::*;
    /// use metron::{StatsdClient, MetricError, NopMetricSink};
    ///
    /// fn my_handler(err: MetricError) {
    ///     println!("Metric error: {}", err);
    /// }
    ///
    /// let client = StatsdClient::builder("some.prefix", NopMetricSink)
    ///     .with_error_handler(my_handler)
    ///     .build();
    ///
    /// client.gauge_sampled("some.key", 7).send();
    /// ```
    pub fn send(self) {
        match self.repr {
            BuilderRepr::Error(err, client) => client.consume_error(err),
            BuilderRepr::Success(_, client) => {
                if let Err(e) = self.try_send() {
                    client.consume_error(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{MetricBuilder, MetricFormatter, MetricValue, SampleRate};
    use crate::client::StatsdClient;
    use crate::sinks::{NopMetricSink, SpyMetricSink};
    use crate::test::ErrorMetricSink;
    use crate::types::Counter;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_metric_formatter_counter() {
        let fmt = MetricFormatter::counter("prefix.", "some.key", MetricValue::Signed(4));
        assert_eq!("prefix.some.key:4|c", &fmt.format());
    }

    #[test]
    fn test_metric_formatter_counter_negative() {
        let fmt = MetricFormatter::counter("", "some.key", MetricValue::Signed(-5));
        assert_eq!("some.key:-5|c", &fmt.format());
    }

    #[test]
    fn test_metric_formatter_timer() {
        let fmt = MetricFormatter::timer("prefix.", "some.method", MetricValue::Unsigned(21));
        assert_eq!("prefix.some.method:21|ms", &fmt.format());
    }

    #[test]
    fn test_metric_formatter_gauge() {
        let fmt = MetricFormatter::gauge("prefix.", "num.failures", MetricValue::Signed(7));
        assert_eq!("prefix.num.failures:7|g", &fmt.format());
    }

    #[test]
    fn test_metric_formatter_gauge_float() {
        let fmt = MetricFormatter::gauge("prefix.", "num.failures", MetricValue::Float(2.5));
        assert_eq!("prefix.num.failures:2.5|g", &fmt.format());
    }

    #[test]
    fn test_metric_formatter_counter_with_rate() {
        let mut fmt = MetricFormatter::counter("prefix.", "some.key", MetricValue::Signed(4));
        fmt.set_rate(SampleRate::try_from(0.5).unwrap());

        assert_eq!("prefix.some.key:4|c|@0.5", &fmt.format());
    }

    #[test]
    fn test_metric_formatter_timer_with_rate() {
        let mut fmt = MetricFormatter::timer("prefix.", "some.method", MetricValue::Unsigned(21));
        fmt.set_rate(SampleRate::try_from(0.99).unwrap());

        assert_eq!("prefix.some.method:21|ms|@0.99", &fmt.format());
    }

    #[test]
    fn test_metric_formatter_doesnt_write_rate_of_one() {
        let mut fmt = MetricFormatter::counter("prefix.", "some.key", MetricValue::Signed(4));
        fmt.set_rate(SampleRate::try_from(1.0).unwrap());

        assert_eq!("prefix.some.key:4|c", &fmt.format());
    }

    #[test]
    fn test_metric_builder_with_rate_invalid() {
        let fmt = MetricFormatter::counter("prefix.", "some.counter", MetricValue::Signed(1));
        let client = StatsdClient::from_sink("prefix.", NopMetricSink);

        let builder: MetricBuilder<'_, '_, Counter> = MetricBuilder::from_fmt(fmt, &client);
        let res = builder.with_rate(1.5).try_send();

        assert!(res.is_err(), "expected Err result for out of range rate");
    }

    #[test]
    fn test_metric_builder_try_send_actually_samples() {
        let (rx, sink) = SpyMetricSink::new();
        let client = StatsdClient::builder("prefix.", sink).build();

        for i in 0..1000 {
            let fmt = MetricFormatter::counter("prefix.", "some.counter", MetricValue::Signed(i));
            let builder: MetricBuilder<'_, '_, Counter> = MetricBuilder::from_fmt(fmt, &client);
            builder.with_rate(0.5).try_send().unwrap();
        }

        drop(client);
        let sent = rx.iter().count();

        assert!(sent > 0); // always happening (probably)
        assert!(sent < 1000); // never happening (probably)
    }

    #[test]
    fn test_metric_builder_send_success() {
        let fmt = MetricFormatter::counter("prefix.", "some.counter", MetricValue::Signed(11));
        let client = StatsdClient::builder("prefix.", NopMetricSink)
            .with_error_handler(|e| {
                panic!("unexpected error sending metric: {}", e);
            })
            .build();

        // if the send failed the test would have called the error handler and panicked
        let builder: MetricBuilder<'_, '_, Counter> = MetricBuilder::from_fmt(fmt, &client);
        builder.send();
    }

    #[test]
    fn test_metric_builder_send_error() {
        let errors = Arc::new(AtomicU64::new(0));
        let errors_ref = errors.clone();

        let fmt = MetricFormatter::counter("prefix.", "some.counter", MetricValue::Signed(11));
        let client = StatsdClient::builder("prefix.", ErrorMetricSink::always())
            .with_error_handler(move |_e| {
                errors_ref.fetch_add(1, Ordering::Release);
            })
            .build();

        let builder: MetricBuilder<'_, '_, Counter> = MetricBuilder::from_fmt(fmt, &client);
        builder.send();

        assert_eq!(1, errors.load(Ordering::Acquire));
    }

    #[test]
    fn test_metric_builder_try_send_success() {
        let fmt = MetricFormatter::counter("prefix.", "some.counter", MetricValue::Signed(11));
        let client = StatsdClient::from_sink("prefix.", NopMetricSink);

        let builder: MetricBuilder<'_, '_, Counter> = MetricBuilder::from_fmt(fmt, &client);
        let res = builder.try_send();

        assert!(res.is_ok(), "expected Ok result from try_send");
    }

    #[test]
    fn test_metric_builder_try_send_error() {
        let fmt = MetricFormatter::counter("prefix.", "some.counter", MetricValue::Signed(11));
        let client = StatsdClient::from_sink("prefix.", ErrorMetricSink::always());

        let builder: MetricBuilder<'_, '_, Counter> = MetricBuilder::from_fmt(fmt, &client);
        let res = builder.try_send();

        assert!(res.is_err(), "expected Err result from try_send");
    }
}
