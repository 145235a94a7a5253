// Metron - A minimal Statsd client for Rust!
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::builder::SampleRate;
use crate::client::{Counted, CountedExt, Gauged, StatsdClient, Timed};
use crate::sinks::UdpMetricSink;
use crate::types::{Counter, Gauge, MetricResult, Timer};
use std::net::UdpSocket;
use std::sync::{Arc, RwLock};

use crate::{DEFAULT_HOST, DEFAULT_PORT};

/// Partial settings for the process-wide default client.
///
/// Every field is optional. Fields left unset retain whatever value the
/// default client currently has (or the built-in default if the client has
/// never been configured). Pass a `Settings` instance to `initialize` to
/// apply it.
///
/// # Example
///
/// ```no_run
/// use metron::{initialize, Settings};
///
/// initialize(Settings::default()
///     .with_host("metrics.example.com")
///     .with_prefix("web")).unwrap();
/// ```
#[derive(Debug, Clone, Default)]
pub struct Settings {
    host: Option<String>,
    port: Option<u16>,
    sample_rate: Option<f32>,
    prefix: Option<String>,
}

impl Settings {
    /// Set the hostname of the Statsd server.
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = Some(host.to_string());
        self
    }

    /// Set the port of the Statsd server.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set a default sample rate for every metric sent by the default
    /// client. Validated against the (0.0, 1.0] range by `initialize`.
    pub fn with_sample_rate(mut self, rate: f32) -> Self {
        self.sample_rate = Some(rate);
        self
    }

    /// Set a prefix prepended to every bucket sent by the default client.
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_string());
        self
    }
}

/// Fully resolved settings of the process-wide default client.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveSettings {
    pub host: String,
    pub port: u16,
    pub sample_rate: Option<f32>,
    pub prefix: Option<String>,
}

impl Default for ActiveSettings {
    fn default() -> Self {
        ActiveSettings {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            sample_rate: None,
            prefix: None,
        }
    }
}

impl ActiveSettings {
    fn apply(&mut self, patch: Settings) {
        if let Some(host) = patch.host {
            self.host = host;
        }
        if let Some(port) = patch.port {
            self.port = port;
        }
        if let Some(rate) = patch.sample_rate {
            self.sample_rate = Some(rate);
        }
        if let Some(prefix) = patch.prefix {
            self.prefix = Some(prefix);
        }
    }
}

struct GlobalState {
    settings: ActiveSettings,
    client: Arc<StatsdClient>,
}

// Re-initialization swaps the Arc under the write lock; in-flight sends
// hold a clone of the old Arc and finish on the old client.
static GLOBAL: RwLock<Option<GlobalState>> = RwLock::new(None);

fn build_client(settings: &ActiveSettings) -> MetricResult<StatsdClient> {
    let socket = UdpSocket::bind("0.0.0.0:0")?;
    socket.set_nonblocking(true)?;
    let sink = UdpMetricSink::from((settings.host.as_str(), settings.port), socket)?;

    let mut builder = StatsdClient::builder(settings.prefix.as_deref().unwrap_or(""), sink);
    if let Some(rate) = settings.sample_rate {
        builder = builder.with_sample_rate(SampleRate::try_from(rate)?);
    }

    Ok(builder.build())
}

/// Configure the process-wide default client.
///
/// The given `Settings` patch is merged over the currently resolved settings
/// (or the built-in defaults of `localhost:8125` with no prefix and no
/// sampling, if the default client has never been configured). A new client
/// is built from the merged settings and atomically replaces the previous
/// one; threads with an in-flight send finish on the client they started
/// with.
///
/// # Failures
///
/// This method may fail if:
///
/// * It is unable to create a local UDP socket.
/// * It is unable to resolve the hostname of the metric server.
/// * The sample rate is outside of the (0.0, 1.0] range.
///
/// On failure the previous default client remains in place.
pub fn initialize(settings: Settings) -> MetricResult<()> {
    let mut guard = GLOBAL.write().unwrap();

    let mut resolved = match guard.as_ref() {
        Some(state) => state.settings.clone(),
        None => ActiveSettings::default(),
    };
    resolved.apply(settings);

    let client = build_client(&resolved)?;
    *guard = Some(GlobalState {
        settings: resolved,
        client: Arc::new(client),
    });

    Ok(())
}

/// Install an arbitrary client as the process-wide default.
///
/// This is primarily a seam for testing: a client backed by a
/// `SpyMetricSink` can be installed so the free functions in this module
/// can be observed. The resolved settings snapshot is reset to the
/// built-in defaults since they no longer describe the installed client.
pub fn set_default_client(client: StatsdClient) {
    let mut guard = GLOBAL.write().unwrap();
    *guard = Some(GlobalState {
        settings: ActiveSettings::default(),
        client: Arc::new(client),
    });
}

/// Get the process-wide default client, initializing it from the built-in
/// defaults if it has not been configured yet.
pub fn default_client() -> MetricResult<Arc<StatsdClient>> {
    {
        let guard = GLOBAL.read().unwrap();
        if let Some(state) = guard.as_ref() {
            return Ok(state.client.clone());
        }
    }

    let mut guard = GLOBAL.write().unwrap();
    // another thread may have won the race for the write lock
    if let Some(state) = guard.as_ref() {
        return Ok(state.client.clone());
    }

    let settings = ActiveSettings::default();
    let client = Arc::new(build_client(&settings)?);
    *guard = Some(GlobalState {
        settings,
        client: client.clone(),
    });

    Ok(client)
}

/// Get a snapshot of the resolved settings of the default client.
pub fn current_settings() -> ActiveSettings {
    let guard = GLOBAL.read().unwrap();
    match guard.as_ref() {
        Some(state) => state.settings.clone(),
        None => ActiveSettings::default(),
    }
}

/// Increment the counter with the given key by 1 using the default client.
pub fn increment(key: &str) -> MetricResult<Counter> {
    default_client()?.incr(key)
}

/// Decrement the counter with the given key by 1 using the default client.
pub fn decrement(key: &str) -> MetricResult<Counter> {
    default_client()?.decr(key)
}

/// Increment or decrement the counter with the given key by the given delta
/// using the default client.
pub fn count(key: &str, delta: i64) -> MetricResult<Counter> {
    default_client()?.count(key, delta)
}

/// Record a timing in milliseconds with the given key using the default
/// client.
pub fn timing(key: &str, time: u64) -> MetricResult<Timer> {
    default_client()?.time(key, time)
}

/// Record a gauge value with the given key using the default client.
pub fn gauge(key: &str, value: i64) -> MetricResult<Gauge> {
    default_client()?.gauge(key, value)
}
