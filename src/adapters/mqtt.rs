//! Adafruit IO dashboard adapter (MQTT).
//!
//! Implements [`DashboardPort`] by publishing to the account's feeds:
//!
//! ```text
//!   <user>/feeds/temperature   "23.40"
//!   <user>/feeds/humidity      "41.00"
//!   <user>/feeds/alerts        "motion" | "high_temperature" | "<reason> | Photo: <url>"
//! ```
//!
//! Publishes are QoS 0 and fire-and-forget.  A publish while the broker
//! is unreachable returns `false` at once and is not queued: both loops
//! share one client behind a mutex, so a publish never waits for the
//! broker.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `EspMqttClient`; the IDF MQTT task owns
//!   reconnection once a client exists.
//! - **all other targets**: in-memory simulation that records publishes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use log::{info, warn};

use crate::app::ports::{DashboardPort, Metric};
use crate::config::DashboardConfig;

#[cfg(target_os = "espidf")]
use esp_idf_svc::mqtt::client::{EspMqttClient, EventPayload, MqttClientConfiguration, QoS};

// ───────────────────────────────────────────────────────────────
// Payload formatting
// ───────────────────────────────────────────────────────────────

/// Full topic for a feed key.
pub fn feed_topic(username: &str, feed: &str) -> String {
    format!("{}/feeds/{}", username, feed)
}

/// Alert feed payload.
pub fn format_alert(reason: &str, locator: Option<&str>) -> String {
    match locator {
        Some(url) if !url.is_empty() => format!("{} | Photo: {}", reason, url),
        _ => reason.to_owned(),
    }
}

/// Metric feed payload.
pub fn format_value(value: f32) -> String {
    format!("{:.2}", value)
}

// ───────────────────────────────────────────────────────────────
// MqttDashboard
// ───────────────────────────────────────────────────────────────

pub struct MqttDashboard {
    config: DashboardConfig,
    temperature_topic: String,
    humidity_topic: String,
    alerts_topic: String,
    connected: Arc<AtomicBool>,
    #[cfg(target_os = "espidf")]
    client: Option<EspMqttClient<'static>>,
    #[cfg(not(target_os = "espidf"))]
    published: Vec<(String, String)>,
    #[cfg(not(target_os = "espidf"))]
    broker_reachable: bool,
}

impl MqttDashboard {
    pub fn new(config: DashboardConfig) -> Self {
        let user = config.username.as_str();
        Self {
            temperature_topic: feed_topic(user, &config.temperature_feed),
            humidity_topic: feed_topic(user, &config.humidity_feed),
            alerts_topic: feed_topic(user, &config.alerts_feed),
            config,
            connected: Arc::new(AtomicBool::new(false)),
            #[cfg(target_os = "espidf")]
            client: None,
            #[cfg(not(target_os = "espidf"))]
            published: Vec::new(),
            #[cfg(not(target_os = "espidf"))]
            broker_reachable: true,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Connect with the configured retry count.  Returns `false` and keeps
    /// going degraded when every attempt fails.
    pub fn connect(&mut self) -> bool {
        let attempts = self.config.connect_attempts.max(1);
        for attempt in 1..=attempts {
            info!("MQTT: connecting to {}:{} (attempt {}/{})", self.config.host, self.config.port, attempt, attempts);
            if self.platform_connect() {
                info!("MQTT: connected");
                return true;
            }
            warn!("MQTT: connect attempt {} failed", attempt);
            if attempt < attempts {
                std::thread::sleep(std::time::Duration::from_millis(self.config.connect_retry_delay_ms));
            }
        }
        warn!("MQTT: continuing without dashboard");
        false
    }

    fn topic(&self, metric: Metric) -> &str {
        match metric {
            Metric::Temperature => &self.temperature_topic,
            Metric::Humidity => &self.humidity_topic,
        }
    }

    fn publish(&mut self, topic: String, payload: String) -> bool {
        if !self.is_connected() {
            self.ensure_client();
            warn!("MQTT: not connected, dropping publish to {}", topic);
            return false;
        }
        let ok = self.platform_publish(&topic, &payload);
        if ok {
            info!("MQTT: {} <- {}", topic, payload);
        } else {
            warn!("MQTT: publish to {} failed", topic);
        }
        ok
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> bool {
        self.ensure_client() && self.wait_connected()
    }

    /// Create the client if boot never managed to.  Once it exists the IDF
    /// MQTT task reconnects on its own.
    #[cfg(target_os = "espidf")]
    fn ensure_client(&mut self) -> bool {
        if self.client.is_some() {
            return true;
        }
        let url = format!("mqtt://{}:{}", self.config.host, self.config.port);
        let conf = MqttClientConfiguration {
            client_id: Some("homewatch"),
            username: Some(self.config.username.as_str()),
            password: Some(self.config.key.as_str()),
            ..Default::default()
        };
        let flag = Arc::clone(&self.connected);
        let client = EspMqttClient::new_cb(&url, &conf, move |event| match event.payload() {
            EventPayload::Connected(_) => flag.store(true, Ordering::Release),
            EventPayload::Disconnected => flag.store(false, Ordering::Release),
            _ => {}
        });
        match client {
            Ok(c) => {
                self.client = Some(c);
                true
            }
            Err(e) => {
                warn!("MQTT: client init failed: {}", e);
                false
            }
        }
    }

    #[cfg(target_os = "espidf")]
    fn wait_connected(&self) -> bool {
        let polls = (self.config.connect_retry_delay_ms / 100).max(1);
        for _ in 0..polls {
            if self.is_connected() {
                return true;
            }
            std::thread::sleep(std::time::Duration::from_millis(100));
        }
        self.is_connected()
    }

    #[cfg(target_os = "espidf")]
    fn platform_publish(&mut self, topic: &str, payload: &str) -> bool {
        match self.client.as_mut() {
            Some(c) => c.publish(topic, QoS::AtMostOnce, false, payload.as_bytes()).is_ok(),
            None => false,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> bool {
        self.ensure_client();
        self.is_connected()
    }

    /// Stands in for the IDF task's background reconnect.
    #[cfg(not(target_os = "espidf"))]
    fn ensure_client(&mut self) -> bool {
        if self.broker_reachable && !self.is_connected() {
            info!("MQTT(sim): connected as '{}'", self.config.username);
        }
        self.connected.store(self.broker_reachable, Ordering::Release);
        self.broker_reachable
    }

    /// Take the simulated broker up or down.
    #[cfg(not(target_os = "espidf"))]
    pub fn set_broker_reachable(&mut self, reachable: bool) {
        self.broker_reachable = reachable;
        if !reachable {
            self.connected.store(false, Ordering::Release);
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_publish(&mut self, topic: &str, payload: &str) -> bool {
        self.published.push((topic.to_owned(), payload.to_owned()));
        true
    }

    /// Everything published so far (simulation only).
    #[cfg(not(target_os = "espidf"))]
    pub fn published(&self) -> &[(String, String)] {
        &self.published
    }
}

impl DashboardPort for MqttDashboard {
    fn publish_metric(&mut self, metric: Metric, value: f32) -> bool {
        let topic = self.topic(metric).to_owned();
        self.publish(topic, format_value(value))
    }

    fn publish_alert(&mut self, reason: &str, locator: Option<&str>) -> bool {
        let topic = self.alerts_topic.clone();
        self.publish(topic, format_alert(reason, locator))
    }
}

// ───────────────────────────────────────────────────────────────
// Shared handle for the two loops
// ───────────────────────────────────────────────────────────────

/// Cloneable [`DashboardPort`] over one underlying connection.
pub struct SharedDashboard<D> {
    inner: Arc<Mutex<D>>,
}

impl<D> Clone for SharedDashboard<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D: DashboardPort> SharedDashboard<D> {
    pub fn new(dashboard: D) -> Self {
        Self {
            inner: Arc::new(Mutex::new(dashboard)),
        }
    }

    /// Run `f` with the underlying dashboard locked.
    pub fn with<R>(&self, f: impl FnOnce(&mut D) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

impl<D: DashboardPort> DashboardPort for SharedDashboard<D> {
    fn publish_metric(&mut self, metric: Metric, value: f32) -> bool {
        self.with(|d| d.publish_metric(metric, value))
    }

    fn publish_alert(&mut self, reason: &str, locator: Option<&str>) -> bool {
        self.with(|d| d.publish_alert(reason, locator))
    }
}
