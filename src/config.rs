//! System configuration parameters
//!
//! All tunable parameters for the HomeWatch system.  Thresholds and timing
//! are fixed for the lifetime of the process; secrets are baked in from the
//! build environment.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Read a build-time environment variable, falling back to a placeholder.
macro_rules! build_env {
    ($name:literal, $fallback:literal) => {
        match option_env!($name) {
            Some(v) => v,
            None => $fallback,
        }
    };
}

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Weather thresholds ---
    /// Temperature (Celsius) above which a weather alert is raised
    pub temperature_limit_c: f32,
    /// Relative humidity (%) above which a weather alert is raised
    pub humidity_limit_percent: f32,

    // --- Motion ---
    /// Minimum spacing between accepted PIR edges (milliseconds)
    pub motion_debounce_ms: u32,
    /// Minimum spacing between motion alert sequences (milliseconds)
    pub motion_cooldown_ms: u64,
    /// Caption attached to motion photos
    pub motion_caption: String,

    // --- Timing ---
    /// Sampling loop period (milliseconds, deadline-corrected)
    pub sample_period_ms: u64,
    /// Alert loop poll interval (milliseconds)
    pub alert_poll_interval_ms: u64,
    /// Pause between a notification and the following dashboard publish
    pub dashboard_spacing_ms: u64,

    // --- Photo relay ---
    pub fetch: FetchPolicy,
    pub upload: UploadPolicy,

    // --- Collaborators ---
    pub telegram: TelegramConfig,
    pub dashboard: DashboardConfig,
    pub camera: CameraConfig,
    pub wifi: WifiConfig,

    // --- Tasks ---
    /// Stack size for the sampling task (KB)
    pub sample_task_stack_kb: usize,
    /// Stack size for the alert task (KB); TLS handshakes run here
    pub alert_task_stack_kb: usize,
}

/// Retry and buffering policy for private-network image downloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchPolicy {
    pub max_attempts: u8,
    /// Linear backoff: attempt index × this value
    pub backoff_base_ms: u64,
    /// Connect / socket read timeout
    pub socket_timeout_ms: u64,
    /// Whole-request timeout handed to the HTTP client
    pub request_timeout_ms: u64,
    /// Abort an attempt after this long without forward progress
    pub idle_timeout_ms: u64,
    /// Initial capacity when the server declares no length
    pub default_capacity: usize,
    /// Largest image accepted, declared or streamed
    pub max_image_bytes: usize,
}

/// Retry policy for the multipart photo upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadPolicy {
    pub max_attempts: u8,
    pub backoff_base_ms: u64,
    pub timeout_ms: u64,
}

/// Telegram Bot API endpoint and recipient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub api_base: String,
    pub bot_token: String,
    pub chat_id: String,
}

/// Adafruit IO MQTT dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub key: String,
    pub temperature_feed: String,
    pub humidity_feed: String,
    pub alerts_feed: String,
    pub connect_attempts: u8,
    pub connect_retry_delay_ms: u64,
}

/// LAN camera node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    pub ip: String,
    pub port: u16,
    /// Return placeholder public images instead of the LAN camera URL
    pub mock_mode: bool,
    pub check_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WifiConfig {
    pub ssid: String,
    pub password: String,
    /// Status polls before giving up and restarting
    pub connect_polls: u32,
    pub poll_interval_ms: u64,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Weather
            temperature_limit_c: 34.0,
            humidity_limit_percent: 90.0,

            // Motion
            motion_debounce_ms: 5_000,
            motion_cooldown_ms: 60_000,
            motion_caption: "Motion detected".into(),

            // Timing
            sample_period_ms: 30_000,
            alert_poll_interval_ms: 1_000,
            dashboard_spacing_ms: 1_000,

            fetch: FetchPolicy {
                max_attempts: 3,
                backoff_base_ms: 600,
                socket_timeout_ms: 12_000,
                request_timeout_ms: 20_000,
                idle_timeout_ms: 12_000,
                default_capacity: 8 * 1024,
                max_image_bytes: 512 * 1024,
            },
            upload: UploadPolicy {
                max_attempts: 3,
                backoff_base_ms: 600,
                timeout_ms: 20_000,
            },

            telegram: TelegramConfig {
                api_base: "https://api.telegram.org".into(),
                bot_token: build_env!("HOMEWATCH_TELEGRAM_TOKEN", "000000:unset").into(),
                chat_id: build_env!("HOMEWATCH_TELEGRAM_CHAT_ID", "0").into(),
            },
            dashboard: DashboardConfig {
                host: "io.adafruit.com".into(),
                port: 1883,
                username: build_env!("HOMEWATCH_IO_USERNAME", "homewatch").into(),
                key: build_env!("HOMEWATCH_IO_KEY", "").into(),
                temperature_feed: "temperature".into(),
                humidity_feed: "humidity".into(),
                alerts_feed: "alerts".into(),
                connect_attempts: 3,
                connect_retry_delay_ms: 5_000,
            },
            camera: CameraConfig {
                ip: build_env!("HOMEWATCH_CAMERA_IP", "192.168.1.100").into(),
                port: 80,
                mock_mode: false,
                check_timeout_ms: 5_000,
            },
            wifi: WifiConfig {
                ssid: build_env!("HOMEWATCH_WIFI_SSID", "homewatch").into(),
                password: build_env!("HOMEWATCH_WIFI_PASS", "").into(),
                connect_polls: 60,
                poll_interval_ms: 500,
            },

            sample_task_stack_kb: 8,
            alert_task_stack_kb: 12,
        }
    }
}

impl SystemConfig {
    /// Reject values that would stall a loop or disable a safeguard.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_period_ms == 0 || self.alert_poll_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("loop periods must be non-zero"));
        }
        if self.fetch.max_attempts == 0 || self.upload.max_attempts == 0 {
            return Err(ConfigError::ValidationFailed("retry caps must be at least 1"));
        }
        if self.fetch.default_capacity == 0
            || self.fetch.default_capacity > self.fetch.max_image_bytes
        {
            return Err(ConfigError::ValidationFailed(
                "default capacity must be within the image ceiling",
            ));
        }
        if self.fetch.idle_timeout_ms == 0 {
            return Err(ConfigError::ValidationFailed("idle timeout must be non-zero"));
        }
        if self.telegram.chat_id.is_empty() {
            return Err(ConfigError::ValidationFailed("telegram chat id is empty"));
        }
        if !self.temperature_limit_c.is_finite() || !self.humidity_limit_percent.is_finite() {
            return Err(ConfigError::ValidationFailed("weather limits must be finite"));
        }
        Ok(())
    }

    /// URL the real camera serves its latest JPEG from.
    pub fn camera_capture_url(&self) -> String {
        if self.camera.port == 80 {
            format!("http://{}/jpg", self.camera.ip)
        } else {
            format!("http://{}:{}/jpg", self.camera.ip, self.camera.port)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let c = SystemConfig::default();
        assert!(c.validate().is_ok());
        assert_eq!(c.motion_debounce_ms, 5_000);
        assert_eq!(c.motion_cooldown_ms, 60_000);
        assert_eq!(c.sample_period_ms, 30_000);
        assert_eq!(c.fetch.max_attempts, 3);
        assert_eq!(c.upload.max_attempts, 3);
    }

    #[test]
    fn serde_roundtrip() {
        let c = SystemConfig::default();
        let json = serde_json::to_string(&c).unwrap();
        let c2: SystemConfig = serde_json::from_str(&json).unwrap();
        assert!((c.temperature_limit_c - c2.temperature_limit_c).abs() < 0.001);
        assert_eq!(c.fetch.idle_timeout_ms, c2.fetch.idle_timeout_ms);
        assert_eq!(c.telegram.api_base, c2.telegram.api_base);
    }

    #[test]
    fn zero_retry_cap_rejected() {
        let mut c = SystemConfig::default();
        c.upload.max_attempts = 0;
        assert!(matches!(c.validate(), Err(ConfigError::ValidationFailed(_))));
    }

    #[test]
    fn capacity_above_ceiling_rejected() {
        let mut c = SystemConfig::default();
        c.fetch.default_capacity = c.fetch.max_image_bytes + 1;
        assert!(c.validate().is_err());
    }

    #[test]
    fn timing_ratios_make_sense() {
        let c = SystemConfig::default();
        assert!(
            c.alert_poll_interval_ms < c.sample_period_ms,
            "alert polling should be faster than sampling"
        );
        assert!(
            (c.motion_debounce_ms as u64) < c.motion_cooldown_ms,
            "debounce window sits inside the cooldown"
        );
    }

    #[test]
    fn camera_url_omits_default_port() {
        let mut c = SystemConfig::default();
        c.camera.ip = "10.28.158.71".into();
        assert_eq!(c.camera_capture_url(), "http://10.28.158.71/jpg");
        c.camera.port = 8080;
        assert_eq!(c.camera_capture_url(), "http://10.28.158.71:8080/jpg");
    }
}
