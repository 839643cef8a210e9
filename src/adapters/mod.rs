//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements         | Connects to                  |
//! |------------|--------------------|------------------------------|
//! | `camera`   | CapturePort        | LAN camera node (`/jpg`)     |
//! | `http`     | HttpPort           | ESP-IDF HTTP client          |
//! | `log_sink` | EventSink          | Serial log output            |
//! | `mqtt`     | DashboardPort      | Adafruit IO MQTT broker      |
//! | `time`     | TimePort           | ESP32 system timer           |
//! | `wifi`     | ConnectivityPort   | ESP-IDF WiFi STA             |

pub mod camera;
pub mod http;
pub mod log_sink;
pub mod mqtt;
pub mod time;
pub mod wifi;
