//! HomeWatch Firmware: Main Entry Point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  SensorHub(DHT22)  CameraAdapter  HttpAdapter   MqttDashboard  │
//! │  (SamplePort)      (CapturePort)  (HttpPort)    (DashboardPort)│
//! │  Esp32TimeAdapter  LogEventSink   WifiAdapter                  │
//! │  (TimePort)        (EventSink)    (Connectivity)               │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │  AlertOrchestrator · WeatherGate · PhotoRelay          │    │
//! │  │  (pure logic over ports)                               │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  TaskScheduler: "sampling" + "alerts" loops on the APP core    │
//! │  PIR ISR ─▶ MotionDebouncer (atomics)                          │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use log::{error, info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::{Ets, FreeRtos};
use esp_idf_svc::hal::gpio::PinDriver;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};

use homewatch::adapters::camera::CameraAdapter;
use homewatch::adapters::http::HttpAdapter;
use homewatch::adapters::log_sink::LogEventSink;
use homewatch::adapters::mqtt::{MqttDashboard, SharedDashboard};
use homewatch::adapters::time::Esp32TimeAdapter;
use homewatch::adapters::wifi::{ConnectivityPort, WifiAdapter};
use homewatch::app::ports::TimePort;
use homewatch::config::SystemConfig;
use homewatch::diagnostics::{self, HEALTH_INTERVAL_MS, HealthMonitor};
use homewatch::error::Error;
use homewatch::pins;
use homewatch::scheduler::{AlertPorts, SamplingPorts, TaskScheduler};
use homewatch::sensors::SensorHub;
use homewatch::sensors::dht22::Dht22;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  HomeWatch v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");
    diagnostics::install_panic_handler();

    // ── 2. Config (compile-time defaults) ─────────────────────
    let config = SystemConfig::default();
    config.validate().map_err(Error::from)?;

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    // ── 3. WiFi (restart on failure) ──────────────────────────
    let esp_wifi = EspWifi::new(peripherals.modem, sysloop.clone(), Some(nvs))?;
    let mut wifi = WifiAdapter::new(BlockingWifi::wrap(esp_wifi, sysloop)?, &config.wifi);
    wifi.set_credentials(&config.wifi.ssid, &config.wifi.password)?;
    if let Err(e) = wifi.connect() {
        error!("WiFi: {}, restarting", e);
        FreeRtos::delay_ms(1_000);
        // SAFETY: does not return.
        unsafe { esp_idf_svc::sys::esp_restart() };
    }

    // ── 4. Sensors ────────────────────────────────────────────
    let dht_pin = PinDriver::input_output_od(peripherals.pins.gpio4)?;
    info!("Sampling: DHT22 on GPIO{}, stabilising {} ms", pins::DHT_GPIO, pins::DHT_STABILIZE_MS);
    FreeRtos::delay_ms(pins::DHT_STABILIZE_MS);
    let sensors = SensorHub::new(
        Dht22::new(dht_pin, Ets),
        Esp32TimeAdapter::new(),
        config.temperature_limit_c,
        config.humidity_limit_percent,
    );

    // ── 5. Dashboard ──────────────────────────────────────────
    let mut mqtt = MqttDashboard::new(config.dashboard.clone());
    if !mqtt.connect() {
        warn!("MQTT: starting without dashboard; publishes will retry");
    }
    let dashboard = SharedDashboard::new(mqtt);

    // ── 6. Camera ─────────────────────────────────────────────
    let camera = CameraAdapter::new(&config);
    if !camera.check_connection(&mut HttpAdapter::new()) {
        warn!("Camera: unreachable at boot; motion alerts fall back to text");
    }

    // ── 7. Loops ──────────────────────────────────────────────
    let _handles = TaskScheduler::start(
        &config,
        SamplingPorts {
            sensors,
            http: HttpAdapter::new(),
            dashboard: dashboard.clone(),
            clock: Esp32TimeAdapter::new(),
            sink: LogEventSink::new(),
        },
        AlertPorts {
            camera,
            http: HttpAdapter::new(),
            dashboard,
            clock: Esp32TimeAdapter::new(),
            sink: LogEventSink::new(),
        },
    )?;
    info!("HomeWatch: armed (RSSI={:?})", wifi.rssi());

    // ── 8. Health reporting ───────────────────────────────────
    let clock = Esp32TimeAdapter::new();
    let mut health = HealthMonitor::new(HEALTH_INTERVAL_MS, clock.now_ms());
    loop {
        clock.sleep_ms(health.due_in_ms(clock.now_ms()).max(1));
        health.tick(clock.now_ms());
        if !wifi.is_connected() {
            warn!("WiFi: link lost; requests fail until the driver reassociates");
        }
    }
}
