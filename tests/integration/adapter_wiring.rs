//! Both loops wired to the host simulation adapters the firmware uses,
//! sharing one dashboard connection.

use homewatch::adapters::camera::CameraAdapter;
use homewatch::adapters::log_sink::LogEventSink;
use homewatch::adapters::mqtt::{MqttDashboard, SharedDashboard};
use homewatch::app::orchestrator::MotionStep;
use homewatch::motion::MotionDebouncer;
use homewatch::relay::DeliveryOutcome;
use homewatch::scheduler::{AlertLoop, AlertPorts, SamplingLoop, SamplingPorts};
use homewatch::sensors::{SensorHub, SimEnvironment};

use crate::mock_ports::*;

#[test]
fn loops_share_one_dashboard_connection() {
    let mut config = test_config();
    config.dashboard.username = "alice".into();
    config.camera.mock_mode = true;

    let mut mqtt = MqttDashboard::new(config.dashboard.clone());
    assert!(mqtt.connect());
    let shared = SharedDashboard::new(mqtt);

    let mut sampling = SamplingLoop::new(
        &config,
        SamplingPorts {
            sensors: SensorHub::new(SimEnvironment::new(35.5, 42.0), MockClock::at(0), 34.0, 90.0),
            http: ScriptedHttp::new(),
            dashboard: shared.clone(),
            clock: MockClock::at(0),
            sink: LogEventSink::new(),
        },
    );

    let pir: &'static MotionDebouncer = Box::leak(Box::new(MotionDebouncer::new(config.motion_debounce_ms)));
    let mut alerts = AlertLoop::new(
        &config,
        pir,
        AlertPorts {
            camera: CameraAdapter::new(&config),
            http: ScriptedHttp::new(),
            dashboard: shared.clone(),
            clock: MockClock::at(0),
            sink: LogEventSink::new(),
        },
    );

    sampling.run_once();
    pir.on_edge_interrupt(7);
    assert_eq!(alerts.run_once(), MotionStep::Delivered(DeliveryOutcome::PhotoUrlSent));

    // Mock camera documents carry a public link, so nothing is fetched.
    assert_eq!(alerts.ports.http.requests.len(), 1);
    assert!(alerts.ports.http.requests[0].url.contains("picsum.photos"));

    shared.with(|d| {
        let topics: Vec<&str> = d.published().iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(
            topics,
            vec![
                "alice/feeds/temperature",
                "alice/feeds/humidity",
                "alice/feeds/alerts",
                "alice/feeds/alerts",
            ]
        );
        let payloads: Vec<&str> = d.published().iter().map(|(_, p)| p.as_str()).collect();
        assert_eq!(payloads, vec!["35.50", "42.00", "high_temperature", "motion"]);
    });
}
