//! Sampling loop end to end: sample → dashboard feeds → weather thresholds.

use homewatch::app::events::AppEvent;
use homewatch::app::ports::Metric;
use homewatch::scheduler::{SamplingLoop, SamplingPorts};

use crate::mock_ports::*;

type TestSamplingLoop = SamplingLoop<ScriptedSensors, ScriptedHttp, RecordingDashboard, MockClock, RecordingSink>;

fn sampling_loop(readings: &[(Option<f32>, Option<f32>)], http: ScriptedHttp) -> TestSamplingLoop {
    SamplingLoop::new(
        &test_config(),
        SamplingPorts {
            sensors: ScriptedSensors::new(readings),
            http,
            dashboard: RecordingDashboard::new(),
            clock: MockClock::at(0),
            sink: RecordingSink::default(),
        },
    )
}

fn alert_texts(lp: &TestSamplingLoop) -> usize {
    lp.ports.http.gets_matching("sendMessage?").len()
}

#[test]
fn temperature_alert_is_edge_triggered() {
    let mut lp = sampling_loop(
        &[(Some(35.0), Some(50.0)), (Some(35.0), Some(50.0)), (Some(30.0), Some(50.0))],
        ScriptedHttp::new(),
    );

    lp.run_once();
    assert_eq!(alert_texts(&lp), 1);
    let url = &lp.ports.http.gets_matching("sendMessage?")[0].url;
    assert!(url.contains("chat_id=12345"));
    assert!(url.contains("text=HIGH+TEMPERATURE+ALERT%3A+35.0%C2%B0C+%28limit+34.0%C2%B0C%29"));
    assert_eq!(lp.ports.dashboard.alerts, vec!["high_temperature".to_owned()]);
    assert_eq!(
        lp.ports.dashboard.metrics,
        vec![(Metric::Temperature, 35.0), (Metric::Humidity, 50.0)]
    );
    assert!(lp.gate().state().temp_alerted);

    lp.run_once();
    assert_eq!(alert_texts(&lp), 1);
    assert_eq!(lp.ports.dashboard.alerts.len(), 1);

    lp.run_once();
    assert_eq!(alert_texts(&lp), 1);
    assert!(!lp.gate().state().temp_alerted);
    assert!(
        lp.ports
            .sink
            .events
            .contains(&AppEvent::WeatherAlertCleared {
                metric: Metric::Temperature
            })
    );
    assert_eq!(lp.ports.dashboard.metrics.len(), 6);
}

#[test]
fn value_at_limit_does_not_alert() {
    let mut lp = sampling_loop(&[(Some(34.0), Some(90.0))], ScriptedHttp::new());
    lp.run_once();
    assert_eq!(alert_texts(&lp), 0);
    assert!(lp.ports.dashboard.alerts.is_empty());
}

#[test]
fn both_metrics_raise_independently() {
    let mut lp = sampling_loop(&[(Some(36.2), Some(95.0)), (Some(36.2), Some(40.0))], ScriptedHttp::new());

    lp.run_once();
    assert_eq!(alert_texts(&lp), 2);
    assert_eq!(
        lp.ports.dashboard.alerts,
        vec!["high_temperature".to_owned(), "high_humidity".to_owned()]
    );

    lp.run_once();
    let state = lp.gate().state();
    assert!(state.temp_alerted);
    assert!(!state.humidity_alerted);
    assert_eq!(alert_texts(&lp), 2);
}

#[test]
fn invalid_reading_skips_publish_and_clears_flag() {
    let mut lp = sampling_loop(&[(Some(35.0), Some(50.0)), (None, Some(50.0)), (Some(35.0), Some(50.0))], ScriptedHttp::new());

    lp.run_once();
    lp.run_once();
    // Second sample: only humidity reaches the dashboard.
    assert_eq!(lp.ports.dashboard.metrics[2], (Metric::Humidity, 50.0));
    assert_eq!(lp.ports.dashboard.metrics.len(), 3);
    assert!(!lp.gate().state().temp_alerted);

    // Recovery above the limit is a fresh crossing.
    lp.run_once();
    assert_eq!(alert_texts(&lp), 2);
}

#[test]
fn failed_text_send_still_latches() {
    let http = ScriptedHttp::new().with_telegram_statuses(&[502]);
    let mut lp = sampling_loop(&[(Some(35.0), Some(50.0)), (Some(35.5), Some(50.0))], http);

    lp.run_once();
    assert!(lp.ports.sink.events.iter().any(|e| matches!(
        e,
        AppEvent::WeatherAlertRaised {
            metric: Metric::Temperature,
            notified: false,
            ..
        }
    )));
    assert_eq!(lp.ports.dashboard.alerts, vec!["high_temperature".to_owned()]);

    lp.run_once();
    assert_eq!(alert_texts(&lp), 1);
}

#[test]
fn offline_dashboard_does_not_block_alerts() {
    let mut lp = sampling_loop(&[(Some(40.0), Some(50.0))], ScriptedHttp::new());
    lp.ports.dashboard.online = false;
    lp.run_once();
    assert_eq!(alert_texts(&lp), 1);
    assert!(lp.ports.dashboard.alerts.is_empty());
}

#[test]
fn spacing_separates_dashboard_calls() {
    let mut lp = sampling_loop(&[(Some(35.0), Some(50.0))], ScriptedHttp::new());
    lp.run_once();
    // Between the two metric publishes, then between text and alert publish.
    assert_eq!(*lp.ports.clock.sleeps.borrow(), vec![1_000, 1_000]);
}
