//! Motion alert sequences end to end: debounce flag → cooldown → capture →
//! relay tiers → dashboard.

use homewatch::app::events::AppEvent;
use homewatch::app::orchestrator::MotionStep;
use homewatch::app::ports::TimePort;
use homewatch::error::NetError;
use homewatch::motion::MotionDebouncer;
use homewatch::relay::DeliveryOutcome;
use homewatch::scheduler::{AlertLoop, AlertPorts};

use crate::mock_ports::*;

type TestAlertLoop = AlertLoop<ScriptedCapture, ScriptedHttp, RecordingDashboard, MockClock, RecordingSink>;

fn alert_loop(http: ScriptedHttp, camera: ScriptedCapture) -> (TestAlertLoop, &'static MotionDebouncer) {
    let debouncer: &'static MotionDebouncer = Box::leak(Box::new(MotionDebouncer::new(5_000)));
    let lp = AlertLoop::new(
        &test_config(),
        debouncer,
        AlertPorts {
            camera,
            http,
            dashboard: RecordingDashboard::new(),
            clock: MockClock::at(100_000),
            sink: RecordingSink::default(),
        },
    );
    (lp, debouncer)
}

fn jpeg(len: usize) -> Vec<u8> {
    let mut v: Vec<u8> = (0..len).map(|i| (i * 31 % 251) as u8).collect();
    v[0] = 0xFF;
    v[1] = 0xD8;
    v
}

#[test]
fn idle_poll_does_nothing() {
    let (mut lp, _) = alert_loop(ScriptedHttp::new(), ScriptedCapture::lan());
    assert_eq!(lp.run_once(), MotionStep::Idle);
    assert!(lp.ports.http.requests.is_empty());
    assert_eq!(lp.ports.camera.captures, 0);
    assert_eq!(*lp.ports.clock.sleeps.borrow(), vec![1_000]);
}

#[test]
fn private_photo_uploaded_on_first_attempt() {
    let image = jpeg(12_000);
    let http = ScriptedHttp::new().with_image(ImageReply::Image(image.clone()));
    let (mut lp, pir) = alert_loop(http, ScriptedCapture::lan());

    assert!(pir.on_edge_interrupt(1));
    let step = lp.run_once();
    assert_eq!(step, MotionStep::Delivered(DeliveryOutcome::PhotoUploaded { attempts: 1 }));

    let http = &lp.ports.http;
    assert_eq!(http.camera_gets(), 1);
    let posts = http.posts();
    assert_eq!(posts.len(), 1);
    assert!(posts[0].url.ends_with("/bot42:TEST/sendPhoto"));

    let ct = posts[0].content_type.as_deref().unwrap();
    assert!(ct.starts_with("multipart/form-data; boundary="));
    assert_eq!(multipart_field(&posts[0].body, ct, "chat_id").unwrap(), CHAT_ID.as_bytes());
    assert_eq!(multipart_field(&posts[0].body, ct, "caption").unwrap(), b"Motion detected");
    assert_eq!(multipart_field(&posts[0].body, ct, "photo").unwrap(), &image[..]);

    assert!(http.gets_matching("sendPhoto?").is_empty());
    assert!(http.gets_matching("sendMessage").is_empty());
    assert_eq!(lp.ports.dashboard.alerts, vec!["motion".to_owned()]);
}

#[test]
fn rejected_upload_falls_back_to_url_send() {
    let http = ScriptedHttp::new()
        .with_image(ImageReply::Image(jpeg(4_000)))
        .with_post_statuses(&[500, 500, 500]);
    let (mut lp, pir) = alert_loop(http, ScriptedCapture::lan());

    pir.on_edge_interrupt(1);
    assert_eq!(lp.run_once(), MotionStep::Delivered(DeliveryOutcome::PhotoUrlSent));

    let http = &lp.ports.http;
    assert_eq!(http.posts().len(), 3);
    let url_sends = http.gets_matching("sendPhoto?");
    assert_eq!(url_sends.len(), 1);
    assert!(url_sends[0].url.contains("photo=http%3A%2F%2F10.28.158.71%2Fjpg"));
    assert!(url_sends[0].url.contains("caption=Motion+detected"));

    // Upload backoff 600, 1200; then dashboard spacing and the poll sleep.
    assert_eq!(*lp.ports.clock.sleeps.borrow(), vec![600, 1_200, 1_000, 1_000]);
}

#[test]
fn unreachable_camera_falls_back_to_url_send_without_upload() {
    let http = ScriptedHttp::new().with_image(ImageReply::Fail(NetError::ConnectFailed));
    let (mut lp, pir) = alert_loop(http, ScriptedCapture::lan());

    pir.on_edge_interrupt(1);
    assert_eq!(lp.run_once(), MotionStep::Delivered(DeliveryOutcome::PhotoUrlSent));

    let http = &lp.ports.http;
    assert_eq!(http.camera_gets(), 3);
    assert!(http.posts().is_empty());
    assert_eq!(http.gets_matching("sendPhoto?").len(), 1);
}

#[test]
fn rejected_url_send_degrades_to_text() {
    let http = ScriptedHttp::new()
        .with_image(ImageReply::Fail(NetError::ConnectFailed))
        .with_method_statuses("sendPhoto", &[400])
        .with_method_statuses("sendMessage", &[200]);
    let (mut lp, pir) = alert_loop(http, ScriptedCapture::lan());

    pir.on_edge_interrupt(1);
    assert_eq!(lp.run_once(), MotionStep::Delivered(DeliveryOutcome::TextOnly));

    let http = &lp.ports.http;
    assert_eq!(http.camera_gets(), 3);
    assert!(http.posts().is_empty());
    assert_eq!(http.gets_matching("sendPhoto?").len(), 1);
    let texts = http.gets_matching("sendMessage?");
    assert_eq!(texts.len(), 1);
    assert!(texts[0].url.contains("text=Motion+detected"));
    assert_eq!(lp.ports.dashboard.alerts, vec!["motion".to_owned()]);
}

#[test]
fn second_fetch_attempt_recovers() {
    let http = ScriptedHttp::new()
        .then_image(ImageReply::Status(503))
        .with_image(ImageReply::Unsized(jpeg(9_000)));
    let (mut lp, pir) = alert_loop(http, ScriptedCapture::lan());

    pir.on_edge_interrupt(1);
    assert_eq!(
        lp.run_once(),
        MotionStep::Delivered(DeliveryOutcome::PhotoUploaded { attempts: 1 })
    );
    assert_eq!(lp.ports.http.camera_gets(), 2);
    let posts = lp.ports.http.posts();
    let ct = posts[0].content_type.as_deref().unwrap();
    assert_eq!(multipart_field(&posts[0].body, ct, "photo").unwrap().len(), 9_000);
}

#[test]
fn public_camera_document_is_sent_by_url() {
    let http = ScriptedHttp::new();
    let camera = ScriptedCapture::returning(Some(r#"{"url":"https://picsum.photos/640/480?random=3"}"#));
    let (mut lp, pir) = alert_loop(http, camera);

    pir.on_edge_interrupt(1);
    assert_eq!(lp.run_once(), MotionStep::Delivered(DeliveryOutcome::PhotoUrlSent));
    assert_eq!(lp.ports.http.requests.len(), 1);
}

#[test]
fn malformed_capture_document_sends_text() {
    let camera = ScriptedCapture::returning(Some(r#"{"url": "#));
    let (mut lp, pir) = alert_loop(ScriptedHttp::new(), camera);

    pir.on_edge_interrupt(1);
    assert_eq!(lp.run_once(), MotionStep::Delivered(DeliveryOutcome::TextOnly));
    let texts = lp.ports.http.gets_matching("sendMessage?");
    assert_eq!(texts.len(), 1);
    assert!(texts[0].url.contains("text=Motion+detected"));
}

#[test]
fn no_capture_and_text_failure_reports_failed() {
    let http = ScriptedHttp::new().with_telegram_statuses(&[500]);
    let (mut lp, pir) = alert_loop(http, ScriptedCapture::returning(None));

    pir.on_edge_interrupt(1);
    assert_eq!(lp.run_once(), MotionStep::Delivered(DeliveryOutcome::Failed));
    // The dashboard still hears about it.
    assert_eq!(lp.ports.dashboard.alerts, vec!["motion".to_owned()]);
}

#[test]
fn trigger_inside_cooldown_is_suppressed_without_side_effects() {
    let http = ScriptedHttp::new().with_image(ImageReply::Image(jpeg(2_000)));
    let (mut lp, pir) = alert_loop(http, ScriptedCapture::lan());

    pir.on_edge_interrupt(1);
    assert!(matches!(lp.run_once(), MotionStep::Delivered(_)));
    let accepted_at = match lp.ports.sink.events.iter().find(|e| matches!(e, AppEvent::MotionAccepted { .. })) {
        Some(AppEvent::MotionAccepted { at_ms }) => *at_ms,
        _ => panic!("no MotionAccepted event"),
    };
    let requests_before = lp.ports.http.requests.len();

    // Next edge outside the debounce window, well inside the cooldown.
    assert!(pir.on_edge_interrupt(10_000));
    let step = lp.run_once();
    let MotionStep::Suppressed { remaining_ms } = step else {
        panic!("expected suppression, got {step:?}");
    };
    let elapsed = lp.ports.clock.now_ms() - accepted_at - 1_000;
    assert_eq!(remaining_ms, 60_000 - elapsed);

    assert_eq!(lp.ports.http.requests.len(), requests_before);
    assert_eq!(lp.ports.camera.captures, 1);
    assert_eq!(lp.ports.dashboard.alerts.len(), 1);
    assert_eq!(lp.orchestrator().cooldown().last_alert_ms(), Some(accepted_at));
}

#[test]
fn trigger_after_cooldown_runs_again() {
    let (mut lp, pir) = alert_loop(ScriptedHttp::new(), ScriptedCapture::returning(None));

    pir.on_edge_interrupt(1);
    lp.run_once();
    lp.ports.clock.advance(60_000);
    pir.on_edge_interrupt(10_000);
    assert_eq!(lp.run_once(), MotionStep::Delivered(DeliveryOutcome::TextOnly));
    assert_eq!(lp.ports.dashboard.alerts.len(), 2);
}

#[test]
fn delivery_event_reports_elapsed_time() {
    let (mut lp, pir) = alert_loop(ScriptedHttp::new(), ScriptedCapture::returning(None));
    pir.on_edge_interrupt(1);
    lp.run_once();
    let delivered = lp
        .ports
        .sink
        .events
        .iter()
        .find_map(|e| match e {
            AppEvent::MotionDelivered {
                outcome,
                dashboard_ok,
                elapsed_ms,
            } => Some((*outcome, *dashboard_ok, *elapsed_ms)),
            _ => None,
        })
        .unwrap();
    assert_eq!(delivered, (DeliveryOutcome::TextOnly, true, 1_000));
}
