//! Task scheduler: the two application loops and their start-up.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        APP core (1)                          │
//! │                                                              │
//! │  ┌─────────────────────────┐    ┌──────────────────────────┐ │
//! │  │ "sampling"  every 30 s  │    │ "alerts"  every 1 s      │ │
//! │  │  (absolute deadline)    │    │  (plain sleep)           │ │
//! │  │                         │    │                          │ │
//! │  │  DHT22 ─▶ dashboard     │    │  PIR flag ─▶ cooldown    │ │
//! │  │        ─▶ WeatherGate   │    │          ─▶ PhotoRelay   │ │
//! │  └─────────────────────────┘    └───────────▲──────────────┘ │
//! │                                             │                │
//! └─────────────────────────────────────────────┼────────────────┘
//!                                               │ AtomicBool
//!                               PIR ISR ────────┘ (MotionDebouncer)
//! ```
//!
//! The loops share nothing but the dashboard handle.  Each owns its own
//! HTTP client and its own alert state, and network calls block only the
//! loop that issued them.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::orchestrator::{AlertOrchestrator, MotionStep};
use crate::app::ports::{CapturePort, DashboardPort, EventSink, HttpPort, Metric, SamplePort, SensorSample, TimePort};
use crate::config::SystemConfig;
use crate::drivers::task_pin::{Core, spawn_on_core};
use crate::error::{Error, Result};
use crate::motion::{MotionDebouncer, PIR_DEBOUNCER};
use crate::relay::PhotoRelay;
use crate::weather::WeatherGate;

/// FreeRTOS priority for both application loops.
pub const LOOP_PRIORITY: u8 = 1;

// ═══════════════════════════════════════════════════════════════
//  Deadline timer
// ═══════════════════════════════════════════════════════════════

/// Fixed-period wait against absolute deadlines.
///
/// The next wake time advances by exactly one period per call, so time
/// spent working inside an iteration does not accumulate as drift.  An
/// overrun iteration is followed by an immediate return rather than a
/// catch-up burst of sleeps.
#[derive(Debug, Clone, Copy)]
pub struct DeadlineTimer {
    period_ms: u64,
    next_wake_ms: u64,
}

impl DeadlineTimer {
    pub fn new(period_ms: u64, now_ms: u64) -> Self {
        Self {
            period_ms,
            next_wake_ms: now_ms + period_ms,
        }
    }

    pub fn next_wake_ms(&self) -> u64 {
        self.next_wake_ms
    }

    /// Block until the current deadline, then arm the next one.
    /// Returns how long it slept.
    pub fn wait(&mut self, clock: &impl TimePort) -> u64 {
        let now = clock.now_ms();
        let slept = self.next_wake_ms.saturating_sub(now);
        if slept > 0 {
            clock.sleep_ms(slept);
        }
        self.next_wake_ms += self.period_ms;
        slept
    }
}

// ═══════════════════════════════════════════════════════════════
//  Sampling loop
// ═══════════════════════════════════════════════════════════════

/// Collaborators owned by the sampling loop.
pub struct SamplingPorts<P, H, D, T, S> {
    pub sensors: P,
    pub http: H,
    pub dashboard: D,
    pub clock: T,
    pub sink: S,
}

/// Read → publish environment → weather thresholds, every sample period.
pub struct SamplingLoop<P, H, D, T, S> {
    pub ports: SamplingPorts<P, H, D, T, S>,
    gate: WeatherGate,
    relay: PhotoRelay,
    period_ms: u64,
    spacing_ms: u64,
}

impl<P, H, D, T, S> SamplingLoop<P, H, D, T, S>
where
    P: SamplePort,
    H: HttpPort,
    D: DashboardPort,
    T: TimePort,
    S: EventSink,
{
    pub fn new(config: &SystemConfig, ports: SamplingPorts<P, H, D, T, S>) -> Self {
        Self {
            ports,
            gate: WeatherGate::new(
                config.temperature_limit_c,
                config.humidity_limit_percent,
                config.dashboard_spacing_ms,
            ),
            relay: PhotoRelay::new(config),
            period_ms: config.sample_period_ms,
            spacing_ms: config.dashboard_spacing_ms,
        }
    }

    pub fn gate(&self) -> &WeatherGate {
        &self.gate
    }

    /// One full sampling iteration.
    pub fn run_once(&mut self) -> SensorSample {
        let p = &mut self.ports;
        let sample = p.sensors.read_sample();
        p.sink.emit(&AppEvent::SampleTaken {
            temperature_c: sample.temperature_c,
            humidity_percent: sample.humidity_percent,
        });

        publish_environment(&sample, &mut p.dashboard, &p.clock, self.spacing_ms);
        self.gate
            .check(&sample, &self.relay, &mut p.http, &mut p.dashboard, &p.clock, &mut p.sink);
        sample
    }

    /// Run forever on a fixed absolute-deadline period.
    pub fn run_forever(mut self) {
        self.ports.sink.emit(&AppEvent::Started("sampling"));
        let mut timer = DeadlineTimer::new(self.period_ms, self.ports.clock.now_ms());
        loop {
            self.run_once();
            timer.wait(&self.ports.clock);
        }
    }
}

/// Publish each valid metric to its feed, pausing between the two.
pub fn publish_environment(
    sample: &SensorSample,
    dashboard: &mut impl DashboardPort,
    clock: &impl TimePort,
    spacing_ms: u64,
) {
    let mut published_any = false;
    for metric in [Metric::Temperature, Metric::Humidity] {
        let Some(value) = sample.value(metric) else {
            warn!("Sampling: {:?} invalid, not published", metric);
            continue;
        };
        if published_any {
            clock.sleep_ms(spacing_ms);
        }
        if !dashboard.publish_metric(metric, value) {
            warn!("Sampling: {:?} publish failed", metric);
        }
        published_any = true;
    }
}

// ═══════════════════════════════════════════════════════════════
//  Alert loop
// ═══════════════════════════════════════════════════════════════

/// Collaborators owned by the alert loop.
pub struct AlertPorts<C, H, D, T, S> {
    pub camera: C,
    pub http: H,
    pub dashboard: D,
    pub clock: T,
    pub sink: S,
}

/// Poll the debounce flag at a fixed interval and run motion sequences.
pub struct AlertLoop<C, H, D, T, S> {
    pub ports: AlertPorts<C, H, D, T, S>,
    orchestrator: AlertOrchestrator,
    debouncer: &'static MotionDebouncer,
    poll_interval_ms: u64,
}

impl<C, H, D, T, S> AlertLoop<C, H, D, T, S>
where
    C: CapturePort,
    H: HttpPort,
    D: DashboardPort,
    T: TimePort,
    S: EventSink,
{
    pub fn new(
        config: &SystemConfig,
        debouncer: &'static MotionDebouncer,
        ports: AlertPorts<C, H, D, T, S>,
    ) -> Self {
        Self {
            ports,
            orchestrator: AlertOrchestrator::new(config),
            debouncer,
            poll_interval_ms: config.alert_poll_interval_ms,
        }
    }

    pub fn orchestrator(&self) -> &AlertOrchestrator {
        &self.orchestrator
    }

    /// One poll followed by the fixed (not deadline-corrected) sleep.
    pub fn run_once(&mut self) -> MotionStep {
        let p = &mut self.ports;
        let step = self.orchestrator.poll(
            self.debouncer,
            &mut p.http,
            &mut p.dashboard,
            &mut p.camera,
            &p.clock,
            &mut p.sink,
        );
        p.clock.sleep_ms(self.poll_interval_ms);
        step
    }

    pub fn run_forever(mut self) {
        self.ports.sink.emit(&AppEvent::Started("alerts"));
        loop {
            self.run_once();
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Start-up
// ═══════════════════════════════════════════════════════════════

/// Join handles of the two running loops.
pub struct SchedulerHandles {
    pub sampling: std::thread::JoinHandle<()>,
    pub alerts: std::thread::JoinHandle<()>,
}

pub struct TaskScheduler;

impl TaskScheduler {
    /// Arm the PIR interrupt and start both loops pinned to the APP core.
    pub fn start<P, SH, SD, ST, SS, C, AH, AD, AT, AS>(
        config: &SystemConfig,
        sampling: SamplingPorts<P, SH, SD, ST, SS>,
        alerts: AlertPorts<C, AH, AD, AT, AS>,
    ) -> Result<SchedulerHandles>
    where
        P: SamplePort + Send + 'static,
        SH: HttpPort + Send + 'static,
        SD: DashboardPort + Send + 'static,
        ST: TimePort + Send + 'static,
        SS: EventSink + Send + 'static,
        C: CapturePort + Send + 'static,
        AH: HttpPort + Send + 'static,
        AD: DashboardPort + Send + 'static,
        AT: TimePort + Send + 'static,
        AS: EventSink + Send + 'static,
    {
        PIR_DEBOUNCER.set_window_ms(config.motion_debounce_ms);
        crate::drivers::hw_init::init_motion_interrupt()?;

        let sampling_loop = SamplingLoop::new(config, sampling);
        let alert_loop = AlertLoop::new(config, &PIR_DEBOUNCER, alerts);

        let sampling = spawn_on_core(
            Core::App,
            LOOP_PRIORITY,
            config.sample_task_stack_kb,
            "sampling\0",
            move || sampling_loop.run_forever(),
        )
        .map_err(|_| Error::Init("sampling task spawn failed"))?;

        let alerts = spawn_on_core(
            Core::App,
            LOOP_PRIORITY,
            config.alert_task_stack_kb,
            "alerts\0",
            move || alert_loop.run_forever(),
        )
        .map_err(|_| Error::Init("alert task spawn failed"))?;

        info!(
            "Scheduler: loops running (sample every {} ms, poll every {} ms)",
            config.sample_period_ms, config.alert_poll_interval_ms
        );
        Ok(SchedulerHandles { sampling, alerts })
    }
}
