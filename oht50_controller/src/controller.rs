//! The system controller: supervises the other four subsystems, aggregates
//! health, sequences lifecycle transitions, and owns cross-subsystem error
//! recovery (SPEC_FULL §4.4).

use std::sync::Arc;

use parking_lot::Mutex;

use oht50_common::time::now_us;

use crate::config::ControllerInitConfig;
use crate::error::ControllerError;
use crate::event::{ControllerErrorKind, ControllerErrorReport, ControllerEvent, EventQueue};
use crate::health::SubsystemHealth;
use crate::metrics::PerformanceMetrics;
use crate::state::{ControllerState, SupervisoryStateMachine, TransitionResult};

const MAX_EVENTS_DRAINED_PER_CYCLE: usize = oht50_common::consts::MAX_EVENTS_DRAINED_PER_CYCLE;
const PERFORMANCE_PERIOD_US: u64 = oht50_common::consts::CONTROLLER_PERFORMANCE_PERIOD_US;

type EventCallback = Box<dyn FnMut(&ControllerEvent) + Send>;
type ErrorCallback = Box<dyn FnMut(&ControllerErrorReport) + Send>;

#[derive(Debug, Clone, Copy)]
pub struct DiagnosticsReport {
    pub state: ControllerState,
    pub system_ready: bool,
    pub health: SubsystemHealth,
    pub metrics: PerformanceMetrics,
    pub error_count: u32,
    pub uptime_us: u64,
    pub event_queue_len: usize,
    pub last_response_time_us: u64,
}

struct Inner {
    machine: SupervisoryStateMachine,
    queue: EventQueue,
    health: SubsystemHealth,
    metrics: PerformanceMetrics,
    error_count: u32,
    max_error_count: u32,
    total_events: u64,
    start_time_us: u64,
    last_performance_sample_us: u64,
    tick_count_at_last_sample: u64,
    tick_count: u64,
    last_response_time_us: u64,
    memory_ceiling_kb: u64,
    event_cb: Option<EventCallback>,
    error_cb: Option<ErrorCallback>,
}

/// Cheap to clone (wraps an `Arc`); clone into the T2 update-loop thread.
#[derive(Clone)]
pub struct SystemController {
    inner: Arc<Mutex<Inner>>,
}

impl SystemController {
    pub fn new(config: &ControllerInitConfig) -> Self {
        let now = now_us();
        Self {
            inner: Arc::new(Mutex::new(Inner {
                machine: SupervisoryStateMachine::default(),
                queue: EventQueue::new(config.section.event_queue_capacity),
                health: SubsystemHealth::default(),
                metrics: PerformanceMetrics::default(),
                error_count: 0,
                max_error_count: config.section.max_error_count,
                total_events: 0,
                start_time_us: now,
                last_performance_sample_us: now,
                tick_count_at_last_sample: 0,
                tick_count: 0,
                last_response_time_us: 0,
                memory_ceiling_kb: config.assumed_memory_ceiling_kb,
                event_cb: None,
                error_cb: None,
            })),
        }
    }

    pub fn set_event_callback(&self, cb: EventCallback) {
        self.inner.lock().event_cb = Some(cb);
    }

    pub fn set_error_callback(&self, cb: ErrorCallback) {
        self.inner.lock().error_cb = Some(cb);
    }

    pub fn state(&self) -> ControllerState {
        self.inner.lock().machine.state()
    }

    pub fn system_ready(&self) -> bool {
        self.inner.lock().health.system_ready()
    }

    pub fn uptime_us(&self) -> u64 {
        now_us().saturating_sub(self.inner.lock().start_time_us)
    }

    /// Enqueue an event for the next `update` drain. Returns
    /// [`ControllerError::QueueFull`] on backpressure; the queue still
    /// gets a best-effort synthetic `Error` event appended, which itself
    /// silently no-ops if the queue is (still) full — this never recurses
    /// back into `process_event`.
    pub fn process_event(&self, event: ControllerEvent) -> Result<(), ControllerError> {
        let mut inner = self.inner.lock();
        if inner.queue.enqueue(event) {
            return Ok(());
        }
        let capacity = inner.queue.capacity();
        inner.error_count += 1;
        inner
            .queue
            .enqueue(ControllerEvent::Error { reason: "event queue full".to_string() });
        Err(ControllerError::QueueFull { capacity })
    }

    /// Report an error directly (not via the event queue): increments the
    /// rolling error count and invokes the error callback. Escalates to
    /// `fault` once `error_count` exceeds `max_error_count`.
    pub fn report_error(&self, kind: ControllerErrorKind, code: u32, message: &str, context: &str) {
        let report = ControllerErrorReport {
            kind,
            code,
            message: message.to_string(),
            context: context.to_string(),
        };

        let mut inner = self.inner.lock();
        inner.error_count += 1;
        inner.total_events += 1;
        if let Some(cb) = inner.error_cb.as_mut() {
            cb(&report);
        }
        let escalate = inner.error_count > inner.max_error_count;
        drop(inner);

        if escalate {
            self.force_transition(ControllerState::Fault);
        }
    }

    fn force_transition(&self, to: ControllerState) -> TransitionResult {
        let mut inner = self.inner.lock();
        let result = inner.machine.transition(to);
        if let TransitionResult::Rejected(reason) = result {
            tracing::debug!(%reason, ?to, "controller transition rejected");
        }
        result
    }

    fn apply_event(&self, event: ControllerEvent) {
        {
            let mut inner = self.inner.lock();
            inner.total_events += 1;
            if let Some(cb) = inner.event_cb.as_mut() {
                cb(&event);
            }
        }

        match event {
            ControllerEvent::InitComplete => {
                self.force_transition(ControllerState::Idle);
            }
            ControllerEvent::Activate => {
                let ready = self.inner.lock().health.system_ready();
                if ready {
                    self.force_transition(ControllerState::Active);
                } else {
                    let health = self.inner.lock().health;
                    self.report_error(
                        ControllerErrorKind::Control,
                        1,
                        "activation prerequisites not met",
                        &format!("{health:?}"),
                    );
                }
            }
            ControllerEvent::FaultDetected { reason } => {
                self.report_error(ControllerErrorKind::Control, 2, &reason, "fault-detected event");
                self.force_transition(ControllerState::Fault);
            }
            ControllerEvent::Emergency { reason } => {
                self.report_error(ControllerErrorKind::SafetyViolation, 3, &reason, "emergency event");
                self.force_transition(ControllerState::Emergency);
            }
            ControllerEvent::FaultCleared => {
                self.inner.lock().error_count = 0;
                self.force_transition(ControllerState::Idle);
            }
            ControllerEvent::Shutdown => {
                self.force_transition(ControllerState::Shutdown);
            }
            ControllerEvent::Error { .. } => {}
        }
    }

    /// One `update` cycle (SPEC_FULL §4.4, ~10 ms cadence). The three
    /// health probes are supplied by the caller, matching the safety
    /// monitor's `update(read_interlock, read_sensor)` convention — this
    /// crate has no direct dependency on the field-bus or control-loop
    /// wiring, only on the booleans they expose.
    pub fn update(
        &self,
        safety_ok: bool,
        communication_ok: bool,
        control_ok: bool,
    ) {
        let cycle_start_us = now_us();
        let mut inner = self.inner.lock();

        inner.health = SubsystemHealth {
            safety_ok,
            communication_ok,
            control_ok,
        };
        inner.tick_count += 1;

        if cycle_start_us.saturating_sub(inner.last_performance_sample_us) >= PERFORMANCE_PERIOD_US {
            let ticks_since = inner.tick_count - inner.tick_count_at_last_sample;
            let elapsed = cycle_start_us.saturating_sub(inner.last_performance_sample_us);
            let error_count = inner.error_count;
            let total_events = inner.total_events;
            let ceiling = inner.memory_ceiling_kb;
            inner
                .metrics
                .recompute(ticks_since, elapsed, error_count, total_events, ceiling);
            inner.last_performance_sample_us = cycle_start_us;
            inner.tick_count_at_last_sample = inner.tick_count;
        }

        let drained = inner.queue.drain(MAX_EVENTS_DRAINED_PER_CYCLE);
        drop(inner);

        for event in drained {
            self.apply_event(event);
        }

        let mut inner = self.inner.lock();
        inner.last_response_time_us = now_us().saturating_sub(cycle_start_us);
    }

    /// On-demand diagnostics snapshot; never mutates state (SPEC_FULL §4.4,
    /// §10.2). Used both by the HTTP diagnostics endpoint and as the
    /// startup self-test gate before the first `idle -> active` transition.
    pub fn run_diagnostics(&self) -> DiagnosticsReport {
        let inner = self.inner.lock();
        DiagnosticsReport {
            state: inner.machine.state(),
            system_ready: inner.health.system_ready(),
            health: inner.health,
            metrics: inner.metrics,
            error_count: inner.error_count,
            uptime_us: now_us().saturating_sub(inner.start_time_us),
            event_queue_len: inner.queue.len(),
            last_response_time_us: inner.last_response_time_us,
        }
    }

    pub fn reset_statistics(&self) {
        let mut inner = self.inner.lock();
        inner.error_count = 0;
        inner.total_events = 0;
        inner.metrics = PerformanceMetrics::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn controller() -> SystemController {
        SystemController::new(&ControllerInitConfig::default())
    }

    #[test]
    fn init_to_idle_to_active_happy_path() {
        let c = controller();
        c.process_event(ControllerEvent::InitComplete).unwrap();
        c.update(true, true, true);
        assert_eq!(c.state(), ControllerState::Idle);

        c.process_event(ControllerEvent::Activate).unwrap();
        c.update(true, true, true);
        assert_eq!(c.state(), ControllerState::Active);
    }

    #[test]
    fn activate_rejected_without_prerequisites() {
        let c = controller();
        c.process_event(ControllerEvent::InitComplete).unwrap();
        c.update(true, true, true);

        c.process_event(ControllerEvent::Activate).unwrap();
        c.update(false, true, true);
        assert_eq!(c.state(), ControllerState::Idle);
    }

    #[test]
    fn queue_full_reports_error_without_recursing() {
        let mut config = ControllerInitConfig::default();
        config.section.event_queue_capacity = 1;
        let c = SystemController::new(&config);
        c.process_event(ControllerEvent::InitComplete).unwrap();
        let result = c.process_event(ControllerEvent::Activate);
        assert!(matches!(result, Err(ControllerError::QueueFull { .. })));
    }

    #[test]
    fn repeated_errors_escalate_to_fault() {
        let mut config = ControllerInitConfig::default();
        config.section.max_error_count = 2;
        let c = SystemController::new(&config);
        for _ in 0..3 {
            c.report_error(ControllerErrorKind::Hardware, 9, "boom", "test");
        }
        assert_eq!(c.state(), ControllerState::Fault);
    }

    #[test]
    fn fault_cleared_resets_error_count_and_returns_to_idle() {
        let mut config = ControllerInitConfig::default();
        config.section.max_error_count = 1;
        let c = SystemController::new(&config);
        c.report_error(ControllerErrorKind::Hardware, 9, "boom", "test");
        c.report_error(ControllerErrorKind::Hardware, 9, "boom again", "test");
        assert_eq!(c.state(), ControllerState::Fault);

        c.process_event(ControllerEvent::FaultCleared).unwrap();
        c.update(true, true, true);
        assert_eq!(c.state(), ControllerState::Idle);
        assert_eq!(c.run_diagnostics().error_count, 0);
    }

    #[test]
    fn event_callback_observes_every_applied_event() {
        let c = controller();
        let count = Arc::new(AtomicU32::new(0));
        let counted = Arc::clone(&count);
        c.set_event_callback(Box::new(move |_event| {
            counted.fetch_add(1, Ordering::SeqCst);
        }));
        c.process_event(ControllerEvent::InitComplete).unwrap();
        c.update(true, true, true);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn run_diagnostics_does_not_mutate_state() {
        let c = controller();
        let before = c.run_diagnostics();
        let after = c.run_diagnostics();
        assert_eq!(before.state, after.state);
        assert_eq!(before.error_count, after.error_count);
    }

    #[test]
    fn reset_statistics_zeroes_counters_not_state() {
        let mut config = ControllerInitConfig::default();
        config.section.max_error_count = 100;
        let c = SystemController::new(&config);
        c.report_error(ControllerErrorKind::Timeout, 1, "x", "y");
        c.reset_statistics();
        assert_eq!(c.run_diagnostics().error_count, 0);
    }

    #[test]
    fn shutdown_is_terminal() {
        let c = controller();
        c.process_event(ControllerEvent::Shutdown).unwrap();
        c.update(true, true, true);
        assert_eq!(c.state(), ControllerState::Shutdown);

        c.process_event(ControllerEvent::InitComplete).unwrap();
        c.update(true, true, true);
        assert_eq!(c.state(), ControllerState::Shutdown);
    }
}
