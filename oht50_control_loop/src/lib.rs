//! The 1 ms hard-real-time control cycle: the highest-priority scheduler
//! task, composing safety-check, control, and telemetry in a fixed order
//! under a hard deadline.

#![deny(clippy::disallowed_types)]

pub mod error;
pub mod hooks;
pub mod stats;

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use oht50_common::time::now_us;
use oht50_scheduler::{Priority, Scheduler};

pub use error::ControlLoopError;
pub use hooks::{Hook, Hooks};
pub use stats::{CycleStats, LatencyRingBuffer};

/// Control-loop state. Independent of [`oht50_safety::state::SafetyState`]
/// per the resolved open question in SPEC_FULL §9 — both carry an `EStop`
/// variant but are never unified.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlLoopState {
    Idle = 0,
    Running = 1,
    Fault = 2,
    EStop = 3,
}

impl ControlLoopState {
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(ControlLoopState::Idle),
            1 => Some(ControlLoopState::Running),
            2 => Some(ControlLoopState::Fault),
            3 => Some(ControlLoopState::EStop),
            _ => None,
        }
    }

    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl Default for ControlLoopState {
    fn default() -> Self {
        ControlLoopState::Idle
    }
}

struct Inner {
    hooks: Hooks,
    stats: CycleStats,
    latency: LatencyRingBuffer,
    last_cycle_start_us: u64,
}

/// Shared control-loop context. Cheap to clone (it's an `Arc` wrapper);
/// clone it into the closure registered with the scheduler.
#[derive(Clone)]
pub struct ControlLoop {
    state: Arc<AtomicU8>,
    latency_measurement_enabled: Arc<AtomicBool>,
    period_us: u64,
    deadline_us: u64,
    inner: Arc<Mutex<Inner>>,
}

impl ControlLoop {
    pub fn new(period_us: u64, deadline_us: u64, latency_samples: usize) -> Self {
        Self {
            state: Arc::new(AtomicU8::new(ControlLoopState::Idle as u8)),
            latency_measurement_enabled: Arc::new(AtomicBool::new(true)),
            period_us,
            deadline_us,
            inner: Arc::new(Mutex::new(Inner {
                hooks: Hooks::default(),
                stats: {
                    let mut s = CycleStats::default();
                    s.reset();
                    s
                },
                latency: LatencyRingBuffer::new(latency_samples),
                last_cycle_start_us: 0,
            })),
        }
    }

    pub fn set_safety_fn(&self, hook: Hook) {
        self.inner.lock().hooks.safety = Some(hook);
    }

    pub fn set_control_fn(&self, hook: Hook) {
        self.inner.lock().hooks.control = Some(hook);
    }

    pub fn set_telemetry_fn(&self, hook: Hook) {
        self.inner.lock().hooks.telemetry = Some(hook);
    }

    pub fn state(&self) -> ControlLoopState {
        ControlLoopState::from_u8(self.state.load(Ordering::Acquire)).unwrap_or_default()
    }

    fn set_state(&self, state: ControlLoopState) {
        self.state.store(state.as_u8(), Ordering::Release);
    }

    pub fn enable_latency_measurement(&self, enabled: bool) {
        self.latency_measurement_enabled
            .store(enabled, Ordering::Relaxed);
    }

    pub fn reset_latency_stats(&self) {
        let mut inner = self.inner.lock();
        inner.latency.clear();
        inner.stats.reset();
    }

    pub fn get_stats(&self) -> CycleStats {
        self.inner.lock().stats
    }

    pub fn get_latency_stats(&self) -> (u32, u32, u32, u32) {
        let inner = self.inner.lock();
        (
            inner.latency.min(),
            inner.latency.max(),
            inner.latency.avg(),
            inner.latency.jitter(),
        )
    }

    /// Register the control loop as a scheduler task at highest user
    /// priority with a 1 ms period and deadline. Sets state to `Running`.
    pub fn start(&self, scheduler: &Arc<Scheduler>) -> Result<(), ControlLoopError> {
        self.set_state(ControlLoopState::Running);
        let this = self.clone();
        scheduler.add_task(
            "control-loop",
            Box::new(move || this.cycle()),
            Priority::Critical,
            self.period_us,
            self.deadline_us,
        )?;
        Ok(())
    }

    /// `state ← Idle`; does not remove the scheduler task — the next tick
    /// observes `Idle` and returns early (see §4.2).
    pub fn stop(&self) {
        self.set_state(ControlLoopState::Idle);
    }

    /// One invocation of the cycle algorithm (§4.2). Called by the
    /// scheduler at each period boundary.
    fn cycle(&self) {
        if self.state() != ControlLoopState::Running {
            return;
        }

        let cycle_start_us = now_us();
        let mut inner = self.inner.lock();

        inner.hooks.run_all();

        let cycle_end_us = now_us();
        let execution_time_us = (cycle_end_us - cycle_start_us) as u32;

        if self.latency_measurement_enabled.load(Ordering::Relaxed) {
            inner.latency.push(execution_time_us);
        }

        inner.stats.total_cycles += 1;
        inner.stats.last_cycle_time_us = execution_time_us;
        inner.stats.total_execution_time_us += u64::from(execution_time_us);
        inner.stats.min_latency_us = inner.latency.min();
        inner.stats.max_latency_us = inner.latency.max();
        inner.stats.avg_latency_us = inner.latency.avg();
        inner.stats.max_jitter_us = inner.latency.jitter();

        if u64::from(execution_time_us) > self.period_us {
            inner.stats.missed_deadlines += 1;
            tracing::warn!(
                execution_time_us,
                period_us = self.period_us,
                "control loop deadline missed"
            );
        }

        inner.last_cycle_start_us = cycle_start_us;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    #[test]
    fn cycle_is_noop_while_idle() {
        let control_loop = ControlLoop::new(1_000, 1_000, 16);
        let ran = Arc::new(AtomicBool::new(false));
        let r = Arc::clone(&ran);
        control_loop.set_control_fn(Box::new(move || {
            r.store(true, Ordering::SeqCst);
        }));
        control_loop.cycle();
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[test]
    fn cycle_runs_hooks_in_order_when_running() {
        let control_loop = ControlLoop::new(1_000, 1_000, 16);
        control_loop.set_state(ControlLoopState::Running);

        let order = Arc::new(AtomicU32::new(0));
        let o = Arc::clone(&order);
        control_loop.set_safety_fn(Box::new(move || {
            o.store(1, Ordering::SeqCst);
        }));
        let o = Arc::clone(&order);
        control_loop.set_control_fn(Box::new(move || {
            assert_eq!(o.load(Ordering::SeqCst), 1);
            o.store(2, Ordering::SeqCst);
        }));
        let o = Arc::clone(&order);
        control_loop.set_telemetry_fn(Box::new(move || {
            assert_eq!(o.load(Ordering::SeqCst), 2);
            o.store(3, Ordering::SeqCst);
        }));

        control_loop.cycle();
        assert_eq!(order.load(Ordering::SeqCst), 3);
        assert_eq!(control_loop.get_stats().total_cycles, 1);
    }

    #[test]
    fn stats_accumulate_across_cycles() {
        let control_loop = ControlLoop::new(1_000, 1_000, 1_000);
        control_loop.set_state(ControlLoopState::Running);
        for _ in 0..10 {
            control_loop.cycle();
        }
        assert_eq!(control_loop.get_stats().total_cycles, 10);
    }

    #[test]
    fn reset_latency_stats_clears_ring_buffer() {
        let control_loop = ControlLoop::new(1_000, 1_000, 16);
        control_loop.set_state(ControlLoopState::Running);
        control_loop.cycle();
        control_loop.reset_latency_stats();
        let (min, _, _, _) = control_loop.get_latency_stats();
        assert_eq!(min, u32::MAX);
    }

    #[test]
    fn stop_sets_idle_without_removing_task() {
        let control_loop = ControlLoop::new(1_000, 1_000, 16);
        control_loop.set_state(ControlLoopState::Running);
        control_loop.stop();
        assert_eq!(control_loop.state(), ControlLoopState::Idle);
    }
}
