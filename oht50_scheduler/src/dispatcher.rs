//! The dispatcher: a single-threaded loop that wakes every tick period,
//! selects the highest-priority ready task (earliest-deadline-first within
//! a band), and invokes it.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::Mutex;

use oht50_common::time::{now_us, sleep_until_us};

use crate::error::SchedulerError;
use crate::rt;
use crate::task::{Priority, TaskDescriptor, TaskEntry, TaskId, TaskSnapshot, TaskState};

/// Aggregate dispatcher-level counters, independent of any single task.
#[derive(Debug, Default)]
pub struct SchedulerStats {
    pub ticks: AtomicU64,
    pub starts: AtomicU64,
}

impl SchedulerStats {
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    pub fn starts(&self) -> u64 {
        self.starts.load(Ordering::Relaxed)
    }
}

struct Inner {
    tasks: Vec<TaskDescriptor>,
    capacity: usize,
    next_id: TaskId,
}

/// A bounded task table plus the dispatcher thread that drains it.
///
/// `Scheduler::start` spawns the dispatcher on its own OS thread; `stop`
/// cooperatively signals it via an `AtomicBool` and joins.
pub struct Scheduler {
    inner: Mutex<Inner>,
    tick_period_us: u64,
    running: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
    stats: Arc<SchedulerStats>,
    rt_enabled: bool,
}

impl Scheduler {
    /// Allocate a task table with the given capacity and tick period.
    pub fn new(capacity: usize, tick_period_us: u64, rt_enabled: bool) -> Self {
        Self {
            inner: Mutex::new(Inner {
                tasks: Vec::with_capacity(capacity),
                capacity,
                next_id: 1,
            }),
            tick_period_us,
            running: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
            stats: Arc::new(SchedulerStats::default()),
            rt_enabled,
        }
    }

    pub fn stats(&self) -> Arc<SchedulerStats> {
        Arc::clone(&self.stats)
    }

    /// Register a new task. Fails if the table is full, the name is too
    /// long, or `deadline_us < period_us` for a periodic task.
    #[allow(clippy::too_many_arguments)]
    pub fn add_task(
        &self,
        name: impl Into<String>,
        entry: TaskEntry,
        priority: Priority,
        period_us: u64,
        deadline_us: u64,
    ) -> Result<TaskId, SchedulerError> {
        let name = name.into();
        if name.len() > oht50_common::consts::MAX_TASK_NAME_LEN {
            return Err(SchedulerError::NameTooLong {
                name,
                max_len: oht50_common::consts::MAX_TASK_NAME_LEN,
            });
        }
        if period_us > 0 && deadline_us < period_us {
            return Err(SchedulerError::DeadlineShorterThanPeriod {
                period_us,
                deadline_us,
            });
        }

        let mut inner = self.inner.lock();
        if inner.tasks.len() >= inner.capacity {
            return Err(SchedulerError::TableFull {
                capacity: inner.capacity,
            });
        }

        let now = now_us();
        let id = inner.next_id;
        inner.next_id += 1;
        let next_due_us = if period_us > 0 {
            now + period_us
        } else {
            now + deadline_us
        };

        inner.tasks.push(TaskDescriptor {
            id,
            name,
            priority,
            period_us,
            deadline_us,
            entry: Some(entry),
            state: TaskState::Ready,
            last_run_us: now,
            next_due_us,
            execution_count: 0,
            missed_deadlines: 0,
        });

        Ok(id)
    }

    /// Suspend and remove a task. Waits (by polling, bounded by the tick
    /// period) for any in-flight execution to complete, then compacts the
    /// table. Remaining task ids above the removed slot are unaffected;
    /// only the identity of future lookups by stale id changes.
    pub fn remove_task(&self, id: TaskId) -> Result<(), SchedulerError> {
        loop {
            let mut inner = self.inner.lock();
            let Some(pos) = inner.tasks.iter().position(|t| t.id == id) else {
                return Err(SchedulerError::UnknownTask { id });
            };
            if inner.tasks[pos].state == TaskState::Running {
                drop(inner);
                std::thread::yield_now();
                continue;
            }
            inner.tasks[pos].state = TaskState::Suspended;
            inner.tasks.remove(pos);
            return Ok(());
        }
    }

    pub fn get_stats(&self, id: TaskId) -> Result<(u64, u64), SchedulerError> {
        let inner = self.inner.lock();
        inner
            .tasks
            .iter()
            .find(|t| t.id == id)
            .map(|t| (t.execution_count, t.missed_deadlines))
            .ok_or(SchedulerError::UnknownTask { id })
    }

    /// Snapshot every registered task's identity and stats, for external
    /// read surfaces (SPEC_FULL §6).
    pub fn task_snapshots(&self) -> Vec<TaskSnapshot> {
        self.inner
            .lock()
            .tasks
            .iter()
            .map(|t| TaskSnapshot {
                id: t.id,
                name: t.name.clone(),
                priority: t.priority,
                execution_count: t.execution_count,
                missed_deadlines: t.missed_deadlines,
            })
            .collect()
    }

    /// Spawn the dispatcher thread. Idempotent: calling `start` twice
    /// returns `AlreadyRunning` rather than spawning a second dispatcher.
    pub fn start(self: &Arc<Self>) -> Result<(), SchedulerError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SchedulerError::AlreadyRunning);
        }

        let scheduler = Arc::clone(self);
        let running = Arc::clone(&self.running);
        let stats = Arc::clone(&self.stats);
        let tick_period_us = self.tick_period_us;
        let rt_enabled = self.rt_enabled;

        let join = std::thread::Builder::new()
            .name("oht50-dispatcher".into())
            .spawn(move || {
                rt::apply_rt_policy(rt_enabled, Some(0), 80);
                stats.starts.fetch_add(1, Ordering::Relaxed);
                dispatch_loop(&scheduler, &running, &stats, tick_period_us);
            })
            .expect("failed to spawn dispatcher thread");

        *self.handle.lock() = Some(join);
        Ok(())
    }

    /// Request the dispatcher to stop and join its thread. Idempotent.
    pub fn stop(&self) -> Result<(), SchedulerError> {
        if !self.running.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        if let Some(handle) = self.handle.lock().take() {
            let _ = handle.join();
        }
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    pub fn tick_period_us(&self) -> u64 {
        self.tick_period_us
    }
}

/// Select the highest-priority ready task, breaking ties by earliest
/// `next_due_us` (EDF within the band). Returns the index into `tasks`.
fn select_highest_priority_ready(tasks: &[TaskDescriptor], now: u64) -> Option<usize> {
    tasks
        .iter()
        .enumerate()
        .filter(|(_, t)| t.is_ready(now))
        .min_by_key(|(_, t)| (t.priority, t.next_due_us))
        .map(|(idx, _)| idx)
}

fn dispatch_loop(
    scheduler: &Scheduler,
    running: &AtomicBool,
    stats: &SchedulerStats,
    tick_period_us: u64,
) {
    let mut next_tick = now_us() + tick_period_us;

    while running.load(Ordering::Relaxed) {
        let now = now_us();
        stats.ticks.fetch_add(1, Ordering::Relaxed);

        let mut inner = scheduler.inner.lock();
        if let Some(idx) = select_highest_priority_ready(&inner.tasks, now) {
            if inner.tasks[idx].next_due_us <= now {
                let id = inner.tasks[idx].id;
                let previous_deadline = inner.tasks[idx].last_run_us + inner.tasks[idx].deadline_us;
                if inner.tasks[idx].execution_count > 0 && now > previous_deadline {
                    inner.tasks[idx].missed_deadlines += 1;
                    tracing::warn!(
                        task = %inner.tasks[idx].name,
                        now_us = now,
                        deadline_us = previous_deadline,
                        "deadline missed"
                    );
                }

                inner.tasks[idx].state = TaskState::Running;
                inner.tasks[idx].execution_count += 1;
                // Take the entry out of the table so it can run with the table
                // unlocked: invocation must never hold the table lock (see §5's
                // shared-resources rule), and a panicking task must not tear
                // down the dispatcher. `remove_task` on a `Running` task
                // busy-waits until we put the entry back below, so the id
                // remains valid for the re-lookup.
                let mut entry = inner.tasks[idx].entry.take().expect("entry present while ready");
                drop(inner);

                let result = panic::catch_unwind(AssertUnwindSafe(|| (entry)()));
                if let Err(payload) = result {
                    let msg = payload
                        .downcast_ref::<&str>()
                        .copied()
                        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
                        .unwrap_or("<non-string panic payload>");
                    tracing::error!(error = msg, "task entry panicked; isolating and continuing");
                }

                let mut inner = scheduler.inner.lock();
                if let Some(task) = inner.tasks.iter_mut().find(|t| t.id == id) {
                    task.entry = Some(entry);
                    task.last_run_us = now;
                    if task.is_one_shot() {
                        task.state = TaskState::Suspended;
                        task.next_due_us = u64::MAX;
                    } else {
                        task.state = TaskState::Ready;
                        task.next_due_us = now + task.period_us;
                    }
                }
                // else: task was removed while running; its entry is simply
                // dropped here instead of being reinstalled.
            }
        }

        next_tick += tick_period_us;
        sleep_until_us(next_tick);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn new_scheduler() -> Arc<Scheduler> {
        Arc::new(Scheduler::new(16, 1_000, false))
    }

    #[test]
    fn add_task_rejects_short_deadline() {
        let scheduler = new_scheduler();
        let counter = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&counter);
        let result = scheduler.add_task(
            "bad",
            Box::new(move || {
                c.fetch_add(1, Ordering::Relaxed);
            }),
            Priority::High,
            1_000,
            500,
        );
        assert!(result.is_err());
    }

    #[test]
    fn add_task_rejects_long_name() {
        let scheduler = new_scheduler();
        let long_name = "x".repeat(oht50_common::consts::MAX_TASK_NAME_LEN + 1);
        let result = scheduler.add_task(long_name, Box::new(|| {}), Priority::Low, 1_000, 1_000);
        assert!(result.is_err());
    }

    #[test]
    fn table_full_is_reported() {
        let scheduler = Arc::new(Scheduler::new(1, 1_000, false));
        scheduler
            .add_task("t1", Box::new(|| {}), Priority::Low, 1_000, 1_000)
            .unwrap();
        let result = scheduler.add_task("t2", Box::new(|| {}), Priority::Low, 1_000, 1_000);
        assert!(matches!(result, Err(SchedulerError::TableFull { .. })));
    }

    #[test]
    fn remove_unknown_task_reports_error() {
        let scheduler = new_scheduler();
        assert!(matches!(
            scheduler.remove_task(999),
            Err(SchedulerError::UnknownTask { id: 999 })
        ));
    }

    #[test]
    fn s2_priority_ordering_higher_runs_at_least_as_often() {
        let scheduler = new_scheduler();
        let count_low = Arc::new(AtomicU64::new(0));
        let count_medium = Arc::new(AtomicU64::new(0));
        let count_high = Arc::new(AtomicU64::new(0));

        for (priority, counter) in [
            (Priority::Low, Arc::clone(&count_low)),
            (Priority::Medium, Arc::clone(&count_medium)),
            (Priority::High, Arc::clone(&count_high)),
        ] {
            let c = counter;
            scheduler
                .add_task(
                    format!("{priority:?}"),
                    Box::new(move || {
                        c.fetch_add(1, Ordering::Relaxed);
                    }),
                    priority,
                    10_000,
                    10_000,
                )
                .unwrap();
        }

        scheduler.start().unwrap();
        std::thread::sleep(std::time::Duration::from_millis(120));
        scheduler.stop().unwrap();

        let low = count_low.load(Ordering::Relaxed);
        let medium = count_medium.load(Ordering::Relaxed);
        let high = count_high.load(Ordering::Relaxed);
        assert!(high >= medium);
        assert!(medium >= low);
        assert!(low >= 8, "low={low}");
    }

    #[test]
    fn start_twice_reports_already_running() {
        let scheduler = new_scheduler();
        scheduler.start().unwrap();
        assert!(matches!(
            scheduler.start(),
            Err(SchedulerError::AlreadyRunning)
        ));
        scheduler.stop().unwrap();
    }

    #[test]
    fn task_snapshots_report_name_and_counts() {
        let scheduler = new_scheduler();
        scheduler
            .add_task("probe", Box::new(|| {}), Priority::Low, 1_000, 1_000)
            .unwrap();
        let snapshots = scheduler.task_snapshots();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].name, "probe");
        assert_eq!(snapshots[0].execution_count, 0);
    }

    #[test]
    fn stop_is_idempotent() {
        let scheduler = new_scheduler();
        scheduler.start().unwrap();
        scheduler.stop().unwrap();
        scheduler.stop().unwrap();
    }
}
