//! Real-time OS integration, gated behind the `rt` feature. Without it the
//! dispatcher runs the identical algorithm at normal OS scheduling, which is
//! what every unit test below (and any dev-machine run) exercises.

#[cfg(feature = "rt")]
mod imp {
    use nix::sched::{sched_setaffinity, CpuSet};
    use nix::sys::mman::{mlockall, MlockAllFlags};
    use nix::unistd::Pid;

    /// Lock all current and future pages into RAM so the dispatcher never
    /// takes a page fault on its hot path.
    pub fn mlockall_current_and_future() -> Result<(), nix::Error> {
        mlockall(MlockAllFlags::MCL_CURRENT | MlockAllFlags::MCL_FUTURE)
    }

    /// Pin the calling thread to a single CPU core.
    pub fn set_affinity(cpu: usize) -> Result<(), nix::Error> {
        let mut set = CpuSet::new();
        set.set(cpu)?;
        sched_setaffinity(Pid::from_raw(0), &set)
    }

    /// Switch the calling thread to `SCHED_FIFO` at the given priority.
    pub fn set_fifo_scheduler(priority: i32) -> Result<(), nix::Error> {
        let param = libc::sched_param {
            sched_priority: priority,
        };
        let rc = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
        if rc != 0 {
            return Err(nix::Error::last());
        }
        Ok(())
    }

    /// Sleep until an absolute `CLOCK_MONOTONIC` deadline, drift-free.
    pub fn sleep_until_monotonic(deadline: libc::timespec) -> Result<(), nix::Error> {
        loop {
            let rc = unsafe {
                libc::clock_nanosleep(
                    libc::CLOCK_MONOTONIC,
                    libc::TIMER_ABSTIME,
                    &deadline,
                    std::ptr::null_mut(),
                )
            };
            if rc == 0 {
                return Ok(());
            }
            if rc == libc::EINTR {
                continue;
            }
            return Err(nix::Error::from_raw(rc));
        }
    }
}

#[cfg(feature = "rt")]
pub use imp::*;

/// Apply RT scheduling policy to the calling thread if the `rt` feature is
/// compiled in and `enable` is true; otherwise a no-op. Centralising this
/// here means `Scheduler::start` doesn't need its own `cfg` branch.
pub fn apply_rt_policy(enable: bool, cpu: Option<usize>, priority: i32) {
    if !enable {
        return;
    }
    #[cfg(feature = "rt")]
    {
        if let Err(err) = mlockall_current_and_future() {
            tracing::warn!(%err, "mlockall failed, continuing without memory locking");
        }
        if let Some(cpu) = cpu {
            if let Err(err) = set_affinity(cpu) {
                tracing::warn!(%err, cpu, "sched_setaffinity failed");
            }
        }
        if let Err(err) = set_fifo_scheduler(priority) {
            tracing::warn!(%err, priority, "sched_setscheduler(SCHED_FIFO) failed");
        }
    }
    #[cfg(not(feature = "rt"))]
    {
        let _ = cpu;
        let _ = priority;
        tracing::debug!("rt feature not compiled in; running at normal OS scheduling");
    }
}
