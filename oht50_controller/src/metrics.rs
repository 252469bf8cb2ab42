//! Performance metrics recomputed on a 1 s cadence (SPEC_FULL §4.4): derived
//! CPU%, memory%, observed update frequency, and error rate.

#[derive(Debug, Clone, Copy, Default)]
pub struct PerformanceMetrics {
    pub cpu_percent: f32,
    pub memory_percent: f32,
    pub update_frequency_hz: f32,
    pub error_rate: f32,
}

/// Crude resource snapshot via `getrusage(RUSAGE_SELF)`: CPU time consumed
/// since process start and peak resident set size. `memory_percent` is
/// expressed against a fixed ceiling rather than queried total system RAM,
/// since the latter needs a `/proc/meminfo` read this module doesn't own.
#[cfg(unix)]
pub fn sample_resource_usage(assumed_memory_ceiling_kb: u64) -> (f32, f32) {
    // Safety: `rusage` is a plain C struct; `getrusage` fills it in place
    // and returns 0 on success for RUSAGE_SELF, which never fails per POSIX.
    let mut usage: libc::rusage = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::getrusage(libc::RUSAGE_SELF, &mut usage) };
    if rc != 0 {
        return (0.0, 0.0);
    }
    let user_us = usage.ru_utime.tv_sec as f64 * 1_000_000.0 + usage.ru_utime.tv_usec as f64;
    let sys_us = usage.ru_stime.tv_sec as f64 * 1_000_000.0 + usage.ru_stime.tv_usec as f64;
    let cpu_percent = ((user_us + sys_us) / 1_000_000.0).min(100.0) as f32;
    let memory_percent = if assumed_memory_ceiling_kb > 0 {
        ((usage.ru_maxrss as f64 / assumed_memory_ceiling_kb as f64) * 100.0).min(100.0) as f32
    } else {
        0.0
    };
    (cpu_percent, memory_percent)
}

#[cfg(not(unix))]
pub fn sample_resource_usage(_assumed_memory_ceiling_kb: u64) -> (f32, f32) {
    (0.0, 0.0)
}

impl PerformanceMetrics {
    pub fn recompute(
        &mut self,
        ticks_since_last_sample: u64,
        elapsed_us: u64,
        error_count: u32,
        total_events: u64,
        memory_ceiling_kb: u64,
    ) {
        let (cpu_percent, memory_percent) = sample_resource_usage(memory_ceiling_kb);
        self.cpu_percent = cpu_percent;
        self.memory_percent = memory_percent;
        self.update_frequency_hz = if elapsed_us > 0 {
            (ticks_since_last_sample as f64 * 1_000_000.0 / elapsed_us as f64) as f32
        } else {
            0.0
        };
        self.error_rate = if total_events > 0 {
            error_count as f32 / total_events as f32
        } else {
            0.0
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_frequency_derived_from_ticks_and_elapsed_time() {
        let mut metrics = PerformanceMetrics::default();
        metrics.recompute(10, 1_000_000, 0, 100, 0);
        assert!((metrics.update_frequency_hz - 10.0).abs() < 0.001);
    }

    #[test]
    fn error_rate_is_zero_with_no_events() {
        let mut metrics = PerformanceMetrics::default();
        metrics.recompute(0, 0, 0, 0, 0);
        assert_eq!(metrics.error_rate, 0.0);
    }

    #[test]
    fn error_rate_divides_errors_by_total_events() {
        let mut metrics = PerformanceMetrics::default();
        metrics.recompute(0, 1_000_000, 5, 100, 0);
        assert!((metrics.error_rate - 0.05).abs() < 0.0001);
    }
}
