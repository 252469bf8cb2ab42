//! Per-cycle latency ring buffer and aggregate cycle statistics.
//!
//! Per the resolved latency semantics (SPEC_FULL §9): the ring buffer holds
//! the genuine measured `execution_time` of each completed cycle, never a
//! stale or zeroed placeholder.

/// Fixed-capacity ring buffer of per-cycle execution times, in
/// microseconds. Allocated once at construction; steady-state operation
/// never grows or shrinks the backing storage.
pub struct LatencyRingBuffer {
    samples: Vec<u32>,
    capacity: usize,
    write_pos: usize,
    len: usize,
}

impl LatencyRingBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: vec![0u32; capacity.max(1)],
            capacity: capacity.max(1),
            write_pos: 0,
            len: 0,
        }
    }

    /// Append a sample, overwriting the oldest entry on overflow.
    pub fn push(&mut self, execution_time_us: u32) {
        self.samples[self.write_pos] = execution_time_us;
        self.write_pos = (self.write_pos + 1) % self.capacity;
        if self.len < self.capacity {
            self.len += 1;
        }
    }

    pub fn clear(&mut self) {
        self.write_pos = 0;
        self.len = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn populated(&self) -> impl Iterator<Item = u32> + '_ {
        self.samples.iter().take(self.len).copied()
    }

    pub fn min(&self) -> u32 {
        self.populated().min().unwrap_or(u32::MAX)
    }

    pub fn max(&self) -> u32 {
        self.populated().max().unwrap_or(0)
    }

    /// Arithmetic mean of the currently populated samples. Integer division,
    /// matching §8's testable property 10 (±1 ulp of the true mean).
    pub fn avg(&self) -> u32 {
        if self.len == 0 {
            return 0;
        }
        let sum: u64 = self.populated().map(u64::from).sum();
        (sum / self.len as u64) as u32
    }

    /// Maximum absolute deviation from the mean observed across the
    /// populated samples.
    pub fn jitter(&self) -> u32 {
        let avg = self.avg() as i64;
        self.populated()
            .map(|v| (v as i64 - avg).unsigned_abs() as u32)
            .max()
            .unwrap_or(0)
    }
}

/// Aggregate control-loop statistics, updated atomically with the cycle
/// count at the end of every cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleStats {
    pub total_cycles: u64,
    pub missed_deadlines: u64,
    pub last_cycle_time_us: u32,
    pub total_execution_time_us: u64,
    pub min_latency_us: u32,
    pub max_latency_us: u32,
    pub avg_latency_us: u32,
    pub max_jitter_us: u32,
}

impl CycleStats {
    pub fn reset(&mut self) {
        *self = CycleStats {
            min_latency_us: u32::MAX,
            ..Default::default()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_buffer_reports_sentinels() {
        let buf = LatencyRingBuffer::new(4);
        assert_eq!(buf.min(), u32::MAX);
        assert_eq!(buf.max(), 0);
        assert_eq!(buf.avg(), 0);
        assert_eq!(buf.jitter(), 0);
    }

    #[test]
    fn avg_is_arithmetic_mean_of_populated_samples() {
        let mut buf = LatencyRingBuffer::new(8);
        for v in [100, 200, 300, 400] {
            buf.push(v);
        }
        assert_eq!(buf.avg(), 250);
        assert_eq!(buf.min(), 100);
        assert_eq!(buf.max(), 400);
    }

    #[test]
    fn overflow_overwrites_oldest_sample() {
        let mut buf = LatencyRingBuffer::new(3);
        for v in [10, 20, 30, 40] {
            buf.push(v);
        }
        // oldest (10) has been overwritten; populated set is {20, 30, 40}
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.min(), 20);
        assert_eq!(buf.max(), 40);
    }

    #[test]
    fn jitter_is_max_absolute_deviation_from_mean() {
        let mut buf = LatencyRingBuffer::new(8);
        for v in [100, 100, 100, 400] {
            buf.push(v);
        }
        // mean = 175, deviations: 75, 75, 75, 225 -> max = 225
        assert_eq!(buf.avg(), 175);
        assert_eq!(buf.jitter(), 225);
    }

    #[test]
    fn reset_sets_min_to_sentinel() {
        let mut stats = CycleStats::default();
        stats.total_cycles = 5;
        stats.reset();
        assert_eq!(stats.min_latency_us, u32::MAX);
        assert_eq!(stats.total_cycles, 0);
    }
}
