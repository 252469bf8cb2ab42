//! Controller event queue and error taxonomy (SPEC_FULL §4.4).

use std::collections::VecDeque;

/// Events the controller folds on every `update` drain.
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    InitComplete,
    Activate,
    FaultDetected { reason: String },
    Emergency { reason: String },
    FaultCleared,
    Shutdown,
    /// Synthetic event emitted when the queue drops an event due to
    /// backpressure; never produced by enqueuing another one recursively.
    Error { reason: String },
}

/// Error taxonomy carried by `report_error`/the error callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerErrorKind {
    InitFailed,
    SafetyViolation,
    Communication,
    Control,
    Memory,
    Timeout,
    Hardware,
}

#[derive(Debug, Clone)]
pub struct ControllerErrorReport {
    pub kind: ControllerErrorKind,
    pub code: u32,
    pub message: String,
    pub context: String,
}

/// Single-consumer, multi-producer bounded ring buffer of events. `enqueue`
/// is the producer side (called from any subsystem); `drain` is the sole
/// consumer side (called once per `update` cycle, up to a fixed limit).
pub struct EventQueue {
    items: VecDeque<ControllerEvent>,
    capacity: usize,
}

impl EventQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    /// Enqueue one event. Returns `false` (without panicking or recursing)
    /// if the queue is already full — the caller is responsible for the
    /// "emit a synthetic error event, but only if the queue has room"
    /// backpressure policy; this method never does that itself, since
    /// recursing into `enqueue` on an `Error` event while already full
    /// would loop.
    pub fn enqueue(&mut self, event: ControllerEvent) -> bool {
        if self.is_full() {
            return false;
        }
        self.items.push_back(event);
        true
    }

    /// Drain up to `max` events in FIFO order.
    pub fn drain(&mut self, max: usize) -> Vec<ControllerEvent> {
        let n = max.min(self.items.len());
        self.items.drain(..n).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enqueue_respects_capacity() {
        let mut q = EventQueue::new(2);
        assert!(q.enqueue(ControllerEvent::Activate));
        assert!(q.enqueue(ControllerEvent::Activate));
        assert!(!q.enqueue(ControllerEvent::Activate));
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn drain_is_fifo_and_bounded() {
        let mut q = EventQueue::new(8);
        for _ in 0..5 {
            q.enqueue(ControllerEvent::Activate);
        }
        let drained = q.drain(3);
        assert_eq!(drained.len(), 3);
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn drain_never_takes_more_than_available() {
        let mut q = EventQueue::new(8);
        q.enqueue(ControllerEvent::Activate);
        let drained = q.drain(8);
        assert_eq!(drained.len(), 1);
        assert!(q.is_empty());
    }
}
