//! The three hook points a control tick invokes, in order: safety, control,
//! telemetry. Reformulated from the original's `(fn, void*)` pairs as boxed
//! closures, per the design notes on typed callback interfaces.

/// A hook closure: no arguments, no return value, invoked synchronously on
/// the dispatcher thread. Must not block and must not allocate in steady
/// state.
pub type Hook = Box<dyn FnMut() + Send + 'static>;

#[derive(Default)]
pub struct Hooks {
    pub safety: Option<Hook>,
    pub control: Option<Hook>,
    pub telemetry: Option<Hook>,
}

impl Hooks {
    /// Invoke whichever hooks are set, in the fixed order safety → control →
    /// telemetry. Missing hooks are skipped silently.
    pub fn run_all(&mut self) {
        if let Some(hook) = self.safety.as_mut() {
            hook();
        }
        if let Some(hook) = self.control.as_mut() {
            hook();
        }
        if let Some(hook) = self.telemetry.as_mut() {
            hook();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU8, Ordering};
    use std::sync::Arc;

    #[test]
    fn hooks_run_in_fixed_order() {
        let order = Arc::new(AtomicU8::new(0));
        let mut hooks = Hooks::default();

        let o = Arc::clone(&order);
        hooks.safety = Some(Box::new(move || {
            o.compare_exchange(0, 1, Ordering::SeqCst, Ordering::SeqCst)
                .unwrap();
        }));
        let o = Arc::clone(&order);
        hooks.control = Some(Box::new(move || {
            o.compare_exchange(1, 2, Ordering::SeqCst, Ordering::SeqCst)
                .unwrap();
        }));
        let o = Arc::clone(&order);
        hooks.telemetry = Some(Box::new(move || {
            o.compare_exchange(2, 3, Ordering::SeqCst, Ordering::SeqCst)
                .unwrap();
        }));

        hooks.run_all();
        assert_eq!(order.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn missing_hooks_are_skipped_silently() {
        let mut hooks = Hooks::default();
        hooks.run_all();
    }
}
