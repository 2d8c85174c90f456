/// Coalesces bursts of events into one, delivered once `delay` seconds pass
/// without a new trigger. Driven by the UI clock (`egui::InputState::time`)
/// rather than timers, so it works the same natively and on the web.
#[derive(Clone, Debug)]
pub struct Debouncer<T> {
    delay: f64,
    pending: Option<(f64, T)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: f64) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Records `value` at time `now`, replacing anything still pending.
    pub fn trigger(&mut self, now: f64, value: T) {
        self.pending = Some((now, value));
    }

    /// Seconds until the pending value fires, for scheduling a repaint.
    pub fn remaining(&self, now: f64) -> Option<f64> {
        self.pending
            .as_ref()
            .map(|(at, _)| (at + self.delay - now).max(0.0))
    }

    pub fn poll(&mut self, now: f64) -> Option<T> {
        match &self.pending {
            Some((at, _)) if now - at >= self.delay => self.pending.take().map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_delivers_last_value_once() {
        let mut debouncer = Debouncer::new(0.25);
        debouncer.trigger(0.0, 1);
        debouncer.trigger(0.1, 2);
        debouncer.trigger(0.2, 3);
        assert_eq!(debouncer.poll(0.3), None);
        assert_eq!(debouncer.poll(0.45), Some(3));
        assert_eq!(debouncer.poll(1.0), None);
    }

    #[test]
    fn test_remaining_and_cancel() {
        let mut debouncer = Debouncer::new(0.25);
        assert_eq!(debouncer.remaining(0.0), None);
        debouncer.trigger(1.0, ());
        let remaining = debouncer.remaining(1.1).unwrap();
        assert!((remaining - 0.15).abs() < 1e-9);
        assert_eq!(debouncer.remaining(2.0), Some(0.0));
        debouncer.cancel();
        assert_eq!(debouncer.remaining(2.0), None);
        assert_eq!(debouncer.poll(5.0), None);
    }
}
