//! Epoch-tagged step queue
//!
//! Paced sequences are a chain of steps separated by waits. Each step is
//! queued with the epoch of the sequence that scheduled it; starting a new
//! sequence or cancelling bumps the epoch, and steps from an older epoch are
//! dropped when they come due instead of firing into the new sequence.

#[derive(Debug, Clone)]
struct Pending<S> {
    epoch: u64,
    due: f64,
    seq: u64,
    step: S,
}

#[derive(Debug, Clone)]
pub struct Timeline<S> {
    epoch: u64,
    /// Time new steps are scheduled relative to
    cursor: f64,
    next_seq: u64,
    pending: Vec<Pending<S>>,
}

impl<S> Default for Timeline<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Timeline<S> {
    pub fn new() -> Self {
        Self {
            epoch: 0,
            cursor: 0.0,
            next_seq: 0,
            pending: Vec::new(),
        }
    }

    /// Start a new sequence at `now`. Anything still queued becomes stale.
    pub fn begin(&mut self, now: f64) -> u64 {
        self.epoch += 1;
        self.cursor = now;
        self.epoch
    }

    /// Invalidate every queued step
    pub fn cancel(&mut self) {
        self.epoch += 1;
    }

    /// Queue `step` to fire `delay` seconds after the current cursor.
    ///
    /// The cursor is the `begin` time, or the due time of the step that was
    /// just polled, so chained waits add up exactly even when the driver
    /// ticks in large increments.
    pub fn schedule(&mut self, delay: f32, step: S) {
        let due = self.cursor + f64::from(delay.max(0.0));
        self.pending.push(Pending {
            epoch: self.epoch,
            due,
            seq: self.next_seq,
            step,
        });
        self.next_seq += 1;
    }

    /// Pop the earliest step due at `now` that belongs to the live epoch
    pub fn poll(&mut self, now: f64) -> Option<S> {
        loop {
            let idx = self
                .pending
                .iter()
                .enumerate()
                .filter(|(_, p)| p.due <= now)
                .min_by(|(_, a), (_, b)| a.due.total_cmp(&b.due).then(a.seq.cmp(&b.seq)))
                .map(|(i, _)| i)?;
            let pending = self.pending.swap_remove(idx);
            if pending.epoch != self.epoch {
                log::debug!(
                    "Timeline: dropping stale step (epoch {} != {})",
                    pending.epoch,
                    self.epoch
                );
                continue;
            }
            self.cursor = pending.due;
            return Some(pending.step);
        }
    }

    /// Current epoch
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// True when no live step is queued
    pub fn is_idle(&self) -> bool {
        self.pending.iter().all(|p| p.epoch != self.epoch)
    }

    /// Due time of the next live step
    pub fn next_due(&self) -> Option<f64> {
        self.pending
            .iter()
            .filter(|p| p.epoch == self.epoch)
            .map(|p| p.due)
            .min_by(f64::total_cmp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steps_fire_in_due_order() {
        let mut tl = Timeline::new();
        tl.begin(0.0);
        tl.schedule(2.0, "b");
        tl.schedule(1.0, "a");
        assert_eq!(tl.poll(0.5), None);
        assert_eq!(tl.poll(3.0), Some("a"));
        assert_eq!(tl.poll(3.0), Some("b"));
        assert!(tl.is_idle());
    }

    #[test]
    fn test_equal_due_keeps_insertion_order() {
        let mut tl = Timeline::new();
        tl.begin(0.0);
        tl.schedule(1.0, 1);
        tl.schedule(1.0, 2);
        tl.schedule(1.0, 3);
        assert_eq!(tl.poll(1.0), Some(1));
        assert_eq!(tl.poll(1.0), Some(2));
        assert_eq!(tl.poll(1.0), Some(3));
    }

    #[test]
    fn test_cancel_drops_queued_steps() {
        let mut tl = Timeline::new();
        tl.begin(0.0);
        tl.schedule(1.0, "stale");
        tl.cancel();
        assert!(tl.is_idle());
        assert_eq!(tl.poll(10.0), None);
    }

    #[test]
    fn test_new_sequence_supersedes_old() {
        let mut tl = Timeline::new();
        let first = tl.begin(0.0);
        tl.schedule(1.0, "old");
        let second = tl.begin(0.5);
        assert_ne!(first, second);
        tl.schedule(1.0, "new");
        assert_eq!(tl.next_due(), Some(1.5));
        assert_eq!(tl.poll(5.0), Some("new"));
        assert_eq!(tl.poll(5.0), None);
    }

    #[test]
    fn test_chained_waits_are_relative_to_due_time() {
        let mut tl = Timeline::new();
        tl.begin(0.0);
        tl.schedule(1.0, 1);
        // One large tick covers the whole chain
        assert_eq!(tl.poll(10.0), Some(1));
        tl.schedule(1.5, 2);
        assert_eq!(tl.next_due(), Some(2.5));
        assert_eq!(tl.poll(10.0), Some(2));
    }
}
