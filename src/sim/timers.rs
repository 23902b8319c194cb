//! Wall-clock timers
//!
//! Delayed one-shot and repeating actions measured in host milliseconds,
//! independent of the fixed tick stream. Timers are plain data (`A`), so
//! firing one is a dispatch through the owner's state machine rather than a
//! stored closure.

/// Handle to a scheduled timer.
///
/// Carries the generation of the queue that issued it; a handle from an
/// older generation never cancels anything in a newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle {
    generation: u64,
    id: u64,
}

impl TimerHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone)]
struct Entry<A> {
    id: u64,
    due_ms: f64,
    interval_ms: Option<f64>,
    action: A,
}

/// Pending timers for one owner (a session or the menu overlay)
#[derive(Debug, Clone)]
pub struct TimerQueue<A> {
    generation: u64,
    next_id: u64,
    entries: Vec<Entry<A>>,
}

impl<A> Default for TimerQueue<A> {
    fn default() -> Self {
        Self::new(0)
    }
}

impl<A> TimerQueue<A> {
    pub fn new(generation: u64) -> Self {
        Self {
            generation,
            next_id: 1,
            entries: Vec::new(),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Fire `action` once at `now_ms + delay_ms`
    pub fn schedule_once(&mut self, now_ms: f64, delay_ms: f64, action: A) -> TimerHandle {
        self.push(now_ms + delay_ms.max(0.0), None, action)
    }

    /// Fire `action` every `interval_ms`, first at `now_ms + interval_ms`
    pub fn schedule_repeating(&mut self, now_ms: f64, interval_ms: f64, action: A) -> TimerHandle {
        let interval = interval_ms.max(1.0);
        self.push(now_ms + interval, Some(interval), action)
    }

    fn push(&mut self, due_ms: f64, interval_ms: Option<f64>, action: A) -> TimerHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(Entry {
            id,
            due_ms,
            interval_ms,
            action,
        });
        TimerHandle {
            generation: self.generation,
            id,
        }
    }

    /// Cancel one timer. Returns false if it already fired, was cancelled,
    /// or belongs to another generation.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        if handle.generation != self.generation {
            return false;
        }
        let before = self.entries.len();
        self.entries.retain(|e| e.id != handle.id);
        self.entries.len() != before
    }

    /// Drop every pending timer; returns how many were dropped
    pub fn cancel_all(&mut self) -> usize {
        let n = self.entries.len();
        self.entries.clear();
        n
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        handle.generation == self.generation && self.entries.iter().any(|e| e.id == handle.id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Earliest due time, if any
    pub fn next_due_ms(&self) -> Option<f64> {
        self.entries
            .iter()
            .map(|e| e.due_ms)
            .min_by(|a, b| a.total_cmp(b))
    }
}

impl<A: Clone> TimerQueue<A> {
    /// Pop the earliest timer due at `now_ms` (ties fire in schedule order).
    ///
    /// Repeating timers are re-armed one interval after their due time; if
    /// the host fell more than an interval behind they re-arm one interval
    /// from `now_ms` instead of bursting.
    pub fn pop_due(&mut self, now_ms: f64) -> Option<A> {
        let idx = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due_ms <= now_ms)
            .min_by(|(_, a), (_, b)| a.due_ms.total_cmp(&b.due_ms).then(a.id.cmp(&b.id)))
            .map(|(i, _)| i)?;

        match self.entries[idx].interval_ms {
            Some(interval) => {
                let entry = &mut self.entries[idx];
                let mut next = entry.due_ms + interval;
                if next <= now_ms {
                    next = now_ms + interval;
                }
                entry.due_ms = next;
                Some(entry.action.clone())
            }
            None => Some(self.entries.remove(idx).action),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_shot_fires_once_at_due() {
        let mut q = TimerQueue::new(1);
        q.schedule_once(1000.0, 1250.0, "restart");
        assert_eq!(q.pop_due(2249.0), None);
        assert_eq!(q.pop_due(2250.0), Some("restart"));
        assert_eq!(q.pop_due(5000.0), None);
        assert!(q.is_empty());
    }

    #[test]
    fn test_due_order_then_schedule_order() {
        let mut q = TimerQueue::new(1);
        q.schedule_once(0.0, 300.0, 'c');
        q.schedule_once(0.0, 100.0, 'a');
        q.schedule_once(0.0, 100.0, 'b');
        let fired: Vec<char> = std::iter::from_fn(|| q.pop_due(1000.0)).collect();
        assert_eq!(fired, vec!['a', 'b', 'c']);
    }

    #[test]
    fn test_repeating_until_cancelled() {
        let mut q = TimerQueue::new(1);
        let h = q.schedule_repeating(0.0, 200.0, ());
        let mut fired = 0;
        let mut now = 0.0;
        while now <= 1000.0 {
            while q.pop_due(now).is_some() {
                fired += 1;
            }
            now += 50.0;
        }
        assert_eq!(fired, 5);
        assert!(q.cancel(h));
        assert_eq!(q.pop_due(10_000.0), None);
    }

    #[test]
    fn test_repeating_does_not_burst_after_stall() {
        let mut q = TimerQueue::new(1);
        q.schedule_repeating(0.0, 200.0, ());
        assert!(q.pop_due(5000.0).is_some());
        assert!(q.pop_due(5000.0).is_none());
        assert_eq!(q.next_due_ms(), Some(5200.0));
    }

    #[test]
    fn test_stale_generation_handle_is_ignored() {
        let mut old = TimerQueue::new(1);
        let stale = old.schedule_once(0.0, 10.0, 1);
        let mut new = TimerQueue::new(2);
        let fresh = new.schedule_once(0.0, 10.0, 2);
        assert_eq!(stale.id, fresh.id);
        assert!(!new.cancel(stale));
        assert!(new.is_pending(fresh));
    }

    #[test]
    fn test_cancel_all() {
        let mut q = TimerQueue::new(3);
        q.schedule_once(0.0, 10.0, ());
        q.schedule_repeating(0.0, 10.0, ());
        assert_eq!(q.cancel_all(), 2);
        assert_eq!(q.pop_due(100.0), None);
    }
}
