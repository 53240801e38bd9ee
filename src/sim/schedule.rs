/// Cancelable delayed tasks on a virtual millisecond clock.
///
/// The game loop feeds real elapsed time in with `advance_by`, then drains
/// due tasks with `pop_due`. While a task is being handled, `now_ms` is that
/// task's due time, so a task that reschedules itself (the countdown tick)
/// keeps an exact cadence even when a frame runs long.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

#[derive(Debug)]
struct Entry<T> {
    id: TaskId,
    due_ms: u64,
    task: T,
}

#[derive(Debug)]
pub struct Scheduler<T> {
    now_ms: u64,
    horizon_ms: u64,
    next_id: u64,
    entries: Vec<Entry<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Scheduler {
            now_ms: 0,
            horizon_ms: 0,
            next_id: 0,
            entries: Vec::new(),
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn schedule_in(&mut self, delay_ms: u64, task: T) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            id,
            due_ms: self.now_ms.saturating_add(delay_ms),
            task,
        });
        id
    }

    /// Returns `true` if the task was still pending.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    pub fn is_pending(&self, id: TaskId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    pub fn pending(&self) -> usize {
        self.entries.len()
    }

    /// Let `dt_ms` of real time pass. Tasks fire on the next `pop_due` calls.
    pub fn advance_by(&mut self, dt_ms: u64) {
        self.horizon_ms = self.horizon_ms.max(self.now_ms).saturating_add(dt_ms);
    }

    /// Earliest task due at or before the horizon, ties broken by scheduling order.
    /// Once nothing is due the clock settles on the horizon.
    pub fn pop_due(&mut self) -> Option<T> {
        let next = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due_ms <= self.horizon_ms)
            .min_by_key(|(_, e)| (e.due_ms, e.id.0))
            .map(|(i, _)| i);
        match next {
            Some(i) => {
                let entry = self.entries.remove(i);
                self.now_ms = self.now_ms.max(entry.due_ms);
                Some(entry.task)
            }
            None => {
                self.now_ms = self.horizon_ms;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(s: &mut Scheduler<&'static str>) -> Vec<&'static str> {
        std::iter::from_fn(|| s.pop_due()).collect()
    }

    #[test]
    fn nothing_fires_early() {
        let mut s = Scheduler::new();
        s.schedule_in(1_000, "a");
        s.advance_by(999);
        assert!(drain(&mut s).is_empty());
        s.advance_by(1);
        assert_eq!(drain(&mut s), vec!["a"]);
        assert_eq!(s.now_ms(), 1_000);
    }

    #[test]
    fn fires_in_due_order_then_schedule_order() {
        let mut s = Scheduler::new();
        s.schedule_in(2_000, "late");
        s.schedule_in(1_000, "first");
        s.schedule_in(1_000, "second");
        s.schedule_in(0, "now");
        s.advance_by(5_000);
        assert_eq!(drain(&mut s), vec!["now", "first", "second", "late"]);
    }

    #[test]
    fn cancelled_tasks_never_fire() {
        let mut s = Scheduler::new();
        let a = s.schedule_in(100, "a");
        s.schedule_in(100, "b");
        assert!(s.cancel(a));
        assert!(!s.cancel(a));
        assert!(!s.is_pending(a));
        s.advance_by(100);
        assert_eq!(drain(&mut s), vec!["b"]);
    }

    #[test]
    fn rescheduling_from_a_task_keeps_cadence() {
        let mut s = Scheduler::new();
        s.schedule_in(1_000, "tick");
        s.advance_by(3_500);
        let mut fired = vec![];
        while let Some(t) = s.pop_due() {
            fired.push(s.now_ms());
            s.schedule_in(1_000, t);
        }
        assert_eq!(fired, vec![1_000, 2_000, 3_000]);
        assert_eq!(s.now_ms(), 3_500);
        assert_eq!(s.pending(), 1);
    }

    #[test]
    fn delays_count_from_the_settled_clock() {
        let mut s = Scheduler::new();
        s.advance_by(400);
        assert!(drain(&mut s).is_empty());
        s.schedule_in(100, "x");
        s.advance_by(99);
        assert!(drain(&mut s).is_empty());
        s.advance_by(1);
        assert_eq!(drain(&mut s), vec!["x"]);
    }
}
