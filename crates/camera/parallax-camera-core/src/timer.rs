//! Cooperative single-shot timers.
//!
//! Nothing here runs on its own: the owner polls with the host clock once per
//! frame and receives the payloads of every task that came due, in due order.
//! Tasks are addressed by [`TaskHandle`]; cancelling twice is harmless.

use hashbrown::HashMap;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct TaskHandle(pub u64);

#[derive(Debug)]
struct Scheduled<T> {
    due_ms: f64,
    payload: T,
}

#[derive(Debug)]
pub struct TimerQueue<T> {
    next_id: u64,
    tasks: HashMap<TaskHandle, Scheduled<T>>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            tasks: HashMap::new(),
        }
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due_ms: f64, payload: T) -> TaskHandle {
        let handle = TaskHandle(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.tasks.insert(handle, Scheduled { due_ms, payload });
        log::debug!("timer {} scheduled for {due_ms}ms", handle.0);
        handle
    }

    /// Returns `false` if the task already fired or was cancelled.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let removed = self.tasks.remove(&handle).is_some();
        if removed {
            log::debug!("timer {} cancelled", handle.0);
        }
        removed
    }

    #[inline]
    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.tasks.contains_key(&handle)
    }

    pub fn due_at(&self, handle: TaskHandle) -> Option<f64> {
        self.tasks.get(&handle).map(|t| t.due_ms)
    }

    /// Remove and return every task with `due_ms <= now_ms`, earliest first
    /// (ties in scheduling order).
    pub fn poll_due(&mut self, now_ms: f64) -> Vec<(TaskHandle, T)> {
        let mut due: Vec<TaskHandle> = self
            .tasks
            .iter()
            .filter(|(_, t)| t.due_ms <= now_ms)
            .map(|(h, _)| *h)
            .collect();
        if due.is_empty() {
            return Vec::new();
        }
        due.sort_by(|a, b| {
            let (ta, tb) = (self.tasks[a].due_ms, self.tasks[b].due_ms);
            ta.total_cmp(&tb).then(a.0.cmp(&b.0))
        });
        due.into_iter()
            .filter_map(|h| self.tasks.remove(&h).map(|t| (h, t.payload)))
            .collect()
    }

    pub fn clear(&mut self) -> usize {
        let n = self.tasks.len();
        self.tasks.clear();
        n
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_in_due_order_once() {
        let mut q = TimerQueue::new();
        q.schedule(300.0, "c");
        q.schedule(100.0, "a");
        q.schedule(200.0, "b");
        assert!(q.poll_due(50.0).is_empty());
        let fired: Vec<_> = q.poll_due(250.0).into_iter().map(|(_, p)| p).collect();
        assert_eq!(fired, vec!["a", "b"]);
        assert_eq!(q.len(), 1);
        assert!(q.poll_due(250.0).is_empty());
    }

    #[test]
    fn double_cancel_is_harmless() {
        let mut q = TimerQueue::new();
        let h = q.schedule(10.0, ());
        assert!(q.is_pending(h));
        assert!(q.cancel(h));
        assert!(!q.cancel(h));
        assert!(q.poll_due(100.0).is_empty());
    }

    #[test]
    fn clear_drops_everything() {
        let mut q = TimerQueue::new();
        q.schedule(1.0, 1);
        q.schedule(2.0, 2);
        assert_eq!(q.clear(), 2);
        assert!(q.is_empty());
    }
}
