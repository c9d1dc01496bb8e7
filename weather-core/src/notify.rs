//! Ephemeral user-facing messages and the busy indicator.

use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToastLevel {
    Info,
    Success,
    Error,
}

impl ToastLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToastLevel::Info => "info",
            ToastLevel::Success => "success",
            ToastLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub level: ToastLevel,
    pub message: String,
}

/// Notification port. Independent of any weather data.
pub trait Notifier: Send + Sync {
    fn show(&self, message: &str, level: ToastLevel);

    fn set_busy(&self, busy: bool);
}

#[derive(Debug)]
struct Entry {
    toast: Toast,
    expires_at: Instant,
}

#[derive(Debug, Default)]
struct QueueState {
    next_id: u64,
    active: Vec<Entry>,
    shown: Vec<Toast>,
    busy: bool,
}

/// In-memory notifier whose toasts disappear after a fixed duration.
#[derive(Debug)]
pub struct ToastQueue {
    duration: Duration,
    state: Mutex<QueueState>,
}

impl ToastQueue {
    pub fn new(duration: Duration) -> Self {
        Self { duration, state: Mutex::new(QueueState::default()) }
    }

    /// Toasts that have not expired yet, oldest first.
    pub fn active(&self) -> Vec<Toast> {
        let now = Instant::now();
        let mut state = self.state.lock();
        state.active.retain(|e| e.expires_at > now);
        state.active.iter().map(|e| e.toast.clone()).collect()
    }

    pub fn dismiss(&self, id: u64) {
        self.state.lock().active.retain(|e| e.toast.id != id);
    }

    pub fn clear(&self) {
        self.state.lock().active.clear();
    }

    /// Every toast ever shown, including expired ones.
    pub fn shown(&self) -> Vec<Toast> {
        self.state.lock().shown.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.state.lock().busy
    }
}

impl Notifier for ToastQueue {
    fn show(&self, message: &str, level: ToastLevel) {
        let mut state = self.state.lock();
        state.next_id += 1;
        let toast = Toast { id: state.next_id, level, message: message.to_string() };
        state.shown.push(toast.clone());
        state.active.push(Entry { toast, expires_at: Instant::now() + self.duration });
    }

    fn set_busy(&self, busy: bool) {
        self.state.lock().busy = busy;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn toasts_expire_after_duration() {
        let queue = ToastQueue::new(Duration::from_secs(5));
        queue.show("first", ToastLevel::Info);
        tokio::time::advance(Duration::from_secs(3)).await;
        queue.show("second", ToastLevel::Error);

        assert_eq!(queue.active().len(), 2);

        tokio::time::advance(Duration::from_secs(3)).await;
        let active = queue.active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].message, "second");
        assert_eq!(active[0].level, ToastLevel::Error);

        // history is kept
        assert_eq!(queue.shown().len(), 2);
    }

    #[tokio::test]
    async fn dismiss_and_clear() {
        let queue = ToastQueue::new(Duration::from_secs(60));
        queue.show("a", ToastLevel::Info);
        queue.show("b", ToastLevel::Success);
        let first = queue.active()[0].id;

        queue.dismiss(first);
        assert_eq!(queue.active().len(), 1);

        queue.clear();
        assert!(queue.active().is_empty());
    }

    #[test]
    fn busy_flag_is_independent_of_toasts() {
        let queue = ToastQueue::new(Duration::from_secs(1));
        queue.set_busy(true);
        assert!(queue.is_busy());
        assert!(queue.shown().is_empty());
        queue.set_busy(false);
        assert!(!queue.is_busy());
    }
}
