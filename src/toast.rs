//! 轻量通知（Toast）队列
//!
//! 队列只按插入顺序保存，不去重。定时移除通过 `Scheduler` 注入，
//! 回调只持有队列的弱引用，队列销毁后触发的回调什么也不做。

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::Duration;

/// 默认展示时长
pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_millis(4000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToastKind {
    Success,
    Error,
    Warning,
    #[default]
    Info,
}

impl ToastKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToastKind::Success => "success",
            ToastKind::Error => "error",
            ToastKind::Warning => "warning",
            ToastKind::Info => "info",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub message: String,
    pub kind: ToastKind,
    pub visible: bool,
}

/// 延迟执行一次性任务（浏览器中为 `setTimeout`）
pub trait Scheduler {
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>);
}

type ToastListener = Box<dyn Fn(&[Toast])>;

#[derive(Default)]
struct Inner {
    next_id: Cell<u64>,
    toasts: RefCell<Vec<Toast>>,
    listeners: RefCell<Vec<ToastListener>>,
}

impl Inner {
    fn remove(&self, id: u64) -> bool {
        let removed = {
            let mut toasts = self.toasts.borrow_mut();
            let before = toasts.len();
            toasts.retain(|t| t.id != id);
            toasts.len() != before
        };
        if removed {
            self.notify();
        }
        removed
    }

    fn notify(&self) {
        let snapshot = self.toasts.borrow().clone();
        for listener in self.listeners.borrow().iter() {
            listener(&snapshot);
        }
    }
}

pub struct ToastNotifier<S: Scheduler> {
    inner: Rc<Inner>,
    scheduler: Rc<S>,
}

impl<S: Scheduler> Clone for ToastNotifier<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            scheduler: self.scheduler.clone(),
        }
    }
}

impl<S: Scheduler + 'static> ToastNotifier<S> {
    pub fn new(scheduler: S) -> Self {
        Self {
            inner: Rc::new(Inner::default()),
            scheduler: Rc::new(scheduler),
        }
    }

    /// 追加一条通知并返回其 ID（从 1 开始递增）
    ///
    /// `duration` 为零时不会自动移除。
    pub fn show(&self, message: impl Into<String>, kind: ToastKind, duration: Duration) -> u64 {
        let id = self.inner.next_id.get() + 1;
        self.inner.next_id.set(id);

        self.inner.toasts.borrow_mut().push(Toast {
            id,
            message: message.into(),
            kind,
            visible: true,
        });
        self.inner.notify();

        if !duration.is_zero() {
            let weak: Weak<Inner> = Rc::downgrade(&self.inner);
            self.scheduler.schedule(
                duration,
                Box::new(move || {
                    if let Some(inner) = weak.upgrade() {
                        inner.remove(id);
                    }
                }),
            );
        }
        id
    }

    /// 按 ID 移除；未知 ID 不做任何事
    pub fn remove(&self, id: u64) {
        self.inner.remove(id);
    }

    pub fn success(&self, message: impl Into<String>, duration: Duration) -> u64 {
        self.show(message, ToastKind::Success, duration)
    }

    pub fn error(&self, message: impl Into<String>, duration: Duration) -> u64 {
        self.show(message, ToastKind::Error, duration)
    }

    pub fn warning(&self, message: impl Into<String>, duration: Duration) -> u64 {
        self.show(message, ToastKind::Warning, duration)
    }

    pub fn info(&self, message: impl Into<String>, duration: Duration) -> u64 {
        self.show(message, ToastKind::Info, duration)
    }

    pub fn toasts(&self) -> Vec<Toast> {
        self.inner.toasts.borrow().clone()
    }

    /// 队列每次变化后回调一次，参数为变化后的快照
    pub fn subscribe(&self, listener: impl Fn(&[Toast]) + 'static) {
        self.inner.listeners.borrow_mut().push(Box::new(listener));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 手动推进的调度器
    #[derive(Clone, Default)]
    struct ManualScheduler {
        pending: Rc<RefCell<Vec<(Duration, Box<dyn FnOnce()>)>>>,
    }

    impl ManualScheduler {
        fn run_all(&self) {
            let tasks: Vec<_> = self.pending.borrow_mut().drain(..).collect();
            for (_, task) in tasks {
                task();
            }
        }

        fn delays(&self) -> Vec<Duration> {
            self.pending.borrow().iter().map(|(d, _)| *d).collect()
        }
    }

    impl Scheduler for ManualScheduler {
        fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>) {
            self.pending.borrow_mut().push((delay, task));
        }
    }

    fn notifier() -> (ToastNotifier<ManualScheduler>, ManualScheduler) {
        let scheduler = ManualScheduler::default();
        (ToastNotifier::new(scheduler.clone()), scheduler)
    }

    #[test]
    fn test_ids_are_monotonic_from_one() {
        let (toasts, _) = notifier();
        assert_eq!(toasts.info("a", Duration::ZERO), 1);
        assert_eq!(toasts.error("b", Duration::ZERO), 2);
        assert_eq!(toasts.success("a", Duration::ZERO), 3);

        let all = toasts.toasts();
        let messages: Vec<&str> = all.iter().map(|t| t.message.as_str()).collect();
        assert_eq!(messages, vec!["a", "b", "a"]);
        assert_eq!(all[1].kind, ToastKind::Error);
        assert!(all.iter().all(|t| t.visible));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let (toasts, _) = notifier();
        let id = toasts.warning("careful", Duration::ZERO);
        let other = toasts.info("keep", Duration::ZERO);

        toasts.remove(id);
        toasts.remove(id);
        toasts.remove(999);

        let ids: Vec<u64> = toasts.toasts().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![other]);
    }

    #[test]
    fn test_scheduled_removal() {
        let (toasts, scheduler) = notifier();
        toasts.success("saved", DEFAULT_TOAST_DURATION);
        toasts.info("sticky", Duration::ZERO);

        assert_eq!(scheduler.delays(), vec![Duration::from_millis(4000)]);
        scheduler.run_all();

        let remaining: Vec<String> = toasts.toasts().into_iter().map(|t| t.message).collect();
        assert_eq!(remaining, vec!["sticky".to_string()]);
    }

    #[test]
    fn test_scheduled_removal_after_manual_removal_is_noop() {
        let (toasts, scheduler) = notifier();
        let id = toasts.error("boom", DEFAULT_TOAST_DURATION);
        toasts.remove(id);
        let later = toasts.info("next", Duration::ZERO);

        scheduler.run_all();
        assert_eq!(toasts.toasts().len(), 1);
        assert_eq!(toasts.toasts()[0].id, later);
    }

    #[test]
    fn test_timer_after_drop_is_noop() {
        let (toasts, scheduler) = notifier();
        toasts.info("bye", DEFAULT_TOAST_DURATION);
        drop(toasts);
        scheduler.run_all();
    }

    #[test]
    fn test_subscribers_see_every_change() {
        let (toasts, scheduler) = notifier();
        let seen: Rc<RefCell<Vec<usize>>> = Rc::default();
        let sink = seen.clone();
        toasts.subscribe(move |all| sink.borrow_mut().push(all.len()));

        toasts.info("one", DEFAULT_TOAST_DURATION);
        toasts.info("two", Duration::ZERO);
        toasts.remove(42);
        scheduler.run_all();

        assert_eq!(*seen.borrow(), vec![1, 2, 1]);
    }
}
