//! 定时器封装模块
//!
//! 基于 `setTimeout` 的一次性定时器，以及供通知队列使用的调度器。

use std::time::Duration;

use trainlog::toast::Scheduler;
use wasm_bindgen::prelude::*;

/// 一次性定时器
///
/// drop 时自动清除尚未触发的定时器；调用 `forget` 让它脱离所有权继续运行。
pub struct Timeout {
    handle: Option<i32>,
    closure: Option<Closure<dyn FnMut()>>,
}

impl Timeout {
    pub fn new<F>(delay: Duration, callback: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        let mut callback = Some(callback);
        let closure = Closure::<dyn FnMut()>::new(move || {
            if let Some(cb) = callback.take() {
                cb();
            }
        });

        let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        let handle = web_sys::window().and_then(|w| {
            w.set_timeout_with_callback_and_timeout_and_arguments_0(
                closure.as_ref().unchecked_ref(),
                millis,
            )
            .ok()
        });
        if handle.is_none() {
            log::error!("[Timer] setTimeout 失败");
        }

        Self {
            handle,
            closure: Some(closure),
        }
    }

    pub fn cancel(&mut self) {
        if let (Some(handle), Some(window)) = (self.handle.take(), web_sys::window()) {
            window.clear_timeout_with_handle(handle);
        }
    }

    /// 放弃所有权，定时器照常触发，闭包随之泄漏
    pub fn forget(mut self) {
        self.handle = None;
        if let Some(closure) = self.closure.take() {
            closure.forget();
        }
    }
}

impl Drop for Timeout {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// 通知队列的 `setTimeout` 调度器
#[derive(Clone, Copy, Default)]
pub struct TimeoutScheduler;

impl Scheduler for TimeoutScheduler {
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>) {
        Timeout::new(delay, task).forget();
    }
}
