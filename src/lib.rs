//! 队伍训练日志客户端核心
//!
//! - `client`：统一的 HTTP 适配层（基础地址、超时、拦截器、错误归一化）
//! - `api`：按后端概念划分的领域接口（日历、队伍、训练记录、用户、通知）
//! - `auth`：身份提供方与应用用户之间的登录桥接
//! - `toast` / `route`：界面层共用的通知队列与路由守卫
//!
//! 所有状态都是单线程的（`Rc` / `RefCell`），异步 trait 使用 `?Send`。

pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod request;
pub mod route;
pub mod toast;

pub use trainlog_shared as shared;

pub use auth::{AuthBridge, AuthPhase, IdentityProvider, KeyValueStore, SessionStore};
pub use client::ApiClient;
pub use config::ClientConfig;
pub use error::{ApiError, ApiResult, AuthError};
pub use request::{HttpClient, HttpRequest, HttpResponse};
pub use route::{AppRoute, guard};
pub use toast::{Scheduler, ToastKind, ToastNotifier};

#[cfg(not(target_arch = "wasm32"))]
pub use request::ReqwestHttpClient;
