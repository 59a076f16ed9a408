//! 应用上下文
//!
//! 组装核心库的服务（API 客户端、认证桥接、通知队列），
//! 并把它们的状态变化同步到 Leptos 信号。服务本身不是 `Send`，
//! 因此保存在 `StoredValue::new_local` 中，视图闭包只捕获 `Copy` 的句柄。

use std::rc::Rc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use trainlog::auth::{AuthBridge, AuthPhase, SessionStore};
use trainlog::client::ApiClient;
use trainlog::config::{ClientConfig, ENV_API_BASE_URL};
use trainlog::error::AuthError;
use trainlog::toast::{DEFAULT_TOAST_DURATION, Toast, ToastNotifier};

use crate::web::{FetchHttpClient, FirebaseIdentity, TimeoutScheduler, WebStorage};

pub type Api = ApiClient<FetchHttpClient>;
pub type Bridge = AuthBridge<FirebaseIdentity, WebStorage, FetchHttpClient>;
pub type Toasts = ToastNotifier<TimeoutScheduler>;

/// 单线程服务集合
pub struct AppServices {
    pub api: Rc<Api>,
    pub auth: Bridge,
    pub toasts: Toasts,
}

impl AppServices {
    fn new() -> Self {
        // 构建期注入的基础地址，未设置时使用同源 `/api`
        let base = option_env!("TRAINLOG_API_BASE_URL");
        log::debug!("{} = {:?}", ENV_API_BASE_URL, base);

        let identity = Rc::new(FirebaseIdentity);
        let api = Rc::new(
            ApiClient::new(ClientConfig::from_base(base), FetchHttpClient)
                .with_identity(identity.clone()),
        );
        let auth = AuthBridge::new(identity, WebStorage, api.clone(), SessionStore::new());

        Self {
            api,
            auth,
            toasts: ToastNotifier::new(TimeoutScheduler),
        }
    }
}

/// 通过 Context 在组件间共享的句柄
#[derive(Clone, Copy)]
pub struct AppContext {
    services: StoredValue<Rc<AppServices>, LocalStorage>,
    pub phase: RwSignal<AuthPhase>,
    pub user_id: RwSignal<Option<String>>,
    pub toasts: RwSignal<Vec<Toast>>,
}

impl AppContext {
    /// 创建服务、连接信号、恢复上次会话并订阅身份变化
    pub fn new() -> Self {
        let services = Rc::new(AppServices::new());
        let phase = RwSignal::new(AuthPhase::SignedOut);
        let user_id = RwSignal::new(None);
        let toasts = RwSignal::new(Vec::new());

        services.auth.sessions().on_change(move |state| {
            phase.set(state.phase.clone());
            user_id.set(state.user_id().map(str::to_string));
        });
        services.toasts.subscribe(move |all| toasts.set(all.to_vec()));

        services.auth.subscribe();
        services.auth.restore();

        Self {
            services: StoredValue::new_local(services),
            phase,
            user_id,
            toasts,
        }
    }

    pub fn services(&self) -> Rc<AppServices> {
        self.services.get_value()
    }

    pub fn api(&self) -> Rc<Api> {
        self.services().api.clone()
    }

    /// 认证状态信号（注入路由服务）
    pub fn is_authenticated_signal(&self) -> Signal<bool> {
        let user_id = self.user_id;
        Signal::derive(move || user_id.with(Option::is_some))
    }

    pub fn notify_success(&self, message: impl Into<String>) {
        self.services().toasts.success(message, DEFAULT_TOAST_DURATION);
    }

    pub fn notify_error(&self, message: impl Into<String>) {
        self.services().toasts.error(message, DEFAULT_TOAST_DURATION);
    }

    pub fn notify_info(&self, message: impl Into<String>) {
        self.services().toasts.info(message, DEFAULT_TOAST_DURATION);
    }

    pub fn dismiss(&self, id: u64) {
        self.services().toasts.remove(id);
    }
}

pub fn use_app() -> AppContext {
    use_context::<AppContext>().expect("AppContext should be provided")
}

/// 弹窗登录，结果以通知形式反馈
pub fn sign_in(ctx: AppContext) {
    spawn_local(async move {
        let services = ctx.services();
        match services.auth.sign_in_and_register().await {
            Ok(outcome) => {
                ctx.notify_success("Signed in");
                if outcome.needs_name || outcome.needs_role {
                    ctx.notify_info("Finish setting up your profile");
                }
            }
            Err(AuthError::Cancelled) => ctx.notify_info("Sign-in cancelled"),
            Err(AuthError::InProgress) => {}
            Err(e) => ctx.notify_error(format!("Sign-in failed: {}", e)),
        }
    });
}

/// 登出；路由服务监听认证信号，自动离开受保护页面
pub fn sign_out(ctx: AppContext) {
    spawn_local(async move {
        if let Err(e) = ctx.services().auth.sign_out().await {
            ctx.notify_error(format!("Sign-out failed: {}", e));
        }
    });
}
