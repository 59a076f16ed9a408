//! TrainLog 前端应用
//!
//! 核心逻辑（API、认证、通知、路由表）都在 `trainlog` crate 中，这里只负责：
//! - `web`: 浏览器 API 适配（fetch、LocalStorage、setTimeout、Firebase、History）
//! - `auth`: 组装服务并把状态同步到信号
//! - `components` / `pages`: UI

mod auth;
pub mod logger;
mod components {
    pub mod nav;
    pub mod toasts;
}
mod pages {
    pub mod home;
    pub mod training_log;
    pub mod profile;
    pub mod team_summaries;
}

pub(crate) mod web {
    mod http;
    mod identity;
    mod router;
    mod storage;
    mod timer;

    pub use http::FetchHttpClient;
    pub use identity::FirebaseIdentity;
    pub use router::{Link, Router, RouterOutlet, use_router};
    pub use storage::WebStorage;
    pub use timer::TimeoutScheduler;
}

use leptos::prelude::*;
use trainlog::route::AppRoute;

use crate::auth::AppContext;
use crate::components::nav::NavBar;
use crate::components::toasts::ToastStack;
use crate::pages::home::HomePage;
use crate::pages::training_log::LogPage;
use crate::pages::profile::ProfilePage;
use crate::pages::team_summaries::TeamSummariesPage;
use crate::web::{Router, RouterOutlet};

fn route_matcher(route: AppRoute) -> AnyView {
    match route {
        AppRoute::Home => view! { <HomePage /> }.into_any(),
        AppRoute::Log => view! { <LogPage /> }.into_any(),
        AppRoute::Profile => view! { <ProfilePage /> }.into_any(),
        AppRoute::TeamSummaries => view! { <TeamSummariesPage /> }.into_any(),
        AppRoute::NotFound => view! {
            <div class="text-center py-24">
                <h1 class="text-6xl font-bold text-error">"404"</h1>
                <p class="text-xl mt-4">"Page not found"</p>
            </div>
        }
        .into_any(),
    }
}

#[component]
pub fn App() -> impl IntoView {
    // 1. 组装服务并恢复会话（必须早于路由初始化，守卫依赖恢复后的状态）
    let ctx = AppContext::new();
    provide_context(ctx);

    // 2. 认证信号注入路由服务
    let is_authenticated = ctx.is_authenticated_signal();

    view! {
        <Router is_authenticated=is_authenticated>
            <div class="min-h-screen bg-base-200 p-4 md:p-8 font-sans">
                <div class="max-w-6xl mx-auto space-y-8">
                    <NavBar />
                    <ToastStack />
                    <RouterOutlet matcher=route_matcher />
                </div>
            </div>
        </Router>
    }
}
