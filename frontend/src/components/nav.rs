use leptos::prelude::*;
use trainlog::auth::AuthPhase;
use trainlog::route::AppRoute;

use crate::auth::{sign_in, sign_out, use_app};
use crate::web::{Link, use_router};

/// 登录后才显示的导航项
const NAV_ROUTES: [AppRoute; 3] = [
    AppRoute::Log,
    AppRoute::Profile,
    AppRoute::TeamSummaries,
];

#[component]
pub fn NavBar() -> impl IntoView {
    let ctx = use_app();
    let router = use_router();
    let signed_in = move || ctx.user_id.with(Option::is_some);

    view! {
        <div class="navbar bg-base-100 rounded-box shadow-xl">
            <div class="flex-1 gap-1">
                <Link to=AppRoute::Home class="btn btn-ghost text-xl">"TrainLog"</Link>
                <Show when=signed_in>
                    <ul class="menu menu-horizontal px-1 hidden md:flex">
                        {NAV_ROUTES
                            .into_iter()
                            .map(|route| {
                                let class = move || {
                                    if router.current_route().get() == route { "active" } else { "" }
                                };
                                view! {
                                    <li class=class>
                                        <Link to=route>{route.title()}</Link>
                                    </li>
                                }
                            })
                            .collect_view()}
                    </ul>
                </Show>
            </div>
            <div class="flex-none">
                <Show
                    when=signed_in
                    fallback=move || view! {
                        <button
                            class="btn btn-primary btn-sm"
                            disabled=move || ctx.phase.get() == AuthPhase::Authenticating
                            on:click=move |_| sign_in(ctx)
                        >
                            "Sign in"
                        </button>
                    }
                >
                    <button class="btn btn-outline btn-sm" on:click=move |_| sign_out(ctx)>
                        "Sign out"
                    </button>
                </Show>
            </div>
        </div>
    }
}
