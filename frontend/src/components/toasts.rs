use leptos::prelude::*;
use trainlog::toast::{Toast, ToastKind};

use crate::auth::use_app;

fn alert_class(kind: ToastKind) -> &'static str {
    match kind {
        ToastKind::Success => "alert alert-success shadow-lg",
        ToastKind::Error => "alert alert-error shadow-lg",
        ToastKind::Warning => "alert alert-warning shadow-lg",
        ToastKind::Info => "alert alert-info shadow-lg",
    }
}

/// 右上角通知栈，点击即可关闭
#[component]
pub fn ToastStack() -> impl IntoView {
    let ctx = use_app();

    view! {
        <div class="toast toast-top toast-end z-50">
            <For
                each=move || ctx.toasts.get().into_iter().filter(|t| t.visible)
                key=|t: &Toast| t.id
                let:toast
            >
                <div
                    role="alert"
                    class=alert_class(toast.kind)
                    data-kind=toast.kind.as_str()
                    on:click=move |_| ctx.dismiss(toast.id)
                >
                    <span>{toast.message.clone()}</span>
                </div>
            </For>
        </div>
    }
}
