use chrono::Local;
use leptos::prelude::*;
use leptos::task::spawn_local;
use serde_json::Value;

use crate::auth::use_app;

/// 汇总行：裸数组或 `{summaries: [...]}` 中的对象
fn summary_rows(value: &Value) -> Option<&Vec<Value>> {
    let rows = match value {
        Value::Array(rows) => rows,
        Value::Object(obj) => obj.get("summaries")?.as_array()?,
        _ => return None,
    };
    rows.iter().all(Value::is_object).then_some(rows)
}

/// 列名取第一行的键
fn columns(rows: &[Value]) -> Vec<String> {
    rows.first()
        .and_then(Value::as_object)
        .map(|obj| obj.keys().cloned().collect())
        .unwrap_or_default()
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "-".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(f) if f.fract() != 0.0 => format!("{:.1}", f),
            _ => n.to_string(),
        },
        Some(other) => other.to_string(),
    }
}

#[component]
pub fn TeamSummariesPage() -> impl IntoView {
    let ctx = use_app();
    let date = RwSignal::new(Local::now().date_naive().format("%Y-%m-%d").to_string());
    let summary = RwSignal::new(None::<Value>);
    let loading = RwSignal::new(false);

    Effect::new(move |_| {
        let day = date.get();
        let Some(user_id) = ctx.user_id.get() else {
            return;
        };
        loading.set(true);
        spawn_local(async move {
            let api = ctx.api();
            match api.training().get_team_weekly_summaries(&user_id, &day).await {
                Ok(v) => summary.set(Some(v)),
                Err(e) => {
                    summary.set(None);
                    ctx.notify_error(format!("Failed to load summaries: {}", e));
                }
            }
            loading.set(false);
        });
    });

    let body = move || {
        let Some(value) = summary.get() else {
            return view! { <p class="text-base-content/50">"No summary available."</p> }.into_any();
        };
        let Some(rows) = summary_rows(&value) else {
            let pretty = serde_json::to_string_pretty(&value).unwrap_or_default();
            return view! { <pre class="text-xs overflow-x-auto">{pretty}</pre> }.into_any();
        };
        let cols = columns(rows);
        let header = cols
            .iter()
            .map(|c| view! { <th>{c.clone()}</th> })
            .collect_view();
        let body = rows
            .iter()
            .map(|row| {
                let cells = cols
                    .iter()
                    .map(|c| view! { <td>{cell(row.get(c))}</td> })
                    .collect_view();
                view! { <tr>{cells}</tr> }
            })
            .collect_view();

        view! {
            <div class="overflow-x-auto">
                <table class="table table-zebra table-sm">
                    <thead><tr>{header}</tr></thead>
                    <tbody>{body}</tbody>
                </table>
            </div>
        }
        .into_any()
    };

    view! {
        <div class="card bg-base-100 shadow-xl">
            <div class="card-body">
                <div class="flex flex-wrap items-center justify-between gap-4">
                    <h2 class="card-title">"Team weekly summaries"</h2>
                    <input type="date" class="input input-bordered input-sm" bind:value=date />
                </div>
                <Show when=move || loading.get() fallback=body>
                    <span class="loading loading-dots"></span>
                </Show>
            </div>
        </div>
    }
}
