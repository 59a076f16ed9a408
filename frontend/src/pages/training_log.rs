use chrono::{Duration, Local};
use leptos::prelude::*;
use leptos::task::spawn_local;
use trainlog_shared::{DailyEntry, TrainingEntry};

use crate::auth::use_app;

/// 历史列表覆盖的天数
const HISTORY_DAYS: i64 = 14;

/// 空输入为 `None`，非数值输入报错
fn parse_metric(label: &str, text: &str) -> Result<Option<f64>, String> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    text.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .map(Some)
        .ok_or_else(|| format!("{} must be a number", label))
}

fn fmt_metric(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

#[derive(Clone, Copy)]
struct MetricField {
    label: &'static str,
    value: RwSignal<String>,
}

#[component]
pub fn LogPage() -> impl IntoView {
    let ctx = use_app();
    let date = RwSignal::new(Local::now().date_naive().format("%Y-%m-%d").to_string());
    let fields = [
        "Mileage",
        "Stress",
        "Sleep (h)",
        "Resting HR",
        "Exercise HR",
        "Perceived exertion",
    ]
    .map(|label| MetricField {
        label,
        value: RwSignal::new(String::new()),
    });
    let notes = RwSignal::new(String::new());
    let entries = RwSignal::new(Vec::<TrainingEntry>::new());
    let saving = RwSignal::new(false);

    let load_entries = move || {
        let Some(user_id) = ctx.user_id.get_untracked() else {
            return;
        };
        let today = Local::now().date_naive();
        let from = (today - Duration::days(HISTORY_DAYS)).format("%Y-%m-%d").to_string();
        let to = today.format("%Y-%m-%d").to_string();
        spawn_local(async move {
            let api = ctx.api();
            match api.training().list_entries(&user_id, Some(&from), Some(&to)).await {
                Ok(mut list) => {
                    list.sort_by(|a, b| b.day.cmp(&a.day));
                    entries.set(list);
                }
                Err(e) => ctx.notify_error(format!("Failed to load entries: {}", e)),
            }
        });
    };
    Effect::new(move |_| {
        ctx.user_id.track();
        load_entries();
    });

    let on_submit = move |ev: leptos::web_sys::SubmitEvent| {
        ev.prevent_default();
        let Some(user_id) = ctx.user_id.get_untracked() else {
            return;
        };
        let parsed: Result<Vec<Option<f64>>, String> = fields
            .iter()
            .map(|f| parse_metric(f.label, &f.value.get_untracked()))
            .collect();
        let metrics = match parsed {
            Ok(m) => m,
            Err(msg) => {
                ctx.notify_error(msg);
                return;
            }
        };
        let notes_text = notes.get_untracked();
        let entry = DailyEntry {
            user_id,
            date: date.get_untracked(),
            mileage: metrics[0],
            stress: metrics[1],
            sleep: metrics[2],
            resting_heart_rate: metrics[3],
            exercise_heart_rate: metrics[4],
            perceived_exertion: metrics[5],
            notes: (!notes_text.trim().is_empty()).then_some(notes_text),
        };

        saving.set(true);
        spawn_local(async move {
            let api = ctx.api();
            match api.training().log_daily_entry(&entry).await {
                Ok(_) => {
                    ctx.notify_success("Entry saved");
                    load_entries();
                }
                Err(e) => ctx.notify_error(e.to_string()),
            }
            saving.set(false);
        });
    };

    view! {
        <div class="grid gap-6 lg:grid-cols-2">
            <div class="card bg-base-100 shadow-xl">
                <form class="card-body gap-3" on:submit=on_submit>
                    <h2 class="card-title">"Daily log"</h2>
                    <input type="date" class="input input-bordered" bind:value=date required />
                    <div class="grid grid-cols-2 gap-3">
                        {fields
                            .into_iter()
                            .map(|f| {
                                view! {
                                    <label class="form-control">
                                        <span class="label-text">{f.label}</span>
                                        <input
                                            class="input input-bordered input-sm"
                                            inputmode="decimal"
                                            bind:value=f.value
                                        />
                                    </label>
                                }
                            })
                            .collect_view()}
                    </div>
                    <textarea class="textarea textarea-bordered" placeholder="Notes" bind:value=notes></textarea>
                    <button class="btn btn-primary" disabled=move || saving.get()>"Save entry"</button>
                </form>
            </div>

            <div class="card bg-base-100 shadow-xl">
                <div class="card-body p-0">
                    <h2 class="card-title p-6 pb-2">
                        {format!("Last {} days", HISTORY_DAYS)}
                    </h2>
                    <div class="overflow-x-auto">
                        <table class="table table-zebra table-sm">
                            <thead>
                                <tr>
                                    <th>"Day"</th>
                                    <th>"Miles"</th>
                                    <th>"Sleep"</th>
                                    <th>"RHR"</th>
                                    <th>"RPE"</th>
                                    <th>"Notes"</th>
                                </tr>
                            </thead>
                            <tbody>
                                <Show when=move || entries.with(Vec::is_empty)>
                                    <tr>
                                        <td colspan="6" class="text-center py-8 text-base-content/50">
                                            "No entries yet."
                                        </td>
                                    </tr>
                                </Show>
                                {move || {
                                    entries
                                        .get()
                                        .into_iter()
                                        .map(|e| {
                                            view! {
                                                <tr>
                                                    <td class="font-mono">{e.day}</td>
                                                    <td>{fmt_metric(e.mileage)}</td>
                                                    <td>{fmt_metric(e.sleep)}</td>
                                                    <td>{fmt_metric(e.resting_heart_rate)}</td>
                                                    <td>{fmt_metric(e.perceived_exertion)}</td>
                                                    <td class="max-w-xs truncate">{e.notes}</td>
                                                </tr>
                                            }
                                        })
                                        .collect_view()
                                }}
                            </tbody>
                        </table>
                    </div>
                </div>
            </div>
        </div>
    }
}
