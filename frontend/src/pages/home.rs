use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use leptos::prelude::*;
use leptos::task::spawn_local;
use trainlog::api::{NewEvent, TeamNotification};
use trainlog::auth::AuthPhase;
use trainlog::route::AppRoute;
use trainlog_shared::{Event, Role, Team};

use crate::auth::{AppContext, sign_in, use_app};
use crate::web::Link;

/// 把本地日期与 `HH:MM` 组合为 UTC 时间
fn local_instant(date: NaiveDate, time: &str) -> Option<DateTime<Utc>> {
    let time = NaiveTime::parse_from_str(time, "%H:%M").ok()?;
    Local
        .from_local_datetime(&date.and_time(time))
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

fn local_time(instant: &DateTime<Utc>) -> String {
    instant.with_timezone(&Local).format("%H:%M").to_string()
}

#[component]
pub fn HomePage() -> impl IntoView {
    let ctx = use_app();
    view! {
        <Show when=move || ctx.user_id.with(Option::is_some) fallback=|| view! { <SignInHero /> }>
            <TeamHome />
        </Show>
    }
}

#[component]
fn SignInHero() -> impl IntoView {
    let ctx = use_app();
    let busy = move || ctx.phase.get() == AuthPhase::Authenticating;

    view! {
        <div class="hero min-h-[60vh]">
            <div class="hero-content text-center">
                <div class="max-w-md space-y-4">
                    <h1 class="text-4xl font-bold">"TrainLog"</h1>
                    <p class="text-base-content/70">
                        "Plan team sessions, log your training and keep the whole squad in sync."
                    </p>
                    <button class="btn btn-primary" disabled=busy on:click=move |_| sign_in(ctx)>
                        {move || if busy() {
                            view! { <span class="loading loading-spinner"></span> "Signing in..." }.into_any()
                        } else {
                            "Sign in with Google".into_any()
                        }}
                    </button>
                </div>
            </div>
        </div>
    }
}

/// 按角色加载队伍，没有队伍时显示创建/加入表单
#[component]
fn TeamHome() -> impl IntoView {
    let ctx = use_app();
    let role = RwSignal::new(None::<Role>);
    let team = RwSignal::new(None::<Team>);
    let loading = RwSignal::new(true);

    let load_team = move || {
        let Some(user_id) = ctx.user_id.get_untracked() else {
            return;
        };
        loading.set(true);
        spawn_local(async move {
            let api = ctx.api();
            let user_role = match api.users().get_user(&user_id).await {
                Ok(user) => user.role,
                Err(e) => {
                    ctx.notify_error(format!("Failed to load profile: {}", e));
                    None
                }
            };
            role.set(user_role);

            let found = match user_role {
                Some(Role::Coach) => Some(api.teams().get_team_by_coach(&user_id).await),
                Some(Role::Athlete) => Some(api.teams().get_team_by_athlete(&user_id).await),
                None => None,
            };
            match found {
                Some(Ok(t)) => team.set(Some(t)),
                // 后端以 `error` 表示尚未加入或创建队伍
                Some(Err(e)) if e.is_backend() => team.set(None),
                Some(Err(e)) => {
                    team.set(None);
                    ctx.notify_error(format!("Failed to load team: {}", e));
                }
                None => team.set(None),
            }
            loading.set(false);
        });
    };

    Effect::new(move |_| {
        ctx.user_id.track();
        load_team();
    });
    let reload = Callback::new(move |_: ()| load_team());

    move || match (loading.get(), role.get(), team.get()) {
        (true, _, _) => view! {
            <div class="flex justify-center py-16">
                <span class="loading loading-spinner loading-lg text-primary"></span>
            </div>
        }
        .into_any(),
        (false, None, _) => view! {
            <div role="alert" class="alert alert-info">
                <span>"Tell us whether you coach or run before joining a team."</span>
                <Link to=AppRoute::Profile class="btn btn-sm">"Open profile"</Link>
            </div>
        }
        .into_any(),
        (false, Some(role), None) => view! { <TeamSetup role=role on_done=reload /> }.into_any(),
        (false, Some(role), Some(team)) => {
            view! { <TeamDay role=role team=team on_changed=reload /> }.into_any()
        }
    }
}

#[component]
fn TeamSetup(role: Role, on_done: Callback<()>) -> impl IntoView {
    let ctx = use_app();
    let title = RwSignal::new(String::new());
    let pass_key = RwSignal::new(String::new());
    let submitting = RwSignal::new(false);
    let is_coach = role == Role::Coach;

    let on_submit = move |ev: leptos::web_sys::SubmitEvent| {
        ev.prevent_default();
        let (Some(user_id), name, key) = (
            ctx.user_id.get_untracked(),
            title.get_untracked(),
            pass_key.get_untracked(),
        ) else {
            return;
        };
        if name.trim().is_empty() || key.is_empty() {
            ctx.notify_error("Team name and pass key are required");
            return;
        }

        submitting.set(true);
        spawn_local(async move {
            let api = ctx.api();
            let res = if is_coach {
                api.teams().create_team(&user_id, name.trim(), &key).await.map(|_| ())
            } else {
                api.teams().join_team(&user_id, name.trim(), &key).await
            };
            match res {
                Ok(()) => {
                    ctx.notify_success(if is_coach { "Team created" } else { "Joined team" });
                    on_done.run(());
                }
                Err(e) => ctx.notify_error(e.to_string()),
            }
            submitting.set(false);
        });
    };

    view! {
        <div class="card bg-base-100 shadow-xl max-w-md mx-auto">
            <form class="card-body" on:submit=on_submit>
                <h2 class="card-title">
                    {if is_coach { "Create your team" } else { "Join your team" }}
                </h2>
                <input class="input input-bordered" placeholder="Team name" bind:value=title />
                <input
                    class="input input-bordered"
                    type="password"
                    placeholder="Pass key"
                    bind:value=pass_key
                />
                <button class="btn btn-primary" disabled=move || submitting.get()>
                    {if is_coach { "Create team" } else { "Join team" }}
                </button>
            </form>
        </div>
    }
}

/// 队伍某一天的日程
#[component]
fn TeamDay(role: Role, team: Team, on_changed: Callback<()>) -> impl IntoView {
    let ctx = use_app();
    let is_coach = role == Role::Coach;
    let team_id = StoredValue::new(team.id.clone());
    let team_title = StoredValue::new(team.title.clone());

    let date_text = RwSignal::new(Local::now().date_naive().format("%Y-%m-%d").to_string());
    let date = Memo::new(move |_| NaiveDate::parse_from_str(&date_text.get(), "%Y-%m-%d").ok());
    let events = RwSignal::new(Vec::<Event>::new());
    let loading = RwSignal::new(false);

    let load_events = move || {
        let Some(day) = date.get_untracked() else {
            events.set(Vec::new());
            return;
        };
        loading.set(true);
        spawn_local(async move {
            let api = ctx.api();
            let res = api
                .calendar()
                .get_events_by_date(&team_id.get_value(), day.day(), day.month(), day.year())
                .await;
            match res {
                Ok(list) => events.set(list),
                Err(e) => {
                    events.set(Vec::new());
                    ctx.notify_error(format!("Failed to load events: {}", e));
                }
            }
            loading.set(false);
        });
    };
    Effect::new(move |_| {
        date.track();
        load_events();
    });
    let reload_events = Callback::new(move |_: ()| load_events());

    let delete_event = move |event_id: String| {
        spawn_local(async move {
            let api = ctx.api();
            let coach = ctx.user_id.get_untracked();
            match api.calendar().delete_event(&event_id, coach.as_deref()).await {
                Ok(()) => {
                    ctx.notify_success("Event deleted");
                    load_events();
                }
                Err(e) => ctx.notify_error(e.to_string()),
            }
        });
    };

    let leave_or_delete = move |_| {
        let Some(user_id) = ctx.user_id.get_untracked() else {
            return;
        };
        let title = team_title.get_value();
        spawn_local(async move {
            let api = ctx.api();
            let res = if is_coach {
                api.teams().delete_team(&user_id, &title).await
            } else {
                api.teams().leave_team(&user_id, &title).await
            };
            match res {
                Ok(()) => {
                    ctx.notify_success(if is_coach { "Team deleted" } else { "Left team" });
                    on_changed.run(());
                }
                Err(e) => ctx.notify_error(e.to_string()),
            }
        });
    };

    let athlete_count = team.athletes.len();

    view! {
        <div class="space-y-6">
            <div class="flex flex-wrap items-center justify-between gap-4">
                <div>
                    <h2 class="text-2xl font-bold">{team.title.clone()}</h2>
                    <p class="text-base-content/70 text-sm">{format!("{} athletes", athlete_count)}</p>
                </div>
                <div class="flex items-center gap-2">
                    <input type="date" class="input input-bordered" bind:value=date_text />
                    <button class="btn btn-outline btn-error btn-sm" on:click=leave_or_delete>
                        {if is_coach { "Delete team" } else { "Leave team" }}
                    </button>
                </div>
            </div>

            <div class="card bg-base-100 shadow-xl">
                <div class="card-body">
                    <h3 class="card-title">"Schedule"</h3>
                    <Show when=move || loading.get()>
                        <span class="loading loading-dots"></span>
                    </Show>
                    <Show when=move || !loading.get() && events.with(Vec::is_empty)>
                        <p class="text-base-content/50">"Nothing planned for this day."</p>
                    </Show>
                    <ul class="divide-y divide-base-200">
                        {move || {
                            events
                                .get()
                                .into_iter()
                                .map(|event| {
                                    let id = event.id.clone();
                                    view! {
                                        <li class="py-3 flex items-start justify-between gap-4">
                                            <div>
                                                <p class="font-semibold">{event.title.clone()}</p>
                                                <p class="text-sm text-base-content/70">
                                                    {format!(
                                                        "{} to {} at {}",
                                                        local_time(&event.start_time),
                                                        local_time(&event.end_time),
                                                        event.location,
                                                    )}
                                                </p>
                                                {event.description.clone().map(|d| view! { <p class="text-sm">{d}</p> })}
                                                {event.link.clone().map(|l| view! {
                                                    <a class="link link-primary text-sm" href=l.clone() target="_blank">{l}</a>
                                                })}
                                            </div>
                                            <Show when=move || is_coach>
                                                <button
                                                    class="btn btn-ghost btn-xs text-error"
                                                    on:click={
                                                        let id = id.clone();
                                                        move |_| delete_event(id.clone())
                                                    }
                                                >
                                                    "Delete"
                                                </button>
                                            </Show>
                                        </li>
                                    }
                                })
                                .collect_view()
                        }}
                    </ul>
                </div>
            </div>

            <Show when=move || is_coach>
                <div class="grid gap-6 md:grid-cols-2">
                    <NewEventForm team_id=team_id date=date on_created=reload_events />
                    <NotifyTeamForm events=events />
                </div>
            </Show>
        </div>
    }
}

#[component]
fn NewEventForm(
    team_id: StoredValue<String>,
    date: Memo<Option<NaiveDate>>,
    on_created: Callback<()>,
) -> impl IntoView {
    let ctx = use_app();
    let title = RwSignal::new(String::new());
    let location = RwSignal::new(String::new());
    let start = RwSignal::new("07:00".to_string());
    let end = RwSignal::new("08:00".to_string());
    let description = RwSignal::new(String::new());
    let link = RwSignal::new(String::new());

    let on_submit = move |ev: leptos::web_sys::SubmitEvent| {
        ev.prevent_default();
        let Some(day) = date.get_untracked() else {
            ctx.notify_error("Pick a date first");
            return;
        };
        let (Some(start_time), Some(end_time)) = (
            local_instant(day, &start.get_untracked()),
            local_instant(day, &end.get_untracked()),
        ) else {
            ctx.notify_error("Start and end must be valid times");
            return;
        };
        if end_time <= start_time {
            ctx.notify_error("End time must be after start time");
            return;
        }

        let event = NewEvent {
            team_id: team_id.get_value(),
            title: title.get_untracked(),
            location: location.get_untracked(),
            start_time: start_time.into(),
            end_time: end_time.into(),
            description: Some(description.get_untracked()),
            link: Some(link.get_untracked()),
            coach_id: ctx.user_id.get_untracked(),
        };
        spawn_local(async move {
            let api = ctx.api();
            match api.calendar().create_event(event).await {
                Ok(_) => {
                    ctx.notify_success("Event created");
                    title.set(String::new());
                    description.set(String::new());
                    link.set(String::new());
                    on_created.run(());
                }
                Err(e) => ctx.notify_error(e.to_string()),
            }
        });
    };

    view! {
        <div class="card bg-base-100 shadow-xl">
            <form class="card-body gap-3" on:submit=on_submit>
                <h3 class="card-title">"New session"</h3>
                <input class="input input-bordered" placeholder="Title" bind:value=title required />
                <input class="input input-bordered" placeholder="Location" bind:value=location />
                <div class="flex gap-2">
                    <input type="time" class="input input-bordered flex-1" bind:value=start />
                    <input type="time" class="input input-bordered flex-1" bind:value=end />
                </div>
                <textarea class="textarea textarea-bordered" placeholder="Description" bind:value=description></textarea>
                <input class="input input-bordered" placeholder="Link (optional)" bind:value=link />
                <button class="btn btn-primary">"Add to calendar"</button>
            </form>
        </div>
    }
}

#[component]
fn NotifyTeamForm(events: RwSignal<Vec<Event>>) -> impl IntoView {
    let ctx = use_app();
    let message = RwSignal::new(String::new());
    let sending = RwSignal::new(false);

    let on_send = move |_| send_notification(ctx, events, message, sending);

    view! {
        <div class="card bg-base-100 shadow-xl">
            <div class="card-body gap-3">
                <h3 class="card-title">"Notify team"</h3>
                <p class="text-sm text-base-content/70">
                    "Emails every athlete the sessions shown for this day."
                </p>
                <textarea
                    class="textarea textarea-bordered"
                    placeholder="Additional message"
                    bind:value=message
                ></textarea>
                <button class="btn btn-secondary" disabled=move || sending.get() on:click=on_send>
                    "Send now"
                </button>
            </div>
        </div>
    }
}

fn send_notification(
    ctx: AppContext,
    events: RwSignal<Vec<Event>>,
    message: RwSignal<String>,
    sending: RwSignal<bool>,
) {
    let Some(sender_id) = ctx.user_id.get_untracked() else {
        return;
    };
    let event_ids: Vec<String> = events.with_untracked(|list| {
        list.iter()
            .map(|e| e.id.clone())
            .filter(|id| !id.is_empty())
            .collect()
    });
    if event_ids.is_empty() {
        ctx.notify_info("No sessions to announce for this day");
        return;
    }

    sending.set(true);
    spawn_local(async move {
        let api = ctx.api();
        let notification = TeamNotification {
            sender_id,
            event_ids,
            additional_message: message.get_untracked(),
            scheduled_at: None,
        };
        match api.notifications().send_notification_to_team(notification).await {
            Ok(receipt) if receipt.ok => {
                ctx.notify_success("Team notified");
                message.set(String::new());
            }
            Ok(_) => ctx.notify_error("Notification was not accepted"),
            Err(e) => ctx.notify_error(e.to_string()),
        }
        sending.set(false);
    });
}
