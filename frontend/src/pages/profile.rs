use leptos::prelude::*;
use leptos::task::spawn_local;
use trainlog_shared::{Gender, Role, User};

use crate::auth::{AppContext, sign_out, use_app};

fn parse_role(value: &str) -> Option<Role> {
    match value {
        "coach" => Some(Role::Coach),
        "athlete" => Some(Role::Athlete),
        _ => None,
    }
}

fn parse_gender(value: &str) -> Option<Gender> {
    match value {
        "male" => Some(Gender::Male),
        "female" => Some(Gender::Female),
        _ => None,
    }
}

/// 个人资料的一次修改
#[derive(Clone, Copy)]
enum ProfileEdit {
    Mileage(f64),
    Role(Role),
    Gender(Gender),
}

fn save(ctx: AppContext, edit: ProfileEdit, user: RwSignal<Option<User>>) {
    let Some(user_id) = ctx.user_id.get_untracked() else {
        return;
    };
    spawn_local(async move {
        let api = ctx.api();
        let users = api.users();
        let res = match edit {
            ProfileEdit::Mileage(m) => users.edit_user_mileage(&user_id, m).await,
            ProfileEdit::Role(r) => users.edit_user_role(&user_id, r).await,
            ProfileEdit::Gender(g) => users.edit_user_gender(&user_id, g).await,
        };
        match res {
            Ok(()) => {
                user.update(|u| {
                    if let Some(u) = u {
                        match edit {
                            ProfileEdit::Mileage(m) => u.weekly_mileage = Some(m),
                            ProfileEdit::Role(r) => u.role = Some(r),
                            ProfileEdit::Gender(g) => u.gender = Some(g),
                        }
                    }
                });
                ctx.notify_success("Profile updated");
            }
            Err(e) => ctx.notify_error(e.to_string()),
        }
    });
}

#[component]
pub fn ProfilePage() -> impl IntoView {
    let ctx = use_app();
    let user = RwSignal::new(None::<User>);
    let mileage = RwSignal::new(String::new());

    Effect::new(move |_| {
        let Some(user_id) = ctx.user_id.get() else {
            return;
        };
        spawn_local(async move {
            let api = ctx.api();
            match api.users().get_user(&user_id).await {
                Ok(u) => {
                    mileage.set(u.weekly_mileage.map(|m| m.to_string()).unwrap_or_default());
                    user.set(Some(u));
                }
                Err(e) => ctx.notify_error(format!("Failed to load profile: {}", e)),
            }
        });
    });

    let on_save_mileage = move |_| match mileage.get_untracked().trim().parse::<f64>() {
        Ok(m) if m.is_finite() && m >= 0.0 => save(ctx, ProfileEdit::Mileage(m), user),
        _ => ctx.notify_error("Weekly mileage must be a non-negative number"),
    };
    let on_role = move |ev| {
        if let Some(role) = parse_role(&event_target_value(&ev)) {
            save(ctx, ProfileEdit::Role(role), user);
        }
    };
    let on_gender = move |ev| {
        if let Some(gender) = parse_gender(&event_target_value(&ev)) {
            save(ctx, ProfileEdit::Gender(gender), user);
        }
    };

    let role_value = move || user.with(|u| u.as_ref().and_then(|u| u.role).map(|r| r.as_str()).unwrap_or(""));
    let gender_value =
        move || user.with(|u| u.as_ref().and_then(|u| u.gender).map(|g| g.as_str()).unwrap_or(""));

    view! {
        <div class="card bg-base-100 shadow-xl max-w-lg mx-auto">
            <div class="card-body gap-4">
                <h2 class="card-title">"Profile"</h2>
                <Show
                    when=move || user.with(Option::is_some)
                    fallback=|| view! { <span class="loading loading-spinner"></span> }
                >
                    <p class="text-base-content/70">
                        {move || user.with(|u| {
                            u.as_ref()
                                .map(|u| {
                                    let name = u.name.clone().unwrap_or_else(|| "Unnamed".to_string());
                                    match &u.email {
                                        Some(email) => format!("{} ({})", name, email),
                                        None => name,
                                    }
                                })
                                .unwrap_or_default()
                        })}
                    </p>
                </Show>

                <label class="form-control">
                    <span class="label-text">"Role"</span>
                    <select class="select select-bordered" prop:value=role_value on:change=on_role>
                        <option value="" disabled>"Choose a role"</option>
                        <option value="coach">"Coach"</option>
                        <option value="athlete">"Athlete"</option>
                    </select>
                </label>

                <label class="form-control">
                    <span class="label-text">"Gender"</span>
                    <select class="select select-bordered" prop:value=gender_value on:change=on_gender>
                        <option value="" disabled>"Choose"</option>
                        <option value="male">"Male"</option>
                        <option value="female">"Female"</option>
                    </select>
                </label>

                <label class="form-control">
                    <span class="label-text">"Weekly mileage"</span>
                    <div class="join">
                        <input class="input input-bordered join-item flex-1" inputmode="decimal" bind:value=mileage />
                        <button class="btn btn-primary join-item" on:click=on_save_mileage>"Save"</button>
                    </div>
                </label>

                <div class="card-actions justify-end">
                    <button class="btn btn-outline btn-error" on:click=move |_| sign_out(ctx)>
                        "Sign out"
                    </button>
                </div>
            </div>
        </div>
    }
}
