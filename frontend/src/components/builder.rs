use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::api;

/// Landing page: describe an email and open a new chat for it.
#[component]
pub fn Builder() -> impl IntoView {
    let (prompt, set_prompt) = signal(String::new());
    let (is_creating, set_is_creating) = signal(false);
    let (error, set_error) = signal(None::<String>);

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let text = prompt.get().trim().to_string();
        if text.is_empty() || is_creating.get() {
            return;
        }
        set_is_creating.set(true);
        set_error.set(None);

        spawn_local(async move {
            match api::create_chat(&text).await {
                Ok(created) => open_chat(&created.public_id),
                Err(e) => {
                    log::error!("Failed to create chat: {e}");
                    set_error.set(Some(e));
                    set_is_creating.set(false);
                }
            }
        });
    };

    view! {
        <main class="builder">
            <h1>"v1.email"</h1>
            <p>"Describe the email you want to build."</p>
            {move || error.get().map(|err| view! { <div class="error-banner">{err}</div> })}
            <form on:submit=on_submit>
                <input
                    type="text"
                    placeholder="A welcome email for new subscribers…"
                    prop:value=prompt
                    on:input=move |ev| set_prompt.set(event_target_value(&ev))
                    disabled=move || is_creating.get()
                />
                <button
                    type="submit"
                    disabled=move || is_creating.get() || prompt.get().trim().is_empty()
                >
                    {move || if is_creating.get() { "Creating…" } else { "Build Email" }}
                </button>
            </form>
        </main>
    }
}

fn open_chat(public_id: &str) {
    if let Some(window) = web_sys::window() {
        let _ = window.location().set_href(&format!("/emails/{public_id}"));
    }
}
