use leptos::ev;
use leptos::prelude::*;

use crate::models::{Artifact, DisplayMessage};
use crate::state::AppState;

/// Left-hand pane: conversation, streaming reply, and follow-up input.
#[component]
pub fn ChatPane() -> impl IntoView {
    let state = expect_context::<AppState>();

    view! {
        <section class="chat-pane">
            // Error banner
            {move || {
                state.error.get().map(|err| {
                    view! {
                        <div class="error-banner">{err}</div>
                    }
                })
            }}

            <div class="messages">
                <For
                    each=move || state.messages.get()
                    key=|m| (m.key, m.failed)
                    let:msg
                >
                    <MessageBubble msg=msg />
                </For>
                // Reply being streamed
                {move || state.draft.get().map(|msg| view! { <MessageBubble msg=msg /> })}
            </div>

            <ChatInput />
        </section>
    }
}

/// A single message, with buttons for the artifacts it contains.
#[component]
fn MessageBubble(msg: DisplayMessage) -> impl IntoView {
    let state = expect_context::<AppState>();
    let css_class = match (msg.is_user(), msg.failed) {
        (true, _) => "message user",
        (false, false) => "message assistant",
        (false, true) => "message assistant failed",
    };
    let buttons = msg
        .artifacts
        .into_iter()
        .map(|artifact: Artifact| {
            let title = artifact.title.clone();
            view! {
                <button class="artifact-btn" on:click=move |_| state.pick_artifact(artifact.clone())>
                    {title}
                </button>
            }
        })
        .collect_view();

    view! {
        <div class=css_class>
            <div>{msg.content}</div>
            <div>{buttons}</div>
        </div>
    }
}

/// Follow-up input; disabled while a reply is in progress.
#[component]
fn ChatInput() -> impl IntoView {
    let state = expect_context::<AppState>();
    let (input, set_input) = signal(String::new());

    let is_busy = move || state.request_state.get().is_busy();

    let send = move || {
        let text = input.get().trim().to_string();
        if text.is_empty() || is_busy() {
            return;
        }
        set_input.set(String::new());
        state.send_message(text);
    };

    let on_keydown = move |ev: ev::KeyboardEvent| {
        if ev.key() == "Enter" {
            ev.prevent_default();
            send();
        }
    };

    view! {
        <div class="input-row">
            <input
                type="text"
                placeholder="Ask for changes…"
                prop:value=input
                on:input=move |ev| set_input.set(event_target_value(&ev))
                on:keydown=on_keydown
                disabled=is_busy
            />
            <button
                on:click=move |_| send()
                disabled=move || is_busy() || input.get().trim().is_empty()
            >
                {move || if is_busy() { "Generating…" } else { "Send" }}
            </button>
        </div>
    }
}
