use gloo_timers::future::TimeoutFuture;
use leptos::prelude::*;
use leptos::task::spawn_local;
use wasm_bindgen_futures::JsFuture;

use crate::state::{AppState, Tab};

/// Right-hand pane: the selected artifact as a rendered preview or as code.
#[component]
pub fn PreviewPane() -> impl IntoView {
    let state = expect_context::<AppState>();

    let tab_button = move |tab: Tab, label: &'static str| {
        view! {
            <button
                class=move || if state.tab.get() == tab { "active" } else { "" }
                on:click=move |_| state.set_tab.set(tab)
            >
                {label}
            </button>
        }
    };

    view! {
        <section class="preview-pane">
            <div class="tabs">
                {tab_button(Tab::Preview, "Preview")}
                {tab_button(Tab::Code, "Code")}
            </div>
            <div class="tab-body">
                {move || {
                    let selection = state.selection.get();
                    let Some(artifact) = selection.current().cloned() else {
                        return view! { <p>"Nothing generated yet."</p> }.into_any();
                    };
                    match state.tab.get() {
                        Tab::Code => view! {
                            <h3>{artifact.title.clone()}</h3>
                            <CopyButton content=artifact.content.clone() />
                            <pre>
                                <code class=format!("language-{}", artifact.language)>
                                    {artifact.content.clone()}
                                </code>
                            </pre>
                        }
                        .into_any(),
                        Tab::Preview if artifact.language == "html" => view! {
                            <iframe title=artifact.title.clone() srcdoc=artifact.content.clone() />
                        }
                        .into_any(),
                        Tab::Preview => view! {
                            <p>{format!("No preview for {} yet; see the Code tab.", artifact.language)}</p>
                        }
                        .into_any(),
                    }
                }}
            </div>
        </section>
    }
}

/// How long the "Copied!" confirmation stays up.
const COPIED_FEEDBACK_MS: u32 = 2_000;

fn copy_label(copied: bool) -> &'static str {
    if copied { "Copied!" } else { "Copy" }
}

/// Copies the artifact's code to the clipboard and confirms briefly.
#[component]
fn CopyButton(content: String) -> impl IntoView {
    let (copied, set_copied) = signal(false);

    let on_click = move |_| {
        let Some(window) = web_sys::window() else {
            return;
        };
        let write = window.navigator().clipboard().write_text(&content);
        spawn_local(async move {
            if let Err(e) = JsFuture::from(write).await {
                log::error!("Clipboard write failed: {e:?}");
                return;
            }
            set_copied.set(true);
            TimeoutFuture::new(COPIED_FEEDBACK_MS).await;
            set_copied.set(false);
        });
    };

    view! {
        <button class="copy-btn" on:click=on_click>
            {move || copy_label(copied.get())}
        </button>
    }
}
