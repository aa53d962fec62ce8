mod api;
mod components;
mod models;
mod selection;
mod state;
mod ws;

use leptos::mount::mount_to_body;
use leptos::prelude::*;

use components::builder::Builder;
use components::chat::ChatPane;
use components::preview::PreviewPane;
use state::AppState;

/// Root application component; `/emails/{public_id}` opens a chat, anything
/// else shows the builder.
#[component]
fn App() -> impl IntoView {
    let path = web_sys::window()
        .and_then(|w| w.location().pathname().ok())
        .unwrap_or_default();

    match chat_id_from_path(&path) {
        Some(public_id) => {
            let state = AppState::provide();
            state.load_chat(public_id.to_string());
            view! {
                <div class="workspace">
                    <ChatPane />
                    <PreviewPane />
                </div>
            }
            .into_any()
        }
        None => view! { <Builder /> }.into_any(),
    }
}

fn chat_id_from_path(path: &str) -> Option<&str> {
    path.strip_prefix("/emails/")
        .map(|rest| rest.trim_end_matches('/'))
        .filter(|id| !id.is_empty())
}

fn main() {
    console_log::init_with_level(log::Level::Debug).expect("Failed to init logger");
    mount_to_body(App);
}

#[cfg(test)]
mod tests {
    use super::chat_id_from_path;

    #[test]
    fn routes_email_paths_to_chats() {
        assert_eq!(chat_id_from_path("/emails/abc-123"), Some("abc-123"));
        assert_eq!(chat_id_from_path("/emails/abc-123/"), Some("abc-123"));
        assert_eq!(chat_id_from_path("/emails/"), None);
        assert_eq!(chat_id_from_path("/"), None);
    }
}
