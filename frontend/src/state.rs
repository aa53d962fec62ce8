use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::api;
use crate::models::{
    fail_turn, turn_history, Artifact, ChatView, DisplayMessage, RequestState, WsChatRequest,
};
use crate::selection::ArtifactSelection;
use crate::ws::{self, TurnCallbacks};

/// Which view the right-hand pane shows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Tab {
    #[default]
    Preview,
    Code,
}

/// Shared state of the email workspace, provided via Leptos context.
#[derive(Clone, Copy)]
pub struct AppState {
    // --- Read signals (for components to subscribe to) ---
    pub chat_id: ReadSignal<Option<i64>>,
    pub messages: ReadSignal<Vec<DisplayMessage>>,
    pub draft: ReadSignal<Option<DisplayMessage>>,
    pub request_state: ReadSignal<RequestState>,
    pub selection: ReadSignal<ArtifactSelection>,
    pub tab: ReadSignal<Tab>,
    pub error: ReadSignal<Option<String>>,

    // --- Write signals (for mutating state) ---
    pub set_chat_id: WriteSignal<Option<i64>>,
    pub set_messages: WriteSignal<Vec<DisplayMessage>>,
    pub set_draft: WriteSignal<Option<DisplayMessage>>,
    pub set_request_state: WriteSignal<RequestState>,
    pub set_selection: WriteSignal<ArtifactSelection>,
    pub set_tab: WriteSignal<Tab>,
    pub set_error: WriteSignal<Option<String>>,
}

impl AppState {
    /// Create a new `AppState` and provide it in the current Leptos context.
    pub fn provide() -> Self {
        let (chat_id, set_chat_id) = signal(None::<i64>);
        let (messages, set_messages) = signal(Vec::<DisplayMessage>::new());
        let (draft, set_draft) = signal(None::<DisplayMessage>);
        let (request_state, set_request_state) = signal(RequestState::Idle);
        let (selection, set_selection) = signal(ArtifactSelection::default());
        let (tab, set_tab) = signal(Tab::default());
        let (error, set_error) = signal(None::<String>);

        let state = Self {
            chat_id,
            messages,
            draft,
            request_state,
            selection,
            tab,
            error,
            set_chat_id,
            set_messages,
            set_draft,
            set_request_state,
            set_selection,
            set_tab,
            set_error,
        };

        provide_context(state);
        state
    }

    /// Load a chat by public id. A chat holding only the opening prompt gets
    /// its first reply requested straight away.
    pub fn load_chat(&self, public_id: String) {
        let state = *self;
        spawn_local(async move {
            match api::fetch_chat(&public_id).await {
                Ok(chat) => state.show_chat(chat),
                Err(e) => {
                    log::error!("Failed to fetch chat {public_id}: {e}");
                    state.set_error.set(Some(e));
                }
            }
        });
    }

    fn show_chat(&self, chat: ChatView) {
        let messages: Vec<DisplayMessage> = chat
            .messages
            .into_iter()
            .enumerate()
            .map(|(key, view)| DisplayMessage {
                artifacts: view.artifacts,
                ..DisplayMessage::new(key, &view.role, view.content)
            })
            .collect();

        if let Some(last_reply) = messages.iter().rev().find(|m| !m.is_user()) {
            let artifacts = last_reply.artifacts.clone();
            self.set_selection.update(|s| s.observe(&artifacts));
        }

        let awaiting_first_reply = messages.len() == 1 && messages[0].is_user();
        self.set_chat_id.set(Some(chat.chat_id));
        self.set_messages.set(messages);

        // The opening prompt was stored with the chat, so a failed first
        // reply leaves it in place.
        if awaiting_first_reply {
            self.start_turn(None);
        }
    }

    /// Append a user message and stream the reply. Ignored unless idle.
    pub fn send_message(&self, text: String) {
        if self.request_state.get_untracked().is_busy() {
            log::warn!("Ignoring send while a reply is in progress");
            return;
        }
        let key = self.next_key();
        self.set_messages
            .update(|msgs| msgs.push(DisplayMessage::new(key, "user", text)));
        self.start_turn(Some(key));
    }

    /// User picked an artifact; it stays selected for the rest of the turn.
    pub fn pick_artifact(&self, artifact: Artifact) {
        self.set_selection.update(|s| s.pick(artifact));
        self.set_tab.set(Tab::Code);
    }

    fn next_key(&self) -> usize {
        self.messages
            .with_untracked(|msgs| msgs.last().map_or(0, |m| m.key + 1))
    }

    /// `user_key` is the message this turn submits, when the UI appended it.
    fn start_turn(&self, user_key: Option<usize>) {
        let Some(chat_id) = self.chat_id.get_untracked() else {
            return;
        };
        let Some(sending) = self.request_state.get_untracked().begin_send() else {
            return;
        };
        self.set_request_state.set(sending);
        self.set_error.set(None);
        self.set_selection.update(|s| s.release());

        let history = self.messages.with_untracked(|msgs| turn_history(msgs));
        self.set_draft
            .set(Some(DisplayMessage::new(self.next_key(), "assistant", String::new())));

        let set_request_state = self.set_request_state;
        let set_draft = self.set_draft;
        let set_selection = self.set_selection;
        let set_messages = self.set_messages;
        let set_error = self.set_error;
        let draft = self.draft;

        // Callbacks to update state from WebSocket events
        let on_start = move || {
            set_request_state.update(|s| match s.begin_streaming() {
                Some(next) => *s = next,
                None => log::warn!("Stream started with no turn in progress"),
            });
        };

        let on_chunk = move |chunk: String| {
            set_draft.update(|current| {
                if let Some(msg) = current {
                    msg.content.push_str(&chunk);
                }
            });
        };

        let on_artifact = move |index: usize, artifact: Artifact| {
            set_draft.update(|current| {
                if let Some(msg) = current {
                    if index == msg.artifacts.len() {
                        msg.artifacts.push(artifact);
                    }
                }
            });
            let artifacts = draft.with_untracked(|d| {
                d.as_ref().map(|m| m.artifacts.clone()).unwrap_or_default()
            });
            set_selection.update(|s| s.observe(&artifacts));
        };

        let on_end = move |full_content: String| {
            if let Some(mut reply) = draft.get_untracked() {
                reply.content = full_content;
                set_messages.update(|msgs| msgs.push(reply));
            }
            set_draft.set(None);
            set_request_state.update(|s| *s = s.finish());
        };

        let on_error = move |err: String| {
            log::error!("Turn failed: {err}");
            let partial = draft.get_untracked();
            set_messages.update(|msgs| fail_turn(msgs, user_key, partial));
            set_draft.set(None);
            set_error.set(Some(err));
            set_request_state.update(|s| *s = s.finish());
        };

        ws::start_turn(
            WsChatRequest { chat_id, history },
            TurnCallbacks {
                on_start,
                on_chunk,
                on_artifact,
                on_end,
                on_error,
            },
        );
    }
}
