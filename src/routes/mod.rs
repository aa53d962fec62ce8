pub mod api_routes;
pub mod ws_routes;

use axum::http::HeaderMap;
use tracing::warn;
use uuid::Uuid;

use crate::models::Actor;
use crate::service::chat_service::ChatService;

/// Shared router state.
#[derive(Clone)]
pub struct AppState {
    pub chat: ChatService,
    pub identity: IdentityHeader,
}

/// Reads the user id the upstream auth proxy asserts in a request header.
#[derive(Clone, Debug)]
pub struct IdentityHeader {
    name: String,
}

impl IdentityHeader {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// `None` when the header is absent or not a UUID.
    pub fn actor(&self, headers: &HeaderMap) -> Option<Actor> {
        let raw = headers.get(self.name.as_str())?.to_str().ok()?;
        match Uuid::parse_str(raw.trim()) {
            Ok(user_id) => Some(Actor { user_id }),
            Err(e) => {
                warn!("Ignoring malformed {} header: {e}", self.name);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn actor_comes_from_configured_header() {
        let identity = IdentityHeader::new("x-user-id");
        let user_id = Uuid::new_v4();

        let mut headers = HeaderMap::new();
        assert_eq!(identity.actor(&headers), None);

        headers.insert("x-user-id", HeaderValue::from_static("not-a-uuid"));
        assert_eq!(identity.actor(&headers), None);

        headers.insert("x-user-id", HeaderValue::from_str(&user_id.to_string()).unwrap());
        assert_eq!(identity.actor(&headers), Some(Actor { user_id }));
    }
}
