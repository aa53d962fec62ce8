pub mod chat_service;
pub mod turn_guard;
