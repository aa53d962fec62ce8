pub mod builder;
pub mod chat;
pub mod preview;
