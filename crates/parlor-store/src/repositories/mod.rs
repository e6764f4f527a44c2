//! Stateless per-table repositories. Every method takes `&Connection`, so
//! callers decide whether operations share a transaction.

pub mod message;
pub mod push_token;

pub use message::MessageRepo;
pub use push_token::PushTokenRepo;
