pub mod analysis;
pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
pub mod milestone;
pub mod response;
pub mod server;
pub mod stats;
pub mod store;
pub mod tools;
