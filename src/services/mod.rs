// src/services/mod.rs
pub mod account;
pub mod api;
pub mod chat;
pub mod config;
pub mod documents;
pub(crate) mod paths;
pub mod prompts;
pub mod search;
pub mod upload;
