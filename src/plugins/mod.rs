// src/plugins/mod.rs
pub mod auth;
