// src/roomcouncil/mod.rs

pub mod agent;
pub mod client_wrapper;
pub mod clients;
pub mod config;
pub mod event;
pub mod pipeline;
pub mod prompts;
#[cfg(feature = "server")]
pub mod server;
