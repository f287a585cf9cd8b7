//! HTTP service answering questions about Indian indigenous cow breeds via
//! a generative model, with in-memory multi-turn chat sessions.

pub mod config;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;

pub use startup::AppState;
