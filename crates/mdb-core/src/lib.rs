//! Core domain + application logic for the marketplace directory bot.
//!
//! This crate is framework-agnostic. Telegram lives behind the messaging
//! port (a trait) implemented in the adapter crate.

pub mod actions;
pub mod app;
pub mod audit;
pub mod catalog;
pub mod config;
pub mod conversation;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod messaging;
pub mod moderation;
pub mod security;
pub mod storage;
#[cfg(test)]
mod testing;
pub mod views;

pub use errors::{Error, Result};
