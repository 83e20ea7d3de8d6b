//! Core domain + application logic for tweetcord.
//!
//! This crate is intentionally framework-agnostic. Discord and Twitter live
//! behind ports (traits) implemented in adapter crates.

pub mod commands;
pub mod config;
pub mod context;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod ports;
pub mod poller;
pub mod seen;
pub mod store;

pub use errors::{Error, Result};
