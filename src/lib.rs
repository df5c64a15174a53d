//! Forum monitor library.
//!
//! A service that polls forum RSS/Atom feeds and individual discussion
//! pages, stores newly seen threads and comments in SQLite, and pushes a
//! notification for each new item that passes the configured filter chain.

pub mod ai;
pub mod config;
pub mod constants;
pub mod db;
pub mod filter;
pub mod forum;
pub mod message;
pub mod monitor;
pub mod notify;
