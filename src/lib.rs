//! # DingTalk Client Library
//!
//! Authenticates against the DingTalk open API, keeps the access token and
//! JS-API ticket cached until they expire, and dispatches calls over the two
//! dialects of the platform (JSON/REST and the legacy signed-form RPC) behind
//! one response contract.
//!
//! Modules:
//! - `cache`: credential record and cache backends (file, memory)
//! - `auth`: access-token and JS-API ticket managers
//! - `transport`: request descriptors, dispatcher, response contract
//! - `api`: resource operations built on the dispatcher
//! - `config`: YAML configuration
//! - `server`: HTTP endpoints of the `serve` command

pub mod api;
pub mod auth;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod helpers;
pub mod observability;
pub mod server;
pub mod transport;
pub mod utils;

#[cfg(test)]
mod tests;

pub use crate::client::DingTalkClient;
pub use crate::error::{Error, RemoteError, Result};
