//! HTTP transport and the connected client.

pub mod client;
pub(crate) mod http;

pub use client::Client;
