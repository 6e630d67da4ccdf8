//! Clients for services outside the process: HTTP, OAuth providers and
//! object storage.

pub mod client;
pub mod oauth;
pub mod storage;
