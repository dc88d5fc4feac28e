//! Pipelining client for a single remote volume node connection: one DEALER
//! socket, one dedicated worker task, many concurrently outstanding
//! requests correlated by tag.

pub mod client;
pub mod config;
pub mod tag;
pub mod worker;

pub use client::RemoteNodeClient;
pub use config::ClientConfig;
pub use tag::TagAllocator;
