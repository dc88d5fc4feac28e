//! Fault-tolerant HA context above a single remote node client: request id
//! assignment, inflight/seen bookkeeping, connection error detection, and
//! reconnect-with-replay across cluster peers.

pub mod config;
pub mod context;
pub mod inflight;
pub mod seen_ring;

pub use config::HaConfig;
pub use context::HaContext;
pub use inflight::{HaRequestHandle, InflightTable};
pub use seen_ring::SeenRing;
