//! Resilient outbound calls to the external parameter service
//!
//! A per-endpoint circuit breaker converts repeated upstream failures into
//! fast local rejection; nothing in this module retries.

pub mod breaker;
pub mod client;
pub mod error;

pub use breaker::{BreakerState, CircuitBreaker};
pub use client::{Endpoint, OutboundRequest, ParamClient};
pub use error::CallError;
