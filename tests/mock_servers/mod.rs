//! Mock servers for service integration testing
//!
//! Simulates the recognition backend's REST API so the services can be
//! exercised end to end without a real deployment.

pub mod backend;

pub use backend::{MockBackend, RecordedRequest};
