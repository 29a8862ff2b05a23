//! LPR Console - Rust Implementation
//!
//! Session, notification and backend-client layer for the license-plate
//! recognition admin console.
//!
//! This library provides:
//! - Credential cookies and the bearer-attaching backend client
//! - Session and notification stores
//! - Auth, user, blacklist, listing and video services
//! - A stateless route guard (axum middleware)
//! - A thin axum console wiring it all together

pub mod client;
pub mod config;
pub mod console;
pub mod credentials;
pub mod envelope;
pub mod error;
pub mod guard;
pub mod notifications;
pub mod services;
pub mod session;
