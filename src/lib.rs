//! # Toast Gateway Library
//!
//! Toast point-of-sale integration for a multi-tenant restaurant platform:
//! per-tenant OAuth sessions, menu reconciliation, order push and the
//! scheduled sync loop, plus the HTTP surface that exposes them.

pub mod auth;
pub mod config;
pub mod crypto;
pub mod db;
pub mod error;
pub mod handlers;
pub mod menu_sync;
pub mod models;
pub mod order_push;
pub mod repositories;
pub mod scheduler;
pub mod server;
pub mod telemetry;
pub mod toast;
pub use migration;
