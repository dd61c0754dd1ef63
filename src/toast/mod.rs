//! # Toast API
//!
//! Session management, typed payloads and HTTP operations against the Toast
//! point-of-sale API.

pub mod client;
pub mod error;
pub mod lifecycle;
pub mod session;
pub mod transport;
pub mod types;

pub use client::ToastClient;
pub use error::ToastError;
pub use lifecycle::IntegrationLifecycle;
pub use session::ToastSession;
pub use transport::ToastTransport;
