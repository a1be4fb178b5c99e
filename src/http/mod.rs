//! HTTP server module.
//!
//! The server includes:
//! - Plain HTTP listener (TLS is terminated by the ingress)
//! - Graceful shutdown on SIGTERM/SIGINT with connection draining

mod server;
mod shutdown;

pub use server::{serve, start_server, ServerError};
