//! HTTP API Layer
//!
//! JSON over HTTP for the VPC endpoint script service. Error bodies use the
//! `{"detail": ...}` envelope that existing web clients expect.

pub mod error;
pub mod handler;
pub mod server;
pub mod types;

pub use handler::{ApiHandler, ServiceDefaults};
pub use server::{HttpServer, HttpServerConfig, ServerError, ServerHandle};
