//! # Trade desk server
//!
//! Hosts the HTTP side of the trade desk bot. It is responsible for:
//! * Receiving Discord interactions (slash commands and button presses) and verifying their Ed25519 signatures.
//! * Turning each interaction into a typed [`interactions::Command`] and running it against the trade engine.
//! * Delivering announcements to Discord through the REST API ([`integrations::discord`]).
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/interactions`: The Discord interactions endpoint.
pub mod cli;
pub mod config;
pub mod errors;
pub mod integrations;
pub mod interactions;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
