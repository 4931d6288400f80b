//! arbiter-web — axum server wiring for the Arbiter gateway.
//! See ARCHITECTURE.md §6 and §7

pub mod config;
pub mod handlers;
pub mod router;
pub mod state;
