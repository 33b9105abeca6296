//! Bayou AST server: answers framed evidence requests with sampled ASTs.
//!
//! ```text
//! client ──frame──▶ server::serve ──▶ SynthesisEngine ──▶ SamplingSearch ──▶ Predictor
//!        ◀─frame──                 ◀── SynthesisResponse (pretty JSON)
//! ```

pub mod client;
pub mod engine;
pub mod extract;
pub mod logging;
pub mod server;
pub mod settings;

pub use engine::SynthesisEngine;
pub use server::{handle_connection, serve, shutdown_on, ServerOptions};
