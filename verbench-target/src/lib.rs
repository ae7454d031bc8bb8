//! Verbench Target
//!
//! The library under benchmark: an embedded axum/tokio serving engine whose
//! routes are registered at runtime, and one [`VersionBinding`] per supported
//! major generation. Each generation exposes a different registration
//! surface, so the catalog only ever reaches the engine through the
//! capability registrar.
//!
//! [`VersionBinding`]: verbench_core::VersionBinding

pub mod bindings;
pub mod engine;
pub mod server;

pub use bindings::{all_bindings, binding_for, known_versions, Generation, GenerationBinding};
pub use engine::RouteTable;
pub use server::{EmbeddedServer, ServerError};
