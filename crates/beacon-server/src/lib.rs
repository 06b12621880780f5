//! HTTP status surface: liveness plus a JSON view of the admission gate,
//! activity counters, and destination configuration.

mod server;

pub use server::{build_router, start, AppState, ServerConfig, ServerHandle, ServicesStatus};
