//! Sentient API crate - axum HTTP servers for the Brain and the Kernel.
//!
//! The Brain exposes autonomy control, plans, confirmations, and the SSE and
//! WebSocket push channels. The Kernel exposes token-protected action
//! execution, the safety lock, and the audit trail.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod ws;

pub use error::ApiError;
pub use routes::{brain_router, kernel_router, serve};
pub use state::{BrainState, KernelState};
