//! Route handlers for the Brain and Kernel services.

pub mod brain;
pub mod kernel;

use serde::{Deserialize, Serialize};

/// Body of `GET /health` on both services.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub uptime_secs: u64,
}

impl HealthResponse {
    fn healthy(service: &str, uptime_secs: u64) -> Self {
        Self {
            status: "healthy".to_string(),
            service: service.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_secs,
        }
    }
}
