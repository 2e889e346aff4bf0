pub mod config;
pub mod error;
pub mod events;
pub mod types;

pub use config::SentientConfig;
pub use error::{Result, SentientError};
pub use events::{ClientMessage, PushMessage};
pub use types::*;
