//! CLI argument definitions for the Sentient binary.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::{Parser, Subcommand};
use sentient_core::config::SentientConfig;
use std::path::PathBuf;

/// Sentient: a confirmation-gated desktop automation pipeline.
#[derive(Parser, Debug)]
#[command(name = "sentient", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). RUST_LOG wins if set.
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the reasoning service: plans, confirmations, push channels.
    Brain {
        /// Brain HTTP port.
        #[arg(short = 'p', long = "port")]
        port: Option<u16>,
        /// Base URL of the kernel.
        #[arg(long = "kernel-url")]
        kernel_url: Option<String>,
    },
    /// Run the privileged execution host.
    Kernel {
        /// Kernel HTTP port.
        #[arg(short = 'p', long = "port")]
        port: Option<u16>,
        /// Record desktop calls instead of performing them.
        #[arg(long = "headless")]
        headless: bool,
    },
    /// Run brain and kernel in one process, connected in memory.
    Standalone {
        /// Record desktop calls instead of performing them.
        #[arg(long = "headless")]
        headless: bool,
    },
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > SENTIENT_CONFIG env var > ~/.sentient/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("SENTIENT_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Fold CLI overrides into the loaded configuration.
    pub fn apply_overrides(&self, config: &mut SentientConfig) {
        if let Some(level) = &self.log_level {
            config.general.log_level = level.clone();
        }
        match &self.command {
            Command::Brain { port, kernel_url } => {
                if let Some(port) = port {
                    config.brain.port = *port;
                }
                if let Some(url) = kernel_url {
                    config.brain.kernel_url = url.clone();
                }
            }
            Command::Kernel { port, .. } => {
                if let Some(port) = port {
                    config.kernel.port = *port;
                }
            }
            Command::Standalone { .. } => {}
        }
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".sentient").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".sentient").join("config.toml");
    }
    PathBuf::from("config.toml")
}
