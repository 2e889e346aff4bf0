use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, SentientError};

/// Top-level configuration shared by the brain and kernel processes.
///
/// Loaded from `~/.sentient/config.toml` by default. Each section corresponds
/// to one process or one cross-cutting concern.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SentientConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub brain: BrainConfig,
    #[serde(default)]
    pub kernel: KernelConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub confirmation: ConfirmationConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
}

impl SentientConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SentientConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.brain.pool_size == 0 {
            return Err(SentientError::Config(
                "brain.pool_size must be at least 1".to_string(),
            ));
        }
        if self.pacing.suppression_ms > self.pacing.retention_ms {
            return Err(SentientError::Config(format!(
                "pacing.suppression_ms ({}) must not exceed pacing.retention_ms ({})",
                self.pacing.suppression_ms, self.pacing.retention_ms
            )));
        }
        if self.kernel.screen_width == 0 || self.kernel.screen_height == 0 {
            return Err(SentientError::Config(
                "kernel screen dimensions must be non-zero".to_string(),
            ));
        }
        if self.confirmation.timeout_secs == 0 {
            return Err(SentientError::Config(
                "confirmation.timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        #[cfg(target_os = "windows")]
        let home = std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string());
        #[cfg(not(target_os = "windows"))]
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(rest)
    } else {
        PathBuf::from(path)
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Data directory for the kernel token and other local state.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.sentient".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl GeneralConfig {
    pub fn data_dir_path(&self) -> PathBuf {
        expand_home(&self.data_dir)
    }
}

/// Reasoning service ("brain") settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrainConfig {
    pub host: String,
    pub port: u16,
    /// Base URL of the kernel's HTTP service.
    pub kernel_url: String,
    /// Timeout for a single bridge call to the kernel.
    pub bridge_timeout_ms: u64,
    /// Number of concurrent workers in the dispatch pool.
    pub pool_size: usize,
}

impl Default for BrainConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            kernel_url: "http://127.0.0.1:8001".to_string(),
            bridge_timeout_ms: 10_000,
            pool_size: 4,
        }
    }
}

/// Privileged execution host ("kernel") settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    pub host: String,
    pub port: u16,
    /// Fallback screen size when the platform cannot report one.
    pub screen_width: u32,
    pub screen_height: u32,
    /// Application name -> program launched for OPEN_APP.
    pub app_whitelist: Vec<WhitelistedApp>,
    /// Require a bearer token on privileged routes.
    pub require_token: bool,
    /// Token file; defaults to `<data_dir>/kernel.token`.
    pub token_path: Option<String>,
    /// Delay between typed characters.
    pub type_interval_ms: u64,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8001,
            screen_width: 1920,
            screen_height: 1080,
            app_whitelist: vec![
                WhitelistedApp::new("notepad", "notepad.exe"),
                WhitelistedApp::new("calc", "calc.exe"),
                WhitelistedApp::new("calculator", "calc.exe"),
            ],
            require_token: true,
            token_path: None,
            type_interval_ms: 50,
        }
    }
}

impl KernelConfig {
    pub fn resolve_token_path(&self, general: &GeneralConfig) -> PathBuf {
        match &self.token_path {
            Some(p) => expand_home(p),
            None => general.data_dir_path().join("kernel.token"),
        }
    }
}

/// One entry of the OPEN_APP whitelist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitelistedApp {
    pub name: String,
    pub program: String,
}

impl WhitelistedApp {
    pub fn new(name: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
        }
    }
}

/// Duplicate suppression and global pacing windows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// History entries older than this are evicted.
    pub retention_ms: u64,
    /// An identical canonical action inside this window is a duplicate.
    pub suppression_ms: u64,
    /// Minimum gap between two executed actions.
    pub min_interval_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            retention_ms: 2_000,
            suppression_ms: 500,
            min_interval_ms: 250,
        }
    }
}

/// Human-in-the-loop confirmation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfirmationConfig {
    /// A pending action not confirmed within this many seconds is rejected.
    pub timeout_secs: u64,
    /// How often the sweeper looks for expired pending actions.
    pub sweep_interval_secs: u64,
    /// Finished plans are forgotten this many seconds after they end.
    pub retention_secs: u64,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 300,
            sweep_interval_secs: 5,
            retention_secs: 3600,
        }
    }
}

/// Brain-side action policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Canonical action names that are never forwarded to the kernel.
    pub denylist: Vec<String>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            denylist: vec![
                "SHUTDOWN".to_string(),
                "FORMAT_DRIVE".to_string(),
                "DELETE_SYSTEM32".to_string(),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = SentientConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.brain.port, 8000);
        assert_eq!(config.brain.pool_size, 4);
        assert_eq!(config.kernel.port, 8001);
        assert_eq!(config.pacing.retention_ms, 2_000);
        assert_eq!(config.pacing.suppression_ms, 500);
        assert_eq!(config.confirmation.timeout_secs, 300);
        assert_eq!(config.confirmation.retention_secs, 3600);
        assert!(config.kernel.require_token);
        assert!(config.policy.denylist.contains(&"SHUTDOWN".to_string()));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
[general]
log_level = "debug"

[brain]
port = 9000
kernel_url = "http://10.0.0.2:9001"
pool_size = 2

[kernel]
screen_width = 2560
screen_height = 1440
require_token = false
app_whitelist = [{ name = "editor", program = "gedit" }]

[pacing]
min_interval_ms = 100
"#;
        let file = create_temp_config(content);
        let config = SentientConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.brain.port, 9000);
        assert_eq!(config.brain.kernel_url, "http://10.0.0.2:9001");
        assert_eq!(config.brain.pool_size, 2);
        assert_eq!(config.kernel.screen_width, 2560);
        assert!(!config.kernel.require_token);
        assert_eq!(config.kernel.app_whitelist, vec![WhitelistedApp::new("editor", "gedit")]);
        assert_eq!(config.pacing.min_interval_ms, 100);
        // Untouched fields keep defaults
        assert_eq!(config.pacing.suppression_ms, 500);
        assert_eq!(config.brain.bridge_timeout_ms, 10_000);
    }

    #[test]
    fn test_load_rejects_zero_pool() {
        let file = create_temp_config("[brain]\npool_size = 0\n");
        let err = SentientConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, SentientError::Config(_)));
    }

    #[test]
    fn test_load_rejects_inverted_windows() {
        let file = create_temp_config("[pacing]\nretention_ms = 100\nsuppression_ms = 500\n");
        let err = SentientConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("suppression_ms"));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = SentientConfig::load_or_default(Path::new("/nonexistent/config.toml"));
        assert_eq!(config.general.data_dir, "~/.sentient");
    }

    #[test]
    fn test_load_invalid_toml() {
        let file = create_temp_config("this is {{ not valid TOML");
        assert!(SentientConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_empty_toml_uses_all_defaults() {
        let file = create_temp_config("");
        let config = SentientConfig::load(file.path()).unwrap();
        assert_eq!(config.brain.port, 8000);
        assert_eq!(config.kernel.app_whitelist.len(), 3);
    }

    #[test]
    fn test_save_creates_parent_dirs_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("config.toml");

        let mut config = SentientConfig::default();
        config.brain.pool_size = 7;
        config.save(&path).unwrap();

        assert!(path.exists());
        let reloaded = SentientConfig::load(&path).unwrap();
        assert_eq!(reloaded.brain.pool_size, 7);
        assert_eq!(reloaded.kernel.app_whitelist, config.kernel.app_whitelist);
    }

    #[test]
    fn test_token_path_resolution() {
        let general = GeneralConfig {
            data_dir: "/var/lib/sentient".to_string(),
            ..GeneralConfig::default()
        };
        let mut kernel = KernelConfig::default();
        assert_eq!(
            kernel.resolve_token_path(&general),
            PathBuf::from("/var/lib/sentient/kernel.token")
        );
        kernel.token_path = Some("/etc/sentient/token".to_string());
        assert_eq!(
            kernel.resolve_token_path(&general),
            PathBuf::from("/etc/sentient/token")
        );
    }

    #[test]
    fn test_expand_home_leaves_absolute_paths() {
        assert_eq!(expand_home("/tmp/x"), PathBuf::from("/tmp/x"));
        assert!(!expand_home("~/x").to_string_lossy().starts_with('~'));
    }
}
