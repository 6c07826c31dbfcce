//! Service configuration: command-line flags with environment fallbacks.
use std::time::Duration;

use clap::Parser;
use ror_core::UploadLimits;

const MIB: usize = 1024 * 1024;

#[derive(Debug, Clone, Parser)]
#[command(name = "ror-api", about = "RealOrRender report and verification service")]
pub struct Args {
    /// Listen address
    #[arg(long, env = "ROR_ADDR", default_value = "0.0.0.0:8787")]
    pub addr: String,
    /// Base URL of the detection service
    #[arg(long, env = "ROR_DETECTION_URL", default_value = "http://localhost:8000")]
    pub detection_url: String,
    /// Allowed CORS origins (repeatable). If omitted, all origins are allowed.
    #[arg(long = "cors-origin", env = "ROR_CORS_ORIGIN", value_delimiter = ',')]
    pub cors_origins: Vec<String>,
    /// Maximum request body size in MiB
    #[arg(long, env = "ROR_BODY_LIMIT_MB", default_value_t = 64)]
    pub body_limit_mb: usize,
    /// Timeout for one detection call, in seconds
    #[arg(long, env = "ROR_DETECTION_TIMEOUT_SECS", default_value_t = 120)]
    pub detection_timeout_secs: u64,
    /// Report copy YAML to use instead of the bundled one
    #[arg(long, env = "ROR_TEMPLATES")]
    pub templates: Option<String>,
}

impl Args {
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            detection_url: self.detection_url.clone(),
            cors_origins: self.cors_origins.clone(),
            body_limit_bytes: self.body_limit_mb.saturating_mul(MIB),
            detection_timeout: Duration::from_secs(self.detection_timeout_secs),
            upload_limits: UploadLimits::default(),
            templates_path: self.templates.clone(),
        }
    }
}

/// Everything the router needs besides the listen address.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub detection_url: String,
    /// Empty = permissive.
    pub cors_origins: Vec<String>,
    pub body_limit_bytes: usize,
    pub detection_timeout: Duration,
    pub upload_limits: UploadLimits,
    /// `None` = bundled report copy.
    pub templates_path: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            detection_url: "http://localhost:8000".to_string(),
            cors_origins: Vec::new(),
            body_limit_bytes: 64 * MIB,
            detection_timeout: Duration::from_secs(120),
            upload_limits: UploadLimits::default(),
            templates_path: None,
        }
    }
}
