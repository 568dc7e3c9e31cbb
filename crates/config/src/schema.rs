/// Config schema types for the gateway process.
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default supervisor run endpoint in the reference deployment.
pub const DEFAULT_SUPERVISOR_URL: &str = "http://127.0.0.1:9000/run";

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OpsgateConfig {
    pub gateway: GatewaySection,
}

/// Listener, upstream, and static asset settings for the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewaySection {
    /// Interface to bind.
    pub bind: String,

    /// Port to listen on.
    pub port: u16,

    /// Supervisor endpoint `/api/run` forwards to.
    pub supervisor_url: String,

    /// Directory the browser UI is served from.
    pub static_dir: PathBuf,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8088,
            supervisor_url: DEFAULT_SUPERVISOR_URL.to_string(),
            static_dir: PathBuf::from("web"),
        }
    }
}

impl GatewaySection {
    /// The full listen address, e.g. `0.0.0.0:8088`.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}
