use std::{path::PathBuf, sync::Arc, time::Duration};

use opsgate_config::GatewaySection;

/// Client-side timeout for the upstream call. A stalled supervisor aborts
/// the affected request without tying up the gateway as a whole.
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(60);

// ── Gateway state ────────────────────────────────────────────────────────────

/// Immutable per-process state, fixed at startup and shared across request
/// tasks as an `Arc`. There is no mutable state between requests.
pub struct GatewayState {
    /// Supervisor endpoint `/api/run` forwards to.
    pub supervisor_url: String,
    /// Directory the browser UI is served from.
    pub static_dir: PathBuf,
    /// Server version string.
    pub version: String,
    /// Shared upstream HTTP client.
    pub client: reqwest::Client,
}

impl GatewayState {
    pub fn new(config: &GatewaySection) -> anyhow::Result<Arc<Self>> {
        let client = reqwest::Client::builder()
            .timeout(UPSTREAM_TIMEOUT)
            .build()?;

        Ok(Arc::new(Self {
            supervisor_url: config.supervisor_url.clone(),
            static_dir: config.static_dir.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            client,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carries_config_values() {
        let section = GatewaySection {
            supervisor_url: "http://127.0.0.1:7000/run".into(),
            static_dir: PathBuf::from("ui"),
            ..GatewaySection::default()
        };
        let state = GatewayState::new(&section).unwrap();
        assert_eq!(state.supervisor_url, "http://127.0.0.1:7000/run");
        assert_eq!(state.static_dir, PathBuf::from("ui"));
        assert!(!state.version.is_empty());
    }
}
