use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

use tracing::{debug, warn};

use crate::{env::expand_env, schema::OpsgateConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["opsgate.toml", "opsgate.yaml", "opsgate.yml", "opsgate.json"];

/// Override for the config directory, set via `set_config_dir()`.
static CONFIG_DIR_OVERRIDE: Mutex<Option<PathBuf>> = Mutex::new(None);

/// Set a custom config directory. When set, config discovery only looks in
/// this directory (project-local and user-global paths are skipped).
/// Can be called multiple times (e.g. in tests) — each call replaces the
/// previous override.
pub fn set_config_dir(path: PathBuf) {
    *CONFIG_DIR_OVERRIDE.lock().unwrap() = Some(path);
}

/// Clear the config directory override, restoring default discovery.
pub fn clear_config_dir() {
    *CONFIG_DIR_OVERRIDE.lock().unwrap() = None;
}

fn config_dir_override() -> Option<PathBuf> {
    CONFIG_DIR_OVERRIDE.lock().unwrap().clone()
}

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<OpsgateConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = expand_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./opsgate.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/opsgate/opsgate.{toml,yaml,yml,json}` (user-global)
///
/// Returns `OpsgateConfig::default()` if no config file is found, or if the
/// file found fails to parse (with a warning).
pub fn discover_and_load() -> OpsgateConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    OpsgateConfig::default()
}

/// Find the first config file in standard locations.
///
/// When a config dir override is set, only that directory is searched —
/// project-local and user-global paths are skipped for isolation.
pub fn find_config_file() -> Option<PathBuf> {
    if let Some(dir) = config_dir_override() {
        for name in CONFIG_FILENAMES {
            let p = dir.join(name);
            if p.exists() {
                return Some(p);
            }
        }
        // Override is set — don't fall through to other locations.
        return None;
    }

    // Project-local
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    // User-global: ~/.config/opsgate/
    if let Some(dir) = home_dir().map(|h| h.join(".config").join("opsgate")) {
        for name in CONFIG_FILENAMES {
            let p = dir.join(name);
            if p.exists() {
                return Some(p);
            }
        }
    }

    None
}

fn home_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf())
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<OpsgateConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("opsgate.toml");
        std::fs::write(
            &path,
            "[gateway]\nport = 9090\nsupervisor_url = \"http://127.0.0.1:7000/run\"\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.gateway.port, 9090);
        assert_eq!(config.gateway.supervisor_url, "http://127.0.0.1:7000/run");
    }

    #[test]
    fn loads_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("opsgate.yaml");
        std::fs::write(&path, "gateway:\n  bind: 127.0.0.1\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.gateway.bind, "127.0.0.1");
        // Unset fields keep defaults.
        assert_eq!(config.gateway.port, 8088);
    }

    #[test]
    fn loads_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("opsgate.json");
        std::fs::write(&path, r#"{"gateway": {"static_dir": "ui"}}"#).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.gateway.static_dir, PathBuf::from("ui"));
    }

    #[test]
    fn rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("opsgate.toml");
        std::fs::write(&path, "[gateway\nport = oops").unwrap();

        assert!(load_config(&path).is_err());
    }

    #[test]
    fn substitutes_env_in_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("opsgate.toml");
        // PATH is always set; the value just has to survive substitution.
        std::fs::write(&path, "[gateway]\nbind = \"${OPSGATE_UNSET_VAR}\"\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.gateway.bind, "${OPSGATE_UNSET_VAR}");
    }

    #[test]
    fn discovery_honors_dir_override() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("opsgate.toml"), "[gateway]\nport = 1234\n").unwrap();

        set_config_dir(dir.path().to_path_buf());
        let config = discover_and_load();
        clear_config_dir();

        assert_eq!(config.gateway.port, 1234);
    }
}
