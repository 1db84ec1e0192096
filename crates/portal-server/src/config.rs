use portal_types::{AppConfig, FeatureFlags, RolesConfig};
use std::path::Path;
use std::sync::OnceLock;

static CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Path to the config file, relative to the project root.
const CONFIG_PATH: &str = "config.toml";

/// Read and parse a config file. A missing or unparseable file yields the
/// defaults: all features off and the bootstrap role overrides.
pub fn read_config(path: impl AsRef<Path>) -> AppConfig {
    let path = path.as_ref();
    match std::fs::read_to_string(path) {
        Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "Failed to parse config, using defaults");
            AppConfig::default()
        }),
        Err(e) => {
            tracing::info!(path = %path.display(), error = %e, "Config file not found, using defaults");
            AppConfig::default()
        }
    }
}

/// Load `config.toml` into the global `OnceLock`. Only the first call
/// has effect.
pub fn load_config() -> &'static AppConfig {
    CONFIG.get_or_init(|| {
        let config = read_config(CONFIG_PATH);
        tracing::info!(
            features = ?config.features,
            overrides = config.roles.overrides.len(),
            "Configuration loaded"
        );
        config
    })
}

/// Get the loaded feature flags. Returns all-false defaults if
/// `load_config()` hasn't been called yet.
pub fn feature_flags() -> &'static FeatureFlags {
    static DEFAULT: FeatureFlags = FeatureFlags {
        telemetry: false,
        rate_limit: false,
    };
    CONFIG.get().map(|c| &c.features).unwrap_or(&DEFAULT)
}

/// The `[roles]` section, falling back to the bootstrap table when the
/// config has not been loaded.
pub fn roles_config() -> RolesConfig {
    CONFIG
        .get()
        .map(|c| c.roles.clone())
        .unwrap_or_default()
}
