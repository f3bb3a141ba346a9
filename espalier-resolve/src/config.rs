//! Resolution pipeline configuration.

use serde::{Deserialize, Serialize};

use crate::error::{ResolveError, ResolveResult};

/// Environment variable toggling cache building.
pub const ENV_CACHE_ENABLED: &str = "ESPALIER_CACHE_ENABLED";

/// Environment variable selecting the process-wide shared cache.
pub const ENV_SHARED_CACHE: &str = "ESPALIER_SHARED_CACHE";

/// Tunables for a resolution engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveOptions {
    /// Whether cache building runs at all.
    ///
    /// When disabled, payloads pass through cache building untouched and
    /// every reference resolves by direct fetch.
    pub cache_enabled: bool,

    /// Use the process-wide shared cache instead of a per-pass one.
    ///
    /// The shared cache survives across passes and engines until flushed;
    /// the default transient cache lives for a single cache build.
    pub shared_cache: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            shared_cache: false,
        }
    }
}

impl ResolveOptions {
    /// Default options: transient cache, enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Options with cache building switched off.
    pub fn disabled() -> Self {
        Self {
            cache_enabled: false,
            shared_cache: false,
        }
    }

    /// Set whether cache building runs.
    pub fn cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    /// Set whether the process-wide shared cache is used.
    pub fn shared_cache(mut self, shared: bool) -> Self {
        self.shared_cache = shared;
        self
    }

    /// Load options from a TOML file.
    pub fn load(path: &std::path::Path) -> ResolveResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|err| {
            ResolveError::config(format!("cannot read {}", path.display())).with_source(err)
        })?;
        let options = toml::from_str(&content).map_err(|err| {
            ResolveError::config(format!("cannot parse {}", path.display())).with_source(err)
        })?;
        Ok(options)
    }

    /// Save options to a TOML file.
    pub fn save(&self, path: &std::path::Path) -> ResolveResult<()> {
        let content = toml::to_string_pretty(self).map_err(|err| {
            ResolveError::config("cannot serialize options").with_source(err)
        })?;
        std::fs::write(path, content).map_err(|err| {
            ResolveError::config(format!("cannot write {}", path.display())).with_source(err)
        })?;
        Ok(())
    }

    /// Load options from the `ESPALIER_*` environment variables.
    ///
    /// Unset variables fall back to the defaults; a set variable must hold
    /// a boolean.
    pub fn from_env() -> ResolveResult<Self> {
        let mut options = Self::default();
        if let Some(enabled) = env_flag(ENV_CACHE_ENABLED)? {
            options.cache_enabled = enabled;
        }
        if let Some(shared) = env_flag(ENV_SHARED_CACHE)? {
            options.shared_cache = shared;
        }
        tracing::debug!(
            cache_enabled = options.cache_enabled,
            shared_cache = options.shared_cache,
            "options loaded from environment"
        );
        Ok(options)
    }
}

fn env_flag(name: &str) -> ResolveResult<Option<bool>> {
    let Ok(raw) = std::env::var(name) else {
        return Ok(None);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        other => Err(ResolveError::config(format!(
            "{name} must be a boolean, got \"{other}\""
        ))),
    }
}
