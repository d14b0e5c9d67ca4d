use serde::de::DeserializeOwned;
use serde_json::from_slice;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::types::ApiConfig;

const CONFIG_PATH: &str = "variant_search.json";
const URL_VAR: &str = "VARIANT_SEARCH_URL";
const TIMEOUT_VAR: &str = "VARIANT_SEARCH_TIMEOUT";
const CSRF_TOKEN_VAR: &str = "VARIANT_SEARCH_CSRF_TOKEN";

/// Read-only access to the api configuration
#[derive(Clone, Debug, Default)]
pub struct Repository {
    config: Arc<ApiConfig>,
}

impl Repository {
    /// Load `variant_search.json` from the working directory and apply
    /// the environment overrides
    pub fn new() -> Self {
        Self::load(Path::new(CONFIG_PATH))
    }

    pub fn load(path: &Path) -> Self {
        let config = match read(path) {
            Ok(config) => config.unwrap_or_default(),
            Err(e) => {
                log::error!("Could not load config: {e}");
                ApiConfig::default()
            }
        };
        Self::with_config(apply_overrides(config, |name| std::env::var(name).ok()))
    }

    pub fn with_config(config: ApiConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }
}

fn apply_overrides(mut config: ApiConfig, var: impl Fn(&str) -> Option<String>) -> ApiConfig {
    if let Some(url) = var(URL_VAR) {
        config.base_url = url;
    }
    if let Some(timeout) = var(TIMEOUT_VAR) {
        match timeout.parse() {
            Ok(secs) => config.timeout_secs = secs,
            Err(e) => log::error!("Invalid {TIMEOUT_VAR} {timeout}: {e:?}"),
        }
    }
    if let Some(token) = var(CSRF_TOKEN_VAR) {
        config.csrf_token = Some(token);
    }
    config
}

fn read<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, String> {
    let data_path = PathBuf::from(path);
    if !data_path.exists() {
        return Ok(None);
    };
    let data = std::fs::read(&data_path)
        .map_err(|e| format!("Could not read {}: {e:?}", data_path.display()))?;
    let obj: T =
        from_slice(&data).map_err(|e| format!("Could not parse {}: {e:?}", data_path.display()))?;
    Ok(Some(obj))
}
