/// `load_config` module: Loads the static YAML config file and adapts it into the types the
/// core crate consumes (default credentials, delivery client settings, preview options).
///
/// This module is the only place where the YAML file is parsed and mapped to strongly-typed
/// internal structs. Credentials are read from the file only; the process environment is
/// never consulted.
///
/// # Errors
/// All errors in this module use `anyhow::Error` for context-rich diagnostics, and are surfaced at the CLI boundary.
use anyhow::Result;
use flag_preview_core::client::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use flag_preview_core::model::Credentials;
use flag_preview_core::preview::{PreviewOptions, DEFAULT_FALLBACK_CONTENT_TYPE};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info, warn};

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Process-level default credentials; `None` when the file has no complete `contentstack` section.
    pub contentstack: Option<Credentials>,
    pub delivery: DeliverySettings,
    pub preview: PreviewOptions,
    pub server: ServerSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliverySettings {
    pub base_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub bind: SocketAddr,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    contentstack: Option<ContentstackSection>,
    #[serde(default)]
    delivery: DeliverySection,
    #[serde(default)]
    preview: PreviewSection,
    #[serde(default)]
    server: ServerSection,
}

#[derive(Debug, Default, Deserialize)]
struct ContentstackSection {
    #[serde(default)]
    api_key: String,
    #[serde(default)]
    delivery_token: String,
    #[serde(default)]
    environment: String,
}

#[derive(Debug, Default, Deserialize)]
struct DeliverySection {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct PreviewSection {
    #[serde(default = "default_fallback")]
    fallback_content_type: Option<String>,
}

impl Default for PreviewSection {
    fn default() -> Self {
        Self {
            fallback_content_type: default_fallback(),
        }
    }
}

fn default_fallback() -> Option<String> {
    Some(DEFAULT_FALLBACK_CONTENT_TYPE.to_string())
}

#[derive(Debug, Default, Deserialize)]
struct ServerSection {
    bind: Option<String>,
}

/// Loads a static YAML config file into a [`CliConfig`].
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    // An empty file is a valid, all-defaults config.
    let raw: RawConfig = if config_content.trim().is_empty() {
        RawConfig::default()
    } else {
        match serde_yaml::from_str(&config_content) {
            Ok(conf) => {
                info!(config_path = ?path_ref, "Parsed config YAML successfully");
                conf
            }
            Err(e) => {
                error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
                return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
            }
        }
    };

    let contentstack = match raw.contentstack {
        Some(section) => {
            let credentials = Credentials::new(
                section.api_key,
                section.delivery_token,
                section.environment,
            );
            let missing = credentials.missing_fields();
            if missing.is_empty() {
                info!(environment = %credentials.environment, "Loaded default Contentstack credentials");
                Some(credentials)
            } else {
                warn!(?missing, "Incomplete contentstack section, requests must supply credentials");
                None
            }
        }
        None => {
            info!("No default Contentstack credentials configured");
            None
        }
    };

    let timeout = match raw.delivery.timeout_secs {
        Some(0) => anyhow::bail!("delivery.timeout_secs must be greater than zero"),
        Some(secs) => Duration::from_secs(secs),
        None => DEFAULT_TIMEOUT,
    };
    let delivery = DeliverySettings {
        base_url: raw
            .delivery
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        timeout,
    };

    let bind_raw = raw.server.bind.unwrap_or_else(|| DEFAULT_BIND.to_string());
    let bind: SocketAddr = match bind_raw.parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!(error = ?e, bind = %bind_raw, "server.bind must be a socket address");
            anyhow::bail!("server.bind must be a socket address like {DEFAULT_BIND}: {e}");
        }
    };

    let preview = PreviewOptions {
        fallback_content_type: raw
            .preview
            .fallback_content_type
            .filter(|ct| !ct.trim().is_empty()),
    };

    info!(
        base_url = %delivery.base_url,
        timeout_secs = delivery.timeout.as_secs(),
        fallback_content_type = preview.fallback_content_type.as_deref().unwrap_or("<none>"),
        "Config loaded successfully"
    );

    Ok(CliConfig {
        contentstack,
        delivery,
        preview,
        server: ServerSettings { bind },
    })
}

impl CliConfig {
    /// Default credentials with the environment optionally overridden, or an error naming what is missing.
    pub fn credentials(&self, environment: Option<&str>) -> Result<Credentials> {
        let mut credentials = self.contentstack.clone().ok_or_else(|| {
            anyhow::anyhow!(
                "Missing Contentstack configuration: contentstack.api_key, contentstack.delivery_token and contentstack.environment are required"
            )
        })?;
        if let Some(environment) = environment {
            credentials.environment = environment.to_string();
        }
        Ok(credentials)
    }
}
