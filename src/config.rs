//! Configuration management

use serde::{Deserialize, Serialize};

/// Process-global configuration, read fresh per request (§5, §6.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrarConfig {
    pub extensions: ExtensionConfig,
    pub location: LocationConfig,
}

/// Extension-negotiation knobs (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionConfig {
    /// Honor `Require: gruu` and emit `gruu=`/`+sip.instance=` contact params.
    pub experimental_gruu_enable: bool,
    /// Accept a UA-supplied `Path` header even when the UA did not advertise
    /// `Supported: path`, instead of rejecting with 421.
    pub allow_proxy_inserted_path: bool,
}

/// Location-service bounds and identity (§2.item 4, §4.7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Upper bound applied to any UA-requested expiry (§4.7).
    pub max_register_time: u32,
    /// Default expiry when neither the contact nor the Expires header supplies one (§4.7).
    pub default_register_time: u32,
    /// This node's own Record-Route URI, used by the Path Vector Builder when
    /// acting as an outgoing edge proxy (§4.4).
    pub record_route_uri: String,
}

impl Default for RegistrarConfig {
    fn default() -> Self {
        Self {
            extensions: ExtensionConfig {
                experimental_gruu_enable: false,
                allow_proxy_inserted_path: false,
            },
            location: LocationConfig {
                max_register_time: 3600,
                default_register_time: 3600,
                record_route_uri: "sip:registrar.invalid".to_string(),
            },
        }
    }
}

impl RegistrarConfig {
    /// Load configuration, layering `registrar.toml` (if present) under
    /// environment variables prefixed `REGISTRAR_` (e.g. `REGISTRAR_LOCATION__MAX_REGISTER_TIME`).
    pub fn load() -> Result<Self, config::ConfigError> {
        let defaults = Self::default();
        let figure = config::Config::builder()
            .add_source(config::Config::try_from(&defaults)?)
            .add_source(config::File::with_name("registrar").required(false))
            .add_source(config::Environment::with_prefix("REGISTRAR").separator("__"))
            .build()?;

        figure.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_conservative() {
        let config = RegistrarConfig::default();
        assert!(!config.extensions.experimental_gruu_enable);
        assert!(!config.extensions.allow_proxy_inserted_path);
        assert_eq!(config.location.max_register_time, 3600);
        assert_eq!(config.location.default_register_time, 3600);
    }
}
