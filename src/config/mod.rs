pub mod client;
pub mod loader;
pub mod settings;

use serde::Deserialize;

use crate::config::client::ClientConfig;
use crate::config::settings::SettingsConfig;

/// ================================
/// Full service configuration
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub client: ClientConfig,
    #[serde(default)]
    pub settings: SettingsConfig,
}
