use std::path::Path;

use anyhow::{anyhow, Context, Result};
use regex::Regex;
use tracing::{debug, error};

use crate::config::settings::{LogFormat, LoggingConfig};
use crate::config::ServiceConfig;
use crate::observability::metrics::get_metrics;

/// Load and validate config from YAML file
pub async fn file_to_config(path: &Path) -> Result<ServiceConfig> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read config '{}'", path.display()))?;

    let expanded = expand_env_vars(&content);
    parse_config(expanded).await
}

pub async fn parse_config(content: String) -> Result<ServiceConfig> {
    let metrics = get_metrics().await;
    let mut service_config: ServiceConfig = serde_yaml::from_str(&content).inspect_err(|e| {
        error!("parse config error: {}", e);
        metrics.config_errors.inc();
    })?;

    // Apply defaults
    if service_config.settings.logging.is_none() {
        service_config.settings.logging = Some(LoggingConfig::new("info".to_owned(), LogFormat::Compact));
    }

    debug!("validation config ...");
    validate_service_config(&service_config).map_err(|errors| {
        metrics.config_errors.inc_by(errors.len() as u64);
        anyhow!("invalid config:\n  - {}", errors.join("\n  - "))
    })?;

    Ok(service_config)
}

/// Returns Ok(()) or all issues found
pub fn validate_service_config(cfg: &ServiceConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();
    let client = &cfg.client;

    if client.corp_id.trim().is_empty() {
        errors.push("client.corp_id must not be empty".to_string());
    }
    if client.corp_secret.trim().is_empty() {
        errors.push("client.corp_secret must not be empty".to_string());
    }
    if client.timeout_ms == 0 {
        errors.push("client.timeout_ms must be > 0".to_string());
    }
    for (key, url) in [("client.base_url", &client.base_url), ("client.legacy_url", &client.legacy_url)] {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            errors.push(format!("{} '{}' must start with http:// or https://", key, url));
        }
    }

    if cfg.settings.server.port.parse::<u16>().is_err() {
        errors.push(format!("settings.server.port '{}' is not a valid port", cfg.settings.server.port));
    }
    if !cfg.settings.metrics.path.starts_with('/') {
        errors.push(format!("settings.metrics.path '{}' must start with '/'", cfg.settings.metrics.path));
    }
    if let Some(logging) = &cfg.settings.logging {
        let level = logging.level.to_lowercase();
        if !["trace", "debug", "info", "warn", "error"].contains(&level.as_str()) {
            errors.push(format!("settings.logging.level '{}' is not supported", logging.level));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn expand_env_vars(input: &str) -> String {
    let re = Regex::new(r"\$\{(\w+)(?::([^\}]+))?\}").expect("static regex");
    re.replace_all(input, |caps: &regex::Captures| {
        let var = &caps[1];
        let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        std::env::var(var).unwrap_or_else(|_| default.to_string())
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::client::{CacheKind, BASE_URL, DEFAULT_HTTP_TIMEOUT_MS};
    use serial_test::serial;

    #[tokio::test]
    async fn minimal_config_gets_defaults() {
        let cfg = parse_config("client:\n  corp_id: ding123\n  corp_secret: s3cr3t\n".to_owned())
            .await
            .expect("valid config");

        assert_eq!(cfg.client.base_url, BASE_URL);
        assert_eq!(cfg.client.timeout_ms, DEFAULT_HTTP_TIMEOUT_MS);
        assert_eq!(cfg.client.cache.kind, CacheKind::File);
        assert_eq!(cfg.settings.server.port, "8080");
        let logging = cfg.settings.logging.expect("default logging");
        assert_eq!(logging.level, "info");
        assert_eq!(logging.format, LogFormat::Compact);
    }

    #[tokio::test]
    async fn validation_reports_every_issue() {
        let yaml = r#"
client:
  corp_id: ""
  corp_secret: ""
  timeout_ms: 0
  base_url: "ftp://nope"
settings:
  server:
    port: "not-a-port"
"#;
        let err = parse_config(yaml.to_owned()).await.unwrap_err().to_string();
        assert!(err.contains("corp_id"));
        assert!(err.contains("corp_secret"));
        assert!(err.contains("timeout_ms"));
        assert!(err.contains("client.base_url"));
        assert!(err.contains("settings.server.port"));
    }

    #[test]
    #[serial]
    fn env_vars_are_expanded_with_defaults() {
        std::env::set_var("DINGTALK_TEST_SECRET", "from-env");
        std::env::remove_var("DINGTALK_TEST_MISSING");

        let out = expand_env_vars("secret: ${DINGTALK_TEST_SECRET}\ndir: ${DINGTALK_TEST_MISSING:/tmp/cache}");
        assert_eq!(out, "secret: from-env\ndir: /tmp/cache");

        std::env::remove_var("DINGTALK_TEST_SECRET");
    }
}
