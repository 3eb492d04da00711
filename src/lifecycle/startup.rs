//! Startup orchestration.
//!
//! # Responsibilities
//! - Resolve configuration: defaults, then file, then environment, then flags
//! - Warm up the readiness guard in the background
//!
//! # Design Decisions
//! - Fail fast: any configuration error is fatal
//! - Traffic is accepted before the origin answers; `/readyz` reports it

use std::path::Path;
use std::sync::Arc;

use crate::config::loader::{apply_env_overrides, read_config};
use crate::config::{validate_config, ConfigError, ProxyConfig};
use crate::health::Readiness;

/// Values passed on the command line. They beat file and environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub origin: Option<String>,
    pub bind_address: Option<String>,
}

impl Overrides {
    fn apply(&self, config: &mut ProxyConfig) {
        if let Some(origin) = &self.origin {
            config.upstream.origin = origin.clone();
        }
        if let Some(addr) = &self.bind_address {
            config.listener.bind_address = addr.clone();
        }
    }
}

/// Resolve the effective configuration from the process environment.
pub fn resolve_config(path: Option<&Path>, overrides: &Overrides) -> Result<ProxyConfig, ConfigError> {
    resolve_config_with(path, overrides, |key| std::env::var(key).ok())
}

/// Same as [`resolve_config`] with an explicit environment lookup.
pub fn resolve_config_with<F>(
    path: Option<&Path>,
    overrides: &Overrides,
    lookup: F,
) -> Result<ProxyConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => ProxyConfig::default(),
    };
    apply_env_overrides(&mut config, lookup);
    overrides.apply(&mut config);

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Probe the origin once in the background so the first `/readyz` is warm.
pub fn spawn_warm_up(readiness: Arc<Readiness>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        match readiness.ensure().await {
            Ok(()) => tracing::info!("Upstream origin reachable"),
            Err(e) => tracing::warn!(error = %e, "Upstream origin not reachable yet"),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use std::path::PathBuf;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn write_temp(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "image-proxy-startup-{}-{}.toml",
            name,
            std::process::id()
        ));
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_defaults_need_an_origin() {
        let err = resolve_config_with(None, &Overrides::default(), env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("upstream.origin"));
    }

    #[test]
    fn test_env_supplies_origin() {
        let config = resolve_config_with(
            None,
            &Overrides::default(),
            env(&[("IMAGE_PROXY_UPSTREAM_ORIGIN", "http://env.test")]),
        )
        .unwrap();
        assert_eq!(config.upstream.origin, "http://env.test");
        assert_eq!(config.forwarder.path, "/api/image-proxy");
    }

    #[test]
    fn test_precedence_file_env_flags() {
        let path = write_temp(
            "precedence",
            r#"
            [listener]
            bind_address = "127.0.0.1:1111"

            [upstream]
            origin = "http://file.test"
            "#,
        );

        let from_file = resolve_config_with(Some(&path), &Overrides::default(), env(&[])).unwrap();
        assert_eq!(from_file.upstream.origin, "http://file.test");
        assert_eq!(from_file.listener.bind_address, "127.0.0.1:1111");

        let environment = env(&[
            ("IMAGE_PROXY_UPSTREAM_ORIGIN", "http://env.test"),
            ("IMAGE_PROXY_BIND_ADDRESS", "127.0.0.1:2222"),
        ]);
        let from_env = resolve_config_with(Some(&path), &Overrides::default(), &environment).unwrap();
        assert_eq!(from_env.upstream.origin, "http://env.test");
        assert_eq!(from_env.listener.bind_address, "127.0.0.1:2222");

        let flags = Overrides {
            origin: Some("http://flag.test".into()),
            bind_address: None,
        };
        let from_flags = resolve_config_with(Some(&path), &flags, &environment).unwrap();
        assert_eq!(from_flags.upstream.origin, "http://flag.test");
        assert_eq!(from_flags.listener.bind_address, "127.0.0.1:2222");

        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_invalid_flag_fails_validation() {
        let flags = Overrides {
            origin: Some("ftp://files.test".into()),
            bind_address: None,
        };
        let err = resolve_config_with(None, &flags, env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }
}
