//! Config file loading.

use std::path::Path;
use tracing::info;

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;
use crate::validate;

impl Config {
    /// Load and validate a configuration file.
    ///
    /// Files with a `.json` extension are parsed as JSON, everything else as
    /// TOML.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read, fails to parse,
    /// or fails validation. Any of these must abort startup before a
    /// listener is bound.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let config = Self::parse(&raw, path)?;
        validate::validate(&config)?;

        let (allow, deny, grants) = (
            config.allow.len(),
            config.deny.len(),
            config.grant_required.len(),
        );
        info!(
            path = %path.display(),
            allow, deny, grants,
            default_action = %config.proxy.default_action,
            "loaded gateway configuration"
        );

        Ok(config)
    }

    fn parse(raw: &str, path: &Path) -> ConfigResult<Self> {
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            serde_json::from_str(raw).map_err(|e| ConfigError::Parse {
                path: path.display().to_string(),
                reason: e.to_string(),
            })
        } else {
            toml::from_str(raw).map_err(|e| ConfigError::Parse {
                path: path.display().to_string(),
                reason: e.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use outpost_core::{DefaultAction, GrantKind};
    use std::io::Write as _;

    const MINIMAL: &str = r#"
[proxy]
listen = "127.0.0.1:9090"
idp_url = "https://idp.example.com"
agent_email = "agent@example.com"
"#;

    const FULL: &str = r#"
[proxy]
listen = "0.0.0.0:9090"
idp_url = "https://idp.example.com"
agent_email = "agent@example.com"
default_action = "request"
audit_log = "/var/log/outpost/audit.jsonl"
grant_wait_timeout_secs = 120
grant_poll_interval_secs = 5

[[deny]]
domain = "*.evil.com"
note = "known bad"

[[allow]]
domain = "api.github.com"
methods = ["GET"]
path = "/repos/**"

[[grant_required]]
domain = "api.stripe.com"
grant_type = "timed"
permissions = ["charges:write"]
duration = 3600
"#;

    fn write_temp(name: &str, contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn test_minimal_toml_gets_defaults() {
        let (_dir, path) = write_temp("config.toml", MINIMAL);
        let config = Config::load(&path).unwrap();

        assert_eq!(config.proxy.default_action, DefaultAction::Block);
        assert_eq!(config.proxy.grant_wait_timeout_secs, 300);
        assert_eq!(config.proxy.grant_poll_interval_secs, 2);
        assert!(config.proxy.audit_log.is_none());
        assert!(config.allow.is_empty());
        assert!(config.deny.is_empty());
        assert!(config.grant_required.is_empty());
    }

    #[test]
    fn test_full_toml_round_trip() {
        let (_dir, path) = write_temp("config.toml", FULL);
        let config = Config::load(&path).unwrap();

        assert_eq!(config.proxy.default_action, DefaultAction::Request);
        assert_eq!(config.proxy.grant_wait_timeout_secs, 120);
        assert_eq!(config.deny[0].domain, "*.evil.com");
        assert_eq!(config.allow[0].methods.as_deref(), Some(&["GET".to_string()][..]));
        assert_eq!(config.grant_required[0].grant_type, GrantKind::Timed);
        assert_eq!(config.grant_required[0].duration, Some(3600));
    }

    #[test]
    fn test_json_config_accepted() {
        let json = r#"{
            "proxy": {
                "listen": "127.0.0.1:9090",
                "idp_url": "http://localhost:8080",
                "agent_email": "agent@example.com",
                "default_action": "request-async"
            },
            "grant_required": [
                {"domain": "api.stripe.com", "grant_type": "once"}
            ]
        }"#;
        let (_dir, path) = write_temp("config.json", json);
        let config = Config::load(&path).unwrap();

        assert_eq!(config.proxy.default_action, DefaultAction::RequestAsync);
        assert_eq!(config.grant_required[0].rule.domain, "api.stripe.com");
        assert_eq!(config.grant_required[0].grant_type, GrantKind::Once);
    }

    #[test]
    fn test_missing_required_field_is_parse_error() {
        let (_dir, path) = write_temp(
            "config.toml",
            "[proxy]\nlisten = \"127.0.0.1:9090\"\nidp_url = \"https://idp.example.com\"\n",
        );
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_invalid_listen_rejected() {
        let broken = MINIMAL.replace("127.0.0.1:9090", "127.0.0.1");
        let (_dir, path) = write_temp("config.toml", &broken);
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_invalid_port_rejected() {
        let broken = MINIMAL.replace("127.0.0.1:9090", "127.0.0.1:notaport");
        let (_dir, path) = write_temp("config.toml", &broken);
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_non_http_idp_url_rejected() {
        let broken = MINIMAL.replace("https://idp.example.com", "ftp://idp.example.com");
        let (_dir, path) = write_temp("config.toml", &broken);
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let broken = format!("{MINIMAL}grant_poll_interval_secs = 0\n");
        let (_dir, path) = write_temp("config.toml", &broken);
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_empty_rule_domain_rejected() {
        let broken = format!("{MINIMAL}\n[[deny]]\ndomain = \"\"\n");
        let (_dir, path) = write_temp("config.toml", &broken);
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_zero_grant_duration_rejected() {
        let broken = format!(
            "{MINIMAL}\n[[grant_required]]\ndomain = \"x.com\"\ngrant_type = \"timed\"\nduration = 0\n"
        );
        let (_dir, path) = write_temp("config.toml", &broken);
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_broker_token_not_serialized() {
        let with_token = MINIMAL.replace(
            "agent_email = \"agent@example.com\"",
            "agent_email = \"agent@example.com\"\nbroker_token = \"secret\"",
        );
        let (_dir, path) = write_temp("config.toml", &with_token);
        let config = Config::load(&path).unwrap();

        assert_eq!(config.proxy.broker_token.as_deref(), Some("secret"));
        let dumped = serde_json::to_string(&config).unwrap();
        assert!(!dumped.contains("secret"));
        let debugged = format!("{config:?}");
        assert!(!debugged.contains("secret"));
    }
}
