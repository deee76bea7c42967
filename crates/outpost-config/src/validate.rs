//! Configuration validation rules.

use url::Url;

use crate::error::{ConfigError, ConfigResult};
use crate::types::{Config, RuleEntry};

pub(crate) fn validate(config: &Config) -> ConfigResult<()> {
    validate_listen(&config.proxy.listen)?;
    validate_idp_url(&config.proxy.idp_url)?;

    if config.proxy.agent_email.trim().is_empty() {
        return Err(ConfigError::invalid("proxy.agent_email must not be empty"));
    }
    if config.proxy.grant_wait_timeout_secs == 0 {
        return Err(ConfigError::invalid(
            "proxy.grant_wait_timeout_secs must be greater than zero",
        ));
    }
    if config.proxy.grant_poll_interval_secs == 0 {
        return Err(ConfigError::invalid(
            "proxy.grant_poll_interval_secs must be greater than zero",
        ));
    }

    for (section, rules) in [("deny", &config.deny), ("allow", &config.allow)] {
        for rule in rules {
            validate_rule(section, rule)?;
        }
    }
    for grant in &config.grant_required {
        validate_rule("grant_required", &grant.rule)?;
        if grant.duration == Some(0) {
            return Err(ConfigError::invalid(format!(
                "grant_required rule for {:?} has a zero duration",
                grant.rule.domain
            )));
        }
    }

    Ok(())
}

fn validate_listen(listen: &str) -> ConfigResult<()> {
    let Some((host, port)) = listen.rsplit_once(':') else {
        return Err(ConfigError::invalid(format!(
            "proxy.listen {listen:?} is not host:port"
        )));
    };
    if host.is_empty() {
        return Err(ConfigError::invalid(format!(
            "proxy.listen {listen:?} has an empty host"
        )));
    }
    match port.parse::<u16>() {
        Ok(port) if port != 0 => Ok(()),
        _ => Err(ConfigError::invalid(format!(
            "proxy.listen {listen:?} has an invalid port"
        ))),
    }
}

fn validate_idp_url(idp_url: &str) -> ConfigResult<()> {
    let url = Url::parse(idp_url)
        .map_err(|e| ConfigError::invalid(format!("proxy.idp_url {idp_url:?}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::invalid(format!(
            "proxy.idp_url {idp_url:?} has unsupported scheme {other:?}"
        ))),
    }
}

fn validate_rule(section: &str, rule: &RuleEntry) -> ConfigResult<()> {
    if rule.domain.trim().is_empty() {
        return Err(ConfigError::invalid(format!(
            "{section} rule has an empty domain"
        )));
    }
    if let Some(methods) = &rule.methods {
        for method in methods {
            if method.trim().is_empty() {
                return Err(ConfigError::invalid(format!(
                    "{section} rule for {:?} has a blank method entry",
                    rule.domain
                )));
            }
        }
    }
    Ok(())
}
