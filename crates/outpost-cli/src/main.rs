//! Outpost - egress authorization gateway for autonomous agents.
//!
//! Outbound agent traffic is addressed through the gateway by encoding the
//! full target URL in the request path. Each request is evaluated against
//! the configured rule policy and forwarded, blocked, or escalated into a
//! human approval workflow before being forwarded.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use outpost_audit::{AuditLog, AuditSink};
use outpost_config::Config;
use outpost_core::AgentIdentity;
use outpost_grants::HttpGrantBroker;
use outpost_proxy::{HttpForwarder, NullIdentityVerifier, ProxyState, compile_policy, serve};

/// Outpost - egress authorization gateway
#[derive(Parser)]
#[command(name = "outpost")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway
    Run {
        /// Path to configuration file
        #[arg(short, long, default_value = "config.toml")]
        config: String,
    },

    /// Load and validate the configuration, print a summary, and exit
    Check {
        /// Path to configuration file
        #[arg(short, long, default_value = "config.toml")]
        config: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run { config } => run(&config).await,
        Commands::Check { config } => check(&config),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(config_path: &str) -> Result<()> {
    let config = Config::load(config_path)
        .with_context(|| format!("failed to load configuration from {config_path}"))?;

    let policy = compile_policy(&config).context("failed to compile rule policy")?;
    let (allow, deny, grants) = policy.rule_counts();

    let audit: Arc<dyn AuditSink> = match &config.proxy.audit_log {
        Some(path) => Arc::new(
            AuditLog::with_file(path)
                .with_context(|| format!("failed to open audit log {}", path.display()))?,
        ),
        None => Arc::new(AuditLog::stderr_only()),
    };

    let mut broker = HttpGrantBroker::new(&config.proxy.idp_url);
    if let Some(token) = &config.proxy.broker_token {
        broker = broker.with_token(token);
    }

    let forwarder = HttpForwarder::new().context("failed to build upstream client")?;

    let state = ProxyState::new(
        AgentIdentity::new(&config.proxy.agent_email),
        policy,
        Arc::new(broker),
        Arc::new(forwarder),
        Arc::new(NullIdentityVerifier),
        audit,
    )
    .with_grant_wait(Duration::from_secs(config.proxy.grant_wait_timeout_secs))
    .with_poll_interval(Duration::from_secs(config.proxy.grant_poll_interval_secs));

    info!(
        listen = %config.proxy.listen,
        idp = %config.proxy.idp_url,
        agent = %config.proxy.agent_email,
        default_action = %config.proxy.default_action,
        allow, deny, grants,
        "starting gateway"
    );

    serve(Arc::new(state), &config.proxy.listen).await?;
    info!("gateway stopped");
    Ok(())
}

fn check(config_path: &str) -> Result<()> {
    let config = Config::load(config_path)
        .with_context(|| format!("failed to load configuration from {config_path}"))?;
    let policy = compile_policy(&config).context("failed to compile rule policy")?;
    let (allow, deny, grants) = policy.rule_counts();

    println!("{}", "Configuration OK".green().bold());
    println!("  Listen:         {}", config.proxy.listen);
    println!("  IdP:            {}", config.proxy.idp_url);
    println!("  Agent:          {}", config.proxy.agent_email);
    println!("  Default action: {}", config.proxy.default_action);
    match &config.proxy.audit_log {
        Some(path) => println!("  Audit log:      {}", path.display()),
        None => println!("  Audit log:      (diagnostic stream only)"),
    }
    println!("  Rules:          {allow} allow, {deny} deny, {grants} grant-required");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
