//! Relay - UDP syslog ingestion service
//!
//! # Usage
//!
//! ```bash
//! # Run the service (default)
//! relay --config configs/relay.toml
//! relay --listen 127.0.0.1:5514 --log-level debug
//!
//! # Validate a configuration file
//! relay check --config configs/relay.toml
//! ```

mod cmd;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use relay_config::{Config, LogConfig, LogFormat, LogOutput};
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

/// Relay - UDP syslog ingestion service
#[derive(Parser, Debug)]
#[command(name = "relay")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (error if specified but not found)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). Overrides config file.
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Listen address (ip:port). Overrides [source] address and port.
    #[arg(long, global = true)]
    listen: Option<SocketAddr>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the relay
    Serve,

    /// Validate the configuration file and exit
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Check => cmd::check::run(cli.config.as_deref()),
        Command::Serve => {
            let mut config = load_config(cli.config.as_deref())?;
            if let Some(listen) = cli.listen {
                apply_listen(&mut config, listen)?;
            }

            let level = cli
                .log_level
                .as_deref()
                .unwrap_or(config.log.level.as_str())
                .to_string();
            init_logging(&level, &config.log)?;

            cmd::serve::run(config).await
        }
    }
}

/// Default config locations tried when `--config` is not given
const DEFAULT_CONFIG_PATHS: [&str; 2] = ["configs/relay.toml", "relay.toml"];

/// Load configuration: explicit path > default paths > built-in defaults
pub(crate) fn load_config(path: Option<&Path>) -> Result<Config> {
    if let Some(path) = path {
        if !path.exists() {
            anyhow::bail!("config file not found: {}", path.display());
        }
        return Config::from_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()));
    }

    for candidate in DEFAULT_CONFIG_PATHS {
        let candidate = Path::new(candidate);
        if candidate.exists() {
            return Config::from_file(candidate).with_context(|| {
                format!("failed to load configuration from {}", candidate.display())
            });
        }
    }

    Ok(Config::default())
}

/// Apply the `--listen` override and re-validate
fn apply_listen(config: &mut Config, listen: SocketAddr) -> Result<()> {
    config.source.address = listen.ip().to_string();
    config.source.port = listen.port();
    config
        .validate()
        .context("invalid configuration after --listen override")
}

/// Initialize the tracing subscriber for logging
fn init_logging(level: &str, log: &LogConfig) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    tracing_subscriber::registry()
        .with(fmt_layer(log))
        .with(filter)
        .init();

    Ok(())
}

fn fmt_layer(log: &LogConfig) -> Box<dyn Layer<Registry> + Send + Sync> {
    let layer = fmt::layer().with_target(true).with_thread_ids(false);
    match (log.format, log.output) {
        (LogFormat::Console, LogOutput::Stdout) => layer.boxed(),
        (LogFormat::Console, LogOutput::Stderr) => layer.with_writer(std::io::stderr).boxed(),
        (LogFormat::Json, LogOutput::Stdout) => layer.json().boxed(),
        (LogFormat::Json, LogOutput::Stderr) => layer.json().with_writer(std::io::stderr).boxed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listen_override() {
        let mut config = Config::default();
        apply_listen(&mut config, "127.0.0.1:5514".parse().unwrap()).unwrap();

        assert_eq!(config.source.address, "127.0.0.1");
        assert_eq!(config.source.port, 5514);
        assert_eq!(config.source.bind_address(), "127.0.0.1:5514");
    }

    #[test]
    fn test_listen_override_ipv6() {
        let mut config = Config::default();
        apply_listen(&mut config, "[::1]:514".parse().unwrap()).unwrap();
        assert_eq!(config.source.bind_address(), "[::1]:514");
    }

    #[test]
    fn test_load_explicit_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.toml");
        std::fs::write(&path, "[source]\nport = 5514\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.source.port, 5514);
    }

    #[test]
    fn test_load_missing_config_is_error() {
        let err = load_config(Some(Path::new("/nonexistent/relay.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn test_load_invalid_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.toml");
        std::fs::write(&path, "[source]\nqueue_size = 0\n").unwrap();

        assert!(load_config(Some(&path)).is_err());
    }

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::parse_from([
            "relay",
            "--config",
            "relay.toml",
            "--log-level",
            "debug",
            "--listen",
            "0.0.0.0:1514",
        ]);
        assert!(cli.command.is_none());
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.listen.map(|a| a.port()), Some(1514));

        let cli = Cli::parse_from(["relay", "check", "-c", "relay.toml"]);
        assert!(matches!(cli.command, Some(Command::Check)));
    }
}
