//! Server configuration
//!
//! Settings come from three layers, highest priority first:
//!
//! 1. CLI arguments
//! 2. Environment variables (with LOGSINK_ prefix)
//! 3. An optional JSON settings file
//!
//! Anything still unset falls back to the documented defaults: listen on
//! 0.0.0.0:5000, append to `logs.json`, one accepted submission per client
//! per 5 seconds, timestamps rendered in America/Toronto. A missing
//! settings file is fine; an unreadable or malformed one aborts startup.
//!
//! # Example Usage
//!
//! ```bash
//! # Using CLI arguments
//! logsink --port 13000 --log-file /var/log/fleet.json
//!
//! # Using environment variables
//! export LOGSINK_PORT=13000
//! export LOGSINK_RATE_LIMIT=10
//! logsink
//!
//! # Using a settings file (CLI and env override it)
//! logsink --config /etc/logsink/settings.json
//! ```

use anyhow::{Context, Result, anyhow};
use chrono_tz::Tz;
use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_LOG_FILE: &str = "logs.json";
const DEFAULT_RATE_LIMIT_SECS: u64 = 5;
const DEFAULT_TIMEZONE: Tz = chrono_tz::America::Toronto;

/// Resolved configuration consumed by the rest of the server.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the listening socket on
    pub host: String,
    /// Port to listen on (0 lets the OS pick one)
    pub port: u16,
    /// File receiving one JSON record per line
    pub log_file: PathBuf,
    /// Minimum interval between accepted submissions per client
    /// (zero disables rate limiting)
    pub rate_limit: Duration,
    /// Display timezone for server receipt timestamps
    pub timezone: Tz,
    /// Logging level (error, warn, info, debug, trace)
    pub log_level: String,
    /// Channel buffer size for actor communication
    pub buffer_size: usize,
}

/// Command-line arguments for the server
///
/// All arguments can also be set via environment variables with the
/// LOGSINK_ prefix. CLI arguments take precedence over environment
/// variables, which take precedence over the settings file.
#[derive(Parser, Debug)]
#[command(
    name = "logsink",
    about = "Centralized TCP log-ingestion server",
    long_about = "A centralized sink for distributed client processes: one newline-terminated \
                  JSON log record per TCP connection, rate-limited per client, appended to a \
                  JSON Lines file.\n\nEnvironment variables with LOGSINK_ prefix are supported. \
                  CLI arguments take precedence over environment variables, which take \
                  precedence over the settings file."
)]
pub struct Args {
    #[arg(
        long,
        value_name = "PATH",
        help = "Settings file (JSON)",
        default_value = "settings.json",
        env = "LOGSINK_CONFIG"
    )]
    pub config: PathBuf,

    #[arg(
        long,
        value_name = "HOST",
        help = "Address to bind",
        env = "LOGSINK_HOST"
    )]
    pub host: Option<String>,

    #[arg(
        long,
        value_name = "PORT",
        help = "Port to listen on",
        env = "LOGSINK_PORT"
    )]
    pub port: Option<u16>,

    #[arg(
        long,
        value_name = "PATH",
        help = "Log file path",
        env = "LOGSINK_LOG_FILE"
    )]
    pub log_file: Option<PathBuf>,

    #[arg(
        long,
        value_name = "SECS",
        help = "Minimum seconds between accepted submissions per client (0 disables)",
        env = "LOGSINK_RATE_LIMIT"
    )]
    pub rate_limit: Option<u64>,

    #[arg(
        long,
        value_name = "ZONE",
        help = "IANA timezone for server receipt timestamps",
        env = "LOGSINK_TIMEZONE"
    )]
    pub timezone: Option<Tz>,

    #[arg(
        long,
        value_name = "LEVEL",
        help = "Log level: error, warn, info, debug, trace",
        default_value = "info",
        env = "LOGSINK_LOG_LEVEL"
    )]
    pub log_level: String,

    #[arg(
        long,
        value_name = "SIZE",
        help = "Channel buffer size",
        default_value_t = 1024,
        env = "LOGSINK_BUFFER_SIZE"
    )]
    pub buffer_size: usize,
}

/// Optional JSON settings file.
///
/// All keys are optional:
///
/// ```json
/// {
///   "host": "0.0.0.0",
///   "serverPort": 5000,
///   "logFilePath": "logs.json",
///   "rateLimitSeconds": 5,
///   "timezone": "America/Toronto"
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileSettings {
    pub host: Option<String>,
    pub server_port: Option<u16>,
    pub log_file_path: Option<PathBuf>,
    pub rate_limit_seconds: Option<u64>,
    pub timezone: Option<String>,
}

impl FileSettings {
    /// Load settings from `path`.
    ///
    /// A missing file yields empty settings (defaults apply); a file that
    /// exists but cannot be read or parsed is a startup error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(FileSettings::default());
        }

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse settings file {}", path.display()))
    }
}

impl Config {
    /// Build the configuration from every source.
    ///
    /// Clap resolves CLI arguments against environment variables; the
    /// settings file named by `--config` fills anything left unset, and
    /// the documented defaults cover the rest.
    pub fn from_env_and_args() -> Result<Self> {
        let args = Args::parse();
        let settings = FileSettings::load(&args.config)?;
        Config::resolve(args, settings)
    }

    fn resolve(args: Args, settings: FileSettings) -> Result<Self> {
        let timezone = match args.timezone {
            Some(tz) => tz,
            None => match &settings.timezone {
                Some(name) => name
                    .parse()
                    .map_err(|e| anyhow!("invalid timezone {name:?} in settings file: {e}"))?,
                None => DEFAULT_TIMEZONE,
            },
        };

        Ok(Config {
            host: args
                .host
                .or(settings.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: args.port.or(settings.server_port).unwrap_or(DEFAULT_PORT),
            log_file: args
                .log_file
                .or(settings.log_file_path)
                .unwrap_or_else(|| DEFAULT_LOG_FILE.into()),
            rate_limit: Duration::from_secs(
                args.rate_limit
                    .or(settings.rate_limit_seconds)
                    .unwrap_or(DEFAULT_RATE_LIMIT_SECS),
            ),
            timezone,
            log_level: args.log_level,
            buffer_size: args.buffer_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn bare_args() -> Args {
        Args {
            config: "settings.json".into(),
            host: None,
            port: None,
            log_file: None,
            rate_limit: None,
            timezone: None,
            log_level: "info".to_string(),
            buffer_size: 1024,
        }
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = Config::resolve(bare_args(), FileSettings::default()).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 5000);
        assert_eq!(config.log_file, PathBuf::from("logs.json"));
        assert_eq!(config.rate_limit, Duration::from_secs(5));
        assert_eq!(config.timezone, chrono_tz::America::Toronto);
    }

    #[test]
    fn settings_file_overrides_defaults() {
        let settings: FileSettings = serde_json::from_str(
            r#"{"serverPort":13000,"logFilePath":"fleet.json","rateLimitSeconds":10,"timezone":"Asia/Tokyo"}"#,
        )
        .unwrap();
        let config = Config::resolve(bare_args(), settings).unwrap();

        assert_eq!(config.port, 13000);
        assert_eq!(config.log_file, PathBuf::from("fleet.json"));
        assert_eq!(config.rate_limit, Duration::from_secs(10));
        assert_eq!(config.timezone, chrono_tz::Asia::Tokyo);
    }

    #[test]
    fn cli_arguments_override_the_settings_file() {
        let mut args = bare_args();
        args.port = Some(9000);
        args.rate_limit = Some(0);
        let settings: FileSettings =
            serde_json::from_str(r#"{"serverPort":13000,"rateLimitSeconds":10}"#).unwrap();
        let config = Config::resolve(args, settings).unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.rate_limit, Duration::ZERO);
    }

    #[test]
    fn invalid_timezone_in_settings_is_rejected() {
        let settings: FileSettings =
            serde_json::from_str(r#"{"timezone":"Mars/Olympus_Mons"}"#).unwrap();

        assert!(Config::resolve(bare_args(), settings).is_err());
    }

    #[test]
    fn missing_settings_file_yields_empty_settings() {
        let dir = TempDir::new().unwrap();
        let settings = FileSettings::load(&dir.path().join("absent.json")).unwrap();

        assert!(settings.server_port.is_none());
        assert!(settings.log_file_path.is_none());
    }

    #[test]
    fn malformed_settings_file_is_a_startup_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not json at all").unwrap();

        assert!(FileSettings::load(&path).is_err());
    }
}
