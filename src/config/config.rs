use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;
use thiserror::Error;

use crate::breath::breath::Pattern;

pub const DEFAULT_WS_ADDR: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 8765));

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read pattern file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid pattern file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0} must be at least 1 second")]
    ZeroDuration(&'static str),
}

/// 4-7-8 breathing pacer for the terminal or a browser front end.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "zen_breath", version, about)]
pub struct Args {
    /// Serve the pacer over WebSocket instead of drawing it in the terminal
    #[arg(long)]
    pub daemon: bool,

    /// WebSocket bind address for daemon mode [default: 127.0.0.1:8765]
    #[arg(long)]
    pub addr: Option<SocketAddr>,

    /// JSON file with inhaleSeconds / holdSeconds / exhaleSeconds
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub inhale: Option<u32>,

    #[arg(long)]
    pub hold: Option<u32>,

    #[arg(long)]
    pub exhale: Option<u32>,

    /// Session log file
    #[arg(long, short = 'l')]
    pub log: Option<PathBuf>,

    /// Desktop notification after every completed cycle
    #[arg(long)]
    pub notify: bool,

    /// Start breathing right away
    #[arg(long)]
    pub autostart: bool,
}

/// On-disk pattern overrides. Every key is optional.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PatternFile {
    pub inhale_seconds: Option<u32>,
    pub hold_seconds: Option<u32>,
    pub exhale_seconds: Option<u32>,
}

impl PatternFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub daemon: bool,
    pub addr: SocketAddr,
    pub pattern: Pattern,
    pub log_file: Option<PathBuf>,
    pub notify: bool,
    pub autostart: bool,
}

impl Config {
    /// Resolve defaults, then the pattern file, then command-line overrides.
    pub fn from_args(args: Args) -> Result<Self, ConfigError> {
        let file = match args.config {
            Some(ref path) => PatternFile::load(path)?,
            None => PatternFile::default(),
        };

        let defaults = Pattern::default();
        let pattern = Pattern {
            inhale_seconds: args
                .inhale
                .or(file.inhale_seconds)
                .unwrap_or(defaults.inhale_seconds),
            hold_seconds: args
                .hold
                .or(file.hold_seconds)
                .unwrap_or(defaults.hold_seconds),
            exhale_seconds: args
                .exhale
                .or(file.exhale_seconds)
                .unwrap_or(defaults.exhale_seconds),
        };
        validate(&pattern)?;

        Ok(Self {
            daemon: args.daemon,
            addr: args.addr.unwrap_or(DEFAULT_WS_ADDR),
            pattern,
            log_file: args.log.or_else(default_log_file),
            notify: args.notify,
            autostart: args.autostart,
        })
    }
}

fn validate(pattern: &Pattern) -> Result<(), ConfigError> {
    if pattern.inhale_seconds == 0 {
        return Err(ConfigError::ZeroDuration("inhaleSeconds"));
    }
    if pattern.hold_seconds == 0 {
        return Err(ConfigError::ZeroDuration("holdSeconds"));
    }
    if pattern.exhale_seconds == 0 {
        return Err(ConfigError::ZeroDuration("exhaleSeconds"));
    }
    Ok(())
}

fn default_log_file() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")?;
    Some(PathBuf::from(home).join(".local/share/zen_breath/session.log"))
}
