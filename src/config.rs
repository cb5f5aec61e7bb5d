//! Configuration for Lyceum
//!
//! CLI arguments and environment variable handling using clap.

use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Lyceum - knowledge base, exam and realtime chat server
#[derive(Parser, Debug, Clone)]
#[command(name = "lyceum")]
#[command(about = "Knowledge base, exam and realtime chat server")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:5008")]
    pub listen: SocketAddr,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "pretty")]
    pub log_format: LogFormat,

    /// Seconds an idle exam session is kept before it expires
    #[arg(long, env = "EXAM_SESSION_TTL_SECS", default_value = "3600")]
    pub exam_session_ttl_secs: u64,

    /// Seconds between sweeps of expired exam sessions
    #[arg(long, env = "EXAM_CLEANUP_INTERVAL_SECS", default_value = "60")]
    pub exam_cleanup_interval_secs: u64,

    /// JSON file replacing the built-in taxonomy
    #[arg(long, env = "TAXONOMY_FILE")]
    pub taxonomy_file: Option<PathBuf>,
}

/// Log output format
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    Pretty,
    /// One JSON object per line
    Json,
}

impl Args {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.exam_session_ttl_secs == 0 {
            return Err("EXAM_SESSION_TTL_SECS must be greater than zero".to_string());
        }

        if self.exam_cleanup_interval_secs == 0 {
            return Err("EXAM_CLEANUP_INTERVAL_SECS must be greater than zero".to_string());
        }

        if let Some(ref path) = self.taxonomy_file {
            if !path.is_file() {
                return Err(format!("TAXONOMY_FILE not found: {}", path.display()));
            }
        }

        Ok(())
    }
}

impl Default for Args {
    fn default() -> Self {
        Self::parse_from(["lyceum"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["lyceum"]);
        assert_eq!(args.listen.port(), 5008);
        assert_eq!(args.exam_session_ttl_secs, 3600);
        assert_eq!(args.log_format, LogFormat::Pretty);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let args = Args::parse_from(["lyceum", "--exam-session-ttl-secs", "0"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_missing_taxonomy_file_rejected() {
        let args = Args::parse_from(["lyceum", "--taxonomy-file", "/nonexistent/taxonomy.json"]);
        assert!(args.validate().unwrap_err().contains("TAXONOMY_FILE"));
    }
}
