//! Runtime configuration.
//!
//! Every setting is a command-line flag with an environment fallback, so the
//! binary runs unchanged under systemd, Docker, or a shell.

use std::path::PathBuf;

use clap::Parser;

pub const DEFAULT_ADMIN_TOKEN: &str = "admin123";
pub const DEFAULT_MAX_BODY_MB: u64 = 25;

const BYTES_PER_MIB: u64 = 1024 * 1024;

#[derive(Debug, Clone, Parser)]
#[command(name = "guestboard", version, about = "Guestbook, project board and static site server")]
pub struct Config {
    /// Interface to listen on.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// TCP port to listen on.
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Shared secret for admin-only routes. Empty disables the check.
    #[arg(long, env = "ADMIN_TOKEN", default_value = DEFAULT_ADMIN_TOKEN, hide_env_values = true)]
    pub admin_token: String,

    /// Largest accepted request body, in MiB.
    #[arg(long, env = "MAX_BODY_MB", default_value_t = DEFAULT_MAX_BODY_MB)]
    pub max_body_mb: u64,

    /// Directory served for non-API paths.
    #[arg(long, env = "PUBLIC_DIR", default_value = "public")]
    pub public_dir: PathBuf,

    /// SQLite database file; created with its schema if missing.
    #[arg(long, env = "DB_PATH", default_value = "site.db")]
    pub db_path: PathBuf,
}

impl Config {
    /// `host:port`, ready for the listener.
    pub fn bind_addr(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    pub fn max_body_bytes(&self) -> u64 {
        self.max_body_mb.saturating_mul(BYTES_PER_MIB)
    }
}
