// src/config/mod.rs
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_CONFIG_PATH: &str = "FEEDTOOT_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "/etc/feedtoot/config.toml";
/// One leap year.
pub const MAX_INTERVAL_HOURS: u64 = 366 * 24;

fn default_feed_timeout_secs() -> u64 {
    30
}
fn default_server_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub run_as: RunAsConfig,
    pub schedule: ScheduleConfig,
    pub feed: FeedConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub metrics: Option<MetricsConfig>,
}

/// Unprivileged identity the process switches to after reading this file.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RunAsConfig {
    pub uid: u32,
    pub gid: u32,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleConfig {
    pub interval_hours: u64,
}

impl ScheduleConfig {
    /// Poll period, which doubles as the novelty window.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_hours.saturating_mul(3600))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeedConfig {
    pub url: String,
    #[serde(default = "default_feed_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Base URL of the destination instance, e.g. `https://mastodon.example`.
    #[serde(alias = "url")]
    pub host: String,
    pub access_token: String,
    #[serde(default = "default_server_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    pub listen: SocketAddr,
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading configuration from {}", path.display()))?;
        Self::parse(&data).with_context(|| format!("parsing configuration {}", path.display()))
    }

    pub fn parse(s: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        if self.schedule.interval_hours == 0 {
            bail!("schedule.interval_hours must be greater than zero");
        }
        if self.schedule.interval_hours > MAX_INTERVAL_HOURS {
            bail!(
                "schedule.interval_hours must be at most {MAX_INTERVAL_HOURS}, got {}",
                self.schedule.interval_hours
            );
        }
        if self.feed.url.trim().is_empty() {
            bail!("feed.url must not be empty");
        }
        if self.server.host.trim().is_empty() {
            bail!("server.host must not be empty");
        }
        Ok(())
    }
}

/// Resolve the configuration path:
/// 1) explicit path (CLI flag)
/// 2) $FEEDTOOT_CONFIG_PATH
/// 3) /etc/feedtoot/config.toml
pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    match std::env::var(ENV_CONFIG_PATH) {
        Ok(p) if !p.trim().is_empty() => PathBuf::from(p),
        _ => PathBuf::from(DEFAULT_CONFIG_PATH),
    }
}
