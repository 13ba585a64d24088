use std::path::PathBuf;
use std::time::Duration;

use model::Snowflake;
use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    // Required
    pub discord_token: String,
    pub bot_id: Snowflake,

    #[serde(default = "default_api_base")]
    pub discord_api_base: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    // Snapshot storage, Postgres takes priority when configured
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: PathBuf,
    pub database_uri: Option<String>,
    #[serde(default = "one")]
    pub database_threads: u32,

    // Import pacing
    #[serde(default = "default_role_interval")]
    pub role_interval_ms: u64,
    #[serde(default = "default_channel_interval")]
    pub channel_interval_ms: u64,
    #[serde(default = "default_retries")]
    pub rate_limit_retries: u32,

    #[serde(default = "default_cooldown")]
    pub command_cooldown: u64,
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,

    // Observability
    pub sentry_dsn: Option<String>,
    #[serde(default)]
    pub json_log: bool,
    #[serde(default)]
    pub debug_mode: bool,
}

impl Config {
    pub fn from_envvar() -> Result<Config, envy::Error> {
        envy::from_env::<Config>()
    }

    pub fn role_interval(&self) -> Duration {
        Duration::from_millis(self.role_interval_ms)
    }

    pub fn channel_interval(&self) -> Duration {
        Duration::from_millis(self.channel_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.command_cooldown)
    }

    /// How long an import flow may sit idle before it is discarded.
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}

fn default_api_base() -> String {
    "https://discord.com/api/v10".to_owned()
}

fn default_request_timeout() -> u64 {
    15
}

fn default_snapshot_dir() -> PathBuf {
    PathBuf::from("exports")
}

fn one() -> u32 {
    1
}

fn default_role_interval() -> u64 {
    1000
}

fn default_channel_interval() -> u64 {
    2000
}

fn default_retries() -> u32 {
    3
}

fn default_cooldown() -> u64 {
    60
}

fn default_session_ttl() -> u64 {
    15 * 60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let vars = vec![
            ("DISCORD_TOKEN".to_owned(), "token".to_owned()),
            ("BOT_ID".to_owned(), "508391840525975553".to_owned()),
        ];

        let config: Config = envy::from_iter(vars).unwrap();
        assert_eq!(config.bot_id, Snowflake(508391840525975553));
        assert_eq!(config.role_interval(), Duration::from_secs(1));
        assert_eq!(config.channel_interval(), Duration::from_secs(2));
        assert_eq!(config.snapshot_dir, PathBuf::from("exports"));
        assert_eq!(config.cooldown(), Duration::from_secs(60));
        assert_eq!(config.session_ttl(), Duration::from_secs(900));
        assert!(config.database_uri.is_none());
    }

    #[test]
    fn test_missing_token() {
        let vars = vec![("BOT_ID".to_owned(), "1".to_owned())];
        assert!(envy::from_iter::<_, Config>(vars).is_err());
    }
}
