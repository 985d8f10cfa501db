//! Sync configuration

use std::env;
use std::time::Duration;

/// Configuration for the push endpoint
#[derive(Debug, Clone, Default)]
pub struct SyncConfig {
    /// Remote push endpoint (e.g., `https://sync.example.com/v1/push`)
    pub endpoint: Option<String>,
    /// Bearer token for the push endpoint
    pub auth_token: Option<String>,
    /// Automatic push interval (default: 60 seconds)
    pub push_interval: Option<Duration>,
}

impl SyncConfig {
    /// Create a new sync configuration
    pub fn new(endpoint: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
            auth_token: Some(auth_token.into()),
            push_interval: Some(Duration::from_secs(60)),
        }
    }

    /// Read `LOAM_SYNC_URL` / `LOAM_SYNC_TOKEN` from the environment
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            endpoint: env::var("LOAM_SYNC_URL").ok().filter(|s| !s.is_empty()),
            auth_token: env::var("LOAM_SYNC_TOKEN").ok().filter(|s| !s.is_empty()),
            push_interval: Some(Duration::from_secs(60)),
        }
    }

    /// Set the automatic push interval
    #[must_use]
    pub const fn with_push_interval(mut self, interval: Duration) -> Self {
        self.push_interval = Some(interval);
        self
    }

    /// Disable automatic push (explicit trigger only)
    #[must_use]
    pub const fn without_auto_push(mut self) -> Self {
        self.push_interval = None;
        self
    }

    /// Check if sync is configured
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sync_config_new() {
        let config = SyncConfig::new("https://sync.example.com/v1/push", "test-token");
        assert!(config.is_configured());
        assert_eq!(
            config.endpoint,
            Some("https://sync.example.com/v1/push".to_string())
        );
        assert_eq!(config.auth_token, Some("test-token".to_string()));
    }

    #[test]
    fn test_sync_config_default_not_configured() {
        let config = SyncConfig::default();
        assert!(!config.is_configured());
    }

    #[test]
    fn test_without_auto_push() {
        let config =
            SyncConfig::new("https://sync.example.com/v1/push", "t").without_auto_push();
        assert!(config.push_interval.is_none());
    }
}
