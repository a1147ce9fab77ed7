use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

use crate::receipt::{BreakerConfig, RetryPolicy};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub gateway: GatewayConfig,
    /// PostgreSQL connection URL; the in-memory store is used when absent
    #[serde(default)]
    pub postgres_url: Option<String>,
    #[serde(default)]
    pub transfer: TransferConfig,
    #[serde(default)]
    pub receipt: ReceiptConfig,
    #[serde(default)]
    pub notification: NotificationConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TransferConfig {
    /// Upper bound on waiting for an account row lock
    pub lock_timeout_ms: u64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: 5000,
        }
    }
}

impl TransferConfig {
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

/// Receipt renderer retry and breaker settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ReceiptConfig {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub failure_threshold: u32,
    pub open_cooldown_ms: u64,
}

impl Default for ReceiptConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 200,
            max_backoff_ms: 2000,
            failure_threshold: 5,
            open_cooldown_ms: 30_000,
        }
    }
}

impl ReceiptConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
        }
    }

    pub fn breaker(&self) -> BreakerConfig {
        BreakerConfig {
            failure_threshold: self.failure_threshold.max(1),
            open_cooldown: Duration::from_millis(self.open_cooldown_ms),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NotificationConfig {
    pub topic: String,
    pub queue_size: usize,
    pub publish_timeout_ms: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            topic: crate::notification::TRANSFER_TOPIC.to_string(),
            queue_size: 1024,
            publish_timeout_ms: 1000,
        }
    }
}

impl NotificationConfig {
    pub fn publish_timeout(&self) -> Duration {
        Duration::from_millis(self.publish_timeout_ms)
    }
}

impl AppConfig {
    pub fn load(env: &str) -> anyhow::Result<Self> {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path))?;
        Self::parse(&content).with_context(|| format!("Failed to parse {}", config_path))
    }

    pub fn parse(yaml: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
log_level: info
log_dir: ./logs
log_file: banking.log
use_json: false
rotation: daily
gateway:
  host: 127.0.0.1
  port: 9000
"#;

    #[test]
    fn test_sections_default_when_missing() {
        let config = AppConfig::parse(MINIMAL).unwrap();
        assert_eq!(config.gateway.port, 9000);
        assert!(config.postgres_url.is_none());
        assert_eq!(config.transfer.lock_timeout(), Duration::from_secs(5));
        assert_eq!(config.receipt.retry_policy(), RetryPolicy::default());
        assert_eq!(config.notification.topic, "transfer-notifications");
    }

    #[test]
    fn test_overrides_applied() {
        let yaml = format!(
            "{MINIMAL}postgres_url: postgres://localhost/bank\ntransfer:\n  lock_timeout_ms: 750\nreceipt:\n  max_attempts: 0\n  initial_backoff_ms: 10\n  max_backoff_ms: 40\n  failure_threshold: 2\n  open_cooldown_ms: 100\n"
        );
        let config = AppConfig::parse(&yaml).unwrap();
        assert_eq!(config.postgres_url.as_deref(), Some("postgres://localhost/bank"));
        assert_eq!(config.transfer.lock_timeout(), Duration::from_millis(750));
        // Zero attempts would never call the renderer
        assert_eq!(config.receipt.retry_policy().max_attempts, 1);
        assert_eq!(config.receipt.breaker().failure_threshold, 2);
        assert_eq!(
            config.receipt.breaker().open_cooldown,
            Duration::from_millis(100)
        );
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(AppConfig::load("does-not-exist").is_err());
    }
}
