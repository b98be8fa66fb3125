//! DRM configuration
//!
//! The engine performs the actual key exchange. This module only shapes
//! what the engine is told:
//! - ClearKey key maps built from a user-supplied key pair
//! - The retry policy for license requests
//! - The catalogue of key systems the engine may be probed for

use crate::{types::ClearKeyPair, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Retry policy for license requests
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetryPolicy {
    /// Per-attempt timeout in milliseconds
    #[serde(rename = "timeout")]
    pub timeout_ms: u64,
    pub max_attempts: u32,
    /// Delay before the first retry in milliseconds
    #[serde(rename = "baseDelay")]
    pub base_delay_ms: u64,
    pub backoff_factor: f64,
    /// Random jitter applied to each delay
    pub fuzz_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            max_attempts: 2,
            base_delay_ms: 1_000,
            backoff_factor: 2.0,
            fuzz_factor: 0.5,
        }
    }
}

impl RetryPolicy {
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(Error::InvalidConfig("retry.maxAttempts must be at least 1".to_string()));
        }
        if !self.backoff_factor.is_finite() || self.backoff_factor < 1.0 {
            return Err(Error::InvalidConfig("retry.backoffFactor must be >= 1".to_string()));
        }
        if !(0.0..=1.0).contains(&self.fuzz_factor) {
            return Err(Error::InvalidConfig("retry.fuzzFactor must be within [0, 1]".to_string()));
        }
        Ok(())
    }
}

/// DRM section of the engine configuration
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrmConfig {
    /// ClearKey key id -> key
    pub clear_keys: BTreeMap<String, String>,
    #[serde(rename = "retryParameters")]
    pub retry: RetryPolicy,
}

impl DrmConfig {
    /// Build the DRM section for a session.
    ///
    /// No key pair means an unencrypted session and no DRM section at all.
    pub fn build(key_pair: Option<&ClearKeyPair>, retry: RetryPolicy) -> Option<Self> {
        let pair = key_pair?;
        debug!(key_id = %pair.key_id, "ClearKey DRM configured");

        let mut clear_keys = BTreeMap::new();
        clear_keys.insert(pair.key_id.clone(), pair.key.clone());

        Some(Self { clear_keys, retry })
    }

    /// Label shown in the player information panel
    pub fn label(config: Option<&DrmConfig>) -> &'static str {
        match config {
            Some(c) if !c.clear_keys.is_empty() => KeySystem::ClearKey.name(),
            _ => "None",
        }
    }
}

impl std::fmt::Debug for DrmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrmConfig")
            .field("key_ids", &self.clear_keys.keys().collect::<Vec<_>>())
            .field("retry", &self.retry)
            .finish()
    }
}

/// Key systems the engine may support
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeySystem {
    Widevine,
    PlayReady,
    FairPlay,
    ClearKey,
}

impl KeySystem {
    /// Every key system, in probe order
    pub const ALL: [KeySystem; 4] = [
        KeySystem::Widevine,
        KeySystem::PlayReady,
        KeySystem::FairPlay,
        KeySystem::ClearKey,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            KeySystem::Widevine => "Widevine",
            KeySystem::PlayReady => "PlayReady",
            KeySystem::FairPlay => "FairPlay",
            KeySystem::ClearKey => "ClearKey",
        }
    }

    /// EME key-system string
    pub fn key_system_id(&self) -> &'static str {
        match self {
            KeySystem::Widevine => "com.widevine.alpha",
            KeySystem::PlayReady => "com.microsoft.playready",
            KeySystem::FairPlay => "com.apple.fps",
            KeySystem::ClearKey => "org.w3.clearkey",
        }
    }

    /// PSSH system id (UUID)
    pub fn system_id(&self) -> &'static str {
        match self {
            KeySystem::Widevine => "edef8ba9-79d6-4ace-a3c8-27dcd51d21ed",
            KeySystem::PlayReady => "9a04f079-9840-4286-ab92-e65be0885f95",
            KeySystem::FairPlay => "94ce86fb-07ff-4f43-adb8-93d2fa968ca2",
            KeySystem::ClearKey => "1077efec-c0b2-4d02-ace3-3c1e52e2fb4b",
        }
    }
}

impl std::fmt::Display for KeySystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_keys_no_config() {
        assert!(DrmConfig::build(None, RetryPolicy::default()).is_none());
        assert_eq!(DrmConfig::label(None), "None");
    }

    #[test]
    fn test_single_key_entry() {
        let pair = ClearKeyPair::new("k", "v");
        let config = DrmConfig::build(Some(&pair), RetryPolicy::default()).unwrap();

        assert_eq!(config.clear_keys.len(), 1);
        assert_eq!(config.clear_keys.get("k").map(String::as_str), Some("v"));
        assert_eq!(config.retry, RetryPolicy::default());
        assert_eq!(DrmConfig::label(Some(&config)), "ClearKey");
    }

    #[test]
    fn test_fixed_retry_policy() {
        let retry = RetryPolicy::default();
        assert_eq!(retry.timeout_ms, 30_000);
        assert_eq!(retry.max_attempts, 2);
        assert_eq!(retry.base_delay_ms, 1_000);
        assert_eq!(retry.backoff_factor, 2.0);
        assert_eq!(retry.fuzz_factor, 0.5);
    }

    #[test]
    fn test_engine_shape() {
        let pair = ClearKeyPair::new("ab12", "cd34");
        let config = DrmConfig::build(Some(&pair), RetryPolicy::default()).unwrap();
        let json = serde_json::to_value(&config).unwrap();

        assert_eq!(json["clearKeys"]["ab12"], "cd34");
        assert_eq!(json["retryParameters"]["timeout"], 30_000);
        assert_eq!(json["retryParameters"]["maxAttempts"], 2);
        assert_eq!(json["retryParameters"]["baseDelay"], 1_000);
        assert_eq!(json["retryParameters"]["backoffFactor"], 2.0);
        assert_eq!(json["retryParameters"]["fuzzFactor"], 0.5);
    }

    #[test]
    fn test_debug_hides_keys() {
        let pair = ClearKeyPair::new("ab12", "cd34");
        let config = DrmConfig::build(Some(&pair), RetryPolicy::default()).unwrap();
        let printed = format!("{:?}", config);
        assert!(printed.contains("ab12"));
        assert!(!printed.contains("cd34"));
    }

    #[test]
    fn test_retry_validation() {
        let mut retry = RetryPolicy::default();
        assert!(retry.validate().is_ok());
        retry.max_attempts = 0;
        assert!(retry.validate().is_err());
    }

    #[test]
    fn test_key_system_ids() {
        assert_eq!(KeySystem::ClearKey.key_system_id(), "org.w3.clearkey");
        assert_eq!(
            KeySystem::Widevine.system_id(),
            "edef8ba9-79d6-4ace-a3c8-27dcd51d21ed"
        );
    }
}
