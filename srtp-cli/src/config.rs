//! Keying configuration file support for SRTP CLI tools
//!
//! Master keys are given SDES style (RFC 4568): one base64 `inline` string
//! holding the master key immediately followed by the master salt.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use srtp::crypto::{AuthenticationType, CryptoPolicy, EncryptionType, MasterKeyMaterial};
use srtp::{SrtpError, SrtpTransformEngine};
use std::fs;
use std::path::Path;

/// Named crypto suite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Profile {
    #[serde(rename = "aes_cm_128_hmac_sha1_80")]
    AesCm128HmacSha1_80,
    #[serde(rename = "aes_cm_128_hmac_sha1_32")]
    AesCm128HmacSha1_32,
    #[serde(rename = "aes_cm_256_hmac_sha1_80")]
    AesCm256HmacSha1_80,
    #[serde(rename = "aes_f8_128_hmac_sha1_80")]
    AesF8_128HmacSha1_80,
    #[serde(rename = "null_hmac_sha1_80")]
    NullHmacSha1_80,
    #[serde(rename = "null_null")]
    NullNull,
    /// Parameters taken from the `custom` table
    #[serde(rename = "custom")]
    Custom,
}

/// Encryption algorithm name for custom policies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncryptionName {
    Null,
    AesCm,
    AesF8,
}

/// Authentication algorithm name for custom policies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthenticationName {
    Null,
    HmacSha1,
}

/// Explicit policy parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomPolicy {
    pub encryption: EncryptionName,
    pub authentication: AuthenticationName,
    pub enc_key_len: usize,
    #[serde(default)]
    pub auth_key_len: usize,
    #[serde(default = "default_salt_key_len")]
    pub salt_key_len: usize,
    #[serde(default)]
    pub auth_tag_len: usize,
}

fn default_salt_key_len() -> usize {
    14
}

/// Keying of one packet family (RTP or RTCP)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyConfig {
    /// Crypto suite
    pub profile: Profile,
    /// Base64 of master key || master salt
    pub inline: String,
    /// Key derivation rate (0 = derive once)
    #[serde(default)]
    pub kdr: u64,
    /// Optional base64 master key identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mki: Option<String>,
    /// Policy parameters for the `custom` profile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<CustomPolicy>,
}

impl KeyConfig {
    /// Resolve the crypto policy
    pub fn policy(&self) -> Result<CryptoPolicy, ConfigError> {
        let policy = match self.profile {
            Profile::AesCm128HmacSha1_80 => CryptoPolicy::aes_cm_128_hmac_sha1_80(),
            Profile::AesCm128HmacSha1_32 => CryptoPolicy::aes_cm_128_hmac_sha1_32(),
            Profile::AesCm256HmacSha1_80 => CryptoPolicy::aes_cm_256_hmac_sha1_80(),
            Profile::AesF8_128HmacSha1_80 => CryptoPolicy::aes_f8_128_hmac_sha1_80(),
            Profile::NullHmacSha1_80 => CryptoPolicy::null_hmac_sha1_80(),
            Profile::NullNull => CryptoPolicy::null_null(),
            Profile::Custom => {
                let custom = self.custom.as_ref().ok_or_else(|| {
                    ConfigError::Invalid("profile \"custom\" requires a custom table".to_string())
                })?;
                custom.policy()?
            }
        };
        Ok(policy)
    }

    /// Decode the master key material for `policy`
    pub fn master(&self, policy: &CryptoPolicy) -> Result<MasterKeyMaterial, ConfigError> {
        let inline = STANDARD.decode(self.inline.trim())?;
        let key_len = policy.enc_key_len();
        let expected = key_len + policy.salt_key_len();
        if inline.len() != expected {
            return Err(ConfigError::Invalid(format!(
                "inline key is {} bytes, profile needs {} (key {} + salt {})",
                inline.len(),
                expected,
                key_len,
                policy.salt_key_len()
            )));
        }

        let (key, salt) = inline.split_at(key_len);
        let mut master = MasterKeyMaterial::new(key, salt, self.kdr);
        if let Some(mki) = &self.mki {
            master = master.with_mki(&STANDARD.decode(mki.trim())?);
        }
        Ok(master)
    }
}

impl CustomPolicy {
    pub fn policy(&self) -> Result<CryptoPolicy, ConfigError> {
        let encryption = match self.encryption {
            EncryptionName::Null => EncryptionType::Null,
            EncryptionName::AesCm => EncryptionType::AesCm,
            EncryptionName::AesF8 => EncryptionType::AesF8,
        };
        let authentication = match self.authentication {
            AuthenticationName::Null => AuthenticationType::Null,
            AuthenticationName::HmacSha1 => AuthenticationType::HmacSha1,
        };
        Ok(CryptoPolicy::new(
            encryption,
            authentication,
            self.enc_key_len,
            self.auth_key_len,
            self.salt_key_len,
            self.auth_tag_len,
        )?)
    }
}

/// Combined configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// RTP keying
    pub rtp: KeyConfig,
    /// RTCP keying; defaults to the RTP section
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rtcp: Option<KeyConfig>,
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Config::parse(&contents)
    }

    /// Parse and validate TOML text
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Keying used for RTCP
    pub fn rtcp_keys(&self) -> &KeyConfig {
        self.rtcp.as_ref().unwrap_or(&self.rtp)
    }

    /// Check that both sections resolve to a policy and matching key material
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (section, keys) in [("rtp", &self.rtp), ("rtcp", self.rtcp_keys())] {
            let result = keys.policy().and_then(|policy| keys.master(&policy).map(|_| ()));
            if let Err(err) = result {
                tracing::warn!(section, %err, "rejecting keying configuration");
                return Err(err);
            }
        }
        Ok(())
    }

    /// Build the transform engine
    pub fn engine(&self) -> Result<SrtpTransformEngine, ConfigError> {
        let rtp_policy = self.rtp.policy()?;
        let rtp_master = self.rtp.master(&rtp_policy)?;
        let rtcp = self.rtcp_keys();
        let rtcp_policy = rtcp.policy()?;
        let rtcp_master = rtcp.master(&rtcp_policy)?;

        Ok(SrtpTransformEngine::with_keys(
            rtp_master,
            rtp_policy,
            rtcp_master,
            rtcp_policy,
        )?)
    }

    /// Example configuration keyed with the RFC 3711 Appendix B.3 master key
    pub fn example() -> Self {
        Config {
            rtp: KeyConfig {
                profile: Profile::AesCm128HmacSha1_80,
                inline: "4fl6DT4Bi+DWT6MsBt5BOQ7Gda1Jiv7rtpYLOqvm".to_string(),
                kdr: 0,
                mki: None,
                custom: None,
            },
            rtcp: None,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Invalid policy: {0}")]
    Policy(#[from] srtp::crypto::PolicyError),

    #[error("SRTP error: {0}")]
    Srtp(#[from] SrtpError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
