use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, OpinionError, Result};
use crate::payload::TransactionKind;
use crate::policy::SelfOpinionPolicy;

/// Upper bounds enforced on record headers before any section is allocated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpinionLimits {
    pub max_keys: u32,
    pub max_judging_keys: u32,
    pub max_opinion_elements: u32,
}

impl OpinionLimits {
    pub const fn new(max_keys: u32, max_judging_keys: u32, max_opinion_elements: u32) -> Self {
        Self {
            max_keys,
            max_judging_keys,
            max_opinion_elements,
        }
    }

    /// Rejects header counts above the configured bounds.
    pub fn check(&self, total_keys: u64, judging_keys: u64, opinion_elements: u64) -> Result<()> {
        if total_keys > u64::from(self.max_keys) {
            return Err(OpinionError::capacity(
                "public key count",
                total_keys,
                u64::from(self.max_keys),
            ));
        }
        if judging_keys > u64::from(self.max_judging_keys) {
            return Err(OpinionError::capacity(
                "judging key count",
                judging_keys,
                u64::from(self.max_judging_keys),
            ));
        }
        if opinion_elements > u64::from(self.max_opinion_elements) {
            return Err(OpinionError::capacity(
                "opinion element count",
                opinion_elements,
                u64::from(self.max_opinion_elements),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindConfig {
    #[serde(default = "default_approval_max_keys")]
    pub max_keys: u32,
    #[serde(default = "default_approval_max_keys")]
    pub max_judging_keys: u32,
    #[serde(default = "default_approval_max_elements")]
    pub max_opinion_elements: u32,
    #[serde(default)]
    pub self_opinions: Option<SelfOpinionPolicy>,
}

impl KindConfig {
    pub fn limits(&self) -> OpinionLimits {
        OpinionLimits::new(
            self.max_keys,
            self.max_judging_keys,
            self.max_opinion_elements,
        )
    }
}

impl Default for KindConfig {
    fn default() -> Self {
        Self {
            max_keys: default_approval_max_keys(),
            max_judging_keys: default_approval_max_keys(),
            max_opinion_elements: default_approval_max_elements(),
            self_opinions: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationConfig {
    #[serde(default = "default_verification_max_keys")]
    pub max_keys: u32,
    #[serde(default = "default_verification_max_keys")]
    pub max_judging_keys: u32,
    #[serde(default = "default_verification_max_elements")]
    pub max_opinion_elements: u32,
    #[serde(default)]
    pub self_opinions: Option<SelfOpinionPolicy>,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            max_keys: default_verification_max_keys(),
            max_judging_keys: default_verification_max_keys(),
            max_opinion_elements: default_verification_max_elements(),
            self_opinions: None,
        }
    }
}

impl VerificationConfig {
    pub fn limits(&self) -> OpinionLimits {
        OpinionLimits::new(
            self.max_keys,
            self.max_judging_keys,
            self.max_opinion_elements,
        )
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub data_modification_approval: KindConfig,
    #[serde(default)]
    pub download_approval: KindConfig,
    #[serde(default)]
    pub end_drive_verification: VerificationConfig,
}

impl Config {
    pub fn from_toml_str(text: &str) -> std::result::Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> std::result::Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn limits_for(&self, kind: TransactionKind) -> OpinionLimits {
        match kind {
            TransactionKind::DataModificationApproval => self.data_modification_approval.limits(),
            TransactionKind::DownloadApproval => self.download_approval.limits(),
            TransactionKind::EndDriveVerification => self.end_drive_verification.limits(),
        }
    }

    /// Self opinion rule for `kind`, falling back to the kind's protocol rule.
    pub fn self_opinions_for(&self, kind: TransactionKind) -> SelfOpinionPolicy {
        let configured = match kind {
            TransactionKind::DataModificationApproval => {
                self.data_modification_approval.self_opinions
            }
            TransactionKind::DownloadApproval => self.download_approval.self_opinions,
            TransactionKind::EndDriveVerification => self.end_drive_verification.self_opinions,
        };
        configured.unwrap_or_else(|| kind.default_self_opinions())
    }
}

fn default_approval_max_keys() -> u32 {
    u32::from(u8::MAX)
}

fn default_approval_max_elements() -> u32 {
    u32::from(u16::MAX)
}

fn default_verification_max_keys() -> u32 {
    1_024
}

fn default_verification_max_elements() -> u32 {
    1_024 * 1_024
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let cfg = Config::from_toml_str("").expect("parse");
        assert_eq!(cfg, Config::default());
        assert_eq!(
            cfg.limits_for(TransactionKind::DownloadApproval),
            OpinionLimits::new(255, 255, 65_535)
        );
        assert_eq!(
            cfg.limits_for(TransactionKind::EndDriveVerification).max_keys,
            1_024
        );
    }

    #[test]
    fn sections_override_individual_fields() {
        let cfg = Config::from_toml_str(
            r#"
            [download_approval]
            max_keys = 16
            self_opinions = "permit"

            [end_drive_verification]
            max_opinion_elements = 64
            "#,
        )
        .expect("parse");
        let download = cfg.limits_for(TransactionKind::DownloadApproval);
        assert_eq!(download.max_keys, 16);
        assert_eq!(download.max_judging_keys, 255);
        assert_eq!(
            cfg.self_opinions_for(TransactionKind::DownloadApproval),
            SelfOpinionPolicy::Permit
        );
        assert_eq!(
            cfg.self_opinions_for(TransactionKind::DataModificationApproval),
            SelfOpinionPolicy::Forbid
        );
        assert_eq!(
            cfg.limits_for(TransactionKind::EndDriveVerification)
                .max_opinion_elements,
            64
        );
    }

    #[test]
    fn limits_reject_each_field() {
        let limits = OpinionLimits::new(4, 2, 3);
        assert!(limits.check(4, 2, 3).is_ok());
        assert!(matches!(
            limits.check(5, 2, 3),
            Err(OpinionError::CapacityExceeded {
                field: "public key count",
                ..
            })
        ));
        assert!(limits.check(4, 3, 3).is_err());
        assert!(limits.check(4, 2, 4).is_err());
    }

    #[test]
    fn malformed_document_is_a_parse_error() {
        let err = Config::from_toml_str("[download_approval]\nmax_keys = \"many\"")
            .expect_err("type mismatch");
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
