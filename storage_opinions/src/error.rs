use thiserror::Error;

use crate::keys::ParticipantKey;
use crate::policy::SelfOpinionPolicy;

/// Coarse failure classes surfaced to the transaction validation layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    StructuralMalformed,
    ClassificationAmbiguous,
    CapacityExceeded,
    PolicyViolation,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum OpinionError {
    #[error("malformed {section}: {reason}")]
    StructuralMalformed {
        section: &'static str,
        reason: String,
    },
    #[error("ambiguous classification of key {key}: {reason}")]
    ClassificationAmbiguous {
        key: ParticipantKey,
        reason: &'static str,
    },
    #[error("{field} {declared} exceeds limit {limit}")]
    CapacityExceeded {
        field: &'static str,
        declared: u64,
        limit: u64,
    },
    #[error("self opinion rule {policy:?} violated by key {key}")]
    SelfOpinion {
        key: ParticipantKey,
        policy: SelfOpinionPolicy,
    },
    #[error("signature of key {key} does not match its opinion")]
    InvalidSignature { key: ParticipantKey },
}

impl OpinionError {
    pub(crate) fn malformed(section: &'static str, reason: impl Into<String>) -> Self {
        OpinionError::StructuralMalformed {
            section,
            reason: reason.into(),
        }
    }

    pub(crate) fn capacity(field: &'static str, declared: u64, limit: u64) -> Self {
        OpinionError::CapacityExceeded {
            field,
            declared,
            limit,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            OpinionError::StructuralMalformed { .. } => ErrorKind::StructuralMalformed,
            OpinionError::ClassificationAmbiguous { .. } => ErrorKind::ClassificationAmbiguous,
            OpinionError::CapacityExceeded { .. } => ErrorKind::CapacityExceeded,
            OpinionError::SelfOpinion { .. } | OpinionError::InvalidSignature { .. } => {
                ErrorKind::PolicyViolation
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("opinion config io failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("opinion config parse failed: {0}")]
    Parse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, OpinionError>;
