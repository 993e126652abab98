#![forbid(unsafe_code)]

//! Canonical opinion records for multi-replicator storage transactions.
//!
//! Replicators submit partially overlapping opinions about one another. This
//! crate partitions the participants into judging-only, overlapping and
//! judged-only keys, packs who-rated-whom into a presence bitmap, flattens the
//! values, and encodes the result in a deterministic little-endian layout that
//! every validator decodes identically.

pub mod approval;
pub mod assemble;
pub mod classify;
pub mod config;
pub mod consumer;
pub mod download;
pub mod error;
pub mod flatten;
pub mod keys;
pub mod payload;
pub mod policy;
pub mod presence;
pub mod single;
pub mod verification;
pub mod wire;

pub use approval::{DataModificationApproval, DataModificationApprovalPayload};
pub use assemble::{assemble, SignedOpinion};
pub use classify::{classify, KeyPartition};
pub use config::{Config, KindConfig, OpinionLimits, VerificationConfig};
pub use consumer::{JudgeRow, OpinionObserver, Rows, Triples};
pub use download::{DownloadApproval, DownloadApprovalPayload};
pub use error::{ConfigError, ErrorKind, OpinionError, Result};
pub use keys::{Hash256, ParticipantKey, Signature, HASH_SIZE, KEY_SIZE, SIGNATURE_SIZE};
pub use payload::{OpinionHeader, OpinionPayload, TransactionKind};
pub use policy::{
    check_self_opinions, signed_message, verify_signatures, SelfOpinionPolicy, SignatureVerifier,
};
pub use presence::PresenceMatrix;
pub use single::SingleApproval;
pub use verification::{EndDriveVerification, EndDriveVerificationPayload};
pub use wire::{CountWidth, OpinionScalar};
