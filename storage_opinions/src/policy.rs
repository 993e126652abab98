//! Protocol rules layered on top of a structurally valid record.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{OpinionError, Result};
use crate::keys::{ParticipantKey, Signature};
use crate::payload::{OpinionHeader, OpinionPayload};
use crate::wire::{le_bytes, OpinionScalar};

/// Whether a judging key may rate itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelfOpinionPolicy {
    Permit,
    Forbid,
    /// Every judging key must rate itself.
    Require,
}

/// Applies `policy` to every judging row, reporting the first offending key.
pub fn check_self_opinions<H: OpinionHeader>(
    payload: &OpinionPayload<H>,
    policy: SelfOpinionPolicy,
) -> Result<()> {
    let partition = payload.partition();
    for (row, judge) in partition.judging_keys().iter().enumerate() {
        let rated_self = partition
            .self_column(row)
            .map_or(false, |col| payload.presence().get(row, col));
        let violated = match policy {
            SelfOpinionPolicy::Permit => false,
            SelfOpinionPolicy::Forbid => rated_self,
            SelfOpinionPolicy::Require => !rated_self,
        };
        if violated {
            return Err(OpinionError::SelfOpinion { key: *judge, policy });
        }
    }
    Ok(())
}

/// Signature scheme used to authenticate judge rows.
pub trait SignatureVerifier {
    fn verify(&self, key: &ParticipantKey, message: &[u8], signature: &Signature) -> bool;
}

impl<F> SignatureVerifier for F
where
    F: Fn(&ParticipantKey, &[u8], &Signature) -> bool,
{
    fn verify(&self, key: &ParticipantKey, message: &[u8], signature: &Signature) -> bool {
        self(key, message, signature)
    }
}

/// Bytes judge `row` signed: the common header followed by each rated key and
/// its little-endian value, in canonical judged order.
pub fn signed_message<H: OpinionHeader>(payload: &OpinionPayload<H>, row: usize) -> Option<Vec<u8>> {
    let judge_row = payload.rows().nth(row)?;
    let mut message = payload.common_data();
    append_cells(&mut message, judge_row.cells());
    Some(message)
}

/// Checks every judging key's signature over its row.
pub fn verify_signatures<H, V>(payload: &OpinionPayload<H>, verifier: &V) -> Result<()>
where
    H: OpinionHeader,
    V: SignatureVerifier + ?Sized,
{
    let common = payload.common_data();
    for row in payload.rows() {
        let mut message = common.clone();
        append_cells(&mut message, row.cells());
        if !verifier.verify(row.judge(), &message, row.signature()) {
            return Err(OpinionError::InvalidSignature { key: *row.judge() });
        }
    }
    trace!(
        target: "storage_opinions",
        kind = %H::KIND,
        judges = payload.partition().total_judging(),
        "verified opinion signatures"
    );
    Ok(())
}

fn append_cells<'a, S, I>(message: &mut Vec<u8>, cells: I)
where
    S: OpinionScalar,
    I: Iterator<Item = (&'a ParticipantKey, S)>,
{
    for (judged, value) in cells {
        message.extend_from_slice(judged.as_bytes());
        message.extend_from_slice(&le_bytes(&value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approval::{DataModificationApproval, DataModificationApprovalPayload};
    use crate::assemble::{assemble, SignedOpinion};
    use crate::keys::Hash256;

    fn key(byte: u8) -> ParticipantKey {
        ParticipantKey::new([byte; 32])
    }

    fn header() -> DataModificationApproval {
        DataModificationApproval {
            drive_key: key(0xDD),
            data_modification_id: Hash256::new([1; 32]),
            file_structure_cdi: Hash256::new([2; 32]),
            file_structure_size: 10,
            meta_files_size: 20,
            used_drive_size: 30,
        }
    }

    fn payload(opinions: &[SignedOpinion<u64>]) -> DataModificationApprovalPayload {
        assemble(header(), opinions).expect("assemble")
    }

    #[test]
    fn forbid_rejects_rating_self() {
        let p = payload(&[
            SignedOpinion::new(key(1), Signature::default(), vec![(key(2), 5)]),
            SignedOpinion::new(key(2), Signature::default(), vec![(key(2), 6)]),
        ]);
        assert!(check_self_opinions(&p, SelfOpinionPolicy::Permit).is_ok());
        let err = check_self_opinions(&p, SelfOpinionPolicy::Forbid).expect_err("self rating");
        assert_eq!(
            err,
            OpinionError::SelfOpinion {
                key: key(2),
                policy: SelfOpinionPolicy::Forbid
            }
        );
    }

    #[test]
    fn require_demands_every_judge_rates_self() {
        let all = payload(&[
            SignedOpinion::new(key(1), Signature::default(), vec![(key(1), 5), (key(2), 1)]),
            SignedOpinion::new(key(2), Signature::default(), vec![(key(2), 6)]),
        ]);
        assert!(check_self_opinions(&all, SelfOpinionPolicy::Require).is_ok());

        let partial = payload(&[
            SignedOpinion::new(key(1), Signature::default(), vec![(key(2), 5)]),
            SignedOpinion::new(key(2), Signature::default(), vec![(key(2), 6)]),
        ]);
        let err = check_self_opinions(&partial, SelfOpinionPolicy::Require).expect_err("missing");
        assert!(matches!(err, OpinionError::SelfOpinion { key: k, .. } if k == key(1)));
    }

    #[test]
    fn signed_message_is_common_data_then_row() {
        let p = payload(&[SignedOpinion::new(
            key(1),
            Signature::default(),
            vec![(key(3), 0x0102), (key(4), 7)],
        )]);
        let message = signed_message(&p, 0).expect("row 0");
        let common = p.common_data();
        assert_eq!(common.len(), 32 * 3 + 3 * 8);
        assert_eq!(&message[..common.len()], common.as_slice());
        // judged keys are latest-first: 4 then 3
        let row = &message[common.len()..];
        assert_eq!(&row[..32], key(4).as_bytes());
        assert_eq!(&row[32..40], &7u64.to_le_bytes());
        assert_eq!(&row[40..72], key(3).as_bytes());
        assert_eq!(&row[72..80], &0x0102u64.to_le_bytes());
        assert!(signed_message(&p, 1).is_none());
    }

    #[test]
    fn verify_signatures_reports_the_failing_judge() {
        let p = payload(&[
            SignedOpinion::new(key(1), Signature::new([1; 64]), vec![(key(3), 1)]),
            SignedOpinion::new(key(2), Signature::new([9; 64]), vec![(key(3), 2)]),
        ]);
        let matches_key = |k: &ParticipantKey, _: &[u8], s: &Signature| {
            s.as_bytes()[0] == k.as_bytes()[0]
        };
        let err = verify_signatures(&p, &matches_key).expect_err("judge 2 forged");
        assert_eq!(err, OpinionError::InvalidSignature { key: key(2) });

        let accept_all = |_: &ParticipantKey, _: &[u8], _: &Signature| true;
        assert!(verify_signatures(&p, &accept_all).is_ok());
    }
}
