//! Collected per-replicator opinions into one canonical record.

use std::collections::HashMap;

use tracing::debug;

use crate::classify::classify;
use crate::error::{OpinionError, Result};
use crate::flatten::flatten;
use crate::keys::{ParticipantKey, Signature};
use crate::payload::{OpinionHeader, OpinionPayload};
use crate::presence::PresenceMatrix;

/// One replicator's signed opinion about the keys it rated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedOpinion<S> {
    pub judge: ParticipantKey,
    pub signature: Signature,
    pub entries: Vec<(ParticipantKey, S)>,
}

impl<S> SignedOpinion<S> {
    pub fn new(judge: ParticipantKey, signature: Signature, entries: Vec<(ParticipantKey, S)>) -> Self {
        Self {
            judge,
            signature,
            entries,
        }
    }
}

/// Merges signed opinions into a record under `header`.
///
/// Judges that rated nothing are dropped along with their signatures. The
/// result is already validated and encodes with [`OpinionPayload::to_bytes`].
pub fn assemble<H: OpinionHeader>(
    header: H,
    opinions: &[SignedOpinion<H::Scalar>],
) -> Result<OpinionPayload<H>> {
    let partition = classify(
        opinions
            .iter()
            .map(|opinion| (&opinion.judge, opinion.entries.iter().map(|(key, _)| key))),
    )?;

    for opinion in opinions.iter().filter(|opinion| opinion.entries.is_empty()) {
        debug!(
            target: "storage_opinions",
            kind = %H::KIND,
            judge = %opinion.judge,
            "dropping signer without opinions"
        );
    }

    let by_judge: HashMap<ParticipantKey, &SignedOpinion<H::Scalar>> = opinions
        .iter()
        .map(|opinion| (opinion.judge, opinion))
        .collect();
    let columns = partition.judged_positions();
    let rows = partition.total_judging();
    let mut presence = PresenceMatrix::new(rows, partition.total_judged());
    let mut signatures = Vec::with_capacity(rows);
    let mut values = HashMap::new();

    for (row, judge) in partition.judging_keys().iter().enumerate() {
        let opinion = by_judge.get(judge).ok_or_else(|| {
            OpinionError::malformed("signatures", format!("no opinion submitted by {judge}"))
        })?;
        signatures.push(opinion.signature);
        for (judged, value) in &opinion.entries {
            let col = *columns.get(judged).ok_or_else(|| {
                OpinionError::malformed("public keys", format!("{judged} missing from judged keys"))
            })?;
            presence.set(row, col)?;
            values.insert((row, col), *value);
        }
    }

    let flattened = flatten(&presence, |row, col| values.remove(&(row, col)))?;
    let payload = OpinionPayload::new(header, partition, signatures, presence, flattened)?;
    debug!(
        target: "storage_opinions",
        kind = %H::KIND,
        judges = payload.partition().total_judging(),
        judged = payload.partition().total_judged(),
        opinions = payload.opinions().len(),
        "assembled opinion payload"
    );
    Ok(payload)
}
