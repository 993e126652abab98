//! Judging / overlapping / judged key partition.
//!
//! The canonical key order is embedded on chain, so it is derived only from
//! the order in which keys first occur in the submitted opinions. Hash sets are
//! used for membership tests, never for iteration.

use std::collections::{HashMap, HashSet};

use crate::error::{OpinionError, Result};
use crate::keys::ParticipantKey;

/// Disjoint key groups in canonical order: `judging_only ++ overlapping ++ judged_only`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyPartition {
    keys: Vec<ParticipantKey>,
    judging_only: usize,
    overlapping: usize,
}

impl KeyPartition {
    /// Builds a partition from explicit groups, rejecting any key that would
    /// appear more than once.
    pub fn from_groups(
        judging_only: Vec<ParticipantKey>,
        overlapping: Vec<ParticipantKey>,
        judged_only: Vec<ParticipantKey>,
    ) -> Result<Self> {
        let judging_only_len = judging_only.len();
        let overlapping_len = overlapping.len();
        let mut keys = judging_only;
        keys.extend(overlapping);
        keys.extend(judged_only);
        if let Some(key) = first_duplicate(&keys) {
            return Err(OpinionError::ClassificationAmbiguous {
                key,
                reason: "key assigned to more than one role",
            });
        }
        Ok(Self {
            keys,
            judging_only: judging_only_len,
            overlapping: overlapping_len,
        })
    }

    /// Rebuilds a partition from keys read off the wire.
    pub fn from_canonical(
        keys: Vec<ParticipantKey>,
        judging_only: usize,
        overlapping: usize,
    ) -> Result<Self> {
        if judging_only + overlapping > keys.len() {
            return Err(OpinionError::malformed(
                "public keys",
                format!(
                    "{} keys cannot hold {judging_only} judging and {overlapping} overlapping keys",
                    keys.len()
                ),
            ));
        }
        if let Some(key) = first_duplicate(&keys) {
            return Err(OpinionError::malformed(
                "public keys",
                format!("key {key} listed more than once"),
            ));
        }
        Ok(Self {
            keys,
            judging_only,
            overlapping,
        })
    }

    pub fn keys(&self) -> &[ParticipantKey] {
        &self.keys
    }

    pub fn judging_only(&self) -> &[ParticipantKey] {
        &self.keys[..self.judging_only]
    }

    pub fn overlapping(&self) -> &[ParticipantKey] {
        &self.keys[self.judging_only..self.judging_only + self.overlapping]
    }

    pub fn judged_only(&self) -> &[ParticipantKey] {
        &self.keys[self.judging_only + self.overlapping..]
    }

    /// Keys that submitted an opinion, in row order.
    pub fn judging_keys(&self) -> &[ParticipantKey] {
        &self.keys[..self.judging_only + self.overlapping]
    }

    /// Keys that were opined about, in column order.
    pub fn judged_keys(&self) -> &[ParticipantKey] {
        &self.keys[self.judging_only..]
    }

    pub fn total_judging(&self) -> usize {
        self.judging_only + self.overlapping
    }

    pub fn total_judged(&self) -> usize {
        self.keys.len() - self.judging_only
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Column index of every judged key.
    pub fn judged_positions(&self) -> HashMap<ParticipantKey, usize> {
        self.judged_keys()
            .iter()
            .enumerate()
            .map(|(index, key)| (*key, index))
            .collect()
    }

    /// Column index of the judging key at `row`, when that key is also judged.
    pub fn self_column(&self, row: usize) -> Option<usize> {
        if row >= self.judging_only && row < self.total_judging() {
            Some(row - self.judging_only)
        } else {
            None
        }
    }
}

fn first_duplicate(keys: &[ParticipantKey]) -> Option<ParticipantKey> {
    let mut seen = HashSet::with_capacity(keys.len());
    keys.iter().find(|key| !seen.insert(**key)).copied()
}

/// Partitions the participants of an opinion set.
///
/// `opinions` yields each judge together with the keys it opined on, in
/// submission order. A judge with no judged keys submitted nothing and takes
/// no judging role. Both the judging and the judged sequences are ordered
/// latest-first by first occurrence; a judging key that is also judged lands
/// in the overlapping group exactly once.
pub fn classify<'a, I, J>(opinions: I) -> Result<KeyPartition>
where
    I: IntoIterator<Item = (&'a ParticipantKey, J)>,
    J: IntoIterator<Item = &'a ParticipantKey>,
{
    let mut submitted = HashSet::new();
    let mut judging = Vec::new();
    let mut judging_set = HashSet::new();
    let mut judged = Vec::new();
    let mut judged_set = HashSet::new();

    for (judge, targets) in opinions {
        if !submitted.insert(*judge) {
            return Err(OpinionError::ClassificationAmbiguous {
                key: *judge,
                reason: "judge submitted more than one opinion",
            });
        }
        let mut row = HashSet::new();
        for target in targets {
            if !row.insert(*target) {
                return Err(OpinionError::ClassificationAmbiguous {
                    key: *target,
                    reason: "judged more than once by the same judge",
                });
            }
            if judged_set.insert(*target) {
                judged.push(*target);
            }
        }
        if !row.is_empty() {
            judging_set.insert(*judge);
            judging.push(*judge);
        }
    }

    let mut judging_only = Vec::new();
    let mut overlapping = Vec::new();
    for key in judging.iter().rev() {
        if judged_set.contains(key) {
            overlapping.push(*key);
        } else {
            judging_only.push(*key);
        }
    }
    let judged_only: Vec<ParticipantKey> = judged
        .iter()
        .rev()
        .filter(|key| !judging_set.contains(*key))
        .copied()
        .collect();

    KeyPartition::from_groups(judging_only, overlapping, judged_only)
}
