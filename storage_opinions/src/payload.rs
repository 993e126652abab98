//! Generic opinion record shared by every multi-replicator transaction.
//!
//! Layout, all integers little-endian:
//!
//! ```text
//! common header          kind specific
//! judging-only count     count width
//! overlapping count      count width
//! judged-only count      count width
//! opinion element count  element-count width
//! keys                   (J + O + D) × 32, canonical order
//! signatures             (J + O) × 64, judging order
//! presence matrix        ceil((J + O)(O + D) / 8)
//! opinions               element count × scalar width
//! ```

use core::fmt;

use tracing::{debug, trace};

use crate::classify::KeyPartition;
use crate::config::OpinionLimits;
use crate::error::{OpinionError, Result};
use crate::keys::{ParticipantKey, Signature, KEY_SIZE, SIGNATURE_SIZE};
use crate::policy::SelfOpinionPolicy;
use crate::presence::PresenceMatrix;
use crate::wire::{CountWidth, OpinionScalar, WireReader, WireWriter};

const TRACE_TARGET: &str = "storage_opinions";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    DataModificationApproval,
    DownloadApproval,
    EndDriveVerification,
}

impl TransactionKind {
    pub const ALL: [TransactionKind; 3] = [
        TransactionKind::DataModificationApproval,
        TransactionKind::DownloadApproval,
        TransactionKind::EndDriveVerification,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::DataModificationApproval => "data_modification_approval",
            TransactionKind::DownloadApproval => "download_approval",
            TransactionKind::EndDriveVerification => "end_drive_verification",
        }
    }

    /// Self opinion rule the protocol applies when no override is configured.
    pub fn default_self_opinions(self) -> SelfOpinionPolicy {
        match self {
            TransactionKind::DataModificationApproval => SelfOpinionPolicy::Forbid,
            TransactionKind::DownloadApproval => SelfOpinionPolicy::Require,
            TransactionKind::EndDriveVerification => SelfOpinionPolicy::Forbid,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific prefix of an opinion record.
///
/// Implementors fix the widths of the count fields and of each opinion value;
/// everything after the common header is shared.
pub trait OpinionHeader: Clone + PartialEq + fmt::Debug {
    type Scalar: OpinionScalar;

    const KIND: TransactionKind;
    const COUNT_WIDTH: CountWidth;
    const ELEMENT_COUNT_WIDTH: CountWidth;
    /// Encoded size of the fields written by [`OpinionHeader::write_common`].
    const COMMON_SIZE: usize;

    fn write_common(&self, writer: &mut WireWriter);

    fn read_common(reader: &mut WireReader<'_>) -> Result<Self>;
}

/// Decoded or assembled opinion record.
///
/// Construction always goes through [`OpinionPayload::new`], so every value of
/// this type satisfies the structural invariants of the record: disjoint key
/// groups, one signature per judging key, a presence matrix sized to the
/// partition whose popcount matches the opinion count, and at least one cell in
/// every judging row and every judged column.
#[derive(Clone, Debug, PartialEq)]
pub struct OpinionPayload<H: OpinionHeader> {
    header: H,
    partition: KeyPartition,
    signatures: Vec<Signature>,
    presence: PresenceMatrix,
    opinions: Vec<H::Scalar>,
}

impl<H: OpinionHeader> OpinionPayload<H> {
    pub fn new(
        header: H,
        partition: KeyPartition,
        signatures: Vec<Signature>,
        presence: PresenceMatrix,
        opinions: Vec<H::Scalar>,
    ) -> Result<Self> {
        H::COUNT_WIDTH.check("judging-only key count", partition.judging_only().len())?;
        H::COUNT_WIDTH.check("overlapping key count", partition.overlapping().len())?;
        H::COUNT_WIDTH.check("judged-only key count", partition.judged_only().len())?;
        H::ELEMENT_COUNT_WIDTH.check("opinion element count", opinions.len())?;

        let rows = partition.total_judging();
        let cols = partition.total_judged();
        if signatures.len() != rows {
            return Err(OpinionError::malformed(
                "signatures",
                format!("{} signatures for {rows} judging keys", signatures.len()),
            ));
        }
        if presence.rows() != rows || presence.cols() != cols {
            return Err(OpinionError::malformed(
                "presence matrix",
                format!(
                    "{}x{} grid for {rows} judging and {cols} judged keys",
                    presence.rows(),
                    presence.cols()
                ),
            ));
        }
        let present = presence.count_ones();
        if present != opinions.len() {
            return Err(OpinionError::malformed(
                "opinions",
                format!("{} values for {present} present cells", opinions.len()),
            ));
        }

        let mut row_seen = vec![false; rows];
        let mut col_seen = vec![false; cols];
        for (row, col) in presence.iter() {
            row_seen[row] = true;
            col_seen[col] = true;
        }
        if let Some(row) = row_seen.iter().position(|seen| !seen) {
            return Err(OpinionError::malformed(
                "presence matrix",
                format!(
                    "judging key {} has no opinion cells",
                    partition.judging_keys()[row]
                ),
            ));
        }
        if let Some(col) = col_seen.iter().position(|seen| !seen) {
            return Err(OpinionError::malformed(
                "presence matrix",
                format!("judged key {} is never judged", partition.judged_keys()[col]),
            ));
        }

        Ok(Self {
            header,
            partition,
            signatures,
            presence,
            opinions,
        })
    }

    /// Validates explicit key groups and sections, then encodes the record.
    pub fn build(
        header: H,
        judging_only: Vec<ParticipantKey>,
        overlapping: Vec<ParticipantKey>,
        judged_only: Vec<ParticipantKey>,
        signatures: Vec<Signature>,
        presence_bytes: &[u8],
        opinions: Vec<H::Scalar>,
    ) -> Result<Vec<u8>> {
        let partition = KeyPartition::from_groups(judging_only, overlapping, judged_only)?;
        let presence = PresenceMatrix::from_bytes(
            presence_bytes,
            partition.total_judging(),
            partition.total_judged(),
        )?;
        Self::new(header, partition, signatures, presence, opinions)?.to_bytes()
    }

    /// Size of the fixed prefix: common header plus the four count fields.
    pub fn header_size() -> usize {
        H::COMMON_SIZE + 3 * H::COUNT_WIDTH.size() + H::ELEMENT_COUNT_WIDTH.size()
    }

    pub fn encoded_len(&self) -> usize {
        // Every section already lives in memory, so the sum cannot overflow.
        Self::header_size()
            + self.partition.keys().len() * KEY_SIZE
            + self.signatures.len() * SIGNATURE_SIZE
            + self.presence.as_bytes().len()
            + self.opinions.len() * H::Scalar::WIDTH
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = WireWriter::with_capacity(self.encoded_len());
        self.header.write_common(&mut writer);
        H::COUNT_WIDTH.write(
            &mut writer,
            "judging-only key count",
            self.partition.judging_only().len(),
        )?;
        H::COUNT_WIDTH.write(
            &mut writer,
            "overlapping key count",
            self.partition.overlapping().len(),
        )?;
        H::COUNT_WIDTH.write(
            &mut writer,
            "judged-only key count",
            self.partition.judged_only().len(),
        )?;
        H::ELEMENT_COUNT_WIDTH.write(&mut writer, "opinion element count", self.opinions.len())?;
        for key in self.partition.keys() {
            writer.write_fixed(key.as_bytes());
        }
        for signature in &self.signatures {
            writer.write_fixed(signature.as_bytes());
        }
        writer.write_fixed(self.presence.as_bytes());
        for value in &self.opinions {
            value.write_wire(&mut writer);
        }
        trace!(
            target: TRACE_TARGET,
            kind = %H::KIND,
            bytes = writer.len(),
            "encoded opinion payload"
        );
        Ok(writer.finish())
    }

    /// Decodes a record, enforcing `limits` before any section is allocated.
    pub fn parse(bytes: &[u8], limits: &OpinionLimits) -> Result<Self> {
        let mut reader = WireReader::new(bytes);
        let header = H::read_common(&mut reader)?;
        let judging_only = H::COUNT_WIDTH.read(&mut reader, "judging-only key count")?;
        let overlapping = H::COUNT_WIDTH.read(&mut reader, "overlapping key count")?;
        let judged_only = H::COUNT_WIDTH.read(&mut reader, "judged-only key count")?;
        let elements = H::ELEMENT_COUNT_WIDTH.read(&mut reader, "opinion element count")?;

        // Counts are at most u32 wide, so these sums fit in u64.
        let total_keys = judging_only + overlapping + judged_only;
        let judging = judging_only + overlapping;
        limits.check(total_keys, judging, elements)?;

        let judging_only = to_usize(judging_only, "judging-only key count")?;
        let overlapping = to_usize(overlapping, "overlapping key count")?;
        let total_keys = to_usize(total_keys, "public key count")?;
        let elements = to_usize(elements, "opinion element count")?;
        let rows = judging_only + overlapping;
        let cols = total_keys - judging_only;
        let cells = rows.checked_mul(cols).ok_or_else(|| {
            OpinionError::malformed("presence matrix", format!("{rows}x{cols} grid overflows"))
        })?;
        if elements > cells {
            return Err(OpinionError::malformed(
                "opinion element count",
                format!("{elements} opinions declared for {cells} cells"),
            ));
        }

        let expected = body_len::<H::Scalar>(total_keys, rows, cells, elements).ok_or_else(|| {
            OpinionError::malformed("record", "declared section sizes overflow")
        })?;
        if reader.remaining() != expected {
            return Err(OpinionError::malformed(
                "record",
                format!(
                    "header declares {expected} bytes after offset {}, found {}",
                    reader.offset(),
                    reader.remaining()
                ),
            ));
        }

        let mut keys = Vec::with_capacity(total_keys);
        for _ in 0..total_keys {
            keys.push(ParticipantKey::new(reader.read_array("public keys")?));
        }
        let partition = KeyPartition::from_canonical(keys, judging_only, overlapping)?;

        let mut signatures = Vec::with_capacity(rows);
        for _ in 0..rows {
            signatures.push(Signature::new(reader.read_array("signatures")?));
        }

        let presence_bytes = reader.take(PresenceMatrix::byte_len(rows, cols), "presence matrix")?;
        let presence = PresenceMatrix::from_bytes(presence_bytes, rows, cols)?;

        let mut opinions = Vec::with_capacity(elements);
        for _ in 0..elements {
            opinions.push(H::Scalar::read_wire(&mut reader)?);
        }
        reader.finish()?;

        let payload = Self::new(header, partition, signatures, presence, opinions)?;
        debug!(
            target: TRACE_TARGET,
            kind = %H::KIND,
            keys = total_keys,
            judging = rows,
            opinions = elements,
            "parsed opinion payload"
        );
        Ok(payload)
    }

    pub fn kind(&self) -> TransactionKind {
        H::KIND
    }

    pub fn header(&self) -> &H {
        &self.header
    }

    pub fn partition(&self) -> &KeyPartition {
        &self.partition
    }

    /// Signatures aligned with [`KeyPartition::judging_keys`].
    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    pub fn presence(&self) -> &PresenceMatrix {
        &self.presence
    }

    /// Flattened opinion values in row-major cell order.
    pub fn opinions(&self) -> &[H::Scalar] {
        &self.opinions
    }

    /// Encoded common header, the prefix of every judge's signed message.
    pub fn common_data(&self) -> Vec<u8> {
        let mut writer = WireWriter::with_capacity(H::COMMON_SIZE);
        self.header.write_common(&mut writer);
        writer.finish()
    }
}

fn to_usize(value: u64, field: &'static str) -> Result<usize> {
    usize::try_from(value).map_err(|_| OpinionError::capacity(field, value, usize::MAX as u64))
}

fn body_len<S: OpinionScalar>(
    keys: usize,
    judging: usize,
    cells: usize,
    elements: usize,
) -> Option<usize> {
    let keys = keys.checked_mul(KEY_SIZE)?;
    let signatures = judging.checked_mul(SIGNATURE_SIZE)?;
    let presence = cells.checked_add(7)? / 8;
    let opinions = elements.checked_mul(S::WIDTH)?;
    keys.checked_add(signatures)?
        .checked_add(presence)?
        .checked_add(opinions)
}
