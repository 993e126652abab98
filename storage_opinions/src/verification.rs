use crate::error::Result;
use crate::keys::{Hash256, ParticipantKey, HASH_SIZE, KEY_SIZE};
use crate::payload::{OpinionHeader, OpinionPayload, TransactionKind};
use crate::wire::{CountWidth, WireReader, WireWriter};

/// Common header of an end-drive verification. Each opinion states whether
/// the judged replicator passed verification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EndDriveVerification {
    pub drive_key: ParticipantKey,
    pub verification_trigger: Hash256,
    pub shard_id: u16,
}

pub type EndDriveVerificationPayload = OpinionPayload<EndDriveVerification>;

impl OpinionHeader for EndDriveVerification {
    type Scalar = bool;

    const KIND: TransactionKind = TransactionKind::EndDriveVerification;
    const COUNT_WIDTH: CountWidth = CountWidth::U16;
    const ELEMENT_COUNT_WIDTH: CountWidth = CountWidth::U32;
    const COMMON_SIZE: usize = KEY_SIZE + HASH_SIZE + 2;

    fn write_common(&self, writer: &mut WireWriter) {
        writer.write_fixed(self.drive_key.as_bytes());
        writer.write_fixed(self.verification_trigger.as_bytes());
        writer.write_u16(self.shard_id);
    }

    fn read_common(reader: &mut WireReader<'_>) -> Result<Self> {
        Ok(Self {
            drive_key: ParticipantKey::new(reader.read_array("drive key")?),
            verification_trigger: Hash256::new(reader.read_array("verification trigger")?),
            shard_id: reader.read_u16("shard id")?,
        })
    }
}
