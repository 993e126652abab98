//! One replicator's data-modification approval.
//!
//! ```text
//! drive key               32
//! data modification id    32
//! key count               u8
//! keys                    count × 32
//! opinions                count × u64
//! ```

use std::collections::HashSet;

use tracing::debug;

use crate::config::OpinionLimits;
use crate::error::{OpinionError, Result};
use crate::keys::{Hash256, ParticipantKey, HASH_SIZE, KEY_SIZE};
use crate::wire::{CountWidth, WireReader, WireWriter};

const HEADER_SIZE: usize = KEY_SIZE + HASH_SIZE + 1;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SingleApproval {
    pub drive_key: ParticipantKey,
    pub data_modification_id: Hash256,
    /// Upload byte count attributed to each key.
    pub opinions: Vec<(ParticipantKey, u64)>,
}

impl SingleApproval {
    pub fn new(
        drive_key: ParticipantKey,
        data_modification_id: Hash256,
        opinions: Vec<(ParticipantKey, u64)>,
    ) -> Result<Self> {
        CountWidth::U8.check("public key count", opinions.len())?;
        let mut seen = HashSet::with_capacity(opinions.len());
        if let Some((key, _)) = opinions.iter().find(|(key, _)| !seen.insert(*key)) {
            return Err(OpinionError::ClassificationAmbiguous {
                key: *key,
                reason: "key rated more than once",
            });
        }
        Ok(Self {
            drive_key,
            data_modification_id,
            opinions,
        })
    }

    pub fn encoded_len(&self) -> usize {
        HEADER_SIZE + self.opinions.len() * (KEY_SIZE + 8)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = WireWriter::with_capacity(self.encoded_len());
        writer.write_fixed(self.drive_key.as_bytes());
        writer.write_fixed(self.data_modification_id.as_bytes());
        CountWidth::U8.write(&mut writer, "public key count", self.opinions.len())?;
        for (key, _) in &self.opinions {
            writer.write_fixed(key.as_bytes());
        }
        for (_, value) in &self.opinions {
            writer.write_u64(*value);
        }
        Ok(writer.finish())
    }

    pub fn parse(bytes: &[u8], limits: &OpinionLimits) -> Result<Self> {
        let mut reader = WireReader::new(bytes);
        let drive_key = ParticipantKey::new(reader.read_array("drive key")?);
        let data_modification_id = Hash256::new(reader.read_array("data modification id")?);
        let count = CountWidth::U8.read(&mut reader, "public key count")?;
        limits.check(count, 0, count)?;

        // At most 255 entries, so this cannot overflow.
        let count = count as usize;
        let expected = count * (KEY_SIZE + 8);
        if reader.remaining() != expected {
            return Err(OpinionError::malformed(
                "record",
                format!(
                    "{count} opinions need {expected} bytes, found {}",
                    reader.remaining()
                ),
            ));
        }

        let mut keys = Vec::with_capacity(count);
        for _ in 0..count {
            keys.push(ParticipantKey::new(reader.read_array("public keys")?));
        }
        let mut opinions = Vec::with_capacity(count);
        for key in keys {
            opinions.push((key, reader.read_u64("opinions")?));
        }
        reader.finish()?;

        let approval = Self::new(drive_key, data_modification_id, opinions).map_err(|err| match err {
            OpinionError::ClassificationAmbiguous { key, .. } => OpinionError::malformed(
                "public keys",
                format!("key {key} listed more than once"),
            ),
            other => other,
        })?;
        debug!(
            target: "storage_opinions",
            opinions = count,
            "parsed single approval"
        );
        Ok(approval)
    }
}
