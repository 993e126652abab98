use crate::error::Result;
use crate::keys::{Hash256, ParticipantKey, HASH_SIZE, KEY_SIZE};
use crate::payload::{OpinionHeader, OpinionPayload, TransactionKind};
use crate::wire::{CountWidth, WireReader, WireWriter};

/// Common header of a data-modification approval. Opinions are cumulative
/// upload byte counts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataModificationApproval {
    pub drive_key: ParticipantKey,
    pub data_modification_id: Hash256,
    pub file_structure_cdi: Hash256,
    pub file_structure_size: u64,
    pub meta_files_size: u64,
    pub used_drive_size: u64,
}

pub type DataModificationApprovalPayload = OpinionPayload<DataModificationApproval>;

impl OpinionHeader for DataModificationApproval {
    type Scalar = u64;

    const KIND: TransactionKind = TransactionKind::DataModificationApproval;
    const COUNT_WIDTH: CountWidth = CountWidth::U8;
    const ELEMENT_COUNT_WIDTH: CountWidth = CountWidth::U16;
    const COMMON_SIZE: usize = KEY_SIZE + 2 * HASH_SIZE + 3 * 8;

    fn write_common(&self, writer: &mut WireWriter) {
        writer.write_fixed(self.drive_key.as_bytes());
        writer.write_fixed(self.data_modification_id.as_bytes());
        writer.write_fixed(self.file_structure_cdi.as_bytes());
        writer.write_u64(self.file_structure_size);
        writer.write_u64(self.meta_files_size);
        writer.write_u64(self.used_drive_size);
    }

    fn read_common(reader: &mut WireReader<'_>) -> Result<Self> {
        Ok(Self {
            drive_key: ParticipantKey::new(reader.read_array("drive key")?),
            data_modification_id: Hash256::new(reader.read_array("data modification id")?),
            file_structure_cdi: Hash256::new(reader.read_array("file structure cdi")?),
            file_structure_size: reader.read_u64("file structure size")?,
            meta_files_size: reader.read_u64("meta files size")?,
            used_drive_size: reader.read_u64("used drive size")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OpinionLimits;
    use crate::error::OpinionError;

    fn header() -> DataModificationApproval {
        DataModificationApproval {
            drive_key: ParticipantKey::new([0x11; 32]),
            data_modification_id: Hash256::new([0x22; 32]),
            file_structure_cdi: Hash256::new([0x33; 32]),
            file_structure_size: 1,
            meta_files_size: 2,
            used_drive_size: 3,
        }
    }

    #[test]
    fn common_header_layout() {
        let mut writer = WireWriter::default();
        header().write_common(&mut writer);
        let bytes = writer.finish();
        assert_eq!(bytes.len(), DataModificationApproval::COMMON_SIZE);
        assert_eq!(&bytes[..32], &[0x11; 32]);
        assert_eq!(&bytes[96..104], &1u64.to_le_bytes());
        assert_eq!(&bytes[112..120], &3u64.to_le_bytes());

        let mut reader = WireReader::new(&bytes);
        assert_eq!(DataModificationApproval::read_common(&mut reader).expect("read"), header());
        reader.finish().expect("consumed");
    }

    #[test]
    fn truncated_header_is_malformed() {
        let mut writer = WireWriter::default();
        header().write_common(&mut writer);
        let bytes = writer.finish();
        let limits = OpinionLimits::new(255, 255, 65_535);
        let err = DataModificationApprovalPayload::parse(&bytes[..108], &limits).expect_err("short");
        assert!(matches!(
            err,
            OpinionError::StructuralMalformed { section: "meta files size", .. }
        ));
    }
}
