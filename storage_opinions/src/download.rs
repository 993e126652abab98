use crate::error::Result;
use crate::keys::{Hash256, HASH_SIZE};
use crate::payload::{OpinionHeader, OpinionPayload, TransactionKind};
use crate::wire::{CountWidth, WireReader, WireWriter};

/// Common header of a download approval. Opinions are cumulative download
/// byte counts served by each replicator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadApproval {
    pub download_channel_id: Hash256,
    pub sequence_number: u16,
    pub response_to_finish_download: bool,
}

pub type DownloadApprovalPayload = OpinionPayload<DownloadApproval>;

impl OpinionHeader for DownloadApproval {
    type Scalar = u64;

    const KIND: TransactionKind = TransactionKind::DownloadApproval;
    const COUNT_WIDTH: CountWidth = CountWidth::U8;
    const ELEMENT_COUNT_WIDTH: CountWidth = CountWidth::U16;
    const COMMON_SIZE: usize = HASH_SIZE + 2 + 1;

    fn write_common(&self, writer: &mut WireWriter) {
        writer.write_fixed(self.download_channel_id.as_bytes());
        writer.write_u16(self.sequence_number);
        writer.write_bool(self.response_to_finish_download);
    }

    fn read_common(reader: &mut WireReader<'_>) -> Result<Self> {
        Ok(Self {
            download_channel_id: Hash256::new(reader.read_array("download channel id")?),
            sequence_number: reader.read_u16("sequence number")?,
            response_to_finish_download: reader.read_bool("response to finish download")?,
        })
    }
}
