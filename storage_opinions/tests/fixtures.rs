#![forbid(unsafe_code)]

use std::error::Error;

use storage_opinions::{
    assemble, Config, DataModificationApproval, DataModificationApprovalPayload, DownloadApproval,
    DownloadApprovalPayload, Hash256, ParticipantKey, Signature, SignedOpinion, TransactionKind,
};

type TestResult<T> = Result<T, Box<dyn Error>>;

fn key(id: u8) -> ParticipantKey {
    ParticipantKey::new([id; 32])
}

fn signature(id: u8) -> Signature {
    Signature::new([id; 64])
}

fn opinion(judge: u8, entries: &[(u8, u64)]) -> SignedOpinion<u64> {
    SignedOpinion::new(
        key(judge),
        signature(judge),
        entries.iter().map(|(k, v)| (key(*k), *v)).collect(),
    )
}

fn ids(keys: &[ParticipantKey]) -> Vec<u8> {
    keys.iter().map(|k| k.as_bytes()[0]).collect()
}

fn signature_ids(bytes: &[u8]) -> Vec<u8> {
    bytes.chunks_exact(64).map(|chunk| chunk[0]).collect()
}

fn upload_header() -> DataModificationApproval {
    DataModificationApproval {
        drive_key: key(0xEE),
        data_modification_id: Hash256::new([0xC1; 32]),
        file_structure_cdi: Hash256::new([0xC2; 32]),
        file_structure_size: 4_096,
        meta_files_size: 512,
        used_drive_size: 8_192,
    }
}

// Replicators 1, 2, 3, 5, 7 and the drive owner's client key 11.
fn upload_opinions() -> Vec<SignedOpinion<u64>> {
    vec![
        opinion(1, &[(4, 100), (7, 200), (11, 0)]),
        opinion(2, &[(1, 300), (3, 400), (6, 500), (11, 600)]),
        opinion(3, &[(4, 700), (7, 800), (11, 0)]),
        opinion(5, &[(1, 900), (6, 1000), (7, 1100), (11, 0)]),
        opinion(7, &[(11, 1200)]),
    ]
}

#[test]
fn upload_approval_matches_reference_layout() -> TestResult<()> {
    let payload: DataModificationApprovalPayload = assemble(upload_header(), &upload_opinions())?;
    let partition = payload.partition();
    assert_eq!(ids(partition.judging_only()), vec![5, 2]);
    assert_eq!(ids(partition.overlapping()), vec![7, 3, 1]);
    assert_eq!(ids(partition.judged_only()), vec![6, 11, 4]);

    let bytes = payload.to_bytes()?;
    assert_eq!(bytes.len(), 825);
    assert_eq!(&bytes[..120], payload.common_data().as_slice());
    assert_eq!(&bytes[120..125], &[2, 3, 3, 15, 0]);
    assert_eq!(
        ids(&bytes[125..381]
            .chunks_exact(32)
            .map(|chunk| ParticipantKey::new(chunk.try_into().expect("32 bytes")))
            .collect::<Vec<_>>()),
        vec![5, 2, 7, 3, 1, 6, 11, 4]
    );
    assert_eq!(signature_ids(&bytes[381..701]), vec![5, 2, 7, 3, 1]);
    assert_eq!(&bytes[701..705], &[0xB9, 0xE0, 0xA3, 0x8C]);
    let opinions: Vec<u64> = bytes[705..]
        .chunks_exact(8)
        .map(|chunk| u64::from_le_bytes(chunk.try_into().expect("8 bytes")))
        .collect();
    assert_eq!(
        opinions,
        vec![1100, 900, 1000, 0, 400, 300, 500, 600, 1200, 800, 0, 700, 200, 0, 100]
    );
    Ok(())
}

#[test]
fn upload_approval_decodes_to_submitted_opinions() -> TestResult<()> {
    let bytes = assemble::<DataModificationApproval>(upload_header(), &upload_opinions())?.to_bytes()?;
    let limits = Config::default().limits_for(TransactionKind::DataModificationApproval);
    let decoded = DataModificationApprovalPayload::parse(&bytes, &limits)?;
    assert_eq!(decoded.header(), &upload_header());

    let mut triples: Vec<(u8, u8, u64)> = decoded
        .triples()
        .map(|(judge, judged, value)| (judge.as_bytes()[0], judged.as_bytes()[0], value))
        .collect();
    triples.sort();
    let mut submitted: Vec<(u8, u8, u64)> = upload_opinions()
        .iter()
        .flat_map(|o| {
            let judge = o.judge.as_bytes()[0];
            o.entries
                .iter()
                .map(move |(k, v)| (judge, k.as_bytes()[0], *v))
        })
        .collect();
    submitted.sort();
    assert_eq!(triples, submitted);

    for row in decoded.rows() {
        let submitted = upload_opinions()
            .into_iter()
            .find(|o| &o.judge == row.judge())
            .expect("judge submitted");
        assert_eq!(row.signature(), &submitted.signature);
        assert_eq!(row.len(), submitted.entries.len());
    }
    Ok(())
}

fn download_header() -> DownloadApproval {
    DownloadApproval {
        download_channel_id: Hash256::new([0xA0; 32]),
        sequence_number: 9,
        response_to_finish_download: false,
    }
}

#[test]
fn download_approval_drops_signer_without_opinions() -> TestResult<()> {
    let opinions = vec![
        opinion(1, &[(4, 100), (7, 200)]),
        opinion(2, &[(1, 300), (3, 400), (6, 500)]),
        opinion(3, &[(4, 600), (7, 700)]),
        opinion(5, &[(1, 800), (6, 900), (7, 1000)]),
        opinion(7, &[]),
    ];
    let payload: DownloadApprovalPayload = assemble(download_header(), &opinions)?;
    let partition = payload.partition();
    assert_eq!(ids(partition.judging_only()), vec![5, 2]);
    assert_eq!(ids(partition.overlapping()), vec![3, 1]);
    assert_eq!(ids(partition.judged_only()), vec![6, 7, 4]);

    let bytes = payload.to_bytes()?;
    assert_eq!(bytes.len(), 603);
    assert_eq!(&bytes[35..40], &[2, 2, 3, 10, 0]);
    assert_eq!(signature_ids(&bytes[264..520]), vec![5, 2, 3, 1]);
    assert_eq!(&bytes[520..523], &[0x77, 0x06, 0x30]);
    assert_eq!(
        payload.opinions(),
        &[800, 900, 1000, 400, 300, 500, 700, 600, 200, 100]
    );

    let limits = Config::default().limits_for(TransactionKind::DownloadApproval);
    let decoded = DownloadApprovalPayload::parse(&bytes, &limits)?;
    assert_eq!(decoded, payload);
    assert_eq!(decoded.to_bytes()?, bytes);
    Ok(())
}
