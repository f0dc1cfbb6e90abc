use super::checksum::metadata_checksum;
use super::{
    message, MemberKind, LABEL, MEMBERS, ROW_SIZE, SIGNATURE, SUPERBLOCK_SIZE, UNDEFINED_ADDRESS,
};
use crate::domain::Bar;
use crate::formats::{index, FormatError};

/// One object header message: type, flags, body.
struct Message {
    kind: u8,
    flags: u8,
    body: Vec<u8>,
}

impl Message {
    fn new(kind: u8, body: Vec<u8>) -> Self {
        Self { kind, flags: 0, body }
    }

    fn constant(kind: u8, body: Vec<u8>) -> Self {
        Self { kind, flags: 0x01, body }
    }
}

/// Serialize a version 2 object header with a 4-byte chunk size field.
fn object_header(messages: &[Message]) -> Result<Vec<u8>, FormatError> {
    let mut chunk = Vec::new();
    for msg in messages {
        let size = u16::try_from(msg.body.len())
            .map_err(|_| FormatError::serialization(LABEL, "header message too large"))?;
        chunk.push(msg.kind);
        chunk.extend_from_slice(&size.to_le_bytes());
        chunk.push(msg.flags);
        chunk.extend_from_slice(&msg.body);
    }
    let chunk_size = u32::try_from(chunk.len())
        .map_err(|_| FormatError::serialization(LABEL, "object header too large"))?;

    let mut out = Vec::with_capacity(chunk.len() + 14);
    out.extend_from_slice(b"OHDR");
    out.push(2); // version
    out.push(0x02); // chunk #0 size stored in 4 bytes
    out.extend_from_slice(&chunk_size.to_le_bytes());
    out.extend_from_slice(&chunk);
    let sum = metadata_checksum(&out);
    out.extend_from_slice(&sum.to_le_bytes());
    Ok(out)
}

fn root_group(dataset_address: u64) -> Result<Vec<u8>, FormatError> {
    let mut link_info = vec![0u8, 0];
    link_info.extend_from_slice(&UNDEFINED_ADDRESS.to_le_bytes()); // fractal heap
    link_info.extend_from_slice(&UNDEFINED_ADDRESS.to_le_bytes()); // name index

    let name = super::DATASET_NAME.as_bytes();
    let mut link = vec![1u8, 0x00, name.len() as u8];
    link.extend_from_slice(name);
    link.extend_from_slice(&dataset_address.to_le_bytes());

    object_header(&[
        Message::new(message::LINK_INFO, link_info),
        Message::new(message::GROUP_INFO, vec![0, 0]),
        Message::new(message::LINK, link),
    ])
}

fn member_type(kind: MemberKind) -> Vec<u8> {
    let mut out = Vec::new();
    match kind {
        MemberKind::Int => {
            out.extend_from_slice(&[0x10, 0x08, 0x00, 0x00]); // fixed-point, signed, LE
            out.extend_from_slice(&8u32.to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes());
            out.extend_from_slice(&64u16.to_le_bytes());
        }
        MemberKind::Float => {
            out.extend_from_slice(&[0x11, 0x20, 0x3F, 0x00]); // IEEE double, LE
            out.extend_from_slice(&8u32.to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes());
            out.extend_from_slice(&64u16.to_le_bytes());
            out.extend_from_slice(&[52, 11, 0, 52]);
            out.extend_from_slice(&1023u32.to_le_bytes());
        }
    }
    out
}

fn compound_type() -> Vec<u8> {
    let mut out = vec![0x36, MEMBERS.len() as u8, 0, 0];
    out.extend_from_slice(&(ROW_SIZE as u32).to_le_bytes());
    for (i, (name, kind)) in MEMBERS.iter().enumerate() {
        out.extend_from_slice(name.as_bytes());
        out.push(0);
        out.push((i * 8) as u8);
        out.extend_from_slice(&member_type(*kind));
    }
    out
}

fn dataset_header(rows: u64, data_address: u64) -> Result<Vec<u8>, FormatError> {
    let mut dataspace = vec![2u8, 1, 0, 1];
    dataspace.extend_from_slice(&rows.to_le_bytes());

    let size = rows * ROW_SIZE as u64;
    let mut layout = vec![3u8, 1];
    if rows == 0 {
        layout.extend_from_slice(&UNDEFINED_ADDRESS.to_le_bytes());
    } else {
        layout.extend_from_slice(&data_address.to_le_bytes());
    }
    layout.extend_from_slice(&size.to_le_bytes());

    object_header(&[
        Message::new(message::DATASPACE, dataspace),
        Message::constant(message::DATATYPE, compound_type()),
        Message::constant(message::FILL_VALUE, vec![3, 0x0A]),
        Message::new(message::LAYOUT, layout),
    ])
}

fn superblock(eof: u64, root_address: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(SUPERBLOCK_SIZE);
    out.extend_from_slice(&SIGNATURE);
    out.extend_from_slice(&[2, 8, 8, 0]); // version, offset size, length size, flags
    out.extend_from_slice(&0u64.to_le_bytes()); // base address
    out.extend_from_slice(&UNDEFINED_ADDRESS.to_le_bytes()); // extension
    out.extend_from_slice(&eof.to_le_bytes());
    out.extend_from_slice(&root_address.to_le_bytes());
    let sum = metadata_checksum(&out);
    out.extend_from_slice(&sum.to_le_bytes());
    out
}

/// Build the complete file image for `bars`.
pub(crate) fn build_file(bars: &[Bar]) -> Result<Vec<u8>, FormatError> {
    let rows = bars.len() as u64;

    // Header sizes do not depend on the addresses they carry, so a
    // placeholder pass fixes the layout.
    let root_address = SUPERBLOCK_SIZE as u64;
    let dataset_address = root_address + root_group(0)?.len() as u64;
    let data_address = dataset_address + dataset_header(rows, 0)?.len() as u64;
    let eof = data_address + rows * ROW_SIZE as u64;

    let mut out = Vec::with_capacity(eof as usize);
    out.extend_from_slice(&superblock(eof, root_address));
    out.extend_from_slice(&root_group(dataset_address)?);
    out.extend_from_slice(&dataset_header(rows, data_address)?);

    for bar in bars {
        out.extend_from_slice(&index::nanos(bar.timestamp, LABEL)?.to_le_bytes());
        out.extend_from_slice(&bar.timestamp.to_le_bytes());
        for value in [bar.open, bar.high, bar.low, bar.close, bar.volume] {
            out.extend_from_slice(&value.to_le_bytes());
        }
    }
    debug_assert_eq!(out.len() as u64, eof);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn superblock_layout() {
        let sb = superblock(1234, 48);
        assert_eq!(sb.len(), SUPERBLOCK_SIZE);
        assert_eq!(sb[8], 2);
        assert_eq!(u64::from_le_bytes(sb[28..36].try_into().unwrap()), 1234);
        assert_eq!(u64::from_le_bytes(sb[36..44].try_into().unwrap()), 48);
        let stored = u32::from_le_bytes(sb[44..48].try_into().unwrap());
        assert_eq!(stored, metadata_checksum(&sb[..44]));
    }

    #[test]
    fn object_header_is_checksummed() {
        let header = root_group(500).unwrap();
        let (body, sum) = header.split_at(header.len() - 4);
        assert_eq!(&body[..4], b"OHDR");
        assert_eq!(u32::from_le_bytes(sum.try_into().unwrap()), metadata_checksum(body));
    }

    #[test]
    fn compound_type_declares_every_member() {
        let ty = compound_type();
        assert_eq!(ty[0], 0x36);
        assert_eq!(ty[1] as usize, MEMBERS.len());
        for (name, _) in MEMBERS {
            let needle: Vec<u8> = name.bytes().chain(std::iter::once(0)).collect();
            assert!(ty.windows(needle.len()).any(|w| w == needle.as_slice()));
        }
    }

    #[test]
    fn rows_follow_headers_in_order() {
        let bars = [Bar::new(60_000, 1.0, 2.0, 0.5, 1.5, 7.0)];
        let bytes = build_file(&bars).unwrap();
        let row = &bytes[bytes.len() - ROW_SIZE..];
        assert_eq!(i64::from_le_bytes(row[0..8].try_into().unwrap()), 60_000_000_000);
        assert_eq!(i64::from_le_bytes(row[8..16].try_into().unwrap()), 60_000);
        assert_eq!(f64::from_le_bytes(row[48..56].try_into().unwrap()), 7.0);
    }

    #[test]
    fn unrepresentable_index_fails() {
        let bars = [Bar::new(i64::MAX / 2, 1.0, 1.0, 1.0, 1.0, 1.0)];
        assert!(matches!(
            build_file(&bars),
            Err(FormatError::Serialization { .. })
        ));
    }
}
