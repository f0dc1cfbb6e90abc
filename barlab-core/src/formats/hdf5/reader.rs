use super::checksum::metadata_checksum;
use super::{message, MemberKind, DATASET_NAME, LABEL, MEMBERS, SIGNATURE, UNDEFINED_ADDRESS};
use crate::domain::Bar;
use crate::formats::FormatError;

fn corrupt(reason: impl std::fmt::Display) -> FormatError {
    FormatError::corrupt(LABEL, reason)
}

/// Bounds-checked little-endian cursor over the file image.
struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn at(buf: &'a [u8], pos: usize) -> Self {
        Self { buf, pos }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], FormatError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.buf.len())
            .ok_or_else(|| corrupt(format!("truncated at byte {}", self.pos)))?;
        let out = &self.buf[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn skip(&mut self, n: usize) -> Result<(), FormatError> {
        self.take(n).map(|_| ())
    }

    fn u8(&mut self) -> Result<u8, FormatError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, FormatError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, FormatError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn u64(&mut self) -> Result<u64, FormatError> {
        let mut word = [0u8; 8];
        word.copy_from_slice(self.take(8)?);
        Ok(u64::from_le_bytes(word))
    }

    /// Little-endian unsigned integer of 1, 2, 4 or 8 bytes.
    fn uint(&mut self, width: usize) -> Result<u64, FormatError> {
        match width {
            1 => self.u8().map(u64::from),
            2 => self.u16().map(u64::from),
            4 => self.u32().map(u64::from),
            8 => self.u64(),
            other => Err(corrupt(format!("unsupported field width {other}"))),
        }
    }

    fn cstr(&mut self) -> Result<&'a str, FormatError> {
        let rest = &self.buf[self.pos.min(self.buf.len())..];
        let len = rest
            .iter()
            .position(|b| *b == 0)
            .ok_or_else(|| corrupt("unterminated name"))?;
        let name = std::str::from_utf8(&rest[..len]).map_err(|_| corrupt("name is not UTF-8"))?;
        self.pos += len + 1;
        Ok(name)
    }
}

fn address(value: u64, file_len: usize) -> Result<usize, FormatError> {
    usize::try_from(value)
        .ok()
        .filter(|a| *a < file_len)
        .ok_or_else(|| corrupt(format!("address {value:#x} outside file")))
}

fn verify_checksum(block: &[u8], stored: &[u8]) -> Result<(), FormatError> {
    let stored = u32::from_le_bytes([stored[0], stored[1], stored[2], stored[3]]);
    if metadata_checksum(block) != stored {
        return Err(corrupt("metadata checksum mismatch"));
    }
    Ok(())
}

/// Returns the root group object header address.
fn read_superblock(buf: &[u8]) -> Result<usize, FormatError> {
    if buf.len() < 12 || buf[..8] != SIGNATURE {
        return Err(corrupt("missing HDF5 signature"));
    }
    let mut cur = Cursor::at(buf, 8);
    let version = cur.u8()?;
    if version != 2 && version != 3 {
        return Err(corrupt(format!("unsupported superblock version {version}")));
    }
    let offset_size = cur.u8()?;
    let length_size = cur.u8()?;
    if offset_size != 8 || length_size != 8 {
        return Err(corrupt("only 8-byte offsets and lengths are supported"));
    }
    cur.skip(1)?; // consistency flags
    let base = cur.u64()?;
    let _extension = cur.u64()?;
    let eof = cur.u64()?;
    let root = cur.u64()?;
    let body_end = cur.pos;
    let stored = cur.take(4)?;
    verify_checksum(&buf[..body_end], stored)?;

    if base != 0 {
        return Err(corrupt("non-zero base address"));
    }
    if eof > buf.len() as u64 {
        return Err(corrupt(format!(
            "end-of-file address {eof} beyond file length {}",
            buf.len()
        )));
    }
    address(root, buf.len())
}

/// A raw header message borrowed from the file image.
struct RawMessage<'a> {
    kind: u8,
    body: &'a [u8],
}

/// Read the messages of a version 2 object header.
fn read_object_header(buf: &[u8], at: usize) -> Result<Vec<RawMessage<'_>>, FormatError> {
    let mut cur = Cursor::at(buf, at);
    if cur.take(4)? != b"OHDR" {
        return Err(corrupt(format!("no object header at {at:#x}")));
    }
    let version = cur.u8()?;
    if version != 2 {
        return Err(corrupt(format!("unsupported object header version {version}")));
    }
    let flags = cur.u8()?;
    if flags & 0x20 != 0 {
        cur.skip(16)?; // access/modification/change/birth times
    }
    if flags & 0x10 != 0 {
        cur.skip(4)?; // attribute phase change values
    }
    let chunk_size = usize::try_from(cur.uint(1 << (flags & 0x03))?)
        .map_err(|_| corrupt("object header chunk too large"))?;
    let chunk = cur.take(chunk_size)?;
    let body_end = cur.pos;
    verify_checksum(&buf[at..body_end], cur.take(4)?)?;

    let prefix = if flags & 0x04 != 0 { 6 } else { 4 };
    let mut messages = Vec::new();
    let mut inner = Cursor::at(chunk, 0);
    // Trailing bytes shorter than a message prefix are a gap.
    while chunk.len() - inner.pos >= prefix {
        let kind = inner.u8()?;
        let size = inner.u16()? as usize;
        inner.skip(prefix - 3)?;
        let body = inner.take(size)?;
        if kind == message::CONTINUATION {
            return Err(corrupt(format!(
                "object header at {at:#x} continues in another chunk"
            )));
        }
        messages.push(RawMessage { kind, body });
    }
    Ok(messages)
}

fn find_dataset_link(messages: &[RawMessage<'_>], file_len: usize) -> Result<usize, FormatError> {
    for msg in messages.iter().filter(|m| m.kind == message::LINK) {
        let mut cur = Cursor::at(msg.body, 0);
        let version = cur.u8()?;
        if version != 1 {
            return Err(corrupt(format!("unsupported link message version {version}")));
        }
        let flags = cur.u8()?;
        let link_type = if flags & 0x08 != 0 { cur.u8()? } else { 0 };
        if flags & 0x04 != 0 {
            cur.skip(8)?; // creation order
        }
        if flags & 0x10 != 0 {
            cur.skip(1)?; // name charset
        }
        let name_len = cur.uint(1 << (flags & 0x03))? as usize;
        let name = cur.take(name_len)?;
        if name == DATASET_NAME.as_bytes() {
            if link_type != 0 {
                return Err(corrupt("'data' is not a hard link"));
            }
            return address(cur.u64()?, file_len);
        }
    }
    Err(corrupt(format!("root group has no '{DATASET_NAME}' link")))
}

fn read_dataspace(body: &[u8]) -> Result<u64, FormatError> {
    let mut cur = Cursor::at(body, 0);
    let version = cur.u8()?;
    let rank = cur.u8()?;
    cur.skip(1)?; // flags; a maximum-dimension array may follow the sizes
    match version {
        1 => cur.skip(5)?,
        2 => {
            let kind = cur.u8()?;
            if kind != 1 {
                return Err(corrupt(format!("dataspace type {kind} is not simple")));
            }
        }
        other => return Err(corrupt(format!("unsupported dataspace version {other}"))),
    }
    if rank != 1 {
        return Err(corrupt(format!("dataset rank {rank}, expected 1")));
    }
    cur.u64()
}

/// Validate a member's scalar type and check it is 8 bytes LE.
fn read_member_type(cur: &mut Cursor<'_>) -> Result<MemberKind, FormatError> {
    let class_version = cur.u8()?;
    let bits = cur.take(3)?;
    let size = cur.u32()?;
    if bits[0] & 0x01 != 0 {
        return Err(corrupt("big-endian members are not supported"));
    }
    if size != 8 {
        return Err(corrupt(format!("member size {size}, expected 8")));
    }
    match class_version & 0x0F {
        0 => {
            cur.skip(4)?;
            if bits[0] & 0x08 == 0 {
                return Err(corrupt("unsigned integer member"));
            }
            Ok(MemberKind::Int)
        }
        1 => {
            cur.skip(12)?;
            Ok(MemberKind::Float)
        }
        other => Err(corrupt(format!("unsupported member class {other}"))),
    }
}

/// Byte offset of each expected member, in the order of `MEMBERS`.
fn read_compound(body: &[u8]) -> Result<(usize, [usize; 7]), FormatError> {
    let mut cur = Cursor::at(body, 0);
    let class_version = cur.u8()?;
    let (class, version) = (class_version & 0x0F, class_version >> 4);
    if class != 6 {
        return Err(corrupt(format!("datatype class {class} is not compound")));
    }
    let bits = cur.take(3)?;
    let count = u16::from_le_bytes([bits[0], bits[1]]) as usize;
    let row_size = cur.u32()? as usize;
    let offset_width = match row_size {
        0..=0xFF => 1,
        0x100..=0xFFFF => 2,
        0x1_0000..=0xFF_FFFF => 3,
        _ => 4,
    };

    let mut offsets: [Option<usize>; 7] = [None; 7];
    for _ in 0..count {
        let start = cur.pos;
        let name = cur.cstr()?;
        let offset = match version {
            1 | 2 => {
                let padded = (name.len() + 8) / 8 * 8;
                cur.pos = start + padded;
                let offset = cur.u32()? as usize;
                if version == 1 {
                    cur.skip(28)?; // dimensionality, reserved, permutation, dims
                }
                offset
            }
            3 => {
                let mut raw = [0u8; 4];
                raw[..offset_width].copy_from_slice(cur.take(offset_width)?);
                u32::from_le_bytes(raw) as usize
            }
            other => return Err(corrupt(format!("unsupported compound version {other}"))),
        };
        let kind = read_member_type(&mut cur)?;

        if let Some(slot) = MEMBERS.iter().position(|(n, _)| *n == name) {
            if MEMBERS[slot].1 != kind {
                return Err(corrupt(format!("member '{name}' has the wrong type")));
            }
            if offset + 8 > row_size {
                return Err(corrupt(format!("member '{name}' overruns the row")));
            }
            offsets[slot] = Some(offset);
        }
    }

    let mut resolved = [0usize; 7];
    for (slot, (name, _)) in MEMBERS.iter().enumerate() {
        resolved[slot] = offsets[slot].ok_or_else(|| corrupt(format!("missing member '{name}'")))?;
    }
    Ok((row_size, resolved))
}

/// Contiguous storage: (address, byte size). Address is `None` when unallocated.
fn read_layout(body: &[u8]) -> Result<(Option<u64>, u64), FormatError> {
    let mut cur = Cursor::at(body, 0);
    let version = cur.u8()?;
    if version != 3 && version != 4 {
        return Err(corrupt(format!("unsupported layout version {version}")));
    }
    let class = cur.u8()?;
    if class != 1 {
        return Err(corrupt(format!("layout class {class} is not contiguous")));
    }
    let addr = cur.u64()?;
    let size = cur.u64()?;
    Ok(((addr != UNDEFINED_ADDRESS).then_some(addr), size))
}

fn read_f64(row: &[u8], offset: usize) -> f64 {
    let mut word = [0u8; 8];
    word.copy_from_slice(&row[offset..offset + 8]);
    f64::from_le_bytes(word)
}

fn read_i64(row: &[u8], offset: usize) -> i64 {
    let mut word = [0u8; 8];
    word.copy_from_slice(&row[offset..offset + 8]);
    i64::from_le_bytes(word)
}

/// Parse a file image produced by the writer (or any file with the same shape).
pub(crate) fn parse_file(buf: &[u8]) -> Result<Vec<Bar>, FormatError> {
    let root = read_superblock(buf)?;
    let root_messages = read_object_header(buf, root)?;
    let dataset_at = find_dataset_link(&root_messages, buf.len())?;
    let messages = read_object_header(buf, dataset_at)?;

    let body = |kind: u8, what: &str| {
        messages
            .iter()
            .find(|m| m.kind == kind)
            .map(|m| m.body)
            .ok_or_else(|| corrupt(format!("dataset has no {what} message")))
    };
    let rows = read_dataspace(body(message::DATASPACE, "dataspace")?)?;
    let (row_size, offsets) = read_compound(body(message::DATATYPE, "datatype")?)?;
    let (data_address, size) = read_layout(body(message::LAYOUT, "layout")?)?;

    let expected = rows
        .checked_mul(row_size as u64)
        .ok_or_else(|| corrupt("dataset size overflows"))?;
    if size != expected {
        return Err(corrupt(format!(
            "layout holds {size} bytes but {rows} rows need {expected}"
        )));
    }
    if rows == 0 {
        return Ok(Vec::new());
    }

    let data_address = data_address.ok_or_else(|| corrupt("rows present but storage unallocated"))?;
    let start = address(data_address, buf.len())?;
    let raw = Cursor::at(buf, start).take(expected as usize)?;

    let [datetime, timestamp, open, high, low, close, volume] = offsets;
    let mut bars = Vec::with_capacity(rows as usize);
    for (i, row) in raw.chunks_exact(row_size).enumerate() {
        let ts = read_i64(row, timestamp);
        let indexed = read_i64(row, datetime);
        if ts.checked_mul(1_000_000) != Some(indexed) {
            return Err(corrupt(format!(
                "row {i}: datetime {indexed} disagrees with timestamp {ts}"
            )));
        }
        bars.push(Bar {
            timestamp: ts,
            open: read_f64(row, open),
            high: read_f64(row, high),
            low: read_f64(row, low),
            close: read_f64(row, close),
            volume: read_f64(row, volume),
        });
    }
    Ok(bars)
}

#[cfg(test)]
mod tests {
    use super::super::writer::build_file;
    use super::*;

    fn sample() -> Vec<Bar> {
        vec![
            Bar::new(1_704_067_200_000, 2280.1, 2281.0, 2279.5, 2280.9, 12.5),
            Bar::new(1_704_067_260_000, 2280.9, 2282.3, 2280.2, 2282.0, 8.25),
        ]
    }

    #[test]
    fn reads_what_the_writer_wrote() {
        let bytes = build_file(&sample()).unwrap();
        assert_eq!(parse_file(&bytes).unwrap(), sample());
    }

    #[test]
    fn rejects_non_hdf5() {
        let err = parse_file(b"PAR1 not an hdf5 file at all").unwrap_err();
        assert!(err.to_string().contains("signature"));
    }

    #[test]
    fn detects_superblock_damage() {
        let mut bytes = build_file(&sample()).unwrap();
        bytes[37] ^= 0xFF;
        assert!(matches!(parse_file(&bytes), Err(FormatError::Corrupt { .. })));
    }

    #[test]
    fn detects_header_damage() {
        let mut bytes = build_file(&sample()).unwrap();
        // Flip a byte inside the root group header body.
        bytes[60] ^= 0x01;
        assert!(parse_file(&bytes).unwrap_err().to_string().contains("checksum"));
    }

    #[test]
    fn detects_truncation() {
        let bytes = build_file(&sample()).unwrap();
        assert!(parse_file(&bytes[..bytes.len() - 10]).is_err());
    }

    #[test]
    fn detects_index_tampering() {
        let mut bytes = build_file(&sample()).unwrap();
        let n = bytes.len();
        // First byte of the last row's datetime member.
        bytes[n - 56] ^= 0x01;
        assert!(parse_file(&bytes)
            .unwrap_err()
            .to_string()
            .contains("disagrees"));
    }
}
