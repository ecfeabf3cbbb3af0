use crate::index::types::{LocalDocId, Posting};
use std::io::{self, Read, Write};

/// Append `value` as a LEB128 variable-length integer
pub fn write_varint(mut value: u64, buf: &mut Vec<u8>) {
    while value >= 0x80 {
        buf.push((value as u8) | 0x80);
        value >>= 7;
    }
    buf.push(value as u8);
}

/// Read a variable-length integer at `*pos`, advancing it past the value
pub fn read_varint(buf: &[u8], pos: &mut usize) -> Option<u64> {
    let mut result = 0u64;
    let mut shift = 0u32;

    while let Some(&byte) = buf.get(*pos) {
        *pos += 1;
        if shift >= 64 {
            return None;
        }
        result |= u64::from(byte & 0x7F) << shift;
        if byte & 0x80 == 0 {
            return Some(result);
        }
        shift += 7;
    }

    None
}

/// Encode a postings list sorted by document.
///
/// Layout per posting: doc delta, frequency, then that many position deltas.
pub fn encode_postings(postings: &[Posting], buf: &mut Vec<u8>) {
    let mut prev_doc = 0;
    for posting in postings {
        write_varint(u64::from(posting.doc - prev_doc), buf);
        prev_doc = posting.doc;

        write_varint(posting.positions.len() as u64, buf);
        let mut prev_pos = 0;
        for &pos in &posting.positions {
            write_varint(u64::from(pos - prev_pos), buf);
            prev_pos = pos;
        }
    }
}

/// Decode a postings list written by [`encode_postings`]
pub fn decode_postings(buf: &[u8]) -> Option<Vec<Posting>> {
    let mut postings = Vec::new();
    let mut pos = 0;
    let mut doc: LocalDocId = 0;

    while pos < buf.len() {
        doc = doc.checked_add(u32::try_from(read_varint(buf, &mut pos)?).ok()?)?;
        let freq = usize::try_from(read_varint(buf, &mut pos)?).ok()?;
        // Each position takes at least one byte
        if freq > buf.len() - pos {
            return None;
        }

        let mut positions = Vec::with_capacity(freq);
        let mut prev = 0u32;
        for _ in 0..freq {
            prev = prev.checked_add(u32::try_from(read_varint(buf, &mut pos)?).ok()?)?;
            positions.push(prev);
        }

        postings.push(Posting { doc, positions });
    }

    Some(postings)
}

/// Write a length-prefixed (u16) UTF-8 string
pub fn write_short_str<W: Write>(writer: &mut W, s: &str) -> io::Result<()> {
    let len = u16::try_from(s.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "string longer than 65535 bytes"))?;
    writer.write_all(&len.to_le_bytes())?;
    writer.write_all(s.as_bytes())
}

/// Read a string written by [`write_short_str`]
pub fn read_short_str<R: Read>(reader: &mut R) -> io::Result<String> {
    let len = read_u16_le(reader)? as usize;
    let mut bytes = vec![0u8; len];
    reader.read_exact(&mut bytes)?;
    String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

pub fn write_u32_le<W: Write>(writer: &mut W, value: u32) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

pub fn read_u32_le<R: Read>(reader: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

pub fn write_u64_le<W: Write>(writer: &mut W, value: u64) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

pub fn read_u64_le<R: Read>(reader: &mut R) -> io::Result<u64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

pub fn read_u16_le<R: Read>(reader: &mut R) -> io::Result<u16> {
    let mut buf = [0u8; 2];
    reader.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_varint_boundaries() {
        for value in [0, 1, 127, 128, 16_383, 16_384, u64::from(u32::MAX), u64::MAX] {
            let mut buf = Vec::new();
            write_varint(value, &mut buf);
            let mut pos = 0;
            assert_eq!(read_varint(&buf, &mut pos), Some(value));
            assert_eq!(pos, buf.len());
        }
    }

    #[test]
    fn test_truncated_varint() {
        let mut pos = 0;
        assert_eq!(read_varint(&[0x80, 0x80], &mut pos), None);
    }

    #[test]
    fn test_postings_frequency_beyond_buffer() {
        let mut buf = vec![0];
        write_varint(u64::MAX, &mut buf);
        assert_eq!(decode_postings(&buf), None);

        let mut buf = vec![0];
        write_varint(3, &mut buf);
        buf.push(1);
        assert_eq!(decode_postings(&buf), None);
    }

    #[test]
    fn test_postings_keep_positions() {
        let postings = vec![
            Posting { doc: 0, positions: vec![0] },
            Posting { doc: 3, positions: vec![1, 4, 9] },
            Posting { doc: 200, positions: vec![2] },
        ];
        let mut buf = Vec::new();
        encode_postings(&postings, &mut buf);
        assert_eq!(decode_postings(&buf), Some(postings));
    }

    #[test]
    fn test_short_str() {
        let mut buf = Vec::new();
        write_short_str(&mut buf, "longest-mention").unwrap();
        let decoded = read_short_str(&mut buf.as_slice()).unwrap();
        assert_eq!(decoded, "longest-mention");
    }
}
