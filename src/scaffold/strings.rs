//! Shared string table and supplements buffer
//!
//! String table entries are `[u64 hash][utf-8 bytes][NUL]`, addressed by the
//! byte offset of the hash. Supplement entries are `[count][guid; count]` in a
//! `u64` buffer whose slot 0 is a sentinel, so offset 0 can mean "none".

use crate::core::hash::hash64;

const HASH_SIZE: usize = std::mem::size_of::<u64>();

fn read_hash(buffer: &[u8], offset: usize) -> Option<u64> {
    let bytes = buffer.get(offset..offset + HASH_SIZE)?;
    let mut raw = [0u8; HASH_SIZE];
    raw.copy_from_slice(bytes);
    Some(u64::from_le_bytes(raw))
}

/// Byte range of the entry starting at `offset`, including hash and terminator
pub(crate) fn entry_range(buffer: &[u8], offset: usize) -> Option<std::ops::Range<usize>> {
    let text_start = offset.checked_add(HASH_SIZE)?;
    let tail = buffer.get(text_start..)?;
    let len = tail.iter().position(|b| *b == 0).unwrap_or(tail.len());
    let end = (text_start + len + 1).min(buffer.len());
    Some(offset..end)
}

/// Iterate `(offset, hash)` for every entry in the table
pub fn entries(buffer: &[u8]) -> impl Iterator<Item = (usize, u64)> + '_ {
    let mut offset = 0usize;
    std::iter::from_fn(move || {
        let hash = read_hash(buffer, offset)?;
        let range = entry_range(buffer, offset)?;
        let start = offset;
        offset = range.end;
        Some((start, hash))
    })
}

/// Offset of the entry whose leading hash is `hash`
pub fn find_string(buffer: &[u8], hash: u64) -> Option<usize> {
    entries(buffer).find(|(_, h)| *h == hash).map(|(offset, _)| offset)
}

/// String stored at `offset`, or "" for an out-of-range or non-utf8 entry
pub fn read_string(buffer: &[u8], offset: usize) -> &str {
    entry_range(buffer, offset)
        .and_then(|range| {
            let text = &buffer[range.start + HASH_SIZE..range.end];
            let text = text.strip_suffix(&[0]).unwrap_or(text);
            std::str::from_utf8(text).ok()
        })
        .unwrap_or("")
}

/// Encode one table entry
pub fn encode_entry(s: &str) -> Vec<u8> {
    let mut entry = Vec::with_capacity(HASH_SIZE + s.len() + 1);
    entry.extend_from_slice(&hash64(s).to_le_bytes());
    entry.extend_from_slice(s.as_bytes());
    entry.push(0);
    entry
}

/// Append `s` unless an entry with the same hash exists. Returns its offset.
pub fn add_string(buffer: &mut Vec<u8>, s: &str) -> u32 {
    if let Some(offset) = find_string(buffer, hash64(s)) {
        return offset as u32;
    }
    let offset = buffer.len();
    buffer.extend_from_slice(&encode_entry(s));
    offset as u32
}

/// Guids of the supplements entry at `offset`
pub fn read_supplements(buffer: &[u64], offset: u32) -> &[u64] {
    let offset = offset as usize;
    if offset == 0 || offset >= buffer.len() {
        return &[];
    }
    let count = buffer[offset] as usize;
    buffer.get(offset + 1..offset + 1 + count).unwrap_or(&[])
}

/// Append a supplements entry unless an identical one exists. Empty lists map to 0.
pub fn add_supplements(buffer: &mut Vec<u64>, supplements: &[u64]) -> u32 {
    if supplements.is_empty() {
        return 0;
    }
    let mut i = 0usize;
    while i < buffer.len() {
        let count = buffer[i] as usize;
        if count == supplements.len() && buffer.get(i + 1..i + 1 + count) == Some(supplements) {
            return i as u32;
        }
        i += 1 + count;
    }
    if buffer.is_empty() {
        buffer.push(0);
    }
    let offset = buffer.len();
    buffer.push(supplements.len() as u64);
    buffer.extend_from_slice(supplements);
    offset as u32
}

/// Parse a comma separated supplements list. Items that are entirely hex
/// digits are taken as raw guids; anything else is hashed.
pub fn parse_supplements(text: &str) -> Vec<u64> {
    text.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| u64::from_str_radix(item, 16).unwrap_or_else(|_| hash64(item)))
        .collect()
}

pub fn format_supplements(guids: &[u64]) -> String {
    guids.iter().map(|g| format!("{g:x}")).collect::<Vec<_>>().join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_string_dedups() {
        let mut buffer = Vec::new();
        let a = add_string(&mut buffer, "models/tree.mdl");
        let b = add_string(&mut buffer, "materials/bark.mat");
        let again = add_string(&mut buffer, "models/tree.mdl");
        assert_eq!(a, 0);
        assert_eq!(again, a);
        assert_eq!(b as usize, 8 + "models/tree.mdl".len() + 1);
        assert_eq!(read_string(&buffer, a as usize), "models/tree.mdl");
        assert_eq!(read_string(&buffer, b as usize), "materials/bark.mat");
        assert_eq!(entries(&buffer).count(), 2);
    }

    #[test]
    fn test_read_string_out_of_range() {
        let mut buffer = Vec::new();
        add_string(&mut buffer, "x");
        assert_eq!(read_string(&buffer, 500), "");
    }

    #[test]
    fn test_supplements_buffer() {
        let mut buffer = Vec::new();
        assert_eq!(add_supplements(&mut buffer, &[]), 0);
        let first = add_supplements(&mut buffer, &[7, 9]);
        let second = add_supplements(&mut buffer, &[3]);
        assert_eq!(first, 1);
        assert_eq!(add_supplements(&mut buffer, &[7, 9]), first);
        assert_eq!(read_supplements(&buffer, first), &[7, 9]);
        assert_eq!(read_supplements(&buffer, second), &[3]);
        assert!(read_supplements(&buffer, 0).is_empty());
        assert_eq!(buffer[0], 0);
    }

    #[test]
    fn test_supplements_text() {
        let parsed = parse_supplements("1f,grass-layer");
        assert_eq!(parsed[0], 0x1f);
        assert_eq!(parsed[1], hash64("grass-layer"));
        assert_eq!(format_supplements(&[0x1f, 0xab]), "1f,ab");
        assert!(parse_supplements("").is_empty());
    }
}
