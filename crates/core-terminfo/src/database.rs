//! Compiled terminfo database lookup and parsing.
//!
//! Databases live as one file per terminal name under per-first-letter
//! subdirectories (`x/xterm`); macOS historically uses the hex value of the
//! first letter instead (`78/xterm`). Files begin with a 12-byte header of
//! six little-endian 16-bit words:
//!
//! `magic, names_size, bool_count, num_count, string_count, table_size`
//!
//! Magic 0o432 marks the legacy format with 16-bit numbers; 542 marks the
//! widened format with 32-bit numbers. Numbers are irrelevant here, but
//! their section width moves the string-offset array.

use crate::error::ParseError;
use crate::names::STRING_CAP_NAMES;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;

const MAGIC_LEGACY: u16 = 0o432;
const MAGIC_EXTENDED: u16 = 542;

/// Standard search locations, consulted after `$TERMINFO` and
/// `$HOME/.terminfo`.
const STANDARD_DIRS: &[&str] = &[
    "/etc/terminfo",
    "/lib/terminfo",
    "/usr/share/terminfo",
    "/usr/lib/terminfo",
    "/usr/local/share/terminfo",
];

/// Locate and read the database entry for `term`, or `None` when no
/// candidate file exists or is readable.
pub(crate) fn read_entry(term: &str) -> Option<Vec<u8>> {
    let first = term.chars().next()?;
    let mut dirs: Vec<PathBuf> = Vec::new();
    if let Ok(dir) = env::var("TERMINFO") {
        dirs.push(PathBuf::from(dir));
    }
    if let Ok(home) = env::var("HOME") {
        dirs.push(PathBuf::from(home).join(".terminfo"));
    }
    dirs.extend(STANDARD_DIRS.iter().map(PathBuf::from));

    for dir in dirs {
        // Letter layout, then the legacy hex layout.
        let letter = dir.join(first.to_string()).join(term);
        if let Ok(data) = fs::read(&letter) {
            return Some(data);
        }
        let hex = dir.join(format!("{:02x}", first as u32)).join(term);
        if let Ok(data) = fs::read(&hex) {
            return Some(data);
        }
    }
    None
}

/// Parse a compiled terminfo entry into a capability map. Absent
/// capabilities are mapped to empty strings; positions beyond the builtin
/// name table are ignored.
pub(crate) fn parse(data: &[u8]) -> Result<HashMap<String, String>, ParseError> {
    let header = read_header(data)?;
    let num_size = if header.magic == MAGIC_EXTENDED { 4 } else { 2 };

    let mut pos = 12usize;
    pos = pos
        .checked_add(header.names_size as usize)
        .ok_or(ParseError::TruncatedData { section: "names" })?;
    pos += header.bool_count as usize;
    // The numbers section is aligned to an even byte boundary.
    if pos % 2 == 1 {
        pos += 1;
    }
    pos += header.num_count as usize * num_size;

    let offsets_end = pos + header.string_count as usize * 2;
    let table_end = offsets_end + header.table_size as usize;
    if table_end > data.len() {
        return Err(ParseError::TruncatedData {
            section: "string table",
        });
    }
    let table = &data[offsets_end..table_end];

    let mut caps = HashMap::with_capacity(STRING_CAP_NAMES.len());
    for (index, name) in STRING_CAP_NAMES.iter().enumerate() {
        if index >= header.string_count as usize {
            break;
        }
        let off_pos = pos + index * 2;
        let offset = i16::from_le_bytes([data[off_pos], data[off_pos + 1]]);
        if offset < 0 {
            continue; // -1: capability absent
        }
        let offset = offset as i32;
        if offset >= header.table_size {
            return Err(ParseError::InvalidOffset {
                offset,
                max: header.table_size,
            });
        }
        let start = offset as usize;
        let end = table[start..]
            .iter()
            .position(|&b| b == 0)
            .map(|nul| start + nul)
            .ok_or(ParseError::CorruptedString(start))?;
        let value = String::from_utf8_lossy(&table[start..end]).into_owned();
        caps.insert((*name).to_string(), value);
    }
    Ok(caps)
}

struct Header {
    magic: u16,
    names_size: i32,
    bool_count: i32,
    num_count: i32,
    string_count: i32,
    table_size: i32,
}

fn read_header(data: &[u8]) -> Result<Header, ParseError> {
    if data.len() < 12 {
        return Err(ParseError::TruncatedData { section: "header" });
    }
    let word = |i: usize| i16::from_le_bytes([data[i * 2], data[i * 2 + 1]]);
    let magic = word(0) as u16;
    if magic != MAGIC_LEGACY && magic != MAGIC_EXTENDED {
        return Err(ParseError::InvalidMagic(magic));
    }
    let header = Header {
        magic,
        names_size: word(1) as i32,
        bool_count: word(2) as i32,
        num_count: word(3) as i32,
        string_count: word(4) as i32,
        table_size: word(5) as i32,
    };
    for (field, value) in [
        ("names_size", header.names_size),
        ("bool_count", header.bool_count),
        ("num_count", header.num_count),
        ("string_count", header.string_count),
        ("table_size", header.table_size),
    ] {
        if value < 0 {
            return Err(ParseError::InvalidHeader { field, value });
        }
    }
    Ok(header)
}

#[cfg(test)]
pub(crate) fn build_entry(
    names: &str,
    strings: &[(usize, &str)],
    extended_magic: bool,
) -> Vec<u8> {
    // Test fixture builder: assembles a minimal compiled entry with the
    // given string capabilities at their table positions.
    let string_count = strings.iter().map(|(i, _)| i + 1).max().unwrap_or(0);
    let mut table: Vec<u8> = Vec::new();
    let mut offsets = vec![-1i16; string_count];
    for (index, value) in strings {
        offsets[*index] = table.len() as i16;
        table.extend_from_slice(value.as_bytes());
        table.push(0);
    }

    let names_size = names.len() + 1;
    let magic: u16 = if extended_magic { MAGIC_EXTENDED } else { MAGIC_LEGACY };
    let mut data = Vec::new();
    for word in [
        magic as i16,
        names_size as i16,
        0,
        0,
        string_count as i16,
        table.len() as i16,
    ] {
        data.extend_from_slice(&word.to_le_bytes());
    }
    data.extend_from_slice(names.as_bytes());
    data.push(0);
    if (names_size) % 2 == 1 {
        data.push(0);
    }
    for offset in offsets {
        data.extend_from_slice(&offset.to_le_bytes());
    }
    data.extend_from_slice(&table);
    data
}
