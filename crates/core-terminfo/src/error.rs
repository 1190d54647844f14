//! Terminfo database parse failures.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("bad terminfo magic {0:#o}")]
    InvalidMagic(u16),
    #[error("terminfo data truncated in {section}")]
    TruncatedData { section: &'static str },
    #[error("invalid terminfo header field {field}: {value}")]
    InvalidHeader { field: &'static str, value: i32 },
    #[error("string offset {offset} exceeds table size {max}")]
    InvalidOffset { offset: i32, max: i32 },
    #[error("unterminated string at table offset {0}")]
    CorruptedString(usize),
}

/// Terminfo construction failure. Database parse problems never surface
/// here; they are absorbed by the builtin fallback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TerminfoError {
    #[error("TERM environment variable not set")]
    TermNotSet,
}
