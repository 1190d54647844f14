//! Hardcoded capability maps for terminals whose database entry cannot be
//! found or parsed. Two profiles cover the overwhelmingly common cases:
//! xterm-compatible emulators and the Linux console.

use std::collections::HashMap;

/// Function capabilities shared by both builtin profiles.
const COMMON: &[(&str, &str)] = &[
    ("smcup", "\x1b[?1049h"),
    ("rmcup", "\x1b[?1049l"),
    ("cnorm", "\x1b[?25h"),
    ("civis", "\x1b[?25l"),
    ("clear", "\x1b[H\x1b[2J"),
    ("sgr0", "\x1b[0m"),
    ("smul", "\x1b[4m"),
    ("bold", "\x1b[1m"),
    ("blink", "\x1b[5m"),
    ("rev", "\x1b[7m"),
    ("smkx", "\x1b[?1h\x1b="),
    ("rmkx", "\x1b[?1l\x1b>"),
    ("setaf", "\x1b[3%p1%dm"),
    ("setab", "\x1b[4%p1%dm"),
    ("cup", "\x1b[%i%p1%d;%p2%dH"),
];

/// xterm-family key reports.
const XTERM_KEYS: &[(&str, &str)] = &[
    ("kf1", "\x1bOP"),
    ("kf2", "\x1bOQ"),
    ("kf3", "\x1bOR"),
    ("kf4", "\x1bOS"),
    ("kf5", "\x1b[15~"),
    ("kf6", "\x1b[17~"),
    ("kf7", "\x1b[18~"),
    ("kf8", "\x1b[19~"),
    ("kf9", "\x1b[20~"),
    ("kf10", "\x1b[21~"),
    ("kf11", "\x1b[23~"),
    ("kf12", "\x1b[24~"),
    ("kich1", "\x1b[2~"),
    ("kdch1", "\x1b[3~"),
    ("khome", "\x1b[H"),
    ("kend", "\x1b[F"),
    ("kpp", "\x1b[5~"),
    ("knp", "\x1b[6~"),
    ("kcuu1", "\x1b[A"),
    ("kcud1", "\x1b[B"),
    ("kcub1", "\x1b[D"),
    ("kcuf1", "\x1b[C"),
];

/// Linux console key reports; function keys use the `[[` prefix and
/// Home/End the tilde forms.
const LINUX_KEYS: &[(&str, &str)] = &[
    ("kf1", "\x1b[[A"),
    ("kf2", "\x1b[[B"),
    ("kf3", "\x1b[[C"),
    ("kf4", "\x1b[[D"),
    ("kf5", "\x1b[[E"),
    ("kf6", "\x1b[17~"),
    ("kf7", "\x1b[18~"),
    ("kf8", "\x1b[19~"),
    ("kf9", "\x1b[20~"),
    ("kf10", "\x1b[21~"),
    ("kf11", "\x1b[23~"),
    ("kf12", "\x1b[24~"),
    ("kich1", "\x1b[2~"),
    ("kdch1", "\x1b[3~"),
    ("khome", "\x1b[1~"),
    ("kend", "\x1b[4~"),
    ("kpp", "\x1b[5~"),
    ("knp", "\x1b[6~"),
    ("kcuu1", "\x1b[A"),
    ("kcud1", "\x1b[B"),
    ("kcub1", "\x1b[D"),
    ("kcuf1", "\x1b[C"),
];

/// Capability map for `term` when the database is unavailable. Unknown
/// terminal families get the xterm profile, the least wrong default.
pub(crate) fn capabilities(term: &str) -> HashMap<String, String> {
    let keys = if term.starts_with("linux") {
        LINUX_KEYS
    } else {
        XTERM_KEYS
    };
    COMMON
        .iter()
        .chain(keys.iter())
        .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
        .collect()
}
