//! Terminfo capability resolution.
//!
//! `Terminfo` is an immutable capability map built once from `$TERM`: the
//! compiled database entry when one can be found and parsed, otherwise a
//! builtin xterm/linux fallback. Accessors hand out raw sequences or run the
//! `tparm` evaluator over pre-resolved capability strings; the hot
//! capabilities used on every cursor move or color change are cached as
//! struct fields so rendering never touches the map.

use std::collections::HashMap;
use std::env;

mod builtin;
mod database;
mod error;
mod names;
mod tparm;

pub use error::{ParseError, TerminfoError};
pub use tparm::tparm;

/// SGR fallbacks for attribute capabilities many databases omit.
const FALLBACK_DIM: &str = "\x1b[2m";
const FALLBACK_ITALIC: &str = "\x1b[3m";
const FALLBACK_HIDDEN: &str = "\x1b[8m";
const FALLBACK_STRIKETHROUGH: &str = "\x1b[9m";

#[derive(Debug, Clone)]
pub struct Terminfo {
    term: String,
    caps: HashMap<String, String>,
    // Hot parametrized capabilities, resolved once.
    cup: String,
    setaf: String,
    setab: String,
    cuf: String,
    cub: String,
    cuu: String,
    cud: String,
    hpa: String,
    vpa: String,
    ech: String,
    il: String,
    dl: String,
}

impl Terminfo {
    /// Build from `$TERM`. The only failure is a missing variable; database
    /// problems fall back to the builtin capability map.
    pub fn from_env() -> Result<Terminfo, TerminfoError> {
        let term = env::var("TERM").unwrap_or_default();
        if term.is_empty() {
            return Err(TerminfoError::TermNotSet);
        }
        Ok(Terminfo::from_term(&term))
    }

    /// Build for a specific terminal name, never failing.
    pub fn from_term(term: &str) -> Terminfo {
        let caps = match database::read_entry(term) {
            Some(data) => match database::parse(&data) {
                Ok(caps) => caps,
                Err(err) => {
                    tracing::debug!(
                        target: "termisu.terminfo",
                        term,
                        %err,
                        "database entry unusable, using builtin capabilities"
                    );
                    builtin::capabilities(term)
                }
            },
            None => {
                tracing::debug!(
                    target: "termisu.terminfo",
                    term,
                    "no database entry, using builtin capabilities"
                );
                builtin::capabilities(term)
            }
        };
        Terminfo::from_caps(term, caps)
    }

    fn from_caps(term: &str, caps: HashMap<String, String>) -> Terminfo {
        let resolve = |name: &str| caps.get(name).cloned().unwrap_or_default();
        Terminfo {
            term: term.to_string(),
            cup: resolve("cup"),
            setaf: resolve("setaf"),
            setab: resolve("setab"),
            cuf: resolve("cuf"),
            cub: resolve("cub"),
            cuu: resolve("cuu"),
            cud: resolve("cud"),
            hpa: resolve("hpa"),
            vpa: resolve("vpa"),
            ech: resolve("ech"),
            il: resolve("il"),
            dl: resolve("dl"),
            caps,
        }
    }

    /// The `$TERM` value this map was built for.
    pub fn term(&self) -> &str {
        &self.term
    }

    /// Raw capability lookup by short name; absent capabilities are empty.
    pub fn get(&self, name: &str) -> &str {
        self.caps.get(name).map(String::as_str).unwrap_or("")
    }

    fn get_or(&self, name: &str, fallback: &'static str) -> &str {
        let value = self.get(name);
        if value.is_empty() { fallback } else { value }
    }

    // Unparametrized sequences.

    pub fn enter_ca_seq(&self) -> &str {
        self.get("smcup")
    }

    pub fn exit_ca_seq(&self) -> &str {
        self.get("rmcup")
    }

    pub fn clear_screen_seq(&self) -> &str {
        self.get("clear")
    }

    pub fn show_cursor_seq(&self) -> &str {
        self.get("cnorm")
    }

    pub fn hide_cursor_seq(&self) -> &str {
        self.get("civis")
    }

    pub fn reset_attrs_seq(&self) -> &str {
        self.get("sgr0")
    }

    pub fn bold_seq(&self) -> &str {
        self.get("bold")
    }

    pub fn underline_seq(&self) -> &str {
        self.get("smul")
    }

    pub fn blink_seq(&self) -> &str {
        self.get("blink")
    }

    pub fn reverse_seq(&self) -> &str {
        self.get("rev")
    }

    pub fn dim_seq(&self) -> &str {
        self.get_or("dim", FALLBACK_DIM)
    }

    pub fn italic_seq(&self) -> &str {
        self.get_or("sitm", FALLBACK_ITALIC)
    }

    pub fn hidden_seq(&self) -> &str {
        self.get_or("invis", FALLBACK_HIDDEN)
    }

    pub fn strikethrough_seq(&self) -> &str {
        self.get_or("smxx", FALLBACK_STRIKETHROUGH)
    }

    pub fn enter_keypad_seq(&self) -> &str {
        self.get("smkx")
    }

    pub fn exit_keypad_seq(&self) -> &str {
        self.get("rmkx")
    }

    // Parametrized sequences. Coordinates are 0-based; capabilities using
    // `%i` convert to the wire's 1-based form themselves.

    pub fn cursor_position_seq(&self, row: i32, col: i32) -> String {
        tparm(&self.cup, &[row as i64, col as i64])
    }

    pub fn foreground_color_seq(&self, index: i32) -> String {
        tparm(&self.setaf, &[index as i64])
    }

    pub fn background_color_seq(&self, index: i32) -> String {
        tparm(&self.setab, &[index as i64])
    }

    pub fn cursor_forward_seq(&self, n: i32) -> String {
        tparm(&self.cuf, &[n as i64])
    }

    pub fn cursor_backward_seq(&self, n: i32) -> String {
        tparm(&self.cub, &[n as i64])
    }

    pub fn cursor_up_seq(&self, n: i32) -> String {
        tparm(&self.cuu, &[n as i64])
    }

    pub fn cursor_down_seq(&self, n: i32) -> String {
        tparm(&self.cud, &[n as i64])
    }

    pub fn column_address_seq(&self, col: i32) -> String {
        tparm(&self.hpa, &[col as i64])
    }

    pub fn row_address_seq(&self, row: i32) -> String {
        tparm(&self.vpa, &[row as i64])
    }

    pub fn erase_chars_seq(&self, n: i32) -> String {
        tparm(&self.ech, &[n as i64])
    }

    pub fn insert_lines_seq(&self, n: i32) -> String {
        tparm(&self.il, &[n as i64])
    }

    pub fn delete_lines_seq(&self, n: i32) -> String {
        tparm(&self.dl, &[n as i64])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builtin_xterm() -> Terminfo {
        Terminfo::from_caps("xterm", builtin::capabilities("xterm"))
    }

    #[test]
    fn builtin_fallback_is_usable() {
        let info = builtin_xterm();
        assert!(!info.clear_screen_seq().is_empty());
        assert_eq!(info.enter_ca_seq(), "\x1b[?1049h");
        assert_eq!(info.cursor_position_seq(4, 9), "\x1b[5;10H");
        assert_eq!(info.foreground_color_seq(2), "\x1b[32m");
        assert_eq!(info.background_color_seq(5), "\x1b[45m");
    }

    #[test]
    fn missing_capabilities_are_empty() {
        let info = builtin_xterm();
        assert_eq!(info.get("mrcup"), "");
        assert_eq!(info.cursor_forward_seq(3), "");
    }

    #[test]
    fn attribute_fallbacks_fill_gaps() {
        let info = builtin_xterm();
        assert_eq!(info.dim_seq(), "\x1b[2m");
        assert_eq!(info.italic_seq(), "\x1b[3m");
        assert_eq!(info.hidden_seq(), "\x1b[8m");
        assert_eq!(info.strikethrough_seq(), "\x1b[9m");
        assert_eq!(info.bold_seq(), "\x1b[1m");
    }

    #[test]
    fn accessors_are_stable_across_calls() {
        let info = builtin_xterm();
        assert_eq!(info.cursor_position_seq(1, 1), info.cursor_position_seq(1, 1));
    }
}
