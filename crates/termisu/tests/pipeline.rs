//! Byte-level pipeline checks: buffer mutations in, escape sequences out.
//!
//! These assert on the exact bytes the engine hands the terminal, using the
//! builtin xterm capability profile so every sequence is deterministic.

use anyhow::Result;
use std::sync::{Arc, Mutex};
use termisu::{Attribute, Color, Terminal, TestBackend, Terminfo};

fn terminal(width: i32, height: i32) -> (Terminal, Arc<Mutex<Vec<u8>>>) {
    let backend = TestBackend::new(width, height);
    let output = backend.output();
    let info = Terminfo::from_term("nonexistent-fake-terminal-xyz");
    let mut term = Terminal::with_backend(Box::new(backend), info).unwrap();
    term.set_sync_updates(false);
    (term, output)
}

fn take(output: &Arc<Mutex<Vec<u8>>>) -> String {
    let mut locked = output.lock().unwrap();
    let bytes = std::mem::take(&mut *locked);
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Drain the initial full paint so later assertions see only deltas.
fn warm(term: &mut Terminal, output: &Arc<Mutex<Vec<u8>>>) {
    term.render().unwrap();
    take(output);
}

#[test]
fn single_cell_delta_is_one_move_plus_one_glyph() -> Result<()> {
    let (mut term, output) = terminal(20, 5);
    warm(&mut term, &output);

    term.set_cell(3, 2, "Q", Color::DEFAULT, Color::DEFAULT, Attribute::empty());
    term.render()?;
    let out = take(&output);
    // One absolute move to row 3, column 4 (1-based on the wire), then the
    // glyph. Styles are unchanged so no SGR bytes appear.
    assert!(out.contains("\x1b[3;4HQ"), "delta emission: {out:?}");
    assert!(!out.contains('m'), "no SGR for an unstyled delta: {out:?}");
    assert_eq!(out.matches('Q').count(), 1);
    Ok(())
}

#[test]
fn styled_run_emits_style_once_then_text() -> Result<()> {
    let (mut term, output) = terminal(20, 5);
    warm(&mut term, &output);

    for (i, ch) in ["e", "r", "r", "o", "r"].iter().enumerate() {
        term.set_cell(i as i32, 0, ch, Color::Ansi8(1), Color::DEFAULT, Attribute::BOLD);
    }
    term.render()?;
    let out = take(&output);
    assert_eq!(out.matches("\x1b[1m").count(), 1, "bold once: {out:?}");
    assert_eq!(out.matches("\x1b[31m").count(), 1, "red once: {out:?}");
    assert!(out.contains("error"), "batched text: {out:?}");
    Ok(())
}

#[test]
fn wide_glyph_keeps_cursor_cache_honest() -> Result<()> {
    let (mut term, output) = terminal(20, 5);
    warm(&mut term, &output);

    // A wide glyph advances the terminal cursor by two columns; the cell
    // right after it must not need an extra cursor move.
    term.set_cell(0, 0, "中", Color::DEFAULT, Color::DEFAULT, Attribute::empty());
    term.set_cell(2, 0, "x", Color::DEFAULT, Color::DEFAULT, Attribute::empty());
    term.render()?;
    let out = take(&output);
    assert!(out.contains("中x"), "contiguous emission: {out:?}");
    // Exactly one cursor address before the run (plus the final cursor
    // placement at the buffer cursor).
    let moves = out.matches("\x1b[1;1H").count();
    assert!(moves >= 1, "run addressed once: {out:?}");
    assert!(!out.contains("\x1b[1;2H"), "no move into the continuation: {out:?}");
    Ok(())
}

#[test]
fn style_transition_resets_before_downgrade() -> Result<()> {
    let (mut term, output) = terminal(20, 5);
    warm(&mut term, &output);

    term.set_cell(0, 0, "a", Color::DEFAULT, Color::DEFAULT, Attribute::BOLD);
    term.set_cell(1, 0, "b", Color::DEFAULT, Color::DEFAULT, Attribute::empty());
    term.render()?;
    let out = take(&output);
    let bold = out.find("\x1b[1m").expect("bold enabled");
    let reset = out.rfind("\x1b[0m").expect("reset for the plain cell");
    assert!(bold < reset, "downgrade needs a reset after bold: {out:?}");
    Ok(())
}

#[test]
fn resize_then_render_repaints_whole_grid() -> Result<()> {
    let (mut term, output) = terminal(6, 2);
    term.set_cell(0, 0, "z", Color::DEFAULT, Color::DEFAULT, Attribute::empty());
    warm(&mut term, &output);

    term.resize_buffer(8, 3);
    assert_eq!((term.width(), term.height()), (8, 3));
    term.render()?;
    let out = take(&output);
    assert!(out.contains('z'), "content survives the resize: {out:?}");
    // 8x3 cells repainted.
    let spaces = out.chars().filter(|&c| c == ' ').count();
    assert_eq!(spaces + 1, 24, "full repaint after resize: {out:?}");
    Ok(())
}

#[test]
fn cursor_hide_and_show_emit_dectcem() -> Result<()> {
    let (mut term, output) = terminal(6, 2);
    warm(&mut term, &output);

    term.hide_cursor();
    term.render()?;
    assert!(take(&output).contains("\x1b[?25l"));

    term.show_cursor();
    term.render()?;
    let out = take(&output);
    assert!(out.contains("\x1b[?25h"), "cursor shown again: {out:?}");
    Ok(())
}

#[test]
fn sync_repaints_but_render_after_it_is_quiet() -> Result<()> {
    let (mut term, output) = terminal(10, 2);
    term.set_cell(4, 1, "#", Color::DEFAULT, Color::DEFAULT, Attribute::empty());
    warm(&mut term, &output);

    term.sync()?;
    let full = take(&output);
    assert!(full.contains('#'), "sync repaints everything: {full:?}");

    term.render()?;
    let quiet = take(&output);
    assert!(!quiet.contains('#'), "diff after sync is empty: {quiet:?}");
    Ok(())
}
