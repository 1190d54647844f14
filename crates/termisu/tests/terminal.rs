//! Facade behavior over the in-memory backend with builtin capabilities.

use anyhow::Result;
use termisu::{
    Attribute, Color, MouseProtocol, Terminal, TerminalMode, TestBackend, Terminfo,
};
use std::sync::{Arc, Mutex};

fn terminal(width: i32, height: i32) -> (Terminal, Arc<Mutex<Vec<u8>>>) {
    let backend = TestBackend::new(width, height);
    let output = backend.output();
    // A name no database has: deterministic builtin xterm capabilities.
    let info = Terminfo::from_term("nonexistent-fake-terminal-xyz");
    let term = Terminal::with_backend(Box::new(backend), info).unwrap();
    (term, output)
}

fn take(output: &Arc<Mutex<Vec<u8>>>) -> String {
    let mut locked = output.lock().unwrap();
    let bytes = std::mem::take(&mut *locked);
    String::from_utf8_lossy(&bytes).into_owned()
}

#[test]
fn buffer_sized_from_backend() -> Result<()> {
    let (term, _) = terminal(100, 40);
    assert_eq!(term.width(), 100);
    assert_eq!(term.height(), 40);
    assert_eq!(term.size()?, (100, 40));
    Ok(())
}

#[test]
fn first_render_paints_second_render_emits_no_cells() -> Result<()> {
    let (mut term, output) = terminal(80, 24);
    term.set_sync_updates(false);
    assert!(term.set_cell(0, 0, "A", Color::DEFAULT, Color::DEFAULT, Attribute::empty()));
    term.render()?;
    let first = take(&output);
    assert!(first.contains('A'), "first paint carries content: {first:?}");

    term.render()?;
    let second = take(&output);
    assert!(
        !second.contains('A'),
        "unchanged buffer must not re-emit cells: {second:?}"
    );
    // Only cursor bookkeeping may remain, and after a back-to-back render
    // even that is cached away.
    term.render()?;
    assert_eq!(take(&output), "");
    Ok(())
}

#[test]
fn synchronized_updates_bracket_the_paint() -> Result<()> {
    let (mut term, output) = terminal(10, 2);
    assert!(term.sync_updates(), "synchronized updates default on");
    term.set_cell(0, 0, "x", Color::DEFAULT, Color::DEFAULT, Attribute::empty());
    term.render()?;
    let out = take(&output);
    let bsu = out.find("\x1b[?2026h").expect("BSU present");
    let esu = out.find("\x1b[?2026l").expect("ESU present");
    let content = out.find('x').expect("content present");
    assert!(bsu < content && content < esu, "paint inside brackets: {out:?}");
    Ok(())
}

#[test]
fn wide_grapheme_roundtrip_through_facade() -> Result<()> {
    let (mut term, _) = terminal(80, 24);
    assert!(term.set_cell(0, 0, "中", Color::DEFAULT, Color::DEFAULT, Attribute::empty()));
    assert_eq!(term.get_cell(0, 0).unwrap().width, 2);
    assert!(term.get_cell(1, 0).unwrap().continuation);
    assert_eq!(term.get_cell(2, 0).unwrap().width, 1);

    assert!(term.set_cell(1, 0, "X", Color::DEFAULT, Color::DEFAULT, Attribute::empty()));
    assert_eq!(term.get_cell(0, 0).unwrap().grapheme, " ");
    assert_eq!(term.get_cell(1, 0).unwrap().grapheme, "X");
    Ok(())
}

#[test]
fn alternate_screen_sequences_and_idempotence() -> Result<()> {
    let (mut term, output) = terminal(10, 4);
    term.enter_alternate_screen()?;
    let out = take(&output);
    assert!(out.contains("\x1b[?1049h"), "smcup in {out:?}");
    assert!(out.contains("\x1b[H\x1b[2J"), "clear in {out:?}");
    assert!(term.alternate_screen());

    term.enter_alternate_screen()?;
    assert_eq!(take(&output), "", "re-entry is a no-op");

    term.exit_alternate_screen()?;
    let out = take(&output);
    assert!(out.contains("\x1b[?1049l"), "rmcup in {out:?}");
    assert!(out.contains("\x1b[?25h"), "cursor shown in {out:?}");
    assert!(!term.alternate_screen());
    Ok(())
}

#[test]
fn with_mode_restores_and_invalidates() -> Result<()> {
    let (mut term, output) = terminal(10, 4);
    term.set_mode(TerminalMode::Raw)?;
    term.set_sync_updates(false);
    term.set_cell(0, 0, "k", Color::DEFAULT, Color::DEFAULT, Attribute::empty());
    term.render()?;
    take(&output);

    let observed = term.with_mode(TerminalMode::Cooked, true, |term| {
        Ok(term.current_mode())
    })?;
    assert_eq!(observed, Some(TerminalMode::Cooked));
    assert_eq!(term.current_mode(), Some(TerminalMode::Raw));

    // The cleanup path invalidated the buffer: the next render repaints.
    term.render()?;
    let out = take(&output);
    assert!(out.contains('k'), "full repaint after with_mode: {out:?}");
    Ok(())
}

#[test]
fn with_mode_cleans_up_on_error() {
    let (mut term, _) = terminal(10, 4);
    term.set_mode(TerminalMode::Raw).unwrap();
    let result: termisu::Result<()> = term.with_mode(TerminalMode::Cooked, true, |_| {
        Err(termisu::TerminalError::Write(std::io::Error::other("boom")))
    });
    assert!(result.is_err(), "the block's error propagates");
    assert_eq!(term.current_mode(), Some(TerminalMode::Raw));
}

#[test]
fn with_mode_defaults_to_raw_when_no_mode_recorded() -> Result<()> {
    let (mut term, _) = terminal(10, 4);
    assert_eq!(term.current_mode(), None);
    term.with_mode(TerminalMode::Cooked, true, |_| Ok(()))?;
    assert_eq!(term.current_mode(), Some(TerminalMode::Raw));
    Ok(())
}

#[test]
fn direct_style_setters_cache() -> Result<()> {
    let (mut term, output) = terminal(10, 4);
    term.set_foreground(Color::Ansi8(2))?;
    assert_eq!(take(&output), "\x1b[32m");
    term.set_foreground(Color::Ansi8(2))?;
    assert_eq!(take(&output), "", "unchanged color skips emission");

    term.enable_bold()?;
    assert_eq!(take(&output), "\x1b[1m");
    term.enable_bold()?;
    assert_eq!(take(&output), "");

    term.reset_attributes()?;
    assert_eq!(take(&output), "\x1b[0m");
    // The cache was cleared, so the same color emits again.
    term.set_foreground(Color::Ansi8(2))?;
    assert_eq!(take(&output), "\x1b[32m");
    Ok(())
}

#[test]
fn mouse_paste_focus_toggles() -> Result<()> {
    let (mut term, output) = terminal(10, 4);
    term.enable_mouse(MouseProtocol::Drag)?;
    let out = take(&output);
    assert!(out.contains("\x1b[?1002h"));
    assert!(out.contains("\x1b[?1006h"));
    term.disable_mouse()?;
    let out = take(&output);
    assert!(out.contains("\x1b[?1002l"));

    term.enable_bracketed_paste()?;
    assert!(take(&output).contains("\x1b[?2004h"));
    term.enable_focus_tracking()?;
    assert!(take(&output).contains("\x1b[?1004h"));
    Ok(())
}

#[test]
fn mode_changes_publish_to_event_sink() -> Result<()> {
    let (mut term, _) = terminal(10, 4);
    let mut events = termisu::EventLoop::new();
    term.set_event_sink(events.sink().unwrap());
    events.start();

    term.set_mode(TerminalMode::Raw)?;
    term.set_mode(TerminalMode::Cooked)?;

    match events.next_event(std::time::Duration::from_millis(100)) {
        Some(termisu::Event::ModeChange(change)) => {
            assert_eq!(change.mode, TerminalMode::Raw);
            assert_eq!(change.previous_mode, None);
            assert!(!change.changed(), "first assignment is not a change");
        }
        other => panic!("expected mode change, got {other:?}"),
    }
    match events.next_event(std::time::Duration::from_millis(100)) {
        Some(termisu::Event::ModeChange(change)) => {
            assert_eq!(change.mode, TerminalMode::Cooked);
            assert_eq!(change.previous_mode, Some(TerminalMode::Raw));
            assert!(change.changed());
        }
        other => panic!("expected mode change, got {other:?}"),
    }
    events.stop();
    Ok(())
}

#[test]
fn close_is_idempotent_and_restores() {
    let backend = TestBackend::new(10, 4);
    let output = backend.output();
    let info = Terminfo::from_term("nonexistent-fake-terminal-xyz");
    let mut term = Terminal::with_backend(Box::new(backend), info).unwrap();
    term.set_mode(TerminalMode::Raw).unwrap();
    term.enter_alternate_screen().unwrap();
    take(&output);

    term.close();
    let out = take(&output);
    assert!(out.contains("\x1b[?1049l"), "alt screen exited: {out:?}");
    term.close();
    assert_eq!(take(&output), "", "second close is silent");
}
