//! Property tests: the occupancy invariants survive arbitrary write/resize
//! sequences.

use core_cell::Buffer;
use core_style::{Attribute, Color};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Action {
    Set { x: i32, y: i32, grapheme: String },
    Clear,
    Resize { w: i32, h: i32 },
}

fn grapheme_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("a".to_string()),
        Just("Z".to_string()),
        Just("中".to_string()),
        Just("界".to_string()),
        Just("e\u{0301}".to_string()),
        Just("\u{1F1FA}\u{1F1F8}".to_string()),
        Just("\u{26A0}\u{FE0F}".to_string()),
        Just("".to_string()),
        Just("\x07".to_string()),
    ]
}

fn action_strategy() -> impl Strategy<Value = Action> {
    prop_oneof![
        8 => (0i32..12, 0i32..6, grapheme_strategy())
            .prop_map(|(x, y, grapheme)| Action::Set { x, y, grapheme }),
        1 => Just(Action::Clear),
        1 => (1i32..14, 1i32..8).prop_map(|(w, h)| Action::Resize { w, h }),
    ]
}

proptest! {
    #[test]
    fn invariants_hold_under_random_mutation(actions in prop::collection::vec(action_strategy(), 1..64)) {
        let mut buffer = Buffer::new(10, 5);
        for action in actions {
            match action {
                Action::Set { x, y, grapheme } => {
                    let _ = buffer.set_cell(
                        x,
                        y,
                        &grapheme,
                        Color::DEFAULT,
                        Color::DEFAULT,
                        Attribute::empty(),
                    );
                }
                Action::Clear => buffer.clear(),
                Action::Resize { w, h } => buffer.resize(w, h),
            }
            prop_assert!(buffer.check_invariants().is_ok(), "{:?}", buffer.check_invariants());
        }
    }

    #[test]
    fn set_cell_reports_rejections_without_mutation(x in -2i32..14, y in -2i32..8, g in grapheme_strategy()) {
        let mut buffer = Buffer::new(10, 5);
        let before: Vec<_> = (0..5)
            .flat_map(|row| (0..10).map(move |col| (col, row)))
            .map(|(col, row)| buffer.get_cell(col, row).cloned())
            .collect();
        let accepted = buffer.set_cell(x, y, &g, Color::DEFAULT, Color::DEFAULT, Attribute::empty());
        if !accepted {
            let after: Vec<_> = (0..5)
                .flat_map(|row| (0..10).map(move |col| (col, row)))
                .map(|(col, row)| buffer.get_cell(col, row).cloned())
                .collect();
            prop_assert_eq!(before, after, "rejected write must not mutate the grid");
        }
    }
}
