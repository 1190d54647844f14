//! Input decoding: raw terminal bytes to key, mouse, and focus events.

mod key;
mod mouse;
mod parser;

pub use key::{KeyCode, KeyEvent, Modifiers};
pub use mouse::{MouseButton, MouseEvent};
pub use parser::{ByteSource, InputEvent, InputParser, ESCAPE_GRACE_MS};
