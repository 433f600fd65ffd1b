/// One discrete event from the input backend. The backend owns the raw
/// key mapping (historically only `a..=z`, enter, escape and backspace);
/// anything it does not map arrives as `Unrecognized`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InputEvent {
    Quit,
    Key(KeyEvent),
    Unrecognized,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum KeyEvent {
    Char(char),
    Backspace,
    Enter,
    Escape,
}

/// The window/renderer the session drives. The session only pushes
/// transitions out; it never reads state back.
pub trait DisplaySurface {
    fn set_visible(&mut self, visible: bool);
    /// Draw the typed text with the suggestion ghosted behind it.
    fn render(&mut self, typed: &str, suggestion: &str);
    /// Legacy passthrough: show a literal command value verbatim.
    fn set_display_text(&mut self, text: &str);
}

/// Source of input events, polled to exhaustion once per tick while the
/// session is active. Infinite and not restartable.
pub trait InputSource {
    fn poll_event(&mut self) -> Option<InputEvent>;
}

/// Stand-in surface for running without a graphics backend; transitions
/// go to stderr so the daemon stays observable.
#[derive(Debug, Default)]
pub struct HeadlessSurface;

impl DisplaySurface for HeadlessSurface {
    fn set_visible(&mut self, visible: bool) {
        eprintln!("tapd: surface {}", if visible { "shown" } else { "hidden" });
    }

    fn render(&mut self, typed: &str, suggestion: &str) {
        if !typed.is_empty() || !suggestion.is_empty() {
            eprintln!("tapd: [{typed}] -> [{suggestion}]");
        }
    }

    fn set_display_text(&mut self, text: &str) {
        eprintln!("tapd: display: {text}");
    }
}

/// Input source that never produces events; pairs with `HeadlessSurface`
/// when the daemon is driven purely over the control protocol.
#[derive(Debug, Default)]
pub struct IdleInputSource;

impl InputSource for IdleInputSource {
    fn poll_event(&mut self) -> Option<InputEvent> {
        None
    }
}
