use crate::domain::{
    COMMAND_HIDE, COMMAND_KILL, COMMAND_SHOW, ControlMessage, ProgramIndex,
};
use crate::ui::{InputEvent, KeyEvent};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Visibility {
    Active,
    Hidden,
}

/// What the session loop must do after a transition. The model never
/// performs I/O itself; effects keep it a pure, single-writer state
/// machine.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Effect {
    /// Redraw the current typed text and suggestion.
    Render,
    /// Legacy passthrough: display a literal command value.
    SetDisplayText(String),
    ShowSurface,
    HideSurface,
    /// Resolve and spawn this program name (may be empty; the runner
    /// logs the lookup failure).
    Execute(String),
    /// Feed a command back into the session's own control channel.
    SendSelf(String),
    /// End the process; no further events are handled.
    Terminate,
}

/// Interactive session state: visibility, the text typed so far and the
/// current completion. Owned exclusively by the session loop.
#[derive(Debug)]
pub struct SessionModel {
    index: ProgramIndex,
    visibility: Visibility,
    typed_text: String,
    suggestion: String,
}

impl SessionModel {
    /// The daemon starts visible and ready for input.
    pub fn new(index: ProgramIndex) -> Self {
        Self {
            index,
            visibility: Visibility::Active,
            typed_text: String::new(),
            suggestion: String::new(),
        }
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn typed_text(&self) -> &str {
        &self.typed_text
    }

    pub fn suggestion(&self) -> &str {
        &self.suggestion
    }

    fn reset_entry(&mut self) {
        self.typed_text.clear();
        self.suggestion.clear();
    }

    fn recompute_suggestion(&mut self) {
        self.suggestion = self
            .index
            .find_best_prefix_match(&self.typed_text)
            .unwrap_or_default()
            .to_string();
    }

    /// Control messages apply from either state.
    pub fn apply_control(&mut self, message: &ControlMessage) -> Vec<Effect> {
        match message.command.as_str() {
            COMMAND_SHOW => {
                self.reset_entry();
                self.visibility = Visibility::Active;
                vec![Effect::ShowSurface, Effect::Render]
            }
            COMMAND_HIDE => {
                self.visibility = Visibility::Hidden;
                vec![Effect::HideSurface]
            }
            COMMAND_KILL => vec![Effect::Terminate],
            _other => vec![Effect::SetDisplayText(message.command.clone())],
        }
    }

    /// Input events only matter while active; polling is suspended while
    /// hidden, so anything that still arrives is dropped.
    pub fn apply_input(&mut self, event: InputEvent) -> Vec<Effect> {
        if self.visibility != Visibility::Active {
            return Vec::new();
        }
        match event {
            InputEvent::Quit => vec![Effect::Terminate],
            InputEvent::Key(key) => self.apply_key(key),
            InputEvent::Unrecognized => Vec::new(),
        }
    }

    fn apply_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        match key {
            KeyEvent::Char(ch) => {
                self.typed_text.push(ch);
                self.recompute_suggestion();
                vec![Effect::Render]
            }
            KeyEvent::Backspace => {
                self.typed_text.pop();
                // Recomputed even when empty, which clears the suggestion.
                self.recompute_suggestion();
                vec![Effect::Render]
            }
            KeyEvent::Enter => {
                let program = std::mem::take(&mut self.suggestion);
                self.typed_text.clear();
                vec![
                    Effect::SendSelf(COMMAND_HIDE.to_string()),
                    Effect::Execute(program),
                ]
            }
            KeyEvent::Escape => {
                self.reset_entry();
                vec![Effect::SendSelf(COMMAND_HIDE.to_string())]
            }
        }
    }

    /// Periodic redraw, driven by the interval that runs only while
    /// active.
    pub fn tick(&self) -> Vec<Effect> {
        match self.visibility {
            Visibility::Active => vec![Effect::Render],
            Visibility::Hidden => Vec::new(),
        }
    }
}
