/// Modal dialogs: the terminal stand-ins for alert / confirm / prompt.
///
/// The session queues them; the front of the queue is shown and blocks all
/// other input until answered.

use std::collections::VecDeque;

/// Single-line text entry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TextField {
    text: String,
    max_chars: usize,
}

impl TextField {
    pub fn new(max_chars: usize) -> Self {
        TextField { text: String::new(), max_chars }
    }

    pub fn push(&mut self, c: char) {
        if c.is_control() || self.text.chars().count() >= self.max_chars {
            return;
        }
        self.text.push(c);
    }

    pub fn backspace(&mut self) {
        self.text.pop();
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.text)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfirmPurpose {
    OfferEpilogue,
    Logout,
    ForceScanPass,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PromptPurpose {
    ManualOverride,
    EpilogueQuiz,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DialogKind {
    Alert,
    Confirm(ConfirmPurpose),
    Prompt(PromptPurpose, TextField),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dialog {
    pub kind: DialogKind,
    pub text: String,
}

impl Dialog {
    pub fn alert(text: impl Into<String>) -> Self {
        Dialog { kind: DialogKind::Alert, text: text.into() }
    }

    pub fn confirm(purpose: ConfirmPurpose, text: impl Into<String>) -> Self {
        Dialog { kind: DialogKind::Confirm(purpose), text: text.into() }
    }

    pub fn prompt(purpose: PromptPurpose, text: impl Into<String>) -> Self {
        Dialog {
            kind: DialogKind::Prompt(purpose, TextField::new(32)),
            text: text.into(),
        }
    }

    pub fn field_mut(&mut self) -> Option<&mut TextField> {
        match &mut self.kind {
            DialogKind::Prompt(_, field) => Some(field),
            _ => None,
        }
    }
}

/// The user's answer to the front dialog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DialogResponse {
    /// Alert acknowledged.
    Dismissed,
    /// Confirm answered.
    Confirmed(bool),
    /// Prompt submitted with its field contents.
    Submitted(String),
    /// Prompt or confirm backed out of.
    Cancelled,
}

#[derive(Clone, Debug, Default)]
pub struct DialogQueue {
    queue: VecDeque<Dialog>,
}

impl DialogQueue {
    pub fn push(&mut self, dialog: Dialog) {
        self.queue.push_back(dialog);
    }

    pub fn front(&self) -> Option<&Dialog> {
        self.queue.front()
    }

    pub fn front_mut(&mut self) -> Option<&mut Dialog> {
        self.queue.front_mut()
    }

    pub fn push_front(&mut self, dialog: Dialog) {
        self.queue.push_front(dialog);
    }

    pub fn pop(&mut self) -> Option<Dialog> {
        self.queue.pop_front()
    }
}
