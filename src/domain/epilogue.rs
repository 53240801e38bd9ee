/// Hidden epilogue gate.
///
/// ```text
///   Dormant ──offer──▶ AwaitingConfirm ──yes──▶ Quiz ──correct──▶ Revealed
///      ▲                     │                   │  ▲
///      │ (reoffer)           no                wrong│ (attempts += 1)
///      └──────────────── Declined                │
///                                                 ├──cancel / bound hit──▶ Cancelled
/// ```
///
/// The quiz compares the answer exactly, with no trimming or case folding.

pub const EPILOGUE_ANSWER: &str = "제미나이";
pub const EPILOGUE_HINT: &str = "ㅈㅁㄴㅇ";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateState {
    Dormant,
    AwaitingConfirm,
    Quiz { attempts: u32 },
    Declined,
    Revealed,
    Cancelled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuizOutcome {
    Correct,
    Wrong { attempts: u32, hint: &'static str },
    /// The attempt bound was hit; the gate is closed.
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    #[error("no confirmation is pending (gate is {0:?})")]
    NotAwaitingConfirm(GateState),
    #[error("the quiz is not open (gate is {0:?})")]
    QuizNotOpen(GateState),
}

#[derive(Clone, Debug)]
pub struct EpilogueGate {
    state: GateState,
    /// `None` = unlimited attempts.
    max_attempts: Option<u32>,
    reoffer_on_decline: bool,
}

impl EpilogueGate {
    pub fn new(max_attempts: Option<u32>, reoffer_on_decline: bool) -> Self {
        EpilogueGate {
            state: GateState::Dormant,
            max_attempts,
            reoffer_on_decline,
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn is_revealed(&self) -> bool {
        self.state == GateState::Revealed
    }

    /// Returns `true` if a yes/no confirmation should now be shown.
    pub fn offer(&mut self) -> bool {
        let open = match self.state {
            GateState::Dormant => true,
            GateState::Declined => self.reoffer_on_decline,
            _ => false,
        };
        if open {
            self.state = GateState::AwaitingConfirm;
        }
        open
    }

    pub fn confirm(&mut self, accept: bool) -> Result<(), GateError> {
        if self.state != GateState::AwaitingConfirm {
            return Err(GateError::NotAwaitingConfirm(self.state));
        }
        self.state = if accept {
            GateState::Quiz { attempts: 0 }
        } else {
            GateState::Declined
        };
        Ok(())
    }

    pub fn answer(&mut self, input: &str) -> Result<QuizOutcome, GateError> {
        let GateState::Quiz { attempts } = self.state else {
            return Err(GateError::QuizNotOpen(self.state));
        };
        if input == EPILOGUE_ANSWER {
            self.state = GateState::Revealed;
            return Ok(QuizOutcome::Correct);
        }
        let attempts = attempts + 1;
        if self.max_attempts.is_some_and(|max| attempts >= max) {
            self.state = GateState::Cancelled;
            return Ok(QuizOutcome::Exhausted);
        }
        self.state = GateState::Quiz { attempts };
        Ok(QuizOutcome::Wrong { attempts, hint: EPILOGUE_HINT })
    }

    /// Escape path from the confirmation or the quiz. Returns `true` if it closed anything.
    pub fn cancel(&mut self) -> bool {
        match self.state {
            GateState::AwaitingConfirm | GateState::Quiz { .. } => {
                self.state = GateState::Cancelled;
                true
            }
            _ => false,
        }
    }
}
