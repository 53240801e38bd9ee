/// Phase progression, driven by a transition table.
///
/// Screens run in a fixed line, with a single side path at the end:
///
/// ┌──────────────┬──────────────────────────┬──────────────┬───────────┐
/// │ From          │ Trigger                   │ To            │ Indicator │
/// ├──────────────┼──────────────────────────┼──────────────┼───────────┤
/// │ Intro         │ Begin                     │ Binary        │ 1         │
/// │ Binary        │ Solved(Binary)            │ Scan          │ 2         │
/// │ Scan          │ Solved(Scan)              │ MomLetter     │ 2         │
/// │ MomLetter     │ DismissLetter             │ Emergency     │ 3         │
/// │ Emergency     │ Solved(EmergencyStop)     │ FinalLogic    │ 4         │
/// │ FinalLogic    │ Solved(FinalLogic)        │ DadLetter     │ 4         │
/// │ DadLetter     │ DismissLetter             │ Reward        │ 4         │
/// │ Reward        │ RevealEpilogue            │ Epilogue      │ 4         │
/// │ Epilogue      │ Logout                    │ Reward        │ 4         │
/// │ anything else │                           │ ERROR         │ unchanged │
/// └──────────────┴──────────────────────────┴──────────────┴───────────┘
///
/// The indicator never decreases. A solve for a puzzle that was already
/// solved is reported separately so the caller can apply its replay policy.

use super::puzzle::PuzzleId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Screen {
    Intro,
    Binary,
    Scan,
    MomLetter,
    Emergency,
    FinalLogic,
    DadLetter,
    Reward,
    Epilogue,
}

impl Screen {
    /// The puzzle whose answer this screen collects.
    pub fn puzzle(self) -> Option<PuzzleId> {
        match self {
            Screen::Binary => Some(PuzzleId::Binary),
            Screen::Scan => Some(PuzzleId::Scan),
            Screen::Emergency => Some(PuzzleId::EmergencyStop),
            Screen::FinalLogic => Some(PuzzleId::FinalLogic),
            _ => None,
        }
    }

    pub fn is_letter(self) -> bool {
        matches!(self, Screen::MomLetter | Screen::DadLetter)
    }

    /// HUD shows on puzzle and letter screens only.
    pub fn shows_hud(self) -> bool {
        !matches!(self, Screen::Intro | Screen::Reward | Screen::Epilogue)
    }

    fn indicator(self) -> u8 {
        match self {
            Screen::Intro => 0,
            Screen::Binary => 1,
            Screen::Scan | Screen::MomLetter => 2,
            Screen::Emergency => 3,
            Screen::FinalLogic | Screen::DadLetter | Screen::Reward | Screen::Epilogue => 4,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger {
    Begin,
    Solved(PuzzleId),
    DismissLetter,
    RevealEpilogue,
    Logout,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProgressionError {
    #[error("{trigger:?} is not valid on the {from:?} screen")]
    IllegalTransition { from: Screen, trigger: Trigger },
    #[error("puzzle {0:?} was already solved")]
    AlreadySolved(PuzzleId),
}

fn next_screen(from: Screen, trigger: Trigger) -> Option<Screen> {
    use PuzzleId as P;
    use Screen as S;
    use Trigger as T;
    match (from, trigger) {
        (S::Intro, T::Begin) => Some(S::Binary),
        (S::Binary, T::Solved(P::Binary)) => Some(S::Scan),
        (S::Scan, T::Solved(P::Scan)) => Some(S::MomLetter),
        (S::MomLetter, T::DismissLetter) => Some(S::Emergency),
        (S::Emergency, T::Solved(P::EmergencyStop)) => Some(S::FinalLogic),
        (S::FinalLogic, T::Solved(P::FinalLogic)) => Some(S::DadLetter),
        (S::DadLetter, T::DismissLetter) => Some(S::Reward),
        (S::Reward, T::RevealEpilogue) => Some(S::Epilogue),
        (S::Epilogue, T::Logout) => Some(S::Reward),
        _ => None,
    }
}

#[derive(Clone, Debug)]
pub struct Progression {
    screen: Screen,
    indicator: u8,
    solved: [bool; 4],
}

impl Default for Progression {
    fn default() -> Self {
        Self::new()
    }
}

impl Progression {
    pub fn new() -> Self {
        Progression {
            screen: Screen::Intro,
            indicator: 0,
            solved: [false; 4],
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// The phase number shown in the HUD.
    pub fn indicator(&self) -> u8 {
        self.indicator
    }

    pub fn is_solved(&self, puzzle: PuzzleId) -> bool {
        self.solved[puzzle.index()]
    }

    /// Apply a trigger. On error nothing changes.
    pub fn advance(&mut self, trigger: Trigger) -> Result<Screen, ProgressionError> {
        if let Trigger::Solved(p) = trigger {
            if self.is_solved(p) {
                return Err(ProgressionError::AlreadySolved(p));
            }
        }
        let to = next_screen(self.screen, trigger).ok_or(ProgressionError::IllegalTransition {
            from: self.screen,
            trigger,
        })?;
        if let Trigger::Solved(p) = trigger {
            self.solved[p.index()] = true;
        }
        self.screen = to;
        self.indicator = self.indicator.max(to.indicator());
        Ok(to)
    }
}
