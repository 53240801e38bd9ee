/// Puzzle validators.
///
/// Each free-text puzzle compares normalized input against one fixed answer.
/// The scan puzzle has no free-text answer: it is solved by the scan
/// capability or by an override code, and a wrong override is not an error.

use super::ledger::BonusKind;

pub const BINARY_ANSWER: &str = "1001";
pub const STOP_CODE: &str = "LIH";
pub const FINAL_ANSWER: &str = "144";
pub const OVERRIDE_CODE: &str = "MOM";
pub const OVERRIDE_PASSPHRASE: &str = "pass";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PuzzleId {
    Binary,
    Scan,
    EmergencyStop,
    FinalLogic,
}

impl PuzzleId {
    pub const ALL: [PuzzleId; 4] = [
        PuzzleId::Binary,
        PuzzleId::Scan,
        PuzzleId::EmergencyStop,
        PuzzleId::FinalLogic,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Which bucket a solve of this puzzle credits.
    pub fn bonus_kind(self) -> BonusKind {
        match self {
            PuzzleId::EmergencyStop => BonusKind::Time,
            _ => BonusKind::Cognitive,
        }
    }

    /// The text validator, if the puzzle takes typed answers.
    pub fn validator(self) -> Option<Validator> {
        match self {
            PuzzleId::Binary => Some(Validator::new(BINARY_ANSWER, Normalization::Trim)),
            PuzzleId::EmergencyStop => Some(Validator::new(STOP_CODE, Normalization::TrimUppercase)),
            PuzzleId::FinalLogic => Some(Validator::new(FINAL_ANSWER, Normalization::Trim)),
            PuzzleId::Scan => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Normalization {
    Trim,
    TrimUppercase,
}

#[derive(Clone, Copy, Debug)]
pub struct Validator {
    expected: &'static str,
    normalization: Normalization,
}

impl Validator {
    pub fn new(expected: &'static str, normalization: Normalization) -> Self {
        Validator { expected, normalization }
    }

    pub fn normalize(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        match self.normalization {
            Normalization::Trim => trimmed.to_string(),
            Normalization::TrimUppercase => trimmed.to_uppercase(),
        }
    }

    pub fn validate(&self, raw: &str) -> bool {
        self.normalize(raw) == self.expected
    }
}

/// Manual override for the scan puzzle: the exact code, or the passphrase in any case.
pub fn override_accepts(input: &str) -> bool {
    input == OVERRIDE_CODE || input.to_lowercase() == OVERRIDE_PASSPHRASE
}

/// Transient failure marker on a submit control.
///
/// Raising it while it is already up does nothing, so rejections never
/// stack and never push the auto-clear further out.
#[derive(Clone, Copy, Debug, Default)]
pub struct FailureIndicator {
    active: bool,
}

impl FailureIndicator {
    /// Returns `true` if this call raised it.
    pub fn raise(&mut self) -> bool {
        if self.active {
            return false;
        }
        self.active = true;
        true
    }

    pub fn clear(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}
