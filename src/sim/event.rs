/// Events emitted while the session runs.
/// The presentation layer consumes these for sound and the log.

use crate::domain::countdown::AlertColor;
use crate::domain::progression::Screen;
use crate::domain::puzzle::PuzzleId;
use crate::domain::reward::RevealLine;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    ScreenChanged { from: Screen, to: Screen },
    PuzzleAccepted { puzzle: PuzzleId, bonus: u64 },
    PuzzleRejected { puzzle: PuzzleId },
    ScoreChanged { score: u64 },
    CountdownTick { remaining: u32, alert: Option<AlertColor> },
    CountdownExpired,
    CountdownStopped { remaining: u32, bonus: u64 },
    ScanStarted,
    ScanStopped,
    LineRevealed { line: RevealLine },
    Celebration,
    EpilogueOffered,
    EpilogueHint { attempts: u32 },
    EpilogueRevealed,
    EpilogueClosed,
}
