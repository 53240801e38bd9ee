/// Reward calculation and the staggered count-up reveal.
///
/// Timeline, relative to the reveal call:
///   +0s  base reward counts up (1s)
///   +1s  cognitive bonus counts up (1s)
///   +2s  time bonus counts up (1s)
///   +3s  grand total counts up (2s) + celebration
///   +8s  hidden epilogue offer

use crate::config::RewardSettings;

use super::ledger::ScoreLedger;

pub const SUBTOTAL_COUNT_MS: u64 = 1_000;
pub const TOTAL_COUNT_MS: u64 = 2_000;
pub const EPILOGUE_OFFER_AFTER_TOTAL_MS: u64 = 5_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RewardBreakdown {
    pub base: u64,
    pub cognitive: u64,
    pub time: u64,
    pub total: u64,
}

impl RewardBreakdown {
    /// `total` is the score at call time plus the base reward, however the
    /// score was accumulated.
    pub fn compute(ledger: &ScoreLedger, settings: &RewardSettings) -> Self {
        let bonuses = ledger.bonuses();
        RewardBreakdown {
            base: settings.base_reward,
            cognitive: bonuses.cognitive,
            time: bonuses.time,
            total: ledger.current_score().saturating_add(settings.base_reward),
        }
    }

    pub fn value(&self, line: RevealLine) -> u64 {
        match line {
            RevealLine::Base => self.base,
            RevealLine::Cognitive => self.cognitive,
            RevealLine::Time => self.time,
            RevealLine::Total => self.total,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RevealLine {
    Base,
    Cognitive,
    Time,
    Total,
}

impl RevealLine {
    pub const ALL: [RevealLine; 4] = [
        RevealLine::Base,
        RevealLine::Cognitive,
        RevealLine::Time,
        RevealLine::Total,
    ];

    /// Delay from the reveal call until this line starts counting.
    pub fn delay_ms(self) -> u64 {
        match self {
            RevealLine::Base => 0,
            RevealLine::Cognitive => 1_000,
            RevealLine::Time => 2_000,
            RevealLine::Total => 3_000,
        }
    }

    pub fn count_ms(self) -> u64 {
        match self {
            RevealLine::Total => TOTAL_COUNT_MS,
            _ => SUBTOTAL_COUNT_MS,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Linear count from `start` to `end` over `duration_ms`.
#[derive(Clone, Copy, Debug)]
pub struct CountUp {
    start: u64,
    end: u64,
    duration_ms: u64,
    elapsed_ms: u64,
}

impl CountUp {
    pub fn new(start: u64, end: u64, duration_ms: u64) -> Self {
        CountUp { start, end, duration_ms, elapsed_ms: 0 }
    }

    pub fn advance(&mut self, dt_ms: u64) {
        self.elapsed_ms = self.elapsed_ms.saturating_add(dt_ms).min(self.duration_ms);
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed_ms >= self.duration_ms
    }

    pub fn value(&self) -> u64 {
        if self.is_finished() || self.end <= self.start {
            return self.end;
        }
        let span = (self.end - self.start) as u128;
        let step = span * self.elapsed_ms as u128 / self.duration_ms as u128;
        self.start + step as u64
    }
}

/// What the reward screen shows: the computed breakdown plus one counter per
/// line, present once that line's reveal has fired.
#[derive(Clone, Debug, Default)]
pub struct RewardBoard {
    breakdown: Option<RewardBreakdown>,
    counters: [Option<CountUp>; 4],
    celebrating: bool,
}

impl RewardBoard {
    pub fn set_breakdown(&mut self, breakdown: RewardBreakdown) {
        self.breakdown = Some(breakdown);
    }

    pub fn breakdown(&self) -> Option<RewardBreakdown> {
        self.breakdown
    }

    /// Begin counting a line. Does nothing before the breakdown exists.
    pub fn start_line(&mut self, line: RevealLine) {
        if let Some(b) = self.breakdown {
            self.counters[line.index()] = Some(CountUp::new(0, b.value(line), line.count_ms()));
            if line == RevealLine::Total {
                self.celebrating = true;
            }
        }
    }

    pub fn advance(&mut self, dt_ms: u64) {
        for c in self.counters.iter_mut().flatten() {
            c.advance(dt_ms);
        }
    }

    /// Current on-screen value, `None` while the line is still hidden.
    pub fn displayed(&self, line: RevealLine) -> Option<u64> {
        self.counters[line.index()].map(|c| c.value())
    }

    pub fn is_celebrating(&self) -> bool {
        self.celebrating
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ledger::BonusKind;

    fn settings() -> RewardSettings {
        RewardSettings {
            base_reward: 50_000,
            phase_bonus: 10_000,
            time_bonus_multiplier: 1_000,
        }
    }

    #[test]
    fn total_is_score_plus_base() {
        let mut l = ScoreLedger::new();
        l.award(BonusKind::Cognitive, 30_000);
        l.award(BonusKind::Time, 40_000);
        let b = RewardBreakdown::compute(&l, &settings());
        assert_eq!(b.total, 120_000);
        assert_eq!(b.cognitive, 30_000);
        assert_eq!(b.time, 40_000);
        assert_eq!(b.base, 50_000);
    }

    #[test]
    fn total_counts_raw_score_additions_too() {
        let mut l = ScoreLedger::new();
        l.add_score(7);
        let b = RewardBreakdown::compute(&l, &settings());
        assert_eq!(b.total, 50_007);
        assert_eq!(b.cognitive + b.time, 0);
    }

    #[test]
    fn reveal_schedule_is_staggered() {
        let delays: Vec<u64> = RevealLine::ALL.iter().map(|l| l.delay_ms()).collect();
        assert_eq!(delays, vec![0, 1_000, 2_000, 3_000]);
        assert_eq!(RevealLine::Total.count_ms(), 2_000);
    }

    #[test]
    fn count_up_is_linear_and_floored() {
        let mut c = CountUp::new(0, 10_000, 1_000);
        assert_eq!(c.value(), 0);
        c.advance(333);
        assert_eq!(c.value(), 3_330);
        c.advance(1_000);
        assert!(c.is_finished());
        assert_eq!(c.value(), 10_000);
    }

    #[test]
    fn zero_length_count_shows_end() {
        let c = CountUp::new(0, 42, 0);
        assert_eq!(c.value(), 42);
    }

    #[test]
    fn board_lines_appear_when_started() {
        let mut board = RewardBoard::default();
        board.start_line(RevealLine::Base);
        assert_eq!(board.displayed(RevealLine::Base), None);

        let l = ScoreLedger::new();
        board.set_breakdown(RewardBreakdown::compute(&l, &settings()));
        board.start_line(RevealLine::Base);
        assert_eq!(board.displayed(RevealLine::Base), Some(0));
        assert_eq!(board.displayed(RevealLine::Total), None);
        board.advance(500);
        assert_eq!(board.displayed(RevealLine::Base), Some(25_000));
        assert!(!board.is_celebrating());
        board.start_line(RevealLine::Total);
        assert!(board.is_celebrating());
    }
}
