/// Score ledger: cumulative score plus the two itemized bonus buckets.
///
/// Every point that enters `current_score` also enters exactly one bucket
/// when it goes through `award()`, so `current_score == cognitive + time`
/// for a session that never calls `add_score` directly.

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Bonuses {
    /// Sum of per-phase solve bonuses.
    pub cognitive: u64,
    /// One-time bonus from the countdown stop.
    pub time: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BonusKind {
    Cognitive,
    Time,
}

#[derive(Clone, Debug, Default)]
pub struct ScoreLedger {
    current_score: u64,
    bonuses: Bonuses,
}

impl ScoreLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_score(&self) -> u64 {
        self.current_score
    }

    pub fn bonuses(&self) -> Bonuses {
        self.bonuses
    }

    /// Add to the running score. Not idempotent: two calls add twice.
    /// Returns the new score.
    pub fn add_score(&mut self, points: u64) -> u64 {
        self.current_score = self.current_score.saturating_add(points);
        self.current_score
    }

    /// Credit a bonus bucket and the running score together.
    pub fn award(&mut self, kind: BonusKind, points: u64) -> u64 {
        let bucket = match kind {
            BonusKind::Cognitive => &mut self.bonuses.cognitive,
            BonusKind::Time => &mut self.bonuses.time,
        };
        *bucket = bucket.saturating_add(points);
        self.add_score(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_ledger_is_zeroed() {
        let l = ScoreLedger::new();
        assert_eq!(l.current_score(), 0);
        assert_eq!(l.bonuses(), Bonuses::default());
    }

    #[test]
    fn add_score_is_cumulative() {
        let mut l = ScoreLedger::new();
        assert_eq!(l.add_score(10_000), 10_000);
        assert_eq!(l.add_score(10_000), 20_000);
        assert_eq!(l.bonuses(), Bonuses::default());
    }

    #[test]
    fn award_feeds_bucket_and_score() {
        let mut l = ScoreLedger::new();
        l.award(BonusKind::Cognitive, 10_000);
        l.award(BonusKind::Cognitive, 10_000);
        l.award(BonusKind::Time, 37_000);
        assert_eq!(l.bonuses().cognitive, 20_000);
        assert_eq!(l.bonuses().time, 37_000);
        assert_eq!(l.current_score(), 57_000);
    }

    #[test]
    fn zero_award_changes_nothing() {
        let mut l = ScoreLedger::new();
        l.award(BonusKind::Time, 0);
        assert_eq!(l.current_score(), 0);
        assert_eq!(l.bonuses().time, 0);
    }
}
