/// Session controller.
///
/// Owns every piece of mutable game state and is the only thing that
/// changes it. `main` feeds it input and elapsed time; the renderer reads it.
/// All delayed behaviour (countdown tick, failure auto-clear, score flash,
/// shake, the reward reveal chain, the epilogue offer) runs through one
/// cancelable scheduler.

use crate::config::{GameConfig, ResolvePolicy, RewardSettings, RulesConfig, TimingConfig};
use crate::content;
use crate::domain::countdown::{Countdown, Tick};
use crate::domain::epilogue::{EpilogueGate, GateError, QuizOutcome};
use crate::domain::ledger::{BonusKind, Bonuses, ScoreLedger};
use crate::domain::progression::{Progression, ProgressionError, Screen, Trigger};
use crate::domain::puzzle::{override_accepts, FailureIndicator, PuzzleId};
use crate::domain::reward::{RevealLine, RewardBoard, RewardBreakdown, EPILOGUE_OFFER_AFTER_TOTAL_MS};

use super::dialog::{
    ConfirmPurpose, Dialog, DialogKind, DialogQueue, DialogResponse, PromptPurpose, TextField,
};
use super::event::GameEvent;
use super::scanner::{ScanCapability, ScanError};
use super::schedule::{Scheduler, TaskId};

const ENTRY_MAX_CHARS: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Timed {
    CountdownTick,
    ClearFailure(PuzzleId),
    ClearScoreFlash,
    EndShake,
    Reveal(RevealLine),
    OfferEpilogue,
}

/// Outcome of a submitted answer. A wrong answer is not an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Accepted { bonus: u64 },
    /// Already solved, acknowledged under the configured resolve policy.
    Replayed { bonus: u64 },
    Rejected,
    /// Wrong, but the failure marker was still up; nothing changed.
    Suppressed,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Progression(#[from] ProgressionError),
    #[error(transparent)]
    Gate(#[from] GateError),
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error("the reward has already been revealed")]
    RewardAlreadyRevealed,
    #[error("the {0:?} screen takes no typed answer")]
    NoAnswerField(Screen),
    #[error("expected the {expected:?} screen, on {actual:?}")]
    WrongScreen { expected: Screen, actual: Screen },
    #[error("no dialog is open")]
    NoDialog,
    #[error("{response:?} does not answer the open dialog")]
    MismatchedResponse { response: DialogResponse },
}

pub struct Session {
    settings: RewardSettings,
    timing: TimingConfig,
    rules: RulesConfig,

    ledger: ScoreLedger,
    progression: Progression,
    countdown: Countdown,
    countdown_task: Option<TaskId>,
    /// A tick came due under an open dialog; the countdown resumes once the queue empties.
    countdown_held: bool,
    failures: [FailureIndicator; 4],
    score_flash: Option<TaskId>,
    shake: Option<TaskId>,
    reward: RewardBoard,
    reveal_tasks: Vec<TaskId>,
    gate: EpilogueGate,

    scheduler: Scheduler<Timed>,
    dialogs: DialogQueue,
    entry: TextField,
    scanner: Box<dyn ScanCapability>,
    events: Vec<GameEvent>,
}

impl Session {
    pub fn new(config: &GameConfig, scanner: Box<dyn ScanCapability>) -> Self {
        let max_attempts = match config.rules.epilogue_max_attempts {
            0 => None,
            n => Some(n),
        };
        Session {
            settings: config.rewards,
            timing: config.timing.clone(),
            rules: config.rules.clone(),
            ledger: ScoreLedger::new(),
            progression: Progression::new(),
            countdown: Countdown::new(
                config.timing.countdown_seconds,
                config.timing.low_water_seconds,
            ),
            countdown_task: None,
            countdown_held: false,
            failures: Default::default(),
            score_flash: None,
            shake: None,
            reward: RewardBoard::default(),
            reveal_tasks: Vec::new(),
            gate: EpilogueGate::new(max_attempts, config.rules.reoffer_epilogue_on_decline),
            scheduler: Scheduler::new(),
            dialogs: DialogQueue::default(),
            entry: TextField::new(ENTRY_MAX_CHARS),
            scanner,
            events: Vec::new(),
        }
    }

    // ── Read access ──

    pub fn screen(&self) -> Screen {
        self.progression.screen()
    }

    pub fn indicator(&self) -> u8 {
        self.progression.indicator()
    }

    pub fn score(&self) -> u64 {
        self.ledger.current_score()
    }

    pub fn bonuses(&self) -> Bonuses {
        self.ledger.bonuses()
    }

    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    pub fn failure_active(&self, puzzle: PuzzleId) -> bool {
        self.failures[puzzle.index()].is_active()
    }

    pub fn score_flashing(&self) -> bool {
        self.score_flash.is_some_and(|id| self.scheduler.is_pending(id))
    }

    pub fn shaking(&self) -> bool {
        self.shake.is_some_and(|id| self.scheduler.is_pending(id))
    }

    pub fn solved_count(&self) -> usize {
        PuzzleId::ALL
            .iter()
            .filter(|p| self.progression.is_solved(**p))
            .count()
    }

    pub fn reward(&self) -> &RewardBoard {
        &self.reward
    }

    pub fn gate(&self) -> &EpilogueGate {
        &self.gate
    }

    pub fn dialog(&self) -> Option<&Dialog> {
        self.dialogs.front()
    }

    pub fn dialog_field_mut(&mut self) -> Option<&mut TextField> {
        self.dialogs.front_mut().and_then(Dialog::field_mut)
    }

    pub fn entry(&self) -> &TextField {
        &self.entry
    }

    pub fn entry_mut(&mut self) -> &mut TextField {
        &mut self.entry
    }

    pub fn scan_active(&self) -> bool {
        self.scanner.is_active()
    }

    pub fn force_scan_allowed(&self) -> bool {
        self.rules.allow_force_scan
    }

    pub fn now_ms(&self) -> u64 {
        self.scheduler.now_ms()
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    // ── Time ──

    /// Let `dt_ms` of real time pass: fire due tasks, animate counters, poll the scanner.
    pub fn advance(&mut self, dt_ms: u64) {
        // Counters first, so a line revealed this frame starts from zero.
        self.reward.advance(dt_ms);
        self.scheduler.advance_by(dt_ms);
        while let Some(task) = self.scheduler.pop_due() {
            self.run_timed(task);
        }

        if self.scanner.poll() {
            if let Err(e) = self.scan_succeeded() {
                log::warn!("scan completed but was not applied: {e}");
            }
        }
    }

    fn run_timed(&mut self, task: Timed) {
        match task {
            Timed::CountdownTick => self.on_countdown_tick(),
            Timed::ClearFailure(p) => self.failures[p.index()].clear(),
            Timed::ClearScoreFlash => self.score_flash = None,
            Timed::EndShake => self.shake = None,
            Timed::Reveal(line) => {
                self.reward.start_line(line);
                self.events.push(GameEvent::LineRevealed { line });
                if line == RevealLine::Total {
                    self.events.push(GameEvent::Celebration);
                }
            }
            Timed::OfferEpilogue => {
                self.offer_epilogue();
            }
        }
    }

    // ── Progression ──

    pub fn begin(&mut self) -> Result<(), SessionError> {
        self.change_screen(Trigger::Begin)?;
        Ok(())
    }

    fn change_screen(&mut self, trigger: Trigger) -> Result<Screen, SessionError> {
        let from = self.screen();
        let to = self.progression.advance(trigger)?;
        if from == Screen::Reward && to != Screen::Reward {
            self.cancel_reveal();
        }
        self.entry.clear();
        log::info!("screen {from:?} -> {to:?} (phase {})", self.indicator());
        self.events.push(GameEvent::ScreenChanged { from, to });
        Ok(to)
    }

    fn require_screen(&self, expected: Screen) -> Result<(), SessionError> {
        let actual = self.screen();
        if actual != expected {
            return Err(SessionError::WrongScreen { expected, actual });
        }
        Ok(())
    }

    /// Dismiss the letter on screen. Entering the emergency phase starts the
    /// countdown; leaving the last letter computes and reveals the reward.
    pub fn dismiss_letter(&mut self) -> Result<Screen, SessionError> {
        let to = self.change_screen(Trigger::DismissLetter)?;
        match to {
            Screen::Emergency => {
                if let Some(id) = self.shake.take() {
                    self.scheduler.cancel(id);
                }
                self.shake = Some(self.scheduler.schedule_in(self.timing.shake_ms, Timed::EndShake));
                self.start_countdown(self.timing.countdown_seconds);
            }
            Screen::Reward => {
                self.compute_and_reveal()?;
            }
            _ => {}
        }
        Ok(to)
    }

    // ── Scoring ──

    /// Credit points to a bonus bucket and the running score, flashing the HUD.
    fn award(&mut self, kind: BonusKind, points: u64) {
        let score = self.ledger.award(kind, points);
        self.events.push(GameEvent::ScoreChanged { score });
        if let Some(id) = self.score_flash.take() {
            self.scheduler.cancel(id);
        }
        self.score_flash = Some(
            self.scheduler
                .schedule_in(self.timing.score_flash_ms, Timed::ClearScoreFlash),
        );
    }

    // ── Answers ──

    /// Validate whatever is typed in the entry box against the current screen's puzzle.
    pub fn submit_entry(&mut self) -> Result<Verdict, SessionError> {
        let screen = self.screen();
        let Some(puzzle) = screen.puzzle().filter(|p| p.validator().is_some()) else {
            return Err(SessionError::NoAnswerField(screen));
        };
        let raw = self.entry.take();
        self.validate(puzzle, &raw)
    }

    /// Check an answer for `puzzle`. Off its own screen only a correct answer
    /// for an already-solved puzzle gets through, as a replay.
    pub fn validate(&mut self, puzzle: PuzzleId, raw: &str) -> Result<Verdict, SessionError> {
        let from = self.screen();
        let Some(validator) = puzzle.validator() else {
            return Err(SessionError::NoAnswerField(from));
        };
        let correct = validator.validate(raw);
        if from.puzzle() != Some(puzzle) && !(correct && self.progression.is_solved(puzzle)) {
            return Err(ProgressionError::IllegalTransition {
                from,
                trigger: Trigger::Solved(puzzle),
            }
            .into());
        }
        if correct {
            self.solve(puzzle)
        } else {
            Ok(self.reject(puzzle))
        }
    }

    fn reject(&mut self, puzzle: PuzzleId) -> Verdict {
        if !self.failures[puzzle.index()].raise() {
            return Verdict::Suppressed;
        }
        self.scheduler
            .schedule_in(self.timing.failure_flash_ms, Timed::ClearFailure(puzzle));
        log::debug!("{puzzle:?} answer rejected");
        self.events.push(GameEvent::PuzzleRejected { puzzle });
        Verdict::Rejected
    }

    fn solve(&mut self, puzzle: PuzzleId) -> Result<Verdict, SessionError> {
        if self.progression.is_solved(puzzle) {
            return self.replay(puzzle);
        }
        let from = self.screen();
        if from.puzzle() != Some(puzzle) {
            return Err(ProgressionError::IllegalTransition {
                from,
                trigger: Trigger::Solved(puzzle),
            }
            .into());
        }

        let bonus = match puzzle.bonus_kind() {
            BonusKind::Time => {
                let remaining = self.stop_countdown();
                let bonus = u64::from(remaining).saturating_mul(self.settings.time_bonus_multiplier);
                self.events.push(GameEvent::CountdownStopped { remaining, bonus });
                bonus
            }
            BonusKind::Cognitive => self.settings.phase_bonus,
        };
        self.award(puzzle.bonus_kind(), bonus);
        self.change_screen(Trigger::Solved(puzzle))?;

        let text = match puzzle {
            PuzzleId::Binary => content::BINARY_SOLVED.to_string(),
            PuzzleId::Scan => content::SCAN_SOLVED.to_string(),
            PuzzleId::EmergencyStop => content::time_bonus(bonus),
            PuzzleId::FinalLogic => content::FINAL_SOLVED.to_string(),
        };
        self.dialogs.push(Dialog::alert(text));
        log::info!("{puzzle:?} solved, +{bonus} (score {})", self.score());
        self.events.push(GameEvent::PuzzleAccepted { puzzle, bonus });
        Ok(Verdict::Accepted { bonus })
    }

    fn replay(&mut self, puzzle: PuzzleId) -> Result<Verdict, SessionError> {
        match self.rules.resolve_policy {
            ResolvePolicy::Reject => Err(ProgressionError::AlreadySolved(puzzle).into()),
            ResolvePolicy::AcceptWithoutBonus => {
                log::debug!("{puzzle:?} solved again, no bonus");
                Ok(Verdict::Replayed { bonus: 0 })
            }
            ResolvePolicy::AwardAgain => {
                let bonus = match puzzle.bonus_kind() {
                    BonusKind::Time => u64::from(self.countdown.remaining())
                        .saturating_mul(self.settings.time_bonus_multiplier),
                    BonusKind::Cognitive => self.settings.phase_bonus,
                };
                self.award(puzzle.bonus_kind(), bonus);
                log::info!("{puzzle:?} solved again, +{bonus}");
                Ok(Verdict::Replayed { bonus })
            }
        }
    }

    // ── Countdown ──

    /// (Re)start the emergency countdown. A running one is replaced, never doubled.
    pub fn start_countdown(&mut self, seconds: u32) {
        if let Some(id) = self.countdown_task.take() {
            self.scheduler.cancel(id);
        }
        self.countdown_held = false;
        self.countdown.start(seconds);
        self.schedule_tick();
    }

    fn schedule_tick(&mut self) {
        self.countdown_task = Some(self.scheduler.schedule_in(1_000, Timed::CountdownTick));
    }

    /// Halt the countdown and report the seconds left.
    pub fn stop_countdown(&mut self) -> u32 {
        if let Some(id) = self.countdown_task.take() {
            self.scheduler.cancel(id);
        }
        self.countdown_held = false;
        self.countdown.stop()
    }

    /// A modal dialog blocks the countdown: the second is not consumed
    /// and ticking picks up again after the last dialog closes.
    fn on_countdown_tick(&mut self) {
        self.countdown_task = None;
        if self.dialogs.front().is_some() {
            self.countdown_held = true;
            return;
        }
        match self.countdown.tick() {
            Tick::Idle => {}
            Tick::Running { remaining, alert } => {
                self.events.push(GameEvent::CountdownTick { remaining, alert });
                self.schedule_tick();
            }
            Tick::Expired => {
                let seconds = self.countdown.start_seconds();
                log::warn!("countdown expired, restarting from {seconds}s");
                self.events.push(GameEvent::CountdownExpired);
                self.dialogs.push(Dialog::alert(content::countdown_expired(seconds)));
                self.countdown.restart();
                self.countdown_held = true;
            }
        }
    }

    // ── Scan ──

    pub fn start_scan(&mut self) -> Result<(), SessionError> {
        self.require_screen(Screen::Scan)?;
        self.scanner.start()?;
        self.events.push(GameEvent::ScanStarted);
        Ok(())
    }

    fn stop_scan(&mut self) {
        if self.scanner.is_active() {
            self.scanner.stop();
            log::info!("scanner stopped");
            self.events.push(GameEvent::ScanStopped);
        }
    }

    /// A scan (or an override standing in for one) succeeded.
    pub fn scan_succeeded(&mut self) -> Result<Verdict, SessionError> {
        self.stop_scan();
        self.solve(PuzzleId::Scan)
    }

    /// Returns `false`, silently, for anything but the override code or passphrase.
    pub fn manual_override(&mut self, input: &str) -> Result<bool, SessionError> {
        if !override_accepts(input) {
            log::debug!("manual override ignored");
            return Ok(false);
        }
        self.scan_succeeded()?;
        Ok(true)
    }

    pub fn request_manual_override(&mut self) -> Result<(), SessionError> {
        self.require_screen(Screen::Scan)?;
        self.dialogs
            .push(Dialog::prompt(PromptPurpose::ManualOverride, content::OVERRIDE_PROMPT));
        Ok(())
    }

    /// Returns `false` when forced passes are disabled.
    pub fn request_force_scan(&mut self) -> Result<bool, SessionError> {
        if !self.rules.allow_force_scan {
            return Ok(false);
        }
        self.require_screen(Screen::Scan)?;
        self.dialogs
            .push(Dialog::confirm(ConfirmPurpose::ForceScanPass, content::FORCE_SCAN_CONFIRM));
        Ok(true)
    }

    // ── Reward ──

    /// Compute the breakdown and schedule the staggered reveal. Runs once per session.
    pub fn compute_and_reveal(&mut self) -> Result<RewardBreakdown, SessionError> {
        if self.reward.breakdown().is_some() {
            return Err(SessionError::RewardAlreadyRevealed);
        }
        let breakdown = RewardBreakdown::compute(&self.ledger, &self.settings);
        self.reward.set_breakdown(breakdown);
        for line in RevealLine::ALL {
            let id = self.scheduler.schedule_in(line.delay_ms(), Timed::Reveal(line));
            self.reveal_tasks.push(id);
        }
        let offer_at = RevealLine::Total.delay_ms() + EPILOGUE_OFFER_AFTER_TOTAL_MS;
        let id = self.scheduler.schedule_in(offer_at, Timed::OfferEpilogue);
        self.reveal_tasks.push(id);
        log::info!(
            "reward: base {} + cognitive {} + time {} = {}",
            breakdown.base,
            breakdown.cognitive,
            breakdown.time,
            breakdown.total
        );
        Ok(breakdown)
    }

    fn cancel_reveal(&mut self) {
        let cancelled = self
            .reveal_tasks
            .drain(..)
            .filter(|id| self.scheduler.cancel(*id))
            .count();
        if cancelled > 0 {
            log::debug!("cancelled {cancelled} pending reveal task(s)");
        }
    }

    // ── Epilogue ──

    /// Returns `true` if the offer was queued.
    pub fn offer_epilogue(&mut self) -> bool {
        if self.screen() != Screen::Reward || !self.gate.offer() {
            return false;
        }
        self.dialogs
            .push(Dialog::confirm(ConfirmPurpose::OfferEpilogue, content::EPILOGUE_OFFER));
        self.events.push(GameEvent::EpilogueOffered);
        true
    }

    pub fn request_logout(&mut self) -> Result<(), SessionError> {
        self.require_screen(Screen::Epilogue)?;
        self.dialogs
            .push(Dialog::confirm(ConfirmPurpose::Logout, content::EPILOGUE_LOGOUT));
        Ok(())
    }

    fn resume_countdown(&mut self) {
        if self.countdown_held && self.countdown.is_running() && self.dialogs.front().is_none() {
            self.countdown_held = false;
            log::debug!("countdown resumed at {}s", self.countdown.remaining());
            self.schedule_tick();
        }
    }

    fn on_confirm(&mut self, purpose: ConfirmPurpose, yes: bool) -> Result<(), SessionError> {
        match purpose {
            ConfirmPurpose::OfferEpilogue => {
                self.gate.confirm(yes)?;
                if yes {
                    self.dialogs
                        .push(Dialog::prompt(PromptPurpose::EpilogueQuiz, content::EPILOGUE_QUIZ));
                } else {
                    log::info!("epilogue declined");
                    if self.rules.reoffer_epilogue_on_decline {
                        let id = self
                            .scheduler
                            .schedule_in(EPILOGUE_OFFER_AFTER_TOTAL_MS, Timed::OfferEpilogue);
                        self.reveal_tasks.push(id);
                    }
                }
            }
            ConfirmPurpose::Logout => {
                if yes {
                    self.change_screen(Trigger::Logout)?;
                }
            }
            ConfirmPurpose::ForceScanPass => {
                if yes {
                    log::info!("scan phase passed by force");
                    self.scan_succeeded()?;
                }
            }
        }
        Ok(())
    }

    fn on_prompt(&mut self, purpose: PromptPurpose, text: Option<String>) -> Result<(), SessionError> {
        match (purpose, text) {
            (PromptPurpose::ManualOverride, Some(text)) => {
                self.manual_override(&text)?;
            }
            (PromptPurpose::ManualOverride, None) => {}
            (PromptPurpose::EpilogueQuiz, None) => {
                if self.gate.cancel() {
                    log::info!("epilogue quiz cancelled");
                    self.events.push(GameEvent::EpilogueClosed);
                }
            }
            (PromptPurpose::EpilogueQuiz, Some(text)) => match self.gate.answer(&text)? {
                QuizOutcome::Correct => {
                    self.dialogs.push(Dialog::alert(content::EPILOGUE_CORRECT));
                    self.change_screen(Trigger::RevealEpilogue)?;
                    self.events.push(GameEvent::EpilogueRevealed);
                }
                QuizOutcome::Wrong { attempts, hint } => {
                    self.dialogs.push(Dialog::alert(content::epilogue_wrong(hint)));
                    self.dialogs
                        .push(Dialog::prompt(PromptPurpose::EpilogueQuiz, content::EPILOGUE_QUIZ));
                    self.events.push(GameEvent::EpilogueHint { attempts });
                }
                QuizOutcome::Exhausted => {
                    log::info!("epilogue quiz closed after too many attempts");
                    self.events.push(GameEvent::EpilogueClosed);
                }
            },
        }
        Ok(())
    }

    // ── Dialogs ──

    /// Answer the front dialog. A response of the wrong shape leaves it open.
    pub fn respond(&mut self, response: DialogResponse) -> Result<(), SessionError> {
        let result = self.apply_response(response);
        self.resume_countdown();
        result
    }

    fn apply_response(&mut self, response: DialogResponse) -> Result<(), SessionError> {
        let dialog = self.dialogs.pop().ok_or(SessionError::NoDialog)?;
        match (dialog.kind, response) {
            (DialogKind::Alert, _) => Ok(()),
            (DialogKind::Confirm(purpose), DialogResponse::Confirmed(yes)) => {
                self.on_confirm(purpose, yes)
            }
            (DialogKind::Confirm(purpose), DialogResponse::Cancelled) => {
                self.on_confirm(purpose, false)
            }
            (DialogKind::Prompt(purpose, _), DialogResponse::Submitted(text)) => {
                self.on_prompt(purpose, Some(text))
            }
            (DialogKind::Prompt(purpose, _), DialogResponse::Cancelled) => {
                self.on_prompt(purpose, None)
            }
            (kind, response) => {
                self.dialogs.push_front(Dialog { kind, text: dialog.text });
                Err(SessionError::MismatchedResponse { response })
            }
        }
    }

    /// Submit whatever is typed into the front prompt.
    pub fn submit_prompt(&mut self) -> Result<(), SessionError> {
        let text = self
            .dialog_field_mut()
            .map(TextField::take)
            .ok_or(SessionError::NoDialog)?;
        self.respond(DialogResponse::Submitted(text))
    }

    // ── Teardown ──

    /// Cancel outstanding work before the session is dropped.
    pub fn shutdown(&mut self) {
        self.cancel_reveal();
        self.stop_countdown();
        self.stop_scan();
        log::debug!("{} timed task(s) dropped at shutdown", self.scheduler.pending());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::epilogue::{GateState, EPILOGUE_ANSWER};
    use std::cell::Cell;
    use std::rc::Rc;

    /// Scan capability driven by the test through a shared flag.
    struct ScriptedScanner {
        active: bool,
        fire: Rc<Cell<bool>>,
    }

    impl ScanCapability for ScriptedScanner {
        fn start(&mut self) -> Result<(), ScanError> {
            self.active = true;
            Ok(())
        }

        fn poll(&mut self) -> bool {
            self.active && self.fire.replace(false)
        }

        fn stop(&mut self) {
            self.active = false;
        }

        fn is_active(&self) -> bool {
            self.active
        }
    }

    fn session_with(config: GameConfig) -> (Session, Rc<Cell<bool>>) {
        let fire = Rc::new(Cell::new(false));
        let scanner = ScriptedScanner { active: false, fire: Rc::clone(&fire) };
        (Session::new(&config, Box::new(scanner)), fire)
    }

    fn session() -> Session {
        session_with(GameConfig::default()).0
    }

    fn close_alerts(s: &mut Session) {
        while matches!(s.dialog().map(|d| &d.kind), Some(DialogKind::Alert)) {
            s.respond(DialogResponse::Dismissed).unwrap();
        }
    }

    fn type_entry(s: &mut Session, text: &str) {
        for c in text.chars() {
            s.entry_mut().push(c);
        }
    }

    /// Intro through to the emergency phase with the countdown just started.
    fn to_emergency(s: &mut Session) {
        s.begin().unwrap();
        s.validate(PuzzleId::Binary, "1001").unwrap();
        s.manual_override("MOM").unwrap();
        s.dismiss_letter().unwrap();
        close_alerts(s);
        assert_eq!(s.screen(), Screen::Emergency);
    }

    #[test]
    fn binary_answer_awards_phase_bonus_and_advances() {
        let mut s = session();
        s.begin().unwrap();
        assert_eq!(s.indicator(), 1);
        type_entry(&mut s, " 1001 ");
        assert_eq!(s.submit_entry().unwrap(), Verdict::Accepted { bonus: 10_000 });
        assert_eq!(s.bonuses().cognitive, 10_000);
        assert_eq!(s.score(), 10_000);
        assert_eq!(s.screen(), Screen::Scan);
        assert_eq!(s.indicator(), 2);
        assert_eq!(s.entry().as_str(), "");
        assert!(s.score_flashing());
        s.advance(500);
        assert!(!s.score_flashing());
    }

    #[test]
    fn wrong_answer_flashes_without_stacking() {
        let mut s = session();
        s.begin().unwrap();
        assert_eq!(s.validate(PuzzleId::Binary, "1010").unwrap(), Verdict::Rejected);
        assert!(s.failure_active(PuzzleId::Binary));
        s.advance(1_500);
        assert_eq!(s.validate(PuzzleId::Binary, "0000").unwrap(), Verdict::Suppressed);
        s.advance(500);
        assert!(!s.failure_active(PuzzleId::Binary), "clears 2s after the first rejection");
        assert_eq!(s.validate(PuzzleId::Binary, "0000").unwrap(), Verdict::Rejected);
        assert_eq!(s.screen(), Screen::Binary);
        assert_eq!(s.score(), 0);
    }

    #[test]
    fn stop_code_awards_remaining_seconds() {
        let mut s = session();
        to_emergency(&mut s);
        assert!(s.shaking());
        s.advance(203_000);
        assert!(!s.shaking());
        assert_eq!(s.countdown().remaining(), 37);
        let before = s.score();
        assert_eq!(s.validate(PuzzleId::EmergencyStop, "lih").unwrap(), Verdict::Accepted {
            bonus: 37_000
        });
        assert_eq!(s.bonuses().time, 37_000);
        assert_eq!(s.score(), before + 37_000);
        assert_eq!(s.screen(), Screen::FinalLogic);
        assert_eq!(s.indicator(), 4);
        assert!(!s.countdown().is_running());
        s.advance(5_000);
        assert_eq!(s.countdown().remaining(), 37, "stopped countdown stays put");
    }

    #[test]
    fn countdown_restarts_on_expiry() {
        let mut s = session();
        to_emergency(&mut s);
        s.drain_events();
        s.advance(240_000);
        let events = s.drain_events();
        assert!(events.contains(&GameEvent::CountdownExpired));
        assert_eq!(s.countdown().remaining(), 240);
        assert!(s.countdown().is_running());
        assert!(matches!(s.dialog().map(|d| &d.kind), Some(DialogKind::Alert)));
        s.respond(DialogResponse::Dismissed).unwrap();
        s.advance(1_000);
        assert_eq!(s.countdown().remaining(), 239);
    }

    #[test]
    fn expiry_alert_holds_the_countdown_until_dismissed() {
        let mut s = session();
        to_emergency(&mut s);
        s.advance(240_000);
        s.advance(30_000);
        assert_eq!(s.countdown().remaining(), 240, "nothing counts under the alert");

        s.advance(480_000);
        let expired = s
            .drain_events()
            .iter()
            .filter(|e| **e == GameEvent::CountdownExpired)
            .count();
        assert_eq!(expired, 1);
        s.respond(DialogResponse::Dismissed).unwrap();
        assert!(s.dialog().is_none(), "only one expiry alert was queued");
        assert_eq!(s.countdown().remaining(), 240);

        s.advance(2_000);
        assert_eq!(s.countdown().remaining(), 238);
    }

    #[test]
    fn any_open_dialog_pauses_the_countdown() {
        let mut s = session();
        to_emergency(&mut s);
        s.advance(2_000);
        s.dialogs.push(Dialog::alert("blocking"));
        s.advance(5_000);
        assert_eq!(s.countdown().remaining(), 238);
        s.respond(DialogResponse::Dismissed).unwrap();
        s.advance(1_000);
        assert_eq!(s.countdown().remaining(), 237);
    }

    #[test]
    fn low_water_alternates_alert_colors() {
        let mut s = session();
        to_emergency(&mut s);
        s.advance(229_000);
        s.drain_events();
        s.advance(2_000);
        let alerts: Vec<_> = s
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                GameEvent::CountdownTick { remaining, alert } => Some((remaining, alert)),
                _ => None,
            })
            .collect();
        assert_eq!(alerts, vec![
            (10, Some(crate::domain::countdown::AlertColor::Red)),
            (9, Some(crate::domain::countdown::AlertColor::Yellow)),
        ]);
    }

    #[test]
    fn full_run_totals_score_plus_base() {
        let mut s = session();
        to_emergency(&mut s);
        s.advance(200_000);
        s.validate(PuzzleId::EmergencyStop, "LIH").unwrap();
        assert_eq!(s.validate(PuzzleId::FinalLogic, "144").unwrap(), Verdict::Accepted {
            bonus: 10_000
        });
        assert_eq!(s.screen(), Screen::DadLetter);
        assert_eq!(s.score(), 70_000);
        close_alerts(&mut s);

        assert_eq!(s.dismiss_letter().unwrap(), Screen::Reward);
        let b = s.reward().breakdown().unwrap();
        assert_eq!((b.base, b.cognitive, b.time, b.total), (50_000, 30_000, 40_000, 120_000));
        assert!(!s.screen().shows_hud());
        assert!(matches!(
            s.compute_and_reveal(),
            Err(SessionError::RewardAlreadyRevealed)
        ));
    }

    #[test]
    fn reveal_chain_runs_on_schedule() {
        let mut s = session();
        to_emergency(&mut s);
        s.validate(PuzzleId::EmergencyStop, "LIH").unwrap();
        s.validate(PuzzleId::FinalLogic, "144").unwrap();
        close_alerts(&mut s);
        s.dismiss_letter().unwrap();

        s.advance(0);
        assert_eq!(s.reward().displayed(RevealLine::Base), Some(0));
        assert_eq!(s.reward().displayed(RevealLine::Cognitive), None);
        s.advance(1_000);
        assert_eq!(s.reward().displayed(RevealLine::Base), Some(50_000));
        assert!(s.reward().displayed(RevealLine::Cognitive).is_some());
        s.advance(2_000);
        assert!(s.reward().is_celebrating());
        s.advance(2_000);
        let total = s.reward().breakdown().unwrap().total;
        assert_eq!(s.reward().displayed(RevealLine::Total), Some(total));
        assert!(s.dialog().is_none());
        s.advance(3_000);
        assert!(matches!(
            s.dialog().map(|d| &d.kind),
            Some(DialogKind::Confirm(ConfirmPurpose::OfferEpilogue))
        ));
    }

    #[test]
    fn illegal_solve_leaves_state_untouched() {
        let mut s = session();
        s.begin().unwrap();
        let err = s.validate(PuzzleId::FinalLogic, "144").unwrap_err();
        assert!(matches!(err, SessionError::Progression(ProgressionError::IllegalTransition { .. })));
        assert_eq!(s.screen(), Screen::Binary);
        assert_eq!(s.score(), 0);
    }

    #[test]
    fn wrong_answer_off_screen_is_illegal_too() {
        let mut s = session();
        s.begin().unwrap();
        let err = s.validate(PuzzleId::FinalLogic, "nope").unwrap_err();
        assert!(matches!(err, SessionError::Progression(ProgressionError::IllegalTransition { .. })));
        assert!(!s.failure_active(PuzzleId::FinalLogic));
        assert!(s.drain_events().iter().all(|e| !matches!(e, GameEvent::PuzzleRejected { .. })));
    }

    #[test]
    fn resolve_policy_reject_refuses_replays() {
        let mut s = session();
        s.begin().unwrap();
        s.validate(PuzzleId::Binary, "1001").unwrap();
        let err = s.validate(PuzzleId::Binary, "1001").unwrap_err();
        assert!(matches!(
            err,
            SessionError::Progression(ProgressionError::AlreadySolved(PuzzleId::Binary))
        ));
        assert_eq!(s.score(), 10_000);
    }

    #[test]
    fn resolve_policy_variants() {
        let mut config = GameConfig::default();
        config.rules.resolve_policy = ResolvePolicy::AcceptWithoutBonus;
        let (mut s, _) = session_with(config.clone());
        s.begin().unwrap();
        s.validate(PuzzleId::Binary, "1001").unwrap();
        assert_eq!(s.validate(PuzzleId::Binary, "1001").unwrap(), Verdict::Replayed { bonus: 0 });
        assert_eq!(s.score(), 10_000);

        config.rules.resolve_policy = ResolvePolicy::AwardAgain;
        let (mut s, _) = session_with(config);
        s.begin().unwrap();
        s.validate(PuzzleId::Binary, "1001").unwrap();
        assert_eq!(s.validate(PuzzleId::Binary, "1001").unwrap(), Verdict::Replayed {
            bonus: 10_000
        });
        assert_eq!(s.score(), 20_000);
        assert_eq!(s.screen(), Screen::Scan, "the screen does not move on a replay");
    }

    #[test]
    fn each_solve_adds_exactly_one_phase_bonus() {
        let mut s = session();
        s.begin().unwrap();
        s.validate(PuzzleId::Binary, "1001").unwrap();
        s.manual_override("pass").unwrap();
        s.dismiss_letter().unwrap();
        s.validate(PuzzleId::EmergencyStop, "LIH").unwrap();
        s.validate(PuzzleId::FinalLogic, "144").unwrap();
        assert_eq!(s.bonuses().cognitive, 3 * 10_000);
        assert_eq!(s.score() - s.bonuses().time, 3 * 10_000);
    }

    #[test]
    fn scanner_success_stops_scan_and_advances() {
        let (mut s, fire) = session_with(GameConfig::default());
        s.begin().unwrap();
        s.validate(PuzzleId::Binary, "1001").unwrap();
        s.start_scan().unwrap();
        assert!(s.scan_active());
        s.advance(50);
        assert_eq!(s.screen(), Screen::Scan);
        fire.set(true);
        s.advance(50);
        assert!(!s.scan_active());
        assert_eq!(s.screen(), Screen::MomLetter);
        assert_eq!(s.bonuses().cognitive, 20_000);
        assert!(s.drain_events().contains(&GameEvent::ScanStopped));
    }

    #[test]
    fn scan_outside_its_phase_is_refused() {
        let mut s = session();
        s.begin().unwrap();
        assert!(matches!(
            s.start_scan(),
            Err(SessionError::WrongScreen { expected: Screen::Scan, actual: Screen::Binary })
        ));
    }

    #[test]
    fn manual_override_ignores_bad_codes() {
        let mut s = session();
        s.begin().unwrap();
        s.validate(PuzzleId::Binary, "1001").unwrap();
        close_alerts(&mut s);
        assert!(!s.manual_override("mom").unwrap());
        assert!(!s.manual_override(" MOM").unwrap());
        assert!(!s.failure_active(PuzzleId::Scan));
        assert_eq!(s.screen(), Screen::Scan);

        s.request_manual_override().unwrap();
        for c in "PASS".chars() {
            s.dialog_field_mut().unwrap().push(c);
        }
        s.submit_prompt().unwrap();
        assert_eq!(s.screen(), Screen::MomLetter);
    }

    #[test]
    fn force_scan_needs_the_rule() {
        let mut s = session();
        s.begin().unwrap();
        s.validate(PuzzleId::Binary, "1001").unwrap();
        close_alerts(&mut s);
        assert!(!s.request_force_scan().unwrap());

        let mut config = GameConfig::default();
        config.rules.allow_force_scan = true;
        let (mut s, _) = session_with(config);
        s.begin().unwrap();
        s.validate(PuzzleId::Binary, "1001").unwrap();
        close_alerts(&mut s);
        assert!(s.request_force_scan().unwrap());
        s.respond(DialogResponse::Confirmed(true)).unwrap();
        assert_eq!(s.screen(), Screen::MomLetter);
    }

    fn at_reward_with_offer(config: GameConfig) -> Session {
        let (mut s, _) = session_with(config);
        to_emergency(&mut s);
        s.validate(PuzzleId::EmergencyStop, "LIH").unwrap();
        s.validate(PuzzleId::FinalLogic, "144").unwrap();
        close_alerts(&mut s);
        s.dismiss_letter().unwrap();
        s.advance(8_000);
        assert_eq!(s.gate().state(), GateState::AwaitingConfirm);
        s
    }

    #[test]
    fn epilogue_wrong_answers_then_correct_reveals_once() {
        let mut s = at_reward_with_offer(GameConfig::default());
        s.respond(DialogResponse::Confirmed(true)).unwrap();
        for _ in 0..3 {
            s.respond(DialogResponse::Submitted("gemini".into())).unwrap();
            close_alerts(&mut s);
        }
        assert_eq!(s.gate().state(), GateState::Quiz { attempts: 3 });
        s.respond(DialogResponse::Submitted(EPILOGUE_ANSWER.into())).unwrap();
        assert_eq!(s.screen(), Screen::Epilogue);
        let revealed = s
            .drain_events()
            .iter()
            .filter(|e| **e == GameEvent::EpilogueRevealed)
            .count();
        assert_eq!(revealed, 1);

        close_alerts(&mut s);
        s.request_logout().unwrap();
        s.respond(DialogResponse::Confirmed(true)).unwrap();
        assert_eq!(s.screen(), Screen::Reward);
        assert!(!s.offer_epilogue(), "never offered again once revealed");
    }

    #[test]
    fn declined_epilogue_is_not_reoffered_by_default() {
        let mut s = at_reward_with_offer(GameConfig::default());
        s.respond(DialogResponse::Confirmed(false)).unwrap();
        assert_eq!(s.gate().state(), GateState::Declined);
        s.advance(60_000);
        assert!(s.dialog().is_none());
    }

    #[test]
    fn declined_epilogue_returns_when_configured() {
        let mut config = GameConfig::default();
        config.rules.reoffer_epilogue_on_decline = true;
        let mut s = at_reward_with_offer(config);
        s.respond(DialogResponse::Cancelled).unwrap();
        s.advance(EPILOGUE_OFFER_AFTER_TOTAL_MS);
        assert_eq!(s.gate().state(), GateState::AwaitingConfirm);
    }

    #[test]
    fn shutdown_cancels_a_pending_reoffer() {
        let mut config = GameConfig::default();
        config.rules.reoffer_epilogue_on_decline = true;
        let mut s = at_reward_with_offer(config);
        s.respond(DialogResponse::Confirmed(false)).unwrap();
        s.shutdown();
        s.advance(EPILOGUE_OFFER_AFTER_TOTAL_MS * 2);
        assert_eq!(s.gate().state(), GateState::Declined);
        assert!(s.dialog().is_none());
    }

    #[test]
    fn quiz_can_be_cancelled_or_exhausted() {
        let mut s = at_reward_with_offer(GameConfig::default());
        s.respond(DialogResponse::Confirmed(true)).unwrap();
        s.respond(DialogResponse::Cancelled).unwrap();
        assert_eq!(s.gate().state(), GateState::Cancelled);
        assert!(s.dialog().is_none());

        let mut config = GameConfig::default();
        config.rules.epilogue_max_attempts = 1;
        let mut s = at_reward_with_offer(config);
        s.respond(DialogResponse::Confirmed(true)).unwrap();
        s.respond(DialogResponse::Submitted("nope".into())).unwrap();
        assert_eq!(s.gate().state(), GateState::Cancelled);
        assert!(s.dialog().is_none());
        assert_eq!(s.screen(), Screen::Reward);
    }

    #[test]
    fn mismatched_response_keeps_the_dialog() {
        let mut s = session();
        s.begin().unwrap();
        s.validate(PuzzleId::Binary, "1001").unwrap();
        close_alerts(&mut s);
        s.request_manual_override().unwrap();
        assert!(s.respond(DialogResponse::Confirmed(true)).is_err());
        assert!(matches!(
            s.dialog().map(|d| &d.kind),
            Some(DialogKind::Prompt(PromptPurpose::ManualOverride, _))
        ));
        assert!(matches!(s.respond(DialogResponse::Cancelled), Ok(())));
        assert!(matches!(
            s.respond(DialogResponse::Dismissed),
            Err(SessionError::NoDialog)
        ));
    }

    #[test]
    fn shutdown_cancels_pending_reveal() {
        let mut s = session();
        to_emergency(&mut s);
        s.validate(PuzzleId::EmergencyStop, "LIH").unwrap();
        s.validate(PuzzleId::FinalLogic, "144").unwrap();
        close_alerts(&mut s);
        s.dismiss_letter().unwrap();
        s.shutdown();
        s.advance(10_000);
        assert_eq!(s.reward().displayed(RevealLine::Base), None);
        assert!(s.dialog().is_none());
    }
}
