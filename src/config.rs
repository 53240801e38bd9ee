/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub rewards: RewardSettings,
    pub timing: TimingConfig,
    pub rules: RulesConfig,
    pub scan: ScanConfig,
    pub gamepad: GamepadConfig,
    pub logging: LoggingConfig,
}

/// Immutable score settings read by the ledger and the reward calculator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RewardSettings {
    pub base_reward: u64,
    pub phase_bonus: u64,
    pub time_bonus_multiplier: u64,
}

#[derive(Clone, Debug)]
pub struct TimingConfig {
    pub frame_ms: u64,
    pub countdown_seconds: u32,
    pub low_water_seconds: u32,
    pub failure_flash_ms: u64,
    pub score_flash_ms: u64,
    pub shake_ms: u64,
}

/// What happens when a solve signal arrives for a puzzle that is already solved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvePolicy {
    /// Refuse the signal outright.
    Reject,
    /// Acknowledge it, award nothing.
    AcceptWithoutBonus,
    /// Award the bonus again (the screen does not move).
    AwardAgain,
}

#[derive(Clone, Debug)]
pub struct RulesConfig {
    pub resolve_policy: ResolvePolicy,
    /// 0 = unlimited attempts (the quiz can still be cancelled).
    pub epilogue_max_attempts: u32,
    pub reoffer_epilogue_on_decline: bool,
    pub allow_force_scan: bool,
}

#[derive(Clone, Debug)]
pub struct ScanConfig {
    pub inbox_dir: PathBuf,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub file: PathBuf,
    pub level: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config.toml parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    rewards: TomlRewards,
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    rules: TomlRules,
    #[serde(default)]
    scan: TomlScan,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    logging: TomlLogging,
}

#[derive(Deserialize, Debug)]
struct TomlRewards {
    #[serde(default = "default_base_reward")]
    base_reward: u64,
    #[serde(default = "default_phase_bonus")]
    phase_bonus: u64,
    #[serde(default = "default_time_multiplier")]
    time_bonus_multiplier: u64,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_frame_ms")]
    frame_ms: u64,
    #[serde(default = "default_countdown")]
    countdown_seconds: u32,
    #[serde(default = "default_low_water")]
    low_water_seconds: u32,
    #[serde(default = "default_failure_flash")]
    failure_flash_ms: u64,
    #[serde(default = "default_score_flash")]
    score_flash_ms: u64,
    #[serde(default = "default_shake")]
    shake_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlRules {
    #[serde(default = "default_resolve_policy")]
    resolve_policy: ResolvePolicy,
    #[serde(default)]
    epilogue_max_attempts: u32,
    #[serde(default)]
    reoffer_epilogue_on_decline: bool,
    #[serde(default)]
    allow_force_scan: bool,
}

#[derive(Deserialize, Debug)]
struct TomlScan {
    #[serde(default = "default_inbox_dir")]
    inbox_dir: String,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlLogging {
    #[serde(default = "default_log_file")]
    file: String,
    #[serde(default = "default_log_level")]
    level: String,
}

// ── Defaults ──

fn default_base_reward() -> u64 { 50_000 }
fn default_phase_bonus() -> u64 { 10_000 }
fn default_time_multiplier() -> u64 { 1_000 }
fn default_frame_ms() -> u64 { 50 }
fn default_countdown() -> u32 { 240 }
fn default_low_water() -> u32 { 10 }
fn default_failure_flash() -> u64 { 2_000 }
fn default_score_flash() -> u64 { 500 }
fn default_shake() -> u64 { 2_000 }
fn default_resolve_policy() -> ResolvePolicy { ResolvePolicy::Reject }
fn default_inbox_dir() -> String { "scan-inbox".into() }
fn default_confirm() -> Vec<String> { vec!["A".into(), "Start".into()] }
fn default_cancel() -> Vec<String> { vec!["B".into(), "Select".into()] }
fn default_log_file() -> String { "recovery-room.log".into() }
fn default_log_level() -> String { "info".into() }

impl Default for TomlRewards {
    fn default() -> Self {
        TomlRewards {
            base_reward: default_base_reward(),
            phase_bonus: default_phase_bonus(),
            time_bonus_multiplier: default_time_multiplier(),
        }
    }
}

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            frame_ms: default_frame_ms(),
            countdown_seconds: default_countdown(),
            low_water_seconds: default_low_water(),
            failure_flash_ms: default_failure_flash(),
            score_flash_ms: default_score_flash(),
            shake_ms: default_shake(),
        }
    }
}

impl Default for TomlRules {
    fn default() -> Self {
        TomlRules {
            resolve_policy: default_resolve_policy(),
            epilogue_max_attempts: 0,
            reoffer_epilogue_on_decline: false,
            allow_force_scan: false,
        }
    }
}

impl Default for TomlScan {
    fn default() -> Self {
        TomlScan { inbox_dir: default_inbox_dir() }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            confirm: default_confirm(),
            cancel: default_cancel(),
        }
    }
}

impl Default for TomlLogging {
    fn default() -> Self {
        TomlLogging {
            file: default_log_file(),
            level: default_log_level(),
        }
    }
}

impl From<TomlConfig> for GameConfig {
    fn from(t: TomlConfig) -> Self {
        GameConfig {
            rewards: RewardSettings {
                base_reward: t.rewards.base_reward,
                phase_bonus: t.rewards.phase_bonus,
                time_bonus_multiplier: t.rewards.time_bonus_multiplier,
            },
            timing: TimingConfig {
                // A zero frame would spin the loop.
                frame_ms: t.timing.frame_ms.max(1),
                // The countdown needs at least one tick to be a countdown.
                countdown_seconds: t.timing.countdown_seconds.max(1),
                low_water_seconds: t.timing.low_water_seconds,
                failure_flash_ms: t.timing.failure_flash_ms,
                score_flash_ms: t.timing.score_flash_ms,
                shake_ms: t.timing.shake_ms,
            },
            rules: RulesConfig {
                resolve_policy: t.rules.resolve_policy,
                epilogue_max_attempts: t.rules.epilogue_max_attempts,
                reoffer_epilogue_on_decline: t.rules.reoffer_epilogue_on_decline,
                allow_force_scan: t.rules.allow_force_scan,
            },
            scan: ScanConfig {
                inbox_dir: PathBuf::from(t.scan.inbox_dir),
            },
            gamepad: GamepadConfig {
                confirm: t.gamepad.confirm,
                cancel: t.gamepad.cancel,
            },
            logging: LoggingConfig {
                file: PathBuf::from(t.logging.file),
                level: t.logging.level,
            },
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        TomlConfig::default().into()
    }
}

// ── Loading ──

impl GameConfig {
    /// Parse a config document. Missing sections and keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let parsed: TomlConfig = toml::from_str(text)?;
        Ok(parsed.into())
    }

    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Relative paths in the file resolve against the directory it was found in.
    pub fn load() -> Self {
        for dir in candidate_dirs() {
            let path = dir.join("config.toml");
            if !path.exists() {
                continue;
            }
            match std::fs::read_to_string(&path) {
                Ok(text) => match GameConfig::from_toml_str(&text) {
                    Ok(cfg) => return cfg.anchored_at(&dir),
                    Err(e) => {
                        // The logger is not up yet; the terminal is still in cooked mode.
                        eprintln!("Warning: {e}");
                        eprintln!("Using default settings.");
                        return GameConfig::default();
                    }
                },
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
        GameConfig::default()
    }

    fn anchored_at(mut self, dir: &std::path::Path) -> Self {
        if self.scan.inbox_dir.is_relative() {
            self.scan.inbox_dir = dir.join(&self.scan.inbox_dir);
        }
        if self.logging.file.is_relative() {
            self.logging.file = dir.join(&self.logging.file);
        }
        self
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let cfg = GameConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.rewards.base_reward, 50_000);
        assert_eq!(cfg.rewards.phase_bonus, 10_000);
        assert_eq!(cfg.rewards.time_bonus_multiplier, 1_000);
        assert_eq!(cfg.timing.countdown_seconds, 240);
        assert_eq!(cfg.timing.low_water_seconds, 10);
        assert_eq!(cfg.timing.failure_flash_ms, 2_000);
        assert_eq!(cfg.rules.resolve_policy, ResolvePolicy::Reject);
        assert_eq!(cfg.rules.epilogue_max_attempts, 0);
        assert!(!cfg.rules.reoffer_epilogue_on_decline);
        assert!(!cfg.rules.allow_force_scan);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = GameConfig::from_toml_str(
            "[rewards]\nphase_bonus = 5\n\n[rules]\nresolve_policy = \"award_again\"\n",
        )
        .unwrap();
        assert_eq!(cfg.rewards.phase_bonus, 5);
        assert_eq!(cfg.rewards.base_reward, 50_000);
        assert_eq!(cfg.rules.resolve_policy, ResolvePolicy::AwardAgain);
        assert_eq!(cfg.scan.inbox_dir, PathBuf::from("scan-inbox"));
    }

    #[test]
    fn accept_without_bonus_policy_parses() {
        let cfg = GameConfig::from_toml_str("[rules]\nresolve_policy = \"accept_without_bonus\"")
            .unwrap();
        assert_eq!(cfg.rules.resolve_policy, ResolvePolicy::AcceptWithoutBonus);
    }

    #[test]
    fn unknown_policy_is_a_parse_error() {
        let err = GameConfig::from_toml_str("[rules]\nresolve_policy = \"sometimes\"");
        assert!(matches!(err, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn zero_countdown_is_clamped() {
        let cfg = GameConfig::from_toml_str("[timing]\ncountdown_seconds = 0\nframe_ms = 0").unwrap();
        assert_eq!(cfg.timing.countdown_seconds, 1);
        assert_eq!(cfg.timing.frame_ms, 1);
    }

    #[test]
    fn shipped_config_matches_defaults() {
        let shipped = GameConfig::from_toml_str(include_str!("../config.toml")).unwrap();
        let defaults = GameConfig::default();
        assert_eq!(shipped.rewards, defaults.rewards);
        assert_eq!(shipped.timing.countdown_seconds, defaults.timing.countdown_seconds);
        assert_eq!(shipped.rules.resolve_policy, defaults.rules.resolve_policy);
        assert_eq!(shipped.gamepad.confirm, defaults.gamepad.confirm);
        assert_eq!(shipped.logging.level, defaults.logging.level);
    }

    #[test]
    fn relative_paths_anchor_to_config_dir() {
        let cfg = GameConfig::default().anchored_at(std::path::Path::new("/opt/room"));
        assert_eq!(cfg.scan.inbox_dir, PathBuf::from("/opt/room/scan-inbox"));
        assert_eq!(cfg.logging.file, PathBuf::from("/opt/room/recovery-room.log"));
    }
}
