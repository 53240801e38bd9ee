/// Entry point and game loop.

mod config;
mod content;
mod domain;
mod logging;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use crossterm::event::KeyCode;

use config::GameConfig;
use domain::progression::Screen;
use sim::dialog::{DialogKind, DialogResponse};
use sim::event::GameEvent;
use sim::scanner::InboxScanner;
use sim::session::{Session, SessionError};
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::{fmt_points, Renderer};
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() {
    let config = GameConfig::load();
    logging::init(&config.logging);

    let scanner = InboxScanner::new(config.scan.inbox_dir.clone());
    let mut session = Session::new(&config, Box::new(scanner));

    let mut renderer = Renderer::new();

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();

    let result = game_loop(&mut session, &mut renderer, sound.as_ref(), &config);
    session.shutdown();

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        log::error!("game loop failed: {e}");
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Recovery Room!");
    println!("Final Score: {}", fmt_points(session.score()));
    let bonuses = session.bonuses();
    println!(
        "  cognitive {} / time {}",
        fmt_points(bonuses.cognitive),
        fmt_points(bonuses.time)
    );
    println!("Puzzles Solved: {}/4", session.solved_count());
    log::info!("session ended with score {}", session.score());
}

fn game_loop(
    session: &mut Session,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.timing.frame_ms);

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            break;
        }
        match handle_input(session, &kb, &gp) {
            Ok(true) => break,
            Ok(false) => {}
            Err(e) => log::warn!("input not applied: {e}"),
        }

        // Whole milliseconds only; the remainder carries into the next tick.
        let elapsed = last_tick.elapsed();
        if elapsed >= tick_rate {
            let ms = elapsed.as_millis() as u64;
            session.advance(ms);
            last_tick += Duration::from_millis(ms);
        }

        process_events(sound, &session.drain_events());

        renderer.render(session)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

fn process_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    for event in events {
        log::debug!("event: {event:?}");
    }
    let sfx = match sound {
        Some(s) => s,
        None => return,
    };
    for event in events {
        match event {
            GameEvent::PuzzleAccepted { .. } => sfx.play_accept(),
            GameEvent::PuzzleRejected { .. } | GameEvent::EpilogueHint { .. } => sfx.play_reject(),
            GameEvent::CountdownTick { alert: Some(_), .. } => sfx.play_tick(true),
            GameEvent::CountdownTick { remaining, alert: None } if remaining % 10 == 0 => {
                sfx.play_tick(false)
            }
            GameEvent::CountdownExpired => sfx.play_expire(),
            GameEvent::LineRevealed { .. } => sfx.play_reveal(),
            GameEvent::Celebration => sfx.play_fanfare(),
            GameEvent::EpilogueRevealed => sfx.play_chime(),
            _ => {}
        }
    }
}

// ── Key Constants ──

const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter];
const KEYS_NEXT: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' ')];
const KEYS_YES: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char('y'), KeyCode::Char('Y')];
const KEYS_NO: &[KeyCode] = &[KeyCode::Char('n'), KeyCode::Char('N')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];
const KEYS_SCAN: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char('s'), KeyCode::Char('S')];
const KEYS_OVERRIDE: &[KeyCode] = &[KeyCode::Char('m'), KeyCode::Char('M')];
const KEYS_FORCE_SCAN: &[KeyCode] = &[KeyCode::F(2)];
const KEYS_LOGOUT: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char('l'), KeyCode::Char('L')];

/// Apply this frame's input. Returns `Ok(true)` when the player quits.
fn handle_input(session: &mut Session, kb: &InputState, gp: &GamepadState) -> Result<bool, SessionError> {
    let esc = kb.any_pressed(&[KeyCode::Esc]) || gp.cancel_pressed();

    // ── Modal dialog swallows everything else ──
    if let Some(kind) = session.dialog().map(|d| d.kind.clone()) {
        match kind {
            DialogKind::Alert => {
                if kb.any_pressed(KEYS_NEXT) || esc || gp.confirm_pressed() {
                    session.respond(DialogResponse::Dismissed)?;
                }
            }
            DialogKind::Confirm(_) => {
                if kb.any_pressed(KEYS_YES) || gp.confirm_pressed() {
                    session.respond(DialogResponse::Confirmed(true))?;
                } else if kb.any_pressed(KEYS_NO) {
                    session.respond(DialogResponse::Confirmed(false))?;
                } else if esc {
                    session.respond(DialogResponse::Cancelled)?;
                }
            }
            DialogKind::Prompt(..) => {
                if esc {
                    session.respond(DialogResponse::Cancelled)?;
                } else if let Some(field) = session.dialog_field_mut() {
                    edit_field(field, kb);
                    if kb.any_pressed(KEYS_CONFIRM) || gp.confirm_pressed() {
                        session.submit_prompt()?;
                    }
                }
            }
        }
        return Ok(false);
    }

    match session.screen() {
        // ── Intro ──
        Screen::Intro => {
            if kb.any_pressed(KEYS_NEXT) || gp.confirm_pressed() {
                session.begin()?;
            } else if kb.any_pressed(KEYS_QUIT) || esc {
                return Ok(true);
            }
        }

        // ── Typed answers ──
        Screen::Binary | Screen::Emergency | Screen::FinalLogic => {
            if esc {
                session.entry_mut().clear();
            } else {
                edit_field(session.entry_mut(), kb);
                if kb.any_pressed(KEYS_CONFIRM) || gp.confirm_pressed() {
                    let verdict = session.submit_entry()?;
                    log::debug!("answer verdict: {verdict:?}");
                }
            }
        }

        // ── Scan ──
        Screen::Scan => {
            if kb.any_pressed(KEYS_OVERRIDE) {
                session.request_manual_override()?;
            } else if kb.any_pressed(KEYS_FORCE_SCAN) {
                if !session.request_force_scan()? {
                    log::debug!("forced scan pass is disabled");
                }
            } else if (kb.any_pressed(KEYS_SCAN) || gp.confirm_pressed()) && !session.scan_active() {
                session.start_scan()?;
            }
        }

        // ── Letters ──
        Screen::MomLetter | Screen::DadLetter => {
            if kb.any_pressed(KEYS_NEXT) || gp.confirm_pressed() {
                session.dismiss_letter()?;
            }
        }

        // ── Reward ──
        Screen::Reward => {
            if kb.any_pressed(KEYS_QUIT) || esc {
                return Ok(true);
            }
        }

        // ── Hidden epilogue ──
        Screen::Epilogue => {
            if kb.any_pressed(KEYS_LOGOUT) || gp.confirm_pressed() {
                session.request_logout()?;
            }
        }
    }

    Ok(false)
}

/// Feed typed characters and Backspace into a text field.
fn edit_field(field: &mut sim::dialog::TextField, kb: &InputState) {
    if kb.any_pressed(&[KeyCode::Backspace]) {
        field.backspace();
    }
    for &c in kb.typed() {
        field.push(c);
    }
}
