//! Live playthrough in the terminal.
//!
//! A ticker thread and a stdin reader thread both feed one channel; the loop
//! draining it is the only code that touches the session. Each phase gets a
//! fresh ticker stamped with the session generation, and dropping a ticker
//! stops it. Ticks that were already queued for an old generation are
//! rejected by the session.

use chrono::Utc;
use liftloop_core::*;
use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use uuid::Uuid;

enum LoopEvent {
    Tick(u64),
    Input(String),
    InputClosed,
}

/// Terminal bell on every phase change
struct TerminalBell {
    enabled: bool,
}

impl Cue for TerminalBell {
    fn play(&self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        let mut stdout = io::stdout();
        stdout.write_all(b"\x07")?;
        stdout.flush()?;
        Ok(())
    }
}

/// Periodic tick source for one generation
struct Ticker {
    stop: Arc<AtomicBool>,
}

impl Ticker {
    fn spawn(generation: u64, interval: Duration, tx: Sender<LoopEvent>) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stopped = Arc::clone(&stop);
        thread::spawn(move || loop {
            thread::sleep(interval);
            if stopped.load(Ordering::Relaxed) || tx.send(LoopEvent::Tick(generation)).is_err() {
                break;
            }
        });
        Ticker { stop }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

fn spawn_stdin_reader(tx: Sender<LoopEvent>) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(LoopEvent::Input(line)).is_err() {
                return;
            }
        }
        let _ = tx.send(LoopEvent::InputClosed);
    });
}

enum Command {
    Advance,
    ToggleTimer,
    Set(QuantityEdit),
    Quit,
}

fn parse_command(line: &str) -> std::result::Result<Command, String> {
    let line = line.trim();
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };
    match head {
        "" => Ok(Command::Advance),
        "p" => Ok(Command::ToggleTimer),
        "q" => Ok(Command::Quit),
        "w" => parse_quantity(rest).map(|v| Command::Set(QuantityEdit::WeightLbs(v))),
        "l" => parse_quantity(rest).map(|v| Command::Set(QuantityEdit::LimitValue(v))),
        "n" => Ok(Command::Set(QuantityEdit::Notes(rest.to_string()))),
        other => Err(format!("Unknown command '{}'", other)),
    }
}

pub(crate) fn parse_quantity(text: &str) -> std::result::Result<f64, String> {
    match text.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
        _ => Err(format!("Expected a non-negative number, got '{}'", text)),
    }
}

fn print_help() {
    println!("─────────────────────────────────────────");
    println!("Enter advance | p pause/resume | w <lbs> weight");
    println!("l <n> reps/seconds | n <text> notes | q quit");
}

fn print_header(view: &PhaseView) {
    println!();
    println!("╭─────────────────────────────────────────╮");
    println!("│  {}", view.location);
    println!("╰─────────────────────────────────────────╯");
    println!("  [{}/{}] {}", view.position, view.total, view.title);
    if let Some(description) = &view.description {
        for line in description.lines() {
            println!("  ℹ {}", line);
        }
    }
    if let Some(weight) = view.weight_lbs {
        println!("  Weight: {} lbs", weight);
    }
    if let Some(notes) = &view.instance_notes {
        println!("  Notes: {}", notes);
    }
}

fn status_line(view: &PhaseView) -> String {
    format!(
        "  {} - {}{}",
        view.phase_label,
        view.quantity_text,
        if view.is_paused { " (paused)" } else { "" }
    )
}

/// Play a workout instance until it finishes or the user quits
pub fn play(
    store: &mut FileStore,
    settings: &PlaythroughSettings,
    instance_id: Uuid,
    auto: bool,
) -> Result<()> {
    let bell = TerminalBell {
        enabled: settings.audible_cue,
    };
    let mut nav = NavStack::default();
    let mut session =
        PlaythroughSession::start(store, &bell, &mut nav, settings.clone(), instance_id, Utc::now())?;

    if auto {
        return play_auto(&mut session);
    }

    let (tx, rx) = channel();
    spawn_stdin_reader(tx.clone());
    let interval = Duration::from_millis(settings.tick_interval_ms);
    let mut ticker = Ticker::spawn(session.generation(), interval, tx.clone());

    print_help();
    let view = session.view(Utc::now())?;
    print_header(&view);
    let mut last_status = String::new();

    while let Ok(event) = rx.recv() {
        let now = Utc::now();
        let step = match event {
            LoopEvent::Tick(generation) => session.tick(generation, now)?,
            LoopEvent::Input(line) => match parse_command(&line) {
                Ok(Command::Advance) => session.advance(now)?,
                Ok(Command::ToggleTimer) => session.toggle_timer(now)?,
                Ok(Command::Set(edit)) => {
                    let step = session.set_quantity(&edit, now)?;
                    println!("\n✓ {} updated (timer paused, p to resume)", edit.name());
                    print_header(&session.view(now)?);
                    last_status.clear();
                    step
                }
                Ok(Command::Quit) => {
                    println!("\nLeft the playthrough; finished exercises are saved.");
                    return Ok(());
                }
                Err(message) => {
                    println!("\n{}", message);
                    print_help();
                    last_status.clear();
                    Step::Continue
                }
            },
            LoopEvent::InputClosed => {
                println!("\nInput closed; finished exercises are saved.");
                return Ok(());
            }
        };

        match step {
            Step::Stale => continue,
            Step::Continue => {}
            Step::PhaseChanged => {
                // Replacing the ticker stops the old one
                ticker = Ticker::spawn(session.generation(), interval, tx.clone());
                println!();
                print_header(&session.view(now)?);
                last_status.clear();
            }
            Step::Finished(workout) => {
                drop(ticker);
                print_finished(&workout);
                return Ok(());
            }
        }

        let status = status_line(&session.view(now)?);
        if status != last_status {
            print!("\r{:<50}", status);
            io::stdout().flush()?;
            last_status = status;
        }
    }

    Ok(())
}

/// Advance through every phase without waiting
fn play_auto<B: WorkoutBackend, C: Cue>(session: &mut PlaythroughSession<'_, B, C>) -> Result<()> {
    loop {
        let now = Utc::now();
        let view = session.view(now)?;
        print_header(&view);
        println!("{}", status_line(&view));
        if let Step::Finished(workout) = session.advance(now)? {
            print_finished(&workout);
            return Ok(());
        }
    }
}

fn print_finished(workout: &WorkoutInstance) {
    println!();
    println!("✓ Workout finished: {}", workout.definition.name);
    println!("  Instance: {}", workout.id);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert!(matches!(parse_command(""), Ok(Command::Advance)));
        assert!(matches!(parse_command("  p "), Ok(Command::ToggleTimer)));
        assert!(matches!(parse_command("q"), Ok(Command::Quit)));
        assert!(matches!(
            parse_command("w 135"),
            Ok(Command::Set(QuantityEdit::WeightLbs(w))) if w == 135.0
        ));
        assert!(matches!(
            parse_command("l 12.5"),
            Ok(Command::Set(QuantityEdit::LimitValue(v))) if v == 12.5
        ));
        assert!(matches!(
            parse_command("n felt strong today"),
            Ok(Command::Set(QuantityEdit::Notes(ref text))) if text == "felt strong today"
        ));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(parse_command("w").is_err());
        assert!(parse_command("w -5").is_err());
        assert!(parse_command("l abc").is_err());
        assert!(parse_command("x").is_err());
    }
}
