//! Foreground timer: one status line per snapshot, commands from stdin.

use clap::Args;
use focustimer_core::{Command, Keymap, TimerDriver, TimerSnapshot};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use super::open_timer_with;

#[derive(Args)]
pub struct RunArgs {
    /// Start straight into a micro-sprint of this many minutes
    #[arg(long)]
    sprint: Option<i64>,
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = focustimer_core::Config::load()?;
    let keymap =
        Keymap::from_config(&config.shortcuts)?.with_presets(&config.micro_sprint.presets);
    let timer = open_timer_with(&config)?;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(drive(TimerDriver::new(timer), keymap, args.sprint))
}

async fn drive(
    driver: TimerDriver,
    keymap: Keymap,
    sprint: Option<i64>,
) -> Result<(), Box<dyn std::error::Error>> {
    print_help(&keymap);
    if let Some(minutes) = sprint {
        driver.execute(Command::MicroSprint { minutes }).await;
    }

    let mut snapshots = driver.subscribe();
    print_snapshot(&snapshots.borrow_and_update());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                print_snapshot(&snapshot);
            }
            line = lines.next_line() => {
                // EOF ends the session like `q` does.
                let Some(line) = line? else { break };
                let line = line.trim_end_matches('\r');
                if line.trim() == "q" {
                    break;
                }
                match parse_line(&keymap, line) {
                    Some(command) => {
                        driver.execute(command).await;
                    }
                    None => println!("unknown input: {line:?}"),
                }
            }
            _ = &mut ctrl_c => {
                debug!("interrupted");
                break;
            }
        }
    }

    driver.shutdown().await;
    info!("session saved");
    Ok(())
}

/// Map one stdin line to a command. An empty line toggles.
///
/// Keys found in the keymap come back as [`Command::Shortcut`] so the key
/// press is reported along with the action.
fn parse_line(keymap: &Keymap, line: &str) -> Option<Command> {
    if line.trim().is_empty() {
        return Some(keymap.shortcut(" ").unwrap_or(Command::Toggle));
    }
    if let Some(text) = line.strip_prefix("task ") {
        return Some(Command::SetTask(text.to_string()));
    }
    if line.trim() == "untask" {
        return Some(Command::ClearTask);
    }
    keymap.shortcut(line.trim())
}

fn print_help(keymap: &Keymap) {
    let sprints: Vec<String> = keymap
        .sprint_presets()
        .iter()
        .map(|(key, minutes)| format!("{key}={minutes}m"))
        .collect();
    println!("enter: start/pause   r: reset   s: skip   q: quit");
    if !sprints.is_empty() {
        println!("micro-sprints: {}", sprints.join("  "));
    }
    println!("task <text>: set task   untask: clear task");
}

fn print_snapshot(snapshot: &TimerSnapshot) {
    let state = if snapshot.is_overtime {
        "overtime"
    } else if snapshot.is_running {
        "running"
    } else {
        "paused"
    };
    let mut line = format!(
        "{:<11} {:>6}  {:<8} session {} (pomodoro {})",
        snapshot.phase_label,
        snapshot.display,
        state,
        snapshot.session_number,
        snapshot.pomodoro_number
    );
    if let Some(message) = &snapshot.status_message {
        line.push_str("  ");
        line.push_str(message);
    }
    println!("{line}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use focustimer_core::storage::ShortcutsConfig;

    fn shortcut(key: &str, action: Command) -> Option<Command> {
        Some(Command::Shortcut {
            key: key.into(),
            action: Box::new(action),
        })
    }

    #[test]
    fn empty_line_toggles() {
        let keymap = Keymap::from_config(&ShortcutsConfig::default()).unwrap();
        assert_eq!(parse_line(&keymap, ""), shortcut(" ", Command::Toggle));
        assert_eq!(parse_line(&keymap, "  "), shortcut(" ", Command::Toggle));

        // Without a space binding the line still toggles, unreported.
        let keymap = Keymap::default();
        assert_eq!(parse_line(&keymap, ""), Some(Command::Toggle));
    }

    #[test]
    fn lines_go_through_the_keymap() {
        let keymap = Keymap::from_config(&ShortcutsConfig::default()).unwrap();
        assert_eq!(parse_line(&keymap, "s"), shortcut("s", Command::Skip));
        assert_eq!(
            parse_line(&keymap, "5"),
            shortcut("5", Command::MicroSprint { minutes: 5 })
        );
        assert_eq!(
            parse_line(&keymap, "task write tests"),
            Some(Command::SetTask("write tests".into()))
        );
        assert_eq!(parse_line(&keymap, "zzz"), None);
    }
}
