use clap::Subcommand;
use focustimer_core::Phase;

use super::open_timer;

#[derive(Subcommand)]
pub enum DurationAction {
    /// Set a phase length in minutes (clamped to the phase's range)
    Set {
        /// work, short-break or long-break
        phase: Phase,
        #[arg(allow_negative_numbers = true)]
        minutes: i64,
    },
    /// List phase lengths
    List,
}

pub fn run(action: DurationAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut timer = open_timer()?;
    match action {
        DurationAction::Set { phase, minutes } => {
            timer.set_duration(phase, minutes);
            if !timer.last_save_ok() {
                return Err("failed to save durations".into());
            }
            let applied = timer.engine().durations().minutes(phase);
            if i64::from(applied) != minutes {
                println!("{phase}: {applied} min (clamped from {minutes})");
            } else {
                println!("{phase}: {applied} min");
            }
        }
        DurationAction::List => {
            let durations = timer.engine().durations();
            for phase in Phase::ALL {
                let bounds = phase.bounds();
                println!(
                    "{:<12} {:>3} min  ({}-{})",
                    phase.as_str(),
                    durations.minutes(phase),
                    bounds.min,
                    bounds.max
                );
            }
        }
    }
    Ok(())
}
