use clap::Subcommand;
use focustimer_core::storage::{normalize_task, MAX_TASK_LEN};

use super::open_timer;

#[derive(Subcommand)]
pub enum TaskAction {
    /// Set what you're working on
    Set {
        /// Task text (joined with spaces)
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Show the current task
    Show,
    /// Clear the current task
    Clear,
}

pub fn run(action: TaskAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut timer = open_timer()?;
    match action {
        TaskAction::Set { text } => {
            let text = text.join(" ");
            if normalize_task(&text).is_none() {
                return Err(format!(
                    "task must be non-empty and under {MAX_TASK_LEN} characters"
                )
                .into());
            }
            if !timer.set_task(&text) {
                return Err("failed to save task".into());
            }
            println!("task: {}", timer.task().unwrap_or_default());
        }
        TaskAction::Show => match timer.task() {
            Some(task) => println!("{task}"),
            None => println!("(no task)"),
        },
        TaskAction::Clear => {
            if !timer.clear_task() {
                return Err("failed to clear task".into());
            }
            println!("task cleared");
        }
    }
    Ok(())
}
