use focustimer_core::Phase;

use super::open_timer;

pub fn run(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let timer = open_timer()?;
    let snapshot = timer.snapshot();

    if json {
        let value = serde_json::json!({
            "snapshot": snapshot,
            "task": timer.task(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!(
        "{}  {}  session {} (pomodoro {})",
        snapshot.phase_label, snapshot.display, snapshot.session_number, snapshot.pomodoro_number
    );
    println!("task: {}", timer.task().unwrap_or("(none)"));
    let lengths: Vec<String> = Phase::ALL
        .iter()
        .map(|p| format!("{p} {}m", snapshot.durations.minutes(*p)))
        .collect();
    println!("durations: {}", lengths.join(", "));
    Ok(())
}
