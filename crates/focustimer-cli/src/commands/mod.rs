pub mod config;
pub mod data;
pub mod duration;
pub mod run;
pub mod status;
pub mod task;

use focustimer_core::{Config, Database, FocusTimer, TracingSink};

/// Open the timer over the on-disk store with the user's config.
pub fn open_timer() -> Result<FocusTimer, Box<dyn std::error::Error>> {
    open_timer_with(&Config::load()?)
}

pub fn open_timer_with(config: &Config) -> Result<FocusTimer, Box<dyn std::error::Error>> {
    let db = Database::open()?;
    Ok(FocusTimer::open(db, TracingSink, config))
}
