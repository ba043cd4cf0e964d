use std::path::PathBuf;

use chrono::{DateTime, Local};
use clap::Subcommand;
use focustimer_core::storage::{export, import};
use focustimer_core::{Database, PersistenceStore, UserDataExport};

#[derive(Subcommand)]
pub enum DataAction {
    /// Export stored settings as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Load settings from a file written by `data export`
    Import {
        file: PathBuf,
    },
    /// Show which settings are stored and when they were last saved
    Info {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete everything focustimer has stored
    Clear,
}

pub fn run(action: DataAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut db = Database::open()?;
    match action {
        DataAction::Export { output } => {
            let dump = export(&mut db)?;
            match output {
                Some(path) => {
                    dump.write_to(&path)?;
                    println!("exported to {}", path.display());
                }
                None => println!("{}", serde_json::to_string_pretty(&dump)?),
            }
        }
        DataAction::Import { file } => {
            let data = UserDataExport::from_file(&file)?;
            if !import(&mut db, &data) {
                return Err(format!("nothing imported from {}", file.display()).into());
            }
            println!("imported from {}", file.display());
        }
        DataAction::Info { json } => {
            let info = db.storage_info()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
                return Ok(());
            }
            for key in &info.usage {
                let state = if key.has_data { "set" } else { "empty" };
                println!("{:<26} {:<6} {:>5} bytes", key.name, state, key.size);
            }
            println!("total: {} bytes", info.total_size);
            let last_save = info
                .last_save_ms
                .and_then(|ms| DateTime::from_timestamp_millis(i64::try_from(ms).ok()?))
                .map(|at| at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string());
            println!("last save: {}", last_save.as_deref().unwrap_or("never"));
        }
        DataAction::Clear => {
            db.clear_all()?;
            println!("all stored data cleared");
        }
    }
    Ok(())
}
