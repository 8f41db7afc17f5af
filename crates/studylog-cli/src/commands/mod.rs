pub mod bank;
pub mod config;
pub mod history;
pub mod mark;
pub mod stats;
pub mod toggle;

use studylog_core::{Config, Database, StudyWorkspace};

/// Everything a command needs for one load → mutate → flush cycle.
pub struct Session {
    pub db: Database,
    pub config: Config,
    pub workspace: StudyWorkspace,
}

impl Session {
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let config = Config::load_or_default();
        let db = Database::open()?;
        let workspace = StudyWorkspace::load(&db, &config)?;
        Ok(Self {
            db,
            config,
            workspace,
        })
    }

    pub fn flush(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.workspace.flush(&mut self.db)?;
        Ok(())
    }
}

pub fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
