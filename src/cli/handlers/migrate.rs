//! Migrate command handler

use crate::config::settings::Settings;
use crate::db::{MigrationAction, run_migrations};
use crate::error::AppResult;

/// Handler for the migrate command
pub struct MigrateCommandHandler {
    config: Settings,
}

impl MigrateCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Picks the migration action from the command flags.
    pub fn action(dry_run: bool, rollback: Option<u32>) -> MigrationAction {
        match (dry_run, rollback) {
            (true, _) => MigrationAction::Pending,
            (false, Some(steps)) => MigrationAction::Rollback(steps as usize),
            (false, None) => MigrationAction::Up,
        }
    }

    /// Applies, reverts or lists migrations and prints the affected versions.
    pub async fn execute(&self, dry_run: bool, rollback: Option<u32>) -> AppResult<()> {
        self.config.database.validate()?;

        let action = Self::action(dry_run, rollback);
        let versions = run_migrations(&self.config.database.url, action).await?;

        let summary = match action {
            MigrationAction::Up if versions.is_empty() => {
                "✓ No migrations to apply - database is up to date".to_string()
            }
            MigrationAction::Up => format!("✓ Applied {} migration(s):", versions.len()),
            MigrationAction::Pending if versions.is_empty() => {
                "✓ No pending migrations".to_string()
            }
            MigrationAction::Pending => format!("{} pending migration(s):", versions.len()),
            MigrationAction::Rollback(_) => {
                format!("✓ Rolled back {} migration(s):", versions.len())
            }
        };
        println!("{summary}");
        for version in &versions {
            println!("  - {version}");
        }

        Ok(())
    }

    pub fn config(&self) -> &Settings {
        &self.config
    }
}
