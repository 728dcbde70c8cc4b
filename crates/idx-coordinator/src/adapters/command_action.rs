//! # Command Action
//!
//! Runs an indexer's `action_class` as a child process:
//!
//! ```text
//! <action_class> full <indexer_id>
//! <action_class> row  <indexer_id> <id>
//! <action_class> list <indexer_id> <id> <id> ...
//! ```
//!
//! `action_class` may carry leading arguments separated by whitespace.
//! A non-zero exit status is an `ActionError` carrying the child's stderr.

use crate::domain::{ActionError, EntityId, IndexerDefinition};
use crate::ports::{ActionFactory, IndexerAction};
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, error};

/// Factory for `CommandAction`s.
#[derive(Clone, Debug, Default)]
pub struct CommandActionFactory {
    working_dir: Option<PathBuf>,
}

impl CommandActionFactory {
    /// Factory running commands in the current directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run commands in `dir`.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

impl ActionFactory for CommandActionFactory {
    fn create(&self, definition: &IndexerDefinition) -> Box<dyn IndexerAction> {
        Box::new(CommandAction {
            indexer_id: definition.id.clone(),
            command_line: definition.action_class.clone(),
            working_dir: self.working_dir.clone(),
        })
    }
}

/// Action backed by an external command.
#[derive(Debug)]
pub struct CommandAction {
    indexer_id: String,
    command_line: String,
    working_dir: Option<PathBuf>,
}

impl CommandAction {
    fn run(&self, mode: &str, ids: &[EntityId]) -> Result<(), ActionError> {
        let mut parts = self.command_line.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| ActionError::new(&self.indexer_id, "empty action command"))?;

        let mut command = Command::new(program);
        command
            .args(parts)
            .arg(mode)
            .arg(&self.indexer_id)
            .args(ids.iter().map(|id| id.to_string()));
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        debug!(indexer_id = %self.indexer_id, mode, ids = ids.len(), "Running action command");
        let output = command.output().map_err(|e| {
            ActionError::new(&self.indexer_id, format!("failed to start {program}")).with_source(e)
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!(
                indexer_id = %self.indexer_id,
                mode,
                status = %output.status,
                "Action command failed"
            );
            return Err(ActionError::new(
                &self.indexer_id,
                format!("{program} {mode} exited with {}: {stderr}", output.status),
            ));
        }
        Ok(())
    }
}

impl IndexerAction for CommandAction {
    fn execute_full(&self) -> Result<(), ActionError> {
        self.run("full", &[])
    }

    fn execute_row(&self, id: EntityId) -> Result<(), ActionError> {
        self.run("row", &[id])
    }

    fn execute_list(&self, ids: &[EntityId]) -> Result<(), ActionError> {
        self.run("list", ids)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn action(command_line: &str) -> Box<dyn IndexerAction> {
        CommandActionFactory::new().create(&IndexerDefinition::new("idx", command_line))
    }

    #[test]
    fn test_successful_command() {
        assert!(action("true").execute_full().is_ok());
    }

    #[test]
    fn test_failing_command() {
        let err = action("false").execute_row(5).unwrap_err();
        assert_eq!(err.indexer_id, "idx");
        assert!(err.message.contains("false row"));
    }

    #[test]
    fn test_arguments_are_passed() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("record.sh");
        std::fs::write(&script, "#!/bin/sh\necho \"$@\" > \"$(dirname \"$0\")/args.txt\"\n").unwrap();
        let factory = CommandActionFactory::new().with_working_dir(dir.path());
        let cmd = format!("sh {}", script.display());
        factory
            .create(&IndexerDefinition::new("idx", cmd))
            .execute_list(&[3, 4])
            .unwrap();
        let args = std::fs::read_to_string(dir.path().join("args.txt")).unwrap();
        assert_eq!(args.trim(), "list idx 3 4");
    }

    #[test]
    fn test_missing_program() {
        let err = action("/nonexistent/indexer-bin").execute_full().unwrap_err();
        assert!(err.message.contains("failed to start"));
    }
}
