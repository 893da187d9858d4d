use anyhow::{Context, Result};
use chrono::Local;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::console::console;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditEntryType {
    System,
    User,
    Command,
    Agent,
    Tool,
    Error,
}

impl fmt::Display for AuditEntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AuditEntryType::System => "SYSTEM",
            AuditEntryType::User => "USER",
            AuditEntryType::Command => "COMMAND",
            AuditEntryType::Agent => "AGENT",
            AuditEntryType::Tool => "TOOL",
            AuditEntryType::Error => "ERROR",
        };
        f.write_str(label)
    }
}

struct ActiveLog {
    path: PathBuf,
    file: File,
}

/// Append-only session transcript, off until started.
pub struct AuditLogger {
    dir: PathBuf,
    active: Option<ActiveLog>,
}

impl AuditLogger {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            active: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn path(&self) -> Option<&Path> {
        self.active.as_ref().map(|log| log.path.as_path())
    }

    /// Open a new log file in the audit directory. Starting an active logger
    /// returns its current file.
    pub fn start(&mut self) -> Result<PathBuf> {
        if let Some(log) = &self.active {
            return Ok(log.path.clone());
        }

        fs::create_dir_all(&self.dir).with_context(|| {
            format!("Failed to create audit directory {}", self.dir.display())
        })?;
        let file_name = format!("audit_{}.log", Local::now().format("%Y%m%d_%H%M%S"));
        let path = self.dir.join(file_name);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open audit log {}", path.display()))?;

        self.active = Some(ActiveLog {
            path: path.clone(),
            file,
        });
        self.log(AuditEntryType::System, "Audit started");
        Ok(path)
    }

    pub fn stop(&mut self) {
        if self.is_active() {
            self.log(AuditEntryType::System, "Audit stopped");
        }
        self.active = None;
    }

    /// Append one entry. Does nothing while stopped; a write failure stops
    /// the logger.
    pub fn log(&mut self, entry_type: AuditEntryType, content: &str) {
        let Some(log) = self.active.as_mut() else {
            return;
        };

        let line = format!(
            "[{}] [{}] {}\n",
            Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
            entry_type,
            content
        );
        if let Err(e) = log.file.write_all(line.as_bytes()).and_then(|_| log.file.flush()) {
            console().warning(&format!(
                "Audit log {} is not writable, auditing disabled: {}",
                log.path.display(),
                e
            ));
            self.active = None;
        }
    }
}

impl Drop for AuditLogger {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;
    use tempfile::TempDir;

    fn lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_inactive_logger_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let mut logger = AuditLogger::new(dir.path().join("audit"));

        logger.log(AuditEntryType::User, "hello");

        assert!(!logger.is_active());
        assert!(!dir.path().join("audit").exists());
    }

    #[test]
    fn test_start_log_stop_writes_framed_entries() {
        let dir = TempDir::new().unwrap();
        let mut logger = AuditLogger::new(dir.path());

        let path = logger.start().unwrap();
        logger.log(AuditEntryType::User, "deploy staging");
        logger.log(AuditEntryType::Tool, "read_file: Cargo.toml");
        logger.stop();
        logger.log(AuditEntryType::Agent, "after stop");

        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(Regex::new(r"^audit_\d{8}_\d{6}\.log$").unwrap().is_match(&name));

        let lines = lines(&path);
        assert_eq!(lines.len(), 4);
        let framed =
            Regex::new(r"^\[\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d{3}\] \[([A-Z]+)\] (.*)$")
                .unwrap();
        let parsed: Vec<(String, String)> = lines
            .iter()
            .map(|line| {
                let caps = framed.captures(line).unwrap();
                (caps[1].to_string(), caps[2].to_string())
            })
            .collect();
        assert_eq!(
            parsed,
            vec![
                ("SYSTEM".to_string(), "Audit started".to_string()),
                ("USER".to_string(), "deploy staging".to_string()),
                ("TOOL".to_string(), "read_file: Cargo.toml".to_string()),
                ("SYSTEM".to_string(), "Audit stopped".to_string()),
            ]
        );
    }

    #[test]
    fn test_start_twice_keeps_current_file() {
        let dir = TempDir::new().unwrap();
        let mut logger = AuditLogger::new(dir.path());

        let first = logger.start().unwrap();
        let second = logger.start().unwrap();

        assert_eq!(first, second);
        assert_eq!(logger.path(), Some(first.as_path()));
    }

    #[test]
    fn test_start_fails_when_directory_is_a_file() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocked");
        fs::write(&blocker, "not a directory").unwrap();
        let mut logger = AuditLogger::new(&blocker);

        assert!(logger.start().is_err());
        assert!(!logger.is_active());
    }
}
