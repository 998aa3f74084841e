use chrono::{DateTime, Local};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

const LOG_FILE: &str = ".sysaid.log";

/// One line of the append-only command log.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Local>,
    pub input: String,
    pub command: String,
    pub executed: bool,
}

impl HistoryEntry {
    pub fn new(input: &str, command: &str, executed: bool) -> Self {
        Self {
            timestamp: Local::now(),
            input: input.to_string(),
            command: command.to_string(),
            executed,
        }
    }

    fn format_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}",
            self.timestamp.to_rfc3339(),
            self.input,
            self.command,
            if self.executed { "executed" } else { "not-executed" }
        )
    }
}

pub fn get_log_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(LOG_FILE)
}

/// Append an entry to the command log. Logging is best-effort: a write
/// failure warns and the request continues.
pub fn append(entry: &HistoryEntry) {
    if let Err(e) = append_to(&get_log_path(), entry) {
        eprintln!("warning: failed to write command log: {}", e);
    }
}

fn append_to(path: &Path, entry: &HistoryEntry) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", entry.format_line())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_append_one_line_each() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("commands.log");

        append_to(&path, &HistoryEntry::new("show disk usage", "df -h", true)).unwrap();
        append_to(&path, &HistoryEntry::new("wipe it", "rm -rf /", false)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("df -h"));
        assert!(lines[0].ends_with("executed"));
        assert!(lines[1].contains("rm -rf /"));
        assert!(lines[1].ends_with("not-executed"));
    }

    #[test]
    fn line_carries_timestamp_input_and_command() {
        let entry = HistoryEntry::new("free space", "df -h", true);
        let line = entry.format_line();
        let fields: Vec<&str> = line.split('\t').collect();
        assert_eq!(fields.len(), 4);
        assert!(fields[0].contains('T')); // RFC 3339
        assert_eq!(fields[1], "free space");
        assert_eq!(fields[2], "df -h");
    }
}
