use crate::config::Config;
use crate::errors::{Error, Result};
use crate::types::CommandCandidate;
use std::io::Read;
use std::process::{Command, Stdio};
use std::time::Duration;
use wait_timeout::ChildExt;

const MAX_OUTPUT_LINES: usize = 100;

/// Per-command outcome, used for the summary line and the history log.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub command: String,
    pub executed: bool,
    pub success: bool,
}

/// Run one command in a subshell, bounded by `timeout_secs`. On expiry
/// the child is killed and [`Error::ExecutionTimeout`] is returned; there
/// is no partial result and no retry.
fn run_one(command: &str, timeout_secs: u64) -> Result<(bool, String)> {
    let mut child = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let status = match child.wait_timeout(Duration::from_secs(timeout_secs))? {
        Some(status) => status,
        None => {
            child.kill().ok();
            child.wait().ok();
            return Err(Error::ExecutionTimeout(timeout_secs));
        }
    };

    let mut output_lines = Vec::new();
    if let Some(mut stdout) = child.stdout.take() {
        let mut buf = String::new();
        stdout.read_to_string(&mut buf).ok();
        output_lines.extend(buf.lines().map(String::from));
    }
    if let Some(mut stderr) = child.stderr.take() {
        let mut buf = String::new();
        stderr.read_to_string(&mut buf).ok();
        output_lines.extend(buf.lines().map(String::from));
    }

    Ok((status.success(), truncate_output(output_lines, MAX_OUTPUT_LINES)))
}

fn truncate_output(lines: Vec<String>, max_lines: usize) -> String {
    if lines.len() > max_lines {
        let mut truncated: Vec<String> = lines[..max_lines / 2].to_vec();
        truncated.push(format!("... [{} lines truncated] ...", lines.len() - max_lines));
        truncated.extend(lines[lines.len() - max_lines / 2..].to_vec());
        truncated.join("\n")
    } else {
        lines.join("\n")
    }
}

/// Execute a confirmed batch. With `safe_mode` set, a dangerous candidate
/// never spawns a subshell; it is reported and marked unexecuted.
pub fn execute_batch(
    candidates: &[CommandCandidate],
    config: &Config,
    safe_mode: bool,
) -> Vec<CommandResult> {
    let total = candidates.len();
    let mut results = Vec::with_capacity(total);

    for (i, candidate) in candidates.iter().enumerate() {
        println!("[{}/{}] running: {}", i + 1, total, candidate.raw_text);

        if safe_mode && candidate.is_dangerous() {
            eprintln!(
                "  {}",
                Error::DangerousCommandBlocked(candidate.raw_text.clone())
            );
            results.push(CommandResult {
                command: candidate.raw_text.clone(),
                executed: false,
                success: false,
            });
            continue;
        }

        tracing::info!(command = %candidate.raw_text, "executing");

        let (success, output) = match run_one(&candidate.raw_text, config.command_timeout) {
            Ok((success, output)) => (success, output),
            Err(e) => {
                eprintln!("  {}", e);
                results.push(CommandResult {
                    command: candidate.raw_text.clone(),
                    executed: true,
                    success: false,
                });
                continue;
            }
        };

        if !output.is_empty() {
            println!("{}", output);
        }
        if !success {
            eprintln!("  command exited with failure");
        }
        results.push(CommandResult {
            command: candidate.raw_text.clone(),
            executed: true,
            success,
        });
    }

    let succeeded = results.iter().filter(|r| r.success).count();
    println!("{}/{} commands succeeded", succeeded, total);
    results
}
