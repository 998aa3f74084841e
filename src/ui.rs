use crate::types::{CommandCandidate, RiskLevel};
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    terminal,
};
use std::{env, fs, io::Write, process::Command, time::Duration};

/// User responses accepted while a command batch is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Confirm,
    Edit,
    Details,
    Cancel,
    RunAnyway,
}

pub fn print_candidates(candidates: &[CommandCandidate]) {
    println!();
    for (i, candidate) in candidates.iter().enumerate() {
        let marker = match candidate.risk {
            RiskLevel::Dangerous => "  [dangerous]",
            RiskLevel::Caution => "  [caution]",
            RiskLevel::Safe => "",
        };
        if candidates.len() > 1 {
            println!("  {}. {}{}", i + 1, candidate.raw_text, marker);
        } else {
            println!("  {}{}", candidate.raw_text, marker);
        }
    }
    for candidate in candidates {
        if let Some(pattern) = candidate.matched_pattern {
            println!("  warning: {}", pattern);
        }
    }
}

/// Single-key prompt for the confirmation loop. The run-anyway key is
/// only offered when safe mode is currently refusing the batch.
pub fn prompt_action(allow_override: bool) -> Option<Action> {
    if allow_override {
        eprint!("[y]run [e]dit [s]how details [n]cancel [!]run anyway ");
    } else {
        eprint!("[y]run [e]dit [s]how details [n]cancel ");
    }
    std::io::stderr().flush().ok();

    terminal::enable_raw_mode().ok()?;
    let result = loop {
        if event::poll(Duration::from_millis(100)).ok()? {
            if let Event::Key(key) = event::read().ok()? {
                match key.code {
                    KeyCode::Enter | KeyCode::Char('y') => break Some(Action::Confirm),
                    KeyCode::Char('e') => break Some(Action::Edit),
                    KeyCode::Char('s') => break Some(Action::Details),
                    KeyCode::Char('!') if allow_override => break Some(Action::RunAnyway),
                    KeyCode::Char('n') | KeyCode::Char('q') | KeyCode::Esc => {
                        break Some(Action::Cancel)
                    }
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        break Some(Action::Cancel)
                    }
                    _ => {}
                }
            }
        }
    };
    terminal::disable_raw_mode().ok();
    eprintln!();
    result
}

/// Open the batch in $EDITOR, one command per line. Blank lines and
/// comment lines are dropped on the way back in.
pub fn edit_commands(candidates: &[CommandCandidate]) -> Option<Vec<String>> {
    let editor = env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
    let path = env::temp_dir().join("sysaid_edit.sh");
    let joined = candidates
        .iter()
        .map(|c| c.raw_text.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    fs::write(&path, joined).ok()?;
    Command::new(&editor).arg(&path).status().ok()?;
    let edited = fs::read_to_string(&path).ok()?;

    let commands: Vec<String> = edited
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(String::from)
        .collect();
    if commands.is_empty() {
        None
    } else {
        Some(commands)
    }
}

/// Per-command risk verdicts plus a `whatis` summary when one exists.
pub fn show_details(candidates: &[CommandCandidate]) {
    println!();
    for candidate in candidates {
        println!("  {}", candidate.raw_text);
        match candidate.matched_pattern {
            Some(pattern) => println!("    risk: {} ({})", candidate.risk, pattern),
            None => println!("    risk: {}", candidate.risk),
        }
        if let Some(head) = candidate.raw_text.split_whitespace().next() {
            if let Ok(output) = Command::new("whatis").arg(head).output() {
                if output.status.success() {
                    let summary = String::from_utf8_lossy(&output.stdout);
                    if let Some(first) = summary.lines().next() {
                        println!("    {}", first.trim());
                    }
                }
            }
        }
    }
    println!();
}

pub fn print_answer(text: &str) {
    println!();
    println!("{}", "=".repeat(60));
    println!("{}", text);
    println!("{}", "=".repeat(60));
}

/// Line-oriented prompt for the REPL and the settings editor.
/// Returns None on EOF.
pub fn read_line(prompt: &str) -> Option<String> {
    print!("{}", prompt);
    std::io::stdout().flush().ok();
    let mut input = String::new();
    match std::io::stdin().read_line(&mut input) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(input.trim().to_string()),
    }
}
