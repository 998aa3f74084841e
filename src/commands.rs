use crate::api::AnthropicClient;
use crate::config::{save_config, Config};
use crate::executor::{execute_batch, CommandResult};
use crate::history::{self, HistoryEntry};
use crate::keys;
use crate::osinfo::{self, OsProfile};
use crate::planner::{build_system_prompt, parse_reply};
use crate::safety::classify_all;
use crate::types::{CommandCandidate, Reply};
use crate::ui::{self, Action};
use anyhow::{bail, Context};
use std::io::Write;
use std::path::Path;

const SESSION_HISTORY_SHOWN: usize = 10;

/// How a single request ended, for the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    Completed,
    Cancelled,
}

/// Inputs to the confirmation state machine. Produced by the interactive
/// prompt in normal operation and by scripted sequences in tests.
enum LoopEvent {
    Confirm,
    RunAnyway,
    Details,
    Edit(Option<Vec<String>>),
    Cancel,
}

/// Terminal states of the confirmation loop.
enum Disposition {
    /// Confirmed normally; safe mode still applies during execution.
    Execute(Vec<CommandCandidate>),
    /// Explicit run-anyway override; safe mode is waived for this batch.
    Override(Vec<CommandCandidate>),
    Cancelled(Vec<CommandCandidate>),
}

/// The PRESENTED → {CONFIRMED, EDITED, DETAILS_SHOWN, CANCELLED} machine.
///
/// While safe mode holds a dangerous candidate, a plain confirm is
/// refused; only cancel or an explicit override leaves the loop. Editing
/// re-classifies before the batch is presented again.
fn drive_confirm_loop(
    mut candidates: Vec<CommandCandidate>,
    config: &Config,
    mut next: impl FnMut(&[CommandCandidate], bool) -> LoopEvent,
) -> Disposition {
    if config.auto_confirm && !candidates.iter().any(CommandCandidate::is_dangerous) {
        return Disposition::Execute(candidates);
    }

    ui::print_candidates(&candidates);
    loop {
        let blocked = config.safe_mode && candidates.iter().any(CommandCandidate::is_dangerous);
        match next(&candidates, blocked) {
            LoopEvent::Confirm => {
                if blocked {
                    eprintln!("refused: safe mode blocks dangerous commands (cancel, edit, or run anyway)");
                    continue;
                }
                return Disposition::Execute(candidates);
            }
            LoopEvent::RunAnyway => return Disposition::Override(candidates),
            LoopEvent::Edit(Some(lines)) => {
                candidates = classify_all(&lines);
                ui::print_candidates(&candidates);
            }
            LoopEvent::Edit(None) => {}
            LoopEvent::Details => {}
            LoopEvent::Cancel => return Disposition::Cancelled(candidates),
        }
    }
}

fn confirm_loop(candidates: Vec<CommandCandidate>, config: &Config) -> Disposition {
    drive_confirm_loop(candidates, config, |presented, blocked| {
        match ui::prompt_action(blocked) {
            Some(Action::Confirm) => LoopEvent::Confirm,
            Some(Action::Edit) => LoopEvent::Edit(ui::edit_commands(presented)),
            Some(Action::Details) => {
                ui::show_details(presented);
                LoopEvent::Details
            }
            Some(Action::RunAnyway) => LoopEvent::RunAnyway,
            Some(Action::Cancel) | None => LoopEvent::Cancel,
        }
    })
}

fn log_results(input: &str, results: &[CommandResult], config: &Config) {
    if !config.log_commands {
        return;
    }
    for result in results {
        history::append(&HistoryEntry::new(input, &result.command, result.executed));
    }
}

fn log_cancelled(input: &str, candidates: &[CommandCandidate], config: &Config) {
    if !config.log_commands {
        return;
    }
    for candidate in candidates {
        history::append(&HistoryEntry::new(input, &candidate.raw_text, false));
    }
}

/// Send one request through the model, then walk the confirmation loop
/// for command replies or print the answer for prose replies.
fn process_request(
    input: &str,
    config: &Config,
    client: &AnthropicClient,
    os: &OsProfile,
    session_commands: &mut Vec<String>,
) -> anyhow::Result<RequestOutcome> {
    eprint!("thinking...");
    std::io::stderr().flush().ok();
    let system = build_system_prompt(os);
    let reply = client.complete(&system, input);
    eprint!("\r           \r");
    std::io::stderr().flush().ok();

    let content = reply?;

    match parse_reply(&content) {
        Reply::Answer(text) => {
            ui::print_answer(&text);
            Ok(RequestOutcome::Completed)
        }
        Reply::Commands(commands) => {
            session_commands.extend(commands.iter().cloned());
            let candidates = classify_all(&commands);

            match confirm_loop(candidates, config) {
                Disposition::Execute(batch) => {
                    let results = execute_batch(&batch, config, config.safe_mode);
                    log_results(input, &results, config);
                    Ok(RequestOutcome::Completed)
                }
                Disposition::Override(batch) => {
                    tracing::warn!("safe mode overridden for this batch");
                    let results = execute_batch(&batch, config, false);
                    log_results(input, &results, config);
                    Ok(RequestOutcome::Completed)
                }
                Disposition::Cancelled(batch) => {
                    log_cancelled(input, &batch, config);
                    println!("cancelled.");
                    Ok(RequestOutcome::Cancelled)
                }
            }
        }
    }
}

pub fn run_single_request(
    input: &str,
    config: &Config,
    api_key: String,
    os: &OsProfile,
) -> anyhow::Result<RequestOutcome> {
    let client = AnthropicClient::new(config, api_key);
    let mut session_commands = Vec::new();
    process_request(input, config, &client, os, &mut session_commands)
}

pub fn interactive_mode(
    mut config: Config,
    api_key: String,
    os: &OsProfile,
) -> anyhow::Result<()> {
    let mut client = AnthropicClient::new(&config, api_key.clone());
    let mut session_commands: Vec<String> = Vec::new();

    println!("sysaid v{} - interactive mode", env!("CARGO_PKG_VERSION"));
    println!("type 'quit', 'exit', or 'q' to leave");
    println!("type 'help' for commands, 'config' for settings");
    println!();
    println!("just talk naturally:");
    println!("  ask questions: 'what is docker?'");
    println!("  request commands: 'show disk usage' or 'find large files'");
    if config.enable_web_search {
        println!("  web search is enabled for current information");
    }
    println!("{}", "-".repeat(50));

    loop {
        let Some(line) = ui::read_line("\nsysaid> ") else {
            println!("\ngoodbye!");
            break;
        };
        if line.is_empty() {
            continue;
        }

        match line.to_lowercase().as_str() {
            "quit" | "exit" | "q" => {
                println!("goodbye!");
                break;
            }
            "help" => show_help(&config, os),
            "history" => show_session_history(&session_commands),
            "config" => {
                configure_settings(&mut config)?;
                client = AnthropicClient::new(&config, api_key.clone());
            }
            _ => {
                if let Err(e) = process_request(&line, &config, &client, os, &mut session_commands)
                {
                    eprintln!("error: {:#}", e);
                }
            }
        }
    }
    Ok(())
}

fn show_session_history(commands: &[String]) {
    if commands.is_empty() {
        println!("no commands in this session yet.");
        return;
    }
    println!("session command history:");
    let start = commands.len().saturating_sub(SESSION_HISTORY_SHOWN);
    for (i, cmd) in commands[start..].iter().enumerate() {
        println!("{:2}. {}", start + i + 1, cmd);
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}

fn show_help(config: &Config, os: &OsProfile) {
    println!();
    println!("sysaid v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("target system: {} ({})", os.description, os.name);
    println!();
    println!("commands:");
    println!("  help        show this help");
    println!("  config      configure settings");
    println!("  history     show session command history");
    println!("  quit        exit");
    println!();
    println!("settings:");
    println!("  safe mode:    {}", on_off(config.safe_mode));
    println!("  auto confirm: {}", on_off(config.auto_confirm));
    println!("  log commands: {}", on_off(config.log_commands));
    println!("  web search:   {}", on_off(config.enable_web_search));
    println!("  model:        {}", config.model);
    println!("  timeout:      {} seconds", config.command_timeout);
    println!();
    println!("examples:");
    println!("  \"show disk usage\"            -> {}", os.disk_cmd);
    println!("  \"check system memory\"        -> {}", os.memory_cmd);
    println!("  \"what is uvx?\"               -> explanation");
    println!("  \"backup my home directory\"   -> tar command");
    println!();
}

pub fn configure_settings(config: &mut Config) -> anyhow::Result<()> {
    loop {
        println!();
        println!("configuration:");
        println!("  1. safe mode:           {}", on_off(config.safe_mode));
        println!("  2. auto confirm:        {}", on_off(config.auto_confirm));
        println!("  3. log commands:        {}", on_off(config.log_commands));
        println!("  4. web search:          {}", on_off(config.enable_web_search));
        println!("  5. model:               {}", config.model);
        println!("  6. timeout:             {} seconds", config.command_timeout);
        println!("  7. web search max uses: {}", config.web_search_max_uses);

        let Some(choice) = ui::read_line("\nselect option to change (1-7) or 'done': ") else {
            break;
        };
        match choice.as_str() {
            "done" | "" => break,
            "1" => config.safe_mode = !config.safe_mode,
            "2" => config.auto_confirm = !config.auto_confirm,
            "3" => config.log_commands = !config.log_commands,
            "4" => config.enable_web_search = !config.enable_web_search,
            "5" => {
                if let Some(model) = ui::read_line(&format!("model [{}]: ", config.model)) {
                    if !model.is_empty() {
                        config.model = model;
                    }
                }
            }
            "6" => {
                if let Some(value) =
                    ui::read_line(&format!("timeout in seconds [{}]: ", config.command_timeout))
                {
                    match value.parse::<u64>() {
                        Ok(secs) if secs > 0 => config.command_timeout = secs,
                        _ => println!("invalid timeout value"),
                    }
                }
            }
            "7" => {
                if let Some(value) = ui::read_line(&format!(
                    "max web search uses [1-10, current: {}]: ",
                    config.web_search_max_uses
                )) {
                    match value.parse::<u32>() {
                        Ok(n) if (1..=10).contains(&n) => config.web_search_max_uses = n,
                        _ => println!("must be a number between 1 and 10"),
                    }
                }
            }
            _ => println!("options: 1-7 or 'done'"),
        }
    }

    save_config(config).context("failed to save configuration")?;
    println!("configuration saved.");
    Ok(())
}

pub fn cmd_show_os(target: Option<&str>) {
    let resolved = target
        .map(String::from)
        .unwrap_or_else(osinfo::detect_os);
    let profile = osinfo::profile_for(&resolved);
    println!("target os:       {}", resolved);
    println!("description:     {}", profile.description);
    println!("memory command:  {}", profile.memory_cmd);
    println!("process command: {}", profile.process_cmd);
    println!("network command: {}", profile.network_cmd);
    println!("package manager: {}", profile.package_manager);
}

pub fn cmd_embed_key(path: &str) -> anyhow::Result<()> {
    let api_key = rpassword::prompt_password("Enter Anthropic API key to embed: ")
        .context("failed to read API key")?;
    if api_key.trim().is_empty() {
        bail!("no API key provided");
    }
    let passphrase = rpassword::prompt_password("Enter passphrase for encryption: ")
        .context("failed to read passphrase")?;
    let confirm =
        rpassword::prompt_password("Confirm passphrase: ").context("failed to read passphrase")?;
    if passphrase != confirm {
        bail!("passphrases don't match");
    }

    keys::write_key_file(Path::new(path), api_key.trim(), &passphrase)?;
    println!("wrote encrypted key file: {}", path);
    let default = keys::default_key_file();
    if Path::new(path) != default {
        println!(
            "note: {} is probed automatically at startup",
            default.display()
        );
    }
    println!("the passphrase will be required when the key is used.");
    Ok(())
}
