mod api;
mod commands;
mod config;
mod errors;
mod executor;
mod history;
mod keys;
mod osinfo;
mod planner;
mod safety;
mod types;
mod ui;

use commands::RequestOutcome;
use config::load_config;
use std::env;
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Default)]
struct CliArgs {
    words: Vec<String>,
    interactive: bool,
    safe_mode: bool,
    auto_confirm: bool,
    disable_web_search: bool,
    target_os: Option<String>,
    show_os: bool,
    config: bool,
    embed_key: Option<String>,
    help: bool,
    version: bool,
}

fn parse_args(args: &[String]) -> Result<CliArgs, String> {
    let mut parsed = CliArgs::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--interactive" | "-i" => parsed.interactive = true,
            "--safe-mode" => parsed.safe_mode = true,
            "--auto-confirm" => parsed.auto_confirm = true,
            "--disable-web-search" => parsed.disable_web_search = true,
            "--show-os" => parsed.show_os = true,
            "--config" => parsed.config = true,
            "--target-os" => {
                parsed.target_os = Some(
                    iter.next()
                        .ok_or("--target-os requires a value")?
                        .clone(),
                )
            }
            "--embed-key" => {
                parsed.embed_key = Some(
                    iter.next()
                        .ok_or("--embed-key requires an output path")?
                        .clone(),
                )
            }
            "--help" | "-h" => parsed.help = true,
            "--version" => parsed.version = true,
            other if other.starts_with('-') => return Err(format!("unknown flag: {}", other)),
            other => parsed.words.push(other.to_string()),
        }
    }
    Ok(parsed)
}

fn print_usage() {
    eprintln!("usage: sysaid [options] <request...>");
    eprintln!("       sysaid --interactive");
    eprintln!();
    eprintln!("options:");
    eprintln!("  -i, --interactive         run in interactive mode");
    eprintln!("      --safe-mode           block dangerous commands");
    eprintln!("      --auto-confirm        auto-confirm safe commands");
    eprintln!("      --disable-web-search  disable web search for answers");
    eprintln!("      --target-os <name>    target OS (e.g. macos, linux-ubuntu)");
    eprintln!("      --show-os             show the detected OS and exit");
    eprintln!("      --config              configure settings");
    eprintln!("      --embed-key <path>    write an encrypted API key file");
    eprintln!("  -h, --help                show this help");
    eprintln!("      --version             show version");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_tracing();

    let raw: Vec<String> = env::args().skip(1).collect();
    let args = match parse_args(&raw) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("sysaid: {}", e);
            print_usage();
            std::process::exit(2);
        }
    };

    if args.help {
        print_usage();
        return;
    }
    if args.version {
        println!("sysaid v{}", VERSION);
        return;
    }

    if args.show_os {
        commands::cmd_show_os(args.target_os.as_deref());
        return;
    }

    if let Some(path) = &args.embed_key {
        if let Err(e) = commands::cmd_embed_key(path) {
            eprintln!("sysaid: {:#}", e);
            std::process::exit(1);
        }
        return;
    }

    let mut config = load_config();
    if args.safe_mode {
        config.safe_mode = true;
    }
    if args.auto_confirm {
        config.auto_confirm = true;
    }
    if args.disable_web_search {
        config.enable_web_search = false;
    }

    if args.config {
        if let Err(e) = commands::configure_settings(&mut config) {
            eprintln!("sysaid: {:#}", e);
            std::process::exit(1);
        }
        return;
    }

    let target = args.target_os.clone().unwrap_or_else(osinfo::detect_os);
    let os = osinfo::profile_for(&target);

    let api_key = match keys::resolve_api_key() {
        Ok(key) => key,
        Err(e) => {
            eprintln!("sysaid: {}", e);
            std::process::exit(1);
        }
    };

    let result = if args.interactive || args.words.is_empty() {
        commands::interactive_mode(config, api_key, os).map(|_| RequestOutcome::Completed)
    } else {
        let request = args.words.join(" ");
        commands::run_single_request(&request, &config, api_key, os)
    };

    match result {
        Ok(RequestOutcome::Completed) => {}
        Ok(RequestOutcome::Cancelled) => std::process::exit(1),
        Err(e) => {
            eprintln!("sysaid: {:#}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn free_words_become_the_request() {
        let parsed = parse_args(&args(&["show", "disk", "usage"])).unwrap();
        assert_eq!(parsed.words.join(" "), "show disk usage");
        assert!(!parsed.interactive);
    }

    #[test]
    fn flags_mix_with_positional_words() {
        let parsed =
            parse_args(&args(&["--safe-mode", "delete", "old", "logs", "--auto-confirm"]))
                .unwrap();
        assert!(parsed.safe_mode);
        assert!(parsed.auto_confirm);
        assert_eq!(parsed.words.join(" "), "delete old logs");
    }

    #[test]
    fn value_flags_consume_their_argument() {
        let parsed = parse_args(&args(&["--target-os", "linux-arch", "--show-os"])).unwrap();
        assert_eq!(parsed.target_os.as_deref(), Some("linux-arch"));
        assert!(parsed.show_os);

        let parsed = parse_args(&args(&["--embed-key", "/tmp/key.enc"])).unwrap();
        assert_eq!(parsed.embed_key.as_deref(), Some("/tmp/key.enc"));
    }

    #[test]
    fn missing_flag_values_are_errors() {
        assert!(parse_args(&args(&["--target-os"])).is_err());
        assert!(parse_args(&args(&["--embed-key"])).is_err());
    }

    #[test]
    fn unknown_flags_are_rejected() {
        assert!(parse_args(&args(&["--frobnicate"])).is_err());
    }
}
