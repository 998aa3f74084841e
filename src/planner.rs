use crate::osinfo::OsProfile;
use crate::types::Reply;

/// Lines longer than this are treated as prose, not commands.
const MAX_COMMAND_LINE_LEN: usize = 300;

/// Heads that mark a line as command-shaped when the model mixes prose
/// and commands in one reply.
const COMMAND_PREFIXES: &[&str] = &[
    "git", "ls", "cd", "mkdir", "rm", "cp", "mv", "chmod", "chown", "sudo", "apt", "yum",
    "brew", "pip", "npm", "docker", "systemctl", "service", "ps", "top", "df", "du", "find",
    "grep", "awk", "sed", "tar", "gzip", "curl", "wget", "ssh", "scp", "rsync", "cat", "less",
    "tail", "head", "sort", "uniq", "wc", "which", "whereis", "locate", "mount", "umount",
    "fdisk", "lsblk", "free", "vmstat", "netstat", "ss", "iptables", "ufw", "firewall-cmd",
    "crontab", "at", "nohup",
];

/// Phrases the model uses when it slips into narration despite the
/// command-only instruction.
const EXPLANATORY_PHRASES: &[&str] = &[
    "since this is",
    "i'll provide",
    "here is",
    "here are",
    "this command",
    "the command",
    "explanation:",
    "note:",
    "to do this",
    "you can use",
    "this will",
    "the following",
];

pub fn build_system_prompt(os: &OsProfile) -> String {
    format!(
        r#"You are a Unix/Linux system administration expert assistant. You can help users in two ways:

1. ANSWER QUESTIONS: When users ask questions about Unix/Linux systems, tools, concepts, or administration, provide detailed, helpful explanations.

2. GENERATE COMMANDS: When users request actions to be performed, generate the appropriate bash commands for their system.

Your target system: {description}

For QUESTIONS (like "what is docker?", "how does SSH work?", "where are config files?"):
- Provide detailed explanations in clear English
- Include practical examples and file locations
- Mention OS-specific differences when relevant
- If you need current information, use web search

For COMMAND REQUESTS (like "show disk usage", "find large files", "restart service"):
- Return ONLY the executable commands, one per line
- ABSOLUTELY NO explanations, comments, descriptions, or introductory text
- NEVER include markdown formatting, backticks, or code blocks
- Use commands that work specifically on {description}
- Be precise and safe - avoid destructive operations unless explicitly requested
- Use appropriate flags for safety (e.g., -i for interactive, -v for verbose)

CRITICAL: If the user is requesting an action (not asking a question), respond with ONLY the commands. No explanatory text whatsoever.

OS-Specific Command Guidelines for {description}:
- Memory information: {memory}
- Process listing: {process}
- Network information: {network}
- Disk usage: {disk}
- Service management: {service}
- Package management: {package}
- User management: {user_add}

Examples:
User: "show disk usage"
Response: {disk}

User: "set origin remote URL to git@github.com:user/repo.git"
Response: git remote set-url origin git@github.com:user/repo.git

Determine the user's intent and respond appropriately."#,
        description = os.description,
        memory = os.memory_cmd,
        process = os.process_cmd,
        network = os.network_cmd,
        disk = os.disk_cmd,
        service = os.service_cmd,
        package = os.package_manager,
        user_add = os.user_add,
    )
}

fn is_explanatory(line: &str) -> bool {
    if line.starts_with('#') || line.ends_with(':') || line.len() > MAX_COMMAND_LINE_LEN {
        return true;
    }
    let lower = line.to_lowercase();
    EXPLANATORY_PHRASES.iter().any(|p| lower.contains(p))
}

fn looks_like_command(line: &str) -> bool {
    if line.chars().next().is_some_and(|c| c.is_uppercase()) {
        return false;
    }
    let head_match = COMMAND_PREFIXES
        .iter()
        .any(|p| line == *p || line.starts_with(&format!("{} ", p)));
    head_match || line.contains('|') || line.starts_with("./") || line.starts_with("~/")
}

/// Split the model's reply into command-shaped lines and prose, then
/// decide which kind of reply it is. Intent detection itself is the
/// model's job; this only cleans up mixed output.
pub fn parse_reply(content: &str) -> Reply {
    let content = content.trim();
    let mut commands = Vec::new();
    let mut explanatory = 0usize;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if is_explanatory(line) {
            explanatory += 1;
        } else if looks_like_command(line) {
            commands.push(line.to_string());
        } else {
            explanatory += 1;
        }
    }

    if !commands.is_empty() && commands.len() >= explanatory {
        Reply::Commands(commands)
    } else {
        Reply::Answer(content.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_command_reply_is_commands() {
        match parse_reply("df -h\n") {
            Reply::Commands(cmds) => assert_eq!(cmds, vec!["df -h"]),
            Reply::Answer(_) => panic!("expected commands"),
        }
    }

    #[test]
    fn multi_command_reply_keeps_order() {
        let reply = parse_reply("mkdir -p /tmp/backup\ntar -czf /tmp/backup/etc.tar.gz /etc\n");
        match reply {
            Reply::Commands(cmds) => {
                assert_eq!(cmds.len(), 2);
                assert!(cmds[0].starts_with("mkdir"));
            }
            Reply::Answer(_) => panic!("expected commands"),
        }
    }

    #[test]
    fn prose_reply_is_an_answer() {
        let text = "Docker is a containerization platform.\n\
                    It packages applications with their dependencies.\n\
                    Configuration lives under /etc/docker on most systems.";
        match parse_reply(text) {
            Reply::Answer(answer) => assert!(answer.contains("containerization")),
            Reply::Commands(_) => panic!("expected an answer"),
        }
    }

    #[test]
    fn narration_lines_are_filtered_from_command_batches() {
        let text = "Here is the command you need:\ndf -h\ndu -sh /var";
        match parse_reply(text) {
            Reply::Commands(cmds) => assert_eq!(cmds, vec!["df -h", "du -sh /var"]),
            Reply::Answer(_) => panic!("expected commands"),
        }
    }

    #[test]
    fn comment_heavy_reply_falls_back_to_answer() {
        let text = "# step one\n# step two\n# step three\nls";
        match parse_reply(text) {
            Reply::Answer(_) => {}
            Reply::Commands(_) => panic!("expected an answer"),
        }
    }

    #[test]
    fn piped_lines_count_as_commands() {
        match parse_reply("ps aux | sort -rk 3 | head -5") {
            Reply::Commands(cmds) => assert_eq!(cmds.len(), 1),
            Reply::Answer(_) => panic!("expected commands"),
        }
    }
}
