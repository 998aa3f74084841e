use std::fs;

/// Per-OS command hints fed into the system prompt so the model answers
/// with tools that actually exist on the target machine.
#[derive(Debug, Clone, Copy)]
pub struct OsProfile {
    pub name: &'static str,
    pub description: &'static str,
    pub memory_cmd: &'static str,
    pub process_cmd: &'static str,
    pub network_cmd: &'static str,
    pub disk_cmd: &'static str,
    pub service_cmd: &'static str,
    pub package_manager: &'static str,
    pub user_add: &'static str,
}

static PROFILES: &[OsProfile] = &[
    OsProfile {
        name: "macos",
        description: "macOS (Darwin)",
        memory_cmd: "vm_stat",
        process_cmd: "ps aux",
        network_cmd: "netstat -rn",
        disk_cmd: "df -h",
        service_cmd: "launchctl list",
        package_manager: "brew",
        user_add: "dscl . create",
    },
    OsProfile {
        name: "linux-ubuntu",
        description: "Ubuntu Linux",
        memory_cmd: "free -h",
        process_cmd: "ps aux",
        network_cmd: "ss -tuln",
        disk_cmd: "df -h",
        service_cmd: "systemctl",
        package_manager: "apt",
        user_add: "useradd",
    },
    OsProfile {
        name: "linux-debian",
        description: "Debian Linux",
        memory_cmd: "free -h",
        process_cmd: "ps aux",
        network_cmd: "ss -tuln",
        disk_cmd: "df -h",
        service_cmd: "systemctl",
        package_manager: "apt",
        user_add: "useradd",
    },
    OsProfile {
        name: "linux-centos",
        description: "CentOS Linux",
        memory_cmd: "free -h",
        process_cmd: "ps aux",
        network_cmd: "ss -tuln",
        disk_cmd: "df -h",
        service_cmd: "systemctl",
        package_manager: "yum",
        user_add: "useradd",
    },
    OsProfile {
        name: "linux-rhel",
        description: "Red Hat Enterprise Linux",
        memory_cmd: "free -h",
        process_cmd: "ps aux",
        network_cmd: "ss -tuln",
        disk_cmd: "df -h",
        service_cmd: "systemctl",
        package_manager: "yum",
        user_add: "useradd",
    },
    OsProfile {
        name: "linux-arch",
        description: "Arch Linux",
        memory_cmd: "free -h",
        process_cmd: "ps aux",
        network_cmd: "ss -tuln",
        disk_cmd: "df -h",
        service_cmd: "systemctl",
        package_manager: "pacman",
        user_add: "useradd",
    },
    OsProfile {
        name: "linux-generic",
        description: "Generic Linux",
        memory_cmd: "free -h",
        process_cmd: "ps aux",
        network_cmd: "netstat -tuln",
        disk_cmd: "df -h",
        service_cmd: "service",
        package_manager: "package manager",
        user_add: "useradd",
    },
    OsProfile {
        name: "freebsd",
        description: "FreeBSD",
        memory_cmd: "top -n 1",
        process_cmd: "ps aux",
        network_cmd: "netstat -rn",
        disk_cmd: "df -h",
        service_cmd: "service",
        package_manager: "pkg",
        user_add: "pw useradd",
    },
    OsProfile {
        name: "unix-generic",
        description: "Generic Unix",
        memory_cmd: "top -n 1",
        process_cmd: "ps aux",
        network_cmd: "netstat -tuln",
        disk_cmd: "df -h",
        service_cmd: "service",
        package_manager: "package manager",
        user_add: "adduser",
    },
];

/// Look up the profile for a target name. Unknown `linux-*` targets get
/// the generic Linux profile; anything else falls back to generic Unix.
pub fn profile_for(target: &str) -> &'static OsProfile {
    if let Some(profile) = PROFILES.iter().find(|p| p.name == target) {
        return profile;
    }
    let fallback = if target.starts_with("linux-") {
        "linux-generic"
    } else {
        "unix-generic"
    };
    PROFILES
        .iter()
        .find(|p| p.name == fallback)
        .unwrap_or(&PROFILES[PROFILES.len() - 1])
}

/// Detect the running OS, returning a target name usable with
/// [`profile_for`]. Linux distributions are identified from
/// /etc/os-release with the classic release-file fallbacks.
pub fn detect_os() -> String {
    match std::env::consts::OS {
        "macos" => "macos".to_string(),
        "linux" => detect_linux(),
        os @ ("freebsd" | "openbsd" | "netbsd") => os.to_string(),
        _ => "unix-generic".to_string(),
    }
}

fn detect_linux() -> String {
    if let Ok(content) = fs::read_to_string("/etc/os-release") {
        for line in content.lines() {
            if let Some(id) = line.strip_prefix("ID=") {
                let distro = id.trim().trim_matches(|c| c == '"' || c == '\'');
                if !distro.is_empty() {
                    return format!("linux-{}", distro);
                }
            }
        }
    }
    if fs::metadata("/etc/redhat-release").is_ok() {
        "linux-rhel".to_string()
    } else if fs::metadata("/etc/debian_version").is_ok() {
        "linux-debian".to_string()
    } else if fs::metadata("/etc/arch-release").is_ok() {
        "linux-arch".to_string()
    } else {
        "linux-generic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_targets_resolve_exactly() {
        assert_eq!(profile_for("macos").package_manager, "brew");
        assert_eq!(profile_for("linux-arch").package_manager, "pacman");
        assert_eq!(profile_for("freebsd").user_add, "pw useradd");
    }

    #[test]
    fn unknown_linux_distro_falls_back_to_generic_linux() {
        let profile = profile_for("linux-gentoo");
        assert_eq!(profile.name, "linux-generic");
    }

    #[test]
    fn unknown_target_falls_back_to_generic_unix() {
        assert_eq!(profile_for("plan9").name, "unix-generic");
        assert_eq!(profile_for("").name, "unix-generic");
    }

    #[test]
    fn detect_os_names_a_known_profile_family() {
        let target = detect_os();
        // whatever the host is, the lookup must land on a real profile
        let profile = profile_for(&target);
        assert!(!profile.description.is_empty());
    }
}
