//! Security posture probes: firewall, SELinux, SSH, accounts, updates.

use crate::check::{CheckResult, CheckStatus, Probe, ProbeCtx};
use crate::error::Result;
use crate::fix::Remedy;

pub fn probes() -> Vec<Probe> {
    vec![
        Probe { name: "Firewall", run: check_firewall },
        Probe { name: "SELinux", run: check_selinux },
        Probe { name: "SSH Configuration", run: check_ssh_config },
        Probe { name: "Listening Ports", run: check_open_ports },
        Probe { name: "Failed Logins", run: check_failed_logins },
        Probe { name: "Root Account", run: check_root_account },
        Probe { name: "Sudo Configuration", run: check_sudo },
        Probe { name: "Automatic Updates", run: check_auto_updates },
        Probe { name: "Password Policy", run: check_password_policy },
        Probe { name: "File Permissions", run: check_file_permissions },
        Probe { name: "Kernel Hardening", run: check_kernel_security },
        Probe { name: "Antivirus", run: check_antivirus },
    ]
}

fn check_firewall(ctx: &ProbeCtx) -> Result<CheckResult> {
    let name = "Firewall";
    let out = ctx
        .runner
        .run("systemctl", &["is-active", "firewalld"], ctx.timeouts.probe);

    if !out.success || out.output.trim() != "active" {
        return Ok(CheckResult::new(name, CheckStatus::Fail, "firewalld is not running")
            .details("The system accepts whatever the kernel defaults allow")
            .remedy(Remedy::EnableFirewall));
    }

    let mut details = Vec::new();
    let zone = ctx
        .runner
        .run("firewall-cmd", &["--get-default-zone"], ctx.timeouts.probe);
    if zone.success {
        details.push(format!("Default zone: {}", zone.output.trim()));
    }
    let services = ctx
        .runner
        .run("firewall-cmd", &["--list-services"], ctx.timeouts.probe);
    if services.success && !services.output.trim().is_empty() {
        details.push(format!("Allowed services: {}", services.output.trim()));
    }

    let mut result = CheckResult::new(name, CheckStatus::Pass, "firewalld is active");
    if !details.is_empty() {
        result = result.details(details.join("\n"));
    }
    Ok(result)
}

fn check_selinux(ctx: &ProbeCtx) -> Result<CheckResult> {
    let name = "SELinux";
    let out = ctx.runner.run("getenforce", &[], ctx.timeouts.probe);
    if !out.success {
        return Ok(CheckResult::new(name, CheckStatus::Skip, "SELinux tools not available"));
    }

    let result = match out.output.trim() {
        "Enforcing" => CheckResult::new(name, CheckStatus::Pass, "Enforcing"),
        "Permissive" => CheckResult::new(name, CheckStatus::Warn, "Permissive mode")
            .details("Violations are logged but not blocked")
            .remedy(Remedy::EnforceSelinux),
        other => CheckResult::new(name, CheckStatus::Fail, format!("SELinux is {}", other))
            .remedy(Remedy::EnforceSelinux),
    };
    Ok(result)
}

/// Effective sshd settings we care about: first occurrence wins, comments
/// and Match blocks aside, which matches how sshd itself reads the file.
fn audit_sshd_config(config: &str) -> Vec<&'static str> {
    let mut root_login = None;
    let mut empty_passwords = None;

    for line in config.lines() {
        let line = line.trim();
        if line.starts_with('#') {
            continue;
        }
        let mut fields = line.split_whitespace();
        let (Some(key), Some(value)) = (fields.next(), fields.next()) else {
            continue;
        };
        match key.to_lowercase().as_str() {
            "permitrootlogin" if root_login.is_none() => {
                root_login = Some(value.to_lowercase());
            }
            "permitemptypasswords" if empty_passwords.is_none() => {
                empty_passwords = Some(value.to_lowercase());
            }
            _ => {}
        }
    }

    let mut findings = Vec::new();
    if root_login.as_deref() == Some("yes") {
        findings.push("PermitRootLogin is enabled");
    }
    if empty_passwords.as_deref() == Some("yes") {
        findings.push("PermitEmptyPasswords is enabled");
    }
    findings
}

fn check_ssh_config(ctx: &ProbeCtx) -> Result<CheckResult> {
    let name = "SSH Configuration";
    let Some(config) = ctx.fs.read_optional("etc/ssh/sshd_config")? else {
        return Ok(CheckResult::new(name, CheckStatus::Skip, "sshd not installed"));
    };

    let findings = audit_sshd_config(&config);
    if findings.is_empty() {
        return Ok(CheckResult::new(name, CheckStatus::Pass, "sshd configuration looks sane"));
    }
    Ok(CheckResult::new(
        name,
        CheckStatus::Warn,
        format!("{} risky sshd setting(s)", findings.len()),
    )
    .details(findings.join("\n"))
    .remedy(Remedy::HardenSsh))
}

/// Ports listening on non-loopback addresses, from `ss -tuln` output.
fn parse_listen_ports(ss: &str) -> Vec<u16> {
    let mut ports = Vec::new();
    for line in ss.lines().skip(1) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        // Netid State Recv-Q Send-Q Local-Address:Port Peer
        let Some(local) = fields.get(4) else { continue };
        let Some((addr, port)) = local.rsplit_once(':') else {
            continue;
        };
        if addr.starts_with("127.") || addr == "[::1]" {
            continue;
        }
        if let Ok(port) = port.parse::<u16>() {
            if !ports.contains(&port) {
                ports.push(port);
            }
        }
    }
    ports.sort_unstable();
    ports
}

fn check_open_ports(ctx: &ProbeCtx) -> Result<CheckResult> {
    let name = "Listening Ports";
    let out = ctx.runner.run("ss", &["-tuln"], ctx.timeouts.probe);
    if !out.success {
        return Ok(CheckResult::new(name, CheckStatus::Skip, "ss not available"));
    }

    const SAFE: [u16; 3] = [22, 631, 5353];
    let ports = parse_listen_ports(&out.output);
    let unexpected: Vec<u16> = ports
        .iter()
        .copied()
        .filter(|p| !SAFE.contains(p))
        .collect();

    if unexpected.len() > 5 {
        return Ok(CheckResult::new(
            name,
            CheckStatus::Warn,
            format!("{} services listening on external addresses", unexpected.len()),
        )
        .details(format!(
            "Ports: {}",
            unexpected
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        )));
    }
    Ok(CheckResult::new(
        name,
        CheckStatus::Pass,
        format!("{} external listening port(s)", unexpected.len()),
    ))
}

fn check_failed_logins(ctx: &ProbeCtx) -> Result<CheckResult> {
    let name = "Failed Logins";
    let out = ctx.runner.run(
        "journalctl",
        &["-u", "sshd", "--since", "24 hours ago", "--no-pager", "-q"],
        ctx.timeouts.probe,
    );

    let count = if out.success {
        out.output
            .lines()
            .filter(|l| l.contains("Failed password") || l.contains("Invalid user"))
            .count()
    } else {
        let lastb = ctx.runner.run("lastb", &["-s", "-24hours"], ctx.timeouts.probe);
        if !lastb.success {
            return Ok(CheckResult::new(name, CheckStatus::Skip, "Unable to read login records"));
        }
        lastb
            .output
            .lines()
            .filter(|l| !l.trim().is_empty() && !l.starts_with("btmp"))
            .count()
    };

    if count > 50 {
        return Ok(CheckResult::new(
            name,
            CheckStatus::Warn,
            format!("{} failed login attempts in 24h", count),
        )
        .details("The machine may be under a brute-force attempt")
        .remedy(Remedy::InstallFail2ban));
    }
    Ok(CheckResult::new(
        name,
        CheckStatus::Pass,
        format!("{} failed attempt(s) in 24h", count),
    ))
}

fn check_root_account(ctx: &ProbeCtx) -> Result<CheckResult> {
    let name = "Root Account";
    let Some(shadow) = ctx.fs.read_optional("etc/shadow")? else {
        return Ok(CheckResult::new(name, CheckStatus::Skip, "Cannot read /etc/shadow"));
    };

    let Some(hash) = shadow.lines().find_map(|l| {
        let mut fields = l.split(':');
        (fields.next()? == "root").then(|| fields.next().unwrap_or("").to_string())
    }) else {
        return Ok(CheckResult::new(name, CheckStatus::Error, "No root entry in shadow"));
    };

    if matches!(hash.as_str(), "" | "*" | "!" | "!!" | "!*") {
        return Ok(CheckResult::new(name, CheckStatus::Pass, "Root password login disabled"));
    }
    Ok(CheckResult::new(name, CheckStatus::Warn, "Root has a password set")
        .details("Prefer sudo from a wheel-group user over direct root login"))
}

fn check_sudo(ctx: &ProbeCtx) -> Result<CheckResult> {
    let name = "Sudo Configuration";

    let mut nopasswd = Vec::new();
    let mut check_file = |label: String, contents: &str| {
        for line in contents.lines() {
            let line = line.trim();
            if !line.starts_with('#') && line.contains("NOPASSWD") {
                nopasswd.push(label.clone());
                break;
            }
        }
    };

    let mut readable = false;
    if let Some(sudoers) = ctx.fs.read_optional("etc/sudoers")? {
        readable = true;
        check_file("/etc/sudoers".to_string(), &sudoers);
    }
    if let Ok(entries) = ctx.fs.list_dir("etc/sudoers.d") {
        for entry in entries {
            if let Some(contents) =
                ctx.fs.read_optional(format!("etc/sudoers.d/{}", entry))?
            {
                readable = true;
                check_file(format!("/etc/sudoers.d/{}", entry), &contents);
            }
        }
    }

    if !readable {
        return Ok(CheckResult::new(name, CheckStatus::Skip, "Cannot read sudoers files"));
    }
    if !nopasswd.is_empty() {
        return Ok(CheckResult::new(
            name,
            CheckStatus::Warn,
            "Passwordless sudo is configured",
        )
        .details(nopasswd.join("\n")));
    }
    Ok(CheckResult::new(name, CheckStatus::Pass, "sudo requires a password"))
}

fn check_auto_updates(ctx: &ProbeCtx) -> Result<CheckResult> {
    let name = "Automatic Updates";

    for timer in ["dnf-automatic.timer", "dnf5-automatic.timer", "packagekit-offline-update.service"] {
        let out = ctx
            .runner
            .run("systemctl", &["is-enabled", timer], ctx.timeouts.probe);
        if out.success && out.output.trim() == "enabled" {
            return Ok(CheckResult::new(
                name,
                CheckStatus::Pass,
                format!("{} is enabled", timer),
            ));
        }
    }

    Ok(CheckResult::new(name, CheckStatus::Warn, "No automatic updates configured")
        .details("Security patches require a manual dnf upgrade")
        .remedy(Remedy::EnableAutoUpdates))
}

fn parse_minlen(pwquality: &str) -> Option<u32> {
    pwquality.lines().find_map(|line| {
        let line = line.trim();
        if line.starts_with('#') {
            return None;
        }
        let (key, value) = line.split_once('=')?;
        if key.trim() == "minlen" {
            value.trim().parse().ok()
        } else {
            None
        }
    })
}

fn check_password_policy(ctx: &ProbeCtx) -> Result<CheckResult> {
    let name = "Password Policy";
    let Some(config) = ctx.fs.read_optional("etc/security/pwquality.conf")? else {
        return Ok(CheckResult::new(name, CheckStatus::Warn, "No password quality policy")
            .remedy(Remedy::Command("dnf install -y libpwquality".to_string())));
    };

    let result = match parse_minlen(&config) {
        Some(minlen) if minlen >= 8 => CheckResult::new(
            name,
            CheckStatus::Pass,
            format!("Minimum password length: {}", minlen),
        ),
        Some(minlen) => CheckResult::new(
            name,
            CheckStatus::Warn,
            format!("Weak minimum password length: {}", minlen),
        ),
        // pwquality defaults to minlen = 8 when unset.
        None => CheckResult::new(name, CheckStatus::Pass, "Default policy (minlen 8)"),
    };
    Ok(result)
}

const PERMISSION_TABLE: [(&str, u32); 4] = [
    ("etc/passwd", 0o644),
    ("etc/shadow", 0o000),
    ("etc/gshadow", 0o000),
    ("etc/sudoers", 0o440),
];

fn check_file_permissions(ctx: &ProbeCtx) -> Result<CheckResult> {
    let name = "File Permissions";

    let mut wrong = Vec::new();
    let mut seen = 0;
    for (path, expected) in PERMISSION_TABLE {
        let Some(mode) = ctx.fs.mode(path) else { continue };
        seen += 1;
        // Flag only permission bits beyond the expected set; a stricter
        // mode is fine.
        if mode & !expected != 0 {
            wrong.push(format!("/{}: {:03o} (expected {:03o})", path, mode, expected));
        }
    }

    if seen == 0 {
        return Ok(CheckResult::new(name, CheckStatus::Skip, "Sensitive files not visible"));
    }
    if !wrong.is_empty() {
        return Ok(CheckResult::new(
            name,
            CheckStatus::Warn,
            format!("{} file(s) more permissive than expected", wrong.len()),
        )
        .details(wrong.join("\n"))
        .remedy(Remedy::FixFilePermissions));
    }
    Ok(CheckResult::new(name, CheckStatus::Pass, "Sensitive file permissions are correct"))
}

const SYSCTL_TABLE: [(&str, &str, &str); 3] = [
    ("proc/sys/net/ipv4/ip_forward", "0", "IP forwarding enabled"),
    ("proc/sys/net/ipv4/conf/all/rp_filter", "1", "Reverse path filtering off"),
    ("proc/sys/kernel/randomize_va_space", "2", "ASLR not fully enabled"),
];

fn check_kernel_security(ctx: &ProbeCtx) -> Result<CheckResult> {
    let name = "Kernel Hardening";

    let mut findings = Vec::new();
    let mut seen = 0;
    for (path, expected, finding) in SYSCTL_TABLE {
        let Some(value) = ctx.fs.read_optional(path)? else { continue };
        seen += 1;
        if value.trim() != expected {
            findings.push(finding.to_string());
        }
    }

    if seen == 0 {
        return Ok(CheckResult::new(name, CheckStatus::Skip, "sysctl values not visible"));
    }
    if !findings.is_empty() {
        return Ok(CheckResult::new(
            name,
            CheckStatus::Warn,
            format!("{} kernel setting(s) weaker than recommended", findings.len()),
        )
        .details(findings.join("\n")));
    }
    Ok(CheckResult::new(name, CheckStatus::Pass, "Kernel hardening settings look good"))
}

fn check_antivirus(ctx: &ProbeCtx) -> Result<CheckResult> {
    let name = "Antivirus";
    if !ctx.runner.have("clamscan") {
        // Optional on the desktop, hence Skip rather than Warn, but still
        // offer the install for those who want it.
        return Ok(CheckResult::new(name, CheckStatus::Skip, "ClamAV not installed")
            .remedy(Remedy::InstallClamav));
    }

    let out = ctx.runner.run(
        "systemctl",
        &["is-active", "clamav-freshclam"],
        ctx.timeouts.probe,
    );
    if out.success && out.output.trim() == "active" {
        return Ok(CheckResult::new(name, CheckStatus::Pass, "ClamAV with fresh definitions"));
    }
    Ok(CheckResult::new(
        name,
        CheckStatus::Warn,
        "ClamAV installed but definitions not updating",
    )
    .remedy(Remedy::InstallClamav))
}
