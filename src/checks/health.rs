//! System health probes: disk, memory, thermals, services, packages.

use crate::check::{CheckResult, CheckStatus, Probe, ProbeCtx};
use crate::error::Result;
use crate::fix::Remedy;

pub fn probes() -> Vec<Probe> {
    vec![
        Probe { name: "Disk Space", run: check_disk_space },
        Probe { name: "Memory Usage", run: check_memory },
        Probe { name: "CPU Temperature", run: check_cpu_temperature },
        Probe { name: "Swap Space", run: check_swap },
        Probe { name: "Failed Systemd Units", run: check_failed_units },
        Probe { name: "System Load", run: check_system_load },
        Probe { name: "Zombie Processes", run: check_zombie_processes },
        Probe { name: "Package Manager", run: check_package_manager },
        Probe { name: "Journal Errors", run: check_journal_errors },
        Probe { name: "Orphaned Packages", run: check_orphaned_packages },
    ]
}

/// Mountpoints of real block-device filesystems from /proc/mounts.
fn parse_mounts(contents: &str) -> Vec<String> {
    contents
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let device = fields.next()?;
            let mountpoint = fields.next()?;
            if device.starts_with("/dev") && !mountpoint.starts_with("/snap") {
                Some(mountpoint.replace("\\040", " "))
            } else {
                None
            }
        })
        .collect()
}

fn filesystem_usage_percent(mountpoint: &std::path::Path) -> Option<f64> {
    let stat = nix::sys::statvfs::statvfs(mountpoint).ok()?;
    let total = stat.blocks();
    if total == 0 {
        return None;
    }
    let used = total.saturating_sub(stat.blocks_free());
    let usable = used + stat.blocks_available();
    if usable == 0 {
        return None;
    }
    Some(used as f64 / usable as f64 * 100.0)
}

fn check_disk_space(ctx: &ProbeCtx) -> Result<CheckResult> {
    let name = "Disk Space";
    let mounts = ctx.fs.read("proc/mounts")?;

    let mut warnings = Vec::new();
    let mut critical = Vec::new();
    let mut root_usage = None;

    for mountpoint in parse_mounts(&mounts) {
        // Resolve through the filesystem root so mock roots work.
        let resolved = ctx.fs.path(mountpoint.trim_start_matches('/'));
        let Some(percent) = filesystem_usage_percent(&resolved) else {
            continue;
        };
        if mountpoint == "/" {
            root_usage = Some(percent);
        }
        if percent >= 95.0 {
            critical.push(format!("{}: {:.0}% used", mountpoint, percent));
        } else if percent >= 85.0 {
            warnings.push(format!("{}: {:.0}% used", mountpoint, percent));
        }
    }

    if !critical.is_empty() {
        let mut details = critical.clone();
        details.extend(warnings);
        return Ok(CheckResult::new(
            name,
            CheckStatus::Fail,
            format!("Critical: {} partition(s) nearly full", critical.len()),
        )
        .details(details.join("\n"))
        .remedy(Remedy::CleanDisk));
    }
    if !warnings.is_empty() {
        return Ok(CheckResult::new(
            name,
            CheckStatus::Warn,
            format!("Warning: {} partition(s) above 85%", warnings.len()),
        )
        .details(warnings.join("\n"))
        .remedy(Remedy::CleanDisk));
    }

    let message = match root_usage {
        Some(percent) => format!("Root partition: {:.0}% used", percent),
        None => "No nearly-full partitions".to_string(),
    };
    Ok(CheckResult::new(name, CheckStatus::Pass, message))
}

/// Extract a field value in kB from /proc/meminfo.
fn meminfo_kb(contents: &str, field: &str) -> Option<u64> {
    contents.lines().find_map(|line| {
        let rest = line.strip_prefix(field)?.strip_prefix(':')?;
        rest.trim().split_whitespace().next()?.parse().ok()
    })
}

fn check_memory(ctx: &ProbeCtx) -> Result<CheckResult> {
    let name = "Memory Usage";
    let meminfo = ctx.fs.read("proc/meminfo")?;

    let (Some(total), Some(available)) = (
        meminfo_kb(&meminfo, "MemTotal"),
        meminfo_kb(&meminfo, "MemAvailable"),
    ) else {
        return Ok(CheckResult::new(
            name,
            CheckStatus::Error,
            "Could not parse /proc/meminfo",
        ));
    };
    if total == 0 {
        return Ok(CheckResult::new(name, CheckStatus::Error, "MemTotal is zero"));
    }

    let percent = (total.saturating_sub(available)) as f64 / total as f64 * 100.0;
    let available_gb = available as f64 / (1024.0 * 1024.0);

    let result = if percent >= 95.0 {
        CheckResult::new(
            name,
            CheckStatus::Fail,
            format!("Critical: {:.0}% RAM used", percent),
        )
        .details(format!("Only {:.1} GB available", available_gb))
    } else if percent >= 85.0 {
        CheckResult::new(
            name,
            CheckStatus::Warn,
            format!("Warning: {:.0}% RAM used", percent),
        )
        .details(format!("{:.1} GB available", available_gb))
    } else {
        CheckResult::new(
            name,
            CheckStatus::Pass,
            format!("{:.0}% used ({:.1} GB free)", percent, available_gb),
        )
    };
    Ok(result)
}

fn check_cpu_temperature(ctx: &ProbeCtx) -> Result<CheckResult> {
    let name = "CPU Temperature";

    let zones = match ctx.fs.list_dir("sys/class/thermal") {
        Ok(zones) => zones,
        Err(_) => {
            return Ok(CheckResult::new(
                name,
                CheckStatus::Skip,
                "Temperature sensors not available",
            ))
        }
    };

    let mut max_millideg: Option<i64> = None;
    for zone in zones.iter().filter(|z| z.starts_with("thermal_zone")) {
        if let Ok(Some(raw)) = ctx
            .fs
            .read_optional(format!("sys/class/thermal/{}/temp", zone))
        {
            if let Ok(value) = raw.trim().parse::<i64>() {
                max_millideg = Some(max_millideg.map_or(value, |m| m.max(value)));
            }
        }
    }

    let Some(millideg) = max_millideg else {
        return Ok(CheckResult::new(
            name,
            CheckStatus::Skip,
            "Temperature sensors not available",
        ));
    };
    let degrees = millideg as f64 / 1000.0;

    let result = if degrees >= 90.0 {
        CheckResult::new(name, CheckStatus::Fail, format!("Critical: {:.0}°C", degrees))
            .details("CPU is overheating")
    } else if degrees >= 75.0 {
        CheckResult::new(name, CheckStatus::Warn, format!("Warning: {:.0}°C", degrees))
            .details("CPU temperature is high")
    } else {
        CheckResult::new(name, CheckStatus::Pass, format!("{:.0}°C", degrees))
    };
    Ok(result)
}

fn check_swap(ctx: &ProbeCtx) -> Result<CheckResult> {
    let name = "Swap Space";
    let meminfo = ctx.fs.read("proc/meminfo")?;

    let (Some(total), Some(free)) = (
        meminfo_kb(&meminfo, "SwapTotal"),
        meminfo_kb(&meminfo, "SwapFree"),
    ) else {
        return Ok(CheckResult::new(
            name,
            CheckStatus::Error,
            "Could not parse swap fields",
        ));
    };

    if total == 0 {
        return Ok(CheckResult::new(name, CheckStatus::Warn, "No swap configured")
            .details("Consider adding swap for stability under memory pressure")
            .remedy(Remedy::CreateSwap));
    }

    let percent = total.saturating_sub(free) as f64 / total as f64 * 100.0;
    let total_gb = total as f64 / (1024.0 * 1024.0);

    let result = if percent >= 80.0 {
        CheckResult::new(name, CheckStatus::Warn, format!("Swap {:.0}% used", percent))
            .details(format!("{:.1} GB total swap", total_gb))
    } else {
        CheckResult::new(
            name,
            CheckStatus::Pass,
            format!("{:.1} GB configured, {:.0}% used", total_gb, percent),
        )
    };
    Ok(result)
}

fn parse_failed_units(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| {
            let unit = line.split_whitespace().next()?;
            // systemctl sometimes prefixes the line with a status dot.
            let unit = if unit == "●" || unit == "*" {
                line.split_whitespace().nth(1)?
            } else {
                unit
            };
            if unit.contains('.') {
                Some(unit.to_string())
            } else {
                None
            }
        })
        .collect()
}

fn check_failed_units(ctx: &ProbeCtx) -> Result<CheckResult> {
    let name = "Failed Systemd Units";
    let out = ctx.runner.run(
        "systemctl",
        &["--failed", "--no-legend", "--no-pager"],
        ctx.timeouts.probe,
    );

    if out.timed_out {
        return Ok(CheckResult::new(name, CheckStatus::Skip, "check timed out"));
    }
    if !out.success {
        return Ok(CheckResult::new(
            name,
            CheckStatus::Skip,
            "Unable to query systemd",
        ));
    }

    let failed = parse_failed_units(&out.output);
    if failed.is_empty() {
        return Ok(CheckResult::new(name, CheckStatus::Pass, "No failed units"));
    }
    Ok(CheckResult::new(
        name,
        CheckStatus::Fail,
        format!("{} failed unit(s)", failed.len()),
    )
    .details(failed.iter().take(5).cloned().collect::<Vec<_>>().join("\n"))
    .remedy(Remedy::ResetFailedUnits))
}

fn classify_load(load1: f64, cpus: usize) -> CheckStatus {
    let per_cpu = load1 / cpus.max(1) as f64;
    if per_cpu >= 2.0 {
        CheckStatus::Fail
    } else if per_cpu >= 1.0 {
        CheckStatus::Warn
    } else {
        CheckStatus::Pass
    }
}

fn check_system_load(ctx: &ProbeCtx) -> Result<CheckResult> {
    let name = "System Load";
    let loadavg = ctx.fs.read("proc/loadavg")?;

    let mut fields = loadavg.split_whitespace();
    let (Some(load1), Some(load5), Some(load15)) = (
        fields.next().and_then(|f| f.parse::<f64>().ok()),
        fields.next().and_then(|f| f.parse::<f64>().ok()),
        fields.next().and_then(|f| f.parse::<f64>().ok()),
    ) else {
        return Ok(CheckResult::new(
            name,
            CheckStatus::Error,
            "Could not parse /proc/loadavg",
        ));
    };

    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);

    let result = match classify_load(load1, cpus) {
        CheckStatus::Fail => CheckResult::new(
            name,
            CheckStatus::Fail,
            format!("High load: {:.2}", load1),
        )
        .details(format!(
            "Load avg: {:.2}, {:.2}, {:.2} ({} CPUs)",
            load1, load5, load15, cpus
        )),
        CheckStatus::Warn => CheckResult::new(
            name,
            CheckStatus::Warn,
            format!("Elevated load: {:.2}", load1),
        )
        .details(format!("Load avg: {:.2}, {:.2}, {:.2}", load1, load5, load15)),
        _ => CheckResult::new(
            name,
            CheckStatus::Pass,
            format!("Load: {:.2} ({} CPUs)", load1, cpus),
        ),
    };
    Ok(result)
}

/// Parse comm and state out of /proc/<pid>/stat. The comm field may
/// contain spaces and parens, so state is located after the last ')'.
fn parse_stat_state(stat: &str) -> Option<(String, char)> {
    let open = stat.find('(')?;
    let close = stat.rfind(')')?;
    let comm = stat.get(open + 1..close)?.to_string();
    let state = stat.get(close + 1..)?.split_whitespace().next()?.chars().next()?;
    Some((comm, state))
}

fn check_zombie_processes(ctx: &ProbeCtx) -> Result<CheckResult> {
    let name = "Zombie Processes";
    let entries = ctx.fs.list_dir("proc")?;

    let mut zombies = Vec::new();
    for entry in entries {
        if !entry.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        let Ok(Some(stat)) = ctx.fs.read_optional(format!("proc/{}/stat", entry)) else {
            continue; // process exited between listing and reading
        };
        if let Some((comm, state)) = parse_stat_state(&stat) {
            if state == 'Z' {
                zombies.push(format!("PID {}: {}", entry, comm));
            }
        }
    }

    if zombies.is_empty() {
        return Ok(CheckResult::new(name, CheckStatus::Pass, "No zombie processes"));
    }
    Ok(CheckResult::new(
        name,
        CheckStatus::Warn,
        format!("{} zombie process(es)", zombies.len()),
    )
    .details(zombies.iter().take(5).cloned().collect::<Vec<_>>().join("\n")))
}

fn check_package_manager(ctx: &ProbeCtx) -> Result<CheckResult> {
    let name = "Package Manager";
    if !ctx.runner.have("dnf") {
        return Ok(CheckResult::new(name, CheckStatus::Error, "dnf not found"));
    }

    let out = ctx
        .runner
        .run("dnf", &["check", "--quiet"], ctx.timeouts.package);

    if out.timed_out {
        return Ok(CheckResult::new(name, CheckStatus::Skip, "check timed out"));
    }
    if !out.success {
        let details = if out.output.trim().is_empty() {
            "Package database may be corrupted".to_string()
        } else {
            out.output.trim().chars().take(200).collect()
        };
        return Ok(CheckResult::new(name, CheckStatus::Fail, "dnf reports issues")
            .details(details)
            .remedy(Remedy::RepairPackageDb));
    }
    Ok(CheckResult::new(name, CheckStatus::Pass, "dnf is healthy"))
}

fn check_journal_errors(ctx: &ProbeCtx) -> Result<CheckResult> {
    let name = "Journal Errors";
    let out = ctx.runner.run(
        "journalctl",
        &["-p", "err", "-b", "--no-pager", "-q"],
        ctx.timeouts.probe,
    );

    if out.timed_out {
        return Ok(CheckResult::new(name, CheckStatus::Skip, "check timed out"));
    }
    if !out.success {
        return Ok(CheckResult::new(name, CheckStatus::Skip, "Unable to read journal"));
    }

    let count = out.output.lines().filter(|l| !l.trim().is_empty()).count();
    let result = if count > 100 {
        CheckResult::new(
            name,
            CheckStatus::Warn,
            format!("{} errors since boot", count),
        )
        .details("Many errors in journal. Check 'journalctl -p err -b'")
    } else if count > 0 {
        CheckResult::new(
            name,
            CheckStatus::Pass,
            format!("{} error(s) since boot", count),
        )
    } else {
        CheckResult::new(name, CheckStatus::Pass, "No errors since boot")
    };
    Ok(result)
}

fn check_orphaned_packages(ctx: &ProbeCtx) -> Result<CheckResult> {
    let name = "Orphaned Packages";
    let out = ctx.runner.run(
        "dnf",
        &["repoquery", "--extras", "--quiet"],
        ctx.timeouts.package,
    );

    if out.timed_out {
        return Ok(CheckResult::new(name, CheckStatus::Skip, "check timed out"));
    }
    if !out.success {
        return Ok(CheckResult::new(name, CheckStatus::Skip, "Unable to check"));
    }

    let count = out.output.lines().filter(|l| !l.trim().is_empty()).count();
    if count > 10 {
        return Ok(CheckResult::new(
            name,
            CheckStatus::Warn,
            format!("{} orphaned package(s)", count),
        )
        .details("Packages no longer present in any enabled repository")
        .remedy(Remedy::RemoveOrphans));
    }
    let message = if count == 0 {
        "No orphaned packages".to_string()
    } else {
        format!("{} orphaned package(s)", count)
    };
    Ok(CheckResult::new(name, CheckStatus::Pass, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::{CategoryKind, SessionInfo, Timeouts};
    use crate::exec::ScriptedRunner;
    use crate::sysroot::SysRoot;
    use std::fs;

    fn ctx<'a>(runner: &'a ScriptedRunner, fs_root: &'a SysRoot) -> ProbeCtx<'a> {
        ProbeCtx {
            runner,
            fs: fs_root,
            timeouts: Timeouts::default(),
            session: SessionInfo::default(),
        }
    }

    #[test]
    fn test_parse_mounts_filters_virtual_filesystems() {
        let contents = "\
proc /proc proc rw 0 0
/dev/nvme0n1p3 / btrfs rw 0 0
/dev/nvme0n1p1 /boot/efi vfat rw 0 0
tmpfs /tmp tmpfs rw 0 0
/dev/loop1 /snap/core/1 squashfs ro 0 0
";
        assert_eq!(parse_mounts(contents), vec!["/", "/boot/efi"]);
    }

    #[test]
    fn test_parse_mounts_unescapes_spaces() {
        let contents = "/dev/sdb1 /mnt/usb\\040drive ext4 rw 0 0\n";
        assert_eq!(parse_mounts(contents), vec!["/mnt/usb drive"]);
    }

    #[test]
    fn test_meminfo_kb() {
        let contents = "\
MemTotal:       16314828 kB
MemFree:         1878344 kB
MemAvailable:    8221128 kB
";
        assert_eq!(meminfo_kb(contents, "MemTotal"), Some(16314828));
        assert_eq!(meminfo_kb(contents, "MemAvailable"), Some(8221128));
        // "Mem" must not match "MemTotal".
        assert_eq!(meminfo_kb(contents, "SwapTotal"), None);
    }

    #[test]
    fn test_memory_thresholds() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("proc")).unwrap();
        fs::write(
            tmp.path().join("proc/meminfo"),
            "MemTotal: 1000000 kB\nMemAvailable: 30000 kB\n",
        )
        .unwrap();

        let runner = ScriptedRunner::new();
        let fs_root = SysRoot::new(tmp.path());
        let result = check_memory(&ctx(&runner, &fs_root)).unwrap();
        assert_eq!(result.status, CheckStatus::Fail);

        fs::write(
            tmp.path().join("proc/meminfo"),
            "MemTotal: 1000000 kB\nMemAvailable: 600000 kB\n",
        )
        .unwrap();
        let result = check_memory(&ctx(&runner, &fs_root)).unwrap();
        assert_eq!(result.status, CheckStatus::Pass);
    }

    #[test]
    fn test_no_swap_warns_with_remedy() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("proc")).unwrap();
        fs::write(
            tmp.path().join("proc/meminfo"),
            "SwapTotal: 0 kB\nSwapFree: 0 kB\n",
        )
        .unwrap();

        let runner = ScriptedRunner::new();
        let fs_root = SysRoot::new(tmp.path());
        let result = check_swap(&ctx(&runner, &fs_root)).unwrap();
        assert_eq!(result.status, CheckStatus::Warn);
        assert_eq!(result.remedy, Some(Remedy::CreateSwap));
    }

    #[test]
    fn test_cpu_temperature_from_thermal_zones() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("sys/class/thermal/thermal_zone0")).unwrap();
        fs::create_dir_all(tmp.path().join("sys/class/thermal/thermal_zone1")).unwrap();
        fs::create_dir_all(tmp.path().join("sys/class/thermal/cooling_device0")).unwrap();
        fs::write(
            tmp.path().join("sys/class/thermal/thermal_zone0/temp"),
            "45000\n",
        )
        .unwrap();
        fs::write(
            tmp.path().join("sys/class/thermal/thermal_zone1/temp"),
            "91000\n",
        )
        .unwrap();

        let runner = ScriptedRunner::new();
        let fs_root = SysRoot::new(tmp.path());
        let result = check_cpu_temperature(&ctx(&runner, &fs_root)).unwrap();
        assert_eq!(result.status, CheckStatus::Fail);
        assert!(result.message.contains("91"));
    }

    #[test]
    fn test_cpu_temperature_skips_without_sensors() {
        let tmp = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner::new();
        let fs_root = SysRoot::new(tmp.path());
        let result = check_cpu_temperature(&ctx(&runner, &fs_root)).unwrap();
        assert_eq!(result.status, CheckStatus::Skip);
    }

    #[test]
    fn test_parse_failed_units() {
        let output = "\
● crond.service loaded failed failed Command Scheduler
  nginx.service loaded failed failed Web server
";
        assert_eq!(
            parse_failed_units(output),
            vec!["crond.service", "nginx.service"]
        );
        assert!(parse_failed_units("").is_empty());
    }

    #[test]
    fn test_failed_units_timeout_is_skip() {
        let runner =
            ScriptedRunner::new().respond_timeout("systemctl --failed --no-legend --no-pager");
        let tmp = tempfile::tempdir().unwrap();
        let fs_root = SysRoot::new(tmp.path());
        let result = check_failed_units(&ctx(&runner, &fs_root)).unwrap();
        assert_eq!(result.status, CheckStatus::Skip);
        assert_eq!(result.message, "check timed out");
    }

    #[test]
    fn test_classify_load() {
        assert_eq!(classify_load(0.5, 4), CheckStatus::Pass);
        assert_eq!(classify_load(4.0, 4), CheckStatus::Warn);
        assert_eq!(classify_load(9.0, 4), CheckStatus::Fail);
        assert_eq!(classify_load(1.5, 1), CheckStatus::Warn);
    }

    #[test]
    fn test_parse_stat_state_with_parens_in_comm() {
        let stat = "1234 (Web (Content)) Z 1 1234 1234 0 -1";
        let (comm, state) = parse_stat_state(stat).unwrap();
        assert_eq!(comm, "Web (Content)");
        assert_eq!(state, 'Z');
    }

    #[test]
    fn test_zombie_detection() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("proc/100")).unwrap();
        fs::create_dir_all(tmp.path().join("proc/200")).unwrap();
        fs::create_dir_all(tmp.path().join("proc/self")).unwrap();
        fs::write(tmp.path().join("proc/100/stat"), "100 (sleeper) S 1 0 0").unwrap();
        fs::write(tmp.path().join("proc/200/stat"), "200 (undead) Z 1 0 0").unwrap();

        let runner = ScriptedRunner::new();
        let fs_root = SysRoot::new(tmp.path());
        let result = check_zombie_processes(&ctx(&runner, &fs_root)).unwrap();
        assert_eq!(result.status, CheckStatus::Warn);
        assert!(result.details.as_deref().unwrap().contains("undead"));
    }

    #[test]
    fn test_package_manager_missing_dnf_is_error() {
        let runner = ScriptedRunner::new();
        let tmp = tempfile::tempdir().unwrap();
        let fs_root = SysRoot::new(tmp.path());
        let result = check_package_manager(&ctx(&runner, &fs_root)).unwrap();
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.message, "dnf not found");
    }

    #[test]
    fn test_package_manager_failure_offers_repair() {
        let runner = ScriptedRunner::new()
            .respond("which dnf", true, "/usr/bin/dnf")
            .respond("dnf check --quiet", false, "duplicate packages found");
        let tmp = tempfile::tempdir().unwrap();
        let fs_root = SysRoot::new(tmp.path());
        let result = check_package_manager(&ctx(&runner, &fs_root)).unwrap();
        assert_eq!(result.status, CheckStatus::Fail);
        assert_eq!(result.remedy, Some(Remedy::RepairPackageDb));
    }

    #[test]
    fn test_journal_error_count_thresholds() {
        let many = "error line\n".repeat(150);
        let runner =
            ScriptedRunner::new().respond("journalctl -p err -b --no-pager -q", true, &many);
        let tmp = tempfile::tempdir().unwrap();
        let fs_root = SysRoot::new(tmp.path());
        let result = check_journal_errors(&ctx(&runner, &fs_root)).unwrap();
        assert_eq!(result.status, CheckStatus::Warn);

        let runner = ScriptedRunner::new().respond("journalctl -p err -b --no-pager -q", true, "");
        let result = check_journal_errors(&ctx(&runner, &fs_root)).unwrap();
        assert_eq!(result.status, CheckStatus::Pass);
        assert_eq!(result.message, "No errors since boot");
    }

    #[test]
    fn test_journal_timeout_is_skip() {
        let runner =
            ScriptedRunner::new().respond_timeout("journalctl -p err -b --no-pager -q");
        let tmp = tempfile::tempdir().unwrap();
        let fs_root = SysRoot::new(tmp.path());
        let result = check_journal_errors(&ctx(&runner, &fs_root)).unwrap();
        assert_eq!(result.status, CheckStatus::Skip);
        assert_eq!(result.message, "check timed out");
    }

    #[test]
    fn test_orphan_query_timeout_is_skip() {
        let runner = ScriptedRunner::new().respond_timeout("dnf repoquery --extras --quiet");
        let tmp = tempfile::tempdir().unwrap();
        let fs_root = SysRoot::new(tmp.path());
        let result = check_orphaned_packages(&ctx(&runner, &fs_root)).unwrap();
        assert_eq!(result.status, CheckStatus::Skip);
        assert_eq!(result.message, "check timed out");
    }

    #[test]
    fn test_orphaned_packages_threshold() {
        let orphans = (0..12)
            .map(|i| format!("pkg-{}-1.0\n", i))
            .collect::<String>();
        let runner =
            ScriptedRunner::new().respond("dnf repoquery --extras --quiet", true, &orphans);
        let tmp = tempfile::tempdir().unwrap();
        let fs_root = SysRoot::new(tmp.path());
        let result = check_orphaned_packages(&ctx(&runner, &fs_root)).unwrap();
        assert_eq!(result.status, CheckStatus::Warn);
        assert_eq!(result.remedy, Some(Remedy::RemoveOrphans));
    }

    #[test]
    fn test_health_category_shape() {
        let probes = probes();
        assert_eq!(probes.len(), 10);
        assert_eq!(probes[0].name, "Disk Space");
        assert_eq!(CategoryKind::Health.title(), "Health Check");
    }
}
