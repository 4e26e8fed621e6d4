//! Hardware driver probes: GPU, network, audio, peripherals, firmware.

use crate::check::{CheckResult, CheckStatus, Probe, ProbeCtx};
use crate::error::Result;
use crate::fix::Remedy;

pub fn probes() -> Vec<Probe> {
    vec![
        Probe { name: "Graphics Driver", run: check_gpu },
        Probe { name: "WiFi Adapter", run: check_wifi },
        Probe { name: "Audio Devices", run: check_audio },
        Probe { name: "Bluetooth", run: check_bluetooth },
        Probe { name: "USB Controllers", run: check_usb },
        Probe { name: "Ethernet", run: check_ethernet },
        Probe { name: "Webcam", run: check_webcam },
        Probe { name: "Device Firmware", run: check_firmware },
        Probe { name: "Kernel Driver Errors", run: check_kernel_modules },
        Probe { name: "Video Acceleration", run: check_hw_accel },
    ]
}

#[derive(Debug, PartialEq)]
enum GpuVerdict {
    /// Vendor string plus the kernel driver in use.
    Good(String, String),
    NouveauOnNvidia,
    NvidiaNoDriver,
    UnknownDriver(String),
    NoGpu,
}

/// Classify lspci -nnk output: find VGA/3D/Display controller blocks and
/// the "Kernel driver in use" line that follows each.
fn parse_gpu(lspci: &str) -> GpuVerdict {
    let lines: Vec<&str> = lspci.lines().collect();
    let mut devices = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        let is_gpu = ["VGA compatible controller", "3D controller", "Display controller"]
            .iter()
            .any(|kind| line.contains(kind));
        if !is_gpu {
            continue;
        }
        let mut driver = None;
        // Continuation lines for this device are indented.
        for follow in lines[i + 1..].iter().take_while(|l| l.starts_with(['\t', ' '])) {
            if let Some(rest) = follow.trim().strip_prefix("Kernel driver in use:") {
                driver = Some(rest.trim().to_string());
            }
        }
        devices.push((line.to_string(), driver));
    }

    if devices.is_empty() {
        return GpuVerdict::NoGpu;
    }

    // Judge the discrete NVIDIA card first when present; otherwise the
    // first GPU found.
    let nvidia = devices.iter().find(|(desc, _)| desc.contains("NVIDIA"));
    if let Some((_, driver)) = nvidia {
        return match driver.as_deref() {
            Some("nvidia") => GpuVerdict::Good("NVIDIA".into(), "nvidia".into()),
            Some("nouveau") => GpuVerdict::NouveauOnNvidia,
            _ => GpuVerdict::NvidiaNoDriver,
        };
    }

    let (desc, driver) = &devices[0];
    let vendor = if desc.contains("AMD") || desc.contains("ATI") {
        "AMD"
    } else if desc.contains("Intel") {
        "Intel"
    } else {
        "Unknown"
    };
    match driver.as_deref() {
        Some(d @ ("amdgpu" | "radeon" | "i915" | "xe")) => {
            GpuVerdict::Good(vendor.into(), d.into())
        }
        Some(d) => GpuVerdict::UnknownDriver(d.into()),
        None => GpuVerdict::UnknownDriver("none".into()),
    }
}

fn check_gpu(ctx: &ProbeCtx) -> Result<CheckResult> {
    let name = "Graphics Driver";
    let out = ctx.runner.run("lspci", &["-nnk"], ctx.timeouts.probe);
    if !out.success {
        return Ok(CheckResult::new(name, CheckStatus::Skip, "lspci not available"));
    }

    let result = match parse_gpu(&out.output) {
        GpuVerdict::Good(vendor, driver) => CheckResult::new(
            name,
            CheckStatus::Pass,
            format!("{} GPU using {} driver", vendor, driver),
        ),
        GpuVerdict::NouveauOnNvidia => CheckResult::new(
            name,
            CheckStatus::Warn,
            "NVIDIA GPU using the nouveau driver",
        )
        .details("The proprietary driver usually performs much better")
        .remedy(Remedy::InstallNvidiaDriver),
        GpuVerdict::NvidiaNoDriver => CheckResult::new(
            name,
            CheckStatus::Fail,
            "NVIDIA GPU has no driver loaded",
        )
        .remedy(Remedy::InstallNvidiaDriver),
        GpuVerdict::UnknownDriver(driver) => CheckResult::new(
            name,
            CheckStatus::Warn,
            format!("GPU using unrecognized driver: {}", driver),
        ),
        GpuVerdict::NoGpu => {
            CheckResult::new(name, CheckStatus::Skip, "No GPU detected")
        }
    };
    Ok(result)
}

/// Wireless interface names from `ip -o link` output.
fn parse_wireless_interfaces(ip_link: &str) -> Vec<String> {
    ip_link
        .lines()
        .filter_map(|line| {
            // "3: wlp3s0: <BROADCAST,..." — second field, colon-terminated.
            let iface = line.split_whitespace().nth(1)?.trim_end_matches(':');
            if iface.starts_with("wl") {
                Some(iface.to_string())
            } else {
                None
            }
        })
        .collect()
}

fn rfkill_soft_blocked(ctx: &ProbeCtx, kind: &str) -> bool {
    let out = ctx.runner.run("rfkill", &["list", kind], ctx.timeouts.probe);
    out.success
        && out
            .output
            .lines()
            .any(|l| l.trim().eq_ignore_ascii_case("Soft blocked: yes"))
}

fn check_wifi(ctx: &ProbeCtx) -> Result<CheckResult> {
    let name = "WiFi Adapter";
    let out = ctx.runner.run("ip", &["-o", "link"], ctx.timeouts.probe);
    if !out.success {
        return Ok(CheckResult::new(name, CheckStatus::Skip, "Unable to list interfaces"));
    }

    let interfaces = parse_wireless_interfaces(&out.output);
    if interfaces.is_empty() {
        // Hardware present but no interface means missing firmware/driver.
        let pci = ctx.runner.run("lspci", &[], ctx.timeouts.probe);
        if pci.success
            && pci.output.lines().any(|l| {
                l.contains("Network controller") && l.to_lowercase().contains("wireless")
            })
        {
            return Ok(CheckResult::new(
                name,
                CheckStatus::Fail,
                "Wireless hardware present but no interface",
            )
            .details("The kernel likely lacks firmware for this adapter")
            .remedy(Remedy::InstallWifiFirmware));
        }
        return Ok(CheckResult::new(name, CheckStatus::Skip, "No WiFi hardware"));
    }

    if rfkill_soft_blocked(ctx, "wifi") {
        return Ok(CheckResult::new(name, CheckStatus::Warn, "WiFi is soft-blocked")
            .remedy(Remedy::UnblockWifi));
    }

    let iface = &interfaces[0];
    let driver = std::fs::read_link(
        ctx.fs.path(format!("sys/class/net/{}/device/driver", iface)),
    )
    .ok()
    .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()));

    let message = match driver {
        Some(driver) => format!("{} using {} driver", iface, driver),
        None => format!("{} is up", iface),
    };
    Ok(CheckResult::new(name, CheckStatus::Pass, message))
}

fn check_audio(ctx: &ProbeCtx) -> Result<CheckResult> {
    let name = "Audio Devices";
    let cards = ctx.fs.read_optional("proc/asound/cards")?;

    let no_cards = match &cards {
        None => true,
        Some(contents) => {
            contents.trim().is_empty() || contents.contains("no soundcards")
        }
    };
    if no_cards {
        return Ok(CheckResult::new(name, CheckStatus::Fail, "No sound cards detected")
            .details("ALSA reports no devices; firmware may be missing")
            .remedy(Remedy::InstallAudioFirmware));
    }

    let card_count = cards
        .as_deref()
        .unwrap_or_default()
        .lines()
        .filter(|l| l.trim_start().chars().next().is_some_and(|c| c.is_ascii_digit()))
        .count();

    for server in ["pipewire", "pulseaudio"] {
        let out = ctx.runner.run(
            "systemctl",
            &["--user", "is-active", server],
            ctx.timeouts.probe,
        );
        if out.success && out.output.trim() == "active" {
            return Ok(CheckResult::new(
                name,
                CheckStatus::Pass,
                format!("{} card(s), {} running", card_count, server),
            ));
        }
    }

    Ok(CheckResult::new(
        name,
        CheckStatus::Warn,
        format!("{} card(s) but no sound server running", card_count),
    ))
}

fn check_bluetooth(ctx: &ProbeCtx) -> Result<CheckResult> {
    let name = "Bluetooth";

    let has_adapter = match ctx.fs.list_dir("sys/class/bluetooth") {
        Ok(entries) => !entries.is_empty(),
        Err(_) => false,
    };
    if !has_adapter {
        let usb = ctx.runner.run("lsusb", &[], ctx.timeouts.probe);
        if !usb.success || !usb.output.to_lowercase().contains("bluetooth") {
            return Ok(CheckResult::new(name, CheckStatus::Skip, "No Bluetooth hardware"));
        }
    }

    if rfkill_soft_blocked(ctx, "bluetooth") {
        return Ok(CheckResult::new(name, CheckStatus::Warn, "Bluetooth is soft-blocked")
            .remedy(Remedy::EnableBluetooth));
    }

    let out = ctx
        .runner
        .run("systemctl", &["is-active", "bluetooth"], ctx.timeouts.probe);
    if out.success && out.output.trim() == "active" {
        return Ok(CheckResult::new(name, CheckStatus::Pass, "Adapter present, service active"));
    }
    Ok(CheckResult::new(
        name,
        CheckStatus::Warn,
        "Adapter present but service inactive",
    )
    .remedy(Remedy::EnableBluetooth))
}

fn check_usb(ctx: &ProbeCtx) -> Result<CheckResult> {
    let name = "USB Controllers";
    let out = ctx.runner.run("lsusb", &[], ctx.timeouts.probe);
    if !out.success {
        return Ok(CheckResult::new(name, CheckStatus::Skip, "lsusb not available"));
    }

    let devices = out.output.lines().filter(|l| !l.trim().is_empty()).count();
    if devices == 0 {
        return Ok(CheckResult::new(name, CheckStatus::Warn, "No USB devices visible")
            .details("Even root hubs are missing; the xHCI driver may not be loaded"));
    }
    Ok(CheckResult::new(
        name,
        CheckStatus::Pass,
        format!("{} USB device(s)", devices),
    ))
}

fn check_ethernet(ctx: &ProbeCtx) -> Result<CheckResult> {
    let name = "Ethernet";
    let out = ctx.runner.run("ip", &["-o", "link"], ctx.timeouts.probe);
    if !out.success {
        return Ok(CheckResult::new(name, CheckStatus::Skip, "Unable to list interfaces"));
    }

    let wired: Vec<String> = out
        .output
        .lines()
        .filter_map(|line| {
            let iface = line.split_whitespace().nth(1)?.trim_end_matches(':');
            if iface.starts_with("en") || iface.starts_with("eth") {
                Some(iface.to_string())
            } else {
                None
            }
        })
        .collect();

    if wired.is_empty() {
        return Ok(CheckResult::new(name, CheckStatus::Skip, "No wired interfaces"));
    }

    for iface in &wired {
        if let Ok(Some(carrier)) =
            ctx.fs.read_optional(format!("sys/class/net/{}/carrier", iface))
        {
            if carrier.trim() == "1" {
                return Ok(CheckResult::new(
                    name,
                    CheckStatus::Pass,
                    format!("{} has link", iface),
                ));
            }
        }
    }
    Ok(CheckResult::new(
        name,
        CheckStatus::Pass,
        format!("{} interface(s), no cable connected", wired.len()),
    ))
}

fn check_webcam(ctx: &ProbeCtx) -> Result<CheckResult> {
    let name = "Webcam";

    let video_devices = match ctx.fs.list_dir("dev") {
        Ok(entries) => entries
            .into_iter()
            .filter(|e| e.starts_with("video"))
            .collect::<Vec<_>>(),
        Err(_) => Vec::new(),
    };

    if video_devices.is_empty() {
        return Ok(CheckResult::new(name, CheckStatus::Skip, "No video capture devices"));
    }
    Ok(CheckResult::new(
        name,
        CheckStatus::Pass,
        format!("{} video device(s)", video_devices.len()),
    )
    .details(video_devices.join(", ")))
}

fn check_firmware(ctx: &ProbeCtx) -> Result<CheckResult> {
    let name = "Device Firmware";
    if !ctx.runner.have("fwupdmgr") {
        return Ok(CheckResult::new(name, CheckStatus::Warn, "fwupd not installed")
            .details("fwupd delivers vendor firmware updates on Linux")
            .remedy(Remedy::InstallFwupd));
    }

    let out = ctx
        .runner
        .run("fwupdmgr", &["get-updates", "--no-unreported-check"], ctx.timeouts.package);
    if out.timed_out {
        return Ok(CheckResult::new(name, CheckStatus::Skip, "check timed out"));
    }

    // fwupdmgr exits nonzero when there is nothing to update.
    if out.output.contains("No updatable devices") || out.output.contains("No updates") {
        return Ok(CheckResult::new(name, CheckStatus::Pass, "Firmware is up to date"));
    }
    if !out.success && out.output.trim().is_empty() {
        return Ok(CheckResult::new(name, CheckStatus::Skip, "Unable to query fwupd"));
    }
    if out.success {
        return Ok(CheckResult::new(name, CheckStatus::Warn, "Firmware updates available")
            .remedy(Remedy::UpdateFirmware));
    }
    Ok(CheckResult::new(name, CheckStatus::Pass, "Firmware is up to date"))
}

fn count_firmware_failures(dmesg: &str) -> usize {
    dmesg
        .lines()
        .filter(|l| {
            l.contains("firmware: failed to load")
                || (l.contains("probe of") && l.contains("failed"))
        })
        .count()
}

fn check_kernel_modules(ctx: &ProbeCtx) -> Result<CheckResult> {
    let name = "Kernel Driver Errors";
    let out = ctx
        .runner
        .run("dmesg", &["--level=err,warn"], ctx.timeouts.probe);
    if !out.success {
        return Ok(CheckResult::new(name, CheckStatus::Skip, "Unable to read kernel log"));
    }

    let failures = count_firmware_failures(&out.output);
    if failures > 5 {
        return Ok(CheckResult::new(
            name,
            CheckStatus::Warn,
            format!("{} firmware/probe failures in kernel log", failures),
        )
        .remedy(Remedy::Command("dnf install -y linux-firmware".to_string())));
    }
    let message = if failures == 0 {
        "No driver load failures".to_string()
    } else {
        format!("{} minor firmware message(s)", failures)
    };
    Ok(CheckResult::new(name, CheckStatus::Pass, message))
}

fn check_hw_accel(ctx: &ProbeCtx) -> Result<CheckResult> {
    let name = "Video Acceleration";

    let vaapi = {
        let out = ctx.runner.run("vainfo", &[], ctx.timeouts.probe);
        out.success && out.output.contains("VAProfile")
    };
    let vdpau = {
        let out = ctx.runner.run("vdpauinfo", &[], ctx.timeouts.probe);
        out.success && out.output.contains("Decoder capabilities")
    };

    let result = match (vaapi, vdpau) {
        (true, true) => CheckResult::new(name, CheckStatus::Pass, "VA-API and VDPAU available"),
        (true, false) => CheckResult::new(name, CheckStatus::Pass, "VA-API available"),
        (false, true) => CheckResult::new(name, CheckStatus::Pass, "VDPAU available"),
        (false, false) => CheckResult::new(
            name,
            CheckStatus::Warn,
            "No hardware video acceleration detected",
        )
        .details("Video playback will fall back to software decoding")
        .remedy(Remedy::InstallHwAccel),
    };
    Ok(result)
}
