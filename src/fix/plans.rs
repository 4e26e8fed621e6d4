//! The remedy registry: every named `Remedy` variant resolves to a step
//! plan here, at compile time. Package names target Fedora-family systems
//! (dnf, rpm), matching the probes.

use super::{FixPlan, FixStep, Remedy};

const FLATHUB_URL: &str = "https://flathub.org/repo/flathub.flatpakrepo";

fn step(desc: &'static str, cmd: &[&str]) -> FixStep {
    FixStep {
        desc,
        cmd: cmd.iter().map(|s| s.to_string()).collect(),
    }
}

fn shell(desc: &'static str, script: &str) -> FixStep {
    step_owned(desc, vec!["sh".into(), "-c".into(), script.to_string()])
}

fn step_owned(desc: &'static str, cmd: Vec<String>) -> FixStep {
    FixStep { desc, cmd }
}

fn plan(summary: &'static str, steps: Vec<FixStep>) -> FixPlan {
    FixPlan {
        summary,
        steps,
        cleanup: None,
        requires_reboot: false,
    }
}

fn reboot_plan(summary: &'static str, steps: Vec<FixStep>) -> FixPlan {
    FixPlan {
        requires_reboot: true,
        ..plan(summary, steps)
    }
}

pub(crate) fn plan_for(remedy: &Remedy) -> Option<FixPlan> {
    let plan = match remedy {
        Remedy::Command(_) => return None,

        Remedy::CleanDisk => plan(
            "clean package caches, orphans and old journal logs",
            vec![
                step("Cleaning dnf cache", &["dnf", "clean", "all"]),
                step("Removing orphaned packages", &["dnf", "autoremove", "-y"]),
                step("Vacuuming journal logs", &["journalctl", "--vacuum-time=7d"]),
            ],
        ),

        Remedy::CreateSwap => FixPlan {
            summary: "create and enable a 4G swap file at /swapfile",
            steps: vec![
                step("Allocating swap file", &["fallocate", "-l", "4G", "/swapfile"]),
                step("Setting permissions", &["chmod", "600", "/swapfile"]),
                step("Formatting swap", &["mkswap", "/swapfile"]),
                step("Enabling swap", &["swapon", "/swapfile"]),
                shell(
                    "Adding fstab entry",
                    "grep -q '^/swapfile' /etc/fstab || echo '/swapfile none swap sw 0 0' >> /etc/fstab",
                ),
            ],
            // Never leave a half-allocated swap file behind.
            cleanup: Some(vec!["rm".into(), "-f".into(), "/swapfile".into()]),
            requires_reboot: false,
        },

        Remedy::ResetFailedUnits => plan(
            "reset failed systemd units",
            vec![step("Resetting failed units", &["systemctl", "reset-failed"])],
        ),

        Remedy::RepairPackageDb => plan(
            "rebuild the rpm database and sync packages",
            vec![
                step("Rebuilding rpm database", &["rpm", "--rebuilddb"]),
                step("Cleaning dnf cache", &["dnf", "clean", "all"]),
                step("Checking package database", &["dnf", "check"]),
                step("Syncing distribution packages", &["dnf", "distro-sync", "-y"]),
            ],
        ),

        Remedy::RemoveOrphans => plan(
            "remove orphaned packages",
            vec![step("Running dnf autoremove", &["dnf", "autoremove", "-y"])],
        ),

        Remedy::InstallNvidiaDriver => reboot_plan(
            "install the proprietary NVIDIA driver from RPM Fusion",
            vec![
                shell(
                    "Enabling RPM Fusion",
                    "dnf install -y \
                     https://download1.rpmfusion.org/free/fedora/rpmfusion-free-release-$(rpm -E %fedora).noarch.rpm \
                     https://download1.rpmfusion.org/nonfree/fedora/rpmfusion-nonfree-release-$(rpm -E %fedora).noarch.rpm",
                ),
                step("Installing NVIDIA driver", &["dnf", "install", "-y", "akmod-nvidia"]),
                step(
                    "Installing CUDA support",
                    &["dnf", "install", "-y", "xorg-x11-drv-nvidia-cuda"],
                ),
            ],
        ),

        Remedy::InstallWifiFirmware => reboot_plan(
            "install common WiFi firmware packages",
            vec![step(
                "Installing firmware packages",
                &["dnf", "install", "-y", "linux-firmware", "iwlwifi-firmware", "atheros-firmware"],
            )],
        ),

        Remedy::UnblockWifi => plan(
            "unblock WiFi via rfkill",
            vec![step("Unblocking WiFi", &["rfkill", "unblock", "wifi"])],
        ),

        Remedy::EnableBluetooth => plan(
            "unblock Bluetooth and enable the service",
            vec![
                step("Unblocking Bluetooth", &["rfkill", "unblock", "bluetooth"]),
                step(
                    "Enabling Bluetooth service",
                    &["systemctl", "enable", "--now", "bluetooth"],
                ),
            ],
        ),

        Remedy::InstallAudioFirmware => reboot_plan(
            "install audio firmware and PipeWire ALSA support",
            vec![step(
                "Installing audio packages",
                &["dnf", "install", "-y", "alsa-firmware", "sof-firmware", "pipewire-alsa"],
            )],
        ),

        Remedy::InstallFwupd => plan(
            "install fwupd for firmware updates",
            vec![
                step("Installing fwupd", &["dnf", "install", "-y", "fwupd"]),
                step("Enabling fwupd service", &["systemctl", "enable", "--now", "fwupd"]),
            ],
        ),

        Remedy::UpdateFirmware => reboot_plan(
            "apply pending firmware updates",
            vec![
                step("Refreshing firmware metadata", &["fwupdmgr", "refresh", "--force"]),
                step("Applying firmware updates", &["fwupdmgr", "update", "-y"]),
            ],
        ),

        Remedy::InstallHwAccel => plan(
            "install VA-API/VDPAU video acceleration drivers",
            vec![step(
                "Installing acceleration packages",
                &["dnf", "install", "-y", "libva-utils", "vdpauinfo", "mesa-va-drivers", "mesa-vdpau-drivers"],
            )],
        ),

        Remedy::EnableFirewall => plan(
            "install and enable firewalld",
            vec![
                step("Installing firewalld", &["dnf", "install", "-y", "firewalld"]),
                step(
                    "Enabling firewalld",
                    &["systemctl", "enable", "--now", "firewalld"],
                ),
            ],
        ),

        Remedy::EnforceSelinux => plan(
            "set SELinux to enforcing mode, persistently",
            vec![
                step("Setting runtime mode", &["setenforce", "1"]),
                shell(
                    "Updating SELinux config",
                    "sed -i 's/^SELINUX=\\(permissive\\|disabled\\)/SELINUX=enforcing/' /etc/selinux/config",
                ),
            ],
        ),

        Remedy::HardenSsh => plan(
            "disable root login and empty passwords over SSH",
            vec![
                shell(
                    "Disabling root login",
                    "sed -i 's/^#*PermitRootLogin.*/PermitRootLogin no/' /etc/ssh/sshd_config",
                ),
                shell(
                    "Disabling empty passwords",
                    "sed -i 's/^#*PermitEmptyPasswords.*/PermitEmptyPasswords no/' /etc/ssh/sshd_config",
                ),
                step("Restarting sshd", &["systemctl", "restart", "sshd"]),
            ],
        ),

        Remedy::InstallFail2ban => plan(
            "install fail2ban with an sshd jail",
            vec![
                step("Installing fail2ban", &["dnf", "install", "-y", "fail2ban"]),
                shell(
                    "Writing jail configuration",
                    "printf '[DEFAULT]\\nbantime = 1h\\nfindtime = 10m\\nmaxretry = 5\\n\\n[sshd]\\nenabled = true\\n' > /etc/fail2ban/jail.local",
                ),
                step(
                    "Enabling fail2ban",
                    &["systemctl", "enable", "--now", "fail2ban"],
                ),
            ],
        ),

        Remedy::EnableAutoUpdates => plan(
            "enable automatic security updates via dnf-automatic",
            vec![
                step("Installing dnf-automatic", &["dnf", "install", "-y", "dnf-automatic"]),
                shell(
                    "Configuring security-only updates",
                    "sed -i -e 's/^apply_updates = no/apply_updates = yes/' \
                     -e 's/^upgrade_type = default/upgrade_type = security/' /etc/dnf/automatic.conf",
                ),
                step(
                    "Enabling update timer",
                    &["systemctl", "enable", "--now", "dnf-automatic.timer"],
                ),
            ],
        ),

        Remedy::InstallClamav => plan(
            "install ClamAV with automatic definition updates",
            vec![
                step(
                    "Installing ClamAV",
                    &["dnf", "install", "-y", "clamav", "clamav-update"],
                ),
                step(
                    "Enabling definition updates",
                    &["systemctl", "enable", "--now", "clamav-freshclam"],
                ),
            ],
        ),

        Remedy::FixFilePermissions => plan(
            "restore expected permissions on sensitive files",
            vec![
                step("Fixing /etc/passwd", &["chmod", "644", "/etc/passwd"]),
                step("Fixing /etc/shadow", &["chmod", "000", "/etc/shadow"]),
                step("Fixing /etc/gshadow", &["chmod", "000", "/etc/gshadow"]),
                step("Fixing /etc/sudoers", &["chmod", "440", "/etc/sudoers"]),
            ],
        ),

        Remedy::InstallFlatpak => plan(
            "install Flatpak and add the Flathub remote",
            vec![
                step("Installing Flatpak", &["dnf", "install", "-y", "flatpak"]),
                step(
                    "Adding Flathub remote",
                    &["flatpak", "remote-add", "--if-not-exists", "flathub", FLATHUB_URL],
                ),
            ],
        ),

        Remedy::AddFlathub => plan(
            "add the Flathub remote",
            vec![step(
                "Adding Flathub remote",
                &["flatpak", "remote-add", "--if-not-exists", "flathub", FLATHUB_URL],
            )],
        ),

        Remedy::InstallFonts => plan(
            "install common font packages",
            vec![step(
                "Installing fonts",
                &["dnf", "install", "-y", "google-noto-fonts-common", "liberation-fonts", "dejavu-fonts-all"],
            )],
        ),

        Remedy::EnablePortals => plan(
            "install and start XDG desktop portals",
            vec![
                step(
                    "Installing portal packages",
                    &["dnf", "install", "-y", "xdg-desktop-portal", "xdg-desktop-portal-gtk"],
                ),
                step(
                    "Starting portal service",
                    &["systemctl", "--user", "enable", "--now", "xdg-desktop-portal"],
                ),
            ],
        ),
    };

    Some(plan)
}
