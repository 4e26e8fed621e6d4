//! Desktop environment probes: session, display, theming, app distribution.

use crate::check::{CheckResult, CheckStatus, Probe, ProbeCtx};
use crate::error::Result;
use crate::fix::Remedy;

pub fn probes() -> Vec<Probe> {
    vec![
        Probe { name: "Desktop Environment", run: check_desktop_environment },
        Probe { name: "Display Server", run: check_display_server },
        Probe { name: "Compositor", run: check_compositor },
        Probe { name: "Display Manager", run: check_display_manager },
        Probe { name: "Display Resolution", run: check_resolution },
        Probe { name: "Theme Configuration", run: check_themes },
        Probe { name: "Fonts", run: check_fonts },
        Probe { name: "GNOME Extensions", run: check_gnome_extensions },
        Probe { name: "Flatpak", run: check_flatpak },
        Probe { name: "Desktop Portals", run: check_portals },
    ]
}

/// Known desktops and the binary that reports their version.
const DESKTOPS: [(&str, &str, &[&str]); 6] = [
    ("gnome", "GNOME", &["gnome-shell", "--version"]),
    ("kde", "KDE Plasma", &["plasmashell", "--version"]),
    ("xfce", "Xfce", &["xfce4-session", "--version"]),
    ("cinnamon", "Cinnamon", &["cinnamon", "--version"]),
    ("mate", "MATE", &["mate-session", "--version"]),
    ("lxqt", "LXQt", &["lxqt-session", "--version"]),
];

fn check_desktop_environment(ctx: &ProbeCtx) -> Result<CheckResult> {
    let name = "Desktop Environment";
    let current = &ctx.session.current_desktop;
    if current.is_empty() {
        return Ok(CheckResult::new(name, CheckStatus::Skip, "No desktop session"));
    }

    let Some((_, title, version_cmd)) =
        DESKTOPS.iter().find(|(key, _, _)| current.contains(key))
    else {
        return Ok(CheckResult::new(
            name,
            CheckStatus::Pass,
            format!("Running {}", current),
        ));
    };

    let out = ctx
        .runner
        .run(version_cmd[0], &version_cmd[1..], ctx.timeouts.probe);
    let message = if out.success {
        format!("{} ({})", title, out.output.trim())
    } else {
        format!("Running {}", title)
    };
    Ok(CheckResult::new(name, CheckStatus::Pass, message))
}

fn check_display_server(ctx: &ProbeCtx) -> Result<CheckResult> {
    let name = "Display Server";
    let result = match ctx.session.session_type.as_str() {
        "wayland" => CheckResult::new(name, CheckStatus::Pass, "Wayland session"),
        "x11" => CheckResult::new(name, CheckStatus::Pass, "X11 session"),
        "tty" => CheckResult::new(name, CheckStatus::Skip, "Console session, no display server"),
        "" => {
            if !ctx.session.wayland_display.is_empty() {
                CheckResult::new(name, CheckStatus::Pass, "Wayland session")
            } else if !ctx.session.x11_display.is_empty() {
                CheckResult::new(name, CheckStatus::Pass, "X11 session")
            } else {
                CheckResult::new(name, CheckStatus::Skip, "No display server detected")
            }
        }
        other => CheckResult::new(
            name,
            CheckStatus::Warn,
            format!("Unusual session type: {}", other),
        ),
    };
    Ok(result)
}

fn check_compositor(ctx: &ProbeCtx) -> Result<CheckResult> {
    let name = "Compositor";
    if ctx.session.session_type == "wayland" {
        // Wayland compositors are the display server; nothing separate to check.
        return Ok(CheckResult::new(name, CheckStatus::Pass, "Wayland compositing"));
    }
    if ctx.session.session_type != "x11" {
        return Ok(CheckResult::new(name, CheckStatus::Skip, "No graphical session"));
    }

    for compositor in ["mutter", "kwin_x11", "picom", "xfwm4", "compton"] {
        let out = ctx.runner.run("pgrep", &["-x", compositor], ctx.timeouts.probe);
        if out.success {
            return Ok(CheckResult::new(
                name,
                CheckStatus::Pass,
                format!("{} is running", compositor),
            ));
        }
    }

    let out = ctx.runner.run("xdpyinfo", &[], ctx.timeouts.probe);
    if out.success && out.output.contains("Composite") {
        return Ok(CheckResult::new(name, CheckStatus::Pass, "Composite extension available"));
    }
    Ok(CheckResult::new(name, CheckStatus::Warn, "No compositor detected")
        .details("Expect screen tearing and no transparency effects"))
}

fn check_display_manager(ctx: &ProbeCtx) -> Result<CheckResult> {
    let name = "Display Manager";
    for dm in ["gdm", "sddm", "lightdm", "lxdm", "xdm"] {
        let out = ctx.runner.run("systemctl", &["is-active", dm], ctx.timeouts.probe);
        if out.success && out.output.trim() == "active" {
            return Ok(CheckResult::new(
                name,
                CheckStatus::Pass,
                format!("{} is active", dm),
            ));
        }
    }
    Ok(CheckResult::new(name, CheckStatus::Warn, "No display manager active")
        .details("Graphical login will not be available after reboot"))
}

/// Active mode lines from `xrandr --current`: "1920x1080 60.00*+ ...".
fn parse_active_modes(xrandr: &str) -> Vec<String> {
    let mut modes = Vec::new();
    let mut current_output: Option<String> = None;

    for line in xrandr.lines() {
        if !line.starts_with(' ') {
            if line.contains(" connected") {
                current_output = line.split_whitespace().next().map(|s| s.to_string());
            } else if line.contains(" disconnected") {
                current_output = None;
            }
            continue;
        }
        if line.contains('*') {
            if let (Some(output), Some(mode)) =
                (&current_output, line.split_whitespace().next())
            {
                modes.push(format!("{}: {}", output, mode));
            }
        }
    }
    modes
}

fn check_resolution(ctx: &ProbeCtx) -> Result<CheckResult> {
    let name = "Display Resolution";
    let out = ctx.runner.run("xrandr", &["--current"], ctx.timeouts.probe);
    if !out.success {
        // Typical on pure Wayland; fall back to counting connectors.
        let connected = ctx
            .fs
            .list_dir("sys/class/drm")
            .map(|entries| {
                entries
                    .iter()
                    .filter(|e| {
                        e.starts_with("card")
                            && e.contains('-')
                            && ctx
                                .fs
                                .read_optional(format!("sys/class/drm/{}/status", e))
                                .ok()
                                .flatten()
                                .is_some_and(|s| s.trim() == "connected")
                    })
                    .count()
            })
            .unwrap_or(0);
        if connected == 0 {
            return Ok(CheckResult::new(name, CheckStatus::Skip, "Cannot query displays"));
        }
        return Ok(CheckResult::new(
            name,
            CheckStatus::Pass,
            format!("{} display(s) connected", connected),
        ));
    }

    let modes = parse_active_modes(&out.output);
    if modes.is_empty() {
        return Ok(CheckResult::new(name, CheckStatus::Warn, "No active display mode")
            .details("An output is connected but no resolution is set"));
    }
    Ok(CheckResult::new(
        name,
        CheckStatus::Pass,
        modes.join(", "),
    ))
}

fn check_themes(ctx: &ProbeCtx) -> Result<CheckResult> {
    let name = "Theme Configuration";
    if !ctx.runner.have("gsettings") {
        return Ok(CheckResult::new(name, CheckStatus::Skip, "gsettings not available"));
    }

    let gtk = ctx.runner.run(
        "gsettings",
        &["get", "org.gnome.desktop.interface", "gtk-theme"],
        ctx.timeouts.probe,
    );
    let icons = ctx.runner.run(
        "gsettings",
        &["get", "org.gnome.desktop.interface", "icon-theme"],
        ctx.timeouts.probe,
    );

    if !gtk.success && !icons.success {
        return Ok(CheckResult::new(name, CheckStatus::Skip, "Cannot read theme settings"));
    }
    let strip = |s: &str| s.trim().trim_matches('\'').to_string();
    let mut parts = Vec::new();
    if gtk.success {
        parts.push(format!("GTK: {}", strip(&gtk.output)));
    }
    if icons.success {
        parts.push(format!("Icons: {}", strip(&icons.output)));
    }
    Ok(CheckResult::new(name, CheckStatus::Pass, parts.join(", ")))
}

fn check_fonts(ctx: &ProbeCtx) -> Result<CheckResult> {
    let name = "Fonts";
    let out = ctx.runner.run("fc-list", &[], ctx.timeouts.probe);
    if !out.success {
        return Ok(CheckResult::new(name, CheckStatus::Skip, "fontconfig not available"));
    }

    let count = out.output.lines().filter(|l| !l.trim().is_empty()).count();
    if count < 50 {
        return Ok(CheckResult::new(
            name,
            CheckStatus::Warn,
            format!("Only {} font(s) installed", count),
        )
        .details("Web pages and documents may render with fallback glyphs")
        .remedy(Remedy::InstallFonts));
    }
    Ok(CheckResult::new(
        name,
        CheckStatus::Pass,
        format!("{} fonts installed", count),
    ))
}

fn check_gnome_extensions(ctx: &ProbeCtx) -> Result<CheckResult> {
    let name = "GNOME Extensions";
    if !ctx.session.current_desktop.contains("gnome") {
        return Ok(CheckResult::new(name, CheckStatus::Skip, "Not a GNOME session"));
    }

    let out = ctx
        .runner
        .run("gnome-extensions", &["list", "--enabled"], ctx.timeouts.probe);
    if !out.success {
        return Ok(CheckResult::new(name, CheckStatus::Skip, "gnome-extensions not available"));
    }

    let enabled = out.output.lines().filter(|l| !l.trim().is_empty()).count();
    Ok(CheckResult::new(
        name,
        CheckStatus::Pass,
        format!("{} extension(s) enabled", enabled),
    ))
}

fn check_flatpak(ctx: &ProbeCtx) -> Result<CheckResult> {
    let name = "Flatpak";
    if !ctx.runner.have("flatpak") {
        return Ok(CheckResult::new(name, CheckStatus::Warn, "Flatpak not installed")
            .details("Many desktop apps ship primarily as Flatpaks")
            .remedy(Remedy::InstallFlatpak));
    }

    let out = ctx.runner.run("flatpak", &["remotes"], ctx.timeouts.probe);
    if !out.success {
        return Ok(CheckResult::new(name, CheckStatus::Skip, "Cannot list Flatpak remotes"));
    }
    if !out.output.to_lowercase().contains("flathub") {
        return Ok(CheckResult::new(name, CheckStatus::Warn, "Flathub remote not configured")
            .remedy(Remedy::AddFlathub));
    }

    let apps = ctx.runner.run("flatpak", &["list", "--app"], ctx.timeouts.probe);
    let count = if apps.success {
        apps.output.lines().filter(|l| !l.trim().is_empty()).count()
    } else {
        0
    };
    Ok(CheckResult::new(
        name,
        CheckStatus::Pass,
        format!("Flathub configured, {} app(s)", count),
    ))
}

fn check_portals(ctx: &ProbeCtx) -> Result<CheckResult> {
    let name = "Desktop Portals";
    let out = ctx
        .runner
        .run("rpm", &["-qa", "xdg-desktop-portal*"], ctx.timeouts.probe);
    if !out.success {
        return Ok(CheckResult::new(name, CheckStatus::Skip, "Cannot query packages"));
    }

    let packages: Vec<&str> = out
        .output
        .lines()
        .filter(|l| !l.trim().is_empty())
        .collect();
    if packages.is_empty() {
        return Ok(CheckResult::new(name, CheckStatus::Warn, "No portal packages installed")
            .details("Sandboxed apps cannot open files or take screenshots")
            .remedy(Remedy::EnablePortals));
    }

    let service = ctx.runner.run(
        "systemctl",
        &["--user", "is-active", "xdg-desktop-portal"],
        ctx.timeouts.probe,
    );
    if service.success && service.output.trim() == "active" {
        return Ok(CheckResult::new(
            name,
            CheckStatus::Pass,
            format!("{} portal package(s), service active", packages.len()),
        ));
    }
    Ok(CheckResult::new(
        name,
        CheckStatus::Warn,
        "Portals installed but service not running",
    )
    .remedy(Remedy::EnablePortals))
}
