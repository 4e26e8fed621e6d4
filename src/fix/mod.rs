pub mod plans;

use std::time::Duration;

use serde::Serialize;

use crate::check::CheckResult;
use crate::exec::Runner;

/// A remediation reference carried by a check result. Named variants map
/// to multi-step plans registered at compile time; `Command` is the
/// literal shell fallback for one-off fix commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Remedy {
    CleanDisk,
    CreateSwap,
    ResetFailedUnits,
    RepairPackageDb,
    RemoveOrphans,
    InstallNvidiaDriver,
    InstallWifiFirmware,
    UnblockWifi,
    EnableBluetooth,
    InstallAudioFirmware,
    InstallFwupd,
    UpdateFirmware,
    InstallHwAccel,
    EnableFirewall,
    EnforceSelinux,
    HardenSsh,
    InstallFail2ban,
    EnableAutoUpdates,
    InstallClamav,
    FixFilePermissions,
    InstallFlatpak,
    AddFlathub,
    InstallFonts,
    EnablePortals,
    Command(String),
}

impl Remedy {
    /// One-line description shown in confirmations and reports.
    pub fn summary(&self) -> String {
        match self {
            Remedy::Command(cmd) => cmd.clone(),
            named => named
                .plan()
                .map(|p| p.summary.to_string())
                .unwrap_or_default(),
        }
    }

    /// The step plan for a named remedy; None for the shell fallback.
    pub fn plan(&self) -> Option<FixPlan> {
        plans::plan_for(self)
    }
}

/// One command in a fix plan.
#[derive(Debug, Clone)]
pub struct FixStep {
    pub desc: &'static str,
    pub cmd: Vec<String>,
}

/// Ordered remediation steps. Execution stops at the first failing step;
/// `cleanup` runs only then, for plans that allocate a resource which
/// must not be left behind half-made.
#[derive(Debug, Clone)]
pub struct FixPlan {
    pub summary: &'static str,
    pub steps: Vec<FixStep>,
    pub cleanup: Option<Vec<String>>,
    pub requires_reboot: bool,
}

/// Result of attempting a remediation. Ephemeral; only displayed.
#[derive(Debug, Clone)]
pub struct FixOutcome {
    pub success: bool,
    pub message: String,
    pub details: String,
    pub requires_reboot: bool,
}

/// Yes/no confirmation capability, injected so remediation logic never
/// talks to the terminal directly.
pub trait Prompt {
    fn confirm(&self, question: &str) -> bool;
}

/// Reads a `[y/N]` answer from stdin. EOF counts as "no".
pub struct StdinPrompt;

impl Prompt for StdinPrompt {
    fn confirm(&self, question: &str) -> bool {
        use std::io::Write;

        print!("{} [y/N] ", question);
        if std::io::stdout().flush().is_err() {
            return false;
        }

        let mut input = String::new();
        match std::io::stdin().read_line(&mut input) {
            Ok(0) | Err(_) => false,
            Ok(_) => input.trim().eq_ignore_ascii_case("y"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixOptions {
    pub timeout: Duration,
    /// Prefix every step with sudo (when not already root).
    pub use_sudo: bool,
    /// Allow executing `Remedy::Command` literals through `sh -c`.
    pub allow_shell_fallback: bool,
}

impl Default for FixOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300),
            use_sudo: false,
            allow_shell_fallback: true,
        }
    }
}

const DETAIL_LIMIT: usize = 500;

fn truncate_details(output: &str) -> String {
    let trimmed = output.trim();
    if trimmed.len() <= DETAIL_LIMIT {
        return trimmed.to_string();
    }
    let mut end = DETAIL_LIMIT;
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &trimmed[..end])
}

fn run_cmd(runner: &dyn Runner, cmd: &[String], opts: &FixOptions) -> crate::exec::ExecOutput {
    let mut argv: Vec<&str> = Vec::with_capacity(cmd.len() + 1);
    if opts.use_sudo {
        argv.push("sudo");
    }
    argv.extend(cmd.iter().map(String::as_str));
    runner.run(argv[0], &argv[1..], opts.timeout)
}

/// Execute a fix plan step by step. Stops at the first failure and names
/// the failed step; prior steps are not rolled back, but the plan's
/// cleanup command (if any) runs so no orphaned resource is left.
pub fn run_plan(plan: &FixPlan, runner: &dyn Runner, opts: &FixOptions) -> FixOutcome {
    for step in &plan.steps {
        let out = run_cmd(runner, &step.cmd, opts);
        if !out.success {
            if let Some(cleanup) = &plan.cleanup {
                let _ = run_cmd(runner, cleanup, opts);
            }
            return FixOutcome {
                success: false,
                message: format!("failed at: {}", step.desc),
                details: truncate_details(&out.output),
                requires_reboot: false,
            };
        }
    }

    FixOutcome {
        success: true,
        message: plan.summary.to_string(),
        details: String::new(),
        requires_reboot: plan.requires_reboot,
    }
}

/// Resolve and apply the remediation for one result. Returns None when
/// there is nothing to do: no remedy, confirmation declined, or the shell
/// fallback is disabled. A declined confirmation runs nothing at all.
pub fn apply_fix(
    result: &CheckResult,
    runner: &dyn Runner,
    prompt: &dyn Prompt,
    opts: &FixOptions,
) -> Option<FixOutcome> {
    let remedy = result.remedy.as_ref()?;

    if let Some(plan) = remedy.plan() {
        let question = format!("Apply fix for {}? ({})", result.name, plan.summary);
        if !prompt.confirm(&question) {
            return None;
        }
        return Some(run_plan(&plan, runner, opts));
    }

    if let Remedy::Command(cmd) = remedy {
        if !opts.allow_shell_fallback {
            return None;
        }
        let question = format!("Run fix command for {}?\n  {}", result.name, cmd);
        if !prompt.confirm(&question) {
            return None;
        }
        let out = run_cmd(
            runner,
            &["sh".to_string(), "-c".to_string(), cmd.clone()],
            opts,
        );
        return Some(FixOutcome {
            success: out.success,
            message: if out.success {
                "fix applied".to_string()
            } else {
                "fix command failed".to_string()
            },
            details: truncate_details(&out.output),
            requires_reboot: false,
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::{CheckResult, CheckStatus};
    use crate::exec::ScriptedRunner;

    struct Always(bool);

    impl Prompt for Always {
        fn confirm(&self, _question: &str) -> bool {
            self.0
        }
    }

    fn fix_opts() -> FixOptions {
        FixOptions {
            use_sudo: false,
            ..FixOptions::default()
        }
    }

    #[test]
    fn test_decline_runs_nothing() {
        let runner = ScriptedRunner::new();
        let result = CheckResult::new("Failed Systemd Units", CheckStatus::Fail, "2 failed")
            .remedy(Remedy::ResetFailedUnits);

        let outcome = apply_fix(&result, &runner, &Always(false), &fix_opts());
        assert!(outcome.is_none());
        assert_eq!(runner.call_count(), 0);
    }

    #[test]
    fn test_decline_shell_fallback_runs_nothing() {
        let runner = ScriptedRunner::new();
        let result = CheckResult::new("Fonts", CheckStatus::Warn, "few fonts")
            .remedy(Remedy::Command("dnf install -y fonts".to_string()));

        let outcome = apply_fix(&result, &runner, &Always(false), &fix_opts());
        assert!(outcome.is_none());
        assert_eq!(runner.call_count(), 0);
    }

    #[test]
    fn test_no_remedy_is_noop() {
        let runner = ScriptedRunner::new();
        let result = CheckResult::new("Memory Usage", CheckStatus::Fail, "critical");

        assert!(apply_fix(&result, &runner, &Always(true), &fix_opts()).is_none());
        assert_eq!(runner.call_count(), 0);
    }

    #[test]
    fn test_named_plan_runs_all_steps() {
        let runner = ScriptedRunner::new()
            .respond("rfkill unblock bluetooth", true, "")
            .respond("systemctl enable --now bluetooth", true, "");
        let result = CheckResult::new("Bluetooth", CheckStatus::Warn, "service not running")
            .remedy(Remedy::EnableBluetooth);

        let outcome = apply_fix(&result, &runner, &Always(true), &fix_opts()).unwrap();
        assert!(outcome.success);
        assert_eq!(runner.call_count(), 2);
    }

    #[test]
    fn test_plan_stops_at_first_failure() {
        let runner = ScriptedRunner::new()
            .respond("rfkill unblock bluetooth", true, "")
            .respond("systemctl enable --now bluetooth", false, "unit masked");
        let result = CheckResult::new("Bluetooth", CheckStatus::Warn, "not running")
            .remedy(Remedy::EnableBluetooth);

        let outcome = apply_fix(&result, &runner, &Always(true), &fix_opts()).unwrap();
        assert!(!outcome.success);
        assert!(outcome.message.contains("failed at:"));
        assert!(outcome.details.contains("unit masked"));
    }

    #[test]
    fn test_swap_plan_cleans_up_on_failure() {
        // fallocate succeeds, chmod fails: the half-made swap file must go.
        let runner = ScriptedRunner::new()
            .respond("fallocate -l 4G /swapfile", true, "")
            .respond("chmod 600 /swapfile", false, "no such file");
        let result = CheckResult::new("Swap Space", CheckStatus::Warn, "no swap")
            .remedy(Remedy::CreateSwap);

        let outcome = apply_fix(&result, &runner, &Always(true), &fix_opts()).unwrap();
        assert!(!outcome.success);
        let calls = runner.calls.borrow();
        assert!(calls.iter().any(|c| c == "rm -f /swapfile"));
    }

    #[test]
    fn test_command_fallback_goes_through_sh() {
        let runner = ScriptedRunner::new().respond("sh -c rfkill unblock wifi", true, "");
        let result = CheckResult::new("WiFi Driver", CheckStatus::Warn, "blocked")
            .remedy(Remedy::Command("rfkill unblock wifi".to_string()));

        let outcome = apply_fix(&result, &runner, &Always(true), &fix_opts()).unwrap();
        assert!(outcome.success);
        assert_eq!(runner.calls.borrow()[0], "sh -c rfkill unblock wifi");
    }

    #[test]
    fn test_shell_fallback_can_be_disabled() {
        let runner = ScriptedRunner::new();
        let result = CheckResult::new("WiFi Driver", CheckStatus::Warn, "blocked")
            .remedy(Remedy::Command("rfkill unblock wifi".to_string()));

        let opts = FixOptions {
            allow_shell_fallback: false,
            use_sudo: false,
            ..FixOptions::default()
        };
        assert!(apply_fix(&result, &runner, &Always(true), &opts).is_none());
        assert_eq!(runner.call_count(), 0);
    }

    #[test]
    fn test_sudo_prefix() {
        let runner = ScriptedRunner::new().respond("sudo systemctl reset-failed", true, "");
        let result = CheckResult::new("Failed Systemd Units", CheckStatus::Fail, "2 failed")
            .remedy(Remedy::ResetFailedUnits);

        let opts = FixOptions {
            use_sudo: true,
            ..FixOptions::default()
        };
        let outcome = apply_fix(&result, &runner, &Always(true), &opts).unwrap();
        assert!(outcome.success);
    }

    #[test]
    fn test_reboot_flag_propagates() {
        let runner = ScriptedRunner::new().respond(
            "dnf install -y linux-firmware iwlwifi-firmware atheros-firmware",
            true,
            "",
        );
        let result = CheckResult::new("WiFi Driver", CheckStatus::Fail, "no driver")
            .remedy(Remedy::InstallWifiFirmware);

        let outcome = apply_fix(&result, &runner, &Always(true), &fix_opts()).unwrap();
        assert!(outcome.success);
        assert!(outcome.requires_reboot);
    }

    #[test]
    fn test_truncate_details() {
        let long = "x".repeat(600);
        let truncated = truncate_details(&long);
        assert!(truncated.len() <= 503);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn test_every_named_remedy_has_a_plan() {
        let named = [
            Remedy::CleanDisk,
            Remedy::CreateSwap,
            Remedy::ResetFailedUnits,
            Remedy::RepairPackageDb,
            Remedy::RemoveOrphans,
            Remedy::InstallNvidiaDriver,
            Remedy::InstallWifiFirmware,
            Remedy::UnblockWifi,
            Remedy::EnableBluetooth,
            Remedy::InstallAudioFirmware,
            Remedy::InstallFwupd,
            Remedy::UpdateFirmware,
            Remedy::InstallHwAccel,
            Remedy::EnableFirewall,
            Remedy::EnforceSelinux,
            Remedy::HardenSsh,
            Remedy::InstallFail2ban,
            Remedy::EnableAutoUpdates,
            Remedy::InstallClamav,
            Remedy::FixFilePermissions,
            Remedy::InstallFlatpak,
            Remedy::AddFlathub,
            Remedy::InstallFonts,
            Remedy::EnablePortals,
        ];
        for remedy in named {
            let plan = remedy.plan().expect("named remedy without a plan");
            assert!(!plan.steps.is_empty());
            assert!(!plan.summary.is_empty());
        }
        assert!(Remedy::Command("true".to_string()).plan().is_none());
    }
}
