//! Post-install setup tasks: confirm-gated package and repo bundles that
//! reuse the fix executor.

use clap::ValueEnum;

use crate::exec::Runner;
use crate::fix::{run_plan, FixOptions, FixOutcome, FixPlan, FixStep, Prompt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SetupTask {
    /// Enable RPM Fusion free and nonfree repositories.
    Repos,
    /// Install multimedia codecs (requires RPM Fusion).
    Codecs,
    /// Install a base development toolchain.
    Devtools,
    /// Speed up dnf with parallel downloads and fastest mirror.
    Dnf,
    /// All of the above, in order.
    All,
}

fn step(desc: &'static str, cmd: &[&str]) -> FixStep {
    FixStep {
        desc,
        cmd: cmd.iter().map(|s| s.to_string()).collect(),
    }
}

fn shell(desc: &'static str, script: &str) -> FixStep {
    FixStep {
        desc,
        cmd: vec!["sh".to_string(), "-c".to_string(), script.to_string()],
    }
}

fn plan(summary: &'static str, steps: Vec<FixStep>) -> FixPlan {
    FixPlan {
        summary,
        steps,
        cleanup: None,
        requires_reboot: false,
    }
}

impl SetupTask {
    /// The plans this task expands to. `All` concatenates the others.
    pub fn plans(&self) -> Vec<FixPlan> {
        match self {
            SetupTask::Repos => vec![plan(
                "enable RPM Fusion repositories",
                vec![shell(
                    "Enabling RPM Fusion",
                    "dnf install -y \
                     https://download1.rpmfusion.org/free/fedora/rpmfusion-free-release-$(rpm -E %fedora).noarch.rpm \
                     https://download1.rpmfusion.org/nonfree/fedora/rpmfusion-nonfree-release-$(rpm -E %fedora).noarch.rpm",
                )],
            )],
            SetupTask::Codecs => vec![plan(
                "install multimedia codecs",
                vec![
                    step(
                        "Swapping in full ffmpeg",
                        &["dnf", "swap", "-y", "ffmpeg-free", "ffmpeg", "--allowerasing"],
                    ),
                    shell(
                        "Installing gstreamer plugins",
                        "dnf groupupdate -y multimedia --setopt=install_weak_deps=False --exclude=PackageKit-gstreamer-plugin",
                    ),
                ],
            )],
            SetupTask::Devtools => vec![plan(
                "install development tools",
                vec![
                    shell(
                        "Installing development group",
                        "dnf group install -y development-tools",
                    ),
                    step(
                        "Installing common build deps",
                        &["dnf", "install", "-y", "gcc", "gcc-c++", "make", "git", "cmake"],
                    ),
                ],
            )],
            SetupTask::Dnf => vec![plan(
                "tune dnf for faster downloads",
                vec![shell(
                    "Writing dnf.conf settings",
                    "grep -q '^max_parallel_downloads' /etc/dnf/dnf.conf || \
                     printf 'max_parallel_downloads=10\\nfastestmirror=True\\n' >> /etc/dnf/dnf.conf",
                )],
            )],
            SetupTask::All => [
                SetupTask::Repos,
                SetupTask::Codecs,
                SetupTask::Devtools,
                SetupTask::Dnf,
            ]
            .iter()
            .flat_map(|t| t.plans())
            .collect(),
        }
    }
}

/// Run a setup task, confirming each plan. Declined plans are skipped,
/// not aborted; the outcomes of the plans that ran come back in order.
pub fn run(
    task: SetupTask,
    runner: &dyn Runner,
    prompt: &dyn Prompt,
    opts: &FixOptions,
) -> Vec<(&'static str, FixOutcome)> {
    let mut outcomes = Vec::new();
    for plan in task.plans() {
        if !prompt.confirm(&format!("Run setup step: {}?", plan.summary)) {
            continue;
        }
        let outcome = run_plan(&plan, runner, opts);
        outcomes.push((plan.summary, outcome));
    }
    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::ScriptedRunner;

    struct Always(bool);

    impl Prompt for Always {
        fn confirm(&self, _question: &str) -> bool {
            self.0
        }
    }

    #[test]
    fn test_all_concatenates_everything() {
        let all = SetupTask::All.plans();
        let individual: usize = [SetupTask::Repos, SetupTask::Codecs, SetupTask::Devtools, SetupTask::Dnf]
            .iter()
            .map(|t| t.plans().len())
            .sum();
        assert_eq!(all.len(), individual);
    }

    #[test]
    fn test_declined_setup_runs_nothing() {
        let runner = ScriptedRunner::new();
        let outcomes = run(
            SetupTask::All,
            &runner,
            &Always(false),
            &FixOptions::default(),
        );
        assert!(outcomes.is_empty());
        assert_eq!(runner.call_count(), 0);
    }

    #[test]
    fn test_dnf_tuning_runs_single_step() {
        let runner = ScriptedRunner::new().respond(
            "sh -c grep -q '^max_parallel_downloads' /etc/dnf/dnf.conf || \
             printf 'max_parallel_downloads=10\\nfastestmirror=True\\n' >> /etc/dnf/dnf.conf",
            true,
            "",
        );
        let opts = FixOptions {
            use_sudo: false,
            ..FixOptions::default()
        };
        let outcomes = run(SetupTask::Dnf, &runner, &Always(true), &opts);
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].1.success);
    }
}
