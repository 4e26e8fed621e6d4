use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use checkup::check::{Category, CategoryKind, ProbeCtx, SessionInfo, Timeouts};
use checkup::cli::{Cli, Command};
use checkup::config::CheckupConfig;
use checkup::exec::SystemRunner;
use checkup::fix::{apply_fix, FixOptions, Prompt, StdinPrompt};
use checkup::menu::{prompt_choice, Choice};
use checkup::setup::SetupTask;
use checkup::sysroot::SysRoot;
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

fn main() -> Result<()> {
    checkup::exec::install_interrupt_handler();

    let cli = Cli::parse();
    let config = checkup::config::load(cli.config.as_ref());
    let mut app = App::new(config, cli.json);

    match cli.command {
        Some(Command::Health) => app.cmd_category(CategoryKind::Health),
        Some(Command::Drivers) => app.cmd_category(CategoryKind::Drivers),
        Some(Command::Security) => app.cmd_category(CategoryKind::Security),
        Some(Command::Desktop) => app.cmd_category(CategoryKind::Desktop),
        Some(Command::Check) => app.cmd_check(),
        Some(Command::Fix { yes }) => app.cmd_fix(yes)?,
        Some(Command::Report { output }) => app.cmd_report(output)?,
        Some(Command::Setup { task }) => app.cmd_setup(task),
        Some(Command::Completions { shell }) => checkup::cli::print_completions(shell),
        None => app.run_menu()?,
    }

    Ok(())
}

struct App {
    config: CheckupConfig,
    json: bool,
    runner: SystemRunner,
    fs: SysRoot,
    session: SessionInfo,
    /// Results from this invocation, so fix and report reuse what check
    /// already gathered instead of probing twice.
    cache: BTreeMap<CategoryKind, Category>,
}

impl App {
    fn new(config: CheckupConfig, json: bool) -> Self {
        Self {
            config,
            json,
            runner: SystemRunner,
            fs: SysRoot::system(),
            session: SessionInfo::from_env(),
            cache: BTreeMap::new(),
        }
    }

    fn probe_ctx(&self) -> ProbeCtx<'_> {
        ProbeCtx {
            runner: &self.runner,
            fs: &self.fs,
            timeouts: Timeouts {
                probe: self.config.timeouts.probe(),
                package: self.config.timeouts.package(),
            },
            session: self.session.clone(),
        }
    }

    fn fix_opts(&self) -> FixOptions {
        FixOptions {
            timeout: self.config.timeouts.fix(),
            use_sudo: !nix::unistd::geteuid().is_root(),
            allow_shell_fallback: self.config.fixes.allow_shell_fallback,
        }
    }

    /// Run one category (cached per invocation), with a spinner while the
    /// probes execute.
    fn run_category(&mut self, kind: CategoryKind) -> &Category {
        if !self.cache.contains_key(&kind) {
            let spinner = if self.json {
                None
            } else {
                let pb = ProgressBar::new_spinner();
                pb.set_style(
                    ProgressStyle::with_template("{spinner} {msg}")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
                pb.set_message(format!("Running {}...", kind.title()));
                pb.enable_steady_tick(Duration::from_millis(100));
                Some(pb)
            };

            let category = checkup::checks::run(kind, &self.probe_ctx());

            if let Some(pb) = spinner {
                pb.finish_and_clear();
            }
            self.cache.insert(kind, category);
        }
        &self.cache[&kind]
    }

    fn run_all(&mut self) {
        for kind in CategoryKind::ALL {
            self.run_category(kind);
        }
    }

    fn cmd_category(&mut self, kind: CategoryKind) {
        let category = self.run_category(kind).clone();
        if self.json {
            checkup::output::print_categories_json(&[category]);
        } else {
            checkup::output::print_category(&category);
        }
    }

    fn cmd_check(&mut self) {
        self.run_all();
        let categories: Vec<Category> = self.cache.values().cloned().collect();
        if self.json {
            checkup::output::print_categories_json(&categories);
        } else {
            for category in &categories {
                checkup::output::print_category(category);
            }
            checkup::output::print_summary(&categories);
        }
    }

    fn cmd_fix(&mut self, yes: bool) -> Result<()> {
        self.run_all();
        let categories: Vec<Category> = self.cache.values().cloned().collect();

        let fixable: Vec<_> = categories
            .iter()
            .flat_map(|c| c.fixable().into_iter().cloned())
            .collect();
        if fixable.is_empty() {
            println!("{}", "Nothing to fix.".green());
            return Ok(());
        }

        println!(
            "{}",
            format!("{} issue(s) with an automatic fix:", fixable.len()).bold()
        );
        for result in &fixable {
            println!("  • {}: {}", result.name, result.message);
        }
        println!();

        struct Yes;
        impl Prompt for Yes {
            fn confirm(&self, question: &str) -> bool {
                println!("{} [y/N] y", question);
                true
            }
        }

        let prompt: Box<dyn Prompt> = if yes { Box::new(Yes) } else { Box::new(StdinPrompt) };
        let opts = self.fix_opts();

        let mut applied = 0;
        let mut reboot = false;
        for result in &fixable {
            if let Some(outcome) = apply_fix(result, &self.runner, prompt.as_ref(), &opts) {
                checkup::output::print_fix_outcome(&result.name, &outcome);
                if outcome.success {
                    applied += 1;
                }
                reboot |= outcome.requires_reboot;
            }
        }

        println!();
        println!("{}", format!("{} fix(es) applied.", applied).bold());
        if reboot {
            println!("{}", "Reboot to finish applying driver changes.".yellow());
        }
        if applied > 0 {
            println!("  Run {} to verify.", "checkup check".cyan());
        }
        Ok(())
    }

    fn cmd_report(&mut self, output: Option<PathBuf>) -> Result<()> {
        self.run_all();

        let info = checkup::report::SystemInfo::collect(&self.fs);
        let path = output.unwrap_or_else(|| {
            checkup::report::default_path(self.config.report.output_dir.as_deref())
        });
        checkup::report::write(&path, &info, &self.cache)?;

        if self.json {
            println!(
                "{}",
                serde_json::json!({ "report": path.display().to_string() })
            );
        } else {
            println!("{} {}", "Report written to".green(), path.display());
        }
        Ok(())
    }

    fn cmd_setup(&mut self, task: SetupTask) {
        let opts = self.fix_opts();
        let outcomes = checkup::setup::run(task, &self.runner, &StdinPrompt, &opts);
        if outcomes.is_empty() {
            println!("No setup steps were run.");
            return;
        }
        for (summary, outcome) in &outcomes {
            checkup::output::print_fix_outcome(summary, outcome);
        }
    }

    fn run_menu(&mut self) -> Result<()> {
        println!("{}", "System Checkup".bold());

        let items = [
            "Health check",
            "Driver check",
            "Security check",
            "Desktop check",
            "Run everything",
            "Fix issues",
            "Generate HTML report",
        ];

        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        loop {
            let choice = {
                let mut input = stdin.lock();
                prompt_choice("What would you like to do?", &items, &mut input, &mut stdout)?
            };
            match choice {
                Choice::Item(0) => self.cmd_category(CategoryKind::Health),
                Choice::Item(1) => self.cmd_category(CategoryKind::Drivers),
                Choice::Item(2) => self.cmd_category(CategoryKind::Security),
                Choice::Item(3) => self.cmd_category(CategoryKind::Desktop),
                Choice::Item(4) => self.cmd_check(),
                Choice::Item(5) => self.cmd_fix(false)?,
                Choice::Item(6) => self.cmd_report(None)?,
                Choice::Item(_) => {}
                Choice::Quit => break,
            }
        }
        Ok(())
    }
}
