use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use crate::setup::SetupTask;

#[derive(Parser)]
#[command(
    name = "checkup",
    about = "Health, driver, security and desktop diagnostics for Linux desktops, with guided fixes",
    version
)]
pub struct Cli {
    /// Run without a subcommand for the interactive menu.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Output as JSON instead of formatted text
    #[arg(long, global = true)]
    pub json: bool,

    /// Use this config file instead of the system/user configs
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the system health checks (disk, memory, services, packages)
    Health,

    /// Run the hardware driver checks (GPU, WiFi, audio, firmware)
    Drivers,

    /// Run the security checks (firewall, SELinux, SSH, updates)
    Security,

    /// Run the desktop environment checks (session, display, Flatpak)
    Desktop,

    /// Run every check category and print a summary
    Check,

    /// Run all checks, then offer to fix what can be fixed
    Fix {
        /// Answer yes to every fix confirmation
        #[arg(long)]
        yes: bool,
    },

    /// Run all checks and write an HTML report
    Report {
        /// Report file path (default: timestamped file in home directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Post-install setup helpers (repos, codecs, dev tools)
    Setup {
        #[arg(value_enum)]
        task: SetupTask,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for (auto-detected if omitted)
        shell: Option<Shell>,
    },
}

/// Print shell completions to stdout.
pub fn print_completions(shell: Option<Shell>) {
    let shell = shell.or_else(Shell::from_env).unwrap_or_else(|| {
        eprintln!(
            "Could not detect shell. Specify one: checkup completions bash|zsh|fish|elvish|powershell"
        );
        std::process::exit(1);
    });
    clap_complete::generate(shell, &mut Cli::command(), "checkup", &mut std::io::stdout());
}
