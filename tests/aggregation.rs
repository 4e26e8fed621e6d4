//! End-to-end tests over mock roots and scripted runners: category
//! aggregation, fix gating, report output, and real subprocess timeouts.

use std::collections::BTreeMap;
use std::fs;
use std::time::{Duration, Instant};

use checkup::check::{CategoryKind, CheckStatus, ProbeCtx, SessionInfo, Timeouts};
use checkup::exec::{Runner, ScriptedRunner, SystemRunner};
use checkup::fix::{apply_fix, FixOptions, Prompt};
use checkup::sysroot::SysRoot;

struct Always(bool);

impl Prompt for Always {
    fn confirm(&self, _question: &str) -> bool {
        self.0
    }
}

fn ctx<'a>(runner: &'a ScriptedRunner, fs_root: &'a SysRoot) -> ProbeCtx<'a> {
    ProbeCtx {
        runner,
        fs: fs_root,
        timeouts: Timeouts::default(),
        session: SessionInfo::default(),
    }
}

/// A minimal but plausible /proc and /etc for the health category.
fn healthy_mock_root() -> tempfile::TempDir {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    fs::create_dir_all(root.join("proc")).unwrap();
    fs::write(
        root.join("proc/mounts"),
        "/dev/nvme0n1p3 / btrfs rw 0 0\nproc /proc proc rw 0 0\n",
    )
    .unwrap();
    fs::write(
        root.join("proc/meminfo"),
        "MemTotal: 16000000 kB\nMemAvailable: 9000000 kB\nSwapTotal: 8000000 kB\nSwapFree: 7900000 kB\n",
    )
    .unwrap();
    fs::write(root.join("proc/loadavg"), "0.42 0.38 0.35 1/900 12345\n").unwrap();
    fs::create_dir_all(root.join("proc/1")).unwrap();
    fs::write(root.join("proc/1/stat"), "1 (systemd) S 0 1 1 0 -1\n").unwrap();
    tmp
}

#[test]
fn health_category_over_mock_root() {
    let tmp = healthy_mock_root();
    let fs_root = SysRoot::new(tmp.path());
    let runner = ScriptedRunner::new()
        .respond("systemctl --failed --no-legend --no-pager", true, "")
        .respond("which dnf", true, "/usr/bin/dnf")
        .respond("dnf check --quiet", true, "")
        .respond("journalctl -p err -b --no-pager -q", true, "one error\n")
        .respond("dnf repoquery --extras --quiet", true, "");

    let category = checkup::checks::run(CategoryKind::Health, &ctx(&runner, &fs_root));

    // One result per probe, in order, no panics on the missing thermal dir.
    assert_eq!(category.total(), 10);
    assert_eq!(category.results[0].name, "Disk Space");
    assert_eq!(category.results[1].status, CheckStatus::Pass); // memory
    assert_eq!(category.results[2].status, CheckStatus::Skip); // no sensors
    assert_eq!(category.results[4].status, CheckStatus::Pass); // no failed units
    assert_eq!(category.results[7].status, CheckStatus::Pass); // dnf healthy

    // Score stays in range and reflects the skip in the denominator.
    let score = category.score();
    assert!((0.0..=100.0).contains(&score));
    assert!(score < 100.0);
}

#[test]
fn security_category_is_total_even_when_everything_is_missing() {
    // Empty root, no scripted commands: every probe must still produce
    // exactly one well-formed result.
    let tmp = tempfile::tempdir().unwrap();
    let fs_root = SysRoot::new(tmp.path());
    let runner = ScriptedRunner::new();

    let category = checkup::checks::run(CategoryKind::Security, &ctx(&runner, &fs_root));

    assert_eq!(category.total(), 12);
    for result in &category.results {
        assert!(!result.name.is_empty());
        assert!(!result.message.is_empty());
    }
    assert!((0.0..=100.0).contains(&category.score()));
}

#[test]
fn all_four_categories_produce_expected_probe_counts() {
    let tmp = tempfile::tempdir().unwrap();
    let fs_root = SysRoot::new(tmp.path());
    let runner = ScriptedRunner::new();
    let ctx = ctx(&runner, &fs_root);

    let expected = [
        (CategoryKind::Health, 10),
        (CategoryKind::Drivers, 10),
        (CategoryKind::Security, 12),
        (CategoryKind::Desktop, 10),
    ];
    for (kind, count) in expected {
        let category = checkup::checks::run(kind, &ctx);
        assert_eq!(category.total(), count, "{:?}", kind);
        assert_eq!(category.name, kind.title());
    }
}

#[test]
fn declined_fixes_execute_nothing_across_a_whole_category() {
    let tmp = tempfile::tempdir().unwrap();
    let fs_root = SysRoot::new(tmp.path());
    let probe_runner = ScriptedRunner::new();
    let category = checkup::checks::run(CategoryKind::Drivers, &ctx(&probe_runner, &fs_root));

    // Fresh runner for the fix phase: any call it sees came from a fix.
    let fix_runner = ScriptedRunner::new();
    let opts = FixOptions {
        use_sudo: false,
        ..FixOptions::default()
    };
    for result in category.fixable() {
        let outcome = apply_fix(result, &fix_runner, &Always(false), &opts);
        assert!(outcome.is_none());
    }
    assert_eq!(fix_runner.call_count(), 0);
}

#[test]
fn accepted_fix_runs_and_reports_reboot() {
    let runner = ScriptedRunner::new().respond(
        "dnf install -y alsa-firmware sof-firmware pipewire-alsa",
        true,
        "Complete!",
    );
    let result = checkup::check::CheckResult::new(
        "Audio Devices",
        CheckStatus::Fail,
        "No sound cards detected",
    )
    .remedy(checkup::fix::Remedy::InstallAudioFirmware);

    let opts = FixOptions {
        use_sudo: false,
        ..FixOptions::default()
    };
    let outcome = apply_fix(&result, &runner, &Always(true), &opts).unwrap();
    assert!(outcome.success);
    assert!(outcome.requires_reboot);
    assert_eq!(runner.call_count(), 1);
}

#[test]
fn system_runner_kills_on_timeout() {
    let start = Instant::now();
    let out = SystemRunner.run("sleep", &["10"], Duration::from_millis(200));

    assert!(!out.success);
    assert!(out.timed_out);
    // Bounded well below the child's own duration.
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[test]
fn interrupt_terminates_with_exit_code_zero() {
    // Child branch: install the handler, interrupt ourselves, and fail
    // loudly if the handler does not exit first.
    if std::env::var("CHECKUP_INTERRUPT_CHILD").as_deref() == Ok("1") {
        checkup::exec::install_interrupt_handler();
        nix::sys::signal::raise(nix::sys::signal::Signal::SIGINT).unwrap();
        std::thread::sleep(Duration::from_secs(5));
        std::process::exit(1);
    }

    // Parent branch: re-run just this test in a child process and check
    // that the interrupt produced a clean exit, not signal death (130).
    let exe = std::env::current_exe().unwrap();
    let status = std::process::Command::new(exe)
        .args(["interrupt_terminates_with_exit_code_zero", "--exact"])
        .env("CHECKUP_INTERRUPT_CHILD", "1")
        .status()
        .unwrap();
    assert_eq!(status.code(), Some(0));
}

#[test]
fn report_end_to_end_from_mock_root() {
    let tmp = healthy_mock_root();
    fs::create_dir_all(tmp.path().join("etc")).unwrap();
    fs::write(
        tmp.path().join("etc/os-release"),
        "PRETTY_NAME=\"Fedora Linux 40\"\n",
    )
    .unwrap();

    let fs_root = SysRoot::new(tmp.path());
    let runner = ScriptedRunner::new();
    let category = checkup::checks::run(CategoryKind::Health, &ctx(&runner, &fs_root));

    let mut categories = BTreeMap::new();
    categories.insert(CategoryKind::Health, category);

    let info = checkup::report::SystemInfo::collect(&fs_root);
    let out_dir = tempfile::tempdir().unwrap();
    let path = out_dir.path().join("report.html");
    checkup::report::write(&path, &info, &categories).unwrap();

    let html = fs::read_to_string(&path).unwrap();
    assert!(html.contains("Fedora Linux 40"));
    assert!(html.contains("Health Check"));
    assert!(html.trim_end().ends_with("</html>"));
}
