use std::time::Duration;

use serde::Serialize;

use crate::error::Result;
use crate::exec::Runner;
use crate::fix::Remedy;
use crate::sysroot::SysRoot;

/// Verdict of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    /// The inspected subsystem is in good shape.
    Pass,
    /// A real problem that needs attention.
    Fail,
    /// A finding worth looking at, not critical.
    Warn,
    /// Nothing to check: subsystem absent, or the check cannot run here.
    Skip,
    /// The check itself malfunctioned.
    Error,
}

/// Normalized outcome of one probe.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Remediation for this finding, when one exists. `fix_available` from
    /// the outside world is simply `remedy.is_some()` - the two can never
    /// disagree.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remedy: Option<Remedy>,
}

impl CheckResult {
    pub fn new(
        name: impl Into<String>,
        status: CheckStatus,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            status,
            message: message.into(),
            details: None,
            remedy: None,
        }
    }

    pub fn details(mut self, value: impl Into<String>) -> Self {
        self.details = Some(value.into());
        self
    }

    pub fn remedy(mut self, remedy: Remedy) -> Self {
        self.remedy = Some(remedy);
        self
    }

    pub fn fix_available(&self) -> bool {
        self.remedy.is_some()
    }
}

/// The four fixed probe groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Health,
    Drivers,
    Security,
    Desktop,
}

impl CategoryKind {
    pub const ALL: [CategoryKind; 4] = [
        CategoryKind::Health,
        CategoryKind::Drivers,
        CategoryKind::Security,
        CategoryKind::Desktop,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            CategoryKind::Health => "Health Check",
            CategoryKind::Drivers => "Driver Check",
            CategoryKind::Security => "Security Check",
            CategoryKind::Desktop => "Desktop Check",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            CategoryKind::Health => "♥",
            CategoryKind::Drivers => "⚙",
            CategoryKind::Security => "🛡",
            CategoryKind::Desktop => "🖥",
        }
    }
}

/// Results of one probe-group run, in probe execution order.
/// Immutable once the aggregator returns it.
#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub kind: CategoryKind,
    pub name: String,
    pub results: Vec<CheckResult>,
}

impl Category {
    fn count(&self, status: CheckStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    pub fn passed(&self) -> usize {
        self.count(CheckStatus::Pass)
    }

    pub fn failed(&self) -> usize {
        self.count(CheckStatus::Fail)
    }

    pub fn warnings(&self) -> usize {
        self.count(CheckStatus::Warn)
    }

    pub fn skipped(&self) -> usize {
        self.count(CheckStatus::Skip)
    }

    pub fn errors(&self) -> usize {
        self.count(CheckStatus::Error)
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Weighted pass rate, 0-100. Pass counts 1.0, Warn 0.5; Skip and
    /// Error stay in the denominator with zero weight. An empty category
    /// scores 100.
    pub fn score(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 100.0;
        }
        let weighted = self.passed() as f64 + 0.5 * self.warnings() as f64;
        (weighted / total as f64) * 100.0
    }

    /// Worst-of aggregation: Fail beats Warn beats Pass. Skip and Error
    /// do not drive the overall status.
    pub fn overall_status(&self) -> CheckStatus {
        if self.failed() > 0 {
            CheckStatus::Fail
        } else if self.warnings() > 0 {
            CheckStatus::Warn
        } else {
            CheckStatus::Pass
        }
    }

    /// Results that carry a remediation and actually need one.
    pub fn fixable(&self) -> Vec<&CheckResult> {
        self.results
            .iter()
            .filter(|r| {
                r.fix_available()
                    && matches!(r.status, CheckStatus::Fail | CheckStatus::Warn)
            })
            .collect()
    }
}

/// Timeout tiers for external commands run by probes.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    /// Ordinary inspection commands.
    pub probe: Duration,
    /// Package-database queries (dnf can be slow on cold cache).
    pub package: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            probe: Duration::from_secs(10),
            package: Duration::from_secs(60),
        }
    }
}

/// Desktop session facts captured from the environment once per run, so
/// probes stay pure functions of their context.
#[derive(Debug, Clone, Default)]
pub struct SessionInfo {
    pub current_desktop: String,
    pub session_type: String,
    pub wayland_display: String,
    pub x11_display: String,
}

impl SessionInfo {
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).unwrap_or_default();
        Self {
            current_desktop: var("XDG_CURRENT_DESKTOP").to_lowercase(),
            session_type: var("XDG_SESSION_TYPE").to_lowercase(),
            wayland_display: var("WAYLAND_DISPLAY"),
            x11_display: var("DISPLAY"),
        }
    }
}

/// Everything a probe may consult. Probes read through these capabilities
/// and never touch globals, so swapping the runner or the filesystem root
/// swaps the whole world out from under them.
pub struct ProbeCtx<'a> {
    pub runner: &'a dyn Runner,
    pub fs: &'a SysRoot,
    pub timeouts: Timeouts,
    pub session: SessionInfo,
}

/// One inspection routine. The `Err` path is the "probe malfunctioned"
/// escape hatch; the aggregator turns it into an Error-status result.
pub struct Probe {
    pub name: &'static str,
    pub run: fn(&ProbeCtx) -> Result<CheckResult>,
}

/// Run a probe group in order, isolating individual failures. Always
/// returns a well-formed Category with exactly one result per probe.
pub fn run_category(kind: CategoryKind, probes: &[Probe], ctx: &ProbeCtx) -> Category {
    let mut results = Vec::with_capacity(probes.len());

    for probe in probes {
        let result = match (probe.run)(ctx) {
            Ok(result) => result,
            Err(e) => CheckResult::new(
                probe.name,
                CheckStatus::Error,
                format!("check failed: {}", e),
            ),
        };
        results.push(result);
    }

    Category {
        kind,
        name: kind.title().to_string(),
        results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::exec::ScriptedRunner;

    fn ctx<'a>(runner: &'a ScriptedRunner, fs: &'a SysRoot) -> ProbeCtx<'a> {
        ProbeCtx {
            runner,
            fs,
            timeouts: Timeouts::default(),
            session: SessionInfo::default(),
        }
    }

    fn category(statuses: &[CheckStatus]) -> Category {
        Category {
            kind: CategoryKind::Health,
            name: CategoryKind::Health.title().to_string(),
            results: statuses
                .iter()
                .enumerate()
                .map(|(i, &s)| CheckResult::new(format!("check {}", i), s, "msg"))
                .collect(),
        }
    }

    #[test]
    fn test_empty_category_scores_100() {
        let cat = category(&[]);
        assert_eq!(cat.score(), 100.0);
        assert_eq!(cat.overall_status(), CheckStatus::Pass);
    }

    #[test]
    fn test_all_pass_scores_100() {
        let cat = category(&[CheckStatus::Pass; 4]);
        assert_eq!(cat.score(), 100.0);
        assert_eq!(cat.overall_status(), CheckStatus::Pass);
    }

    #[test]
    fn test_skip_counts_in_denominator() {
        // One Skip among nine Pass: 90, not 100.
        let mut statuses = vec![CheckStatus::Pass; 9];
        statuses.push(CheckStatus::Skip);
        let cat = category(&statuses);
        assert_eq!(cat.score(), 90.0);
        assert_eq!(cat.overall_status(), CheckStatus::Pass);
    }

    #[test]
    fn test_error_counts_in_denominator() {
        let cat = category(&[CheckStatus::Pass, CheckStatus::Error]);
        assert_eq!(cat.score(), 50.0);
        assert_eq!(cat.overall_status(), CheckStatus::Pass);
    }

    #[test]
    fn test_mixed_category_example() {
        let cat = category(&[
            CheckStatus::Pass,
            CheckStatus::Pass,
            CheckStatus::Warn,
            CheckStatus::Fail,
            CheckStatus::Skip,
        ]);
        assert_eq!(cat.passed(), 2);
        assert_eq!(cat.failed(), 1);
        assert_eq!(cat.warnings(), 1);
        assert_eq!(cat.skipped(), 1);
        assert_eq!(cat.total(), 5);
        assert_eq!(cat.score(), 50.0);
        assert_eq!(cat.overall_status(), CheckStatus::Fail);
    }

    #[test]
    fn test_warn_drives_overall_when_no_fail() {
        let cat = category(&[CheckStatus::Pass, CheckStatus::Warn]);
        assert_eq!(cat.overall_status(), CheckStatus::Warn);
    }

    #[test]
    fn test_score_bounds() {
        let cat = category(&[
            CheckStatus::Fail,
            CheckStatus::Error,
            CheckStatus::Skip,
        ]);
        assert_eq!(cat.score(), 0.0);

        let cat = category(&[CheckStatus::Warn, CheckStatus::Warn]);
        assert_eq!(cat.score(), 50.0);
    }

    #[test]
    fn test_aggregator_isolates_probe_faults() {
        fn good(_: &ProbeCtx) -> Result<CheckResult> {
            Ok(CheckResult::new("good", CheckStatus::Pass, "fine"))
        }
        fn bad(_: &ProbeCtx) -> Result<CheckResult> {
            Err(Error::Probe("unexpected parse failure".to_string()))
        }

        let probes = [
            Probe { name: "first", run: good },
            Probe { name: "broken", run: bad },
            Probe { name: "last", run: good },
        ];

        let runner = ScriptedRunner::new();
        let fs = SysRoot::new("/nonexistent");
        let cat = run_category(CategoryKind::Health, &probes, &ctx(&runner, &fs));

        assert_eq!(cat.total(), 3);
        assert_eq!(cat.results[0].status, CheckStatus::Pass);
        assert_eq!(cat.results[1].status, CheckStatus::Error);
        assert_eq!(cat.results[1].name, "broken");
        assert!(!cat.results[1].message.is_empty());
        assert_eq!(cat.results[2].status, CheckStatus::Pass);
    }

    #[test]
    fn test_fix_available_matches_remedy() {
        let without = CheckResult::new("a", CheckStatus::Fail, "broken");
        assert!(!without.fix_available());

        let with = CheckResult::new("a", CheckStatus::Fail, "broken")
            .remedy(Remedy::Command("true".to_string()));
        assert!(with.fix_available());
    }

    #[test]
    fn test_fixable_excludes_passing_results() {
        let mut cat = category(&[]);
        cat.results.push(
            CheckResult::new("warned", CheckStatus::Warn, "hm")
                .remedy(Remedy::Command("true".to_string())),
        );
        cat.results.push(
            CheckResult::new("passed", CheckStatus::Pass, "ok")
                .remedy(Remedy::Command("true".to_string())),
        );
        cat.results
            .push(CheckResult::new("failed", CheckStatus::Fail, "bad"));

        let fixable = cat.fixable();
        assert_eq!(fixable.len(), 1);
        assert_eq!(fixable[0].name, "warned");
    }
}
