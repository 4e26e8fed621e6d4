use crate::check::{Category, CheckResult, CheckStatus};
use crate::fix::FixOutcome;
use colored::Colorize;

const DIVIDER_W: usize = 64;

fn status_icon(status: CheckStatus) -> colored::ColoredString {
    match status {
        CheckStatus::Pass => "✓".green(),
        CheckStatus::Fail => "✗".red().bold(),
        CheckStatus::Warn => "⚠".yellow(),
        CheckStatus::Skip => "○".dimmed(),
        CheckStatus::Error => "!".magenta().bold(),
    }
}

fn print_result(result: &CheckResult) {
    println!("  {} {:<24} {}", status_icon(result.status), result.name, result.message);
    if let Some(details) = &result.details {
        for line in details.lines() {
            println!("      {}", line.dimmed());
        }
    }
    if result.fix_available() && matches!(result.status, CheckStatus::Fail | CheckStatus::Warn) {
        println!("      {}", "fix available".cyan());
    }
}

fn print_score(score: f64) {
    let score_str = format!("Score: {:.0}/100", score);
    if score >= 80.0 {
        println!("  {}", score_str.green().bold());
    } else if score >= 50.0 {
        println!("  {}", score_str.yellow().bold());
    } else {
        println!("  {}", score_str.red().bold());
    }
}

pub fn print_category(category: &Category) {
    let title = format!("{} {}", category.kind.icon(), category.name);
    let fill = DIVIDER_W.saturating_sub(3 + title.chars().count());
    println!("── {} {}", title.bold(), "─".repeat(fill));

    for result in &category.results {
        print_result(result);
    }

    println!("{}", "─".repeat(DIVIDER_W));
    let counts = format!(
        "{} passed, {} failed, {} warnings, {} skipped",
        category.passed(),
        category.failed(),
        category.warnings(),
        category.skipped() + category.errors(),
    );
    println!("  {}", counts.dimmed());
    print_score(category.score());
    println!();
}

pub fn print_summary(categories: &[Category]) {
    if categories.is_empty() {
        return;
    }

    let title = "Summary";
    let fill = DIVIDER_W.saturating_sub(2 + title.len());
    println!("── {} {}", title.bold(), "─".repeat(fill));

    for category in categories {
        let icon = status_icon(category.overall_status());
        println!(
            "  {} {:<16} {:.0}/100",
            icon,
            category.name,
            category.score()
        );
    }

    let overall =
        categories.iter().map(|c| c.score()).sum::<f64>() / categories.len() as f64;
    println!("{}", "─".repeat(DIVIDER_W));
    print_score(overall);

    let fixable: usize = categories.iter().map(|c| c.fixable().len()).sum();
    if fixable > 0 {
        println!(
            "  {}",
            format!("{} issue(s) have an automatic fix. Run 'checkup fix'.", fixable).cyan()
        );
    }
}

pub fn print_fix_outcome(name: &str, outcome: &FixOutcome) {
    if outcome.success {
        println!("  {} {}: {}", "✓".green(), name, outcome.message);
    } else {
        println!("  {} {}: {}", "✗".red().bold(), name, outcome.message);
    }
    for line in outcome.details.lines() {
        println!("      {}", line.dimmed());
    }
    if outcome.requires_reboot {
        println!("      {}", "reboot required for this change to take effect".yellow());
    }
}

fn category_json(category: &Category) -> serde_json::Value {
    serde_json::json!({
        "category": category.kind,
        "name": category.name,
        "score": category.score(),
        "status": category.overall_status(),
        "passed": category.passed(),
        "failed": category.failed(),
        "warnings": category.warnings(),
        "skipped": category.skipped(),
        "errors": category.errors(),
        "results": category.results.iter().map(|r| serde_json::json!({
            "name": r.name,
            "status": r.status,
            "message": r.message,
            "details": r.details,
            "fix_available": r.fix_available(),
            "remedy": r.remedy,
        })).collect::<Vec<_>>(),
    })
}

pub fn print_categories_json(categories: &[Category]) {
    let overall = if categories.is_empty() {
        100.0
    } else {
        categories.iter().map(|c| c.score()).sum::<f64>() / categories.len() as f64
    };
    let output = serde_json::json!({
        "overall_score": overall,
        "categories": categories.iter().map(category_json).collect::<Vec<_>>(),
    });

    println!("{}", serde_json::to_string_pretty(&output).unwrap());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::CategoryKind;

    #[test]
    fn test_category_json_shape() {
        let category = Category {
            kind: CategoryKind::Security,
            name: CategoryKind::Security.title().to_string(),
            results: vec![
                CheckResult::new("Firewall", CheckStatus::Pass, "active"),
                CheckResult::new("SELinux", CheckStatus::Warn, "permissive")
                    .remedy(crate::fix::Remedy::EnforceSelinux),
            ],
        };

        let value = category_json(&category);
        assert_eq!(value["category"], "security");
        assert_eq!(value["score"], 75.0);
        assert_eq!(value["results"][0]["status"], "pass");
        assert_eq!(value["results"][1]["fix_available"], true);
        assert_eq!(value["results"][1]["remedy"], "enforce_selinux");
        assert!(value["results"][0]["details"].is_null());
    }
}
