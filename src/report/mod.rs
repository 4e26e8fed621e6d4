//! Self-contained HTML report generation.
//!
//! The report is written to a temp file in the destination directory and
//! renamed into place, so a crash mid-write never leaves a truncated
//! report at the final path.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::check::{Category, CategoryKind, CheckStatus};
use crate::error::{Error, Result};
use crate::sysroot::SysRoot;

/// Basic facts about the machine, for the report header.
#[derive(Debug, Clone, Default)]
pub struct SystemInfo {
    pub os_name: String,
    pub kernel: String,
    pub hostname: String,
    pub cpu_model: String,
    pub total_memory_gb: f64,
}

impl SystemInfo {
    pub fn collect(fs: &SysRoot) -> Self {
        let os_name = fs
            .read_optional("etc/os-release")
            .ok()
            .flatten()
            .and_then(|contents| parse_os_release(&contents))
            .unwrap_or_else(|| "Linux".to_string());

        let kernel = fs
            .read_optional("proc/version")
            .ok()
            .flatten()
            .and_then(|v| {
                v.split_whitespace().nth(2).map(|s| s.to_string())
            })
            .unwrap_or_default();

        let hostname = fs
            .read_optional("proc/sys/kernel/hostname")
            .ok()
            .flatten()
            .unwrap_or_default();

        let cpu_model = fs
            .read_optional("proc/cpuinfo")
            .ok()
            .flatten()
            .and_then(|contents| parse_cpu_model(&contents))
            .unwrap_or_default();

        let total_memory_gb = fs
            .read_optional("proc/meminfo")
            .ok()
            .flatten()
            .and_then(|contents| parse_total_memory_kb(&contents))
            .map(|kb| kb as f64 / (1024.0 * 1024.0))
            .unwrap_or_default();

        Self {
            os_name,
            kernel,
            hostname,
            cpu_model,
            total_memory_gb,
        }
    }
}

fn parse_os_release(contents: &str) -> Option<String> {
    contents.lines().find_map(|line| {
        let value = line.strip_prefix("PRETTY_NAME=")?;
        Some(value.trim_matches('"').to_string())
    })
}

fn parse_cpu_model(cpuinfo: &str) -> Option<String> {
    cpuinfo.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        (key.trim() == "model name").then(|| value.trim().to_string())
    })
}

fn parse_total_memory_kb(meminfo: &str) -> Option<u64> {
    meminfo.lines().find_map(|line| {
        let rest = line.strip_prefix("MemTotal:")?;
        rest.trim().split_whitespace().next()?.parse().ok()
    })
}

/// Default report path: `checkup_report_<timestamp>.html` in `dir`, or
/// the home directory when no dir is configured.
pub fn default_path(dir: Option<&Path>) -> PathBuf {
    let dir = dir
        .map(|d| d.to_path_buf())
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."));
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    dir.join(format!("checkup_report_{}.html", stamp))
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn status_label(status: CheckStatus) -> (&'static str, &'static str) {
    match status {
        CheckStatus::Pass => ("pass", "Pass"),
        CheckStatus::Fail => ("fail", "Fail"),
        CheckStatus::Warn => ("warn", "Warn"),
        CheckStatus::Skip => ("skip", "Skip"),
        CheckStatus::Error => ("error", "Error"),
    }
}

fn score_class(score: f64) -> &'static str {
    if score >= 80.0 {
        "good"
    } else if score >= 50.0 {
        "mid"
    } else {
        "bad"
    }
}

const STYLE: &str = "\
body { font-family: sans-serif; max-width: 900px; margin: 2em auto; color: #222; }
h1 { border-bottom: 2px solid #444; padding-bottom: 0.3em; }
table { border-collapse: collapse; width: 100%; margin: 1em 0; }
th, td { text-align: left; padding: 0.4em 0.6em; border-bottom: 1px solid #ddd; vertical-align: top; }
th { background: #f4f4f4; }
.pass { color: #2a7d2a; font-weight: bold; }
.fail { color: #c0392b; font-weight: bold; }
.warn { color: #b8860b; font-weight: bold; }
.skip { color: #888; }
.error { color: #8e44ad; font-weight: bold; }
.bar { background: #eee; border-radius: 4px; height: 14px; width: 200px; display: inline-block; }
.bar > div { height: 14px; border-radius: 4px; }
.good { background: #2a7d2a; }
.mid { background: #b8860b; }
.bad { background: #c0392b; }
.details { color: #666; font-size: 0.9em; white-space: pre-line; }
.score { font-size: 2.5em; font-weight: bold; }
";

fn render(info: &SystemInfo, categories: &BTreeMap<CategoryKind, Category>) -> String {
    let mut html = String::new();
    let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");

    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>System Checkup Report</title>\n");
    html.push_str(&format!("<style>{}</style>\n</head>\n<body>\n", STYLE));
    html.push_str("<h1>System Checkup Report</h1>\n");
    html.push_str(&format!("<p>Generated {}</p>\n", now));

    // System facts
    html.push_str("<h2>System</h2>\n<table>\n");
    let rows = [
        ("Operating System", info.os_name.clone()),
        ("Kernel", info.kernel.clone()),
        ("Hostname", info.hostname.clone()),
        ("CPU", info.cpu_model.clone()),
        ("Memory", format!("{:.1} GB", info.total_memory_gb)),
    ];
    for (label, value) in rows {
        if !value.is_empty() && value != "0.0 GB" {
            html.push_str(&format!(
                "<tr><th>{}</th><td>{}</td></tr>\n",
                label,
                html_escape(&value)
            ));
        }
    }
    html.push_str("</table>\n");

    // Overall score
    let overall = if categories.is_empty() {
        100.0
    } else {
        categories.values().map(|c| c.score()).sum::<f64>() / categories.len() as f64
    };
    html.push_str(&format!(
        "<h2>Overall</h2>\n<p class=\"score {}\">{:.0}/100</p>\n",
        match score_class(overall) {
            "good" => "pass",
            "mid" => "warn",
            _ => "fail",
        },
        overall
    ));

    // Per-category score bars
    html.push_str("<table>\n");
    for category in categories.values() {
        let score = category.score();
        html.push_str(&format!(
            "<tr><th>{}</th><td><span class=\"bar\"><div class=\"{}\" style=\"width:{:.0}%\"></div></span> {:.0}/100</td></tr>\n",
            html_escape(&category.name),
            score_class(score),
            score,
            score
        ));
    }
    html.push_str("</table>\n");

    // Per-category result tables
    for category in categories.values() {
        html.push_str(&format!("<h2>{}</h2>\n<table>\n", html_escape(&category.name)));
        html.push_str("<tr><th>Check</th><th>Status</th><th>Result</th></tr>\n");
        for result in &category.results {
            let (class, label) = status_label(result.status);
            let mut cell = html_escape(&result.message);
            if let Some(details) = &result.details {
                cell.push_str(&format!(
                    "<div class=\"details\">{}</div>",
                    html_escape(details)
                ));
            }
            html.push_str(&format!(
                "<tr><td>{}</td><td class=\"{}\">{}</td><td>{}</td></tr>\n",
                html_escape(&result.name),
                class,
                label,
                cell
            ));
        }
        html.push_str("</table>\n");
    }

    // Recommendations
    let fixable: Vec<_> = categories
        .values()
        .flat_map(|c| c.fixable().into_iter().map(move |r| (c.name.clone(), r)))
        .collect();
    if !fixable.is_empty() {
        html.push_str("<h2>Recommendations</h2>\n<ul>\n");
        for (category_name, result) in fixable {
            let fix_note = result
                .remedy
                .as_ref()
                .map(|r| format!(" &mdash; automatic fix: {}", html_escape(&r.summary())))
                .unwrap_or_default();
            html.push_str(&format!(
                "<li><strong>{}</strong> ({}): {}{}</li>\n",
                html_escape(&result.name),
                html_escape(&category_name),
                html_escape(&result.message),
                fix_note
            ));
        }
        html.push_str("</ul>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

/// Render the report and write it atomically to `path`.
pub fn write(
    path: &Path,
    info: &SystemInfo,
    categories: &BTreeMap<CategoryKind, Category>,
) -> Result<()> {
    let html = render(info, categories);

    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let mut tmp = tempfile::NamedTempFile::new_in(dir.unwrap_or(Path::new(".")))
        .map_err(|e| Error::Report {
            path: path.to_path_buf(),
            source: e,
        })?;
    tmp.write_all(html.as_bytes()).map_err(|e| Error::Report {
        path: path.to_path_buf(),
        source: e,
    })?;
    tmp.persist(path).map_err(|e| Error::Report {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}
