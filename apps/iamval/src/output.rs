//! Output rendering for validation findings.
//!
//! Supports `human` (default) and `json` outputs for the CLI, an HTML
//! fragment for the web page, and a remediation prompt built from findings.
//! Finding order is always the order the service returned.

use crate::models::{Finding, Outcome, PolicyDocument, Severity, ValidationRun};
use crate::utils::use_colors;
use owo_colors::OwoColorize;
use serde_json::json;
use serde_json::Value as JsonVal;

pub const PASSED_HTML: &str = "✅ No issues found! Policy looks good.";

/// Marker for a severity: `✖` critical, `▲` caution, `◆` informational.
pub fn severity_marker(sev: Severity, color: bool) -> String {
    let (icon, label) = match sev {
        Severity::Critical => ("✖", "⟦error⟧"),
        Severity::Caution => ("▲", "⟦warn⟧"),
        Severity::Info => ("◆", "⟦info⟧"),
    };
    if !color {
        return format!("{} {}", icon, label);
    }
    match sev {
        Severity::Critical => format!("{} {}", icon.red(), label.red().bold()),
        Severity::Caution => format!("{} {}", icon.yellow(), label.yellow().bold()),
        Severity::Info => format!("{} {}", icon.blue(), label.blue().bold()),
    }
}

/// Text rendering for one policy's findings.
///
/// An empty slice yields the single passed line; otherwise a count header and
/// one indented block per finding.
pub fn render_findings_text(name: &str, findings: &[Finding], color: bool) -> String {
    if findings.is_empty() {
        let line = format!("✅ {}: No issues found", name);
        return if color {
            line.green().to_string()
        } else {
            line
        };
    }
    let header = format!("⚠️  {}: {} issues found", name, findings.len());
    let mut out = vec![if color {
        header.bold().to_string()
    } else {
        header
    }];
    for (i, f) in findings.iter().enumerate() {
        out.push(format!(
            "  {} Finding #{}: {}",
            severity_marker(f.severity(), color),
            i + 1,
            f.kind_label()
        ));
        out.push(format!("     Issue: {}", f.code_label()));
        out.push(format!("     Details: {}", f.detail_label()));
        if let Some(link) = f.reference.as_deref() {
            out.push(format!("     Learn more: {}", link));
        }
    }
    out.join("\n")
}

/// HTML fragment for the web page. Remote text is escaped.
pub fn render_findings_html(findings: &[Finding]) -> String {
    if findings.is_empty() {
        return format!(
            "<div class=\"success\" data-testid=\"success-message\">{}</div>",
            PASSED_HTML
        );
    }
    let mut html = format!(
        "<div class=\"summary\" data-testid=\"findings-count\">⚠️ {} issues found</div>\n",
        findings.len()
    );
    for (i, f) in findings.iter().enumerate() {
        let (icon, class) = match f.severity() {
            Severity::Critical => ("🚨", "error"),
            Severity::Caution => ("⚠️", "warning"),
            Severity::Info => ("ℹ️", "info"),
        };
        html.push_str(&format!(
            "<div class=\"finding {class}\" data-testid=\"finding-{idx}\">\n  <strong>{icon} #{idx} {kind}</strong>: {code}<br>\n  {detail}",
            class = class,
            idx = i + 1,
            icon = icon,
            kind = escape_html(f.kind_label()),
            code = escape_html(f.code_label()),
            detail = escape_html(f.detail_label()),
        ));
        if let Some(link) = f.reference.as_deref() {
            html.push_str(&format!(
                "<br>\n  <a href=\"{}\" target=\"_blank\" rel=\"noopener\">Learn more</a>",
                escape_html(link)
            ));
        }
        html.push_str("\n</div>\n");
    }
    html
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Human report for a whole run. `template` adds the discovery header and
/// blank lines between policies.
pub fn render_run_text(run: &ValidationRun, template: bool, color: bool) -> String {
    let mut out = String::new();
    if template {
        out.push_str(&format!(
            "📋 Found {} policies to validate\n\n",
            run.reports.len()
        ));
    }
    for r in &run.reports {
        match &r.outcome {
            Outcome::Findings(f) => out.push_str(&render_findings_text(&r.name, f, color)),
            Outcome::Error(msg) => {
                let line = format!("❌ {}: {}", r.name, msg);
                out.push_str(&if color { line.red().to_string() } else { line });
            }
        }
        out.push('\n');
        if template {
            out.push('\n');
        }
    }
    let s = &run.summary;
    if s.findings == 0 && s.errors == 0 {
        out.push_str("🎉 All policies validated successfully!");
    } else if s.findings == 0 {
        out.push_str(&format!(
            "\n⚠️  Validation incomplete: {} of {} policies could not be validated",
            s.errors, s.policies
        ));
    } else {
        out.push_str(&format!(
            "\n📊 Summary: {} total findings across all policies",
            s.findings
        ));
        if s.errors > 0 {
            out.push_str(&format!(" ({} policies could not be validated)", s.errors));
        }
    }
    out
}

/// Print a run in the requested format.
pub fn print_run(run: &ValidationRun, output: &str, template: bool) {
    match output {
        "json" => println!(
            "{}",
            serde_json::to_string_pretty(&compose_run_json(run)).unwrap_or_default()
        ),
        _ => println!("{}", render_run_text(run, template, use_colors(output))),
    }
}

/// Print a failure that happened before any validation ran.
pub fn print_failure(message: &str, output: &str) {
    match output {
        "json" => println!(
            "{}",
            serde_json::to_string_pretty(&json!({ "error": message })).unwrap_or_default()
        ),
        _ => {
            let line = format!("❌ {}", message);
            if use_colors(output) {
                println!("{}", line.red());
            } else {
                println!("{}", line);
            }
        }
    }
}

/// Compose run JSON object (pure) for testing/snapshot purposes.
pub fn compose_run_json(run: &ValidationRun) -> JsonVal {
    serde_json::to_value(run).unwrap_or(JsonVal::Null)
}

/// Prompt asking an assistant to rewrite `policy` so the findings go away.
pub fn remediation_prompt(policy: &PolicyDocument, findings: &[Finding]) -> String {
    let issues: Vec<String> = findings
        .iter()
        .map(|f| format!("- {}: {}", f.code_label(), f.detail_label()))
        .collect();
    format!(
        "Fix this IAM policy to address the following security issues:\n\nCURRENT POLICY:\n{}\n\nISSUES FOUND:\n{}\n\nPlease provide a corrected policy that follows least privilege principles and addresses all the identified issues.",
        policy.to_pretty(),
        issues.join("\n")
    )
}
