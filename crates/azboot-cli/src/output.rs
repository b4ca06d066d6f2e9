use std::io::Write;

use azboot_workflow::{
    CheckResult, CheckStatus, Progress, SetupReport, SetupSummary, Step, StepStatus, ValidationReport,
};

/// Render one setup step as a progress line.
pub fn render_step(step: &Step) -> String {
    let (marker, verb) = match step.status {
        StepStatus::Existing => ("=", "already exists"),
        StepStatus::Created => ("+", "created"),
        StepStatus::Planned => ("~", "would be created"),
    };
    let mut line = format!("{} {} '{}' {}", marker, step.kind, step.key, verb);
    if let Some(d) = &step.detail {
        line.push_str(&format!(" ({})", d));
    }
    line
}

pub fn render_check(check: &CheckResult) -> String {
    let mark = match check.status {
        CheckStatus::Pass => "PASS",
        CheckStatus::Fail => "FAIL",
        CheckStatus::Warn => "WARN",
    };
    format!("[{}] {}: {}", mark, check.kind.label(), check.detail)
}

/// The lines after the step list: counts, the JSON summary and the secrets a
/// workflow needs.
pub fn render_setup_report(report: &SetupReport) -> serde_json::Result<String> {
    let mut out = String::new();
    let created = report.count(StepStatus::Created);
    let planned = report.count(StepStatus::Planned);
    if report.dry_run {
        out.push_str(&format!("{} resource(s) would be created (dry run).\n", planned));
    } else if report.all_existing() {
        out.push_str("Everything already exists; nothing changed.\n");
    } else {
        out.push_str(&format!("{} resource(s) created.\n", created));
    }

    out.push('\n');
    out.push_str(&serde_json::to_string_pretty(&report.summary)?);
    out.push_str("\n\n");
    out.push_str(&render_secrets(&report.summary));
    Ok(out)
}

fn render_secrets(summary: &SetupSummary) -> String {
    let client_id = summary.client_id.as_deref().unwrap_or("<created on apply>");
    format!(
        "GitHub secrets for azure/login:\n  AZURE_CLIENT_ID={}\n  AZURE_TENANT_ID={}\n  AZURE_SUBSCRIPTION_ID={}\n",
        client_id, summary.tenant_id, summary.subscription_id
    )
}

pub fn render_validation_text(report: &ValidationReport) -> String {
    let mut out = format!("{}/{} checks passed", report.passed(), report.total());
    if report.warned() > 0 {
        out.push_str(&format!(" ({} warning(s))", report.warned()));
    }
    out.push('\n');
    if !report.remediation.is_empty() {
        out.push_str("\nRemediation:\n");
        for (i, r) in report.remediation.iter().enumerate() {
            out.push_str(&format!("  {}. {}\n", i + 1, r));
        }
    }
    out
}

/// Prints steps and checks to stdout as they complete.
pub struct StdoutProgress {
    /// Off for `--output json`, where stdout carries only the report.
    pub enabled: bool,
}

impl StdoutProgress {
    fn emit(&self, line: String) {
        if self.enabled {
            let mut out = std::io::stdout().lock();
            let _ = writeln!(out, "{}", line);
        }
    }
}

impl Progress for StdoutProgress {
    fn step(&mut self, step: &Step) {
        self.emit(render_step(step));
    }

    fn check(&mut self, check: &CheckResult) {
        self.emit(render_check(check));
    }
}
