//! Rendering of operation results.

use clap::ValueEnum;
use sdk::{BatchItemFailure, IntegrationStatusResponse, ScanResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Table,
    Json,
}

pub fn scan(result: &ScanResponse, format: Format) -> anyhow::Result<String> {
    match format {
        Format::Json => Ok(serde_json::to_string_pretty(result)?),
        Format::Table => Ok(scan_table(result)),
    }
}

pub fn scans(results: &[ScanResponse], format: Format) -> anyhow::Result<String> {
    match format {
        Format::Json => Ok(serde_json::to_string_pretty(results)?),
        Format::Table => Ok(results
            .iter()
            .map(scan_table)
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

pub fn failures(failures: &[BatchItemFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("failed: {} ({})", f.url, f.error))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn integration_status(status: &IntegrationStatusResponse) -> String {
    let flag = |on: bool| if on { "configured" } else { "not configured" };
    let mut out = format!(
        "Slack: {}\nEmail: {}",
        flag(status.slack_configured),
        flag(status.email_configured)
    );
    if let Some(email) = &status.notification_email {
        out.push_str(&format!("\nNotification email: {email}"));
    }
    out
}

fn scan_table(result: &ScanResponse) -> String {
    let mut lines = vec![
        format!("URL:        {}", result.url),
        format!("Score:      {}/100", result.score),
        format!(
            "Banner:     {}",
            if result.cookie_banner_detected {
                format!("detected ({})", result.cookie_banner_selectors.join(", "))
            } else {
                "not detected".to_string()
            }
        ),
        format!("Cookies:    {}", result.cookies.len()),
        format!("Scan time:  {} ms", result.scan_time_ms),
    ];
    if result.violations.is_empty() {
        lines.push("Violations: none".to_string());
    } else {
        lines.push(format!("Violations: {}", result.violations.len()));
        for v in &result.violations {
            let rule = v.rule_id.as_deref().map(|r| format!(" [{r}]")).unwrap_or_default();
            lines.push(format!(
                "  {:<8} {}{}: {}",
                v.severity.to_string().to_uppercase(),
                v.title,
                rule,
                v.description
            ));
        }
    }
    lines.join("\n")
}
