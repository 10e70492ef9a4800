use crate::analysis::model::{AnalysisResult, Severity};
use crate::analysis::risk_profile::SupplierRiskProfile;
use std::collections::BTreeMap;

/// Render findings as CSV, one row per finding.
pub fn render_findings_csv(result: &AnalysisResult) -> String {
    let mut csv = String::from(
        "finding_id,rule,finding_type,severity,confidence,financial_impact,affected_records,title\n",
    );
    for finding in &result.findings {
        let title_csv = finding.title.replace('"', "\"\"");
        csv.push_str(&format!(
            "{},{},{},{},{:.2},{:.2},{},\"{}\"\n",
            finding.finding_id,
            finding.rule.as_str(),
            finding.finding_type.as_str(),
            finding.severity.as_str(),
            finding.confidence,
            finding.financial_impact,
            finding.affected_records.join(";"),
            title_csv,
        ));
    }
    csv
}

/// Oversight packet for reviewers: run header, findings grouped by
/// severity (worst first), recommendations, supplier profiles.
pub fn render_oversight_packet(
    result: &AnalysisResult,
    profiles: &BTreeMap<String, SupplierRiskProfile>,
) -> String {
    let mut lines = vec![
        "# Procurement Oversight Packet".to_string(),
        String::new(),
        format!("Analysis: {}", result.analysis_id),
        format!("Aggregate risk: {}", result.risk_level.as_str()),
        format!(
            "Records processed: {} | Issues identified: {} | Confidence: {:.2}",
            result.processed_records, result.issues_identified, result.confidence
        ),
        String::new(),
    ];

    for severity in [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ] {
        let group: Vec<_> = result
            .findings
            .iter()
            .filter(|f| f.severity == severity)
            .collect();
        if group.is_empty() {
            continue;
        }
        lines.push(format!("## {} findings", severity.as_str()));
        lines.push(String::new());
        for finding in group {
            lines.push(format!("- **{}** ({})", finding.title, finding.finding_id));
            lines.push(format!("  {}", finding.description));
            lines.push(format!("  Breach: {}", finding.regulatory_breach));
        }
        lines.push(String::new());
    }

    if !result.recommendations.is_empty() {
        lines.push("## Recommendations".to_string());
        lines.push(String::new());
        for rec in &result.recommendations {
            lines.push(format!(
                "- [{}] {}: {} ({})",
                rec.priority.as_str(),
                rec.finding_type.as_str(),
                rec.responsible_party,
                rec.timeline
            ));
            for action in &rec.actions {
                lines.push(format!("  - {}", action));
            }
        }
        lines.push(String::new());
    }

    if !profiles.is_empty() {
        lines.push("## Supplier risk profiles".to_string());
        lines.push(String::new());
        for profile in profiles.values() {
            lines.push(format!(
                "- {}: score {:.0}, {} contracts, {:.2} total",
                profile.supplier_name,
                profile.risk_score,
                profile.contract_count,
                profile.total_contract_value
            ));
            for flag in &profile.red_flags {
                lines.push(format!("  - RED FLAG: {}", flag));
            }
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

/// Prompt text for the external commentary service. Only the prompt is
/// built here; invoking the service is the caller's concern.
pub fn render_commentary_prompt(result: &AnalysisResult) -> String {
    let mut lines = vec![
        "You are drafting an oversight commentary for Ghana's state-owned enterprises."
            .to_string(),
        format!(
            "The latest compliance analysis covered {} procurement records and identified {} issues; aggregate risk is {}.",
            result.processed_records,
            result.issues_identified,
            result.risk_level.as_str()
        ),
        "Summarize the findings below in plain language for a non-specialist board audience. Do not invent figures.".to_string(),
        String::new(),
    ];
    for finding in &result.findings {
        lines.push(format!(
            "- [{}] {}: {}",
            finding.severity.as_str(),
            finding.title,
            finding.description
        ));
    }
    lines.join("\n")
}
