use super::model::{AgentFinding, Severity};
use crate::procurement::model::ProcurementRecord;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Per-supplier aggregate over one analysis batch.
///
/// Keyed by the supplier name exactly as reported; no case,
/// whitespace, or alias normalization is applied, so the same firm
/// reported under two spellings produces two profiles. Known hazard,
/// carried from the reporting templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierRiskProfile {
    pub supplier_name: String,
    /// 0-100 weighted accumulator, not a calibrated probability.
    pub risk_score: f64,
    pub risk_factors: Vec<String>,
    pub contract_count: usize,
    pub total_contract_value: f64,
    pub mean_compliance_score: f64,
    /// Titles of HIGH and CRITICAL findings touching this supplier.
    pub red_flags: Vec<String>,
    pub recommendations: Vec<String>,
}

const BASE_SCORE: f64 = 50.0;

fn severity_weight(severity: Severity) -> f64 {
    match severity {
        Severity::Critical => 25.0,
        Severity::High => 15.0,
        Severity::Medium => 10.0,
        Severity::Low => 5.0,
    }
}

fn tier_recommendations(score: f64) -> Vec<String> {
    let texts: &[&str] = if score >= 75.0 {
        &[
            "Suspend new awards to this supplier pending a due diligence review",
            "Escalate to the Public Procurement Authority for investigation",
        ]
    } else if score >= 60.0 {
        &[
            "Subject new awards to this supplier to enhanced pre-award checks",
            "Request updated beneficial ownership and tax clearance documents",
        ]
    } else if score >= 40.0 {
        &["Keep the supplier on the quarterly monitoring watchlist"]
    } else {
        &["Routine monitoring; no additional action required"]
    };
    texts.iter().map(|s| s.to_string()).collect()
}

/// Build profiles for every supplier in the batch. A finding counts
/// against a supplier when any of its affected records belongs to that
/// supplier's contracts.
pub fn build_profiles(
    records: &[ProcurementRecord],
    findings: &[AgentFinding],
) -> BTreeMap<String, SupplierRiskProfile> {
    let mut contracts: BTreeMap<&str, Vec<&ProcurementRecord>> = BTreeMap::new();
    let mut record_supplier: BTreeMap<&str, &str> = BTreeMap::new();
    for record in records {
        contracts
            .entry(record.supplier_name.as_str())
            .or_default()
            .push(record);
        record_supplier.insert(record.record_id.as_str(), record.supplier_name.as_str());
    }

    let mut profiles = BTreeMap::new();
    for (supplier, group) in contracts {
        let mut score = BASE_SCORE;
        let mut factors: BTreeSet<String> = BTreeSet::new();
        let mut red_flags = Vec::new();

        for finding in findings {
            let touches = finding
                .affected_records
                .iter()
                .any(|id| record_supplier.get(id.as_str()) == Some(&supplier));
            if !touches {
                continue;
            }
            score += severity_weight(finding.severity);
            factors.insert(finding.finding_type.as_str().to_string());
            if !finding.regulatory_breach.is_empty() {
                factors.insert(finding.regulatory_breach.clone());
            }
            if finding.severity >= Severity::High {
                red_flags.push(finding.title.clone());
            }
        }

        let mean_compliance =
            group.iter().map(|r| r.compliance_score).sum::<f64>() / group.len() as f64;
        score += (100.0 - mean_compliance) * 0.2;
        let score = score.clamp(0.0, 100.0);

        red_flags.sort();
        red_flags.dedup();

        profiles.insert(
            supplier.to_string(),
            SupplierRiskProfile {
                supplier_name: supplier.to_string(),
                risk_score: score,
                risk_factors: factors.into_iter().collect(),
                contract_count: group.len(),
                total_contract_value: group.iter().map(|r| r.actual_value).sum(),
                mean_compliance_score: mean_compliance,
                red_flags,
                recommendations: tier_recommendations(score),
            },
        );
    }
    profiles
}
