use super::model::{AgentFinding, AgentRecommendation, FindingType, Severity};
use crate::determinism::ids::recommendation_id;
use std::collections::BTreeMap;

struct RecommendationTemplate {
    finding_type: FindingType,
    priority: Severity,
    actions: &'static [&'static str],
    responsible_party: &'static str,
    timeline: &'static str,
}

// Four finding types carry a remediation template. TimelineViolation
// and ComplianceViolation deliberately have none; the gap is pinned by
// test so closing it is an explicit product decision, not a drive-by.
const TEMPLATES: &[RecommendationTemplate] = &[
    RecommendationTemplate {
        finding_type: FindingType::BudgetAnomaly,
        priority: Severity::High,
        actions: &[
            "Reconcile actual spend against the approved procurement plan",
            "Require variation orders for any overrun above 10% of estimate",
            "Refer overruns above 30% to the internal audit unit",
        ],
        responsible_party: "Entity finance directorate",
        timeline: "30 days",
    },
    RecommendationTemplate {
        finding_type: FindingType::LocalContentShortfall,
        priority: Severity::Medium,
        actions: &[
            "Apply the margin of preference for local suppliers at evaluation",
            "Report local content performance in the quarterly procurement return",
        ],
        responsible_party: "Entity procurement unit",
        timeline: "Next procurement cycle",
    },
    RecommendationTemplate {
        finding_type: FindingType::ConflictOfInterest,
        priority: Severity::High,
        actions: &[
            "Obtain beneficial ownership declarations for the supplier",
            "Screen award committee members against the supplier's directors",
            "Suspend further awards to the supplier pending review",
        ],
        responsible_party: "Public Procurement Authority",
        timeline: "14 days",
    },
    RecommendationTemplate {
        finding_type: FindingType::DuplicateProcurement,
        priority: Severity::Medium,
        actions: &[
            "Verify the flagged contracts cover distinct deliverables",
            "Consolidate overlapping requirements into a single package",
        ],
        responsible_party: "Entity tender committee",
        timeline: "21 days",
    },
];

/// One recommendation per distinct finding type present in the batch
/// that has a template; finding types without one yield nothing.
pub fn synthesize(findings: &[AgentFinding]) -> Vec<AgentRecommendation> {
    let mut by_type: BTreeMap<FindingType, Vec<String>> = BTreeMap::new();
    for finding in findings {
        by_type
            .entry(finding.finding_type)
            .or_default()
            .push(finding.finding_id.clone());
    }

    let mut recommendations = Vec::new();
    for template in TEMPLATES {
        let Some(addresses) = by_type.get(&template.finding_type) else {
            continue;
        };
        let mut addresses = addresses.clone();
        addresses.sort();
        recommendations.push(AgentRecommendation {
            recommendation_id: recommendation_id(template.finding_type.as_str(), &addresses),
            finding_type: template.finding_type,
            priority: template.priority,
            actions: template.actions.iter().map(|s| s.to_string()).collect(),
            responsible_party: template.responsible_party.to_string(),
            timeline: template.timeline.to_string(),
            addresses,
        });
    }
    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::model::RuleCode;
    use time::macros::datetime;

    fn finding(id: &str, rule: RuleCode) -> AgentFinding {
        AgentFinding {
            finding_id: id.to_string(),
            rule,
            finding_type: rule.finding_type(),
            severity: Severity::Medium,
            title: "t".to_string(),
            description: "d".to_string(),
            affected_records: vec!["GH_001".to_string()],
            affected_entities: vec!["ECG".to_string()],
            affected_individuals: vec![],
            financial_impact: 0.0,
            regulatory_breach: String::new(),
            confidence: 0.9,
            detected_date: datetime!(2026-03-01 08:00:00 UTC),
        }
    }

    #[test]
    fn test_one_recommendation_per_type_not_per_finding() {
        let findings = vec![
            finding("F_1", RuleCode::BudgetOverrun),
            finding("F_2", RuleCode::BudgetOverrun),
            finding("F_3", RuleCode::SupplierConcentration),
        ];
        let recs = synthesize(&findings);
        assert_eq!(recs.len(), 2);

        let budget = recs
            .iter()
            .find(|r| r.finding_type == FindingType::BudgetAnomaly)
            .unwrap();
        assert_eq!(budget.addresses, vec!["F_1".to_string(), "F_2".to_string()]);
    }

    #[test]
    fn test_timeline_violations_yield_no_recommendation() {
        let findings = vec![
            finding("F_1", RuleCode::AwardDelay),
            finding("F_2", RuleCode::AwardDelay),
        ];
        assert!(synthesize(&findings).is_empty());
    }

    #[test]
    fn test_compliance_violations_yield_no_recommendation() {
        let findings = vec![finding("F_1", RuleCode::SingleBidder)];
        assert!(synthesize(&findings).is_empty());
    }

    #[test]
    fn test_no_findings_no_recommendations() {
        assert!(synthesize(&[]).is_empty());
    }

    #[test]
    fn test_recommendation_id_deterministic() {
        let findings = vec![finding("F_1", RuleCode::DuplicateProcurement)];
        let a = synthesize(&findings);
        let b = synthesize(&findings);
        assert_eq!(a[0].recommendation_id, b[0].recommendation_id);
    }
}
