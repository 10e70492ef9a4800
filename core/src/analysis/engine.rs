use super::model::{AgentFinding, AnalysisResult, RiskLevel, Severity};
use super::recommendations;
use super::rules;
use super::similarity::{KeywordSimilarity, SimilarityDetector};
use crate::determinism::ids::analysis_id;
use crate::procurement::model::ProcurementRecord;
use time::OffsetDateTime;

/// Batch compliance analysis over procurement records.
///
/// `analyze_at` is a pure function of the batch and the run instant:
/// it mutates nothing, performs no I/O, and owns no shared state.
/// Persisting the result and the supplier profiles is the caller's
/// concern (see `history`).
pub struct ComplianceAnalysisEngine {
    similarity: Box<dyn SimilarityDetector>,
}

impl ComplianceAnalysisEngine {
    pub fn new() -> Self {
        ComplianceAnalysisEngine {
            similarity: Box::new(KeywordSimilarity::new()),
        }
    }

    pub fn with_similarity(similarity: Box<dyn SimilarityDetector>) -> Self {
        ComplianceAnalysisEngine { similarity }
    }

    pub fn analyze(&self, records: &[ProcurementRecord]) -> AnalysisResult {
        self.analyze_at(records, OffsetDateTime::now_utc())
    }

    /// Run every rule family over the batch. Rule order is fixed but
    /// carries no semantics: no rule suppresses another, and finding
    /// ids are content-derived, so reordering would only permute the
    /// output vector.
    pub fn analyze_at(
        &self,
        records: &[ProcurementRecord],
        executed_at: OffsetDateTime,
    ) -> AnalysisResult {
        let mut findings: Vec<AgentFinding> = Vec::new();
        findings.extend(rules::budget_overrun(records, executed_at));
        findings.extend(rules::local_content_shortfall(records, executed_at));
        findings.extend(rules::inappropriate_method(records, executed_at));
        findings.extend(rules::award_delay(records, executed_at));
        findings.extend(rules::supplier_concentration(records, executed_at));
        findings.extend(rules::rapid_successive_awards(records, executed_at));
        findings.extend(rules::duplicate_procurement(
            records,
            self.similarity.as_ref(),
            executed_at,
        ));
        findings.extend(rules::high_value_oversight(records, executed_at));
        findings.extend(rules::single_bidder(records, executed_at));

        let recommendations = recommendations::synthesize(&findings);
        let risk_level = aggregate_risk_level(&findings);
        let confidence = aggregate_confidence(&findings);

        let record_ids: Vec<String> = records.iter().map(|r| r.record_id.clone()).collect();

        AnalysisResult {
            analysis_id: analysis_id(&record_ids, executed_at),
            executed_at,
            issues_identified: findings.len(),
            processed_records: records.len(),
            findings,
            recommendations,
            risk_level,
            confidence,
        }
    }
}

impl Default for ComplianceAnalysisEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn aggregate_risk_level(findings: &[AgentFinding]) -> RiskLevel {
    let critical = findings
        .iter()
        .any(|f| f.severity == Severity::Critical);
    let high_count = findings
        .iter()
        .filter(|f| f.severity == Severity::High)
        .count();

    if critical {
        RiskLevel::Critical
    } else if high_count > 3 {
        RiskLevel::High
    } else if high_count > 0 || findings.len() > 10 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Mean finding confidence. An empty finding set reports exactly 1.0:
/// the vacuous-success convention, not a statement that the batch was
/// inspected with perfect certainty.
fn aggregate_confidence(findings: &[AgentFinding]) -> f64 {
    if findings.is_empty() {
        return 1.0;
    }
    findings.iter().map(|f| f.confidence).sum::<f64>() / findings.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::model::FindingType;
    use crate::analysis::rules::fixtures::record;
    use crate::procurement::model::ProcurementMethod;
    use time::macros::{date, datetime};

    const AT: OffsetDateTime = datetime!(2026-03-01 08:00:00 UTC);

    #[test]
    fn test_counts_match_inputs_and_findings() {
        let engine = ComplianceAnalysisEngine::new();
        let mut r = record("GH_001", "Acme Ltd", date!(2024 - 03 - 01));
        r.actual_value = 1_200_000.0;
        let clean = record("GH_002", "Beta Ltd", date!(2024 - 03 - 01));

        let result = engine.analyze_at(&[r, clean], AT);
        assert_eq!(result.processed_records, 2);
        assert_eq!(result.issues_identified, result.findings.len());
    }

    #[test]
    fn test_empty_batch_vacuous_success() {
        let engine = ComplianceAnalysisEngine::new();
        let result = engine.analyze_at(&[], AT);
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.risk_level, RiskLevel::Low);
        assert_eq!(result.processed_records, 0);
        assert_eq!(result.issues_identified, 0);
        assert!(result.recommendations.is_empty());
    }

    #[test]
    fn test_clean_batch_vacuous_success() {
        let engine = ComplianceAnalysisEngine::new();
        let records = vec![record("GH_001", "Acme Ltd", date!(2024 - 03 - 01))];
        let result = engine.analyze_at(&records, AT);
        assert_eq!(result.issues_identified, 0);
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_one_critical_dominates_risk_level() {
        let engine = ComplianceAnalysisEngine::new();
        let mut r = record("GH_001", "Acme Ltd", date!(2024 - 03 - 01));
        r.actual_value = 1_600_000.0;
        let result = engine.analyze_at(&[r], AT);
        assert_eq!(result.risk_level, RiskLevel::Critical);
    }

    #[test]
    fn test_single_high_yields_medium_risk() {
        let engine = ComplianceAnalysisEngine::new();
        let mut r = record("GH_001", "Acme Ltd", date!(2024 - 03 - 01));
        r.bidders_count = 1;
        r.local_bidders_count = 1;
        let result = engine.analyze_at(&[r], AT);
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.risk_level, RiskLevel::Medium);
    }

    const TOWNS: [&str; 4] = ["Tamale", "Kumasi", "Takoradi", "Bolgatanga"];

    #[test]
    fn test_more_than_three_highs_yield_high_risk() {
        let engine = ComplianceAnalysisEngine::new();
        let mut records = Vec::new();
        for i in 0..4usize {
            // Distinct suppliers so no concentration or rapid-award
            // findings stack on top of the single-bidder ones.
            let mut r = record(
                &format!("GH_{:03}", i),
                &format!("Supplier {}", i),
                date!(2024 - 03 - 01),
            );
            r.bidders_count = 1;
            r.local_bidders_count = 1;
            // Distinct leading keywords keep the duplicate rule quiet.
            r.description = format!("Rehabilitation of {} substation", TOWNS[i]);
            records.push(r);
        }
        let result = engine.analyze_at(&records, AT);
        assert_eq!(result.findings.len(), 4);
        assert_eq!(result.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_mean_confidence() {
        let engine = ComplianceAnalysisEngine::new();
        let mut overrun = record("GH_001", "Acme Ltd", date!(2024 - 03 - 01));
        overrun.actual_value = 1_200_000.0; // budget rule, 0.95
        overrun.description = "Construction of Tamale clinic annex".to_string();
        let mut single = record("GH_002", "Beta Ltd", date!(2024 - 03 - 01));
        single.bidders_count = 1;
        single.local_bidders_count = 1; // single-bidder rule, 0.92
        single.description = "Renovation of Kumasi records office".to_string();

        let result = engine.analyze_at(&[overrun, single], AT);
        assert_eq!(result.findings.len(), 2);
        assert!((result.confidence - 0.935).abs() < 1e-9);
    }

    #[test]
    fn test_identical_input_identical_output() {
        let engine = ComplianceAnalysisEngine::new();
        let mut records = Vec::new();
        for i in 0..4 {
            let mut r = record(&format!("GH_{:03}", i), "Acme Ltd", date!(2024 - 03 - 01));
            r.actual_value = 1_400_000.0;
            r.method = ProcurementMethod::DirectProcurement;
            records.push(r);
        }

        let first = engine.analyze_at(&records, AT);
        let second = engine.analyze_at(&records, AT);
        assert_eq!(first.analysis_id, second.analysis_id);
        assert_eq!(first.risk_level, second.risk_level);
        assert_eq!(first.findings.len(), second.findings.len());
        for (a, b) in first.findings.iter().zip(second.findings.iter()) {
            assert_eq!(a.finding_id, b.finding_id);
            assert_eq!(a.finding_type, b.finding_type);
        }
    }

    #[test]
    fn test_one_record_can_trigger_multiple_rules() {
        let engine = ComplianceAnalysisEngine::new();
        let mut r = record("GH_001", "Acme Ltd", date!(2024 - 03 - 01));
        r.actual_value = 1_200_000.0;
        r.local_content_percentage = 10.0;
        r.bidders_count = 1;
        r.local_bidders_count = 1;

        let result = engine.analyze_at(&[r], AT);
        let types: Vec<FindingType> = result.findings.iter().map(|f| f.finding_type).collect();
        assert!(types.contains(&FindingType::BudgetAnomaly));
        assert!(types.contains(&FindingType::LocalContentShortfall));
        assert!(types.contains(&FindingType::ComplianceViolation));
    }

    #[test]
    fn test_recommendations_cover_present_types_only() {
        let engine = ComplianceAnalysisEngine::new();
        let mut r = record("GH_001", "Acme Ltd", date!(2024 - 03 - 01));
        r.actual_value = 1_200_000.0;
        let result = engine.analyze_at(&[r], AT);

        assert_eq!(result.recommendations.len(), 1);
        assert_eq!(
            result.recommendations[0].finding_type,
            FindingType::BudgetAnomaly
        );
        assert_eq!(
            result.recommendations[0].addresses,
            vec![result.findings[0].finding_id.clone()]
        );
    }
}
